//! FFT operations using rustfft.
//!
//! This module provides a high-level wrapper around rustfft with:
//! - Planner caching for repeated transforms
//! - Full-spectrum transforms of real sequences of any length
//! - Real-to-complex half-spectrum transforms via realfft
//! - numpy-compatible bin frequency helpers

use crate::error::{DspError, DspResult};
use num_complex::Complex64;
use realfft::RealFftPlanner;
use rustfft::FftPlanner;

/// FFT engine with cached planners.
pub struct FftEngine {
    /// Complex FFT planner.
    complex_planner: FftPlanner<f64>,

    /// Real FFT planner.
    real_planner: RealFftPlanner<f64>,
}

impl FftEngine {
    /// Create a new FFT engine.
    pub fn new() -> Self {
        Self {
            complex_planner: FftPlanner::new(),
            real_planner: RealFftPlanner::new(),
        }
    }

    /// Perform forward FFT on complex data in-place.
    ///
    /// Any non-zero length is accepted; rustfft picks a mixed-radix or
    /// Bluestein plan for non power-of-two sizes.
    pub fn fft_inplace(&mut self, data: &mut [Complex64]) -> DspResult<()> {
        let len = data.len();
        if len == 0 {
            return Err(DspError::InvalidFftSize(len));
        }

        let fft = self.complex_planner.plan_fft_forward(len);
        fft.process(data);
        Ok(())
    }

    /// Full N-bin spectrum of a real sequence, in FFT bin order.
    pub fn fft_real(&mut self, data: &[f64]) -> DspResult<Vec<Complex64>> {
        let mut buffer: Vec<Complex64> = data.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        self.fft_inplace(&mut buffer)?;
        Ok(buffer)
    }

    /// Perform forward real-to-complex FFT.
    ///
    /// Input: N real samples
    /// Output: N/2 + 1 complex samples (Hermitian symmetry exploited)
    pub fn rfft(&mut self, data: &[f64]) -> DspResult<Vec<Complex64>> {
        let len = data.len();
        if len == 0 {
            return Err(DspError::InvalidFftSize(len));
        }

        let r2c = self.real_planner.plan_fft_forward(len);
        let mut input = data.to_vec();
        let mut output = r2c.make_output_vec();

        r2c.process(&mut input, &mut output)
            .map_err(|e| DspError::NumericalInstability(e.to_string()))?;

        Ok(output)
    }
}

impl Default for FftEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Bin frequencies for an `n`-point FFT with sample spacing `d`.
///
/// Same ordering as `numpy.fft.fftfreq`: non-negative bins first, then the
/// negative bins in increasing order.
pub fn fftfreq(n: usize, d: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let scale = 1.0 / (n as f64 * d);
    let positive_end = (n - 1) / 2 + 1;
    (0..n)
        .map(|i| {
            let k = if i < positive_end {
                i as f64
            } else {
                i as f64 - n as f64
            };
            k * scale
        })
        .collect()
}

/// Bin frequencies of an `n`-point real FFT (`n/2 + 1` bins).
pub fn rfftfreq(n: usize, d: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let scale = 1.0 / (n as f64 * d);
    (0..=n / 2).map(|i| i as f64 * scale).collect()
}

/// Zero-pad a signal to a specific length.
pub fn zero_pad(signal: &[f64], new_len: usize) -> Vec<f64> {
    let mut result = signal.to_vec();
    if new_len > signal.len() {
        result.resize(new_len, 0.0);
    }
    result
}

/// Take every `stride`-th sample, stopping before the last sample.
///
/// Matches the slice `signal[0:-1:stride]`: the final element is never
/// included, whatever the stride.
pub fn decimate(signal: &[f64], stride: usize) -> Vec<f64> {
    if signal.len() < 2 || stride == 0 {
        return Vec::new();
    }
    signal[..signal.len() - 1].iter().step_by(stride).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_fft_real_matches_rfft_half() {
        let mut engine = FftEngine::new();

        // odd, non power-of-two length
        let n = 45;
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 4.0 * i as f64 / n as f64).sin() + 0.25)
            .collect();

        let full = engine.fft_real(&signal).unwrap();
        let half = engine.rfft(&signal).unwrap();

        assert_eq!(full.len(), n);
        assert_eq!(half.len(), n / 2 + 1);
        for (a, b) in full.iter().zip(half.iter()) {
            assert!((a - b).norm() < 1e-9);
        }
        // DC bin carries the offset
        assert!((full[0].re - 0.25 * n as f64).abs() < 1e-9);
        // tone lands on bin 4
        assert!((full[4].norm() - n as f64 / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_fft_rejected() {
        let mut engine = FftEngine::new();
        let result = engine.fft_real(&[]);
        assert!(matches!(result, Err(DspError::InvalidFftSize(0))));
    }

    #[test]
    fn test_fftfreq_even_and_odd() {
        let even = fftfreq(4, 0.5);
        assert_eq!(even, vec![0.0, 0.5, -1.0, -0.5]);

        let odd = fftfreq(5, 1.0);
        assert_eq!(odd, vec![0.0, 0.2, 0.4, -0.4, -0.2]);
    }

    #[test]
    fn test_rfftfreq() {
        assert_eq!(rfftfreq(4, 0.5), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_decimate_excludes_last_sample() {
        let signal: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert_eq!(decimate(&signal, 3), vec![0.0, 3.0, 6.0]);
        assert_eq!(decimate(&signal, 1).len(), 9);
        assert_eq!(decimate(&signal, 9), vec![0.0]);
    }

    #[test]
    fn test_zero_pad() {
        assert_eq!(zero_pad(&[1.0, 2.0], 4), vec![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(zero_pad(&[1.0, 2.0], 1), vec![1.0, 2.0]);
    }
}
