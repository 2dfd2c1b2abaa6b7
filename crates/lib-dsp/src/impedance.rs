//! Longitudinal beam-coupling impedance from the wake potential.
//!
//! Two transforms are available:
//!
//! - [`ImpedanceMethod::DirectDft`]: a causal DFT evaluated directly on a
//!   symmetric frequency axis `linspace(-f_max, f_max, n_samples)`.
//! - [`ImpedanceMethod::PaddedFft`]: the wake and charge profile are
//!   zero-padded, decimated down to a sampling rate of `2 * f_max` and
//!   transformed with a full complex FFT.
//!
//! In both cases `|Z| = |W(f)| / |lambda(f)|`, with an extra `1/c` factor for
//! the direct DFT. Bins where the charge spectrum is exactly zero are either
//! flagged with an infinite impedance or rejected, per [`DegeneratePolicy`].

use crate::error::{DspError, DspResult};
use crate::fft::{decimate, fftfreq, zero_pad, FftEngine};
use lib_types::axis::linspace;
use lib_types::units::{Hertz, Meters, SPEED_OF_LIGHT};
use lib_types::wake::{ChargeDistribution, WakePotential};
use lib_types::{ImpedanceSpectrum, SpectrumLayout};
use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Transform used to obtain the impedance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpedanceMethod {
    /// Direct causal DFT on a symmetric frequency axis.
    DirectDft,
    /// Zero-padded, decimated FFT.
    #[default]
    PaddedFft,
}

/// Phase kernel of the direct DFT.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DftConvention {
    /// `exp(-i k dt f)`, no 2*pi factor.
    #[default]
    Reference,
    /// `exp(-i 2 pi k dt f)`, so bins sit at physical frequencies.
    Angular,
}

/// Handling of bins where the charge spectrum vanishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Store `f64::INFINITY` and record the bin.
    #[default]
    Flag,
    /// Fail with [`DspError::DegenerateSpectrum`].
    Fail,
}

/// Impedance transform parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ImpedanceConfig {
    pub method: ImpedanceMethod,

    /// Highest frequency of interest. Sets the direct DFT span and the FFT
    /// decimation stride.
    pub f_max: Hertz,

    /// Number of direct DFT frequency bins.
    pub n_samples: usize,

    /// Zeros appended before the direct DFT.
    pub padding: usize,

    /// Zeros appended before decimation in the padded FFT.
    pub fft_pad: usize,

    pub convention: DftConvention,

    pub degenerate: DegeneratePolicy,
}

impl Default for ImpedanceConfig {
    fn default() -> Self {
        Self {
            method: ImpedanceMethod::default(),
            f_max: Hertz::from_ghz(5.0),
            n_samples: 1000,
            padding: 1,
            fft_pad: 10_000,
            convention: DftConvention::default(),
            degenerate: DegeneratePolicy::default(),
        }
    }
}

/// Compute |Z(f)| from a wake potential and the charge profile that drove it.
pub fn impedance(
    wake: &WakePotential,
    lambda: &ChargeDistribution,
    config: &ImpedanceConfig,
) -> DspResult<ImpedanceSpectrum> {
    if lambda.len() != wake.len() {
        return Err(DspError::malformed(
            "charge distribution",
            format!("{} samples for a wake of {} samples", lambda.len(), wake.len()),
        ));
    }
    let ds = wake
        .ds()
        .ok_or(DspError::InsufficientData { needed: 3, got: wake.len() })?
        .0;
    if !(ds > 0.0) {
        return Err(DspError::malformed("offset axis", format!("step ds = {} must be positive", ds)));
    }
    if !(config.f_max.0 > 0.0) || !config.f_max.0.is_finite() {
        return Err(DspError::InvalidConfig(format!(
            "f_max must be positive, got {} Hz",
            config.f_max.0
        )));
    }

    let spectrum = match config.method {
        ImpedanceMethod::DirectDft => direct_impedance(wake, lambda, ds, config)?,
        ImpedanceMethod::PaddedFft => padded_fft(wake, lambda, ds, config)?,
    };

    if spectrum.has_degenerate_bins() {
        tracing::warn!(
            "{} impedance bins have a vanishing charge spectrum",
            spectrum.degenerate_bins.len()
        );
    }
    if let Some(peak) = spectrum.peak() {
        tracing::info!(
            "Impedance peak: {:.4} Ohm at {:.4} GHz",
            peak.impedance.0,
            peak.frequency.as_ghz()
        );
    }

    Ok(spectrum)
}

/// Direct DFT of a real sequence sampled every `delta` seconds.
///
/// Returns the frequency axis [Hz] and the scaled transform
/// `delta / sqrt(pi) * sum_k F[k] exp(-i k delta f)` (with a 2*pi factor in
/// the phase under [`DftConvention::Angular`]). `padding` zeros are appended
/// to the signal first.
pub fn direct_dft(
    signal: &[f64],
    delta: f64,
    f_max: Hertz,
    n_samples: usize,
    padding: usize,
    convention: DftConvention,
) -> DspResult<(Vec<f64>, Vec<Complex64>)> {
    if signal.is_empty() {
        return Err(DspError::InsufficientData { needed: 1, got: 0 });
    }
    if n_samples == 0 {
        return Err(DspError::InvalidConfig("direct DFT needs at least one frequency bin".into()));
    }

    let freqs = linspace(-f_max.0, f_max.0, n_samples);
    let padded = zero_pad(signal, signal.len() + padding);
    let scale = delta / PI.sqrt();
    let phase_factor = match convention {
        DftConvention::Reference => 1.0,
        DftConvention::Angular => 2.0 * PI,
    };

    tracing::debug!(
        "Direct DFT: {} samples ({} padding), {} bins over +/-{:.3} GHz, delta = {:.4e} s",
        signal.len(),
        padding,
        n_samples,
        f_max.as_ghz(),
        delta
    );

    let dft = freqs
        .par_iter()
        .map(|&f| {
            let w = phase_factor * delta * f;
            let sum: Complex64 = padded
                .iter()
                .enumerate()
                .map(|(k, &x)| Complex64::from_polar(x, -w * k as f64))
                .sum();
            sum * scale
        })
        .collect();

    Ok((freqs, dft))
}

fn direct_impedance(
    wake: &WakePotential,
    lambda: &ChargeDistribution,
    ds: f64,
    config: &ImpedanceConfig,
) -> DspResult<ImpedanceSpectrum> {
    let delta = Meters(ds).light_time().0;
    let (freqs, wake_dft) = direct_dft(
        &wake.values,
        delta,
        config.f_max,
        config.n_samples,
        config.padding,
        config.convention,
    )?;
    let (_, charge_dft) = direct_dft(
        &lambda.density,
        delta,
        config.f_max,
        config.n_samples,
        config.padding,
        config.convention,
    )?;

    let (magnitude, degenerate_bins) = divide_spectra(
        &wake_dft,
        &charge_dft,
        &freqs,
        1.0 / SPEED_OF_LIGHT,
        config.degenerate,
    )?;

    Ok(ImpedanceSpectrum {
        frequencies: freqs.into_iter().map(Hertz).collect(),
        magnitude,
        layout: SpectrumLayout::Symmetric,
        degenerate_bins,
    })
}

/// Decimation stride bringing a sampling step of `delta` seconds down to a
/// rate of `2 * f_max`.
pub fn decimation_stride(delta: f64, f_max: Hertz) -> DspResult<usize> {
    let stride = (1.0 / delta / 2.0 / f_max.0).floor();
    if !stride.is_finite() || stride < 1.0 {
        return Err(DspError::InvalidConfig(format!(
            "sampling step {:.4e} s is too coarse for f_max = {:.3} GHz (stride 0)",
            delta,
            f_max.as_ghz()
        )));
    }
    Ok(stride as usize)
}

/// Zero-padded, decimated FFT impedance.
pub fn padded_fft(
    wake: &WakePotential,
    lambda: &ChargeDistribution,
    ds: f64,
    config: &ImpedanceConfig,
) -> DspResult<ImpedanceSpectrum> {
    let delta = Meters(ds).light_time().0;
    let t_sample = decimation_stride(delta, config.f_max)?;

    let padded_len = wake.len() + config.fft_pad;
    let wake_dec = decimate(&zero_pad(&wake.values, padded_len), t_sample);
    let charge_dec = decimate(&zero_pad(&lambda.density, padded_len), t_sample);

    tracing::debug!(
        "Padded FFT: {} samples + {} zeros, stride {}, {} points, resolution {:.4} MHz",
        wake.len(),
        config.fft_pad,
        t_sample,
        wake_dec.len(),
        1e-6 / (wake_dec.len() as f64 * delta * t_sample as f64)
    );

    let mut engine = FftEngine::new();
    let wake_fft = engine.fft_real(&wake_dec)?;
    let charge_fft = engine.fft_real(&charge_dec)?;
    let freqs = fftfreq(wake_dec.len(), delta * t_sample as f64);

    let (magnitude, degenerate_bins) =
        divide_spectra(&wake_fft, &charge_fft, &freqs, 1.0, config.degenerate)?;

    Ok(ImpedanceSpectrum {
        frequencies: freqs.into_iter().map(Hertz).collect(),
        magnitude,
        layout: SpectrumLayout::FftOrder,
        degenerate_bins,
    })
}

/// `scale * |num| / |den|` per bin, applying the degenerate policy where
/// `|den| == 0`.
fn divide_spectra(
    num: &[Complex64],
    den: &[Complex64],
    freqs: &[f64],
    scale: f64,
    policy: DegeneratePolicy,
) -> DspResult<(Vec<f64>, Vec<usize>)> {
    let mut magnitude = Vec::with_capacity(num.len());
    let mut degenerate = Vec::new();

    for (i, (n, d)) in num.iter().zip(den.iter()).enumerate() {
        let d = d.norm();
        if d == 0.0 {
            match policy {
                DegeneratePolicy::Fail => {
                    return Err(DspError::DegenerateSpectrum {
                        bin: i,
                        frequency: Hertz(freqs[i]),
                    })
                }
                DegeneratePolicy::Flag => {
                    degenerate.push(i);
                    magnitude.push(f64::INFINITY);
                }
            }
        } else {
            magnitude.push(scale * n.norm() / d);
        }
    }

    Ok((magnitude, degenerate))
}
