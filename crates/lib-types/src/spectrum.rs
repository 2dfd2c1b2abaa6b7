//! Frequency-domain impedance data.

use crate::units::{Hertz, Ohms};
use serde::{Deserialize, Serialize};

/// Ordering of the frequency bins of a spectrum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumLayout {
    /// FFT bin order: `0, df, ..., f_nyq, -f_nyq, ..., -df`.
    FftOrder,
    /// Monotonic axis running from negative to positive frequencies.
    Symmetric,
}

/// Longitudinal impedance magnitude |Z(f)|.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpedanceSpectrum {
    /// Frequency of every bin.
    pub frequencies: Vec<Hertz>,

    /// |Z| [Ohm] per bin. Degenerate bins hold `f64::INFINITY`.
    pub magnitude: Vec<f64>,

    /// Bin ordering.
    pub layout: SpectrumLayout,

    /// Bins where the charge spectrum vanished.
    pub degenerate_bins: Vec<usize>,
}

/// Location of the impedance maximum.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResonancePeak {
    pub index: usize,
    pub frequency: Hertz,
    pub impedance: Ohms,
}

impl ImpedanceSpectrum {
    #[inline]
    pub fn len(&self) -> usize {
        self.magnitude.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.magnitude.is_empty()
    }

    /// True if any bin carries the degenerate sentinel.
    #[inline]
    pub fn has_degenerate_bins(&self) -> bool {
        !self.degenerate_bins.is_empty()
    }

    /// Index range covering the non-negative half of the spectrum.
    ///
    /// For FFT order this is `0..len/2`; for a symmetric axis it starts at the
    /// first bin with `f >= 0`.
    pub fn positive_half(&self) -> std::ops::Range<usize> {
        match self.layout {
            SpectrumLayout::FftOrder => 0..self.len() / 2,
            SpectrumLayout::Symmetric => {
                let start = self
                    .frequencies
                    .iter()
                    .position(|f| f.0 >= 0.0)
                    .unwrap_or(self.len());
                start..self.len()
            }
        }
    }

    /// Resonant peak: argmax of |Z| over the non-negative half.
    ///
    /// Non-finite bins are skipped. Ties resolve to the lowest index.
    pub fn peak(&self) -> Option<ResonancePeak> {
        let mut best: Option<(usize, f64)> = None;
        for i in self.positive_half() {
            let z = self.magnitude[i];
            if !z.is_finite() {
                continue;
            }
            match best {
                Some((_, b)) if z <= b => {}
                _ => best = Some((i, z)),
            }
        }

        best.map(|(index, z)| ResonancePeak {
            index,
            frequency: self.frequencies[index],
            impedance: Ohms(z),
        })
    }

    /// Largest finite magnitude over the whole spectrum.
    pub fn max_finite(&self) -> Option<f64> {
        self.magnitude
            .iter()
            .copied()
            .filter(|z| z.is_finite())
            .fold(None, |acc, z| Some(acc.map_or(z, |a: f64| a.max(z))))
    }

    /// Bin spacing taken from the first two bins.
    pub fn resolution(&self) -> Option<Hertz> {
        if self.frequencies.len() < 2 {
            return None;
        }
        Some(Hertz((self.frequencies[1].0 - self.frequencies[0].0).abs()))
    }
}
