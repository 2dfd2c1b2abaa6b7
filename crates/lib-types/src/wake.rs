//! Wake-domain data: offset axis, wake potential, bunch charge profile.
//!
//! # Offset convention
//!
//! `s` is the longitudinal distance of the test charge behind the source.
//! Negative offsets cover the precursor region the source traverses before
//! the reference time `init_time`; positive offsets cover the wake tail.
//! The offset axis is the concatenation
//!
//! ```text
//! linspace(-init_time * c, 0, ns_neg) ++ linspace(0, wake_length, ns_pos)
//! ```
//!
//! so `s = 0` appears twice, once at each side of the segment boundary.

use crate::units::{Coulombs, Meters, SPEED_OF_LIGHT};
use serde::{Deserialize, Serialize};

/// Longitudinal offsets between source and test charge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OffsetAxis {
    /// Offsets [m], non-decreasing.
    pub s: Vec<f64>,

    /// Number of samples in the negative segment.
    pub ns_neg: usize,

    /// Number of samples in the positive segment.
    pub ns_pos: usize,

    /// Extent of the positive segment.
    pub wake_length: Meters,
}

impl OffsetAxis {
    #[inline]
    pub fn len(&self) -> usize {
        self.s.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    /// Offset step (`s[2] - s[1]`).
    #[inline]
    pub fn ds(&self) -> Option<Meters> {
        crate::axis::grid_step(&self.s).map(Meters)
    }

    /// Index of the first sample of the positive segment.
    #[inline]
    pub fn zero_index(&self) -> usize {
        self.ns_neg
    }
}

/// Longitudinal wake potential W(s).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WakePotential {
    /// Offsets [m].
    pub s: Vec<f64>,

    /// Wake potential [V/pC], one value per offset.
    pub values: Vec<f64>,
}

impl WakePotential {
    pub fn new(s: Vec<f64>, values: Vec<f64>) -> Self {
        Self { s, values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Offset step (`s[2] - s[1]`).
    #[inline]
    pub fn ds(&self) -> Option<Meters> {
        crate::axis::grid_step(&self.s).map(Meters)
    }

    /// Maximum value (signed).
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Maximum absolute value.
    pub fn max_abs(&self) -> f64 {
        self.values.iter().map(|v| v.abs()).fold(0.0, f64::max)
    }

    /// Copy scaled so that the signed maximum is one.
    ///
    /// Returns an unchanged copy if the maximum is not positive.
    pub fn peak_normalized(&self) -> Self {
        let peak = self.max();
        let mut copy = self.clone();
        if peak > 0.0 && peak.is_finite() {
            for v in &mut copy.values {
                *v /= peak;
            }
        }
        copy
    }
}

/// Gaussian longitudinal charge profile of the source bunch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeDistribution {
    /// Offsets [m].
    pub s: Vec<f64>,

    /// Line charge density [C/m].
    pub density: Vec<f64>,

    /// Total bunch charge.
    pub charge: Coulombs,

    /// RMS bunch length.
    pub sigma_z: Meters,
}

impl ChargeDistribution {
    /// Sample a Gaussian of RMS length `sigma_z` centred on `s = 0`.
    pub fn gaussian(s: &[f64], charge: Coulombs, sigma_z: Meters) -> Self {
        let sigma = sigma_z.0;
        let norm = charge.0 / (sigma * (2.0 * std::f64::consts::PI).sqrt());
        let density = s
            .iter()
            .map(|&x| norm * (-(0.5 * x * x) / (sigma * sigma)).exp())
            .collect();

        Self {
            s: s.to_vec(),
            density,
            charge,
            sigma_z,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.density.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    /// Density divided by the total charge [1/m].
    pub fn normalized(&self) -> Vec<f64> {
        self.density.iter().map(|d| d / self.charge.0).collect()
    }

    /// RMS bunch duration at the speed of light [s].
    #[inline]
    pub fn sigma_t(&self) -> f64 {
        self.sigma_z.0 / SPEED_OF_LIGHT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::linspace;

    #[test]
    fn test_gaussian_peak_value() {
        let s = linspace(-0.05, 0.05, 101);
        let sigma = Meters(0.005);
        let lambda = ChargeDistribution::gaussian(&s, Coulombs::from_nc(1.0), sigma);

        let expected = 1e-9 / (0.005 * (2.0 * std::f64::consts::PI).sqrt());
        assert!((lambda.density[50] - expected).abs() / expected < 1e-12);
        // symmetric
        assert!((lambda.density[40] - lambda.density[60]).abs() < 1e-18);
    }

    #[test]
    fn test_normalized_removes_charge() {
        let s = linspace(-0.01, 0.01, 11);
        let a = ChargeDistribution::gaussian(&s, Coulombs::from_nc(1.0), Meters(0.002));
        let b = ChargeDistribution::gaussian(&s, Coulombs::from_nc(3.0), Meters(0.002));

        for (x, y) in a.normalized().iter().zip(b.normalized().iter()) {
            assert!((x - y).abs() <= 1e-12 * x.abs().max(1.0));
        }
    }

    #[test]
    fn test_peak_normalized_wake() {
        let w = WakePotential::new(vec![0.0, 1.0, 2.0], vec![-4.0, 2.0, 1.0]);
        let n = w.peak_normalized();
        assert_eq!(n.values, vec![-2.0, 1.0, 0.5]);
        assert_eq!(w.max_abs(), 4.0);
    }
}
