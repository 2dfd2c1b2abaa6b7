//! Results exported by an external field solver, used for comparison.

use crate::units::Hertz;
use serde::{Deserialize, Serialize};

/// Reference wake potential and impedance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    /// Offsets of the reference wake [m].
    pub s: Vec<f64>,

    /// Reference wake potential [V/pC].
    pub wake: Vec<f64>,

    /// Reference impedance frequencies.
    pub frequencies: Vec<Hertz>,

    /// Reference |Z| [Ohm].
    pub impedance: Vec<f64>,

    /// Reference charge distribution, if exported.
    pub charge_dist: Option<Vec<f64>>,

    /// Positions of `charge_dist` [m].
    pub distance: Option<Vec<f64>>,
}

impl ReferenceData {
    /// True if a wake curve is present.
    pub fn has_wake(&self) -> bool {
        !self.s.is_empty() && self.s.len() == self.wake.len()
    }

    /// True if an impedance curve is present.
    pub fn has_impedance(&self) -> bool {
        !self.frequencies.is_empty() && self.frequencies.len() == self.impedance.len()
    }
}
