//! Physical units with type safety.
//!
//! These newtypes provide compile-time unit checking to prevent
//! mixing incompatible quantities (e.g., adding Hertz to Meters).

use serde::{Deserialize, Serialize};
use std::ops::Sub;

/// Speed of light in vacuum [m/s].
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Picocoulombs per coulomb.
pub const PC_PER_COULOMB: f64 = 1e12;

/// Time duration in seconds.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Seconds(pub f64);

impl Seconds {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub fn from_ps(ps: f64) -> Self {
        Self(ps * 1e-12)
    }

    #[inline]
    pub fn from_ns(ns: f64) -> Self {
        Self(ns * 1e-9)
    }

    #[inline]
    pub fn as_ps(&self) -> f64 {
        self.0 * 1e12
    }

    #[inline]
    pub fn as_ns(&self) -> f64 {
        self.0 * 1e9
    }

    /// Distance travelled at the speed of light.
    #[inline]
    pub fn light_distance(&self) -> Meters {
        Meters(self.0 * SPEED_OF_LIGHT)
    }
}

/// Frequency in Hertz.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Hertz(pub f64);

impl Hertz {
    #[inline]
    pub fn from_ghz(ghz: f64) -> Self {
        Self(ghz * 1e9)
    }

    #[inline]
    pub fn as_ghz(&self) -> f64 {
        self.0 * 1e-9
    }
}

impl Sub for Hertz {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

/// Length in meters.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Meters(pub f64);

impl Meters {
    #[inline]
    pub fn from_mm(mm: f64) -> Self {
        Self(mm * 1e-3)
    }

    #[inline]
    pub fn as_mm(&self) -> f64 {
        self.0 * 1e3
    }

    /// Time for light to cover this distance.
    #[inline]
    pub fn light_time(&self) -> Seconds {
        Seconds(self.0 / SPEED_OF_LIGHT)
    }
}

/// Impedance in Ohms.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Ohms(pub f64);

/// Electric charge in Coulombs.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Coulombs(pub f64);

impl Coulombs {
    #[inline]
    pub fn from_nc(nc: f64) -> Self {
        Self(nc * 1e-9)
    }

    #[inline]
    pub fn as_pc(&self) -> f64 {
        self.0 * PC_PER_COULOMB
    }
}

impl Default for Coulombs {
    fn default() -> Self {
        // 1 nC source bunch
        Self::from_nc(1.0)
    }
}
