//! # lib-dsp
//!
//! Numerical core for cavity wake-potential analysis.
//!
//! This crate turns time-domain field data into beam-coupling quantities:
//!
//! - **FFT**: Planner-cached complex and real transforms, numpy-style bin helpers
//! - **Resampling**: Per-column linear interpolation onto the time-aligned z grid
//! - **Wake Integration**: Retarded-time gather of `Ez` into `W(s)`, parallel over offsets
//! - **Loss Factor**: Gaussian bunch profile and `k = -sum(lambda W ds)`
//! - **Impedance**: Direct causal DFT and zero-padded decimated FFT
//! - **Field Probe**: Time trace at a z position and its dominant frequency
//! - **Comparison**: Agreement metrics against reference solver output

pub mod error;
pub mod fft;
pub mod interpolation;
pub mod resample;
pub mod wake;
pub mod loss;
pub mod impedance;
pub mod probe;
pub mod comparison;

pub use error::{DspError, DspResult};
pub use fft::FftEngine;
pub use wake::{compute_wake_potential, BoundaryPolicy, WakeIntegrator, WakeParams};
pub use loss::{charge_distribution, loss_factor};
pub use impedance::{impedance, DegeneratePolicy, DftConvention, ImpedanceConfig, ImpedanceMethod};
pub use comparison::{compare, ComparisonSummary};
