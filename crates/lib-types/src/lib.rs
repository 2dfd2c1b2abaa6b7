//! # lib-types
//!
//! Core type definitions for cavity wake-potential analysis.
//!
//! This crate provides foundational types used throughout the workspace:
//! - Physical units with compile-time safety
//! - Sampled axes and space-time field maps
//! - Wake potential and bunch charge profiles
//! - Impedance spectra and resonance peaks
//! - Reference solver results

pub mod units;
pub mod axis;
pub mod field;
pub mod wake;
pub mod spectrum;
pub mod reference;

pub use units::*;
pub use field::FieldMap;
pub use wake::*;
pub use spectrum::*;
pub use reference::ReferenceData;

/// Re-export num_complex for convenience
pub use num_complex::Complex64;
