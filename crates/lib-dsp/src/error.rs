//! Error types for DSP operations.

use lib_types::units::Hertz;
use thiserror::Error;

/// Errors that can occur during DSP operations.
#[derive(Debug, Error)]
pub enum DspError {
    /// Input arrays are inconsistent, empty or non-monotonic.
    #[error("Malformed input ({what}): {detail}")]
    MalformedInput { what: &'static str, detail: String },

    /// Input length mismatch.
    #[error("Input length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Insufficient data for operation.
    #[error("Insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Retarded time mapped past the last recorded time sample.
    #[error(
        "Retarded time out of range at offset {offset_index}, z index {z_index}: \
         time bin {time_index} >= nt {nt}"
    )]
    NumericDomain {
        offset_index: usize,
        z_index: usize,
        time_index: usize,
        nt: usize,
    },

    /// Charge spectrum vanished at a bin used as divisor.
    #[error("Degenerate charge spectrum at bin {bin} ({:.4} GHz)", .frequency.as_ghz())]
    DegenerateSpectrum { bin: usize, frequency: Hertz },

    /// FFT size is unusable.
    #[error("Invalid FFT size: {0}")]
    InvalidFftSize(usize),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Numerical instability detected.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

impl DspError {
    /// Create a malformed input error.
    pub fn malformed(what: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedInput {
            what,
            detail: detail.into(),
        }
    }
}

/// Result type for DSP operations.
pub type DspResult<T> = Result<T, DspError>;
