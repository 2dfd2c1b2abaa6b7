//! Error types for loading datasets and tables.

use thiserror::Error;

/// Errors that can occur while reading input data.
#[derive(Debug, Error)]
pub enum IoError {
    /// I/O error reading the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON or a value has the wrong JSON type.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Syntax error in an ASCII table.
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// Missing required key.
    #[error("Missing required key: {key}")]
    Missing { key: String },

    /// Array with the wrong length or dimensions.
    #[error("Invalid shape for {key}: {message}")]
    Shape { key: String, message: String },

    /// Value present but unusable.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl IoError {
    /// Create a syntax error at a specific location.
    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a missing key error.
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing { key: key.into() }
    }

    /// Create a shape error.
    pub fn shape(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Shape {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for errors describing the content rather than the transport.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Self::Missing { .. } | Self::Shape { .. } | Self::InvalidValue { .. } | Self::Syntax { .. }
        )
    }
}

/// Result type for loaders.
pub type IoResult<T> = Result<T, IoError>;
