//! Kernel Error Types

use thiserror::Error;

/// Errors raised by the correlation kernels
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvError {
    /// Inputs or parameters that cannot produce a well-defined result
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// FFT result deviates from the direct kernel beyond tolerance
    #[error("Numeric mismatch: relative error {relative_error:e} exceeds tolerance {tolerance:e}")]
    NumericMismatch { relative_error: f64, tolerance: f64 },
}

impl ConvError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ConvError::InvalidConfiguration(reason.into())
    }
}

/// Result alias used throughout the kernels
pub type Result<T> = std::result::Result<T, ConvError>;
