//! Harness Error Types

use conv_kernels::ConvError;
use thiserror::Error;

/// Errors raised while running a sweep
#[derive(Debug, Error)]
pub enum BenchError {
    /// Kernel rejected its inputs
    #[error("Kernel error: {0}")]
    Kernel(#[from] ConvError),

    /// Configuration could not be loaded or deserialised
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration loaded but describes an impossible sweep
    #[error("Invalid sweep: {0}")]
    InvalidSweep(String),

    /// Report could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for the harness
pub type Result<T> = std::result::Result<T, BenchError>;
