//! Error types for tractor-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid history capacity: {0}")]
    InvalidCapacity(usize),

    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Invalid control mode: {0}")]
    InvalidMode(String),
}

/// Result type alias for core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
