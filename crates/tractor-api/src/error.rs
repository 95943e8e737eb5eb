//! REST client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the backend answered at all (as opposed to a transport failure).
    pub fn is_status(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
