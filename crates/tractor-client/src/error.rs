//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Api(#[from] tractor_api::ApiError),

    #[error("Sync error: {0}")]
    Sync(#[from] tractor_sync::SyncError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] tractor_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
