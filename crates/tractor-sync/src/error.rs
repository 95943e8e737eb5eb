//! Coordinator error types.

use thiserror::Error;
use tractor_api::ApiError;
use tractor_core::{ControlState, CoreError};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Coordinator stopped")]
    Stopped,

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// A control command the controller did not acknowledge.
///
/// Logged and counted only; the local control state is kept.
#[derive(Debug, Error)]
#[error("Control command not delivered ({state}): {source}")]
pub struct CommandDeliveryError {
    pub state: ControlState,
    #[source]
    pub source: ApiError,
}
