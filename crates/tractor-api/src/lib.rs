//! REST client for the tractor backend.
//!
//! Covers every HTTP endpoint the dashboard talks to:
//! - Bootstrap: current reading and recent history
//! - Control: `POST /api/control` with the full control state
//! - Export: CSV download as an opaque blob
//! - Backend status summary

pub mod bootstrap;
pub mod client;
pub mod control;
pub mod error;
pub mod export;
pub mod types;

pub use client::{ApiClient, DEFAULT_TIMEOUT};
pub use error::{ApiError, ApiResult};
pub use types::{BackendStatus, CurrentReading, ExportBlob};
