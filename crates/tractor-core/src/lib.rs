//! Core domain types for the tractor telemetry client.
//!
//! This crate provides the state model shared by every other crate:
//! - `TelemetrySample`: one timestamped velocity/rpm/gear reading
//! - `HistoryBuffer`: bounded FIFO of samples for trend display
//! - `ControlState`: mode + pedal/brake with mutual exclusion
//! - `ConnectionState`: stream vs remote-link connectivity

pub mod connection;
pub mod control;
pub mod error;
pub mod history;
pub mod sample;

pub use connection::{ConnectionState, LinkIndicator};
pub use control::{ControlIntent, ControlMode, ControlState};
pub use error::{CoreError, CoreResult};
pub use history::{HistoryBuffer, HISTORY_CAPACITY};
pub use sample::TelemetrySample;
