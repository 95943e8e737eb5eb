//! Synchronization coordinator for the tractor telemetry client.
//!
//! Combines the three data paths into one observable state:
//! - Bootstrap REST fetches seed current and historical samples at start
//! - The stream keeps them live and is authoritative for control state
//! - User intents update control state optimistically and are sent to the
//!   controller fire-and-forget
//!
//! All mutation happens inside a single actor task; the presentation layer
//! reads snapshots or subscribes to changes through a [`SyncHandle`].

pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod state;

pub use coordinator::{SyncConfig, SyncCoordinator, SyncHandle};
pub use dispatcher::{CommandDispatcher, CommandReceipt};
pub use error::{CommandDeliveryError, SyncError, SyncResult};
pub use state::{SyncPhase, SyncSnapshot, SyncState};
