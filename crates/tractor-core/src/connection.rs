//! Connectivity status.
//!
//! Two independent links are tracked: the client's stream to the backend,
//! and the backend's own link to the machine bus (MQTT).

use serde::Serialize;
use std::fmt;

/// Stream and remote-link connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConnectionState {
    /// Client stream to the backend is open.
    pub stream_connected: bool,
    /// Backend reports it is linked to the machine.
    pub remote_link_connected: bool,
}

impl ConnectionState {
    /// Collapse both links into the single status shown to the user.
    ///
    /// A remote-link flag is only meaningful while the stream is up;
    /// otherwise it is the last value the backend reported.
    pub fn indicator(&self) -> LinkIndicator {
        match (self.stream_connected, self.remote_link_connected) {
            (false, _) => LinkIndicator::BackendOffline,
            (true, true) => LinkIndicator::RemoteLinkUp,
            (true, false) => LinkIndicator::RemoteLinkDown,
        }
    }

    /// Both links up.
    pub fn is_fully_connected(&self) -> bool {
        self.stream_connected && self.remote_link_connected
    }
}

/// User-facing connectivity summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkIndicator {
    BackendOffline,
    RemoteLinkUp,
    RemoteLinkDown,
}

impl fmt::Display for LinkIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendOffline => write!(f, "Backend Offline"),
            Self::RemoteLinkUp => write!(f, "MQTT Connected"),
            Self::RemoteLinkDown => write!(f, "MQTT Disconnected"),
        }
    }
}
