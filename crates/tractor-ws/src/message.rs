//! Stream message types.

use crate::error::WsResult;
use serde::{Deserialize, Serialize};
use tractor_core::{ControlState, TelemetrySample};

/// Envelope discriminator sent in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    /// First message after the backend accepts the connection.
    InitialData,
    /// Pushed on every new reading.
    DataUpdate,
}

impl EnvelopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitialData => "initial_data",
            Self::DataUpdate => "data_update",
        }
    }
}

/// One inbound frame on the `/ws` channel.
///
/// ```json
/// {"type": "data_update",
///  "data": {"velocity": 15.0, "rpm": 1900, "gear": 3.0, "timestamp": "..."},
///  "mqtt_connected": true,
///  "control": {"mode": "manual", "pedal": true, "brake": false}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEnvelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    pub data: TelemetrySample,
    /// Backend-to-machine link status.
    pub mqtt_connected: bool,
    /// Authoritative control state, when the backend includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlState>,
}

/// Decode a text frame into an envelope.
pub fn decode_envelope(text: &str) -> WsResult<StreamEnvelope> {
    Ok(serde_json::from_str(text)?)
}
