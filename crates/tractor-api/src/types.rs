//! Request and response bodies.

use serde::{Deserialize, Serialize};
use tractor_core::TelemetrySample;

/// Latest reading with the backend's remote-link status.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentReading {
    #[serde(rename = "data")]
    pub sample: TelemetrySample,
    #[serde(rename = "mqtt_connected")]
    pub remote_link_connected: bool,
}

/// `GET /api/data/historical` body.
#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    pub data: Vec<TelemetrySample>,
    #[serde(default)]
    pub total_points: Option<u64>,
}

/// `GET /api/status` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub mqtt_connected: bool,
    /// Rows the backend has buffered for export.
    pub data_points: u64,
    /// Timestamp of the last reading, as the backend formats it.
    pub last_update: Option<String>,
}

/// Downloaded export payload. Contents are not interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBlob {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}
