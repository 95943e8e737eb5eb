//! One-shot bootstrap fetches.
//!
//! Used at startup to seed the dashboard while the stream connects. Neither
//! call retries; the caller decides what a failure means.

use crate::client::{decode_json, ApiClient};
use crate::error::{ApiError, ApiResult};
use crate::types::{CurrentReading, HistoryResponse};
use tracing::{debug, info};
use tractor_core::TelemetrySample;

impl ApiClient {
    /// Fetch the latest sample and the backend's remote-link status.
    ///
    /// The backend answers 404 until it has received a first reading.
    pub async fn fetch_current(&self) -> ApiResult<CurrentReading> {
        debug!("Fetching current reading");
        let response = self
            .http()
            .get(self.url("/api/data/current"))
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("HTTP request failed: {e}")))?;

        let reading: CurrentReading = decode_json(response).await?;
        info!(
            velocity = reading.sample.velocity,
            rpm = reading.sample.rpm,
            gear = reading.sample.gear,
            mqtt_connected = reading.remote_link_connected,
            "Fetched current reading"
        );
        Ok(reading)
    }

    /// Fetch up to `limit` recent samples in server order.
    ///
    /// If the server over-delivers, only the newest `limit` are kept.
    pub async fn fetch_history(&self, limit: usize) -> ApiResult<Vec<TelemetrySample>> {
        debug!(limit, "Fetching history");
        let response = self
            .http()
            .get(self.url("/api/data/historical"))
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("HTTP request failed: {e}")))?;

        let body: HistoryResponse = decode_json(response).await?;
        let mut samples = body.data;
        if samples.len() > limit {
            samples.drain(..samples.len() - limit);
        }

        info!(
            count = samples.len(),
            total_points = ?body.total_points,
            "Fetched history"
        );
        Ok(samples)
    }
}
