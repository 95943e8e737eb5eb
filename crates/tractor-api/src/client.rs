//! HTTP client for the tractor backend.

use crate::error::{ApiError, ApiResult};
use crate::types::BackendStatus;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the backend's REST endpoints.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// HTTP client.
    client: Client,
    /// Base URL without trailing slash (e.g. "http://localhost:8000").
    base_url: String,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    /// * `base_url` - Backend root (e.g., "http://localhost:8000")
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Fetch the backend status summary.
    pub async fn fetch_status(&self) -> ApiResult<BackendStatus> {
        info!(url = %self.base_url, "Fetching backend status");
        let response = self
            .client
            .get(self.url("/api/status"))
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("HTTP request failed: {e}")))?;
        decode_json(response).await
    }
}

/// Fail on non-2xx, keeping the body for diagnostics.
pub(crate) async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Check the status, then decode the body as JSON.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let response = check_status(response).await?;
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::Network(format!("Failed to read response body: {e}")))?;
    debug!(len = body.len(), "Response body received");
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{e}")))
}
