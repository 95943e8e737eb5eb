//! Control command delivery.

use crate::client::{check_status, ApiClient};
use crate::error::{ApiError, ApiResult};
use tracing::debug;
use tractor_core::ControlState;

impl ApiClient {
    /// Send the full control state to the controller.
    ///
    /// Success is any 2xx; the response body is not inspected.
    pub async fn send_control(&self, state: &ControlState) -> ApiResult<()> {
        debug!(%state, "Sending control command");
        let response = self
            .http()
            .post(self.url("/api/control"))
            .json(state)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("HTTP request failed: {e}")))?;

        check_status(response).await?;
        Ok(())
    }
}
