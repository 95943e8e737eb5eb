//! CSV export download.
//!
//! The backend generates the file; this only retrieves the bytes and a
//! file name to save them under.

use crate::client::{check_status, ApiClient};
use crate::error::{ApiError, ApiResult};
use crate::types::ExportBlob;
use chrono::{NaiveDate, Utc};
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use tracing::info;

impl ApiClient {
    /// Download the backend's CSV export.
    ///
    /// A 404 means the backend has no data to export yet.
    pub async fn download_export(&self) -> ApiResult<ExportBlob> {
        let response = self
            .http()
            .get(self.url("/api/export/csv"))
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("HTTP request failed: {e}")))?;
        let response = check_status(response).await?;

        let headers = response.headers();
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition)
            .unwrap_or_else(|| default_file_name(Utc::now().date_naive()));
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read export body: {e}")))?
            .to_vec();

        info!(file_name = %file_name, size = bytes.len(), "Downloaded export");
        Ok(ExportBlob {
            file_name,
            content_type,
            bytes,
        })
    }
}

/// Extract `filename` from a `Content-Disposition` header value.
///
/// Path separators are stripped and `.`/`..` rejected, so the name is safe
/// to join onto a directory.
fn file_name_from_disposition(value: &str) -> Option<String> {
    let raw = value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))?;
    let name = raw.trim_matches('"');
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match name {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

fn default_file_name(date: NaiveDate) -> String {
    format!("tractor_data_{}.csv", date.format("%Y-%m-%d"))
}
