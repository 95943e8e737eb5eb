//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use tractor_sync::SyncConfig;
use tractor_ws::StreamConfig;

/// Config file used when neither `--config` nor `TRACTOR_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "TRACTOR_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend REST base URL.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Stream URL. Derived from `backend_url` when unset.
    #[serde(default)]
    pub stream_url: Option<String>,
    /// Fixed reconnect delay (ms). Default: 3,000.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Rolling history capacity. Default: 50.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Bootstrap history `limit`. Default: 50.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// REST request timeout (ms). Default: 10,000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Directory CSV exports are written to.
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    3_000
}

fn default_history_capacity() -> usize {
    50
}

fn default_history_limit() -> usize {
    50
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            stream_url: None,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            history_capacity: default_history_capacity(),
            history_limit: default_history_limit(),
            request_timeout_ms: default_request_timeout_ms(),
            export_dir: default_export_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Resolve the config source: explicit path > `TRACTOR_CONFIG` >
    /// `config/default.toml` if present > built-in defaults.
    ///
    /// An explicitly named file must exist.
    pub fn load(explicit: Option<String>) -> AppResult<Self> {
        if let Some(path) = explicit.or_else(|| std::env::var(CONFIG_ENV).ok()) {
            debug!(path = %path, "Loading named config file");
            return Self::from_file(path);
        }
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            debug!(path = DEFAULT_CONFIG_PATH, "Loading default config file");
            return Self::from_file(DEFAULT_CONFIG_PATH);
        }
        debug!("No config file, using built-in defaults");
        Ok(Self::default())
    }

    /// Override the backend URL. An explicit `stream_url` is kept; a derived
    /// one follows the new backend.
    #[must_use]
    pub fn with_backend(mut self, backend_url: impl Into<String>) -> Self {
        self.backend_url = backend_url.into();
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.history_capacity == 0 {
            return Err(AppError::Config("history_capacity must be > 0".to_string()));
        }
        if self.history_limit == 0 {
            return Err(AppError::Config("history_limit must be > 0".to_string()));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(AppError::Config("reconnect_delay_ms must be > 0".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(AppError::Config("request_timeout_ms must be > 0".to_string()));
        }
        self.resolved_stream_url().map(|_| ())
    }

    /// Configured stream URL, or one derived from the backend URL.
    pub fn resolved_stream_url(&self) -> AppResult<String> {
        match &self.stream_url {
            Some(url) => Ok(url.clone()),
            None => derive_stream_url(&self.backend_url),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn sync_config(&self) -> AppResult<SyncConfig> {
        Ok(SyncConfig {
            stream: StreamConfig {
                url: self.resolved_stream_url()?,
                reconnect_delay_ms: self.reconnect_delay_ms,
            },
            history_capacity: self.history_capacity,
            history_limit: self.history_limit,
        })
    }
}

/// `http://host:port[/]` -> `ws://host:port/ws`, `https` -> `wss`.
fn derive_stream_url(backend_url: &str) -> AppResult<String> {
    let base = backend_url.trim_end_matches('/');
    let (scheme, rest) = if let Some(rest) = base.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        ("ws", rest)
    } else {
        return Err(AppError::Config(format!(
            "backend_url must start with http:// or https://: {backend_url}"
        )));
    };
    Ok(format!("{scheme}://{rest}/ws"))
}
