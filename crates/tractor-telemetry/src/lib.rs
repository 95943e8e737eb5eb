//! Prometheus metrics and structured logging for the tractor client.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters and gauges for stream, bootstrap and control paths

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
