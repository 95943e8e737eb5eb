//! Prometheus metrics for the tractor client.
//!
//! Covers:
//! - Stream and remote-link connectivity
//! - Stream traffic by envelope kind
//! - Bootstrap fetch outcomes
//! - Control command delivery
//! - History fill level
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, a programming error that should crash at
//! first use rather than fail silently.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_int_counter, register_int_gauge, CounterVec,
    Encoder, Gauge, IntCounter, IntGauge, TextEncoder,
};

/// Stream connection state (1 = connected, 0 = disconnected).
pub static STREAM_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "tractor_stream_connected",
        "Stream connection state (1=connected)"
    )
    .unwrap()
});

/// Backend-reported link to the machine (1 = connected).
pub static REMOTE_LINK_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "tractor_remote_link_connected",
        "Backend MQTT link state as last reported (1=connected)"
    )
    .unwrap()
});

/// Stream closes (each one schedules a reconnect).
pub static STREAM_CLOSED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "tractor_stream_closed_total",
        "Total stream closes and failed connection attempts"
    )
    .unwrap()
});

/// Stream envelopes applied, by kind.
pub static STREAM_MESSAGES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tractor_stream_messages_total",
        "Total stream envelopes applied",
        &["kind"]
    )
    .unwrap()
});

/// Bootstrap fetches, by fetch and outcome.
pub static BOOTSTRAP_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tractor_bootstrap_total",
        "Bootstrap fetch results",
        &["fetch", "outcome"]
    )
    .unwrap()
});

/// Control commands, by intent and outcome.
pub static CONTROL_COMMANDS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tractor_control_commands_total",
        "Control commands sent to the controller",
        &["intent", "outcome"]
    )
    .unwrap()
});

/// Samples currently held for trend display.
pub static HISTORY_LEN: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("tractor_history_len", "Samples in the rolling history").unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record stream opened.
    pub fn stream_connected() {
        STREAM_CONNECTED.set(1.0);
    }

    /// Record stream closed (or a connection attempt failed).
    pub fn stream_closed() {
        STREAM_CONNECTED.set(0.0);
        STREAM_CLOSED_TOTAL.inc();
    }

    /// Record the backend's reported link state.
    pub fn remote_link(connected: bool) {
        REMOTE_LINK_CONNECTED.set(if connected { 1.0 } else { 0.0 });
    }

    /// Record an applied stream envelope.
    pub fn stream_message(kind: &str) {
        STREAM_MESSAGES_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record a bootstrap fetch result.
    pub fn bootstrap(fetch: &str, ok: bool) {
        BOOTSTRAP_TOTAL
            .with_label_values(&[fetch, if ok { "ok" } else { "error" }])
            .inc();
    }

    /// Record a control command delivery result.
    pub fn control_command(intent: &str, ok: bool) {
        CONTROL_COMMANDS_TOTAL
            .with_label_values(&[intent, if ok { "delivered" } else { "failed" }])
            .inc();
    }

    /// Set the current history length.
    pub fn history_len(len: usize) {
        HISTORY_LEN.set(len as i64);
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
