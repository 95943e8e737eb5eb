//! Streaming client for the tractor telemetry backend.
//!
//! Provides the client side of the `/ws` channel:
//! - Connection lifecycle with unconditional fixed-delay reconnection
//! - Envelope decoding (`initial_data` / `data_update`)
//! - Malformed-frame dropping without losing the connection
//! - Channel-based event delivery (`Open` / `Message` / `Close`)

pub mod client;
pub mod error;
pub mod message;
pub mod transport;

pub use client::{
    StreamClient, StreamConfig, StreamEvent, StreamStats, StreamStatsHandle, RECONNECT_DELAY,
};
pub use error::{WsError, WsResult};
pub use message::{decode_envelope, EnvelopeKind, StreamEnvelope};
pub use transport::{Connector, Transport, TungsteniteConnector, TungsteniteTransport};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any `wss://` connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
