//! Stream client with fixed-delay reconnection.
//!
//! The client runs a single connect → receive → wait loop. Because the
//! reconnect wait is a step of that loop, at most one reconnect can ever be
//! pending, and a fresh open always follows a completed wait.
//!
//! Reconnection is unconditional and indefinite with a constant delay. The
//! backend lives on a local, trusted network; there is no backoff growth and
//! no attempt ceiling.

use crate::error::WsError;
use crate::message::{decode_envelope, StreamEnvelope};
use crate::transport::{Connector, Transport};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Delay between a close and the next connection attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Stream client configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket URL of the backend's `/ws` endpoint.
    pub url: String,
    /// Fixed delay before reconnecting after a close.
    pub reconnect_delay_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000/ws".to_string(),
            reconnect_delay_ms: RECONNECT_DELAY.as_millis() as u64,
        }
    }
}

/// Lifecycle and data events delivered to the subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A connection was established.
    Open,
    /// A well-formed envelope arrived.
    Message(StreamEnvelope),
    /// The connection closed, failed, or could not be established.
    Close,
}

/// Connection counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Connection attempts since start.
    pub connect_attempts: u64,
    /// Failed attempts since the last successful open.
    pub consecutive_failures: u32,
    /// Envelopes decoded and forwarded.
    pub messages_decoded: u64,
    /// Frames dropped as malformed.
    pub messages_dropped: u64,
}

/// Shared read access to a client's counters.
#[derive(Debug, Clone, Default)]
pub struct StreamStatsHandle(Arc<RwLock<StreamStats>>);

impl StreamStatsHandle {
    pub fn snapshot(&self) -> StreamStats {
        *self.0.read()
    }

    fn update(&self, f: impl FnOnce(&mut StreamStats)) {
        f(&mut self.0.write());
    }
}

/// Why a receive loop ended.
enum ReceiveOutcome {
    Closed,
    Shutdown,
    SubscriberGone,
}

/// Client side of the `/ws` channel.
pub struct StreamClient<C: Connector> {
    config: StreamConfig,
    connector: C,
    events: mpsc::Sender<StreamEvent>,
    stats: StreamStatsHandle,
    /// Cancellation token for graceful shutdown.
    shutdown_token: CancellationToken,
}

impl<C: Connector> StreamClient<C> {
    /// Create a client that reports to `events`.
    pub fn new(config: StreamConfig, connector: C, events: mpsc::Sender<StreamEvent>) -> Self {
        Self {
            config,
            connector,
            events,
            stats: StreamStatsHandle::default(),
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Token that stops the client when cancelled.
    ///
    /// Cancelling closes an open connection and abandons a pending reconnect.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn stats_handle(&self) -> StreamStatsHandle {
        self.stats.clone()
    }

    fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.config.reconnect_delay_ms)
    }

    /// Run connection attempts until shutdown or until the subscriber is gone.
    pub async fn run(self) {
        info!(url = %self.config.url, "Stream client started");

        loop {
            if self.shutdown_token.is_cancelled() {
                break;
            }

            self.stats.update(|s| s.connect_attempts += 1);

            let connected = tokio::select! {
                biased;
                () = self.shutdown_token.cancelled() => break,
                result = self.connector.connect(&self.config.url) => result,
            };

            match connected {
                Ok(mut transport) => {
                    self.stats.update(|s| s.consecutive_failures = 0);
                    info!("Stream connected");

                    if !self.emit(StreamEvent::Open).await {
                        transport.close().await;
                        break;
                    }

                    match self.receive(&mut transport).await {
                        ReceiveOutcome::Closed => {}
                        ReceiveOutcome::Shutdown => {
                            info!("Shutdown requested, closing stream");
                            transport.close().await;
                            break;
                        }
                        ReceiveOutcome::SubscriberGone => {
                            transport.close().await;
                            break;
                        }
                    }
                }
                Err(e) => {
                    let attempt = self.stats.snapshot().connect_attempts;
                    self.stats.update(|s| s.consecutive_failures += 1);
                    warn!(error = %e, attempt, "Stream connection failed");
                }
            }

            // Failed opens are reported exactly like closes
            if !self.emit(StreamEvent::Close).await {
                break;
            }

            let delay = self.reconnect_delay();
            info!(delay_ms = delay.as_millis() as u64, "Reconnecting");

            tokio::select! {
                biased;
                () = self.shutdown_token.cancelled() => {
                    info!("Shutdown requested during reconnect wait");
                    break;
                }
                () = tokio::time::sleep(delay) => {}
            }
        }

        info!("Stream client stopped");
    }

    async fn receive(&self, transport: &mut C::Transport) -> ReceiveOutcome {
        loop {
            let frame = tokio::select! {
                biased;
                () = self.shutdown_token.cancelled() => return ReceiveOutcome::Shutdown,
                frame = transport.next_text() => frame,
            };

            match frame {
                Some(Ok(text)) => match decode_envelope(&text) {
                    Ok(envelope) => {
                        self.stats.update(|s| s.messages_decoded += 1);
                        if !self.emit(StreamEvent::Message(envelope)).await {
                            return ReceiveOutcome::SubscriberGone;
                        }
                    }
                    Err(e) => {
                        self.stats.update(|s| s.messages_dropped += 1);
                        warn!(error = %e, len = text.len(), "Dropping malformed stream message");
                    }
                },
                Some(Err(WsError::ConnectionClosed { code, reason })) => {
                    info!(code, %reason, "Stream closed");
                    return ReceiveOutcome::Closed;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Stream read error");
                    return ReceiveOutcome::Closed;
                }
                None => {
                    info!("Stream ended");
                    return ReceiveOutcome::Closed;
                }
            }
        }
    }

    /// Deliver an event; `false` when nobody is listening any more.
    async fn emit(&self, event: StreamEvent) -> bool {
        if self.events.send(event).await.is_err() {
            debug!("Stream event receiver dropped, stopping client");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WsResult;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::future::Future;
    use tokio::time::Instant;

    struct ScriptedTransport {
        rx: mpsc::UnboundedReceiver<String>,
    }

    impl Transport for ScriptedTransport {
        fn next_text(&mut self) -> impl Future<Output = Option<WsResult<String>>> + Send {
            async move { self.rx.recv().await.map(Ok) }
        }

        fn close(&mut self) -> impl Future<Output = ()> + Send {
            async move { self.rx.close() }
        }
    }

    enum Script {
        Fail,
        Open(mpsc::UnboundedReceiver<String>),
    }

    /// Connector that replays a fixed script and records attempt times.
    #[derive(Clone, Default)]
    struct ScriptedConnector {
        scripts: Arc<Mutex<VecDeque<Script>>>,
        attempts: Arc<Mutex<Vec<Instant>>>,
    }

    impl ScriptedConnector {
        fn push_fail(&self) {
            self.scripts.lock().push_back(Script::Fail);
        }

        fn push_open(&self) -> mpsc::UnboundedSender<String> {
            let (tx, rx) = mpsc::unbounded_channel();
            self.scripts.lock().push_back(Script::Open(rx));
            tx
        }

        fn attempts(&self) -> Vec<Instant> {
            self.attempts.lock().clone()
        }
    }

    impl Connector for ScriptedConnector {
        type Transport = ScriptedTransport;

        fn connect(&self, _url: &str) -> impl Future<Output = WsResult<Self::Transport>> + Send {
            self.attempts.lock().push(Instant::now());
            let next = self.scripts.lock().pop_front();
            async move {
                match next {
                    Some(Script::Open(rx)) => Ok(ScriptedTransport { rx }),
                    _ => Err(WsError::ConnectionFailed("refused".to_string())),
                }
            }
        }
    }

    fn data_update(velocity: f64) -> String {
        json!({
            "type": "data_update",
            "data": {"velocity": velocity, "rpm": 1500, "gear": 2, "timestamp": "2025-03-01T10:00:00"},
            "mqtt_connected": true
        })
        .to_string()
    }

    fn spawn_client(
        connector: &ScriptedConnector,
    ) -> (
        mpsc::Receiver<StreamEvent>,
        CancellationToken,
        StreamStatsHandle,
        tokio::task::JoinHandle<()>,
    ) {
        let (tx, rx) = mpsc::channel(64);
        let client = StreamClient::new(StreamConfig::default(), connector.clone(), tx);
        let token = client.shutdown_token();
        let stats = client.stats_handle();
        let handle = tokio::spawn(client.run());
        (rx, token, stats, handle)
    }

    fn assert_delay(elapsed: Duration) {
        assert!(
            elapsed >= RECONNECT_DELAY && elapsed < RECONNECT_DELAY + Duration::from_millis(5),
            "reconnect after {elapsed:?}"
        );
    }

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.reconnect_delay_ms, 3000);
        assert!(config.url.ends_with("/ws"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_schedules_exactly_one_reconnect_after_delay() {
        let connector = ScriptedConnector::default();
        let first = connector.push_open();
        let _second = connector.push_open();
        let (mut events, token, _stats, handle) = spawn_client(&connector);

        assert_eq!(events.recv().await, Some(StreamEvent::Open));
        drop(first);
        assert_eq!(events.recv().await, Some(StreamEvent::Close));
        let closed_at = Instant::now();

        tokio::time::sleep(Duration::from_millis(2990)).await;
        assert_eq!(connector.attempts().len(), 1, "no reconnect before the delay");

        tokio::time::sleep(Duration::from_millis(20)).await;
        let attempts = connector.attempts();
        assert_eq!(attempts.len(), 2, "exactly one reconnect after the delay");
        assert_delay(attempts[1] - closed_at);
        assert_eq!(events.recv().await, Some(StreamEvent::Open));

        // The second connection stays up: no further attempts
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(connector.attempts().len(), 2);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_is_treated_as_close() {
        let connector = ScriptedConnector::default();
        connector.push_fail();
        connector.push_fail();
        let _open = connector.push_open();
        let (mut events, token, stats, handle) = spawn_client(&connector);

        assert_eq!(events.recv().await, Some(StreamEvent::Close));
        assert_eq!(stats.snapshot().consecutive_failures, 1);
        assert_eq!(events.recv().await, Some(StreamEvent::Close));
        assert_eq!(events.recv().await, Some(StreamEvent::Open));

        let attempts = connector.attempts();
        assert_eq!(attempts.len(), 3);
        assert_delay(attempts[1] - attempts[0]);
        assert_delay(attempts[2] - attempts[1]);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.connect_attempts, 3);
        assert_eq!(snapshot.consecutive_failures, 0);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_frame_dropped_connection_kept() {
        let connector = ScriptedConnector::default();
        let tx = connector.push_open();
        let (mut events, token, stats, handle) = spawn_client(&connector);

        assert_eq!(events.recv().await, Some(StreamEvent::Open));
        tx.send("{not json".to_string()).unwrap();
        tx.send(json!({"type": "data_update"}).to_string()).unwrap();
        tx.send(data_update(15.0)).unwrap();

        match events.recv().await {
            Some(StreamEvent::Message(envelope)) => assert_eq!(envelope.data.velocity, 15.0),
            other => panic!("expected message, got {other:?}"),
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.messages_dropped, 2);
        assert_eq!(snapshot.messages_decoded, 1);
        assert_eq!(snapshot.connect_attempts, 1);

        token.cancel();
        handle.await.unwrap();
        assert!(tx.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_reconnect_wait_suppresses_reconnect() {
        let connector = ScriptedConnector::default();
        connector.push_fail();
        let (mut events, token, _stats, handle) = spawn_client(&connector);

        assert_eq!(events.recv().await, Some(StreamEvent::Close));
        token.cancel();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(connector.attempts().len(), 1);
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_closes_open_connection_without_close_event() {
        let connector = ScriptedConnector::default();
        let tx = connector.push_open();
        let (mut events, token, _stats, handle) = spawn_client(&connector);

        assert_eq!(events.recv().await, Some(StreamEvent::Open));
        token.cancel();
        handle.await.unwrap();

        assert!(tx.is_closed());
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_stops_when_subscriber_dropped() {
        let connector = ScriptedConnector::default();
        connector.push_fail();
        let (events, _token, _stats, handle) = spawn_client(&connector);

        drop(events);
        handle.await.unwrap();
        assert_eq!(connector.attempts().len(), 1);
    }
}
