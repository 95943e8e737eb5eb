//! Synchronization coordinator actor.
//!
//! One task owns [`SyncState`] and processes, in arrival order:
//! - Stream events from the [`StreamClient`]
//! - The two bootstrap fetch results, each reported exactly once
//! - User intents from [`SyncHandle`]
//!
//! After every change it publishes a [`SyncSnapshot`] on a watch channel.
//! Observers read the latest snapshot or subscribe for changes; dropping a
//! subscription unsubscribes.
//!
//! Teardown cancels the stream client and ends the actor. Bootstrap fetches
//! still in flight are allowed to finish; their reports find a closed inbox
//! and are discarded.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tractor_api::{ApiClient, ApiResult, CurrentReading};
use tractor_core::{ControlIntent, ControlMode, TelemetrySample, HISTORY_CAPACITY};
use tractor_telemetry::Metrics;
use tractor_ws::{Connector, StreamClient, StreamConfig, StreamEvent, StreamStats, StreamStatsHandle};

use crate::dispatcher::{CommandDispatcher, CommandReceipt};
use crate::error::{SyncError, SyncResult};
use crate::state::{SyncSnapshot, SyncState};

const INBOX_CAPACITY: usize = 64;
const STREAM_EVENT_CAPACITY: usize = 256;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub stream: StreamConfig,
    /// Samples retained for trend display.
    pub history_capacity: usize,
    /// `limit` sent with the bootstrap history fetch.
    pub history_limit: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            history_capacity: HISTORY_CAPACITY,
            history_limit: HISTORY_CAPACITY,
        }
    }
}

// ============================================================================
// SyncMsg
// ============================================================================

/// Messages for the coordinator actor.
#[derive(Debug)]
enum SyncMsg {
    /// Bootstrap current-reading fetch settled.
    BootstrapCurrent(ApiResult<CurrentReading>),

    /// Bootstrap history fetch settled.
    BootstrapHistory(ApiResult<Vec<TelemetrySample>>),

    /// User intent; the receipt is returned once local state is updated.
    Intent {
        intent: ControlIntent,
        reply: oneshot::Sender<CommandReceipt>,
    },
}

// ============================================================================
// SyncTask
// ============================================================================

struct SyncTask {
    rx: mpsc::Receiver<SyncMsg>,
    stream_rx: mpsc::Receiver<StreamEvent>,
    state: SyncState,
    dispatcher: CommandDispatcher,
    snapshot_tx: Arc<watch::Sender<SyncSnapshot>>,
    shutdown: CancellationToken,
}

impl SyncTask {
    async fn run(mut self) {
        debug!("SyncTask started");

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => {
                    debug!("SyncTask shutting down");
                    break;
                }

                msg = self.rx.recv() => match msg {
                    Some(msg) => self.handle_message(msg),
                    None => {
                        debug!("All handles dropped");
                        break;
                    }
                },

                Some(event) = self.stream_rx.recv() => self.on_stream_event(event),
            }
        }

        // Stops the stream client when the actor ends on its own
        self.shutdown.cancel();
        debug!("SyncTask terminated");
    }

    fn handle_message(&mut self, msg: SyncMsg) {
        match msg {
            SyncMsg::BootstrapCurrent(result) => {
                Metrics::bootstrap("current", result.is_ok());
                let reading = result
                    .map_err(|e| warn!(error = %e, "Bootstrap current fetch failed"))
                    .ok();
                let received = reading.is_some();
                self.state.apply_bootstrap_current(reading);
                // The gauge follows the state; a superseded reading changes neither
                if received {
                    Metrics::remote_link(self.state.connection().remote_link_connected);
                }
            }
            SyncMsg::BootstrapHistory(result) => {
                Metrics::bootstrap("history", result.is_ok());
                let samples = result
                    .map_err(|e| warn!(error = %e, "Bootstrap history fetch failed"))
                    .ok();
                if let Some(samples) = &samples {
                    debug!(count = samples.len(), "Bootstrap history received");
                }
                self.state.apply_bootstrap_history(samples);
                Metrics::history_len(self.state.history().len());
            }
            SyncMsg::Intent { intent, reply } => {
                let receipt = self.dispatcher.dispatch(self.state.control(), intent);
                info!(intent = intent.label(), state = %receipt.state, "Control intent applied");
                self.state.set_control(receipt.state);
                if reply.send(receipt).is_err() {
                    debug!("Intent caller went away before receipt");
                }
            }
        }
        self.publish();
    }

    fn on_stream_event(&mut self, event: StreamEvent) {
        match &event {
            StreamEvent::Open => {
                debug!("Applying stream open");
                Metrics::stream_connected();
            }
            StreamEvent::Close => {
                debug!("Applying stream close");
                Metrics::stream_closed();
            }
            StreamEvent::Message(envelope) => {
                Metrics::stream_message(envelope.kind.as_str());
                Metrics::remote_link(envelope.mqtt_connected);
            }
        }

        self.state.apply_stream_event(event);
        Metrics::history_len(self.state.history().len());
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.snapshot());
    }
}

// ============================================================================
// SyncCoordinator
// ============================================================================

/// Builder for the coordinator actor and its stream client.
pub struct SyncCoordinator<C: Connector> {
    config: SyncConfig,
    api: ApiClient,
    connector: C,
}

impl<C: Connector> SyncCoordinator<C> {
    pub fn new(config: SyncConfig, api: ApiClient, connector: C) -> Self {
        Self {
            config,
            api,
            connector,
        }
    }

    /// Start the actor, the stream client, and both bootstrap fetches.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(self) -> SyncResult<SyncHandle> {
        let mut state = SyncState::new(self.config.history_capacity)?;
        state.begin_bootstrap();

        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let (stream_tx, stream_rx) = mpsc::channel(STREAM_EVENT_CAPACITY);
        let snapshot_tx = Arc::new(watch::Sender::new(state.snapshot()));

        let stream = StreamClient::new(self.config.stream.clone(), self.connector, stream_tx);
        let shutdown = stream.shutdown_token();
        let stream_stats = stream.stats_handle();

        let task = SyncTask {
            rx,
            stream_rx,
            state,
            dispatcher: CommandDispatcher::new(self.api.clone()),
            snapshot_tx: snapshot_tx.clone(),
            shutdown: shutdown.clone(),
        };

        info!(
            backend = %self.api.base_url(),
            stream = %self.config.stream.url,
            "Starting sync coordinator"
        );
        let actor = tokio::spawn(task.run());
        let stream = tokio::spawn(stream.run());
        spawn_bootstrap(&self.api, self.config.history_limit, &tx);

        Ok(SyncHandle {
            tx,
            snapshot_tx,
            shutdown,
            stream_stats,
            tasks: Arc::new(Mutex::new(vec![actor, stream])),
        })
    }
}

/// Fire both bootstrap fetches concurrently.
///
/// Each reports exactly once. Reports arriving after teardown are dropped.
fn spawn_bootstrap(api: &ApiClient, history_limit: usize, tx: &mpsc::Sender<SyncMsg>) {
    let (current_api, current_tx) = (api.clone(), tx.clone());
    tokio::spawn(async move {
        let result = current_api.fetch_current().await;
        if current_tx.send(SyncMsg::BootstrapCurrent(result)).await.is_err() {
            debug!("Bootstrap current settled after teardown");
        }
    });

    let (history_api, history_tx) = (api.clone(), tx.clone());
    tokio::spawn(async move {
        let result = history_api.fetch_history(history_limit).await;
        if history_tx.send(SyncMsg::BootstrapHistory(result)).await.is_err() {
            debug!("Bootstrap history settled after teardown");
        }
    });
}

// ============================================================================
// SyncHandle
// ============================================================================

/// Cloneable handle to a running coordinator.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<SyncMsg>,
    snapshot_tx: Arc<watch::Sender<SyncSnapshot>>,
    shutdown: CancellationToken,
    stream_stats: StreamStatsHandle,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SyncHandle {
    /// Latest published state.
    pub fn snapshot(&self) -> SyncSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Subscribe to state changes. The current snapshot counts as seen.
    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub async fn switch_mode(&self, mode: ControlMode) -> SyncResult<CommandReceipt> {
        self.apply_intent(ControlIntent::SwitchMode(mode)).await
    }

    pub async fn press_pedal(&self, pressed: bool) -> SyncResult<CommandReceipt> {
        self.apply_intent(ControlIntent::Pedal(pressed)).await
    }

    pub async fn press_brake(&self, pressed: bool) -> SyncResult<CommandReceipt> {
        self.apply_intent(ControlIntent::Brake(pressed)).await
    }

    /// Apply an intent locally and send the resulting state to the controller.
    ///
    /// Returns once the local state has changed; delivery continues in the
    /// background.
    pub async fn apply_intent(&self, intent: ControlIntent) -> SyncResult<CommandReceipt> {
        if self.shutdown.is_cancelled() {
            return Err(SyncError::Stopped);
        }
        let (reply, receipt) = oneshot::channel();
        self.tx
            .send(SyncMsg::Intent { intent, reply })
            .await
            .map_err(|_| SyncError::Stopped)?;
        receipt.await.map_err(|_| SyncError::Stopped)
    }

    pub fn stream_stats(&self) -> StreamStats {
        self.stream_stats.snapshot()
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Resolves once the coordinator has been told to stop or has ended on
    /// its own.
    pub async fn stopped(&self) {
        self.shutdown.cancelled().await;
    }

    /// Request teardown of the stream and the actor.
    pub fn shutdown(&self) {
        info!("Sync coordinator shutdown requested");
        self.shutdown.cancel();
    }

    /// Wait for the actor and the stream client to finish.
    pub async fn wait(&self) {
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Sync task ended abnormally");
            }
        }
    }
}
