//! Pure synchronization state.
//!
//! `SyncState` owns every field the presentation layer observes and applies
//! inputs from the three data paths. It performs no I/O; the coordinator
//! task feeds it and publishes [`SyncSnapshot`]s after each change.

use serde::Serialize;
use tracing::{debug, info, warn};
use tractor_api::CurrentReading;
use tractor_core::{ConnectionState, ControlState, CoreResult, HistoryBuffer, TelemetrySample};
use tractor_ws::StreamEvent;

/// Coordinator lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Constructed, not started.
    #[default]
    Idle,
    /// Bootstrap fetches outstanding; stream events are applied meanwhile.
    Bootstrapping,
    /// Both bootstrap fetches settled.
    Live,
}

/// Read-only view published to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncSnapshot {
    pub phase: SyncPhase,
    pub current: Option<TelemetrySample>,
    /// Oldest first.
    pub history: Vec<TelemetrySample>,
    pub control: ControlState,
    pub connection: ConnectionState,
}

#[derive(Debug, Clone)]
pub struct SyncState {
    phase: SyncPhase,
    current: Option<TelemetrySample>,
    history: HistoryBuffer,
    control: ControlState,
    connection: ConnectionState,
    current_settled: bool,
    history_settled: bool,
    /// Set once any stream envelope has been applied; bootstrap data loses
    /// to stream data from then on.
    stream_sample_seen: bool,
}

impl SyncState {
    pub fn new(history_capacity: usize) -> CoreResult<Self> {
        Ok(Self {
            phase: SyncPhase::Idle,
            current: None,
            history: HistoryBuffer::with_capacity(history_capacity)?,
            control: ControlState::default(),
            connection: ConnectionState::default(),
            current_settled: false,
            history_settled: false,
            stream_sample_seen: false,
        })
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn current(&self) -> Option<&TelemetrySample> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn control(&self) -> ControlState {
        self.control
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Idle -> Bootstrapping. No-op in any other phase.
    pub fn begin_bootstrap(&mut self) {
        if self.phase == SyncPhase::Idle {
            self.phase = SyncPhase::Bootstrapping;
        }
    }

    /// Apply the settled current-reading fetch (`None` on failure).
    ///
    /// Returns `true` if this settle moved the state to Live.
    pub fn apply_bootstrap_current(&mut self, reading: Option<CurrentReading>) -> bool {
        if self.current_settled {
            return false;
        }
        self.current_settled = true;

        match reading {
            Some(reading) if !self.stream_sample_seen => {
                self.current = Some(reading.sample);
                self.connection.remote_link_connected = reading.remote_link_connected;
            }
            Some(_) => debug!("Bootstrap current superseded by stream data"),
            None => {}
        }
        self.settle()
    }

    /// Apply the settled history fetch (`None` on failure).
    ///
    /// Fetched samples are older than anything the stream delivered, so
    /// they go in front of the buffer.
    pub fn apply_bootstrap_history(&mut self, samples: Option<Vec<TelemetrySample>>) -> bool {
        if self.history_settled {
            return false;
        }
        self.history_settled = true;

        if let Some(samples) = samples {
            self.history.seed_front(samples);
        }
        self.settle()
    }

    pub fn apply_stream_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Open => self.connection.stream_connected = true,
            StreamEvent::Close => self.connection.stream_connected = false,
            StreamEvent::Message(envelope) => {
                self.stream_sample_seen = true;
                self.current = Some(envelope.data.clone());
                self.history.push(envelope.data);
                self.connection.remote_link_connected = envelope.mqtt_connected;

                if let Some(control) = envelope.control {
                    let normalized = control.normalized();
                    if normalized != control {
                        warn!(%control, "Stream reported pedal and brake together, releasing both");
                    }
                    self.control = normalized;
                }
            }
        }
    }

    /// Replace the control state (optimistic local update).
    pub fn set_control(&mut self, control: ControlState) {
        self.control = control;
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            phase: self.phase,
            current: self.current.clone(),
            history: self.history.to_vec(),
            control: self.control,
            connection: self.connection,
        }
    }

    fn settle(&mut self) -> bool {
        if self.phase == SyncPhase::Bootstrapping && self.current_settled && self.history_settled {
            self.phase = SyncPhase::Live;
            info!(history = self.history.len(), "Bootstrap settled, entering live phase");
            return true;
        }
        false
    }
}
