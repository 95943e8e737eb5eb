//! Fire-and-forget control command delivery.

use crate::error::CommandDeliveryError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use tractor_api::ApiClient;
use tractor_core::{ControlIntent, ControlState};
use tractor_telemetry::Metrics;

/// Result of dispatching an intent.
///
/// `state` is the new local control state, already applied. `delivery`
/// resolves once the controller answered; awaiting it is optional.
#[derive(Debug)]
pub struct CommandReceipt {
    pub state: ControlState,
    pub delivery: JoinHandle<Result<(), CommandDeliveryError>>,
}

/// Computes the next control state and sends it to the controller.
#[derive(Clone)]
pub struct CommandDispatcher {
    api: ApiClient,
}

impl CommandDispatcher {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Apply `intent` to `current` and send the resulting full state.
    ///
    /// Never rolls back: a delivery failure is logged and counted while the
    /// returned state stays in effect. Must be called inside a Tokio runtime.
    pub fn dispatch(&self, current: ControlState, intent: ControlIntent) -> CommandReceipt {
        let state = intent.apply(current);
        if !current.controls_enabled() && !matches!(intent, ControlIntent::SwitchMode(_)) {
            debug!(%state, intent = intent.label(), "Control intent outside manual mode");
        }

        let api = self.api.clone();
        let label = intent.label();
        let delivery = tokio::spawn(async move {
            match api.send_control(&state).await {
                Ok(()) => {
                    Metrics::control_command(label, true);
                    debug!(%state, "Control command delivered");
                    Ok(())
                }
                Err(source) => {
                    Metrics::control_command(label, false);
                    let error = CommandDeliveryError { state, source };
                    warn!(%error, "CommandDeliveryError");
                    Err(error)
                }
            }
        });

        CommandReceipt { state, delivery }
    }
}
