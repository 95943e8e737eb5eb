//! Command implementations.

use crate::config::AppConfig;
use crate::console::{ConsoleCommand, HELP};
use crate::error::AppResult;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use tractor_api::{ApiClient, BackendStatus};
use tractor_sync::{SyncCoordinator, SyncHandle, SyncSnapshot};
use tractor_ws::TungsteniteConnector;

pub struct Application {
    config: AppConfig,
    api: ApiClient,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let api = ApiClient::new(config.backend_url.clone(), config.request_timeout())?;
        Ok(Self { config, api })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn status(&self) -> AppResult<BackendStatus> {
        Ok(self.api.fetch_status().await?)
    }

    /// Download the CSV export into `export_dir`. Returns the written path.
    pub async fn export(&self) -> AppResult<PathBuf> {
        let blob = self.api.download_export().await?;
        tokio::fs::create_dir_all(&self.config.export_dir).await?;

        let path = self.config.export_dir.join(&blob.file_name);
        tokio::fs::write(&path, &blob.bytes).await?;
        info!(path = %path.display(), bytes = blob.bytes.len(), "Export saved");
        Ok(path)
    }

    pub fn start_sync(&self) -> AppResult<SyncHandle> {
        let handle = SyncCoordinator::new(
            self.config.sync_config()?,
            self.api.clone(),
            TungsteniteConnector,
        )
        .start()?;
        Ok(handle)
    }

    /// Follow live telemetry and accept console commands until `quit`,
    /// Ctrl-C, or the coordinator stops.
    pub async fn watch(&self) -> AppResult<()> {
        let handle = self.start_sync()?;
        let mut updates = handle.subscribe();
        let mut last = handle.snapshot();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        println!("{HELP}");

        loop {
            tokio::select! {
                Ok(()) = updates.changed() => {
                    let next = updates.borrow_and_update().clone();
                    log_changes(&last, &next);
                    last = next;
                }

                line = lines.next_line(), if stdin_open => match line {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => {
                        if !self.handle_line(&handle, &line).await {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("Console input closed, watching until Ctrl-C");
                        stdin_open = false;
                    }
                    Err(e) => {
                        warn!(error = %e, "Console read failed");
                        stdin_open = false;
                    }
                },

                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    break;
                }

                () = handle.stopped() => {
                    warn!("Sync coordinator stopped");
                    break;
                }
            }
        }

        handle.shutdown();
        handle.wait().await;

        let stats = handle.stream_stats();
        info!(
            connect_attempts = stats.connect_attempts,
            messages = stats.messages_decoded,
            dropped = stats.messages_dropped,
            "Watch finished"
        );
        Ok(())
    }

    /// Returns `false` when watching should stop.
    async fn handle_line(&self, handle: &SyncHandle, line: &str) -> bool {
        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e} (type 'help')");
                return true;
            }
        };
        if let Err(reason) = command.check_allowed(&handle.snapshot().control) {
            println!("{reason}");
            return true;
        }

        match command {
            ConsoleCommand::Intent(intent) => match handle.apply_intent(intent).await {
                Ok(receipt) => println!("control: {}", receipt.state),
                Err(e) => {
                    warn!(error = %e, "Coordinator unavailable");
                    return false;
                }
            },
            ConsoleCommand::Show => println!("{}", format_snapshot(&handle.snapshot())),
            ConsoleCommand::Export => match self.export().await {
                Ok(path) => println!("exported to {}", path.display()),
                Err(e) => println!("export failed: {e}"),
            },
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => return false,
        }
        true
    }
}

fn log_changes(prev: &SyncSnapshot, next: &SyncSnapshot) {
    if prev.phase != next.phase {
        info!(phase = ?next.phase, "Sync phase changed");
    }
    if prev.connection != next.connection {
        info!(
            link = %next.connection.indicator(),
            stream_connected = next.connection.stream_connected,
            "Connection changed"
        );
    }
    if prev.control != next.control {
        info!(control = %next.control, "Control state changed");
    }
    if prev.current != next.current {
        if let Some(sample) = &next.current {
            info!(
                time = %sample.display_time(),
                velocity = sample.velocity,
                rpm = %sample.rpm_display(),
                gear = sample.gear,
                history = next.history.len(),
                "Telemetry"
            );
        }
    }
}

/// One-screen summary for the `show` command.
pub fn format_snapshot(snapshot: &SyncSnapshot) -> String {
    let reading = match &snapshot.current {
        Some(s) => format!(
            "velocity {:.1} km/h | rpm {} | gear {} | at {}",
            s.velocity,
            s.rpm_display(),
            s.gear,
            s.display_time()
        ),
        None => "no data yet".to_string(),
    };
    format!(
        "{reading}\nlink: {} | stream: {}\ncontrol: {}\nhistory: {} samples",
        snapshot.connection.indicator(),
        if snapshot.connection.stream_connected {
            "connected"
        } else {
            "disconnected"
        },
        snapshot.control,
        snapshot.history.len()
    )
}

/// Multi-line rendering of the `status` command.
pub fn format_status(status: &BackendStatus) -> String {
    format!(
        "mqtt connected: {}\ndata points: {}\nlast update: {}",
        status.mqtt_connected,
        status.data_points,
        status.last_update.as_deref().unwrap_or("never")
    )
}
