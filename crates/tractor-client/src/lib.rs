//! Tractor telemetry client.
//!
//! Command-line front end over the sync coordinator:
//! - `watch`: live telemetry with an interactive control console
//! - `status`: one-shot backend status
//! - `export`: download the backend's CSV export

pub mod app;
pub mod config;
pub mod console;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use console::ConsoleCommand;
pub use error::{AppError, AppResult};
