//! Logging setup for the tipline CLI
//!
//! Logs to a file in the app data directory

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging with file output
///
/// Returns a guard that must be held for the lifetime of the application
/// to ensure logs are flushed.
pub fn init_logging() -> WorkerGuard {
    let log_dir = get_log_dir();

    // Ensure log directory exists
    std::fs::create_dir_all(&log_dir).ok();

    // Create file appender with daily rotation
    let file_appender = tracing_appender::rolling::daily(&log_dir, "tipline.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tipline=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr).with_ansi(true))
        .init();

    tracing::info!("Logging initialized, log directory: {:?}", log_dir);

    guard
}

/// Get the log directory path
pub fn get_log_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        return data_dir.join("tipline").join("logs");
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".tipline").join("logs");
    }

    PathBuf::from("./tipline_logs")
}
