//! Logging setup for the chapter namer.
//!
//! Everything logs through `tracing`. The binary installs a subscriber
//! once at startup: human-readable lines on stderr, and optionally a
//! plain-text copy in a log file (the batch log).
//!
//! # Example
//!
//! ```no_run
//! use mcn_core::logging::{init_tracing, LogLevel};
//!
//! let _guard = init_tracing(LogLevel::Info, Some("batch_process.log".as_ref())).unwrap();
//! tracing::info!("Starting batch");
//! ```

mod types;

pub use types::LogLevel;

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_level` when set. When `log_file` is
/// given, output is also appended there; keep the returned guard alive
/// until exit so buffered lines get flushed.
pub fn init_tracing(default_level: LogLevel, log_file: Option<&Path>) -> io::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
