//! Logging and tracing configuration
//!
//! Logs go to stderr so they never mix with revealed item fields on stdout.
//! With `--log-file` a second, more verbose layer appends to
//! `~/.local/share/bwnote/logs/bwnote.log`.

use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::paths;

/// Initialize tracing for the CLI
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
/// Returns the log file path when file logging was requested and available.
pub fn init_cli(log_to_file: bool) -> Option<PathBuf> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bwnote=info,warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let file = if log_to_file { open_log_file() } else { None };

    match file {
        Some((path, file)) => {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(path)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}

/// Get the path to the log file
pub fn log_path() -> Option<PathBuf> {
    paths::log_dir().map(|d| d.join("bwnote.log"))
}

fn open_log_file() -> Option<(PathBuf, std::fs::File)> {
    let path = log_path()?;
    if let Err(e) = paths::ensure_parent_dir(&path) {
        eprintln!("Warning: Could not create log directory: {}", e);
        return None;
    }
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    {
        Ok(file) => Some((path, file)),
        Err(e) => {
            eprintln!("Warning: Could not open log file: {}", e);
            None
        }
    }
}
