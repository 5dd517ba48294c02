//! Tracing initialization for the poller binary.
//!
//! Interactive runs log to stderr; long-running deployments usually pass
//! `--log-file` so cycles can be inspected after the fact.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Where the global subscriber ended up writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File,
}

impl LogTarget {
    pub fn is_stderr(&self) -> bool {
        matches!(self, Self::Stderr)
    }
}

/// Initialize global tracing to stderr.
pub fn init_stderr_tracing() -> LogTarget {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
    LogTarget::Stderr
}

/// Open `log_path` for appending, creating parent directories.
pub fn open_log_file(log_path: &Path) -> std::io::Result<File> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
}

/// Initialize global tracing to `log_path` (append mode).
///
/// Falls back to stderr if the file cannot be opened, so a bad path never
/// silences the poller.
pub fn init_file_tracing(log_path: &Path) -> LogTarget {
    let log_file = match open_log_file(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", log_path.display(), e);
            return init_stderr_tracing();
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(log_file))
        .with_target(true)
        .with_ansi(false)
        .init();
    LogTarget::File
}
