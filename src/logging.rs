//! Structured JSONL logging and human-readable stderr output.
//!
//! Dual-output logging:
//! - **JSONL to file** (`<data_dir>/logs/sticky-notes.jsonl`) - structured, greppable
//! - **Pretty to stderr** - human-readable for developers
//!
//! # Usage
//!
//! ```rust,ignore
//! use sticky_notes::{config::Config, logging};
//!
//! let config = Config::from_env();
//! // Initialize logging - MUST keep the guard alive for the duration of the program
//! let _guard = logging::init(&config.data_dir);
//!
//! tracing::info!(event_type = "app_start", "Application started");
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "sticky-notes.jsonl";

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Directory the JSONL log lands in.
pub fn log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

/// Path of the JSONL log file.
pub fn log_file_path(data_dir: &Path) -> PathBuf {
    log_dir(data_dir).join(LOG_FILE_NAME)
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that MUST be kept alive for the duration of the program;
/// dropping it flushes remaining log lines. If the log file cannot be opened
/// the file layer is skipped and stderr output still works - logging setup
/// never takes the app down.
pub fn init(data_dir: &Path) -> LoggingGuard {
    let dir = log_dir(data_dir);
    if let Err(e) = fs::create_dir_all(&dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }
    let log_path = dir.join(LOG_FILE_NAME);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    let (file_layer, file_guard) = match file {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            (None, None)
        }
    };

    // Default to info, allow override via RUST_LOG
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // try_init so an embedding shell that already installed a subscriber
    // keeps its own; our layers simply don't attach in that case.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();

    tracing::info!(log_path = %log_path.display(), "Logging initialized");

    LoggingGuard {
        _file_guard: file_guard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_paths_derive_from_data_dir() {
        let data_dir = PathBuf::from("/tmp/sticky-test");
        assert_eq!(log_dir(&data_dir), PathBuf::from("/tmp/sticky-test/logs"));
        assert!(log_file_path(&data_dir).ends_with("logs/sticky-notes.jsonl"));
    }

    #[test]
    fn test_init_creates_log_dir_and_is_reentrant() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let _guard = init(tmp.path());
        assert!(log_dir(tmp.path()).is_dir());
        // A second init must not panic even though a subscriber is installed.
        let _guard2 = init(tmp.path());
    }
}
