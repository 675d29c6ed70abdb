//! Logging infrastructure.
//!
//! Provides structured logging for hosts embedding the cache:
//! - Console output by default, filtered via the RUST_LOG environment variable
//! - Optional non-blocking file output for long-running services

use std::fs;
use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer, if any.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("routecache=info"))
}

/// Initialize console-only logging.
///
/// Must be called at most once per process; a host that installs its own
/// `tracing` subscriber should skip this entirely.
pub fn init_logging() -> LoggingGuard {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();

    LoggingGuard { _file_guard: None }
}

/// Initialize logging to both console and a log file.
///
/// Creates the log directory if needed and appends to the named file via a
/// non-blocking writer.
///
/// # Arguments
///
/// * `log_dir` - Directory for log files (e.g., "logs")
/// * `log_file` - Log filename (e.g., "routecache.log")
///
/// # Errors
///
/// Returns an error if the log directory cannot be created.
pub fn init_logging_to_file(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(LoggingGuard {
        _file_guard: Some(file_guard),
    })
}
