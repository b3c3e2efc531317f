//! Logging setup
//!
//! Console output plus a daily rolling log file. Every event carries the
//! source file and line so failures can be traced back to the call site.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{ToolkitError, ToolkitResult};

pub const LOG_FILE_PREFIX: &str = "smart_city_toolkit.log";

/// Keeps the file writer alive; dropping it flushes pending lines.
pub struct LogGuard {
    _file: WorkerGuard,
}

pub fn init_logging(log_dir: &Path) -> ToolkitResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("smart_city_toolkit=info"));

    Registry::default()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|e| ToolkitError::Config(format!("failed to install tracing subscriber: {}", e)))?;

    Ok(LogGuard { _file: guard })
}
