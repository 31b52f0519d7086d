//! File logging for the binary.
//!
//! Events go to a daily rolling file under `<data-dir>/logs`, never to the
//! terminal, which the TUI owns. The returned guard flushes the non-blocking
//! writer when dropped and must live until the process exits.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const LOG_FILE_NAME: &str = "cplan.log";

pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Install the global subscriber. Returns `None` when logging could not be set
/// up; the program keeps running without it.
pub fn init_logging(config: &Config) -> Option<LoggingGuard> {
    let log_dir = config.log_dir();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: could not create log directory {}: {}", log_dir.display(), e);
        return None;
    }

    let (writer, guard) = tracing_appender::non_blocking(file_appender(&log_dir));
    let subscriber = tracing_subscriber::registry().with(env_filter(&config.log_filter)).with(
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false),
    );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return None;
    }

    tracing::info!(dir = %config.data_dir.display(), "logging initialized");
    Some(LoggingGuard { _guard: guard })
}

fn file_appender(log_dir: &Path) -> RollingFileAppender {
    RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_NAME)
}

/// `RUST_LOG` overrides the configured directive; an unparsable directive
/// falls back to `info`.
fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
