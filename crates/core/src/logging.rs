//! Tracing setup: env-filtered stderr output plus optional daily file logs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_NOISE_FILTER: &str = "ort=error";
pub const DEFAULT_LOG_DIR_NAME: &str = "logs";
pub const DEFAULT_LOG_FILE_PREFIX: &str = "srtile";
pub const DEFAULT_LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingInitOptions {
    /// Write daily-rotated log files under `<data_dir>/logs` when set.
    pub data_dir: Option<PathBuf>,
    /// `-v` occurrences from the CLI; 0 = default filter, 1 = debug, 2+ = trace.
    pub verbose: u8,
    /// Explicit filter taking precedence over `verbose` and `RUST_LOG`.
    pub log_filter: Option<String>,
}

impl Default for LoggingInitOptions {
    fn default() -> Self {
        Self {
            data_dir: None,
            verbose: 0,
            log_filter: None,
        }
    }
}

/// Resolve the effective filter directive string.
///
/// Precedence: explicit filter, then `RUST_LOG`, then the verbosity flag.
/// The noise filter for ort internals is appended only when the directive
/// was implicit, so an explicit filter can re-enable those targets.
pub fn resolve_log_filter(options: &LoggingInitOptions) -> String {
    if let Some(filter) = options.log_filter.as_deref() {
        return filter.to_string();
    }

    if let Ok(env_filter) = std::env::var("RUST_LOG") {
        if !env_filter.trim().is_empty() {
            return env_filter;
        }
    }

    let base = match options.verbose {
        0 => DEFAULT_LOG_FILTER,
        1 => "debug",
        _ => "trace",
    };
    format!("{base},{DEFAULT_NOISE_FILTER}")
}

/// Initialize the global tracing subscriber.
///
/// Returns the appender guard when file logging is active; the caller must
/// keep it alive for the process lifetime or buffered lines are dropped.
pub fn init_logging(options: &LoggingInitOptions) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(resolve_log_filter(options))
        .context("invalid log filter directive")?;

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match options.data_dir.as_deref() {
        Some(data_dir) => {
            let appender = rolling_appender(data_dir)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().with_ansi(false).with_writer(writer);

            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .try_init()
                .context("tracing subscriber already initialized")?;

            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()
                .context("tracing subscriber already initialized")?;

            Ok(None)
        }
    }
}

fn rolling_appender(data_dir: &Path) -> Result<RollingFileAppender> {
    let log_dir = data_dir.join(DEFAULT_LOG_DIR_NAME);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(DEFAULT_LOG_FILE_PREFIX)
        .filename_suffix(DEFAULT_LOG_FILE_SUFFIX)
        .build(&log_dir)
        .context("failed to create rolling file appender")
}
