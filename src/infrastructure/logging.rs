use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

use super::config::{AppConfig, LOG_FILE_NAME};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("Failed to install log subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Builds the filter from `RUST_LOG`, falling back to the configured directive.
pub fn log_filter(config: &AppConfig) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.log_filter)?),
    }
}

/// Routes tracing output to a file; the terminal belongs to the UI.
///
/// The returned guard flushes buffered lines when dropped and must be kept
/// alive for the lifetime of the program.
pub fn init_logging(config: &AppConfig) -> Result<WorkerGuard, LoggingError> {
    let filter = log_filter(config)?;
    let appender = tracing_appender::rolling::never(&config.log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;

    Ok(guard)
}
