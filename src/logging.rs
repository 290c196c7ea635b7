//! Console and rolling-file log output.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;
use crate::error::AppError;

const LOG_FILE_PREFIX: &str = "finz-requests";
const DEFAULT_FILTER: &str = "finz_requests=info";
/// Two weeks of daily files.
const MAX_LOG_FILES: usize = 14;

/// Installs the global subscriber. Log lines still buffered for the file are
/// flushed when the returned guard drops, so hold it until exit.
pub fn setup_logging(config: &Config) -> Result<WorkerGuard, AppError> {
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender(config)?);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()
        .map_err(|e| AppError::ConfigurationError {
            msg: format!("Failed to install log subscriber: {e}"),
        })?;

    Ok(guard)
}

fn file_appender(config: &Config) -> Result<RollingFileAppender, AppError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(&config.logs_path)
        .map_err(|e| AppError::ConfigurationError {
            msg: format!(
                "Cannot write logs to '{}': {e}",
                config.logs_path.to_string_lossy()
            ),
        })
}
