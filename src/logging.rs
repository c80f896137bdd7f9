//! Logging setup.

use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{ReaperError, ReaperResult};

pub const LOG_FILE_PREFIX: &str = "reaper.log";

/// Effective filter directive: `--verbose` forces debug, otherwise the
/// configured level. `RUST_LOG` still wins when set.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        config.level.clone()
    }
}

/// Install the global subscriber.
///
/// With `log_to_file` a daily-rolling file in `log_directory` is added next to
/// the console output; keep the returned guard alive until exit or buffered
/// lines are lost.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> ReaperResult<Option<WorkerGuard>> {
    let directive = filter_directive(config, verbose);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directive))
        .map_err(|e| ReaperError::ConfigValidation(format!("invalid log level '{}': {}", directive, e)))?;

    if config.log_to_file {
        fs::create_dir_all(&config.log_directory)?;
        let appender = tracing_appender::rolling::daily(&config.log_directory, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .try_init()
            .map_err(|e| ReaperError::Internal(format!("logging already initialised: {}", e)))?;

        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()
            .map_err(|e| ReaperError::Internal(format!("logging already initialised: {}", e)))?;

        Ok(None)
    }
}
