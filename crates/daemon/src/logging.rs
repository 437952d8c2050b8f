//! Logging setup
//!
//! `RUST_LOG` overrides the default filter. With `--log-dir`, events are also
//! written to a daily-rotated file through a non-blocking writer; the returned
//! guard must live until exit so buffered lines are flushed.

use crate::config::{DaemonConfig, LogFormat};
use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "ewd_core=info,ewd_infra_system=info,ewd=info";
const LOG_FILE_PREFIX: &str = "ewd.log";

pub fn init(config: &DaemonConfig) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;

    let (file_writer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };
    match config.log_format {
        LogFormat::Json => {
            // Production: JSON structured logging
            let file_layer = file_writer
                .map(|writer| fmt::layer().json().with_ansi(false).with_writer(writer));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .with(file_layer)
                .try_init()?;
        }
        LogFormat::Pretty => {
            // Development: Pretty formatting with colors
            let file_layer =
                file_writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .with(file_layer)
                .try_init()?;
        }
    }

    Ok(guard)
}
