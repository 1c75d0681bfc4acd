//! Logging initialization
//!
//! Configures tracing-subscriber on stderr. `RUST_LOG` wins over the level
//! from settings so a user can always turn diagnostics up for one run.

use crate::error::LoggingError;
use crate::settings::{LogFormat, LoggingSettings};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn build_filter(config: &LoggingSettings) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| LoggingError::Filter(config.level.clone(), e.to_string())),
    }
}

/// Initialize the logging system based on configuration
pub fn init_logging(config: &LoggingSettings) -> Result<(), LoggingError> {
    let env_filter = build_filter(config)?;

    let fmt_layer = match config.format {
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .without_time()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    tracing::debug!(
        target: "localnode::init",
        level = %config.level,
        format = ?config.format,
        "Logging initialized"
    );

    Ok(())
}
