//! `tracing` subscriber setup driven by a scenario's logging block.

use orbital_config::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] ParseError),
}

/// Install a global fmt subscriber.
///
/// The filter comes from `config.filter`, then `RUST_LOG`, then `config.level`. Returns
/// `Ok(false)` when a subscriber was already installed; later calls never replace it.
pub fn init_logging(config: &LoggingConfig) -> Result<bool, LoggingError> {
    let filter = match &config.filter {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.as_str())),
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    Ok(installed.is_ok())
}
