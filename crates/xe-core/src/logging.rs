//! Logging setup
//!
//! `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Build the env filter for a logging configuration
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_filter()))
}

/// Install the global `tracing` subscriber
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init(config: &LoggingConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(config.with_target)
        .with_writer(std::io::stderr)
        .try_init();
}
