//! Logging setup for the Decoro core layer.
//!
//! Built on the `tracing` ecosystem. Decoro is embedded into a host
//! compositor, so only console output is supported; the host owns any
//! file logging or log shipping.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{CoreError, LoggingError};

/// Initializes a minimal logging setup, directing messages to `stderr`.
///
/// Intended for tests and for early startup before the host has handed
/// over a [`LoggingConfig`]. Filters based on the `RUST_LOG` environment
/// variable, defaulting to "info". Errors (e.g., a global subscriber is
/// already set) are ignored.
pub fn init_minimal_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    let _ = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .try_init();
}

/// Initializes the global logging system from a [`LoggingConfig`].
///
/// # Errors
///
/// Returns `CoreError::Config` if the configuration is invalid and
/// `CoreError::Logging` if a global subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), CoreError> {
    config.validate().map_err(CoreError::Config)?;

    let filter = EnvFilter::try_new(config.level.to_lowercase())
        .map_err(|e| CoreError::Logging(LoggingError::FilterError(e.to_string())))?;

    let builder = fmt::Subscriber::builder().with_env_filter(filter);
    let result = match config.format.to_lowercase().as_str() {
        "json" => builder
            .json()
            .with_writer(std::io::stdout)
            .with_ansi(false)
            .try_init(),
        _ => builder
            .with_writer(std::io::stdout)
            .with_ansi(atty::is(atty::Stream::Stdout))
            .try_init(),
    };

    result.map_err(|e| {
        CoreError::Logging(LoggingError::InitializationFailure(format!(
            "Failed to set global tracing subscriber. Was it already initialized? Error: {}",
            e
        )))
    })
}
