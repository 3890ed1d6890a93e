//! Configuration types for the Decoro core layer.
//!
//! Decoro is a library component embedded into a compositor, so the only
//! configuration owned by the core layer is the logging setup. Theme
//! definitions live in `decoro-domain` and are loaded through a provider
//! abstraction there.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Log levels accepted by [`LoggingConfig::validate`].
const VALID_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Log output formats accepted by [`LoggingConfig::validate`].
const VALID_FORMATS: &[&str] = &["text", "json"];

/// Configuration for the logging system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// The minimum log level ("trace", "debug", "info", "warn" or "error").
    #[serde(default = "default_level")]
    pub level: String,
    /// The log output format ("text" or "json").
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level(),
            format: default_format(),
        }
    }
}

impl LoggingConfig {
    /// Parses a [`LoggingConfig`] from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LoggingConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values after parsing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level: {}",
                self.level
            )));
        }
        if !VALID_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log format: {}",
                self.format
            )));
        }
        Ok(())
    }
}
