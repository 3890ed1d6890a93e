//! Error handling for the Decoro core layer.
//!
//! This module defines the error types shared by the core crate using
//! `thiserror`. The main error type is [`CoreError`], which wraps the
//! more specific [`ConfigError`] and [`LoggingError`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for the Decoro decoration engine.
///
/// This enum represents all possible errors that can occur in the core
/// layer. It is designed to be used as a common error type throughout
/// the engine, often by wrapping more specific error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Errors related to configuration loading, parsing, or validation.
    /// Wraps a [`ConfigError`].
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    /// Errors that occur during the initialization of the logging system.
    /// Wraps a [`LoggingError`].
    #[error("Logging Error: {0}")]
    Logging(#[from] LoggingError),

    /// Errors due to invalid input provided to a function or method.
    /// Contains a descriptive message.
    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    /// Catch-all for unexpected internal errors within the core library.
    /// Contains a descriptive message.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Error type for configuration-related operations.
///
/// Typically wrapped by [`CoreError::Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An error occurred while attempting to read a configuration file.
    /// Includes the path to the file and the source I/O error.
    #[error("Failed to read configuration file from {path:?}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An error occurred while parsing a configuration file (e.g., invalid TOML).
    /// Wraps a `toml::de::Error`.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// An error occurred due to invalid configuration values after successful parsing.
    /// Contains a descriptive message of the validation failure.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Error type for logging-related operations.
///
/// Typically wrapped by [`CoreError::Logging`].
#[derive(Error, Debug)]
pub enum LoggingError {
    /// Failed to initialize the logging system, e.g. because a global
    /// subscriber was already installed.
    #[error("Failed to initialize logging: {0}")]
    InitializationFailure(String),

    /// Failed to set or parse a log filter (e.g., from a configuration string).
    #[error("Failed to set log filter: {0}")]
    FilterError(String),
}
