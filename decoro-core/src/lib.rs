//! Core infrastructure layer for the Decoro decoration engine.
//!
//! This crate provides the foundational utilities shared by the higher
//! layers of Decoro: error types, logging initialization, logging
//! configuration, and the geometric primitives used for shadow geometry
//! and clip regions.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::LoggingConfig;
pub use error::{ConfigError, CoreError, LoggingError};
pub use types::{Point, Rect, Size};
