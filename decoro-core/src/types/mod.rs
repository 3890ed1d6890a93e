//! Core data types for the Decoro decoration engine.

pub mod geometry;

pub use geometry::{Point, Rect, Size};
