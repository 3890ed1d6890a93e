//! Domain layer for the Decoro decoration engine.
//!
//! This crate owns the configuration state of the engine: the active
//! theme, the activation flag, and the display scale factor, together
//! with the theme model and the provider abstraction used to load
//! theme definitions.

// Re-export core crate
pub use decoro_core as core;

pub mod appearance;

pub use appearance::{
    AppearanceError, AppearanceEvent, AppearanceState, FilesystemThemeProvider, ShadowProfile,
    ShadowProfileSet, StaticThemeProvider, ThemeProvider, ThemeSpec, SCALE_FACTOR_KEY, THEME_KEY,
};
