// Main module file for appearance state management

pub mod errors;
pub mod events;
pub mod provider;
pub mod service;
pub mod types;

pub use errors::AppearanceError;
pub use events::AppearanceEvent;
pub use provider::{FilesystemThemeProvider, StaticThemeProvider, ThemeProvider};
pub use service::{AppearanceState, SCALE_FACTOR_KEY, THEME_KEY};
pub use types::{ShadowProfile, ShadowProfileSet, ThemeSpec};
