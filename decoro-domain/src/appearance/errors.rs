use thiserror::Error;

/// Error type for appearance and theme operations.
#[derive(Error, Debug)]
pub enum AppearanceError {
    /// The requested theme name was empty.
    #[error("Theme name must not be empty")]
    EmptyThemeName,

    /// No theme definition exists under the requested name.
    #[error("Theme '{name}' was not found")]
    ThemeNotFound { name: String },

    /// The theme definition exists but could not be read.
    #[error("Failed to read theme '{name}'")]
    ThemeRead {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The theme definition exists but is not a valid theme document.
    #[error("Failed to parse theme '{name}': {source}")]
    ThemeParse {
        name: String,
        #[source]
        source: toml::de::Error,
    },
}
