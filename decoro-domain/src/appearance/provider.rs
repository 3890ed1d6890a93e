//! Theme provider abstraction.
//!
//! Theme definitions are TOML documents resolved by name. The provider
//! is the seam between the appearance state and wherever themes are
//! stored; the engine is handed an `Arc<dyn ThemeProvider>` and never
//! touches the filesystem directly.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use super::errors::AppearanceError;
use super::types::ThemeSpec;

/// Resolves theme names to parsed [`ThemeSpec`]s.
pub trait ThemeProvider: Send + Sync {
    /// Loads the theme with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`AppearanceError::ThemeNotFound`] when no definition
    /// exists under `name`, and read/parse errors otherwise. Callers
    /// treat every failure as recoverable: prior state is kept.
    fn load_theme(&self, name: &str) -> Result<ThemeSpec, AppearanceError>;
}

/// Loads themes from `<themes_dir>/<name>.toml`.
#[derive(Debug, Clone)]
pub struct FilesystemThemeProvider {
    themes_dir: PathBuf,
}

impl FilesystemThemeProvider {
    /// Creates a provider rooted at the given themes directory.
    pub fn new(themes_dir: impl Into<PathBuf>) -> Self {
        FilesystemThemeProvider {
            themes_dir: themes_dir.into(),
        }
    }
}

impl ThemeProvider for FilesystemThemeProvider {
    fn load_theme(&self, name: &str) -> Result<ThemeSpec, AppearanceError> {
        if name.is_empty() {
            return Err(AppearanceError::EmptyThemeName);
        }
        // Theme names are plain identifiers, never paths.
        if name.contains('/') || name.contains("..") {
            return Err(AppearanceError::ThemeNotFound {
                name: name.to_string(),
            });
        }

        let path = self.themes_dir.join(format!("{}.toml", name));
        let content = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AppearanceError::ThemeNotFound {
                    name: name.to_string(),
                }
            } else {
                AppearanceError::ThemeRead {
                    name: name.to_string(),
                    source,
                }
            }
        })?;

        let mut theme: ThemeSpec =
            toml::from_str(&content).map_err(|source| AppearanceError::ThemeParse {
                name: name.to_string(),
                source,
            })?;
        theme.name = name.to_string();
        debug!(theme = name, path = %path.display(), "loaded theme definition");
        Ok(theme)
    }
}

/// In-memory provider used by tests and by embedders that ship a fixed
/// set of themes.
#[derive(Debug, Clone, Default)]
pub struct StaticThemeProvider {
    themes: HashMap<String, ThemeSpec>,
}

impl StaticThemeProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider holding default-metric themes under the given names.
    pub fn with_default_themes(names: &[&str]) -> Self {
        let mut provider = Self::new();
        for name in names {
            provider.insert(ThemeSpec::named(name));
        }
        provider
    }

    /// Registers a theme under its own name, replacing any previous entry.
    pub fn insert(&mut self, theme: ThemeSpec) {
        self.themes.insert(theme.name.clone(), theme);
    }
}

impl ThemeProvider for StaticThemeProvider {
    fn load_theme(&self, name: &str) -> Result<ThemeSpec, AppearanceError> {
        if name.is_empty() {
            return Err(AppearanceError::EmptyThemeName);
        }
        self.themes
            .get(name)
            .cloned()
            .ok_or_else(|| AppearanceError::ThemeNotFound {
                name: name.to_string(),
            })
    }
}
