//! Theme model types.
//!
//! A [`ThemeSpec`] is the parsed form of a theme definition. Theme asset
//! parsing beyond these values (titlebar art, button glyphs, etc.) is
//! owned by the rendering collaborator, not by this crate.

use decoro_core::types::Point;
use serde::{Deserialize, Serialize};

/// Shadow rendering parameters for one window category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowProfile {
    /// Blur radius of the shadow in logical pixels.
    pub radius: f64,
    /// Offset of the shadow relative to the window.
    #[serde(default)]
    pub offset: Point<i32>,
    /// Opacity of the shadow, in `[0.0, 1.0]`.
    pub alpha: f64,
}

impl ShadowProfile {
    /// Creates a profile with the given radius and alpha and no offset.
    pub fn new(radius: f64, alpha: f64) -> Self {
        ShadowProfile {
            radius,
            offset: Point::new(0, 0),
            alpha,
        }
    }
}

/// Per-category shadow profiles.
///
/// Active windows get a stronger shadow than inactive or unmanaged ones;
/// keeping the three profiles separate is what allows the shadow cache to
/// partition entries by window category without key collisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowProfileSet {
    /// Profile for the focused window.
    #[serde(default = "default_active_profile")]
    pub active: ShadowProfile,
    /// Profile for unfocused windows.
    #[serde(default = "default_inactive_profile")]
    pub inactive: ShadowProfile,
    /// Profile for override-redirect windows.
    #[serde(default = "default_unmanaged_profile")]
    pub unmanaged: ShadowProfile,
}

fn default_active_profile() -> ShadowProfile {
    ShadowProfile::new(60.0, 0.6)
}

fn default_inactive_profile() -> ShadowProfile {
    ShadowProfile::new(30.0, 0.4)
}

fn default_unmanaged_profile() -> ShadowProfile {
    ShadowProfile::new(20.0, 0.3)
}

impl Default for ShadowProfileSet {
    fn default() -> Self {
        ShadowProfileSet {
            active: default_active_profile(),
            inactive: default_inactive_profile(),
            unmanaged: default_unmanaged_profile(),
        }
    }
}

/// A parsed theme definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSpec {
    /// The theme name. Filled in by the provider; a name embedded in the
    /// theme document itself is overridden.
    #[serde(default)]
    pub name: String,
    /// Height of the titlebar in logical pixels. A window with the
    /// no-titlebar property set renders with height 0 regardless.
    #[serde(default = "default_titlebar_height")]
    pub titlebar_height: u32,
    /// Corner radius of decorated windows in logical pixels.
    #[serde(default = "default_window_radius")]
    pub window_radius: f64,
    /// Shadow profiles per window category.
    #[serde(default)]
    pub shadow: ShadowProfileSet,
}

fn default_titlebar_height() -> u32 {
    40
}

fn default_window_radius() -> f64 {
    18.0
}

impl ThemeSpec {
    /// Creates a theme with default metrics under the given name.
    pub fn named(name: &str) -> Self {
        ThemeSpec {
            name: name.to_string(),
            titlebar_height: default_titlebar_height(),
            window_radius: default_window_radius(),
            shadow: ShadowProfileSet::default(),
        }
    }
}
