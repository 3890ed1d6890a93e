//! The appearance state service.
//!
//! [`AppearanceState`] holds the active theme name, the activation flag,
//! and the display scale factor, and broadcasts [`AppearanceEvent`]s
//! whenever one of them changes. Mutations only originate from the
//! configuration service notification path or from an explicit theme-set
//! request; on theme change, dependent caches are invalidated by the
//! system layer reacting to [`AppearanceEvent::ThemeChanged`].

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::events::AppearanceEvent;
use super::provider::ThemeProvider;
use super::types::ThemeSpec;

/// Appearance-bus key whose value names the active theme.
pub const THEME_KEY: &str = "Theme";

/// Appearance-bus key whose value carries the display scale factor.
pub const SCALE_FACTOR_KEY: &str = "ScaleFactor";

/// Capacity of the broadcast channel for appearance events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Two scale factors closer than this are treated as equal, avoiding
/// redundant cache invalidation.
pub const SCALE_EPSILON: f64 = 1e-6;

/// Configuration state of the decoration engine.
///
/// Invariant: `activated` is `true` iff a non-empty theme is currently
/// loaded and usable.
pub struct AppearanceState {
    activated: bool,
    theme: Option<ThemeSpec>,
    scale_factor: f64,
    provider: Arc<dyn ThemeProvider>,
    events: broadcast::Sender<AppearanceEvent>,
}

impl std::fmt::Debug for AppearanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppearanceState")
            .field("activated", &self.activated)
            .field("theme", &self.theme.as_ref().map(|t| &t.name))
            .field("scale_factor", &self.scale_factor)
            .finish()
    }
}

impl AppearanceState {
    /// Creates a deactivated state with scale factor 1.0.
    pub fn new(provider: Arc<dyn ThemeProvider>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        AppearanceState {
            activated: false,
            theme: None,
            scale_factor: 1.0,
            provider,
            events,
        }
    }

    /// Registers a new subscriber for appearance events.
    pub fn subscribe(&self) -> broadcast::Receiver<AppearanceEvent> {
        self.events.subscribe()
    }

    /// Whether a theme is currently loaded and usable.
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// The currently loaded theme, if any.
    pub fn theme(&self) -> Option<&ThemeSpec> {
        self.theme.as_ref()
    }

    /// The name of the currently loaded theme, if any.
    pub fn theme_name(&self) -> Option<&str> {
        self.theme.as_ref().map(|t| t.name.as_str())
    }

    /// The current display scale factor.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Loads and applies the named theme.
    ///
    /// On success the theme is swapped in, `activated` becomes `true`,
    /// and a `ThemeChanged` (plus `ActivationChanged` on a false-to-true
    /// transition) notification is emitted. On failure `false` is
    /// returned and no state change or notification is observable.
    pub fn set_theme(&mut self, name: &str) -> bool {
        if name.is_empty() {
            debug!("ignoring request to set an empty theme name");
            return false;
        }
        match self.provider.load_theme(name) {
            Ok(theme) => {
                let was_activated = self.activated;
                self.theme = Some(theme);
                self.activated = true;
                let _ = self
                    .events
                    .send(AppearanceEvent::ThemeChanged(name.to_string()));
                if !was_activated {
                    let _ = self.events.send(AppearanceEvent::ActivationChanged(true));
                }
                debug!(theme = name, "theme applied");
                true
            }
            Err(err) => {
                warn!(theme = name, error = %err, "theme load failed; keeping previous state");
                false
            }
        }
    }

    /// Drops the active theme and clears the activation flag.
    ///
    /// Emits `ActivationChanged(false)`; a no-op when already deactivated.
    pub fn deactivate(&mut self) {
        if !self.activated {
            return;
        }
        self.activated = false;
        self.theme = None;
        let _ = self.events.send(AppearanceEvent::ActivationChanged(false));
        debug!("appearance state deactivated");
    }

    /// Updates the display scale factor.
    ///
    /// Values equal to the current one (within [`SCALE_EPSILON`]) and
    /// non-positive or non-finite values are ignored, so dependent
    /// recompute paths only run on a real change.
    pub fn set_scale_factor(&mut self, scale: f64) {
        if !scale.is_finite() || scale <= 0.0 {
            warn!(scale, "ignoring invalid scale factor");
            return;
        }
        if (scale - self.scale_factor).abs() < SCALE_EPSILON {
            return;
        }
        self.scale_factor = scale;
        let _ = self.events.send(AppearanceEvent::ScaleFactorChanged(scale));
        debug!(scale, "scale factor changed");
    }

    /// Handles an external appearance notification.
    ///
    /// Recognized keys are mapped to internal state updates; every
    /// notification, recognized or not, is passed through as an
    /// [`AppearanceEvent::AppearanceChanged`] event. Unrecognized keys
    /// are not an error.
    pub fn handle_appearance_changed(&mut self, key: &str, value: &str) {
        match key {
            THEME_KEY => {
                self.set_theme(value);
            }
            SCALE_FACTOR_KEY => match value.parse::<f64>() {
                Ok(scale) => self.set_scale_factor(scale),
                Err(_) => warn!(value, "unparseable scale factor from appearance bus"),
            },
            _ => {}
        }
        let _ = self.events.send(AppearanceEvent::AppearanceChanged {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
}
