/// Change notifications emitted by [`AppearanceState`].
///
/// Broadcast over a `tokio::sync::broadcast` channel; consumers register
/// interest via [`AppearanceState::subscribe`] and producers publish
/// without knowing subscriber identities.
///
/// [`AppearanceState`]: super::service::AppearanceState
/// [`AppearanceState::subscribe`]: super::service::AppearanceState::subscribe
#[derive(Debug, Clone, PartialEq)]
pub enum AppearanceEvent {
    /// The activation flag changed. `true` iff a theme is loaded and usable.
    ActivationChanged(bool),
    /// A theme was applied; carries the theme name.
    ThemeChanged(String),
    /// The display scale factor changed.
    ScaleFactorChanged(f64),
    /// Passthrough of an external appearance notification.
    AppearanceChanged { key: String, value: String },
}
