use crate::backend::WindowId;

/// Notifications produced by the engine for UI/rendering collaborators.
///
/// Broadcast over a `tokio::sync::broadcast` channel; consumers register
/// interest via [`DecorationEngine::subscribe`].
///
/// [`DecorationEngine::subscribe`]: crate::engine::DecorationEngine::subscribe
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The engine activation flag changed.
    ActivationChanged(bool),
    /// A theme was applied engine-wide.
    ThemeChanged(String),
    /// The display scale factor changed.
    ScaleFactorChanged(f64),
    /// Passthrough of an appearance-bus notification.
    AppearanceChanged { key: String, value: String },
    /// A window's no-titlebar flag changed.
    WindowNoTitlebarChanged(WindowId),
    /// A window's force-decorate flag changed.
    WindowForceDecorateChanged(WindowId),
    /// A window's clip region changed.
    WindowScissorChanged(WindowId),
    /// A window's type property changed.
    WindowTypeChanged(WindowId),
}
