//! The windowing-system backend seam.
//!
//! The compositor's window/effect object model and the X11 connection
//! are external collaborators; the engine reaches them exclusively
//! through [`WindowingBackend`]. Tests substitute a mock, production
//! embeds an implementation backed by the compositor's own connection.

use std::fmt;

use thiserror::Error;

use crate::clip::ClipRegion;
use crate::shadow::ShadowHandle;
use decoro_core::types::Size;

/// A numeric identifier for a named windowing-system property.
pub type Atom = u32;

/// Opaque identity of a windowing-system window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Error type for windowing-backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The windowing-system connection is gone. Fatal during startup
    /// atom resolution; recoverable-local anywhere else.
    #[error("Windowing system connection is unavailable")]
    ConnectionUnavailable,

    /// A named atom could not be resolved.
    #[error("Failed to resolve atom '{name}'")]
    AtomResolution { name: String },

    /// Reading a window property failed.
    #[error("Failed to read property {atom} on window {window}")]
    PropertyRead { window: WindowId, atom: Atom },

    /// Writing or deleting a window property failed.
    #[error("Failed to write property {atom} on window {window}")]
    PropertyWrite { window: WindowId, atom: Atom },

    /// Allocating a rendering resource (e.g. a shadow pixmap) failed.
    #[error("Resource allocation failed: {0}")]
    ResourceAllocation(String),
}

/// Operations the engine needs from the windowing system.
///
/// Reads take `&self`, mutations take `&mut self`; the engine owns the
/// backend exclusively on its single control thread, so no locking is
/// involved.
pub trait WindowingBackend: Send {
    /// Resolves a named atom to its numeric handle.
    fn intern_atom(&self, name: &str) -> Result<Atom, BackendError>;

    /// Reads a CARD32 property. `Ok(None)` means the property is unset.
    fn read_card32(&self, window: WindowId, atom: Atom) -> Result<Option<u32>, BackendError>;

    /// Reads an opaque property payload. `Ok(None)` means unset.
    fn read_bytes(&self, window: WindowId, atom: Atom) -> Result<Option<Vec<u8>>, BackendError>;

    /// Attaches a built shadow resource to the window's shadow property.
    fn attach_shadow(&mut self, window: WindowId, shadow: &ShadowHandle)
        -> Result<(), BackendError>;

    /// Removes any shadow previously attached by the engine.
    fn detach_shadow(&mut self, window: WindowId) -> Result<(), BackendError>;

    /// Applies a clip region as the window's visible area.
    fn apply_clip(&mut self, window: WindowId, region: &ClipRegion) -> Result<(), BackendError>;

    /// Removes any clip previously applied to the window.
    fn clear_clip(&mut self, window: WindowId) -> Result<(), BackendError>;

    /// Whether the window already carries a compositor-native shadow
    /// property, in which case no cached shadow is built for it.
    fn has_native_shadow(&self, window: WindowId) -> Result<bool, BackendError>;

    /// Whether the window currently has input focus.
    fn is_window_active(&self, window: WindowId) -> Result<bool, BackendError>;

    /// Current geometry of the window in pixels.
    fn window_geometry(&self, window: WindowId) -> Result<Size<u32>, BackendError>;

    /// Sets or clears the "override" marking on a window's type so a
    /// border is always drawn when force-decorate applies.
    fn set_override_stripped(
        &mut self,
        window: WindowId,
        stripped: bool,
    ) -> Result<(), BackendError>;
}
