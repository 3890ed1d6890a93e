//! The atom registry.
//!
//! The six properties of the theme protocol are resolved exactly once at
//! engine startup and are immutable afterwards; only read accessors are
//! exposed. Resolution failure means the windowing-system connection is
//! unavailable, which is a startup precondition and therefore fatal.

use crate::backend::{Atom, BackendError, WindowingBackend};

/// Marks a window as currently using the Decoro titlebar theme.
pub const ATOM_NAME_THEME: &str = "_DECORO_THEME";
/// When 1, the window's titlebar height is 0 and the titlebar is hidden.
pub const ATOM_NAME_NO_TITLEBAR: &str = "_DECORO_NO_TITLEBAR";
/// Forces border decoration; strips the override type marking. Has no
/// effect on unmanaged windows.
pub const ATOM_NAME_FORCE_DECORATE: &str = "_DECORO_FORCE_DECORATE";
/// Carries the serialized clip region of a window.
pub const ATOM_NAME_SCISSOR_WINDOW: &str = "_DECORO_SCISSOR_WINDOW";
/// Compositor shadow property; windows carrying it keep their native shadow.
pub const ATOM_NAME_KDE_NET_WM_SHADOW: &str = "_KDE_NET_WM_SHADOW";
/// Standard window-type property.
pub const ATOM_NAME_NET_WM_WINDOW_TYPE: &str = "_NET_WM_WINDOW_TYPE";

/// Resolved handles for the theme protocol properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomSet {
    theme: Atom,
    no_titlebar: Atom,
    force_decorate: Atom,
    scissor_window: Atom,
    kde_net_wm_shadow: Atom,
    net_wm_window_type: Atom,
}

impl AtomSet {
    /// Resolves all six atoms through the backend.
    ///
    /// # Errors
    ///
    /// Returns the first [`BackendError`] encountered; callers treat this
    /// as fatal (the engine cannot start without its atoms).
    pub fn resolve(backend: &dyn WindowingBackend) -> Result<Self, BackendError> {
        Ok(AtomSet {
            theme: backend.intern_atom(ATOM_NAME_THEME)?,
            no_titlebar: backend.intern_atom(ATOM_NAME_NO_TITLEBAR)?,
            force_decorate: backend.intern_atom(ATOM_NAME_FORCE_DECORATE)?,
            scissor_window: backend.intern_atom(ATOM_NAME_SCISSOR_WINDOW)?,
            kde_net_wm_shadow: backend.intern_atom(ATOM_NAME_KDE_NET_WM_SHADOW)?,
            net_wm_window_type: backend.intern_atom(ATOM_NAME_NET_WM_WINDOW_TYPE)?,
        })
    }

    /// The theme-active marker atom.
    pub fn theme(&self) -> Atom {
        self.theme
    }

    /// The no-titlebar flag atom.
    pub fn no_titlebar(&self) -> Atom {
        self.no_titlebar
    }

    /// The force-decorate flag atom.
    pub fn force_decorate(&self) -> Atom {
        self.force_decorate
    }

    /// The scissor/clip-region payload atom.
    pub fn scissor_window(&self) -> Atom {
        self.scissor_window
    }

    /// The compositor-native shadow property atom.
    pub fn kde_net_wm_shadow(&self) -> Atom {
        self.kde_net_wm_shadow
    }

    /// The window-type property atom.
    pub fn net_wm_window_type(&self) -> Atom {
        self.net_wm_window_type
    }
}
