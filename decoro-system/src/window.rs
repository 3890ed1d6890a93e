//! Per-window tracking state.

use std::time::Instant;

use crate::backend::WindowId;
use crate::clip::ClipRegion;
use crate::shadow::ShadowKey;

/// The compositor-level variant of a window.
///
/// The variant is observed when the window is added and is immutable
/// afterwards; in particular a window observed `Unmanaged` at creation
/// never becomes eligible for force-decorate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    /// A regular window manager client.
    Managed,
    /// An override-redirect window that opted out of window-manager control.
    Unmanaged,
    /// A shell surface (panels, docks) from the compositor's shell.
    Shell,
}

impl WindowKind {
    /// Whether titlebar/border decoration can be drawn for this kind.
    pub fn supports_decoration(&self) -> bool {
        matches!(self, WindowKind::Managed | WindowKind::Shell)
    }

    /// Whether force-decorate may be applied. Never for unmanaged windows.
    pub fn supports_forced_decoration(&self) -> bool {
        !matches!(self, WindowKind::Unmanaged)
    }
}

/// Decoration state machine per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationState {
    /// Tracked but outside window-manager decoration control.
    Unmanaged,
    /// Managed, decoration suppressed by policy.
    ManagedNoDecoration,
    /// Managed and decorated; cached shadow (if any) is up to date.
    ManagedDecorated,
    /// Decorated, waiting on a debounced shadow build.
    PendingShadowBuild,
    /// Terminal; the window left the compositor.
    Removed,
}

/// Everything the engine tracks for one window.
#[derive(Debug)]
pub struct TrackedWindow {
    /// The windowing-system identity.
    pub id: WindowId,
    /// The variant observed at creation.
    pub kind: WindowKind,
    /// Current decoration state.
    pub state: DecorationState,
    /// Last observed value of the theme-active marker.
    pub theme_marker: bool,
    /// Last observed value of the no-titlebar flag.
    pub no_titlebar: bool,
    /// Last observed value of the force-decorate flag.
    pub force_decorate: bool,
    /// Last successfully applied clip, if any.
    pub clip: Option<ClipRegion>,
    /// Cache key of the shadow currently backing this window.
    pub shadow_key: Option<ShadowKey>,
    /// When the window was added; used for startup-latency tracing.
    pub added_at: Instant,
    /// Whether first damage after add has been traced already.
    pub first_damage_seen: bool,
}

impl TrackedWindow {
    /// Creates a fresh tracking entry in the initial state for its kind.
    pub fn new(id: WindowId, kind: WindowKind) -> Self {
        let state = if kind == WindowKind::Unmanaged {
            DecorationState::Unmanaged
        } else {
            DecorationState::ManagedNoDecoration
        };
        TrackedWindow {
            id,
            kind,
            state,
            theme_marker: false,
            no_titlebar: false,
            force_decorate: false,
            clip: None,
            shadow_key: None,
            added_at: Instant::now(),
            first_damage_seen: false,
        }
    }

    /// Effective titlebar height under the given theme height.
    ///
    /// The no-titlebar flag has highest precedence: when set, the height
    /// is 0 regardless of force-decorate or anything else.
    pub fn decoration_height(&self, theme_titlebar_height: u32) -> u32 {
        if self.no_titlebar {
            0
        } else {
            theme_titlebar_height
        }
    }
}
