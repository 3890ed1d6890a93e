//! System layer for the Decoro decoration engine.
//!
//! This crate keeps three things consistent for every managed window:
//! decoration theme attributes exposed via windowing-system properties,
//! cached rendering resources (shadows, clip paths), and configuration
//! state propagated from the appearance service.
//!
//! The central type is [`engine::DecorationEngine`], the attribute
//! synchronizer: it consumes compositor lifecycle and property-change
//! events, applies decoration policy per window, and drives the shadow
//! cache through the pending-window tracker.

pub mod atoms;
pub mod backend;
pub mod bus;
pub mod clip;
pub mod engine;
pub mod error;
pub mod events;
pub mod pending;
pub mod shadow;
pub mod window;

#[cfg(test)]
mod engine_tests;

pub use atoms::AtomSet;
pub use backend::{Atom, BackendError, WindowId, WindowingBackend};
pub use bus::{AppearanceBus, BusError, DbusAppearanceBus};
pub use clip::{ClipDecodeError, ClipDecoder, ClipRegion, RectListDecoder};
pub use engine::{CompositorEvent, DataRole, DecorationEngine, EngineMessage};
pub use error::{SystemError, SystemResult};
pub use events::EngineEvent;
pub use pending::{PendingWindows, DEFAULT_SHADOW_BUILD_DELAY};
pub use shadow::{ShadowCache, ShadowCategory, ShadowHandle, ShadowKey, ShadowRenderer};
pub use window::{DecorationState, TrackedWindow, WindowKind};
