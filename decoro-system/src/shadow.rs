//! The shadow cache.
//!
//! A keyed store of built shadow resources, partitioned by window
//! category so the same geometry can produce different shadow profiles
//! for active, inactive, and unmanaged windows without key collisions.
//! Entries are exclusively owned by the cache and released when evicted
//! or when the cache is cleared on theme change, compositing toggle, or
//! teardown.

use std::collections::HashMap;

use tracing::trace;

use crate::backend::BackendError;
use crate::window::WindowKind;
use decoro_core::types::Size;
use decoro_domain::ShadowProfile;

/// Classification used to select a shadow rendering profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowCategory {
    /// The focused window; strongest shadow.
    Active,
    /// Unfocused managed windows.
    Inactive,
    /// Override-redirect windows.
    Unmanaged,
}

impl ShadowCategory {
    /// Picks the category for a window of the given kind and focus state.
    pub fn for_window(kind: WindowKind, focused: bool) -> Self {
        match kind {
            WindowKind::Unmanaged => ShadowCategory::Unmanaged,
            _ if focused => ShadowCategory::Active,
            _ => ShadowCategory::Inactive,
        }
    }
}

/// Cache key: category plus a resource key derived from window geometry,
/// shadow radius, and display scale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShadowKey {
    /// The window-state partition this entry belongs to.
    pub category: ShadowCategory,
    /// Geometry/theme-derived discriminator within the partition.
    pub resource: String,
}

impl ShadowKey {
    /// Derives a key from the parameters that shape the rendered shadow.
    pub fn new(category: ShadowCategory, geometry: Size<u32>, radius: f64, scale: f64) -> Self {
        ShadowKey {
            category,
            resource: format!(
                "{}x{}:r{:.1}:s{:.2}",
                geometry.width, geometry.height, radius, scale
            ),
        }
    }
}

/// An owned, built shadow resource.
///
/// The handle is minted by the [`ShadowRenderer`]; the cache is its only
/// owner and dropping it releases the underlying resource.
#[derive(Debug, PartialEq, Eq)]
pub struct ShadowHandle {
    id: u64,
    geometry: Size<u32>,
}

impl ShadowHandle {
    /// Wraps a renderer-assigned resource id and the geometry it was built for.
    pub fn new(id: u64, geometry: Size<u32>) -> Self {
        ShadowHandle { id, geometry }
    }

    /// The renderer-assigned resource id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The window geometry this shadow was built for.
    pub fn geometry(&self) -> Size<u32> {
        self.geometry
    }
}

/// Builds shadow resources; the actual pixel work lives in the rendering
/// collaborator behind this trait.
pub trait ShadowRenderer: Send {
    /// Builds a shadow for the given profile, window geometry, and scale.
    ///
    /// # Errors
    ///
    /// Resource-allocation failures are recoverable: the window is left
    /// without a cached shadow and the build is retried on the next
    /// qualifying event.
    fn build(
        &mut self,
        profile: &ShadowProfile,
        geometry: Size<u32>,
        scale: f64,
    ) -> Result<ShadowHandle, BackendError>;
}

/// Keyed store of built shadows. At most one live entry per key.
#[derive(Debug, Default)]
pub struct ShadowCache {
    entries: HashMap<ShadowKey, ShadowHandle>,
}

impl ShadowCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure lookup, no side effect.
    pub fn get(&self, key: &ShadowKey) -> Option<&ShadowHandle> {
        self.entries.get(key)
    }

    /// Inserts an entry, replacing and releasing any prior resource
    /// under the same key.
    pub fn put(&mut self, key: ShadowKey, handle: ShadowHandle) {
        if let Some(prev) = self.entries.insert(key, handle) {
            trace!(id = prev.id(), "replaced cached shadow");
        }
    }

    /// Releases the entry under `key`, returning it if present.
    pub fn evict(&mut self, key: &ShadowKey) -> Option<ShadowHandle> {
        self.entries.remove(key)
    }

    /// Releases every entry in the given category, returning the count.
    pub fn evict_category(&mut self, category: ShadowCategory) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.category != category);
        before - self.entries.len()
    }

    /// Releases all entries, returning the count. Idempotent: clearing
    /// an empty cache is a no-op.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
