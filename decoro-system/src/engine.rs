//! The attribute synchronizer.
//!
//! [`DecorationEngine`] subscribes to compositor lifecycle and
//! property-change events, applies policy to decide decoration state per
//! window, mutates windowing-system properties on real windows, and
//! drives shadow cache population and eviction through the
//! pending-window tracker.
//!
//! All events are delivered on one control thread: timer firings and
//! configuration-bus replies re-enter the engine as ordinary
//! [`EngineMessage`]s through an unbounded channel, never by blocking.
//! Events for the same window are processed in arrival order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, trace, warn};

use crate::atoms::AtomSet;
use crate::backend::{Atom, WindowId, WindowingBackend};
use crate::bus::{AppearanceBus, BusError};
use crate::clip::ClipDecoder;
use crate::error::SystemResult;
use crate::events::EngineEvent;
use crate::pending::{PendingWindows, DEFAULT_SHADOW_BUILD_DELAY};
use crate::shadow::{ShadowCache, ShadowCategory, ShadowKey, ShadowRenderer};
use crate::window::{DecorationState, TrackedWindow, WindowKind};
use decoro_domain::{AppearanceState, SCALE_FACTOR_KEY, THEME_KEY};

/// Capacity of the broadcast channel for engine events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Role tags carried by window-data-changed notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRole {
    /// The window's blur area changed.
    BlurArea,
    /// The window's corner radius changed.
    WindowRadius,
    /// The window's clip path changed.
    ClipPath,
}

/// Compositor callbacks consumed by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositorEvent {
    /// A window appeared; its kind is observed here and never changes.
    WindowAdded { id: WindowId, kind: WindowKind },
    /// A window left the compositor. Terminal for its tracking entry.
    WindowRemoved { id: WindowId },
    /// A windowing-system property changed on a window.
    PropertyChanged { id: WindowId, atom: Atom },
    /// Role-tagged per-window data changed inside the compositor.
    WindowDataChanged { id: WindowId, role: DataRole },
    /// A window was damaged. Used only for startup-latency tracing.
    WindowDamaged { id: WindowId },
    /// Compositing was enabled or disabled.
    CompositingToggled { active: bool },
}

/// Messages entering the engine's single-threaded event queue.
#[derive(Debug)]
pub enum EngineMessage {
    /// A compositor callback.
    Compositor(CompositorEvent),
    /// A debounced shadow-build timer elapsed. Carries the generation
    /// stamped at schedule time; a superseded timer's message is dropped.
    ShadowBuildDue(WindowId, u64),
    /// Reply to an asynchronous scale-factor query.
    ScaleFactorReply(Result<f64, BusError>),
    /// An appearance-bus change notification.
    Bus { key: String, value: String },
}

/// The core orchestrator of the decoration engine.
///
/// Owns the atom registry, the shadow cache, the pending-window tracker,
/// and the appearance state exclusively; no external component mutates
/// them directly, which removes the need for locking.
pub struct DecorationEngine {
    backend: Box<dyn WindowingBackend>,
    renderer: Box<dyn ShadowRenderer>,
    clip_decoder: Box<dyn ClipDecoder>,
    atoms: AtomSet,
    appearance: AppearanceState,
    shadows: ShadowCache,
    pending: PendingWindows,
    windows: HashMap<WindowId, TrackedWindow>,
    compositing_active: bool,
    shadow_build_delay: Duration,
    events: broadcast::Sender<EngineEvent>,
    tx: mpsc::UnboundedSender<EngineMessage>,
    rx: mpsc::UnboundedReceiver<EngineMessage>,
}

impl DecorationEngine {
    /// Creates an engine, resolving the atom registry through the backend.
    ///
    /// # Errors
    ///
    /// Atom resolution failure means the windowing-system connection is
    /// unavailable; this is a startup precondition, so the error is
    /// surfaced instead of degraded.
    pub fn new(
        backend: Box<dyn WindowingBackend>,
        renderer: Box<dyn ShadowRenderer>,
        clip_decoder: Box<dyn ClipDecoder>,
        appearance: AppearanceState,
    ) -> SystemResult<Self> {
        let atoms = AtomSet::resolve(backend.as_ref())?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(DecorationEngine {
            backend,
            renderer,
            clip_decoder,
            atoms,
            appearance,
            shadows: ShadowCache::new(),
            pending: PendingWindows::new(),
            windows: HashMap::new(),
            compositing_active: true,
            shadow_build_delay: DEFAULT_SHADOW_BUILD_DELAY,
            events,
            tx,
            rx,
        })
    }

    /// A sender through which external sources feed the event queue.
    pub fn sender(&self) -> mpsc::UnboundedSender<EngineMessage> {
        self.tx.clone()
    }

    /// Registers a new subscriber for engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Overrides the debounce delay for shadow builds.
    pub fn set_shadow_build_delay(&mut self, delay: Duration) {
        self.shadow_build_delay = delay;
    }

    /// The resolved atom registry.
    pub fn atoms(&self) -> &AtomSet {
        &self.atoms
    }

    /// The appearance state owned by this engine.
    pub fn appearance(&self) -> &AppearanceState {
        &self.appearance
    }

    /// The shadow cache owned by this engine.
    pub fn shadow_cache(&self) -> &ShadowCache {
        &self.shadows
    }

    /// The pending-window tracker owned by this engine.
    pub fn pending_builds(&self) -> &PendingWindows {
        &self.pending
    }

    /// The tracking entry for a window, if it is tracked.
    pub fn tracked_window(&self, id: WindowId) -> Option<&TrackedWindow> {
        self.windows.get(&id)
    }

    /// The decoration state of a window, if it is tracked.
    pub fn window_state(&self, id: WindowId) -> Option<DecorationState> {
        self.windows.get(&id).map(|w| w.state)
    }

    /// Whether compositing is currently active.
    pub fn is_compositing_active(&self) -> bool {
        self.compositing_active
    }

    /// Runs the engine's event loop until the process tears down.
    pub async fn run(&mut self) {
        while let Some(message) = self.rx.recv().await {
            self.handle_message(message);
        }
    }

    /// Drains every message currently queued, returning the count.
    ///
    /// Embedders that own the control thread call this after timers or
    /// bus replies have had a chance to fire.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
            processed += 1;
        }
        processed
    }

    /// Dispatches one message from the event queue.
    pub fn handle_message(&mut self, message: EngineMessage) {
        match message {
            EngineMessage::Compositor(event) => self.handle_compositor_event(event),
            EngineMessage::ShadowBuildDue(id, generation) => {
                self.on_shadow_build_due(id, generation)
            }
            EngineMessage::ScaleFactorReply(Ok(scale)) => self.on_scale_factor(scale),
            EngineMessage::ScaleFactorReply(Err(err)) => {
                // Transient: retried on the next trigger, never re-queried here.
                warn!(error = %err, "scale factor query failed");
            }
            EngineMessage::Bus { key, value } => self.on_bus_event(key, value),
        }
    }

    /// Dispatches one compositor callback.
    pub fn handle_compositor_event(&mut self, event: CompositorEvent) {
        match event {
            CompositorEvent::WindowAdded { id, kind } => self.on_window_added(id, kind),
            CompositorEvent::WindowRemoved { id } => self.on_window_removed(id),
            CompositorEvent::PropertyChanged { id, atom } => self.on_property_changed(id, atom),
            CompositorEvent::WindowDataChanged { id, role } => self.on_window_data_changed(id, role),
            CompositorEvent::WindowDamaged { id } => self.on_window_damaged(id),
            CompositorEvent::CompositingToggled { active } => self.on_compositing_toggled(active),
        }
    }

    /// Loads and applies the named theme engine-wide.
    ///
    /// On success the shadow cache is cleared, decoration suppression is
    /// re-evaluated for every tracked window, and atoms are re-applied.
    /// Applying the same theme twice converges on the same final state.
    pub fn set_theme(&mut self, name: &str) -> bool {
        let was_activated = self.appearance.is_activated();
        if !self.appearance.set_theme(name) {
            return false;
        }
        let evicted = self.shadows.clear();
        for window in self.windows.values_mut() {
            window.shadow_key = None;
        }
        debug!(theme = name, evicted, "theme changed; cleared shadow cache");
        let _ = self
            .events
            .send(EngineEvent::ThemeChanged(name.to_string()));
        if !was_activated {
            let _ = self.events.send(EngineEvent::ActivationChanged(true));
        }
        let ids: Vec<WindowId> = self.windows.keys().copied().collect();
        for id in ids {
            self.refresh_window_policy(id);
        }
        true
    }

    /// Issues an asynchronous scale-factor query; the reply re-enters
    /// the event queue as [`EngineMessage::ScaleFactorReply`].
    pub fn request_scale_factor(&self, bus: Arc<dyn AppearanceBus>) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let reply = bus.fetch_scale_factor().await;
            let _ = tx.send(EngineMessage::ScaleFactorReply(reply));
        });
    }

    /// Tears the engine down: cancels pending builds, releases every
    /// cached shadow, detaches attached shadows, and deactivates the
    /// appearance state.
    pub fn shutdown(&mut self) {
        self.pending.cancel_all();
        let evicted = self.shadows.clear();
        let ids: Vec<WindowId> = self
            .windows
            .iter()
            .filter(|(_, w)| w.shadow_key.is_some())
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            if let Some(window) = self.windows.get_mut(&id) {
                window.shadow_key = None;
            }
            if let Err(err) = self.backend.detach_shadow(id) {
                warn!(window = %id, error = %err, "failed to detach shadow during shutdown");
            }
        }
        if self.appearance.is_activated() {
            self.appearance.deactivate();
            let _ = self.events.send(EngineEvent::ActivationChanged(false));
        }
        debug!(evicted, "engine shut down");
    }

    // --- compositor event handlers ---

    fn on_window_added(&mut self, id: WindowId, kind: WindowKind) {
        if self.windows.contains_key(&id) {
            debug!(window = %id, "window already tracked; ignoring add");
            return;
        }
        self.windows.insert(id, TrackedWindow::new(id, kind));
        trace!(window = %id, ?kind, "window added");
        self.refresh_window_policy(id);
        // Pick up a clip the application set before we started tracking.
        self.update_clip(id);
    }

    fn on_window_removed(&mut self, id: WindowId) {
        let Some(window) = self.windows.get_mut(&id) else {
            trace!(window = %id, "remove for untracked window");
            return;
        };
        window.state = DecorationState::Removed;
        self.pending.cancel(id);
        self.evict_window_shadow(id);
        // Terminal: the tracking entry is dropped, so any late event for
        // this id falls into the untracked-window paths.
        self.windows.remove(&id);
        trace!(window = %id, "window removed");
    }

    fn on_property_changed(&mut self, id: WindowId, atom: Atom) {
        if !self.windows.contains_key(&id) {
            trace!(window = %id, atom, "property change for untracked window");
            return;
        }
        // Only the property that changed is re-evaluated.
        if atom == self.atoms.no_titlebar() {
            self.update_no_titlebar(id);
            self.apply_window_state(id);
        } else if atom == self.atoms.force_decorate() {
            self.update_force_decorate(id);
            self.apply_window_state(id);
        } else if atom == self.atoms.scissor_window() {
            self.update_clip(id);
        } else if atom == self.atoms.theme() {
            let marker = self.read_flag_or(id, self.atoms.theme(), true);
            if let Some(window) = self.windows.get_mut(&id) {
                window.theme_marker = marker;
            }
            self.apply_window_state(id);
        } else if atom == self.atoms.kde_net_wm_shadow() {
            // Native shadow appeared or vanished; re-run the build decision.
            self.apply_window_state(id);
        } else if atom == self.atoms.net_wm_window_type() {
            let _ = self.events.send(EngineEvent::WindowTypeChanged(id));
            self.refresh_window_policy(id);
        } else {
            trace!(window = %id, atom, "ignoring change of unrelated atom");
        }
    }

    fn on_window_data_changed(&mut self, id: WindowId, role: DataRole) {
        if !self.windows.contains_key(&id) {
            return;
        }
        match role {
            DataRole::BlurArea => {
                trace!(window = %id, "blur area changed");
            }
            DataRole::WindowRadius => {
                // The radius shapes the shadow mask; qualifying rebuild event.
                trace!(window = %id, "window radius changed");
                self.apply_window_state(id);
            }
            DataRole::ClipPath => {
                let clip = self.windows.get(&id).and_then(|w| w.clip.clone());
                if let Some(region) = clip {
                    if let Err(err) = self.backend.apply_clip(id, &region) {
                        warn!(window = %id, error = %err, "failed to re-apply clip");
                    }
                }
            }
        }
    }

    fn on_window_damaged(&mut self, id: WindowId) {
        if let Some(window) = self.windows.get_mut(&id) {
            if !window.first_damage_seen {
                window.first_damage_seen = true;
                trace!(
                    window = %id,
                    elapsed_ms = window.added_at.elapsed().as_millis() as u64,
                    "first damage after add"
                );
            }
        }
    }

    fn on_compositing_toggled(&mut self, active: bool) {
        if active == self.compositing_active {
            return;
        }
        self.compositing_active = active;
        if !active {
            // Compositor-native shadowing is assumed while compositing is off.
            self.pending.cancel_all();
            let evicted = self.shadows.clear();
            let ids: Vec<WindowId> = self.windows.keys().copied().collect();
            for id in ids {
                let had_shadow = match self.windows.get_mut(&id) {
                    Some(window) => {
                        if window.state == DecorationState::PendingShadowBuild {
                            window.state = DecorationState::ManagedDecorated;
                        }
                        window.shadow_key.take().is_some()
                    }
                    None => false,
                };
                if had_shadow {
                    if let Err(err) = self.backend.detach_shadow(id) {
                        warn!(window = %id, error = %err, "failed to detach shadow");
                    }
                }
            }
            debug!(evicted, "compositing disabled; cleared shadow cache");
        } else {
            debug!("compositing enabled; rebuilding shadows for decorated windows");
            self.rebuild_all_shadows();
        }
    }

    // --- timer and bus handlers ---

    fn on_shadow_build_due(&mut self, id: WindowId, generation: u64) {
        if !self.pending.complete(id, generation) {
            trace!(window = %id, "stale shadow build timer");
            return;
        }
        let Some(window) = self.windows.get(&id) else {
            return;
        };
        let kind = window.kind;
        if window.state == DecorationState::Removed {
            return;
        }
        // Settle the state first; the cache work below may bail out early,
        // leaving the window decorated without a cached shadow.
        if kind.supports_decoration() {
            if let Some(window) = self.windows.get_mut(&id) {
                window.state = DecorationState::ManagedDecorated;
            }
        }
        if !self.compositing_active {
            return;
        }

        let focused = match self.backend.is_window_active(id) {
            Ok(focused) => focused,
            Err(err) => {
                warn!(window = %id, error = %err, "focus probe failed; assuming focused");
                true
            }
        };
        let category = ShadowCategory::for_window(kind, focused);
        let profile = {
            let Some(theme) = self.appearance.theme() else {
                return;
            };
            match category {
                ShadowCategory::Active => theme.shadow.active,
                ShadowCategory::Inactive => theme.shadow.inactive,
                ShadowCategory::Unmanaged => theme.shadow.unmanaged,
            }
        };
        let geometry = match self.backend.window_geometry(id) {
            Ok(geometry) if !geometry.is_empty() => geometry,
            Ok(_) => {
                warn!(window = %id, "window has empty geometry; skipping shadow build");
                return;
            }
            Err(err) => {
                warn!(window = %id, error = %err, "geometry read failed; skipping shadow build");
                return;
            }
        };
        let scale = self.appearance.scale_factor();
        let key = ShadowKey::new(category, geometry, profile.radius, scale);

        if self.shadows.get(&key).is_none() {
            match self.renderer.build(&profile, geometry, scale) {
                Ok(handle) => self.shadows.put(key.clone(), handle),
                Err(err) => {
                    // Retried on the next qualifying event, never immediately.
                    warn!(window = %id, error = %err, "shadow build failed");
                    return;
                }
            }
        }
        if let Some(handle) = self.shadows.get(&key) {
            if let Err(err) = self.backend.attach_shadow(id, handle) {
                warn!(window = %id, error = %err, "failed to attach shadow");
            }
        }
        if let Some(window) = self.windows.get_mut(&id) {
            window.shadow_key = Some(key);
        }
    }

    fn on_scale_factor(&mut self, scale: f64) {
        let previous = self.appearance.scale_factor();
        self.appearance.set_scale_factor(scale);
        if self.appearance.scale_factor() == previous {
            return;
        }
        let _ = self.events.send(EngineEvent::ScaleFactorChanged(scale));
        // Shadow geometry and corner radii are scale-dependent.
        self.shadows.clear();
        for window in self.windows.values_mut() {
            window.shadow_key = None;
        }
        self.rebuild_all_shadows();
    }

    fn on_bus_event(&mut self, key: String, value: String) {
        match key.as_str() {
            THEME_KEY => {
                self.set_theme(&value);
            }
            SCALE_FACTOR_KEY => match value.parse::<f64>() {
                Ok(scale) => self.on_scale_factor(scale),
                Err(_) => warn!(value, "unparseable scale factor from appearance bus"),
            },
            _ => {
                self.appearance.handle_appearance_changed(&key, &value);
            }
        }
        let _ = self.events.send(EngineEvent::AppearanceChanged { key, value });
    }

    // --- policy helpers ---

    /// Re-reads every protocol property of a window and recomputes its
    /// decoration state. Used on add, theme change, and type change.
    fn refresh_window_policy(&mut self, id: WindowId) {
        if !self.windows.contains_key(&id) {
            return;
        }
        // Read failures fall back to a fully decorated default rather
        // than dropping the window from tracking.
        let marker = self.read_flag_or(id, self.atoms.theme(), true);
        if let Some(window) = self.windows.get_mut(&id) {
            window.theme_marker = marker;
        }
        self.update_no_titlebar(id);
        self.update_force_decorate(id);
        self.apply_window_state(id);
    }

    /// Recomputes the decoration state from the cached property values
    /// and schedules or cancels shadow work accordingly.
    fn apply_window_state(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(&id) else {
            return;
        };
        let kind = window.kind;
        let state = window.state;
        let marker = window.theme_marker;
        let no_titlebar = window.no_titlebar;
        if state == DecorationState::Removed {
            return;
        }

        if kind == WindowKind::Unmanaged {
            // Unmanaged windows never get titlebar decoration, but marked
            // ones still get a cached shadow in their own category.
            if marker && !no_titlebar && self.compositing_active {
                self.schedule_shadow_build(id);
            } else {
                self.pending.cancel(id);
                self.evict_window_shadow(id);
            }
            return;
        }

        let decorated = self.appearance.is_activated() && marker && !no_titlebar;
        if decorated {
            let native = match self.backend.has_native_shadow(id) {
                Ok(native) => native,
                Err(err) => {
                    warn!(window = %id, error = %err, "native shadow probe failed");
                    false
                }
            };
            if !self.compositing_active || native {
                self.pending.cancel(id);
                if let Some(window) = self.windows.get_mut(&id) {
                    window.state = DecorationState::ManagedDecorated;
                }
            } else {
                self.schedule_shadow_build(id);
            }
        } else {
            self.pending.cancel(id);
            self.evict_window_shadow(id);
            if let Some(window) = self.windows.get_mut(&id) {
                window.state = DecorationState::ManagedNoDecoration;
            }
        }
    }

    fn schedule_shadow_build(&mut self, id: WindowId) {
        self.pending.schedule(id, self.shadow_build_delay, &self.tx);
        if let Some(window) = self.windows.get_mut(&id) {
            if window.kind.supports_decoration() {
                window.state = DecorationState::PendingShadowBuild;
            }
        }
    }

    /// Queues rebuilds for every window that should carry a cached
    /// shadow but has no compositor-native one.
    fn rebuild_all_shadows(&mut self) {
        let candidates: Vec<WindowId> = self
            .windows
            .values()
            .filter(|w| match w.kind {
                WindowKind::Unmanaged => w.theme_marker && !w.no_titlebar,
                _ => matches!(
                    w.state,
                    DecorationState::ManagedDecorated | DecorationState::PendingShadowBuild
                ),
            })
            .map(|w| w.id)
            .collect();
        for id in candidates {
            let native = match self.backend.has_native_shadow(id) {
                Ok(native) => native,
                Err(err) => {
                    warn!(window = %id, error = %err, "native shadow probe failed");
                    false
                }
            };
            if !native {
                self.schedule_shadow_build(id);
            }
        }
    }

    fn update_no_titlebar(&mut self, id: WindowId) {
        let value = self.read_flag_or(id, self.atoms.no_titlebar(), false);
        let changed = match self.windows.get_mut(&id) {
            Some(window) if window.no_titlebar != value => {
                window.no_titlebar = value;
                true
            }
            _ => false,
        };
        if changed {
            let _ = self.events.send(EngineEvent::WindowNoTitlebarChanged(id));
        }
    }

    fn update_force_decorate(&mut self, id: WindowId) {
        let value = self.read_flag_or(id, self.atoms.force_decorate(), false);
        let (changed, kind) = match self.windows.get_mut(&id) {
            Some(window) if window.force_decorate != value => {
                window.force_decorate = value;
                (true, window.kind)
            }
            Some(window) => (false, window.kind),
            None => return,
        };
        if !changed {
            return;
        }
        let _ = self
            .events
            .send(EngineEvent::WindowForceDecorateChanged(id));
        if kind.supports_forced_decoration() {
            if let Err(err) = self.backend.set_override_stripped(id, value) {
                warn!(window = %id, error = %err, "failed to update override marking");
            }
        } else {
            // Observed-unmanaged-at-creation is immutable.
            trace!(window = %id, "force-decorate ignored for unmanaged window");
        }
    }

    fn update_clip(&mut self, id: WindowId) {
        let payload = match self.backend.read_bytes(id, self.atoms.scissor_window()) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(window = %id, error = %err, "scissor read failed; keeping previous clip");
                return;
            }
        };
        match payload {
            None => {
                let had_clip = self
                    .windows
                    .get_mut(&id)
                    .map(|w| w.clip.take().is_some())
                    .unwrap_or(false);
                if had_clip {
                    if let Err(err) = self.backend.clear_clip(id) {
                        warn!(window = %id, error = %err, "failed to clear clip");
                    }
                    let _ = self.events.send(EngineEvent::WindowScissorChanged(id));
                }
            }
            Some(bytes) => match self.clip_decoder.decode(&bytes) {
                Ok(region) => {
                    if let Err(err) = self.backend.apply_clip(id, &region) {
                        warn!(window = %id, error = %err, "failed to apply clip");
                        return;
                    }
                    if let Some(window) = self.windows.get_mut(&id) {
                        window.clip = Some(region);
                    }
                    let _ = self.events.send(EngineEvent::WindowScissorChanged(id));
                }
                Err(err) => {
                    // Previous clip is retained; malformed payloads are not fatal.
                    warn!(window = %id, error = %err, "malformed scissor payload");
                }
            },
        }
    }

    fn evict_window_shadow(&mut self, id: WindowId) {
        let key = match self.windows.get_mut(&id) {
            Some(window) => match window.shadow_key.take() {
                Some(key) => key,
                None => return,
            },
            None => return,
        };
        let shared = self
            .windows
            .values()
            .any(|w| w.shadow_key.as_ref() == Some(&key));
        if !shared {
            self.shadows.evict(&key);
        }
        if let Err(err) = self.backend.detach_shadow(id) {
            warn!(window = %id, error = %err, "failed to detach shadow");
        }
    }

    fn read_flag_or(&self, id: WindowId, atom: Atom, default_on_error: bool) -> bool {
        match self.backend.read_card32(id, atom) {
            Ok(value) => value == Some(1),
            Err(err) => {
                warn!(window = %id, atom, error = %err, "property read failed; using default");
                default_on_error
            }
        }
    }
}
