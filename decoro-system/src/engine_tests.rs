//! Behavioral tests for [`DecorationEngine`], driven entirely through
//! its message queue against mock windowing and rendering collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::broadcast::error::TryRecvError;

use async_trait::async_trait;

use crate::backend::{Atom, BackendError, WindowId, WindowingBackend};
use crate::bus::{AppearanceBus, BusError};
use crate::clip::{ClipRegion, RectListDecoder};
use crate::engine::{CompositorEvent, DataRole, DecorationEngine, EngineMessage};
use crate::events::EngineEvent;
use crate::shadow::{ShadowCategory, ShadowHandle, ShadowRenderer};
use crate::window::{DecorationState, WindowKind};
use decoro_core::types::{Rect, Size};
use decoro_domain::{AppearanceState, ShadowProfile, StaticThemeProvider};

const PAST_DELAY: Duration = Duration::from_millis(150);

#[derive(Default)]
struct BackendState {
    card32: HashMap<(WindowId, Atom), u32>,
    bytes: HashMap<(WindowId, Atom), Vec<u8>>,
    native_shadow: HashSet<WindowId>,
    active: Option<WindowId>,
    geometry: HashMap<WindowId, Size<u32>>,
    failing_atoms: HashSet<Atom>,
    failing_clip: bool,
    attached: Vec<(WindowId, u64)>,
    detached: Vec<WindowId>,
    applied_clips: Vec<(WindowId, ClipRegion)>,
    cleared_clips: Vec<WindowId>,
    override_stripped: Vec<(WindowId, bool)>,
}

struct MockBackend {
    state: Arc<Mutex<BackendState>>,
}

impl WindowingBackend for MockBackend {
    fn intern_atom(&self, name: &str) -> Result<Atom, BackendError> {
        // Deterministic handles so tests can address atoms by name.
        match name {
            crate::atoms::ATOM_NAME_THEME => Ok(101),
            crate::atoms::ATOM_NAME_NO_TITLEBAR => Ok(102),
            crate::atoms::ATOM_NAME_FORCE_DECORATE => Ok(103),
            crate::atoms::ATOM_NAME_SCISSOR_WINDOW => Ok(104),
            crate::atoms::ATOM_NAME_KDE_NET_WM_SHADOW => Ok(105),
            crate::atoms::ATOM_NAME_NET_WM_WINDOW_TYPE => Ok(106),
            _ => Err(BackendError::AtomResolution {
                name: name.to_string(),
            }),
        }
    }

    fn read_card32(&self, window: WindowId, atom: Atom) -> Result<Option<u32>, BackendError> {
        let state = self.state.lock().unwrap();
        if state.failing_atoms.contains(&atom) {
            return Err(BackendError::PropertyRead { window, atom });
        }
        Ok(state.card32.get(&(window, atom)).copied())
    }

    fn read_bytes(&self, window: WindowId, atom: Atom) -> Result<Option<Vec<u8>>, BackendError> {
        let state = self.state.lock().unwrap();
        if state.failing_atoms.contains(&atom) {
            return Err(BackendError::PropertyRead { window, atom });
        }
        Ok(state.bytes.get(&(window, atom)).cloned())
    }

    fn attach_shadow(
        &mut self,
        window: WindowId,
        shadow: &ShadowHandle,
    ) -> Result<(), BackendError> {
        self.state.lock().unwrap().attached.push((window, shadow.id()));
        Ok(())
    }

    fn detach_shadow(&mut self, window: WindowId) -> Result<(), BackendError> {
        self.state.lock().unwrap().detached.push(window);
        Ok(())
    }

    fn apply_clip(&mut self, window: WindowId, region: &ClipRegion) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_clip {
            return Err(BackendError::PropertyWrite {
                window,
                atom: 104,
            });
        }
        state.applied_clips.push((window, region.clone()));
        Ok(())
    }

    fn clear_clip(&mut self, window: WindowId) -> Result<(), BackendError> {
        self.state.lock().unwrap().cleared_clips.push(window);
        Ok(())
    }

    fn has_native_shadow(&self, window: WindowId) -> Result<bool, BackendError> {
        Ok(self.state.lock().unwrap().native_shadow.contains(&window))
    }

    fn is_window_active(&self, window: WindowId) -> Result<bool, BackendError> {
        Ok(self.state.lock().unwrap().active == Some(window))
    }

    fn window_geometry(&self, window: WindowId) -> Result<Size<u32>, BackendError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .geometry
            .get(&window)
            .copied()
            .unwrap_or_else(|| Size::new(800, 600)))
    }

    fn set_override_stripped(
        &mut self,
        window: WindowId,
        stripped: bool,
    ) -> Result<(), BackendError> {
        self.state
            .lock()
            .unwrap()
            .override_stripped
            .push((window, stripped));
        Ok(())
    }
}

#[derive(Default)]
struct RendererState {
    next_id: u64,
    fail: bool,
    builds: Vec<(Size<u32>, f64)>,
}

struct MockRenderer {
    state: Arc<Mutex<RendererState>>,
}

impl ShadowRenderer for MockRenderer {
    fn build(
        &mut self,
        _profile: &ShadowProfile,
        geometry: Size<u32>,
        scale: f64,
    ) -> Result<ShadowHandle, BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(BackendError::ResourceAllocation("out of pixmaps".into()));
        }
        state.next_id += 1;
        state.builds.push((geometry, scale));
        Ok(ShadowHandle::new(state.next_id, geometry))
    }
}

struct Harness {
    engine: DecorationEngine,
    backend: Arc<Mutex<BackendState>>,
    renderer: Arc<Mutex<RendererState>>,
}

impl Harness {
    fn new() -> Self {
        let backend = Arc::new(Mutex::new(BackendState::default()));
        let renderer = Arc::new(Mutex::new(RendererState::default()));
        let appearance = AppearanceState::new(Arc::new(StaticThemeProvider::with_default_themes(
            &["classic", "dark"],
        )));
        let engine = DecorationEngine::new(
            Box::new(MockBackend {
                state: Arc::clone(&backend),
            }),
            Box::new(MockRenderer {
                state: Arc::clone(&renderer),
            }),
            Box::new(RectListDecoder),
            appearance,
        )
        .unwrap();
        Harness {
            engine,
            backend,
            renderer,
        }
    }

    /// A harness with the "classic" theme already active.
    fn themed() -> Self {
        let mut harness = Self::new();
        assert!(harness.engine.set_theme("classic"));
        harness
    }

    fn mark_themed(&mut self, id: WindowId) {
        let atom = self.engine.atoms().theme();
        self.backend.lock().unwrap().card32.insert((id, atom), 1);
    }

    fn set_flag(&mut self, id: WindowId, atom: Atom, value: u32) {
        self.backend.lock().unwrap().card32.insert((id, atom), value);
    }

    fn add_window(&mut self, id: WindowId, kind: WindowKind) {
        self.engine
            .handle_compositor_event(CompositorEvent::WindowAdded { id, kind });
    }

    fn property_changed(&mut self, id: WindowId, atom: Atom) {
        self.engine
            .handle_compositor_event(CompositorEvent::PropertyChanged { id, atom });
    }

    fn build_count(&self) -> usize {
        self.renderer.lock().unwrap().builds.len()
    }
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }
    events
}

fn encode_rects(rects: &[(i32, i32, i32, i32)]) -> Vec<u8> {
    let mut payload = Vec::new();
    for (x, y, w, h) in rects {
        payload.extend_from_slice(&x.to_le_bytes());
        payload.extend_from_slice(&y.to_le_bytes());
        payload.extend_from_slice(&w.to_le_bytes());
        payload.extend_from_slice(&h.to_le_bytes());
    }
    payload
}

#[tokio::test(start_paused = true)]
async fn test_marked_window_is_decorated_and_shadowed_after_delay() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.backend.lock().unwrap().active = Some(id);

    harness.add_window(id, WindowKind::Managed);
    assert_eq!(
        harness.engine.window_state(id),
        Some(DecorationState::PendingShadowBuild)
    );
    assert!(harness.engine.shadow_cache().is_empty());

    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();

    assert_eq!(
        harness.engine.window_state(id),
        Some(DecorationState::ManagedDecorated)
    );
    assert_eq!(harness.engine.shadow_cache().len(), 1);
    assert_eq!(harness.build_count(), 1);
    let key = harness
        .engine
        .tracked_window(id)
        .unwrap()
        .shadow_key
        .clone()
        .unwrap();
    assert_eq!(key.category, ShadowCategory::Active);
    assert_eq!(harness.backend.lock().unwrap().attached.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unmarked_window_stays_undecorated() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.add_window(id, WindowKind::Managed);
    assert_eq!(
        harness.engine.window_state(id),
        Some(DecorationState::ManagedNoDecoration)
    );
    assert!(harness.engine.pending_builds().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_no_titlebar_suppresses_decoration_and_shadow() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    let no_titlebar = harness.engine.atoms().no_titlebar();
    harness.set_flag(id, no_titlebar, 1);

    harness.add_window(id, WindowKind::Managed);
    assert_eq!(
        harness.engine.window_state(id),
        Some(DecorationState::ManagedNoDecoration)
    );
    assert!(harness.engine.pending_builds().is_empty());
    assert_eq!(
        harness
            .engine
            .tracked_window(id)
            .unwrap()
            .decoration_height(40),
        0
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_titlebar_set_while_pending_cancels_build() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.add_window(id, WindowKind::Managed);
    assert!(harness.engine.pending_builds().contains(id));

    let no_titlebar = harness.engine.atoms().no_titlebar();
    harness.set_flag(id, no_titlebar, 1);
    harness.property_changed(id, no_titlebar);
    assert!(harness.engine.pending_builds().is_empty());

    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.build_count(), 0);
    assert_eq!(
        harness.engine.window_state(id),
        Some(DecorationState::ManagedNoDecoration)
    );
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_qualifying_events_builds_once() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.add_window(id, WindowKind::Managed);

    // Repeated marker updates inside the debounce window supersede the
    // timer instead of stacking builds.
    let theme = harness.engine.atoms().theme();
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        harness.property_changed(id, theme);
    }
    assert_eq!(harness.engine.pending_builds().len(), 1);

    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.build_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_theme_change_clears_cache_and_converges() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.add_window(id, WindowKind::Managed);
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.engine.shadow_cache().len(), 1);

    let mut rx = harness.engine.subscribe();
    assert!(harness.engine.set_theme("dark"));
    assert!(harness.engine.shadow_cache().is_empty());
    assert_eq!(
        harness.engine.window_state(id),
        Some(DecorationState::PendingShadowBuild)
    );
    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::ThemeChanged(name) if name == "dark")));

    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();

    // Applying the same theme again converges on the same final state.
    assert!(harness.engine.set_theme("dark"));
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(
        harness.engine.window_state(id),
        Some(DecorationState::ManagedDecorated)
    );
    assert_eq!(harness.engine.shadow_cache().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_theme_name_is_a_noop() {
    let mut harness = Harness::new();
    let mut rx = harness.engine.subscribe();
    assert!(!harness.engine.set_theme(""));
    assert!(!harness.engine.appearance().is_activated());
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_theme_leaves_state_untouched() {
    let mut harness = Harness::themed();
    assert!(!harness.engine.set_theme("no-such-theme"));
    assert_eq!(harness.engine.appearance().theme_name(), Some("classic"));
    assert!(harness.engine.appearance().is_activated());
}

#[tokio::test(start_paused = true)]
async fn test_activation_emitted_once_on_first_theme() {
    let harness = Harness::new();
    let mut engine = harness.engine;
    let mut rx = engine.subscribe();

    assert!(engine.set_theme("classic"));
    let first = drain(&mut rx);
    assert_eq!(
        first
            .iter()
            .filter(|e| matches!(e, EngineEvent::ActivationChanged(true)))
            .count(),
        1
    );

    assert!(engine.set_theme("dark"));
    let second = drain(&mut rx);
    assert!(!second
        .iter()
        .any(|e| matches!(e, EngineEvent::ActivationChanged(_))));
}

struct FakeBus {
    scale: Result<f64, ()>,
}

#[async_trait]
impl AppearanceBus for FakeBus {
    async fn fetch_scale_factor(&self) -> Result<f64, BusError> {
        match self.scale {
            Ok(scale) => Ok(scale),
            Err(()) => Err(BusError::InvalidScale(0.0)),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_scale_factor_query_reply_reenters_the_queue() {
    let mut harness = Harness::themed();
    harness
        .engine
        .request_scale_factor(Arc::new(FakeBus { scale: Ok(1.75) }));
    tokio::time::sleep(Duration::from_millis(1)).await;
    harness.engine.pump();
    assert_eq!(harness.engine.appearance().scale_factor(), 1.75);

    // A failed query changes nothing; the next trigger retries.
    harness
        .engine
        .request_scale_factor(Arc::new(FakeBus { scale: Err(()) }));
    tokio::time::sleep(Duration::from_millis(1)).await;
    harness.engine.pump();
    assert_eq!(harness.engine.appearance().scale_factor(), 1.75);
}

#[tokio::test(start_paused = true)]
async fn test_shadow_build_delay_override() {
    let mut harness = Harness::themed();
    harness.engine.set_shadow_build_delay(Duration::from_millis(500));
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.add_window(id, WindowKind::Managed);

    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.build_count(), 0);

    tokio::time::sleep(Duration::from_millis(400)).await;
    harness.engine.pump();
    assert_eq!(harness.build_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_compositing_disabled_releases_all_shadow_work() {
    let mut harness = Harness::themed();
    let managed = WindowId(1);
    let unmanaged = WindowId(2);
    harness.mark_themed(managed);
    harness.mark_themed(unmanaged);
    harness.add_window(managed, WindowKind::Managed);
    harness.add_window(unmanaged, WindowKind::Unmanaged);
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.engine.shadow_cache().len(), 2);

    harness
        .engine
        .handle_compositor_event(CompositorEvent::CompositingToggled { active: false });
    assert!(!harness.engine.is_compositing_active());
    assert!(harness.engine.shadow_cache().is_empty());
    assert!(harness.engine.pending_builds().is_empty());
    assert_eq!(harness.backend.lock().unwrap().detached.len(), 2);
    assert_eq!(
        harness.engine.window_state(managed),
        Some(DecorationState::ManagedDecorated)
    );

    // While compositing is off, a new marked window is decorated but no
    // build is scheduled.
    let late = WindowId(3);
    harness.mark_themed(late);
    harness.add_window(late, WindowKind::Managed);
    assert_eq!(
        harness.engine.window_state(late),
        Some(DecorationState::ManagedDecorated)
    );
    assert!(harness.engine.pending_builds().is_empty());

    // Re-enabling compositing rebuilds for every eligible window.
    harness
        .engine
        .handle_compositor_event(CompositorEvent::CompositingToggled { active: true });
    assert_eq!(harness.engine.pending_builds().len(), 3);
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.engine.shadow_cache().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_native_shadow_skips_cached_build() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.backend.lock().unwrap().native_shadow.insert(id);

    harness.add_window(id, WindowKind::Managed);
    assert_eq!(
        harness.engine.window_state(id),
        Some(DecorationState::ManagedDecorated)
    );
    assert!(harness.engine.pending_builds().is_empty());
    assert_eq!(harness.build_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_build_retries_only_on_next_qualifying_event() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.renderer.lock().unwrap().fail = true;

    harness.add_window(id, WindowKind::Managed);
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();

    // Failure leaves the window decorated but shadowless; no retry loop.
    assert_eq!(
        harness.engine.window_state(id),
        Some(DecorationState::ManagedDecorated)
    );
    assert!(harness.engine.shadow_cache().is_empty());
    assert!(harness.engine.pending_builds().is_empty());

    harness.renderer.lock().unwrap().fail = false;
    let theme = harness.engine.atoms().theme();
    harness.property_changed(id, theme);
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.engine.shadow_cache().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_removal_is_terminal_and_releases_resources() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.add_window(id, WindowKind::Managed);
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.engine.shadow_cache().len(), 1);

    harness
        .engine
        .handle_compositor_event(CompositorEvent::WindowRemoved { id });
    assert!(harness.engine.tracked_window(id).is_none());
    assert!(harness.engine.shadow_cache().is_empty());
    assert!(harness.backend.lock().unwrap().detached.contains(&id));

    // Late events for the removed window are ignored.
    let theme = harness.engine.atoms().theme();
    harness.property_changed(id, theme);
    assert!(harness.engine.pending_builds().is_empty());
    assert!(harness.engine.tracked_window(id).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_shared_shadow_survives_one_windows_removal() {
    let mut harness = Harness::themed();
    let a = WindowId(1);
    let b = WindowId(2);
    harness.mark_themed(a);
    harness.mark_themed(b);
    harness.add_window(a, WindowKind::Managed);
    harness.add_window(b, WindowKind::Managed);
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();

    // Same geometry, same category: both windows share one cache entry.
    assert_eq!(harness.engine.shadow_cache().len(), 1);
    assert_eq!(harness.build_count(), 1);

    harness
        .engine
        .handle_compositor_event(CompositorEvent::WindowRemoved { id: a });
    assert_eq!(harness.engine.shadow_cache().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_force_decorate_never_applies_to_unmanaged() {
    let mut harness = Harness::themed();
    let unmanaged = WindowId(1);
    let managed = WindowId(2);
    let force = harness.engine.atoms().force_decorate();
    harness.set_flag(unmanaged, force, 1);
    harness.set_flag(managed, force, 1);

    harness.add_window(unmanaged, WindowKind::Unmanaged);
    harness.add_window(managed, WindowKind::Managed);

    let stripped = harness.backend.lock().unwrap().override_stripped.clone();
    assert_eq!(stripped, vec![(managed, true)]);
    assert!(harness
        .engine
        .tracked_window(unmanaged)
        .unwrap()
        .force_decorate);
}

#[tokio::test(start_paused = true)]
async fn test_property_read_failure_falls_back_to_decorated() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    {
        let mut backend = harness.backend.lock().unwrap();
        backend.failing_atoms.insert(101); // theme marker
        backend.failing_atoms.insert(102); // no-titlebar
        backend.failing_atoms.insert(103); // force-decorate
    }

    harness.add_window(id, WindowKind::Managed);
    let window = harness.engine.tracked_window(id).unwrap();
    assert!(window.theme_marker);
    assert!(!window.no_titlebar);
    assert!(!window.force_decorate);
    assert_eq!(
        harness.engine.window_state(id),
        Some(DecorationState::PendingShadowBuild)
    );
}

#[tokio::test(start_paused = true)]
async fn test_malformed_scissor_payload_keeps_previous_clip() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.add_window(id, WindowKind::Managed);

    let scissor = harness.engine.atoms().scissor_window();
    let valid = encode_rects(&[(0, 0, 640, 480)]);
    harness
        .backend
        .lock()
        .unwrap()
        .bytes
        .insert((id, scissor), valid);
    harness.property_changed(id, scissor);
    let applied = harness.engine.tracked_window(id).unwrap().clip.clone();
    assert_eq!(
        applied.as_ref().map(|c| c.rects.clone()),
        Some(vec![Rect::new(0, 0, 640, 480)])
    );

    // Truncated payload: the previously applied clip stays in force.
    harness
        .backend
        .lock()
        .unwrap()
        .bytes
        .insert((id, scissor), vec![1, 2, 3]);
    harness.property_changed(id, scissor);
    assert_eq!(harness.engine.tracked_window(id).unwrap().clip, applied);
    assert!(harness.backend.lock().unwrap().cleared_clips.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clip_apply_failure_leaves_clip_unset() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.add_window(id, WindowKind::Managed);
    harness.backend.lock().unwrap().failing_clip = true;

    let scissor = harness.engine.atoms().scissor_window();
    harness
        .backend
        .lock()
        .unwrap()
        .bytes
        .insert((id, scissor), encode_rects(&[(0, 0, 640, 480)]));
    let mut rx = harness.engine.subscribe();
    harness.property_changed(id, scissor);

    assert!(harness.engine.tracked_window(id).unwrap().clip.is_none());
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_deleted_scissor_property_clears_clip() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.add_window(id, WindowKind::Managed);

    let scissor = harness.engine.atoms().scissor_window();
    harness
        .backend
        .lock()
        .unwrap()
        .bytes
        .insert((id, scissor), encode_rects(&[(0, 0, 640, 480)]));
    harness.property_changed(id, scissor);
    assert!(harness.engine.tracked_window(id).unwrap().clip.is_some());

    harness.backend.lock().unwrap().bytes.remove(&(id, scissor));
    harness.property_changed(id, scissor);
    assert!(harness.engine.tracked_window(id).unwrap().clip.is_none());
    assert_eq!(harness.backend.lock().unwrap().cleared_clips, vec![id]);
}

#[tokio::test(start_paused = true)]
async fn test_scale_factor_change_invalidates_cache() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.add_window(id, WindowKind::Managed);
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.renderer.lock().unwrap().builds[0].1, 1.0);

    let mut rx = harness.engine.subscribe();
    harness
        .engine
        .handle_message(EngineMessage::ScaleFactorReply(Ok(2.0)));
    assert!(harness.engine.shadow_cache().is_empty());
    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, EngineEvent::ScaleFactorChanged(s) if *s == 2.0)));

    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.renderer.lock().unwrap().builds[1].1, 2.0);
}

#[tokio::test(start_paused = true)]
async fn test_bus_theme_key_applies_theme() {
    let mut harness = Harness::new();
    let mut rx = harness.engine.subscribe();
    harness.engine.handle_message(EngineMessage::Bus {
        key: "Theme".to_string(),
        value: "dark".to_string(),
    });
    assert_eq!(harness.engine.appearance().theme_name(), Some("dark"));
    let events = drain(&mut rx);
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::ThemeChanged(name) if name == "dark")));
    assert!(events.iter().any(
        |e| matches!(e, EngineEvent::AppearanceChanged { key, value } if key == "Theme" && value == "dark")
    ));
}

#[tokio::test(start_paused = true)]
async fn test_bus_unknown_key_passes_through() {
    let mut harness = Harness::themed();
    let mut rx = harness.engine.subscribe();
    harness.engine.handle_message(EngineMessage::Bus {
        key: "CursorTheme".to_string(),
        value: "breeze".to_string(),
    });
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        EngineEvent::AppearanceChanged { key, value } if key == "CursorTheme" && value == "breeze"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_stale_build_timer_is_ignored() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.add_window(id, WindowKind::Managed);
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.build_count(), 1);

    // A firing with no pending entry (already completed) does nothing.
    harness
        .engine
        .handle_message(EngineMessage::ShadowBuildDue(id, 0));
    assert_eq!(harness.build_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_timer_message_does_not_trigger_build() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.add_window(id, WindowKind::Managed);

    // Let the first timer fire and queue its due message, then reschedule
    // before pumping so the queued message is stale when it is handled.
    tokio::time::sleep(PAST_DELAY).await;
    let theme_atom = harness.engine.atoms().theme();
    harness.property_changed(id, theme_atom);

    // The stale message must neither build nor consume the new entry.
    harness.engine.pump();
    assert_eq!(harness.build_count(), 0);
    assert!(harness.engine.pending_builds().contains(id));

    // The replacement timer still runs to completion.
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.build_count(), 1);
    assert!(harness.engine.pending_builds().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_add_is_ignored() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.add_window(id, WindowKind::Managed);
    let no_titlebar = harness.engine.atoms().no_titlebar();
    harness.set_flag(id, no_titlebar, 1);

    // The second add must not reset the tracking entry to defaults.
    harness.add_window(id, WindowKind::Unmanaged);
    assert_eq!(
        harness.engine.tracked_window(id).unwrap().kind,
        WindowKind::Managed
    );
}

#[tokio::test(start_paused = true)]
async fn test_window_radius_change_queues_rebuild() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.add_window(id, WindowKind::Managed);
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert!(harness.engine.pending_builds().is_empty());

    harness
        .engine
        .handle_compositor_event(CompositorEvent::WindowDataChanged {
            id,
            role: DataRole::WindowRadius,
        });
    assert!(harness.engine.pending_builds().contains(id));
}

#[tokio::test(start_paused = true)]
async fn test_events_delivered_through_queue_in_order() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);

    // An embedder feeds compositor callbacks through the queue; a later
    // property change observes the effects of the earlier add.
    let tx = harness.engine.sender();
    tx.send(EngineMessage::Compositor(CompositorEvent::WindowAdded {
        id,
        kind: WindowKind::Managed,
    }))
    .unwrap();
    tx.send(EngineMessage::Compositor(CompositorEvent::WindowDamaged { id }))
        .unwrap();
    assert_eq!(harness.engine.pump(), 2);

    assert_eq!(
        harness.engine.window_state(id),
        Some(DecorationState::PendingShadowBuild)
    );
    assert!(harness.engine.tracked_window(id).unwrap().first_damage_seen);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_releases_everything() {
    let mut harness = Harness::themed();
    let id = WindowId(1);
    harness.mark_themed(id);
    harness.add_window(id, WindowKind::Managed);
    tokio::time::sleep(PAST_DELAY).await;
    harness.engine.pump();
    assert_eq!(harness.engine.shadow_cache().len(), 1);

    let mut rx = harness.engine.subscribe();
    harness.engine.shutdown();
    assert!(harness.engine.shadow_cache().is_empty());
    assert!(harness.engine.pending_builds().is_empty());
    assert!(!harness.engine.appearance().is_activated());
    assert!(harness.backend.lock().unwrap().detached.contains(&id));
    assert!(drain(&mut rx)
        .iter()
        .any(|e| matches!(e, EngineEvent::ActivationChanged(false))));
}
