//! The pending-window tracker.
//!
//! Geometry and property changes arrive in rapid bursts (e.g. during a
//! drag-resize); without debouncing, the expensive shadow-build path
//! would run per-event rather than once per burst. Each window has at
//! most one pending build; scheduling again supersedes the previous
//! timer (last-writer-wins).

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::backend::WindowId;
use crate::engine::EngineMessage;

/// Default debounce delay before a shadow build runs.
pub const DEFAULT_SHADOW_BUILD_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug)]
struct PendingBuild {
    task: JoinHandle<()>,
    delay: Duration,
    generation: u64,
}

/// Windows awaiting a delayed shadow build, keyed by window identity.
///
/// Each schedule is stamped with a generation so a due message queued by
/// a superseded timer cannot consume the entry of its replacement.
#[derive(Debug, Default)]
pub struct PendingWindows {
    entries: HashMap<WindowId, PendingBuild>,
    next_generation: u64,
}

impl PendingWindows {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a debounced build for `window`.
    ///
    /// Any existing entry for the window is cancelled first. When the
    /// timer elapses, [`EngineMessage::ShadowBuildDue`] re-enters the
    /// engine's event queue through `tx`.
    pub fn schedule(
        &mut self,
        window: WindowId,
        delay: Duration,
        tx: &mpsc::UnboundedSender<EngineMessage>,
    ) {
        self.cancel(window);
        let generation = self.next_generation;
        self.next_generation += 1;
        let tx = tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(EngineMessage::ShadowBuildDue(window, generation));
        });
        trace!(window = %window, ?delay, generation, "scheduled shadow build");
        self.entries.insert(
            window,
            PendingBuild {
                task,
                delay,
                generation,
            },
        );
    }

    /// Cancels any pending entry for `window` without invoking the build.
    /// Returns whether an entry existed.
    pub fn cancel(&mut self, window: WindowId) -> bool {
        if let Some(pending) = self.entries.remove(&window) {
            pending.task.abort();
            trace!(window = %window, "cancelled pending shadow build");
            true
        } else {
            false
        }
    }

    /// Cancels every pending entry.
    pub fn cancel_all(&mut self) {
        for (_, pending) in self.entries.drain() {
            pending.task.abort();
        }
    }

    /// Consumes the entry for a timer that fired. Returns `false` for a
    /// stale firing: one whose entry was already cancelled, or one from
    /// a superseded timer whose message was queued before the reschedule
    /// aborted it. A stale firing leaves any replacement entry intact.
    pub fn complete(&mut self, window: WindowId, generation: u64) -> bool {
        match self.entries.get(&window) {
            Some(pending) if pending.generation == generation => {
                self.entries.remove(&window);
                true
            }
            _ => false,
        }
    }

    /// Whether a build is pending for `window`.
    pub fn contains(&self, window: WindowId) -> bool {
        self.entries.contains_key(&window)
    }

    /// The delay of the pending entry for `window`, if any.
    pub fn delay_of(&self, window: WindowId) -> Option<Duration> {
        self.entries.get(&window).map(|p| p.delay)
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no builds are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
