//! Widget lifecycle state.
//!
//! One [`WidgetState`] is shared by a widget and every background operation it
//! starts. Completions check `destroyed` under the lock before touching the
//! widget, so once [`WidgetState::teardown`] returns nothing queued can mutate
//! it.

use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use crate::{PollSlot, SlotKind, TimerId, Timers};

/// Fields guarded by the widget lock.
#[derive(Default)]
pub struct StateInner {
    /// Terminal: set once by teardown.
    pub destroyed: bool,
    /// Whether the widget is on the visible page.
    pub mapped: bool,
    /// Pending debounced write.
    pub debounce_timer: Option<TimerId>,
    /// Polling channels, indexed by [`SlotKind::index`].
    slots: [PollSlot; 4],
}

impl StateInner {
    /// Access one polling channel.
    pub fn slot(&mut self, kind: SlotKind) -> &mut PollSlot {
        &mut self.slots[kind.index()]
    }
}

/// Shared lifecycle state for one widget.
pub struct WidgetState {
    /// The widget lock.
    inner: Mutex<StateInner>,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetState {
    /// A live, mapped widget with idle slots.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StateInner {
                mapped: true,
                ..StateInner::default()
            }),
        }
    }

    /// Take the widget lock. Hold it only for short, non-blocking sections.
    pub fn lock(&self) -> MutexGuard<'_, StateInner> {
        self.inner.lock()
    }

    /// Whether teardown has run.
    pub fn is_destroyed(&self) -> bool {
        self.inner.lock().destroyed
    }

    /// Whether the widget is on the visible page.
    pub fn is_mapped(&self) -> bool {
        self.inner.lock().mapped
    }

    /// Record visibility. Returns true if it changed.
    pub fn set_mapped(&self, mapped: bool) -> bool {
        let mut g = self.inner.lock();
        let changed = g.mapped != mapped;
        g.mapped = mapped;
        changed
    }

    /// Mark destroyed, dispose every outstanding operation and take every timer id.
    ///
    /// Returns an empty list when called again.
    pub fn harvest(&self) -> Vec<TimerId> {
        let mut g = self.inner.lock();
        if g.destroyed {
            return Vec::new();
        }
        g.destroyed = true;
        let mut timers = Vec::new();
        for kind in SlotKind::ALL {
            let slot = g.slot(kind);
            slot.dispose();
            slot.running = false;
            timers.extend(slot.timer.take());
        }
        timers.extend(g.debounce_timer.take());
        timers
    }

    /// Harvest under the lock, then remove the timers outside it. Returns the
    /// ids that were harvested.
    pub fn teardown(&self, timers: &Timers) -> Vec<TimerId> {
        let harvested = self.harvest();
        for id in &harvested {
            timers.remove(*id);
        }
        if !harvested.is_empty() {
            trace!(timers = harvested.len(), "widget_teardown");
        }
        harvested
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::MainLoop;

    #[tokio::test]
    async fn teardown_harvests_once() {
        let ml = MainLoop::new();
        let timers = Timers::new(ml.handle()).unwrap();
        let state = WidgetState::new();
        let a = timers.add_repeating(Duration::from_secs(1), || crate::Flow::Continue);
        let b = timers.add_once(Duration::from_secs(1), || {});
        {
            let mut g = state.lock();
            g.slot(SlotKind::Icon).timer = Some(a);
            g.slot(SlotKind::Icon).running = true;
            g.debounce_timer = Some(b);
        }
        let first = state.teardown(&timers);
        assert_eq!(first, vec![a, b]);
        assert_eq!(timers.active(), 0);
        assert!(state.is_destroyed());
        assert!(!state.lock().slot(SlotKind::Icon).running);
        assert!(state.teardown(&timers).is_empty());
    }

    #[test]
    fn mapping_reports_changes() {
        let state = WidgetState::new();
        assert!(state.is_mapped());
        assert!(!state.set_mapped(true));
        assert!(state.set_mapped(false));
        assert!(!state.is_mapped());
    }
}
