//! Debounced writes for continuous input.
//!
//! A slider emits a stream of values while dragged. The writer snaps each to
//! the configured step, drops repeats, and holds the latest value behind a
//! one-shot timer so only the final position is written.

use std::{sync::Arc, time::Duration};

use config::ExecAction;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{Context, WidgetState};

/// Values closer than this are the same value.
pub const EPSILON: f64 = 1e-9;

/// Numeric bounds and step of a slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
    /// Snap increment; values at or below [`EPSILON`] disable snapping.
    pub step: f64,
}

impl Range {
    /// Clamp `v` into the range. Never panics, even for inverted bounds.
    pub fn clamp(&self, v: f64) -> f64 {
        v.max(self.min).min(self.max)
    }

    /// Snap `v` to the nearest step, then clamp.
    pub fn snap(&self, v: f64) -> f64 {
        let snapped = if self.step > EPSILON {
            (v / self.step).round() * self.step
        } else {
            v
        };
        self.clamp(snapped)
    }
}

/// Render a written value for `{value}` substitution.
pub fn integer_text(value: f64) -> String {
    (value as i64).to_string()
}

/// Coalesces input into delayed writes of a command template.
pub struct DebouncedWriter {
    /// Engine services.
    ctx: Context,
    /// Owning widget's state; holds the pending timer id.
    state: Arc<WidgetState>,
    /// Snap and clamp rules.
    range: Range,
    /// Zero writes immediately.
    delay: Duration,
    /// Last accepted snapped value.
    last: Mutex<Option<f64>>,
    /// Value waiting for the timer.
    pending: Mutex<Option<f64>>,
    /// Command template run on write.
    action: Option<ExecAction>,
    /// Title used for terminal windows.
    title: String,
}

impl DebouncedWriter {
    /// Create a writer. `debounce` false writes every accepted value immediately.
    pub fn new(
        ctx: &Context,
        state: &Arc<WidgetState>,
        range: Range,
        debounce: bool,
        action: Option<ExecAction>,
        title: &str,
    ) -> Arc<Self> {
        Arc::new(Self {
            ctx: ctx.clone(),
            state: state.clone(),
            range,
            delay: if debounce {
                ctx.timing.debounce
            } else {
                Duration::ZERO
            },
            last: Mutex::new(None),
            pending: Mutex::new(None),
            action,
            title: title.to_string(),
        })
    }

    /// The writer's range.
    pub fn range(&self) -> Range {
        self.range
    }

    /// Last accepted snapped value.
    pub fn last(&self) -> Option<f64> {
        *self.last.lock()
    }

    /// Record a value shown without user input so it is not written back.
    pub fn note_programmatic(&self, value: f64) {
        *self.last.lock() = Some(self.range.snap(value));
    }

    /// Accept user input. Returns the snapped value, or `None` if it repeats
    /// the last one or the widget is gone.
    pub fn submit(self: &Arc<Self>, raw: f64) -> Option<f64> {
        if self.state.is_destroyed() {
            return None;
        }
        let snapped = self.range.snap(raw);
        {
            let mut last = self.last.lock();
            if last.is_some_and(|l| (l - snapped).abs() < EPSILON) {
                return None;
            }
            *last = Some(snapped);
        }
        *self.pending.lock() = Some(snapped);

        if self.delay.is_zero() {
            self.fire();
            return Some(snapped);
        }

        let me = self.clone();
        let id = self.ctx.timers.add_once(self.delay, move || me.fire());
        let stale = {
            let mut g = self.state.lock();
            if g.destroyed {
                Some(id)
            } else {
                g.debounce_timer.replace(id)
            }
        };
        if let Some(old) = stale {
            self.ctx.timers.remove(old);
        }
        trace!(value = snapped, "debounce_armed");
        Some(snapped)
    }

    /// Write the pending value.
    fn fire(&self) {
        {
            let mut g = self.state.lock();
            if g.destroyed {
                return;
            }
            g.debounce_timer = None;
        }
        let Some(value) = self.pending.lock().take() else {
            return;
        };
        let Some(action) = &self.action else {
            trace!(value, "debounce_fire_no_action");
            return;
        };
        let command = action.command.replace("{value}", &integer_text(value));
        debug!(command = %command, "debounced_write");
        if let Err(e) = self.ctx.exec.launch(&command, &self.title, action.terminal) {
            debug!(error = %e, "debounced write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time;

    use super::*;
    use crate::test_support::Harness;

    fn action() -> Option<ExecAction> {
        Some(ExecAction {
            command: "brightnessctl set {value}%".into(),
            terminal: false,
        })
    }

    const RANGE: Range = Range {
        min: 0.0,
        max: 100.0,
        step: 5.0,
    };

    #[test]
    fn snapping_and_clamping() {
        assert_eq!(RANGE.snap(42.4), 40.0);
        assert_eq!(RANGE.snap(42.6), 45.0);
        assert_eq!(RANGE.snap(140.0), 100.0);
        assert_eq!(RANGE.snap(-3.0), 0.0);
        let free = Range {
            step: 0.0,
            ..RANGE
        };
        assert_eq!(free.snap(42.4), 42.4);
        let inverted = Range {
            min: 10.0,
            max: 0.0,
            step: 1.0,
        };
        assert_eq!(inverted.snap(5.0), 0.0);
    }

    #[test]
    fn integer_substitution_truncates() {
        assert_eq!(integer_text(42.0), "42");
        assert_eq!(integer_text(7.5), "7");
    }

    #[tokio::test(start_paused = true)]
    async fn burst_writes_only_the_last_value() {
        let h = Harness::new().unwrap();
        let state = Arc::new(WidgetState::new());
        let w = DebouncedWriter::new(&h.ctx, &state, RANGE, true, action(), "Brightness");
        assert_eq!(w.submit(10.0), Some(10.0));
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(w.submit(21.0), Some(20.0));
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(w.submit(29.0), Some(30.0));
        h.settle().await;
        assert!(h.runner.launches().is_empty());

        time::sleep(Duration::from_millis(200)).await;
        h.settle().await;
        assert_eq!(
            h.runner.launches(),
            vec![vec!["brightnessctl".to_string(), "set".into(), "30%".into()]]
        );
        assert!(state.lock().debounce_timer.is_none());
        assert_eq!(h.ctx.timers.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeats_are_ignored() {
        let h = Harness::new().unwrap();
        let state = Arc::new(WidgetState::new());
        let w = DebouncedWriter::new(&h.ctx, &state, RANGE, false, action(), "Brightness");
        assert_eq!(w.submit(50.0), Some(50.0));
        assert_eq!(w.submit(51.0), None);
        w.note_programmatic(70.0);
        assert_eq!(w.submit(69.0), None);
        assert_eq!(w.submit(80.0), Some(80.0));
        assert_eq!(h.runner.launches().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_drops_pending_write() {
        let h = Harness::new().unwrap();
        let state = Arc::new(WidgetState::new());
        let w = DebouncedWriter::new(&h.ctx, &state, RANGE, true, action(), "Brightness");
        w.submit(60.0);
        assert_eq!(state.teardown(&h.ctx.timers).len(), 1);
        time::sleep(Duration::from_secs(1)).await;
        h.settle().await;
        assert!(h.runner.launches().is_empty());
        assert_eq!(w.submit(90.0), None);
    }
}
