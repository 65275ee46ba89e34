//! Timers whose callbacks run on the main loop.
//!
//! Each timer is a tokio task that sleeps on the runtime and posts its callback
//! through the [`UiHandle`]. A repeating timer never has more than one tick
//! waiting in the job queue: ticks that fire while the previous one is still
//! queued are dropped. Removal cancels the task and also suppresses a tick
//! that was already queued.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{
    runtime::Handle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::{Error, Result, UiHandle};

/// Smallest period a repeating timer will use.
const MIN_PERIOD: Duration = Duration::from_millis(1);
/// Largest period a repeating timer will use. Longer periods are clamped so
/// deadline arithmetic cannot overflow.
const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Identifies an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Whether a repeating callback wants to keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep the timer armed.
    Continue,
    /// Remove the timer.
    Break,
}

/// Registry of armed timers.
#[derive(Clone)]
pub struct Timers {
    /// Cancellation token per armed timer.
    entries: Arc<Mutex<HashMap<TimerId, CancellationToken>>>,
    /// Next id to hand out.
    next_id: Arc<AtomicU64>,
    /// Where callbacks run.
    ui: UiHandle,
    /// Runtime the timer tasks are spawned on.
    rt: Handle,
}

impl Timers {
    /// Create a registry bound to the current tokio runtime.
    pub fn new(ui: UiHandle) -> Result<Self> {
        let rt = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            ui,
            rt,
        })
    }

    /// Register a new timer id and its token.
    fn register(&self) -> (TimerId, CancellationToken) {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let token = CancellationToken::new();
        self.entries.lock().insert(id, token.clone());
        (id, token)
    }

    /// Call `on_tick` on the main loop every `interval`, first after one full
    /// interval, until it returns [`Flow::Break`] or the timer is removed.
    pub fn add_repeating<F>(&self, interval: Duration, on_tick: F) -> TimerId
    where
        F: FnMut() -> Flow + Send + 'static,
    {
        let (id, token) = self.register();
        let interval = interval.clamp(MIN_PERIOD, MAX_PERIOD);
        let on_tick = Arc::new(Mutex::new(on_tick));
        let queued = Arc::new(AtomicBool::new(false));
        let ui = self.ui.clone();
        let timers = self.clone();

        self.rt.spawn(async move {
            trace!(timer = id.0, int_ms = interval.as_millis() as u64, "timer_start");
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        trace!(timer = id.0, "timer_cancelled");
                        return;
                    }
                    _ = ticker.tick() => {
                        if queued.swap(true, Ordering::SeqCst) {
                            trace!(timer = id.0, "timer_tick_coalesced");
                            continue;
                        }
                        let queued = queued.clone();
                        let token = token.clone();
                        let on_tick = on_tick.clone();
                        let timers = timers.clone();
                        let posted = ui.invoke(move || {
                            queued.store(false, Ordering::SeqCst);
                            if token.is_cancelled() {
                                return;
                            }
                            let flow = {
                                let mut f = on_tick.lock();
                                (*f)()
                            };
                            if flow == Flow::Break {
                                timers.remove(id);
                            }
                        });
                        if posted.is_err() {
                            trace!(timer = id.0, "timer_main_loop_gone");
                            return;
                        }
                    }
                }
            }
        });
        id
    }

    /// Call `f` once on the main loop after `delay`, unless removed first.
    pub fn add_once<F>(&self, delay: Duration, f: F) -> TimerId
    where
        F: FnOnce() + Send + 'static,
    {
        let (id, token) = self.register();
        let ui = self.ui.clone();
        let timers = self.clone();

        self.rt.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(timer = id.0, "timer_once_cancelled");
                }
                _ = time::sleep(delay) => {
                    let posted = ui.invoke(move || {
                        if token.is_cancelled() {
                            return;
                        }
                        timers.entries.lock().remove(&id);
                        f();
                    });
                    if posted.is_err() {
                        trace!(timer = id.0, "timer_main_loop_gone");
                    }
                }
            }
        });
        id
    }

    /// Disarm a timer. Unknown or already removed ids are ignored.
    pub fn remove(&self, id: TimerId) -> bool {
        match self.entries.lock().remove(&id) {
            Some(token) => {
                token.cancel();
                trace!(timer = id.0, "timer_remove");
                true
            }
            None => false,
        }
    }

    /// Whether `id` is still armed.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    /// Number of armed timers.
    pub fn active(&self) -> usize {
        self.entries.lock().len()
    }

    /// Disarm every timer.
    pub fn clear(&self) {
        let drained: Vec<CancellationToken> = self.entries.lock().drain().map(|(_, t)| t).collect();
        for token in drained {
            token.cancel();
        }
        trace!("timers_clear");
    }
}
