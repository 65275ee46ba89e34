//! The polling engine.
//!
//! A [`Poller`] binds one widget slot to a source (a command or a blocking
//! read) and a handler. It runs an optional immediate fetch, then ticks on a
//! repeating timer. The slot's `running` flag keeps at most one fetch in
//! flight; ticks that arrive while a fetch is outstanding are skipped rather
//! than queued.

use std::{result::Result as StdResult, sync::Arc, time::Duration};

use tracing::{debug, trace};

use crate::{CancelHandle, Context, Disposer, Failure, Flow, SlotKind, WidgetState};

/// Receives poll results on the main loop.
pub trait PollHandler: Send + Sync + 'static {
    /// Called with trimmed, non-empty output.
    fn on_output(&self, output: &str);

    /// Called when a fetch produced nothing. The default ignores it.
    fn on_failure(&self, _failure: &Failure) {}
}

impl<F> PollHandler for F
where
    F: Fn(&str) + Send + Sync + 'static,
{
    fn on_output(&self, output: &str) {
        self(output)
    }
}

/// A blocking read run on the worker pool.
pub type BlockingFetch = Arc<dyn Fn() -> StdResult<String, Failure> + Send + Sync>;

/// Where a poller gets its data.
#[derive(Clone)]
pub enum Source {
    /// Run a command through the executor.
    Command(String),
    /// Run a blocking read on the worker pool.
    Blocking(BlockingFetch),
}

impl Source {
    /// A blocking read source from a closure.
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn() -> StdResult<String, Failure> + Send + Sync + 'static,
    {
        Self::Blocking(Arc::new(f))
    }
}

/// Polls one slot of one widget.
#[derive(Clone)]
pub struct Poller {
    /// Engine services.
    ctx: Context,
    /// Owning widget's state.
    state: Arc<WidgetState>,
    /// Slot this poller drives.
    slot: SlotKind,
    /// Data source.
    source: Source,
    /// Per-fetch timeout for command sources.
    timeout: Duration,
    /// Result handler.
    handler: Arc<dyn PollHandler>,
}

impl Poller {
    /// Bind a source and handler to `slot` of the widget owning `state`.
    pub fn new(
        ctx: &Context,
        state: &Arc<WidgetState>,
        slot: SlotKind,
        source: Source,
        timeout: Duration,
        handler: impl PollHandler,
    ) -> Self {
        Self {
            ctx: ctx.clone(),
            state: state.clone(),
            slot,
            source,
            timeout,
            handler: Arc::new(handler),
        }
    }

    /// Optionally fetch now, then fetch every `interval`. A zero interval
    /// arms no timer.
    pub fn start(&self, interval: Duration, immediate: bool) {
        if self.state.is_destroyed() {
            return;
        }
        if immediate {
            self.run_once();
        }
        if interval.is_zero() {
            return;
        }
        let me = self.clone();
        let id = self.ctx.timers.add_repeating(interval, move || me.tick());
        trace!(slot = ?self.slot, int_ms = interval.as_millis() as u64, "poll_start");
        let stale = {
            let mut g = self.state.lock();
            if g.destroyed {
                Some(id)
            } else {
                g.slot(self.slot).timer.replace(id)
            }
        };
        if let Some(old) = stale {
            self.ctx.timers.remove(old);
        }
    }

    /// Fetch now unless destroyed or a fetch is already in flight. Returns
    /// whether a fetch started.
    pub fn run_once(&self) -> bool {
        {
            let mut g = self.state.lock();
            if g.destroyed {
                return false;
            }
            let slot = g.slot(self.slot);
            if slot.running {
                return false;
            }
            slot.running = true;
        }
        self.fetch();
        true
    }

    /// One timer tick.
    fn tick(&self) -> Flow {
        {
            let mut g = self.state.lock();
            if g.destroyed {
                return Flow::Break;
            }
            if !g.mapped {
                trace!(slot = ?self.slot, "poll_skip_unmapped");
                return Flow::Continue;
            }
            let slot = g.slot(self.slot);
            if slot.running {
                trace!(slot = ?self.slot, "poll_skip_running");
                return Flow::Continue;
            }
            slot.running = true;
        }
        self.fetch();
        Flow::Continue
    }

    /// Start a fetch. The caller has already marked the slot running.
    fn fetch(&self) {
        let previous = self.state.lock().slot(self.slot).cancel.take();
        if let Some(previous) = previous {
            previous.dispose();
        }

        let handle = self.ctx.exec.new_handle();
        match &self.source {
            Source::Command(command) => {
                let me = self.clone();
                let h = handle.clone();
                self.ctx
                    .exec
                    .run_with(&handle, command, self.timeout, move |result| {
                        me.complete(&h, result)
                    });
            }
            Source::Blocking(read) => {
                let read = read.clone();
                let me = self.clone();
                let h = handle.clone();
                let ui = self.ctx.ui.clone();
                let submitted = self.ctx.pool.submit(move || {
                    if h.is_cancelled() {
                        return;
                    }
                    let result = read();
                    let _ = ui.invoke(move || {
                        if !h.is_cancelled() {
                            me.complete(&h, result);
                        }
                    });
                });
                if let Err(e) = submitted {
                    debug!(slot = ?self.slot, error = %e, "poll_submit_failed");
                    let mut g = self.state.lock();
                    g.slot(self.slot).running = false;
                    return;
                }
            }
        }

        let mut g = self.state.lock();
        if g.destroyed {
            drop(g);
            handle.cancel();
        } else {
            g.slot(self.slot).cancel = Some(Disposer::Command(handle));
        }
    }

    /// Deliver a result on the main loop.
    fn complete(&self, handle: &CancelHandle, result: StdResult<String, Failure>) {
        {
            let mut g = self.state.lock();
            let slot = g.slot(self.slot);
            slot.running = false;
            slot.clear_if_same(handle);
            if g.destroyed {
                trace!(slot = ?self.slot, "poll_result_discarded");
                return;
            }
        }
        match result {
            Ok(output) => self.handler.on_output(&output),
            Err(failure) => {
                if matches!(self.source, Source::Blocking(_)) {
                    debug!(slot = ?self.slot, error = %failure, "blocking read failed");
                }
                self.handler.on_failure(&failure);
            }
        }
    }
}
