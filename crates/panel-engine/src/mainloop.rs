//! The UI main loop.
//!
//! All widget mutation happens on a single task that drains a job queue. Any
//! thread can post work with [`UiHandle::invoke`]; background tasks use it to
//! marshal their results back before touching a widget.

use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use crate::{Error, Result};

/// A unit of work for the main loop.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Messages accepted by the main loop.
enum Msg {
    /// Run a job.
    Job(Job),
    /// Stop draining.
    Quit,
}

/// Thread-safe handle for posting work to the main loop.
#[derive(Clone)]
pub struct UiHandle {
    /// Job queue sender.
    tx: mpsc::UnboundedSender<Msg>,
}

impl UiHandle {
    /// Run `f` on the main loop.
    pub fn invoke<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx
            .send(Msg::Job(Box::new(f)))
            .map_err(|_| Error::ChannelClosed)
    }

    /// Wait until every job posted before this call has run.
    pub async fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.invoke(move || {
            let _ = done_tx.send(());
        })?;
        done_rx.await.map_err(|_| Error::ChannelClosed)
    }

    /// Ask the main loop to stop after the jobs already queued.
    pub fn quit(&self) {
        let _ = self.tx.send(Msg::Quit);
    }
}

/// The receiving side of the job queue.
pub struct MainLoop {
    /// Job queue receiver.
    rx: mpsc::UnboundedReceiver<Msg>,
    /// Handle kept so the queue never closes underneath a running loop.
    handle: UiHandle,
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl MainLoop {
    /// Create a loop and its job queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            rx,
            handle: UiHandle { tx },
        }
    }

    /// A handle for posting jobs.
    pub fn handle(&self) -> UiHandle {
        self.handle.clone()
    }

    /// Drain jobs until [`UiHandle::quit`] is called.
    pub async fn run(mut self) {
        trace!("main_loop_start");
        while let Some(msg) = self.rx.recv().await {
            match msg {
                Msg::Job(job) => job(),
                Msg::Quit => break,
            }
        }
        trace!("main_loop_stop");
    }

    /// Run every job that is already queued without waiting. Returns the number run.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                Msg::Job(job) => {
                    job();
                    ran += 1;
                }
                Msg::Quit => break,
            }
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[test]
    fn run_pending_executes_in_order() {
        let mut ml = MainLoop::new();
        let ui = ml.handle();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for i in 0..3 {
            let seen = seen.clone();
            ui.invoke(move || seen.lock().push(i)).unwrap();
        }
        assert_eq!(ml.run_pending(), 3);
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn flush_waits_for_prior_jobs() {
        let ml = MainLoop::new();
        let ui = ml.handle();
        let task = tokio::spawn(ml.run());
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let count = count.clone();
            ui.invoke(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        ui.flush().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 5);
        ui.quit();
        task.await.unwrap();
    }
}
