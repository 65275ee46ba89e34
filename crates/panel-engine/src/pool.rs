//! Bounded pool for blocking work (settings I/O, file reads, system probes).

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::{runtime::Handle, sync::Semaphore, task};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Shared state behind a [`WorkerPool`].
struct Inner {
    /// One permit per worker.
    permits: Arc<Semaphore>,
    /// Runtime hosting the blocking tasks.
    rt: Handle,
    /// Set once [`WorkerPool::shutdown`] is called.
    closed: AtomicBool,
    /// Configured worker count.
    workers: usize,
}

/// A process-lifetime pool running at most `workers` blocking jobs at once.
#[derive(Clone)]
pub struct WorkerPool {
    /// Shared state.
    inner: Arc<Inner>,
}

impl WorkerPool {
    /// Create a pool on the current tokio runtime. A zero worker count is treated as one.
    pub fn new(workers: usize) -> Result<Self> {
        let rt = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let workers = workers.max(1);
        Ok(Self {
            inner: Arc::new(Inner {
                permits: Arc::new(Semaphore::new(workers)),
                rt,
                closed: AtomicBool::new(false),
                workers,
            }),
        })
    }

    /// Queue `job`. Fails once the pool has been shut down.
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(Error::PoolShutdown);
        }
        let permits = self.inner.permits.clone();
        self.inner.rt.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            if let Err(e) = task::spawn_blocking(job).await {
                warn!(error = %e, "worker job failed");
            }
        });
        Ok(())
    }

    /// Refuse new jobs. Jobs already queued still run.
    pub fn shutdown(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            debug!(workers = self.inner.workers, "worker_pool_shutdown");
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Maximum number of concurrent jobs.
    pub fn workers(&self) -> usize {
        self.inner.workers
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::AtomicUsize,
        thread,
        time::Duration,
    };

    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn never_exceeds_worker_count() {
        let pool = WorkerPool::new(2).unwrap();
        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        for _ in 0..6 {
            let (live, peak, tx) = (live.clone(), peak.clone(), tx.clone());
            pool.submit(move || {
                let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(20));
                live.fetch_sub(1, Ordering::SeqCst);
                let _ = tx.send(());
            })
            .unwrap();
        }
        for _ in 0..6 {
            rx.recv().await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_an_error() {
        let pool = WorkerPool::new(4).unwrap();
        pool.shutdown();
        assert!(pool.is_shutdown());
        assert!(matches!(pool.submit(|| {}), Err(Error::PoolShutdown)));
    }

    #[test]
    fn outside_runtime_is_an_error() {
        assert!(matches!(WorkerPool::new(4), Err(Error::NoRuntime)));
    }
}
