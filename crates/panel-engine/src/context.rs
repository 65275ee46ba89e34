//! Shared services handed to every widget.

use std::{path::PathBuf, sync::Arc, time::Duration};

use config::EngineOptions;
use tracing::debug;

use crate::{
    CommandRunner, Executor, LaunchConfig, NotificationDispatcher, Result, SettingsStore,
    SystemInfo, Timers, UiHandle, WorkerPool,
};

/// Timing knobs resolved from [`EngineOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Slider write debounce.
    pub debounce: Duration,
    /// Timeout for polling commands.
    pub poll_timeout: Duration,
    /// Timeout for one-shot reads.
    pub read_timeout: Duration,
}

impl Timing {
    /// Resolve from document options.
    pub fn from_options(options: &EngineOptions) -> Self {
        Self {
            debounce: Duration::from_millis(options.debounce_ms),
            poll_timeout: Duration::from_secs(options.poll_timeout_secs),
            read_timeout: Duration::from_secs(options.read_timeout_secs),
        }
    }
}

/// Everything a widget needs to talk to the outside world. Cheap to clone.
#[derive(Clone)]
pub struct Context {
    /// Main loop handle.
    pub ui: UiHandle,
    /// Timer registry.
    pub timers: Timers,
    /// Command executor.
    pub exec: Executor,
    /// Pool for blocking work.
    pub pool: WorkerPool,
    /// Persisted settings.
    pub settings: SettingsStore,
    /// Events to the front end.
    pub notifier: NotificationDispatcher,
    /// Cached system facts.
    pub system: SystemInfo,
    /// Timing knobs.
    pub timing: Timing,
}

impl Context {
    /// Build the services on the current tokio runtime.
    pub fn new(
        ui: UiHandle,
        runner: Arc<dyn CommandRunner>,
        options: &EngineOptions,
        notifier: NotificationDispatcher,
    ) -> Result<Self> {
        let settings_dir: PathBuf = options
            .settings_dir
            .clone()
            .unwrap_or_else(config::default_settings_dir);
        let launch = LaunchConfig {
            launcher: options.launcher.clone(),
            terminal: options.terminal.clone(),
        };
        let ctx = Self {
            timers: Timers::new(ui.clone())?,
            exec: Executor::new(runner, ui.clone(), launch)?,
            pool: WorkerPool::new(options.workers)?,
            settings: SettingsStore::new(settings_dir),
            notifier,
            system: SystemInfo::new(),
            timing: Timing::from_options(options),
            ui,
        };
        debug!(
            settings = %ctx.settings.dir().display(),
            workers = ctx.pool.workers(),
            "engine_context_ready"
        );
        Ok(ctx)
    }

    /// Stop accepting background work and disarm every timer.
    pub fn shutdown(&self) {
        self.pool.shutdown();
        self.timers.clear();
    }
}
