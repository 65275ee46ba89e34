//! Test support utilities for panel-engine unit and integration tests.
//! These helpers are public to avoid dead_code warnings and are lightweight.
//! They are intended for use by the test suite only.

use std::{
    collections::HashMap,
    io,
    path::Path,
    result::Result as StdResult,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use config::EngineOptions;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::{
    sync::mpsc::UnboundedReceiver,
    task,
    time::{self, Instant},
};

use crate::{
    CommandRunner, Context, Failure, Field, Invocation, MainLoop, NotificationDispatcher, Result,
    UiEvent, WidgetId,
};

/// Canned response for one command.
#[derive(Debug, Clone)]
struct Script {
    /// Time the command "runs" before answering.
    delay: Duration,
    /// The answer.
    result: StdResult<String, Failure>,
}

/// Key a script is stored under: the argv joined by spaces, or the shell text.
fn script_key(invocation: &Invocation) -> String {
    match invocation {
        Invocation::Direct(argv) => argv.join(" "),
        Invocation::Shell(command) => command.clone(),
    }
}

/// [`CommandRunner`] that answers from a script table and records every call.
///
/// Unscripted commands fail with [`Failure::Spawn`]. Launches are recorded
/// and never executed.
#[derive(Default)]
pub struct ScriptedRunner {
    /// Answers by command.
    scripts: Mutex<HashMap<String, Script>>,
    /// Every command run, in order.
    calls: Mutex<Vec<String>>,
    /// Invocations currently running.
    in_flight: AtomicUsize,
    /// Highest value `in_flight` reached.
    peak: AtomicUsize,
    /// Every launched argv, in order.
    launches: Mutex<Vec<Vec<String>>>,
    /// Make launches fail.
    fail_launches: AtomicBool,
}

/// Decrements the in-flight count when the invocation ends or is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedRunner {
    /// An empty runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` with `result` after `delay`.
    pub fn script(&self, command: &str, delay: Duration, result: StdResult<String, Failure>) {
        let key = script_key(&Invocation::plan(command));
        self.scripts.lock().insert(key, Script { delay, result });
    }

    /// Answer `command` with `output` immediately.
    pub fn reply(&self, command: &str, output: &str) {
        self.script(command, Duration::ZERO, Ok(output.to_string()));
    }

    /// Every command run so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// How many times `command` ran.
    pub fn call_count(&self, command: &str) -> usize {
        let key = script_key(&Invocation::plan(command));
        self.calls.lock().iter().filter(|c| **c == key).count()
    }

    /// Highest number of simultaneous invocations seen.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Every launched argv so far.
    pub fn launches(&self) -> Vec<Vec<String>> {
        self.launches.lock().clone()
    }

    /// Make subsequent launches fail.
    pub fn fail_launches(&self, fail: bool) {
        self.fail_launches.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn output(&self, invocation: &Invocation) -> StdResult<String, Failure> {
        let key = script_key(invocation);
        self.calls.lock().push(key.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let script = self.scripts.lock().get(&key).cloned();
        let Some(script) = script else {
            return Err(Failure::Spawn(format!("unscripted command: {key}")));
        };
        if !script.delay.is_zero() {
            time::sleep(script.delay).await;
        }
        script.result
    }

    fn spawn_detached(&self, argv: &[String]) -> io::Result<()> {
        if self.fail_launches.load(Ordering::SeqCst) {
            return Err(io::Error::other("scripted launch failure"));
        }
        self.launches.lock().push(argv.to_vec());
        Ok(())
    }
}

/// A running main loop, a context over a [`ScriptedRunner`] and a private
/// settings directory.
pub struct Harness {
    /// Engine services.
    pub ctx: Context,
    /// The scripted process boundary.
    pub runner: Arc<ScriptedRunner>,
    /// Events sent to the front end.
    pub events: UnboundedReceiver<UiEvent>,
    /// Settings directory, removed on drop.
    settings_dir: TempDir,
}

impl Harness {
    /// A harness with default options. Must be called inside a tokio runtime.
    pub fn new() -> Result<Self> {
        Self::with_options(EngineOptions::default())
    }

    /// A harness with `options`; the settings directory is always a fresh
    /// temporary directory.
    pub fn with_options(mut options: EngineOptions) -> Result<Self> {
        let settings_dir = tempfile::tempdir()?;
        options.settings_dir = Some(settings_dir.path().to_path_buf());
        let main_loop = MainLoop::new();
        let ui = main_loop.handle();
        tokio::spawn(main_loop.run());
        let runner = Arc::new(ScriptedRunner::new());
        let (notifier, events) = NotificationDispatcher::channel();
        let ctx = Context::new(ui, runner.clone(), &options, notifier)?;
        Ok(Self {
            ctx,
            runner,
            events,
            settings_dir,
        })
    }

    /// The private settings directory.
    pub fn settings_dir(&self) -> &Path {
        self.settings_dir.path()
    }

    /// Let spawned tasks run and wait for the main loop to drain.
    pub async fn settle(&self) {
        for _ in 0..4 {
            task::yield_now().await;
            if self.ctx.ui.flush().await.is_err() {
                return;
            }
        }
    }

    /// Settle repeatedly until `pred` holds or `timeout` of tokio time passes.
    pub async fn wait_until<F>(&self, timeout: Duration, mut pred: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            self.settle().await;
            if pred() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Every event received so far.
    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = self.events.try_recv() {
            out.push(ev);
        }
        out
    }

    /// Drain events and keep the changes reported by widget `id`.
    pub fn changes(&mut self, id: WidgetId) -> Vec<(Field, String)> {
        self.drain_events()
            .into_iter()
            .filter_map(|ev| match ev {
                UiEvent::Changed {
                    id: from,
                    field,
                    value,
                } if from == id => Some((field, value)),
                _ => None,
            })
            .collect()
    }
}
