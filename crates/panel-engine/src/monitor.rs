//! File-change monitor for persisted boolean settings.
//!
//! Instead of polling, a widget whose state lives in the settings store
//! watches the setting's parent directory. Watching the directory rather than
//! the file means atomic saves (write temp file, rename over the target) are
//! seen as a rename into the watched name.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _,
    event::{AccessKind, AccessMode, ModifyKind},
};
use tracing::{debug, trace, warn};

use crate::{Context, Disposer, Error, Result, SlotKind, WidgetState};

/// An active watch on one settings file. Dropping or stopping it ends the watch.
pub struct FileWatch {
    /// Keeps the OS watch alive.
    watcher: RecommendedWatcher,
    /// Watched settings file.
    path: PathBuf,
    /// Set on stop so events already being handled are ignored.
    stopped: Arc<AtomicBool>,
}

impl FileWatch {
    /// End the watch.
    pub fn stop(self) {
        self.stopped.store(true, Ordering::SeqCst);
        trace!(path = %self.path.display(), "file_watch_stop");
    }

    /// The watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Whether `event` means `target` now holds a complete new value.
fn is_relevant(event: &Event, target: &Path) -> bool {
    let kind = matches!(
        event.kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_) | ModifyKind::Any)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    );
    kind && event.paths.iter().any(|p| p == target)
}

/// Watch the boolean setting `key` for the widget owning `state`.
///
/// On each relevant change while the widget is mapped, the value is read on
/// the worker pool (inverted when `inverse` is set) and `apply` runs on the
/// main loop. The watch is stored in the widget's monitor slot, so teardown
/// stops it.
pub fn watch_setting<F>(
    ctx: &Context,
    state: &Arc<WidgetState>,
    key: &str,
    inverse: bool,
    apply: F,
) -> Result<()>
where
    F: Fn(bool) + Send + Sync + 'static,
{
    let path = ctx.settings.path_for(key)?;
    let parent = path
        .parent()
        .map(PathBuf::from)
        .ok_or_else(|| Error::InvalidKey(key.to_string()))?;
    fs::create_dir_all(&parent)?;
    if !path.exists() {
        OpenOptions::new().create(true).append(true).open(&path)?;
    }

    let stopped = Arc::new(AtomicBool::new(false));
    let apply = Arc::new(apply);
    let watcher = {
        let target = path.clone();
        let stopped = stopped.clone();
        let state = state.clone();
        let ctx = ctx.clone();
        let key = key.to_string();
        notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    debug!(error = %e, "file watch error");
                    return;
                }
            };
            if stopped.load(Ordering::SeqCst) || !is_relevant(&event, &target) {
                return;
            }
            {
                let g = state.lock();
                if g.destroyed || !g.mapped {
                    return;
                }
            }
            trace!(key = %key, kind = ?event.kind, "setting_changed");
            let (settings, ui, state, apply, key) = (
                ctx.settings.clone(),
                ctx.ui.clone(),
                state.clone(),
                apply.clone(),
                key.clone(),
            );
            let submitted = ctx.pool.submit(move || {
                let value = settings.load(&key, false, inverse);
                let _ = ui.invoke(move || {
                    if !state.is_destroyed() {
                        apply(value);
                    }
                });
            });
            if let Err(e) = submitted {
                debug!(error = %e, "setting reload not queued");
            }
        })?
    };

    let mut watch = FileWatch {
        watcher,
        path,
        stopped,
    };
    watch.watcher.watch(&parent, RecursiveMode::NonRecursive)?;
    debug!(key, path = %watch.path().display(), "file_watch_start");

    let stale = {
        let mut g = state.lock();
        if g.destroyed {
            drop(g);
            watch.stop();
            return Ok(());
        }
        g.slot(SlotKind::Monitor).cancel.replace(Disposer::Watch(watch))
    };
    if let Some(old) = stale {
        old.dispose();
    }
    Ok(())
}

/// Start a settings watch, logging instead of failing.
pub fn watch_setting_or_warn<F>(
    ctx: &Context,
    state: &Arc<WidgetState>,
    key: &str,
    inverse: bool,
    apply: F,
) where
    F: Fn(bool) + Send + Sync + 'static,
{
    if let Err(e) = watch_setting(ctx, state, key, inverse, apply) {
        warn!(key, error = %e, "cannot watch setting");
    }
}
