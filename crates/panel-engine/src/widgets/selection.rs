use std::{sync::Arc, time::Duration};

use config::{Action, ItemKind, RowProperties};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::common::{RowCore, start_icon};
use crate::{Context, Field, Poller, SlotKind, Source, controls::Control};

/// Default period for re-checking the current value, in seconds.
const SELECTION_INTERVAL_SECS: u64 = 5;

/// A row choosing one of several options.
pub struct SelectionRow {
    /// Shared core.
    core: Arc<RowCore>,
    /// Selected option; empty when nothing is selected.
    control: Control<String>,
    /// Available options.
    options: Mutex<Vec<String>>,
    /// Value reported by the system that was not among the options yet.
    wanted: Mutex<Option<String>>,
    /// Per-option or single command.
    action: Option<Action>,
    /// Re-fetches `options_command`.
    options_poller: Mutex<Option<Poller>>,
    /// Re-reads the current value.
    value_poller: Mutex<Option<Poller>>,
}

impl SelectionRow {
    /// Build the row, fetch its options and current value.
    pub fn build(ctx: &Context, props: RowProperties, on_change: Option<Action>) -> Arc<Self> {
        let options = props.options.clone();
        let initial = options.first().cloned().unwrap_or_default();
        let row = Arc::new(Self {
            core: RowCore::new(ctx, ItemKind::Selection, props, "Unnamed"),
            control: Control::new(initial),
            options: Mutex::new(options),
            wanted: Mutex::new(None),
            action: on_change,
            options_poller: Mutex::new(None),
            value_poller: Mutex::new(None),
        });

        let weak = Arc::downgrade(&row);
        row.control.connect(move |v: &String| {
            if let Some(r) = weak.upgrade() {
                r.on_change(v);
            }
        });

        if let Some(command) = row.core.props().options_command() {
            let weak = Arc::downgrade(&row);
            let poller = Poller::new(
                ctx,
                row.core.state(),
                SlotKind::Misc,
                Source::Command(command.to_string()),
                ctx.timing.read_timeout,
                move |out: &str| {
                    if let Some(r) = weak.upgrade() {
                        r.set_options(out.lines().map(str::trim).filter(|l| !l.is_empty()));
                    }
                },
            );
            poller.run_once();
            *row.options_poller.lock() = Some(poller);
        }

        row.start_value_monitor();
        start_icon(&row.core);
        row
    }

    /// Poll the current value from `key` or `value_command`.
    fn start_value_monitor(self: &Arc<Self>) {
        let ctx = self.core.ctx();
        let props = self.core.props();
        let source = if let Some(key) = props.key() {
            let (settings, key) = (ctx.settings.clone(), key.to_string());
            Source::blocking(move || Ok(settings.load(&key, String::new(), false)))
        } else if let Some(command) = props.value_command() {
            Source::Command(command.to_string())
        } else {
            return;
        };
        let weak = Arc::downgrade(self);
        let poller = Poller::new(
            ctx,
            self.core.state(),
            SlotKind::Value,
            source,
            ctx.timing.poll_timeout,
            move |out: &str| {
                if let Some(r) = weak.upgrade() {
                    r.apply_value_update(out);
                }
            },
        );
        let interval = props.interval.unwrap_or(SELECTION_INTERVAL_SECS);
        poller.start(Duration::from_secs(interval), true);
        *self.value_poller.lock() = Some(poller);
    }

    /// Shared core.
    pub fn core(&self) -> &Arc<RowCore> {
        &self.core
    }

    /// Available options.
    pub fn options(&self) -> Vec<String> {
        self.options.lock().clone()
    }

    /// Selected option.
    pub fn selected(&self) -> String {
        self.control.get()
    }

    /// Choose `option` as the user. Returns false for unknown options.
    pub fn select(&self, option: &str) -> bool {
        if !self.options.lock().iter().any(|o| o == option) {
            return false;
        }
        self.control.set(option.to_string());
        true
    }

    /// Re-check the current value when the row becomes visible.
    pub fn on_map(&self) {
        let poller = self.value_poller.lock().clone();
        if let Some(p) = poller {
            p.run_once();
        }
    }

    /// Replace the option list, re-selecting a pending or current value.
    fn set_options<'a>(&self, options: impl Iterator<Item = &'a str>) {
        let options: Vec<String> = options.map(str::to_string).collect();
        {
            let mut cur = self.options.lock();
            if *cur == options {
                return;
            }
            *cur = options.clone();
        }
        self.core.changed(Field::Options, &options.join("\n"));
        let wanted = self.wanted.lock().take();
        let target = wanted.unwrap_or_else(|| self.control.get());
        if options.contains(&target) {
            self.control.set_programmatic(target);
        } else if let Some(first) = options.first() {
            self.control.set_programmatic(first.clone());
        }
    }

    /// Show a value read from the system.
    pub fn apply_value_update(&self, value: &str) {
        if self.core.state().is_destroyed() {
            return;
        }
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let known = self.options.lock().iter().any(|o| o == value);
        if known {
            self.control.set_programmatic(value.to_string());
            return;
        }
        trace!(widget = %self.core.id(), value, "selection_value_unknown");
        *self.wanted.lock() = Some(value.to_string());
        let poller = self.options_poller.lock().clone();
        if let Some(p) = poller {
            p.run_once();
        }
    }

    /// Change handler for both origins.
    fn on_change(&self, option: &str) {
        self.core.changed(Field::Selected, option);
        if self.control.is_programmatic() {
            return;
        }
        if let Some(key) = self.core.props().key() {
            self.core.save_setting(key, option.to_string(), false);
        }
        let Some(exec) = self.action.as_ref().and_then(|a| a.for_option(option)) else {
            return;
        };
        let quoted = match shlex::try_quote(option) {
            Ok(q) => q.into_owned(),
            Err(e) => {
                warn!(option, error = %e, "cannot quote option");
                return;
            }
        };
        let command = exec.command.replace("{value}", &quoted);
        debug!(command = %command, "selection_action");
        self.core.launch(&command, self.core.title(), exec.terminal);
    }

    /// One-line rendering.
    pub fn summary(&self) -> String {
        let selected = self.selected();
        let options = self
            .options()
            .into_iter()
            .map(|o| if o == selected { format!("*{o}") } else { o })
            .collect::<Vec<_>>()
            .join(" | ");
        if options.is_empty() {
            "(no options)".to_string()
        } else {
            options
        }
    }
}
