//! Pieces shared by every widget: identity, the shared core and the polling
//! components rows compose.

use std::{
    fs,
    path::PathBuf,
    result::Result as StdResult,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use config::{Action, IconSpec, ItemKind, RowProperties};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::WidgetId;
use crate::{
    Context, Failure, Field, Poller, SettingValue, SlotKind, Source, WidgetState, monitor,
};

/// Outputs that mean "on" for state commands.
pub const TRUE_VALUES: [&str; 10] = [
    "enabled", "yes", "true", "1", "on", "active", "set", "running", "open", "high",
];

/// Default state-monitor period in seconds.
const MONITOR_INTERVAL_SECS: u64 = 2;
/// Default value-monitor period in seconds.
const VALUE_INTERVAL_SECS: u64 = 2;

/// Whether state-command output means "on".
pub fn is_truthy(output: &str) -> bool {
    let lowered = output.trim().to_lowercase();
    TRUE_VALUES.contains(&lowered.as_str())
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let path = path.trim();
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Read a file and return its trimmed contents.
pub fn read_trimmed(path: &str) -> StdResult<String, Failure> {
    if path.trim().is_empty() {
        return Err(Failure::Read("empty path".into()));
    }
    let text = fs::read_to_string(expand_home(path)).map_err(|e| Failure::Read(e.to_string()))?;
    let text = text.trim();
    if text.is_empty() {
        Err(Failure::Empty)
    } else {
        Ok(text.to_string())
    }
}

/// Render a number without a trailing `.0` for whole values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// Render an on/off state.
pub fn on_off(state: bool) -> &'static str {
    if state { "On" } else { "Off" }
}

/// Allocate a fresh widget id.
pub(super) fn next_id() -> WidgetId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    WidgetId(NEXT.fetch_add(1, Ordering::Relaxed))
}

/// Identity, configuration and lifecycle state shared by a widget and its
/// background operations.
pub struct RowCore {
    /// Widget id used in change events.
    id: WidgetId,
    /// Item kind.
    kind: ItemKind,
    /// Engine services.
    ctx: Context,
    /// Item configuration.
    props: RowProperties,
    /// Displayed title.
    title: String,
    /// Lifecycle state.
    state: Arc<WidgetState>,
    /// Displayed icon name or file path.
    icon: Mutex<String>,
}

impl RowCore {
    /// Create a core; `fallback_title` is used when the item has no title.
    pub fn new(
        ctx: &Context,
        kind: ItemKind,
        props: RowProperties,
        fallback_title: &str,
    ) -> Arc<Self> {
        let title = props.title_or(fallback_title).to_string();
        let icon = initial_icon(&props.icon());
        Arc::new(Self {
            id: next_id(),
            kind,
            ctx: ctx.clone(),
            props,
            title,
            state: Arc::new(WidgetState::new()),
            icon: Mutex::new(icon),
        })
    }

    /// Widget id.
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// Item kind.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Engine services.
    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    /// Item configuration.
    pub fn props(&self) -> &RowProperties {
        &self.props
    }

    /// Displayed title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Lifecycle state.
    pub fn state(&self) -> &Arc<WidgetState> {
        &self.state
    }

    /// Displayed icon.
    pub fn icon(&self) -> String {
        self.icon.lock().clone()
    }

    /// Show a new icon name.
    pub fn set_icon(&self, name: &str) {
        {
            let mut cur = self.icon.lock();
            if *cur == name {
                return;
            }
            *cur = name.to_string();
        }
        self.changed(Field::Icon, name);
    }

    /// Report a visible change, unless torn down.
    pub fn changed(&self, field: Field, value: &str) {
        if self.state.is_destroyed() {
            return;
        }
        if self.ctx.notifier.send_changed(self.id, field, value).is_err() {
            trace!(widget = %self.id, "change_dropped_no_listener");
        }
    }

    /// Tear down this widget's own operations.
    pub fn teardown(&self) {
        self.state.teardown(&self.ctx.timers);
    }

    /// Launch a command detached. Returns whether it started.
    pub fn launch(&self, command: &str, title: &str, terminal: bool) -> bool {
        match self.ctx.exec.launch(command, title, terminal) {
            Ok(()) => true,
            Err(e) => {
                warn!(widget = %self.id, command, error = %e, "launch failed");
                false
            }
        }
    }

    /// Launch a command and toast the outcome.
    pub fn launch_with_toast(&self, command: &str, title: &str, terminal: bool) -> bool {
        let ok = self.launch(command, title, terminal);
        if let Err(e) = self.ctx.notifier.send_launch_result(title, ok) {
            trace!(error = %e, "toast_dropped");
        }
        ok
    }

    /// Run a press-style action: exec with a toast, or redirect.
    pub fn trigger(&self, action: Option<&Action>, title: &str) {
        match action {
            Some(Action::Exec(exec)) => {
                self.launch_with_toast(&exec.command, title, exec.terminal);
            }
            Some(Action::Redirect { page }) => {
                if let Err(e) = self.ctx.notifier.request_redirect(page) {
                    debug!(page, error = %e, "redirect dropped");
                }
            }
            Some(other) => debug!(widget = %self.id, action = ?other, "action not applicable to press"),
            None => trace!(widget = %self.id, "press_without_action"),
        }
    }

    /// Read a setting on the worker pool and hand it to `apply` on the main loop.
    pub fn load_setting<T, F>(&self, key: &str, default: T, inverse: bool, apply: F)
    where
        T: SettingValue + Send + 'static,
        F: FnOnce(T) + Send + 'static,
    {
        let (settings, ui, state, key) = (
            self.ctx.settings.clone(),
            self.ctx.ui.clone(),
            self.state.clone(),
            key.to_string(),
        );
        let submitted = self.ctx.pool.submit(move || {
            let value = settings.load(&key, default, inverse);
            let _ = ui.invoke(move || {
                if !state.is_destroyed() {
                    apply(value);
                }
            });
        });
        if let Err(e) = submitted {
            debug!(error = %e, "setting load not queued");
        }
    }

    /// Write a setting on the worker pool.
    pub fn save_setting<T>(&self, key: &str, value: T, as_int: bool)
    where
        T: SettingValue + Send + 'static,
    {
        let (settings, key) = (self.ctx.settings.clone(), key.to_string());
        let submitted = self.ctx.pool.submit(move || {
            if let Err(e) = settings.save(&key, &value, as_int) {
                warn!(key, error = %e, "failed to save setting");
            }
        });
        if let Err(e) = submitted {
            debug!(error = %e, "setting save not queued");
        }
    }
}

/// Icon to show before any refresh: an existing image file, else a name.
fn initial_icon(spec: &IconSpec) -> String {
    if let IconSpec::File { path } = spec {
        let p = expand_home(path);
        if p.exists() {
            return p.to_string_lossy().into_owned();
        }
    }
    spec.static_name().to_string()
}

/// Refreshes the icon from a command on the icon slot.
pub struct IconPoller {
    /// Command printing an icon name.
    command: String,
    /// Refresh period.
    interval: Duration,
}

impl IconPoller {
    /// A poller for dynamic icon specs.
    pub fn from_props(props: &RowProperties) -> Option<Self> {
        let icon = props.icon();
        let (command, secs) = icon.dynamic()?;
        Some(Self {
            command: command.to_string(),
            interval: Duration::from_secs(secs),
        })
    }

    /// Fetch now and then every interval.
    pub fn start(&self, core: &Arc<RowCore>) {
        let target = core.clone();
        Poller::new(
            core.ctx(),
            core.state(),
            SlotKind::Icon,
            Source::Command(self.command.clone()),
            core.ctx().timing.poll_timeout,
            move |out: &str| target.set_icon(out),
        )
        .start(self.interval, true);
    }
}

/// Start the icon poller if the item's icon is dynamic.
pub fn start_icon(core: &Arc<RowCore>) {
    if let Some(poller) = IconPoller::from_props(core.props()) {
        poller.start(core);
    }
}

/// Tracks an on/off state from a command or a persisted setting.
pub enum StateMonitor {
    /// Poll a command on the monitor slot.
    Command {
        /// Command printing the state.
        command: String,
        /// Poll period; zero disables polling.
        interval: Duration,
    },
    /// Watch a settings file.
    Setting {
        /// Settings key.
        key: String,
        /// Stored value is inverted.
        inverse: bool,
    },
}

impl StateMonitor {
    /// `state_command` wins over `key`; neither means no monitor.
    pub fn from_props(props: &RowProperties) -> Option<Self> {
        if let Some(command) = props.state_command() {
            return Some(Self::Command {
                command: command.to_string(),
                interval: Duration::from_secs(props.interval.unwrap_or(MONITOR_INTERVAL_SECS)),
            });
        }
        props.key().map(|key| Self::Setting {
            key: key.to_string(),
            inverse: props.key_inverse.unwrap_or(false),
        })
    }

    /// Start monitoring; `apply` runs on the main loop with each new state.
    pub fn start<F>(&self, core: &Arc<RowCore>, apply: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        match self {
            Self::Command { command, interval } => {
                if interval.is_zero() {
                    return;
                }
                Poller::new(
                    core.ctx(),
                    core.state(),
                    SlotKind::Monitor,
                    Source::Command(command.clone()),
                    core.ctx().timing.poll_timeout,
                    move |out: &str| apply(is_truthy(out)),
                )
                .start(*interval, false);
            }
            Self::Setting { key, inverse } => {
                monitor::watch_setting_or_warn(core.ctx(), core.state(), key, *inverse, apply);
            }
        }
    }
}

/// Tracks a numeric value from `value_command` on the value slot.
pub struct ValueMonitor {
    /// Command printing a number.
    command: String,
    /// Poll period.
    interval: Duration,
}

impl ValueMonitor {
    /// A monitor when the item has a value command.
    pub fn from_props(props: &RowProperties) -> Option<Self> {
        let command = props.value_command()?;
        Some(Self {
            command: command.to_string(),
            interval: Duration::from_secs(props.interval.unwrap_or(VALUE_INTERVAL_SECS)),
        })
    }

    /// Fetch now and then every interval; unparsable output is ignored.
    pub fn start<F>(&self, core: &Arc<RowCore>, apply: F)
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        let id = core.id();
        Poller::new(
            core.ctx(),
            core.state(),
            SlotKind::Value,
            Source::Command(self.command.clone()),
            core.ctx().timing.poll_timeout,
            move |out: &str| match out.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => apply(v),
                _ => debug!(widget = %id, output = out, "value output is not a number"),
            },
        )
        .start(self.interval, true);
    }
}
