use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use config::{ItemKind, RowProperties, ValueSpec};
use parking_lot::Mutex;

use super::common::{RowCore, read_trimmed, start_icon};
use crate::{
    Context, Failure, Field, PollHandler, Poller, SlotKind, Source, system::NOT_AVAILABLE,
};

/// Shown until the first value arrives.
pub const PLACEHOLDER: &str = "...";
/// Shown when a command outlived its timeout.
const TIMEOUT_TEXT: &str = "Timeout";
/// Shown when a command could not be started.
const ERROR_TEXT: &str = "Error";

/// How a label gets its text.
enum Fetch {
    /// Known at build time.
    Fixed(String),
    /// Polled from a source.
    Polled(Source),
}

/// Decide how to fetch `spec`.
fn plan(ctx: &Context, spec: Option<&ValueSpec>) -> Fetch {
    match spec {
        None => Fetch::Fixed(NOT_AVAILABLE.to_string()),
        Some(ValueSpec::Text(text) | ValueSpec::Static { text }) => Fetch::Fixed(text.clone()),
        Some(ValueSpec::Exec { command }) => {
            let command = command.trim();
            if command.is_empty() {
                return Fetch::Fixed(NOT_AVAILABLE.to_string());
            }
            match cat_target(command) {
                Some(path) => Fetch::Polled(Source::blocking(move || read_trimmed(&path))),
                None => Fetch::Polled(Source::Command(command.to_string())),
            }
        }
        Some(ValueSpec::File { path }) => {
            let path = path.clone();
            Fetch::Polled(Source::blocking(move || read_trimmed(&path)))
        }
        Some(ValueSpec::System { key }) => {
            let (system, key) = (ctx.system.clone(), key.clone());
            Fetch::Polled(Source::blocking(move || Ok(system.get(&key))))
        }
    }
}

/// The file of a plain `cat <file>` command, which is read directly.
fn cat_target(command: &str) -> Option<String> {
    if !command.starts_with("cat ") {
        return None;
    }
    match shlex::split(command)?.as_slice() {
        [cat, path] if cat == "cat" => Some(path.clone()),
        _ => None,
    }
}

/// Text for a failed fetch.
fn failure_text(failure: &Failure) -> &'static str {
    match failure {
        Failure::Timeout => TIMEOUT_TEXT,
        Failure::Spawn(_) => ERROR_TEXT,
        Failure::Exit(_) | Failure::Empty | Failure::Read(_) => NOT_AVAILABLE,
    }
}

/// A row showing a read-only value.
pub struct LabelRow {
    /// Shared core.
    core: Arc<RowCore>,
    /// Displayed text.
    text: Mutex<String>,
}

impl LabelRow {
    /// Build the row and start fetching its value.
    pub fn build(ctx: &Context, props: RowProperties, value: Option<ValueSpec>) -> Arc<Self> {
        let interval = props.interval.unwrap_or(0);
        let row = Arc::new(Self {
            core: RowCore::new(ctx, ItemKind::Label, props, "Unnamed"),
            text: Mutex::new(PLACEHOLDER.to_string()),
        });
        start_icon(&row.core);
        match plan(ctx, value.as_ref()) {
            Fetch::Fixed(text) => row.set_text(&text),
            Fetch::Polled(source) => {
                Poller::new(
                    ctx,
                    row.core.state(),
                    SlotKind::Value,
                    source,
                    ctx.timing.read_timeout,
                    LabelHandler(Arc::downgrade(&row)),
                )
                .start(Duration::from_secs(interval), true);
            }
        }
        row
    }

    /// Shared core.
    pub fn core(&self) -> &Arc<RowCore> {
        &self.core
    }

    /// Displayed text.
    pub fn text(&self) -> String {
        self.text.lock().clone()
    }

    /// Show `text` if it differs.
    fn set_text(&self, text: &str) {
        {
            let mut cur = self.text.lock();
            if *cur == text {
                return;
            }
            *cur = text.to_string();
        }
        self.core.changed(Field::Label, text);
    }

    /// One-line rendering.
    pub fn summary(&self) -> String {
        self.text()
    }
}

/// Routes poll results to a label.
struct LabelHandler(Weak<LabelRow>);

impl PollHandler for LabelHandler {
    fn on_output(&self, output: &str) {
        if let Some(row) = self.0.upgrade() {
            row.set_text(output);
        }
    }

    fn on_failure(&self, failure: &Failure) {
        let Some(row) = self.0.upgrade() else {
            return;
        };
        if *row.text.lock() == PLACEHOLDER {
            row.set_text(failure_text(failure));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cat_shortcut() {
        assert_eq!(
            cat_target("cat /sys/class/power_supply/BAT0/capacity").as_deref(),
            Some("/sys/class/power_supply/BAT0/capacity")
        );
        assert_eq!(cat_target("cat '/tmp/with space'").as_deref(), Some("/tmp/with space"));
        assert_eq!(cat_target("cat a b"), None);
        assert_eq!(cat_target("catalog x"), None);
        assert_eq!(cat_target("cat 'unterminated"), None);
    }

    #[test]
    fn failure_texts() {
        assert_eq!(failure_text(&Failure::Timeout), "Timeout");
        assert_eq!(failure_text(&Failure::Spawn("x".into())), "Error");
        assert_eq!(failure_text(&Failure::Exit(Some(1))), "N/A");
        assert_eq!(failure_text(&Failure::Read("x".into())), "N/A");
    }
}
