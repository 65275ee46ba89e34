use std::sync::Arc;

use config::{Action, ItemKind, RowProperties};
use parking_lot::Mutex;
use tracing::trace;

use super::common::{RowCore, start_icon};
use crate::{Context, Field};

/// Caption of the apply button.
pub const APPLY_TEXT: &str = "Apply";

/// A row with a text field and an apply button.
pub struct EntryRow {
    /// Shared core.
    core: Arc<RowCore>,
    /// Current text.
    text: Mutex<String>,
    /// Command run on apply; `{value}` is replaced with the raw text.
    action: Option<Action>,
}

impl EntryRow {
    /// Build the row.
    pub fn build(ctx: &Context, props: RowProperties, on_action: Option<Action>) -> Arc<Self> {
        let row = Arc::new(Self {
            core: RowCore::new(ctx, ItemKind::Entry, props, "Unnamed"),
            text: Mutex::new(String::new()),
            action: on_action,
        });
        start_icon(&row.core);
        row
    }

    /// Shared core.
    pub fn core(&self) -> &Arc<RowCore> {
        &self.core
    }

    /// Current text.
    pub fn text(&self) -> String {
        self.text.lock().clone()
    }

    /// Replace the text as the user would.
    pub fn set_text(&self, text: &str) {
        *self.text.lock() = text.to_string();
        self.core.changed(Field::Text, text);
    }

    /// Press the apply button. Returns whether a command was launched.
    pub fn apply(&self) -> bool {
        let text = self.text();
        if text.trim().is_empty() {
            trace!(widget = %self.core.id(), "entry_apply_empty");
            return false;
        }
        let Some(exec) = self.action.as_ref().and_then(Action::exec) else {
            return false;
        };
        let command = exec.command.replace("{value}", &text);
        self.core
            .launch_with_toast(&command, self.core.title(), exec.terminal)
    }

    /// One-line rendering.
    pub fn summary(&self) -> String {
        let text = self.text();
        if text.is_empty() {
            let hint = self.core.props().placeholder.clone().unwrap_or_default();
            format!("<{hint}> [{APPLY_TEXT}]")
        } else {
            format!("{text} [{APPLY_TEXT}]")
        }
    }
}
