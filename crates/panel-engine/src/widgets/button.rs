use std::{collections::BTreeMap, sync::Arc, time::Duration};

use config::{Action, ItemKind, RowProperties};
use parking_lot::Mutex;

use super::common::{RowCore, read_trimmed, start_icon};
use crate::{Context, Field, Poller, SlotKind, Source};

/// Default button caption.
const DEFAULT_TEXT: &str = "Run";
/// Default base style.
const DEFAULT_STYLE: &str = "default";
/// Key consulted when a text or style map has no entry for the file contents.
const MAP_FALLBACK: &str = "default";
/// Default `button_text_file` period in seconds.
const TEXT_FILE_INTERVAL_SECS: u64 = 2;

/// One button of a row.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonView {
    /// Caption, or tooltip when an icon is set.
    pub text: String,
    /// Icon name.
    pub icon: Option<String>,
    /// Style (`default`, `suggested`, `destructive`).
    pub style: String,
    /// Press action.
    pub action: Option<Action>,
}

/// A row with one button or a linked group of buttons.
pub struct ButtonRow {
    /// Shared core.
    core: Arc<RowCore>,
    /// Buttons in display order.
    buttons: Mutex<Vec<ButtonView>>,
}

impl ButtonRow {
    /// Build the row and start its icon and text-file pollers.
    pub fn build(ctx: &Context, props: RowProperties, on_press: Option<Action>) -> Arc<Self> {
        let buttons = if props.buttons.is_empty() {
            vec![ButtonView {
                text: props
                    .button_text
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TEXT.to_string()),
                icon: None,
                style: props
                    .style
                    .as_deref()
                    .unwrap_or(DEFAULT_STYLE)
                    .to_lowercase(),
                action: on_press,
            }]
        } else {
            props
                .buttons
                .iter()
                .map(|b| ButtonView {
                    text: b.button_text.clone().unwrap_or_default(),
                    icon: b.icon.clone(),
                    style: b
                        .style
                        .as_deref()
                        .unwrap_or(DEFAULT_STYLE)
                        .to_lowercase(),
                    action: b.on_press.clone(),
                })
                .collect()
        };
        let row = Arc::new(Self {
            core: RowCore::new(ctx, ItemKind::Button, props, "Unnamed"),
            buttons: Mutex::new(buttons),
        });
        start_icon(&row.core);
        row.start_text_file();
        row
    }

    /// Shared core.
    pub fn core(&self) -> &Arc<RowCore> {
        &self.core
    }

    /// Current buttons.
    pub fn buttons(&self) -> Vec<ButtonView> {
        self.buttons.lock().clone()
    }

    /// Press button `index`. Returns false if there is no such button.
    pub fn press(&self, index: usize) -> bool {
        let action = match self.buttons.lock().get(index) {
            Some(b) => b.action.clone(),
            None => return false,
        };
        self.core.trigger(action.as_ref(), self.core.title());
        true
    }

    /// Poll `button_text_file` into the first button's caption and style.
    fn start_text_file(self: &Arc<Self>) {
        let Some(path) = self
            .core
            .props()
            .button_text_file
            .clone()
            .filter(|p| !p.trim().is_empty())
        else {
            return;
        };
        let interval = self
            .core
            .props()
            .interval
            .unwrap_or(TEXT_FILE_INTERVAL_SECS);
        let me = Arc::downgrade(self);
        Poller::new(
            self.core.ctx(),
            self.core.state(),
            SlotKind::Misc,
            Source::blocking(move || read_trimmed(&path)),
            Duration::ZERO,
            move |contents: &str| {
                if let Some(row) = me.upgrade() {
                    row.apply_text_file(contents);
                }
            },
        )
        .start(Duration::from_secs(interval), true);
    }

    /// Map file contents through `button_text_map` and `style_map`.
    fn apply_text_file(&self, contents: &str) {
        let props = self.core.props();
        let text = lookup(&props.button_text_map, contents);
        let style = lookup(&props.style_map, contents).map(|s| s.to_lowercase());
        let mut changes = Vec::new();
        {
            let mut buttons = self.buttons.lock();
            let Some(first) = buttons.first_mut() else {
                return;
            };
            if let Some(text) = text.filter(|t| *t != first.text) {
                first.text = text.to_string();
                changes.push((Field::ButtonText, first.text.clone()));
            }
            if let Some(style) = style.filter(|s| *s != first.style) {
                first.style = style;
                changes.push((Field::Style, first.style.clone()));
            }
        }
        for (field, value) in changes {
            self.core.changed(field, &value);
        }
    }

    /// One-line rendering.
    pub fn summary(&self) -> String {
        self.buttons
            .lock()
            .iter()
            .map(|b| format!("[{}]", b.text))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exact match, else the `default` entry.
fn lookup<'a>(map: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    map.get(key)
        .or_else(|| map.get(MAP_FALLBACK))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_lookup_falls_back_to_default() {
        let map: BTreeMap<String, String> = [
            ("on".to_string(), "Stop".to_string()),
            ("default".to_string(), "Start".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(lookup(&map, "on"), Some("Stop"));
        assert_eq!(lookup(&map, "weird"), Some("Start"));
        assert_eq!(lookup(&BTreeMap::new(), "on"), None);
    }
}
