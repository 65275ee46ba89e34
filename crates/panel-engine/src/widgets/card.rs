use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use config::{Action, ItemKind, RowProperties};
use parking_lot::Mutex;

use super::{
    common::{RowCore, on_off, read_trimmed, start_icon},
    toggle::Switch,
};
use crate::{Context, Failure, Field, PollHandler, Poller, SlotKind, Source};

/// Default badge re-check period in seconds.
const BADGE_INTERVAL_SECS: u64 = 5;

/// Style classes for a card.
fn style_classes(props: &RowProperties, toggle: bool) -> Vec<String> {
    let mut classes = vec!["hero-card".to_string()];
    match props.style.as_deref().map(str::to_lowercase).as_deref() {
        Some("destructive") => classes.push("destructive-card".into()),
        Some("suggested") => classes.push("suggested-card".into()),
        _ => {}
    }
    if toggle {
        classes.push("toggle-card".into());
    }
    classes
}

/// Badge count from file contents: positive integers only.
fn parse_badge(contents: &str) -> Option<u64> {
    let s = contents.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|n| *n > 0)
}

/// A grid card that runs an action when clicked.
pub struct GridCard {
    /// Shared core.
    core: Arc<RowCore>,
    /// Click action.
    action: Option<Action>,
    /// Style classes.
    classes: Vec<String>,
    /// Visible badge count.
    badge: Mutex<Option<u64>>,
}

impl GridCard {
    /// Build the card and start its icon and badge pollers.
    pub fn build(ctx: &Context, props: RowProperties, on_press: Option<Action>) -> Arc<Self> {
        let classes = style_classes(&props, false);
        let card = Arc::new(Self {
            core: RowCore::new(ctx, ItemKind::Card, props, "Unnamed"),
            action: on_press,
            classes,
            badge: Mutex::new(None),
        });
        start_icon(&card.core);
        card.start_badge();
        card
    }

    /// Poll `badge_file` on the misc slot.
    fn start_badge(self: &Arc<Self>) {
        let Some(path) = self
            .core
            .props()
            .badge_file
            .clone()
            .filter(|p| !p.trim().is_empty())
        else {
            return;
        };
        let interval = self.core.props().interval.unwrap_or(BADGE_INTERVAL_SECS);
        let card = Arc::downgrade(self);
        Poller::new(
            self.core.ctx(),
            self.core.state(),
            SlotKind::Misc,
            Source::blocking(move || match read_trimmed(&path) {
                Err(Failure::Empty) => Ok(String::new()),
                other => other,
            }),
            Duration::ZERO,
            BadgeHandler { card },
        )
        .start(Duration::from_secs(interval), true);
    }

    /// Shared core.
    pub fn core(&self) -> &Arc<RowCore> {
        &self.core
    }

    /// Style classes.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Visible badge count.
    pub fn badge(&self) -> Option<u64> {
        *self.badge.lock()
    }

    /// Show or hide the badge.
    fn set_badge(&self, badge: Option<u64>) {
        {
            let mut cur = self.badge.lock();
            if *cur == badge {
                return;
            }
            *cur = badge;
        }
        let text = badge.map(|n| n.to_string()).unwrap_or_default();
        self.core.changed(Field::Badge, &text);
    }

    /// Click the card.
    pub fn click(&self) {
        self.core.trigger(self.action.as_ref(), self.core.title());
    }

    /// One-line rendering.
    pub fn summary(&self) -> String {
        match self.badge() {
            Some(n) => format!("({n})"),
            None => String::new(),
        }
    }
}

/// Routes badge reads to a card; unreadable files hide the badge.
struct BadgeHandler {
    /// Target card.
    card: Weak<GridCard>,
}

impl PollHandler for BadgeHandler {
    fn on_output(&self, output: &str) {
        if let Some(card) = self.card.upgrade() {
            card.set_badge(parse_badge(output));
        }
    }

    fn on_failure(&self, _failure: &Failure) {
        if let Some(card) = self.card.upgrade() {
            card.set_badge(None);
        }
    }
}

/// A grid card that flips an on/off state when clicked.
pub struct GridToggleCard {
    /// Switch behavior.
    switch: Arc<Switch>,
    /// Style classes.
    classes: Vec<String>,
}

impl GridToggleCard {
    /// Build the card.
    pub fn build(ctx: &Context, props: RowProperties, on_toggle: Option<Action>) -> Arc<Self> {
        let classes = style_classes(&props, true);
        let core = RowCore::new(ctx, ItemKind::ToggleCard, props, "Toggle");
        Arc::new(Self {
            switch: Switch::build(core, on_toggle),
            classes,
        })
    }

    /// Shared core.
    pub fn core(&self) -> &Arc<RowCore> {
        self.switch.core()
    }

    /// Style classes, with `toggle-active` while on.
    pub fn classes(&self) -> Vec<String> {
        let mut classes = self.classes.clone();
        if self.is_active() {
            classes.push("toggle-active".into());
        }
        classes
    }

    /// Current state.
    pub fn is_active(&self) -> bool {
        self.switch.is_active()
    }

    /// Status line under the title.
    pub fn status(&self) -> &'static str {
        on_off(self.is_active())
    }

    /// Click: flip the state as the user.
    pub fn click(&self) {
        self.switch.set_active(!self.is_active());
    }

    /// Show a state read from the system.
    pub fn apply_state_update(&self, state: bool) {
        self.switch.apply_state_update(state)
    }

    /// One-line rendering.
    pub fn summary(&self) -> String {
        self.status().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badges_are_positive_integers() {
        assert_eq!(parse_badge("3"), Some(3));
        assert_eq!(parse_badge(" 12\n"), Some(12));
        assert_eq!(parse_badge("0"), None);
        assert_eq!(parse_badge("-1"), None);
        assert_eq!(parse_badge("3 updates"), None);
        assert_eq!(parse_badge(""), None);
    }

    #[test]
    fn style_classes_follow_style() {
        let props = RowProperties {
            style: Some("Destructive".into()),
            ..RowProperties::default()
        };
        assert_eq!(style_classes(&props, false), vec!["hero-card", "destructive-card"]);
        assert_eq!(
            style_classes(&RowProperties::default(), true),
            vec!["hero-card", "toggle-card"]
        );
    }
}
