use std::sync::{Arc, Weak};

use config::{Action, ItemKind, RowProperties};
use tracing::trace;

use super::common::{RowCore, StateMonitor, on_off, start_icon};
use crate::{Context, Field, controls::Control};

/// Title used for terminal windows opened by toggle actions.
const ACTION_TITLE: &str = "Toggle";

/// Shared on/off behavior of toggle rows and toggle cards.
pub(super) struct Switch {
    /// Shared core.
    core: Arc<RowCore>,
    /// The switch.
    control: Control<bool>,
    /// Enabled/disabled commands.
    action: Option<Action>,
}

impl Switch {
    /// Build, load the persisted state and start monitors.
    pub(super) fn build(core: Arc<RowCore>, action: Option<Action>) -> Arc<Self> {
        let switch = Arc::new(Self {
            core,
            control: Control::new(false),
            action,
        });
        let weak = Arc::downgrade(&switch);
        switch.control.connect(move |state| {
            if let Some(s) = weak.upgrade() {
                s.on_change(*state);
            }
        });

        let props = switch.core.props();
        if let Some(key) = props.key() {
            let weak = Arc::downgrade(&switch);
            let inverse = props.key_inverse.unwrap_or(false);
            switch.core.load_setting(key, false, inverse, move |v| {
                apply_weak(&weak, v)
            });
        }
        if let Some(monitor) = StateMonitor::from_props(props) {
            let weak = Arc::downgrade(&switch);
            monitor.start(&switch.core, move |v| apply_weak(&weak, v));
        }
        start_icon(&switch.core);
        switch
    }

    /// Shared core.
    pub(super) fn core(&self) -> &Arc<RowCore> {
        &self.core
    }

    /// Current state.
    pub(super) fn is_active(&self) -> bool {
        self.control.get()
    }

    /// Change the state as the user. Returns whether it changed.
    pub(super) fn set_active(&self, state: bool) -> bool {
        self.control.set(state)
    }

    /// Show a state read from the system without running actions.
    pub(super) fn apply_state_update(&self, state: bool) {
        if self.core.state().is_destroyed() {
            return;
        }
        if self.control.set_programmatic(state) {
            trace!(widget = %self.core.id(), state, "state_applied");
        }
    }

    /// Change handler for both origins.
    fn on_change(&self, state: bool) {
        self.core.changed(Field::State, on_off(state));
        if self.control.is_programmatic() {
            return;
        }
        if let Some(exec) = self.action.as_ref().and_then(|a| a.for_state(state)) {
            self.core.launch(&exec.command, ACTION_TITLE, exec.terminal);
        }
        let props = self.core.props();
        if let Some(key) = props.key() {
            let stored = state ^ props.key_inverse.unwrap_or(false);
            self.core
                .save_setting(key, stored, props.save_as_int.unwrap_or(false));
        }
    }
}

/// Forward a monitored state to a switch that may be gone.
fn apply_weak(weak: &Weak<Switch>, state: bool) {
    if let Some(s) = weak.upgrade() {
        s.apply_state_update(state);
    }
}

/// A row with an on/off switch.
pub struct ToggleRow {
    /// Switch behavior.
    switch: Arc<Switch>,
}

impl ToggleRow {
    /// Build the row.
    pub fn build(ctx: &Context, props: RowProperties, on_toggle: Option<Action>) -> Arc<Self> {
        let core = RowCore::new(ctx, ItemKind::Toggle, props, "Unnamed");
        Arc::new(Self {
            switch: Switch::build(core, on_toggle),
        })
    }

    /// Shared core.
    pub fn core(&self) -> &Arc<RowCore> {
        self.switch.core()
    }

    /// Current state.
    pub fn is_active(&self) -> bool {
        self.switch.is_active()
    }

    /// Flip or set the switch as the user.
    pub fn set_active(&self, state: bool) -> bool {
        self.switch.set_active(state)
    }

    /// Show a state read from the system.
    pub fn apply_state_update(&self, state: bool) {
        self.switch.apply_state_update(state)
    }

    /// One-line rendering.
    pub fn summary(&self) -> String {
        on_off(self.is_active()).to_string()
    }
}
