use std::sync::Arc;

use config::{Action, ItemKind, RowProperties};
use tracing::trace;

use super::common::{RowCore, ValueMonitor, format_number, start_icon};
use crate::{
    Context, Field,
    controls::Control,
    debounce::{DebouncedWriter, EPSILON, Range},
};

/// A row with a numeric slider.
pub struct SliderRow {
    /// Shared core.
    core: Arc<RowCore>,
    /// Slider position.
    control: Control<f64>,
    /// Write path for user input.
    writer: Arc<DebouncedWriter>,
}

impl SliderRow {
    /// Build the row and start its value monitor.
    pub fn build(ctx: &Context, props: RowProperties, on_change: Option<Action>) -> Arc<Self> {
        let min = props.min.unwrap_or(0.0);
        let max = props.max.unwrap_or(100.0);
        let step = props.step.filter(|s| *s > EPSILON).unwrap_or(1.0);
        let range = Range { min, max, step };
        let initial = range.clamp(props.default.unwrap_or(min));
        let debounce = props.debounce.unwrap_or(true);
        let action = on_change.as_ref().and_then(|a| a.exec()).cloned();

        let core = RowCore::new(ctx, ItemKind::Slider, props, "Unnamed");
        let writer = DebouncedWriter::new(ctx, core.state(), range, debounce, action, core.title());
        let row = Arc::new(Self {
            core,
            control: Control::new(initial),
            writer,
        });

        let weak = Arc::downgrade(&row);
        row.control.connect(move |v| {
            if let Some(r) = weak.upgrade() {
                r.on_change(*v);
            }
        });
        if let Some(monitor) = ValueMonitor::from_props(row.core.props()) {
            let weak = Arc::downgrade(&row);
            monitor.start(&row.core, move |v| {
                if let Some(r) = weak.upgrade() {
                    r.apply_value_update(v);
                }
            });
        }
        start_icon(&row.core);
        row
    }

    /// Shared core.
    pub fn core(&self) -> &Arc<RowCore> {
        &self.core
    }

    /// Current position.
    pub fn value(&self) -> f64 {
        self.control.get()
    }

    /// The slider's bounds.
    pub fn range(&self) -> Range {
        self.writer.range()
    }

    /// Move the slider as the user would.
    pub fn set_value(&self, value: f64) -> bool {
        self.control.set(value)
    }

    /// Show a value read from the system without writing it back.
    pub fn apply_value_update(&self, value: f64) {
        if self.core.state().is_destroyed() {
            return;
        }
        let range = self.writer.range();
        let value = range.clamp(value);
        if (self.control.get() - value).abs() < range.step {
            return;
        }
        self.writer.note_programmatic(value);
        self.control.set_programmatic(value);
    }

    /// Change handler for both origins.
    fn on_change(&self, value: f64) {
        if self.control.is_programmatic() {
            self.core.changed(Field::Value, &format_number(value));
            return;
        }
        let Some(snapped) = self.writer.submit(value) else {
            trace!(widget = %self.core.id(), value, "slider_input_ignored");
            let shown = self.writer.range().snap(value);
            if (shown - value).abs() > EPSILON {
                self.control.set_programmatic(shown);
            }
            return;
        };
        if (snapped - value).abs() > EPSILON {
            self.control.set_programmatic(snapped);
        } else {
            self.core.changed(Field::Value, &format_number(snapped));
        }
    }

    /// One-line rendering.
    pub fn summary(&self) -> String {
        let r = self.range();
        format!(
            "{} ({}..{})",
            format_number(self.value()),
            format_number(r.min),
            format_number(r.max)
        )
    }
}
