use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use config::{Item, ItemKind, RowProperties};

use super::{
    Widget,
    common::{RowCore, on_off, start_icon},
};
use crate::{Context, Field};

/// A collapsible row holding child rows.
pub struct ExpanderRow {
    /// Shared core.
    core: Arc<RowCore>,
    /// Child rows, built eagerly.
    children: Vec<Widget>,
    /// Whether the children are shown.
    expanded: AtomicBool,
}

impl ExpanderRow {
    /// Build the row and its children.
    pub fn build(ctx: &Context, props: RowProperties, items: &[Item], path: &[String]) -> Arc<Self> {
        let children = items
            .iter()
            .map(|item| super::build_item(ctx, item, path))
            .collect();
        let row = Arc::new(Self {
            core: RowCore::new(ctx, ItemKind::Expander, props, "Unnamed"),
            children,
            expanded: AtomicBool::new(false),
        });
        start_icon(&row.core);
        row
    }

    /// Shared core.
    pub fn core(&self) -> &Arc<RowCore> {
        &self.core
    }

    /// Child rows.
    pub fn children(&self) -> &[Widget] {
        &self.children
    }

    /// Whether the children are shown.
    pub fn is_expanded(&self) -> bool {
        self.expanded.load(Ordering::SeqCst)
    }

    /// Toggle the expansion.
    pub fn toggle(&self) -> bool {
        let now = !self.expanded.fetch_xor(true, Ordering::SeqCst);
        self.core.changed(Field::State, on_off(now));
        now
    }

    /// One-line rendering.
    pub fn summary(&self) -> String {
        let marker = if self.is_expanded() { "v" } else { ">" };
        format!("{marker} {} item(s)", self.children.len())
    }
}
