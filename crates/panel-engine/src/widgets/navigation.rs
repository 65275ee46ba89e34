use std::sync::Arc;

use config::{ItemKind, RowProperties, Section};
use tracing::debug;

use super::common::{RowCore, start_icon};
use crate::Context;

/// A row that opens a sub-page.
pub struct NavigationRow {
    /// Shared core.
    core: Arc<RowCore>,
    /// Sub-page layout.
    layout: Vec<Section>,
    /// Titles leading to this row.
    path: Vec<String>,
}

impl NavigationRow {
    /// Build the row. `path` is the breadcrumb of the page holding it.
    pub fn build(
        ctx: &Context,
        props: RowProperties,
        layout: Vec<Section>,
        path: &[String],
    ) -> Arc<Self> {
        let row = Arc::new(Self {
            core: RowCore::new(ctx, ItemKind::Navigation, props, "Subpage"),
            layout,
            path: path.to_vec(),
        });
        start_icon(&row.core);
        row
    }

    /// Shared core.
    pub fn core(&self) -> &Arc<RowCore> {
        &self.core
    }

    /// Sub-page layout.
    pub fn layout(&self) -> &[Section] {
        &self.layout
    }

    /// Ask the front end to push the sub-page.
    pub fn activate(&self) {
        let title = self.core.title();
        let mut path = self.path.clone();
        path.push(title.to_string());
        if let Err(e) = self
            .core
            .ctx()
            .notifier
            .request_navigate(title, path, self.layout.clone())
        {
            debug!(error = %e, "navigation dropped");
        }
    }

    /// One-line rendering.
    pub fn summary(&self) -> String {
        format!("> {} item(s)", self.layout.iter().map(|s| s.items().len()).sum::<usize>())
    }
}
