use std::sync::Arc;

use config::{ItemKind, RowProperties};

use super::common::RowCore;
use crate::Context;

/// A static warning with a title and message.
pub struct WarningBanner {
    /// Shared core.
    core: Arc<RowCore>,
}

impl WarningBanner {
    /// Build the banner.
    pub fn build(ctx: &Context, props: RowProperties) -> Arc<Self> {
        Arc::new(Self {
            core: RowCore::new(ctx, ItemKind::WarningBanner, props, "Warning"),
        })
    }

    /// Shared core.
    pub fn core(&self) -> &Arc<RowCore> {
        &self.core
    }

    /// Banner body.
    pub fn message(&self) -> &str {
        self.core.props().message.as_deref().unwrap_or_default()
    }

    /// One-line rendering.
    pub fn summary(&self) -> String {
        format!("! {}", self.message())
    }
}
