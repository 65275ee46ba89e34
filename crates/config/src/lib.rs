//! Declarative panel document types (pages, sections, items) and loading.

use std::path::{Path, PathBuf};

mod defaults;
mod error;
mod loader;
mod raw;
mod search;
mod types;

#[cfg(test)]
mod test_parse;
#[cfg(test)]
mod test_search;

pub use defaults::DEFAULT_ICON;
pub use error::{Error, excerpt_at};
pub use loader::{load_from_path, load_from_str};
pub use search::SearchHit;
pub use types::{
    Action, ButtonSpec, Document, EngineOptions, ExecAction, IconSpec, Item, ItemKind, Page,
    RowProperties, Section, ValueSpec,
};

/// Directory name used under the XDG config directory.
pub const APP_NAME: &str = "panel";

/// Base directory for the panel's files (`$XDG_CONFIG_HOME/panel`).
fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join(APP_NAME)
}

/// Determine the preferred document path (`$XDG_CONFIG_HOME/panel/panel.json`).
pub fn default_config_path() -> PathBuf {
    app_dir().join("panel.json")
}

/// Default directory for persisted settings (`$XDG_CONFIG_HOME/panel/settings`).
pub fn default_settings_dir() -> PathBuf {
    app_dir().join("settings")
}

/// Resolve the effective document path using the default policy.
///
/// Policy:
/// 1) Use `explicit` when provided.
/// 2) Else use `$XDG_CONFIG_HOME/panel/panel.json` when it exists.
/// 3) Else return a "no config found" read error naming the expected location.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, Error> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let preferred = default_config_path();
    if preferred.exists() {
        return Ok(preferred);
    }

    Err(Error::Read {
        message: format!("No config found. Create {}", preferred.display()),
        path: Some(preferred),
    })
}
