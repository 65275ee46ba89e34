//! Parse and load panel documents.

use std::{fs, path::Path};

use serde::Deserialize;
use serde_json::Value;

use crate::{Document, EngineOptions, Error, types::Page};

/// Load a panel document from a JSON file at `path`.
pub fn load_from_path(path: &Path) -> Result<Document, Error> {
    let source = fs::read_to_string(path).map_err(|e| Error::Read {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    load_from_str(&source, Some(path))
}

/// Parse a panel document from `source`. `path` is only used for error reporting.
pub fn load_from_str(source: &str, path: Option<&Path>) -> Result<Document, Error> {
    let root: Value =
        serde_json::from_str(source).map_err(|e| Error::from_json(&e, source, path))?;
    let validation = |message: String| Error::Validation {
        path: path.map(Path::to_path_buf),
        message,
    };

    let Value::Object(obj) = root else {
        return Err(validation(
            "top level must be an object with a `pages` list".to_string(),
        ));
    };

    let engine = match obj.get("engine") {
        None | Some(Value::Null) => EngineOptions::default(),
        Some(v) => EngineOptions::deserialize(v)
            .map_err(|e| validation(format!("invalid `engine` section: {e}")))?,
    };

    let pages = match obj.get("pages") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(Page::from_value).collect(),
        Some(_) => return Err(validation("`pages` must be a list".to_string())),
    };

    Ok(Document { engine, pages })
}
