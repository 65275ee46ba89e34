//! File-backed settings.
//!
//! Each setting is one small text file under the settings directory; the key
//! is its relative path. Writes are atomic (temp file in the same directory,
//! fsync, rename, fsync of the directory), so file watchers only ever see a
//! complete value appear.

use std::{
    fs::{self, File},
    io::{ErrorKind, Write as _},
    path::{Component, Path, PathBuf},
};

use tracing::warn;

use crate::{Error, Result};

/// A value that can be stored as a setting. The default passed to
/// [`SettingsStore::load`] decides which implementation parses the file.
pub trait SettingValue: Sized {
    /// Parse trimmed file contents. `inverse` only affects booleans.
    fn parse_setting(raw: &str, inverse: bool) -> Option<Self>;
    /// Render for writing. `as_int` only affects booleans.
    fn render_setting(&self, as_int: bool) -> String;
}

/// Interpret text as a boolean: `true/yes/on/1` and `false/no/off/0/""`, then any
/// integer (non-zero is true). Everything else is false.
pub fn parse_bool(raw: &str) -> bool {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "true" | "yes" | "on" | "1" => true,
        "false" | "no" | "off" | "0" | "" => false,
        other => other.parse::<i64>().is_ok_and(|n| n != 0),
    }
}

impl SettingValue for bool {
    fn parse_setting(raw: &str, inverse: bool) -> Option<Self> {
        Some(parse_bool(raw) ^ inverse)
    }

    fn render_setting(&self, as_int: bool) -> String {
        match (as_int, *self) {
            (true, true) => "1".into(),
            (true, false) => "0".into(),
            (false, v) => v.to_string(),
        }
    }
}

impl SettingValue for i64 {
    fn parse_setting(raw: &str, _inverse: bool) -> Option<Self> {
        raw.trim().parse().ok()
    }

    fn render_setting(&self, _as_int: bool) -> String {
        self.to_string()
    }
}

impl SettingValue for f64 {
    fn parse_setting(raw: &str, _inverse: bool) -> Option<Self> {
        raw.trim().parse().ok()
    }

    fn render_setting(&self, _as_int: bool) -> String {
        self.to_string()
    }
}

impl SettingValue for String {
    fn parse_setting(raw: &str, _inverse: bool) -> Option<Self> {
        Some(raw.to_string())
    }

    fn render_setting(&self, _as_int: bool) -> String {
        self.clone()
    }
}

/// Settings rooted at one directory. Cheap to clone and safe to share.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    /// Resolved settings directory.
    dir: PathBuf,
}

impl SettingsStore {
    /// Open (creating if needed) the settings directory at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "cannot create settings directory");
        }
        let dir = fs::canonicalize(&dir).unwrap_or(dir);
        Self { dir }
    }

    /// The resolved settings directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map `key` to a file inside the settings directory.
    ///
    /// Rejects empty keys, NUL bytes, absolute paths and any `..` that would
    /// leave the directory.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let invalid = || Error::InvalidKey(key.to_string());
        if key.is_empty() || key.contains('\0') || key.starts_with('/') {
            return Err(invalid());
        }
        let mut rel = PathBuf::new();
        for comp in Path::new(key).components() {
            match comp {
                Component::Normal(part) => rel.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !rel.pop() {
                        return Err(invalid());
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(invalid()),
            }
        }
        if rel.as_os_str().is_empty() {
            return Err(invalid());
        }
        Ok(self.dir.join(rel))
    }

    /// Read `key`, typed by `default`. Missing files, unreadable files and
    /// unparsable contents all yield `default`.
    pub fn load<T: SettingValue>(&self, key: &str, default: T, inverse: bool) -> T {
        let path = match self.path_for(key) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "rejected settings key");
                return default;
            }
        };
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return default,
            Err(e) => {
                warn!(key, error = %e, "failed to read setting");
                return default;
            }
        };
        match T::parse_setting(raw.trim(), inverse) {
            Some(v) => v,
            None => {
                warn!(key, value = raw.trim(), "failed to parse setting");
                default
            }
        }
    }

    /// Atomically write `value` under `key`.
    pub fn save<T: SettingValue>(&self, key: &str, value: &T, as_int: bool) -> Result<()> {
        let path = self.path_for(key)?;
        let parent = path
            .parent()
            .ok_or_else(|| Error::InvalidKey(key.to_string()))?;
        fs::create_dir_all(parent)?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(".tmp")
            .tempfile_in(parent)?;
        tmp.write_all(value.render_setting(as_int).as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| Error::Io(e.error))?;
        File::open(parent)?.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings"));
        (dir, store)
    }

    #[test]
    fn bool_round_trip_and_inverse() {
        let (_dir, s) = store();
        s.save("dark_mode", &true, false).unwrap();
        assert!(s.load("dark_mode", false, false));
        assert!(!s.load("dark_mode", false, true));
    }

    #[test]
    fn missing_file_returns_default() {
        let (_dir, s) = store();
        assert!(!s.load("wifi_on", false, false));
        assert_eq!(s.load("volume", 30_i64, false), 30);
    }

    #[test]
    fn as_int_writes_digits() {
        let (_dir, s) = store();
        s.save("nested/flag", &false, true).unwrap();
        let raw = fs::read_to_string(s.dir().join("nested/flag")).unwrap();
        assert_eq!(raw, "0");
        assert!(s.load("nested/flag", true, true));
    }

    #[test]
    fn typed_by_default() {
        let (_dir, s) = store();
        s.save("gamma", &"1.5".to_string(), false).unwrap();
        assert_eq!(s.load("gamma", 0.0_f64, false), 1.5);
        assert_eq!(s.load("gamma", 7_i64, false), 7);
        assert_eq!(s.load("gamma", String::new(), false), "1.5");
    }

    #[test]
    fn bool_parsing_rules() {
        for (raw, want) in [
            ("TRUE", true),
            ("on", true),
            ("2", true),
            ("-1", true),
            ("off", false),
            ("", false),
            ("0", false),
            ("maybe", false),
        ] {
            assert_eq!(parse_bool(raw), want, "{raw:?}");
        }
    }

    #[test]
    fn traversal_is_rejected() {
        let (_dir, s) = store();
        for key in ["", "/etc/passwd", "../x", "a/../../x", "a\0b", ".", "a/.."] {
            assert!(s.path_for(key).is_err(), "{key:?}");
        }
        assert_eq!(s.path_for("a/./b/../c").unwrap(), s.dir().join("a/c"));
        assert_eq!(s.path_for("..cache").unwrap(), s.dir().join("..cache"));
        assert_eq!(s.path_for("a/..b").unwrap(), s.dir().join("a/..b"));
        assert!(s.save("../escape", &true, false).is_err());
        assert!(s.load("../escape", true, false));
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let (_dir, s) = store();
        s.save("k", &1_i64, false).unwrap();
        s.save("k", &2_i64, false).unwrap();
        let names: Vec<_> = fs::read_dir(s.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["k".to_string()]);
        assert_eq!(s.load("k", 0_i64, false), 2);
    }
}
