// Defaults and constants for the panel document

/// Icon shown when an item does not name one.
pub const DEFAULT_ICON: &str = "utilities-terminal-symbolic";
/// Sidebar icon for pages without one.
pub(crate) const DEFAULT_PAGE_ICON: &str = "application-x-executable-symbolic";
pub(crate) const UNTITLED_PAGE: &str = "Untitled";

// Engine timing defaults
pub(crate) const DEBOUNCE_MS: u64 = 150;
pub(crate) const SHORT_TIMEOUT_SECS: u64 = 2;
pub(crate) const LONG_TIMEOUT_SECS: u64 = 5;
pub(crate) const WORKERS: usize = 4;

// Terminal wrapper used for actions with `terminal: true`. `{title}` is replaced
// with the sanitized item title.
pub(crate) const TERMINAL: &[&str] = &["kitty", "--class", "panel-term", "--title", "{title}", "--hold"];

// Serde default functions
pub(crate) const fn default_debounce_ms() -> u64 {
    DEBOUNCE_MS
}
pub(crate) const fn default_short_timeout() -> u64 {
    SHORT_TIMEOUT_SECS
}
pub(crate) const fn default_long_timeout() -> u64 {
    LONG_TIMEOUT_SECS
}
pub(crate) const fn default_workers() -> usize {
    WORKERS
}
pub(crate) fn default_terminal() -> Vec<String> {
    TERMINAL.iter().map(|s| s.to_string()).collect()
}
