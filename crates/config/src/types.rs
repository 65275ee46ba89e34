//! Typed panel document.
//!
//! The document is a tree of pages → sections → items. Items form a closed set
//! of kinds ([`Item`]); each variant carries its own [`RowProperties`] plus the
//! action or value payload that kind understands.

use std::{collections::BTreeMap, path::PathBuf, slice};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    defaults::{
        DEFAULT_ICON, DEFAULT_PAGE_ICON, UNTITLED_PAGE, default_debounce_ms, default_long_timeout,
        default_short_timeout, default_terminal, default_workers,
    },
    raw::{
        as_bool, as_string, as_u64, de_opt_bool, de_opt_f64, de_opt_string, de_opt_u64,
        de_string_map, de_strings, str_field,
    },
};

/// Engine tuning read from the optional top-level `engine` object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Directory holding persisted settings. Defaults to the XDG location.
    pub settings_dir: Option<PathBuf>,
    /// Prefix prepended to every user-launched command (e.g. `["uwsm-app", "--"]`).
    pub launcher: Vec<String>,
    /// Terminal wrapper for actions with `terminal: true`.
    #[serde(default = "default_terminal")]
    pub terminal: Vec<String>,
    /// Slider write debounce in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Timeout for polling commands, in seconds.
    #[serde(default = "default_short_timeout")]
    pub poll_timeout_secs: u64,
    /// Timeout for one-shot reads (labels, option lists), in seconds.
    #[serde(default = "default_long_timeout")]
    pub read_timeout_secs: u64,
    /// Number of background workers for blocking file reads.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            settings_dir: None,
            launcher: Vec::new(),
            terminal: default_terminal(),
            debounce_ms: default_debounce_ms(),
            poll_timeout_secs: default_short_timeout(),
            read_timeout_secs: default_long_timeout(),
            workers: default_workers(),
        }
    }
}

/// A complete panel document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Engine tuning.
    pub engine: EngineOptions,
    /// Pages in sidebar order.
    pub pages: Vec<Page>,
}

impl Document {
    /// Index of the page whose `id` matches.
    pub fn page_index(&self, id: &str) -> Option<usize> {
        self.pages
            .iter()
            .position(|p| p.id.as_deref() == Some(id))
    }
}

/// One sidebar page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Identifier used by redirect actions.
    pub id: Option<String>,
    /// Sidebar title.
    pub title: String,
    /// Sidebar icon name.
    pub icon: String,
    /// Sections shown on the page.
    pub layout: Vec<Section>,
}

impl Page {
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let Value::Object(obj) = value else {
            return None;
        };
        Some(Self {
            id: str_field(obj, "id"),
            title: str_field(obj, "title").unwrap_or_else(|| UNTITLED_PAGE.to_string()),
            icon: str_field(obj, "icon").unwrap_or_else(|| DEFAULT_PAGE_ICON.to_string()),
            layout: layout_from_value(obj.get("layout")),
        })
    }
}

/// A group of items on a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    /// A titled list of rows.
    List {
        /// Group title.
        title: Option<String>,
        /// Group description.
        description: Option<String>,
        /// Rows in the group.
        items: Vec<Item>,
    },
    /// A titled grid of cards.
    Grid {
        /// Group title.
        title: Option<String>,
        /// Cards in the grid; only [`Item::Card`] and [`Item::ToggleCard`].
        items: Vec<Item>,
    },
    /// A bare item placed directly in a layout.
    Single(Item),
}

impl Section {
    /// Items contained in this section.
    pub fn items(&self) -> &[Item] {
        match self {
            Self::List { items, .. } | Self::Grid { items, .. } => items,
            Self::Single(item) => slice::from_ref(item),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let Value::Object(obj) = value else {
            warn!("skipping non-object section");
            return None;
        };
        let props = match obj.get("properties") {
            Some(Value::Object(p)) => p.clone(),
            _ => Map::new(),
        };
        let kind = obj.get("type").and_then(Value::as_str);
        match kind {
            Some("grid_section") => Some(Self::Grid {
                title: str_field(&props, "title"),
                items: array(obj.get("items"))
                    .filter_map(card_from_value)
                    .collect(),
            }),
            Some("section") => Some(list_section(obj, &props)),
            _ if obj.contains_key("items") && kind != Some("expander") => {
                Some(list_section(obj, &props))
            }
            _ => Item::from_value(value).map(Self::Single),
        }
    }
}

fn list_section(obj: &Map<String, Value>, props: &Map<String, Value>) -> Section {
    Section::List {
        title: str_field(props, "title"),
        description: str_field(props, "description"),
        items: array(obj.get("items"))
            .filter_map(Item::from_value)
            .collect(),
    }
}

/// Iterate an optional JSON array.
fn array(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flat_map(|a| a.iter())
}

pub(crate) fn layout_from_value(value: Option<&Value>) -> Vec<Section> {
    array(value).filter_map(Section::from_value).collect()
}

/// Grid sections only hold cards: `toggle_card` items toggle, everything else presses.
fn card_from_value(value: &Value) -> Option<Item> {
    let obj = value.as_object()?;
    let properties = RowProperties::from_value(obj.get("properties"));
    if obj.get("type").and_then(Value::as_str) == Some("toggle_card") {
        Some(Item::ToggleCard {
            properties,
            on_toggle: Action::from_opt(obj.get("on_toggle")),
        })
    } else {
        Some(Item::Card {
            properties,
            on_press: Action::from_opt(obj.get("on_press")),
        })
    }
}

/// Discriminant of [`Item`], used for logging and search filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Push button row.
    Button,
    /// On/off switch row.
    Toggle,
    /// Read-only value row.
    Label,
    /// Numeric slider row.
    Slider,
    /// Drop-down selection row.
    Selection,
    /// Free text entry row.
    Entry,
    /// Row opening a sub-page.
    Navigation,
    /// Collapsible row holding child rows.
    Expander,
    /// Grid card.
    Card,
    /// Grid card with on/off state.
    ToggleCard,
    /// Static warning banner.
    WarningBanner,
}

impl ItemKind {
    /// Config spelling of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Toggle => "toggle",
            Self::Label => "label",
            Self::Slider => "slider",
            Self::Selection => "selection",
            Self::Entry => "entry",
            Self::Navigation => "navigation",
            Self::Expander => "expander",
            Self::Card => "card",
            Self::ToggleCard => "toggle_card",
            Self::WarningBanner => "warning_banner",
        }
    }
}

/// One configurable element.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Runs an action when pressed.
    Button {
        /// Shared row properties.
        properties: RowProperties,
        /// Press action.
        on_press: Option<Action>,
    },
    /// Two-state switch, optionally persisted under `key`.
    Toggle {
        /// Shared row properties.
        properties: RowProperties,
        /// `{enabled, disabled}` commands.
        on_toggle: Option<Action>,
    },
    /// Displays a value.
    Label {
        /// Shared row properties.
        properties: RowProperties,
        /// Where the value comes from.
        value: Option<ValueSpec>,
    },
    /// Numeric slider.
    Slider {
        /// Shared row properties.
        properties: RowProperties,
        /// Write command with `{value}`.
        on_change: Option<Action>,
    },
    /// Choice among options.
    Selection {
        /// Shared row properties.
        properties: RowProperties,
        /// Per-option or shared command.
        on_change: Option<Action>,
    },
    /// Text entry with an apply button.
    Entry {
        /// Shared row properties.
        properties: RowProperties,
        /// Command with `{value}`.
        on_action: Option<Action>,
    },
    /// Opens a sub-page.
    Navigation {
        /// Shared row properties.
        properties: RowProperties,
        /// Sub-page layout.
        layout: Vec<Section>,
    },
    /// Holds child rows.
    Expander {
        /// Shared row properties.
        properties: RowProperties,
        /// Child rows.
        items: Vec<Item>,
    },
    /// Grid card.
    Card {
        /// Shared row properties.
        properties: RowProperties,
        /// Press action.
        on_press: Option<Action>,
    },
    /// Grid toggle card.
    ToggleCard {
        /// Shared row properties.
        properties: RowProperties,
        /// `{enabled, disabled}` commands.
        on_toggle: Option<Action>,
    },
    /// Static warning text.
    WarningBanner {
        /// Shared row properties (`title`, `message`).
        properties: RowProperties,
    },
}

impl Item {
    /// The kind of this item.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Button { .. } => ItemKind::Button,
            Self::Toggle { .. } => ItemKind::Toggle,
            Self::Label { .. } => ItemKind::Label,
            Self::Slider { .. } => ItemKind::Slider,
            Self::Selection { .. } => ItemKind::Selection,
            Self::Entry { .. } => ItemKind::Entry,
            Self::Navigation { .. } => ItemKind::Navigation,
            Self::Expander { .. } => ItemKind::Expander,
            Self::Card { .. } => ItemKind::Card,
            Self::ToggleCard { .. } => ItemKind::ToggleCard,
            Self::WarningBanner { .. } => ItemKind::WarningBanner,
        }
    }

    /// Shared properties.
    pub fn properties(&self) -> &RowProperties {
        match self {
            Self::Button { properties, .. }
            | Self::Toggle { properties, .. }
            | Self::Label { properties, .. }
            | Self::Slider { properties, .. }
            | Self::Selection { properties, .. }
            | Self::Entry { properties, .. }
            | Self::Navigation { properties, .. }
            | Self::Expander { properties, .. }
            | Self::Card { properties, .. }
            | Self::ToggleCard { properties, .. }
            | Self::WarningBanner { properties } => properties,
        }
    }

    /// Mutable shared properties.
    pub fn properties_mut(&mut self) -> &mut RowProperties {
        match self {
            Self::Button { properties, .. }
            | Self::Toggle { properties, .. }
            | Self::Label { properties, .. }
            | Self::Slider { properties, .. }
            | Self::Selection { properties, .. }
            | Self::Entry { properties, .. }
            | Self::Navigation { properties, .. }
            | Self::Expander { properties, .. }
            | Self::Card { properties, .. }
            | Self::ToggleCard { properties, .. }
            | Self::WarningBanner { properties } => properties,
        }
    }

    /// Parse one item. Unknown types become buttons, as the panel always did.
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let Value::Object(obj) = value else {
            warn!("skipping non-object item");
            return None;
        };
        let properties = RowProperties::from_value(obj.get("properties"));
        let kind = obj.get("type").and_then(Value::as_str).unwrap_or_default();
        let item = match kind {
            "button" => Self::Button {
                properties,
                on_press: Action::from_opt(obj.get("on_press")),
            },
            "toggle" => Self::Toggle {
                properties,
                on_toggle: Action::from_opt(obj.get("on_toggle")),
            },
            "label" => Self::Label {
                properties,
                value: obj.get("value").and_then(ValueSpec::from_value),
            },
            "slider" => Self::Slider {
                properties,
                on_change: Action::from_opt(obj.get("on_change")),
            },
            "selection" => Self::Selection {
                properties,
                on_change: Action::from_opt(obj.get("on_change")),
            },
            "entry" => Self::Entry {
                properties,
                on_action: Action::from_opt(obj.get("on_action")),
            },
            "navigation" => Self::Navigation {
                properties,
                layout: layout_from_value(obj.get("layout")),
            },
            "expander" => Self::Expander {
                properties,
                items: array(obj.get("items"))
                    .filter_map(Self::from_value)
                    .collect(),
            },
            "card" => Self::Card {
                properties,
                on_press: Action::from_opt(obj.get("on_press")),
            },
            "toggle_card" => Self::ToggleCard {
                properties,
                on_toggle: Action::from_opt(obj.get("on_toggle")),
            },
            "warning_banner" => Self::WarningBanner { properties },
            other => {
                warn!(item_type = %other, "unknown item type, defaulting to button");
                Self::Button {
                    properties,
                    on_press: Action::from_opt(obj.get("on_press")),
                }
            }
        };
        Some(item)
    }
}

/// Properties shared by every item kind. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RowProperties {
    /// Row title.
    #[serde(deserialize_with = "de_opt_string")]
    pub title: Option<String>,
    /// Subtitle.
    #[serde(deserialize_with = "de_opt_string")]
    pub description: Option<String>,
    /// Banner body text.
    #[serde(deserialize_with = "de_opt_string")]
    pub message: Option<String>,
    /// Icon specification.
    #[serde(deserialize_with = "de_icon")]
    pub icon: Option<IconSpec>,
    /// Base style (`default`, `suggested`, `destructive`).
    #[serde(deserialize_with = "de_opt_string")]
    pub style: Option<String>,
    /// Button label.
    #[serde(deserialize_with = "de_opt_string")]
    pub button_text: Option<String>,
    /// File whose contents select the button label and style.
    #[serde(deserialize_with = "de_opt_string")]
    pub button_text_file: Option<String>,
    /// File contents → button label (`default` key as fallback).
    #[serde(deserialize_with = "de_string_map")]
    pub button_text_map: BTreeMap<String, String>,
    /// File contents → button style (`default` key as fallback).
    #[serde(deserialize_with = "de_string_map")]
    pub style_map: BTreeMap<String, String>,
    /// Polling interval in seconds.
    #[serde(deserialize_with = "de_opt_u64")]
    pub interval: Option<u64>,
    /// Settings key persisted by the row.
    #[serde(deserialize_with = "de_opt_string")]
    pub key: Option<String>,
    /// The stored boolean is the inverse of the displayed state.
    #[serde(deserialize_with = "de_opt_bool")]
    pub key_inverse: Option<bool>,
    /// Store booleans as `1`/`0` instead of `true`/`false`.
    #[serde(deserialize_with = "de_opt_bool")]
    pub save_as_int: Option<bool>,
    /// Command printing the current on/off state.
    #[serde(deserialize_with = "de_opt_string")]
    pub state_command: Option<String>,
    /// Command printing the current value.
    #[serde(deserialize_with = "de_opt_string")]
    pub value_command: Option<String>,
    /// Slider lower bound.
    #[serde(deserialize_with = "de_opt_f64")]
    pub min: Option<f64>,
    /// Slider upper bound.
    #[serde(deserialize_with = "de_opt_f64")]
    pub max: Option<f64>,
    /// Slider step.
    #[serde(deserialize_with = "de_opt_f64")]
    pub step: Option<f64>,
    /// Slider initial value.
    #[serde(deserialize_with = "de_opt_f64")]
    pub default: Option<f64>,
    /// Whether slider writes are debounced (default true).
    #[serde(deserialize_with = "de_opt_bool")]
    pub debounce: Option<bool>,
    /// Static selection options.
    #[serde(deserialize_with = "de_strings")]
    pub options: Vec<String>,
    /// Command listing selection options, one per line.
    #[serde(deserialize_with = "de_opt_string")]
    pub options_command: Option<String>,
    /// Entry placeholder.
    #[serde(deserialize_with = "de_opt_string")]
    pub placeholder: Option<String>,
    /// File holding a badge count.
    #[serde(deserialize_with = "de_opt_string")]
    pub badge_file: Option<String>,
    /// Linked multi-button group.
    #[serde(deserialize_with = "de_buttons")]
    pub buttons: Vec<ButtonSpec>,
}

impl RowProperties {
    /// Parse properties, falling back to defaults for anything that is not an object.
    pub(crate) fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(v @ Value::Object(_)) => Self::deserialize(v).unwrap_or_else(|e| {
                warn!(error = %e, "invalid item properties, using defaults");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Title or the given fallback.
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(fallback)
    }

    /// Non-empty, trimmed settings key.
    pub fn key(&self) -> Option<&str> {
        non_empty(self.key.as_deref())
    }

    /// Non-empty, trimmed state command.
    pub fn state_command(&self) -> Option<&str> {
        non_empty(self.state_command.as_deref())
    }

    /// Non-empty, trimmed value command.
    pub fn value_command(&self) -> Option<&str> {
        non_empty(self.value_command.as_deref())
    }

    /// Non-empty, trimmed options command.
    pub fn options_command(&self) -> Option<&str> {
        non_empty(self.options_command.as_deref())
    }

    /// Icon specification, defaulting to the terminal icon.
    pub fn icon(&self) -> IconSpec {
        self.icon
            .clone()
            .unwrap_or_else(|| IconSpec::Name(DEFAULT_ICON.to_string()))
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// One button of a linked multi-button group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ButtonSpec {
    /// Icon; when set the text becomes the tooltip.
    pub icon: Option<String>,
    /// Label.
    pub button_text: Option<String>,
    /// Style.
    pub style: Option<String>,
    /// Press action.
    pub on_press: Option<Action>,
}

fn de_buttons<'de, D>(deserializer: D) -> Result<Vec<ButtonSpec>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(array(raw.as_ref())
        .filter_map(Value::as_object)
        .map(|obj| ButtonSpec {
            icon: str_field(obj, "icon"),
            button_text: str_field(obj, "button_text"),
            style: str_field(obj, "style"),
            on_press: Action::from_opt(obj.get("on_press")),
        })
        .collect())
}

/// How a row's icon is determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSpec {
    /// A fixed icon name.
    Name(String),
    /// Icon name printed by `command`, refreshed every `interval` seconds.
    Exec {
        /// Command printing an icon name.
        command: String,
        /// Refresh period in seconds; zero disables refresh.
        interval: u64,
        /// Icon shown before the first refresh.
        name: Option<String>,
    },
    /// An image file.
    File {
        /// Path, `~` expanded by the engine.
        path: String,
    },
}

impl IconSpec {
    /// Icon name to show before any dynamic refresh.
    pub fn static_name(&self) -> &str {
        match self {
            Self::Name(n) if !n.is_empty() => n,
            Self::Exec { name: Some(n), .. } => n,
            _ => DEFAULT_ICON,
        }
    }

    /// Command and interval when the icon refreshes itself.
    pub fn dynamic(&self) -> Option<(&str, u64)> {
        match self {
            Self::Exec {
                command, interval, ..
            } if *interval > 0 && !command.trim().is_empty() => Some((command.trim(), *interval)),
            _ => None,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Name(s.clone())),
            Value::Object(obj) => match obj.get("type").and_then(Value::as_str) {
                Some("exec") => Some(Self::Exec {
                    command: str_field(obj, "command").unwrap_or_default(),
                    interval: obj.get("interval").and_then(as_u64).unwrap_or(0),
                    name: str_field(obj, "name"),
                }),
                Some("file") => str_field(obj, "path").map(|path| Self::File { path }),
                _ => Some(Self::Name(
                    str_field(obj, "name").unwrap_or_else(|| DEFAULT_ICON.to_string()),
                )),
            },
            _ => None,
        }
    }
}

fn de_icon<'de, D>(deserializer: D) -> Result<Option<IconSpec>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(IconSpec::from_value))
}

/// A command to run in response to user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecAction {
    /// Command string; may contain `{value}`.
    pub command: String,
    /// Run inside the terminal wrapper.
    pub terminal: bool,
}

impl ExecAction {
    fn from_object(obj: &Map<String, Value>) -> Option<Self> {
        let command = str_field(obj, "command")?;
        Some(Self {
            command,
            terminal: obj.get("terminal").and_then(as_bool).unwrap_or(false),
        })
    }
}

/// What an item does when activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run a command.
    Exec(ExecAction),
    /// Switch to another page by id.
    Redirect {
        /// Target page id.
        page: String,
    },
    /// Separate commands for switching on and off.
    Toggle {
        /// Run when switched on.
        enabled: Option<ExecAction>,
        /// Run when switched off.
        disabled: Option<ExecAction>,
    },
    /// Per-option commands for selections.
    Options(BTreeMap<String, ExecAction>),
}

impl Action {
    pub(crate) fn from_opt(value: Option<&Value>) -> Option<Self> {
        value.and_then(Self::from_value)
    }

    /// Interpret an action object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let Value::Object(obj) = value else {
            return None;
        };
        match obj.get("type").and_then(Value::as_str) {
            Some("exec") => return ExecAction::from_object(obj).map(Self::Exec),
            Some("redirect") => return str_field(obj, "page").map(|page| Self::Redirect { page }),
            _ => {}
        }
        if obj.contains_key("enabled") || obj.contains_key("disabled") {
            let side = |k: &str| {
                obj.get(k)
                    .and_then(Value::as_object)
                    .and_then(ExecAction::from_object)
            };
            return Some(Self::Toggle {
                enabled: side("enabled"),
                disabled: side("disabled"),
            });
        }
        if obj.contains_key("command") {
            return ExecAction::from_object(obj).map(Self::Exec);
        }
        let options: BTreeMap<String, ExecAction> = obj
            .iter()
            .filter_map(|(k, v)| {
                v.as_object()
                    .and_then(ExecAction::from_object)
                    .map(|a| (k.clone(), a))
            })
            .collect();
        (!options.is_empty()).then_some(Self::Options(options))
    }

    /// The command to run for a toggle switching to `state`.
    pub fn for_state(&self, state: bool) -> Option<&ExecAction> {
        match self {
            Self::Toggle { enabled, disabled } => {
                if state {
                    enabled.as_ref()
                } else {
                    disabled.as_ref()
                }
            }
            _ => None,
        }
    }

    /// The command to run when `option` is selected.
    pub fn for_option(&self, option: &str) -> Option<&ExecAction> {
        match self {
            Self::Options(map) => map.get(option),
            Self::Exec(exec) => Some(exec),
            _ => None,
        }
    }

    /// The plain exec payload, if this is an exec action.
    pub fn exec(&self) -> Option<&ExecAction> {
        match self {
            Self::Exec(exec) => Some(exec),
            _ => None,
        }
    }
}

/// Where a label row's text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSpec {
    /// Literal text given directly as a string.
    Text(String),
    /// Output of a command.
    Exec {
        /// Command printing the value.
        command: String,
    },
    /// Literal text given as `{type: "static"}`.
    Static {
        /// Text.
        text: String,
    },
    /// Contents of a file.
    File {
        /// Path, `~` expanded by the engine.
        path: String,
    },
    /// A cached system fact (`cpu_model`, `memory_total`, ...).
    System {
        /// Fact name.
        key: String,
    },
}

impl ValueSpec {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(obj) => match obj.get("type").and_then(Value::as_str) {
                Some("exec") => Some(Self::Exec {
                    command: str_field(obj, "command").unwrap_or_default(),
                }),
                Some("static") => Some(Self::Static {
                    text: str_field(obj, "text").unwrap_or_default(),
                }),
                Some("file") => Some(Self::File {
                    path: str_field(obj, "path").unwrap_or_default(),
                }),
                Some("system") => Some(Self::System {
                    key: str_field(obj, "key").unwrap_or_default(),
                }),
                _ => None,
            },
            other => as_string(other).map(Self::Text),
        }
    }
}
