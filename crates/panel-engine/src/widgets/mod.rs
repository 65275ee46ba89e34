//! Live widgets built from document items.
//!
//! [`build_item`] is the one place that maps an [`Item`] kind to its widget;
//! the match is exhaustive, so a new item kind fails to compile until it has a
//! widget. Every widget shares a [`RowCore`] carrying its id, configuration and
//! [`WidgetState`](crate::WidgetState).

use std::{fmt, sync::Arc};

use config::{Item, ItemKind};

mod banner;
mod button;
mod card;
mod common;
mod entry;
mod expander;
mod label;
mod navigation;
mod selection;
mod slider;
mod toggle;

pub use banner::WarningBanner;
pub use button::{ButtonRow, ButtonView};
pub use card::{GridCard, GridToggleCard};
pub use common::{RowCore, TRUE_VALUES, expand_home, format_number, is_truthy, read_trimmed};
pub use entry::{APPLY_TEXT, EntryRow};
pub use expander::ExpanderRow;
pub use label::{LabelRow, PLACEHOLDER};
pub use navigation::NavigationRow;
pub use selection::SelectionRow;
pub use slider::SliderRow;
pub use toggle::ToggleRow;

use crate::Context;

/// Process-unique widget identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(u64);

impl WidgetId {
    /// Raw id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// A built widget.
#[derive(Clone)]
pub enum Widget {
    /// Button row.
    Button(Arc<ButtonRow>),
    /// Toggle row.
    Toggle(Arc<ToggleRow>),
    /// Label row.
    Label(Arc<LabelRow>),
    /// Slider row.
    Slider(Arc<SliderRow>),
    /// Selection row.
    Selection(Arc<SelectionRow>),
    /// Entry row.
    Entry(Arc<EntryRow>),
    /// Navigation row.
    Navigation(Arc<NavigationRow>),
    /// Expander row.
    Expander(Arc<ExpanderRow>),
    /// Grid card.
    Card(Arc<GridCard>),
    /// Grid toggle card.
    ToggleCard(Arc<GridToggleCard>),
    /// Warning banner.
    Banner(Arc<WarningBanner>),
}

/// Build the widget for `item`. `path` is the breadcrumb of the page it lives on.
pub fn build_item(ctx: &Context, item: &Item, path: &[String]) -> Widget {
    let item = item.clone();
    match item {
        Item::Button {
            properties,
            on_press,
        } => Widget::Button(ButtonRow::build(ctx, properties, on_press)),
        Item::Toggle {
            properties,
            on_toggle,
        } => Widget::Toggle(ToggleRow::build(ctx, properties, on_toggle)),
        Item::Label { properties, value } => Widget::Label(LabelRow::build(ctx, properties, value)),
        Item::Slider {
            properties,
            on_change,
        } => Widget::Slider(SliderRow::build(ctx, properties, on_change)),
        Item::Selection {
            properties,
            on_change,
        } => Widget::Selection(SelectionRow::build(ctx, properties, on_change)),
        Item::Entry {
            properties,
            on_action,
        } => Widget::Entry(EntryRow::build(ctx, properties, on_action)),
        Item::Navigation { properties, layout } => {
            Widget::Navigation(NavigationRow::build(ctx, properties, layout, path))
        }
        Item::Expander { properties, items } => {
            Widget::Expander(ExpanderRow::build(ctx, properties, &items, path))
        }
        Item::Card {
            properties,
            on_press,
        } => Widget::Card(GridCard::build(ctx, properties, on_press)),
        Item::ToggleCard {
            properties,
            on_toggle,
        } => Widget::ToggleCard(GridToggleCard::build(ctx, properties, on_toggle)),
        Item::WarningBanner { properties } => Widget::Banner(WarningBanner::build(ctx, properties)),
    }
}

impl Widget {
    /// Shared core.
    pub fn core(&self) -> &Arc<RowCore> {
        match self {
            Self::Button(w) => w.core(),
            Self::Toggle(w) => w.core(),
            Self::Label(w) => w.core(),
            Self::Slider(w) => w.core(),
            Self::Selection(w) => w.core(),
            Self::Entry(w) => w.core(),
            Self::Navigation(w) => w.core(),
            Self::Expander(w) => w.core(),
            Self::Card(w) => w.core(),
            Self::ToggleCard(w) => w.core(),
            Self::Banner(w) => w.core(),
        }
    }

    /// Widget id.
    pub fn id(&self) -> WidgetId {
        self.core().id()
    }

    /// Item kind.
    pub fn kind(&self) -> ItemKind {
        self.core().kind()
    }

    /// Displayed title.
    pub fn title(&self) -> &str {
        self.core().title()
    }

    /// Displayed icon.
    pub fn icon(&self) -> String {
        self.core().icon()
    }

    /// Child widgets (expanders only).
    pub fn children(&self) -> &[Widget] {
        match self {
            Self::Expander(w) => w.children(),
            _ => &[],
        }
    }

    /// This widget or a descendant with `id`.
    pub fn find(&self, id: WidgetId) -> Option<&Widget> {
        if self.id() == id {
            return Some(self);
        }
        self.children().iter().find_map(|c| c.find(id))
    }

    /// Record whether the widget is on the visible page. Pollers skip ticks
    /// while unmapped; selections re-read their value when shown again.
    pub fn set_mapped(&self, mapped: bool) {
        let changed = self.core().state().set_mapped(mapped);
        for child in self.children() {
            child.set_mapped(mapped);
        }
        if changed && mapped {
            if let Self::Selection(w) = self {
                w.on_map();
            }
        }
    }

    /// Tear down children, then this widget. Safe to call twice.
    pub fn teardown(&self) {
        for child in self.children() {
            child.teardown();
        }
        self.core().teardown();
    }

    /// Activate the widget the way a click would. `index` picks a button in
    /// linked groups. Returns false when there was nothing to activate.
    pub fn press(&self, index: usize) -> bool {
        match self {
            Self::Button(w) => w.press(index),
            Self::Toggle(w) => w.set_active(!w.is_active()),
            Self::Entry(w) => w.apply(),
            Self::Navigation(w) => {
                w.activate();
                true
            }
            Self::Expander(w) => {
                w.toggle();
                true
            }
            Self::Card(w) => {
                w.click();
                true
            }
            Self::ToggleCard(w) => {
                w.click();
                true
            }
            Self::Label(_) | Self::Slider(_) | Self::Selection(_) | Self::Banner(_) => false,
        }
    }

    /// One-line rendering of the widget's current state.
    pub fn summary(&self) -> String {
        match self {
            Self::Button(w) => w.summary(),
            Self::Toggle(w) => w.summary(),
            Self::Label(w) => w.summary(),
            Self::Slider(w) => w.summary(),
            Self::Selection(w) => w.summary(),
            Self::Entry(w) => w.summary(),
            Self::Navigation(w) => w.summary(),
            Self::Expander(w) => w.summary(),
            Self::Card(w) => w.summary(),
            Self::ToggleCard(w) => w.summary(),
            Self::Banner(w) => w.summary(),
        }
    }
}
