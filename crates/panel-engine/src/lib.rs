//! Panel Engine
//!
//! The panel engine turns a declarative panel document into live widgets whose
//! state is backed by shell commands and small settings files:
//! - runs commands with timeouts and cancellation, off the main loop
//! - polls commands per widget slot with at most one fetch in flight
//! - watches settings files and reflects external changes
//! - debounces slider writes so only the last value is written
//! - tears widgets down so late completions never touch them
//!
//! Everything that mutates a widget runs on the [`MainLoop`]. Background work
//! (processes, the [`WorkerPool`], file watches, [`Timers`]) marshals its
//! results back through [`UiHandle::invoke`]. Front ends observe the panel
//! through [`UiEvent`]s and drive it through [`Panel`] and [`Widget`].

mod context;
mod controls;
mod debounce;
mod error;
mod exec;
mod mainloop;
mod monitor;
mod notification;
mod panel;
mod poller;
mod pool;
mod settings;
mod slot;
mod state;
mod system;
mod timers;
mod widgets;

pub mod test_support;

pub use context::{Context, Timing};
pub use controls::{Control, ProgrammaticFlag, ProgrammaticGuard};
pub use debounce::{DebouncedWriter, Range};
pub use error::{Error, Result};
pub use exec::{
    CancelHandle, CommandRunner, Executor, Failure, Invocation, LaunchConfig, ProcessRunner,
    sanitize_title,
};
pub use mainloop::{MainLoop, UiHandle};
pub use monitor::{FileWatch, watch_setting};
pub use notification::{Field, NotificationDispatcher, TOAST_FAILED, TOAST_OK, UiEvent};
pub use panel::{PageView, Panel, SEARCH_TITLE, SectionView, SubPage};
pub use poller::{PollHandler, Poller, Source};
pub use pool::WorkerPool;
pub use settings::{SettingValue, SettingsStore, parse_bool};
pub use slot::{Disposer, PollSlot, SlotKind};
pub use state::{StateInner, WidgetState};
pub use system::{NOT_AVAILABLE, SystemInfo};
pub use timers::{Flow, TimerId, Timers};
pub use widgets::{
    APPLY_TEXT, ButtonRow, ButtonView, EntryRow, ExpanderRow, GridCard, GridToggleCard, LabelRow,
    NavigationRow, PLACEHOLDER, RowCore, SelectionRow, SliderRow, TRUE_VALUES, ToggleRow,
    WarningBanner, Widget, WidgetId, build_item, expand_home, format_number, is_truthy,
    read_trimmed,
};
