//! Per-channel polling state.

use crate::{CancelHandle, TimerId, monitor::FileWatch};

/// The polling channels every widget has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// Dynamic icon refresh.
    Icon,
    /// On/off state (command poll or settings file watch).
    Monitor,
    /// Numeric value, label text or current selection.
    Value,
    /// Extras: badge counts, button text files, option lists.
    Misc,
}

impl SlotKind {
    /// Every slot, in storage order.
    pub const ALL: [Self; 4] = [Self::Icon, Self::Monitor, Self::Value, Self::Misc];

    /// Storage index.
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Icon => 0,
            Self::Monitor => 1,
            Self::Value => 2,
            Self::Misc => 3,
        }
    }
}

/// Something that stops an outstanding operation when disposed.
pub enum Disposer {
    /// An in-flight command.
    Command(CancelHandle),
    /// A settings file watch.
    Watch(FileWatch),
}

impl Disposer {
    /// Stop the operation.
    pub fn dispose(self) {
        match self {
            Self::Command(handle) => handle.cancel(),
            Self::Watch(watch) => watch.stop(),
        }
    }
}

/// State for one polling channel. Only touched under the widget lock.
#[derive(Default)]
pub struct PollSlot {
    /// A fetch is in flight.
    pub running: bool,
    /// The repeating timer driving this slot.
    pub timer: Option<TimerId>,
    /// How to stop whatever is currently outstanding.
    pub cancel: Option<Disposer>,
}

impl PollSlot {
    /// Dispose of the outstanding operation, if any.
    pub fn dispose(&mut self) {
        if let Some(d) = self.cancel.take() {
            d.dispose();
        }
    }

    /// Forget the stored handle if it belongs to `handle`'s invocation.
    pub fn clear_if_same(&mut self, handle: &CancelHandle) {
        if matches!(&self.cancel, Some(Disposer::Command(h)) if h.same_as(handle)) {
            self.cancel = None;
        }
    }
}
