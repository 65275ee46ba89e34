//! Headless interactive controls.
//!
//! A [`Control`] holds one value and notifies a handler whenever the value
//! changes, whether the change came from the user or from the engine. Engine
//! updates go through [`Control::set_programmatic`], which raises a scoped
//! flag so the handler can tell them apart and skip side effects.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;

/// Marks updates that originate from the engine rather than the user.
#[derive(Debug, Default)]
pub struct ProgrammaticFlag(AtomicBool);

impl ProgrammaticFlag {
    /// Raise the flag until the returned guard drops. Nesting restores the
    /// outer state.
    pub fn guard(&self) -> ProgrammaticGuard<'_> {
        let previous = self.0.swap(true, Ordering::SeqCst);
        ProgrammaticGuard {
            flag: &self.0,
            previous,
        }
    }

    /// Whether an engine update is in progress.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Scope of a programmatic update.
pub struct ProgrammaticGuard<'a> {
    /// Flag to restore.
    flag: &'a AtomicBool,
    /// Value before the guard was taken.
    previous: bool,
}

impl Drop for ProgrammaticGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(self.previous, Ordering::SeqCst);
    }
}

/// Change handler.
type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A value with a change notification.
pub struct Control<T> {
    /// Current value.
    value: Mutex<T>,
    /// Called after every change.
    handler: Mutex<Option<Handler<T>>>,
    /// Set during engine updates.
    programmatic: ProgrammaticFlag,
}

impl<T: Clone + PartialEq> Control<T> {
    /// A control showing `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
            handler: Mutex::new(None),
            programmatic: ProgrammaticFlag::default(),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.value.lock().clone()
    }

    /// Install the change handler, replacing any previous one.
    pub fn connect<F>(&self, f: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        *self.handler.lock() = Some(Arc::new(f));
    }

    /// Change the value as the user would. Returns whether it changed; the
    /// handler runs only on change.
    pub fn set(&self, value: T) -> bool {
        {
            let mut cur = self.value.lock();
            if *cur == value {
                return false;
            }
            *cur = value.clone();
        }
        let handler = self.handler.lock().clone();
        if let Some(h) = handler {
            h(&value);
        }
        true
    }

    /// Change the value on behalf of the engine.
    pub fn set_programmatic(&self, value: T) -> bool {
        let _guard = self.programmatic.guard();
        self.set(value)
    }

    /// Whether the current change is an engine update.
    pub fn is_programmatic(&self) -> bool {
        self.programmatic.is_set()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Weak;

    use super::*;

    #[test]
    fn guard_restores_on_drop() {
        let flag = ProgrammaticFlag::default();
        {
            let _outer = flag.guard();
            {
                let _inner = flag.guard();
                assert!(flag.is_set());
            }
            assert!(flag.is_set());
        }
        assert!(!flag.is_set());
    }

    #[test]
    fn handler_sees_origin_of_change() {
        let control = Arc::new(Control::new(false));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let weak: Weak<Control<bool>> = Arc::downgrade(&control);
        let log = seen.clone();
        control.connect(move |v| {
            if let Some(c) = weak.upgrade() {
                log.lock().push((*v, c.is_programmatic()));
            }
        });
        assert!(control.set(true));
        assert!(!control.set(true));
        assert!(control.set_programmatic(false));
        assert_eq!(*seen.lock(), vec![(true, false), (false, true)]);
        assert!(!control.is_programmatic());
    }
}
