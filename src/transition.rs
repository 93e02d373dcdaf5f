//! One-shot completion token for "transition ended OR timeout elapsed".
//!
//! Both the `transitionend` path and the fallback timer hold a clone of the
//! same [`Completion`] and call [`Completion::resolve`]; only the first call
//! runs the callback.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub struct Completion {
    resolved: Rc<Cell<bool>>,
    callback: Rc<RefCell<Option<Box<dyn FnOnce()>>>>,
}

impl Completion {
    pub fn new(callback: Box<dyn FnOnce()>) -> Self {
        Self {
            resolved: Rc::new(Cell::new(false)),
            callback: Rc::new(RefCell::new(Some(callback))),
        }
    }

    /// Returns `true` when this call won the race and ran the callback.
    pub fn resolve(&self) -> bool {
        if self.resolved.replace(true) {
            return false;
        }
        // Release the slot before running so the callback may start a new
        // transition of its own.
        let callback = self.callback.borrow_mut().take();
        if let Some(cb) = callback {
            cb();
        }
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("resolved", &self.resolved.get())
            .finish()
    }
}
