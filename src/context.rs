//! Shared state for a family of modals.
//!
//! A [`MoviaContext`] owns what every modal of one host page shares: the id
//! counter, the global defaults, the stack of open modals, the scroll-lock
//! arbiter, the rendering adapter and the sanitizer.  The JS bindings keep a
//! single thread-local context; tests build as many as they like.

use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;
use tracing::debug;

use crate::config::GlobalConfig;
use crate::movia::MoviaId;
use crate::sanitize::{HtmlSanitizer, Sanitizer};
use crate::scroll_lock::{resolve_target, ScrollLockArbiter};
use crate::stack::{ModalStack, StackEntry};
use crate::surface::RenderingAdapter;

#[derive(Clone)]
pub struct MoviaContext {
    inner: Rc<ContextInner>,
}

/// Non-owning handle held by callbacks that live inside the adapter.
#[derive(Clone)]
pub(crate) struct WeakContext(Weak<ContextInner>);

impl WeakContext {
    pub fn upgrade(&self) -> Option<MoviaContext> {
        self.0.upgrade().map(|inner| MoviaContext { inner })
    }
}

struct ContextInner {
    next_id: Cell<u64>,
    config: RefCell<GlobalConfig>,
    stack: RefCell<ModalStack>,
    arbiter: RefCell<ScrollLockArbiter>,
    adapter: Rc<dyn RenderingAdapter>,
    sanitizer: Rc<dyn Sanitizer>,
}

impl MoviaContext {
    pub fn new(adapter: Rc<dyn RenderingAdapter>) -> Self {
        Self::with_sanitizer(adapter, Rc::new(HtmlSanitizer::default()))
    }

    pub fn with_sanitizer(adapter: Rc<dyn RenderingAdapter>, sanitizer: Rc<dyn Sanitizer>) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                next_id: Cell::new(1),
                config: RefCell::new(GlobalConfig::default()),
                stack: RefCell::new(ModalStack::new()),
                arbiter: RefCell::new(ScrollLockArbiter::new()),
                adapter,
                sanitizer,
            }),
        }
    }

    /// Apply global overrides; returns the keys that were rejected.
    pub fn configure(&self, patch: &Value) -> Vec<String> {
        self.inner.config.borrow_mut().apply(patch)
    }

    pub fn config(&self) -> Ref<'_, GlobalConfig> {
        self.inner.config.borrow()
    }

    /// Direct access for settings that have no JSON form, such as a lock
    /// target given as an element.
    pub fn update_config(&self, f: impl FnOnce(&mut GlobalConfig)) {
        f(&mut self.inner.config.borrow_mut());
    }

    /// Open modals, bottom first.
    pub fn stack_ids(&self) -> Vec<MoviaId> {
        self.inner.stack.borrow().ids()
    }

    pub fn topmost(&self) -> Option<MoviaId> {
        self.inner.stack.borrow().topmost()
    }

    pub fn scroll_lock_owner(&self) -> Option<MoviaId> {
        self.inner.arbiter.borrow().owner()
    }

    pub(crate) fn downgrade(&self) -> WeakContext {
        WeakContext(Rc::downgrade(&self.inner))
    }

    pub(crate) fn adapter(&self) -> &Rc<dyn RenderingAdapter> {
        &self.inner.adapter
    }

    pub(crate) fn next_id(&self) -> MoviaId {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        MoviaId(id)
    }

    pub(crate) fn push_open(&self, entry: StackEntry) {
        let id = entry.id;
        self.inner.stack.borrow_mut().push(entry);
        debug!(%id, depth = self.inner.stack.borrow().depth(), "movia pushed");
        self.recompute_scroll_lock();
    }

    pub(crate) fn remove_open(&self, id: MoviaId) {
        if self.inner.stack.borrow_mut().remove(id) {
            debug!(%id, "movia removed from stack");
            self.recompute_scroll_lock();
        }
    }

    pub(crate) fn release_scroll_lock(&self, id: MoviaId) -> bool {
        self.inner
            .arbiter
            .borrow_mut()
            .release(id, self.inner.adapter.as_ref())
    }

    /// Sanitize caller markup unless `autoSanitize` is off.
    pub(crate) fn sanitize(&self, html: &str) -> String {
        if self.inner.config.borrow().auto_sanitize {
            self.inner.sanitizer.sanitize(html)
        } else {
            html.to_string()
        }
    }

    /// Lock-target factories are caller code and may open or close modals or
    /// reconfigure the context, so no borrow is held while they run.
    fn recompute_scroll_lock(&self) {
        let next = self.inner.stack.borrow().topmost_scroll_lock_requester().cloned();
        if next.as_ref().map(|e| e.id) == self.scroll_lock_owner() {
            return;
        }
        let default_target = self.inner.config.borrow().scroll_lock_target.clone();
        let host = self.inner.adapter.as_ref();
        let resolved = next.map(|entry| (entry.id, resolve_target(&entry, default_target.as_ref(), host)));

        // A factory that changed the stack already ran its own recompute.
        let current = self.inner.stack.borrow().topmost_scroll_lock_requester().map(|e| e.id);
        if current != resolved.map(|(id, _)| id) {
            return;
        }
        self.inner.arbiter.borrow_mut().transfer(resolved, host);
    }
}

impl std::fmt::Debug for MoviaContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoviaContext")
            .field("open", &self.stack_ids())
            .field("scroll_lock_owner", &self.scroll_lock_owner())
            .finish()
    }
}
