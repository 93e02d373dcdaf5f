//! Ordered list of open modals.
//!
//! Insertion order is open order; the last entry is the topmost (innermost)
//! modal.  The stack does not de-duplicate: a modal's own `is_open` flag
//! keeps it from being pushed twice.

use crate::movia::MoviaId;
use crate::surface::LockTarget;

#[derive(Debug, Clone)]
pub struct StackEntry {
    pub id: MoviaId,
    /// Whether this modal asks for the scroll lock while it is the topmost
    /// requester.
    pub scroll_lock: bool,
    pub lock_target: Option<LockTarget>,
}

impl StackEntry {
    pub fn new(id: MoviaId, scroll_lock: bool) -> Self {
        Self {
            id,
            scroll_lock,
            lock_target: None,
        }
    }

    pub fn with_target(mut self, target: Option<LockTarget>) -> Self {
        self.lock_target = target;
        self
    }
}

#[derive(Debug, Default)]
pub struct ModalStack {
    entries: Vec<StackEntry>,
}

impl ModalStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: StackEntry) {
        self.entries.push(entry);
    }

    /// Remove the first entry for `id`.  Returns `false` if it was not there.
    pub fn remove(&mut self, id: MoviaId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn topmost(&self) -> Option<MoviaId> {
        self.entries.last().map(|e| e.id)
    }

    pub fn topmost_scroll_lock_requester(&self) -> Option<&StackEntry> {
        self.entries.iter().rev().find(|e| e.scroll_lock)
    }

    pub fn contains(&self, id: MoviaId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<MoviaId> {
        self.entries.iter().map(|e| e.id).collect()
    }
}
