//! Single-owner scroll lock shared by every modal of a context.
//!
//! The owner is always the topmost open modal that asks for locking.  Only
//! the recorded owner's lock target is ever written to; a release request
//! from anyone else is ignored.

use tracing::debug;

use crate::movia::MoviaId;
use crate::stack::{ModalStack, StackEntry};
use crate::surface::{LockTarget, ScrollLockHost, TargetHandle};

#[derive(Debug, Clone, PartialEq)]
struct LockOwner {
    id: MoviaId,
    target: TargetHandle,
    /// Trailing inset of the target before we touched it.
    saved_inset: String,
}

#[derive(Debug, Default)]
pub struct ScrollLockArbiter {
    owner: Option<LockOwner>,
    compensation: Option<f64>,
}

impl ScrollLockArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self) -> Option<MoviaId> {
        self.owner.as_ref().map(|o| o.id)
    }

    pub fn owner_target(&self) -> Option<TargetHandle> {
        self.owner.as_ref().map(|o| o.target)
    }

    /// Hand the lock to the topmost requester on `stack`.  Returns `false`
    /// (and touches nothing) when the owner would not change.
    pub fn recompute<H>(
        &mut self,
        stack: &ModalStack,
        default_target: Option<&LockTarget>,
        host: &H,
    ) -> bool
    where
        H: ScrollLockHost + ?Sized,
    {
        let next = stack.topmost_scroll_lock_requester();
        if next.map(|e| e.id) == self.owner() {
            return false;
        }
        let next = next.map(|entry| (entry.id, resolve_target(entry, default_target, host)));
        self.transfer(next, host)
    }

    /// Move the lock to `next`, an owner and its already resolved target.
    pub fn transfer<H>(&mut self, next: Option<(MoviaId, TargetHandle)>, host: &H) -> bool
    where
        H: ScrollLockHost + ?Sized,
    {
        if next.map(|(id, _)| id) == self.owner() {
            return false;
        }
        if let Some(previous) = self.owner.take() {
            restore(&previous, host);
        }
        if let Some((id, target)) = next {
            self.owner = Some(self.acquire(id, target, host));
        }
        true
    }

    /// Release the lock held by `id`.  No-op unless `id` is the owner.
    pub fn release<H>(&mut self, id: MoviaId, host: &H) -> bool
    where
        H: ScrollLockHost + ?Sized,
    {
        match self.owner.take() {
            Some(owner) if owner.id == id => {
                restore(&owner, host);
                true
            }
            other => {
                self.owner = other;
                false
            }
        }
    }

    fn acquire<H>(&mut self, id: MoviaId, target: TargetHandle, host: &H) -> LockOwner
    where
        H: ScrollLockHost + ?Sized,
    {
        let overflowing = host.measure_overflow(target);
        let compensation = *self
            .compensation
            .get_or_insert_with(|| host.measure_scrollbar_compensation());
        let saved_inset = host.trailing_inset(target);

        host.set_lock_marker(target, true);
        if overflowing && compensation > 0.0 {
            let padded = leading_px(&saved_inset) + compensation;
            host.set_trailing_inset(target, &format!("{padded}px"));
        }
        debug!(%id, ?target, overflowing, compensation, "scroll lock acquired");

        LockOwner {
            id,
            target,
            saved_inset,
        }
    }
}

/// Instance target, then the context default, then the host root.  A target
/// that does not resolve falls through to the next one.
pub fn resolve_target<H>(entry: &StackEntry, default_target: Option<&LockTarget>, host: &H) -> TargetHandle
where
    H: ScrollLockHost + ?Sized,
{
    entry
        .lock_target
        .iter()
        .chain(default_target)
        .find_map(|t| host.resolve_lock_target(t))
        .unwrap_or_else(|| host.root_target())
}

fn restore<H>(owner: &LockOwner, host: &H)
where
    H: ScrollLockHost + ?Sized,
{
    host.set_trailing_inset(owner.target, &owner.saved_inset);
    host.set_lock_marker(owner.target, false);
    debug!(id = %owner.id, target = ?owner.target, "scroll lock released");
}

/// `"12.5px"` -> `12.5`; anything unparsable counts as zero.
fn leading_px(value: &str) -> f64 {
    let value = value.trim();
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(value.len());
    value[..end].parse().unwrap_or(0.0)
}
