use std::rc::Rc;

use tracing::{debug, warn};

use super::{Movia, MoviaId};

impl Movia {
    /// Register `child` so triggers inside this modal's surface can open it.
    /// A child registered elsewhere moves here.
    pub fn register_child(&self, child: &Movia) {
        if child == self || self.has_ancestor(child) {
            warn!(parent = %self.id(), child = %child.id(), "refusing to nest a movia inside itself");
            return;
        }
        if self.state.borrow().children.iter().any(|c| c == child) {
            return;
        }
        let previous = child.state.borrow_mut().parent.take();
        if let Some(previous) = previous.and_then(|p| p.upgrade()) {
            previous.forget_child(child.id());
        }

        self.state.borrow_mut().children.push(child.clone());
        child.state.borrow_mut().parent = Some(self.downgrade());
        debug!(parent = %self.id(), child = %child.id(), "child movia registered");

        if self.is_open() {
            self.attach_child_routing();
        }
    }

    /// Undo [`Movia::register_child`].  Unknown children are ignored.
    pub fn detach_child(&self, child: &Movia) {
        if self.forget_child(child.id()) {
            let mut st = child.state.borrow_mut();
            if st.parent.as_ref().and_then(|p| p.upgrade()).as_ref() == Some(self) {
                st.parent = None;
            }
        }
    }

    pub fn parent_id(&self) -> Option<MoviaId> {
        let parent = self.state.borrow().parent.clone();
        parent.and_then(|p| p.upgrade()).map(|p| p.id())
    }

    pub fn child_ids(&self) -> Vec<MoviaId> {
        let children = self.state.borrow().children.clone();
        children.iter().map(Movia::id).collect()
    }

    /// Open the child whose id or template id equals `trigger`.
    pub fn route_trigger(&self, trigger: &str) -> bool {
        let children = self.state.borrow().children.clone();
        let target = children.into_iter().find(|child| {
            child.id().to_string() == trigger || child.template_id().as_deref() == Some(trigger)
        });
        match target {
            Some(child) => {
                debug!(parent = %self.id(), child = %child.id(), trigger, "routing to child movia");
                child.open();
                true
            }
            None => {
                debug!(parent = %self.id(), trigger, "no child movia matches trigger");
                false
            }
        }
    }

    /// Drop `id` from the child list without touching the child.
    pub(crate) fn forget_child(&self, id: MoviaId) -> bool {
        let mut st = self.state.borrow_mut();
        let before = st.children.len();
        st.children.retain(|c| c.id() != id);
        st.children.len() != before
    }

    /// One delegated listener per surface, attached once there is a child
    /// to route to.
    pub(crate) fn attach_child_routing(&self) {
        let surface = {
            let st = self.state.borrow();
            match st.surface {
                Some(surface) if st.child_routing.is_none() && !st.children.is_empty() => surface,
                _ => return,
            }
        };
        let weak = self.downgrade();
        let listener = self.adapter().listen_child_triggers(
            surface,
            Rc::new(move |trigger: &str| {
                if let Some(movia) = weak.upgrade() {
                    movia.route_trigger(trigger);
                }
            }),
        );
        self.state.borrow_mut().child_routing = Some(listener);
    }

    fn has_ancestor(&self, candidate: &Movia) -> bool {
        let mut cursor = self.state.borrow().parent.clone();
        while let Some(parent) = cursor.and_then(|p| p.upgrade()) {
            if &parent == candidate {
                return true;
            }
            cursor = parent.state.borrow().parent.clone();
        }
        false
    }
}
