use std::mem;
use std::rc::Rc;

use tracing::{debug, warn};

use super::{invoke, Movia};
use crate::config::CloseMethods;
use crate::constants::TRANSITION_FALLBACK_MS;
use crate::stack::StackEntry;
use crate::surface::{SurfaceHandle, SurfaceSpec};

impl Movia {
    /// Show the modal.  A no-op when it is already open; refused with a
    /// warning once destroyed.
    pub fn open(&self) {
        let (epoch, entry) = {
            let mut st = self.state.borrow_mut();
            if st.destroyed {
                warn!(id = %st.id, "cannot open a destroyed movia");
                return;
            }
            if st.is_open {
                return;
            }
            st.is_open = true;
            st.closing = false;
            st.epoch += 1;
            let entry = StackEntry::new(st.id, st.settings.scroll_lock)
                .with_target(st.settings.lock_target.clone());
            (st.epoch, entry)
        };
        debug!(id = %entry.id, epoch, "movia opening");

        self.ctx.push_open(entry);
        let surface = self.ensure_surface();
        self.flush_pending_content(surface);
        self.attach_child_routing();
        self.bind_escape();

        let adapter = self.adapter();
        adapter.set_concealed(surface, false);
        let weak = self.downgrade();
        adapter.next_frame(Box::new(move || {
            if let Some(movia) = weak.upgrade() {
                movia.reveal(epoch);
            }
        }));
    }

    pub fn close(&self) {
        self.close_with(false);
    }

    /// Hide the modal.  With `force_destroy` (or `destroyOnClose`) the
    /// surface is torn down once the hide transition settles.
    pub fn close_with(&self, force_destroy: bool) {
        let adapter = self.adapter();
        let (id, surface, epoch, escape, will_destroy, preserve) = {
            let mut st = self.state.borrow_mut();
            let Some(surface) = st.surface else {
                return;
            };
            if !st.is_open {
                return;
            }
            st.is_open = false;
            st.closing = true;
            st.epoch += 1;
            (
                st.id,
                surface,
                st.epoch,
                st.escape_listener.take(),
                force_destroy || st.settings.destroy_on_close,
                st.settings.preserve_scroll,
            )
        };
        debug!(%id, epoch, will_destroy, "movia closing");

        if preserve {
            let offset = adapter.scroll_offset(surface);
            self.state.borrow_mut().saved_scroll = Some(offset);
        }
        self.ctx.remove_open(id);
        if let Some(listener) = escape {
            adapter.unlisten(listener);
        }
        adapter.set_visibility_marker(surface, false);

        let weak = self.downgrade();
        adapter.wait_for_transition_settle(
            surface,
            TRANSITION_FALLBACK_MS,
            Box::new(move || {
                if let Some(movia) = weak.upgrade() {
                    movia.finish_close(epoch, will_destroy);
                }
            }),
        );
    }

    /// Terminal.  Children survive but forget their parent.
    pub fn destroy(&self) {
        let (id, was_open, parent, children) = {
            let mut st = self.state.borrow_mut();
            if st.destroyed {
                return;
            }
            st.destroyed = true;
            (
                st.id,
                st.is_open,
                st.parent.take(),
                mem::take(&mut st.children),
            )
        };
        debug!(%id, was_open, "movia destroyed");

        self.ctx.release_scroll_lock(id);
        if let Some(parent) = parent.and_then(|p| p.upgrade()) {
            parent.forget_child(id);
        }
        for child in children {
            child.state.borrow_mut().parent = None;
        }

        if was_open {
            self.close_with(true);
        } else {
            // Cancels a close still waiting for its transition.
            let mut st = self.state.borrow_mut();
            st.epoch += 1;
            st.closing = false;
            drop(st);
            self.teardown();
        }
    }

    /// Create the surface on first use, mount it if needed.
    fn ensure_surface(&self) -> SurfaceHandle {
        let adapter = self.adapter();
        if let Some(surface) = self.state.borrow().surface {
            if !adapter.is_mounted(surface) {
                adapter.mount(surface);
            }
            return surface;
        }

        let (id, template_id, content, css_classes, close_button, footer) = {
            let st = self.state.borrow();
            (
                st.id,
                st.template_id.clone(),
                st.content.clone(),
                st.settings.css_class.clone(),
                st.settings.close_methods.contains(CloseMethods::BUTTON),
                st.settings.footer,
            )
        };
        let content = match (content, template_id) {
            (Some(content), _) => content,
            (None, Some(template)) => adapter.template_html(&template).unwrap_or_else(|| {
                warn!(%id, %template, "template not found; rendering empty content");
                String::new()
            }),
            (None, None) => String::new(),
        };

        let spec = SurfaceSpec {
            movia_id: id,
            css_classes: &css_classes,
            close_button,
            footer,
            content: &content,
        };
        let surface = adapter.create_surface(&spec, self.hooks());
        self.state.borrow_mut().surface = Some(surface);
        debug!(%id, ?surface, "movia surface created");

        if footer {
            self.state.borrow_mut().footer.flush();
            self.render_footer();
        }
        adapter.mount(surface);
        surface
    }

    fn bind_escape(&self) {
        let enabled = {
            let st = self.state.borrow();
            st.escape_listener.is_none() && st.settings.close_methods.contains(CloseMethods::ESCAPE)
        };
        if !enabled {
            return;
        }
        let weak = self.downgrade();
        let listener = self.adapter().listen_escape(Rc::new(move || {
            if let Some(movia) = weak.upgrade() {
                movia.handle_escape();
            }
        }));
        self.state.borrow_mut().escape_listener = Some(listener);
    }

    /// Only the topmost modal reacts to escape.
    pub(crate) fn handle_escape(&self) {
        if self.ctx.topmost() == Some(self.id()) {
            self.close();
        }
    }

    fn reveal(&self, epoch: u64) {
        let (id, surface, on_ready) = {
            let st = self.state.borrow();
            match st.surface {
                Some(surface) if st.is_open && st.epoch == epoch => {
                    (st.id, surface, st.on_ready.clone())
                }
                _ => return,
            }
        };
        let adapter = self.adapter();
        adapter.set_visibility_marker(surface, true);
        adapter.dispatch_ready(surface);
        invoke(id, "onReady", on_ready);

        let weak = self.downgrade();
        adapter.wait_for_transition_settle(
            surface,
            TRANSITION_FALLBACK_MS,
            Box::new(move || {
                if let Some(movia) = weak.upgrade() {
                    movia.finish_open(epoch);
                }
            }),
        );
    }

    fn finish_open(&self, epoch: u64) {
        let (id, surface, restore, on_open) = {
            let st = self.state.borrow();
            match st.surface {
                Some(surface) if st.is_open && st.epoch == epoch => (
                    st.id,
                    surface,
                    st.saved_scroll.filter(|_| st.settings.preserve_scroll),
                    st.on_open.clone(),
                ),
                _ => return,
            }
        };
        if let Some(offset) = restore {
            self.adapter().set_scroll_offset(surface, offset);
        }
        debug!(%id, epoch, "movia opened");
        invoke(id, "onOpen", on_open);
    }

    fn finish_close(&self, epoch: u64, will_destroy: bool) {
        let (id, surface, on_close) = {
            let mut st = self.state.borrow_mut();
            if st.is_open || st.epoch != epoch {
                return;
            }
            st.closing = false;
            (st.id, st.surface, st.on_close.clone())
        };

        if will_destroy {
            self.teardown();
        } else if let Some(surface) = surface {
            self.adapter().set_concealed(surface, true);
        }
        debug!(%id, epoch, will_destroy, "movia closed");
        invoke(id, "onClose", on_close);
    }

    /// Remove the surface and forget everything tied to it.
    fn teardown(&self) {
        let (surface, listeners) = {
            let mut st = self.state.borrow_mut();
            st.pending_content = None;
            st.footer.reset();
            let listeners = [st.child_routing.take(), st.escape_listener.take()];
            (st.surface.take(), listeners)
        };
        let adapter = self.adapter();
        for listener in listeners.into_iter().flatten() {
            adapter.unlisten(listener);
        }
        if let Some(surface) = surface {
            adapter.destroy_surface(surface);
        }
    }
}
