use tracing::debug;

use super::{invoke, Movia};
use crate::footer::FooterButton;
use crate::surface::SurfaceHandle;

impl Movia {
    /// Replace the modal's content.  Written straight into the surface when
    /// its content region exists, queued until the next open otherwise.
    pub fn update_content(&self, html: &str) {
        let clean = self.ctx.sanitize(html);
        let surface = {
            let mut st = self.state.borrow_mut();
            st.content = Some(clean.clone());
            st.surface
        };
        let adapter = self.adapter();
        match surface {
            Some(surface) if adapter.has_content_region(surface) => {
                self.state.borrow_mut().pending_content = None;
                adapter.set_content(surface, &clean);
            }
            _ => self.state.borrow_mut().pending_content = Some(clean),
        }
    }

    pub fn set_footer_content(&self, html: &str) {
        let clean = self.ctx.sanitize(html);
        let live = self.state.borrow_mut().footer.set_content(clean);
        if live {
            self.render_footer();
        }
    }

    /// Append a footer button.  A label that is already present, rendered or
    /// pending, is ignored.
    pub fn add_footer_button(&self, button: FooterButton) {
        let key = button.label.key();
        let live = self.state.borrow_mut().footer.add_keyed(key, button);
        if live {
            self.render_footer();
        }
    }

    /// Latest content, sanitized.  `None` for template-backed modals that
    /// have not been updated.
    pub fn content(&self) -> Option<String> {
        self.state.borrow().content.clone()
    }

    pub fn pending_content(&self) -> Option<String> {
        self.state.borrow().pending_content.clone()
    }

    pub fn pending_footer_content(&self) -> Option<String> {
        self.state.borrow().footer.pending_content().map(str::to_string)
    }

    /// Label keys of the rendered footer buttons, in order.
    pub fn footer_labels(&self) -> Vec<String> {
        self.state.borrow().footer.labels()
    }

    pub fn pending_footer_labels(&self) -> Vec<String> {
        self.state.borrow().footer.pending_labels()
    }

    pub(crate) fn flush_pending_content(&self, surface: SurfaceHandle) {
        let adapter = self.adapter();
        if !adapter.has_content_region(surface) {
            return;
        }
        let pending = self.state.borrow_mut().pending_content.take();
        if let Some(html) = pending {
            debug!(id = %self.id(), "flushing pending content");
            adapter.set_content(surface, &html);
        }
    }

    /// Rebuild the whole footer region from the live state.
    pub(crate) fn render_footer(&self) {
        let (surface, footer) = {
            let st = self.state.borrow();
            match st.surface {
                Some(surface) if st.footer.is_initialized() => (surface, st.footer.clone()),
                _ => return,
            }
        };
        let html = footer.render(&|markup: &str| self.ctx.sanitize(markup));
        self.adapter().set_footer(surface, &html);
    }

    pub(crate) fn click_footer_button(&self, index: usize) {
        let (id, on_click) = {
            let st = self.state.borrow();
            let on_click = st.footer.button(index).and_then(|b| b.on_click.clone());
            (st.id, on_click)
        };
        invoke(id, "onClick", on_click);
    }
}
