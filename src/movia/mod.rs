//! A single modal instance.
//!
//! [`Movia`] is a cheap, clonable handle onto shared state.  Everything the
//! adapter calls back into (input hooks, frame and transition callbacks)
//! holds a [`WeakMovia`], so dropping every handle lets the modal go even if
//! the host still has listeners queued.
//!
//! The lifecycle is split over three files: `lifecycle` (open, close,
//! destroy), `content` (content and footer mutation) and `nesting`
//! (parent/child routing).

mod content;
mod lifecycle;
mod nesting;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, error, warn};

use crate::config::{CloseMethods, MoviaOptions};
use crate::context::{MoviaContext, WeakContext};
use crate::error::{MoviaError, Result};
use crate::footer::FooterState;
use crate::surface::{ListenerId, LockTarget, RenderingAdapter, SurfaceHandle, SurfaceHooks};

/// Process-unique, strictly increasing modal id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MoviaId(pub u64);

impl fmt::Display for MoviaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Zero-argument user callback.  Errors are logged, never propagated.
pub type Callback = Rc<dyn Fn() -> anyhow::Result<()>>;

pub(crate) fn invoke(id: MoviaId, what: &'static str, callback: Option<Callback>) {
    if let Some(cb) = callback {
        if let Err(err) = cb() {
            error!(%id, callback = what, error = %err, "movia callback failed");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No surface yet, or the surface was torn down.
    Unmounted,
    /// Surface exists but is hidden.
    Mounted,
    Open,
    /// Closed, waiting for the hide transition to settle.
    Closing,
    Destroyed,
}

/// Options after falling back to the context's defaults.
struct Resolved {
    close_methods: CloseMethods,
    destroy_on_close: bool,
    footer: bool,
    css_class: Vec<String>,
    scroll_lock: bool,
    preserve_scroll: bool,
    lock_target: Option<LockTarget>,
}

struct MoviaState {
    id: MoviaId,
    settings: Resolved,
    template_id: Option<String>,

    is_open: bool,
    closing: bool,
    destroyed: bool,
    /// Bumped on every open/close/destroy; deferred callbacks carry the
    /// epoch they were scheduled in and do nothing once it is stale.
    epoch: u64,

    surface: Option<SurfaceHandle>,
    escape_listener: Option<ListenerId>,
    child_routing: Option<ListenerId>,
    saved_scroll: Option<f64>,

    /// Latest content written through construction or `update_content`.
    content: Option<String>,
    pending_content: Option<String>,
    footer: FooterState,

    parent: Option<WeakMovia>,
    children: Vec<Movia>,

    on_open: Option<Callback>,
    on_close: Option<Callback>,
    on_ready: Option<Callback>,
}

impl MoviaState {
    fn lifecycle(&self) -> Lifecycle {
        if self.destroyed {
            Lifecycle::Destroyed
        } else if self.is_open {
            Lifecycle::Open
        } else if self.closing {
            Lifecycle::Closing
        } else if self.surface.is_some() {
            Lifecycle::Mounted
        } else {
            Lifecycle::Unmounted
        }
    }
}

#[derive(Clone)]
pub struct Movia {
    state: Rc<RefCell<MoviaState>>,
    ctx: MoviaContext,
}

#[derive(Clone)]
pub(crate) struct WeakMovia {
    state: Weak<RefCell<MoviaState>>,
    ctx: WeakContext,
}

impl WeakMovia {
    pub fn upgrade(&self) -> Option<Movia> {
        Some(Movia {
            state: self.state.upgrade()?,
            ctx: self.ctx.upgrade()?,
        })
    }
}

impl Movia {
    /// Build a modal.  Fails only when neither inline content nor a template
    /// is given; with both, the template wins.
    pub fn new(ctx: &MoviaContext, options: MoviaOptions) -> Result<Movia> {
        let MoviaOptions {
            template_id,
            content,
            close_methods,
            destroy_on_close,
            footer,
            css_class,
            footer_buttons,
            enable_scroll_lock,
            preserve_scroll_position,
            scroll_lock_target,
            on_open,
            on_close,
            on_ready,
        } = options;

        let content = match (&template_id, content) {
            (None, None) => return Err(MoviaError::MissingContent),
            (Some(template), Some(_)) => {
                warn!(%template, "both content and templateId given; using the template");
                None
            }
            (_, content) => content.map(|html| ctx.sanitize(&html)),
        };

        let settings = {
            let cfg = ctx.config();
            Resolved {
                close_methods: close_methods.unwrap_or(cfg.default_close_methods),
                destroy_on_close: destroy_on_close.unwrap_or(cfg.destroy_on_close),
                footer,
                css_class: css_class.unwrap_or_else(|| cfg.default_css_class.clone()),
                scroll_lock: enable_scroll_lock.unwrap_or(cfg.enable_scroll_lock),
                preserve_scroll: preserve_scroll_position.unwrap_or(true),
                lock_target: scroll_lock_target,
            }
        };

        let mut footer_state = FooterState::default();
        for button in footer_buttons {
            footer_state.add_button(button);
        }

        let id = ctx.next_id();
        debug!(%id, template = ?template_id, "movia created");

        Ok(Movia {
            state: Rc::new(RefCell::new(MoviaState {
                id,
                settings,
                template_id,
                is_open: false,
                closing: false,
                destroyed: false,
                epoch: 0,
                surface: None,
                escape_listener: None,
                child_routing: None,
                saved_scroll: None,
                content,
                pending_content: None,
                footer: footer_state,
                parent: None,
                children: Vec::new(),
                on_open,
                on_close,
                on_ready,
            })),
            ctx: ctx.clone(),
        })
    }

    pub fn id(&self) -> MoviaId {
        self.state.borrow().id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.borrow().lifecycle()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().is_open
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    pub fn template_id(&self) -> Option<String> {
        self.state.borrow().template_id.clone()
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.state.borrow().surface
    }

    pub fn context(&self) -> &MoviaContext {
        &self.ctx
    }

    pub fn set_on_open(&self, callback: Option<Callback>) {
        self.state.borrow_mut().on_open = callback;
    }

    pub fn set_on_close(&self, callback: Option<Callback>) {
        self.state.borrow_mut().on_close = callback;
    }

    pub fn set_on_ready(&self, callback: Option<Callback>) {
        self.state.borrow_mut().on_ready = callback;
    }

    pub(crate) fn downgrade(&self) -> WeakMovia {
        WeakMovia {
            state: Rc::downgrade(&self.state),
            ctx: self.ctx.downgrade(),
        }
    }

    fn adapter(&self) -> Rc<dyn RenderingAdapter> {
        self.ctx.adapter().clone()
    }

    /// Input hooks for a new surface.  Each one re-enters through a weak
    /// handle.
    fn hooks(&self) -> SurfaceHooks {
        let close_methods = self.state.borrow().settings.close_methods;

        let weak = self.downgrade();
        let on_close_button: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(movia) = weak.upgrade() {
                movia.close();
            }
        });

        let on_overlay = close_methods.contains(CloseMethods::OVERLAY).then(|| {
            let weak = self.downgrade();
            Rc::new(move || {
                if let Some(movia) = weak.upgrade() {
                    movia.close();
                }
            }) as Rc<dyn Fn()>
        });

        let weak = self.downgrade();
        let on_footer_button: Rc<dyn Fn(usize)> = Rc::new(move |index| {
            if let Some(movia) = weak.upgrade() {
                movia.click_footer_button(index);
            }
        });

        SurfaceHooks {
            on_close_button,
            on_overlay,
            on_footer_button,
        }
    }
}

impl PartialEq for Movia {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for Movia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.borrow();
        f.debug_struct("Movia")
            .field("id", &st.id)
            .field("lifecycle", &st.lifecycle())
            .field("surface", &st.surface)
            .finish()
    }
}
