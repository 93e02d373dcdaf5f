//! Stackable, nestable modal overlays.
//!
//! The crate is split into a headless core and a browser layer:
//!
//! * [`Movia`] is one modal: lifecycle, content and footer buffering, nested
//!   children.  It talks to the outside world only through a
//!   [`RenderingAdapter`].
//! * [`MoviaContext`] holds what modals share: the stack of open modals
//!   (topmost gets the escape key), the scroll-lock arbiter and the global
//!   defaults.
//! * `dom` / `bindings` (wasm32 only) implement the adapter over `web-sys` and
//!   expose a `Movia` class to JavaScript.
//!
//! ```ignore
//! let ctx = MoviaContext::new(adapter);
//! let dialog = Movia::new(&ctx, MoviaOptions::new().content("<p>Hi</p>").footer(true))?;
//! dialog.add_footer_button(FooterButton::new("Ok").on_click(|| Ok(())));
//! dialog.open();
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod footer;
pub mod label;
pub mod movia;
pub mod sanitize;
pub mod scroll_lock;
pub mod stack;
pub mod surface;
pub mod transition;

#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
mod bindings;

#[cfg(test)]
mod tests;

pub use config::{ClassNames, CloseMethods, GlobalConfig, MoviaOptions, MoviaSettings};
pub use context::MoviaContext;
pub use error::{MoviaError, Result};
pub use footer::FooterButton;
pub use label::{render_label, Label, Renderable};
pub use movia::{Callback, Lifecycle, Movia, MoviaId};
pub use sanitize::{HtmlSanitizer, Sanitizer};
pub use surface::{
    ListenerId, LockTarget, RenderingAdapter, ScrollLockHost, SurfaceHandle, SurfaceHooks,
    SurfaceSpec, TargetHandle,
};
