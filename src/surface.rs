//! The seam between the modal core and whatever draws it.
//!
//! The core never touches the DOM.  It asks a [`RenderingAdapter`] to build,
//! show and tear down a *surface* (backdrop + container + content + optional
//! footer) and a [`ScrollLockHost`] to measure and style the element whose
//! scrolling is suppressed while a modal is up.  The browser implementation
//! lives in `crate::dom`; tests use a recording fake.
//!
//! Callbacks handed to an adapter must never be invoked synchronously from
//! within the call that registers them.  Frame, transition and input
//! callbacks always arrive later, from the host's event loop.

use std::fmt;
use std::rc::Rc;

use crate::movia::MoviaId;

/// Opaque handle to one rendered surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// Opaque handle to an element that can be scroll-locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub u64);

/// Registration token returned by the `listen_*` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Which element to scroll-lock while a modal owns the lock.
#[derive(Clone)]
pub enum LockTarget {
    /// Resolved with a selector query at lock time.
    Selector(String),
    /// An element the adapter already knows about.
    Handle(TargetHandle),
    /// Evaluated lazily each time the lock is acquired.
    Factory(Rc<dyn Fn() -> Option<TargetHandle>>),
}

impl fmt::Debug for LockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockTarget::Selector(s) => f.debug_tuple("Selector").field(s).finish(),
            LockTarget::Handle(h) => f.debug_tuple("Handle").field(h).finish(),
            LockTarget::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Everything an adapter needs to build a surface.
#[derive(Debug)]
pub struct SurfaceSpec<'a> {
    pub movia_id: MoviaId,
    pub css_classes: &'a [String],
    pub close_button: bool,
    pub footer: bool,
    /// Initial content markup, already resolved from template or inline
    /// content.
    pub content: &'a str,
}

/// Input callbacks wired into a surface at creation time.
#[derive(Clone)]
pub struct SurfaceHooks {
    pub on_close_button: Rc<dyn Fn()>,
    /// Present only when overlay clicks dismiss the modal.  Fired for clicks
    /// whose target is the backdrop itself.
    pub on_overlay: Option<Rc<dyn Fn()>>,
    /// Receives the index carried by the clicked footer button.
    pub on_footer_button: Rc<dyn Fn(usize)>,
}

pub trait RenderingAdapter: ScrollLockHost {
    /// Markup of a `<template>`-like reference, if it exists.
    fn template_html(&self, template_id: &str) -> Option<String>;

    fn create_surface(&self, spec: &SurfaceSpec<'_>, hooks: SurfaceHooks) -> SurfaceHandle;
    /// Remove the surface from the host and drop every listener attached to it.
    fn destroy_surface(&self, surface: SurfaceHandle);
    fn mount(&self, surface: SurfaceHandle);
    fn is_mounted(&self, surface: SurfaceHandle) -> bool;

    /// Toggle the marker that drives the reveal/hide transition.
    fn set_visibility_marker(&self, surface: SurfaceHandle, on: bool);
    /// Hide a closed-but-kept surface completely (or undo that on reopen).
    fn set_concealed(&self, surface: SurfaceHandle, concealed: bool);

    fn has_content_region(&self, surface: SurfaceHandle) -> bool;
    fn set_content(&self, surface: SurfaceHandle, html: &str);
    /// Replace the whole footer region with `html`.
    fn set_footer(&self, surface: SurfaceHandle, html: &str);

    fn scroll_offset(&self, surface: SurfaceHandle) -> f64;
    fn set_scroll_offset(&self, surface: SurfaceHandle, offset: f64);

    /// Run `callback` on the next animation frame.
    fn next_frame(&self, callback: Box<dyn FnOnce()>);
    /// Run `callback` once the surface's transition ends, or after
    /// `fallback_ms`, whichever happens first.  Exactly one invocation.
    fn wait_for_transition_settle(
        &self,
        surface: SurfaceHandle,
        fallback_ms: u32,
        callback: Box<dyn FnOnce()>,
    );
    fn dispatch_ready(&self, surface: SurfaceHandle);

    fn listen_escape(&self, handler: Rc<dyn Fn()>) -> ListenerId;
    /// Delegated click listener on the surface; the handler receives the
    /// value of the nearest child-open trigger attribute.
    fn listen_child_triggers(&self, surface: SurfaceHandle, handler: Rc<dyn Fn(&str)>) -> ListenerId;
    fn unlisten(&self, listener: ListenerId);
}

/// Measurement and styling of scroll-lock targets.
pub trait ScrollLockHost {
    fn resolve_lock_target(&self, target: &LockTarget) -> Option<TargetHandle>;
    /// The host's root scrolling element.
    fn root_target(&self) -> TargetHandle;
    fn measure_overflow(&self, target: TargetHandle) -> bool;
    /// Width of a classic scrollbar, in pixels.
    fn measure_scrollbar_compensation(&self) -> f64;
    fn trailing_inset(&self, target: TargetHandle) -> String;
    fn set_trailing_inset(&self, target: TargetHandle, value: &str);
    fn set_lock_marker(&self, target: TargetHandle, on: bool);
}
