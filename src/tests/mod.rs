//! Scenario tests driving modals through the recording adapter.

mod lifecycle;
mod properties;

use std::cell::Cell;
use std::rc::Rc;

use crate::config::MoviaOptions;
use crate::context::MoviaContext;
use crate::movia::Movia;
use crate::surface::SurfaceHandle;

pub(crate) use recording_adapter::{RecordingAdapter, ROOT};

pub(crate) fn setup() -> (Rc<RecordingAdapter>, MoviaContext) {
    let adapter = RecordingAdapter::new();
    let ctx = MoviaContext::new(adapter.clone());
    (adapter, ctx)
}

pub(crate) fn modal(ctx: &MoviaContext, options: MoviaOptions) -> Movia {
    Movia::new(ctx, options).unwrap()
}

pub(crate) fn simple(ctx: &MoviaContext, html: &str) -> Movia {
    modal(ctx, MoviaOptions::new().content(html))
}

/// Counter plus a callback that bumps it.
pub(crate) fn counter() -> (Rc<Cell<usize>>, impl Fn() -> anyhow::Result<()> + 'static) {
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    (hits, move || {
        h.set(h.get() + 1);
        Ok(())
    })
}

pub(crate) fn surface_of(movia: &Movia) -> SurfaceHandle {
    movia.surface().expect("movia has a surface")
}
