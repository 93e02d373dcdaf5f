//! Small DOM helpers used by the adapter.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, Node};

/// An event listener that stays registered until [`Listener::remove`].
pub(crate) struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn attach(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            closure,
        })
    }

    /// Unregister now, free the closure later: the listener may be the one
    /// currently running.
    pub fn remove(self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
        defer_drop(self.closure);
    }
}

/// Drop `value` on a later turn of the event loop.
pub(crate) fn defer_drop<T: 'static>(value: T) {
    spawn_local(async move { drop(value) });
}

pub(crate) fn div(document: &Document, class: &str) -> Result<Element, JsValue> {
    let el = document.create_element("div")?;
    el.set_class_name(class);
    Ok(el)
}

pub(crate) fn set_class(el: &Element, class: &str, on: bool) {
    let list = el.class_list();
    let _ = if on { list.add_1(class) } else { list.remove_1(class) };
}

/// Nearest ancestor-or-self of the event target carrying `attr`, limited to
/// elements inside `within`.
pub(crate) fn closest_attr(event: &Event, attr: &str, within: &Element) -> Option<String> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let hit = target.closest(&format!("[{attr}]")).ok()??;
    let node: &Node = &hit;
    if !within.contains(Some(node)) {
        return None;
    }
    hit.get_attribute(attr)
}

pub(crate) fn is_event_on(event: &Event, el: &Element) -> bool {
    event
        .target()
        .map_or(false, |t| js_sys::Object::is(&t, el))
}

/// Width of a classic scrollbar, measured with an off-screen probe.
pub(crate) fn scrollbar_width(document: &Document) -> f64 {
    let Some(body) = document.body() else {
        return 0.0;
    };
    let probe = match document
        .create_element("div")
        .and_then(|el| el.dyn_into::<HtmlElement>().map_err(JsValue::from))
    {
        Ok(probe) => probe,
        Err(_) => return 0.0,
    };
    let _ = probe.set_attribute(
        "style",
        "overflow:scroll;position:absolute;top:-9999px;width:100px;height:100px",
    );
    if body.append_child(&probe).is_err() {
        return 0.0;
    }
    let width = probe.offset_width() - probe.client_width();
    probe.remove();
    f64::from(width.max(0))
}
