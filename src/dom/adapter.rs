//! `RenderingAdapter` over the browser DOM.
//!
//! Markup per modal:
//!
//! ```text
//! div.movia-backdrop#movia-{id}
//!   div.movia-container.{cssClass...}
//!     button.movia-close          (closeMethods has "button")
//!     div.movia-content
//!     div.movia-footer            (footer: true)
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{console, Document, Element, Event, HtmlElement, HtmlTemplateElement, KeyboardEvent, Window};

use super::utils::{self, defer_drop, Listener};
use crate::constants::{
    ATTR_FOOTER_BUTTON, ATTR_OPEN_CHILD, CLASS_BACKDROP, CLASS_CLOSE_BUTTON, CLASS_CONTAINER,
    CLASS_CONTENT, CLASS_FOOTER, CLASS_SCROLL_LOCKED, CLASS_VISIBLE, CLOSE_BUTTON_LABEL,
    READY_EVENT,
};
use crate::surface::{
    ListenerId, LockTarget, RenderingAdapter, ScrollLockHost, SurfaceHandle, SurfaceHooks,
    SurfaceSpec, TargetHandle,
};
use crate::transition::Completion;

const ROOT: TargetHandle = TargetHandle(0);

struct Surface {
    backdrop: HtmlElement,
    content: Element,
    footer: Option<Element>,
    listeners: Vec<Listener>,
}

pub struct DomAdapter {
    window: Window,
    document: Document,
    next_handle: Cell<u64>,
    surfaces: RefCell<HashMap<SurfaceHandle, Surface>>,
    listeners: RefCell<HashMap<ListenerId, Listener>>,
    targets: RefCell<Vec<(TargetHandle, HtmlElement)>>,
}

impl DomAdapter {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global `window`"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        let body = document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;

        Ok(Self {
            window,
            document,
            next_handle: Cell::new(1),
            surfaces: RefCell::new(HashMap::new()),
            listeners: RefCell::new(HashMap::new()),
            targets: RefCell::new(vec![(ROOT, body)]),
        })
    }

    /// Make `el` usable as a [`LockTarget::Handle`].  Registering the same
    /// element twice returns the same handle.
    pub fn register_target(&self, el: HtmlElement) -> TargetHandle {
        if let Some((handle, _)) = self
            .targets
            .borrow()
            .iter()
            .find(|(_, known)| js_sys::Object::is(known, &el))
        {
            return *handle;
        }
        let handle = TargetHandle(self.handle());
        self.targets.borrow_mut().push((handle, el));
        handle
    }

    fn handle(&self) -> u64 {
        let next = self.next_handle.get();
        self.next_handle.set(next + 1);
        next
    }

    fn target_el(&self, target: TargetHandle) -> Option<HtmlElement> {
        self.targets
            .borrow()
            .iter()
            .find(|(h, _)| *h == target)
            .map(|(_, el)| el.clone())
    }

    fn backdrop(&self, surface: SurfaceHandle) -> Option<HtmlElement> {
        self.surfaces.borrow().get(&surface).map(|s| s.backdrop.clone())
    }

    fn build(&self, spec: &SurfaceSpec<'_>, hooks: SurfaceHooks) -> Result<Surface, JsValue> {
        let doc = &self.document;
        let backdrop: HtmlElement = utils::div(doc, CLASS_BACKDROP)?.dyn_into()?;
        backdrop.set_id(&format!("movia-{}", spec.movia_id));

        let container = utils::div(doc, CLASS_CONTAINER)?;
        for class in spec.css_classes {
            container.class_list().add_1(class)?;
        }

        let mut listeners = Vec::new();
        if spec.close_button {
            let button = doc.create_element("button")?;
            button.set_attribute("type", "button")?;
            button.set_class_name(CLASS_CLOSE_BUTTON);
            button.set_inner_html(CLOSE_BUTTON_LABEL);
            let on_close = hooks.on_close_button.clone();
            listeners.push(Listener::attach(&button, "click", move |_| on_close())?);
            container.append_child(&button)?;
        }

        let content = utils::div(doc, CLASS_CONTENT)?;
        content.set_inner_html(spec.content);
        container.append_child(&content)?;

        let footer = if spec.footer {
            let footer = utils::div(doc, CLASS_FOOTER)?;
            let on_button = hooks.on_footer_button.clone();
            let within = footer.clone();
            listeners.push(Listener::attach(&footer, "click", move |event| {
                let index = utils::closest_attr(&event, ATTR_FOOTER_BUTTON, &within)
                    .and_then(|raw| raw.parse::<usize>().ok());
                if let Some(index) = index {
                    on_button(index);
                }
            })?);
            container.append_child(&footer)?;
            Some(footer)
        } else {
            None
        };

        if let Some(on_overlay) = hooks.on_overlay {
            let el: Element = backdrop.clone().into();
            listeners.push(Listener::attach(&backdrop, "click", move |event| {
                if utils::is_event_on(&event, &el) {
                    on_overlay();
                }
            })?);
        }

        backdrop.append_child(&container)?;
        Ok(Surface {
            backdrop,
            content,
            footer,
            listeners,
        })
    }
}

impl RenderingAdapter for DomAdapter {
    fn template_html(&self, template_id: &str) -> Option<String> {
        let el = self.document.get_element_by_id(template_id)?;
        match el.dyn_into::<HtmlTemplateElement>() {
            Ok(template) => Some(template.inner_html()),
            Err(_) => {
                console::warn_1(&format!("#{template_id} is not a <template>").into());
                None
            }
        }
    }

    fn create_surface(&self, spec: &SurfaceSpec<'_>, hooks: SurfaceHooks) -> SurfaceHandle {
        let handle = SurfaceHandle(self.handle());
        match self.build(spec, hooks) {
            Ok(surface) => {
                self.surfaces.borrow_mut().insert(handle, surface);
            }
            Err(e) => console::error_1(&format!("Failed to build movia {}: {:?}", spec.movia_id, e).into()),
        }
        handle
    }

    fn destroy_surface(&self, surface: SurfaceHandle) {
        let removed = self.surfaces.borrow_mut().remove(&surface);
        if let Some(surface) = removed {
            surface.backdrop.remove();
            for listener in surface.listeners {
                listener.remove();
            }
        }
    }

    fn mount(&self, surface: SurfaceHandle) {
        let (Some(backdrop), Some(body)) = (self.backdrop(surface), self.document.body()) else {
            return;
        };
        if let Err(e) = body.append_child(&backdrop) {
            console::error_1(&format!("Failed to mount movia: {:?}", e).into());
        }
    }

    fn is_mounted(&self, surface: SurfaceHandle) -> bool {
        self.backdrop(surface).map_or(false, |b| b.is_connected())
    }

    fn set_visibility_marker(&self, surface: SurfaceHandle, on: bool) {
        if let Some(backdrop) = self.backdrop(surface) {
            utils::set_class(&backdrop, CLASS_VISIBLE, on);
        }
    }

    fn set_concealed(&self, surface: SurfaceHandle, concealed: bool) {
        if let Some(backdrop) = self.backdrop(surface) {
            let style = backdrop.style();
            let _ = if concealed {
                style.set_property("display", "none")
            } else {
                style.remove_property("display").map(|_| ())
            };
        }
    }

    fn has_content_region(&self, surface: SurfaceHandle) -> bool {
        self.surfaces.borrow().contains_key(&surface)
    }

    fn set_content(&self, surface: SurfaceHandle, html: &str) {
        if let Some(s) = self.surfaces.borrow().get(&surface) {
            s.content.set_inner_html(html);
        }
    }

    fn set_footer(&self, surface: SurfaceHandle, html: &str) {
        if let Some(footer) = self.surfaces.borrow().get(&surface).and_then(|s| s.footer.as_ref()) {
            footer.set_inner_html(html);
        }
    }

    fn scroll_offset(&self, surface: SurfaceHandle) -> f64 {
        self.surfaces
            .borrow()
            .get(&surface)
            .map_or(0.0, |s| f64::from(s.content.scroll_top()))
    }

    fn set_scroll_offset(&self, surface: SurfaceHandle, offset: f64) {
        if let Some(s) = self.surfaces.borrow().get(&surface) {
            s.content.set_scroll_top(offset.round() as i32);
        }
    }

    fn next_frame(&self, callback: Box<dyn FnOnce()>) {
        let frame = Closure::once_into_js(move || callback());
        if let Err(e) = self.window.request_animation_frame(frame.unchecked_ref()) {
            console::error_1(&format!("request_animation_frame failed: {:?}", e).into());
        }
    }

    fn wait_for_transition_settle(
        &self,
        surface: SurfaceHandle,
        fallback_ms: u32,
        callback: Box<dyn FnOnce()>,
    ) {
        let done = Completion::new(callback);
        let Some(backdrop) = self.backdrop(surface) else {
            Timeout::new(0, move || {
                done.resolve();
            })
            .forget();
            return;
        };

        // Whichever side wins clears the other.
        let listener: Rc<RefCell<Option<Listener>>> = Rc::new(RefCell::new(None));
        let timer: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));
        let finish = {
            let (done, listener, timer) = (done.clone(), listener.clone(), timer.clone());
            Rc::new(move || {
                if let Some(l) = listener.borrow_mut().take() {
                    l.remove();
                }
                if let Some(t) = timer.borrow_mut().take() {
                    defer_drop(t);
                }
                done.resolve();
            })
        };

        let on_end = {
            let finish = finish.clone();
            let el: Element = backdrop.clone().into();
            move |event: Event| {
                if utils::is_event_on(&event, &el) {
                    finish();
                }
            }
        };
        match Listener::attach(&backdrop, "transitionend", on_end) {
            Ok(l) => *listener.borrow_mut() = Some(l),
            Err(e) => console::warn_1(&format!("transitionend listener failed: {:?}", e).into()),
        }
        *timer.borrow_mut() = Some(Timeout::new(fallback_ms, move || finish()));
    }

    fn dispatch_ready(&self, surface: SurfaceHandle) {
        let Some(backdrop) = self.backdrop(surface) else {
            return;
        };
        match Event::new(READY_EVENT) {
            Ok(event) => {
                let _ = backdrop.dispatch_event(&event);
            }
            Err(e) => console::warn_1(&format!("Failed to create {READY_EVENT}: {:?}", e).into()),
        }
    }

    fn listen_escape(&self, handler: Rc<dyn Fn()>) -> ListenerId {
        let id = ListenerId(self.handle());
        let attached = Listener::attach(&self.document, "keydown", move |event: Event| {
            let is_escape = event
                .dyn_ref::<KeyboardEvent>()
                .map_or(false, |k| k.key() == "Escape");
            if is_escape {
                handler();
            }
        });
        match attached {
            Ok(listener) => {
                self.listeners.borrow_mut().insert(id, listener);
            }
            Err(e) => console::error_1(&format!("Failed to bind escape: {:?}", e).into()),
        }
        id
    }

    fn listen_child_triggers(&self, surface: SurfaceHandle, handler: Rc<dyn Fn(&str)>) -> ListenerId {
        let id = ListenerId(self.handle());
        let Some(backdrop) = self.backdrop(surface) else {
            return id;
        };
        let within: Element = backdrop.clone().into();
        let attached = Listener::attach(&backdrop, "click", move |event: Event| {
            if let Some(trigger) = utils::closest_attr(&event, ATTR_OPEN_CHILD, &within) {
                handler(&trigger);
            }
        });
        match attached {
            Ok(listener) => {
                self.listeners.borrow_mut().insert(id, listener);
            }
            Err(e) => console::error_1(&format!("Failed to bind child triggers: {:?}", e).into()),
        }
        id
    }

    fn unlisten(&self, listener: ListenerId) {
        let removed = self.listeners.borrow_mut().remove(&listener);
        if let Some(listener) = removed {
            listener.remove();
        }
    }
}

impl ScrollLockHost for DomAdapter {
    fn resolve_lock_target(&self, target: &LockTarget) -> Option<TargetHandle> {
        match target {
            LockTarget::Selector(selector) => {
                let el = self.document.query_selector(selector).ok()??;
                Some(self.register_target(el.dyn_into().ok()?))
            }
            LockTarget::Handle(handle) => self.target_el(*handle).map(|_| *handle),
            LockTarget::Factory(factory) => factory(),
        }
    }

    fn root_target(&self) -> TargetHandle {
        ROOT
    }

    fn measure_overflow(&self, target: TargetHandle) -> bool {
        if target == ROOT {
            let viewport = self
                .window
                .inner_height()
                .ok()
                .and_then(|h| h.as_f64())
                .unwrap_or(0.0);
            return self
                .document
                .document_element()
                .map_or(false, |root| f64::from(root.scroll_height()) > viewport);
        }
        self.target_el(target)
            .map_or(false, |el| el.scroll_height() > el.client_height())
    }

    fn measure_scrollbar_compensation(&self) -> f64 {
        utils::scrollbar_width(&self.document)
    }

    fn trailing_inset(&self, target: TargetHandle) -> String {
        self.target_el(target)
            .and_then(|el| el.style().get_property_value("padding-right").ok())
            .unwrap_or_default()
    }

    fn set_trailing_inset(&self, target: TargetHandle, value: &str) {
        if let Some(el) = self.target_el(target) {
            let style = el.style();
            let _ = if value.is_empty() {
                style.remove_property("padding-right").map(|_| ())
            } else {
                style.set_property("padding-right", value)
            };
        }
    }

    fn set_lock_marker(&self, target: TargetHandle, on: bool) {
        if let Some(el) = self.target_el(target) {
            utils::set_class(&el, CLASS_SCROLL_LOCKED, on);
        }
    }
}
