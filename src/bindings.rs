//! JavaScript API.
//!
//! ```js
//! import init, { Movia, configureMovia } from "movia";
//! await init();
//! configureMovia({ defaultCssClass: "rounded" });
//! const dialog = new Movia({ templateId: "tpl-login", footer: true });
//! dialog.addFooterButton("Cancel", "btn", () => dialog.close());
//! dialog.open();
//! ```
//!
//! Every modal created from JavaScript lives in one thread-local context
//! backed by the DOM adapter.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{console, Element, HtmlElement};

use crate::config::{ClassNames, MoviaOptions, MoviaSettings};
use crate::context::MoviaContext;
use crate::dom::DomAdapter;
use crate::error::MoviaError;
use crate::footer::FooterButton;
use crate::label::Label;
use crate::movia::{Callback, Movia};
use crate::surface::{LockTarget, ScrollLockHost};

#[derive(Clone)]
struct Runtime {
    ctx: MoviaContext,
    dom: Rc<DomAdapter>,
}

thread_local! {
    static RUNTIME: RefCell<Option<Runtime>> = RefCell::new(None);
}

fn runtime() -> Result<Runtime, JsValue> {
    RUNTIME.with(|slot| {
        if let Some(rt) = slot.borrow().as_ref() {
            return Ok(rt.clone());
        }
        let dom = Rc::new(DomAdapter::new()?);
        let rt = Runtime {
            ctx: MoviaContext::new(dom.clone()),
            dom,
        };
        *slot.borrow_mut() = Some(rt.clone());
        Ok(rt)
    })
}

fn to_js(err: MoviaError) -> JsValue {
    JsError::new(&err.to_string()).into()
}

fn js_error(err: JsValue) -> anyhow::Error {
    let message = err
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{:?}", err));
    anyhow::anyhow!(message)
}

fn get(obj: &JsValue, key: &str) -> JsValue {
    Reflect::get(obj, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn js_callback(f: Function) -> Callback {
    Rc::new(move || f.call0(&JsValue::NULL).map(|_| ()).map_err(js_error))
}

fn callback_field(obj: &JsValue, key: &str) -> Option<Callback> {
    get(obj, key).dyn_into::<Function>().ok().map(js_callback)
}

fn label_from_js(value: JsValue) -> Label {
    if let Some(text) = value.as_string() {
        return Label::Text(text);
    }
    if let Some(el) = value.dyn_ref::<Element>() {
        return Label::Element(el.outer_html());
    }
    if let Some(f) = value.dyn_ref::<Function>() {
        let f = f.clone();
        return Label::producer(move || {
            let produced = f.call0(&JsValue::NULL).map_err(js_error)?;
            Ok(label_from_js(produced))
        });
    }
    let text = js_sys::JSON::stringify(&value)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_default();
    Label::Text(text)
}

fn class_names(value: JsValue) -> Vec<String> {
    if value.is_undefined() || value.is_null() {
        return Vec::new();
    }
    match serde_wasm_bindgen::from_value::<ClassNames>(value) {
        Ok(names) => names.into_vec(),
        Err(e) => {
            console::warn_1(&format!("Ignoring footer button classNames: {e}").into());
            Vec::new()
        }
    }
}

fn footer_button(label: JsValue, classes: JsValue, on_click: Option<Function>) -> FooterButton {
    let mut button = FooterButton::new(label_from_js(label)).with_classes(class_names(classes));
    button.on_click = on_click.map(js_callback);
    button
}

/// Element or function lock targets; selectors go through serde.
fn lock_target(value: &JsValue, dom: &Rc<DomAdapter>) -> Option<LockTarget> {
    if let Some(el) = value.dyn_ref::<HtmlElement>() {
        return Some(LockTarget::Handle(dom.register_target(el.clone())));
    }
    let f = value.dyn_ref::<Function>()?.clone();
    let dom = dom.clone();
    Some(LockTarget::Factory(Rc::new(move || {
        let produced = f.call0(&JsValue::NULL).ok()?;
        if let Some(selector) = produced.as_string() {
            return dom.resolve_lock_target(&LockTarget::Selector(selector));
        }
        let el = produced.dyn_into::<HtmlElement>().ok()?;
        Some(dom.register_target(el))
    })))
}

/// Copy of `obj` without `key`, for handing the rest to serde.
fn without(obj: &JsValue, key: &str) -> Result<JsValue, JsValue> {
    let copy = Object::assign(&Object::new(), obj.unchecked_ref());
    Reflect::delete_property(&copy, &JsValue::from_str(key))?;
    Ok(copy.into())
}

fn decode_options(settings: &JsValue, dom: &Rc<DomAdapter>) -> Result<MoviaOptions, JsValue> {
    if settings.is_undefined() || settings.is_null() {
        return Ok(MoviaOptions::default());
    }
    let target = get(settings, "scrollLockTarget");
    let special_target = lock_target(&target, dom);
    let plain = if special_target.is_some() {
        without(settings, "scrollLockTarget")?
    } else {
        settings.clone()
    };

    let decoded: MoviaSettings = serde_wasm_bindgen::from_value(plain)
        .map_err(|e| to_js(MoviaError::InvalidSettings(e.to_string())))?;
    let mut options = decoded.into_options().map_err(to_js)?;
    if special_target.is_some() {
        options.scroll_lock_target = special_target;
    }
    options.on_open = callback_field(settings, "onOpen");
    options.on_close = callback_field(settings, "onClose");
    options.on_ready = callback_field(settings, "onReady");

    if let Ok(buttons) = get(settings, "footerButtons").dyn_into::<Array>() {
        for item in buttons.iter() {
            let on_click = get(&item, "onClick").dyn_into::<Function>().ok();
            options
                .footer_buttons
                .push(footer_button(get(&item, "label"), get(&item, "classNames"), on_click));
        }
    }
    Ok(options)
}

/// Install the panic hook and build the default context.
#[wasm_bindgen]
pub fn init() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    runtime().map(|_| ())
}

/// Apply global defaults.  Returns the keys that were ignored.
#[wasm_bindgen(js_name = configureMovia)]
pub fn configure_movia(config: JsValue) -> Result<JsValue, JsValue> {
    let rt = runtime()?;
    let target = get(&config, "scrollLockTarget");
    let special_target = lock_target(&target, &rt.dom);
    let plain = if special_target.is_some() {
        without(&config, "scrollLockTarget")?
    } else {
        config
    };

    let patch: serde_json::Value = serde_wasm_bindgen::from_value(plain)
        .map_err(|e| to_js(MoviaError::InvalidSettings(e.to_string())))?;
    let rejected = rt.ctx.configure(&patch);
    if special_target.is_some() {
        rt.ctx.update_config(|cfg| cfg.scroll_lock_target = special_target);
    }
    if !rejected.is_empty() {
        console::warn_1(&format!("configureMovia ignored: {}", rejected.join(", ")).into());
    }
    serde_wasm_bindgen::to_value(&rejected).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = Movia)]
pub struct JsMovia {
    inner: Movia,
}

#[wasm_bindgen(js_class = Movia)]
impl JsMovia {
    #[wasm_bindgen(constructor)]
    pub fn new(settings: JsValue) -> Result<JsMovia, JsValue> {
        let rt = runtime()?;
        let options = decode_options(&settings, &rt.dom)?;
        let inner = Movia::new(&rt.ctx, options).map_err(to_js)?;
        Ok(JsMovia { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn id(&self) -> f64 {
        self.inner.id().0 as f64
    }

    #[wasm_bindgen(getter, js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    pub fn open(&self) {
        self.inner.open();
    }

    pub fn close(&self, force: Option<bool>) {
        self.inner.close_with(force.unwrap_or(false));
    }

    pub fn destroy(&self) {
        self.inner.destroy();
    }

    #[wasm_bindgen(js_name = updateContent)]
    pub fn update_content(&self, html: &str) {
        self.inner.update_content(html);
    }

    #[wasm_bindgen(js_name = setFooterContent)]
    pub fn set_footer_content(&self, html: &str) {
        self.inner.set_footer_content(html);
    }

    #[wasm_bindgen(js_name = addFooterButton)]
    pub fn add_footer_button(&self, label: JsValue, class_names: JsValue, on_click: Option<Function>) {
        self.inner
            .add_footer_button(footer_button(label, class_names, on_click));
    }

    #[wasm_bindgen(js_name = setupChildMovia)]
    pub fn setup_child_movia(&self, child: &JsMovia) {
        self.inner.register_child(&child.inner);
    }

    #[wasm_bindgen(setter, js_name = onOpen)]
    pub fn set_on_open(&mut self, f: Option<Function>) {
        self.inner.set_on_open(f.map(js_callback));
    }

    #[wasm_bindgen(setter, js_name = onClose)]
    pub fn set_on_close(&mut self, f: Option<Function>) {
        self.inner.set_on_close(f.map(js_callback));
    }

    #[wasm_bindgen(setter, js_name = onReady)]
    pub fn set_on_ready(&mut self, f: Option<Function>) {
        self.inner.set_on_ready(f.map(js_callback));
    }
}
