//! Process-wide defaults and per-modal settings.
//!
//! `GlobalConfig` mirrors the knobs a host page tweaks once at start-up
//! (`configureMovia({...})` on the JS side).  Each key is applied on its own:
//! an unknown key or an ill-typed value is logged and skipped while the rest
//! of the patch still goes through.
//!
//! `MoviaSettings` is the serializable half of a modal's configuration (what a
//! JS caller can express as a plain object); `MoviaOptions` is the full Rust
//! builder that also carries callbacks, footer buttons and lock targets that
//! are not selectors.

use std::rc::Rc;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{MoviaError, Result};
use crate::footer::FooterButton;
use crate::movia::Callback;
use crate::surface::LockTarget;

bitflags::bitflags! {
    /// Which dismissal triggers get wired for a modal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CloseMethods: u8 {
        /// A close button inside the container.
        const BUTTON = 1 << 0;
        /// A click that lands on the backdrop itself.
        const OVERLAY = 1 << 1;
        /// The Escape key, routed to the topmost modal only.
        const ESCAPE = 1 << 2;
    }
}

impl Default for CloseMethods {
    fn default() -> Self {
        CloseMethods::all()
    }
}

impl FromStr for CloseMethods {
    type Err = MoviaError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "button" => Ok(CloseMethods::BUTTON),
            "overlay" => Ok(CloseMethods::OVERLAY),
            "escape" => Ok(CloseMethods::ESCAPE),
            other => Err(MoviaError::UnknownCloseMethod(other.to_string())),
        }
    }
}

impl CloseMethods {
    /// Parse a list of method names (`["button", "escape"]`).
    pub fn parse_list<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .try_fold(CloseMethods::empty(), |acc, name| {
                Ok(acc | name.as_ref().parse::<CloseMethods>()?)
            })
    }
}

/// CSS class names given either as one whitespace-separated string or as a
/// list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ClassNames {
    One(String),
    Many(Vec<String>),
}

impl ClassNames {
    /// Flatten into individual class names, dropping blanks.
    pub fn into_vec(self) -> Vec<String> {
        let raw = match self {
            ClassNames::One(s) => vec![s],
            ClassNames::Many(v) => v,
        };
        normalize_classes(raw)
    }
}

pub(crate) fn normalize_classes<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .flat_map(|s| {
            s.as_ref()
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Process-wide defaults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub default_close_methods: CloseMethods,
    pub default_css_class: Vec<String>,
    pub destroy_on_close: bool,
    pub auto_sanitize: bool,
    pub scroll_lock_target: Option<LockTarget>,
    pub enable_scroll_lock: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_close_methods: CloseMethods::all(),
            default_css_class: Vec::new(),
            destroy_on_close: false,
            auto_sanitize: true,
            scroll_lock_target: None,
            enable_scroll_lock: true,
        }
    }
}

impl GlobalConfig {
    pub const KEYS: [&'static str; 6] = [
        "defaultCloseMethods",
        "defaultCssClass",
        "destroyOnClose",
        "autoSanitize",
        "scrollLockTarget",
        "enableScrollLock",
    ];

    /// Apply a JSON object of overrides.  Returns the keys that were rejected
    /// (unknown or ill-typed); every other key has been applied.
    pub fn apply(&mut self, patch: &Value) -> Vec<String> {
        let Some(map) = patch.as_object() else {
            warn!(patch = %patch, "movia config must be an object; ignored");
            return Vec::new();
        };

        let mut rejected = Vec::new();
        for (key, value) in map {
            let outcome = match key.as_str() {
                "defaultCloseMethods" => decode::<Vec<String>>(value)
                    .and_then(|names| CloseMethods::parse_list(names).map_err(|e| e.to_string()))
                    .map(|methods| self.default_close_methods = methods),
                "defaultCssClass" => {
                    decode::<ClassNames>(value).map(|c| self.default_css_class = c.into_vec())
                }
                "destroyOnClose" => decode::<bool>(value).map(|b| self.destroy_on_close = b),
                "autoSanitize" => decode::<bool>(value).map(|b| self.auto_sanitize = b),
                "scrollLockTarget" => decode::<Option<String>>(value)
                    .map(|sel| self.scroll_lock_target = sel.map(LockTarget::Selector)),
                "enableScrollLock" => decode::<bool>(value).map(|b| self.enable_scroll_lock = b),
                _ => {
                    warn!(%key, "unknown movia config key ignored");
                    rejected.push(key.clone());
                    continue;
                }
            };

            if let Err(reason) = outcome {
                warn!(%key, %reason, "invalid value for movia config key ignored");
                rejected.push(key.clone());
            }
        }
        rejected
    }
}

fn decode<T: for<'de> Deserialize<'de>>(value: &Value) -> std::result::Result<T, String> {
    serde_json::from_value(value.clone()).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Per-modal settings
// ---------------------------------------------------------------------------

/// Plain-data settings for one modal, as sent from JavaScript.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MoviaSettings {
    pub template_id: Option<String>,
    pub content: Option<String>,
    pub close_methods: Option<Vec<String>>,
    pub destroy_on_close: Option<bool>,
    pub footer: bool,
    pub css_class: Option<ClassNames>,
    pub enable_scroll_lock: Option<bool>,
    pub preserve_scroll_position: Option<bool>,
    pub scroll_lock_target: Option<String>,
}

impl MoviaSettings {
    pub fn from_json(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|e| MoviaError::InvalidSettings(e.to_string()))
    }

    pub fn into_options(self) -> Result<MoviaOptions> {
        let close_methods = match self.close_methods {
            Some(names) => Some(CloseMethods::parse_list(names)?),
            None => None,
        };
        Ok(MoviaOptions {
            template_id: self.template_id,
            content: self.content,
            close_methods,
            destroy_on_close: self.destroy_on_close,
            footer: self.footer,
            css_class: self.css_class.map(ClassNames::into_vec),
            enable_scroll_lock: self.enable_scroll_lock,
            preserve_scroll_position: self.preserve_scroll_position,
            scroll_lock_target: self.scroll_lock_target.map(LockTarget::Selector),
            ..MoviaOptions::default()
        })
    }
}

/// Builder for a modal.  Unset fields fall back to the context's
/// [`GlobalConfig`] when the modal is constructed.
#[derive(Clone, Default)]
pub struct MoviaOptions {
    pub template_id: Option<String>,
    pub content: Option<String>,
    pub close_methods: Option<CloseMethods>,
    pub destroy_on_close: Option<bool>,
    pub footer: bool,
    pub css_class: Option<Vec<String>>,
    pub footer_buttons: Vec<FooterButton>,
    pub enable_scroll_lock: Option<bool>,
    pub preserve_scroll_position: Option<bool>,
    pub scroll_lock_target: Option<LockTarget>,
    pub on_open: Option<Callback>,
    pub on_close: Option<Callback>,
    pub on_ready: Option<Callback>,
}

impl MoviaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, html: impl Into<String>) -> Self {
        self.content = Some(html.into());
        self
    }

    pub fn template(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn close_methods(mut self, methods: CloseMethods) -> Self {
        self.close_methods = Some(methods);
        self
    }

    pub fn destroy_on_close(mut self, destroy: bool) -> Self {
        self.destroy_on_close = Some(destroy);
        self
    }

    pub fn footer(mut self, enabled: bool) -> Self {
        self.footer = enabled;
        self
    }

    pub fn css_class<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.css_class = Some(normalize_classes(classes));
        self
    }

    pub fn footer_button(mut self, button: FooterButton) -> Self {
        self.footer_buttons.push(button);
        self
    }

    pub fn scroll_lock(mut self, enabled: bool) -> Self {
        self.enable_scroll_lock = Some(enabled);
        self
    }

    pub fn preserve_scroll_position(mut self, preserve: bool) -> Self {
        self.preserve_scroll_position = Some(preserve);
        self
    }

    pub fn scroll_lock_target(mut self, target: LockTarget) -> Self {
        self.scroll_lock_target = Some(target);
        self
    }

    pub fn on_open(mut self, f: impl Fn() -> anyhow::Result<()> + 'static) -> Self {
        self.on_open = Some(Rc::new(f));
        self
    }

    pub fn on_close(mut self, f: impl Fn() -> anyhow::Result<()> + 'static) -> Self {
        self.on_close = Some(Rc::new(f));
        self
    }

    pub fn on_ready(mut self, f: impl Fn() -> anyhow::Result<()> + 'static) -> Self {
        self.on_ready = Some(Rc::new(f));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn close_methods_parse_names() {
        let m = CloseMethods::parse_list(["button", "Escape"]).unwrap();
        assert_eq!(m, CloseMethods::BUTTON | CloseMethods::ESCAPE);
        assert!(matches!(
            CloseMethods::parse_list(["swipe"]),
            Err(MoviaError::UnknownCloseMethod(name)) if name == "swipe"
        ));
    }

    #[test]
    fn unknown_keys_are_rejected_but_valid_keys_apply() {
        let mut cfg = GlobalConfig::default();
        let rejected = cfg.apply(&json!({
            "destroyOnClose": true,
            "theme": "dark",
            "autoSanitize": "yes",
            "defaultCssClass": "wide  rounded",
        }));

        assert!(cfg.destroy_on_close);
        assert!(cfg.auto_sanitize, "ill-typed value must not be applied");
        assert_eq!(cfg.default_css_class, vec!["wide", "rounded"]);
        let mut rejected = rejected;
        rejected.sort();
        assert_eq!(rejected, vec!["autoSanitize".to_string(), "theme".to_string()]);
    }

    #[test]
    fn scroll_lock_target_accepts_selector_or_null() {
        let mut cfg = GlobalConfig::default();
        assert!(cfg.apply(&json!({ "scrollLockTarget": "#app" })).is_empty());
        assert!(matches!(&cfg.scroll_lock_target, Some(LockTarget::Selector(s)) if s == "#app"));

        assert!(cfg.apply(&json!({ "scrollLockTarget": null })).is_empty());
        assert!(cfg.scroll_lock_target.is_none());
    }

    #[test]
    fn default_close_methods_rejects_unknown_names() {
        let mut cfg = GlobalConfig::default();
        let rejected = cfg.apply(&json!({ "defaultCloseMethods": ["button", "swipe"] }));
        assert_eq!(rejected, vec!["defaultCloseMethods".to_string()]);
        assert_eq!(cfg.default_close_methods, CloseMethods::all());
    }

    #[test]
    fn settings_decode_from_camel_case() {
        let settings = MoviaSettings::from_json(&json!({
            "templateId": "tpl-login",
            "closeMethods": ["overlay"],
            "cssClass": ["a", " ", "b c"],
            "footer": true,
            "onOpen": "ignored",
        }))
        .unwrap();
        let opts = settings.into_options().unwrap();
        assert_eq!(opts.template_id.as_deref(), Some("tpl-login"));
        assert_eq!(opts.close_methods, Some(CloseMethods::OVERLAY));
        assert_eq!(opts.css_class.unwrap(), vec!["a", "b", "c"]);
        assert!(opts.footer);
    }
}
