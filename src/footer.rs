//! Footer buttons and the buffered footer region.

use std::fmt;
use std::rc::Rc;

use crate::config::normalize_classes;
use crate::constants::{ATTR_FOOTER_BUTTON, CLASS_FOOTER_BUTTON};
use crate::label::{render_label, Label};
use crate::movia::Callback;
use crate::sanitize::escape_html;

/// One button in a modal's footer.
#[derive(Clone)]
pub struct FooterButton {
    pub label: Label,
    pub class_names: Vec<String>,
    pub on_click: Option<Callback>,
}

impl FooterButton {
    pub fn new(label: impl Into<Label>) -> Self {
        Self {
            label: label.into(),
            class_names: Vec::new(),
            on_click: None,
        }
    }

    /// Accepts `["primary", "wide"]` as well as `["primary wide"]`.
    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.class_names = normalize_classes(classes);
        self
    }

    pub fn on_click(mut self, f: impl Fn() -> anyhow::Result<()> + 'static) -> Self {
        self.on_click = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for FooterButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FooterButton")
            .field("label", &self.label)
            .field("class_names", &self.class_names)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

#[derive(Clone)]
struct Entry {
    key: String,
    button: FooterButton,
}

/// Live and pending halves of a footer.
///
/// Until the surface has a footer region (`initialized`), content and
/// buttons are queued in the pending slots; [`FooterState::flush`] moves them
/// over exactly once.  Live content and buttons outlive a surface teardown so
/// a rebuilt surface renders the same footer.
#[derive(Clone, Default)]
pub(crate) struct FooterState {
    content: Option<String>,
    buttons: Vec<Entry>,
    pending_content: Option<String>,
    pending_buttons: Vec<Entry>,
    initialized: bool,
}

impl FooterState {
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn has_label(&self, key: &str) -> bool {
        self.buttons
            .iter()
            .chain(self.pending_buttons.iter())
            .any(|e| e.key == key)
    }

    /// Returns `true` when the live footer changed and must be re-rendered.
    /// A button whose label is already known is dropped silently.
    pub fn add_button(&mut self, button: FooterButton) -> bool {
        let key = button.label.key();
        self.add_keyed(key, button)
    }

    /// [`FooterState::add_button`] with the label key computed by the caller.
    pub fn add_keyed(&mut self, key: String, button: FooterButton) -> bool {
        if self.has_label(&key) {
            return false;
        }
        let entry = Entry { key, button };
        if self.initialized {
            self.buttons.push(entry);
            true
        } else {
            self.pending_buttons.push(entry);
            false
        }
    }

    /// Returns `true` when the live footer changed.
    pub fn set_content(&mut self, html: String) -> bool {
        if self.initialized {
            self.content = Some(html);
            true
        } else {
            self.pending_content = Some(html);
            false
        }
    }

    /// Move pending content and buttons into the live footer.
    pub fn flush(&mut self) {
        if let Some(content) = self.pending_content.take() {
            self.content = Some(content);
        }
        self.buttons.append(&mut self.pending_buttons);
        self.initialized = true;
    }

    /// The footer region is gone; anything added from now on is pending.
    pub fn reset(&mut self) {
        self.pending_content = None;
        self.pending_buttons.clear();
        self.initialized = false;
    }

    pub fn button(&self, index: usize) -> Option<&FooterButton> {
        self.buttons.get(index).map(|e| &e.button)
    }

    pub fn labels(&self) -> Vec<String> {
        self.buttons.iter().map(|e| e.key.clone()).collect()
    }

    pub fn pending_labels(&self) -> Vec<String> {
        self.pending_buttons.iter().map(|e| e.key.clone()).collect()
    }

    pub fn pending_content(&self) -> Option<&str> {
        self.pending_content.as_deref()
    }

    pub fn render(&self, sanitize: &dyn Fn(&str) -> String) -> String {
        let buttons: Vec<&FooterButton> = self.buttons.iter().map(|e| &e.button).collect();
        render_footer(self.content.as_deref(), &buttons, sanitize)
    }
}

/// Footer markup: content first, then buttons in registration order.  Each
/// button carries its index so a delegated click can find it again.
pub fn render_footer(
    content: Option<&str>,
    buttons: &[&FooterButton],
    sanitize: &dyn Fn(&str) -> String,
) -> String {
    let mut html = String::from(content.unwrap_or_default());
    for (index, button) in buttons.iter().enumerate() {
        let mut class = String::from(CLASS_FOOTER_BUTTON);
        for name in &button.class_names {
            class.push(' ');
            class.push_str(&escape_html(name));
        }
        let label = render_label(&button.label, sanitize).to_html();
        html.push_str(&format!(
            "<button type=\"button\" class=\"{class}\" {ATTR_FOOTER_BUTTON}=\"{index}\">{label}</button>"
        ));
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(html: &str) -> String {
        html.to_string()
    }

    #[test]
    fn buttons_are_buffered_until_flush() {
        let mut footer = FooterState::default();
        assert!(!footer.add_button(FooterButton::new("Cancel")));
        assert!(!footer.set_content("<p>Sure?</p>".into()));
        assert_eq!(footer.pending_labels(), vec!["Cancel"]);
        assert!(footer.labels().is_empty());

        footer.flush();
        assert_eq!(footer.labels(), vec!["Cancel"]);
        assert!(footer.pending_labels().is_empty());
        assert!(footer.pending_content().is_none());
        assert!(footer.add_button(FooterButton::new("Ok")));
        assert_eq!(footer.labels(), vec!["Cancel", "Ok"]);
    }

    #[test]
    fn duplicate_labels_are_ignored_across_pending_and_live() {
        let mut footer = FooterState::default();
        footer.add_button(FooterButton::new("Save"));
        footer.flush();
        assert!(!footer.add_button(FooterButton::new("<b>Save</b>")));
        assert!(!footer.add_button(FooterButton::new("  Save ")));
        assert_eq!(footer.labels(), vec!["Save"]);
    }

    #[test]
    fn render_is_content_then_buttons_and_stable() {
        let mut footer = FooterState::default();
        footer.set_content("<small>note</small>".into());
        footer.add_button(FooterButton::new("Ok").with_classes(["primary  wide", ""]));
        footer.add_button(FooterButton::new("&times;"));
        footer.flush();

        let first = footer.render(&identity);
        assert_eq!(
            first,
            "<small>note</small>\
             <button type=\"button\" class=\"movia-footer-button primary wide\" data-movia-button=\"0\"><span>Ok</span></button>\
             <button type=\"button\" class=\"movia-footer-button\" data-movia-button=\"1\">&times;</button>"
        );
        assert_eq!(footer.render(&identity), first);
    }

    #[test]
    fn reset_drops_pending_but_keeps_live_footer() {
        let mut footer = FooterState::default();
        footer.add_button(FooterButton::new("Keep"));
        footer.flush();
        footer.reset();
        footer.add_button(FooterButton::new("Queued"));
        footer.reset();

        assert!(!footer.is_initialized());
        assert!(footer.pending_labels().is_empty());
        assert_eq!(footer.labels(), vec!["Keep"]);
    }
}
