//! Button labels and how they turn into markup.

use std::fmt;
use std::rc::Rc;

use crate::constants::MAX_LABEL_DEPTH;
use crate::sanitize::{escape_html, text_content};

/// What a caller may use as a button label.
#[derive(Clone)]
pub enum Label {
    /// Plain text, or markup when it contains `<`/`>` (sanitized), or a lone
    /// character reference such as `&times;`.
    Text(String),
    /// Pre-built markup, emitted verbatim.
    Element(String),
    /// Called at render time.  A failure is rendered as its message.
    Producer(Rc<dyn Fn() -> anyhow::Result<Label>>),
}

impl Label {
    pub fn producer(f: impl Fn() -> anyhow::Result<Label> + 'static) -> Self {
        Label::Producer(Rc::new(f))
    }

    /// Key used to de-duplicate footer buttons: the trimmed text a user
    /// would read on the button.  Labels without text (icons) are keyed by
    /// their markup.  Producers are keyed by identity and not called here;
    /// they run only when the footer renders.
    pub fn key(&self) -> String {
        match self {
            Label::Text(s) | Label::Element(s) => {
                let text = text_content(s).trim().to_string();
                if text.is_empty() {
                    s.trim().to_string()
                } else {
                    text
                }
            }
            Label::Producer(f) => format!("producer@{:p}", Rc::as_ptr(f) as *const ()),
        }
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Label::Element(s) => f.debug_tuple("Element").field(s).finish(),
            Label::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Text(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Text(s)
    }
}

/// A label ready to be placed inside a button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Renderable {
    Text(String),
    Markup(String),
}

impl Renderable {
    pub fn to_html(&self) -> String {
        match self {
            Renderable::Text(t) => format!("<span>{}</span>", escape_html(t)),
            Renderable::Markup(m) => m.clone(),
        }
    }
}

/// Resolve a label.  `sanitize` is applied to markup coming from text
/// labels only; `Element` labels are trusted.
pub fn render_label(label: &Label, sanitize: &dyn Fn(&str) -> String) -> Renderable {
    render_at(label, sanitize, 0)
}

fn render_at(label: &Label, sanitize: &dyn Fn(&str) -> String, depth: usize) -> Renderable {
    match label {
        Label::Element(markup) => Renderable::Markup(markup.clone()),
        Label::Producer(_) if depth >= MAX_LABEL_DEPTH => {
            tracing::warn!("label producers nested too deeply; rendering empty label");
            Renderable::Text(String::new())
        }
        Label::Producer(f) => match f() {
            Ok(inner) => render_at(&inner, sanitize, depth + 1),
            Err(err) => {
                tracing::debug!(error = %err, "label producer failed; rendering its message");
                Renderable::Text(err.to_string())
            }
        },
        Label::Text(text) if is_char_reference(text) => Renderable::Markup(text.clone()),
        Label::Text(text) if !text.contains(|c: char| c == '<' || c == '>') => Renderable::Text(text.clone()),
        Label::Text(markup) => Renderable::Markup(format!("<span>{}</span>", sanitize(markup))),
    }
}

/// `&times;`, `&#215;`, `&nbsp` ...
fn is_char_reference(s: &str) -> bool {
    let Some(body) = s.strip_prefix('&') else {
        return false;
    };
    let body = body.strip_suffix(';').unwrap_or(body);
    let body = body.strip_prefix('#').unwrap_or(body);
    !body.is_empty() && body.chars().all(|c| c.is_ascii_alphanumeric())
}
