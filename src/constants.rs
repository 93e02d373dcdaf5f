// Markup hooks shared by the DOM adapter and the footer renderer.
pub const CLASS_BACKDROP: &str = "movia-backdrop";
pub const CLASS_CONTAINER: &str = "movia-container";
pub const CLASS_CONTENT: &str = "movia-content";
pub const CLASS_FOOTER: &str = "movia-footer";
pub const CLASS_CLOSE_BUTTON: &str = "movia-close";
pub const CLASS_FOOTER_BUTTON: &str = "movia-footer-button";

/// Marker class that drives the CSS reveal transition.
pub const CLASS_VISIBLE: &str = "show";

/// Marker class put on the scroll-lock target while a modal owns it.
pub const CLASS_SCROLL_LOCKED: &str = "no-scroll";

/// Attribute carried by triggers that open a registered child modal.
pub const ATTR_OPEN_CHILD: &str = "data-open-movia";

/// Attribute carrying a footer button's index in the rendered footer.
pub const ATTR_FOOTER_BUTTON: &str = "data-movia-button";

pub const READY_EVENT: &str = "movia:ready";

/// Upper bound on how long a transition may take before we stop waiting
/// for `transitionend`.
pub const TRANSITION_FALLBACK_MS: u32 = 350;

/// Label producers may return producers; stop unwrapping after this many.
pub const MAX_LABEL_DEPTH: usize = 8;

pub const CLOSE_BUTTON_LABEL: &str = "&times;";
