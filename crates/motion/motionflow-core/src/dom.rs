//! Host document seam.
//!
//! The core never touches a real DOM. Adapters (the wasm crate, test fakes)
//! implement [`Document`] and forward [`HostEvent`]s; every effect reads
//! geometry and attributes through it and writes styles, classes, text and
//! structure back through it.

use serde::{Deserialize, Serialize};

use crate::ids::ElementId;

/// Viewport-relative bounding rectangle, as returned by
/// `getBoundingClientRect()`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Extent along the ticker motion axis.
    #[inline]
    pub fn extent(&self, horizontal: bool) -> f64 {
        if horizontal {
            self.width
        } else {
            self.height
        }
    }
}

/// Window metrics sampled at the time of the call.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_y: f64,
    pub device_pixel_ratio: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            scroll_y: 0.0,
            device_pixel_ratio: 1.0,
        }
    }
}

/// Media features the effects consult at construction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaFeatures {
    /// `(prefers-reduced-motion: reduce)`
    pub reduced_motion: bool,
    /// `(hover: hover)`
    pub can_hover: bool,
}

/// One observed DOM mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MutationRecord {
    Attributes {
        target: ElementId,
        name: String,
    },
    ChildList {
        target: ElementId,
        added: Vec<ElementId>,
        removed: Vec<ElementId>,
    },
}

/// Host notifications forwarded into the core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HostEvent {
    Scroll,
    Resize,
    Mutations(Vec<MutationRecord>),
    /// `document.visibilitychange`; the new state is read from
    /// [`Document::is_hidden`].
    VisibilityChange,
    PointerEnter(ElementId),
    PointerLeave(ElementId),
    AnimationEnd(ElementId),
    /// `document.fonts.ready` resolved.
    FontsReady,
    /// Every image below the element settled (loaded or errored).
    ImagesSettled(ElementId),
}

/// Everything the effects need from the host document.
///
/// Methods mirror the small slice of the DOM the effects use. Implementations
/// must tolerate unknown or detached ids (return empty/default values and
/// ignore writes).
pub trait Document {
    /// High resolution timestamp in milliseconds (`performance.now()`).
    fn now(&self) -> f64;

    fn viewport(&self) -> Viewport;
    fn media(&self) -> MediaFeatures;
    /// `document.hidden`
    fn is_hidden(&self) -> bool;

    fn body(&self) -> ElementId;

    /// All connected elements carrying `attr`, in document order.
    fn query_attr(&self, attr: &str) -> Vec<ElementId>;
    /// Element children in order.
    fn children(&self, el: ElementId) -> Vec<ElementId>;
    fn is_connected(&self, el: ElementId) -> bool;
    /// True when `el` or one of its descendants carries `attr`.
    fn subtree_has_attr(&self, el: ElementId, attr: &str) -> bool;

    fn attr(&self, el: ElementId, name: &str) -> Option<String>;
    fn has_attr(&self, el: ElementId, name: &str) -> bool {
        self.attr(el, name).is_some()
    }
    fn set_attr(&mut self, el: ElementId, name: &str, value: &str);
    fn remove_attr(&mut self, el: ElementId, name: &str);

    fn has_class(&self, el: ElementId, class: &str) -> bool;
    fn add_class(&mut self, el: ElementId, class: &str);
    fn remove_class(&mut self, el: ElementId, class: &str);
    fn toggle_class(&mut self, el: ElementId, class: &str, on: bool) {
        if on {
            self.add_class(el, class);
        } else {
            self.remove_class(el, class);
        }
    }

    /// Sets an inline style property (`transform`, `will-change`, `--mf-*`).
    /// An empty value clears it.
    fn set_style(&mut self, el: ElementId, prop: &str, value: &str);
    fn remove_style(&mut self, el: ElementId, prop: &str) {
        self.set_style(el, prop, "");
    }

    fn text(&self, el: ElementId) -> String;
    /// Replaces all children with a single text node.
    fn set_text(&mut self, el: ElementId, text: &str);
    fn inner_html(&self, el: ElementId) -> String;
    fn set_inner_html(&mut self, el: ElementId, html: &str);

    fn create_element(&mut self, tag: &str) -> ElementId;
    fn append_child(&mut self, parent: ElementId, child: ElementId);
    /// Detaches every child (`el.innerHTML = ""` without destroying them).
    fn clear_children(&mut self, el: ElementId);
    /// Deep clone; the clone is detached until appended.
    fn clone_node(&mut self, el: ElementId) -> ElementId;

    fn rect(&self, el: ElementId) -> Rect;
    /// Forces a synchronous layout (`el.offsetHeight`), used to restart CSS
    /// transitions and animations.
    fn force_reflow(&mut self, el: ElementId);

    /// Start delivering [`HostEvent::PointerEnter`]/[`HostEvent::PointerLeave`] for `el`.
    fn listen_hover(&mut self, el: ElementId);
    fn unlisten_hover(&mut self, el: ElementId);
    /// Start delivering [`HostEvent::AnimationEnd`] for `el`.
    fn listen_animation_end(&mut self, el: ElementId);
    fn unlisten_animation_end(&mut self, el: ElementId);

    /// Returns false when the element holds no images; otherwise the host
    /// later delivers [`HostEvent::ImagesSettled`] once for it.
    fn await_images(&mut self, el: ElementId) -> bool;
    /// Returns false when the host has no font loading API; otherwise it
    /// later delivers [`HostEvent::FontsReady`].
    fn await_fonts(&mut self) -> bool;
}

/// Formats a pixel quantity the way JavaScript stringifies numbers in style
/// values (no trailing `.0`, no negative zero).
pub fn css_number(v: f64) -> String {
    if v == 0.0 || !v.is_finite() {
        return "0".to_string();
    }
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
