//! In-memory [`Document`] for tests.
//!
//! Layout is deliberately tiny:
//! - an explicit rect (document coordinates) always wins;
//! - an element without one whose parent has an explicit rect fills it;
//! - otherwise an element spans its element children, laid out in a row
//!   (widths add up) or, with `flex-direction: column`, in a column;
//! - leaves without a rect are empty.
//!
//! Rects are reported relative to the viewport, so scrolling moves them.

use std::collections::{HashMap, HashSet};

use motionflow_core::ids::IdAllocator;
use motionflow_core::{Document, ElementId, MediaFeatures, Rect, Viewport};

use crate::markup;

const VOID_TAGS: [&str; 4] = ["img", "br", "hr", "input"];

#[derive(Clone, Debug)]
pub(crate) enum Kind {
    Element(String),
    Text(String),
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) kind: Kind,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) classes: Vec<String>,
    pub(crate) styles: Vec<(String, String)>,
    pub(crate) rect: Option<Rect>,
}

impl Node {
    fn element(tag: &str) -> Self {
        Self {
            kind: Kind::Element(tag.to_ascii_lowercase()),
            parent: None,
            children: Vec::new(),
            attrs: Vec::new(),
            classes: Vec::new(),
            styles: Vec::new(),
            rect: None,
        }
    }

    fn text(text: &str) -> Self {
        Self {
            kind: Kind::Text(text.to_string()),
            ..Self::element("#text")
        }
    }

    pub(crate) fn tag(&self) -> Option<&str> {
        match &self.kind {
            Kind::Element(tag) => Some(tag),
            Kind::Text(_) => None,
        }
    }

    fn style(&self, prop: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(k, _)| k == prop)
            .map(|(_, v)| v.as_str())
    }
}

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

#[derive(Debug)]
pub struct FakeDocument {
    now: f64,
    viewport: Viewport,
    media: MediaFeatures,
    hidden: bool,
    ids: IdAllocator,
    nodes: HashMap<ElementId, Node>,
    body: ElementId,
    hover: HashSet<ElementId>,
    animation_end: HashSet<ElementId>,
    font_api: bool,
    font_waits: usize,
    image_waits: Vec<ElementId>,
    reflows: usize,
}

impl Default for FakeDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDocument {
    /// Empty `<body>` in a 1280x800 viewport at t = 0.
    pub fn new() -> Self {
        let mut ids = IdAllocator::new();
        let body = ids.alloc_element();
        let mut nodes = HashMap::new();
        nodes.insert(body, Node::element("body"));
        Self {
            now: 0.0,
            viewport: Viewport::default(),
            media: MediaFeatures::default(),
            hidden: false,
            ids,
            nodes,
            body,
            hover: HashSet::new(),
            animation_end: HashSet::new(),
            font_api: false,
            font_waits: 0,
            image_waits: Vec::new(),
            reflows: 0,
        }
    }

    /// Document whose body holds `html`.
    pub fn from_html(html: &str) -> Self {
        let mut doc = Self::new();
        let body = doc.body;
        doc.append_html(body, html);
        doc
    }

    // --- building ---

    pub(crate) fn insert(&mut self, node: Node) -> ElementId {
        let id = self.ids.alloc_element();
        self.nodes.insert(id, node);
        id
    }

    pub(crate) fn node(&self, id: ElementId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub(crate) fn push_text(&mut self, parent: ElementId, text: &str) {
        if text.is_empty() {
            return;
        }
        let id = self.insert(Node::text(text));
        self.append_child(parent, id);
    }

    /// Appends a new element under `parent`.
    pub fn add(&mut self, parent: ElementId, tag: &str) -> ElementId {
        let id = self.create_element(tag);
        self.append_child(parent, id);
        id
    }

    /// Appends a new element with attributes under `parent`.
    pub fn add_with(&mut self, parent: ElementId, tag: &str, attrs: &[(&str, &str)]) -> ElementId {
        let id = self.add(parent, tag);
        for (k, v) in attrs {
            self.set_attr(id, k, v);
        }
        id
    }

    /// Parses `html` and appends the result to `parent`. Returns the new
    /// top-level elements.
    pub fn append_html(&mut self, parent: ElementId, html: &str) -> Vec<ElementId> {
        markup::parse_into(self, parent, html)
    }

    /// Detaches `el` from its parent.
    pub fn remove(&mut self, el: ElementId) {
        self.detach(el);
    }

    pub fn set_rect(&mut self, el: ElementId, rect: Rect) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.rect = Some(rect);
        }
    }

    /// Moves an element with an explicit rect to `top` (document
    /// coordinates).
    pub fn move_to(&mut self, el: ElementId, top: f64) {
        if let Some(rect) = self.nodes.get_mut(&el).and_then(|n| n.rect.as_mut()) {
            rect.top = top;
        }
    }

    // --- environment ---

    pub fn set_now(&mut self, now: f64) {
        self.now = now;
    }

    pub fn advance(&mut self, ms: f64) {
        self.now += ms;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn set_scroll(&mut self, scroll_y: f64) {
        self.viewport.scroll_y = scroll_y;
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport.width = width;
    }

    pub fn set_media(&mut self, media: MediaFeatures) {
        self.media = media;
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Whether `await_fonts` reports a font loading API.
    pub fn set_font_api(&mut self, available: bool) {
        self.font_api = available;
    }

    // --- inspection ---

    pub fn style(&self, el: ElementId, prop: &str) -> Option<String> {
        self.node(el).and_then(|n| n.style(prop)).map(str::to_string)
    }

    pub fn classes(&self, el: ElementId) -> Vec<String> {
        self.node(el).map(|n| n.classes.clone()).unwrap_or_default()
    }

    pub fn tag(&self, el: ElementId) -> Option<String> {
        self.node(el).and_then(|n| n.tag()).map(str::to_string)
    }

    pub fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.node(el).and_then(|n| n.parent)
    }

    /// Connected elements carrying `class`, in document order.
    pub fn query_class(&self, class: &str) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.walk(self.body, &mut |id, node| {
            if node.classes.iter().any(|c| c == class) {
                out.push(id);
            }
        });
        out
    }

    pub fn is_hover_listening(&self, el: ElementId) -> bool {
        self.hover.contains(&el)
    }

    pub fn is_animation_end_listening(&self, el: ElementId) -> bool {
        self.animation_end.contains(&el)
    }

    pub fn reflows(&self) -> usize {
        self.reflows
    }

    pub fn font_waits(&self) -> usize {
        self.font_waits
    }

    pub fn image_waits(&self) -> &[ElementId] {
        &self.image_waits
    }

    // --- internals ---

    fn detach(&mut self, el: ElementId) {
        let Some(parent) = self.nodes.get_mut(&el).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != el);
        }
    }

    /// Pre-order walk over connected elements (text nodes skipped).
    fn walk(&self, from: ElementId, f: &mut dyn FnMut(ElementId, &Node)) {
        let Some(node) = self.node(from) else {
            return;
        };
        if node.tag().is_none() {
            return;
        }
        f(from, node);
        for child in &node.children {
            self.walk(*child, f);
        }
    }

    fn layout(&self, el: ElementId) -> Rect {
        let Some(node) = self.node(el) else {
            return Rect::default();
        };
        if let Some(rect) = node.rect {
            return rect;
        }
        if let Some(rect) = node.parent.and_then(|p| self.node(p)).and_then(|p| p.rect) {
            return rect;
        }
        let column = node.style("flex-direction") == Some("column");
        let mut rects = node
            .children
            .iter()
            .filter(|c| self.node(**c).is_some_and(|n| n.tag().is_some()))
            .map(|c| self.layout(*c));
        let Some(first) = rects.next() else {
            return Rect::default();
        };
        rects.fold(first, |acc, r| {
            if column {
                Rect::new(acc.top, acc.left, acc.width.max(r.width), acc.height + r.height)
            } else {
                Rect::new(acc.top, acc.left, acc.width + r.width, acc.height.max(r.height))
            }
        })
    }

    fn deep_clone(&mut self, el: ElementId) -> ElementId {
        let Some(node) = self.node(el).cloned() else {
            return self.create_element("div");
        };
        let children = node.children.clone();
        let copy = self.insert(Node {
            parent: None,
            children: Vec::new(),
            ..node
        });
        for child in children {
            let c = self.deep_clone(child);
            self.append_child(copy, c);
        }
        copy
    }
}

impl Document for FakeDocument {
    fn now(&self) -> f64 {
        self.now
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn media(&self) -> MediaFeatures {
        self.media
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn body(&self) -> ElementId {
        self.body
    }

    fn query_attr(&self, attr: &str) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.walk(self.body, &mut |id, node| {
            if node.attrs.iter().any(|(k, _)| k == attr) {
                out.push(id);
            }
        });
        out
    }

    fn children(&self, el: ElementId) -> Vec<ElementId> {
        self.node(el)
            .map(|n| {
                n.children
                    .iter()
                    .copied()
                    .filter(|c| self.node(*c).is_some_and(|n| n.tag().is_some()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn is_connected(&self, el: ElementId) -> bool {
        let mut cur = Some(el);
        while let Some(id) = cur {
            if id == self.body {
                return true;
            }
            cur = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn subtree_has_attr(&self, el: ElementId, attr: &str) -> bool {
        let mut found = false;
        self.walk(el, &mut |_, node| {
            found |= node.attrs.iter().any(|(k, _)| k == attr);
        });
        found
    }

    fn attr(&self, el: ElementId, name: &str) -> Option<String> {
        let node = self.node(el)?;
        if name == "class" {
            return (!node.classes.is_empty()).then(|| node.classes.join(" "));
        }
        node.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    fn set_attr(&mut self, el: ElementId, name: &str, value: &str) {
        let Some(node) = self.nodes.get_mut(&el) else {
            return;
        };
        match node.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => node.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attr(&mut self, el: ElementId, name: &str) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.attrs.retain(|(k, _)| k != name);
        }
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.node(el).is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn add_class(&mut self, el: ElementId, class: &str) {
        if let Some(node) = self.nodes.get_mut(&el) {
            if !node.classes.iter().any(|c| c == class) {
                node.classes.push(class.to_string());
            }
        }
    }

    fn remove_class(&mut self, el: ElementId, class: &str) {
        if let Some(node) = self.nodes.get_mut(&el) {
            node.classes.retain(|c| c != class);
        }
    }

    fn set_style(&mut self, el: ElementId, prop: &str, value: &str) {
        let Some(node) = self.nodes.get_mut(&el) else {
            return;
        };
        if value.is_empty() {
            node.styles.retain(|(k, _)| k != prop);
            return;
        }
        match node.styles.iter_mut().find(|(k, _)| k == prop) {
            Some((_, v)) => *v = value.to_string(),
            None => node.styles.push((prop.to_string(), value.to_string())),
        }
    }

    fn text(&self, el: ElementId) -> String {
        let Some(node) = self.node(el) else {
            return String::new();
        };
        match &node.kind {
            Kind::Text(t) => t.clone(),
            Kind::Element(_) => node.children.iter().map(|c| self.text(*c)).collect(),
        }
    }

    fn set_text(&mut self, el: ElementId, text: &str) {
        self.clear_children(el);
        self.push_text(el, text);
    }

    fn inner_html(&self, el: ElementId) -> String {
        markup::serialize_children(self, el)
    }

    fn set_inner_html(&mut self, el: ElementId, html: &str) {
        self.clear_children(el);
        markup::parse_into(self, el, html);
    }

    fn create_element(&mut self, tag: &str) -> ElementId {
        self.insert(Node::element(tag))
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if parent == child || !self.nodes.contains_key(&parent) || !self.nodes.contains_key(&child) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(child);
        }
    }

    fn clear_children(&mut self, el: ElementId) {
        let Some(node) = self.nodes.get_mut(&el) else {
            return;
        };
        let children = std::mem::take(&mut node.children);
        for child in children {
            if let Some(c) = self.nodes.get_mut(&child) {
                c.parent = None;
            }
        }
    }

    fn clone_node(&mut self, el: ElementId) -> ElementId {
        self.deep_clone(el)
    }

    fn rect(&self, el: ElementId) -> Rect {
        let r = self.layout(el);
        Rect::new(r.top - self.viewport.scroll_y, r.left, r.width, r.height)
    }

    fn force_reflow(&mut self, _el: ElementId) {
        self.reflows += 1;
    }

    fn listen_hover(&mut self, el: ElementId) {
        self.hover.insert(el);
    }

    fn unlisten_hover(&mut self, el: ElementId) {
        self.hover.remove(&el);
    }

    fn listen_animation_end(&mut self, el: ElementId) {
        self.animation_end.insert(el);
    }

    fn unlisten_animation_end(&mut self, el: ElementId) {
        self.animation_end.remove(&el);
    }

    fn await_images(&mut self, el: ElementId) -> bool {
        let mut has_images = false;
        self.walk(el, &mut |_, node| has_images |= node.tag() == Some("img"));
        if has_images {
            self.image_waits.push(el);
        }
        has_images
    }

    fn await_fonts(&mut self) -> bool {
        if self.font_api {
            self.font_waits += 1;
        }
        self.font_api
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_and_column_layout() {
        let mut doc = FakeDocument::new();
        let body = doc.body();
        let row = doc.add(body, "div");
        for _ in 0..3 {
            let item = doc.add(row, "span");
            doc.set_rect(item, Rect::new(0.0, 0.0, 100.0, 20.0));
        }
        assert_eq!(doc.rect(row).width, 300.0);
        assert_eq!(doc.rect(row).height, 20.0);

        doc.set_style(row, "flex-direction", "column");
        assert_eq!(doc.rect(row).width, 100.0);
        assert_eq!(doc.rect(row).height, 60.0);
    }

    #[test]
    fn child_fills_sized_parent_and_scroll_moves_rects() {
        let mut doc = FakeDocument::new();
        let body = doc.body();
        let outer = doc.add(body, "div");
        doc.set_rect(outer, Rect::new(500.0, 0.0, 1000.0, 50.0));
        let inner = doc.add(outer, "div");
        assert_eq!(doc.rect(inner).width, 1000.0);

        doc.set_scroll(200.0);
        assert_eq!(doc.rect(outer).top, 300.0);
    }

    #[test]
    fn clone_copies_rects_and_text() {
        let mut doc = FakeDocument::from_html("<p>hello <b>world</b></p>");
        let p = doc.children(doc.body())[0];
        doc.set_rect(p, Rect::new(0.0, 0.0, 40.0, 10.0));
        let copy = doc.clone_node(p);
        assert!(!doc.is_connected(copy));
        assert_eq!(doc.text(copy), "hello world");
        assert_eq!(doc.rect(copy).width, 40.0);
    }
}
