//! [`Document`] over the live browser DOM.

use std::cell::Cell;
use std::rc::Rc;

use hashbrown::HashMap;
use js_sys::{Promise, Reflect};
use log::debug;
use motionflow_core::{Document, ElementId, HostEvent, MediaFeatures, Rect, Viewport};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{AddEventListenerOptions, Element, HtmlElement, HtmlImageElement, Window};

use crate::inbox::Inbox;
use crate::registry::ElementRegistry;

type Listener = Closure<dyn FnMut()>;

struct HoverListeners {
    enter: Listener,
    leave: Listener,
}

pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
    registry: Rc<ElementRegistry>,
    inbox: Rc<Inbox>,
    hover: HashMap<ElementId, HoverListeners>,
    animation_end: HashMap<ElementId, Listener>,
}

impl WebDocument {
    pub fn new(window: Window, registry: Rc<ElementRegistry>, inbox: Rc<Inbox>) -> Result<Self, JsValue> {
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        Ok(Self {
            window,
            document,
            registry,
            inbox,
            hover: HashMap::new(),
            animation_end: HashMap::new(),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn dom(&self) -> &web_sys::Document {
        &self.document
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// Ids of the connected elements matching a CSS selector.
    pub fn select(&self, selector: &str) -> Result<Vec<ElementId>, JsValue> {
        let list = self.document.query_selector_all(selector)?;
        Ok(self.registry.ids_in(&list))
    }

    /// Drops every per-element listener still registered.
    pub fn release_listeners(&mut self) {
        let ids: Vec<ElementId> = self.hover.keys().copied().collect();
        for id in ids {
            self.unlisten_hover(id);
        }
        let ids: Vec<ElementId> = self.animation_end.keys().copied().collect();
        for id in ids {
            self.unlisten_animation_end(id);
        }
    }

    /// Forgets elements that left the document, detaching any listener
    /// still registered on them.
    pub fn prune(&mut self) {
        for (id, el) in self.registry.prune() {
            if let Some(listeners) = self.hover.remove(&id) {
                let _ = el.remove_event_listener_with_callback(
                    "mouseenter",
                    listeners.enter.as_ref().unchecked_ref(),
                );
                let _ = el.remove_event_listener_with_callback(
                    "mouseleave",
                    listeners.leave.as_ref().unchecked_ref(),
                );
            }
            if let Some(listener) = self.animation_end.remove(&id) {
                let _ = el
                    .remove_event_listener_with_callback("animationend", listener.as_ref().unchecked_ref());
            }
        }
    }

    fn element(&self, id: ElementId) -> Option<Element> {
        self.registry.get(id)
    }

    fn html(&self, id: ElementId) -> Option<HtmlElement> {
        self.element(id)?.dyn_into::<HtmlElement>().ok()
    }

    fn matches_media(&self, query: &str) -> bool {
        matches!(self.window.match_media(query), Ok(Some(mql)) if mql.matches())
    }

    fn event_listener(&self, event: HostEvent) -> Listener {
        let inbox = Rc::clone(&self.inbox);
        Closure::wrap(Box::new(move || inbox.push(event.clone())) as Box<dyn FnMut()>)
    }
}

impl Document for WebDocument {
    fn now(&self) -> f64 {
        self.window.performance().map_or(0.0, |p| p.now())
    }

    fn viewport(&self) -> Viewport {
        let px = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Viewport {
            width: px(self.window.inner_width()),
            height: px(self.window.inner_height()),
            scroll_y: self.window.scroll_y().unwrap_or(0.0),
            device_pixel_ratio: self.window.device_pixel_ratio(),
        }
    }

    fn media(&self) -> MediaFeatures {
        MediaFeatures {
            reduced_motion: self.matches_media("(prefers-reduced-motion: reduce)"),
            can_hover: self.matches_media("(hover: hover)"),
        }
    }

    fn is_hidden(&self) -> bool {
        self.document.hidden()
    }

    fn body(&self) -> ElementId {
        match self.document.body() {
            Some(body) => self.registry.id_of(&body),
            None => match self.document.document_element() {
                Some(root) => self.registry.id_of(&root),
                None => ElementId(u32::MAX),
            },
        }
    }

    fn query_attr(&self, attr: &str) -> Vec<ElementId> {
        self.select(&format!("[{attr}]")).unwrap_or_else(|err| {
            debug!("query for [{attr}] failed: {err:?}");
            Vec::new()
        })
    }

    fn children(&self, el: ElementId) -> Vec<ElementId> {
        let Some(el) = self.element(el) else {
            return Vec::new();
        };
        let list = el.children();
        (0..list.length())
            .filter_map(|i| list.item(i))
            .map(|c| self.registry.id_of(&c))
            .collect()
    }

    fn is_connected(&self, el: ElementId) -> bool {
        self.element(el).is_some_and(|e| e.is_connected())
    }

    fn subtree_has_attr(&self, el: ElementId, attr: &str) -> bool {
        let Some(el) = self.element(el) else {
            return false;
        };
        el.has_attribute(attr) || matches!(el.query_selector(&format!("[{attr}]")), Ok(Some(_)))
    }

    fn attr(&self, el: ElementId, name: &str) -> Option<String> {
        self.element(el)?.get_attribute(name)
    }

    fn set_attr(&mut self, el: ElementId, name: &str, value: &str) {
        if let Some(el) = self.element(el) {
            let _ = el.set_attribute(name, value);
        }
    }

    fn remove_attr(&mut self, el: ElementId, name: &str) {
        if let Some(el) = self.element(el) {
            let _ = el.remove_attribute(name);
        }
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.element(el).is_some_and(|e| e.class_list().contains(class))
    }

    fn add_class(&mut self, el: ElementId, class: &str) {
        if let Some(el) = self.element(el) {
            let _ = el.class_list().add_1(class);
        }
    }

    fn remove_class(&mut self, el: ElementId, class: &str) {
        if let Some(el) = self.element(el) {
            let _ = el.class_list().remove_1(class);
        }
    }

    fn set_style(&mut self, el: ElementId, prop: &str, value: &str) {
        let Some(el) = self.html(el) else {
            return;
        };
        let style = el.style();
        let _ = if value.is_empty() {
            style.remove_property(prop).map(drop)
        } else {
            style.set_property(prop, value)
        };
    }

    fn text(&self, el: ElementId) -> String {
        self.element(el)
            .and_then(|e| e.text_content())
            .unwrap_or_default()
    }

    fn set_text(&mut self, el: ElementId, text: &str) {
        if let Some(el) = self.element(el) {
            el.set_text_content(Some(text));
        }
    }

    fn inner_html(&self, el: ElementId) -> String {
        self.element(el).map(|e| e.inner_html()).unwrap_or_default()
    }

    fn set_inner_html(&mut self, el: ElementId, html: &str) {
        if let Some(el) = self.element(el) {
            el.set_inner_html(html);
        }
    }

    fn create_element(&mut self, tag: &str) -> ElementId {
        match self.document.create_element(tag) {
            Ok(el) => self.registry.id_of(&el),
            Err(err) => {
                debug!("create_element({tag}) failed: {err:?}");
                ElementId(u32::MAX)
            }
        }
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if let (Some(parent), Some(child)) = (self.element(parent), self.element(child)) {
            let _ = parent.append_child(&child);
        }
    }

    fn clear_children(&mut self, el: ElementId) {
        let Some(el) = self.element(el) else {
            return;
        };
        while let Some(child) = el.first_child() {
            if el.remove_child(&child).is_err() {
                break;
            }
        }
    }

    fn clone_node(&mut self, el: ElementId) -> ElementId {
        let copy = self
            .element(el)
            .and_then(|e| e.clone_node_with_deep(true).ok())
            .and_then(|n| n.dyn_into::<Element>().ok());
        match copy {
            Some(copy) => self.registry.id_of(&copy),
            None => ElementId(u32::MAX),
        }
    }

    fn rect(&self, el: ElementId) -> Rect {
        match self.element(el) {
            Some(el) => {
                let r = el.get_bounding_client_rect();
                Rect::new(r.top(), r.left(), r.width(), r.height())
            }
            None => Rect::default(),
        }
    }

    fn force_reflow(&mut self, el: ElementId) {
        if let Some(el) = self.html(el) {
            let _ = el.offset_height();
        }
    }

    fn listen_hover(&mut self, el: ElementId) {
        if self.hover.contains_key(&el) {
            return;
        }
        let Some(target) = self.element(el) else {
            return;
        };
        let listeners = HoverListeners {
            enter: self.event_listener(HostEvent::PointerEnter(el)),
            leave: self.event_listener(HostEvent::PointerLeave(el)),
        };
        let _ = target
            .add_event_listener_with_callback("mouseenter", listeners.enter.as_ref().unchecked_ref());
        let _ = target
            .add_event_listener_with_callback("mouseleave", listeners.leave.as_ref().unchecked_ref());
        self.hover.insert(el, listeners);
    }

    fn unlisten_hover(&mut self, el: ElementId) {
        let Some(listeners) = self.hover.remove(&el) else {
            return;
        };
        if let Some(target) = self.element(el) {
            let _ = target.remove_event_listener_with_callback(
                "mouseenter",
                listeners.enter.as_ref().unchecked_ref(),
            );
            let _ = target.remove_event_listener_with_callback(
                "mouseleave",
                listeners.leave.as_ref().unchecked_ref(),
            );
        }
    }

    fn listen_animation_end(&mut self, el: ElementId) {
        if self.animation_end.contains_key(&el) {
            return;
        }
        let Some(target) = self.element(el) else {
            return;
        };
        let listener = self.event_listener(HostEvent::AnimationEnd(el));
        let _ = target
            .add_event_listener_with_callback("animationend", listener.as_ref().unchecked_ref());
        self.animation_end.insert(el, listener);
    }

    fn unlisten_animation_end(&mut self, el: ElementId) {
        let Some(listener) = self.animation_end.remove(&el) else {
            return;
        };
        if let Some(target) = self.element(el) {
            let _ = target
                .remove_event_listener_with_callback("animationend", listener.as_ref().unchecked_ref());
        }
    }

    fn await_images(&mut self, el: ElementId) -> bool {
        let Some(root) = self.element(el) else {
            return false;
        };
        let Ok(list) = root.query_selector_all("img") else {
            return false;
        };
        let pending: Vec<HtmlImageElement> = (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|n| n.dyn_into::<HtmlImageElement>().ok())
            .filter(|img| !img.complete())
            .collect();
        if list.length() == 0 {
            return false;
        }
        if pending.is_empty() {
            self.inbox.push(HostEvent::ImagesSettled(el));
            return true;
        }

        let remaining = Rc::new(Cell::new(pending.len()));
        let once = AddEventListenerOptions::new();
        once.set_once(true);
        for img in pending {
            let done = Rc::new(Cell::new(false));
            let remaining = Rc::clone(&remaining);
            let inbox = Rc::clone(&self.inbox);
            // One callback serves both `load` and `error`; whichever fires
            // first counts the image.
            let settle = Closure::wrap(Box::new(move || {
                if done.replace(true) {
                    return;
                }
                let left = remaining.get().saturating_sub(1);
                remaining.set(left);
                if left == 0 {
                    inbox.push(HostEvent::ImagesSettled(el));
                }
            }) as Box<dyn FnMut()>)
            .into_js_value();
            for event in ["load", "error"] {
                let _ = img.add_event_listener_with_callback_and_add_event_listener_options(
                    event,
                    settle.unchecked_ref(),
                    &once,
                );
            }
        }
        true
    }

    fn await_fonts(&mut self) -> bool {
        let ready = Reflect::get(&self.document, &JsValue::from_str("fonts"))
            .ok()
            .filter(|fonts| fonts.is_object())
            .and_then(|fonts| Reflect::get(&fonts, &JsValue::from_str("ready")).ok())
            .and_then(|ready| ready.dyn_into::<Promise>().ok());
        let Some(ready) = ready else {
            return false;
        };
        let inbox = Rc::clone(&self.inbox);
        let on_ready = Closure::once(move |_: JsValue| inbox.push(HostEvent::FontsReady));
        let _ = ready.then(&on_ready);
        on_ready.forget();
        true
    }
}

impl Drop for WebDocument {
    fn drop(&mut self) {
        self.release_listeners();
    }
}
