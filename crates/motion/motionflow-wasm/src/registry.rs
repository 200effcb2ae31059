//! Maps live DOM elements to the [`ElementId`]s the core works with.
//!
//! Ids are never reused. The reverse index is a `WeakMap`, so an element
//! keeps its id for as long as the page keeps the element alive, while the
//! forward table only holds elements until they leave the document.

use std::cell::{Cell, RefCell};

use hashbrown::HashMap;
use js_sys::WeakMap;
use motionflow_core::{ElementId, IdAllocator};
use wasm_bindgen::JsCast;
use web_sys::{Element, Node, NodeList};

pub struct ElementRegistry {
    alloc: RefCell<IdAllocator>,
    elements: RefCell<HashMap<ElementId, Element>>,
    ids: WeakMap,
    /// Set when the forward table may hold detached elements.
    dirty: Cell<bool>,
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self {
            alloc: RefCell::new(IdAllocator::new()),
            elements: RefCell::new(HashMap::new()),
            ids: WeakMap::new(),
            dirty: Cell::new(false),
        }
    }

    /// Id for `el`, registering it on first sight. An element that was
    /// pruned while detached gets its old id back.
    pub fn id_of(&self, el: &Element) -> ElementId {
        if let Some(raw) = self.ids.get(el).as_f64() {
            let id = ElementId(raw as u32);
            self.elements.borrow_mut().entry(id).or_insert_with(|| el.clone());
            return id;
        }
        let id = self.alloc.borrow_mut().alloc_element();
        self.elements.borrow_mut().insert(id, el.clone());
        self.ids.set(el, &(id.0 as f64).into());
        self.dirty.set(true);
        id
    }

    pub fn get(&self, id: ElementId) -> Option<Element> {
        self.elements.borrow().get(&id).cloned()
    }

    /// Element nodes of a `NodeList`, registered, in order.
    pub fn ids_in(&self, list: &NodeList) -> Vec<ElementId> {
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|n: Node| n.dyn_into::<Element>().ok())
            .map(|el| self.id_of(&el))
            .collect()
    }

    /// Flags the table for the next [`prune`](Self::prune), e.g. after the
    /// page removed nodes.
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    /// Drops every element no longer in the document and returns them.
    /// Their ids resolve to nothing until the element is seen again.
    pub fn prune(&self) -> Vec<(ElementId, Element)> {
        if !self.dirty.replace(false) {
            return Vec::new();
        }
        let mut elements = self.elements.borrow_mut();
        let gone: Vec<ElementId> = elements
            .iter()
            .filter(|(_, el)| !el.is_connected())
            .map(|(id, _)| *id)
            .collect();
        gone.into_iter()
            .filter_map(|id| elements.remove(&id).map(|el| (id, el)))
            .collect()
    }

    /// Elements currently held.
    pub fn len(&self) -> usize {
        self.elements.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
