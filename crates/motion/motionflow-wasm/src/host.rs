//! Owns the runtime, the document adapter and the page-level listeners, and
//! drives everything from `requestAnimationFrame`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::Array;
use log::trace;
use motionflow_core::{attrs, HostEvent, MotionFlow, MutationRecord};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{AddEventListenerOptions, Element, EventTarget, MutationObserver, MutationObserverInit};

use crate::document::WebDocument;
use crate::inbox::Inbox;
use crate::registry::ElementRegistry;

/// Attributes whose changes the effects re-scan for.
const OBSERVED_ATTRS: [&str; 7] = [
    attrs::ANIMATION,
    attrs::STAGGER_ANIMATION,
    attrs::TICKER,
    attrs::TICKER_SPEED,
    attrs::TICKER_DIRECTION,
    attrs::TICKER_PAUSE_ON_HOVER,
    attrs::TICKER_PAUSE_ON_VISIBILITY,
];

pub struct State {
    pub doc: WebDocument,
    pub flow: MotionFlow,
}

type EventClosure = Closure<dyn FnMut()>;
type MutationClosure = Closure<dyn FnMut(Array, MutationObserver)>;

/// Window/document listeners and the mutation observer, present while the
/// runtime is running.
struct PageListeners {
    targets: Vec<(EventTarget, &'static str, EventClosure)>,
    observer: MutationObserver,
    _on_mutations: MutationClosure,
}

impl PageListeners {
    fn install(doc: &WebDocument, inbox: &Rc<Inbox>, registry: &Rc<ElementRegistry>) -> Result<Self, JsValue> {
        let window: EventTarget = doc.window().clone().into();
        let document: EventTarget = doc.dom().clone().into();
        let passive = AddEventListenerOptions::new();
        passive.set_passive(true);

        let mut targets = Vec::new();
        for (target, name, event) in [
            (window.clone(), "scroll", HostEvent::Scroll),
            (window, "resize", HostEvent::Resize),
            (document, "visibilitychange", HostEvent::VisibilityChange),
        ] {
            let inbox = Rc::clone(inbox);
            let closure: EventClosure =
                Closure::wrap(Box::new(move || inbox.push(event.clone())) as Box<dyn FnMut()>);
            target.add_event_listener_with_callback_and_add_event_listener_options(
                name,
                closure.as_ref().unchecked_ref(),
                &passive,
            )?;
            targets.push((target, name, closure));
        }

        let on_mutations: MutationClosure = {
            let inbox = Rc::clone(inbox);
            let registry = Rc::clone(registry);
            Closure::wrap(Box::new(move |records: Array, _: MutationObserver| {
                let records = convert_records(&registry, &records);
                if !records.is_empty() {
                    inbox.push(HostEvent::Mutations(records));
                }
            }) as Box<dyn FnMut(Array, MutationObserver)>)
        };
        let observer = MutationObserver::new(on_mutations.as_ref().unchecked_ref())?;
        let filter: Array = OBSERVED_ATTRS.iter().map(|a| JsValue::from_str(a)).collect();
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        init.set_attributes(true);
        init.set_attribute_filter(&filter);
        if let Some(body) = doc.dom().body() {
            observer.observe_with_options(&body, &init)?;
        }

        Ok(Self {
            targets,
            observer,
            _on_mutations: on_mutations,
        })
    }

    fn remove(self) {
        self.observer.disconnect();
        for (target, name, closure) in &self.targets {
            let _ = target.remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
    }
}

fn convert_records(registry: &ElementRegistry, records: &Array) -> Vec<MutationRecord> {
    records
        .iter()
        .filter_map(|r| r.dyn_into::<web_sys::MutationRecord>().ok())
        .filter_map(|r| {
            let target = r.target()?.dyn_into::<Element>().ok()?;
            let target = registry.id_of(&target);
            match r.type_().as_str() {
                "attributes" => Some(MutationRecord::Attributes {
                    target,
                    name: r.attribute_name()?,
                }),
                "childList" => {
                    let added = registry.ids_in(&r.added_nodes());
                    let removed = registry.ids_in(&r.removed_nodes());
                    if !removed.is_empty() {
                        registry.mark_dirty();
                    }
                    // Text-only changes (typing, counters) are not interesting.
                    (!added.is_empty() || !removed.is_empty()).then_some(MutationRecord::ChildList {
                        target,
                        added,
                        removed,
                    })
                }
                _ => None,
            }
        })
        .collect()
}

pub struct Host {
    inbox: Rc<Inbox>,
    registry: Rc<ElementRegistry>,
    state: RefCell<State>,
    listeners: RefCell<Option<PageListeners>>,
}

impl Host {
    pub fn new() -> Result<Rc<Self>, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let inbox = Rc::new(Inbox::new());
        let registry = Rc::new(ElementRegistry::new());
        let doc = WebDocument::new(window, Rc::clone(&registry), Rc::clone(&inbox))?;

        let host = Rc::new_cyclic(|weak: &Weak<Host>| {
            let weak = weak.clone();
            inbox.set_frame(Closure::wrap(Box::new(move |_ts: f64| {
                if let Some(host) = weak.upgrade() {
                    host.frame();
                }
            }) as Box<dyn FnMut(f64)>));
            Host {
                inbox: Rc::clone(&inbox),
                registry,
                state: RefCell::new(State {
                    doc,
                    flow: MotionFlow::new(),
                }),
                listeners: RefCell::new(None),
            }
        });
        Ok(host)
    }

    /// Runs `f` against the runtime, then makes sure the frame loop is
    /// awake. Fails when called re-entrantly from inside a frame.
    pub fn with<R>(&self, f: impl FnOnce(&mut WebDocument, &mut MotionFlow) -> R) -> Result<R, JsValue> {
        let out = {
            let mut state = self
                .state
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str("motionflow is busy"))?;
            let State { doc, flow } = &mut *state;
            let out = f(doc, flow);
            // Queued mutation records may still name removed nodes.
            if self.inbox.pending() == 0 {
                doc.prune();
            }
            out
        };
        self.sync_listeners()?;
        self.inbox.wake();
        Ok(out)
    }

    pub fn is_running(&self) -> bool {
        self.state.try_borrow().map_or(true, |s| s.flow.is_running())
    }

    /// Installs or removes the page listeners to follow the live effects.
    fn sync_listeners(&self) -> Result<(), JsValue> {
        let running = self.state.try_borrow().map_or(true, |s| s.flow.has_effects());
        let mut slot = self.listeners.borrow_mut();
        match (running, slot.is_some()) {
            (true, false) => {
                let state = self.state.borrow();
                *slot = Some(PageListeners::install(&state.doc, &self.inbox, &self.registry)?);
                trace!("motionflow page listeners installed");
            }
            (false, true) => {
                if let Some(listeners) = slot.take() {
                    listeners.remove();
                }
                self.inbox.stop();
                trace!("motionflow page listeners removed");
            }
            _ => {}
        }
        Ok(())
    }

    fn frame(&self) {
        self.inbox.frame_started();
        let Ok(mut state) = self.state.try_borrow_mut() else {
            self.inbox.wake();
            return;
        };
        let State { doc, flow } = &mut *state;
        for event in self.inbox.drain() {
            flow.handle(doc, &event);
        }
        flow.pump(doc);
        doc.prune();
        let busy = !flow.is_idle() || self.inbox.pending() > 0;
        drop(state);
        if busy {
            self.inbox.wake();
        }
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.get_mut().take() {
            listeners.remove();
        }
        self.inbox.release();
    }
}
