//! Event queue between browser callbacks and the frame loop.
//!
//! DOM listeners never touch the runtime directly. They push a
//! [`HostEvent`] and wake the loop; the next animation frame drains the
//! queue into `MotionFlow::handle` and then pumps.

use std::cell::{Cell, RefCell};

use motionflow_core::HostEvent;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

pub(crate) type FrameClosure = Closure<dyn FnMut(f64)>;

#[derive(Default)]
pub struct Inbox {
    events: RefCell<Vec<HostEvent>>,
    /// Registered with `requestAnimationFrame`; set once by the host.
    frame: RefCell<Option<FrameClosure>>,
    scheduled: Cell<bool>,
    raf_id: Cell<i32>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_frame(&self, closure: FrameClosure) {
        *self.frame.borrow_mut() = Some(closure);
    }

    pub fn push(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
        self.wake();
    }

    pub fn drain(&self) -> Vec<HostEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn pending(&self) -> usize {
        self.events.borrow().len()
    }

    /// Requests one animation frame unless one is already on the way.
    pub fn wake(&self) {
        if self.scheduled.get() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(closure) = self.frame.borrow().as_ref() {
            if let Ok(id) = window.request_animation_frame(closure.as_ref().unchecked_ref()) {
                self.raf_id.set(id);
                self.scheduled.set(true);
            }
        }
    }

    /// Called at the top of every frame callback.
    pub(crate) fn frame_started(&self) {
        self.scheduled.set(false);
    }

    pub fn stop(&self) {
        if !self.scheduled.replace(false) {
            return;
        }
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(self.raf_id.get());
        }
    }

    pub(crate) fn release(&self) {
        self.stop();
        self.frame.borrow_mut().take();
        self.events.borrow_mut().clear();
    }
}
