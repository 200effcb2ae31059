//! Browser bindings for MotionFlow.
//!
//! Every `MotionFlowWeb` handle talks to one shared runtime per page, so
//! `new MotionFlowWeb()` can be called from anywhere without stacking
//! listeners or frame loops. Loading the module schedules an automatic
//! `auto_init` on `DOMContentLoaded`; an explicit `init` before that point
//! turns it into a no-op.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Reflect;
use log::debug;
use motionflow_core::{ElementId, Options};
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::AddEventListenerOptions;

pub mod document;
pub mod host;
pub mod inbox;
pub mod registry;

pub use document::WebDocument;
pub use host::Host;

thread_local! {
    static HOST: RefCell<Option<Rc<Host>>> = const { RefCell::new(None) };
}

fn shared_host() -> Result<Rc<Host>, JsValue> {
    HOST.with(|slot| {
        if let Some(host) = slot.borrow().as_ref() {
            return Ok(Rc::clone(host));
        }
        let host = Host::new()?;
        *slot.borrow_mut() = Some(Rc::clone(&host));
        Ok(host)
    })
}

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn js_error(err: JsValue) -> JsError {
    JsError::new(&err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

#[wasm_bindgen]
pub struct MotionFlowWeb {
    host: Rc<Host>,
}

#[wasm_bindgen]
impl MotionFlowWeb {
    /// Handle to the page runtime.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<MotionFlowWeb, JsError> {
        console_error_panic_hook::set_once();
        Ok(MotionFlowWeb {
            host: shared_host().map_err(js_error)?,
        })
    }

    /// Starts every effect. Pass an options object (camelCase sections such
    /// as `{ ticker: { speed: 120 } }`) or undefined/null for defaults.
    /// Calling it again rebuilds the effects with the new options.
    #[wasm_bindgen]
    pub fn init(&self, options: JsValue) -> Result<(), JsError> {
        let options: Options = if jsvalue_is_undefined_or_null(&options) {
            Options::default()
        } else {
            swb::from_value(options).map_err(|e| JsError::new(&format!("options error: {e}")))?
        };
        self.run(|doc, flow| flow.init(doc, options))
    }

    /// Starts with defaults unless `init` already ran. Returns whether it
    /// started anything.
    #[wasm_bindgen(js_name = auto_init)]
    pub fn auto_init(&self) -> Result<bool, JsError> {
        self.run(|doc, flow| flow.auto_init(doc))
    }

    /// Stops every effect and restores the page.
    #[wasm_bindgen]
    pub fn destroy(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.destroy(doc))
    }

    #[wasm_bindgen(js_name = is_running)]
    pub fn is_running(&self) -> bool {
        self.host.is_running()
    }

    #[wasm_bindgen(js_name = init_entrance)]
    pub fn init_entrance(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.init_entrance(doc))
    }

    #[wasm_bindgen(js_name = refresh_entrance)]
    pub fn refresh_entrance(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.refresh_entrance(doc))
    }

    #[wasm_bindgen(js_name = destroy_entrance)]
    pub fn destroy_entrance(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.destroy_entrance(doc))
    }

    #[wasm_bindgen(js_name = init_parallax)]
    pub fn init_parallax(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.init_parallax(doc))
    }

    #[wasm_bindgen(js_name = refresh_parallax)]
    pub fn refresh_parallax(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.refresh_parallax(doc))
    }

    #[wasm_bindgen(js_name = destroy_parallax)]
    pub fn destroy_parallax(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.destroy_parallax(doc))
    }

    #[wasm_bindgen(js_name = init_count)]
    pub fn init_count(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.init_count(doc))
    }

    #[wasm_bindgen(js_name = refresh_count)]
    pub fn refresh_count(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.refresh_count(doc))
    }

    #[wasm_bindgen(js_name = destroy_count)]
    pub fn destroy_count(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.destroy_count(doc))
    }

    #[wasm_bindgen(js_name = init_roller)]
    pub fn init_roller(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.init_roller(doc))
    }

    #[wasm_bindgen(js_name = refresh_roller)]
    pub fn refresh_roller(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.refresh_roller(doc))
    }

    #[wasm_bindgen(js_name = destroy_roller)]
    pub fn destroy_roller(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.destroy_roller(doc))
    }

    #[wasm_bindgen(js_name = init_text)]
    pub fn init_text(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.init_text(doc))
    }

    #[wasm_bindgen(js_name = refresh_text)]
    pub fn refresh_text(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.refresh_text(doc))
    }

    #[wasm_bindgen(js_name = destroy_text)]
    pub fn destroy_text(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.destroy_text(doc))
    }

    #[wasm_bindgen(js_name = init_ticker)]
    pub fn init_ticker(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.init_ticker(doc))
    }

    #[wasm_bindgen(js_name = refresh_ticker)]
    pub fn refresh_ticker(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.refresh_ticker(doc))
    }

    #[wasm_bindgen(js_name = destroy_ticker)]
    pub fn destroy_ticker(&self) -> Result<(), JsError> {
        self.run(|doc, flow| flow.destroy_ticker(doc))
    }

    /// Pauses the tickers matching `selector`, or all of them.
    #[wasm_bindgen(js_name = pause_ticker)]
    pub fn pause_ticker(&self, selector: Option<String>) -> Result<(), JsError> {
        self.run_selected(selector, |doc, flow, targets| flow.pause_ticker(doc, targets))
    }

    #[wasm_bindgen(js_name = play_ticker)]
    pub fn play_ticker(&self, selector: Option<String>) -> Result<(), JsError> {
        self.run_selected(selector, |doc, flow, targets| flow.play_ticker(doc, targets))
    }

    #[wasm_bindgen(js_name = toggle_ticker)]
    pub fn toggle_ticker(&self, selector: Option<String>) -> Result<(), JsError> {
        self.run_selected(selector, |doc, flow, targets| flow.toggle_ticker(doc, targets))
    }
}

impl MotionFlowWeb {
    fn run<R>(
        &self,
        f: impl FnOnce(&mut WebDocument, &mut motionflow_core::MotionFlow) -> R,
    ) -> Result<R, JsError> {
        self.host.with(f).map_err(js_error)
    }

    /// Resolves `selector` to ticker containers before calling `f`; `None`
    /// selects every ticker.
    fn run_selected(
        &self,
        selector: Option<String>,
        f: impl FnOnce(&mut WebDocument, &mut motionflow_core::MotionFlow, Option<&[ElementId]>),
    ) -> Result<(), JsError> {
        self.host
            .with(|doc, flow| match selector {
                Some(selector) => {
                    let targets = doc.select(&selector)?;
                    f(doc, flow, Some(&targets));
                    Ok(())
                }
                None => {
                    f(doc, flow, None);
                    Ok(())
                }
            })
            .and_then(|inner: Result<(), JsValue>| inner)
            .map_err(js_error)
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(err) = schedule_auto_init() {
        debug!("motionflow auto init not scheduled: {err:?}");
    }
}

/// Runs `auto_init` on `DOMContentLoaded`, or on the next task when the
/// document already finished parsing.
fn schedule_auto_init() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))?;
    let run = Closure::once_into_js(|| {
        let started = shared_host().and_then(|host| host.with(|doc, flow| flow.auto_init(doc)));
        if let Err(err) = started {
            debug!("motionflow auto init failed: {err:?}");
        }
    });

    let loading = Reflect::get(&document, &JsValue::from_str("readyState"))?
        .as_string()
        .is_some_and(|s| s == "loading");
    if loading {
        let once = AddEventListenerOptions::new();
        once.set_once(true);
        document.add_event_listener_with_callback_and_add_event_listener_options(
            "DOMContentLoaded",
            run.unchecked_ref(),
            &once,
        )?;
    } else {
        window.set_timeout_with_callback_and_timeout_and_arguments_0(run.unchecked_ref(), 0)?;
    }
    Ok(())
}
