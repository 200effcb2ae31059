//! `MotionFlow`: lifecycle facade over every effect.
//!
//! Methods:
//! - auto_init / init / destroy for the whole set
//! - init_* / refresh_* / destroy_* per effect
//! - pause_ticker / play_ticker / toggle_ticker
//! - handle (host events) and pump (once per animation frame)

use log::trace;

use crate::config::Options;
use crate::count::CountAnimator;
use crate::dom::{Document, HostEvent};
use crate::entrance::EntranceEngine;
use crate::ids::ElementId;
use crate::parallax::ParallaxSmoother;
use crate::roller::RollerAnimator;
use crate::text::TextEffects;
use crate::ticker::{Ticker, TickerRegistry};

#[derive(Debug, Default)]
pub struct MotionFlow {
    options: Options,
    text: Option<TextEffects>,
    entrance: Option<EntranceEngine>,
    parallax: Option<ParallaxSmoother>,
    count: Option<CountAnimator>,
    roller: Option<RollerAnimator>,
    tickers: TickerRegistry,
    manual_init: bool,
    auto_inited: bool,
    running: bool,
}

fn min_deadline(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

impl MotionFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// True between a successful `init`/`auto_init` and `destroy`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True while any effect, started by `init` or individually, is live.
    pub fn has_effects(&self) -> bool {
        self.text.is_some()
            || self.entrance.is_some()
            || self.parallax.is_some()
            || self.count.is_some()
            || self.roller.is_some()
            || self.tickers.is_active()
    }

    /// Document-ready entry point. Does nothing once `init` ran manually or
    /// a previous auto init happened. Returns whether it started anything.
    pub fn auto_init(&mut self, doc: &mut dyn Document) -> bool {
        if self.manual_init || self.auto_inited {
            return false;
        }
        self.auto_inited = true;
        self.start(doc, Options::default());
        true
    }

    /// Starts every effect with `options`. Calling it again tears down all
    /// effects except the ticker, which is reconfigured in place.
    pub fn init(&mut self, doc: &mut dyn Document, options: Options) {
        self.manual_init = true;
        self.start(doc, options);
    }

    fn start(&mut self, doc: &mut dyn Document, options: Options) {
        if self.running {
            trace!("motionflow re-init");
            self.destroy_text(doc);
            self.destroy_entrance(doc);
            self.destroy_parallax(doc);
            self.destroy_count(doc);
            self.destroy_roller(doc);
        }
        self.options = options;

        self.init_text(doc);
        self.init_entrance(doc);
        self.init_parallax(doc);
        self.init_count(doc);
        self.init_roller(doc);
        self.tickers.activate(doc, self.options.ticker.clone());
        self.running = true;
    }

    /// Tears down everything, ticker included, restoring the document.
    pub fn destroy(&mut self, doc: &mut dyn Document) {
        self.destroy_text(doc);
        self.destroy_entrance(doc);
        self.destroy_parallax(doc);
        self.destroy_count(doc);
        self.destroy_roller(doc);
        self.destroy_ticker(doc);
        self.running = false;
        trace!("motionflow destroyed");
    }

    // --- entrance animations ---

    pub fn entrance(&self) -> Option<&EntranceEngine> {
        self.entrance.as_ref()
    }

    pub fn init_entrance(&mut self, doc: &mut dyn Document) {
        if self.entrance.is_none() {
            let mut engine = EntranceEngine::new(self.options.animation.clone());
            engine.init(doc);
            self.entrance = Some(engine);
        }
    }

    pub fn refresh_entrance(&mut self, doc: &mut dyn Document) {
        if let Some(engine) = self.entrance.as_mut() {
            engine.reinit(doc);
        }
    }

    pub fn destroy_entrance(&mut self, doc: &mut dyn Document) {
        if let Some(mut engine) = self.entrance.take() {
            engine.destroy(doc, true);
        }
    }

    // --- parallax ---

    pub fn parallax(&self) -> Option<&ParallaxSmoother> {
        self.parallax.as_ref()
    }

    pub fn init_parallax(&mut self, doc: &mut dyn Document) {
        if self.parallax.is_none() {
            let mut smoother = ParallaxSmoother::new(self.options.parallax.clone());
            smoother.init(doc);
            self.parallax = Some(smoother);
        }
    }

    pub fn refresh_parallax(&mut self, doc: &mut dyn Document) {
        if let Some(smoother) = self.parallax.as_mut() {
            smoother.refresh(doc);
        }
    }

    pub fn destroy_parallax(&mut self, doc: &mut dyn Document) {
        if let Some(mut smoother) = self.parallax.take() {
            smoother.destroy(doc, true);
        }
    }

    // --- counters ---

    pub fn count(&self) -> Option<&CountAnimator> {
        self.count.as_ref()
    }

    pub fn init_count(&mut self, doc: &mut dyn Document) {
        if self.count.is_none() {
            let mut animator = CountAnimator::new(self.options.count.clone());
            animator.init(doc);
            self.count = Some(animator);
        }
    }

    pub fn refresh_count(&mut self, doc: &mut dyn Document) {
        if let Some(animator) = self.count.as_mut() {
            animator.refresh(doc);
        }
    }

    pub fn destroy_count(&mut self, doc: &mut dyn Document) {
        if let Some(mut animator) = self.count.take() {
            animator.destroy(doc, true);
        }
    }

    // --- rollers ---

    pub fn roller(&self) -> Option<&RollerAnimator> {
        self.roller.as_ref()
    }

    pub fn init_roller(&mut self, doc: &mut dyn Document) {
        if self.roller.is_none() {
            let mut animator = RollerAnimator::new(self.options.roller.clone());
            animator.init(doc);
            self.roller = Some(animator);
        }
    }

    pub fn refresh_roller(&mut self, doc: &mut dyn Document) {
        if let Some(animator) = self.roller.as_mut() {
            animator.refresh(doc);
        }
    }

    pub fn destroy_roller(&mut self, doc: &mut dyn Document) {
        if let Some(mut animator) = self.roller.take() {
            animator.destroy(doc, true);
        }
    }

    // --- text ---

    pub fn text(&self) -> Option<&TextEffects> {
        self.text.as_ref()
    }

    pub fn init_text(&mut self, doc: &mut dyn Document) {
        if self.text.is_none() {
            let mut effects = TextEffects::new(self.options.text.clone());
            effects.init(doc);
            self.text = Some(effects);
        }
    }

    pub fn refresh_text(&mut self, doc: &mut dyn Document) {
        if let Some(effects) = self.text.as_mut() {
            effects.refresh(doc);
        }
    }

    pub fn destroy_text(&mut self, doc: &mut dyn Document) {
        if let Some(mut effects) = self.text.take() {
            effects.destroy(doc, true);
        }
    }

    // --- ticker ---

    pub fn ticker(&self) -> Option<&Ticker> {
        self.tickers.get()
    }

    pub fn init_ticker(&mut self, doc: &mut dyn Document) {
        if !self.tickers.is_active() {
            self.tickers.activate(doc, self.options.ticker.clone());
        }
    }

    pub fn refresh_ticker(&mut self, doc: &mut dyn Document) {
        if let Some(ticker) = self.tickers.get_mut() {
            ticker.refresh(doc);
        }
    }

    pub fn destroy_ticker(&mut self, doc: &mut dyn Document) {
        self.tickers.destroy(doc, true);
    }

    /// Pauses `targets`, or every ticker when `None`.
    pub fn pause_ticker(&mut self, doc: &mut dyn Document, targets: Option<&[ElementId]>) {
        if let Some(ticker) = self.tickers.get_mut() {
            ticker.pause(doc, targets);
        }
    }

    pub fn play_ticker(&mut self, doc: &mut dyn Document, targets: Option<&[ElementId]>) {
        if let Some(ticker) = self.tickers.get_mut() {
            ticker.play(doc, targets);
        }
    }

    pub fn toggle_ticker(&mut self, doc: &mut dyn Document, targets: Option<&[ElementId]>) {
        if let Some(ticker) = self.tickers.get_mut() {
            ticker.toggle(doc, targets);
        }
    }

    // --- driving ---

    /// Forwards a host event to every live effect.
    pub fn handle(&mut self, doc: &mut dyn Document, event: &HostEvent) {
        if let Some(engine) = self.entrance.as_mut() {
            engine.handle(doc, event);
        }
        if let Some(smoother) = self.parallax.as_mut() {
            smoother.handle(doc, event);
        }
        if let Some(animator) = self.count.as_mut() {
            animator.handle(doc, event);
        }
        if let Some(animator) = self.roller.as_mut() {
            animator.handle(doc, event);
        }
        if let Some(ticker) = self.tickers.get_mut() {
            ticker.handle(doc, event);
        }
    }

    /// Runs every task that is due. Call once per animation frame.
    pub fn pump(&mut self, doc: &mut dyn Document) {
        if let Some(effects) = self.text.as_mut() {
            effects.pump(doc);
        }
        if let Some(engine) = self.entrance.as_mut() {
            engine.pump(doc);
        }
        if let Some(smoother) = self.parallax.as_mut() {
            smoother.pump(doc);
        }
        if let Some(animator) = self.count.as_mut() {
            animator.pump(doc);
        }
        if let Some(animator) = self.roller.as_mut() {
            animator.pump(doc);
        }
        if let Some(ticker) = self.tickers.get_mut() {
            ticker.pump(doc);
        }
    }

    /// True when no effect has a pending frame task or timer. Hosts may
    /// stop their frame loop until the next event.
    pub fn is_idle(&self) -> bool {
        self.text.as_ref().map_or(true, TextEffects::is_idle)
            && self.entrance.as_ref().map_or(true, EntranceEngine::is_idle)
            && self.parallax.as_ref().map_or(true, ParallaxSmoother::is_idle)
            && self.count.as_ref().map_or(true, CountAnimator::is_idle)
            && self.roller.as_ref().map_or(true, RollerAnimator::is_idle)
            && self.tickers.get().map_or(true, Ticker::is_idle)
    }

    /// Earliest pending timer across all effects.
    pub fn next_deadline(&self) -> Option<f64> {
        [
            self.text.as_ref().and_then(TextEffects::next_deadline),
            self.entrance.as_ref().and_then(EntranceEngine::next_deadline),
            self.parallax.as_ref().and_then(ParallaxSmoother::next_deadline),
            self.count.as_ref().and_then(CountAnimator::next_deadline),
            self.roller.as_ref().and_then(RollerAnimator::next_deadline),
            self.tickers.get().and_then(Ticker::next_deadline),
        ]
        .into_iter()
        .fold(None, min_deadline)
    }
}
