//! Scroll parallax (`data-mf-parallax`).
//!
//! Runs independently of the trigger engine. Scroll and resize compute a
//! target offset per element; a render loop eases every element towards its
//! target and parks itself once all of them have settled.

use hashbrown::HashMap;
use log::trace;

use crate::attrs;
use crate::config::{Breakpoint, ParallaxOptions};
use crate::dom::{css_number, Document, HostEvent};
use crate::easing::lerp;
use crate::geometry::is_culled;
use crate::ids::{ElementId, TaskId};
use crate::schedule::Scheduler;
use crate::stagger::{breakpoint_attr, expand_parallax};

pub const INTENSITY: f64 = 0.1;
/// Culling margin as a fraction of the viewport height.
pub const BUFFER_RATIO: f64 = 0.3;
pub const SMOOTHING: f64 = 0.1;
/// Used when the viewport is narrower than [`NARROW_VIEWPORT`].
pub const SMOOTHING_NARROW: f64 = 0.14;
pub const NARROW_VIEWPORT: f64 = 768.0;
/// The render loop stops once every offset is within this many pixels.
pub const SETTLE_EPSILON: f64 = 0.1;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Task {
    UpdateTargets,
    Render,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParallaxItem {
    pub element: ElementId,
    pub speed: f64,
    /// Document-relative top edge.
    pub doc_top: f64,
    pub current_y: f64,
    pub target_y: f64,
}

/// Target offset for an element whose top sits at `doc_top`.
pub fn target_offset(scroll_y: f64, doc_top: f64, vh: f64, speed: f64) -> f64 {
    let active = (scroll_y - (doc_top - vh)).max(0.0);
    -(active * speed * INTENSITY * 100.0).round() / 100.0
}

#[derive(Debug)]
pub struct ParallaxSmoother {
    options: ParallaxOptions,
    items: Vec<ParallaxItem>,
    /// Speeds fixed by a parallax stagger parent.
    locked: HashMap<ElementId, f64>,
    tasks: Scheduler<Task>,
    update_frame: Option<TaskId>,
    render_frame: Option<TaskId>,
    smoothing: f64,
    latest_scroll_y: f64,
    active: bool,
}

impl ParallaxSmoother {
    pub fn new(options: ParallaxOptions) -> Self {
        Self {
            options,
            items: Vec::new(),
            locked: HashMap::new(),
            tasks: Scheduler::new(),
            update_frame: None,
            render_frame: None,
            smoothing: SMOOTHING,
            latest_scroll_y: 0.0,
            active: false,
        }
    }

    pub fn items(&self) -> &[ParallaxItem] {
        &self.items
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True while the render loop has a frame queued.
    pub fn is_rendering(&self) -> bool {
        self.render_frame.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_idle()
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.tasks.next_deadline()
    }

    /// Does nothing when already running or when the user prefers reduced
    /// motion.
    pub fn init(&mut self, doc: &mut dyn Document) {
        if self.active || doc.media().reduced_motion {
            return;
        }
        self.active = true;
        self.items.clear();

        let vp = doc.viewport();
        self.smoothing = if vp.width < NARROW_VIEWPORT {
            SMOOTHING_NARROW
        } else {
            SMOOTHING
        };
        let bp = self.options.breakpoints.classify(vp.width);

        let stagger = expand_parallax(&*doc, &self.options.stagger, bp);
        let mut candidates: Vec<ElementId> = stagger.iter().map(|(el, _)| *el).collect();
        self.locked = stagger.into_iter().collect();
        for el in doc.query_attr(attrs::PARALLAX) {
            if !self.locked.contains_key(&el) {
                candidates.push(el);
            }
        }

        for el in candidates {
            if doc.has_attr(el, attrs::PARALLAX_IGNORE) {
                continue;
            }
            let speed = self.resolve_speed(&*doc, el, bp);
            if speed == 0.0 {
                continue;
            }
            doc.set_style(el, "will-change", "transform");
            self.items.push(ParallaxItem {
                element: el,
                speed,
                doc_top: doc.rect(el).top + vp.scroll_y,
                current_y: 0.0,
                target_y: 0.0,
            });
        }
        if self.items.is_empty() {
            return;
        }
        trace!("parallax active with {} items", self.items.len());
        self.latest_scroll_y = vp.scroll_y;
        self.update_targets(doc);
    }

    pub fn refresh(&mut self, doc: &mut dyn Document) {
        self.destroy(doc, false);
        self.init(doc);
    }

    pub fn destroy(&mut self, doc: &mut dyn Document, reset_visual_state: bool) {
        self.active = false;
        self.tasks.clear();
        self.update_frame = None;
        self.render_frame = None;
        if reset_visual_state {
            for item in &self.items {
                doc.remove_style(item.element, "transform");
                doc.remove_style(item.element, "will-change");
            }
        }
        self.items.clear();
        self.locked.clear();
    }

    pub fn handle(&mut self, doc: &mut dyn Document, event: &HostEvent) {
        if !self.active || self.items.is_empty() {
            return;
        }
        match event {
            HostEvent::Scroll => {
                self.latest_scroll_y = doc.viewport().scroll_y;
                self.schedule_targets();
            }
            HostEvent::Resize => {
                let vp = doc.viewport();
                self.latest_scroll_y = vp.scroll_y;
                let bp = self.options.breakpoints.classify(vp.width);
                for idx in 0..self.items.len() {
                    let el = self.items[idx].element;
                    let speed = self.resolve_speed(&*doc, el, bp);
                    let item = &mut self.items[idx];
                    item.speed = speed;
                    item.doc_top = doc.rect(el).top + vp.scroll_y;
                }
                self.schedule_targets();
            }
            _ => {}
        }
    }

    pub fn pump(&mut self, doc: &mut dyn Document) {
        for (id, task) in self.tasks.take_due(doc.now()) {
            match task {
                Task::UpdateTargets => {
                    if self.update_frame == Some(id) {
                        self.update_frame = None;
                    }
                    self.update_targets(doc);
                }
                Task::Render => {
                    if self.render_frame == Some(id) {
                        self.render_frame = None;
                        self.render(doc);
                    }
                }
            }
        }
    }

    /// Speed for `el` at breakpoint `bp`: a stagger-locked value first,
    /// then element attributes, then the global defaults.
    fn resolve_speed(&self, doc: &dyn Document, el: ElementId, bp: Breakpoint) -> f64 {
        if let Some(speed) = self.locked.get(&el) {
            return *speed;
        }
        let speed = if doc.attr(el, attrs::PARALLAX_LOCKED).as_deref() == Some("true") {
            attrs::float(doc, el, attrs::PARALLAX_SPEED).unwrap_or(0.0)
        } else {
            breakpoint_attr(
                doc,
                el,
                bp,
                [
                    attrs::PARALLAX_SPEED_MOBILE,
                    attrs::PARALLAX_SPEED_TABLET,
                    attrs::PARALLAX_SPEED,
                ],
            )
            .unwrap_or_else(|| self.options.speeds().pick(bp))
        };
        if speed.is_finite() {
            speed
        } else {
            0.0
        }
    }

    fn schedule_targets(&mut self) {
        if self.update_frame.is_none() {
            self.update_frame = Some(self.tasks.request_frame(Task::UpdateTargets));
        }
    }

    fn update_targets(&mut self, doc: &mut dyn Document) {
        let scroll_y = self.latest_scroll_y;
        let vh = doc.viewport().height;
        let buffer = vh * BUFFER_RATIO;
        for item in &mut self.items {
            let rect = doc.rect(item.element);
            if is_culled(&rect, vh, buffer) {
                continue;
            }
            item.target_y = target_offset(scroll_y, item.doc_top, vh, item.speed);
        }
        if self.render_frame.is_none() {
            self.render_frame = Some(self.tasks.request_frame(Task::Render));
        }
    }

    fn render(&mut self, doc: &mut dyn Document) {
        let mut moving = false;
        for item in &mut self.items {
            item.current_y = lerp(item.current_y, item.target_y, self.smoothing);
            if (item.current_y - item.target_y).abs() > SETTLE_EPSILON {
                moving = true;
            }
            doc.set_style(
                item.element,
                "transform",
                &format!("translate3d(0, {}px, 0)", css_number(item.current_y)),
            );
        }
        if moving {
            self.render_frame = Some(self.tasks.request_frame(Task::Render));
        }
    }
}
