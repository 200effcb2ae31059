//! Count-up numbers (`data-mf-count-to`).
//!
//! Each element animates linearly from its `from` value to its target once
//! it crosses the trigger line, reformatting its text every frame with the
//! grouping and precision of the literal it was declared with.

use hashbrown::HashMap;
use log::{debug, trace};

use crate::attrs;
use crate::config::CounterOptions;
use crate::dom::{Document, HostEvent};
use crate::geometry::Trigger;
use crate::ids::{ElementId, TaskId};
use crate::number::{self, Grouping};
use crate::schedule::Scheduler;
use crate::trigger::{parse_flag, RepeatPolicy, Watch};

/// Fallback viewport percentage for counter trigger literals.
pub const COUNTER_TRIGGER_FALLBACK: f64 = 90.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Task {
    Update,
    Frame(ElementId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CountItem {
    pub element: ElementId,
    pub watch: Watch,
    pub from: f64,
    pub to: f64,
    /// Milliseconds.
    pub duration: f64,
    pub from_decimals: usize,
    pub to_decimals: usize,
    pub anim_decimals: usize,
    pub grouping: Grouping,
    animating: bool,
    start: Option<f64>,
    frame: Option<TaskId>,
}

impl CountItem {
    pub fn is_animating(&self) -> bool {
        self.animating
    }

    fn from_text(&self) -> String {
        number::format(self.from, self.from_decimals, self.grouping)
    }

    fn final_text(&self) -> String {
        number::format(self.to, self.to_decimals, self.grouping)
    }
}

#[derive(Debug)]
pub struct CountAnimator {
    options: CounterOptions,
    items: Vec<CountItem>,
    tasks: Scheduler<Task>,
    update_frame: Option<TaskId>,
    reduced_motion: bool,
    active: bool,
}

impl CountAnimator {
    pub fn new(options: CounterOptions) -> Self {
        Self {
            options,
            items: Vec::new(),
            tasks: Scheduler::new(),
            update_frame: None,
            reduced_motion: false,
            active: false,
        }
    }

    pub fn items(&self) -> &[CountItem] {
        &self.items
    }

    pub fn item(&self, el: ElementId) -> Option<&CountItem> {
        self.items.iter().find(|i| i.element == el)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_idle()
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.tasks.next_deadline()
    }

    pub fn init(&mut self, doc: &mut dyn Document) {
        if self.active {
            self.destroy(doc, false);
        }
        self.reduced_motion = doc.media().reduced_motion;
        self.active = true;
        self.collect(doc);
        self.update(doc);
        trace!("count animator active with {} items", self.items.len());
    }

    /// Re-collects elements, keeping the state of ones already known, and
    /// schedules a re-evaluation.
    pub fn refresh(&mut self, doc: &mut dyn Document) {
        self.collect(doc);
        self.schedule_update();
    }

    pub fn destroy(&mut self, doc: &mut dyn Document, reset_visual_state: bool) {
        self.active = false;
        self.tasks.clear();
        self.update_frame = None;
        for item in &mut self.items {
            item.animating = false;
            item.frame = None;
            item.start = None;
            if reset_visual_state {
                doc.set_text(item.element, &item.from_text());
            }
        }
        self.items.clear();
    }

    pub fn handle(&mut self, _doc: &mut dyn Document, event: &HostEvent) {
        if self.active && matches!(event, HostEvent::Scroll | HostEvent::Resize) {
            self.schedule_update();
        }
    }

    pub fn pump(&mut self, doc: &mut dyn Document) {
        let now = doc.now();
        for (id, task) in self.tasks.take_due(now) {
            match task {
                Task::Update => {
                    if self.update_frame == Some(id) {
                        self.update_frame = None;
                    }
                    self.update(doc);
                }
                Task::Frame(el) => self.step(doc, el, id, now),
            }
        }
    }

    fn schedule_update(&mut self) {
        if self.update_frame.is_none() {
            self.update_frame = Some(self.tasks.request_frame(Task::Update));
        }
    }

    fn collect(&mut self, doc: &mut dyn Document) {
        let cfg = &self.options;
        let mut existing: HashMap<ElementId, CountItem> =
            self.items.drain(..).map(|it| (it.element, it)).collect();
        let mut next = Vec::new();

        for el in doc.query_attr(attrs::COUNT_TO) {
            let Some(raw) = doc.attr(el, attrs::COUNT_TO).filter(|v| !v.is_empty()) else {
                continue;
            };
            let to = match number::parse_counter(&raw) {
                Ok(v) => v,
                Err(err) => {
                    debug!("count element {el:?} skipped: {err}");
                    continue;
                }
            };
            let from_raw = doc.attr(el, attrs::COUNT_FROM);
            let from = match &from_raw {
                Some(r) => number::parse_counter(r).unwrap_or(0.0),
                None => cfg.from,
            };
            let trigger_literal = doc
                .attr(el, attrs::COUNT_TRIGGER)
                .unwrap_or_else(|| cfg.trigger.clone());
            let trigger = match Trigger::parse(&trigger_literal, COUNTER_TRIGGER_FALLBACK) {
                Ok(t) => t,
                Err(err) => {
                    debug!("count element {el:?} skipped: {err}");
                    continue;
                }
            };
            let once = doc
                .attr(el, attrs::COUNT_ONCE)
                .map_or(cfg.once, |v| parse_flag(&v));
            let repeat = RepeatPolicy::parse(
                &doc.attr(el, attrs::COUNT_REPEAT)
                    .unwrap_or_else(|| cfg.repeat.clone()),
            );
            let duration = attrs::number(&*doc, el, attrs::COUNT_DURATION).unwrap_or(cfg.duration);
            let from_decimals = number::decimals(from_raw.as_deref().unwrap_or(""));
            let to_decimals = number::decimals(&raw);
            let grouping = Grouping::detect(&raw);

            match existing.remove(&el) {
                Some(mut prev) => {
                    prev.watch.trigger = trigger;
                    prev.watch.once = once;
                    prev.watch.repeat = repeat;
                    prev.from = from;
                    prev.to = to;
                    prev.duration = duration;
                    prev.from_decimals = from_decimals;
                    prev.to_decimals = to_decimals;
                    prev.anim_decimals = from_decimals.max(to_decimals);
                    prev.grouping = grouping;
                    next.push(prev);
                }
                None => {
                    let item = CountItem {
                        element: el,
                        watch: Watch::new(trigger, once, repeat),
                        from,
                        to,
                        duration,
                        from_decimals,
                        to_decimals,
                        anim_decimals: from_decimals.max(to_decimals),
                        grouping,
                        animating: false,
                        start: None,
                        frame: None,
                    };
                    doc.set_text(el, &item.from_text());
                    next.push(item);
                }
            }
        }

        for (_, mut gone) in existing {
            self.tasks.cancel_slot(&mut gone.frame);
        }
        self.items = next;
    }

    fn update(&mut self, doc: &mut dyn Document) {
        let vh = doc.viewport().height;
        let steps: Vec<_> = self
            .items
            .iter_mut()
            .enumerate()
            .map(|(idx, item)| (idx, item.watch.evaluate(&doc.rect(item.element), vh)))
            .filter(|(_, step)| !step.is_noop())
            .collect();

        for (idx, step) in steps {
            let item = &mut self.items[idx];
            if step.entered {
                if self.reduced_motion {
                    doc.set_text(item.element, &item.final_text());
                } else {
                    self.tasks.cancel_slot(&mut item.frame);
                    item.animating = true;
                    item.start = None;
                    item.frame = Some(self.tasks.request_frame(Task::Frame(item.element)));
                }
            }
            if step.reset {
                self.tasks.cancel_slot(&mut item.frame);
                item.animating = false;
                item.start = None;
                doc.set_text(item.element, &item.from_text());
            }
        }
    }

    fn step(&mut self, doc: &mut dyn Document, el: ElementId, id: TaskId, now: f64) {
        let Some(item) = self.items.iter_mut().find(|i| i.element == el) else {
            return;
        };
        if item.frame != Some(id) {
            return;
        }
        item.frame = None;
        if !item.animating {
            return;
        }
        let start = *item.start.get_or_insert(now);
        let p = if item.duration > 0.0 {
            ((now - start) / item.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let value = item.from + (item.to - item.from) * p;
        doc.set_text(
            el,
            &number::format(value, item.anim_decimals, item.grouping),
        );
        if p < 1.0 {
            item.frame = Some(self.tasks.request_frame(Task::Frame(el)));
        } else {
            item.animating = false;
            item.start = None;
            doc.set_text(el, &item.final_text());
        }
    }
}
