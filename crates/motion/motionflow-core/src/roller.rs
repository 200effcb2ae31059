//! Digit rollers (`data-mf-roller-to`).
//!
//! The element's content is replaced by one wheel per digit slot:
//!
//! ```text
//! span.mf-roller
//!   span.mf-roller-digit        (one per slot, leading slots may be hidden)
//!     span.mf-roller-digit-inner
//!       span × 10               ("0" ..= "9")
//! ```
//!
//! A digit shows by translating its inner wheel by `-n × 10%`. On entrance
//! the value eases out towards the target while, when the number of digits
//! differs, a slower interval reveals or hides one slot at a time.

use log::{debug, trace};

use crate::attrs;
use crate::config::CounterOptions;
use crate::count::COUNTER_TRIGGER_FALLBACK;
use crate::dom::{Document, HostEvent};
use crate::error::LiteralError;
use crate::easing::ease_out_cubic;
use crate::geometry::Trigger;
use crate::ids::{ElementId, TaskId};
use crate::schedule::Scheduler;
use crate::trigger::{parse_flag, RepeatPolicy, Watch};

/// Milliseconds between two slot reveals.
pub const DIGIT_STEP_DELAY_MS: f64 = 200.0;

pub const CLASS_ROLLER: &str = "mf-roller";
pub const CLASS_DIGIT: &str = "mf-roller-digit";
pub const CLASS_DIGIT_INNER: &str = "mf-roller-digit-inner";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Task {
    Update,
    Frame(ElementId),
    DigitStep(ElementId),
}

/// Keeps only the ASCII digits of a literal; no digits at all reads as 0.
pub fn extract_digits(literal: &str) -> Result<u64, LiteralError> {
    let digits: String = literal.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Ok(0);
    }
    digits
        .parse()
        .map_err(|_| LiteralError::NotANumber(literal.to_string()))
}

/// Decimal digit count, at least 1.
pub fn digit_len(n: u64) -> usize {
    n.checked_ilog10().map_or(1, |l| l as usize + 1)
}

/// The last `visible` digits of `value`, zero padded.
fn visible_string(value: u64, visible: usize) -> String {
    let s = value.to_string();
    if s.len() > visible {
        s[s.len() - visible..].to_string()
    } else {
        format!("{s:0>visible$}")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RollerItem {
    pub element: ElementId,
    pub watch: Watch,
    pub from: u64,
    pub to: u64,
    pub duration: f64,
    pub initial_digits: usize,
    pub target_digits: usize,
    pub total_digits: usize,
    /// `span.mf-roller-digit` per slot, most significant first.
    pub slots: Vec<ElementId>,
    /// `span.mf-roller-digit-inner` per slot.
    pub wheels: Vec<ElementId>,
    visible: usize,
    last_value: u64,
    animating: bool,
    start: Option<f64>,
    frame: Option<TaskId>,
    digit_timer: Option<TaskId>,
}

impl RollerItem {
    /// Number of slots currently shown.
    pub fn visible_digits(&self) -> usize {
        self.visible
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    fn set_visible(&mut self, doc: &mut dyn Document, visible: usize) {
        self.visible = visible;
        let hidden = self.total_digits.saturating_sub(visible);
        for (idx, slot) in self.slots.iter().enumerate() {
            let v = if idx < hidden { "0" } else { "" };
            doc.set_style(*slot, "width", v);
            doc.set_style(*slot, "opacity", v);
        }
    }

    fn set_value(&self, doc: &mut dyn Document, value: u64, immediate: bool) {
        let first = self.total_digits.saturating_sub(self.visible);
        let digits = visible_string(value, self.visible);
        for (i, ch) in digits.chars().enumerate() {
            let Some(wheel) = self.wheels.get(first + i) else {
                continue;
            };
            let n = ch.to_digit(10).unwrap_or(0);
            let transform = format!("translateY(-{}%)", n * 10);
            if immediate {
                doc.set_style(*wheel, "transition", "none");
                doc.set_style(*wheel, "transform", &transform);
                doc.force_reflow(*wheel);
                doc.set_style(*wheel, "transition", "");
            } else {
                doc.set_style(*wheel, "transform", &transform);
            }
        }
    }

    fn stop(&mut self, tasks: &mut Scheduler<Task>) {
        self.animating = false;
        tasks.cancel_slot(&mut self.frame);
        tasks.cancel_slot(&mut self.digit_timer);
        self.start = None;
    }
}

fn build(doc: &mut dyn Document, el: ElementId, total: usize) -> (Vec<ElementId>, Vec<ElementId>) {
    let wrapper = doc.create_element("span");
    doc.add_class(wrapper, CLASS_ROLLER);
    let mut slots = Vec::with_capacity(total);
    let mut wheels = Vec::with_capacity(total);
    for _ in 0..total {
        let slot = doc.create_element("span");
        doc.add_class(slot, CLASS_DIGIT);
        doc.set_style(slot, "display", "inline-block");
        doc.set_style(slot, "overflow", "hidden");

        let wheel = doc.create_element("span");
        doc.add_class(wheel, CLASS_DIGIT_INNER);
        doc.set_style(wheel, "display", "block");
        doc.set_style(wheel, "will-change", "transform");
        for d in 0..=9 {
            let line = doc.create_element("span");
            doc.set_text(line, &d.to_string());
            doc.set_style(line, "display", "block");
            doc.append_child(wheel, line);
        }
        doc.append_child(slot, wheel);
        doc.append_child(wrapper, slot);
        slots.push(slot);
        wheels.push(wheel);
    }
    doc.clear_children(el);
    doc.append_child(el, wrapper);
    (slots, wheels)
}

#[derive(Debug)]
pub struct RollerAnimator {
    options: CounterOptions,
    items: Vec<RollerItem>,
    tasks: Scheduler<Task>,
    update_frame: Option<TaskId>,
    reduced_motion: bool,
    active: bool,
}

impl RollerAnimator {
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

    pub fn items(&self) -> &[RollerItem] {
        &self.items
    }

    pub fn item(&self, el: ElementId) -> Option<&RollerItem> {
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

    /// Builds every roller from scratch. Listening starts only when at least
    /// one element was found.
    pub fn init(&mut self, doc: &mut dyn Document) {
        if self.active {
            self.destroy(doc, false);
        }
        self.reduced_motion = doc.media().reduced_motion;
        self.items.clear();

        for el in doc.query_attr(attrs::ROLLER_TO) {
            if let Some(item) = self.collect(doc, el) {
                self.items.push(item);
            }
        }
        if self.items.is_empty() {
            return;
        }
        self.active = true;
        self.update(doc);
        trace!("roller animator active with {} items", self.items.len());
    }

    pub fn refresh(&mut self, doc: &mut dyn Document) {
        self.update(doc);
    }

    /// With `reset_visual_state` each element's wheels are replaced by the
    /// plain `from` text.
    pub fn destroy(&mut self, doc: &mut dyn Document, reset_visual_state: bool) {
        self.active = false;
        for item in &mut self.items {
            item.stop(&mut self.tasks);
            if reset_visual_state {
                doc.set_text(item.element, &item.from.to_string());
            }
        }
        self.tasks.clear();
        self.update_frame = None;
        self.items.clear();
    }

    pub fn handle(&mut self, _doc: &mut dyn Document, event: &HostEvent) {
        if self.active
            && matches!(event, HostEvent::Scroll | HostEvent::Resize)
            && self.update_frame.is_none()
        {
            self.update_frame = Some(self.tasks.request_frame(Task::Update));
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
                Task::Frame(el) => self.frame(doc, el, id, now),
                Task::DigitStep(el) => self.digit_step(doc, el, id),
            }
        }
    }

    fn collect(&self, doc: &mut dyn Document, el: ElementId) -> Option<RollerItem> {
        let cfg = &self.options;
        let raw = doc.attr(el, attrs::ROLLER_TO).filter(|v| !v.is_empty())?;
        let parsed = extract_digits(&raw).and_then(|to| {
            let from = match doc.attr(el, attrs::ROLLER_FROM) {
                Some(r) => extract_digits(&r)?,
                None => cfg.from.max(0.0).round() as u64,
            };
            Ok((from, to))
        });
        let (from, to) = match parsed {
            Ok(v) => v,
            Err(err) => {
                debug!("roller element {el:?} skipped: {err}");
                return None;
            }
        };
        let trigger_literal = doc
            .attr(el, attrs::ROLLER_TRIGGER)
            .unwrap_or_else(|| cfg.trigger.clone());
        let trigger = match Trigger::parse(&trigger_literal, COUNTER_TRIGGER_FALLBACK) {
            Ok(t) => t,
            Err(err) => {
                debug!("roller element {el:?} skipped: {err}");
                return None;
            }
        };
        let once = doc
            .attr(el, attrs::ROLLER_ONCE)
            .map_or(cfg.once, |v| parse_flag(&v));
        let repeat = RepeatPolicy::parse(
            &doc.attr(el, attrs::ROLLER_REPEAT)
                .unwrap_or_else(|| cfg.repeat.clone()),
        );
        let duration = attrs::number(&*doc, el, attrs::ROLLER_DURATION).unwrap_or(cfg.duration);

        let initial_digits = digit_len(from);
        let target_digits = digit_len(to);
        let total_digits = initial_digits.max(target_digits);
        let (slots, wheels) = build(doc, el, total_digits);

        let mut item = RollerItem {
            element: el,
            watch: Watch::new(trigger, once, repeat),
            from,
            to,
            duration,
            initial_digits,
            target_digits,
            total_digits,
            slots,
            wheels,
            visible: initial_digits,
            last_value: from,
            animating: false,
            start: None,
            frame: None,
            digit_timer: None,
        };
        item.set_visible(doc, initial_digits);
        item.set_value(doc, from, true);
        Some(item)
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

        let now = doc.now();
        for (idx, step) in steps {
            if step.entered {
                self.start(doc, idx, now);
            }
            if step.reset {
                let item = &mut self.items[idx];
                item.stop(&mut self.tasks);
                let initial = item.initial_digits;
                item.set_visible(doc, initial);
                item.set_value(doc, item.from, true);
            }
        }
    }

    fn start(&mut self, doc: &mut dyn Document, idx: usize, now: f64) {
        let item = &mut self.items[idx];
        if item.animating {
            return;
        }
        item.stop(&mut self.tasks);
        item.animating = true;
        item.visible = item.initial_digits;
        item.last_value = item.from;

        if self.reduced_motion {
            let target = item.target_digits;
            item.set_visible(doc, target);
            item.set_value(doc, item.to, true);
            item.animating = false;
            return;
        }
        if item.visible != item.target_digits {
            item.digit_timer = Some(self.tasks.set_interval(
                now,
                DIGIT_STEP_DELAY_MS,
                Task::DigitStep(item.element),
            ));
        }
        item.frame = Some(self.tasks.request_frame(Task::Frame(item.element)));
    }

    fn digit_step(&mut self, doc: &mut dyn Document, el: ElementId, id: TaskId) {
        let Some(item) = self.items.iter_mut().find(|i| i.element == el) else {
            return;
        };
        if item.digit_timer != Some(id) {
            return;
        }
        let next = if item.visible < item.target_digits {
            item.visible + 1
        } else {
            item.visible.saturating_sub(1)
        };
        item.set_visible(doc, next);
        item.set_value(doc, item.last_value, true);
        if item.visible == item.target_digits {
            self.tasks.cancel_slot(&mut item.digit_timer);
        }
    }

    fn frame(&mut self, doc: &mut dyn Document, el: ElementId, id: TaskId, now: f64) {
        let Some(item) = self.items.iter_mut().find(|i| i.element == el) else {
            return;
        };
        if item.frame != Some(id) {
            return;
        }
        item.frame = None;
        let start = *item.start.get_or_insert(now);
        let p = if item.duration > 0.0 {
            ((now - start) / item.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let (from, to) = (item.from as f64, item.to as f64);
        let value = (from + (to - from) * ease_out_cubic(p)).round().max(0.0) as u64;
        item.last_value = value;
        item.set_value(doc, value, false);

        if p < 1.0 {
            item.frame = Some(self.tasks.request_frame(Task::Frame(el)));
        } else {
            item.stop(&mut self.tasks);
            let target = item.target_digits;
            item.set_visible(doc, target);
            item.set_value(doc, item.to, true);
        }
    }
}
