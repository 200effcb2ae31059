//! Trigger engine for entrance animations (`data-mf-animation`).
//!
//! The engine only decides *when*: it adds `mf-animate` once an element
//! crosses its trigger line and removes it again according to the repeat
//! policy. The transition itself lives in the host stylesheet, keyed on the
//! animation name and the `--mf-*` custom properties written here.

use hashbrown::HashSet;
use log::{debug, trace};

use crate::attrs;
use crate::config::AnimationOptions;
use crate::dom::{css_number, Document, HostEvent, MutationRecord};
use crate::easing::css_timing;
use crate::geometry::{is_culled, Trigger};
use crate::ids::{ElementId, TaskId};
use crate::schedule::Scheduler;
use crate::stagger::{GroupConfig, StaggerTable, ENTRANCE_TRIGGER_FALLBACK};
use crate::trigger::{parse_flag, RepeatPolicy, Watch};

/// Culling margin as a multiple of the viewport height.
pub const PRELOAD_MULTIPLIER: f64 = 1.2;
/// Quiet period before a mutation burst triggers a re-scan.
pub const RESCAN_DEBOUNCE_MS: f64 = 60.0;

pub const CLASS_INIT: &str = "mf-init";
pub const CLASS_ANIMATE: &str = "mf-animate";

pub const PROP_DISTANCE: &str = "--mf-distance";
pub const PROP_DURATION: &str = "--mf-duration";
pub const PROP_DELAY: &str = "--mf-delay";
pub const PROP_EASING: &str = "--mf-easing";
const WILL_CHANGE: &str = "will-change";
const WILL_CHANGE_VALUE: &str = "transform, opacity";

const PROPS: [&str; 4] = [PROP_DISTANCE, PROP_DURATION, PROP_DELAY, PROP_EASING];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Task {
    Update,
    Rescan,
}

/// One watched element.
#[derive(Clone, Debug, PartialEq)]
pub struct EntranceItem {
    pub element: ElementId,
    /// Element whose rectangle is tested: the stagger parent for claimed
    /// children, the element itself otherwise.
    pub anchor: ElementId,
    pub watch: Watch,
}

#[derive(Debug)]
pub struct EntranceEngine {
    options: AnimationOptions,
    items: Vec<EntranceItem>,
    stagger: StaggerTable,
    tasks: Scheduler<Task>,
    frame: Option<TaskId>,
    rescan: Option<TaskId>,
    will_change: HashSet<ElementId>,
    active: bool,
}

impl EntranceEngine {
    pub fn new(options: AnimationOptions) -> Self {
        Self {
            options,
            items: Vec::new(),
            stagger: StaggerTable::new(),
            tasks: Scheduler::new(),
            frame: None,
            rescan: None,
            will_change: HashSet::new(),
            active: false,
        }
    }

    pub fn options(&self) -> &AnimationOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: AnimationOptions) {
        self.options = options;
    }

    pub fn items(&self) -> &[EntranceItem] {
        &self.items
    }

    pub fn stagger(&self) -> &StaggerTable {
        &self.stagger
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

    /// Scans the document and starts listening. Calling it again re-scans
    /// from scratch without resetting visual state.
    pub fn init(&mut self, doc: &mut dyn Document) {
        if self.active {
            self.destroy(doc, false);
        }
        self.write_globals(doc);
        self.scan(doc);
        self.update(doc);
        self.active = true;
        trace!("entrance engine active with {} items", self.items.len());
    }

    /// Re-evaluates every item against the current geometry.
    pub fn refresh(&mut self, doc: &mut dyn Document) {
        self.update(doc);
    }

    pub fn reinit(&mut self, doc: &mut dyn Document) {
        self.destroy(doc, false);
        self.init(doc);
    }

    /// Cancels pending work and stops listening. With `reset_visual_state`
    /// the classes, custom properties and stamped stagger attributes are
    /// removed as well. Safe to call at any time.
    pub fn destroy(&mut self, doc: &mut dyn Document, reset_visual_state: bool) {
        self.tasks.clear();
        self.frame = None;
        self.rescan = None;
        self.active = false;

        for el in self.will_change.drain() {
            doc.unlisten_animation_end(el);
            if reset_visual_state {
                doc.remove_style(el, WILL_CHANGE);
            }
        }

        if reset_visual_state {
            for item in &self.items {
                doc.remove_class(item.element, CLASS_INIT);
                doc.remove_class(item.element, CLASS_ANIMATE);
                for prop in PROPS {
                    doc.remove_style(item.element, prop);
                }
                doc.remove_style(item.element, WILL_CHANGE);
            }
            let body = doc.body();
            for prop in PROPS {
                doc.remove_style(body, prop);
            }
            self.stagger.release(doc);
        }
        self.items.clear();
    }

    pub fn handle(&mut self, doc: &mut dyn Document, event: &HostEvent) {
        match event {
            HostEvent::Scroll | HostEvent::Resize if self.active => {
                if self.frame.is_none() {
                    self.frame = Some(self.tasks.request_frame(Task::Update));
                }
            }
            HostEvent::Mutations(records) if self.active => {
                if records.iter().any(|r| self.is_relevant(&*doc, r)) {
                    self.tasks.cancel_slot(&mut self.rescan);
                    self.rescan =
                        Some(self.tasks.set_timeout(doc.now(), RESCAN_DEBOUNCE_MS, Task::Rescan));
                }
            }
            HostEvent::AnimationEnd(el) => {
                if self.will_change.remove(el) {
                    doc.remove_style(*el, WILL_CHANGE);
                    doc.unlisten_animation_end(*el);
                }
            }
            _ => {}
        }
    }

    pub fn pump(&mut self, doc: &mut dyn Document) {
        for (id, task) in self.tasks.take_due(doc.now()) {
            match task {
                Task::Update => {
                    if self.frame == Some(id) {
                        self.frame = None;
                    }
                    self.update(doc);
                }
                Task::Rescan => {
                    if self.rescan == Some(id) {
                        self.rescan = None;
                    }
                    debug!("entrance engine re-scanning after mutations");
                    self.scan(doc);
                    self.update(doc);
                }
            }
        }
    }

    fn is_relevant(&self, doc: &dyn Document, record: &MutationRecord) -> bool {
        match record {
            MutationRecord::Attributes { target, name } => {
                (name == attrs::ANIMATION && !self.stagger.owns_attr(doc, *target))
                    || name == attrs::STAGGER_ANIMATION
            }
            MutationRecord::ChildList { added, removed, .. } => added
                .iter()
                .chain(removed.iter())
                .any(|n| {
                    doc.subtree_has_attr(*n, attrs::ANIMATION)
                        || doc.subtree_has_attr(*n, attrs::STAGGER_ANIMATION)
                }),
        }
    }

    fn write_globals(&self, doc: &mut dyn Document) {
        let o = &self.options;
        let body = doc.body();
        doc.set_style(body, PROP_DISTANCE, &format!("{}px", css_number(o.distance)));
        doc.set_style(body, PROP_DURATION, &format!("{}ms", css_number(o.duration)));
        doc.set_style(body, PROP_DELAY, &format!("{}ms", css_number(o.delay)));
        doc.set_style(body, PROP_EASING, css_timing(&o.easing));
    }

    /// Expands stagger groups, then builds one item per eligible element.
    fn scan(&mut self, doc: &mut dyn Document) {
        self.stagger.expand(doc, &self.options);

        let mut items = Vec::new();
        let claimed: Vec<_> = self
            .stagger
            .children()
            .map(|(el, m, g)| (el, m, g.clone()))
            .collect();
        for (el, m, group) in claimed {
            if let Some(item) = self.collect(doc, el, Some((m.parent, m.index, &group))) {
                items.push(item);
            }
        }
        for el in doc.query_attr(attrs::ANIMATION) {
            if self.stagger.is_claimed(el) {
                continue;
            }
            if doc.attr(el, attrs::ANIMATION).map_or(true, |v| v.is_empty()) {
                continue;
            }
            if let Some(item) = self.collect(doc, el, None) {
                items.push(item);
            }
        }
        self.items = items;
    }

    /// Resolves one element. Precedence: element attribute, then the stagger
    /// group, then the global options.
    fn collect(
        &self,
        doc: &mut dyn Document,
        el: ElementId,
        group: Option<(ElementId, usize, &GroupConfig)>,
    ) -> Option<EntranceItem> {
        let o = &self.options;
        let g = group.map(|(_, _, g)| g);

        let trigger = match doc.attr(el, attrs::ANIMATION_TRIGGER) {
            Some(lit) => Trigger::parse(&lit, ENTRANCE_TRIGGER_FALLBACK),
            None => match g {
                Some(g) => Ok(g.trigger),
                None => Trigger::parse(&o.trigger, ENTRANCE_TRIGGER_FALLBACK),
            },
        };
        let trigger = match trigger {
            Ok(t) => t,
            Err(err) => {
                debug!("entrance element {el:?} skipped: {err}");
                return None;
            }
        };
        let once = match doc.attr(el, attrs::ANIMATION_ONCE) {
            Some(v) => parse_flag(&v),
            None => g.map_or(o.once, |g| g.once),
        };
        let repeat = RepeatPolicy::parse(
            &doc.attr(el, attrs::ANIMATION_REPEAT)
                .unwrap_or_else(|| g.map_or_else(|| o.repeat.clone(), |g| g.repeat.clone())),
        );

        doc.add_class(el, CLASS_INIT);
        let own = |doc: &dyn Document, name: &str| doc.attr(el, name).filter(|v| !v.is_empty());
        let distance = own(&*doc, attrs::ANIMATION_DISTANCE)
            .or_else(|| g.map(|g| css_number(g.distance)));
        let duration = own(&*doc, attrs::ANIMATION_DURATION)
            .or_else(|| g.map(|g| css_number(g.duration)));
        let delay = own(&*doc, attrs::ANIMATION_DELAY)
            .or_else(|| group.map(|(_, idx, g)| css_number(g.delay_for(idx))));
        let easing = own(&*doc, attrs::ANIMATION_EASING).or_else(|| g.map(|g| g.easing.clone()));
        if let Some(v) = distance {
            doc.set_style(el, PROP_DISTANCE, &format!("{v}px"));
        }
        if let Some(v) = duration {
            doc.set_style(el, PROP_DURATION, &format!("{v}ms"));
        }
        if let Some(v) = delay {
            doc.set_style(el, PROP_DELAY, &format!("{v}ms"));
        }
        if let Some(v) = easing {
            doc.set_style(el, PROP_EASING, css_timing(&v));
        }

        let mut watch = Watch::new(trigger, once, repeat);
        watch.triggered = doc.has_class(el, CLASS_ANIMATE);
        Some(EntranceItem {
            element: el,
            anchor: group.map_or(el, |(parent, _, _)| parent),
            watch,
        })
    }

    /// Reads every rectangle first, then applies class changes.
    fn update(&mut self, doc: &mut dyn Document) {
        if self.items.is_empty() {
            return;
        }
        let vh = doc.viewport().height;
        let buffer = vh * PRELOAD_MULTIPLIER;

        let mut steps = Vec::new();
        for (idx, item) in self.items.iter_mut().enumerate() {
            if !doc.is_connected(item.element) {
                continue;
            }
            let rect = doc.rect(item.anchor);
            if is_culled(&rect, vh, buffer) {
                continue;
            }
            let step = item.watch.evaluate(&rect, vh);
            if !step.is_noop() {
                steps.push((idx, step));
            }
        }

        for (idx, step) in steps {
            let el = self.items[idx].element;
            if step.entered {
                doc.set_style(el, WILL_CHANGE, WILL_CHANGE_VALUE);
                if self.will_change.insert(el) {
                    doc.listen_animation_end(el);
                }
                doc.add_class(el, CLASS_ANIMATE);
            }
            if step.reset {
                doc.remove_class(el, CLASS_ANIMATE);
            }
        }
    }
}
