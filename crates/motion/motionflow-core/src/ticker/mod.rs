//! Infinite marquee (`data-mf-ticker`).
//!
//! Each container's children are repeated until one content block overfills
//! the visible window; the track then moves at constant speed and wraps by
//! exactly one block so the seam never shows. Three independent sources can
//! pause a ticker (user, hover, page visibility); the frame loop keeps running
//! while paused so resuming continues from the same position.

pub mod build;
pub mod registry;

use hashbrown::{HashMap, HashSet};
use log::{debug, trace};

use crate::attrs;
use crate::config::TickerOptions;
use crate::dom::{css_number, Document, HostEvent, MutationRecord};
use crate::ids::{ElementId, TaskId};
use crate::schedule::Scheduler;

pub use build::{build_strip, snap, wrap, Direction, Strip, MAX_FILL_CYCLES};
pub use registry::TickerRegistry;

/// Largest frame step in seconds; longer gaps (background tabs) are clamped.
pub const MAX_FRAME_STEP: f64 = 0.05;
/// Quiet period before a mutation burst triggers a rebuild.
pub const REBUILD_DEBOUNCE_MS: f64 = 80.0;
/// Pixels per second when neither the element nor the options give a usable speed.
pub const DEFAULT_SPEED: f64 = 80.0;
pub const CLASS_PAUSED: &str = "mf-ticker-paused";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Task {
    Frame(ElementId),
    Rebuild,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum FontWait {
    #[default]
    Idle,
    Waiting,
    Done,
}

/// Resolved per-container settings.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceConfig {
    pub speed: f64,
    pub direction: Direction,
    pub pause: bool,
    pub pause_on_hover: bool,
    pub pause_on_visibility: bool,
}

impl InstanceConfig {
    pub fn resolve(doc: &dyn Document, container: ElementId, opts: &TickerOptions) -> Self {
        // An unknown literal selects `left`, not the global direction.
        let direction = doc
            .attr(container, attrs::TICKER_DIRECTION)
            .filter(|v| !v.is_empty())
            .map_or_else(|| Direction::parse(&opts.direction), |v| Direction::parse(&v))
            .unwrap_or_default();
        let pause_on_visibility = match doc.attr(container, attrs::TICKER_PAUSE_ON_VISIBILITY).as_deref() {
            Some("true") => true,
            Some("false") => false,
            _ => opts.pause_on_visibility_change,
        };
        // Direction carries the sign; anything but a positive finite speed
        // falls back to the global one.
        let usable = |v: &f64| v.is_finite() && *v > 0.0;
        let speed = attrs::number(doc, container, attrs::TICKER_SPEED)
            .filter(usable)
            .or_else(|| Some(opts.speed).filter(usable))
            .unwrap_or(DEFAULT_SPEED);
        let hover_attr = doc.attr(container, attrs::TICKER_PAUSE_ON_HOVER).as_deref() == Some("true");
        Self {
            speed,
            direction,
            pause: opts.pause,
            pause_on_hover: !opts.pause && (hover_attr || opts.pause_on_hover),
            pause_on_visibility,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TickerInstance {
    pub container: ElementId,
    pub strip: Strip,
    pub config: InstanceConfig,
    pos: f64,
    paused_by_user: bool,
    paused_by_hover: bool,
    paused_by_visibility: bool,
    hover_listening: bool,
    last_t: f64,
    frame: Option<TaskId>,
}

impl TickerInstance {
    /// Current offset of the track along the motion axis.
    pub fn position(&self) -> f64 {
        self.pos
    }

    pub fn loop_size(&self) -> f64 {
        self.strip.loop_size
    }

    pub fn is_paused(&self) -> bool {
        self.paused_by_user || self.paused_by_hover || self.paused_by_visibility
    }

    pub fn is_paused_by_user(&self) -> bool {
        self.paused_by_user
    }

    fn sync_class(&self, doc: &mut dyn Document) {
        doc.toggle_class(self.container, CLASS_PAUSED, self.is_paused());
    }

    fn apply_transform(&self, doc: &mut dyn Document, dpr: f64) {
        let s = css_number(snap(self.pos, dpr));
        let value = if self.config.direction.is_horizontal() {
            format!("translate3d({s}px,0,0)")
        } else {
            format!("translate3d(0,{s}px,0)")
        };
        doc.set_style(self.strip.track, "transform", &value);
    }

    fn set_user_paused(&mut self, doc: &mut dyn Document, paused: bool) {
        self.paused_by_user = paused;
        self.sync_class(doc);
    }
}

/// Every ticker in one document.
#[derive(Debug)]
pub struct Ticker {
    options: TickerOptions,
    instances: Vec<TickerInstance>,
    /// Children captured the first time a container was seen.
    originals: HashMap<ElementId, Vec<ElementId>>,
    tasks: Scheduler<Task>,
    rebuild_timer: Option<TaskId>,
    fonts: FontWait,
    images_waiting: HashSet<ElementId>,
    images_done: HashSet<ElementId>,
    dpr: f64,
    can_hover: bool,
    inert: bool,
    active: bool,
}

impl Ticker {
    pub fn new(options: TickerOptions) -> Self {
        Self::with_originals(options, HashMap::new())
    }

    /// Resumes with children cached by an earlier ticker on the same
    /// document.
    pub fn with_originals(options: TickerOptions, originals: HashMap<ElementId, Vec<ElementId>>) -> Self {
        Self {
            options,
            instances: Vec::new(),
            originals,
            tasks: Scheduler::new(),
            rebuild_timer: None,
            fonts: FontWait::Idle,
            images_waiting: HashSet::new(),
            images_done: HashSet::new(),
            dpr: 1.0,
            can_hover: false,
            inert: false,
            active: false,
        }
    }

    pub fn options(&self) -> &TickerOptions {
        &self.options
    }

    pub fn update_options(&mut self, options: TickerOptions) {
        self.options = options;
    }

    pub fn instances(&self) -> &[TickerInstance] {
        &self.instances
    }

    pub fn instance(&self, container: ElementId) -> Option<&TickerInstance> {
        self.instances.iter().find(|i| i.container == container)
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

    pub(crate) fn take_originals(&mut self) -> HashMap<ElementId, Vec<ElementId>> {
        std::mem::take(&mut self.originals)
    }

    /// Builds every ticker and starts observing. Safe to call repeatedly.
    /// Under reduced motion the ticker stays inert and every call is a no-op.
    pub fn init(&mut self, doc: &mut dyn Document) {
        if !self.active {
            let media = doc.media();
            self.inert = media.reduced_motion;
            self.can_hover = media.can_hover;
            self.dpr = match doc.viewport().device_pixel_ratio {
                d if d > 0.0 && d.is_finite() => d,
                _ => 1.0,
            };
        }
        if self.inert {
            return;
        }
        self.active = true;
        self.rebuild(doc);
        if self.fonts == FontWait::Idle && doc.await_fonts() {
            self.fonts = FontWait::Waiting;
        }
    }

    pub fn refresh(&mut self, doc: &mut dyn Document) {
        if self.active {
            self.rebuild(doc);
        }
    }

    /// Stops every loop and listener. With `reset_visual_state` containers
    /// get their original children back.
    pub fn destroy(&mut self, doc: &mut dyn Document, reset_visual_state: bool) {
        for inst in std::mem::take(&mut self.instances) {
            self.cancel(doc, &inst);
            if reset_visual_state {
                doc.remove_class(inst.container, CLASS_PAUSED);
            }
        }
        self.tasks.clear();
        self.rebuild_timer = None;
        self.fonts = FontWait::Idle;
        self.images_waiting.clear();
        self.active = false;

        if reset_visual_state {
            for (container, nodes) in self.originals.drain() {
                doc.clear_children(container);
                for node in nodes {
                    doc.append_child(container, node);
                }
            }
        }
    }

    pub fn pause(&mut self, doc: &mut dyn Document, targets: Option<&[ElementId]>) {
        for inst in self.instances.iter_mut().filter(|i| selected(i, targets)) {
            inst.set_user_paused(doc, true);
        }
    }

    pub fn play(&mut self, doc: &mut dyn Document, targets: Option<&[ElementId]>) {
        for inst in self.instances.iter_mut().filter(|i| selected(i, targets)) {
            inst.set_user_paused(doc, false);
        }
    }

    /// Flips each selected ticker's effective paused state.
    pub fn toggle(&mut self, doc: &mut dyn Document, targets: Option<&[ElementId]>) {
        for inst in self.instances.iter_mut().filter(|i| selected(i, targets)) {
            let paused = inst.is_paused();
            inst.set_user_paused(doc, !paused);
        }
    }

    pub fn handle(&mut self, doc: &mut dyn Document, event: &HostEvent) {
        if !self.active {
            return;
        }
        match event {
            HostEvent::Mutations(records) => {
                if records.iter().any(|r| touches_ticker(&*doc, r)) {
                    self.tasks.cancel_slot(&mut self.rebuild_timer);
                    self.rebuild_timer =
                        Some(self.tasks.set_timeout(doc.now(), REBUILD_DEBOUNCE_MS, Task::Rebuild));
                }
            }
            HostEvent::VisibilityChange => {
                let hidden = doc.is_hidden();
                let now = doc.now();
                for inst in self.instances.iter_mut().filter(|i| i.config.pause_on_visibility) {
                    inst.paused_by_visibility = hidden;
                    inst.last_t = now;
                    inst.sync_class(doc);
                }
            }
            HostEvent::PointerEnter(el) => {
                if let Some(inst) = self.hovered(*el) {
                    if !inst.paused_by_user && !inst.paused_by_visibility {
                        inst.paused_by_hover = true;
                        inst.sync_class(doc);
                    }
                }
            }
            HostEvent::PointerLeave(el) => {
                if let Some(inst) = self.hovered(*el) {
                    inst.paused_by_hover = false;
                    inst.sync_class(doc);
                }
            }
            HostEvent::FontsReady => {
                if self.fonts == FontWait::Waiting {
                    self.fonts = FontWait::Done;
                    trace!("fonts ready, rebuilding tickers");
                    self.rebuild(doc);
                }
            }
            HostEvent::ImagesSettled(container) => {
                if self.images_waiting.remove(container) {
                    self.images_done.insert(*container);
                    trace!("images settled in {container:?}, rebuilding tickers");
                    self.rebuild(doc);
                }
            }
            _ => {}
        }
    }

    pub fn pump(&mut self, doc: &mut dyn Document) {
        let now = doc.now();
        for (id, task) in self.tasks.take_due(now) {
            match task {
                Task::Frame(container) => self.advance(doc, container, id, now),
                Task::Rebuild => {
                    if self.rebuild_timer == Some(id) {
                        self.rebuild_timer = None;
                        self.rebuild(doc);
                    }
                }
            }
        }
    }

    fn hovered(&mut self, viewport: ElementId) -> Option<&mut TickerInstance> {
        self.instances
            .iter_mut()
            .find(|i| i.hover_listening && i.strip.viewport == viewport)
    }

    fn cancel(&mut self, doc: &mut dyn Document, inst: &TickerInstance) {
        if let Some(id) = inst.frame {
            self.tasks.cancel(id);
        }
        if inst.hover_listening {
            doc.unlisten_hover(inst.strip.viewport);
        }
    }

    /// Tears every instance down and builds again from the cached
    /// originals, keeping each container's user pause.
    fn rebuild(&mut self, doc: &mut dyn Document) {
        let mut user_paused = HashSet::new();
        for inst in std::mem::take(&mut self.instances) {
            if inst.paused_by_user {
                user_paused.insert(inst.container);
            }
            self.cancel(doc, &inst);
        }

        for container in doc.query_attr(attrs::TICKER) {
            if self.instances.iter().any(|i| i.container == container) {
                continue;
            }
            if let Some(mut inst) = self.setup(doc, container) {
                if user_paused.contains(&container) {
                    inst.set_user_paused(doc, true);
                }
                self.instances.push(inst);
            }
        }
    }

    fn setup(&mut self, doc: &mut dyn Document, container: ElementId) -> Option<TickerInstance> {
        let originals = self
            .originals
            .entry(container)
            .or_insert_with(|| doc.children(container))
            .clone();
        if originals.is_empty() {
            debug!("ticker {container:?} not built: no children, will retry");
            return None;
        }

        if !self.images_done.contains(&container)
            && !self.images_waiting.contains(&container)
            && doc.await_images(container)
        {
            self.images_waiting.insert(container);
        }

        let config = InstanceConfig::resolve(&*doc, container, &self.options);
        let strip = match build_strip(doc, container, &originals, config.direction) {
            Ok(strip) => strip,
            Err(err) => {
                debug!("ticker {container:?} not built: {err}, will retry");
                return None;
            }
        };
        trace!(
            "ticker {container:?} built: loop {} after {} cycles",
            strip.loop_size,
            strip.cycles
        );

        let pos = if config.direction.is_positive() {
            -strip.loop_size
        } else {
            0.0
        };
        let hover_listening = config.pause_on_hover && self.can_hover;
        if hover_listening {
            doc.listen_hover(strip.viewport);
        }
        let paused_by_visibility = config.pause_on_visibility && doc.is_hidden();
        let mut inst = TickerInstance {
            container,
            strip,
            pos,
            paused_by_user: config.pause,
            paused_by_hover: false,
            paused_by_visibility,
            hover_listening,
            last_t: doc.now(),
            frame: None,
            config,
        };
        inst.apply_transform(doc, self.dpr);
        inst.sync_class(doc);
        inst.frame = Some(self.tasks.request_frame(Task::Frame(container)));
        Some(inst)
    }

    fn advance(&mut self, doc: &mut dyn Document, container: ElementId, id: TaskId, now: f64) {
        let dpr = self.dpr;
        let Some(inst) = self.instances.iter_mut().find(|i| i.container == container) else {
            return;
        };
        if inst.frame != Some(id) {
            return;
        }
        let dt = ((now - inst.last_t) / 1000.0).clamp(0.0, MAX_FRAME_STEP);
        inst.last_t = now;

        if !inst.is_paused() {
            let delta = inst.config.speed * dt;
            let positive = inst.config.direction.is_positive();
            let moved = if positive { inst.pos + delta } else { inst.pos - delta };
            inst.pos = wrap(moved, inst.strip.loop_size, positive);
            inst.apply_transform(doc, dpr);
        }
        inst.frame = Some(self.tasks.request_frame(Task::Frame(container)));
    }
}

fn selected(inst: &TickerInstance, targets: Option<&[ElementId]>) -> bool {
    targets.map_or(true, |t| t.contains(&inst.container))
}

/// Attribute changes named `data-mf-ticker*`, or added/removed nodes that
/// are or contain a ticker.
fn touches_ticker(doc: &dyn Document, record: &MutationRecord) -> bool {
    match record {
        MutationRecord::Attributes { name, .. } => name.starts_with(attrs::TICKER_PREFIX),
        MutationRecord::ChildList { added, removed, .. } => added
            .iter()
            .chain(removed.iter())
            .any(|n| doc.subtree_has_attr(*n, attrs::TICKER)),
    }
}
