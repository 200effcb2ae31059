//! Text effects (`data-mf-text-type`).
//!
//! * `loop` cycles through the element's children, re-using the entrance
//!   stylesheet: each child is tagged with `data-mf-animation` and the
//!   current one gets `mf-animate`.
//! * `typing` types each child's text, waits, deletes it and moves on, with
//!   an optional cursor and a screen-reader live region holding the full
//!   string.

use log::trace;

use crate::attrs;
use crate::config::{TextLoopOptions, TextOptions, TypingOptions};
use crate::dom::{css_number, Document};
use crate::easing::css_timing;
use crate::entrance::{CLASS_ANIMATE, PROP_DISTANCE, PROP_DURATION, PROP_EASING};
use crate::ids::{ElementId, TaskId};
use crate::schedule::Scheduler;

pub const CLASS_SR_ONLY: &str = "mf-sr-only";
pub const CLASS_CURSOR: &str = "mf-typing-cursor";
pub const CLASS_CURSOR_STATIC: &str = "mf-typing-cursor-static";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Task {
    /// First child's entrance, one frame after setup.
    LoopStart(ElementId),
    LoopNext(ElementId),
    Type(ElementId),
    /// Pause after a fully typed string is over.
    StartDelete(ElementId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextKind {
    Loop,
    Typing,
}

#[derive(Clone, Debug, PartialEq)]
struct LoopState {
    children: Vec<ElementId>,
    index: usize,
    start: Option<TaskId>,
    timer: Option<TaskId>,
}

#[derive(Clone, Debug, PartialEq)]
struct TypingState {
    original_html: String,
    strings: Vec<Vec<char>>,
    text_index: usize,
    char_index: usize,
    deleting: bool,
    speed: f64,
    delete_speed: f64,
    interval: f64,
    repeat: bool,
    live_region: ElementId,
    text: ElementId,
    cursor: Option<ElementId>,
    timer: Option<TaskId>,
}

#[derive(Clone, Debug, PartialEq)]
enum State {
    Loop(LoopState),
    Typing(TypingState),
    /// Reduced motion: content shown statically. Typing keeps the markup to
    /// restore.
    Static { restore_html: Option<String> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextInstance {
    pub element: ElementId,
    pub kind: TextKind,
    state: State,
}

impl TextInstance {
    /// Index of the visible loop child or of the string being typed.
    pub fn current_index(&self) -> Option<usize> {
        match &self.state {
            State::Loop(s) => Some(s.index),
            State::Typing(s) => Some(s.text_index),
            State::Static { .. } => None,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self.state, State::Static { .. })
    }
}

#[derive(Debug)]
pub struct TextEffects {
    options: TextOptions,
    instances: Vec<TextInstance>,
    tasks: Scheduler<Task>,
    active: bool,
}

impl TextEffects {
    pub fn new(options: TextOptions) -> Self {
        Self {
            options,
            instances: Vec::new(),
            tasks: Scheduler::new(),
            active: false,
        }
    }

    pub fn instances(&self) -> &[TextInstance] {
        &self.instances
    }

    pub fn instance(&self, el: ElementId) -> Option<&TextInstance> {
        self.instances.iter().find(|i| i.element == el)
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

    /// Sets up every text effect. A second call restores and starts over.
    pub fn init(&mut self, doc: &mut dyn Document) {
        if self.active {
            self.destroy(doc, true);
        }
        self.active = true;
        let reduced = doc.media().reduced_motion;
        for el in doc.query_attr(attrs::TEXT_TYPE) {
            if self.instances.iter().any(|i| i.element == el) {
                continue;
            }
            let instance = match doc.attr(el, attrs::TEXT_TYPE).as_deref() {
                Some("loop") => self.setup_loop(doc, el, reduced),
                Some("typing") => self.setup_typing(doc, el, reduced),
                _ => None,
            };
            if let Some(instance) = instance {
                self.instances.push(instance);
            }
        }
        trace!("text effects active with {} instances", self.instances.len());
    }

    pub fn refresh(&mut self, doc: &mut dyn Document) {
        self.init(doc);
    }

    pub fn destroy(&mut self, doc: &mut dyn Document, reset_visual_state: bool) {
        self.tasks.clear();
        for inst in self.instances.drain(..) {
            if !reset_visual_state {
                continue;
            }
            match inst.state {
                State::Loop(s) => {
                    for child in s.children {
                        doc.remove_style(child, "display");
                        doc.remove_style(child, "white-space");
                        doc.remove_class(child, CLASS_ANIMATE);
                        doc.remove_style(child, PROP_DURATION);
                        doc.remove_style(child, PROP_EASING);
                        doc.remove_style(child, PROP_DISTANCE);
                        doc.remove_attr(child, attrs::ANIMATION);
                    }
                }
                State::Typing(s) => doc.set_inner_html(inst.element, &s.original_html),
                State::Static {
                    restore_html: Some(html),
                } => doc.set_inner_html(inst.element, &html),
                State::Static { restore_html: None } => {}
            }
        }
        self.active = false;
    }

    pub fn pump(&mut self, doc: &mut dyn Document) {
        let now = doc.now();
        for (id, task) in self.tasks.take_due(now) {
            let el = match task {
                Task::LoopStart(el) | Task::LoopNext(el) | Task::Type(el) | Task::StartDelete(el) => el,
            };
            let Some(inst) = self.instances.iter_mut().find(|i| i.element == el) else {
                continue;
            };
            match (&mut inst.state, task) {
                (State::Loop(s), Task::LoopStart(_)) if s.start == Some(id) => {
                    s.start = None;
                    if let Some(first) = s.children.first() {
                        doc.add_class(*first, CLASS_ANIMATE);
                    }
                }
                (State::Loop(s), Task::LoopNext(_)) if s.timer == Some(id) => show_next(doc, s),
                (State::Typing(s), Task::Type(_)) if s.timer == Some(id) => {
                    s.timer = None;
                    type_tick(doc, &mut self.tasks, el, s, now);
                }
                (State::Typing(s), Task::StartDelete(_)) if s.timer == Some(id) => {
                    s.timer = None;
                    s.deleting = true;
                    type_tick(doc, &mut self.tasks, el, s, now);
                }
                _ => {}
            }
        }
    }

    fn setup_loop(&mut self, doc: &mut dyn Document, el: ElementId, reduced: bool) -> Option<TextInstance> {
        let children: Vec<ElementId> = doc
            .children(el)
            .into_iter()
            .filter(|c| !doc.text(*c).trim().is_empty())
            .collect();
        if children.is_empty() {
            return None;
        }
        if reduced {
            for (i, child) in children.iter().enumerate() {
                doc.set_style(*child, "display", if i == 0 { "" } else { "none" });
            }
            return Some(TextInstance {
                element: el,
                kind: TextKind::Loop,
                state: State::Static { restore_html: None },
            });
        }

        let cfg: &TextLoopOptions = &self.options.cycle;
        let interval = attrs::number(&*doc, el, attrs::TEXT_LOOP_INTERVAL).unwrap_or(cfg.interval);
        let animation = doc
            .attr(el, attrs::TEXT_LOOP_ANIMATION)
            .unwrap_or_else(|| cfg.animation.clone());
        let duration = attrs::number(&*doc, el, attrs::TEXT_LOOP_DURATION).unwrap_or(cfg.duration);
        let easing = doc
            .attr(el, attrs::TEXT_LOOP_EASING)
            .unwrap_or_else(|| cfg.easing.clone());
        let distance = doc
            .attr(el, attrs::TEXT_LOOP_DISTANCE)
            .unwrap_or_else(|| css_number(cfg.distance));

        for (i, child) in children.iter().enumerate() {
            let child = *child;
            doc.set_style(child, "white-space", "nowrap");
            doc.set_style(child, "display", if i == 0 { "inline-block" } else { "none" });
            doc.set_attr(child, attrs::ANIMATION, &animation);
            doc.set_style(child, PROP_DURATION, &format!("{}ms", css_number(duration)));
            doc.set_style(child, PROP_EASING, css_timing(&easing));
            doc.set_style(child, PROP_DISTANCE, &format!("{distance}px"));
            doc.remove_class(child, CLASS_ANIMATE);
        }

        let start = Some(self.tasks.request_frame(Task::LoopStart(el)));
        let timer = Some(self.tasks.set_interval(doc.now(), interval, Task::LoopNext(el)));
        Some(TextInstance {
            element: el,
            kind: TextKind::Loop,
            state: State::Loop(LoopState {
                children,
                index: 0,
                start,
                timer,
            }),
        })
    }

    fn setup_typing(&mut self, doc: &mut dyn Document, el: ElementId, reduced: bool) -> Option<TextInstance> {
        let original_html = doc.inner_html(el);
        let strings: Vec<String> = doc
            .children(el)
            .into_iter()
            .map(|c| doc.text(c).trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let first = strings.first()?.clone();
        if reduced {
            doc.set_text(el, &first);
            return Some(TextInstance {
                element: el,
                kind: TextKind::Typing,
                state: State::Static {
                    restore_html: Some(original_html),
                },
            });
        }

        let cfg: &TypingOptions = &self.options.typing;
        let speed = attrs::number(&*doc, el, attrs::TEXT_TYPING_SPEED).unwrap_or(cfg.speed);
        let delete_speed =
            attrs::number(&*doc, el, attrs::TEXT_TYPING_DELETE_SPEED).unwrap_or(cfg.delete_speed);
        let interval = attrs::number(&*doc, el, attrs::TEXT_TYPING_INTERVAL).unwrap_or(cfg.interval);
        let repeat = attrs::boolish(&*doc, el, attrs::TEXT_TYPING_LOOP, cfg.repeat);
        let show_cursor = attrs::boolish(&*doc, el, attrs::TEXT_TYPING_CURSOR, cfg.cursor);
        let cursor_char = doc
            .attr(el, attrs::TEXT_TYPING_CURSOR_CHAR)
            .unwrap_or_else(|| cfg.cursor_char.clone());
        let blink = attrs::boolish(&*doc, el, attrs::TEXT_TYPING_CURSOR_BLINK, cfg.cursor_blink);

        doc.clear_children(el);

        let live_region = doc.create_element("span");
        doc.add_class(live_region, CLASS_SR_ONLY);
        doc.set_attr(live_region, "aria-live", "polite");
        doc.set_attr(live_region, "aria-atomic", "true");
        doc.set_text(live_region, &first);

        let visual = doc.create_element("span");
        doc.set_attr(visual, "aria-hidden", "true");
        let text = doc.create_element("span");
        doc.append_child(visual, text);

        let cursor = show_cursor.then(|| {
            let cursor = doc.create_element("span");
            doc.add_class(cursor, CLASS_CURSOR);
            doc.set_text(cursor, &cursor_char);
            doc.set_attr(cursor, "aria-hidden", "true");
            if !blink {
                doc.add_class(cursor, CLASS_CURSOR_STATIC);
            }
            doc.append_child(visual, cursor);
            cursor
        });

        doc.append_child(el, live_region);
        doc.append_child(el, visual);

        let mut state = TypingState {
            original_html,
            strings: strings.iter().map(|s| s.chars().collect()).collect(),
            text_index: 0,
            char_index: 0,
            deleting: false,
            speed,
            delete_speed,
            interval,
            repeat,
            live_region,
            text,
            cursor,
            timer: None,
        };
        let now = doc.now();
        type_tick(doc, &mut self.tasks, el, &mut state, now);
        Some(TextInstance {
            element: el,
            kind: TextKind::Typing,
            state: State::Typing(state),
        })
    }
}

fn show_next(doc: &mut dyn Document, s: &mut LoopState) {
    let current = s.children[s.index];
    doc.remove_class(current, CLASS_ANIMATE);
    doc.set_style(current, "display", "none");

    s.index = (s.index + 1) % s.children.len();
    let next = s.children[s.index];
    doc.set_style(next, "display", "inline-block");
    doc.set_style(next, "transition", "none");
    doc.remove_class(next, CLASS_ANIMATE);
    doc.force_reflow(next);
    doc.set_style(next, "transition", "");
    doc.add_class(next, CLASS_ANIMATE);
}

/// One typing step: add or remove a character, then schedule the next one.
fn type_tick(doc: &mut dyn Document, tasks: &mut Scheduler<Task>, el: ElementId, s: &mut TypingState, now: f64) {
    let current = &s.strings[s.text_index];
    if !s.deleting {
        s.char_index += 1;
        let shown: String = current[..s.char_index.min(current.len())].iter().collect();
        doc.set_text(s.text, &shown);
        if s.char_index >= current.len() {
            doc.set_text(s.live_region, &shown);
            if !s.repeat && s.text_index == s.strings.len() - 1 {
                if let Some(cursor) = s.cursor {
                    doc.set_style(cursor, "display", "none");
                }
                return;
            }
            s.timer = Some(tasks.set_timeout(now, s.interval, Task::StartDelete(el)));
            return;
        }
    } else {
        s.char_index = s.char_index.saturating_sub(1);
        let shown: String = current[..s.char_index.min(current.len())].iter().collect();
        doc.set_text(s.text, &shown);
        if s.char_index == 0 {
            s.deleting = false;
            s.text_index += 1;
            if !s.repeat && s.text_index >= s.strings.len() {
                s.text_index = s.strings.len() - 1;
                return;
            }
            s.text_index %= s.strings.len();
        }
    }
    let delay = if s.deleting { s.delete_speed } else { s.speed };
    s.timer = Some(tasks.set_timeout(now, delay, Task::Type(el)));
}
