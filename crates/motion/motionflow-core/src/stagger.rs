//! Stagger groups.
//!
//! A stagger parent hands its configuration to its children and offsets each
//! child by its position: entrance groups add `index × gap` to the delay,
//! parallax groups add `step × weight` to the speed. Membership is kept in a
//! side table keyed by the child so that repeated expansion never stacks
//! offsets and teardown knows exactly which attributes it wrote.

use hashbrown::HashMap;
use log::debug;

use crate::attrs;
use crate::config::{AnimationOptions, Breakpoint, ParallaxStaggerOptions, DEFAULT_STAGGER_GAP};
use crate::dom::Document;
use crate::geometry::Trigger;
use crate::ids::ElementId;

/// Fallback viewport percentage for entrance trigger literals without a
/// recognised second token.
pub const ENTRANCE_TRIGGER_FALLBACK: f64 = 70.0;

/// Resolved configuration of one entrance stagger parent.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupConfig {
    pub animation: String,
    pub base_delay: f64,
    pub gap: f64,
    pub distance: f64,
    pub duration: f64,
    pub easing: String,
    pub once: bool,
    pub repeat: String,
    pub trigger: Trigger,
}

impl GroupConfig {
    /// Reads a parent's `data-mf-stagger-*` attributes over the global
    /// options. Returns `None` when the group's trigger literal is malformed.
    pub fn resolve(doc: &dyn Document, parent: ElementId, opts: &AnimationOptions) -> Option<Self> {
        let s = &opts.stagger;
        let animation = doc.attr(parent, attrs::STAGGER_ANIMATION)?;
        let trigger_literal = doc
            .attr(parent, attrs::STAGGER_TRIGGER)
            .or_else(|| s.trigger.clone())
            .unwrap_or_else(|| opts.trigger.clone());
        let trigger = match Trigger::parse(&trigger_literal, ENTRANCE_TRIGGER_FALLBACK) {
            Ok(t) => t,
            Err(err) => {
                debug!("stagger group {parent:?} skipped: {err}");
                return None;
            }
        };
        Some(Self {
            animation,
            base_delay: attrs::number(doc, parent, attrs::STAGGER_DELAY)
                .or(s.delay)
                .unwrap_or(opts.delay),
            gap: attrs::number(doc, parent, attrs::STAGGER_GAP)
                .or(s.gap)
                .unwrap_or(DEFAULT_STAGGER_GAP),
            distance: attrs::number(doc, parent, attrs::STAGGER_DISTANCE)
                .or(s.distance)
                .unwrap_or(opts.distance),
            duration: attrs::number(doc, parent, attrs::STAGGER_DURATION)
                .or(s.duration)
                .unwrap_or(opts.duration),
            easing: doc
                .attr(parent, attrs::STAGGER_EASING)
                .or_else(|| s.easing.clone())
                .unwrap_or_else(|| opts.easing.clone()),
            once: doc
                .attr(parent, attrs::STAGGER_ONCE)
                .map(|v| crate::trigger::parse_flag(&v))
                .or(s.once)
                .unwrap_or(opts.once),
            repeat: doc
                .attr(parent, attrs::STAGGER_REPEAT)
                .or_else(|| s.repeat.clone())
                .unwrap_or_else(|| opts.repeat.clone()),
            trigger,
        })
    }

    /// Delay for the child at `index` (position among all of the parent's
    /// children, ignored ones included).
    #[inline]
    pub fn delay_for(&self, index: usize) -> f64 {
        self.base_delay + index as f64 * self.gap
    }
}

/// A child claimed by an entrance stagger parent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Membership {
    pub parent: ElementId,
    pub index: usize,
}

/// Side table of entrance stagger groups.
#[derive(Debug, Default)]
pub struct StaggerTable {
    groups: Vec<(ElementId, GroupConfig)>,
    /// Claimed children in expansion order.
    order: Vec<ElementId>,
    members: HashMap<ElementId, Membership>,
}

impl StaggerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn membership(&self, el: ElementId) -> Option<Membership> {
        self.members.get(&el).copied()
    }

    pub fn is_claimed(&self, el: ElementId) -> bool {
        self.members.contains_key(&el)
    }

    pub fn group(&self, parent: ElementId) -> Option<&GroupConfig> {
        self.groups
            .iter()
            .find_map(|(p, g)| (*p == parent).then_some(g))
    }

    /// Claimed children with their group, in expansion order.
    pub fn children(&self) -> impl Iterator<Item = (ElementId, Membership, &GroupConfig)> + '_ {
        self.order.iter().filter_map(move |el| {
            let m = self.members.get(el)?;
            let g = self.group(m.parent)?;
            Some((*el, *m, g))
        })
    }

    /// Animation name this table wrote on `el`, if it claimed it.
    fn stamped(&self, el: ElementId) -> Option<&str> {
        let m = self.members.get(&el)?;
        self.group(m.parent).map(|g| g.animation.as_str())
    }

    /// True while `el` still carries the name this table wrote. An author
    /// overwrite turns the child standalone.
    pub fn owns_attr(&self, doc: &dyn Document, el: ElementId) -> bool {
        self.stamped(el).is_some() && doc.attr(el, attrs::ANIMATION).as_deref() == self.stamped(el)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Expands every stagger parent in the document. Children keep their
    /// claim across runs; only changed or released children are written, so
    /// expansion is idempotent.
    pub fn expand(&mut self, doc: &mut dyn Document, opts: &AnimationOptions) {
        let mut groups = Vec::new();
        let mut order = Vec::new();
        let mut members = HashMap::new();

        for parent in doc.query_attr(attrs::STAGGER_ANIMATION) {
            let Some(group) = GroupConfig::resolve(&*doc, parent, opts) else {
                continue;
            };
            for (index, child) in doc.children(parent).into_iter().enumerate() {
                if doc.has_attr(child, attrs::STAGGER_IGNORE) {
                    continue;
                }
                // Children with their own animation are standalone, unless
                // the attribute is still the one this table stamped.
                if doc.has_attr(child, attrs::ANIMATION) && !self.owns_attr(&*doc, child) {
                    continue;
                }
                if members.contains_key(&child) {
                    continue;
                }
                members.insert(child, Membership { parent, index });
                order.push(child);
            }
            groups.push((parent, group));
        }

        // Release children that are no longer claimed.
        for el in &self.order {
            if !members.contains_key(el) && self.owns_attr(&*doc, *el) {
                doc.remove_attr(*el, attrs::ANIMATION);
            }
        }

        // Stamp the animation name the stylesheet keys on.
        for el in &order {
            let m = members[el];
            let Some(name) = groups
                .iter()
                .find_map(|(p, g): &(ElementId, GroupConfig)| (*p == m.parent).then_some(g.animation.as_str()))
            else {
                continue;
            };
            if doc.attr(*el, attrs::ANIMATION).as_deref() != Some(name) {
                doc.set_attr(*el, attrs::ANIMATION, name);
            }
        }

        self.groups = groups;
        self.order = order;
        self.members = members;
    }

    /// Removes every stamped attribute and forgets all groups.
    pub fn release(&mut self, doc: &mut dyn Document) {
        for el in std::mem::take(&mut self.order) {
            if self.owns_attr(&*doc, el) {
                doc.remove_attr(el, attrs::ANIMATION);
            }
        }
        self.members.clear();
        self.groups.clear();
    }
}

/// Direction in which parallax stagger speeds grow.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StaggerDirection {
    Left,
    Right,
    Center,
}

impl StaggerDirection {
    /// Unknown directions behave like `left`.
    pub fn parse(literal: &str) -> Self {
        match literal.trim().to_lowercase().as_str() {
            "right" => StaggerDirection::Right,
            "center" => StaggerDirection::Center,
            _ => StaggerDirection::Left,
        }
    }

    /// Multiplier applied to the step for child `index` of `n`.
    pub fn weight(self, index: usize, n: usize) -> f64 {
        match self {
            StaggerDirection::Left => index as f64,
            StaggerDirection::Right => (n - 1 - index) as f64,
            StaggerDirection::Center => {
                let center = (n - 1) / 2;
                (index as f64 - center as f64).abs()
            }
        }
    }
}

/// Per-child speeds for a parallax stagger group, rounded to three decimals.
pub fn parallax_speeds(base: f64, step: f64, direction: StaggerDirection, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let speed = base + step * direction.weight(i, n);
            (speed * 1000.0).round() / 1000.0
        })
        .collect()
}

/// Expands every `data-mf-parallax-stagger` parent into locked per-child
/// speeds for breakpoint `bp`.
pub fn expand_parallax(
    doc: &dyn Document,
    opts: &ParallaxStaggerOptions,
    bp: Breakpoint,
) -> Vec<(ElementId, f64)> {
    let mut out = Vec::new();
    for parent in doc.query_attr(attrs::PARALLAX_STAGGER) {
        let base = breakpoint_attr(
            doc,
            parent,
            bp,
            [
                attrs::PARALLAX_STAGGER_SPEED_MOBILE,
                attrs::PARALLAX_STAGGER_SPEED_TABLET,
                attrs::PARALLAX_STAGGER_SPEED,
            ],
        )
        .unwrap_or_else(|| opts.speeds().pick(bp));
        let step = breakpoint_attr(
            doc,
            parent,
            bp,
            [
                attrs::PARALLAX_STAGGER_STEP_MOBILE,
                attrs::PARALLAX_STAGGER_STEP_TABLET,
                attrs::PARALLAX_STAGGER_STEP,
            ],
        )
        .unwrap_or_else(|| opts.steps().pick(bp));
        let base = if base.is_finite() { base } else { 0.0 };
        let step = if step.is_finite() { step } else { 0.0 };
        let direction = StaggerDirection::parse(
            &doc
                .attr(parent, attrs::PARALLAX_STAGGER_DIRECTION)
                .unwrap_or_else(|| opts.direction.clone()),
        );

        let children: Vec<ElementId> = doc
            .children(parent)
            .into_iter()
            .filter(|c| !doc.has_attr(*c, attrs::PARALLAX_STAGGER_IGNORE))
            .collect();
        if children.is_empty() {
            continue;
        }
        let speeds = parallax_speeds(base, step, direction, children.len());
        out.extend(children.into_iter().zip(speeds));
    }
    out
}

/// Picks the first present attribute of `[mobile, tablet, any]` that applies
/// at `bp`, with `parseFloat` semantics. A present but unparsable attribute
/// resolves to 0.
pub(crate) fn breakpoint_attr(
    doc: &dyn Document,
    el: ElementId,
    bp: Breakpoint,
    [mobile, tablet, any]: [&str; 3],
) -> Option<f64> {
    let read = |name: &str| doc.attr(el, name).map(|v| attrs::parse_float_prefix(&v).unwrap_or(0.0));
    if bp == Breakpoint::Mobile {
        if let Some(v) = read(mobile) {
            return Some(v);
        }
    }
    if matches!(bp, Breakpoint::Mobile | Breakpoint::Tablet) {
        if let Some(v) = read(tablet) {
            return Some(v);
        }
    }
    read(any)
}
