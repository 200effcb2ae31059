//! Entered/exited state machine shared by entrance animations, counters and
//! rollers.

use serde::{Deserialize, Serialize};

use crate::dom::Rect;
use crate::geometry::{placement, Trigger};

/// How a triggered element re-arms after leaving the viewport.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatPolicy {
    /// Reset once the element scrolled off the top.
    Top,
    /// Reset once the element dropped below the fold.
    Bottom,
    #[default]
    Both,
    /// Never reset.
    None,
}

impl RepeatPolicy {
    /// Unknown literals never reset.
    pub fn parse(literal: &str) -> Self {
        match literal.trim().to_lowercase().as_str() {
            "top" => RepeatPolicy::Top,
            "bottom" => RepeatPolicy::Bottom,
            "both" => RepeatPolicy::Both,
            _ => RepeatPolicy::None,
        }
    }

    #[inline]
    pub fn matches_exit(self, above: bool, below: bool) -> bool {
        match self {
            RepeatPolicy::Top => above,
            RepeatPolicy::Bottom => below,
            RepeatPolicy::Both => above || below,
            RepeatPolicy::None => false,
        }
    }
}

/// Outcome of one evaluation. Both flags can be set in the same frame when a
/// trigger line sits below the fold (e.g. `"top 120%"`); callers apply the
/// entrance first.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Step {
    pub entered: bool,
    pub reset: bool,
}

impl Step {
    #[inline]
    pub fn is_noop(&self) -> bool {
        !self.entered && !self.reset
    }
}

/// Per-element trigger state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Watch {
    pub trigger: Trigger,
    pub once: bool,
    pub repeat: RepeatPolicy,
    pub triggered: bool,
}

impl Watch {
    pub fn new(trigger: Trigger, once: bool, repeat: RepeatPolicy) -> Self {
        Self {
            trigger,
            once,
            repeat,
            triggered: false,
        }
    }

    /// Advances the state machine for the element's current rectangle.
    pub fn evaluate(&mut self, rect: &Rect, viewport_height: f64) -> Step {
        let p = placement(&self.trigger, rect, viewport_height);
        let mut step = Step::default();
        if p.visible && !self.triggered {
            self.triggered = true;
            step.entered = true;
        }
        if !self.once && self.triggered && self.repeat.matches_exit(p.above, p.below) {
            self.triggered = false;
            step.reset = true;
        }
        step
    }
}

/// `"true"` or a bare attribute (`""`) enables a flag; anything else
/// disables it.
pub fn parse_flag(literal: &str) -> bool {
    literal == "true" || literal.is_empty()
}
