//! Trigger literals and the viewport visibility predicate.
//!
//! A trigger literal reads "<element anchor> <viewport anchor>", e.g.
//! `"top 90%"` or `"center center"`: the element counts as entered once its
//! anchor line passes above the given fraction of the viewport height.

use serde::{Deserialize, Serialize};

use crate::dom::Rect;
use crate::error::LiteralError;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementAnchor {
    #[default]
    Top,
    Center,
    Bottom,
}

impl ElementAnchor {
    /// Position of the anchor line in viewport coordinates.
    #[inline]
    pub fn position(self, rect: &Rect) -> f64 {
        match self {
            ElementAnchor::Top => rect.top,
            ElementAnchor::Center => rect.top + rect.height / 2.0,
            ElementAnchor::Bottom => rect.bottom(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub element_anchor: ElementAnchor,
    /// Percentage of the viewport height, usually 0..=100.
    pub viewport_anchor: f64,
}

impl Trigger {
    pub fn new(element_anchor: ElementAnchor, viewport_anchor: f64) -> Self {
        Self {
            element_anchor,
            viewport_anchor,
        }
    }

    /// Parses a trigger literal. `fallback_pct` is used when the viewport
    /// token is missing or not a recognised keyword.
    pub fn parse(literal: &str, fallback_pct: f64) -> Result<Self, LiteralError> {
        let lowered = literal.trim().to_lowercase();
        let mut parts = lowered.split_whitespace();
        let element_anchor = match parts.next() {
            None => ElementAnchor::Top,
            Some("top") => ElementAnchor::Top,
            Some("center") => ElementAnchor::Center,
            Some("bottom") => ElementAnchor::Bottom,
            Some(other) => return Err(LiteralError::UnknownAnchor(other.to_string())),
        };
        let viewport_anchor = match parts.next() {
            None => fallback_pct,
            Some(tok) if tok.ends_with('%') => parse_int_prefix(tok)
                .map(|v| v as f64)
                .ok_or_else(|| LiteralError::BadPercentage(tok.to_string()))?,
            Some("top") => 0.0,
            Some("center") => 50.0,
            Some("bottom") => 100.0,
            Some(_) => fallback_pct,
        };
        Ok(Self {
            element_anchor,
            viewport_anchor,
        })
    }

    /// Threshold line in viewport coordinates.
    #[inline]
    pub fn threshold(&self, viewport_height: f64) -> f64 {
        viewport_height * self.viewport_anchor / 100.0
    }
}

/// Where an element sits relative to the viewport this frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Placement {
    pub visible: bool,
    pub above: bool,
    pub below: bool,
}

/// Evaluates the visibility predicate for `rect` against a viewport of
/// height `vh`.
pub fn placement(trigger: &Trigger, rect: &Rect, vh: f64) -> Placement {
    let anchor = trigger.element_anchor.position(rect);
    Placement {
        visible: anchor < trigger.threshold(vh) && rect.bottom() > 0.0,
        above: rect.bottom() <= 0.0,
        below: rect.top >= vh,
    }
}

/// True when `rect` lies entirely outside `[-buffer, vh + buffer]`.
#[inline]
pub fn is_culled(rect: &Rect, vh: f64, buffer: f64) -> bool {
    rect.top > vh + buffer || rect.bottom() < -buffer
}

/// `parseInt`-style leading integer.
pub(crate) fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|v| v * sign)
}
