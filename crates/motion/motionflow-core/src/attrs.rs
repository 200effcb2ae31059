//! `data-mf-*` attribute names and the number coercions used when reading
//! them.

use crate::dom::Document;
use crate::ids::ElementId;

// Entrance animations.
pub const ANIMATION: &str = "data-mf-animation";
pub const ANIMATION_DISTANCE: &str = "data-mf-animation-distance";
pub const ANIMATION_DURATION: &str = "data-mf-animation-duration";
pub const ANIMATION_DELAY: &str = "data-mf-animation-delay";
pub const ANIMATION_EASING: &str = "data-mf-animation-easing";
pub const ANIMATION_ONCE: &str = "data-mf-animation-once";
pub const ANIMATION_REPEAT: &str = "data-mf-animation-repeat";
pub const ANIMATION_TRIGGER: &str = "data-mf-animation-trigger";

pub const STAGGER_ANIMATION: &str = "data-mf-stagger-animation";
pub const STAGGER_DELAY: &str = "data-mf-stagger-delay";
pub const STAGGER_GAP: &str = "data-mf-stagger-gap";
pub const STAGGER_DISTANCE: &str = "data-mf-stagger-distance";
pub const STAGGER_DURATION: &str = "data-mf-stagger-duration";
pub const STAGGER_EASING: &str = "data-mf-stagger-easing";
pub const STAGGER_ONCE: &str = "data-mf-stagger-once";
pub const STAGGER_REPEAT: &str = "data-mf-stagger-repeat";
pub const STAGGER_TRIGGER: &str = "data-mf-stagger-trigger";
pub const STAGGER_IGNORE: &str = "data-mf-stagger-ignore";

// Parallax.
pub const PARALLAX: &str = "data-mf-parallax";
pub const PARALLAX_IGNORE: &str = "data-mf-parallax-ignore";
pub const PARALLAX_LOCKED: &str = "data-mf-parallax-locked";
pub const PARALLAX_SPEED: &str = "data-mf-parallax-speed";
pub const PARALLAX_SPEED_TABLET: &str = "data-mf-parallax-speed-tablet";
pub const PARALLAX_SPEED_MOBILE: &str = "data-mf-parallax-speed-mobile";
pub const PARALLAX_STAGGER: &str = "data-mf-parallax-stagger";
pub const PARALLAX_STAGGER_IGNORE: &str = "data-mf-parallax-stagger-ignore";
pub const PARALLAX_STAGGER_DIRECTION: &str = "data-mf-parallax-stagger-direction";
pub const PARALLAX_STAGGER_SPEED: &str = "data-mf-parallax-stagger-speed";
pub const PARALLAX_STAGGER_SPEED_TABLET: &str = "data-mf-parallax-stagger-speed-tablet";
pub const PARALLAX_STAGGER_SPEED_MOBILE: &str = "data-mf-parallax-stagger-speed-mobile";
pub const PARALLAX_STAGGER_STEP: &str = "data-mf-parallax-stagger-step";
pub const PARALLAX_STAGGER_STEP_TABLET: &str = "data-mf-parallax-stagger-step-tablet";
pub const PARALLAX_STAGGER_STEP_MOBILE: &str = "data-mf-parallax-stagger-step-mobile";

// Count.
pub const COUNT_TO: &str = "data-mf-count-to";
pub const COUNT_FROM: &str = "data-mf-count-from";
pub const COUNT_DURATION: &str = "data-mf-count-duration";
pub const COUNT_ONCE: &str = "data-mf-count-once";
pub const COUNT_REPEAT: &str = "data-mf-count-repeat";
pub const COUNT_TRIGGER: &str = "data-mf-count-trigger";

// Roller.
pub const ROLLER_TO: &str = "data-mf-roller-to";
pub const ROLLER_FROM: &str = "data-mf-roller-from";
pub const ROLLER_DURATION: &str = "data-mf-roller-duration";
pub const ROLLER_ONCE: &str = "data-mf-roller-once";
pub const ROLLER_REPEAT: &str = "data-mf-roller-repeat";
pub const ROLLER_TRIGGER: &str = "data-mf-roller-trigger";

// Ticker.
pub const TICKER: &str = "data-mf-ticker";
pub const TICKER_PREFIX: &str = "data-mf-ticker";
pub const TICKER_SPEED: &str = "data-mf-ticker-speed";
pub const TICKER_DIRECTION: &str = "data-mf-ticker-direction";
pub const TICKER_PAUSE_ON_HOVER: &str = "data-mf-ticker-pause-on-hover";
pub const TICKER_PAUSE_ON_VISIBILITY: &str = "data-mf-ticker-pause-on-visibility";

// Text.
pub const TEXT_TYPE: &str = "data-mf-text-type";
pub const TEXT_LOOP_INTERVAL: &str = "data-mf-text-loop-interval";
pub const TEXT_LOOP_ANIMATION: &str = "data-mf-text-loop-animation";
pub const TEXT_LOOP_DURATION: &str = "data-mf-text-loop-duration";
pub const TEXT_LOOP_EASING: &str = "data-mf-text-loop-easing";
pub const TEXT_LOOP_DISTANCE: &str = "data-mf-text-loop-distance";
pub const TEXT_TYPING_SPEED: &str = "data-mf-text-typing-speed";
pub const TEXT_TYPING_DELETE_SPEED: &str = "data-mf-text-typing-delete-speed";
pub const TEXT_TYPING_INTERVAL: &str = "data-mf-text-typing-interval";
pub const TEXT_TYPING_LOOP: &str = "data-mf-text-typing-loop";
pub const TEXT_TYPING_CURSOR: &str = "data-mf-text-typing-cursor";
pub const TEXT_TYPING_CURSOR_CHAR: &str = "data-mf-text-typing-cursor-char";
pub const TEXT_TYPING_CURSOR_BLINK: &str = "data-mf-text-typing-cursor-blink";

/// `Number(s)` restricted to finite results. An empty or blank string is 0,
/// as in JavaScript.
pub fn js_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return Some(0.0);
    }
    let lower = t.to_ascii_lowercase();
    if lower.contains("inf") || lower.contains("nan") {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `parseFloat(s)`: the longest numeric prefix after leading whitespace.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let t = s.trim_start();
    let b = t.as_bytes();
    let mut i = 0;
    if matches!(b.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < b.len() && b[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        i = j;
    }
    if digits == 0 {
        return None;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if matches!(b.get(j), Some(b'+') | Some(b'-')) {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    t[..i].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Reads an attribute as a JavaScript `Number`. Missing or non-numeric
/// attributes yield `None`.
pub fn number(doc: &dyn Document, el: ElementId, name: &str) -> Option<f64> {
    doc.attr(el, name).and_then(|v| js_number(&v))
}

/// Reads an attribute with `parseFloat` semantics.
pub fn float(doc: &dyn Document, el: ElementId, name: &str) -> Option<f64> {
    doc.attr(el, name).and_then(|v| parse_float_prefix(&v))
}

/// `"true"`, `"1"` or `"yes"` (any case); missing or empty attributes fall
/// back.
pub fn boolish(doc: &dyn Document, el: ElementId, name: &str, fallback: bool) -> bool {
    match doc.attr(el, name) {
        None => fallback,
        Some(v) if v.is_empty() => fallback,
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
    }
}
