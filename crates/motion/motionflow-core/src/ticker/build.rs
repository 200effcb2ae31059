//! Strip construction for one ticker container.
//!
//! ```text
//! [data-mf-ticker]
//!   div.mf-ticker-viewport
//!     div.mf-ticker-track          (translated every frame)
//!       div.mf-ticker-content      (originals + clones, one loop period)
//!       div.mf-ticker-content      (copy of the above)
//! ```

use crate::dom::Document;
use crate::error::BuildError;
use crate::ids::ElementId;

pub const MAX_FILL_CYCLES: usize = 60;

pub const CLASS_VIEWPORT: &str = "mf-ticker-viewport";
pub const CLASS_TRACK: &str = "mf-ticker-track";
pub const CLASS_CONTENT: &str = "mf-ticker-content";

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn parse(literal: &str) -> Option<Self> {
        match literal.trim().to_lowercase().as_str() {
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            _ => None,
        }
    }

    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Right and down move towards increasing coordinates.
    #[inline]
    pub fn is_positive(self) -> bool {
        matches!(self, Direction::Right | Direction::Down)
    }
}

/// A built strip.
#[derive(Clone, Debug, PartialEq)]
pub struct Strip {
    pub viewport: ElementId,
    pub track: ElementId,
    pub content: ElementId,
    /// Extent of one content block after filling; the loop period.
    pub loop_size: f64,
    /// Extent of the visible window.
    pub viewport_size: f64,
    /// Extent of the original children alone.
    pub unit: f64,
    /// Clone rounds appended while filling.
    pub cycles: usize,
}

/// Builds the strip inside `container` from `originals`. The originals are
/// moved, never destroyed, so a later rebuild can start over from them.
pub fn build_strip(
    doc: &mut dyn Document,
    container: ElementId,
    originals: &[ElementId],
    direction: Direction,
) -> Result<Strip, BuildError> {
    if originals.is_empty() {
        return Err(BuildError::NoChildren);
    }
    let horizontal = direction.is_horizontal();

    let viewport = doc.create_element("div");
    doc.add_class(viewport, CLASS_VIEWPORT);
    let track = doc.create_element("div");
    doc.add_class(track, CLASS_TRACK);
    doc.clear_children(container);
    doc.append_child(container, viewport);
    doc.append_child(viewport, track);
    if !horizontal {
        doc.set_style(track, "flex-direction", "column");
    }

    let content = doc.create_element("div");
    doc.add_class(content, CLASS_CONTENT);
    if !horizontal {
        doc.set_style(content, "flex-direction", "column");
    }
    for node in originals {
        doc.append_child(content, *node);
    }
    doc.append_child(track, content);

    let measure = |doc: &dyn Document| doc.rect(content).extent(horizontal);

    let unit = measure(&*doc);
    if unit == 0.0 {
        return Err(BuildError::ZeroContent);
    }
    let viewport_size = doc.rect(viewport).extent(horizontal);
    if viewport_size == 0.0 {
        return Err(BuildError::ZeroViewport);
    }

    let mut filled = unit;
    let mut cycles = 0;
    while filled < viewport_size + unit && cycles < MAX_FILL_CYCLES {
        for node in originals {
            let copy = doc.clone_node(*node);
            doc.append_child(content, copy);
        }
        filled = measure(&*doc);
        cycles += 1;
    }

    let loop_size = measure(&*doc);
    let copy = doc.clone_node(content);
    doc.append_child(track, copy);

    Ok(Strip {
        viewport,
        track,
        content,
        loop_size,
        viewport_size,
        unit,
        cycles,
    })
}

/// Wraps `pos` into one loop period: `(-loop_size, 0]` when moving toward
/// negative offsets, `[-loop_size, 0)` when moving toward positive ones.
pub fn wrap(pos: f64, loop_size: f64, positive: bool) -> f64 {
    if loop_size.is_nan() || loop_size <= 0.0 || !pos.is_finite() {
        return pos;
    }
    let r = pos.rem_euclid(loop_size);
    if positive || r > 0.0 {
        r - loop_size
    } else {
        0.0
    }
}

/// Rounds to the nearest device pixel.
#[inline]
pub fn snap(x: f64, dpr: f64) -> f64 {
    (x * dpr).round() / dpr
}
