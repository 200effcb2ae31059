//! Literal parsing errors.
//!
//! None of these reach the host: components log them and leave the element
//! out of their active set.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiteralError {
    #[error("empty literal")]
    Empty,
    #[error("not a number: {0:?}")]
    NotANumber(String),
    #[error("unknown element anchor {0:?} (expected top, center or bottom)")]
    UnknownAnchor(String),
    #[error("malformed viewport percentage {0:?}")]
    BadPercentage(String),
}

/// Reasons a ticker strip could not be built yet. All of them are retried on
/// the next rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("ticker has no children to repeat")]
    NoChildren,
    #[error("ticker content measures zero along its axis")]
    ZeroContent,
    #[error("ticker viewport measures zero along its axis")]
    ZeroViewport,
}
