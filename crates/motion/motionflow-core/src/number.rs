//! Number literals as written in counter attributes, and their formatting.

use crate::attrs::parse_float_prefix;
use crate::error::LiteralError;

/// Digit grouping detected from a target literal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Grouping {
    /// No separators (`1234.5`).
    #[default]
    Plain,
    /// Groups of three (`1,234,567`).
    Western,
    /// Last group of three, then groups of two (`12,34,567`).
    Indian,
}

impl Grouping {
    /// Classifies a literal. Only fully grouped literals select a grouping;
    /// anything else formats plain.
    pub fn detect(literal: &str) -> Self {
        let s = literal.trim();
        let (int, frac) = match s.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (s, None),
        };
        if let Some(f) = frac {
            if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) {
                return Grouping::Plain;
            }
        }
        let groups: Vec<&str> = int.split(',').collect();
        if groups.len() < 2 || !groups.iter().all(|g| g.bytes().all(|b| b.is_ascii_digit())) {
            return Grouping::Plain;
        }
        let lead = groups[0].len();
        if !(1..=3).contains(&lead) {
            return Grouping::Plain;
        }
        let rest = &groups[1..];
        if rest.iter().all(|g| g.len() == 3) {
            return Grouping::Western;
        }
        let (last, middle) = match rest.split_last() {
            Some(split) => split,
            None => return Grouping::Plain,
        };
        if last.len() == 3 && !middle.is_empty() && middle.iter().all(|g| g.len() == 2) {
            return Grouping::Indian;
        }
        Grouping::Plain
    }

    /// Width of the `i`-th group counted from the right.
    fn group_width(self, i: usize) -> usize {
        match self {
            Grouping::Plain => usize::MAX,
            Grouping::Western => 3,
            Grouping::Indian if i == 0 => 3,
            Grouping::Indian => 2,
        }
    }

    fn group(self, digits: &str) -> String {
        if self == Grouping::Plain {
            return digits.to_string();
        }
        let mut chunks = Vec::new();
        let mut end = digits.len();
        let mut i = 0;
        while end > 0 {
            let start = end.saturating_sub(self.group_width(i));
            chunks.push(&digits[start..end]);
            end = start;
            i += 1;
        }
        chunks.reverse();
        chunks.join(",")
    }
}

/// Parses a counter literal: separators are dropped, then the longest
/// numeric prefix is read.
pub fn parse_counter(literal: &str) -> Result<f64, LiteralError> {
    if literal.trim().is_empty() {
        return Err(LiteralError::Empty);
    }
    parse_float_prefix(&literal.replace(',', ""))
        .ok_or_else(|| LiteralError::NotANumber(literal.to_string()))
}

/// Number of characters after the first `.` (up to the next one).
pub fn decimals(literal: &str) -> usize {
    literal.split('.').nth(1).map_or(0, str::len).min(MAX_DECIMALS)
}

const MAX_DECIMALS: usize = 20;

/// Formats `value` with exactly `decimals` fraction digits.
pub fn format(value: f64, decimals: usize, grouping: Grouping) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let fixed = format!("{:.*}", decimals.min(MAX_DECIMALS), value.abs());
    let (int, frac) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let mut out = String::with_capacity(fixed.len() + 8);
    if value < 0.0 {
        out.push('-');
    }
    out.push_str(&grouping.group(int));
    if let Some(f) = frac {
        out.push('.');
        out.push_str(f);
    }
    out
}
