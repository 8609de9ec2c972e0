//! Underline anchors pinpointing the failing sub-expression of a source line.
//!
//! An [`Anchor`] carries two character ranges over a line: the outer span of the failing
//! expression and a narrower primary span (the operator of a binary operation, or the brackets
//! of a subscript). Rendered beneath the stripped line it produces the familiar two-tier
//! underline:
//!
//! ```text
//! result = x + y
//!          ~~^~~
//! ```
//!
//! All offsets are 1-based and relative to the first non-whitespace character of the line, so
//! the rendering can be overlaid directly beneath `line.trim()`.

use std::fmt;

use ruff_python_ast::{Expr, ExprBinOp, ExprSubscript};
use ruff_python_parser::parse_expression;
use ruff_text_size::{Ranged, TextSize};

use crate::offset::{char_range, leading_whitespace};

/// Marker used beneath the primary span.
pub const PRIMARY_CHAR: char = '^';
/// Marker used beneath the rest of the outer span.
pub const SECONDARY_CHAR: char = '~';

/// Character ranges used to underline a source line.
///
/// Invariant: `outer_start <= start <= end <= outer_end`, with `outer_start >= 1`.
/// Every constructor clamps its inputs to uphold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    start: usize,
    end: usize,
    outer_start: usize,
    outer_end: usize,
    primary_char: char,
    secondary_char: char,
}

impl Anchor {
    /// Creates an anchor whose primary span is the whole outer span.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self::with_outer(start, end, start, end)
    }

    /// Creates an anchor with distinct primary and outer spans.
    #[must_use]
    pub fn with_outer(start: usize, end: usize, outer_start: usize, outer_end: usize) -> Self {
        let outer_start = outer_start.max(1);
        let outer_end = outer_end.max(outer_start);
        let start = start.clamp(outer_start, outer_end);
        let end = end.clamp(start, outer_end);
        Self {
            start,
            end,
            outer_start,
            outer_end,
            primary_char: PRIMARY_CHAR,
            secondary_char: SECONDARY_CHAR,
        }
    }

    /// Replaces the marker characters.
    #[must_use]
    pub fn with_markers(mut self, primary_char: char, secondary_char: char) -> Self {
        self.primary_char = primary_char;
        self.secondary_char = secondary_char;
        self
    }

    /// Builds an anchor for the single-line span `[start, end)` (1-based characters of `line`).
    ///
    /// The span is parsed as an expression: binary operations narrow the primary span to the
    /// operator, subscripts to the brackets. Anything else, including text that does not parse,
    /// keeps the primary span equal to the outer span.
    #[must_use]
    pub fn from_segment(line: &str, start: usize, end: usize) -> Self {
        let start = start.max(1);
        if end <= start {
            return Self::from_line(line, start, end);
        }
        let segment = &line[char_range(line, start - 1, end - 1)];
        let (inner_start, inner_end) = match primary_anchors(segment) {
            Some((inner_start, inner_end)) => (start + inner_start, start + inner_end),
            None => {
                tracing::trace!(segment, "no primary anchor for segment");
                (start, end)
            }
        };
        let offset = leading_whitespace(line);
        Self::with_outer(
            inner_start.saturating_sub(offset),
            inner_end.saturating_sub(offset),
            start.saturating_sub(offset),
            end.saturating_sub(offset),
        )
    }

    /// Builds an anchor without narrowing, used when the failing expression spans several lines.
    #[must_use]
    pub fn from_line(line: &str, start: usize, end: usize) -> Self {
        let offset = leading_whitespace(line);
        Self::new(start.saturating_sub(offset), end.saturating_sub(offset))
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub fn outer_start(&self) -> usize {
        self.outer_start
    }

    #[must_use]
    pub fn outer_end(&self) -> usize {
        self.outer_end
    }

    /// Number of characters in the rendered underline.
    #[must_use]
    pub fn width(&self) -> usize {
        self.outer_end - 1
    }

    /// True when the anchor underlines nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outer_start == self.outer_end
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let markers = std::iter::repeat_n(' ', self.outer_start - 1)
            .chain(std::iter::repeat_n(self.secondary_char, self.start - self.outer_start))
            .chain(std::iter::repeat_n(self.primary_char, self.end - self.start))
            .chain(std::iter::repeat_n(self.secondary_char, self.outer_end - self.end));
        for marker in markers {
            fmt::Write::write_char(f, marker)?;
        }
        Ok(())
    }
}

/// Returns the 0-based character range of the interesting part of an expression segment.
fn primary_anchors(segment: &str) -> Option<(usize, usize)> {
    let parsed = parse_expression(segment).ok()?;
    match parsed.expr() {
        Expr::BinOp(binop) => binop_primary_anchors(segment, binop),
        Expr::Subscript(subscript) => Some(subscript_primary_anchors(segment, subscript)),
        _ => None,
    }
}

/// Locates the operator of a binary operation:
///
/// ```text
/// x + y
///   ^
/// ```
///
/// The operator is the text between the operands, less whitespace and any parentheses
/// grouping either operand.
fn binop_primary_anchors(segment: &str, binop: &ExprBinOp) -> Option<(usize, usize)> {
    let gap_start = usize::from(binop.left.end());
    let gap_end = usize::from(binop.right.start());
    let gap = segment.get(gap_start..gap_end)?;
    let is_filler = |ch: char| ch.is_whitespace() || ch == '(' || ch == ')';
    let operator = gap.trim_matches(is_filler);
    if operator.is_empty() {
        return None;
    }
    let leading = gap.chars().take_while(|ch| is_filler(*ch)).count();
    let start = chars_before(segment, binop.left.end()) + leading;
    Some((start, start + operator.chars().count()))
}

/// Locates the brackets of a subscript, from the end of the base through the closing bracket:
///
/// ```text
/// value[1:2]
///      ^^^^^
/// ```
fn subscript_primary_anchors(segment: &str, subscript: &ExprSubscript) -> (usize, usize) {
    (
        chars_before(segment, subscript.value.end()),
        chars_before(segment, subscript.end()),
    )
}

fn chars_before(segment: &str, offset: TextSize) -> usize {
    segment
        .get(..usize::from(offset))
        .map_or_else(|| segment.chars().count(), |prefix| prefix.chars().count())
}
