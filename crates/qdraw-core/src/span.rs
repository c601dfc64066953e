#![forbid(unsafe_code)]

//! Contiguous wire-index ranges.
//!
//! A [`WireSpan`] is the set of rows an operation blocks while it is being
//! placed. Multi-wire operations block every row between their extreme
//! wires because a connector is drawn through them, so the blocked set is
//! always a single half-open interval.
//!
//! # Invariants
//!
//! 1. `start <= end` for every constructed span.
//! 2. An empty span (`start == end`) intersects nothing.
//! 3. `WireSpan::all(n)` covers exactly `0..n`.
//!
//! # Failure Modes
//!
//! - Deserializing a span with `start > end` fails with [`InvertedSpan`]
//!   instead of producing a value that violates invariant 1.
//! - Index `usize::MAX` has no exclusive upper bound; constructors saturate
//!   there, so a span never covers that index. Wire-map indices are always
//!   below the map length and never reach it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A serialized span whose `start` lies past its `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("wire span start {start} exceeds end {end}")]
pub struct InvertedSpan {
    /// Serialized start.
    pub start: usize,
    /// Serialized end.
    pub end: usize,
}

/// Unvalidated wire form of [`WireSpan`].
#[derive(Deserialize)]
struct RawSpan {
    start: usize,
    end: usize,
}

impl TryFrom<RawSpan> for WireSpan {
    type Error = InvertedSpan;

    fn try_from(raw: RawSpan) -> Result<Self, Self::Error> {
        if raw.start > raw.end {
            return Err(InvertedSpan {
                start: raw.start,
                end: raw.end,
            });
        }
        Ok(Self {
            start: raw.start,
            end: raw.end,
        })
    }
}

/// Half-open range of wire indices `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSpan")]
pub struct WireSpan {
    start: usize,
    end: usize,
}

impl WireSpan {
    /// The span that blocks nothing.
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    /// Span covering `first..=last`.
    ///
    /// The bounds are reordered if given backwards. The exclusive end
    /// saturates at `usize::MAX`.
    #[must_use]
    pub const fn between(first: usize, last: usize) -> Self {
        if first <= last {
            Self {
                start: first,
                end: last.saturating_add(1),
            }
        } else {
            Self {
                start: last,
                end: first.saturating_add(1),
            }
        }
    }

    /// Span covering a single wire; empty for `usize::MAX`.
    #[inline]
    #[must_use]
    pub const fn single(wire: usize) -> Self {
        Self {
            start: wire,
            end: wire.saturating_add(1),
        }
    }

    /// Span covering every wire `0..wire_count`.
    #[inline]
    #[must_use]
    pub const fn all(wire_count: usize) -> Self {
        Self {
            start: 0,
            end: wire_count,
        }
    }

    /// Smallest span containing every index yielded by `indices`.
    ///
    /// Returns [`WireSpan::EMPTY`] when the iterator is empty.
    #[must_use]
    pub fn enclosing(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut bounds: Option<(usize, usize)> = None;
        for index in indices {
            bounds = Some(match bounds {
                None => (index, index),
                Some((lo, hi)) => (lo.min(index), hi.max(index)),
            });
        }
        bounds.map_or(Self::EMPTY, |(lo, hi)| Self::between(lo, hi))
    }

    /// First blocked index.
    #[inline]
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// One past the last blocked index.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of blocked wires.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// True when the span blocks no wire.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check whether `wire` falls inside the span.
    #[inline]
    #[must_use]
    pub const fn contains(&self, wire: usize) -> bool {
        wire >= self.start && wire < self.end
    }

    /// Check whether two spans share at least one wire.
    #[inline]
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }

    /// Blocked indices as a range.
    #[inline]
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Iterate the blocked indices in ascending order.
    pub fn iter(&self) -> Range<usize> {
        self.range()
    }
}

impl IntoIterator for WireSpan {
    type Item = usize;
    type IntoIter = Range<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.range()
    }
}

impl fmt::Display for WireSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "[]")
        } else {
            write!(f, "[{}..={}]", self.start, self.end - 1)
        }
    }
}
