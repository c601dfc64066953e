#![forbid(unsafe_code)]

//! Per-layer wire occupancy.

use qdraw_core::WireSpan;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Set of wire indices already blocked in one layer.
///
/// Serializes as a sorted list so snapshots are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<usize>", from = "Vec<usize>")]
pub struct Occupancy {
    wires: FxHashSet<usize>,
}

impl Occupancy {
    /// Create an empty occupancy set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether any wire of `span` is already blocked.
    #[must_use]
    pub fn intersects(&self, span: WireSpan) -> bool {
        span.iter().any(|wire| self.wires.contains(&wire))
    }

    /// Block every wire of `span`.
    pub fn insert_span(&mut self, span: WireSpan) {
        self.wires.extend(span);
    }

    /// Check whether `wire` is blocked.
    #[must_use]
    pub fn contains(&self, wire: usize) -> bool {
        self.wires.contains(&wire)
    }

    /// Number of blocked wires.
    #[must_use]
    pub fn len(&self) -> usize {
        self.wires.len()
    }

    /// True when nothing is blocked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wires.is_empty()
    }

    /// Blocked wires in ascending order.
    #[must_use]
    pub fn sorted(&self) -> Vec<usize> {
        let mut wires: Vec<usize> = self.wires.iter().copied().collect();
        wires.sort_unstable();
        wires
    }
}

impl From<Occupancy> for Vec<usize> {
    fn from(occupancy: Occupancy) -> Self {
        occupancy.sorted()
    }
}

impl From<Vec<usize>> for Occupancy {
    fn from(wires: Vec<usize>) -> Self {
        Self {
            wires: wires.into_iter().collect(),
        }
    }
}
