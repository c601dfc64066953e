#![forbid(unsafe_code)]

//! Dense wire maps.
//!
//! A [`WireMap`] is a bijection from arbitrary wire labels onto the
//! contiguous integers `0..n`. Layout works exclusively on those integers:
//! row `i` of the materialized grid is the wire whose label maps to `i`.
//!
//! # Construction
//!
//! | Constructor                        | Index assignment                      |
//! |------------------------------------|---------------------------------------|
//! | [`WireMap::from_labels`]           | position in the iterator              |
//! | [`WireMap::from_indices`]          | explicit, validated for density       |
//! | [`WireMap::from_operations`]       | first occurrence across the operations|
//!
//! Every map is built per call and owned by the caller; there is no process
//! wide default map.
//!
//! # Failure Modes
//!
//! Looking up a label the map does not contain is a caller contract
//! violation and yields [`WireMapError::UnknownWire`]. It is never replaced
//! by a default index.

use crate::operation::Operation;
use crate::span::WireSpan;
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while building or querying a [`WireMap`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireMapError {
    /// An operation referenced a wire the map does not contain.
    #[error("wire {label} is not present in the wire map")]
    UnknownWire { label: String },
    /// The same label was given more than one index.
    #[error("wire {label} appears more than once in the wire map")]
    DuplicateWire { label: String },
    /// An explicit index lies outside `0..len`, leaving a gap elsewhere.
    #[error("wire {label} maps to index {index}, outside 0..{len}")]
    IndexOutOfRange {
        label: String,
        index: usize,
        len: usize,
    },
    /// Two labels were given the same index.
    #[error("wires {first} and {second} both map to index {index}")]
    IndexCollision {
        index: usize,
        first: String,
        second: String,
    },
}

pub type Result<T> = std::result::Result<T, WireMapError>;

fn describe<W: fmt::Debug>(label: &W) -> String {
    format!("{label:?}")
}

// ============================================================================
// WireMap
// ============================================================================

/// Bijection from wire labels to `0..len()`.
#[derive(Debug, Clone)]
pub struct WireMap<W> {
    index: FxHashMap<W, usize>,
    labels: Vec<W>,
}

impl<W> Default for WireMap<W> {
    fn default() -> Self {
        Self {
            index: FxHashMap::default(),
            labels: Vec::new(),
        }
    }
}

impl<W: Eq + Hash + Clone + fmt::Debug> WireMap<W> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign indices in iteration order.
    ///
    /// Returns `Err(DuplicateWire)` if a label repeats.
    pub fn from_labels(labels: impl IntoIterator<Item = W>) -> Result<Self> {
        let mut map = Self::new();
        for label in labels {
            if map.index.contains_key(&label) {
                return Err(WireMapError::DuplicateWire {
                    label: describe(&label),
                });
            }
            map.push(label);
        }
        Ok(map)
    }

    /// Build from explicit `(label, index)` pairs.
    ///
    /// The pairs must form a dense bijection onto `0..n` where `n` is the
    /// number of pairs.
    pub fn from_indices(pairs: impl IntoIterator<Item = (W, usize)>) -> Result<Self> {
        let pairs: Vec<(W, usize)> = pairs.into_iter().collect();
        let len = pairs.len();
        let mut slots: Vec<Option<W>> = vec![None; len];
        let mut index = FxHashMap::default();
        index.reserve(len);

        for (label, at) in pairs {
            if at >= len {
                return Err(WireMapError::IndexOutOfRange {
                    label: describe(&label),
                    index: at,
                    len,
                });
            }
            if let Some(first) = &slots[at] {
                return Err(WireMapError::IndexCollision {
                    index: at,
                    first: describe(first),
                    second: describe(&label),
                });
            }
            if index.insert(label.clone(), at).is_some() {
                return Err(WireMapError::DuplicateWire {
                    label: describe(&label),
                });
            }
            slots[at] = Some(label);
        }

        // n pairs, n slots, no collisions and no out-of-range index: every
        // slot is filled.
        let labels = slots.into_iter().flatten().collect();
        Ok(Self { index, labels })
    }

    /// Derive a map by first occurrence over `ops`.
    ///
    /// Each label gets the next free index the first time any operation
    /// mentions it. Broadcast operations contribute nothing.
    pub fn from_operations<O>(ops: impl IntoIterator<Item = O>) -> Self
    where
        O: Operation<Wire = W>,
    {
        let mut map = Self::new();
        for op in ops {
            for wire in op.wires() {
                if !map.index.contains_key(wire) {
                    map.push(wire.clone());
                }
            }
        }
        map
    }

    fn push(&mut self, label: W) {
        self.index.insert(label.clone(), self.labels.len());
        self.labels.push(label);
    }

    /// Number of wires.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when the map has no wires.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Check whether `label` is mapped.
    #[must_use]
    pub fn contains(&self, label: &W) -> bool {
        self.index.contains_key(label)
    }

    /// Index for `label`, if mapped.
    #[must_use]
    pub fn get(&self, label: &W) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Index for `label`.
    ///
    /// Returns `Err(UnknownWire)` if the label is not mapped.
    pub fn index_of(&self, label: &W) -> Result<usize> {
        match self.index.get(label) {
            Some(&index) => Ok(index),
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!(label = ?label, wires = self.len(), "wire label missing from wire map");
                Err(WireMapError::UnknownWire {
                    label: describe(label),
                })
            }
        }
    }

    /// Label mapped to `index`.
    #[must_use]
    pub fn label_at(&self, index: usize) -> Option<&W> {
        self.labels.get(index)
    }

    /// Labels in index order.
    pub fn labels(&self) -> impl ExactSizeIterator<Item = &W> + '_ {
        self.labels.iter()
    }

    /// `(index, label)` pairs in index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, &W)> + '_ {
        self.labels.iter().enumerate()
    }

    /// Span covering every mapped wire.
    #[inline]
    #[must_use]
    pub fn full_span(&self) -> WireSpan {
        WireSpan::all(self.len())
    }

    /// Indices of the wires `op` touches, in the operation's order.
    pub fn mapped_indices<O>(&self, op: &O) -> Result<Vec<usize>>
    where
        O: Operation<Wire = W> + ?Sized,
    {
        op.wires().iter().map(|wire| self.index_of(wire)).collect()
    }

    /// Wires `op` blocks during placement.
    ///
    /// A broadcast blocks every mapped wire. Any other operation blocks the
    /// contiguous range between its lowest and highest mapped wire,
    /// including rows it does not touch.
    pub fn occupied_span<O>(&self, op: &O) -> Result<WireSpan>
    where
        O: Operation<Wire = W> + ?Sized,
    {
        if op.is_broadcast() {
            return Ok(self.full_span());
        }
        let mut indices = Vec::with_capacity(op.wires().len());
        for wire in op.wires() {
            indices.push(self.index_of(wire)?);
        }
        Ok(WireSpan::enclosing(indices))
    }
}

impl<W: Eq + Hash> PartialEq for WireMap<W> {
    fn eq(&self, other: &Self) -> bool {
        self.labels == other.labels
    }
}

impl<W: Eq + Hash> Eq for WireMap<W> {}
