#![forbid(unsafe_code)]

//! Layer placement debugging utilities.
//!
//! Provides introspection into layer assignment:
//! - Recording of every placement decision (span, layers scanned, conflict)
//! - Detection of deep backward scans and sparse layers
//! - Export to Graphviz DOT format
//!
//! # Feature Gating
//!
//! This module is always compiled (the types are useful for testing),
//! but recording is a no-op unless explicitly enabled at runtime.
//!
//! # Retention
//!
//! A debugger keeps at most [`PlacementDebugger::capacity`] records, each
//! holding one [`PlacementRecord`] per placed operation. Older records are
//! evicted first, so a long-lived debugger attached to a busy assigner stays
//! bounded.
//!
//! # Usage
//!
//! ```ignore
//! use qdraw_layout::debug::PlacementDebugger;
//! use qdraw_layout::LayerAssigner;
//!
//! let debugger = PlacementDebugger::new();
//! debugger.set_enabled(true);
//!
//! let assigner = LayerAssigner::new().debugger(debugger.clone()).name("bell");
//! let plan = assigner.plan(&ops, &wire_map)?;
//!
//! for record in debugger.snapshot() {
//!     println!("{}", record.summary());
//! }
//! ```

use qdraw_core::WireSpan;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A record of placing a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// Position of the operation in the input sequence.
    pub position: usize,
    /// Wires the operation blocks.
    pub span: WireSpan,
    /// Number of layers examined by the backward search.
    pub scanned: usize,
    /// Layer that stopped the search, if any.
    pub conflict: Option<usize>,
    /// Layer the operation was placed in.
    pub layer: usize,
    /// True when the placement appended a new layer.
    pub opened_layer: bool,
}

/// A record of one complete layer assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayeringRecord {
    /// User-provided name for identification.
    pub name: String,
    /// Number of wires in the wire map.
    pub wire_count: usize,
    /// Number of layers produced.
    pub layer_count: usize,
    /// One entry per input operation, in input order.
    pub placements: Vec<PlacementRecord>,
    /// Time taken to assign layers (if measured).
    pub solve_time: Option<Duration>,
}

impl LayeringRecord {
    /// Create a new layering record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wire_count: 0,
            layer_count: 0,
            placements: Vec::new(),
            solve_time: None,
        }
    }

    /// Number of operations placed.
    pub fn op_count(&self) -> usize {
        self.placements.len()
    }

    /// Number of placements that appended a layer.
    pub fn opened_layers(&self) -> usize {
        self.placements.iter().filter(|p| p.opened_layer).count()
    }

    /// Longest backward scan performed for any single operation.
    pub fn max_scan_depth(&self) -> usize {
        self.placements.iter().map(|p| p.scanned).max().unwrap_or(0)
    }

    /// Average number of operations per layer.
    pub fn ops_per_layer(&self) -> f32 {
        if self.layer_count == 0 {
            return 0.0;
        }
        self.op_count() as f32 / self.layer_count as f32
    }

    /// Check whether the search ever walked back over more than `depth` layers.
    pub fn has_deep_scan(&self, depth: usize) -> bool {
        self.max_scan_depth() > depth
    }

    /// Generate a human-readable summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(
            s,
            "{}: {} ops on {} wires -> {} layers",
            self.name,
            self.op_count(),
            self.wire_count,
            self.layer_count
        );

        for p in &self.placements {
            let conflict = p
                .conflict
                .map_or_else(|| "none".to_string(), |c| format!("L{c}"));
            let opened = if p.opened_layer { " (new)" } else { "" };
            let _ = writeln!(
                s,
                "  [{}] span {} scanned {} conflict {} -> L{}{}",
                p.position, p.span, p.scanned, conflict, p.layer, opened
            );
        }

        let _ = writeln!(s, "  Ops/layer: {:.2}", self.ops_per_layer());
        let _ = writeln!(s, "  Max scan depth: {}", self.max_scan_depth());
        if let Some(t) = self.solve_time {
            let _ = writeln!(s, "  Solve time: {:?}", t);
        }
        s
    }
}

/// Assignments retained when no capacity is given.
pub const DEFAULT_CAPACITY: usize = 64;

/// Oldest-first history of layering records.
#[derive(Debug)]
struct History {
    records: VecDeque<LayeringRecord>,
    evicted: u64,
}

/// Layer placement debugger.
///
/// Keeps the most recent `capacity` layering records; when full, the oldest
/// record is evicted on each new [`record`](Self::record). Shared through an
/// `Arc` and internally synchronized; a poisoned lock is recovered.
#[derive(Debug)]
pub struct PlacementDebugger {
    enabled: AtomicBool,
    capacity: usize,
    history: Mutex<History>,
}

impl PlacementDebugger {
    /// Create a disabled debugger holding up to [`DEFAULT_CAPACITY`] records.
    pub fn new() -> Arc<Self> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a disabled debugger holding up to `capacity` records.
    ///
    /// A capacity of 0 is clamped to 1.
    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        let capacity = capacity.max(1);
        Arc::new(Self {
            enabled: AtomicBool::new(false),
            capacity,
            history: Mutex::new(History {
                records: VecDeque::with_capacity(capacity),
                evicted: 0,
            }),
        })
    }

    fn history(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Maximum number of records retained.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if recording is enabled.
    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Enable or disable recording.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Flip recording on or off, returning the new state.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }

    /// Drop every retained record and reset the eviction count.
    pub fn clear(&self) {
        let mut history = self.history();
        history.records.clear();
        history.evicted = 0;
    }

    /// Append a layering record, evicting the oldest one when full.
    ///
    /// Ignored while recording is disabled.
    pub fn record(&self, record: LayeringRecord) {
        if !self.enabled() {
            return;
        }
        let mut history = self.history();
        if history.records.len() == self.capacity {
            history.records.pop_front();
            history.evicted += 1;
        }
        history.records.push_back(record);
    }

    /// Number of records currently retained.
    pub fn len(&self) -> usize {
        self.history().records.len()
    }

    /// True when no record is retained.
    pub fn is_empty(&self) -> bool {
        self.history().records.is_empty()
    }

    /// Number of records evicted since creation or the last [`clear`](Self::clear).
    pub fn evicted(&self) -> u64 {
        self.history().evicted
    }

    /// Most recent record, if any.
    pub fn latest(&self) -> Option<LayeringRecord> {
        self.history().records.back().cloned()
    }

    /// Retained records, oldest first.
    pub fn snapshot(&self) -> Vec<LayeringRecord> {
        self.history().records.iter().cloned().collect()
    }

    /// Records whose backward search walked over more than `depth` layers.
    pub fn deep_scans(&self, depth: usize) -> Vec<LayeringRecord> {
        self.snapshot()
            .into_iter()
            .filter(|r| r.has_deep_scan(depth))
            .collect()
    }

    /// Generate a summary report of all recorded assignments.
    pub fn report(&self) -> String {
        let records = self.snapshot();

        let mut s = String::new();
        let _ = writeln!(
            s,
            "=== Layer Placement Report ({} assignments, {} evicted) ===",
            records.len(),
            self.evicted()
        );

        for record in &records {
            let _ = write!(s, "\n{}", record.summary());
        }

        s
    }

    /// Export to Graphviz DOT format for visualization.
    ///
    /// Each layer of each record becomes a cluster; operations are nodes in
    /// their layer and an edge joins an operation to the layer whose
    /// occupancy pushed it forward.
    pub fn export_dot(&self) -> String {
        let records = self.snapshot();

        let mut s = String::new();
        let _ = writeln!(s, "digraph PlacementDebug {{");
        let _ = writeln!(s, "  rankdir=LR;");
        let _ = writeln!(s, "  node [shape=box];");

        for (ri, r) in records.iter().enumerate() {
            for layer in 0..r.layer_count {
                let _ = writeln!(s, "  subgraph cluster_r{ri}_l{layer} {{");
                let _ = writeln!(s, "    label=\"{} L{}\";", r.name, layer);
                let _ = writeln!(s, "    r{ri}_l{layer} [shape=point];");
                for p in r.placements.iter().filter(|p| p.layer == layer) {
                    let color = if p.opened_layer { "blue" } else { "black" };
                    let _ = writeln!(
                        s,
                        "    r{ri}_op{} [label=\"#{} {}\", color=\"{}\"];",
                        p.position, p.position, p.span, color
                    );
                }
                let _ = writeln!(s, "  }}");
            }

            for p in &r.placements {
                if let Some(conflict) = p.conflict {
                    let _ = writeln!(s, "  r{ri}_l{conflict} -> r{ri}_op{};", p.position);
                }
            }
        }

        let _ = writeln!(s, "}}");
        s
    }
}
