#![forbid(unsafe_code)]

//! Layer assignment for circuit drawings.
//!
//! Sorts an ordered operation sequence into dense, non-overlapping layers
//! (drawing columns).
//!
//! # Design
//!
//! Operations are processed strictly in input order; input order is the only
//! source of time precedence and is never changed. Each operation blocks a
//! [`WireSpan`]: its own wires plus every wire strictly between its extremes,
//! because the connector drawn for a multi-wire operation crosses them. A
//! broadcast operation (no wires) blocks every wire in the map.
//!
//! Layers live in an arena (`Vec`) addressed by index. Layers are only
//! appended, one at a time, so the sequence is always contiguous.
//!
//! # Placement Search
//!
//! Starting at the most recent layer, walk backward while the candidate
//! layer is free on the operation's span:
//!
//! ```text
//! candidate = max_layer
//! while occupancy[candidate] ∩ span = ∅:
//!     if candidate == 0: place at 0
//!     candidate -= 1
//! place at candidate + 1        (may append a new layer)
//! ```
//!
//! The operation lands at the start of the longest conflict-free run of
//! layers ending at `max_layer`: as early as possible, never before a layer
//! it conflicts with. The walk is an explicit loop so circuit depth never
//! turns into stack depth.
//!
//! # Invariants
//!
//! 1. Every operation appears in exactly one layer.
//! 2. Within a layer, the spans of member operations are pairwise disjoint.
//! 3. Layer indices are contiguous; no layer is ever inserted.
//! 4. Same ordered input and wire map → same output.
//!
//! # Failure Modes
//!
//! A wire label missing from the wire map aborts the whole assignment with
//! [`WireMapError::UnknownWire`]; no partial plan is returned.

use crate::debug::{LayeringRecord, PlacementDebugger, PlacementRecord};
use crate::occupancy::Occupancy;
use qdraw_core::{Operation, Result, WireMap, WireSpan};
#[cfg(doc)]
use qdraw_core::WireMapError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

// ============================================================================
// LayerPlan
// ============================================================================

/// Index-based result of layer assignment.
///
/// Operations are referred to by their position in the input slice, so a
/// plan can be stored, compared, or serialized independently of the
/// operations themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayerPlan {
    wire_count: usize,
    /// Input positions per layer, in input order.
    layers: Vec<Vec<usize>>,
    /// Union of member spans per layer.
    occupancy: Vec<Occupancy>,
    /// Layer index per input position.
    op_layers: Vec<usize>,
    /// Blocked span per input position.
    spans: Vec<WireSpan>,
}

impl LayerPlan {
    /// Number of wires in the wire map the plan was computed against.
    #[must_use]
    pub fn wire_count(&self) -> usize {
        self.wire_count
    }

    /// Number of layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Number of placed operations.
    #[must_use]
    pub fn op_count(&self) -> usize {
        self.op_layers.len()
    }

    /// Input positions of the operations in `layer`.
    #[must_use]
    pub fn layer(&self, layer: usize) -> Option<&[usize]> {
        self.layers.get(layer).map(Vec::as_slice)
    }

    /// Input positions grouped by layer.
    pub fn layers(&self) -> impl ExactSizeIterator<Item = &[usize]> + '_ {
        self.layers.iter().map(Vec::as_slice)
    }

    /// Wires blocked in `layer`.
    #[must_use]
    pub fn occupancy(&self, layer: usize) -> Option<&Occupancy> {
        self.occupancy.get(layer)
    }

    /// Layer the operation at `position` was placed in.
    #[must_use]
    pub fn layer_of(&self, position: usize) -> Option<usize> {
        self.op_layers.get(position).copied()
    }

    /// Span blocked by the operation at `position`.
    #[must_use]
    pub fn span_of(&self, position: usize) -> Option<WireSpan> {
        self.spans.get(position).copied()
    }

    /// Layer index of every operation, in input order.
    #[must_use]
    pub fn op_layers(&self) -> &[usize] {
        &self.op_layers
    }

    /// Resolve positions against the operations the plan was built from.
    ///
    /// Returns `None` when `ops` is not the same length as the planned
    /// sequence or a stored position falls outside it, which happens when a
    /// deserialized plan is paired with the wrong slice.
    #[must_use]
    pub fn resolve<'a, O>(&self, ops: &'a [O]) -> Option<Vec<Layer<'a, O>>> {
        let in_bounds = self.layers.iter().flatten().all(|&p| p < ops.len());
        (ops.len() == self.op_count() && in_bounds).then(|| self.layers_over(ops))
    }

    /// Build layer views over `ops`; every stored position must index `ops`.
    fn layers_over<'a, O>(&self, ops: &'a [O]) -> Vec<Layer<'a, O>> {
        self.layers
            .iter()
            .zip(&self.occupancy)
            .enumerate()
            .map(|(index, (positions, occupied))| Layer {
                index,
                ops: positions.iter().map(|&p| &ops[p]).collect(),
                positions: positions.clone(),
                occupied: occupied.clone(),
            })
            .collect()
    }
}

// ============================================================================
// Layer
// ============================================================================

/// One drawing column: the operations placed in it and the wires they block.
///
/// Order of [`ops`](Self::ops) follows input order but carries no meaning.
#[derive(Debug, Clone)]
pub struct Layer<'a, O> {
    index: usize,
    ops: Vec<&'a O>,
    positions: Vec<usize>,
    occupied: Occupancy,
}

impl<'a, O> Layer<'a, O> {
    /// Column index of this layer.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Operations placed in this layer.
    #[must_use]
    pub fn ops(&self) -> &[&'a O] {
        &self.ops
    }

    /// Input positions of the operations in this layer.
    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Wires blocked in this layer.
    #[must_use]
    pub fn occupied(&self) -> &Occupancy {
        &self.occupied
    }

    /// Number of operations in this layer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True when the layer holds no operation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// ============================================================================
// Placement search
// ============================================================================

/// Outcome of the backward search for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Search {
    target: usize,
    conflict: Option<usize>,
    scanned: usize,
}

/// Find the earliest layer `span` may occupy, scanning back from `max_layer`.
fn find_layer(max_layer: usize, span: WireSpan, occupancy: &[Occupancy]) -> Search {
    let mut candidate = max_layer;
    while !occupancy[candidate].intersects(span) {
        if candidate == 0 {
            return Search {
                target: 0,
                conflict: None,
                scanned: max_layer + 1,
            };
        }
        candidate -= 1;
    }
    Search {
        target: candidate + 1,
        conflict: Some(candidate),
        scanned: max_layer - candidate + 1,
    }
}

// ============================================================================
// LayerAssigner
// ============================================================================

/// Assigns operations to drawing layers.
///
/// The assigner itself holds only diagnostics configuration; all working
/// state is created per call.
#[derive(Debug, Clone, Default)]
pub struct LayerAssigner {
    debugger: Option<Arc<PlacementDebugger>>,
    name: Option<String>,
}

impl LayerAssigner {
    /// Create an assigner with no diagnostics attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a placement debugger.
    #[must_use]
    pub fn debugger(mut self, debugger: Arc<PlacementDebugger>) -> Self {
        self.debugger = Some(debugger);
        self
    }

    /// Name used for debugger records.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn active_debugger(&self) -> Option<&PlacementDebugger> {
        self.debugger.as_deref().filter(|d| d.enabled())
    }

    /// Compute the index-based layer plan for `ops`.
    ///
    /// Returns `Err(UnknownWire)` if any operation references a wire that is
    /// not in `wire_map`.
    pub fn plan<O: Operation>(&self, ops: &[O], wire_map: &WireMap<O::Wire>) -> Result<LayerPlan> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "assign_layers",
            ops = ops.len(),
            wires = wire_map.len()
        );
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        let debugger = self.active_debugger();
        let started = debugger.map(|_| Instant::now());
        let mut record = debugger.map(|_| {
            let mut record = LayeringRecord::new(self.name.as_deref().unwrap_or("layers"));
            record.wire_count = wire_map.len();
            record.placements.reserve(ops.len());
            record
        });

        let mut max_layer = 0;
        let mut occupancy = vec![Occupancy::new()];
        let mut layers: Vec<Vec<usize>> = vec![Vec::new()];
        let mut op_layers = Vec::with_capacity(ops.len());
        let mut spans = Vec::with_capacity(ops.len());

        for (position, op) in ops.iter().enumerate() {
            let span = wire_map.occupied_span(op)?;
            let search = find_layer(max_layer, span, &occupancy);

            let opened_layer = search.target > max_layer;
            if opened_layer {
                max_layer += 1;
                occupancy.push(Occupancy::new());
                layers.push(Vec::new());
                #[cfg(feature = "tracing")]
                tracing::trace!(layer = max_layer, position, "opened layer");
            }

            layers[search.target].push(position);
            occupancy[search.target].insert_span(span);
            op_layers.push(search.target);
            spans.push(span);

            if let Some(record) = record.as_mut() {
                record.placements.push(PlacementRecord {
                    position,
                    span,
                    scanned: search.scanned,
                    conflict: search.conflict,
                    layer: search.target,
                    opened_layer,
                });
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(layers = layers.len(), "layer assignment complete");

        if let (Some(debugger), Some(mut record)) = (debugger, record) {
            record.layer_count = layers.len();
            record.solve_time = started.map(|t| t.elapsed());
            debugger.record(record);
        }

        Ok(LayerPlan {
            wire_count: wire_map.len(),
            layers,
            occupancy,
            op_layers,
            spans,
        })
    }

    /// Assign `ops` to layers, returning references into `ops`.
    ///
    /// Always yields at least one layer; with no operations that layer is
    /// empty.
    pub fn assign<'a, O: Operation>(
        &self,
        ops: &'a [O],
        wire_map: &WireMap<O::Wire>,
    ) -> Result<Vec<Layer<'a, O>>> {
        Ok(self.plan(ops, wire_map)?.layers_over(ops))
    }
}

/// Assign `ops` to layers with default settings.
///
/// When `wire_map` is `None` it is derived from `ops` by first occurrence.
pub fn drawable_layers<'a, O: Operation>(
    ops: &'a [O],
    wire_map: Option<&WireMap<O::Wire>>,
) -> Result<Vec<Layer<'a, O>>> {
    let derived;
    let wire_map = match wire_map {
        Some(map) => map,
        None => {
            derived = WireMap::from_operations(ops);
            &derived
        }
    };
    LayerAssigner::new().assign(ops, wire_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdraw_core::{Gate, WireMapError};

    fn wires(n: usize) -> WireMap<usize> {
        WireMap::from_labels(0..n).unwrap()
    }

    fn layer_positions(plan: &LayerPlan) -> Vec<Vec<usize>> {
        plan.layers().map(<[usize]>::to_vec).collect()
    }

    #[test]
    fn find_layer_stops_after_conflict() {
        let mut occupancy = vec![Occupancy::new(), Occupancy::new(), Occupancy::new()];
        occupancy[0].insert_span(WireSpan::single(1));
        occupancy[2].insert_span(WireSpan::single(0));

        // Wire 1 is free in layers 2 and 1, blocked in layer 0.
        let search = find_layer(2, WireSpan::single(1), &occupancy);
        assert_eq!(
            search,
            Search {
                target: 1,
                conflict: Some(0),
                scanned: 3
            }
        );
    }

    #[test]
    fn find_layer_reaches_first_layer() {
        let occupancy = vec![Occupancy::new(), Occupancy::new()];
        let search = find_layer(1, WireSpan::single(3), &occupancy);
        assert_eq!(search.target, 0);
        assert_eq!(search.conflict, None);
        assert_eq!(search.scanned, 2);
    }

    #[test]
    fn find_layer_conflict_at_top_opens_next() {
        let mut occupancy = vec![Occupancy::new()];
        occupancy[0].insert_span(WireSpan::single(0));
        let search = find_layer(0, WireSpan::single(0), &occupancy);
        assert_eq!(search.target, 1);
        assert_eq!(search.scanned, 1);
    }

    #[test]
    fn same_wire_stacks() {
        let ops = [Gate::new("A", [0]), Gate::new("B", [0])];
        let plan = LayerAssigner::new().plan(&ops, &wires(1)).unwrap();
        assert_eq!(layer_positions(&plan), vec![vec![0], vec![1]]);
    }

    #[test]
    fn disjoint_wires_share_a_layer() {
        let ops = [Gate::new("A", [0]), Gate::new("B", [1])];
        let plan = LayerAssigner::new().plan(&ops, &wires(2)).unwrap();
        assert_eq!(layer_positions(&plan), vec![vec![0, 1]]);
    }

    #[test]
    fn later_op_slides_back_past_unrelated_layers() {
        // A and B stack on wire 0; C on wire 1 goes all the way back.
        let ops = [
            Gate::new("A", [0]),
            Gate::new("B", [0]),
            Gate::new("C", [1]),
        ];
        let plan = LayerAssigner::new().plan(&ops, &wires(2)).unwrap();
        assert_eq!(layer_positions(&plan), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn search_never_jumps_over_a_conflict() {
        // Layer 0: A(0); layer 1: B(0,1) blocks 0..=1; layer 2: C(0).
        // D on wire 1 is free in layer 2 but blocked by B, so lands in 2.
        let ops = [
            Gate::new("A", [0]),
            Gate::new("B", [0, 1]),
            Gate::new("C", [0]),
            Gate::new("D", [1]),
        ];
        let plan = LayerAssigner::new().plan(&ops, &wires(2)).unwrap();
        assert_eq!(plan.op_layers(), &[0, 1, 2, 2]);
    }

    #[test]
    fn span_blocks_inner_wire() {
        let ops = [Gate::new("E", [0, 3]), Gate::new("F", [1])];
        let plan = LayerAssigner::new().plan(&ops, &wires(4)).unwrap();
        assert_eq!(layer_positions(&plan), vec![vec![0], vec![1]]);
        assert_eq!(plan.span_of(0), Some(WireSpan::between(0, 3)));
        assert_eq!(plan.occupancy(0).unwrap().sorted(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn broadcast_takes_its_own_layer() {
        let ops = [
            Gate::new("H", [0]),
            Gate::broadcast("state"),
            Gate::new("X", [1]),
        ];
        let plan = LayerAssigner::new().plan(&ops, &wires(2)).unwrap();
        assert_eq!(layer_positions(&plan), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn broadcast_on_empty_map_goes_to_first_layer() {
        let ops: [Gate<usize>; 2] = [Gate::broadcast("state"), Gate::broadcast("sample")];
        let plan = LayerAssigner::new().plan(&ops, &wires(0)).unwrap();
        assert_eq!(layer_positions(&plan), vec![vec![0, 1]]);
    }

    #[test]
    fn empty_input_yields_one_empty_layer() {
        let ops: [Gate<usize>; 0] = [];
        let layers = LayerAssigner::new().assign(&ops, &wires(3)).unwrap();
        assert_eq!(layers.len(), 1);
        assert!(layers[0].is_empty());
    }

    #[test]
    fn unknown_wire_aborts() {
        let ops = [Gate::new("A", [0]), Gate::new("B", [5])];
        let err = LayerAssigner::new().plan(&ops, &wires(2)).unwrap_err();
        assert_eq!(
            err,
            WireMapError::UnknownWire {
                label: "5".to_string()
            }
        );
    }

    #[test]
    fn assign_resolves_references() {
        let ops = [Gate::new("C", [0, 1]), Gate::new("D", [0])];
        let layers = LayerAssigner::new().assign(&ops, &wires(2)).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].ops()[0].name(), "C");
        assert_eq!(layers[1].ops()[0].name(), "D");
        assert_eq!(layers[1].index(), 1);
        assert_eq!(layers[1].positions(), &[1]);
        assert!(layers[0].occupied().contains(1));
    }

    #[test]
    fn resolve_matches_assign_on_original_ops() {
        let ops = [Gate::new("C", [0, 1]), Gate::new("D", [0])];
        let plan = LayerAssigner::new().plan(&ops, &wires(2)).unwrap();
        let layers = plan.resolve(&ops).expect("same slice");
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1].ops()[0].name(), "D");
    }

    #[test]
    fn resolve_rejects_mismatched_slice() {
        let ops = [Gate::new("H", [0]), Gate::new("X", [0])];
        let plan = LayerAssigner::new().plan(&ops, &wires(1)).unwrap();
        assert!(plan.resolve(&ops[..1]).is_none());

        let longer = [Gate::new("H", [0]), Gate::new("X", [0]), Gate::new("Z", [0])];
        assert!(plan.resolve(&longer).is_none());
    }

    #[test]
    fn drawable_layers_derives_wire_map() {
        let ops = [
            Gate::new("H", ["b"]),
            Gate::new("H", ["a"]),
            Gate::new("CNOT", ["b", "a"]),
        ];
        let layers = drawable_layers(&ops, None).unwrap();
        let names: Vec<Vec<&str>> = layers
            .iter()
            .map(|l| l.ops().iter().map(|g| g.name()).collect())
            .collect();
        assert_eq!(names, vec![vec!["H", "H"], vec!["CNOT"]]);
    }

    #[test]
    fn debugger_sees_every_placement() {
        let debugger = PlacementDebugger::new();
        debugger.set_enabled(true);
        let assigner = LayerAssigner::new().debugger(debugger.clone()).name("ghz");

        let ops = [
            Gate::new("H", [0]),
            Gate::new("CNOT", [0, 1]),
            Gate::new("CNOT", [1, 2]),
        ];
        assigner.plan(&ops, &wires(3)).unwrap();

        let records = debugger.snapshot();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "ghz");
        assert_eq!(record.layer_count, 3);
        assert_eq!(record.opened_layers(), 2);
        assert_eq!(record.placements[2].conflict, Some(1));
        assert!(record.solve_time.is_some());
    }

    #[test]
    fn repeated_plans_stay_within_debugger_capacity() {
        let debugger = PlacementDebugger::with_capacity(3);
        debugger.set_enabled(true);
        let ops = [Gate::new("H", [0]), Gate::new("X", [0])];
        for run in 0..10 {
            LayerAssigner::new()
                .debugger(debugger.clone())
                .name(format!("run{run}"))
                .plan(&ops, &wires(1))
                .unwrap();
        }

        let names: Vec<String> = debugger.snapshot().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["run7", "run8", "run9"]);
        assert_eq!(debugger.evicted(), 7);
    }

    #[test]
    fn disabled_debugger_records_nothing() {
        let debugger = PlacementDebugger::new();
        let assigner = LayerAssigner::new().debugger(debugger.clone());
        let ops = [Gate::new("H", [0])];
        assigner.plan(&ops, &wires(1)).unwrap();
        assert!(debugger.snapshot().is_empty());
    }
}
