#![forbid(unsafe_code)]

//! Property-based invariant tests for layer assignment and grid
//! materialization.
//!
//! These tests verify, over random operation streams:
//!
//! 1. Every operation lands in exactly one layer
//! 2. Spans inside a layer are pairwise disjoint
//! 3. No empty layer (the lone layer of an empty input aside)
//! 4. Conflicting operations keep their input order across layers
//! 5. Every operation in a layer > 0 sits right after a conflicting layer
//! 6. Placement matches a straightforward recursive reference
//! 7. Grid cells account for exactly the touched wires of each operation
//! 8. Determinism: same input yields the same plan and grid

use proptest::prelude::*;
use qdraw_layout::{Gate, GridMaterializer, LayerAssigner, LayerPlan, Occupancy, WireMap, WireSpan};
use std::collections::BTreeSet;

// ── Strategies ──────────────────────────────────────────────────────────

/// A circuit: wire count plus ops whose wires are drawn from `0..wire_count`.
fn circuit_strategy() -> impl Strategy<Value = (usize, Vec<Vec<usize>>)> {
    (1usize..12).prop_flat_map(|wire_count| {
        let op = prop::collection::vec(0..wire_count, 0..=3);
        (Just(wire_count), prop::collection::vec(op, 0..60))
    })
}

fn build(wire_count: usize, raw: &[Vec<usize>]) -> (WireMap<usize>, Vec<Gate<usize>>) {
    let map = WireMap::from_labels(0..wire_count).expect("labels are distinct");
    let ops = raw
        .iter()
        .enumerate()
        .map(|(i, wires)| Gate::new(format!("op{i}"), wires.iter().copied()))
        .collect();
    (map, ops)
}

fn plan_of(map: &WireMap<usize>, ops: &[Gate<usize>]) -> LayerPlan {
    LayerAssigner::new().plan(ops, map).expect("all wires are mapped")
}

// ── Reference model ─────────────────────────────────────────────────────

fn reference_find(layer: usize, span: WireSpan, occupancy: &[Occupancy]) -> usize {
    if occupancy[layer].intersects(span) {
        return layer + 1;
    }
    if layer == 0 {
        return 0;
    }
    reference_find(layer - 1, span, occupancy)
}

fn reference_layers(map: &WireMap<usize>, ops: &[Gate<usize>]) -> Vec<usize> {
    let mut occupancy = vec![Occupancy::new()];
    let mut max_layer = 0;
    let mut out = Vec::new();
    for op in ops {
        let span = map.occupied_span(op).expect("mapped");
        let layer = reference_find(max_layer, span, &occupancy);
        if layer > max_layer {
            max_layer += 1;
            occupancy.push(Occupancy::new());
        }
        occupancy[layer].insert_span(span);
        out.push(layer);
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════
// Layer invariants
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn every_op_placed_exactly_once((wire_count, raw) in circuit_strategy()) {
        let (map, ops) = build(wire_count, &raw);
        let plan = plan_of(&map, &ops);

        let mut seen = vec![0usize; ops.len()];
        for (layer, positions) in plan.layers().enumerate() {
            for &p in positions {
                seen[p] += 1;
                prop_assert_eq!(plan.layer_of(p), Some(layer));
            }
        }
        prop_assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn spans_in_a_layer_are_disjoint((wire_count, raw) in circuit_strategy()) {
        let (map, ops) = build(wire_count, &raw);
        let plan = plan_of(&map, &ops);

        for positions in plan.layers() {
            for (i, &a) in positions.iter().enumerate() {
                for &b in &positions[i + 1..] {
                    let sa = plan.span_of(a).unwrap();
                    let sb = plan.span_of(b).unwrap();
                    prop_assert!(!sa.intersects(&sb), "ops {} and {} overlap: {} vs {}", a, b, sa, sb);
                }
            }
        }
    }

    #[test]
    fn layers_are_dense((wire_count, raw) in circuit_strategy()) {
        let (map, ops) = build(wire_count, &raw);
        let plan = plan_of(&map, &ops);

        prop_assert!(plan.layer_count() >= 1);
        if ops.is_empty() {
            prop_assert_eq!(plan.layer_count(), 1);
        } else {
            for positions in plan.layers() {
                prop_assert!(!positions.is_empty());
            }
        }
    }

    #[test]
    fn conflicting_ops_keep_input_order((wire_count, raw) in circuit_strategy()) {
        let (map, ops) = build(wire_count, &raw);
        let plan = plan_of(&map, &ops);

        for a in 0..ops.len() {
            for b in a + 1..ops.len() {
                let sa = plan.span_of(a).unwrap();
                let sb = plan.span_of(b).unwrap();
                if sa.intersects(&sb) {
                    prop_assert!(plan.layer_of(a) < plan.layer_of(b));
                }
            }
        }
    }

    #[test]
    fn placed_right_after_a_conflict((wire_count, raw) in circuit_strategy()) {
        let (map, ops) = build(wire_count, &raw);
        let plan = plan_of(&map, &ops);

        for p in 0..ops.len() {
            let layer = plan.layer_of(p).unwrap();
            if layer == 0 {
                continue;
            }
            // Some earlier op in the previous layer must overlap this one.
            let span = plan.span_of(p).unwrap();
            let blocked = plan
                .layer(layer - 1)
                .unwrap()
                .iter()
                .any(|&q| q < p && plan.span_of(q).unwrap().intersects(&span));
            prop_assert!(blocked, "op {} in layer {} has no blocker", p, layer);
        }
    }

    #[test]
    fn matches_recursive_reference((wire_count, raw) in circuit_strategy()) {
        let (map, ops) = build(wire_count, &raw);
        let plan = plan_of(&map, &ops);
        prop_assert_eq!(plan.op_layers().to_vec(), reference_layers(&map, &ops));
    }

    #[test]
    fn broadcast_never_shares_with_earlier_ops(
        (wire_count, raw) in circuit_strategy(),
        at in 0usize..60,
    ) {
        let (map, mut ops) = build(wire_count, &raw);
        let at = at.min(ops.len());
        ops.insert(at, Gate::broadcast("state"));
        let plan = plan_of(&map, &ops);

        let layer = plan.layer_of(at).unwrap();
        let members = plan.layer(layer).unwrap();
        // Only later ops could share it, and only by blocking nothing.
        for &q in members {
            if q != at {
                prop_assert!(q > at);
                prop_assert!(plan.span_of(q).unwrap().is_empty());
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Grid invariants
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn grid_cells_match_touched_wires((wire_count, raw) in circuit_strategy()) {
        let (map, ops) = build(wire_count, &raw);
        let plan = plan_of(&map, &ops);
        let grid = GridMaterializer::new().materialize(&ops, &map).unwrap();

        if ops.is_empty() {
            prop_assert_eq!(grid.rows().len(), wire_count);
            prop_assert_eq!(grid.layer_count(), 0);
            return Ok(());
        }

        prop_assert_eq!(grid.wire_count(), wire_count);
        prop_assert_eq!(grid.layer_count(), plan.layer_count());

        let mut expected_total = 0;
        for (p, op) in ops.iter().enumerate() {
            let layer = plan.layer_of(p).unwrap();
            let rows: BTreeSet<usize> = if raw[p].is_empty() {
                (0..wire_count).collect()
            } else {
                raw[p].iter().copied().collect()
            };
            expected_total += rows.len();
            for wire in 0..wire_count {
                let cell = grid.cell(wire, layer);
                if rows.contains(&wire) {
                    prop_assert!(cell.is_some_and(|c| std::ptr::eq(c, op)));
                } else {
                    prop_assert!(cell.is_none_or(|c| !std::ptr::eq(c, op)));
                }
            }
        }
        prop_assert_eq!(grid.occupied_cells(), expected_total);
    }

    #[test]
    fn output_is_deterministic((wire_count, raw) in circuit_strategy()) {
        let (map, ops) = build(wire_count, &raw);
        prop_assert_eq!(plan_of(&map, &ops), plan_of(&map, &ops));

        let materializer = GridMaterializer::new();
        let a = materializer.materialize(&ops, &map).unwrap();
        let b = materializer.materialize(&ops, &map).unwrap();
        prop_assert_eq!(a, b);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Deep circuits
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn deep_circuit_does_not_recurse() {
    // 50k ops stacked on wire 0, then one op on wire 1 that must walk all
    // the way back to layer 0.
    let mut ops: Vec<Gate<usize>> = (0..50_000).map(|i| Gate::new(format!("g{i}"), [0])).collect();
    ops.push(Gate::new("late", [1]));
    let map = WireMap::from_labels(0..2).unwrap();

    let plan = plan_of(&map, &ops);
    assert_eq!(plan.layer_count(), 50_000);
    assert_eq!(plan.layer_of(50_000), Some(0));
}
