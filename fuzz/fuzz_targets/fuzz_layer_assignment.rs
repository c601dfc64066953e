#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use qdraw_core::{Gate, WireMap};
use qdraw_layout::{GridMaterializer, LayerAssigner};

#[derive(Debug, Arbitrary)]
struct Circuit {
    wire_count: u8,
    ops: Vec<Vec<u8>>,
}

fuzz_target!(|circuit: Circuit| {
    // Keep wire indices inside the map so every run exercises placement
    // rather than the unknown-wire path.
    let wire_count = usize::from(circuit.wire_count % 64);
    if circuit.ops.len() > 512 {
        return;
    }
    let ops: Vec<Gate<usize>> = circuit
        .ops
        .iter()
        .map(|wires| {
            let wires = wires.iter().take(4).filter_map(|&w| {
                (wire_count > 0).then(|| usize::from(w) % wire_count)
            });
            Gate::new("op", wires)
        })
        .collect();
    let map = WireMap::from_labels(0..wire_count).expect("labels are distinct");

    let plan = LayerAssigner::new()
        .plan(&ops, &map)
        .expect("every wire is mapped");

    // Post-conditions that must always hold:
    assert!(plan.layer_count() >= 1, "at least one layer");
    assert_eq!(plan.op_count(), ops.len(), "every op placed");
    for positions in plan.layers() {
        for (i, &a) in positions.iter().enumerate() {
            for &b in &positions[i + 1..] {
                let sa = plan.span_of(a).expect("span");
                let sb = plan.span_of(b).expect("span");
                assert!(!sa.intersects(&sb), "overlap in layer: {sa} vs {sb}");
            }
        }
    }

    let grid = GridMaterializer::new()
        .materialize(&ops, &map)
        .expect("every wire is mapped");
    if ops.is_empty() {
        assert_eq!(grid.layer_count(), 0);
    } else {
        assert_eq!(grid.layer_count(), plan.layer_count());
        assert_eq!(grid.rows().len(), wire_count);
    }
});
