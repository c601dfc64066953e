#![forbid(unsafe_code)]

//! Grid materialization.
//!
//! Turns a layer assignment into the dense `wire × layer` array a renderer
//! walks row by row.
//!
//! # Cell Rules
//!
//! - A broadcast operation fills its whole column.
//! - Any other operation fills only the rows of the wires it actually
//!   touches. Pass-through rows between its extremes stay empty; drawing
//!   the connector through them is the renderer's job.
//!
//! # Degenerate Inputs
//!
//! | ops   | wires | result                                  |
//! |-------|-------|-----------------------------------------|
//! | empty | 0     | one placeholder row with zero cells     |
//! | empty | n > 0 | `n` rows with zero cells                |
//!
//! Neither is an error.

use crate::layers::{LayerAssigner, LayerPlan};
use qdraw_core::{Operation, Result, WireMap};

/// Dense `wire × layer` array of optional operation references.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<'a, O> {
    rows: Vec<Vec<Option<&'a O>>>,
    wire_count: usize,
    layer_count: usize,
}

impl<'a, O> Grid<'a, O> {
    fn blank(wire_count: usize, layer_count: usize) -> Self {
        Self {
            rows: vec![vec![None; layer_count]; wire_count],
            wire_count,
            layer_count,
        }
    }

    fn placeholder() -> Self {
        Self {
            rows: vec![Vec::new()],
            wire_count: 0,
            layer_count: 0,
        }
    }

    /// Number of wire rows.
    ///
    /// The placeholder grid reports zero even though it holds one empty row.
    #[must_use]
    pub fn wire_count(&self) -> usize {
        self.wire_count
    }

    /// Number of layer columns.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// True for the zero-wire, zero-operation placeholder.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.wire_count == 0 && self.rows.len() == 1
    }

    /// Raw rows, indexed `[wire][layer]`.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<&'a O>>] {
        &self.rows
    }

    /// Cells of one wire row.
    #[must_use]
    pub fn row(&self, wire: usize) -> Option<&[Option<&'a O>]> {
        self.rows.get(wire).map(Vec::as_slice)
    }

    /// Operation at `(wire, layer)`, if any.
    #[must_use]
    pub fn cell(&self, wire: usize, layer: usize) -> Option<&'a O> {
        self.rows.get(wire)?.get(layer).copied().flatten()
    }

    /// Cells of one layer column, top to bottom.
    pub fn column(&self, layer: usize) -> impl Iterator<Item = Option<&'a O>> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(layer).copied().flatten())
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|cell| cell.is_some()).count())
            .sum()
    }
}

/// Builds [`Grid`]s from operation sequences.
#[derive(Debug, Clone, Default)]
pub struct GridMaterializer {
    assigner: LayerAssigner,
}

impl GridMaterializer {
    /// Create a materializer with a default [`LayerAssigner`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `assigner` for layer assignment.
    #[must_use]
    pub fn assigner(mut self, assigner: LayerAssigner) -> Self {
        self.assigner = assigner;
        self
    }

    /// Assign `ops` to layers and lay them out on a `wire × layer` grid.
    ///
    /// Row count follows `wire_map`, including wires no operation touches.
    pub fn materialize<'a, O: Operation>(
        &self,
        ops: &'a [O],
        wire_map: &WireMap<O::Wire>,
    ) -> Result<Grid<'a, O>> {
        let wire_count = wire_map.len();
        if ops.is_empty() {
            return Ok(if wire_count == 0 {
                Grid::placeholder()
            } else {
                Grid::blank(wire_count, 0)
            });
        }

        let plan = self.assigner.plan(ops, wire_map)?;
        fill(ops, &plan, wire_map)
    }
}

fn fill<'a, O: Operation>(
    ops: &'a [O],
    plan: &LayerPlan,
    wire_map: &WireMap<O::Wire>,
) -> Result<Grid<'a, O>> {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!(
        "materialize_grid",
        wires = wire_map.len(),
        layers = plan.layer_count()
    );
    #[cfg(feature = "tracing")]
    let _guard = _span.enter();

    let mut grid = Grid::blank(wire_map.len(), plan.layer_count());

    for (layer, positions) in plan.layers().enumerate() {
        for &position in positions {
            let op = &ops[position];
            if op.is_broadcast() {
                for row in &mut grid.rows {
                    row[layer] = Some(op);
                }
            }
            for wire in op.wires() {
                grid.rows[wire_map.index_of(wire)?][layer] = Some(op);
            }
        }
    }

    Ok(grid)
}

/// Materialize `ops` with default settings.
///
/// When `wire_map` is `None` it is derived from `ops` by first occurrence.
pub fn drawable_grid<'a, O: Operation>(
    ops: &'a [O],
    wire_map: Option<&WireMap<O::Wire>>,
) -> Result<Grid<'a, O>> {
    let derived;
    let wire_map = match wire_map {
        Some(map) => map,
        None => {
            derived = WireMap::from_operations(ops);
            &derived
        }
    };
    GridMaterializer::new().materialize(ops, wire_map)
}
