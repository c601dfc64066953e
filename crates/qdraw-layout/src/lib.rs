#![forbid(unsafe_code)]

//! Layer assignment and grid materialization for circuit diagrams.
//!
//! # Pipeline
//!
//! ```text
//! ops + WireMap ──► LayerAssigner ──► Vec<Layer> ──► GridMaterializer ──► Grid
//! ```
//!
//! Each call is a pure computation over its inputs: nothing is cached or
//! shared between calls except an optional, explicitly attached
//! [`PlacementDebugger`].
//!
//! # Usage
//!
//! ```
//! use qdraw_core::{Gate, WireMap};
//! use qdraw_layout::{GridMaterializer, LayerAssigner};
//!
//! let ops = [
//!     Gate::new("CNOT", [0, 3]),
//!     Gate::new("H", [1]),
//!     Gate::new("X", [4]),
//! ];
//! let wires = WireMap::from_labels(0..5).unwrap();
//!
//! let layers = LayerAssigner::new().assign(&ops, &wires).unwrap();
//! assert_eq!(layers.len(), 2);
//!
//! let grid = GridMaterializer::new().materialize(&ops, &wires).unwrap();
//! assert_eq!(grid.cell(1, 1).map(Gate::name), Some("H"));
//! assert!(grid.cell(1, 0).is_none());
//! ```

pub mod debug;
pub mod grid;
pub mod layers;
pub mod occupancy;

pub use debug::{LayeringRecord, PlacementDebugger, PlacementRecord};
pub use grid::{Grid, GridMaterializer, drawable_grid};
pub use layers::{Layer, LayerAssigner, LayerPlan, drawable_layers};
pub use occupancy::Occupancy;
pub use qdraw_core::{Gate, InvertedSpan, Operation, WireMap, WireMapError, WireSpan};
