#![forbid(unsafe_code)]

//! Core: wire labels, dense wire maps, and the operation capability.
//!
//! # Role in qdraw
//! `qdraw-core` owns the vocabulary shared by the layout passes. It knows
//! nothing about layers or grids; it only answers "which integer row does
//! this wire label land on" and "which rows does this operation block".
//!
//! # Primary responsibilities
//! - **Operation**: the capability an operation must expose (its ordered
//!   wire labels). Zero wires means broadcast over every known wire.
//! - **WireMap**: dense bijection from labels to `0..n`, either supplied by
//!   the caller or derived by first occurrence.
//! - **WireSpan**: the contiguous block of rows an operation occupies for
//!   placement purposes.
//!
//! # How it fits in the system
//! `qdraw-layout` consumes these types to assign operations to layers and
//! to materialize the `wire × layer` grid handed to a renderer.

pub mod operation;
pub mod span;
pub mod wire_map;

pub use operation::{Gate, Operation};
pub use span::{InvertedSpan, WireSpan};
pub use wire_map::{Result, WireMap, WireMapError};
