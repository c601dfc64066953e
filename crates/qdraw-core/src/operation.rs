#![forbid(unsafe_code)]

//! The operation capability consumed by layout passes.
//!
//! Layout only needs to know which wires an operation touches, in order.
//! Anything that can answer that implements [`Operation`]; the upstream
//! circuit representation stays opaque.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Something that sits on one or more wires of a circuit diagram.
///
/// An operation with no wires is a broadcast: it acts on every wire the
/// wire map knows about (for example, a full-state measurement).
pub trait Operation {
    /// Label type identifying a wire.
    type Wire: Eq + Hash + Clone + fmt::Debug;

    /// Wires touched by this operation, in the operation's own order.
    fn wires(&self) -> &[Self::Wire];

    /// True when the operation has no explicit wires.
    #[inline]
    fn is_broadcast(&self) -> bool {
        self.wires().is_empty()
    }
}

impl<T: Operation + ?Sized> Operation for &T {
    type Wire = T::Wire;

    #[inline]
    fn wires(&self) -> &[Self::Wire] {
        (**self).wires()
    }
}

impl<T: Operation + ?Sized> Operation for Box<T> {
    type Wire = T::Wire;

    #[inline]
    fn wires(&self) -> &[Self::Wire] {
        (**self).wires()
    }
}

/// A named operation over an explicit wire list.
///
/// Convenience implementation of [`Operation`] for callers that do not have
/// their own circuit types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gate<W> {
    name: String,
    wires: Vec<W>,
}

impl<W> Gate<W> {
    /// Create a gate acting on `wires` in the given order.
    pub fn new(name: impl Into<String>, wires: impl IntoIterator<Item = W>) -> Self {
        Self {
            name: name.into(),
            wires: wires.into_iter().collect(),
        }
    }

    /// Create a gate with no explicit wires (acts on all wires).
    pub fn broadcast(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wires: Vec::new(),
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<W: Eq + Hash + Clone + fmt::Debug> Operation for Gate<W> {
    type Wire = W;

    #[inline]
    fn wires(&self) -> &[W] {
        &self.wires
    }
}

impl<W: fmt::Debug> fmt::Display for Gate<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, wire) in self.wires.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{wire:?}")?;
        }
        write!(f, ")")
    }
}
