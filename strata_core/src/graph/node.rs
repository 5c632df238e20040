// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity and kinds.

use std::fmt;

use crate::blend::BlendMode;
use crate::drawable::DrawableId;
use crate::geom::PixelRect;

/// A handle to a node in a [`GraphStore`](super::GraphStore).
///
/// Contains both a slot index and a generation counter so that stale
/// handles can be detected after a node is removed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

/// An input connection point of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pad {
    /// The primary input.
    Input,
    /// The auxiliary input of a blend node.
    Aux,
}

/// What a buffer-source node reads from.
///
/// Bindings are symbolic and resolved at execution time, so a drawable
/// buffer replacement automatically rebinds every source referring to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceBinding {
    /// The owning applicator's region backup.
    Backup,
    /// A drawable's live buffer.
    Drawable(DrawableId),
}

/// The kind and parameters of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeKind {
    /// The input proxy of a wiring graph.
    InputProxy,
    /// The output proxy of a wiring graph; also serves as the evaluation
    /// sink.
    OutputProxy,
    /// Produces pixels from a bound buffer.
    BufferSource(SourceBinding),
    /// Shifts its input by an offset.
    Translate {
        /// Horizontal shift.
        dx: i32,
        /// Vertical shift.
        dy: i32,
    },
    /// Restricts its input to a rectangle (transparent outside).
    Crop {
        /// The kept region, in the graph's coordinate space.
        rect: PixelRect,
    },
    /// Composites its auxiliary input over its primary input.
    Blend {
        /// Blend mode.
        mode: BlendMode,
        /// Top opacity in `0.0..=1.0`.
        opacity: f32,
    },
    /// The externally supplied pixel operation; its body is provided by
    /// the executing applicator, not owned by the graph.
    Operation,
    /// Writes the finished pixels into the execution target.
    WriteSink,
}
