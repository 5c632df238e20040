// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Processing-graph nodes and incremental evaluation.
//!
//! A [`GraphStore`] is a small arena of processing nodes addressed by
//! generational [`NodeId`] handles, with at most one inbound edge per pad.
//! Graphs here are *wiring state*: the per-drawable compositing graphs
//! (mode blending, floating-selection overlays) are reconfigured in place
//! as visibility and attachment change, and verified structurally.
//!
//! The applicator's evaluation graph is additionally *executed*: a
//! [`Processor`] walks the chain feeding a sink node and computes one tile
//! per [`step`](Processor::step), which is what makes preview application
//! incremental. Buffer bindings are symbolic ([`SourceBinding`]) and
//! resolved against an [`EvalContext`] at execution time, so replacing a
//! drawable's buffer never leaves a node pointing at freed pixels.

mod node;
mod process;
mod store;

pub use node::{NodeId, NodeKind, Pad, SourceBinding};
pub use process::{EvalContext, Processor, TILE_SIZE};
pub use store::GraphStore;
