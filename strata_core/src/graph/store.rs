// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node storage, wiring, and parameter management.

use crate::blend::BlendMode;
use crate::geom::PixelRect;

use super::node::{NodeId, NodeKind, Pad};

const INVALID: u32 = u32::MAX;

/// An arena of processing nodes with at-most-one edge per input pad.
///
/// Nodes are addressed by [`NodeId`] handles; removed slots are recycled
/// via a free list and generation counters reject stale handles.
///
/// Wiring discipline: [`connect`](Self::connect) panics when the target pad
/// is already fed. Reconfiguration must fully tear down old edges before
/// making new ones, so a graph can never transiently hold two edges into
/// the same pad.
#[derive(Debug, Default)]
pub struct GraphStore {
    kinds: Vec<NodeKind>,
    // Per node: the slot feeding its Input / Aux pad, or INVALID.
    input_edge: Vec<u32>,
    aux_edge: Vec<u32>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
    len: u32,
}

impl GraphStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its handle.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generation[idx as usize] += 1;
            self.kinds[idx as usize] = kind;
            self.input_edge[idx as usize] = INVALID;
            self.aux_edge[idx as usize] = INVALID;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.kinds.push(kind);
            self.input_edge.push(INVALID);
            self.aux_edge.push(INVALID);
            self.generation.push(0);
            idx
        };
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Removes a node, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node still has edges (in either
    /// direction) — disconnect first.
    pub fn remove_node(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.input_edge[idx as usize] == INVALID && self.aux_edge[idx as usize] == INVALID,
            "cannot remove a node with connected input pads"
        );
        assert!(
            !self.has_consumers(id),
            "cannot remove a node that still feeds another pad"
        );
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
    }

    /// Returns whether the handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Connects `src`'s output to `pad` of `dst`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or the pad is already fed.
    pub fn connect(&mut self, src: NodeId, dst: NodeId, pad: Pad) {
        self.validate(src);
        self.validate(dst);
        let edge = self.edge_mut(dst.idx, pad);
        assert!(
            *edge == INVALID,
            "pad {pad:?} of {dst:?} is already connected"
        );
        *edge = src.idx;
    }

    /// Disconnects `pad` of `dst`. Disconnecting an unconnected pad is a
    /// no-op.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn disconnect(&mut self, dst: NodeId, pad: Pad) {
        self.validate(dst);
        *self.edge_mut(dst.idx, pad) = INVALID;
    }

    /// Returns the node feeding `pad` of `dst`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn source_of(&self, dst: NodeId, pad: Pad) -> Option<NodeId> {
        self.validate(dst);
        let src = match pad {
            Pad::Input => self.input_edge[dst.idx as usize],
            Pad::Aux => self.aux_edge[dst.idx as usize],
        };
        (src != INVALID).then(|| NodeId {
            idx: src,
            generation: self.generation[src as usize],
        })
    }

    /// Returns whether any live node's pad is fed by `id`.
    #[must_use]
    pub fn has_consumers(&self, id: NodeId) -> bool {
        self.validate(id);
        (0..self.len).any(|n| {
            !self.free_list.contains(&n)
                && (self.input_edge[n as usize] == id.idx || self.aux_edge[n as usize] == id.idx)
        })
    }

    /// Returns the kind of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        self.validate(id);
        &self.kinds[id.idx as usize]
    }

    /// Updates a translate node's offset.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node is not a translate node.
    pub fn set_translate(&mut self, id: NodeId, dx: i32, dy: i32) {
        self.validate(id);
        match &mut self.kinds[id.idx as usize] {
            NodeKind::Translate { dx: x, dy: y } => {
                *x = dx;
                *y = dy;
            }
            other => panic!("set_translate on {other:?}"),
        }
    }

    /// Updates a crop node's rectangle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node is not a crop node.
    pub fn set_crop(&mut self, id: NodeId, rect: PixelRect) {
        self.validate(id);
        match &mut self.kinds[id.idx as usize] {
            NodeKind::Crop { rect: r } => *r = rect,
            other => panic!("set_crop on {other:?}"),
        }
    }

    /// Updates a blend node's mode and opacity.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node is not a blend node.
    pub fn set_blend(&mut self, id: NodeId, mode: BlendMode, opacity: f32) {
        self.validate(id);
        match &mut self.kinds[id.idx as usize] {
            NodeKind::Blend {
                mode: m,
                opacity: o,
            } => {
                *m = mode;
                *o = opacity;
            }
            other => panic!("set_blend on {other:?}"),
        }
    }

    fn edge_mut(&mut self, idx: u32, pad: Pad) -> &mut u32 {
        match pad {
            Pad::Input => &mut self.input_edge[idx as usize],
            Pad::Aux => &mut self.aux_edge[idx as usize],
        }
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: NodeId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale NodeId: {id:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SourceBinding;

    #[test]
    fn add_and_remove() {
        let mut g = GraphStore::new();
        let n = g.add_node(NodeKind::InputProxy);
        assert!(g.is_alive(n));
        g.remove_node(n);
        assert!(!g.is_alive(n));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut g = GraphStore::new();
        let a = g.add_node(NodeKind::InputProxy);
        g.remove_node(a);
        let b = g.add_node(NodeKind::OutputProxy);
        assert_eq!(a.idx, b.idx);
        assert!(!g.is_alive(a));
        assert!(g.is_alive(b));
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn stale_handle_panics_on_kind() {
        let mut g = GraphStore::new();
        let n = g.add_node(NodeKind::InputProxy);
        g.remove_node(n);
        let _ = g.kind(n);
    }

    #[test]
    fn connect_and_query() {
        let mut g = GraphStore::new();
        let src = g.add_node(NodeKind::BufferSource(SourceBinding::Backup));
        let dst = g.add_node(NodeKind::WriteSink);
        g.connect(src, dst, Pad::Input);
        assert_eq!(g.source_of(dst, Pad::Input), Some(src));
        assert_eq!(g.source_of(dst, Pad::Aux), None);
    }

    #[test]
    #[should_panic(expected = "already connected")]
    fn double_connect_panics() {
        let mut g = GraphStore::new();
        let a = g.add_node(NodeKind::InputProxy);
        let b = g.add_node(NodeKind::InputProxy);
        let dst = g.add_node(NodeKind::WriteSink);
        g.connect(a, dst, Pad::Input);
        g.connect(b, dst, Pad::Input);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut g = GraphStore::new();
        let src = g.add_node(NodeKind::InputProxy);
        let dst = g.add_node(NodeKind::WriteSink);
        g.connect(src, dst, Pad::Input);
        g.disconnect(dst, Pad::Input);
        g.disconnect(dst, Pad::Input);
        assert_eq!(g.source_of(dst, Pad::Input), None);
    }

    #[test]
    #[should_panic(expected = "still feeds another pad")]
    fn remove_feeding_node_panics() {
        let mut g = GraphStore::new();
        let src = g.add_node(NodeKind::InputProxy);
        let dst = g.add_node(NodeKind::WriteSink);
        g.connect(src, dst, Pad::Input);
        g.remove_node(src);
    }

    #[test]
    #[should_panic(expected = "connected input pads")]
    fn remove_fed_node_panics() {
        let mut g = GraphStore::new();
        let src = g.add_node(NodeKind::InputProxy);
        let dst = g.add_node(NodeKind::WriteSink);
        g.connect(src, dst, Pad::Input);
        g.remove_node(dst);
    }

    #[test]
    fn parameter_updates() {
        let mut g = GraphStore::new();
        let t = g.add_node(NodeKind::Translate { dx: 0, dy: 0 });
        g.set_translate(t, 7, -3);
        assert_eq!(*g.kind(t), NodeKind::Translate { dx: 7, dy: -3 });
    }

    #[test]
    #[should_panic(expected = "set_translate on")]
    fn wrong_parameter_target_panics() {
        let mut g = GraphStore::new();
        let n = g.add_node(NodeKind::InputProxy);
        g.set_translate(n, 1, 1);
    }
}
