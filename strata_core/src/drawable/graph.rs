// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-drawable graph wiring: root topology, source graphs, and
//! floating-selection overlays.
//!
//! Both graphs are built lazily and then reconfigured in place. Topology
//! is an explicit enum per graph — transitions always tear every affected
//! edge down before reconnecting, so no reconfiguration can leave a pad
//! double-fed or a dangling half-wired state.

use crate::blend::BlendMode;
use crate::geom::PixelRect;
use crate::graph::{GraphStore, NodeId, NodeKind, Pad, SourceBinding};

use super::id::DrawableId;
use super::store::Composition;

/// The wiring variant of a drawable's root graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RootTopology {
    /// input proxy → mode blend → output proxy.
    Visible,
    /// input proxy → output proxy, bypassing the blend entirely.
    Hidden,
}

/// The wiring variant of a drawable's source graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceTopology {
    /// buffer source → output proxy.
    Direct,
    /// The overlay splice is active: crop/translate/blend nodes composite
    /// a floating selection over the buffer source.
    Overlay,
    /// The graph's buffer source is spliced into a host's source graph;
    /// the output proxy is left unfed until detach restores it.
    Lent,
}

/// A drawable's root graph: the proxies and the mode-blend node through
/// which the drawable contributes to its parent's compositing stack.
///
/// The mode node is created exactly once per drawable; visibility changes
/// only rewire edges.
#[derive(Debug)]
pub struct RootGraph {
    pub(crate) store: GraphStore,
    pub(crate) input: NodeId,
    pub(crate) output: NodeId,
    pub(crate) mode_node: NodeId,
    pub(crate) topology: RootTopology,
}

impl RootGraph {
    fn build(visible: bool, mode: BlendMode, opacity: f32) -> Self {
        let mut store = GraphStore::new();
        let input = store.add_node(NodeKind::InputProxy);
        let output = store.add_node(NodeKind::OutputProxy);
        let mode_node = store.add_node(NodeKind::Blend { mode, opacity });
        let mut graph = Self {
            store,
            input,
            output,
            mode_node,
            topology: RootTopology::Hidden,
        };
        graph.wire(if visible {
            RootTopology::Visible
        } else {
            RootTopology::Hidden
        });
        graph
    }

    fn wire(&mut self, topology: RootTopology) {
        // Full teardown before reconnect.
        self.store.disconnect(self.output, Pad::Input);
        self.store.disconnect(self.mode_node, Pad::Input);
        match topology {
            RootTopology::Visible => {
                self.store.connect(self.input, self.mode_node, Pad::Input);
                self.store.connect(self.mode_node, self.output, Pad::Input);
            }
            RootTopology::Hidden => {
                self.store.connect(self.input, self.output, Pad::Input);
            }
        }
        self.topology = topology;
    }

    pub(crate) fn set_mode_params(&mut self, mode: BlendMode, opacity: f32) {
        self.store.set_blend(self.mode_node, mode, opacity);
    }

    /// Returns the node store, for structural inspection.
    #[must_use]
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Returns the input proxy node.
    #[must_use]
    pub fn input(&self) -> NodeId {
        self.input
    }

    /// Returns the output proxy node.
    #[must_use]
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Returns the mode-blend node.
    #[must_use]
    pub fn mode_node(&self) -> NodeId {
        self.mode_node
    }

    /// Returns the active wiring variant.
    #[must_use]
    pub fn topology(&self) -> RootTopology {
        self.topology
    }
}

/// The nodes spliced into a host's source graph while a floating selection
/// is attached.
#[derive(Clone, Copy, Debug)]
pub struct OverlaySplice {
    pub(crate) fs_source: NodeId,
    pub(crate) crop: NodeId,
    pub(crate) offset: NodeId,
    pub(crate) mode_node: NodeId,
}

impl OverlaySplice {
    /// Returns the overlay's buffer-source node.
    #[must_use]
    pub fn fs_source(&self) -> NodeId {
        self.fs_source
    }

    /// Returns the crop node sized to the host's viewport.
    #[must_use]
    pub fn crop(&self) -> NodeId {
        self.crop
    }

    /// Returns the translate node positioning the overlay.
    #[must_use]
    pub fn offset(&self) -> NodeId {
        self.offset
    }

    /// Returns the blend node compositing the overlay over the host.
    #[must_use]
    pub fn mode_node(&self) -> NodeId {
        self.mode_node
    }
}

/// A drawable's source graph: the buffer source feeding the compositing
/// stack, optionally spliced with a floating-selection overlay.
#[derive(Debug)]
pub struct SourceGraph {
    pub(crate) store: GraphStore,
    pub(crate) buffer_source: NodeId,
    pub(crate) output: NodeId,
    pub(crate) splice: Option<OverlaySplice>,
    pub(crate) topology: SourceTopology,
}

impl SourceGraph {
    fn build(owner: DrawableId) -> Self {
        let mut store = GraphStore::new();
        let buffer_source = store.add_node(NodeKind::BufferSource(SourceBinding::Drawable(owner)));
        let output = store.add_node(NodeKind::OutputProxy);
        store.connect(buffer_source, output, Pad::Input);
        Self {
            store,
            buffer_source,
            output,
            splice: None,
            topology: SourceTopology::Direct,
        }
    }

    /// Returns the node store, for structural inspection.
    #[must_use]
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Returns the buffer-source node.
    #[must_use]
    pub fn buffer_source(&self) -> NodeId {
        self.buffer_source
    }

    /// Returns the output proxy node.
    #[must_use]
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Returns the active overlay splice, if any.
    #[must_use]
    pub fn splice(&self) -> Option<&OverlaySplice> {
        self.splice.as_ref()
    }

    /// Returns the active wiring variant.
    #[must_use]
    pub fn topology(&self) -> SourceTopology {
        self.topology
    }
}

impl Composition {
    /// Returns the drawable's root graph, building it on first access.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn root_node(&mut self, id: DrawableId) -> &RootGraph {
        let d = self.drawable_mut(id);
        let (visible, mode, opacity) = (d.visible, d.mode, d.opacity);
        d.root
            .get_or_insert_with(|| RootGraph::build(visible, mode, opacity))
    }

    /// Returns the drawable's root graph if it has been built.
    #[must_use]
    pub fn root_graph(&self, id: DrawableId) -> Option<&RootGraph> {
        self.drawable(id).root.as_ref()
    }

    /// Returns the drawable's source graph if it has been built.
    #[must_use]
    pub fn source_graph(&self, id: DrawableId) -> Option<&SourceGraph> {
        self.drawable(id).source.as_ref()
    }

    /// Sets the drawable's visibility, rewiring an already built root
    /// graph between its two variants. Nodes are never recreated.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_visible(&mut self, id: DrawableId, visible: bool) {
        {
            let d = self.drawable_mut(id);
            if d.visible == visible {
                return;
            }
            d.visible = visible;
            if let Some(root) = &mut d.root {
                root.wire(if visible {
                    RootTopology::Visible
                } else {
                    RootTopology::Hidden
                });
            }
        }
        // A floating selection's visibility feeds its host's overlay
        // parameters.
        if let Some(host) = self.fs_host_of(id) {
            self.sync_overlay_wiring(host);
        }
    }

    /// Returns the drawable's source graph, building it on first access
    /// and bringing overlay wiring up to date.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn source_node(&mut self, id: DrawableId) -> &SourceGraph {
        {
            let d = self.drawable_mut(id);
            if d.source.is_none() {
                d.source = Some(SourceGraph::build(id));
            }
        }
        self.sync_overlay_wiring(id);
        let Some(source) = self.drawable(id).source.as_ref() else {
            unreachable!("source graph was just built");
        };
        source
    }

    /// Attaches `fs` to `host` as its floating selection.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, `host == fs`, or `host` already
    /// has a floating selection.
    pub fn attach_floating_sel(&mut self, host: DrawableId, fs: DrawableId) {
        assert!(host != fs, "a drawable cannot float on itself");
        self.drawable(fs); // validate
        assert!(
            self.drawable(host).floating_sel.is_none(),
            "drawable already has a floating selection"
        );

        self.drawable_mut(host).floating_sel = Some(fs);
        self.sync_overlay_wiring(host);

        let full = self.local_rect(fs);
        self.update(fs, full);
        self.emit_structure_changed();
    }

    /// Detaches the floating selection from `host`, restoring both
    /// graphs' pre-attach wiring.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or no floating selection is
    /// attached.
    pub fn detach_floating_sel(&mut self, host: DrawableId) {
        let Some(fs) = self.drawable(host).floating_sel else {
            panic!("no floating selection attached to {host:?}");
        };

        self.unsplice_overlay(host);

        // A final update over the overlay's extent, still forwarded to the
        // host.
        if self.is_attached(fs) {
            let full = self.local_rect(fs);
            self.update(fs, full);
        }

        self.drawable_mut(host).floating_sel = None;
        self.emit_structure_changed();
    }

    /// Brings the host's source-graph wiring in line with its
    /// floating-selection attachment: splices the overlay in (or refreshes
    /// its crop/translate/blend parameters) when one is attached and
    /// alive, and unsplices otherwise.
    ///
    /// A no-op until the source graph has been built.
    pub(crate) fn sync_overlay_wiring(&mut self, host: DrawableId) {
        if self.drawable(host).source.is_none() {
            return;
        }
        let fs = self
            .drawable(host)
            .floating_sel
            .filter(|&fs| self.is_attached(fs));
        match fs {
            Some(fs) => self.splice_overlay(host, fs),
            None => self.unsplice_overlay(host),
        }
    }

    fn splice_overlay(&mut self, host: DrawableId, fs: DrawableId) {
        let host_extent = self.extent(host);
        let fs_extent = self.extent(fs);
        let (fs_mode, fs_opacity) = {
            let f = self.drawable(fs);
            (f.mode, f.opacity)
        };

        let first = match self.drawable(host).source.as_ref() {
            Some(source) => source.splice.is_none(),
            None => return,
        };

        if first {
            // Rip the overlay's source out of its native graph, if that
            // graph exists yet.
            if let Some(fs_graph) = self.drawable_mut(fs).source.as_mut() {
                fs_graph.store.disconnect(fs_graph.output, Pad::Input);
                fs_graph.topology = SourceTopology::Lent;
            }

            let d = self.drawable_mut(host);
            let Some(sg) = d.source.as_mut() else { return };
            sg.store.disconnect(sg.output, Pad::Input);

            let fs_source = sg
                .store
                .add_node(NodeKind::BufferSource(SourceBinding::Drawable(fs)));
            let crop = sg.store.add_node(NodeKind::Crop {
                rect: PixelRect::EMPTY,
            });
            let offset = sg.store.add_node(NodeKind::Translate { dx: 0, dy: 0 });
            let mode_node = sg.store.add_node(NodeKind::Blend {
                mode: fs_mode,
                opacity: fs_opacity,
            });

            sg.store.connect(fs_source, crop, Pad::Input);
            sg.store.connect(crop, offset, Pad::Input);
            sg.store.connect(sg.buffer_source, mode_node, Pad::Input);
            sg.store.connect(offset, mode_node, Pad::Aux);
            sg.store.connect(mode_node, sg.output, Pad::Input);

            sg.splice = Some(OverlaySplice {
                fs_source,
                crop,
                offset,
                mode_node,
            });
            sg.topology = SourceTopology::Overlay;
        }

        // Refresh parameters on every sync: the host's viewport in
        // overlay-local coordinates, the inverse placement, and the
        // overlay's blend settings.
        let d = self.drawable_mut(host);
        let Some(sg) = d.source.as_mut() else { return };
        let Some(splice) = sg.splice else {
            return;
        };
        sg.store.set_crop(
            splice.crop,
            PixelRect::new(
                host_extent.x - fs_extent.x,
                host_extent.y - fs_extent.y,
                host_extent.width,
                host_extent.height,
            ),
        );
        sg.store.set_translate(
            splice.offset,
            fs_extent.x - host_extent.x,
            fs_extent.y - host_extent.y,
        );
        sg.store.set_blend(splice.mode_node, fs_mode, fs_opacity);
    }

    fn unsplice_overlay(&mut self, host: DrawableId) {
        let fs = self.drawable(host).floating_sel;

        {
            let d = self.drawable_mut(host);
            let Some(sg) = d.source.as_mut() else { return };
            let Some(splice) = sg.splice.take() else {
                return;
            };

            // Reverse every edge the splice made, then drop its nodes.
            sg.store.disconnect(splice.crop, Pad::Input);
            sg.store.disconnect(splice.offset, Pad::Input);
            sg.store.disconnect(splice.mode_node, Pad::Input);
            sg.store.disconnect(splice.mode_node, Pad::Aux);
            sg.store.disconnect(sg.output, Pad::Input);
            sg.store.remove_node(splice.fs_source);
            sg.store.remove_node(splice.crop);
            sg.store.remove_node(splice.offset);
            sg.store.remove_node(splice.mode_node);

            // Restore the direct wiring.
            sg.store.connect(sg.buffer_source, sg.output, Pad::Input);
            sg.topology = SourceTopology::Direct;
        }

        // Plug the overlay's source back into its native graph.
        if let Some(fs) = fs {
            if self.is_attached(fs) {
                if let Some(fs_graph) = self.drawable_mut(fs).source.as_mut() {
                    if fs_graph.topology == SourceTopology::Lent {
                        fs_graph
                            .store
                            .connect(fs_graph.buffer_source, fs_graph.output, Pad::Input);
                        fs_graph.topology = SourceTopology::Direct;
                    }
                }
            }
        }
    }
}
