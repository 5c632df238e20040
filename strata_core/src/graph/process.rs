// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental evaluation of a sink's upstream chain.
//!
//! A [`Processor`] is the resumable work-unit handle of one preview
//! operation: it owns the list of not-yet-computed tiles of a target
//! rectangle, and [`step`](Processor::step) computes exactly one tile.
//! Suspension happens only between tiles — there is no mid-tile
//! preemption — and whoever drives the processor (an idle callback, a task
//! queue, or a plain loop) decides the pacing. Dropping the processor
//! cancels the remaining work.
//!
//! Evaluation is pull-based: a request for a tile rectangle flows from the
//! sink up through translate/crop/blend/operation nodes to the buffer
//! sources, each node transforming the requested region or the produced
//! pixels. Requests outside a source's extent produce transparent black.

use crate::blend;
use crate::geom::PixelRect;
use crate::ops::PixelOp;
use crate::surface::{PixelFormat, PixelSurface};

use super::node::{NodeId, NodeKind, Pad, SourceBinding};
use super::store::GraphStore;

/// Edge length of one unit of incremental work, in pixels.
pub const TILE_SIZE: i32 = 64;

/// Execution-time bindings for the symbolic parts of a graph.
#[derive(Debug)]
pub struct EvalContext<'a> {
    /// The surface a [`SourceBinding::Backup`] source reads.
    pub backup: &'a PixelSurface,
    /// The body of the [`NodeKind::Operation`] node, if one is wired.
    pub operation: Option<&'a dyn PixelOp>,
    /// The surface the sink writes into (the shadow buffer).
    pub target: &'a mut PixelSurface,
}

/// The resumable work unit of one incremental application.
#[derive(Debug)]
pub struct Processor {
    region: PixelRect,
    // Remaining tiles, last-first so `pop` yields row-major order.
    tiles: Vec<PixelRect>,
}

impl Processor {
    /// Creates a processor covering `region`.
    ///
    /// # Panics
    ///
    /// Panics if `region` is empty.
    #[must_use]
    pub fn new(region: PixelRect) -> Self {
        assert!(!region.is_empty(), "processor region must be non-empty");
        let mut tiles = Vec::new();
        let mut ty = region.y;
        while ty < region.bottom() {
            let th = TILE_SIZE.min(region.bottom() - ty);
            let mut tx = region.x;
            while tx < region.right() {
                let tw = TILE_SIZE.min(region.right() - tx);
                tiles.push(PixelRect::new(tx, ty, tw, th));
                tx += tw;
            }
            ty += th;
        }
        tiles.reverse();
        Self { region, tiles }
    }

    /// Returns the full target rectangle.
    #[must_use]
    pub fn region(&self) -> PixelRect {
        self.region
    }

    /// Returns the number of tiles still to compute.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.tiles.len()
    }

    /// Returns whether any work remains.
    #[must_use]
    pub fn has_work(&self) -> bool {
        !self.tiles.is_empty()
    }

    /// Computes the next tile through `sink`'s upstream chain, writing it
    /// into the context's target.
    ///
    /// Returns the finished tile rectangle, or `None` when no work
    /// remains.
    pub fn step(
        &mut self,
        graph: &GraphStore,
        sink: NodeId,
        ctx: &mut EvalContext<'_>,
    ) -> Option<PixelRect> {
        let tile = self.tiles.pop()?;
        let out = produce(
            graph,
            sink,
            tile,
            ctx.target.format(),
            ctx.backup,
            ctx.operation,
        );
        ctx.target.copy_rect(&out, out.rect(), tile.x, tile.y);
        Some(tile)
    }
}

/// Pull-evaluates `id` for `rect`, returning a `rect`-sized tile with a
/// local origin.
fn produce(
    graph: &GraphStore,
    id: NodeId,
    rect: PixelRect,
    format: PixelFormat,
    backup: &PixelSurface,
    operation: Option<&dyn PixelOp>,
) -> PixelSurface {
    let upstream = |pad: Pad, request: PixelRect| {
        graph
            .source_of(id, pad)
            .map(|src| produce(graph, src, request, format, backup, operation))
    };

    match *graph.kind(id) {
        NodeKind::WriteSink | NodeKind::OutputProxy => {
            upstream(Pad::Input, rect).unwrap_or_else(|| transparent(rect, format))
        }
        // Proxies and drawable-bound sources are wiring-only; executing
        // them standalone yields no pixels.
        NodeKind::InputProxy | NodeKind::BufferSource(SourceBinding::Drawable(_)) => {
            transparent(rect, format)
        }
        NodeKind::BufferSource(SourceBinding::Backup) => {
            let mut out = transparent(rect, format);
            out.copy_rect(backup, rect, 0, 0);
            out
        }
        NodeKind::Translate { dx, dy } => upstream(Pad::Input, rect.translated(-dx, -dy))
            .unwrap_or_else(|| transparent(rect, format)),
        NodeKind::Crop { rect: keep } => {
            let mut out = transparent(rect, format);
            if let Some(visible) = rect.intersect(keep) {
                if let Some(inner) = upstream(Pad::Input, visible) {
                    out.copy_rect(
                        &inner,
                        inner.rect(),
                        visible.x - rect.x,
                        visible.y - rect.y,
                    );
                }
            }
            out
        }
        NodeKind::Blend { mode, opacity } => {
            let mut base =
                upstream(Pad::Input, rect).unwrap_or_else(|| transparent(rect, format));
            if let Some(over) = upstream(Pad::Aux, rect) {
                blend::composite(&mut base, &over, mode, opacity);
            }
            base
        }
        NodeKind::Operation => {
            let src = upstream(Pad::Input, rect);
            let mut out = transparent(rect, format);
            match operation {
                Some(op) => op.apply(rect, src.as_ref(), &mut out),
                // No body bound: act as a passthrough.
                None => {
                    if let Some(src) = src {
                        out.copy_rect(&src, src.rect(), 0, 0);
                    }
                }
            }
            out
        }
    }
}

fn transparent(rect: PixelRect, format: PixelFormat) -> PixelSurface {
    PixelSurface::new(rect.width, rect.height, format)
}
