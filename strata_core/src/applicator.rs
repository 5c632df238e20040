// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental preview application.
//!
//! An [`Applicator`] binds one drawable to one borrowed pixel operation
//! and drives the operation over the selection-bounded region in
//! time-sliced increments:
//!
//! 1. [`apply`](Applicator::apply) snapshots the affected region into a
//!    [`RegionBackup`], builds (once) the evaluation graph matching the
//!    operation's pads, and creates the resumable processor.
//! 2. [`step`](Applicator::step) computes one tile into the drawable's
//!    shadow buffer and composites it back onto the live surface,
//!    confined to the selection mask. Whatever scheduler the environment
//!    provides calls it repeatedly until it reports no more work.
//! 3. [`commit`](Applicator::commit) drains the remaining work
//!    synchronously and turns the backup into exactly one undo step;
//!    [`clear`](Applicator::clear) and [`abort`](Applicator::abort)
//!    restore the backup instead.
//!
//! Every entry point tolerates the drawable being detached mid-operation:
//! the call becomes a no-op that releases outstanding work. Removing a
//! layer during a live preview is an expected race, not an error.

use tracing::warn;

use crate::backup::RegionBackup;
use crate::blend::BlendMode;
use crate::drawable::{Composition, DrawableId};
use crate::geom::PixelRect;
use crate::graph::{EvalContext, GraphStore, NodeId, NodeKind, Pad, Processor, SourceBinding};
use crate::ops::{OpPads, PixelOp};
use crate::surface::PixelValue;

/// The applicator's evaluation graph: source → translate → … → sink.
///
/// Built once per applicator; later applications only update the translate
/// offset and rebind nothing (buffer bindings are symbolic).
#[derive(Debug)]
struct ApplyGraph {
    store: GraphStore,
    translate: NodeId,
    output: NodeId,
}

impl ApplyGraph {
    fn build(pads: OpPads) -> Self {
        let mut store = GraphStore::new();
        let input = store.add_node(NodeKind::BufferSource(SourceBinding::Backup));
        let translate = store.add_node(NodeKind::Translate { dx: 0, dy: 0 });
        let operation = store.add_node(NodeKind::Operation);
        let output = store.add_node(NodeKind::WriteSink);

        store.connect(input, translate, Pad::Input);
        if pads.input && pads.output {
            // A filter: wire it between source and sink.
            store.connect(translate, operation, Pad::Input);
            store.connect(operation, output, Pad::Input);
        } else if pads.output {
            // A generator: blend its result over the original pixels.
            let over = store.add_node(NodeKind::Blend {
                mode: BlendMode::Normal,
                opacity: 1.0,
            });
            store.connect(translate, over, Pad::Input);
            store.connect(operation, over, Pad::Aux);
            store.connect(over, output, Pad::Input);
        } else {
            // Neither pad: a passthrough pipeline.
            store.connect(translate, output, Pad::Input);
        }

        Self {
            store,
            translate,
            output,
        }
    }
}

/// Applies one pixel operation to one drawable as a live, incremental,
/// committable preview.
///
/// The operation is borrowed for the applicator's lifetime; the applicator
/// owns the backup, the evaluation graph, and the in-flight work unit. On
/// drop, an uncommitted backup is simply discarded; the drawable's shadow
/// buffer stays allocated until [`Composition::free_shadow`] releases it.
#[derive(Debug)]
pub struct Applicator<'op> {
    drawable: DrawableId,
    label: String,
    op: &'op dyn PixelOp,
    backup: Option<RegionBackup>,
    graph: Option<ApplyGraph>,
    processor: Option<Processor>,
}

impl<'op> Applicator<'op> {
    /// Creates an applicator for `drawable` with a human-readable undo
    /// label.
    ///
    /// # Panics
    ///
    /// Panics if the drawable is not attached.
    #[must_use]
    pub fn new(
        comp: &Composition,
        drawable: DrawableId,
        label: &str,
        op: &'op dyn PixelOp,
    ) -> Self {
        assert!(
            comp.is_attached(drawable),
            "stale DrawableId: {drawable:?}"
        );
        Self {
            drawable,
            label: label.to_owned(),
            op,
            backup: None,
            graph: None,
            processor: None,
        }
    }

    /// Returns the target drawable.
    #[must_use]
    pub fn drawable(&self) -> DrawableId {
        self.drawable
    }

    /// Returns the undo label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns whether incremental work is outstanding.
    #[must_use]
    pub fn is_applying(&self) -> bool {
        self.processor.is_some()
    }

    /// Begins (or restarts) applying the operation.
    ///
    /// Outstanding incremental work from a previous application is
    /// cancelled first — already-written shadow pixels are left alone and
    /// simply recomputed. The effective region is the intersection of the
    /// selection mask with the drawable's extent; `_region_hint` is the
    /// caller's viewport hint and only ever advisory. An empty effective
    /// region, or a detached drawable, makes the call a no-op.
    pub fn apply(&mut self, comp: &mut Composition, _region_hint: PixelRect) {
        self.stop_work();

        if !comp.is_attached(self.drawable) {
            return;
        }
        let Some(region) = comp.mask_bounds(self.drawable) else {
            return;
        };

        self.backup = Some(RegionBackup::refresh(
            self.backup.take(),
            comp.buffer(self.drawable),
            region,
        ));
        // The sink writes into the shadow buffer; make sure it exists.
        let _ = comp.shadow_mut(self.drawable);

        let pads = self.op.pads();
        let graph = self.graph.get_or_insert_with(|| ApplyGraph::build(pads));
        graph.store.set_translate(graph.translate, region.x, region.y);

        self.processor = Some(Processor::new(region));
    }

    /// Advances the work unit by one tile.
    ///
    /// Returns whether more work remains. The finished tile is composited
    /// from the shadow buffer onto the live surface (confined to the
    /// selection mask) and announced via an update notification; when the
    /// last tile completes, the work unit is released and a flush
    /// notification is emitted.
    ///
    /// Safe to call after the drawable has been detached: the work unit is
    /// released and the call reports no more work.
    pub fn step(&mut self, comp: &mut Composition) -> bool {
        if !comp.is_attached(self.drawable) {
            self.processor = None;
            return false;
        }
        if self.processor.is_none() {
            return false;
        }
        let Some(graph) = self.graph.as_ref() else {
            self.processor = None;
            return false;
        };
        let Some(backup) = self.backup.as_ref() else {
            self.processor = None;
            return false;
        };
        let Some(processor) = self.processor.as_mut() else {
            return false;
        };

        let tile = {
            let target = comp.shadow_mut(self.drawable);
            let mut ctx = EvalContext {
                backup: backup.surface(),
                operation: Some(self.op),
                target,
            };
            processor.step(&graph.store, graph.output, &mut ctx)
        };

        match tile {
            Some(rect) => {
                let more = processor.has_work();
                comp.write_preview_tile(self.drawable, rect, backup);
                if !more {
                    self.processor = None;
                    comp.emit_flush(self.drawable);
                }
                more
            }
            None => {
                self.processor = None;
                comp.emit_flush(self.drawable);
                false
            }
        }
    }

    /// Finishes the operation: drains any remaining work synchronously,
    /// then records the backed-up pre-operation pixels as one undo step
    /// and releases the backup.
    ///
    /// On a detached drawable nothing is pushed; the backup is discarded
    /// with the applicator.
    pub fn commit(&mut self, comp: &mut Composition) {
        if self.processor.is_some() {
            while self.step(comp) {}
        }

        if !comp.is_attached(self.drawable) {
            return;
        }

        if let Some(backup) = self.backup.take() {
            let rect = backup.rect();
            let (snapshot, _, _) = backup.into_parts();
            comp.push_undo(self.drawable, &self.label, Some(snapshot), rect);
        }
    }

    /// Discards the operation: cancels outstanding work and copies the
    /// backup back into the live surface.
    ///
    /// If the drawable's pixel format changed since the backup was
    /// captured, restoration is refused (the live data is left untouched)
    /// and a warning is logged; the backup is released either way. Calling
    /// `clear` with no backup present is a safe no-op.
    pub fn clear(&mut self, comp: &mut Composition) {
        self.stop_work();

        if !comp.is_attached(self.drawable) {
            return;
        }

        if let Some(backup) = self.backup.take() {
            if backup.surface().format() != comp.format(self.drawable) {
                warn!(
                    drawable = ?self.drawable,
                    "pixel format changed, unable to restore original pixels"
                );
            } else {
                comp.restore_backup(self.drawable, &backup);
            }
        }
    }

    /// Cancels the operation, restoring the original pixels only when the
    /// drawable is still attached.
    pub fn abort(&mut self, comp: &mut Composition) {
        self.stop_work();

        if !comp.is_attached(self.drawable) {
            return;
        }

        self.clear(comp);
    }

    /// Probes the pixel at drawable-local `(x, y)`, honoring the live
    /// preview: inside the backed-up region the *pre-operation* pixels are
    /// returned (the live surface already shows the preview), elsewhere
    /// the committed surface. Returns `None` outside the drawable's
    /// extent or after detachment.
    #[must_use]
    pub fn pixel_at(&self, comp: &Composition, x: i32, y: i32) -> Option<PixelValue> {
        if !comp.is_attached(self.drawable) {
            return None;
        }
        let (width, height) = comp.size(self.drawable);
        if x < 0 || x >= width || y < 0 || y >= height {
            return None;
        }
        if let Some(backup) = &self.backup {
            let rect = backup.rect();
            if rect.contains(x, y) {
                return Some(backup.surface().pixel_value(x - rect.x, y - rect.y));
            }
        }
        comp.pixel_at(self.drawable, x, y)
    }

    /// Withdraws from incremental scheduling, releasing the work unit.
    fn stop_work(&mut self) {
        self.processor = None;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::color::Color;
    use crate::events::ChangeSink;
    use crate::mask::{MaskShape, SelectionMask};
    use crate::ops::{Checkerboard, Invert};
    use crate::surface::{PixelFormat, PixelSurface};
    use crate::undo::UndoSink;

    #[derive(Clone, Default)]
    struct RecordingUndo {
        regions: Rc<RefCell<Vec<(String, PixelRect, PixelSurface)>>>,
    }

    impl UndoSink for RecordingUndo {
        fn push_region(
            &mut self,
            label: &str,
            _drawable: DrawableId,
            snapshot: PixelSurface,
            x: i32,
            y: i32,
        ) {
            let rect = snapshot.rect().translated(x, y);
            self.regions
                .borrow_mut()
                .push((label.to_owned(), rect, snapshot));
        }

        fn push_buffer_swap(
            &mut self,
            _label: &str,
            _drawable: DrawableId,
            _old_buffer: PixelSurface,
            _old_x: i32,
            _old_y: i32,
        ) {
        }
    }

    #[derive(Clone, Default)]
    struct FlushCounter(Rc<RefCell<usize>>);

    impl ChangeSink for FlushCounter {
        fn on_flush(&mut self, _drawable: DrawableId) {
            *self.0.borrow_mut() += 1;
        }
    }

    fn gradient_fill(comp: &mut Composition, id: DrawableId) {
        let (width, height) = comp.size(id);
        let mut surface = comp.buffer(id).clone();
        for y in 0..height {
            for x in 0..width {
                let px = surface.pixel_mut(x, y);
                px.copy_from_slice(&[(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]);
            }
        }
        comp.set_buffer(id, false, "", surface, 0, 0);
    }

    fn setup(width: i32, height: i32) -> (Composition, DrawableId, RecordingUndo) {
        let undo = RecordingUndo::default();
        let mut comp = Composition::with_undo(Box::new(undo.clone()));
        let id = comp.create_drawable(width, height, PixelFormat::RGBA8, 0, 0);
        gradient_fill(&mut comp, id);
        (comp, id, undo)
    }

    fn inverted(px: &[u8]) -> [u8; 4] {
        [!px[0], !px[1], !px[2], px[3]]
    }

    #[test]
    fn full_invert_scenario() {
        let (mut comp, id, undo) = setup(100, 100);
        let original = comp.buffer(id).clone();

        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(100, 100));
        assert!(applicator.is_applying());

        // The backup holds all 10,000 original pixels.
        let probe = applicator.pixel_at(&comp, 42, 17).unwrap();
        assert_eq!(probe.bytes(), original.pixel(42, 17));

        let mut increments = 0;
        while applicator.step(&mut comp) {
            increments += 1;
        }
        // 100x100 at 64px tiles: four tiles, last step returns false.
        assert_eq!(increments, 3);
        assert!(!applicator.is_applying());

        for &(x, y) in &[(0, 0), (63, 63), (64, 64), (99, 99), (50, 80)] {
            assert_eq!(
                comp.buffer(id).pixel(x, y),
                inverted(original.pixel(x, y)),
                "pixel ({x}, {y})"
            );
        }

        applicator.commit(&mut comp);
        let regions = undo.regions.borrow();
        assert_eq!(regions.len(), 1);
        let (label, rect, snapshot) = &regions[0];
        assert_eq!(label, "Invert");
        assert_eq!(*rect, PixelRect::from_size(100, 100));
        assert_eq!(snapshot.samples(), original.samples());
    }

    #[test]
    fn clear_before_any_increment_restores_exactly() {
        let (mut comp, id, _) = setup(64, 64);
        let original = comp.buffer(id).clone();

        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(64, 64));
        applicator.clear(&mut comp);

        assert_eq!(comp.buffer(id).samples(), original.samples());
        assert!(!applicator.is_applying());
    }

    #[test]
    fn clear_after_partial_work_restores_exactly() {
        let (mut comp, id, _) = setup(100, 100);
        let original = comp.buffer(id).clone();

        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(100, 100));
        assert!(applicator.step(&mut comp));
        assert!(applicator.step(&mut comp));
        // Two tiles already landed on the live surface.
        assert_ne!(comp.buffer(id).samples(), original.samples());

        applicator.clear(&mut comp);
        assert_eq!(comp.buffer(id).samples(), original.samples());
    }

    #[test]
    fn double_clear_is_a_safe_noop() {
        let (mut comp, id, _) = setup(32, 32);
        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(32, 32));
        applicator.clear(&mut comp);

        let after_first = comp.buffer(id).clone();
        applicator.clear(&mut comp);
        assert_eq!(comp.buffer(id).samples(), after_first.samples());
    }

    #[test]
    fn commit_drains_remaining_work() {
        let (mut comp, id, undo) = setup(100, 100);
        let original = comp.buffer(id).clone();

        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(100, 100));
        applicator.commit(&mut comp);

        assert!(!applicator.is_applying());
        assert_eq!(comp.buffer(id).pixel(99, 99), inverted(original.pixel(99, 99)));
        assert_eq!(undo.regions.borrow().len(), 1);
    }

    #[test]
    fn reapply_while_applying_restarts_cleanly() {
        let (mut comp, id, undo) = setup(100, 100);
        let original = comp.buffer(id).clone();

        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(100, 100));
        assert!(applicator.step(&mut comp));

        // Restart mid-flight: the prior work unit is cancelled and a fresh
        // one covers the recomputed region.
        applicator.apply(&mut comp, PixelRect::from_size(100, 100));
        assert!(applicator.is_applying());

        let mut increments = 0;
        while applicator.step(&mut comp) {
            increments += 1;
        }
        assert_eq!(increments, 3);

        applicator.commit(&mut comp);

        // Inverted exactly once everywhere — a stale tile from the first
        // run would show up double-inverted.
        for &(x, y) in &[(0, 0), (10, 10), (70, 70), (99, 0)] {
            assert_eq!(comp.buffer(id).pixel(x, y), inverted(original.pixel(x, y)));
        }
        let regions = undo.regions.borrow();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].2.samples(), original.samples());
    }

    #[test]
    fn circular_selection_confines_the_effect() {
        let (mut comp, id, undo) = setup(100, 100);
        let original = comp.buffer(id).clone();
        comp.set_selection(SelectionMask::Shape(MaskShape::Ellipse(
            kurbo::Ellipse::new((50.0, 50.0), (25.0, 25.0), 0.0),
        )));

        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(100, 100));
        while applicator.step(&mut comp) {}
        applicator.commit(&mut comp);

        // Inside the circle: inverted. Outside (even inside the bounding
        // rectangle): original.
        assert_eq!(comp.buffer(id).pixel(50, 50), inverted(original.pixel(50, 50)));
        assert_eq!(comp.buffer(id).pixel(50, 30), inverted(original.pixel(50, 30)));
        assert_eq!(comp.buffer(id).pixel(27, 27), original.pixel(27, 27));
        assert_eq!(comp.buffer(id).pixel(10, 10), original.pixel(10, 10));
        assert_eq!(comp.buffer(id).pixel(90, 90), original.pixel(90, 90));

        // The undo step covers the mask bounds, not the full drawable.
        let regions = undo.regions.borrow();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].1, PixelRect::new(25, 25, 50, 50));
    }

    #[test]
    fn empty_selection_makes_apply_a_noop() {
        let (mut comp, id, _) = setup(32, 32);
        comp.set_selection(SelectionMask::Shape(MaskShape::Rect(kurbo::Rect::new(
            500.0, 500.0, 600.0, 600.0,
        ))));

        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(32, 32));
        assert!(!applicator.is_applying());
        assert!(!applicator.step(&mut comp));
    }

    #[test]
    fn detach_mid_applying_makes_calls_noops() {
        let (mut comp, id, undo) = setup(100, 100);

        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(100, 100));
        assert!(applicator.step(&mut comp));

        comp.remove_drawable(id);

        assert!(!applicator.step(&mut comp));
        assert!(!applicator.is_applying());
        applicator.commit(&mut comp);
        applicator.clear(&mut comp);
        applicator.abort(&mut comp);
        assert!(undo.regions.borrow().is_empty());
        assert_eq!(applicator.pixel_at(&comp, 0, 0), None);
    }

    #[test]
    fn format_change_between_apply_and_clear_is_refused() {
        let (mut comp, id, _) = setup(32, 32);

        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(32, 32));
        while applicator.step(&mut comp) {}

        // Replace the buffer with a different format mid-operation.
        let mut gray = PixelSurface::new(32, 32, PixelFormat::GRAY8);
        gray.fill(Color::new(0.5, 0.5, 0.5, 1.0));
        comp.set_buffer(id, false, "", gray.clone(), 0, 0);

        applicator.clear(&mut comp);

        // Restoration was refused: the gray pixels are untouched.
        assert_eq!(comp.format(id), PixelFormat::GRAY8);
        assert_eq!(comp.buffer(id).samples(), gray.samples());
    }

    #[test]
    fn abort_restores_when_attached() {
        let (mut comp, id, _) = setup(64, 64);
        let original = comp.buffer(id).clone();

        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(64, 64));
        while applicator.step(&mut comp) {}
        applicator.abort(&mut comp);

        assert_eq!(comp.buffer(id).samples(), original.samples());
    }

    #[test]
    fn flush_fires_once_per_completed_application() {
        let (mut comp, id, _) = setup(100, 100);
        let counter = FlushCounter::default();
        let flushes = counter.0.clone();
        comp.add_observer(Box::new(counter));

        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(100, 100));
        while applicator.step(&mut comp) {}

        assert_eq!(*flushes.borrow(), 1);
    }

    #[test]
    fn generator_blends_over_original() {
        let (mut comp, id, _) = setup(8, 8);
        let original = comp.buffer(id).clone();

        let checker = Checkerboard {
            size: 1,
            even: Color::new(0.0, 0.0, 1.0, 1.0),
            odd: Color::TRANSPARENT,
        };
        let mut applicator = Applicator::new(&comp, id, "Checkerboard", &checker);
        applicator.apply(&mut comp, PixelRect::from_size(8, 8));
        applicator.commit(&mut comp);

        // Even squares: opaque blue. Odd squares: the original shows
        // through the transparent generator output.
        assert_eq!(comp.buffer(id).pixel(0, 0), &[0, 0, 255, 255]);
        assert_eq!(comp.buffer(id).pixel(1, 0), original.pixel(1, 0));
        assert_eq!(comp.buffer(id).pixel(2, 0), &[0, 0, 255, 255]);
    }

    #[test]
    fn preview_probe_sees_original_committed_probe_sees_preview() {
        let (mut comp, id, _) = setup(16, 16);
        let original = comp.buffer(id).clone();

        let mut applicator = Applicator::new(&comp, id, "Invert", &Invert);
        applicator.apply(&mut comp, PixelRect::from_size(16, 16));
        while applicator.step(&mut comp) {}

        // The live surface previews the inversion.
        let live = comp.pixel_at(id, 3, 3).unwrap();
        assert_eq!(live.bytes(), inverted(original.pixel(3, 3)));
        // The applicator's probe reads beneath the preview.
        let beneath = applicator.pixel_at(&comp, 3, 3).unwrap();
        assert_eq!(beneath.bytes(), original.pixel(3, 3));
        // Outside the extent: no value.
        assert_eq!(applicator.pixel_at(&comp, -1, 3), None);
        assert_eq!(applicator.pixel_at(&comp, 16, 3), None);
    }

    #[test]
    #[should_panic(expected = "stale DrawableId")]
    fn new_on_detached_drawable_panics() {
        let (mut comp, id, _) = setup(8, 8);
        comp.remove_drawable(id);
        let _ = Applicator::new(&comp, id, "Invert", &Invert);
    }
}
