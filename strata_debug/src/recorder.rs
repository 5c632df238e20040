// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording sinks for change notifications and undo steps.

use std::cell::RefCell;
use std::rc::Rc;

use strata_core::drawable::DrawableId;
use strata_core::events::ChangeSink;
use strata_core::geom::PixelRect;
use strata_core::surface::PixelSurface;
use strata_core::undo::UndoSink;

/// One recorded change notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedChange {
    /// A pixel-region update.
    Update {
        /// The notifying drawable.
        drawable: DrawableId,
        /// The changed rectangle.
        rect: PixelRect,
    },
    /// An alpha-presence change.
    AlphaChanged {
        /// The notifying drawable.
        drawable: DrawableId,
    },
    /// A preview invalidation.
    PreviewInvalidated {
        /// The notifying drawable.
        drawable: DrawableId,
    },
    /// A structural change of the composition.
    StructureChanged,
    /// A completed incremental application.
    Flush {
        /// The notifying drawable.
        drawable: DrawableId,
    },
}

/// A [`ChangeSink`] recording every event.
///
/// The recorder is a cloneable handle over shared storage: register one
/// clone with the composition and keep another to inspect what arrived.
#[derive(Clone, Debug, Default)]
pub struct ChangeRecorder {
    events: Rc<RefCell<Vec<RecordedChange>>>,
}

impl ChangeRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded events, in arrival order.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedChange> {
        self.events.borrow().clone()
    }

    /// Removes and returns all recorded events.
    #[must_use]
    pub fn take(&self) -> Vec<RecordedChange> {
        std::mem::take(&mut self.events.borrow_mut())
    }

    /// Returns the update rectangles recorded for `drawable`.
    #[must_use]
    pub fn updates_for(&self, drawable: DrawableId) -> Vec<PixelRect> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                RecordedChange::Update {
                    drawable: d,
                    rect,
                } if *d == drawable => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// Returns how many flush events `drawable` emitted.
    #[must_use]
    pub fn flush_count(&self, drawable: DrawableId) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| matches!(event, RecordedChange::Flush { drawable: d } if *d == drawable))
            .count()
    }
}

impl ChangeSink for ChangeRecorder {
    fn on_update(&mut self, drawable: DrawableId, rect: PixelRect) {
        self.events
            .borrow_mut()
            .push(RecordedChange::Update { drawable, rect });
    }

    fn on_alpha_changed(&mut self, drawable: DrawableId) {
        self.events
            .borrow_mut()
            .push(RecordedChange::AlphaChanged { drawable });
    }

    fn on_preview_invalidated(&mut self, drawable: DrawableId) {
        self.events
            .borrow_mut()
            .push(RecordedChange::PreviewInvalidated { drawable });
    }

    fn on_structure_changed(&mut self) {
        self.events
            .borrow_mut()
            .push(RecordedChange::StructureChanged);
    }

    fn on_flush(&mut self, drawable: DrawableId) {
        self.events
            .borrow_mut()
            .push(RecordedChange::Flush { drawable });
    }
}

/// One recorded undo step.
#[derive(Clone, Debug)]
pub enum RecordedUndo {
    /// A region snapshot push.
    Region {
        /// The undo label.
        label: String,
        /// The drawable the step belongs to.
        drawable: DrawableId,
        /// The pre-change pixels.
        snapshot: PixelSurface,
        /// Placement of the snapshot within the drawable.
        rect: PixelRect,
    },
    /// A wholesale buffer replacement push.
    BufferSwap {
        /// The undo label.
        label: String,
        /// The drawable the step belongs to.
        drawable: DrawableId,
        /// The replaced buffer.
        old_buffer: PixelSurface,
        /// The replaced buffer's offset.
        old_offset: (i32, i32),
    },
}

/// An [`UndoSink`] recording every step.
#[derive(Clone, Debug, Default)]
pub struct RecordingUndo {
    steps: Rc<RefCell<Vec<RecordedUndo>>>,
}

impl RecordingUndo {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of recorded steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.borrow().len()
    }

    /// Returns whether no steps were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.borrow().is_empty()
    }

    /// Removes and returns all recorded steps.
    #[must_use]
    pub fn take(&self) -> Vec<RecordedUndo> {
        std::mem::take(&mut self.steps.borrow_mut())
    }
}

impl UndoSink for RecordingUndo {
    fn push_region(
        &mut self,
        label: &str,
        drawable: DrawableId,
        snapshot: PixelSurface,
        x: i32,
        y: i32,
    ) {
        let rect = snapshot.rect().translated(x, y);
        self.steps.borrow_mut().push(RecordedUndo::Region {
            label: label.to_owned(),
            drawable,
            snapshot,
            rect,
        });
    }

    fn push_buffer_swap(
        &mut self,
        label: &str,
        drawable: DrawableId,
        old_buffer: PixelSurface,
        old_x: i32,
        old_y: i32,
    ) {
        self.steps.borrow_mut().push(RecordedUndo::BufferSwap {
            label: label.to_owned(),
            drawable,
            old_buffer,
            old_offset: (old_x, old_y),
        });
    }
}
