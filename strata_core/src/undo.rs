// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The undo contract.
//!
//! The core records undoable actions through a single sink; undo-stack
//! storage, grouping, and replay live outside this crate. A committed
//! preview pushes exactly one region step carrying the *pre-operation*
//! pixels; a wholesale buffer replacement pushes the old buffer.

use crate::drawable::DrawableId;
use crate::surface::PixelSurface;

/// Receives undoable steps from a composition.
pub trait UndoSink {
    /// Records a region of pre-change pixels at `(x, y)` of `drawable`.
    fn push_region(
        &mut self,
        label: &str,
        drawable: DrawableId,
        snapshot: PixelSurface,
        x: i32,
        y: i32,
    );

    /// Records a wholesale buffer replacement: the drawable's previous
    /// buffer and its previous offset.
    fn push_buffer_swap(
        &mut self,
        label: &str,
        drawable: DrawableId,
        old_buffer: PixelSurface,
        old_x: i32,
        old_y: i32,
    );
}

/// An [`UndoSink`] that discards all steps.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardUndo;

impl UndoSink for DiscardUndo {
    fn push_region(
        &mut self,
        _label: &str,
        _drawable: DrawableId,
        _snapshot: PixelSurface,
        _x: i32,
        _y: i32,
    ) {
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
