// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pre-operation snapshot of an applicator's target region.
//!
//! A [`RegionBackup`] exists in exactly two states from its owner's point of
//! view: absent (no operation in flight, or already finalized) or fully
//! populated for a bounded rectangle. There is no partially captured state.
//!
//! [`RegionBackup::refresh`] implements the reuse rules: a backup over the
//! identical extent is kept as-is (its snapshot still holds the
//! pre-operation pixels even though the live surface now shows a preview);
//! a moved extent of the same size reuses the allocation but re-captures;
//! a resized extent reallocates.

use crate::geom::PixelRect;
use crate::surface::PixelSurface;

/// A snapshot of a rectangular region, remembering where it was taken.
#[derive(Clone, Debug)]
pub struct RegionBackup {
    surface: PixelSurface,
    offset_x: i32,
    offset_y: i32,
}

impl RegionBackup {
    /// Captures `rect` of `source` into a fresh backup.
    ///
    /// # Panics
    ///
    /// Panics if `rect` is not fully inside `source`.
    #[must_use]
    pub fn capture(source: &PixelSurface, rect: PixelRect) -> Self {
        Self {
            surface: source.extract(rect),
            offset_x: rect.x,
            offset_y: rect.y,
        }
    }

    /// Brings a backup up to date for `rect`, reusing `current` when
    /// possible.
    ///
    /// - Same offset and size: `current` is returned untouched.
    /// - Same size, different offset: the allocation is reused and the new
    ///   extent is captured.
    /// - Different size (or no current backup): a fresh capture.
    #[must_use]
    pub fn refresh(current: Option<Self>, source: &PixelSurface, rect: PixelRect) -> Self {
        if let Some(backup) = current {
            if backup.rect() == rect {
                return backup;
            }
            if backup.surface.width() == rect.width && backup.surface.height() == rect.height {
                let mut surface = backup.surface;
                surface.copy_rect(source, rect, 0, 0);
                return Self {
                    surface,
                    offset_x: rect.x,
                    offset_y: rect.y,
                };
            }
        }
        Self::capture(source, rect)
    }

    /// Returns the backed-up region in the owner's coordinate space.
    #[must_use]
    pub fn rect(&self) -> PixelRect {
        self.surface.rect().translated(self.offset_x, self.offset_y)
    }

    /// Returns the snapshot surface (origin-based).
    #[must_use]
    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    /// Copies the snapshot back into `dst` at its recorded offset.
    pub fn restore_into(&self, dst: &mut PixelSurface) {
        dst.copy_rect(&self.surface, self.surface.rect(), self.offset_x, self.offset_y);
    }

    /// Consumes the backup, returning the snapshot and its offset.
    #[must_use]
    pub fn into_parts(self) -> (PixelSurface, i32, i32) {
        (self.surface, self.offset_x, self.offset_y)
    }
}
