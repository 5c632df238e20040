// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Buffer access, replacement, undo capture, and fills.

use tracing::warn;

use crate::color::Color;
use crate::geom::PixelRect;
use crate::surface::PixelSurface;

use super::id::DrawableId;
use super::store::Composition;

/// What to fill a drawable with: exactly one of a solid color or a tiled
/// pattern.
#[derive(Clone, Copy, Debug)]
pub enum FillContent<'a> {
    /// A solid color. Alpha is forced to fully opaque when the surface has
    /// no alpha channel.
    Color(Color),
    /// A pattern tiled from the drawable's origin.
    Pattern(&'a PixelSurface),
}

impl Composition {
    /// Returns the drawable's live pixel buffer.
    ///
    /// Pending writes are already visible — the surface is plain memory —
    /// so unlike a tiled/deferred buffer there is nothing to flush before
    /// handing it out.
    #[must_use]
    pub fn buffer(&self, id: DrawableId) -> &PixelSurface {
        &self.drawable(id).surface
    }

    /// Replaces the drawable's buffer wholesale.
    ///
    /// Optionally records an undo step carrying the *old* buffer and its
    /// offset. Emits update notifications bracketing both the old and the
    /// new extent when the geometry changes, and an alpha-changed
    /// notification when the alpha-channel presence changes. Graph buffer
    /// sources bind drawables symbolically, so existing wiring picks up
    /// the new buffer without being touched.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn set_buffer(
        &mut self,
        id: DrawableId,
        push_undo: bool,
        label: &str,
        buffer: PixelSurface,
        offset_x: i32,
        offset_y: i32,
    ) {
        let (old_local, old_offset, old_alpha) = {
            let d = self.drawable(id);
            (
                d.surface.rect(),
                (d.offset_x, d.offset_y),
                d.surface.format().has_alpha(),
            )
        };

        let geometry_changed = old_local != buffer.rect() || old_offset != (offset_x, offset_y);
        if geometry_changed {
            self.update(id, old_local);
        }

        if push_undo {
            let old_buffer = self.drawable(id).surface.clone();
            self.undo_push_buffer_swap(id, label, old_buffer, old_offset.0, old_offset.1);
        }

        {
            let d = self.drawable_mut(id);
            d.surface = buffer;
            d.offset_x = offset_x;
            d.offset_y = offset_y;
        }

        if old_alpha != self.has_alpha(id) {
            self.alpha_changed(id);
        }

        let new_local = self.local_rect(id);
        self.update(id, new_local);
    }

    /// Records one undoable region step.
    ///
    /// When `snapshot` is `None`, the pixels are captured by copying `rect`
    /// (clipped to the drawable's extent) out of the live surface; the
    /// captured snapshot never aliases the surface. An empty clipped
    /// region is a programming error on the caller's side: it is logged
    /// and no step is recorded.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn push_undo(
        &mut self,
        id: DrawableId,
        label: &str,
        snapshot: Option<PixelSurface>,
        rect: PixelRect,
    ) {
        let (snapshot, x, y) = match snapshot {
            Some(snapshot) => (snapshot, rect.x, rect.y),
            None => {
                let Some(clipped) = rect.intersect(self.local_rect(id)) else {
                    warn!(drawable = ?id, ?rect, "tried to push an empty undo region");
                    return;
                };
                (
                    self.drawable(id).surface.extract(clipped),
                    clipped.x,
                    clipped.y,
                )
            }
        };
        self.undo_push_region(id, label, snapshot, x, y);
    }

    /// Exchanges the pixels under `buffer` (placed at `(x, y)`) with the
    /// buffer's contents, emitting an update for the swapped rectangle.
    ///
    /// This is the primitive an undo stack uses to apply and revert region
    /// steps: applying a step swaps the recorded pixels in, reverting
    /// swaps them back out.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the formats differ.
    pub fn swap_pixels(&mut self, id: DrawableId, buffer: &mut PixelSurface, x: i32, y: i32) {
        let region = PixelRect::new(x, y, buffer.width(), buffer.height());
        {
            let d = self.drawable_mut(id);
            let tmp = buffer.clone();
            buffer.copy_rect(&d.surface, region, 0, 0);
            d.surface.copy_rect(&tmp, tmp.rect(), x, y);
        }
        self.update(id, region);
    }

    /// Fills the drawable and emits a full-extent update.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, or (for patterns) if the pattern's
    /// format differs from the surface's.
    pub fn fill(&mut self, id: DrawableId, content: FillContent<'_>) {
        {
            let d = self.drawable_mut(id);
            match content {
                FillContent::Color(color) => {
                    let color = if d.surface.format().has_alpha() {
                        color
                    } else {
                        color.opaque()
                    };
                    d.surface.fill(color);
                }
                FillContent::Pattern(pattern) => d.surface.fill_pattern(pattern),
            }
        }
        let full = self.local_rect(id);
        self.update(id, full);
    }
}
