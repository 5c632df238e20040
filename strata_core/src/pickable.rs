// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pixel-probe capability.
//!
//! [`Pickable`] is the contract color pickers and samplers consume: given
//! a coordinate, produce the pixel beneath it or report "no value" outside
//! the entity's extent. Two implementations exist:
//!
//! - [`Composition::pickable`] probes a drawable's committed surface.
//! - [`Applicator::pickable`](crate::Applicator::pickable_ref) probes
//!   *through* a live preview, returning the pre-operation pixels inside
//!   the previewed region.
//!
//! Samples are returned in the surface's native format; format conversion
//! is the caller's concern.

use crate::applicator::Applicator;
use crate::drawable::{Composition, DrawableId};
use crate::surface::{PixelFormat, PixelValue};

/// Produces the color beneath a coordinate.
pub trait Pickable {
    /// Returns the format probe results are delivered in.
    fn format(&self) -> PixelFormat;

    /// Returns the pixel at `(x, y)`, or `None` outside the extent.
    fn pixel_at(&self, x: i32, y: i32) -> Option<PixelValue>;
}

/// A [`Pickable`] over a drawable's committed surface.
#[derive(Clone, Copy, Debug)]
pub struct DrawablePickable<'a> {
    comp: &'a Composition,
    drawable: DrawableId,
}

impl Pickable for DrawablePickable<'_> {
    fn format(&self) -> PixelFormat {
        self.comp.format(self.drawable)
    }

    fn pixel_at(&self, x: i32, y: i32) -> Option<PixelValue> {
        self.comp.pixel_at(self.drawable, x, y)
    }
}

/// A [`Pickable`] over an applicator's target, honoring the live preview.
#[derive(Debug)]
pub struct PreviewPickable<'a, 'op> {
    comp: &'a Composition,
    applicator: &'a Applicator<'op>,
}

impl Pickable for PreviewPickable<'_, '_> {
    fn format(&self) -> PixelFormat {
        self.comp.format(self.applicator.drawable())
    }

    fn pixel_at(&self, x: i32, y: i32) -> Option<PixelValue> {
        self.applicator.pixel_at(self.comp, x, y)
    }
}

impl Composition {
    /// Returns a [`Pickable`] over the drawable's committed surface.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn pickable(&self, drawable: DrawableId) -> DrawablePickable<'_> {
        self.drawable(drawable); // validate
        DrawablePickable {
            comp: self,
            drawable,
        }
    }
}

impl<'op> Applicator<'op> {
    /// Returns a [`Pickable`] that reads beneath this applicator's live
    /// preview.
    #[must_use]
    pub fn pickable_ref<'a>(&'a self, comp: &'a Composition) -> PreviewPickable<'a, 'op> {
        PreviewPickable {
            comp,
            applicator: self,
        }
    }
}
