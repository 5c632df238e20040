// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pixel-operation contract.
//!
//! An [`Applicator`](crate::applicator::Applicator) borrows a [`PixelOp`]
//! for the duration of one preview operation. The op's [`pads`](PixelOp::pads)
//! determine the evaluation-graph topology:
//!
//! - input and output — a *filter*: wired between the backup source and the
//!   sink, transforming the original pixels.
//! - output only — a *generator*: its output is blended over the original
//!   pixels.
//! - neither — degenerate; the graph falls back to a passthrough.

use crate::color::Color;
use crate::geom::PixelRect;
use crate::surface::{self, PixelSurface};

/// The connection points an operation exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpPads {
    /// The op consumes upstream pixels.
    pub input: bool,
    /// The op produces pixels.
    pub output: bool,
}

impl OpPads {
    /// A filter-style op (input and output).
    pub const FILTER: Self = Self {
        input: true,
        output: true,
    };
    /// A generator-style op (output only).
    pub const GENERATOR: Self = Self {
        input: false,
        output: true,
    };
}

/// A pixel transform applied through an applicator's evaluation graph.
///
/// `region` is the requested rectangle in the target drawable's coordinate
/// space; `dst` is a scratch surface of the region's size with a local
/// origin. Filters receive the upstream pixels as `src`; generators receive
/// `None` and synthesize output from `region` alone.
pub trait PixelOp {
    /// A short human-readable name, used for diagnostics.
    fn name(&self) -> &str;

    /// Which connection points this op exposes.
    fn pads(&self) -> OpPads;

    /// Computes the op's output for `region` into `dst`.
    fn apply(&self, region: PixelRect, src: Option<&PixelSurface>, dst: &mut PixelSurface);
}

impl std::fmt::Debug for dyn PixelOp + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PixelOp({})", self.name())
    }
}

/// Inverts every color channel, leaving alpha untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct Invert;

impl PixelOp for Invert {
    fn name(&self) -> &str {
        "invert"
    }

    fn pads(&self) -> OpPads {
        OpPads::FILTER
    }

    fn apply(&self, _region: PixelRect, src: Option<&PixelSurface>, dst: &mut PixelSurface) {
        let Some(src) = src else { return };
        dst.copy_rect(src, src.rect(), 0, 0);

        let format = dst.format();
        let channels = format.layout.channels();
        let depth_bytes = format.depth.bytes();
        let alpha_channel = format.has_alpha().then_some(channels - 1);

        for y in 0..dst.height() {
            for x in 0..dst.width() {
                let px = dst.pixel_mut(x, y);
                for c in 0..channels {
                    if Some(c) == alpha_channel {
                        continue;
                    }
                    // Byte-wise NOT inverts both 8- and 16-bit channels.
                    for b in &mut px[c * depth_bytes..(c + 1) * depth_bytes] {
                        *b = !*b;
                    }
                }
            }
        }
    }
}

/// Generates a two-color checkerboard aligned to the drawable's origin.
#[derive(Clone, Copy, Debug)]
pub struct Checkerboard {
    /// Square edge length in pixels.
    pub size: i32,
    /// Color of squares whose index sum is even.
    pub even: Color,
    /// Color of squares whose index sum is odd.
    pub odd: Color,
}

impl PixelOp for Checkerboard {
    fn name(&self) -> &str {
        "checkerboard"
    }

    fn pads(&self) -> OpPads {
        OpPads::GENERATOR
    }

    fn apply(&self, region: PixelRect, _src: Option<&PixelSurface>, dst: &mut PixelSurface) {
        let format = dst.format();
        let (even, bpp) = surface::color_bytes(format, self.even);
        let (odd, _) = surface::color_bytes(format, self.odd);
        let size = self.size.max(1);

        for y in 0..dst.height() {
            for x in 0..dst.width() {
                let cx = (region.x + x).div_euclid(size);
                let cy = (region.y + y).div_euclid(size);
                let px = if (cx + cy) % 2 == 0 { &even } else { &odd };
                dst.pixel_mut(x, y).copy_from_slice(&px[..bpp]);
            }
        }
    }
}
