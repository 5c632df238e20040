// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositing primitives.
//!
//! This module holds the blend-mode parameter type used by graph nodes and
//! the two pixel-level composites the core needs: source-over blending (for
//! the generator topology and overlay wiring) and mask-confined replacement
//! (for writing finished preview tiles back into a live surface). The full
//! blend-formula library of an editor lives outside this crate; only the
//! modes the wiring itself parameterizes are implemented here.
//!
//! Arithmetic is done in normalized f32 with straight alpha, independent of
//! the surface bit depth.

use crate::geom::PixelRect;
use crate::mask::SelectionMask;
use crate::surface::{BitDepth, ChannelLayout, PixelSurface};

/// The blend mode of a mode-blend graph node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Plain source-over.
    Normal,
    /// Multiply, composited source-over.
    Multiply,
}

fn read_channel(px: &[u8], depth: BitDepth, i: usize) -> f32 {
    match depth {
        BitDepth::Eight => f32::from(px[i]) / 255.0,
        BitDepth::Sixteen => {
            let word: u16 = bytemuck::pod_read_unaligned(&px[i * 2..i * 2 + 2]);
            f32::from(word) / 65535.0
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "values are clamped to the channel range before conversion"
)]
fn write_channel(px: &mut [u8], depth: BitDepth, i: usize, v: f32) {
    let v = v.clamp(0.0, 1.0);
    match depth {
        BitDepth::Eight => px[i] = (v * 255.0 + 0.5) as u8,
        BitDepth::Sixteen => {
            let word = (v * 65535.0 + 0.5) as u16;
            px[i * 2..i * 2 + 2].copy_from_slice(&word.to_ne_bytes());
        }
    }
}

/// Reads the pixel at `(x, y)` as normalized straight-alpha RGBA.
///
/// Gray layouts replicate the gray channel; layouts without alpha read as
/// fully opaque.
#[must_use]
pub fn read_rgba(surface: &PixelSurface, x: i32, y: i32) -> [f32; 4] {
    let format = surface.format();
    let px = surface.pixel(x, y);
    let depth = format.depth;
    match format.layout {
        ChannelLayout::Gray => {
            let g = read_channel(px, depth, 0);
            [g, g, g, 1.0]
        }
        ChannelLayout::GrayAlpha => {
            let g = read_channel(px, depth, 0);
            [g, g, g, read_channel(px, depth, 1)]
        }
        ChannelLayout::Rgb => [
            read_channel(px, depth, 0),
            read_channel(px, depth, 1),
            read_channel(px, depth, 2),
            1.0,
        ],
        ChannelLayout::Rgba => [
            read_channel(px, depth, 0),
            read_channel(px, depth, 1),
            read_channel(px, depth, 2),
            read_channel(px, depth, 3),
        ],
    }
}

/// Writes normalized straight-alpha RGBA into the pixel at `(x, y)`.
///
/// Gray layouts store the Rec. 709 luma; layouts without alpha drop it.
pub fn write_rgba(surface: &mut PixelSurface, x: i32, y: i32, rgba: [f32; 4]) {
    let format = surface.format();
    let depth = format.depth;
    let luma = 0.2126 * rgba[0] + 0.7152 * rgba[1] + 0.0722 * rgba[2];
    let px = surface.pixel_mut(x, y);
    match format.layout {
        ChannelLayout::Gray => write_channel(px, depth, 0, luma),
        ChannelLayout::GrayAlpha => {
            write_channel(px, depth, 0, luma);
            write_channel(px, depth, 1, rgba[3]);
        }
        ChannelLayout::Rgb => {
            for (i, v) in rgba[..3].iter().enumerate() {
                write_channel(px, depth, i, *v);
            }
        }
        ChannelLayout::Rgba => {
            for (i, v) in rgba.iter().enumerate() {
                write_channel(px, depth, i, *v);
            }
        }
    }
}

/// Composites `over` onto `base` (source-over) with the given mode and
/// opacity.
///
/// # Panics
///
/// Panics if the surfaces differ in format or size.
pub fn composite(base: &mut PixelSurface, over: &PixelSurface, mode: BlendMode, opacity: f32) {
    assert!(
        base.format() == over.format() && base.rect() == over.rect(),
        "composite operands must match in format and size"
    );
    let opacity = opacity.clamp(0.0, 1.0);
    for y in 0..base.height() {
        for x in 0..base.width() {
            let dst = read_rgba(base, x, y);
            let src = read_rgba(over, x, y);

            let color = match mode {
                BlendMode::Normal => [src[0], src[1], src[2]],
                BlendMode::Multiply => [src[0] * dst[0], src[1] * dst[1], src[2] * dst[2]],
            };

            let sa = src[3] * opacity;
            let da = dst[3];
            let out_a = sa + da * (1.0 - sa);
            let out = if out_a > 0.0 {
                [
                    (color[0] * sa + dst[0] * da * (1.0 - sa)) / out_a,
                    (color[1] * sa + dst[1] * da * (1.0 - sa)) / out_a,
                    (color[2] * sa + dst[2] * da * (1.0 - sa)) / out_a,
                    out_a,
                ]
            } else {
                [0.0, 0.0, 0.0, 0.0]
            };
            write_rgba(base, x, y, out);
        }
    }
}

/// Replaces `rect` of `dst` with the same rect of `src`, confined to pixels
/// the mask selects.
///
/// Both surfaces share the drawable's coordinate space; `origin` is the
/// drawable's offset within the composition, translating pixel coordinates
/// into mask coordinates.
///
/// # Panics
///
/// Panics if the surfaces differ in format.
pub fn replace_masked(
    dst: &mut PixelSurface,
    src: &PixelSurface,
    rect: PixelRect,
    mask: &SelectionMask,
    origin: (i32, i32),
) {
    assert!(
        dst.format() == src.format(),
        "replace operands must share a format"
    );
    let Some(rect) = rect.intersect(dst.rect()).and_then(|r| r.intersect(src.rect())) else {
        return;
    };
    let bpp = dst.format().bytes_per_pixel();
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            if mask.contains(origin.0 + x, origin.1 + y) {
                let sx = x as usize * bpp;
                let sp = &src.row(y)[sx..sx + bpp];
                dst.row_mut(y)[sx..sx + bpp].copy_from_slice(sp);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::mask::MaskShape;
    use crate::surface::PixelFormat;

    #[test]
    fn normal_composite_opaque_replaces() {
        let mut base = PixelSurface::new(2, 2, PixelFormat::RGBA8);
        base.fill(Color::new(1.0, 0.0, 0.0, 1.0));
        let mut over = PixelSurface::new(2, 2, PixelFormat::RGBA8);
        over.fill(Color::new(0.0, 0.0, 1.0, 1.0));

        composite(&mut base, &over, BlendMode::Normal, 1.0);
        assert_eq!(base.pixel(0, 0), &[0, 0, 255, 255]);
    }

    #[test]
    fn normal_composite_transparent_over_keeps_base() {
        let mut base = PixelSurface::new(1, 1, PixelFormat::RGBA8);
        base.fill(Color::new(0.0, 1.0, 0.0, 1.0));
        let over = PixelSurface::new(1, 1, PixelFormat::RGBA8);

        composite(&mut base, &over, BlendMode::Normal, 1.0);
        assert_eq!(base.pixel(0, 0), &[0, 255, 0, 255]);
    }

    #[test]
    fn half_opacity_mixes() {
        let mut base = PixelSurface::new(1, 1, PixelFormat::RGBA8);
        base.fill(Color::BLACK);
        let mut over = PixelSurface::new(1, 1, PixelFormat::RGBA8);
        over.fill(Color::WHITE);

        composite(&mut base, &over, BlendMode::Normal, 0.5);
        let px = base.pixel(0, 0);
        assert!((f32::from(px[0]) / 255.0 - 0.5).abs() < 0.01);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn multiply_darkens() {
        let mut base = PixelSurface::new(1, 1, PixelFormat::RGBA8);
        base.fill(Color::new(0.5, 0.5, 0.5, 1.0));
        let mut over = PixelSurface::new(1, 1, PixelFormat::RGBA8);
        over.fill(Color::new(0.5, 0.5, 0.5, 1.0));

        composite(&mut base, &over, BlendMode::Multiply, 1.0);
        let px = base.pixel(0, 0);
        assert!((f32::from(px[0]) / 255.0 - 0.25).abs() < 0.01);
    }

    #[test]
    fn sixteen_bit_roundtrip() {
        let mut s = PixelSurface::new(1, 1, PixelFormat::RGBA16);
        write_rgba(&mut s, 0, 0, [0.25, 0.5, 0.75, 1.0]);
        let rgba = read_rgba(&s, 0, 0);
        assert!((rgba[0] - 0.25).abs() < 1e-4);
        assert!((rgba[1] - 0.5).abs() < 1e-4);
        assert!((rgba[2] - 0.75).abs() < 1e-4);
    }

    #[test]
    fn replace_masked_confines_to_shape() {
        let mut dst = PixelSurface::new(4, 4, PixelFormat::GRAY8);
        let mut src = PixelSurface::new(4, 4, PixelFormat::GRAY8);
        src.fill(Color::WHITE);

        let mask = SelectionMask::Shape(MaskShape::Rect(kurbo::Rect::new(0.0, 0.0, 2.0, 4.0)));
        replace_masked(&mut dst, &src, PixelRect::from_size(4, 4), &mask, (0, 0));

        assert_eq!(dst.pixel(0, 0), &[255]);
        assert_eq!(dst.pixel(1, 3), &[255]);
        assert_eq!(dst.pixel(2, 0), &[0]);
        assert_eq!(dst.pixel(3, 3), &[0]);
    }

    #[test]
    fn replace_masked_honors_origin() {
        let mut dst = PixelSurface::new(2, 2, PixelFormat::GRAY8);
        let mut src = PixelSurface::new(2, 2, PixelFormat::GRAY8);
        src.fill(Color::WHITE);

        // Mask selects composition x >= 10; the drawable sits at offset 9.
        let mask = SelectionMask::Shape(MaskShape::Rect(kurbo::Rect::new(10.0, 0.0, 20.0, 20.0)));
        replace_masked(&mut dst, &src, PixelRect::from_size(2, 2), &mask, (9, 0));

        assert_eq!(dst.pixel(0, 0), &[0]);
        assert_eq!(dst.pixel(1, 0), &[255]);
    }
}
