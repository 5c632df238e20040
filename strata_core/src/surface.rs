// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel formats and the owned sample buffer.
//!
//! A [`PixelSurface`] is a contiguous, row-major sample buffer with a
//! [`PixelFormat`]. The format is fixed at construction; converting a
//! drawable to another format replaces its surface wholesale. Samples are
//! stored as native-endian bytes, `bytes_per_pixel` per pixel.
//!
//! Rect-to-rect copies clip against both surfaces, so callers can hand in
//! unclipped regions; pixels outside either extent are simply skipped.

use std::fmt;

use crate::color::Color;
use crate::geom::PixelRect;

/// The channel arrangement of a pixel format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// Single gray channel.
    Gray,
    /// Gray plus alpha.
    GrayAlpha,
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
}

impl ChannelLayout {
    /// Returns the number of channels.
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::GrayAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Returns whether the layout carries an alpha channel.
    #[must_use]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::GrayAlpha | Self::Rgba)
    }
}

/// Bits per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BitDepth {
    /// 8 bits per channel.
    Eight,
    /// 16 bits per channel.
    Sixteen,
}

impl BitDepth {
    /// Returns the number of bytes per channel.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Eight => 1,
            Self::Sixteen => 2,
        }
    }
}

/// A pixel format: channel layout plus bit depth.
///
/// Format equality is the consistency test used when restoring backed-up
/// pixels — a mismatch means the owning drawable's buffer was replaced with
/// a different format mid-operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    /// Channel arrangement.
    pub layout: ChannelLayout,
    /// Bits per channel.
    pub depth: BitDepth,
}

impl PixelFormat {
    /// 8-bit grayscale.
    pub const GRAY8: Self = Self::new(ChannelLayout::Gray, BitDepth::Eight);
    /// 8-bit RGB.
    pub const RGB8: Self = Self::new(ChannelLayout::Rgb, BitDepth::Eight);
    /// 8-bit RGBA.
    pub const RGBA8: Self = Self::new(ChannelLayout::Rgba, BitDepth::Eight);
    /// 16-bit RGBA.
    pub const RGBA16: Self = Self::new(ChannelLayout::Rgba, BitDepth::Sixteen);

    /// Creates a format from layout and depth.
    #[must_use]
    pub const fn new(layout: ChannelLayout, depth: BitDepth) -> Self {
        Self { layout, depth }
    }

    /// Returns the number of bytes per pixel.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        self.layout.channels() * self.depth.bytes()
    }

    /// Returns whether the format carries an alpha channel.
    #[must_use]
    pub const fn has_alpha(self) -> bool {
        self.layout.has_alpha()
    }
}

/// A single pixel's samples, carried in the surface's native format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelValue {
    format: PixelFormat,
    data: [u8; 8],
}

impl PixelValue {
    /// Returns the pixel's format.
    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    /// Returns the sample bytes (`bytes_per_pixel` of them).
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.format.bytes_per_pixel()]
    }
}

/// A mutable 2-D pixel buffer with a fixed format.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelSurface {
    format: PixelFormat,
    width: i32,
    height: i32,
    samples: Vec<u8>,
}

impl PixelSurface {
    /// Creates a surface initialized to all-zero samples (transparent
    /// black).
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is not positive.
    #[must_use]
    pub fn new(width: i32, height: i32, format: PixelFormat) -> Self {
        assert!(
            width > 0 && height > 0,
            "surface dimensions must be positive, got {width}x{height}"
        );
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            format,
            width,
            height,
            samples: vec![0; len],
        }
    }

    /// Returns the surface width in pixels.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Returns the surface height in pixels.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Returns the pixel format.
    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    /// Returns the surface extent as a rectangle at the origin.
    #[must_use]
    pub const fn rect(&self) -> PixelRect {
        PixelRect::from_size(self.width, self.height)
    }

    /// Returns the raw samples.
    #[must_use]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    fn row_span(&self, y: i32) -> std::ops::Range<usize> {
        debug_assert!(y >= 0 && y < self.height, "row {y} out of range");
        let stride = self.width as usize * self.format.bytes_per_pixel();
        let start = y as usize * stride;
        start..start + stride
    }

    /// Returns one row of samples.
    #[must_use]
    pub fn row(&self, y: i32) -> &[u8] {
        let span = self.row_span(y);
        &self.samples[span]
    }

    /// Returns one row of samples, mutably.
    pub fn row_mut(&mut self, y: i32) -> &mut [u8] {
        let span = self.row_span(y);
        &mut self.samples[span]
    }

    /// Returns the sample bytes of the pixel at `(x, y)`.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> &[u8] {
        let bpp = self.format.bytes_per_pixel();
        let start = x as usize * bpp;
        &self.row(y)[start..start + bpp]
    }

    /// Returns the sample bytes of the pixel at `(x, y)`, mutably.
    pub fn pixel_mut(&mut self, x: i32, y: i32) -> &mut [u8] {
        let bpp = self.format.bytes_per_pixel();
        let start = x as usize * bpp;
        &mut self.row_mut(y)[start..start + bpp]
    }

    /// Returns the pixel at `(x, y)` as a [`PixelValue`].
    #[must_use]
    pub fn pixel_value(&self, x: i32, y: i32) -> PixelValue {
        let mut data = [0; 8];
        let src = self.pixel(x, y);
        data[..src.len()].copy_from_slice(src);
        PixelValue {
            format: self.format,
            data,
        }
    }

    /// Copies `src_rect` of `src` so that its top-left lands at
    /// `(dst_x, dst_y)` in `self`.
    ///
    /// The copy is clipped against both surfaces; out-of-range portions are
    /// skipped.
    ///
    /// # Panics
    ///
    /// Panics if the formats differ.
    pub fn copy_rect(&mut self, src: &Self, src_rect: PixelRect, dst_x: i32, dst_y: i32) {
        assert!(
            self.format == src.format,
            "cannot copy between formats {:?} and {:?}",
            src.format,
            self.format
        );

        let mut sx = src_rect.x;
        let mut sy = src_rect.y;
        let mut dx = dst_x;
        let mut dy = dst_y;
        let mut w = src_rect.width;
        let mut h = src_rect.height;

        // Clip against the source extent.
        if sx < 0 {
            dx -= sx;
            w += sx;
            sx = 0;
        }
        if sy < 0 {
            dy -= sy;
            h += sy;
            sy = 0;
        }
        w = w.min(src.width - sx);
        h = h.min(src.height - sy);

        // Clip against the destination extent.
        if dx < 0 {
            sx -= dx;
            w += dx;
            dx = 0;
        }
        if dy < 0 {
            sy -= dy;
            h += dy;
            dy = 0;
        }
        w = w.min(self.width - dx);
        h = h.min(self.height - dy);

        if w <= 0 || h <= 0 {
            return;
        }

        let bpp = self.format.bytes_per_pixel();
        let row_bytes = w as usize * bpp;
        for r in 0..h {
            let src_start = sx as usize * bpp;
            let src_row = &src.row(sy + r)[src_start..src_start + row_bytes];
            let dst_start = dx as usize * bpp;
            self.row_mut(dy + r)[dst_start..dst_start + row_bytes].copy_from_slice(src_row);
        }
    }

    /// Returns a new surface holding a copy of `rect`.
    ///
    /// # Panics
    ///
    /// Panics if `rect` is not fully inside the surface.
    #[must_use]
    pub fn extract(&self, rect: PixelRect) -> Self {
        assert!(
            rect.intersect(self.rect()) == Some(rect),
            "extract rect {rect:?} exceeds surface extent {:?}",
            self.rect()
        );
        let mut out = Self::new(rect.width, rect.height, self.format);
        out.copy_rect(self, rect, 0, 0);
        out
    }

    /// Fills the whole surface with a solid color.
    pub fn fill(&mut self, color: Color) {
        let (px, bpp) = color_bytes(self.format, color);
        for chunk in self.samples.chunks_exact_mut(bpp) {
            chunk.copy_from_slice(&px[..bpp]);
        }
    }

    /// Fills the whole surface by tiling `pattern` from the origin.
    ///
    /// # Panics
    ///
    /// Panics if the formats differ.
    pub fn fill_pattern(&mut self, pattern: &Self) {
        assert!(
            self.format == pattern.format,
            "pattern format {:?} does not match surface format {:?}",
            pattern.format,
            self.format
        );
        let bpp = self.format.bytes_per_pixel();
        for y in 0..self.height {
            let src_row = pattern.row(y % pattern.height);
            for x in 0..self.width {
                let sx = (x % pattern.width) as usize * bpp;
                let dst = x as usize * bpp;
                self.row_mut(y)[dst..dst + bpp].copy_from_slice(&src_row[sx..sx + bpp]);
            }
        }
    }
}

impl fmt::Debug for PixelSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelSurface")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Quantizes `color` into one pixel's sample bytes for `format`.
///
/// Gray layouts use the color's Rec. 709 luma.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "values are clamped to the channel range before conversion"
)]
pub(crate) fn color_bytes(format: PixelFormat, color: Color) -> ([u8; 8], usize) {
    let channels: [f32; 4] = match format.layout {
        ChannelLayout::Gray => [color.luma(), 0.0, 0.0, 0.0],
        ChannelLayout::GrayAlpha => [color.luma(), color.a, 0.0, 0.0],
        ChannelLayout::Rgb => [color.r, color.g, color.b, 0.0],
        ChannelLayout::Rgba => [color.r, color.g, color.b, color.a],
    };
    let mut px = [0; 8];
    let n = format.layout.channels();
    match format.depth {
        BitDepth::Eight => {
            for (i, v) in channels[..n].iter().enumerate() {
                px[i] = (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
            }
        }
        BitDepth::Sixteen => {
            for (i, v) in channels[..n].iter().enumerate() {
                let word = (v.clamp(0.0, 1.0) * 65535.0 + 0.5) as u16;
                px[i * 2..i * 2 + 2].copy_from_slice(&word.to_ne_bytes());
            }
        }
    }
    (px, format.bytes_per_pixel())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_zeroes_samples() {
        let s = PixelSurface::new(4, 3, PixelFormat::RGBA8);
        assert_eq!(s.samples().len(), 4 * 3 * 4);
        assert!(s.samples().iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic(expected = "dimensions must be positive")]
    fn new_rejects_zero_size() {
        let _ = PixelSurface::new(0, 4, PixelFormat::RGBA8);
    }

    #[test]
    fn fill_writes_every_pixel() {
        let mut s = PixelSurface::new(3, 3, PixelFormat::RGBA8);
        s.fill(Color::new(1.0, 0.0, 0.0, 1.0));
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(s.pixel(x, y), &[255, 0, 0, 255]);
            }
        }
    }

    #[test]
    fn fill_sixteen_bit_quantizes_to_words() {
        let mut s = PixelSurface::new(1, 1, PixelFormat::RGBA16);
        s.fill(Color::WHITE);
        let px = s.pixel(0, 0);
        assert_eq!(u16::from_ne_bytes([px[0], px[1]]), 65535);
        assert_eq!(u16::from_ne_bytes([px[6], px[7]]), 65535);
    }

    #[test]
    fn fill_gray_uses_luma() {
        let mut s = PixelSurface::new(1, 1, PixelFormat::GRAY8);
        s.fill(Color::WHITE);
        assert_eq!(s.pixel(0, 0), &[255]);
    }

    #[test]
    fn copy_rect_roundtrip() {
        let mut a = PixelSurface::new(4, 4, PixelFormat::RGBA8);
        a.fill(Color::new(0.0, 1.0, 0.0, 1.0));
        let mut b = PixelSurface::new(4, 4, PixelFormat::RGBA8);
        b.copy_rect(&a, PixelRect::new(1, 1, 2, 2), 1, 1);

        assert_eq!(b.pixel(1, 1), &[0, 255, 0, 255]);
        assert_eq!(b.pixel(2, 2), &[0, 255, 0, 255]);
        assert_eq!(b.pixel(0, 0), &[0, 0, 0, 0]);
        assert_eq!(b.pixel(3, 3), &[0, 0, 0, 0]);
    }

    #[test]
    fn copy_rect_clips_against_source() {
        let mut src = PixelSurface::new(2, 2, PixelFormat::GRAY8);
        src.fill(Color::WHITE);
        let mut dst = PixelSurface::new(2, 2, PixelFormat::GRAY8);

        // Source rect hangs off every edge of the 2x2 source; the clipped
        // copy still lands pixel-for-pixel.
        dst.copy_rect(&src, PixelRect::new(-1, -1, 4, 4), -1, -1);
        assert_eq!(dst.pixel(0, 0), &[255]);
        assert_eq!(dst.pixel(1, 1), &[255]);
    }

    #[test]
    fn copy_rect_clips_against_destination() {
        let mut src = PixelSurface::new(2, 2, PixelFormat::GRAY8);
        src.fill(Color::WHITE);
        let mut dst = PixelSurface::new(2, 2, PixelFormat::GRAY8);

        // Placed at (1, 1), only the top-left source pixel fits.
        dst.copy_rect(&src, PixelRect::from_size(2, 2), 1, 1);
        assert_eq!(dst.pixel(1, 1), &[255]);
        assert_eq!(dst.pixel(0, 0), &[0]);
        assert_eq!(dst.pixel(0, 1), &[0]);
    }

    #[test]
    #[should_panic(expected = "cannot copy between formats")]
    fn copy_rect_rejects_format_mismatch() {
        let src = PixelSurface::new(2, 2, PixelFormat::GRAY8);
        let mut dst = PixelSurface::new(2, 2, PixelFormat::RGBA8);
        dst.copy_rect(&src, PixelRect::from_size(2, 2), 0, 0);
    }

    #[test]
    fn extract_is_independent_of_source() {
        let mut s = PixelSurface::new(4, 4, PixelFormat::GRAY8);
        s.fill(Color::WHITE);
        let snap = s.extract(PixelRect::new(1, 1, 2, 2));
        s.fill(Color::BLACK);
        assert_eq!(snap.pixel(0, 0), &[255]);
        assert_eq!(s.pixel(1, 1), &[0]);
    }

    #[test]
    #[should_panic(expected = "exceeds surface extent")]
    fn extract_rejects_out_of_range() {
        let s = PixelSurface::new(4, 4, PixelFormat::GRAY8);
        let _ = s.extract(PixelRect::new(2, 2, 4, 4));
    }

    #[test]
    fn fill_pattern_tiles() {
        let mut pat = PixelSurface::new(2, 1, PixelFormat::GRAY8);
        pat.pixel_mut(0, 0)[0] = 10;
        pat.pixel_mut(1, 0)[0] = 20;

        let mut s = PixelSurface::new(4, 2, PixelFormat::GRAY8);
        s.fill_pattern(&pat);
        assert_eq!(s.row(0), &[10, 20, 10, 20]);
        assert_eq!(s.row(1), &[10, 20, 10, 20]);
    }

    #[test]
    fn pixel_value_carries_format() {
        let mut s = PixelSurface::new(1, 1, PixelFormat::RGB8);
        s.fill(Color::new(1.0, 0.0, 1.0, 1.0));
        let v = s.pixel_value(0, 0);
        assert_eq!(v.format(), PixelFormat::RGB8);
        assert_eq!(v.bytes(), &[255, 0, 255]);
    }
}
