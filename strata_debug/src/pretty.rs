// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable change output.
//!
//! [`PrettyPrintSink`] implements [`ChangeSink`] and writes one line per
//! event to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use strata_core::drawable::DrawableId;
use strata_core::events::ChangeSink;
use strata_core::geom::PixelRect;

/// Writes human-readable change lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ChangeSink for PrettyPrintSink<W> {
    fn on_update(&mut self, drawable: DrawableId, rect: PixelRect) {
        let _ = writeln!(
            self.writer,
            "[update] drawable={drawable:?} rect={},{} {}x{}",
            rect.x, rect.y, rect.width, rect.height,
        );
    }

    fn on_alpha_changed(&mut self, drawable: DrawableId) {
        let _ = writeln!(self.writer, "[alpha] drawable={drawable:?}");
    }

    fn on_preview_invalidated(&mut self, drawable: DrawableId) {
        let _ = writeln!(self.writer, "[preview-invalid] drawable={drawable:?}");
    }

    fn on_structure_changed(&mut self) {
        let _ = writeln!(self.writer, "[structure]");
    }

    fn on_flush(&mut self, drawable: DrawableId) {
        let _ = writeln!(self.writer, "[flush] drawable={drawable:?}");
    }
}
