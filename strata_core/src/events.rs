// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notification.
//!
//! A [`Composition`](crate::Composition) fans every mutation out to its
//! registered [`ChangeSink`]s, synchronously and in registration order.
//! Sinks are how repaint caches, thumbnails, and UI code observe the core;
//! nothing in the core waits on them or reads anything back.
//!
//! All methods have default no-op implementations, so a sink only overrides
//! the events it cares about. Sinks must not assume they can safely
//! re-enter the composition that is notifying them.

use crate::drawable::DrawableId;
use crate::geom::PixelRect;

/// Receives change notifications from a composition.
pub trait ChangeSink {
    /// A rectangle of a drawable's pixels changed.
    fn on_update(&mut self, drawable: DrawableId, rect: PixelRect) {
        _ = (drawable, rect);
    }

    /// A drawable's alpha-channel presence changed.
    fn on_alpha_changed(&mut self, drawable: DrawableId) {
        _ = drawable;
    }

    /// A drawable's cached preview is no longer valid.
    fn on_preview_invalidated(&mut self, drawable: DrawableId) {
        _ = drawable;
    }

    /// Drawables were added, removed, or re-attached.
    fn on_structure_changed(&mut self) {}

    /// An incremental preview finished its outstanding work.
    fn on_flush(&mut self, drawable: DrawableId) {
        _ = drawable;
    }
}

/// A [`ChangeSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl ChangeSink for NoopSink {}
