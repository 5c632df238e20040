// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawable identity.

use std::fmt;

/// A handle to a drawable in a [`Composition`](super::Composition).
///
/// Contains both a slot index and a generation counter so that stale
/// handles can be detected after a drawable is removed and the slot is
/// reused. Holding a `DrawableId` never keeps the drawable alive; the
/// composition owns it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl DrawableId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }
}

impl fmt::Debug for DrawableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DrawableId({}@gen{})", self.idx, self.generation)
    }
}
