// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawables and the composition that owns them.
//!
//! A *drawable* is an entity owning a pixel surface and participating in
//! compositing (a layer or a mask). Drawables live in slots of a
//! [`Composition`] and are addressed by generational [`DrawableId`]
//! handles; a drawable is *attached* while its handle is live, and removal
//! invalidates the handle. Code that may race with removal (notably the
//! incremental applicator) checks [`Composition::is_attached`] and treats
//! detachment as a normal outcome, never as an error.
//!
//! Each drawable carries:
//!
//! - Its [`PixelSurface`](crate::surface::PixelSurface), offset, and
//!   visibility/blend properties.
//! - An optional shadow buffer staging preview output.
//! - Lazily built graph wiring: the *root graph* (input proxy → mode blend
//!   → output proxy, bypassed while hidden) and the *source graph* (buffer
//!   source → output proxy, spliced with crop/translate/blend nodes while
//!   a floating selection is attached).
//! - An optional non-owning back-reference to an attached floating
//!   selection, which is itself a drawable owned by the composition.
//!
//! The composition additionally owns the [`SelectionMask`](crate::mask),
//! the registered [`ChangeSink`](crate::events::ChangeSink) observers, and
//! the [`UndoSink`](crate::undo::UndoSink).

mod buffer;
mod graph;
mod id;
mod store;

pub use buffer::FillContent;
pub use graph::{OverlaySplice, RootGraph, RootTopology, SourceGraph, SourceTopology};
pub use id::DrawableId;
pub use store::Composition;
