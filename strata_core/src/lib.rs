// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for non-destructive raster editing.
//!
//! `strata_core` provides the data model of an image editor's compositing
//! core: drawable pixel surfaces owned by a [`Composition`], per-drawable
//! processing-graph wiring, and an incremental [`Applicator`] that previews
//! a pixel operation on canvas and either commits it (as one undo step) or
//! discards it without corrupting the original data.
//!
//! # Architecture
//!
//! The crate is organized around the preview loop that turns a pixel
//! operation into time-sliced canvas updates:
//!
//! ```text
//!   Applicator::apply() ──► region backup (pre-op pixels)
//!        │                       │
//!        ▼                       ▼
//!   evaluation graph: source ──► translate ──► operation ──► sink
//!        │                                                    │
//!        ▼ (one tile per Applicator::step)                    ▼
//!   shadow buffer ──► reset-then-apply ──► live surface ──► update events
//!        │
//!        ▼
//!   commit() ──► UndoSink     clear()/abort() ──► restore from backup
//! ```
//!
//! **[`geom`]** — Integer pixel rectangles (intersection, union,
//! translation) shared by every other module.
//!
//! **[`surface`]** — Pixel formats and the owned sample buffer, with
//! clipped rect-to-rect copies, extraction, and fills.
//!
//! **[`backup`]** — The pre-operation snapshot of an applicator's target
//! region, reallocated only when the region's dimensions change.
//!
//! **[`mask`]** — The selection mask: trivially "everything", or a shape
//! that bounds and confines pixel operations.
//!
//! **[`graph`]** — Generational-handle node store plus the resumable
//! [`Processor`](graph::Processor) that computes one tile per step.
//!
//! **[`drawable`]** — The [`Composition`] store: drawable slots, buffer
//! management, root/source graph wiring, and floating-selection overlays.
//!
//! **[`applicator`]** — The incremental preview applicator driving the
//! whole loop, with commit/clear/abort semantics.
//!
//! **[`events`]** — The [`ChangeSink`](events::ChangeSink) observer
//! contract for update/alpha/flush notifications.
//!
//! **[`undo`]** — The [`UndoSink`](undo::UndoSink) contract through which
//! committed previews and buffer replacements become undoable steps.

pub mod applicator;
pub mod backup;
pub mod blend;
pub mod color;
pub mod drawable;
pub mod events;
pub mod geom;
pub mod graph;
pub mod mask;
pub mod ops;
pub mod pickable;
pub mod surface;
pub mod undo;

pub use applicator::Applicator;
pub use drawable::{Composition, DrawableId};
