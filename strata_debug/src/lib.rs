// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics helpers for strata.
//!
//! This crate provides the observer implementations used by tests, demos,
//! and debugging sessions:
//!
//! - [`ChangeRecorder`] / [`RecordingUndo`] — record every notification or
//!   undo step for later inspection (cloneable handles over shared state,
//!   so a copy can stay outside the composition that owns the sink).
//! - [`PrettyPrintSink`] — writes one human-readable line per event.
//! - [`export_events`] — renders recorded events as JSON for offline
//!   tooling.

mod export;
mod pretty;
mod recorder;

pub use export::export_events;
pub use pretty::PrettyPrintSink;
pub use recorder::{ChangeRecorder, RecordedChange, RecordedUndo, RecordingUndo};
