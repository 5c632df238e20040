// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of recorded change events.
//!
//! Renders a [`ChangeRecorder`](crate::ChangeRecorder) event list as a
//! JSON array for offline inspection (diffing notification streams,
//! attaching to bug reports).

use serde_json::{json, Value};

use crate::recorder::RecordedChange;

/// Renders recorded events as a JSON array, one object per event.
#[must_use]
pub fn export_events(events: &[RecordedChange]) -> Value {
    let items: Vec<Value> = events
        .iter()
        .map(|event| match event {
            RecordedChange::Update { drawable, rect } => json!({
                "event": "update",
                "drawable": drawable.index(),
                "rect": [rect.x, rect.y, rect.width, rect.height],
            }),
            RecordedChange::AlphaChanged { drawable } => json!({
                "event": "alpha-changed",
                "drawable": drawable.index(),
            }),
            RecordedChange::PreviewInvalidated { drawable } => json!({
                "event": "preview-invalidated",
                "drawable": drawable.index(),
            }),
            RecordedChange::StructureChanged => json!({
                "event": "structure-changed",
            }),
            RecordedChange::Flush { drawable } => json!({
                "event": "flush",
                "drawable": drawable.index(),
            }),
        })
        .collect();
    Value::Array(items)
}
