// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawable storage, properties, and notification fan-out.

use std::fmt;

use crate::backup::RegionBackup;
use crate::blend::{self, BlendMode};
use crate::events::ChangeSink;
use crate::geom::PixelRect;
use crate::mask::SelectionMask;
use crate::surface::{PixelFormat, PixelSurface, PixelValue};
use crate::undo::{DiscardUndo, UndoSink};

use super::graph::{RootGraph, SourceGraph};
use super::id::DrawableId;

/// Per-slot drawable state.
pub(crate) struct Drawable {
    pub(crate) surface: PixelSurface,
    pub(crate) offset_x: i32,
    pub(crate) offset_y: i32,
    pub(crate) visible: bool,
    pub(crate) mode: BlendMode,
    pub(crate) opacity: f32,
    pub(crate) shadow: Option<PixelSurface>,
    pub(crate) root: Option<RootGraph>,
    pub(crate) source: Option<SourceGraph>,
    pub(crate) floating_sel: Option<DrawableId>,
}

struct Slot {
    generation: u32,
    state: Option<Drawable>,
}

/// The store owning all drawables of one image, plus the selection mask,
/// change observers, and the undo sink.
///
/// Drawables are addressed by [`DrawableId`] handles. Removed slots are
/// recycled via a free list; generation counters make stale handles
/// detectable, which is what the rest of the crate means by a drawable
/// being *attached* or not.
pub struct Composition {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    selection: SelectionMask,
    observers: Vec<Box<dyn ChangeSink>>,
    undo: Box<dyn UndoSink>,
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}

impl Composition {
    /// Creates an empty composition that discards undo steps.
    #[must_use]
    pub fn new() -> Self {
        Self::with_undo(Box::new(DiscardUndo))
    }

    /// Creates an empty composition recording undo steps into `undo`.
    #[must_use]
    pub fn with_undo(undo: Box<dyn UndoSink>) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            selection: SelectionMask::Everything,
            observers: Vec::new(),
            undo,
        }
    }

    /// Registers a change observer. Observers are notified synchronously,
    /// in registration order.
    pub fn add_observer(&mut self, observer: Box<dyn ChangeSink>) {
        self.observers.push(observer);
    }

    /// Returns the active selection mask.
    #[must_use]
    pub fn selection(&self) -> SelectionMask {
        self.selection
    }

    /// Replaces the active selection mask.
    pub fn set_selection(&mut self, mask: SelectionMask) {
        self.selection = mask;
    }

    // -- Allocation --

    /// Creates a drawable and returns its handle.
    ///
    /// The drawable starts visible, fully opaque, in normal mode, with a
    /// zero-initialized surface.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is not positive.
    pub fn create_drawable(
        &mut self,
        width: i32,
        height: i32,
        format: PixelFormat,
        offset_x: i32,
        offset_y: i32,
    ) -> DrawableId {
        let state = Drawable {
            surface: PixelSurface::new(width, height, format),
            offset_x,
            offset_y,
            visible: true,
            mode: BlendMode::Normal,
            opacity: 1.0,
            shadow: None,
            root: None,
            source: None,
            floating_sel: None,
        };

        let idx = if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation += 1;
            slot.state = Some(state);
            idx
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "drawable count fits in u32"
            )]
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                state: Some(state),
            });
            idx
        };

        self.emit_structure_changed();
        DrawableId {
            idx,
            generation: self.slots[idx as usize].generation,
        }
    }

    /// Removes a drawable, detaching any floating-selection relationship
    /// in either direction and invalidating the handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_drawable(&mut self, id: DrawableId) {
        if self.drawable(id).floating_sel.is_some() {
            self.detach_floating_sel(id);
        }
        if let Some(host) = self.fs_host_of(id) {
            self.detach_floating_sel(host);
        }

        let slot = &mut self.slots[id.idx as usize];
        slot.generation += 1;
        slot.state = None;
        self.free_list.push(id.idx);
        self.emit_structure_changed();
    }

    /// Returns whether the handle refers to a live drawable.
    #[must_use]
    pub fn is_attached(&self, id: DrawableId) -> bool {
        self.slots
            .get(id.idx as usize)
            .is_some_and(|slot| slot.generation == id.generation && slot.state.is_some())
    }

    pub(crate) fn drawable(&self, id: DrawableId) -> &Drawable {
        match self.slots.get(id.idx as usize) {
            Some(slot) if slot.generation == id.generation => match &slot.state {
                Some(state) => state,
                None => panic!("stale DrawableId: {id:?}"),
            },
            _ => panic!("stale DrawableId: {id:?}"),
        }
    }

    pub(crate) fn drawable_mut(&mut self, id: DrawableId) -> &mut Drawable {
        match self.slots.get_mut(id.idx as usize) {
            Some(slot) if slot.generation == id.generation => match &mut slot.state {
                Some(state) => state,
                None => panic!("stale DrawableId: {id:?}"),
            },
            _ => panic!("stale DrawableId: {id:?}"),
        }
    }

    // -- Properties --

    /// Returns the drawable's size in pixels.
    #[must_use]
    pub fn size(&self, id: DrawableId) -> (i32, i32) {
        let d = self.drawable(id);
        (d.surface.width(), d.surface.height())
    }

    /// Returns the drawable's offset within the composition.
    #[must_use]
    pub fn offset(&self, id: DrawableId) -> (i32, i32) {
        let d = self.drawable(id);
        (d.offset_x, d.offset_y)
    }

    /// Returns the drawable's extent in its own coordinate space.
    #[must_use]
    pub fn local_rect(&self, id: DrawableId) -> PixelRect {
        self.drawable(id).surface.rect()
    }

    /// Returns the drawable's extent in composition coordinates.
    #[must_use]
    pub fn extent(&self, id: DrawableId) -> PixelRect {
        let d = self.drawable(id);
        d.surface.rect().translated(d.offset_x, d.offset_y)
    }

    /// Returns the drawable's pixel format.
    #[must_use]
    pub fn format(&self, id: DrawableId) -> PixelFormat {
        self.drawable(id).surface.format()
    }

    /// Returns whether the drawable's format carries alpha.
    #[must_use]
    pub fn has_alpha(&self, id: DrawableId) -> bool {
        self.format(id).has_alpha()
    }

    /// Returns the drawable's visibility flag.
    #[must_use]
    pub fn visible(&self, id: DrawableId) -> bool {
        self.drawable(id).visible
    }

    /// Returns the drawable's blend mode.
    #[must_use]
    pub fn blend_mode(&self, id: DrawableId) -> BlendMode {
        self.drawable(id).mode
    }

    /// Returns the drawable's opacity.
    #[must_use]
    pub fn opacity(&self, id: DrawableId) -> f32 {
        self.drawable(id).opacity
    }

    /// Returns the attached floating selection, if any.
    #[must_use]
    pub fn floating_sel(&self, id: DrawableId) -> Option<DrawableId> {
        self.drawable(id).floating_sel
    }

    /// Returns the drawable that `id` is attached to as a floating
    /// selection, if any.
    #[must_use]
    pub fn fs_host_of(&self, id: DrawableId) -> Option<DrawableId> {
        self.slots.iter().enumerate().find_map(|(idx, slot)| {
            let state = slot.state.as_ref()?;
            if state.floating_sel != Some(id) {
                return None;
            }
            #[expect(
                clippy::cast_possible_truncation,
                reason = "slot indices fit in u32 by construction"
            )]
            let idx = idx as u32;
            Some(DrawableId {
                idx,
                generation: slot.generation,
            })
        })
    }

    /// Moves the drawable within the composition.
    ///
    /// Refreshes a host's overlay wiring when the drawable is an attached
    /// floating selection.
    pub fn set_offset(&mut self, id: DrawableId, x: i32, y: i32) {
        {
            let d = self.drawable_mut(id);
            d.offset_x = x;
            d.offset_y = y;
        }
        if let Some(host) = self.fs_host_of(id) {
            self.sync_overlay_wiring(host);
        }
    }

    /// Sets the drawable's opacity, refreshing dependent graph parameters.
    pub fn set_opacity(&mut self, id: DrawableId, opacity: f32) {
        {
            let d = self.drawable_mut(id);
            d.opacity = opacity;
            let mode = d.mode;
            if let Some(root) = &mut d.root {
                root.set_mode_params(mode, opacity);
            }
        }
        if let Some(host) = self.fs_host_of(id) {
            self.sync_overlay_wiring(host);
        }
    }

    /// Sets the drawable's blend mode, refreshing dependent graph
    /// parameters.
    pub fn set_blend_mode(&mut self, id: DrawableId, mode: BlendMode) {
        {
            let d = self.drawable_mut(id);
            d.mode = mode;
            let opacity = d.opacity;
            if let Some(root) = &mut d.root {
                root.set_mode_params(mode, opacity);
            }
        }
        if let Some(host) = self.fs_host_of(id) {
            self.sync_overlay_wiring(host);
        }
    }

    // -- Selection --

    /// Intersects the selection mask with the drawable's extent, returning
    /// the rectangle eligible for modification in drawable-local
    /// coordinates, or `None` when nothing is selected.
    #[must_use]
    pub fn mask_bounds(&self, id: DrawableId) -> Option<PixelRect> {
        let extent = self.extent(id);
        let hit = self.selection.bounds_within(extent)?;
        let (ox, oy) = self.offset(id);
        Some(hit.translated(-ox, -oy))
    }

    // -- Pixel probe --

    /// Returns the committed pixel at drawable-local `(x, y)`, or `None`
    /// outside the extent.
    #[must_use]
    pub fn pixel_at(&self, id: DrawableId, x: i32, y: i32) -> Option<PixelValue> {
        let d = self.drawable(id);
        // Out-of-range coordinates are an expected probe miss, not a
        // programmer error.
        if x < 0 || x >= d.surface.width() || y < 0 || y >= d.surface.height() {
            return None;
        }
        Some(d.surface.pixel_value(x, y))
    }

    // -- Shadow buffer --

    /// Returns the drawable's shadow buffer, creating it on demand with
    /// the surface's size and format.
    pub(crate) fn shadow_mut(&mut self, id: DrawableId) -> &mut PixelSurface {
        let d = self.drawable_mut(id);
        let (w, h, format) = (d.surface.width(), d.surface.height(), d.surface.format());
        d.shadow
            .get_or_insert_with(|| PixelSurface::new(w, h, format))
    }

    /// Releases the drawable's shadow buffer, if present.
    pub fn free_shadow(&mut self, id: DrawableId) {
        self.drawable_mut(id).shadow = None;
    }

    // -- Notifications --

    /// Declares that `rect` of the drawable changed: notifies observers
    /// and forwards floating-selection updates to the host drawable.
    pub fn update(&mut self, id: DrawableId, rect: PixelRect) {
        self.drawable(id); // validate
        self.emit_update(id, rect);

        if let Some(host) = self.fs_host_of(id) {
            let (fx, fy) = self.offset(id);
            let host_extent = self.extent(host);
            if let Some(hit) = rect.translated(fx, fy).intersect(host_extent) {
                let forwarded = hit.translated(-host_extent.x, -host_extent.y);
                self.emit_update(host, forwarded);
            }
        }
    }

    /// Notifies observers that the drawable's alpha-channel presence
    /// changed.
    pub fn alpha_changed(&mut self, id: DrawableId) {
        self.drawable(id); // validate
        for observer in &mut self.observers {
            observer.on_alpha_changed(id);
        }
    }

    fn emit_update(&mut self, id: DrawableId, rect: PixelRect) {
        for observer in &mut self.observers {
            observer.on_update(id, rect);
            observer.on_preview_invalidated(id);
        }
    }

    pub(crate) fn emit_flush(&mut self, id: DrawableId) {
        for observer in &mut self.observers {
            observer.on_flush(id);
        }
    }

    pub(crate) fn emit_structure_changed(&mut self) {
        for observer in &mut self.observers {
            observer.on_structure_changed();
        }
    }

    // -- Undo forwarding --

    pub(crate) fn undo_push_region(
        &mut self,
        id: DrawableId,
        label: &str,
        snapshot: PixelSurface,
        x: i32,
        y: i32,
    ) {
        self.undo.push_region(label, id, snapshot, x, y);
    }

    pub(crate) fn undo_push_buffer_swap(
        &mut self,
        id: DrawableId,
        label: &str,
        old_buffer: PixelSurface,
        old_x: i32,
        old_y: i32,
    ) {
        self.undo.push_buffer_swap(label, id, old_buffer, old_x, old_y);
    }

    // -- Preview tile write-back --

    /// Applies one finished preview tile from the shadow buffer onto the
    /// live surface.
    ///
    /// With a non-trivial selection the tile is first reset to the backed
    /// up pre-operation pixels and then replaced through the mask, so the
    /// operation's effect stays confined to the selection boundary even
    /// though the evaluation graph computed the full bounding rectangle.
    pub(crate) fn write_preview_tile(
        &mut self,
        id: DrawableId,
        tile: PixelRect,
        backup: &RegionBackup,
    ) {
        let selection = self.selection;
        let (off_x, off_y) = self.offset(id);
        {
            let d = self.drawable_mut(id);
            let Drawable {
                surface, shadow, ..
            } = d;
            let Some(shadow) = shadow.as_ref() else {
                return;
            };
            if selection.is_everything() {
                surface.copy_rect(shadow, tile, tile.x, tile.y);
            } else {
                let backup_rect = backup.rect();
                let local = tile.translated(-backup_rect.x, -backup_rect.y);
                surface.copy_rect(backup.surface(), local, tile.x, tile.y);
                blend::replace_masked(surface, shadow, tile, &selection, (off_x, off_y));
            }
        }
        self.update(id, tile);
    }

    /// Copies a backup's pixels back into the live surface at its recorded
    /// offset and emits an update for that rectangle.
    pub(crate) fn restore_backup(&mut self, id: DrawableId, backup: &RegionBackup) {
        {
            let d = self.drawable_mut(id);
            backup.restore_into(&mut d.surface);
        }
        self.update(id, backup.rect());
    }
}

impl fmt::Debug for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composition")
            .field("drawables", &(self.slots.len() - self.free_list.len()))
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::drawable::FillContent;
    use crate::mask::MaskShape;

    fn comp_with(width: i32, height: i32) -> (Composition, DrawableId) {
        let mut comp = Composition::new();
        let id = comp.create_drawable(width, height, PixelFormat::RGBA8, 0, 0);
        (comp, id)
    }

    #[derive(Default)]
    struct CountingSink {
        updates: std::rc::Rc<std::cell::RefCell<Vec<(DrawableId, PixelRect)>>>,
    }

    impl ChangeSink for CountingSink {
        fn on_update(&mut self, drawable: DrawableId, rect: PixelRect) {
            self.updates.borrow_mut().push((drawable, rect));
        }
    }

    #[test]
    fn create_and_remove() {
        let (mut comp, id) = comp_with(4, 4);
        assert!(comp.is_attached(id));
        comp.remove_drawable(id);
        assert!(!comp.is_attached(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let (mut comp, id) = comp_with(4, 4);
        comp.remove_drawable(id);
        let id2 = comp.create_drawable(4, 4, PixelFormat::RGBA8, 0, 0);
        assert_eq!(id.idx, id2.idx);
        assert!(!comp.is_attached(id));
        assert!(comp.is_attached(id2));
    }

    #[test]
    #[should_panic(expected = "stale DrawableId")]
    fn stale_handle_panics_on_property_access() {
        let (mut comp, id) = comp_with(4, 4);
        comp.remove_drawable(id);
        let _ = comp.format(id);
    }

    #[test]
    fn extent_accounts_for_offset() {
        let mut comp = Composition::new();
        let id = comp.create_drawable(10, 20, PixelFormat::RGBA8, 5, -3);
        assert_eq!(comp.extent(id), PixelRect::new(5, -3, 10, 20));
        assert_eq!(comp.local_rect(id), PixelRect::from_size(10, 20));
    }

    #[test]
    fn mask_bounds_translate_to_local_coordinates() {
        let mut comp = Composition::new();
        let id = comp.create_drawable(10, 10, PixelFormat::RGBA8, 100, 100);
        comp.set_selection(SelectionMask::Shape(MaskShape::Rect(kurbo::Rect::new(
            103.0, 100.0, 200.0, 200.0,
        ))));
        assert_eq!(comp.mask_bounds(id), Some(PixelRect::new(3, 0, 7, 10)));
    }

    #[test]
    fn mask_bounds_empty_when_selection_misses() {
        let mut comp = Composition::new();
        let id = comp.create_drawable(10, 10, PixelFormat::RGBA8, 0, 0);
        comp.set_selection(SelectionMask::Shape(MaskShape::Rect(kurbo::Rect::new(
            50.0, 50.0, 60.0, 60.0,
        ))));
        assert_eq!(comp.mask_bounds(id), None);
    }

    #[test]
    fn pixel_at_outside_extent_is_none() {
        let (mut comp, id) = comp_with(4, 4);
        comp.fill(id, FillContent::Color(Color::WHITE));
        assert!(comp.pixel_at(id, 0, 0).is_some());
        assert!(comp.pixel_at(id, -1, 0).is_none());
        assert!(comp.pixel_at(id, 4, 0).is_none());
    }

    #[test]
    fn update_notifies_observers_in_order() {
        let (mut comp, id) = comp_with(4, 4);
        let sink = CountingSink::default();
        let updates = sink.updates.clone();
        comp.add_observer(Box::new(sink));

        comp.update(id, PixelRect::new(1, 1, 2, 2));
        assert_eq!(updates.borrow().as_slice(), &[(id, PixelRect::new(1, 1, 2, 2))]);
    }

    #[test]
    fn fs_update_forwards_to_host_clipped() {
        let mut comp = Composition::new();
        let host = comp.create_drawable(10, 10, PixelFormat::RGBA8, 0, 0);
        let fs = comp.create_drawable(6, 6, PixelFormat::RGBA8, 8, 0);
        comp.attach_floating_sel(host, fs);

        let sink = CountingSink::default();
        let updates = sink.updates.clone();
        comp.add_observer(Box::new(sink));

        comp.update(fs, PixelRect::from_size(6, 6));

        let events = updates.borrow();
        // One update for the overlay itself, one forwarded to the host,
        // clipped to the overlap and translated into host coordinates.
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], (fs, PixelRect::from_size(6, 6)));
        assert_eq!(events[1], (host, PixelRect::new(8, 0, 2, 6)));
    }

    #[test]
    fn shadow_is_created_on_demand_and_freed() {
        let (mut comp, id) = comp_with(4, 4);
        {
            let shadow = comp.shadow_mut(id);
            assert_eq!(shadow.rect(), PixelRect::from_size(4, 4));
        }
        comp.free_shadow(id);
        assert!(comp.drawable(id).shadow.is_none());
    }
}
