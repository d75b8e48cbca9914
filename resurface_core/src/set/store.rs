// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot storage for restorable images, with allocation, mutation, and
//! dependency invalidation.

use alloc::vec::Vec;
use core::fmt;

use crate::color::Rgba;
use crate::device::Device;
use crate::image::RestorableImage;
use crate::trace::{StaleResolvedEvent, Tracer};

use super::id::ImageId;

/// Storage for all live restorable images.
///
/// Images are addressed by [`ImageId`] handles. Disposed images are recycled
/// via a free list, and generation counters prevent stale handle access.
///
/// Every mutator forwards to the corresponding [`RestorableImage`] method
/// and, once the device accepted the change, invalidates the images whose
/// history draws from the changed image. A failed device call leaves every
/// image as it was.
pub struct ImageSet<D: Device> {
    pub(crate) slots: Vec<Option<RestorableImage<D>>>,
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) restore_passes: u64,
}

impl<D: Device> fmt::Debug for ImageSet<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSet")
            .field("live", &self.len())
            .field("free", &self.free_list.len())
            .field("restore_passes", &self.restore_passes)
            .finish_non_exhaustive()
    }
}

impl<D: Device> Default for ImageSet<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Device> ImageSet<D> {
    /// Creates an empty image set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            restore_passes: 0,
        }
    }

    // -- Allocation API --

    /// Allocates an empty image with the device's default filter.
    ///
    /// See [`RestorableImage::new`].
    pub fn create_image(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
        volatile: bool,
    ) -> Result<ImageId, D::Error> {
        self.create_image_with_filter(device, width, height, D::Filter::default(), volatile)
    }

    /// Allocates an empty image sampled with `filter`.
    pub fn create_image_with_filter(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
        filter: D::Filter,
        volatile: bool,
    ) -> Result<ImageId, D::Error> {
        let image = RestorableImage::new(device, width, height, filter, volatile)?;
        Ok(self.insert(image))
    }

    /// Allocates an image from tightly packed RGBA pixels.
    ///
    /// See [`RestorableImage::from_pixels`].
    pub fn create_image_from_pixels(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
        pixels: &[u8],
        filter: D::Filter,
    ) -> Result<ImageId, D::Error> {
        let image = RestorableImage::from_pixels(device, width, height, pixels, filter)?;
        Ok(self.insert(image))
    }

    /// Acquires the presentation surface.
    pub fn create_screen(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
    ) -> Result<ImageId, D::Error> {
        let image = RestorableImage::new_screen(device, width, height)?;
        Ok(self.insert(image))
    }

    /// Disposes an image, releasing its device resource and freeing its slot.
    ///
    /// Images drawing from it become stale first.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn dispose(&mut self, device: &mut D, id: ImageId) {
        self.validate(id);
        self.make_stale_if_depending_on(id);
        let idx = id.idx as usize;
        if let Some(mut image) = self.slots[idx].take() {
            image.dispose(device);
        }

        // Bump generation so old handles immediately fail validation.
        self.generation[idx] += 1;
        self.free_list.push(id.idx);
    }

    /// Returns whether the given handle refers to a live image.
    #[must_use]
    pub fn is_alive(&self, id: ImageId) -> bool {
        let idx = id.idx as usize;
        idx < self.slots.len() && self.generation[idx] == id.generation && self.slots[idx].is_some()
    }

    /// Returns the image behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn get(&self, id: ImageId) -> &RestorableImage<D> {
        self.validate(id);
        self.slot(id)
    }

    /// Returns the number of live images.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns whether no image is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the handles of all live images in slot order.
    pub fn ids(&self) -> impl Iterator<Item = ImageId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(idx, _)| self.id_at(idx))
    }

    // -- Mutation API (invalidates dependents on success) --

    /// Fills an image with a solid color.
    pub fn fill(&mut self, device: &mut D, id: ImageId, color: Rgba) -> Result<(), D::Error> {
        self.validate(id);
        self.slot_mut(id).fill(device, color)?;
        self.make_stale_if_depending_on(id);
        Ok(())
    }

    /// Replaces the whole allocation of an image.
    ///
    /// `pixels` must cover the rounded allocation, see
    /// [`RestorableImage::replace_pixels`].
    pub fn replace_pixels(
        &mut self,
        device: &mut D,
        id: ImageId,
        pixels: Vec<u8>,
    ) -> Result<(), D::Error> {
        self.validate(id);
        self.slot_mut(id).replace_pixels(device, pixels)?;
        self.make_stale_if_depending_on(id);
        Ok(())
    }

    /// Composites `src` into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or if `dst == src`.
    pub fn draw_image(
        &mut self,
        device: &mut D,
        dst: ImageId,
        src: ImageId,
        geometry: D::Geometry,
        color_transform: D::ColorTransform,
        mode: D::CompositeMode,
    ) -> Result<(), D::Error> {
        assert_ne!(dst, src, "cannot draw an image into itself");
        self.validate(dst);
        self.validate(src);

        let idx = dst.idx as usize;
        let Some(mut target) = self.slots[idx].take() else {
            unreachable!("validated above");
        };
        let result = target.draw_image(
            device,
            src,
            self.slot(src),
            geometry,
            color_transform,
            mode,
        );
        self.slots[idx] = Some(target);
        result?;
        self.make_stale_if_depending_on(dst);
        Ok(())
    }

    /// Clears every volatile image. Call once per frame boundary.
    pub fn clear_volatile_images(&mut self, device: &mut D) -> Result<(), D::Error> {
        for image in self.slots.iter_mut().flatten() {
            image.clear_if_volatile(device)?;
        }
        Ok(())
    }

    /// Marks every image whose history draws from `target` stale.
    ///
    /// The set's own mutators call this. Collaborators that change an image's
    /// device content by other means must call it themselves.
    pub fn make_stale_if_depending_on(&mut self, target: ImageId) {
        for image in self.slots.iter_mut().flatten() {
            image.make_stale_if_depending_on(target);
        }
    }

    // -- Resolution --

    /// Returns the color at `(x, y)` of an image, reading the device back if
    /// needed. See [`RestorableImage::pixel_at`].
    pub fn pixel_at(&mut self, device: &mut D, id: ImageId, x: i32, y: i32) -> Result<Rgba, D::Error> {
        self.validate(id);
        self.slot_mut(id).pixel_at(device, x, y)
    }

    /// Reads back every stale, non-volatile image.
    ///
    /// Call at the end of each frame: [`restore`](Self::restore) refuses to
    /// run while any image is stale.
    pub fn resolve_stale_images(
        &mut self,
        device: &mut D,
        tracer: &mut Tracer<'_>,
    ) -> Result<(), D::Error> {
        for idx in 0..self.slots.len() {
            let Some(image) = self.slots[idx].as_mut() else {
                continue;
            };
            if image.resolve_if_stale(device)? {
                let (w2, h2) = image.allocation_size();
                tracer.stale_resolved(&StaleResolvedEvent {
                    image: self.id_at(idx),
                    bytes: 4 * u64::from(w2) * u64::from(h2),
                });
            }
        }
        Ok(())
    }

    /// Returns whether any live image lost its device resource.
    #[must_use]
    pub fn is_invalidated(&self, device: &D) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|image| image.is_invalidated(device))
    }

    // -- Internal helpers --

    #[expect(
        clippy::cast_possible_truncation,
        reason = "slot indices fit the u32 handle space"
    )]
    fn insert(&mut self, image: RestorableImage<D>) -> ImageId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot; its generation was bumped on dispose.
            self.slots[idx as usize] = Some(image);
            idx
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Some(image));
            self.generation.push(0);
            idx
        };
        ImageId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "slot indices fit the u32 handle space"
    )]
    pub(crate) fn id_at(&self, idx: usize) -> ImageId {
        ImageId {
            idx: idx as u32,
            generation: self.generation[idx],
        }
    }

    /// Returns the live image for a validated handle.
    pub(crate) fn slot(&self, id: ImageId) -> &RestorableImage<D> {
        let Some(image) = self.slots[id.idx as usize].as_ref() else {
            panic!("{id:?} is not in its slot");
        };
        image
    }

    fn slot_mut(&mut self, id: ImageId) -> &mut RestorableImage<D> {
        let Some(image) = self.slots[id.idx as usize].as_mut() else {
            panic!("{id:?} is not in its slot");
        };
        image
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: ImageId) {
        assert!(
            self.is_alive(id),
            "stale ImageId: {id:?} (current gen: {})",
            self.generation
                .get(id.idx as usize)
                .copied()
                .unwrap_or(u32::MAX)
        );
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::testing::{Op, TestDevice, TestError};

    const RED: Rgba = Rgba::new(0xff, 0, 0, 0xff);
    const BLUE: Rgba = Rgba::new(0, 0, 0xff, 0xff);

    #[test]
    fn create_and_dispose() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let id = set.create_image(&mut device, 4, 4, false).unwrap();
        assert!(set.is_alive(id));
        assert_eq!(set.len(), 1);
        set.dispose(&mut device, id);
        assert!(!set.is_alive(id));
        assert!(set.is_empty());
        assert_eq!(device.disposed, 1);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let id1 = set.create_image(&mut device, 4, 4, false).unwrap();
        set.dispose(&mut device, id1);
        let id2 = set.create_image(&mut device, 4, 4, false).unwrap();
        // id2 reuses the same slot but has a different generation.
        assert!(!set.is_alive(id1));
        assert!(set.is_alive(id2));
        assert_eq!(id1.index(), id2.index());
        assert_ne!(id1.generation(), id2.generation());
    }

    #[test]
    #[should_panic(expected = "stale ImageId")]
    fn disposed_handle_panics_on_fill() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let id = set.create_image(&mut device, 4, 4, false).unwrap();
        set.dispose(&mut device, id);
        let _ = set.fill(&mut device, id, RED);
    }

    #[test]
    #[should_panic(expected = "cannot draw an image into itself")]
    fn self_draw_panics() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let id = set.create_image(&mut device, 4, 4, false).unwrap();
        let _ = set.draw_image(&mut device, id, id, (0, 0), (), ());
    }

    #[test]
    fn draw_records_history_against_source() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let a = set.create_image(&mut device, 4, 4, false).unwrap();
        let b = set.create_image(&mut device, 4, 4, false).unwrap();
        set.fill(&mut device, a, RED).unwrap();
        set.draw_image(&mut device, b, a, (0, 0), (), ()).unwrap();

        let history = set.get(b).history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].source, a);
        assert!(set.get(b).has_dependency());
    }

    #[test]
    fn mutating_a_source_makes_dependents_stale() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let a = set.create_image(&mut device, 4, 4, false).unwrap();
        let b = set.create_image(&mut device, 4, 4, false).unwrap();
        let c = set.create_image(&mut device, 4, 4, false).unwrap();
        set.fill(&mut device, a, RED).unwrap();
        set.draw_image(&mut device, b, a, (0, 0), (), ()).unwrap();
        set.draw_image(&mut device, c, b, (0, 0), (), ()).unwrap();

        set.fill(&mut device, a, BLUE).unwrap();
        assert!(set.get(b).is_stale());
        assert!(set.get(b).history().is_empty());
        // c draws from b, whose content did not change.
        assert!(!set.get(c).is_stale());
    }

    #[test]
    fn drawing_into_a_source_makes_dependents_stale() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let a = set.create_image(&mut device, 4, 4, false).unwrap();
        let b = set.create_image(&mut device, 4, 4, false).unwrap();
        let c = set.create_image(&mut device, 4, 4, false).unwrap();
        set.fill(&mut device, a, RED).unwrap();
        set.draw_image(&mut device, b, a, (0, 0), (), ()).unwrap();
        set.draw_image(&mut device, a, c, (0, 0), (), ()).unwrap();
        assert!(set.get(b).is_stale());
        assert!(!set.get(a).is_stale());
    }

    #[test]
    fn disposing_a_source_makes_dependents_stale() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let a = set.create_image(&mut device, 4, 4, false).unwrap();
        let b = set.create_image(&mut device, 4, 4, false).unwrap();
        set.fill(&mut device, a, RED).unwrap();
        set.draw_image(&mut device, b, a, (0, 0), (), ()).unwrap();
        set.dispose(&mut device, a);
        assert!(set.get(b).is_stale());
        assert!(set.get(b).history().is_empty());
    }

    #[test]
    fn resolve_stale_images_clears_staleness() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let a = set.create_image(&mut device, 4, 4, false).unwrap();
        let b = set.create_image(&mut device, 4, 4, false).unwrap();
        let v = set.create_image(&mut device, 4, 4, true).unwrap();
        set.fill(&mut device, a, RED).unwrap();
        set.draw_image(&mut device, b, v, (0, 0), (), ()).unwrap();
        set.draw_image(&mut device, v, a, (0, 0), (), ()).unwrap();
        assert!(set.get(b).is_stale());

        set.resolve_stale_images(&mut device, &mut Tracer::none())
            .unwrap();
        assert!(!set.get(b).is_stale());
        assert!(set.get(b).base_pixels().is_some());
        assert_eq!(device.reads, 1);
    }

    #[test]
    fn clear_volatile_images_skips_regular_images() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let a = set.create_image(&mut device, 2, 2, false).unwrap();
        let v = set.create_image(&mut device, 2, 2, true).unwrap();
        set.fill(&mut device, a, RED).unwrap();
        set.fill(&mut device, v, RED).unwrap();

        set.clear_volatile_images(&mut device).unwrap();
        assert_eq!(set.get(a).base_color(), Some(RED));
        assert_eq!(set.get(v).base_color(), None);
        assert_eq!(set.pixel_at(&mut device, v, 0, 0).unwrap(), Rgba::TRANSPARENT);
        assert_eq!(set.pixel_at(&mut device, a, 1, 1).unwrap(), RED);
    }

    #[test]
    fn failed_upload_propagates() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let a = set
            .create_image_from_pixels(&mut device, 1, 1, &[1, 2, 3, 4], ())
            .unwrap();
        device.fail_next(Op::Upload);
        let err = set.replace_pixels(&mut device, a, vec![9; 4]).unwrap_err();
        assert_eq!(err, TestError::Injected);
        assert_eq!(set.get(a).base_pixels(), Some(&[1, 2, 3, 4][..]));
    }

    #[test]
    fn failed_mutation_keeps_dependents_fresh() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let a = set.create_image(&mut device, 4, 4, false).unwrap();
        let b = set.create_image(&mut device, 4, 4, false).unwrap();
        let c = set.create_image(&mut device, 4, 4, false).unwrap();
        set.fill(&mut device, a, RED).unwrap();
        set.draw_image(&mut device, b, a, (0, 0), (), ()).unwrap();

        device.fail_next(Op::Upload);
        let err = set.replace_pixels(&mut device, a, vec![0; 64]).unwrap_err();
        assert_eq!(err, TestError::Injected);
        assert!(!set.get(b).is_stale());

        device.fail_next(Op::Draw);
        let err = set.draw_image(&mut device, a, c, (0, 0), (), ()).unwrap_err();
        assert_eq!(err, TestError::Injected);
        assert!(!set.get(b).is_stale());
        assert_eq!(set.get(b).history().len(), 1);
        assert_eq!(set.get(a).base_color(), Some(RED));
    }

    #[test]
    fn drawing_from_a_dependent_invalidates_it() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let a = set.create_image(&mut device, 4, 4, false).unwrap();
        let b = set.create_image(&mut device, 4, 4, false).unwrap();
        set.fill(&mut device, a, RED).unwrap();
        set.fill(&mut device, b, BLUE).unwrap();
        set.draw_image(&mut device, b, a, (0, 0), (), ()).unwrap();
        set.draw_image(&mut device, a, b, (0, 0), (), ()).unwrap();

        // a now draws from b, and b no longer replays from a.
        assert_eq!(set.get(a).history().len(), 1);
        assert!(set.get(b).is_stale());
        assert!(set.get(b).history().is_empty());

        set.resolve_stale_images(&mut device, &mut Tracer::none())
            .unwrap();
        device.lose_context();
        set.restore(&mut device, &mut Tracer::none()).unwrap();
        assert_eq!(set.pixel_at(&mut device, a, 3, 3).unwrap(), RED);
        assert_eq!(set.pixel_at(&mut device, b, 3, 3).unwrap(), RED);
    }

    #[test]
    fn is_invalidated_after_context_loss() {
        let mut device = TestDevice::new();
        let mut set = ImageSet::new();
        let _ = set.create_image(&mut device, 2, 2, false).unwrap();
        assert!(!set.is_invalidated(&device));
        device.lose_context();
        assert!(set.is_invalidated(&device));
    }
}
