// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Restore pass after context loss.
//!
//! Restoring follows a build-drain-replay pattern:
//!
//! 1. **Build**: A fresh [`DirtyTracker`] gets one edge per distinct
//!    history source of each live image on the
//!    [`HISTORY`](crate::dirty::HISTORY) channel, and every live image is
//!    marked.
//! 2. **Drain**: Draining the channel yields all live images with each
//!    source ahead of the images drawing from it.
//! 3. **Replay**: Each image is taken out of its slot, rebuilt by
//!    [`RestorableImage::restore`] against the already-restored sources still
//!    in the table, and put back.
//!
//! The order is recomputed on every pass rather than maintained
//! incrementally; restores are rare and histories are short.

use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker};

use crate::device::Device;
use crate::dirty;
use crate::image::RestorableImage;
use crate::trace::{ImageRestoredEvent, RestoreBeginEvent, RestoreEndEvent, Tracer};

use super::id::ImageId;
use super::store::ImageSet;

impl<D: Device> ImageSet<D> {
    /// Rebuilds every live image after context loss.
    ///
    /// Screen and volatile images are reallocated empty; every other image
    /// is rebuilt from its base and history, sources first. On a device
    /// failure the pass stops and the error is returned; images restored so
    /// far keep their new device images.
    ///
    /// # Panics
    ///
    /// Panics if any non-volatile image is stale. Call
    /// [`resolve_stale_images`](Self::resolve_stale_images) at the end of
    /// every frame so that a context loss never finds one.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "image counts and slot indices fit the u32 handle space"
    )]
    pub fn restore(&mut self, device: &mut D, tracer: &mut Tracer<'_>) -> Result<(), D::Error> {
        let pass = self.restore_passes;
        self.restore_passes += 1;

        let order = self.restore_order();
        tracer.restore_begin(&RestoreBeginEvent {
            pass,
            images: order.len() as u32,
        });

        let mut restored = 0_u32;
        for (position, &id) in order.iter().enumerate() {
            let idx = id.idx as usize;
            let Some(mut image) = self.slots[idx].take() else {
                continue;
            };
            let result = image.restore(device, |source| self.restored_source(source));
            self.slots[idx] = Some(image);
            let kind = result?;

            restored += 1;
            tracer.image_restored(&ImageRestoredEvent {
                pass,
                image: id,
                position: position as u32,
                kind,
            });
        }

        tracer.restore_end(&RestoreEndEvent { pass, restored });
        Ok(())
    }

    /// Returns all live images with every history source ahead of the images
    /// that draw from it.
    ///
    /// # Panics
    ///
    /// Panics if the order misses an image or puts an image ahead of one of
    /// its sources. Histories never form a cycle, since drawing into an image
    /// invalidates the images that drew from it, so neither happens.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "image counts and slot indices fit the u32 handle space"
    )]
    #[must_use]
    pub fn restore_order(&self) -> Vec<ImageId> {
        let mut tracker: DirtyTracker<u32> =
            DirtyTracker::with_cycle_handling(CycleHandling::Error);
        let mut sources: Vec<ImageId> = Vec::new();

        for (idx, slot) in self.slots.iter().enumerate() {
            let Some(image) = slot else {
                continue;
            };
            let idx = idx as u32;

            sources.clear();
            for record in image.history() {
                if sources.contains(&record.source) {
                    continue;
                }
                sources.push(record.source);
                // Edge: this image depends on the source it drew from.
                let _ = tracker.add_dependency(idx, record.source.idx, dirty::HISTORY);
            }
            tracker.mark(idx, dirty::HISTORY);
        }

        let order: Vec<ImageId> = tracker
            .drain(dirty::HISTORY)
            .affected()
            .deterministic()
            .run()
            .filter(|&idx| self.slots.get(idx as usize).is_some_and(Option::is_some))
            .map(|idx| self.id_at(idx as usize))
            .collect();
        self.check_order(&order);
        order
    }

    /// Asserts that `order` visits every live image once, sources first.
    fn check_order(&self, order: &[ImageId]) {
        let mut placed = alloc::vec![false; self.slots.len()];
        for &id in order {
            for record in self.slot(id).history() {
                assert!(
                    placed[record.source.idx as usize],
                    "{id:?} draws from {:?}, which is not restored before it",
                    record.source
                );
            }
            placed[id.idx as usize] = true;
        }
        assert_eq!(
            order.len(),
            self.len(),
            "restore order must visit every live image"
        );
    }

    /// Looks up a history source during a restore pass.
    ///
    /// Sources are addressed by handles recorded before the context was lost;
    /// a generation mismatch means the source was disposed without its
    /// dependents being invalidated.
    fn restored_source(&self, id: ImageId) -> Option<&RestorableImage<D>> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots[id.idx as usize].as_ref()
    }
}
