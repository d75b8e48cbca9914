// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for graphics devices.
//!
//! A *device* owns the live connection to the graphics API and every
//! resource allocated against it. `resurface_core` never issues draw calls
//! itself; it drives a [`Device`] implementation and keeps CPU-side
//! bookkeeping next to each device image.
//!
//! # Pixel buffers
//!
//! Every pixel buffer crossing this boundary is row-major,
//! alpha-premultiplied RGBA, 4 bytes per pixel, and covers the whole
//! *allocation* returned by [`Device::allocation_size`], not just the
//! logical width and height. Handing over or returning a buffer of any other
//! length is a contract violation and panics in the core.
//!
//! # Context loss
//!
//! Devices report loss per image through [`Device::is_invalidated`]. Once an
//! image is invalidated its content is gone; the caller rebuilds everything
//! with [`ImageSet::restore`](crate::set::ImageSet::restore).

use alloc::vec::Vec;
use core::fmt;

use crate::color::Rgba;

/// A graphics device that allocates, draws into, and reads back images.
///
/// Only one thread may use a device at a time. The `threading` module
/// (`std` feature) marshals work onto the device thread from elsewhere.
pub trait Device {
    /// A device-resident image (texture plus whatever is needed to render
    /// into it). Exclusively owned by one restorable image.
    type Image;

    /// Geometry for a composite operation, stored and replayed verbatim.
    type Geometry: Clone + fmt::Debug;

    /// Affine color transform applied while compositing, stored and
    /// replayed verbatim.
    type ColorTransform: Clone + fmt::Debug;

    /// How source and destination pixels combine.
    type CompositeMode: Copy + fmt::Debug;

    /// How an image is sampled when it is the source of a composite.
    ///
    /// Chosen at allocation and kept across restores. Screens use the
    /// default.
    type Filter: Copy + Default + fmt::Debug;

    /// Failure reported by allocation, upload, draw, or read-back.
    type Error: fmt::Debug;

    /// Returns the allocation size backing a `width` x `height` image.
    ///
    /// Must be deterministic. All pixel buffers are sized against this. The
    /// default rounds each axis up to the next power of two, saturating at
    /// `u32::MAX` for axes above `2^31`; [`new_image`](Self::new_image) must
    /// reject sizes whose allocation it cannot back.
    fn allocation_size(&self, width: u32, height: u32) -> (u32, u32) {
        (
            next_power_of_two_saturating(width),
            next_power_of_two_saturating(height),
        )
    }

    /// Allocates a new, fully transparent image sampled with `filter`.
    fn new_image(
        &mut self,
        width: u32,
        height: u32,
        filter: Self::Filter,
    ) -> Result<Self::Image, Self::Error>;

    /// Acquires the presentation surface at the given logical size.
    fn new_screen_framebuffer_image(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Self::Image, Self::Error>;

    /// Fills the whole allocation of `image` with `color`.
    fn fill(&mut self, image: &mut Self::Image, color: Rgba) -> Result<(), Self::Error>;

    /// Uploads `pixels` over the whole allocation of `image`.
    fn replace_pixels(&mut self, image: &mut Self::Image, pixels: &[u8])
    -> Result<(), Self::Error>;

    /// Composites `src` into `dst`.
    fn draw_image(
        &mut self,
        dst: &mut Self::Image,
        src: &Self::Image,
        geometry: &Self::Geometry,
        color_transform: &Self::ColorTransform,
        mode: Self::CompositeMode,
    ) -> Result<(), Self::Error>;

    /// Reads the whole allocation of `image` back into CPU memory.
    ///
    /// This blocks on the device and is expensive.
    fn read_pixels(&mut self, image: &Self::Image) -> Result<Vec<u8>, Self::Error>;

    /// Releases `image`.
    fn dispose(&mut self, image: Self::Image);

    /// Returns whether `image` was lost together with its context.
    fn is_invalidated(&self, image: &Self::Image) -> bool;
}

/// Returns the byte length of a pixel buffer covering a `width` x `height`
/// allocation.
#[inline]
#[must_use]
pub const fn pixel_buffer_len(width: u32, height: u32) -> usize {
    4 * width as usize * height as usize
}

/// Rounds `v` up to a power of two, saturating at `u32::MAX`.
#[inline]
#[must_use]
pub const fn next_power_of_two_saturating(v: u32) -> u32 {
    match v.checked_next_power_of_two() {
        Some(p) => p,
        None => u32::MAX,
    }
}
