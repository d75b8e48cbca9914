// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The CPU device: images are byte buffers, context loss is a generation
//! bump.

use core::fmt;

use resurface_core::color::Rgba;
use resurface_core::device::{Device, pixel_buffer_len};

use crate::color::ColorMatrix;
use crate::composite::CompositeMode;
use crate::config::SoftDeviceConfig;
use crate::geometry::Vertices;
use crate::raster::Filter;

/// A device operation that [`SoftDevice::fail_next`] can make fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// Image or screen allocation.
    Allocate,
    /// Pixel upload.
    Upload,
    /// Pixel read-back.
    ReadBack,
    /// Composite.
    Draw,
}

/// Errors reported by [`SoftDevice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoftError {
    /// An image from a lost context was used.
    ContextLost,
    /// The rounded allocation exceeds the configured maximum, or rounding
    /// itself overflowed.
    TooLarge {
        /// Rounded allocation width, or the requested width on overflow.
        width: u32,
        /// Rounded allocation height, or the requested height on overflow.
        height: u32,
        /// Configured maximum edge length.
        max: u32,
    },
    /// A failure requested with [`SoftDevice::fail_next`].
    Injected(FailPoint),
}

impl fmt::Display for SoftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContextLost => f.write_str("image belongs to a lost context"),
            Self::TooLarge { width, height, max } => {
                write!(f, "{width}x{height} allocation exceeds the maximum edge {max}")
            }
            Self::Injected(point) => write!(f, "injected {point:?} failure"),
        }
    }
}

impl core::error::Error for SoftError {}

/// An image allocated by a [`SoftDevice`].
pub struct SoftImage {
    generation: u32,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    filter: Filter,
    screen: bool,
}

impl fmt::Debug for SoftImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftImage")
            .field("generation", &self.generation)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("filter", &self.filter)
            .field("screen", &self.screen)
            .finish_non_exhaustive()
    }
}

impl SoftImage {
    /// Returns the context generation this image was allocated in.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Returns the allocation size.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns how this image is sampled when drawn from.
    #[must_use]
    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Returns whether this image stands for the presentation surface.
    #[must_use]
    pub fn is_screen(&self) -> bool {
        self.screen
    }

    pub(crate) fn texels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub(crate) fn texels_mut(&mut self) -> &mut [[u8; 4]] {
        bytemuck::cast_slice_mut(&mut self.pixels)
    }
}

/// Operation counters, for asserting how much device work happened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SoftStats {
    /// Successful allocations, screens included.
    pub allocations: u64,
    /// Successful uploads.
    pub uploads: u64,
    /// Successful composites.
    pub draws: u64,
    /// Successful read-backs.
    pub read_backs: u64,
    /// Disposed images.
    pub disposals: u64,
}

/// A deterministic CPU implementation of [`Device`].
#[derive(Debug)]
pub struct SoftDevice {
    config: SoftDeviceConfig,
    generation: u32,
    fail_next: Option<FailPoint>,
    stats: SoftStats,
}

impl Default for SoftDevice {
    fn default() -> Self {
        Self::new(SoftDeviceConfig::default())
    }
}

impl SoftDevice {
    /// Creates a device with the given configuration.
    #[must_use]
    pub fn new(config: SoftDeviceConfig) -> Self {
        Self {
            config,
            generation: 0,
            fail_next: None,
            stats: SoftStats::default(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SoftDeviceConfig {
        &self.config
    }

    /// Returns the current context generation.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Simulates context loss: every image allocated so far is invalidated.
    pub fn lose_context(&mut self) {
        self.generation += 1;
    }

    /// Makes the next operation of the given kind fail with
    /// [`SoftError::Injected`].
    pub fn fail_next(&mut self, point: FailPoint) {
        self.fail_next = Some(point);
    }

    /// Returns the operation counters.
    #[must_use]
    pub fn stats(&self) -> SoftStats {
        self.stats
    }

    fn check(&mut self, point: FailPoint) -> Result<(), SoftError> {
        if self.fail_next == Some(point) {
            self.fail_next = None;
            return Err(SoftError::Injected(point));
        }
        Ok(())
    }

    fn check_live(&self, image: &SoftImage) -> Result<(), SoftError> {
        if image.generation == self.generation {
            Ok(())
        } else {
            Err(SoftError::ContextLost)
        }
    }

    fn alloc(
        &mut self,
        width: u32,
        height: u32,
        filter: Filter,
        screen: bool,
    ) -> Result<SoftImage, SoftError> {
        self.check(FailPoint::Allocate)?;
        let max = self.config.max_texture_size;
        let (w2, h2) = match self.config.allocation_size(width, height) {
            Some((w2, h2)) if w2 <= max && h2 <= max => (w2, h2),
            rounded => {
                let (width, height) = rounded.unwrap_or((width, height));
                return Err(SoftError::TooLarge { width, height, max });
            }
        };
        self.stats.allocations += 1;
        Ok(SoftImage {
            generation: self.generation,
            width: w2,
            height: h2,
            pixels: vec![0; pixel_buffer_len(w2, h2)],
            filter,
            screen,
        })
    }
}

impl Device for SoftDevice {
    type Image = SoftImage;
    type Geometry = Vertices;
    type ColorTransform = ColorMatrix;
    type CompositeMode = CompositeMode;
    type Filter = Filter;
    type Error = SoftError;

    fn allocation_size(&self, width: u32, height: u32) -> (u32, u32) {
        // Overflowing sizes never back an image; `alloc` rejects them.
        self.config
            .allocation_size(width, height)
            .unwrap_or((u32::MAX, u32::MAX))
    }

    fn new_image(
        &mut self,
        width: u32,
        height: u32,
        filter: Filter,
    ) -> Result<SoftImage, SoftError> {
        self.alloc(width, height, filter, false)
    }

    fn new_screen_framebuffer_image(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<SoftImage, SoftError> {
        self.alloc(width, height, Filter::default(), true)
    }

    fn fill(&mut self, image: &mut SoftImage, color: Rgba) -> Result<(), SoftError> {
        self.check_live(image)?;
        image.texels_mut().fill(color.to_bytes());
        Ok(())
    }

    fn replace_pixels(&mut self, image: &mut SoftImage, pixels: &[u8]) -> Result<(), SoftError> {
        self.check_live(image)?;
        assert_eq!(
            pixels.len(),
            image.pixels.len(),
            "upload must cover the {}x{} allocation",
            image.width,
            image.height
        );
        self.check(FailPoint::Upload)?;
        image.pixels.copy_from_slice(pixels);
        self.stats.uploads += 1;
        Ok(())
    }

    fn draw_image(
        &mut self,
        dst: &mut SoftImage,
        src: &SoftImage,
        geometry: &Vertices,
        color_transform: &ColorMatrix,
        mode: CompositeMode,
    ) -> Result<(), SoftError> {
        self.check_live(dst)?;
        self.check_live(src)?;
        self.check(FailPoint::Draw)?;
        crate::raster::draw(dst, src, geometry, color_transform, mode);
        self.stats.draws += 1;
        Ok(())
    }

    fn read_pixels(&mut self, image: &SoftImage) -> Result<Vec<u8>, SoftError> {
        self.check_live(image)?;
        self.check(FailPoint::ReadBack)?;
        self.stats.read_backs += 1;
        Ok(image.pixels.clone())
    }

    fn dispose(&mut self, image: SoftImage) {
        self.stats.disposals += 1;
        drop(image);
    }

    fn is_invalidated(&self, image: &SoftImage) -> bool {
        image.generation != self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    const RED: Rgba = Rgba::new(255, 0, 0, 255);

    fn full_quad(w: f64, h: f64) -> Vertices {
        Vertices::quad(Rect::new(0.0, 0.0, w, h), Rect::new(0.0, 0.0, w, h))
    }

    #[test]
    fn new_images_are_transparent_and_rounded() {
        let mut device = SoftDevice::default();
        let image = device.new_image(3, 5, Filter::Nearest).unwrap();
        assert_eq!(image.size(), (4, 8));
        assert!(device.read_pixels(&image).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn too_large_allocation_fails() {
        let mut device = SoftDevice::default();
        let err = device.new_image(4097, 1, Filter::Nearest).unwrap_err();
        assert_eq!(
            err,
            SoftError::TooLarge {
                width: 8192,
                height: 1,
                max: 4096
            }
        );
        assert_eq!(device.stats().allocations, 0);
    }

    #[test]
    fn overflowing_rounding_is_too_large() {
        let mut device = SoftDevice::default();
        let err = device
            .new_image(0x8000_0001, 1, Filter::Nearest)
            .unwrap_err();
        assert_eq!(
            err,
            SoftError::TooLarge {
                width: 0x8000_0001,
                height: 1,
                max: 4096
            }
        );
        assert_eq!(device.allocation_size(0x8000_0001, 1), (u32::MAX, u32::MAX));
        assert_eq!(device.stats().allocations, 0);
    }

    #[test]
    fn images_keep_their_filter() {
        let mut device = SoftDevice::default();
        let linear = device.new_image(2, 2, Filter::Linear).unwrap();
        let screen = device.new_screen_framebuffer_image(2, 2).unwrap();
        assert_eq!(linear.filter(), Filter::Linear);
        assert_eq!(screen.filter(), Filter::Nearest);
    }

    #[test]
    fn lost_images_refuse_work() {
        let mut device = SoftDevice::default();
        let mut a = device.new_image(2, 2, Filter::Nearest).unwrap();
        let b = device.new_image(2, 2, Filter::Nearest).unwrap();
        device.lose_context();
        assert!(device.is_invalidated(&a));
        assert_eq!(device.read_pixels(&a), Err(SoftError::ContextLost));
        assert_eq!(device.fill(&mut a, RED), Err(SoftError::ContextLost));

        let mut fresh = device.new_image(2, 2, Filter::Nearest).unwrap();
        assert!(!device.is_invalidated(&fresh));
        let err = device
            .draw_image(&mut fresh, &b, &full_quad(2.0, 2.0), &ColorMatrix::IDENTITY, CompositeMode::Copy)
            .unwrap_err();
        assert_eq!(err, SoftError::ContextLost);
    }

    #[test]
    fn injected_failure_fires_once() {
        let mut device = SoftDevice::default();
        let image = device.new_image(1, 1, Filter::Nearest).unwrap();
        device.fail_next(FailPoint::ReadBack);
        assert_eq!(
            device.read_pixels(&image),
            Err(SoftError::Injected(FailPoint::ReadBack))
        );
        assert!(device.read_pixels(&image).is_ok());
        assert_eq!(device.stats().read_backs, 1);
    }

    #[test]
    fn fill_then_draw() {
        let mut device = SoftDevice::new(SoftDeviceConfig::exact());
        let mut src = device.new_image(2, 2, Filter::Nearest).unwrap();
        let mut dst = device.new_image(2, 2, Filter::Nearest).unwrap();
        device.fill(&mut src, RED).unwrap();
        device
            .draw_image(&mut dst, &src, &full_quad(2.0, 2.0), &ColorMatrix::IDENTITY, CompositeMode::SourceOver)
            .unwrap();
        let pixels = device.read_pixels(&dst).unwrap();
        assert_eq!(pixels, RED.to_bytes().repeat(4));
        assert_eq!(device.stats().draws, 1);
    }

    #[test]
    #[should_panic(expected = "upload must cover the 2x2 allocation")]
    fn short_upload_panics() {
        let mut device = SoftDevice::default();
        let mut image = device.new_image(2, 2, Filter::Nearest).unwrap();
        let _ = device.replace_pixels(&mut image, &[0; 4]);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            SoftError::ContextLost.to_string(),
            "image belongs to a lost context"
        );
        assert_eq!(
            SoftError::Injected(FailPoint::Draw).to_string(),
            "injected Draw failure"
        );
    }
}
