// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single image that can be rebuilt after context loss.
//!
//! Each [`RestorableImage`] keeps, next to its device image, a CPU-resident
//! description of its current content:
//!
//! - a **base**: either a full pixel snapshot or a solid fill color (never
//!   both), or nothing for a freshly allocated transparent image;
//! - a **history**: the composites drawn on top of the base since, in order,
//!   each referencing its source by [`ImageId`].
//!
//! When neither describes the content reliably the image is **stale** and
//! the device image is the only truth. Staleness is cleared by reading the
//! device back ([`resolve_if_stale`](RestorableImage::resolve_if_stale)),
//! which must happen before a context is lost.
//!
//! Images never touch each other directly. Cross-image effects go through
//! [`make_stale_if_depending_on`](RestorableImage::make_stale_if_depending_on),
//! called by the [`ImageSet`](crate::set::ImageSet) that knows every live
//! image.

use alloc::vec::Vec;
use core::fmt;

use crate::color::Rgba;
use crate::device::{Device, pixel_buffer_len};
use crate::set::ImageId;

/// Known-good content to rebuild from. Pixels and color are exclusive.
#[derive(Clone, Default, PartialEq, Eq)]
enum Base {
    #[default]
    Empty,
    Pixels(Vec<u8>),
    Color(Rgba),
}

/// One recorded composite: `source` drawn into the owning image.
pub struct DrawRecord<D: Device> {
    /// The image drawn from. Non-owning; validity is maintained by the
    /// [`ImageSet`](crate::set::ImageSet).
    pub source: ImageId,
    /// Geometry, replayed verbatim.
    pub geometry: D::Geometry,
    /// Color transform, replayed verbatim.
    pub color_transform: D::ColorTransform,
    /// Composite mode.
    pub mode: D::CompositeMode,
}

impl<D: Device> Clone for DrawRecord<D> {
    fn clone(&self) -> Self {
        Self {
            source: self.source,
            geometry: self.geometry.clone(),
            color_transform: self.color_transform.clone(),
            mode: self.mode,
        }
    }
}

impl<D: Device> fmt::Debug for DrawRecord<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrawRecord")
            .field("source", &self.source)
            .field("geometry", &self.geometry)
            .field("color_transform", &self.color_transform)
            .field("mode", &self.mode)
            .finish()
    }
}

/// How an image was rebuilt by [`RestorableImage::restore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RestoreKind {
    /// The presentation surface was re-acquired; no content survives.
    Screen,
    /// A volatile image was reallocated empty.
    Volatile,
    /// The base was uploaded and the history replayed.
    Replayed {
        /// Number of draw records replayed.
        draws: u32,
    },
}

/// An image whose device resource can be rebuilt after context loss.
pub struct RestorableImage<D: Device> {
    image: Option<D::Image>,
    width: u32,
    height: u32,
    alloc_width: u32,
    alloc_height: u32,
    filter: D::Filter,

    base: Base,
    history: Vec<DrawRecord<D>>,
    stale: bool,

    volatile: bool,
    screen: bool,
}

impl<D: Device> fmt::Debug for RestorableImage<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match &self.base {
            Base::Empty => "empty",
            Base::Pixels(_) => "pixels",
            Base::Color(_) => "color",
        };
        f.debug_struct("RestorableImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("filter", &self.filter)
            .field("base", &base)
            .field("history_len", &self.history.len())
            .field("stale", &self.stale)
            .field("volatile", &self.volatile)
            .field("screen", &self.screen)
            .finish_non_exhaustive()
    }
}

impl<D: Device> RestorableImage<D> {
    // -- Construction --

    /// Allocates an empty image with no base state.
    ///
    /// `filter` is how the image is sampled when drawn from; it is kept so
    /// the restored device image samples the same way. A `volatile` image is
    /// expected to be cleared every frame, which drops its history; it is
    /// recreated empty on restore.
    pub fn new(
        device: &mut D,
        width: u32,
        height: u32,
        filter: D::Filter,
        volatile: bool,
    ) -> Result<Self, D::Error> {
        let image = device.new_image(width, height, filter)?;
        Ok(Self::with_image(device, image, width, height, filter, volatile, false))
    }

    /// Allocates an image from tightly packed RGBA `pixels`
    /// (`4 * width * height` bytes) and keeps them as the base snapshot.
    ///
    /// # Panics
    ///
    /// Panics if `pixels` has the wrong length.
    pub fn from_pixels(
        device: &mut D,
        width: u32,
        height: u32,
        pixels: &[u8],
        filter: D::Filter,
    ) -> Result<Self, D::Error> {
        assert_eq!(
            pixels.len(),
            pixel_buffer_len(width, height),
            "source pixels must be 4 * {width} * {height} bytes"
        );
        // Allocate first: the device rejects sizes it cannot round.
        let mut image = device.new_image(width, height, filter)?;
        let (w2, h2) = device.allocation_size(width, height);
        let mut padded = alloc::vec![0_u8; pixel_buffer_len(w2, h2)];
        let row = 4 * width as usize;
        let stride = 4 * w2 as usize;
        for (j, src) in pixels.chunks_exact(row.max(1)).enumerate() {
            padded[j * stride..j * stride + row].copy_from_slice(src);
        }

        if let Err(err) = device.replace_pixels(&mut image, &padded) {
            device.dispose(image);
            return Err(err);
        }
        let mut this = Self::with_image(device, image, width, height, filter, false, false);
        this.base = Base::Pixels(padded);
        Ok(this)
    }

    /// Acquires the presentation surface.
    ///
    /// The screen is volatile: it is rebuilt through the device's surface
    /// acquisition path, never from pixels. It carries the default filter.
    pub fn new_screen(device: &mut D, width: u32, height: u32) -> Result<Self, D::Error> {
        let image = device.new_screen_framebuffer_image(width, height)?;
        Ok(Self::with_image(
            device,
            image,
            width,
            height,
            D::Filter::default(),
            true,
            true,
        ))
    }

    fn with_image(
        device: &D,
        image: D::Image,
        width: u32,
        height: u32,
        filter: D::Filter,
        volatile: bool,
        screen: bool,
    ) -> Self {
        let (alloc_width, alloc_height) = device.allocation_size(width, height);
        Self {
            image: Some(image),
            width,
            height,
            alloc_width,
            alloc_height,
            filter,
            base: Base::Empty,
            history: Vec::new(),
            stale: false,
            volatile,
            screen,
        }
    }

    // -- Queries --

    /// Returns the logical size.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the sampling filter the device image is allocated with.
    #[must_use]
    pub fn filter(&self) -> D::Filter {
        self.filter
    }

    /// Returns the size of the device allocation backing this image.
    #[must_use]
    pub fn allocation_size(&self) -> (u32, u32) {
        (self.alloc_width, self.alloc_height)
    }

    /// Returns whether only the device image knows the current content.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Returns whether the content is frame-transient.
    #[must_use]
    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    /// Returns whether this is the presentation surface.
    #[must_use]
    pub fn is_screen(&self) -> bool {
        self.screen
    }

    /// Returns the base pixel snapshot, if any.
    #[must_use]
    pub fn base_pixels(&self) -> Option<&[u8]> {
        match &self.base {
            Base::Pixels(pixels) => Some(pixels),
            _ => None,
        }
    }

    /// Returns the base fill color, if any.
    #[must_use]
    pub fn base_color(&self) -> Option<Rgba> {
        match self.base {
            Base::Color(color) => Some(color),
            _ => None,
        }
    }

    /// Returns the recorded draw history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[DrawRecord<D>] {
        &self.history
    }

    /// Returns whether restoring this image needs other images first.
    #[must_use]
    pub fn has_dependency(&self) -> bool {
        !self.stale && !self.history.is_empty()
    }

    /// Returns the device image, or `None` once disposed.
    #[must_use]
    pub fn device_image(&self) -> Option<&D::Image> {
        self.image.as_ref()
    }

    /// Returns whether the device image was lost with its context.
    #[must_use]
    pub fn is_invalidated(&self, device: &D) -> bool {
        self.image
            .as_ref()
            .is_some_and(|image| device.is_invalidated(image))
    }

    // -- Mutators --

    /// Fills the image with a solid color.
    ///
    /// Afterwards the content is fully described by the color alone.
    pub fn fill(&mut self, device: &mut D, color: Rgba) -> Result<(), D::Error> {
        device.fill(self.live_image_mut(), color)?;
        self.base = Base::Color(color);
        self.history.clear();
        self.stale = false;
        Ok(())
    }

    /// Replaces the whole allocation with `pixels`.
    ///
    /// On a device failure nothing is committed.
    ///
    /// # Panics
    ///
    /// Panics if `pixels` does not cover exactly the allocation.
    pub fn replace_pixels(&mut self, device: &mut D, pixels: Vec<u8>) -> Result<(), D::Error> {
        assert_eq!(
            pixels.len(),
            pixel_buffer_len(self.alloc_width, self.alloc_height),
            "pixel buffer must cover the {}x{} allocation",
            self.alloc_width,
            self.alloc_height
        );
        device.replace_pixels(self.live_image_mut(), &pixels)?;
        self.base = Base::Pixels(pixels);
        self.history.clear();
        self.stale = false;
        Ok(())
    }

    /// Clears a volatile image to transparent. No-op otherwise.
    ///
    /// Meant to run once per frame boundary so no history accumulates for
    /// transient surfaces.
    pub fn clear_if_volatile(&mut self, device: &mut D) -> Result<(), D::Error> {
        if !self.volatile {
            return Ok(());
        }
        device.fill(self.live_image_mut(), Rgba::TRANSPARENT)?;
        self.reset_cpu_state();
        Ok(())
    }

    /// Composites `source` (identified by `source_id`) into this image.
    ///
    /// The device draw is always issued. If the source is stale or volatile
    /// its content cannot be replayed later, so this image becomes stale.
    /// Otherwise the draw is appended to the history, unless this image is
    /// already stale.
    pub fn draw_image(
        &mut self,
        device: &mut D,
        source_id: ImageId,
        source: &Self,
        geometry: D::Geometry,
        color_transform: D::ColorTransform,
        mode: D::CompositeMode,
    ) -> Result<(), D::Error> {
        device.draw_image(
            self.live_image_mut(),
            source.live_image(),
            &geometry,
            &color_transform,
            mode,
        )?;
        if source.stale || source.volatile {
            self.make_stale();
        } else if !self.stale {
            self.history.push(DrawRecord {
                source: source_id,
                geometry,
                color_transform,
                mode,
            });
        }
        Ok(())
    }

    /// Releases the device image and clears all CPU state.
    ///
    /// Disposing twice is a no-op.
    pub fn dispose(&mut self, device: &mut D) {
        if let Some(image) = self.image.take() {
            device.dispose(image);
        }
        self.reset_cpu_state();
    }

    // -- Invalidation --

    /// Marks this image stale if its history draws from `target`.
    ///
    /// The whole history is discarded, not just the entries after the
    /// dependency. Returns whether the image became stale.
    pub fn make_stale_if_depending_on(&mut self, target: ImageId) -> bool {
        if self.stale {
            return false;
        }
        // Linear in history length; volatile and stale sources keep it short.
        if self.history.iter().any(|record| record.source == target) {
            self.make_stale();
            return true;
        }
        false
    }

    fn make_stale(&mut self) {
        self.base = Base::Empty;
        self.history.clear();
        self.stale = true;
    }

    // -- Pixel resolution --

    /// Returns the color at `(x, y)`, reading the device back if the CPU
    /// snapshot is not current.
    ///
    /// The read-back blocks on the device. Coordinates outside the
    /// allocation return [`Rgba::TRANSPARENT`] without touching the device.
    pub fn pixel_at(&mut self, device: &mut D, x: i32, y: i32) -> Result<Rgba, D::Error> {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return Ok(Rgba::TRANSPARENT);
        };
        if x >= self.alloc_width || y >= self.alloc_height {
            return Ok(Rgba::TRANSPARENT);
        }
        let needs_read =
            self.stale || !self.history.is_empty() || !matches!(self.base, Base::Pixels(_));
        if needs_read {
            self.read_pixels_from_device(device)?;
        }
        let Base::Pixels(pixels) = &self.base else {
            unreachable!("base pixels are resolved above");
        };
        let idx = 4 * (y as usize * self.alloc_width as usize + x as usize);
        let mut bytes = [0_u8; 4];
        bytes.copy_from_slice(&pixels[idx..idx + 4]);
        Ok(Rgba::from_bytes(bytes))
    }

    /// Reads the device back if the image is stale, so it can be restored.
    ///
    /// Volatile images are left alone since restore discards them anyway.
    /// Returns whether a read-back happened.
    pub fn resolve_if_stale(&mut self, device: &mut D) -> Result<bool, D::Error> {
        if self.volatile || !self.stale {
            return Ok(false);
        }
        self.read_pixels_from_device(device)?;
        Ok(true)
    }

    fn read_pixels_from_device(&mut self, device: &mut D) -> Result<(), D::Error> {
        let pixels = device.read_pixels(self.live_image())?;
        self.check_read_back(&pixels);
        self.base = Base::Pixels(pixels);
        self.history.clear();
        self.stale = false;
        Ok(())
    }

    // -- Restore --

    /// Rebuilds the device image after context loss.
    ///
    /// `sources` looks up the images named in the history. Each must already
    /// be restored; [`ImageSet::restore`](crate::set::ImageSet::restore)
    /// guarantees this by visiting images in dependency order.
    ///
    /// A replayed image ends in the same state as a freshly resolved one:
    /// base pixels read back from the rebuilt device image, no history.
    ///
    /// # Panics
    ///
    /// Panics if the image is stale, or if a history source is missing or not
    /// yet restored. Both mean the caller broke the restore contract.
    pub fn restore<'s, F>(&mut self, device: &mut D, sources: F) -> Result<RestoreKind, D::Error>
    where
        F: Fn(ImageId) -> Option<&'s Self>,
        D: 's,
    {
        let (w, h) = (self.width, self.height);
        if self.screen {
            // The framebuffer itself may have changed.
            let image = device.new_screen_framebuffer_image(w, h)?;
            self.swap_device_image(device, image);
            self.reset_cpu_state();
            return Ok(RestoreKind::Screen);
        }
        if self.volatile {
            let image = device.new_image(w, h, self.filter)?;
            self.swap_device_image(device, image);
            self.reset_cpu_state();
            return Ok(RestoreKind::Volatile);
        }
        assert!(!self.stale, "pixels must not be stale when restoring");

        let mut image = device.new_image(w, h, self.filter)?;
        let pixels = match self.replay(device, &mut image, &sources) {
            Ok(pixels) => pixels,
            Err(err) => {
                device.dispose(image);
                return Err(err);
            }
        };
        self.check_read_back(&pixels);

        let draws = u32::try_from(self.history.len()).unwrap_or(u32::MAX);
        self.swap_device_image(device, image);
        self.base = Base::Pixels(pixels);
        self.history.clear();
        self.stale = false;
        Ok(RestoreKind::Replayed { draws })
    }

    /// Uploads the base into `image`, replays the history, and reads the
    /// result back.
    fn replay<'s, F>(
        &self,
        device: &mut D,
        image: &mut D::Image,
        sources: &F,
    ) -> Result<Vec<u8>, D::Error>
    where
        F: Fn(ImageId) -> Option<&'s Self>,
        D: 's,
    {
        match &self.base {
            Base::Pixels(pixels) => device.replace_pixels(image, pixels)?,
            Base::Color(color) if !color.is_transparent() => device.fill(image, *color)?,
            _ => {}
        }
        for record in &self.history {
            let Some(source) = sources(record.source) else {
                panic!("history source {:?} is not alive", record.source);
            };
            let source_image = source.live_image();
            assert!(
                !source.has_dependency() && !device.is_invalidated(source_image),
                "history source {:?} must be restored before its dependents",
                record.source
            );
            device.draw_image(
                image,
                source_image,
                &record.geometry,
                &record.color_transform,
                record.mode,
            )?;
        }
        device.read_pixels(image)
    }

    // -- Internal helpers --

    fn swap_device_image(&mut self, device: &mut D, image: D::Image) {
        if let Some(old) = self.image.replace(image) {
            device.dispose(old);
        }
    }

    fn reset_cpu_state(&mut self) {
        self.base = Base::Empty;
        self.history.clear();
        self.stale = false;
    }

    fn check_read_back(&self, pixels: &[u8]) {
        assert_eq!(
            pixels.len(),
            pixel_buffer_len(self.alloc_width, self.alloc_height),
            "device read back {} bytes for a {}x{} allocation",
            pixels.len(),
            self.alloc_width,
            self.alloc_height
        );
    }

    fn live_image(&self) -> &D::Image {
        let Some(image) = self.image.as_ref() else {
            panic!("image used after dispose");
        };
        image
    }

    fn live_image_mut(&mut self) -> &mut D::Image {
        let Some(image) = self.image.as_mut() else {
            panic!("image used after dispose");
        };
        image
    }
}
