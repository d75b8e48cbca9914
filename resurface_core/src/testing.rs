// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal in-memory device for unit tests.
//!
//! Draws copy every non-transparent source pixel to the same position in the
//! destination (clipped to both allocations), optionally offset by the
//! geometry. Context loss drops all pixels of older images.

use alloc::vec;
use alloc::vec::Vec;

use crate::color::Rgba;
use crate::device::{Device, pixel_buffer_len};

#[derive(Debug)]
pub(crate) struct TestImage {
    context: u32,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    pub(crate) screen: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TestError {
    Lost,
    Injected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Op {
    New,
    Upload,
    Draw,
    Read,
}

#[derive(Debug, Default)]
pub(crate) struct TestDevice {
    context: u32,
    pub(crate) reads: usize,
    pub(crate) disposed: usize,
    fail_next: Option<Op>,
}

impl TestDevice {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lose_context(&mut self) {
        self.context += 1;
    }

    pub(crate) fn fail_next(&mut self, op: Op) {
        self.fail_next = Some(op);
    }

    fn check(&mut self, op: Op) -> Result<(), TestError> {
        if self.fail_next == Some(op) {
            self.fail_next = None;
            return Err(TestError::Injected);
        }
        Ok(())
    }

    fn check_live(&self, image: &TestImage) -> Result<(), TestError> {
        if image.context == self.context {
            Ok(())
        } else {
            Err(TestError::Lost)
        }
    }

    fn alloc(&mut self, width: u32, height: u32, screen: bool) -> Result<TestImage, TestError> {
        self.check(Op::New)?;
        let (w2, h2) = self.allocation_size(width, height);
        Ok(TestImage {
            context: self.context,
            width: w2,
            height: h2,
            pixels: vec![0; pixel_buffer_len(w2, h2)],
            screen,
        })
    }
}

impl Device for TestDevice {
    type Image = TestImage;
    type Geometry = (u32, u32);
    type ColorTransform = ();
    type CompositeMode = ();
    type Filter = ();
    type Error = TestError;

    fn new_image(&mut self, width: u32, height: u32, _filter: ()) -> Result<TestImage, TestError> {
        self.alloc(width, height, false)
    }

    fn new_screen_framebuffer_image(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<TestImage, TestError> {
        self.alloc(width, height, true)
    }

    fn fill(&mut self, image: &mut TestImage, color: Rgba) -> Result<(), TestError> {
        self.check_live(image)?;
        for px in image.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color.to_bytes());
        }
        Ok(())
    }

    fn replace_pixels(&mut self, image: &mut TestImage, pixels: &[u8]) -> Result<(), TestError> {
        self.check_live(image)?;
        self.check(Op::Upload)?;
        image.pixels.copy_from_slice(pixels);
        Ok(())
    }

    fn draw_image(
        &mut self,
        dst: &mut TestImage,
        src: &TestImage,
        geometry: &(u32, u32),
        _color_transform: &(),
        _mode: (),
    ) -> Result<(), TestError> {
        self.check_live(dst)?;
        self.check_live(src)?;
        self.check(Op::Draw)?;
        let (dx, dy) = *geometry;
        for y in 0..src.height {
            for x in 0..src.width {
                let (tx, ty) = (x + dx, y + dy);
                if tx >= dst.width || ty >= dst.height {
                    continue;
                }
                let s = 4 * (y * src.width + x) as usize;
                let d = 4 * (ty * dst.width + tx) as usize;
                if src.pixels[s + 3] != 0 {
                    dst.pixels[d..d + 4].copy_from_slice(&src.pixels[s..s + 4]);
                }
            }
        }
        Ok(())
    }

    fn read_pixels(&mut self, image: &TestImage) -> Result<Vec<u8>, TestError> {
        self.check_live(image)?;
        self.check(Op::Read)?;
        self.reads += 1;
        Ok(image.pixels.clone())
    }

    fn dispose(&mut self, _image: TestImage) {
        self.disposed += 1;
    }

    fn is_invalidated(&self, image: &TestImage) -> bool {
        image.context != self.context
    }
}
