// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deterministic CPU [`Device`](resurface_core::device::Device) for
//! `resurface_core`.
//!
//! [`SoftDevice`] keeps every image as a byte buffer and simulates context
//! loss with a generation counter: after [`SoftDevice::lose_context`], every
//! image allocated before is invalidated and refuses further work with
//! [`SoftError::ContextLost`]. Because rendering is exact and repeatable, a
//! restored image can be compared byte for byte with its state before the
//! loss.
//!
//! The device's associated types are concrete here:
//!
//! - geometry: [`Vertices`], textured quads built from `kurbo` rectangles;
//! - color transform: [`ColorMatrix`], a 5x4 affine matrix;
//! - composite mode: [`CompositeMode`];
//! - filter: [`Filter`], nearest or linear sampling of the source.
//!
//! Fault injection ([`SoftDevice::fail_next`]) exercises the error paths of
//! the core.
//!
//! ```
//! use kurbo::Rect;
//! use resurface_core::color::Rgba;
//! use resurface_core::set::ImageSet;
//! use resurface_core::trace::Tracer;
//! use resurface_soft::{ColorMatrix, CompositeMode, SoftDevice, Vertices};
//!
//! let mut device = SoftDevice::default();
//! let mut images = ImageSet::new();
//! let a = images.create_image(&mut device, 4, 4, false).unwrap();
//! let b = images.create_image(&mut device, 4, 4, false).unwrap();
//! let red = Rgba::new(255, 0, 0, 255);
//! images.fill(&mut device, a, red).unwrap();
//! let quad = Vertices::quad(Rect::new(0.0, 0.0, 4.0, 4.0), Rect::new(0.0, 0.0, 4.0, 4.0));
//! images
//!     .draw_image(&mut device, b, a, quad, ColorMatrix::IDENTITY, CompositeMode::SourceOver)
//!     .unwrap();
//!
//! device.lose_context();
//! assert!(images.is_invalidated(&device));
//! images.restore(&mut device, &mut Tracer::none()).unwrap();
//! assert_eq!(images.pixel_at(&mut device, b, 2, 2).unwrap(), red);
//! ```

mod color;
mod composite;
mod config;
mod device;
mod geometry;
mod raster;

pub use color::ColorMatrix;
pub use composite::CompositeMode;
pub use config::{SizeRounding, SoftDeviceConfig};
pub use device::{FailPoint, SoftDevice, SoftError, SoftImage, SoftStats};
pub use geometry::{ImagePart, Vertices};
pub use raster::Filter;
