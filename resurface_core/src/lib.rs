// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Restorable images that survive graphics context loss.
//!
//! A graphics-memory-resident image can be destroyed at any time (driver
//! reset, OS-triggered context loss, suspend/resume). `resurface_core` keeps
//! enough CPU-resident bookkeeping per image to rebuild every live image with
//! pixel-identical content once a new context is available, without
//! re-running application drawing code.
//!
//! It is `no_std` compatible (with `alloc`). Live images are addressed by
//! generational [`ImageId`](set::ImageId) handles into an [`ImageSet`](set::ImageSet).
//!
//! # Architecture
//!
//! ```text
//!   draw calls ──► ImageSet ──► RestorableImage ──► Device (GPU / soft)
//!                     │              │
//!                     │              └─ base pixels | base color | history
//!                     │
//!   end of frame ──► resolve_stale_images()
//!                     │
//!   context lost ──► restore()  (dependency-first order)
//! ```
//!
//! **[`image`]**: [`RestorableImage`](image::RestorableImage): the per-image
//! record of how its current pixels came to be, the mutators that maintain
//! it, lazy pixel resolution, and the per-image restore step.
//!
//! **[`set`]**: [`ImageSet`](set::ImageSet): the table of live images. It
//! invalidates dependents whenever an image changes and drives the restore
//! pass in dependency order.
//!
//! **[`device`]**: The [`Device`](device::Device) trait that graphics
//! backends implement. Geometry, color transforms and composite modes are
//! associated types the core never looks inside.
//!
//! **[`dirty`]**: Dependency channel used to order the restore pass via
//! `understory_dirty`.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! restore instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! **`threading`** (`std` only): `DeviceThread`, the rendezvous that lets
//! other threads run work on the thread owning the device.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables the `threading` module.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod color;
pub mod device;
pub mod dirty;
pub mod image;
pub mod set;
#[cfg(feature = "std")]
pub mod threading;
pub mod trace;

#[cfg(test)]
mod testing;
