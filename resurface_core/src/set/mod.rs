// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The table of live restorable images.
//!
//! An [`ImageSet`] owns every live [`RestorableImage`](crate::image::RestorableImage)
//! and is the only place that sees all of them at once. That makes it
//! responsible for the two cross-image duties:
//!
//! - **Invalidation**: once an image changes content (fill, pixel
//!   replacement, being drawn into, disposal), every other image whose
//!   history draws from it is marked stale, since replaying that history
//!   later would read the new content instead of the old. A device call
//!   that fails changes nothing and invalidates nothing.
//! - **Restore ordering**: after context loss,
//!   [`restore`](ImageSet::restore) visits images so that every history
//!   source is rebuilt before the images that draw from it.
//!
//! Images are addressed by [`ImageId`], a generational handle that becomes
//! stale when the image is disposed, so a history entry can never silently
//! point at a recycled slot.

mod id;
mod restore;
mod store;

pub use id::ImageId;
pub use store::ImageSet;
