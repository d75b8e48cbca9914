// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Image identity.

use core::fmt;

/// A handle to an image in an [`ImageSet`](super::ImageSet).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after an image is disposed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId {
    /// Slot index into the set's storage.
    pub(crate) idx: u32,
    /// Generation counter; must match the set's generation for this slot.
    pub(crate) generation: u32,
}

impl ImageId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({}@gen{})", self.idx, self.generation)
    }
}
