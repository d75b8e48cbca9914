// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Device configuration presets.

/// How requested image sizes map to allocation sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SizeRounding {
    /// Round each axis up to the next power of two, like GL ES 2 textures.
    PowerOfTwo,
    /// Allocate exactly the requested size.
    Exact,
}

/// Configuration for a [`SoftDevice`](crate::SoftDevice).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoftDeviceConfig {
    /// Allocation size rounding.
    pub rounding: SizeRounding,
    /// Largest allocation edge, after rounding.
    pub max_texture_size: u32,
}

impl SoftDeviceConfig {
    /// Mimics a GL ES 2 class device: power-of-two textures up to 4096.
    #[must_use]
    pub const fn gl() -> Self {
        Self {
            rounding: SizeRounding::PowerOfTwo,
            max_texture_size: 4096,
        }
    }

    /// Exact-size allocations up to 16384.
    #[must_use]
    pub const fn exact() -> Self {
        Self {
            rounding: SizeRounding::Exact,
            max_texture_size: 16384,
        }
    }

    /// Returns the allocation size for a `width` x `height` request, or
    /// `None` if rounding overflows `u32`.
    ///
    /// Zero-sized axes round to one pixel in power-of-two mode.
    #[must_use]
    pub const fn allocation_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        match self.rounding {
            SizeRounding::PowerOfTwo => {
                match (width.checked_next_power_of_two(), height.checked_next_power_of_two()) {
                    (Some(w2), Some(h2)) => Some((w2, h2)),
                    _ => None,
                }
            }
            SizeRounding::Exact => Some((width, height)),
        }
    }
}

impl Default for SoftDeviceConfig {
    fn default() -> Self {
        Self::gl()
    }
}
