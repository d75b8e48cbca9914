// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Alpha-premultiplied 8-bit RGBA color.

use core::fmt;

/// An alpha-premultiplied RGBA color with 8 bits per channel.
///
/// The all-zero value, [`Rgba::TRANSPARENT`], doubles as the "empty" color
/// returned for out-of-bounds pixel reads.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Opaque white.
    pub const WHITE: Self = Self::new(0xff, 0xff, 0xff, 0xff);

    /// Creates a color from premultiplied channel values.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from channels in memory order (`[r, g, b, a]`).
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        let [r, g, b, a] = bytes;
        Self { r, g, b, a }
    }

    /// Returns the channels in memory order.
    #[inline]
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Returns whether every channel is zero.
    #[inline]
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0 && self.a == 0
    }
}

impl fmt::Debug for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rgba(#{:02x}{:02x}{:02x}{:02x})",
            self.r, self.g, self.b, self.a
        )
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;

    #[test]
    fn default_is_transparent() {
        assert_eq!(Rgba::default(), Rgba::TRANSPARENT);
        assert!(Rgba::TRANSPARENT.is_transparent());
        assert!(!Rgba::new(0, 0, 0, 1).is_transparent());
    }

    #[test]
    fn bytes_round_trip() {
        let c = Rgba::new(1, 2, 3, 4);
        assert_eq!(Rgba::from_bytes(c.to_bytes()), c);
    }

    #[test]
    fn debug_is_hex() {
        assert_eq!(format!("{:?}", Rgba::new(0xff, 0, 0x10, 0xff)), "Rgba(#ff0010ff)");
    }
}
