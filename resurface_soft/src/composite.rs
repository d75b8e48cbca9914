// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Porter-Duff style composite modes on premultiplied 8-bit pixels.

use resurface_core::color::Rgba;

/// How a source pixel combines with the destination pixel it covers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompositeMode {
    /// Source over destination.
    #[default]
    SourceOver,
    /// Source replaces destination.
    Copy,
    /// Channel-wise saturating sum.
    Lighter,
    /// Covered pixels become transparent.
    Clear,
}

impl CompositeMode {
    /// Combines `src` onto `dst`.
    #[must_use]
    pub fn blend(self, dst: Rgba, src: Rgba) -> Rgba {
        match self {
            Self::SourceOver => {
                let inv = 255 - u16::from(src.a);
                let over = |s: u8, d: u8| s.saturating_add(mul_div_255(d, inv));
                Rgba::new(
                    over(src.r, dst.r),
                    over(src.g, dst.g),
                    over(src.b, dst.b),
                    over(src.a, dst.a),
                )
            }
            Self::Copy => src,
            Self::Lighter => Rgba::new(
                src.r.saturating_add(dst.r),
                src.g.saturating_add(dst.g),
                src.b.saturating_add(dst.b),
                src.a.saturating_add(dst.a),
            ),
            Self::Clear => Rgba::TRANSPARENT,
        }
    }
}

/// `round(v * k / 255)` for `k <= 255`.
#[expect(clippy::cast_possible_truncation, reason = "result is at most 255")]
fn mul_div_255(v: u8, k: u16) -> u8 {
    let t = u16::from(v) * k + 128;
    ((t + (t >> 8)) >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::new(255, 0, 0, 255);
    const HALF_BLUE: Rgba = Rgba::new(0, 0, 128, 128);

    #[test]
    fn source_over_opaque_replaces() {
        assert_eq!(CompositeMode::SourceOver.blend(HALF_BLUE, RED), RED);
    }

    #[test]
    fn source_over_transparent_keeps() {
        assert_eq!(
            CompositeMode::SourceOver.blend(RED, Rgba::TRANSPARENT),
            RED
        );
    }

    #[test]
    fn source_over_half() {
        assert_eq!(
            CompositeMode::SourceOver.blend(RED, HALF_BLUE),
            Rgba::new(127, 0, 128, 255)
        );
    }

    #[test]
    fn other_modes() {
        assert_eq!(CompositeMode::Copy.blend(RED, HALF_BLUE), HALF_BLUE);
        assert_eq!(
            CompositeMode::Lighter.blend(RED, HALF_BLUE),
            Rgba::new(255, 0, 128, 255)
        );
        assert_eq!(CompositeMode::Clear.blend(RED, HALF_BLUE), Rgba::TRANSPARENT);
    }

    #[test]
    fn mul_div_255_is_exact_at_ends() {
        for v in 0..=255_u8 {
            assert_eq!(mul_div_255(v, 255), v);
            assert_eq!(mul_div_255(v, 0), 0);
        }
    }
}
