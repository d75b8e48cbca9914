// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Color transforms applied while drawing.

use resurface_core::color::Rgba;

/// A 5x4 affine color transform.
///
/// Each output channel is a weighted sum of the four input channels plus a
/// constant, computed on normalized (`0.0..=1.0`) premultiplied values. The
/// result is clamped so it stays a valid premultiplied color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorMatrix {
    /// Rows for r, g, b and a; columns weight r, g, b, a, then the constant.
    pub rows: [[f32; 5]; 4],
}

impl ColorMatrix {
    /// Leaves colors unchanged.
    pub const IDENTITY: Self = Self::scale(1.0, 1.0, 1.0, 1.0);

    /// Scales each channel independently.
    ///
    /// Scaling all four channels by the same factor fades a premultiplied
    /// color.
    #[must_use]
    pub const fn scale(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            rows: [
                [r, 0.0, 0.0, 0.0, 0.0],
                [0.0, g, 0.0, 0.0, 0.0],
                [0.0, 0.0, b, 0.0, 0.0],
                [0.0, 0.0, 0.0, a, 0.0],
            ],
        }
    }

    /// Adds a constant to each channel.
    #[must_use]
    pub const fn translate(mut self, r: f32, g: f32, b: f32, a: f32) -> Self {
        self.rows[0][4] += r;
        self.rows[1][4] += g;
        self.rows[2][4] += b;
        self.rows[3][4] += a;
        self
    }

    /// Returns whether this is exactly the identity.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Transforms one color.
    #[must_use]
    pub fn apply(&self, color: Rgba) -> Rgba {
        if self.is_identity() {
            return color;
        }
        let input = color.to_bytes().map(|c| f32::from(c) / 255.0);
        let out = self.rows.map(|row| {
            let sum = row[0] * input[0]
                + row[1] * input[1]
                + row[2] * input[2]
                + row[3] * input[3]
                + row[4];
            sum.clamp(0.0, 1.0)
        });
        let a = to_byte(out[3]);
        Rgba::new(
            to_byte(out[0]).min(a),
            to_byte(out[1]).min(a),
            to_byte(out[2]).min(a),
            a,
        )
    }
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "input is clamped to 0.0..=1.0"
)]
fn to_byte(v: f32) -> u8 {
    (v * 255.0).round() as u8
}
