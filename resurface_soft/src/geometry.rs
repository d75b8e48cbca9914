// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw geometry: textured quads.
//!
//! A [`Vertices`] blob is a flat `f32` list of quads, each stored as eight
//! floats `[dx0, dy0, dx1, dy1, sx0, sy0, sx1, sy1]`: the destination
//! rectangle in target pixels, then the source rectangle in source pixels.
//! A reversed edge (`dx1 < dx0`) mirrors the quad.

use kurbo::{Affine, Rect};

/// One source region and where it lands before any transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImagePart {
    /// Destination rectangle, in destination pixels.
    pub dst: Rect,
    /// Source rectangle, in source pixels.
    pub src: Rect,
}

/// A flat list of textured quads, replayed verbatim on restore.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vertices(Vec<f32>);

impl Vertices {
    /// Number of floats per quad.
    pub const FLOATS_PER_QUAD: usize = 8;

    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list holding a single quad.
    #[must_use]
    pub fn quad(dst: Rect, src: Rect) -> Self {
        let mut vertices = Self::new();
        vertices.push_quad(dst, src);
        vertices
    }

    /// Builds one quad per part, mapping each destination rectangle through
    /// `transform`.
    ///
    /// Only translate and scale transforms keep quads axis-aligned; for
    /// anything else the destination becomes the transformed bounding box.
    #[must_use]
    pub fn from_parts(parts: &[ImagePart], transform: Affine) -> Self {
        let mut vertices = Self(Vec::with_capacity(parts.len() * Self::FLOATS_PER_QUAD));
        let [a, b, c, d, e, f] = transform.as_coeffs();
        for part in parts {
            if b == 0.0 && c == 0.0 {
                // Keep edge order so negative scales mirror.
                let dst = Rect::new(
                    a * part.dst.x0 + e,
                    d * part.dst.y0 + f,
                    a * part.dst.x1 + e,
                    d * part.dst.y1 + f,
                );
                vertices.push_quad(dst, part.src);
            } else {
                vertices.push_quad(transform.transform_rect_bbox(part.dst), part.src);
            }
        }
        vertices
    }

    /// Appends a quad.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "vertex blobs are single precision"
    )]
    pub fn push_quad(&mut self, dst: Rect, src: Rect) {
        self.0.extend_from_slice(&[
            dst.x0 as f32,
            dst.y0 as f32,
            dst.x1 as f32,
            dst.y1 as f32,
            src.x0 as f32,
            src.y0 as f32,
            src.x1 as f32,
            src.y1 as f32,
        ]);
    }

    /// Returns the number of complete quads.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.0.len() / Self::FLOATS_PER_QUAD
    }

    /// Iterates `(dst, src)` rectangle pairs.
    pub fn quads(&self) -> impl Iterator<Item = (Rect, Rect)> + '_ {
        self.0.chunks_exact(Self::FLOATS_PER_QUAD).map(|q| {
            let r = |i: usize| {
                Rect::new(
                    f64::from(q[i]),
                    f64::from(q[i + 1]),
                    f64::from(q[i + 2]),
                    f64::from(q[i + 3]),
                )
            };
            (r(0), r(4))
        })
    }

    /// Returns the raw floats.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for Vertices {
    /// Wraps a raw blob. Trailing floats that do not form a quad are ignored.
    fn from(raw: Vec<f32>) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_layout() {
        let v = Vertices::quad(
            Rect::new(1.0, 2.0, 3.0, 4.0),
            Rect::new(5.0, 6.0, 7.0, 8.0),
        );
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(v.quad_count(), 1);
    }

    #[test]
    fn from_parts_translates_and_scales() {
        let parts = [
            ImagePart {
                dst: Rect::new(0.0, 0.0, 2.0, 2.0),
                src: Rect::new(0.0, 0.0, 2.0, 2.0),
            },
            ImagePart {
                dst: Rect::new(2.0, 0.0, 4.0, 1.0),
                src: Rect::new(0.0, 0.0, 1.0, 1.0),
            },
        ];
        let v = Vertices::from_parts(&parts, Affine::translate((1.0, 1.0)) * Affine::scale(2.0));
        let quads: Vec<_> = v.quads().collect();
        assert_eq!(quads[0].0, Rect::new(1.0, 1.0, 5.0, 5.0));
        assert_eq!(quads[1].0, Rect::new(5.0, 1.0, 9.0, 3.0));
        assert_eq!(quads[1].1, parts[1].src);
    }

    #[test]
    fn negative_scale_mirrors() {
        let part = ImagePart {
            dst: Rect::new(0.0, 0.0, 2.0, 1.0),
            src: Rect::new(0.0, 0.0, 2.0, 1.0),
        };
        let v = Vertices::from_parts(&[part], Affine::new([-1.0, 0.0, 0.0, 1.0, 2.0, 0.0]));
        let (dst, _) = v.quads().next().unwrap();
        assert_eq!((dst.x0, dst.x1), (2.0, 0.0));
    }

    #[test]
    fn trailing_floats_are_ignored() {
        let v = Vertices::from(vec![0.0; 11]);
        assert_eq!(v.quad_count(), 1);
        assert_eq!(v.quads().count(), 1);
    }
}
