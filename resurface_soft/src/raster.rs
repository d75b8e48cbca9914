// Copyright 2026 the Resurface Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quad rasterization.
//!
//! A destination pixel is covered by a quad when its centre lies inside the
//! destination rectangle (half-open on the far edges). Its centre is mapped
//! linearly into the source rectangle and sampled with the source image's
//! [`Filter`]. Points outside the source allocation sample as transparent.

use resurface_core::color::Rgba;

use crate::color::ColorMatrix;
use crate::composite::CompositeMode;
use crate::device::SoftImage;
use crate::geometry::Vertices;

/// How a source image is sampled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    /// The texel containing the sample point.
    #[default]
    Nearest,
    /// Bilinear blend of the four nearest texel centres, clamped to the
    /// allocation edge.
    Linear,
}

pub(crate) fn draw(
    dst: &mut SoftImage,
    src: &SoftImage,
    geometry: &Vertices,
    color_transform: &ColorMatrix,
    mode: CompositeMode,
) {
    let (dw, dh) = dst.size();
    let (sw, sh) = src.size();
    let texels = src.texels();
    let out = dst.texels_mut();

    for (d, s) in geometry.quads() {
        let Some(cols) = covered(d.x0, d.x1, dw) else {
            continue;
        };
        let Some(rows) = covered(d.y0, d.y1, dh) else {
            continue;
        };
        for py in rows {
            let v = source_coord(py, d.y0, d.y1, s.y0, s.y1);
            for px in cols.clone() {
                let u = source_coord(px, d.x0, d.x1, s.x0, s.x1);
                let texel = match src.filter() {
                    Filter::Nearest => nearest(texels, (sw, sh), u, v),
                    Filter::Linear => linear(texels, (sw, sh), u, v),
                }
                .unwrap_or(Rgba::TRANSPARENT);
                let sample = color_transform.apply(texel);
                let slot = &mut out[(py * dw + px) as usize];
                *slot = mode.blend(Rgba::from_bytes(*slot), sample).to_bytes();
            }
        }
    }
}

/// Returns the pixel indices in `0..limit` whose centres fall in the span
/// between `a` and `b`.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "values are clamped to 0..=limit first"
)]
fn covered(a: f64, b: f64, limit: u32) -> Option<core::ops::Range<u32>> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let limit_f = f64::from(limit);
    let first = (lo - 0.5).ceil().clamp(0.0, limit_f);
    let end = (hi - 0.5).ceil().clamp(0.0, limit_f);
    (first < end).then(|| first as u32..end as u32)
}

/// Maps the centre of destination pixel `p` through the span `d0..d1` onto
/// `s0..s1`.
fn source_coord(p: u32, d0: f64, d1: f64, s0: f64, s1: f64) -> f64 {
    let t = (f64::from(p) + 0.5 - d0) / (d1 - d0);
    s0 + t * (s1 - s0)
}

fn inside(c: f64, limit: u32) -> bool {
    c >= 0.0 && c < f64::from(limit)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "range checked before the cast"
)]
fn nearest(texels: &[[u8; 4]], (w, h): (u32, u32), u: f64, v: f64) -> Option<Rgba> {
    if !inside(u, w) || !inside(v, h) {
        return None;
    }
    let (x, y) = (u.floor() as u32, v.floor() as u32);
    Some(Rgba::from_bytes(texels[(y * w + x) as usize]))
}

/// Returns the two texels around `c` on one axis and the weight of the
/// second.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "values are clamped to 0..limit first"
)]
fn taps(c: f64, limit: u32) -> (u32, u32, f64) {
    let centre = c - 0.5;
    let first = centre.floor();
    let last = f64::from(limit - 1);
    (
        first.clamp(0.0, last) as u32,
        (first + 1.0).clamp(0.0, last) as u32,
        centre - first,
    )
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "a convex blend of bytes stays in 0..=255"
)]
fn linear(texels: &[[u8; 4]], (w, h): (u32, u32), u: f64, v: f64) -> Option<Rgba> {
    if !inside(u, w) || !inside(v, h) {
        return None;
    }
    let (x0, x1, fx) = taps(u, w);
    let (y0, y1, fy) = taps(v, h);
    let at = |x: u32, y: u32| texels[(y * w + x) as usize];
    let (a, b, c, d) = (at(x0, y0), at(x1, y0), at(x0, y1), at(x1, y1));
    let mut out = [0_u8; 4];
    for (i, channel) in out.iter_mut().enumerate() {
        let top = f64::from(a[i]) * (1.0 - fx) + f64::from(b[i]) * fx;
        let bottom = f64::from(c[i]) * (1.0 - fx) + f64::from(d[i]) * fx;
        *channel = (top * (1.0 - fy) + bottom * fy).round() as u8;
    }
    Some(Rgba::from_bytes(out))
}
