//! Gradient and normal-map operators over scalar height fields.
//!
//! Pixels whose value equals `zero_value` carry no data: they fall back to
//! the centre sample when read as neighbours and produce a flat result
//! themselves. Central differences in the interior, one-sided at borders
//! and next to no-data pixels.

use crate::core::types::{Vec2, Vec3};
use crate::image::buffer::{ScalarImage, Vec2Image, Vec3Image};

#[inline]
fn is_valid(v: f32, zero_value: f32) -> bool {
    v != zero_value
}

/// Raw height derivatives `(dh/dx, dh/dy)` at one pixel.
fn derivatives(field: &ScalarImage, x: u32, y: u32, zero_value: f32) -> (f32, f32) {
    let w = field.width();
    let h = field.height();
    let data = field.as_slice();
    let idx = field.idx(x, y);
    let centre = data[idx];

    let left = if x > 0 { data[idx - 1] } else { zero_value };
    let right = if x + 1 < w { data[idx + 1] } else { zero_value };
    let up = if y > 0 { data[idx - w as usize] } else { zero_value };
    let down = if y + 1 < h { data[idx + w as usize] } else { zero_value };

    let dhdx = if is_valid(left, zero_value) && is_valid(right, zero_value) {
        (right - left) * 0.5
    } else if is_valid(right, zero_value) {
        right - centre
    } else if is_valid(left, zero_value) {
        centre - left
    } else {
        0.0
    };

    let dhdy = if is_valid(up, zero_value) && is_valid(down, zero_value) {
        (down - up) * 0.5
    } else if is_valid(down, zero_value) {
        down - centre
    } else if is_valid(up, zero_value) {
        centre - up
    } else {
        0.0
    };

    (dhdx, dhdy)
}

/// Negated gradient of a height field: vectors point downhill.
pub fn gradient(field: &ScalarImage, zero_value: f32) -> Vec2Image {
    let mut out = Vec2Image::new(field.width(), field.height())
        .expect("source extents already validated");

    for y in 0..field.height() {
        for x in 0..field.width() {
            let idx = field.idx(x, y);
            if !is_valid(field.as_slice()[idx], zero_value) {
                continue;
            }
            let (dhdx, dhdy) = derivatives(field, x, y, zero_value);
            out.as_mut_slice()[idx] = Vec2::new(-dhdx, -dhdy);
        }
    }
    out
}

/// Surface normals of a height field: `normalize(-dh/dx, -dh/dy, 1/scale)`.
/// Larger `scale` steepens the normals; non-positive values fall back to 1.
pub fn normal_map(field: &ScalarImage, zero_value: f32, scale: f32) -> Vec3Image {
    let scale = if scale > 0.0 { scale } else { 1.0 };
    let up = Vec3::new(0.0, 0.0, 1.0);
    let mut out = Vec3Image::filled(field.width(), field.height(), up)
        .expect("source extents already validated");

    for y in 0..field.height() {
        for x in 0..field.width() {
            let idx = field.idx(x, y);
            if !is_valid(field.as_slice()[idx], zero_value) {
                continue;
            }
            let (dhdx, dhdy) = derivatives(field, x, y, zero_value);
            let normal = Vec3::new(-dhdx, -dhdy, 1.0 / scale);
            let mag = normal.length();
            out.as_mut_slice()[idx] = if mag > 1e-6 { normal / mag } else { up };
        }
    }
    out
}
