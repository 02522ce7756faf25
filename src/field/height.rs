//! Height reconstruction from normals (Poisson integration).
//!
//! Recover the height gradients `dh/dx = -nx/nz`, `dh/dy = -ny/nz`, take
//! their divergence and relax `laplacian(h) = div`. The result is defined
//! up to an additive constant.

use crate::core::types::{Result, Vec2};
use crate::field::poisson;
use crate::field::Mask;
use crate::image::buffer::{ScalarImage, Vec2Image, Vec3Image};

/// Default relaxation iteration count for height reconstruction.
pub const DEFAULT_ITERATIONS: u32 = 100;

/// Reconstruct a height field from per-pixel height gradients
/// `(dh/dx, dh/dy)`.
pub fn height_from_gradients(
    gradients: &Vec2Image,
    mask: Option<&Mask>,
    iterations: u32,
    scale: f32,
) -> Result<ScalarImage> {
    let w = gradients.width();
    let h = gradients.height();
    let ws = w as usize;
    let g = gradients.as_slice();
    let scale = if scale > 0.0 { scale } else { 1.0 };

    // Divergence of the gradient field. Bounds pick the stencil; the mask
    // only zeroes the right-hand side at invalid cells.
    let mut div = ScalarImage::new(w, h)?;
    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            if let Some(mask) = mask {
                if !mask.is_valid(idx) {
                    continue;
                }
            }

            let dgx_dx = if x > 0 && x + 1 < w {
                (g[idx + 1].x - g[idx - 1].x) * 0.5
            } else if x + 1 < w {
                g[idx + 1].x - g[idx].x
            } else if x > 0 {
                g[idx].x - g[idx - 1].x
            } else {
                0.0
            };

            let dgy_dy = if y > 0 && y + 1 < h {
                (g[idx + ws].y - g[idx - ws].y) * 0.5
            } else if y + 1 < h {
                g[idx + ws].y - g[idx].y
            } else if y > 0 {
                g[idx].y - g[idx - ws].y
            } else {
                0.0
            };

            div.as_mut_slice()[idx] = dgx_dx + dgy_dy;
        }
    }

    let mut height = poisson::solve(&div, mask, iterations)?;
    if scale != 1.0 {
        for v in height.as_mut_slice() {
            *v *= scale;
        }
    }
    Ok(height)
}

/// Reconstruct a height field from a normal map.
pub fn height_from_normals(
    normals: &Vec3Image,
    mask: Option<&Mask>,
    iterations: u32,
    scale: f32,
) -> Result<ScalarImage> {
    let mut gradients = Vec2Image::new(normals.width(), normals.height())?;
    for (out, n) in gradients.as_mut_slice().iter_mut().zip(normals.as_slice()) {
        if n.z.abs() < 1e-6 {
            continue;
        }
        *out = Vec2::new(-n.x / n.z, -n.y / n.z);
    }
    height_from_gradients(&gradients, mask, iterations, scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::gradient::normal_map;

    fn bump(w: u32, h: u32, sigma: f32, amplitude: f32) -> ScalarImage {
        let mut img = ScalarImage::new(w, h).unwrap();
        let cx = (w - 1) as f32 * 0.5;
        let cy = (h - 1) as f32 * 0.5;
        for y in 0..h {
            for x in 0..w {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                img.set(
                    x,
                    y,
                    amplitude * (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp(),
                );
            }
        }
        img
    }

    fn mean(field: &ScalarImage) -> f32 {
        field.as_slice().iter().sum::<f32>() / field.len() as f32
    }

    #[test]
    fn test_round_trip_up_to_constant() {
        let original = bump(32, 32, 5.0, 2.0);
        let normals = normal_map(&original, -1.0, 1.0);
        let rebuilt = height_from_normals(&normals, None, 500, 1.0).unwrap();

        let offset = mean(&original) - mean(&rebuilt);
        let mut worst = 0.0f32;
        for i in 0..original.len() {
            let err = (rebuilt.as_slice()[i] + offset - original.as_slice()[i]).abs();
            worst = worst.max(err);
        }
        assert!(worst < 0.2, "round-trip error {worst}");
    }

    #[test]
    fn test_flat_normals_give_flat_height() {
        let normals =
            Vec3Image::filled(8, 8, crate::core::types::Vec3::new(0.0, 0.0, 1.0)).unwrap();
        let height = height_from_normals(&normals, None, 50, 1.0).unwrap();
        assert!(height.as_slice().iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn test_scale_multiplies_output() {
        let original = bump(16, 16, 3.0, 1.0);
        let normals = normal_map(&original, -1.0, 1.0);
        let one = height_from_normals(&normals, None, 100, 1.0).unwrap();
        let three = height_from_normals(&normals, None, 100, 3.0).unwrap();
        for i in 0..one.len() {
            assert!((three.as_slice()[i] - 3.0 * one.as_slice()[i]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_gradient_input_variant_matches_normals() {
        let original = bump(16, 16, 3.0, 1.0);
        let normals = normal_map(&original, -1.0, 1.0);

        // Convert the normals back to gradients by hand.
        let mut gradients = Vec2Image::new(16, 16).unwrap();
        for (out, n) in gradients.as_mut_slice().iter_mut().zip(normals.as_slice()) {
            *out = Vec2::new(-n.x / n.z, -n.y / n.z);
        }

        let a = height_from_normals(&normals, None, 60, 1.0).unwrap();
        let b = height_from_gradients(&gradients, None, 60, 1.0).unwrap();
        for i in 0..a.len() {
            assert!((a.as_slice()[i] - b.as_slice()[i]).abs() < 1e-6);
        }
    }
}
