//! Two-layer flow driver.
//!
//! Builds a velocity field that runs along the contours of one scalar
//! layer, scaled by a second layer, then splits it into its Helmholtz
//! components and derives the swirl field. Cells where either layer is
//! non-positive carry no flow.

use crate::core::types::{Result, Vec2};
use crate::field::{helmholtz, poisson, swirl, Mask};
use crate::image::buffer::{check_same_shape, ScalarImage, Vec2Image};

/// All fields derived from one layer pair.
#[derive(Clone, Debug)]
pub struct LayerFlow {
    /// `magnitude * rot90(grad(contour))`.
    pub velocity: Vec2Image,
    /// Divergence-free component of the velocity.
    pub incompressible: Vec2Image,
    /// Curl-free component of the velocity.
    pub curl_free: Vec2Image,
    /// Divergence-driven swirl field.
    pub swirl: Vec2Image,
}

/// Gradient of `contour` at `(x, y)` treating non-positive samples as
/// missing (they fall back to the centre value).
fn contour_gradient(contour: &ScalarImage, x: u32, y: u32) -> Vec2 {
    let w = contour.width();
    let h = contour.height();
    let ws = w as usize;
    let data = contour.as_slice();
    let idx = (y * w + x) as usize;

    let centre = data[idx];
    if centre <= 0.0 {
        return Vec2::ZERO;
    }

    let mut left = if x > 0 { data[idx - 1] } else { centre };
    let mut right = if x + 1 < w { data[idx + 1] } else { centre };
    let mut up = if y > 0 { data[idx - ws] } else { centre };
    let mut down = if y + 1 < h { data[idx + ws] } else { centre };

    if left <= 0.0 {
        left = centre;
    }
    if right <= 0.0 {
        right = centre;
    }
    if up <= 0.0 {
        up = centre;
    }
    if down <= 0.0 {
        down = centre;
    }

    Vec2::new((right - left) * 0.5, (down - up) * 0.5)
}

/// Derive the flow fields for a `(magnitude, contour)` layer pair.
pub fn layer_flow(
    magnitude: &ScalarImage,
    contour: &ScalarImage,
    iterations: u32,
) -> Result<LayerFlow> {
    check_same_shape(magnitude, contour)?;

    let w = magnitude.width();
    let h = magnitude.height();
    let mut velocity = Vec2Image::new(w, h)?;

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            let m = magnitude.as_slice()[idx];
            let c = contour.as_slice()[idx];
            if m <= 0.0 || c <= 0.0 {
                continue;
            }
            // Rotate the gradient 90 degrees CCW: flow follows the
            // contour lines, scaled by the magnitude layer.
            let g = contour_gradient(contour, x, y);
            velocity.as_mut_slice()[idx] = Vec2::new(-g.y * m, g.x * m);
        }
    }

    let mask = Mask::ZeroValue {
        field: magnitude,
        zero: 0.0,
    };
    let iterations = if iterations > 0 { iterations } else { poisson::DEFAULT_ITERATIONS };
    let decomposition = helmholtz::decompose(&velocity, Some(&mask), iterations)?;
    let swirl_field = swirl::swirl(
        &velocity,
        Some(&decomposition.divergence),
        Some(&mask),
        1.0,
    )?;

    Ok(LayerFlow {
        velocity,
        incompressible: decomposition.incompressible,
        curl_free: decomposition.gradient,
        swirl: swirl_field,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_follows_contours() {
        // Contour layer rises with x; its contour lines run along y, so the
        // flow must be vertical.
        let mut contour = ScalarImage::new(8, 8).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                contour.set(x, y, 1.0 + x as f32);
            }
        }
        let magnitude = ScalarImage::filled(8, 8, 2.0).unwrap();

        let flow = layer_flow(&magnitude, &contour, 40).unwrap();
        for y in 0..8 {
            for x in 1..7 {
                let v = flow.velocity.get(x, y);
                assert!(v.x.abs() < 1e-6);
                assert!((v.y - 2.0).abs() < 1e-5, "interior slope 1 scaled by 2");
            }
        }
    }

    #[test]
    fn test_dead_cells_have_no_flow() {
        let mut magnitude = ScalarImage::filled(4, 4, 1.0).unwrap();
        magnitude.set(1, 1, 0.0);
        let contour = ScalarImage::filled(4, 4, 1.0).unwrap();
        let flow = layer_flow(&magnitude, &contour, 10).unwrap();
        assert_eq!(flow.velocity.get(1, 1), Vec2::ZERO);
    }

    #[test]
    fn test_components_sum_to_velocity() {
        let mut contour = ScalarImage::new(8, 8).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                contour.set(x, y, 1.0 + (x + y) as f32 * 0.5);
            }
        }
        let magnitude = ScalarImage::filled(8, 8, 1.0).unwrap();
        let flow = layer_flow(&magnitude, &contour, 60).unwrap();
        for i in 0..flow.velocity.len() {
            let sum = flow.incompressible.as_slice()[i] + flow.curl_free.as_slice()[i];
            assert!((sum - flow.velocity.as_slice()[i]).length() < 1e-5);
        }
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let a = ScalarImage::new(4, 4).unwrap();
        let b = ScalarImage::new(5, 4).unwrap();
        assert!(layer_flow(&a, &b, 10).is_err());
    }
}
