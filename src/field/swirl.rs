//! Divergence-driven swirl field.
//!
//! At sources and sinks the velocity is rotated 90 degrees to produce
//! rotational motion; the sign of the divergence picks the rotation
//! direction, its normalised magnitude (smoothstepped) the blend.

use crate::core::types::{Result, Vec2};
use crate::field::poisson;
use crate::field::{valid, Mask};
use crate::image::buffer::{ScalarImage, Vec2Image};

/// Build the swirl field. `divergence` may be supplied to reuse an earlier
/// computation; otherwise it is derived from `velocity`.
pub fn swirl(
    velocity: &Vec2Image,
    divergence: Option<&ScalarImage>,
    mask: Option<&Mask>,
    strength: f32,
) -> Result<Vec2Image> {
    let computed;
    let div = match divergence {
        Some(d) => d,
        None => {
            computed = poisson::divergence(velocity, mask)?;
            &computed
        }
    };

    let mut max_div = 0.0f32;
    for &d in div.as_slice() {
        max_div = max_div.max(d.abs());
    }
    if max_div < 1e-6 {
        max_div = 1.0;
    }

    let mut out = Vec2Image::new(velocity.width(), velocity.height())?;
    for idx in 0..velocity.len() {
        if !valid(mask, idx) {
            continue;
        }

        let v = velocity.as_slice()[idx];
        let d = div.as_slice()[idx];

        let norm = d.abs() / max_div;
        let mut blend = norm * norm * (3.0 - 2.0 * norm);
        blend *= strength;
        if blend > 1.0 {
            blend = 1.0;
        }

        let sign = if d >= 0.0 { 1.0 } else { -1.0 };
        out.as_mut_slice()[idx] = Vec2::new(-v.y * sign, v.x * sign) * blend;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divergence_free_flow_has_no_swirl() {
        let velocity = Vec2Image::filled(6, 6, Vec2::new(1.0, 0.5)).unwrap();
        let s = swirl(&velocity, None, None, 1.0).unwrap();
        assert!(s.as_slice().iter().all(|v| v.length() < 1e-6));
    }

    #[test]
    fn test_swirl_is_perpendicular() {
        // Expanding flow v = (x - c, y - c) has positive divergence.
        let mut velocity = Vec2Image::new(7, 7).unwrap();
        for y in 0..7 {
            for x in 0..7 {
                velocity.set(x, y, Vec2::new(x as f32 - 3.0, y as f32 - 3.0));
            }
        }
        let s = swirl(&velocity, None, None, 1.0).unwrap();
        for idx in 0..velocity.len() {
            let v = velocity.as_slice()[idx];
            let sv = s.as_slice()[idx];
            if sv.length() > 1e-6 {
                assert!(v.dot(sv).abs() < 1e-4, "swirl must be perpendicular");
            }
        }
    }

    #[test]
    fn test_strength_scales_blend() {
        let mut velocity = Vec2Image::new(5, 5).unwrap();
        for y in 0..5 {
            for x in 0..5 {
                velocity.set(x, y, Vec2::new(x as f32, 0.0));
            }
        }
        let weak = swirl(&velocity, None, None, 0.25).unwrap();
        let strong = swirl(&velocity, None, None, 1.0).unwrap();
        let idx = velocity.idx(2, 2);
        assert!(weak.as_slice()[idx].length() < strong.as_slice()[idx].length() + 1e-6);
    }

    #[test]
    fn test_supplied_divergence_is_used() {
        let velocity = Vec2Image::filled(4, 4, Vec2::new(0.0, 1.0)).unwrap();
        // Force a fake divergence: swirl appears even for a uniform flow.
        let div = ScalarImage::filled(4, 4, 1.0).unwrap();
        let s = swirl(&velocity, Some(&div), None, 1.0).unwrap();
        // norm = 1 everywhere -> blend = 1; rotated (0,1) -> (-1,0).
        for v in s.as_slice() {
            assert!((v.x + 1.0).abs() < 1e-6);
            assert!(v.y.abs() < 1e-6);
        }
    }
}
