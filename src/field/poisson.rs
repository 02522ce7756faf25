//! Divergence and the shared Gauss-Seidel relaxation skeleton.

use crate::core::types::Result;
use crate::field::{valid, Mask};
use crate::image::buffer::{ScalarImage, Vec2Image};
use crate::core::error::Error;

/// Default relaxation iteration count.
pub const DEFAULT_ITERATIONS: u32 = 40;

fn check_mask_len(mask: Option<&Mask>, n: usize) -> Result<()> {
    if let Some(mask) = mask {
        if mask.len() != n {
            return Err(Error::InvalidArgument(format!(
                "mask length {} does not match field of {n} cells",
                mask.len()
            )));
        }
    }
    Ok(())
}

/// Divergence of a velocity field: `du/dx + dv/dy`. Central differences
/// where both neighbours are valid, one-sided otherwise; masked cells
/// contribute zero.
pub fn divergence(velocity: &Vec2Image, mask: Option<&Mask>) -> Result<ScalarImage> {
    check_mask_len(mask, velocity.len())?;

    let w = velocity.width();
    let h = velocity.height();
    let v = velocity.as_slice();
    let mut out = ScalarImage::new(w, h)?;
    let ws = w as usize;

    for y in 0..h {
        for x in 0..w {
            let idx = velocity.idx(x, y);
            if !valid(mask, idx) {
                continue;
            }

            let left_ok = x > 0 && valid(mask, idx - 1);
            let right_ok = x + 1 < w && valid(mask, idx + 1);
            let up_ok = y > 0 && valid(mask, idx - ws);
            let down_ok = y + 1 < h && valid(mask, idx + ws);

            let dudx = if left_ok && right_ok {
                (v[idx + 1].x - v[idx - 1].x) * 0.5
            } else if right_ok {
                v[idx + 1].x - v[idx].x
            } else if left_ok {
                v[idx].x - v[idx - 1].x
            } else {
                0.0
            };

            let dvdy = if up_ok && down_ok {
                (v[idx + ws].y - v[idx - ws].y) * 0.5
            } else if down_ok {
                v[idx + ws].y - v[idx].y
            } else if up_ok {
                v[idx].y - v[idx - ws].y
            } else {
                0.0
            };

            out.as_mut_slice()[idx] = dudx + dvdy;
        }
    }
    Ok(out)
}

/// Gauss-Seidel relaxation of `laplacian(phi) = rhs`, starting from zero.
/// Each sweep replaces `phi` with the average of its valid 4-neighbours
/// minus the local right-hand side, divided by the neighbour count.
pub fn solve(rhs: &ScalarImage, mask: Option<&Mask>, iterations: u32) -> Result<ScalarImage> {
    check_mask_len(mask, rhs.len())?;
    if iterations == 0 {
        return Err(Error::InvalidArgument("relaxation needs at least one iteration".into()));
    }

    let w = rhs.width();
    let h = rhs.height();
    let ws = w as usize;
    let f = rhs.as_slice();
    let mut phi = ScalarImage::new(w, h)?;

    for _ in 0..iterations {
        let p = phi.as_mut_slice();
        for y in 0..h {
            for x in 0..w {
                let idx = (y * w + x) as usize;
                if !valid(mask, idx) {
                    continue;
                }

                let mut sum = 0.0;
                let mut count = 0;
                if x > 0 && valid(mask, idx - 1) {
                    sum += p[idx - 1];
                    count += 1;
                }
                if x + 1 < w && valid(mask, idx + 1) {
                    sum += p[idx + 1];
                    count += 1;
                }
                if y > 0 && valid(mask, idx - ws) {
                    sum += p[idx - ws];
                    count += 1;
                }
                if y + 1 < h && valid(mask, idx + ws) {
                    sum += p[idx + ws];
                    count += 1;
                }

                if count > 0 {
                    p[idx] = (sum - f[idx]) / count as f32;
                }
            }
        }
    }
    Ok(phi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;

    #[test]
    fn test_divergence_of_uniform_flow_is_zero() {
        let velocity = Vec2Image::filled(5, 5, Vec2::new(1.0, -2.0)).unwrap();
        let div = divergence(&velocity, None).unwrap();
        assert!(div.as_slice().iter().all(|&d| d.abs() < 1e-6));
    }

    #[test]
    fn test_divergence_of_expanding_flow() {
        // v = (x, y) has divergence 2 everywhere.
        let mut velocity = Vec2Image::new(6, 6).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                velocity.set(x, y, Vec2::new(x as f32, y as f32));
            }
        }
        let div = divergence(&velocity, None).unwrap();
        for y in 0..6 {
            for x in 0..6 {
                assert!((div.get(x, y) - 2.0).abs() < 1e-5, "({x},{y})");
            }
        }
    }

    #[test]
    fn test_masked_cells_contribute_zero() {
        let mut velocity = Vec2Image::new(4, 1).unwrap();
        for x in 0..4 {
            velocity.set(x, 0, Vec2::new(x as f32, 0.0));
        }
        let mask_bools = vec![true, false, true, true];
        let mask = Mask::Bools(&mask_bools);
        let div = divergence(&velocity, Some(&mask)).unwrap();
        assert_eq!(div.get(1, 0), 0.0);
        // (2,0) loses its left neighbour and falls back to one-sided.
        assert!((div.get(2, 0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_solve_zero_rhs_stays_zero() {
        let rhs = ScalarImage::new(8, 8).unwrap();
        let phi = solve(&rhs, None, 10).unwrap();
        assert!(phi.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_solve_reduces_residual() {
        // Zero-mean dipole so the all-Neumann system stays consistent.
        let mut rhs = ScalarImage::new(9, 9).unwrap();
        rhs.set(3, 4, 1.0);
        rhs.set(5, 4, -1.0);

        let residual = |phi: &ScalarImage| -> f32 {
            let mut worst = 0.0f32;
            for y in 1..8u32 {
                for x in 1..8u32 {
                    let lap = phi.get(x - 1, y) + phi.get(x + 1, y) + phi.get(x, y - 1)
                        + phi.get(x, y + 1)
                        - 4.0 * phi.get(x, y);
                    worst = worst.max((lap - rhs.get(x, y)).abs());
                }
            }
            worst
        };

        let coarse = solve(&rhs, None, 5).unwrap();
        let fine = solve(&rhs, None, 80).unwrap();
        assert!(residual(&fine) < residual(&coarse));
        assert!(residual(&fine) < 0.05);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let rhs = ScalarImage::new(3, 3).unwrap();
        assert!(solve(&rhs, None, 0).is_err());
    }
}
