//! Helmholtz-Hodge decomposition of a 2D velocity field.
//!
//! Any field splits as `velocity = incompressible + gradient` where the
//! incompressible part is divergence-free and the gradient part curl-free.
//! Solve `laplacian(phi) = div(velocity)`, take `gradient = grad(phi)`,
//! subtract. Accuracy is bounded by the relaxation iteration count.

use crate::core::types::{Result, Vec2};
use crate::field::poisson;
use crate::field::{valid, Mask};
use crate::image::buffer::{ScalarImage, Vec2Image};

/// Decomposition output, scratch fields included.
#[derive(Clone, Debug)]
pub struct Decomposition {
    /// Divergence-free component.
    pub incompressible: Vec2Image,
    /// Curl-free component (`grad(phi)`).
    pub gradient: Vec2Image,
    /// Divergence of the input field.
    pub divergence: ScalarImage,
    /// Solved potential.
    pub potential: ScalarImage,
}

/// Gradient of the potential. Invalid or out-of-bounds neighbours fall back
/// to the centre sample; not negated (this is `+grad(phi)`).
fn potential_gradient(phi: &ScalarImage, mask: Option<&Mask>) -> Vec2Image {
    let w = phi.width();
    let h = phi.height();
    let ws = w as usize;
    let p = phi.as_slice();
    let mut out = Vec2Image::new(w, h).expect("potential extents already validated");

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            if !valid(mask, idx) {
                continue;
            }

            let centre = p[idx];
            let left = if x > 0 && valid(mask, idx - 1) { p[idx - 1] } else { centre };
            let right = if x + 1 < w && valid(mask, idx + 1) { p[idx + 1] } else { centre };
            let up = if y > 0 && valid(mask, idx - ws) { p[idx - ws] } else { centre };
            let down = if y + 1 < h && valid(mask, idx + ws) { p[idx + ws] } else { centre };

            out.as_mut_slice()[idx] = Vec2::new((right - left) * 0.5, (down - up) * 0.5);
        }
    }
    out
}

/// Decompose `velocity` with the given relaxation iteration count.
pub fn decompose(
    velocity: &Vec2Image,
    mask: Option<&Mask>,
    iterations: u32,
) -> Result<Decomposition> {
    let divergence = poisson::divergence(velocity, mask)?;
    let potential = poisson::solve(&divergence, mask, iterations)?;
    let gradient = potential_gradient(&potential, mask);

    let mut incompressible = Vec2Image::new(velocity.width(), velocity.height())?;
    for ((out, &v), &g) in incompressible
        .as_mut_slice()
        .iter_mut()
        .zip(velocity.as_slice())
        .zip(gradient.as_slice())
    {
        *out = v - g;
    }

    Ok(Decomposition {
        incompressible,
        gradient,
        divergence,
        potential,
    })
}
