//! Legacy two-pass chamfer distance transform.
//!
//! Integer 3/4 weights (orthogonal/diagonal), scaled by 1/3 to approximate
//! Euclidean distance. A forward raster sweep and a backward sweep carry
//! both the distance and the coordinates of the nearest boundary pixel.
//! Superseded for quality work by the metric-parametric SDF flood, kept as
//! the cheap non-iterative path.

use crate::image::buffer::{ChannelImage, ScalarImage};

const ORTHO: i32 = 3;
const DIAG: i32 = 4;
const SCALE: f32 = 1.0 / 3.0;
const INF: i32 = i32::MAX;

/// Chamfer output: distance to the nearest palette boundary plus the
/// boundary pixel itself. `(-1, -1)` marks pixels with no boundary anywhere.
#[derive(Clone, Debug)]
pub struct ChamferResult {
    pub distance: ScalarImage,
    pub nearest: Vec<(i16, i16)>,
}

/// Distance to the nearest boundary pixel (a pixel 4-adjacent to a
/// different palette value).
pub fn chamfer_transform(src: &ChannelImage) -> ChamferResult {
    let w = src.width() as usize;
    let h = src.height() as usize;
    let n = src.len();
    let pixels = src.as_slice();

    let mut dist = vec![INF; n];
    let mut nearest = vec![(-1i16, -1i16); n];

    // Boundary pixels seed at distance zero.
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let v = pixels[i];
            let boundary = (x > 0 && pixels[i - 1] != v)
                || (x + 1 < w && pixels[i + 1] != v)
                || (y > 0 && pixels[i - w] != v)
                || (y + 1 < h && pixels[i + w] != v);
            if boundary {
                dist[i] = 0;
                nearest[i] = (x as i16, y as i16);
            }
        }
    }

    // Forward pass: top-left to bottom-right.
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let mut d = dist[i];
            let mut p = nearest[i];

            let consider = |cand_idx: usize, weight: i32, d: &mut i32, p: &mut (i16, i16)| {
                if dist[cand_idx] != INF {
                    let nd = dist[cand_idx] + weight;
                    if nd < *d {
                        *d = nd;
                        *p = nearest[cand_idx];
                    }
                }
            };

            if x > 0 {
                consider(i - 1, ORTHO, &mut d, &mut p);
            }
            if y > 0 {
                consider(i - w, ORTHO, &mut d, &mut p);
                if x > 0 {
                    consider(i - w - 1, DIAG, &mut d, &mut p);
                }
                if x + 1 < w {
                    consider(i - w + 1, DIAG, &mut d, &mut p);
                }
            }

            dist[i] = d;
            nearest[i] = p;
        }
    }

    // Backward pass: bottom-right to top-left.
    for y in (0..h).rev() {
        for x in (0..w).rev() {
            let i = y * w + x;
            let mut d = dist[i];
            let mut p = nearest[i];

            let consider = |cand_idx: usize, weight: i32, d: &mut i32, p: &mut (i16, i16)| {
                if dist[cand_idx] != INF {
                    let nd = dist[cand_idx] + weight;
                    if nd < *d {
                        *d = nd;
                        *p = nearest[cand_idx];
                    }
                }
            };

            if x + 1 < w {
                consider(i + 1, ORTHO, &mut d, &mut p);
            }
            if y + 1 < h {
                consider(i + w, ORTHO, &mut d, &mut p);
                if x + 1 < w {
                    consider(i + w + 1, DIAG, &mut d, &mut p);
                }
                if x > 0 {
                    consider(i + w - 1, DIAG, &mut d, &mut p);
                }
            }

            dist[i] = d;
            nearest[i] = p;
        }
    }

    let distance: Vec<f32> = dist
        .iter()
        .map(|&d| if d == INF { f32::MAX } else { d as f32 * SCALE })
        .collect();

    ChamferResult {
        distance: ScalarImage::from_vec(src.width(), src.height(), distance)
            .expect("output matches validated source extents"),
        nearest,
    }
}
