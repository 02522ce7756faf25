//! Contour flow: tangent fields along iso-lines with propagated chirality.
//!
//! The gradient points across contours; rotating it 90 degrees gives flow
//! along them, but the rotation direction must be chosen consistently or
//! neighbouring pixels fight each other. Seeds (user-supplied or detected
//! ridges) each carry a chirality; a distance flood finds every pixel's
//! nearest seed and the chirality is inherited from it.

use serde::{Deserialize, Serialize};

use crate::core::types::{Result, Vec2};
use crate::flood::{self, rules, FloodParams, Seed};
use crate::image::buffer::{ScalarImage, Vec2Image};

/// Which Hessian signature counts as a ridge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RidgeMode {
    /// No detection; only user seeds.
    None,
    /// Crests: strongly negative curvature across, flat along.
    #[default]
    Peaks,
    /// Troughs: strongly positive curvature across.
    Valleys,
    /// Peaks and valleys together.
    Both,
    /// Opposite-sign curvatures.
    Saddles,
}

/// Contour-flow parameters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ContourParams {
    pub ridge_mode: RidgeMode,
    /// Minimum normalised ridge strength for a detected seed, in `(0, 1]`.
    /// Non-positive falls back to 0.5.
    pub ridge_threshold: f32,
    /// Influence decay per pixel of seed distance. Non-positive falls back
    /// to 0.1.
    pub influence_falloff: f32,
    /// Below this gradient magnitude the flow is zero. Non-positive falls
    /// back to 0.001.
    pub min_gradient: f32,
    /// Blend between the contour tangent (0) and the raw gradient (1).
    pub gradient_blend: f32,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            ridge_mode: RidgeMode::default(),
            ridge_threshold: 0.5,
            influence_falloff: 0.1,
            min_gradient: 0.001,
            gradient_blend: 0.0,
        }
    }
}

/// A chirality seed: `chirality` is +1 for CCW rotation, -1 for CW.
/// Lower `priority` propagates first.
#[derive(Clone, Copy, Debug)]
pub struct ContourSeed {
    pub x: i32,
    pub y: i32,
    pub chirality: i8,
    pub priority: f32,
}

/// Contour-flow output.
#[derive(Clone, Debug)]
pub struct ContourFlow {
    /// Tangent flow field.
    pub flow: Vec2Image,
    /// Seed influence in `[0, 1]` per pixel.
    pub influence: ScalarImage,
    /// Chosen rotation direction per pixel (+1 / -1).
    pub chirality: Vec<i8>,
    /// Normalised ridge strength, when detection ran.
    pub ridge_strength: Option<ScalarImage>,
}

/// Rotate 90 degrees: positive chirality turns CCW `(x, y) -> (-y, x)`,
/// negative turns CW `(x, y) -> (y, -x)`.
#[inline]
pub fn rotate90(v: Vec2, chirality: i8) -> Vec2 {
    if chirality >= 0 {
        Vec2::new(-v.y, v.x)
    } else {
        Vec2::new(v.y, -v.x)
    }
}

/// Central-difference gradient clamped at the image border (not negated;
/// this one points uphill).
fn raw_gradient(heightmap: &ScalarImage) -> Vec2Image {
    let w = heightmap.width();
    let h = heightmap.height();
    let ws = w as usize;
    let data = heightmap.as_slice();
    let mut out = Vec2Image::new(w, h).expect("heightmap extents already validated");

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            let centre = data[idx];
            let left = if x > 0 { data[idx - 1] } else { centre };
            let right = if x + 1 < w { data[idx + 1] } else { centre };
            let up = if y > 0 { data[idx - ws] } else { centre };
            let down = if y + 1 < h { data[idx + ws] } else { centre };
            out.as_mut_slice()[idx] = Vec2::new((right - left) * 0.5, (down - up) * 0.5);
        }
    }
    out
}

/// Ridge strength from the Hessian eigenvalues, normalised to `[0, 1]`.
/// Border pixels carry zero (the Hessian needs a full 3x3 stencil).
pub fn detect_ridges(heightmap: &ScalarImage, mode: RidgeMode) -> ScalarImage {
    let w = heightmap.width();
    let h = heightmap.height();
    let ws = w as usize;
    let data = heightmap.as_slice();
    let mut out = ScalarImage::new(w, h).expect("heightmap extents already validated");

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let idx = (y * w + x) as usize;

            let centre = data[idx];
            let left = data[idx - 1];
            let right = data[idx + 1];
            let up = data[idx - ws];
            let down = data[idx + ws];
            let ul = data[idx - ws - 1];
            let ur = data[idx - ws + 1];
            let dl = data[idx + ws - 1];
            let dr = data[idx + ws + 1];

            let hxx = right - 2.0 * centre + left;
            let hyy = down - 2.0 * centre + up;
            let hxy = (dr - dl - ur + ul) * 0.25;

            let trace = hxx + hyy;
            let det = hxx * hyy - hxy * hxy;
            let disc = (trace * trace * 0.25 - det).max(0.0).sqrt();
            let lambda1 = trace * 0.5 + disc;
            let lambda2 = trace * 0.5 - disc;

            let peak = lambda2 < -0.01 && lambda1.abs() < lambda2.abs() * 0.5;
            let valley = lambda1 > 0.01 && lambda2.abs() < lambda1.abs() * 0.5;

            let strength = match mode {
                RidgeMode::None => 0.0,
                RidgeMode::Peaks if peak => -lambda2,
                RidgeMode::Valleys if valley => lambda1,
                RidgeMode::Both if peak => -lambda2,
                RidgeMode::Both if valley => lambda1,
                RidgeMode::Saddles if lambda1 * lambda2 < -0.001 => (lambda1 * lambda2).abs(),
                _ => 0.0,
            };
            out.as_mut_slice()[idx] = strength;
        }
    }

    let max_strength = out.as_slice().iter().fold(0.0f32, |m, &v| m.max(v));
    if max_strength > 1e-6 {
        for v in out.as_mut_slice() {
            *v /= max_strength;
        }
    }
    out
}

/// Compute the contour-tangent flow field.
pub fn contour_flow(
    heightmap: &ScalarImage,
    seeds: &[ContourSeed],
    params: &ContourParams,
) -> Result<ContourFlow> {
    let w = heightmap.width();
    let h = heightmap.height();
    let n = heightmap.len();

    let min_gradient = if params.min_gradient > 0.0 { params.min_gradient } else { 0.001 };
    let falloff = if params.influence_falloff > 0.0 { params.influence_falloff } else { 0.1 };
    let blend = params.gradient_blend.clamp(0.0, 1.0);

    let gradient = raw_gradient(heightmap);

    let ridge_strength = if params.ridge_mode != RidgeMode::None {
        Some(detect_ridges(heightmap, params.ridge_mode))
    } else {
        None
    };

    // Seed assembly: user seeds first, then sampled ridge maxima with
    // parity-alternating chirality.
    let max_seeds = seeds.len() + if ridge_strength.is_some() { n / 100 + 1 } else { 0 };
    let mut flood_seeds: Vec<Seed> = Vec::with_capacity(max_seeds + 1);
    let mut seed_chirality = vec![0i8; n];

    for seed in seeds {
        if seed.x < 0 || seed.x >= w as i32 || seed.y < 0 || seed.y >= h as i32 {
            continue;
        }
        if flood_seeds.len() >= max_seeds {
            break;
        }
        flood_seeds.push(Seed {
            x: seed.x,
            y: seed.y,
            value: seed.priority,
        });
        seed_chirality[(seed.y * w as i32 + seed.x) as usize] = seed.chirality;
    }

    if let Some(ridges) = &ridge_strength {
        let threshold = if params.ridge_threshold > 0.0 { params.ridge_threshold } else { 0.5 };
        let rs = ridges.as_slice();

        let mut y = 2;
        'scan: while y + 2 < h {
            let mut x = 2;
            while x + 2 < w {
                if flood_seeds.len() >= max_seeds {
                    break 'scan;
                }
                let idx = (y * w + x) as usize;
                let strength = rs[idx];
                if strength >= threshold {
                    let mut is_max = true;
                    'local: for dy in -1i32..=1 {
                        for dx in -1i32..=1 {
                            if dx == 0 && dy == 0 {
                                continue;
                            }
                            let nidx = ((y as i32 + dy) * w as i32 + x as i32 + dx) as usize;
                            if rs[nidx] > strength {
                                is_max = false;
                                break 'local;
                            }
                        }
                    }
                    if is_max {
                        flood_seeds.push(Seed {
                            x: x as i32,
                            y: y as i32,
                            // Stronger ridges propagate first.
                            value: 1.0 - strength,
                        });
                        let parity = (x / 4 + y / 4) % 2;
                        seed_chirality[idx] = if parity == 1 { 1 } else { -1 };
                    }
                }
                x += 4;
            }
            y += 4;
        }
    }

    if flood_seeds.is_empty() {
        let cx = w / 2;
        let cy = h / 2;
        flood_seeds.push(Seed {
            x: cx as i32,
            y: cy as i32,
            value: 0.0,
        });
        seed_chirality[(cy * w + cx) as usize] = 1;
    }
    log::debug!("contour flow: {} seeds", flood_seeds.len());

    // Distance field from the seeds.
    let distance = flood::flood_fill(
        w,
        h,
        &flood_seeds,
        None,
        FloodParams::default(),
        rules::distance,
    )?;
    let dist = distance.values.as_slice();

    // Chirality propagation: each unassigned pixel inherits from its
    // lowest-distance assigned neighbour. Bounded by W + H passes; stop
    // early once a pass assigns nothing.
    let mut chirality = vec![0i8; n];
    for seed in &flood_seeds {
        let idx = (seed.y * w as i32 + seed.x) as usize;
        chirality[idx] = seed_chirality[idx];
    }

    for _pass in 0..(w + h) {
        let mut changed = false;
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                let idx = (y * w as i32 + x) as usize;
                if chirality[idx] != 0 {
                    continue;
                }

                let mut best_dist = dist[idx];
                let mut best = 0i8;
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = x + dx;
                        let ny = y + dy;
                        if nx < 0 || nx >= w as i32 || ny < 0 || ny >= h as i32 {
                            continue;
                        }
                        let nidx = (ny * w as i32 + nx) as usize;
                        if dist[nidx] < best_dist && chirality[nidx] != 0 {
                            best_dist = dist[nidx];
                            best = chirality[nidx];
                        }
                    }
                }

                if best != 0 {
                    chirality[idx] = best;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    for c in chirality.iter_mut() {
        if *c == 0 {
            *c = 1;
        }
    }

    // Influence falls off exponentially with seed distance.
    let mut influence = ScalarImage::new(w, h)?;
    for (out, &d) in influence.as_mut_slice().iter_mut().zip(dist) {
        if d.is_finite() {
            *out = (-d * falloff).exp();
        }
    }

    // Flow: rotated unit gradient, optionally blended back toward the raw
    // gradient, scaled by magnitude and influence.
    let mut flow = Vec2Image::new(w, h)?;
    for idx in 0..n {
        let g = gradient.as_slice()[idx];
        let mag = g.length();
        if mag < min_gradient {
            continue;
        }

        let unit = g / mag;
        let tangent = rotate90(unit, chirality[idx]);

        let mut direction = if blend > 0.0 {
            let mixed = tangent * (1.0 - blend) + unit * blend;
            let m = mixed.length();
            if m > 1e-6 { mixed / m } else { mixed }
        } else {
            tangent
        };

        direction *= mag * influence.as_slice()[idx];
        flow.as_mut_slice()[idx] = direction;
    }

    Ok(ContourFlow {
        flow,
        influence,
        chirality,
        ridge_strength,
    })
}
