//! Priority-queue flood fill with pluggable neighbour rules.
//!
//! Seeds enter the queue with an initial value; cells are then filled in
//! ascending value order, each new cell's value computed by a caller rule
//! from its already-filled neighbours. Rules that return a non-finite value
//! (or exceed `max_value`) halt propagation at that cell, which makes the
//! same machinery serve distance transforms, watershed-style growth and
//! value propagation.

pub mod rules;

use crate::core::error::Error;
use crate::core::types::{Connectivity, Result};
use crate::image::buffer::ScalarImage;
use crate::queue::MinHeap;

/// One already-filled neighbour, as seen by a rule.
#[derive(Clone, Copy, Debug)]
pub struct Neighbour {
    /// The neighbour's filled value.
    pub value: f32,
    /// Relative position (-1, 0 or 1 per axis).
    pub dx: i32,
    pub dy: i32,
    /// Euclidean step length (1 or sqrt(2)).
    pub distance: f32,
}

/// Context handed to the rule for one candidate cell.
#[derive(Debug)]
pub struct RuleContext<'a> {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Filled neighbours only; never empty.
    pub neighbours: &'a [Neighbour],
}

/// Fill origin: the cell is filled with `value` before propagation starts,
/// and `value` doubles as its queue priority.
#[derive(Clone, Copy, Debug)]
pub struct Seed {
    pub x: i32,
    pub y: i32,
    pub value: f32,
}

/// Flood-fill options.
#[derive(Clone, Copy, Debug)]
pub struct FloodParams {
    pub connectivity: Connectivity,
    /// Propagation stops at cells whose rule value exceeds this.
    pub max_value: f32,
}

impl Default for FloodParams {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::Eight,
            max_value: f32::INFINITY,
        }
    }
}

/// Fill values plus the filled mask. Unfilled cells hold `+inf`.
#[derive(Clone, Debug)]
pub struct FloodResult {
    pub values: ScalarImage,
    pub filled: Vec<bool>,
}

/// Run a flood fill. `mask`, when present, marks fillable cells; seeds and
/// propagation never enter cells masked `false`. Out-of-bounds seeds are
/// skipped; an entirely empty seed list is an error.
pub fn flood_fill<R>(
    width: u32,
    height: u32,
    seeds: &[Seed],
    mask: Option<&[bool]>,
    params: FloodParams,
    rule: R,
) -> Result<FloodResult>
where
    R: Fn(&RuleContext) -> f32,
{
    if seeds.is_empty() {
        return Err(Error::InvalidArgument("flood fill needs at least one seed".into()));
    }
    let mut values = ScalarImage::filled(width, height, f32::INFINITY)?;
    let n = values.len();
    if let Some(mask) = mask {
        if mask.len() != n {
            return Err(Error::InvalidArgument(format!(
                "mask length {} does not match {width}x{height}",
                mask.len()
            )));
        }
    }

    let w = width as i32;
    let h = height as i32;
    let mut filled = vec![false; n];
    let mut queue: MinHeap<(i32, i32)> = MinHeap::with_capacity(seeds.len() * 4);

    for seed in seeds {
        if seed.x < 0 || seed.x >= w || seed.y < 0 || seed.y >= h {
            continue;
        }
        let idx = (seed.y * w + seed.x) as usize;
        if mask.is_some_and(|m| !m[idx]) {
            continue;
        }
        values.as_mut_slice()[idx] = seed.value;
        filled[idx] = true;
        queue.push(seed.value, (seed.x, seed.y));
    }

    let offsets = params.connectivity.offsets();
    let mut neighbours = [Neighbour {
        value: 0.0,
        dx: 0,
        dy: 0,
        distance: 0.0,
    }; 8];

    while let Some((_, (cx, cy))) = queue.pop() {
        for &(ox, oy) in offsets {
            let nx = cx + ox;
            let ny = cy + oy;
            if nx < 0 || nx >= w || ny < 0 || ny >= h {
                continue;
            }
            let nidx = (ny * w + nx) as usize;
            if filled[nidx] {
                continue;
            }
            if mask.is_some_and(|m| !m[nidx]) {
                continue;
            }

            // Gather the candidate's filled neighbours for the rule.
            let mut count = 0;
            for &(ox2, oy2) in offsets {
                let nnx = nx + ox2;
                let nny = ny + oy2;
                if nnx < 0 || nnx >= w || nny < 0 || nny >= h {
                    continue;
                }
                let nnidx = (nny * w + nnx) as usize;
                if filled[nnidx] {
                    neighbours[count] = Neighbour {
                        value: values.as_slice()[nnidx],
                        dx: ox2,
                        dy: oy2,
                        distance: ((ox2 * ox2 + oy2 * oy2) as f32).sqrt(),
                    };
                    count += 1;
                }
            }
            if count == 0 {
                continue;
            }

            let ctx = RuleContext {
                x: nx as u32,
                y: ny as u32,
                width,
                height,
                neighbours: &neighbours[..count],
            };
            let new_value = rule(&ctx);
            if !new_value.is_finite() || new_value > params.max_value {
                continue;
            }

            values.as_mut_slice()[nidx] = new_value;
            filled[nidx] = true;
            queue.push(new_value, (nx, ny));
        }
    }

    Ok(FloodResult { values, filled })
}
