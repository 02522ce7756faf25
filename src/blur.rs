//! Constraint-clamped iterative box blur.
//!
//! Every pixel carries a `[min, max]` band and a current value. Each pass
//! box-averages the 3x3 neighbourhood (ignoring pixels whose band is
//! inverted, which marks them invalid), clamps the result back into the
//! pixel's own band and swaps buffers. Convergence is the largest
//! per-pixel change of a pass.

use crate::core::types::Result;
use crate::image::buffer::checked_area;

/// Double-buffered constrained blur state.
pub struct SmartBlur {
    width: u32,
    height: u32,
    values: Vec<f32>,
    min_values: Vec<f32>,
    max_values: Vec<f32>,
    scratch: Vec<f32>,
}

impl SmartBlur {
    /// All bands start at `[0, 0]` with value 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let n = checked_area(width, height)?;
        Ok(Self {
            width,
            height,
            values: vec![0.0; n],
            min_values: vec![0.0; n],
            max_values: vec![0.0; n],
            scratch: vec![0.0; n],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Set one pixel's band and initial value (clamped into the band).
    /// An inverted band (`min > max`) marks the pixel invalid: it keeps its
    /// value and is skipped by neighbours.
    pub fn set_constraints(&mut self, x: u32, y: u32, min: f32, max: f32, initial: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) as usize;
        self.min_values[idx] = min;
        self.max_values[idx] = max;
        self.values[idx] = if min <= max { initial.clamp(min, max) } else { initial };
    }

    pub fn value(&self, x: u32, y: u32) -> f32 {
        self.values[(y * self.width + x) as usize]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// One blur pass. Returns the maximum absolute per-pixel change.
    pub fn iterate(&mut self) -> f32 {
        let w = self.width as i32;
        let h = self.height as i32;
        let mut max_change = 0.0f32;

        for y in 0..h {
            for x in 0..w {
                let idx = (y * w + x) as usize;

                if self.min_values[idx] > self.max_values[idx] {
                    self.scratch[idx] = self.values[idx];
                    continue;
                }

                let mut sum = 0.0;
                let mut count = 0;
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        let nx = x + dx;
                        let ny = y + dy;
                        if nx < 0 || nx >= w || ny < 0 || ny >= h {
                            continue;
                        }
                        let nidx = (ny * w + nx) as usize;
                        if self.min_values[nidx] <= self.max_values[nidx] {
                            sum += self.values[nidx];
                            count += 1;
                        }
                    }
                }

                let blurred = if count > 0 { sum / count as f32 } else { self.values[idx] };
                let clamped = blurred.clamp(self.min_values[idx], self.max_values[idx]);
                self.scratch[idx] = clamped;

                let change = (clamped - self.values[idx]).abs();
                if change > max_change {
                    max_change = change;
                }
            }
        }

        std::mem::swap(&mut self.values, &mut self.scratch);
        max_change
    }

    /// Iterate until the largest change drops below `threshold`. Returns
    /// the number of passes used; `max_iterations` signals non-convergence.
    pub fn run(&mut self, threshold: f32, max_iterations: u32) -> u32 {
        for iteration in 0..max_iterations {
            if self.iterate() < threshold {
                return iteration + 1;
            }
        }
        max_iterations
    }
}
