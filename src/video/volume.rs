//! Gradient volume: a 3D lookup texture built by reverse trilinear splat.
//!
//! Pass two of the video aggregation. Every active pixel of every frame is
//! scattered into the volume at `(u, v, w)` where `u`/`v` come from the
//! envelope image's attack/release channels and `w` from the pixel's fade
//! progress through its own lifetime. Each sample lands in eight voxels
//! with trilinear weights; accumulated weights normalise the volume at
//! build time.

use crate::core::error::Error;
use crate::core::types::Result;
use crate::image::buffer::{Frame, Rgba8, Volume, MAX_ELEMENTS};
use crate::video::envelope::EnvelopeMetadata;

/// Colour written into voxels no sample ever reached.
pub const UNMAPPED_VOXEL: Rgba8 = Rgba8 {
    r: 255,
    g: 0,
    b: 255,
    a: 255,
};

#[derive(Clone, Copy, Default)]
struct Accumulator {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
    weight: f32,
}

/// Streaming volume aggregator.
pub struct GradientVolumeBuilder<'a> {
    envelope: &'a Frame,
    meta: EnvelopeMetadata,
    width: u32,
    height: u32,
    depth: u32,
    accum: Vec<Accumulator>,
}

impl<'a> GradientVolumeBuilder<'a> {
    /// `width x height x depth` is the volume extent, independent of the
    /// frame extent.
    pub fn new(
        envelope: &'a Frame,
        meta: EnvelopeMetadata,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Result<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(Error::InvalidArgument(format!(
                "zero volume extent: {width}x{height}x{depth}"
            )));
        }
        if meta.total_frames == 0 {
            return Err(Error::InvalidArgument(
                "envelope metadata reports zero frames".into(),
            ));
        }
        let len = width as u64 * height as u64 * depth as u64;
        if len > MAX_ELEMENTS {
            return Err(Error::Allocation(len));
        }
        Ok(Self {
            envelope,
            meta,
            width,
            height,
            depth,
            accum: vec![Accumulator::default(); len as usize],
        })
    }

    /// Scatter one frame into the volume.
    pub fn process_frame(&mut self, frame: &Frame, frame_index: u32) -> Result<()> {
        if frame.width() != self.envelope.width() || frame.height() != self.envelope.height() {
            return Err(Error::ShapeMismatch {
                expected_w: self.envelope.width(),
                expected_h: self.envelope.height(),
                got_w: frame.width(),
                got_h: frame.height(),
            });
        }

        let to_width = self.width as f32 / 255.0;
        let to_height = self.height as f32 / 255.0;
        let to_depth = self.depth as f32;

        let total = self.meta.total_frames as f32;
        let time = frame_index as f32 / total;
        let fade_in_duration = self.meta.max_attack_frame as f32 / total;
        let fade_out_duration =
            (self.meta.max_release_frame - self.meta.min_release_frame) as f32 / total;
        let fade_out_start = self.meta.min_release_frame as f32 / total;

        for (idx, colour) in frame.as_slice().iter().enumerate() {
            let env = self.envelope.as_slice()[idx];
            if env.a == 0 {
                continue;
            }

            let attack = env.r as f32 / 255.0;
            let release = env.g as f32 / 255.0;

            // Where this pixel is in its own fade-in..fade-out window.
            let fade_in_start = attack * fade_in_duration;
            let fade_out_end = release * fade_out_duration + fade_out_start;
            let fade_progress = (time - fade_in_start) / (fade_out_end - fade_in_start);
            if !fade_progress.is_finite() || !(0.0..=1.0).contains(&fade_progress) {
                continue;
            }

            let tex = [
                env.r as f32 * to_width,
                env.g as f32 * to_height,
                fade_progress * to_depth,
            ];
            let rgba = [
                colour.r as f32,
                colour.g as f32,
                colour.b as f32,
                colour.a as f32,
            ];
            self.splat(tex, rgba);
        }
        Ok(())
    }

    /// Reverse trilinear splat: distribute the sample into the eight
    /// surrounding voxels, tracking the weights for normalisation.
    fn splat(&mut self, tex: [f32; 3], rgba: [f32; 4]) {
        let x0 = tex[0].floor() as i64;
        let y0 = tex[1].floor() as i64;
        let z0 = tex[2].floor() as i64;

        let fx = tex[0] - x0 as f32;
        let fy = tex[1] - y0 as f32;
        let fz = tex[2] - z0 as f32;

        for corner in 0..8u32 {
            let cx = x0 + (corner >> 2) as i64;
            let cy = y0 + ((corner >> 1) & 1) as i64;
            let cz = z0 + (corner & 1) as i64;

            if cx < 0
                || cx >= self.width as i64
                || cy < 0
                || cy >= self.height as i64
                || cz < 0
                || cz >= self.depth as i64
            {
                continue;
            }

            let wx = if corner >> 2 == 1 { fx } else { 1.0 - fx };
            let wy = if (corner >> 1) & 1 == 1 { fy } else { 1.0 - fy };
            let wz = if corner & 1 == 1 { fz } else { 1.0 - fz };
            let weight = wx * wy * wz;
            if weight <= 0.0 {
                continue;
            }

            let idx = ((cz as u32 * self.height + cy as u32) * self.width + cx as u32) as usize;
            let acc = &mut self.accum[idx];
            acc.r += rgba[0] * weight;
            acc.g += rgba[1] * weight;
            acc.b += rgba[2] * weight;
            acc.a += rgba[3] * weight;
            acc.weight += weight;
        }
    }

    /// Normalise the accumulator into the final volume. Voxels that never
    /// received weight get the sentinel colour.
    pub fn build(&self) -> Result<Volume> {
        let mut volume = Volume::new(self.width, self.height, self.depth)?;
        for (acc, out) in self.accum.iter().zip(volume.as_mut_slice()) {
            *out = if acc.weight == 0.0 {
                UNMAPPED_VOXEL
            } else {
                let inv = 1.0 / acc.weight;
                Rgba8::new(
                    (acc.r * inv).round().clamp(0.0, 255.0) as u8,
                    (acc.g * inv).round().clamp(0.0, 255.0) as u8,
                    (acc.b * inv).round().clamp(0.0, 255.0) as u8,
                    (acc.a * inv).round().clamp(0.0, 255.0) as u8,
                )
            };
        }
        Ok(volume)
    }
}
