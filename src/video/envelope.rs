//! Temporal envelope: when each pixel turns on and off.
//!
//! Pass one of the video aggregation. Tracks the first and last frame in
//! which every pixel is active (alpha above zero) and bakes the result
//! into an RGBA envelope image plus scalar metadata for the gradient
//! volume pass.

use crate::core::error::Error;
use crate::core::types::Result;
use crate::image::buffer::{Frame, Rgba8};

/// Aggregate envelope statistics over the whole clip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnvelopeMetadata {
    pub total_frames: u32,
    /// Earliest / latest first-active frame over all active pixels.
    pub min_attack_frame: u32,
    pub max_attack_frame: u32,
    /// Earliest / latest last-active frame over all active pixels.
    pub min_release_frame: u32,
    pub max_release_frame: u32,
}

/// Streaming envelope aggregator.
pub struct EnvelopeBuilder {
    width: u32,
    height: u32,
    first: Vec<i64>,
    last: Vec<i64>,
}

impl EnvelopeBuilder {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let n = crate::image::buffer::checked_area(width, height)?;
        Ok(Self {
            width,
            height,
            first: vec![-1; n],
            last: vec![-1; n],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fold one frame into the per-pixel activity spans.
    pub fn process_frame(&mut self, frame: &Frame, frame_index: u32) -> Result<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(Error::ShapeMismatch {
                expected_w: self.width,
                expected_h: self.height,
                got_w: frame.width(),
                got_h: frame.height(),
            });
        }

        for (idx, pixel) in frame.as_slice().iter().enumerate() {
            if pixel.a == 0 {
                continue;
            }
            if self.first[idx] < 0 {
                self.first[idx] = frame_index as i64;
            }
            self.last[idx] = frame_index as i64;
        }
        Ok(())
    }

    /// Bake the envelope image and metadata.
    ///
    /// Per active pixel: R = attack normalised by the latest attack,
    /// G = release position inside the release window, B = active span as a
    /// fraction of the clip, A = 255. Never-active pixels stay zeroed.
    pub fn build(&self, total_frames: u32) -> Result<(Frame, EnvelopeMetadata)> {
        if total_frames == 0 {
            return Err(Error::InvalidArgument("envelope needs at least one frame".into()));
        }

        let mut meta = EnvelopeMetadata {
            total_frames,
            min_attack_frame: u32::MAX,
            max_attack_frame: 0,
            min_release_frame: u32::MAX,
            max_release_frame: 0,
        };
        let mut any_active = false;

        for idx in 0..self.first.len() {
            if self.first[idx] < 0 {
                continue;
            }
            any_active = true;
            let attack = self.first[idx] as u32;
            let release = self.last[idx] as u32;
            meta.min_attack_frame = meta.min_attack_frame.min(attack);
            meta.max_attack_frame = meta.max_attack_frame.max(attack);
            meta.min_release_frame = meta.min_release_frame.min(release);
            meta.max_release_frame = meta.max_release_frame.max(release);
        }
        if !any_active {
            meta.min_attack_frame = 0;
            meta.min_release_frame = 0;
        }

        let attack_span = meta.max_attack_frame.max(1) as f32;
        let release_span = (meta.max_release_frame - meta.min_release_frame).max(1) as f32;

        let mut envelope = Frame::new(self.width, self.height)?;
        for (idx, out) in envelope.as_mut_slice().iter_mut().enumerate() {
            if self.first[idx] < 0 {
                continue;
            }
            let attack = self.first[idx] as f32;
            let release = self.last[idx] as f32;
            let span = (self.last[idx] - self.first[idx] + 1) as f32;

            *out = Rgba8::new(
                (attack / attack_span * 255.0).round().clamp(0.0, 255.0) as u8,
                ((release - meta.min_release_frame as f32) / release_span * 255.0)
                    .round()
                    .clamp(0.0, 255.0) as u8,
                (span / total_frames as f32 * 255.0).round().clamp(0.0, 255.0) as u8,
                255,
            );
        }

        Ok((envelope, meta))
    }
}
