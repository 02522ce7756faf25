//! Two-pass video driver over an external frame source.
//!
//! Decoding stays outside the core: a [`FrameSource`] hands over RGBA
//! frames in order and can be rewound for the second pass. Pass one builds
//! the temporal envelope, pass two scatters every frame into the gradient
//! volume using that envelope.

use crate::core::error::Error;
use crate::core::types::Result;
use crate::image::buffer::{Frame, Volume};
use crate::video::envelope::{EnvelopeBuilder, EnvelopeMetadata};
use crate::video::volume::GradientVolumeBuilder;

/// Default gradient volume extent.
pub const DEFAULT_VOLUME_EXTENT: (u32, u32, u32) = (64, 32, 32);

/// One decoded frame as delivered by the host.
pub struct SourceFrame {
    pub index: u32,
    pub frame: Frame,
    /// Presentation delay in milliseconds, when the container carries one.
    /// Timing is the host's concern; the aggregation ignores it.
    pub delay_ms: Option<u32>,
}

/// External decoder interface (a GIF reader, a test fixture, ...).
pub trait FrameSource {
    /// Frame extent; every yielded frame must match.
    fn dimensions(&self) -> (u32, u32);

    /// Next frame in presentation order, or `None` at the end.
    fn next_frame(&mut self) -> Option<SourceFrame>;

    /// Restart from the first frame.
    fn reset(&mut self);
}

/// Everything the two passes produce.
#[derive(Clone, Debug)]
pub struct VideoOutput {
    pub envelope: Frame,
    pub metadata: EnvelopeMetadata,
    pub volume: Volume,
}

/// Drives both aggregation passes over a frame source.
pub struct VideoProcessor {
    volume_extent: (u32, u32, u32),
}

impl VideoProcessor {
    pub fn new(volume_extent: (u32, u32, u32)) -> Self {
        Self { volume_extent }
    }

    /// Run both passes and build the outputs.
    pub fn process<S: FrameSource>(&self, source: &mut S) -> Result<VideoOutput> {
        let (width, height) = source.dimensions();

        // Pass 1: envelope.
        let mut envelope_builder = EnvelopeBuilder::new(width, height)?;
        let mut total_frames = 0u32;
        while let Some(sample) = source.next_frame() {
            envelope_builder.process_frame(&sample.frame, sample.index)?;
            total_frames = total_frames.max(sample.index + 1);
        }
        if total_frames == 0 {
            return Err(Error::InvalidArgument("frame source yielded no frames".into()));
        }
        let (envelope, metadata) = envelope_builder.build(total_frames)?;
        log::info!("envelope pass done: {total_frames} frames, {width}x{height}");

        // Pass 2: gradient volume.
        source.reset();
        let (vw, vh, vd) = self.volume_extent;
        let mut volume_builder = GradientVolumeBuilder::new(&envelope, metadata, vw, vh, vd)?;
        while let Some(sample) = source.next_frame() {
            volume_builder.process_frame(&sample.frame, sample.index)?;
        }
        let volume = volume_builder.build()?;
        log::info!("gradient pass done: {vw}x{vh}x{vd} volume");

        Ok(VideoOutput {
            envelope,
            metadata,
            volume,
        })
    }
}

impl Default for VideoProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME_EXTENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::buffer::Rgba8;
    use crate::video::volume::UNMAPPED_VOXEL;

    /// In-memory frame source for the tests.
    struct ClipSource {
        frames: Vec<Frame>,
        cursor: usize,
    }

    impl ClipSource {
        fn new(frames: Vec<Frame>) -> Self {
            Self { frames, cursor: 0 }
        }
    }

    impl FrameSource for ClipSource {
        fn dimensions(&self) -> (u32, u32) {
            (self.frames[0].width(), self.frames[0].height())
        }

        fn next_frame(&mut self) -> Option<SourceFrame> {
            let index = self.cursor;
            let frame = self.frames.get(index)?.clone();
            self.cursor += 1;
            Some(SourceFrame {
                index: index as u32,
                frame,
                delay_ms: Some(40),
            })
        }

        fn reset(&mut self) {
            self.cursor = 0;
        }
    }

    fn fading_clip(frames: u32) -> Vec<Frame> {
        (0..frames)
            .map(|i| {
                let mut frame = Frame::new(4, 4).unwrap();
                for y in 0..4 {
                    for x in 0..4 {
                        // Pixels switch on one diagonal at a time.
                        if x + y <= i {
                            frame.set(x, y, Rgba8::new(50 + 20 * x as u8, 100, 150, 255));
                        }
                    }
                }
                frame
            })
            .collect()
    }

    #[test]
    fn test_two_pass_pipeline() {
        let mut source = ClipSource::new(fading_clip(8));
        let output = VideoProcessor::new((8, 8, 8)).process(&mut source).unwrap();

        assert_eq!(output.metadata.total_frames, 8);
        assert_eq!(output.metadata.min_attack_frame, 0);
        assert_eq!(output.metadata.max_attack_frame, 6);
        // Every pixel stays on until the end.
        assert_eq!(output.metadata.min_release_frame, 7);
        assert_eq!(output.metadata.max_release_frame, 7);

        // Every pixel was active at some point.
        assert!(output.envelope.as_slice().iter().all(|p| p.a == 255));
        // At least one voxel received samples.
        assert!(output.volume.as_slice().iter().any(|&v| v != UNMAPPED_VOXEL));
    }

    #[test]
    fn test_empty_source_rejected() {
        let mut source = ClipSource::new(vec![]);
        // dimensions() would panic on an empty clip; give it one dummy
        // frame and an exhausted cursor instead.
        source.frames.push(Frame::new(2, 2).unwrap());
        source.cursor = 1;
        let result = VideoProcessor::default().process(&mut source);
        assert!(result.is_err());
    }

    #[test]
    fn test_volume_extent_respected() {
        let mut source = ClipSource::new(fading_clip(4));
        let output = VideoProcessor::new((16, 4, 2)).process(&mut source).unwrap();
        assert_eq!(output.volume.width(), 16);
        assert_eq!(output.volume.height(), 4);
        assert_eq!(output.volume.depth(), 2);
    }
}
