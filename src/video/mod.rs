//! Temporal aggregation across animation frames

pub mod envelope;
pub mod volume;
pub mod processor;

pub use envelope::{EnvelopeBuilder, EnvelopeMetadata};
pub use processor::{FrameSource, SourceFrame, VideoOutput, VideoProcessor};
pub use volume::GradientVolumeBuilder;
