//! Image buffers and palette adjacency

pub mod buffer;
pub mod palette;

pub use buffer::{ChannelImage, Frame, Image, Rgba8, ScalarImage, Vec2Image, Vec3Image, Volume};
pub use palette::PaletteMap;
