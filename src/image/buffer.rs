//! Row-major pixel buffers shared across the pipeline.
//!
//! All 2D buffers index as `(x, y) -> y * width + x`. Palette channels use
//! `0` as the transparency / no-data sentinel.

use bytemuck::{Pod, Zeroable};

use crate::core::error::Error;
use crate::core::types::{Result, Vec2, Vec3};

/// Transparency sentinel for palette channels.
pub const TRANSPARENT: u8 = 0;

/// Upper bound on the element count of any single buffer (256M).
pub const MAX_ELEMENTS: u64 = 1 << 28;

/// Validate extents and compute the element count of a `width x height`
/// buffer.
pub(crate) fn checked_area(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidArgument(format!(
            "zero image extent: {width}x{height}"
        )));
    }
    let len = width as u64 * height as u64;
    if len > MAX_ELEMENTS {
        return Err(Error::Allocation(len));
    }
    Ok(len as usize)
}

/// Generic row-major `W x H` grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T: Copy + Default> Image<T> {
    /// Create a default-filled image.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = checked_area(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![T::default(); len],
        })
    }

    /// Create an image filled with `value`.
    pub fn filled(width: u32, height: u32, value: T) -> Result<Self> {
        let len = checked_area(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![value; len],
        })
    }

    /// Wrap an existing buffer. The length must be exactly `width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Result<Self> {
        let len = checked_area(width, height)?;
        if data.len() != len {
            return Err(Error::InvalidArgument(format!(
                "buffer length {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Linear index of `(x, y)`.
    #[inline]
    pub fn idx(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y * self.width + x) as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> T {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: T) {
        let idx = self.idx(x, y);
        self.data[idx] = value;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// True when the two images have identical extents.
    pub fn same_shape<U>(&self, other: &Image<U>) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Report a [`Error::ShapeMismatch`] unless `a` and `b` share extents.
pub fn check_same_shape<A, B>(a: &Image<A>, b: &Image<B>) -> Result<()> {
    if a.width != b.width || a.height != b.height {
        return Err(Error::ShapeMismatch {
            expected_w: a.width,
            expected_h: a.height,
            got_w: b.width,
            got_h: b.height,
        });
    }
    Ok(())
}

/// Single-channel palette image (`0` = transparent).
pub type ChannelImage = Image<u8>;

/// Continuous scalar field.
pub type ScalarImage = Image<f32>;

/// 2D vector field.
pub type Vec2Image = Image<Vec2>;

/// 3D vector field (normal maps).
pub type Vec3Image = Image<Vec3>;

/// Interleaved RGBA pixel, little-endian byte order `[R, G, B, A]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channel by index: 0 = R, 1 = G, 2 = B, 3 = A.
    pub fn channel(&self, channel: usize) -> u8 {
        match channel {
            0 => self.r,
            1 => self.g,
            2 => self.b,
            _ => self.a,
        }
    }
}

/// One RGBA frame of the source animation.
pub type Frame = Image<Rgba8>;

impl Frame {
    /// Reinterpret a caller byte buffer (`width * height * 4` bytes).
    pub fn from_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let len = checked_area(width, height)?;
        if bytes.len() != len * 4 {
            return Err(Error::InvalidArgument(format!(
                "byte length {} does not match {width}x{height} RGBA",
                bytes.len()
            )));
        }
        let pixels: &[Rgba8] = bytemuck::cast_slice(bytes);
        Self::from_vec(width, height, pixels.to_vec())
    }

    /// View the frame as raw RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// Extract one channel (0 = R .. 3 = A) as a palette image.
    pub fn extract_channel(&self, channel: usize) -> ChannelImage {
        let data = self.as_slice().iter().map(|p| p.channel(channel)).collect();
        ChannelImage::from_vec(self.width(), self.height(), data)
            .expect("source frame already validated")
    }
}

/// Row-major 3D RGBA grid, index `(x, y, z) -> (z * height + y) * width + x`.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    width: u32,
    height: u32,
    depth: u32,
    data: Vec<Rgba8>,
}

impl Volume {
    pub fn new(width: u32, height: u32, depth: u32) -> Result<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(Error::InvalidArgument(format!(
                "zero volume extent: {width}x{height}x{depth}"
            )));
        }
        let len = width as u64 * height as u64 * depth as u64;
        if len > MAX_ELEMENTS {
            return Err(Error::Allocation(len));
        }
        Ok(Self {
            width,
            height,
            depth,
            data: vec![Rgba8::default(); len as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn idx(&self, x: u32, y: u32, z: u32) -> usize {
        debug_assert!(x < self.width && y < self.height && z < self.depth);
        ((z * self.height + y) * self.width + x) as usize
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32, z: u32) -> Rgba8 {
        self.data[self.idx(x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, z: u32, value: Rgba8) {
        let idx = self.idx(x, y, z);
        self.data[idx] = value;
    }

    pub fn as_slice(&self) -> &[Rgba8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Rgba8] {
        &mut self.data
    }

    /// View the volume as raw RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_indexing() {
        let mut img = ChannelImage::new(4, 3).unwrap();
        img.set(3, 2, 7);
        assert_eq!(img.idx(3, 2), 11);
        assert_eq!(img.get(3, 2), 7);
        assert_eq!(img.as_slice()[11], 7);
    }

    #[test]
    fn test_zero_extent_rejected() {
        assert!(ChannelImage::new(0, 4).is_err());
        assert!(ScalarImage::new(4, 0).is_err());
        assert!(Volume::new(4, 4, 0).is_err());
    }

    #[test]
    fn test_oversized_rejected() {
        let err = ChannelImage::new(1 << 16, 1 << 16).unwrap_err();
        assert!(matches!(err, Error::Allocation(_)));
    }

    #[test]
    fn test_from_vec_length_check() {
        assert!(ChannelImage::from_vec(2, 2, vec![0; 3]).is_err());
        assert!(ChannelImage::from_vec(2, 2, vec![0; 4]).is_ok());
    }

    #[test]
    fn test_frame_byte_round_trip() {
        let bytes: Vec<u8> = (0..16).collect();
        let frame = Frame::from_bytes(2, 2, &bytes).unwrap();
        assert_eq!(frame.get(0, 0), Rgba8::new(0, 1, 2, 3));
        assert_eq!(frame.get(1, 1), Rgba8::new(12, 13, 14, 15));
        assert_eq!(frame.as_bytes(), &bytes[..]);
    }

    #[test]
    fn test_frame_bad_byte_length() {
        assert!(Frame::from_bytes(2, 2, &[0u8; 15]).is_err());
    }

    #[test]
    fn test_extract_channel() {
        let bytes: Vec<u8> = (0..16).collect();
        let frame = Frame::from_bytes(2, 2, &bytes).unwrap();
        let green = frame.extract_channel(1);
        assert_eq!(green.as_slice(), &[1, 5, 9, 13]);
    }

    #[test]
    fn test_volume_indexing() {
        let mut vol = Volume::new(3, 2, 2).unwrap();
        vol.set(2, 1, 1, Rgba8::new(1, 2, 3, 4));
        assert_eq!(vol.idx(2, 1, 1), 11);
        assert_eq!(vol.get(2, 1, 1), Rgba8::new(1, 2, 3, 4));
    }

    #[test]
    fn test_shape_check() {
        let a = ScalarImage::new(3, 3).unwrap();
        let b = ScalarImage::new(3, 4).unwrap();
        assert!(check_same_shape(&a, &a.clone()).is_ok());
        assert!(matches!(
            check_same_shape(&a, &b),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
