//! Single-image PNG exports.

use std::path::Path;

use image::{GrayImage, RgbImage, RgbaImage};
use thiserror::Error;

use relief::image::{Frame, ScalarImage, Vec2Image};

/// Errors surfaced by the PNG writers.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("png export failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("field has no finite value range")]
    EmptyRange,
}

/// Map a scalar field to greyscale. `range` pins `(min, max)`; without it
/// the finite extremes of the data are used (auto-range).
pub fn export_scalar(
    path: impl AsRef<Path>,
    field: &ScalarImage,
    range: Option<(f32, f32)>,
) -> Result<(), ExportError> {
    let (lo, hi) = resolve_range(field.as_slice(), range)?;
    let span = (hi - lo).max(f32::MIN_POSITIVE);

    let mut out = GrayImage::new(field.width(), field.height());
    for (idx, pixel) in out.pixels_mut().enumerate() {
        let v = field.as_slice()[idx];
        let t = if v.is_finite() { ((v - lo) / span).clamp(0.0, 1.0) } else { 0.0 };
        pixel.0 = [(t * 255.0).round() as u8];
    }
    log::debug!("scalar dump {:?} range [{lo}, {hi}]", path.as_ref());
    out.save(path)?;
    Ok(())
}

/// Map a vector field to RG direction plus blue magnitude.
pub fn export_vec2(path: impl AsRef<Path>, field: &Vec2Image) -> Result<(), ExportError> {
    let max_len = field
        .as_slice()
        .iter()
        .map(|v| v.length())
        .fold(0.0f32, f32::max)
        .max(f32::MIN_POSITIVE);

    let mut out = RgbImage::new(field.width(), field.height());
    for (idx, pixel) in out.pixels_mut().enumerate() {
        let v = field.as_slice()[idx];
        let len = v.length();
        let dir = if len > 1e-6 { v / len } else { v };
        pixel.0 = [
            ((dir.x * 0.5 + 0.5) * 255.0).round() as u8,
            ((dir.y * 0.5 + 0.5) * 255.0).round() as u8,
            ((len / max_len) * 255.0).round() as u8,
        ];
    }
    out.save(path)?;
    Ok(())
}

/// Dump an RGBA frame as-is.
pub fn export_frame(path: impl AsRef<Path>, frame: &Frame) -> Result<(), ExportError> {
    let out = RgbaImage::from_raw(frame.width(), frame.height(), frame.as_bytes().to_vec())
        .expect("frame byte length matches its extents");
    out.save(path)?;
    Ok(())
}

pub(crate) fn resolve_range(
    data: &[f32],
    range: Option<(f32, f32)>,
) -> Result<(f32, f32), ExportError> {
    if let Some((lo, hi)) = range {
        return Ok((lo, hi));
    }
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &v in data {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    if lo > hi {
        return Err(ExportError::EmptyRange);
    }
    Ok((lo, hi))
}
