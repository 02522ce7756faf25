//! Tiled comparison grids: several fields side by side in one PNG.

use std::path::Path;

use image::RgbImage;

use relief::image::{Frame, ScalarImage, Vec2Image};

use crate::export::{resolve_range, ExportError};

/// One grid tile. All tiles of a grid must share extents.
pub enum Tile<'a> {
    /// Greyscale, auto-ranged unless a range is given.
    Scalar(&'a ScalarImage, Option<(f32, f32)>),
    /// Direction-to-RG, magnitude-to-B.
    Vector(&'a Vec2Image),
    /// RGBA frame (alpha dropped).
    Colour(&'a Frame),
}

impl Tile<'_> {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            Tile::Scalar(f, _) => (f.width(), f.height()),
            Tile::Vector(f) => (f.width(), f.height()),
            Tile::Colour(f) => (f.width(), f.height()),
        }
    }

    fn pixel(&self, idx: usize, range: (f32, f32), max_len: f32) -> [u8; 3] {
        match self {
            Tile::Scalar(field, _) => {
                let (lo, hi) = range;
                let span = (hi - lo).max(f32::MIN_POSITIVE);
                let v = field.as_slice()[idx];
                let t = if v.is_finite() { ((v - lo) / span).clamp(0.0, 1.0) } else { 0.0 };
                let g = (t * 255.0).round() as u8;
                [g, g, g]
            }
            Tile::Vector(field) => {
                let v = field.as_slice()[idx];
                let len = v.length();
                let dir = if len > 1e-6 { v / len } else { v };
                [
                    ((dir.x * 0.5 + 0.5) * 255.0).round() as u8,
                    ((dir.y * 0.5 + 0.5) * 255.0).round() as u8,
                    ((len / max_len) * 255.0).round() as u8,
                ]
            }
            Tile::Colour(frame) => {
                let p = frame.as_slice()[idx];
                [p.r, p.g, p.b]
            }
        }
    }
}

/// Lay the tiles out left-to-right, top-to-bottom, `cols` per row.
pub fn export_grid(
    path: impl AsRef<Path>,
    cols: u32,
    tiles: &[Tile],
) -> Result<(), ExportError> {
    assert!(cols > 0, "grid needs at least one column");
    assert!(!tiles.is_empty(), "grid needs at least one tile");

    let (tile_w, tile_h) = tiles[0].dimensions();
    for tile in tiles {
        assert_eq!(tile.dimensions(), (tile_w, tile_h), "grid tiles must share extents");
    }

    let rows = (tiles.len() as u32).div_ceil(cols);
    let mut out = RgbImage::new(tile_w * cols, tile_h * rows);

    for (t, tile) in tiles.iter().enumerate() {
        // Precompute per-tile normalisation.
        let range = match tile {
            Tile::Scalar(field, explicit) => resolve_range(field.as_slice(), *explicit)
                .unwrap_or((0.0, 1.0)),
            _ => (0.0, 1.0),
        };
        let max_len = match tile {
            Tile::Vector(field) => field
                .as_slice()
                .iter()
                .map(|v| v.length())
                .fold(0.0f32, f32::max)
                .max(f32::MIN_POSITIVE),
            _ => 1.0,
        };

        let ox = (t as u32 % cols) * tile_w;
        let oy = (t as u32 / cols) * tile_h;
        for y in 0..tile_h {
            for x in 0..tile_w {
                let idx = (y * tile_w + x) as usize;
                out.put_pixel(ox + x, oy + y, image::Rgb(tile.pixel(idx, range, max_len)));
            }
        }
    }

    log::debug!("grid dump {:?}: {} tiles, {cols} cols", path.as_ref(), tiles.len());
    out.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief::core::types::Vec2;
    use relief::image::Rgba8;

    #[test]
    fn test_grid_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.png");

        let scalar = ScalarImage::filled(4, 4, 1.0).unwrap();
        let vector = Vec2Image::filled(4, 4, Vec2::new(0.0, 1.0)).unwrap();
        let frame = Frame::filled(4, 4, Rgba8::new(10, 20, 30, 255)).unwrap();

        export_grid(
            &path,
            2,
            &[
                Tile::Scalar(&scalar, Some((0.0, 2.0))),
                Tile::Vector(&vector),
                Tile::Colour(&frame),
            ],
        )
        .unwrap();

        let back = image::open(&path).unwrap().to_rgb8();
        // 2 columns, 2 rows (3 tiles rounded up).
        assert_eq!(back.width(), 8);
        assert_eq!(back.height(), 8);
        // Scalar tile: 1.0 in [0, 2] -> mid grey.
        assert_eq!(back.get_pixel(0, 0).0, [128, 128, 128]);
        // Colour tile in the second row.
        assert_eq!(back.get_pixel(0, 4).0, [10, 20, 30]);
    }
}
