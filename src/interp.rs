//! Quantized interpolation: smooth a palette image into a continuous field.
//!
//! Drives the layered SDF and, after every pass, harvests the metric
//! distance to the palette-adjacent values below (`prev`) and above
//! (`next`) of each pixel. The two distances become an interpolation
//! parameter `t`; regions that only ever reach one boundary fall back to
//! their own distance maxima.

use crate::core::types::{Connectivity, Result};
use crate::image::buffer::{ChannelImage, ScalarImage, TRANSPARENT};
use crate::image::palette::{self, PaletteMap};
use crate::label::{label_regions, LabelMap};
use crate::sdf::layered::{LayeredSdf, MAX_ITERATIONS};
use crate::sdf::metric::DistanceParams;

/// Per-pixel boundary distances; `-1` means "not found".
#[derive(Clone, Copy, Debug)]
pub struct InterpPixel {
    pub dist_lower: f32,
    pub dist_higher: f32,
    /// Displacement magnitudes toward the lower boundary.
    pub disp_lower: (i16, i16),
    /// Displacement magnitudes toward the higher boundary.
    pub disp_higher: (i16, i16),
}

impl InterpPixel {
    const UNSET: InterpPixel = InterpPixel {
        dist_lower: -1.0,
        dist_higher: -1.0,
        disp_lower: (0, 0),
        disp_higher: (0, 0),
    };
}

/// Per-region fallback maxima (biased by +1 before use).
#[derive(Clone, Copy, Debug)]
pub struct InterpRegion {
    pub max_dist_lower: f32,
    pub max_dist_higher: f32,
}

/// Dequantizes one palette channel into a smooth scalar field.
pub struct Dequantizer<'a> {
    src: &'a ChannelImage,
    palette: &'a PaletteMap,
    params: DistanceParams,
    labels: LabelMap,
    pixels: Vec<InterpPixel>,
    regions: Vec<InterpRegion>,
}

impl<'a> Dequantizer<'a> {
    pub fn new(
        src: &'a ChannelImage,
        palette: &'a PaletteMap,
        params: DistanceParams,
    ) -> Result<Self> {
        params.validate()?;
        let labels = label_regions(src, Connectivity::Eight);
        let num_regions = labels.num_regions() as usize;
        Ok(Self {
            src,
            palette,
            params,
            labels,
            pixels: vec![InterpPixel::UNSET; src.len()],
            regions: vec![
                InterpRegion {
                    max_dist_lower: -1.0,
                    max_dist_higher: -1.0,
                };
                num_regions
            ],
        })
    }

    /// Region labels (8-connected), shared with the SDF passes.
    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Per-pixel boundary distances from the last [`execute`](Self::execute).
    pub fn pixels(&self) -> &[InterpPixel] {
        &self.pixels
    }

    pub fn regions(&self) -> &[InterpRegion] {
        &self.regions
    }

    /// Run the full pipeline and produce the dequantized field.
    pub fn execute(&mut self) -> Result<ScalarImage> {
        self.pixels.fill(InterpPixel::UNSET);
        self.regions.fill(InterpRegion {
            max_dist_lower: -1.0,
            max_dist_higher: -1.0,
        });

        let mut sdf = LayeredSdf::new(self.src, &self.labels, self.params)?;

        let mut iterations = 0;
        loop {
            let more = sdf.iterate();
            Self::extract_boundary_distances(&mut self.pixels, self.src, self.palette, &sdf);
            iterations += 1;
            if !more {
                break;
            }
            if iterations >= MAX_ITERATIONS {
                log::warn!("dequantizer hit the {MAX_ITERATIONS}-pass safety cap");
                break;
            }
        }
        log::debug!("dequantizer ran {iterations} SDF passes");

        self.finish_region_maxima();
        Ok(self.interpolate())
    }

    /// Record this pass's distances where the found value is the pixel's
    /// palette-lower or palette-higher neighbour. First found wins, which
    /// preserves the smallest distance across passes.
    fn extract_boundary_distances(
        out: &mut [InterpPixel],
        src: &ChannelImage,
        palette_map: &PaletteMap,
        sdf: &LayeredSdf,
    ) {
        let pixels = src.as_slice();
        for (idx, cell) in sdf.cells().iter().enumerate() {
            if !cell.is_set() {
                continue;
            }

            let v = pixels[idx];
            let lower = palette_map.prev_of(v);
            let higher = palette_map.next_of(v);
            let found = cell.source_value as u8;
            if found == v {
                continue;
            }

            let pixel = &mut out[idx];
            if lower != palette::NONE && lower < v && found == lower {
                if pixel.dist_lower < 0.0 {
                    pixel.dist_lower = cell.distance;
                    pixel.disp_lower = (cell.dx, cell.dy);
                }
            } else if higher > v && found == higher {
                if pixel.dist_higher < 0.0 {
                    pixel.dist_higher = cell.distance;
                    pixel.disp_higher = (cell.dx, cell.dy);
                }
            }
        }
    }

    fn finish_region_maxima(&mut self) {
        for (idx, pixel) in self.pixels.iter().enumerate() {
            let region = &mut self.regions[self.labels.labels()[idx] as usize];
            if pixel.dist_lower > region.max_dist_lower {
                region.max_dist_lower = pixel.dist_lower;
            }
            if pixel.dist_higher > region.max_dist_higher {
                region.max_dist_higher = pixel.dist_higher;
            }
        }
        // The +1 bias avoids a division by zero when a region touches a
        // boundary at distance zero everywhere.
        for region in &mut self.regions {
            region.max_dist_lower += 1.0;
            region.max_dist_higher += 1.0;
        }
    }

    fn interpolate(&self) -> ScalarImage {
        let pixels = self.src.as_slice();
        let mut out = vec![0.0f32; pixels.len()];

        for (idx, slot) in out.iter_mut().enumerate() {
            let v_u8 = pixels[idx];
            if v_u8 == TRANSPARENT {
                continue;
            }

            let v = v_u8 as f32;
            let prev = self.palette.prev_of(v_u8);
            // Without a mapped predecessor the band below is one palette
            // step down.
            let lo = if prev == palette::NONE {
                v_u8.saturating_sub(1) as f32
            } else {
                prev as f32
            };
            let range = v - lo;

            let pixel = &self.pixels[idx];
            let mut t = 0.0;

            if (pixel.dist_lower >= 0.0 && pixel.dist_higher > 0.0)
                || (pixel.dist_lower > 0.0 && pixel.dist_higher >= 0.0)
            {
                t = pixel.dist_lower / (pixel.dist_lower + pixel.dist_higher);
            } else {
                let region = &self.regions[self.labels.labels()[idx] as usize];
                if region.max_dist_lower > 0.0 {
                    t = pixel.dist_lower / region.max_dist_lower;
                }
                if region.max_dist_higher > 0.0 {
                    t = 1.0 - pixel.dist_higher / region.max_dist_higher;
                }
            }

            *slot = (lo + t * range).max(0.0);
        }

        ScalarImage::from_vec(self.src.width(), self.src.height(), out)
            .expect("output matches validated source extents")
    }
}

/// Dequantize one channel with the default dense palette adjacency.
pub fn dequantize_channel(
    src: &ChannelImage,
    palette: &PaletteMap,
    params: DistanceParams,
) -> Result<ScalarImage> {
    Dequantizer::new(src, palette, params)?.execute()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(w: u32, h: u32, data: &[u8]) -> ChannelImage {
        ChannelImage::from_vec(w, h, data.to_vec()).unwrap()
    }

    #[test]
    fn test_all_transparent() {
        let src = img(3, 3, &[0; 9]);
        let palette = PaletteMap::dense();
        let out = dequantize_channel(&src, &palette, DistanceParams::EUCLIDEAN).unwrap();
        assert!(out.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_uniform_value_maps_to_lower_band() {
        let src = img(3, 3, &[5; 9]);
        let palette = PaletteMap::dense();
        let out = dequantize_channel(&src, &palette, DistanceParams::EUCLIDEAN).unwrap();
        // No boundary anywhere: t = 0, output sits on the band floor.
        assert!(out.as_slice().iter().all(|&v| (v - 4.0).abs() < 1e-6));
    }

    #[test]
    fn test_output_within_band() {
        let src = img(6, 6, &[
            1, 1, 1, 2, 2, 2,
            1, 1, 1, 2, 2, 2,
            1, 1, 2, 2, 3, 3,
            1, 1, 2, 2, 3, 3,
            2, 2, 2, 3, 3, 3,
            2, 2, 3, 3, 3, 3,
        ]);
        let palette = PaletteMap::dense();
        let out = dequantize_channel(&src, &palette, DistanceParams::EUCLIDEAN).unwrap();
        for (i, &v) in out.as_slice().iter().enumerate() {
            let band = src.as_slice()[i] as f32;
            assert!(v >= band - 1.0 - 1e-5 && v <= band + 1e-5, "pixel {i}: {v}");
        }
    }

    #[test]
    fn test_idempotent() {
        let src = img(4, 4, &[
            1, 1, 2, 2,
            1, 2, 2, 3,
            2, 2, 3, 3,
            2, 3, 3, 3,
        ]);
        let palette = PaletteMap::dense();
        let mut dq = Dequantizer::new(&src, &palette, DistanceParams::EUCLIDEAN).unwrap();
        let first = dq.execute().unwrap();
        let second = dq.execute().unwrap();
        assert_eq!(first.as_slice(), second.as_slice());
    }

    #[test]
    fn test_sparse_palette_adjacency() {
        // Bands 10 and 40 are palette-adjacent; output spans [10, 40].
        let src = img(4, 1, &[10, 10, 40, 40]);
        let mut prev = [palette::NONE; 256];
        prev[40] = 10;
        let palette = PaletteMap::new(prev).unwrap();
        let out = dequantize_channel(&src, &palette, DistanceParams::EUCLIDEAN).unwrap();

        let s = out.as_slice();
        for window in s.windows(2) {
            assert!(window[0] <= window[1] + 1e-5, "monotone: {s:?}");
        }
        // The 40-band interpolates down toward 10.
        assert!(s[2] >= 10.0 && s[2] <= 40.0);
        assert!(s[3] > s[2] - 1e-5);
    }

    #[test]
    fn test_displacements_recorded() {
        let src = img(4, 1, &[1, 1, 2, 2]);
        let palette = PaletteMap::dense();
        let mut dq = Dequantizer::new(&src, &palette, DistanceParams::EUCLIDEAN).unwrap();
        dq.execute().unwrap();
        // Pixel 0 reaches the higher band through one horizontal step.
        assert_eq!(dq.pixels()[0].disp_higher, (1, 0));
        assert_eq!(dq.pixels()[0].dist_higher, 1.0);
        assert_eq!(dq.pixels()[3].disp_lower, (1, 0));
    }
}
