//! Region-aware layered distance flood.
//!
//! Each pass runs a Dijkstra flood from every palette boundary and records,
//! per pixel, the nearest source pixel whose value clears the pixel's
//! region floor. Lower values displace higher ones within a pass, so a pass
//! discovers exactly one palette layer per region; the floor then advances
//! to that layer and the next pass finds the one above it. A pass that had
//! to skip a higher value reports `more_work`.

use crate::image::buffer::{ChannelImage, TRANSPARENT};
use crate::label::LabelMap;
use crate::queue::MinHeap;
use crate::sdf::metric::DistanceParams;
use crate::core::error::Error;
use crate::core::types::Result;

/// `Cell::source_value` sentinel: nothing recorded this pass.
pub const SOURCE_NONE: u16 = 256;

/// Safety cap on layering passes.
pub const MAX_ITERATIONS: u32 = 255;

/// Per-pixel flood result.
#[derive(Clone, Copy, Debug)]
pub struct Cell {
    /// Displacement magnitudes accumulated along the same-region path.
    pub dx: i16,
    pub dy: i16,
    /// Palette value at the source boundary, or [`SOURCE_NONE`].
    pub source_value: u16,
    /// Metric distance of `(dx, dy)`.
    pub distance: f32,
}

impl Cell {
    const RESET: Cell = Cell {
        dx: 0,
        dy: 0,
        source_value: SOURCE_NONE,
        distance: 0.0,
    };

    /// True when this cell holds a result.
    pub fn is_set(&self) -> bool {
        self.source_value != SOURCE_NONE
    }
}

/// Per-region floor state.
#[derive(Clone, Copy, Debug)]
pub struct Region {
    /// Palette value shared by every pixel of the region.
    pub value: u8,
    /// This pass accepts only source values strictly above the floor.
    pub target_floor: i32,
    /// Smallest source value accepted this pass; becomes the next floor.
    pub next_floor: i32,
}

#[derive(Clone, Copy)]
struct Decision {
    replace: bool,
    more_work: bool,
}

impl Decision {
    const REJECT: Decision = Decision {
        replace: false,
        more_work: false,
    };
}

struct QueueEntry {
    x: u32,
    y: u32,
    dx: i16,
    dy: i16,
    source_value: u8,
}

/// Iterative layered SDF over one palette channel.
pub struct LayeredSdf<'a> {
    src: &'a ChannelImage,
    labels: &'a LabelMap,
    params: DistanceParams,
    regions: Vec<Region>,
    cells: Vec<Cell>,
    more_work: bool,
}

impl<'a> LayeredSdf<'a> {
    /// Build the engine over `src` with externally computed labels
    /// (4-connected for standalone use, 8-connected when shared with the
    /// dequantizer).
    pub fn new(
        src: &'a ChannelImage,
        labels: &'a LabelMap,
        params: DistanceParams,
    ) -> Result<Self> {
        params.validate()?;
        if labels.width() != src.width() || labels.height() != src.height() {
            return Err(Error::ShapeMismatch {
                expected_w: src.width(),
                expected_h: src.height(),
                got_w: labels.width(),
                got_h: labels.height(),
            });
        }

        let mut regions = vec![
            Region {
                value: 0,
                target_floor: 0,
                next_floor: 0,
            };
            labels.num_regions() as usize
        ];
        for (i, &label) in labels.labels().iter().enumerate() {
            regions[label as usize].value = src.as_slice()[i];
        }

        Ok(Self {
            src,
            labels,
            params,
            regions,
            cells: vec![Cell::RESET; src.len()],
            more_work: false,
        })
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Metric distance recorded at `(x, y)` this pass, if any.
    pub fn distance_at(&self, x: u32, y: u32) -> Option<f32> {
        let cell = &self.cells[self.src.idx(x, y)];
        cell.is_set().then_some(cell.distance)
    }

    /// Run passes until no region reports remaining work. Returns the
    /// number of passes; the cap is soft and only logged.
    pub fn run(&mut self) -> u32 {
        let mut iterations = 0;
        loop {
            let more = self.iterate();
            iterations += 1;
            if !more {
                break;
            }
            if iterations >= MAX_ITERATIONS {
                log::warn!("layered SDF hit the {MAX_ITERATIONS}-pass safety cap");
                break;
            }
        }
        log::debug!("layered SDF finished in {iterations} passes");
        iterations
    }

    /// Run one pass. Returns true when a later pass would discover more.
    pub fn iterate(&mut self) -> bool {
        self.reset();
        self.more_work = false;
        self.flood();
        self.more_work
    }

    fn reset(&mut self) {
        for region in &mut self.regions {
            region.target_floor = region.next_floor;
            region.next_floor = 255;
        }
        self.cells.fill(Cell::RESET);
    }

    fn should_update(&self, idx: usize, distance: f32, source_value: u8) -> Decision {
        let cell = &self.cells[idx];
        let region = &self.regions[self.labels.labels()[idx] as usize];

        // A source on our own plane is not a boundary.
        if region.value == source_value {
            return Decision::REJECT;
        }

        // A value above what the cell holds belongs to a later pass.
        if (source_value as u16) > cell.source_value {
            return Decision {
                replace: false,
                more_work: true,
            };
        }

        // Same value: plain distance contest.
        if (source_value as u16) == cell.source_value {
            return Decision {
                replace: distance < cell.distance,
                more_work: false,
            };
        }

        // New, smaller value: must clear the region floor.
        if (source_value as i32) <= region.target_floor {
            return Decision::REJECT;
        }

        Decision {
            replace: true,
            more_work: cell.is_set(),
        }
    }

    fn try_update(
        &mut self,
        idx: usize,
        dx: i16,
        dy: i16,
        distance: f32,
        source_value: u8,
    ) -> bool {
        let decision = self.should_update(idx, distance, source_value);
        if decision.more_work {
            self.more_work = true;
        }
        if !decision.replace {
            return false;
        }

        let cell = &mut self.cells[idx];
        cell.dx = dx;
        cell.dy = dy;
        cell.distance = distance;

        if cell.source_value != source_value as u16 {
            cell.source_value = source_value as u16;
            let region = &mut self.regions[self.labels.labels()[idx] as usize];
            region.next_floor = region.next_floor.min(source_value as i32);
        }
        true
    }

    fn flood(&mut self) {
        let w = self.src.width() as i32;
        let h = self.src.height() as i32;
        let pixels = self.src.as_slice();

        const OFFSETS: [(i32, i32); 8] = [
            (1, 0), (-1, 0), (0, 1), (0, -1),
            (1, 1), (-1, -1), (1, -1), (-1, 1),
        ];

        let mut queue: MinHeap<QueueEntry> = MinHeap::with_capacity(256);

        // Seed every non-transparent pixel 4-adjacent to a differing value,
        // once per differing neighbour.
        for y in 0..h {
            for x in 0..w {
                let idx = (y * w + x) as usize;
                let val = pixels[idx];
                if val == TRANSPARENT {
                    continue;
                }
                for &(ox, oy) in &OFFSETS[..4] {
                    let nx = x + ox;
                    let ny = y + oy;
                    if nx < 0 || nx >= w || ny < 0 || ny >= h {
                        continue;
                    }
                    let neighbour = pixels[(ny * w + nx) as usize];
                    if neighbour != val {
                        queue.push(
                            0.0,
                            QueueEntry {
                                x: x as u32,
                                y: y as u32,
                                dx: 0,
                                dy: 0,
                                source_value: neighbour,
                            },
                        );
                    }
                }
            }
        }

        // Dijkstra: pop the closest candidate, keep it if it improves the
        // cell, then spread along the same-value plane.
        while let Some((distance, entry)) = queue.pop() {
            let idx = (entry.y as i32 * w + entry.x as i32) as usize;
            if !self.try_update(idx, entry.dx, entry.dy, distance, entry.source_value) {
                continue;
            }

            let val = pixels[idx];
            let cell = self.cells[idx];
            let source_value = cell.source_value as u8;

            for &(ox, oy) in &OFFSETS {
                let nx = entry.x as i32 + ox;
                let ny = entry.y as i32 + oy;
                if nx < 0 || nx >= w || ny < 0 || ny >= h {
                    continue;
                }
                let nidx = (ny * w + nx) as usize;
                if pixels[nidx] != val {
                    continue;
                }

                // Sign-free increments keep the heap key monotone along
                // same-region paths.
                let ndx = cell.dx + ox.abs() as i16;
                let ndy = cell.dy + oy.abs() as i16;
                let ndist = self.params.distance(ndx as i32, ndy as i32);

                if self.should_update(nidx, ndist, source_value).replace {
                    queue.push(
                        ndist,
                        QueueEntry {
                            x: nx as u32,
                            y: ny as u32,
                            dx: ndx,
                            dy: ndy,
                            source_value,
                        },
                    );
                }
            }
        }
    }
}
