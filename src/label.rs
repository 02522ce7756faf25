//! Connected-component labelling over same-value pixel regions.
//!
//! Two-pass union-find: the first raster scan assigns provisional labels
//! from the already-visited same-value neighbours (W, N, and NW/NE for
//! 8-connectivity), the second resolves roots and renumbers them densely.

use crate::core::types::Connectivity;
use crate::image::buffer::ChannelImage;

/// Dense region IDs, one per pixel.
#[derive(Clone, Debug)]
pub struct LabelMap {
    width: u32,
    height: u32,
    labels: Vec<u32>,
    num_regions: u32,
}

impl LabelMap {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Region IDs in `0..num_regions`, row-major.
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn num_regions(&self) -> u32 {
        self.num_regions
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.labels[(y * self.width + x) as usize]
    }
}

/// Disjoint-set forest with path compression and union by rank.
struct UnionFind {
    parent: Vec<u32>,
    rank: Vec<u8>,
    next_label: u32,
}

impl UnionFind {
    fn new(capacity: u32) -> Self {
        Self {
            parent: (0..capacity).collect(),
            rank: vec![0; capacity as usize],
            // Labels start at 1; 0 marks "not yet assigned" during the scan.
            next_label: 1,
        }
    }

    fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // Path compression
        let mut cur = x;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, x: u32, y: u32) {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return;
        }
        if self.rank[rx as usize] < self.rank[ry as usize] {
            self.parent[rx as usize] = ry;
        } else if self.rank[rx as usize] > self.rank[ry as usize] {
            self.parent[ry as usize] = rx;
        } else {
            self.parent[ry as usize] = rx;
            self.rank[rx as usize] += 1;
        }
    }

    fn new_label(&mut self) -> u32 {
        let label = self.next_label;
        self.next_label += 1;
        label
    }
}

/// Label every maximal same-value connected component.
pub fn label_regions(src: &ChannelImage, connectivity: Connectivity) -> LabelMap {
    let w = src.width();
    let h = src.height();
    let n = src.len();
    let pixels = src.as_slice();
    let use_diag = connectivity == Connectivity::Eight;

    let mut labels = vec![0u32; n];
    let mut uf = UnionFind::new(n as u32 + 1);

    // First pass: provisional labels plus equivalences.
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) as usize;
            let v = pixels[i];

            let mut neighbours = [0u32; 4];
            let mut count = 0;

            // West
            if x > 0 && pixels[i - 1] == v && labels[i - 1] > 0 {
                neighbours[count] = labels[i - 1];
                count += 1;
            }
            // North
            if y > 0 && pixels[i - w as usize] == v && labels[i - w as usize] > 0 {
                neighbours[count] = labels[i - w as usize];
                count += 1;
            }
            // North-west
            if use_diag && x > 0 && y > 0 {
                let nw = i - w as usize - 1;
                if pixels[nw] == v && labels[nw] > 0 {
                    neighbours[count] = labels[nw];
                    count += 1;
                }
            }
            // North-east
            if use_diag && x + 1 < w && y > 0 {
                let ne = i - w as usize + 1;
                if pixels[ne] == v && labels[ne] > 0 {
                    neighbours[count] = labels[ne];
                    count += 1;
                }
            }

            if count == 0 {
                labels[i] = uf.new_label();
            } else {
                let min_label = neighbours[..count].iter().copied().min().unwrap();
                labels[i] = min_label;
                for &other in &neighbours[..count] {
                    uf.union(min_label, other);
                }
            }
        }
    }

    // Second pass: resolve roots and renumber densely, 0-indexed.
    let mut remap = vec![0u32; uf.next_label as usize];
    let mut num_regions = 0u32;
    for label in labels.iter_mut() {
        let root = uf.find(*label);
        if remap[root as usize] == 0 {
            num_regions += 1;
            // 1-indexed internally to distinguish from unassigned
            remap[root as usize] = num_regions;
        }
        *label = remap[root as usize] - 1;
    }

    LabelMap {
        width: w,
        height: h,
        labels,
        num_regions,
    }
}
