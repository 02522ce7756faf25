//! Palette adjacency: which value sits directly below / above each value.
//!
//! The map is supplied as `prev[v]` with [`NONE`] meaning "no lower
//! neighbour"; the inverse `next` table is derived at construction. The
//! directed graph formed by `prev` must be a forest - collisions in the
//! inverse and cycles are rejected as invalid input.

use crate::core::error::Error;
use crate::core::types::Result;

/// Sentinel in `prev`: this value has no lower neighbour.
pub const NONE: u8 = 255;

/// Per-channel palette adjacency with its derived inverse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteMap {
    prev: [u8; 256],
    next: [u8; 256],
}

impl PaletteMap {
    /// Build from a `prev` table, deriving and validating the inverse.
    pub fn new(prev: [u8; 256]) -> Result<Self> {
        if prev[0] != NONE {
            return Err(Error::InvalidArgument(
                "transparent value 0 cannot have a palette predecessor".into(),
            ));
        }

        let mut next = [0u8; 256];
        for v in 1..=255u16 {
            let p = prev[v as usize];
            if p == NONE {
                continue;
            }
            if next[p as usize] != 0 {
                return Err(Error::InvalidArgument(format!(
                    "palette adjacency is not a forest: {p} precedes both {} and {v}",
                    next[p as usize]
                )));
            }
            next[p as usize] = v as u8;
        }

        // Cycle check: every prev chain must terminate.
        for start in 1..=255u16 {
            let mut v = start as u8;
            let mut steps = 0;
            while prev[v as usize] != NONE {
                v = prev[v as usize];
                steps += 1;
                if steps > 255 {
                    return Err(Error::InvalidArgument(format!(
                        "palette adjacency contains a cycle through {start}"
                    )));
                }
            }
        }

        Ok(Self { prev, next })
    }

    /// Dense adjacency: every value's lower neighbour is `v - 1`.
    pub fn dense() -> Self {
        let mut prev = [NONE; 256];
        for v in 2..=255usize {
            prev[v] = (v - 1) as u8;
        }
        // prev[1] stays NONE: value 0 is the transparency sentinel, not a
        // palette entry.
        Self::new(prev).expect("dense map is a valid forest")
    }

    /// The value directly below `v`, or [`NONE`].
    #[inline]
    pub fn prev_of(&self, v: u8) -> u8 {
        self.prev[v as usize]
    }

    /// The value directly above `v`, or 0 when there is none.
    #[inline]
    pub fn next_of(&self, v: u8) -> u8 {
        self.next[v as usize]
    }
}
