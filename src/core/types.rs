//! Core type aliases and re-exports

pub use glam::{Vec2, Vec3};

/// Standard Result type for the library
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// Neighbourhood used when walking a pixel grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Connectivity {
    /// Cardinal directions only
    Four,
    /// Cardinals plus diagonals
    #[default]
    Eight,
}

impl Connectivity {
    /// Neighbour offsets for this connectivity, cardinals first.
    pub fn offsets(self) -> &'static [(i32, i32)] {
        const CARDINAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        const ALL: [(i32, i32); 8] = [
            (1, 0), (-1, 0), (0, 1), (0, -1),
            (1, 1), (-1, -1), (1, -1), (-1, 1),
        ];
        match self {
            Connectivity::Four => &CARDINAL,
            Connectivity::Eight => &ALL,
        }
    }
}
