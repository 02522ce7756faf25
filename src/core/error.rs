//! Error types for the relief library

use thiserror::Error;

/// Main error type for the library
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("shape mismatch: expected {expected_w}x{expected_h}, got {got_w}x{got_h}")]
    ShapeMismatch {
        expected_w: u32,
        expected_h: u32,
        got_w: u32,
        got_h: u32,
    },

    #[error("buffer of {0} elements exceeds the allocation cap")]
    Allocation(u64),
}
