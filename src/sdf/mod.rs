//! Layered signed distance transform

pub mod metric;
pub mod layered;

pub use layered::{Cell, LayeredSdf, Region, MAX_ITERATIONS, SOURCE_NONE};
pub use metric::DistanceParams;
