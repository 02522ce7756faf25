//! Relief - dequantization and field derivation for indexed animations
//!
//! Takes quantized (palette-indexed) raster frames and reconstructs a smooth
//! scalar field by measuring, per pixel, the distance to the palette-adjacent
//! values below and above its own. Auxiliary passes interpret the result as a
//! height field and derive normal maps, contour-tangent flow, Helmholtz
//! decompositions, divergence-driven swirl, constraint-clamped blurs and
//! temporal gradient volumes.

pub mod core;
pub mod image;
pub mod label;
pub mod queue;
pub mod sdf;
pub mod interp;
pub mod flood;
pub mod chamfer;
pub mod field;
pub mod contour;
pub mod blur;
pub mod video;
