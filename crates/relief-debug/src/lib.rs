//! Debug PNG dumps for relief pipelines - scalar fields, vector fields and
//! tiled comparison grids.
//!
//! Nothing in the core depends on this crate; wire it in behind your own
//! debug flag:
//! ```ignore
//! relief_debug::export_scalar("out/field.png", &field, None)?;
//! ```

pub mod export;
pub mod grid;

pub use export::{export_frame, export_scalar, export_vec2, ExportError};
pub use grid::{export_grid, Tile};
