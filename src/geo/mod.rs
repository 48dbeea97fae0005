//! Geospatial cell grid.
//!
//! The earth is tiled into square cells of `degrees_per_cell` degrees.
//! Groups of `width x width` tiling cells form the multi-cells that
//! documents are ranked against.

pub mod cell;
pub mod coord;
pub mod document;
pub mod grid;

pub use cell::{CellIndex, CellStats, MultiCell};
pub use coord::Coord;
pub use document::{Document, Split};
pub use grid::{CellGrid, GridBounds, GridSummary};
