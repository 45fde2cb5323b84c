//! Board model and planar geometry for pcbgfx.
//!
//! Coordinates are integer internal units (nanometres) on the board and
//! `f64` once they leave it for clipping, tessellation or export.

pub mod board;
pub mod clip;
pub mod contour;
pub mod geometry;
pub mod layer;
pub mod mesh;
pub mod spatial;
mod tessellate;
pub mod units;

pub use board::{Board, BoardEntity, Footprint};
pub use clip::{clip_line, clip_polygon, ClipBox};
pub use contour::{ContourId, ContourLayer, GeometryError};
pub use geometry::{BBox, IPoint, Point};
pub use layer::{BoardLayer, LayerSet, LayerStack};
pub use mesh::{format_real, Mesh};
