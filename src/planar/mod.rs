//! Planar geometry on the integer board grid
//!
//! # Submodules
//! - `point` - Integer and float points, vectors
//! - `direction` - Directions snapped to 45 degrees
//! - `line` - Directed lines and side tests
//! - `tile_box` - Axis aligned boxes
//! - `octagon` - 45 degree octagons, clipping and border walks
//! - `tile` - Convex tiles and clearance distances
//! - `polyline` - Trace center lines
//! - `outline` - Board outline with convex decomposition

mod direction;
mod line;
mod octagon;
mod outline;
mod point;
mod polyline;
mod tile;
mod tile_box;

pub use direction::Direction45;
pub use line::{LineInt, Side};
pub use octagon::{diagonal_offset, Octagon, SegmentClip};
pub use outline::BoardOutline;
pub use point::{PointFloat, PointInt, VectorInt};
pub use polyline::Polyline;
pub use tile::{point_segment_distance, segment_distance, Simplex, Tile};
pub use tile_box::TileBox;
