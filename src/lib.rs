//! Push and shove placement engine for printed circuit boards
//!
//! Inserts a pad, via or trace segment into a routed board by relocating
//! the vias and rerouting the traces in its way, recursively and within a
//! depth and time budget.
//!
//! # Modules
//! - `planar` - Integer grid geometry: octagons, tiles, polylines, outline
//! - `board` - Board items, spatial index, clearance rules, undo snapshots
//! - `shove` - Obstacle classification and the shove engine
//! - `config` - Settings loaded from JSON
//!
//! # Example
//! ```ignore
//! let settings = ShoveSettings::default();
//! let request = settings.pad_request(Tile::Box(TileBox::new(480, 480, 520, 520)), 0, &[1], 1);
//! let pad = insert_forced_pad(&mut board, &request, &settings)?;
//! ```

pub mod board;
pub mod config;
pub mod planar;
pub mod shove;

pub use board::{BoardError, BoardItem, ClearanceMatrix, ClearanceRule, ItemId, ItemKind, NetNo, RoutingBoard};
pub use config::ShoveSettings;
pub use planar::{BoardOutline, Octagon, PointInt, Polyline, Tile, TileBox, VectorInt};
pub use shove::{
    insert_forced_pad, DrillTier, FailingObstacle, PadRequest, Reserved, ShoveCheck, ShoveCommit, ShoveDrillResult,
    ShoveError, TraceRequest,
};
