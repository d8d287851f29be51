//! Board store, spatial overlap index and undo layer
//!
//! # Submodules
//! - `item` - Pins, vias, traces, conduction areas
//! - `clearance` - Clearance rule table
//! - `search` - R-tree over item tiles
//! - `undo` - Changelog behind snapshots
//! - `store` - The routing board itself
//! - `drc` - Board wide clearance violation scan
//! - `move_items` - Group moves with component bookkeeping
//! - `error` - Board and move errors

mod clearance;
mod drc;
mod error;
mod item;
mod move_items;
mod search;
mod store;
mod undo;

pub use clearance::{ClearanceMatrix, ClearanceRule, NO_CLEARANCE};
pub use drc::{clearance_violations, item_clearance_violations, ClearanceViolation};
pub use error::{BoardError, MoveError};
pub use item::{BoardItem, Component, ComponentId, ItemId, ItemKind, NetNo};
pub use move_items::{move_items, MoveSelection};
pub use search::{ShapeSearchTree, TreeEntry};
pub use store::{ChangedArea, RoutingBoard};
pub use undo::Snapshot;
