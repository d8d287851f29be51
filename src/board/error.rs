//! Errors of the board layer

use super::item::{ComponentId, ItemId};
use thiserror::Error;

/// Structural inconsistencies; these abort the operation that hit them
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    #[error("item {0} is already on the board")]
    DuplicateItem(ItemId),

    #[error("unknown component {0:?}")]
    UnknownComponent(ComponentId),

    #[error("snapshot {0} is not open on this board")]
    StaleSnapshot(u64),

    #[error("layer {layer} out of range (board has {layer_count} layers)")]
    LayerOutOfRange { layer: usize, layer_count: usize },
}

/// Reasons a group move is refused
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MoveError {
    #[error("nothing selected")]
    EmptySelection,

    #[error("item {0} is fixed")]
    FixedItem(ItemId),

    #[error("item {0} is connected to {1} outside the selection")]
    ConnectedOutside(ItemId, ItemId),

    #[error("move would cause {0} clearance violations")]
    Violations(usize),

    #[error(transparent)]
    Board(#[from] BoardError),
}
