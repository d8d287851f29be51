//! Outcomes and failures of shove operations

use crate::board::{BoardError, ItemId};
use crate::planar::Tile;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Success tiers of a pad or via check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DrillTier {
    Drillable,
    /// A foreign net pin will share copper with the new pad
    DrillableWithAttachSmd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShoveDrillResult {
    Drillable,
    DrillableWithAttachSmd,
    NotDrillable,
}

impl From<DrillTier> for ShoveDrillResult {
    fn from(tier: DrillTier) -> Self {
        match tier {
            DrillTier::Drillable => ShoveDrillResult::Drillable,
            DrillTier::DrillableWithAttachSmd => ShoveDrillResult::DrillableWithAttachSmd,
        }
    }
}

impl ShoveDrillResult {
    /// Folds a check result into the three tiers. Structural board errors
    /// are passed on instead of being reported as not drillable.
    pub fn from_check(result: Result<DrillTier, ShoveError>) -> Result<ShoveDrillResult, BoardError> {
        match result {
            Ok(tier) => Ok(tier.into()),
            Err(ShoveError::Blocked(_)) => Ok(ShoveDrillResult::NotDrillable),
            Err(ShoveError::Board(err)) => Err(err),
        }
    }

    pub fn is_drillable(&self) -> bool {
        *self != ShoveDrillResult::NotDrillable
    }
}

/// The obstacle that made an operation fail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FailingObstacle {
    Item(ItemId),
    /// The shape leaves the board outline
    Outline,
    /// A shape reserved by an enclosing operation, or the candidate itself
    /// when the time limit ran out
    Shape(Tile),
}

impl fmt::Display for FailingObstacle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailingObstacle::Item(id) => write!(f, "item {}", id),
            FailingObstacle::Outline => write!(f, "board outline"),
            FailingObstacle::Shape(tile) => write!(f, "shape at {:?}", tile.bounding_box()),
        }
    }
}

/// Diagnostic carried by a failed shove; depth or time exhaustion looks the
/// same as a geometric conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoveFailure {
    pub obstacle: FailingObstacle,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShoveError {
    #[error("not drillable, blocked by {}", .0.obstacle)]
    Blocked(ShoveFailure),

    #[error(transparent)]
    Board(#[from] BoardError),
}

impl ShoveError {
    pub fn blocked(obstacle: FailingObstacle) -> Self {
        ShoveError::Blocked(ShoveFailure { obstacle })
    }

    pub fn failing_obstacle(&self) -> Option<&FailingObstacle> {
        match self {
            ShoveError::Blocked(failure) => Some(&failure.obstacle),
            ShoveError::Board(_) => None,
        }
    }
}
