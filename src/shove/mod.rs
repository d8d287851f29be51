//! Push and shove engine
//!
//! Makes room for a new pad, via or trace segment by relocating vias and
//! rerouting traces around it, recursively and within a depth and time
//! budget. Every operation comes in two phases: a check on a borrowed
//! board ([`ShoveCheck`]) and a commit on a mutable one ([`ShoveCommit`]).
//! A commit never rolls back; callers restore a snapshot on failure, as
//! [`insert_forced_pad`] does.
//!
//! # Submodules
//! - `budget` - Recursion depth counters and deadline
//! - `result` - Success tiers, failing obstacles and errors
//! - `from_side` - Approach side of a trace and the front-of-pad test
//! - `reserved` - Shapes pending insertion during a cascade
//! - `entries` - Obstacle classification and trace cutting
//! - `via` - Via relocation and standalone via moves
//! - `pad` - Forced pad check and commit
//! - `trace` - Trace segment check and insert

mod budget;
mod entries;
mod from_side;
mod pad;
mod reserved;
mod result;
mod trace;
mod via;

pub use budget::{Deadline, RecursionBudget};
pub use entries::{ShapeTraceEntries, TraceCut, ViaRelocation};
pub use from_side::{calc_from_side, in_front_of_pad, FromSide, ShapeAndFromSide};
pub use pad::PadRequest;
pub use reserved::{Reserved, ReservedShape};
pub use result::{DrillTier, FailingObstacle, ShoveDrillResult, ShoveError, ShoveFailure};
pub use trace::TraceRequest;
pub use via::{attached_traces, try_shove_via_points};

use crate::board::{ItemId, NetNo, RoutingBoard};
use crate::config::ShoveSettings;
use crate::planar::{Direction45, Tile};
use std::collections::BTreeSet;

/// Read only shove checks against a board
pub struct ShoveCheck<'b> {
    board: &'b RoutingBoard,
}

impl<'b> ShoveCheck<'b> {
    pub fn new(board: &'b RoutingBoard) -> Self {
        Self { board }
    }

    pub fn board(&self) -> &RoutingBoard {
        self.board
    }
}

/// Shove commits; leaves the board half changed on failure
pub struct ShoveCommit<'b> {
    board: &'b mut RoutingBoard,
}

impl<'b> ShoveCommit<'b> {
    pub fn new(board: &'b mut RoutingBoard) -> Self {
        Self { board }
    }

    pub fn board(&self) -> &RoutingBoard {
        self.board
    }
}

/// Shape to make room for on one layer, shared by pad, via and trace shoves
#[derive(Debug, Clone)]
pub(crate) struct Candidate<'c> {
    pub shape: &'c Tile,
    pub layer: usize,
    pub nets: &'c [NetNo],
    pub clearance_class: usize,
    pub from_side: FromSide,
    pub direction: Option<Direction45>,
    pub copper_sharing_allowed: bool,
    pub check_only_front: bool,
}

/// Board items violating clearance with the candidate, minus the items an
/// enclosing level is about to remove or move
fn obstacles_of(board: &RoutingBoard, candidate: &Candidate<'_>, reserved: &Reserved<'_>) -> BTreeSet<ItemId> {
    board
        .find_overlap_items_with_clearance(candidate.shape, candidate.layer, candidate.nets, candidate.clearance_class)
        .into_iter()
        .filter(|id| !reserved.is_ignored(*id))
        .collect()
}

fn blocked<T>(obstacle: FailingObstacle) -> Result<T, ShoveError> {
    tracing::debug!(%obstacle, "shove blocked");
    Err(ShoveError::blocked(obstacle))
}

/// Checks the request, commits it and inserts the pad as a pin. The board
/// is restored to its previous state when the commit fails.
pub fn insert_forced_pad(board: &mut RoutingBoard, request: &PadRequest, settings: &ShoveSettings) -> Result<ItemId, ShoveError> {
    let budget = settings.budget();
    let tier = ShoveCheck::new(board).check_forced_pad(request, budget, &Reserved::root())?;
    tracing::info!(layer = request.layer, ?tier, "inserting forced pad");

    let snapshot = board.generate_snapshot();
    let committed = ShoveCommit::new(board).forced_pad(request, budget, &Reserved::root());
    let committed = committed.and_then(|()| {
        board
            .add_pin(request.shape.clone(), (request.layer, request.layer), &request.nets, request.clearance_class, None)
            .map_err(ShoveError::from)
    });
    match committed {
        Ok(id) => {
            board.release(snapshot)?;
            Ok(id)
        }
        Err(err) => {
            tracing::info!(error = %err, "forced pad commit failed, restoring board");
            board.restore(snapshot)?;
            Err(err)
        }
    }
}
