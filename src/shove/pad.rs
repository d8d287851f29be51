//! Forced pad shove: the common core of every shove
//!
//! A candidate shape is checked against the outline and the reserved chain,
//! its obstacles are classified, vias in the way are relocated and the cut
//! traces are rerouted. The rerouted pieces are shoved in turn as trace
//! segments one level deeper.

use super::budget::RecursionBudget;
use super::entries::{ShapeTraceEntries, TraceCut, ViaRelocation};
use super::from_side::{in_front_of_pad, FromSide, ShapeAndFromSide};
use super::reserved::Reserved;
use super::result::{DrillTier, FailingObstacle, ShoveError};
use super::{blocked, obstacles_of, Candidate, ShoveCheck, ShoveCommit};
use crate::board::{BoardItem, ItemId, ItemKind, NetNo, RoutingBoard};
use crate::planar::{Polyline, Tile};
use std::collections::BTreeSet;

/// A pad to make room for
#[derive(Debug, Clone, PartialEq)]
pub struct PadRequest {
    pub shape: Tile,
    pub layer: usize,
    pub nets: Vec<NetNo>,
    pub clearance_class: usize,
    pub from_side: FromSide,
    /// Items the caller removes or replaces anyway
    pub ignore: Vec<ItemId>,
    pub copper_sharing_allowed: bool,
    /// Skip rerouted segments behind the pad as seen from `from_side`
    pub check_only_front: bool,
}

impl PadRequest {
    pub fn new(shape: Tile, layer: usize, nets: &[NetNo], clearance_class: usize) -> Self {
        Self {
            shape,
            layer,
            nets: nets.to_vec(),
            clearance_class,
            from_side: FromSide::NOT_CALCULATED,
            ignore: Vec::new(),
            copper_sharing_allowed: false,
            check_only_front: false,
        }
    }

    pub fn with_from_side(mut self, from_side: FromSide) -> Self {
        self.from_side = from_side;
        self
    }

    pub fn with_ignore(mut self, ignore: &[ItemId]) -> Self {
        self.ignore = ignore.to_vec();
        self
    }

    pub fn with_copper_sharing(mut self, allowed: bool) -> Self {
        self.copper_sharing_allowed = allowed;
        self
    }

    pub fn with_check_only_front(mut self, only_front: bool) -> Self {
        self.check_only_front = only_front;
        self
    }

    fn candidate(&self) -> Candidate<'_> {
        Candidate {
            shape: &self.shape,
            layer: self.layer,
            nets: &self.nets,
            clearance_class: self.clearance_class,
            from_side: self.from_side,
            direction: None,
            copper_sharing_allowed: self.copper_sharing_allowed,
            check_only_front: self.check_only_front,
        }
    }
}

/// Blocking obstacle when the depth budget forbids rerouting the cuts
fn depth_obstacle(entries: &ShapeTraceEntries<'_>, candidate: &Candidate<'_>) -> FailingObstacle {
    entries
        .found_obstacle()
        .cloned()
        .or_else(|| entries.cuts().first().map(|cut| FailingObstacle::Item(cut.trace)))
        .unwrap_or_else(|| FailingObstacle::Shape(candidate.shape.clone()))
}

/// Rejects candidates leaving the outline or colliding with a reserved shape
fn check_placement(board: &RoutingBoard, candidate: &Candidate<'_>, budget: RecursionBudget, reserved: &Reserved<'_>) -> Result<(), ShoveError> {
    if budget.expired() {
        tracing::debug!("shove time limit reached");
        return blocked(FailingObstacle::Shape(candidate.shape.clone()));
    }
    if !board.outline().contains_shape(candidate.shape) {
        return blocked(FailingObstacle::Outline);
    }
    if let Some(conflict) = reserved.conflict(board, candidate.shape, candidate.layer, candidate.nets, candidate.clearance_class) {
        return blocked(FailingObstacle::Shape(conflict.shape.clone()));
    }
    Ok(())
}

/// Reserves the kept and rerouted pieces of every cut and ignores the cut
/// traces themselves
fn reserve_cuts(level: &mut Reserved<'_>, cuts: &[TraceCut], orthogonal: bool) {
    for cut in cuts {
        level.ignore(cut.trace);
        for piece in cut.kept.iter().chain(cut.substitute.iter()) {
            for i in 0..piece.segment_count() {
                if let Some(tile) = piece.segment_tile(i, cut.half_width, orthogonal) {
                    level.reserve(tile, cut.layer, &cut.nets, cut.clearance_class);
                }
            }
        }
    }
}

fn trace_item(id: ItemId, cut: &TraceCut, polyline: Polyline) -> BoardItem {
    BoardItem::new(
        id,
        &cut.nets,
        cut.clearance_class,
        ItemKind::Trace {
            polyline,
            half_width: cut.half_width,
            layer: cut.layer,
        },
    )
}

impl<'b> ShoveCheck<'b> {
    /// Checks whether the pad of `request` can be inserted after shoving
    /// the items in its way. Does not touch the board.
    pub fn check_forced_pad(&self, request: &PadRequest, budget: RecursionBudget, reserved: &Reserved<'_>) -> Result<DrillTier, ShoveError> {
        let mut level = reserved.child();
        for id in &request.ignore {
            level.ignore(*id);
        }
        self.check_candidate(&request.candidate(), budget, &level)
    }

    pub(super) fn check_candidate(&self, candidate: &Candidate<'_>, budget: RecursionBudget, reserved: &Reserved<'_>) -> Result<DrillTier, ShoveError> {
        tracing::trace!(
            layer = candidate.layer,
            general = budget.general,
            via = budget.via,
            depth = reserved.depth(),
            "check shove"
        );
        let board = self.board;
        check_placement(board, candidate, budget, reserved)?;

        let obstacles = obstacles_of(board, candidate, reserved);
        let mut entries = ShapeTraceEntries::new(board, candidate.shape, candidate.layer, candidate.nets, candidate.clearance_class);
        entries.store_items(&obstacles, candidate.copper_sharing_allowed)?;

        let mut level = reserved.child();
        level.reserve(candidate.shape.clone(), candidate.layer, candidate.nets, candidate.clearance_class);
        let mut relocations: Vec<ViaRelocation> = Vec::new();
        for via in entries.shove_vias().to_vec() {
            let relocation = self.check_via_shove(via, candidate, budget, &level)?;
            self.reserve_relocated_via(&mut level, &relocation)?;
            relocations.push(relocation);
        }

        let tier = if entries.attach_smd() {
            DrillTier::DrillableWithAttachSmd
        } else {
            DrillTier::Drillable
        };
        entries.cut_traces(&relocations)?;
        let has_substitutes = entries.substitutes().next().is_some();
        if !has_substitutes {
            return Ok(tier);
        }
        if budget.general <= 0 || entries.stack_depth() > 1 {
            return blocked(depth_obstacle(&entries, candidate));
        }

        let orthogonal = entries.is_orthogonal();
        reserve_cuts(&mut level, entries.cuts(), orthogonal);
        for (cut, piece) in entries.substitutes() {
            for i in 0..piece.segment_count() {
                let Some(segment) = piece.segment(i) else {
                    continue;
                };
                if candidate.check_only_front
                    && !in_front_of_pad(segment, candidate.shape, candidate.from_side.side_no, cut.half_width, true)
                {
                    continue;
                }
                let Some(sub) = ShapeAndFromSide::for_trace_segment(piece, i, cut.half_width, orthogonal) else {
                    continue;
                };
                let trace_candidate = Candidate {
                    shape: &sub.shape,
                    layer: cut.layer,
                    nets: &cut.nets,
                    clearance_class: cut.clearance_class,
                    from_side: sub.from_side,
                    direction: sub.direction,
                    copper_sharing_allowed: false,
                    check_only_front: false,
                };
                self.check_candidate(&trace_candidate, budget.descend(), &level)?;
            }
        }
        Ok(tier)
    }
}

impl<'b> ShoveCommit<'b> {
    /// Shoves the items in the way of the pad of `request`. The pad itself
    /// is not inserted. Run [`ShoveCheck::check_forced_pad`] first; a failure
    /// here leaves the board half changed.
    pub fn forced_pad(&mut self, request: &PadRequest, budget: RecursionBudget, reserved: &Reserved<'_>) -> Result<(), ShoveError> {
        if request.shape.is_empty() {
            tracing::warn!(layer = request.layer, "empty pad shape, nothing to shove");
            return Ok(());
        }
        self.board.clear_changed_area();
        let mut level = reserved.child();
        for id in &request.ignore {
            level.ignore(*id);
        }
        self.commit_candidate(&request.candidate(), budget, &level)
    }

    pub(super) fn commit_candidate(&mut self, candidate: &Candidate<'_>, budget: RecursionBudget, reserved: &Reserved<'_>) -> Result<(), ShoveError> {
        if candidate.shape.is_empty() {
            return Ok(());
        }
        tracing::trace!(
            layer = candidate.layer,
            general = budget.general,
            via = budget.via,
            depth = reserved.depth(),
            "commit shove"
        );
        check_placement(self.board, candidate, budget, reserved)?;

        let mut level = reserved.child();
        level.reserve(candidate.shape.clone(), candidate.layer, candidate.nets, candidate.clearance_class);
        let vias = {
            let obstacles = obstacles_of(self.board, candidate, reserved);
            let mut entries = ShapeTraceEntries::new(self.board, candidate.shape, candidate.layer, candidate.nets, candidate.clearance_class);
            entries.store_items(&obstacles, candidate.copper_sharing_allowed)?;
            entries.shove_vias().to_vec()
        };
        let mut relocations: Vec<ViaRelocation> = Vec::new();
        for via in vias {
            let relocation = self.commit_via_shove(via, candidate, budget, &level)?;
            ShoveCheck::new(self.board).reserve_relocated_via(&mut level, &relocation)?;
            relocations.push(relocation);
        }

        // classify again with the vias at their new places
        let (cuts, orthogonal, has_substitutes) = {
            let obstacles = obstacles_of(self.board, candidate, reserved);
            let mut entries = ShapeTraceEntries::new(self.board, candidate.shape, candidate.layer, candidate.nets, candidate.clearance_class);
            entries.store_items(&obstacles, candidate.copper_sharing_allowed)?;
            if let Some(via) = entries.shove_vias().first() {
                return blocked(FailingObstacle::Item(*via));
            }
            entries.cut_traces(&relocations)?;
            let has_substitutes = entries.substitutes().next().is_some();
            if has_substitutes && (entries.stack_depth() > 1 || budget.general <= 0) {
                return blocked(depth_obstacle(&entries, candidate));
            }
            (entries.cuts().to_vec(), entries.is_orthogonal(), has_substitutes)
        };
        if cuts.is_empty() {
            return Ok(());
        }

        let cut_ids: BTreeSet<ItemId> = cuts.iter().map(|cut| cut.trace).collect();
        let tails_before = self.board.contains_trace_tails(&cut_ids, &[]);
        for cut in &cuts {
            self.board.remove_item(cut.trace)?;
            for piece in &cut.kept {
                let id = self.board.next_item_id();
                self.board.insert_item(trace_item(id, cut, piece.clone()))?;
            }
        }
        if !has_substitutes {
            return Ok(());
        }

        for cut in &cuts {
            let Some(piece) = &cut.substitute else {
                continue;
            };
            if piece.first_corner() == piece.last_corner() {
                continue;
            }
            self.make_room_for_piece(cut, piece, orthogonal, budget.descend(), &level)?;
            for corner in piece.corners() {
                self.board.join_changed_area(*corner, cut.layer);
            }
            let area = self.board.changed_area(cut.layer);
            let normalized = piece.normalize(area.as_ref());
            let id = self.board.next_item_id();
            self.board.insert_item(trace_item(id, cut, normalized.clone()))?;

            if !tails_before {
                for end in [normalized.first_corner(), normalized.last_corner()].into_iter().flatten() {
                    if let Some(tail) = self.board.get_trace_tail(end, cut.layer, &cut.nets) {
                        self.board.remove_tail(tail)?;
                    }
                }
            }
            for net in &cut.nets {
                self.board.combine_traces(*net)?;
            }
        }
        Ok(())
    }

    /// Shoves everything out of the way of each segment of a rerouted piece
    fn make_room_for_piece(
        &mut self,
        cut: &TraceCut,
        piece: &Polyline,
        orthogonal: bool,
        budget: RecursionBudget,
        reserved: &Reserved<'_>,
    ) -> Result<(), ShoveError> {
        for i in 0..piece.segment_count() {
            let Some(sub) = ShapeAndFromSide::for_trace_segment(piece, i, cut.half_width, orthogonal) else {
                continue;
            };
            let trace_candidate = Candidate {
                shape: &sub.shape,
                layer: cut.layer,
                nets: &cut.nets,
                clearance_class: cut.clearance_class,
                from_side: sub.from_side,
                direction: sub.direction,
                copper_sharing_allowed: false,
                check_only_front: false,
            };
            self.commit_candidate(&trace_candidate, budget, reserved)?;
        }
        Ok(())
    }
}
