//! Via relocation
//!
//! A via in the way of a candidate is moved to a new center next to the
//! candidate and drags the traces ending on it along. The same machinery
//! moves a single via on request (`check_via_move` / `insert_via_move`).

use super::budget::RecursionBudget;
use super::entries::{drag_ends, ViaRelocation};
use super::from_side::{FromSide, ShapeAndFromSide};
use super::reserved::Reserved;
use super::result::{FailingObstacle, ShoveError};
use super::{blocked, Candidate, ShoveCheck, ShoveCommit};
use crate::board::{BoardError, BoardItem, ItemId, ItemKind, NetNo, RoutingBoard};
use crate::planar::{Direction45, Octagon, PointInt, Polyline, Tile, VectorInt};

/// Margin added to the relocation region beyond clearance and via radius
const VIA_REGION_MARGIN: i64 = 2;

/// Unfixed or fixed traces touching the via
pub fn attached_traces(board: &RoutingBoard, via: ItemId) -> Result<Vec<ItemId>, BoardError> {
    let mut result = Vec::new();
    for id in board.connected_items(via)? {
        if board.get_item(id)?.is_trace() {
            result.push(id);
        }
    }
    Ok(result)
}

/// Candidate centers for moving `via` out of the way of `shape`, best
/// first. Candidates lie on the border of the shape's bounding octagon
/// enlarged by clearance, via radius and a small margin: the via center
/// projected onto each side, then the octagon corners. Candidates clear of
/// everything come before those blocked only by shovable vias and traces;
/// within a tier smaller displacement wins, then movement along
/// `direction`, then generation order. Depends only on its inputs.
pub fn try_shove_via_points(
    board: &RoutingBoard,
    shape: &Tile,
    layer: usize,
    clearance_class: usize,
    via: ItemId,
    direction: Option<Direction45>,
    reserved: &Reserved<'_>,
) -> Result<Vec<PointInt>, BoardError> {
    let item = board.get_item(via)?;
    let Some(center) = item.center() else {
        return Ok(Vec::new());
    };
    let radius = item.half_width();
    let offset = board.clearance_value(clearance_class, item.clearance_class, layer) + radius + VIA_REGION_MARGIN;
    let region = match shape {
        Tile::Box(b) => Octagon::from_box(&b.enlarge(offset)),
        other => other.bounding_octagon().enlarge(offset),
    };
    let attached = attached_traces(board, via)?;

    let raw = region.corners_raw();
    let mut points: Vec<PointInt> = Vec::new();
    for side in 0..8 {
        if raw[side] == raw[(side + 1) % 8] {
            continue;
        }
        let projection = region.border_line(side).projection_approx(center.to_float());
        points.push(region.snap_to_side(projection, side));
    }
    points.extend(region.corners());

    let mut scored: Vec<(u8, f64, i128, usize, PointInt)> = Vec::new();
    for (seq, p) in points.iter().enumerate() {
        if points[..seq].contains(p) {
            continue;
        }
        let Some(tier) = relocation_tier(board, item, &attached, *p, reserved)? else {
            continue;
        };
        let delta = p.difference_by(center);
        let along = direction.map_or(0, |dir| delta.dot(dir.vector()));
        scored.push((tier, delta.length(), -along, seq, *p));
    }
    scored.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then(a.1.total_cmp(&b.1))
            .then(a.2.cmp(&b.2))
            .then(a.3.cmp(&b.3))
    });
    Ok(scored.into_iter().map(|(_, _, _, _, p)| p).collect())
}

/// 0 when the via fits at `p` without touching anything, 1 when only
/// shovable items are in the way, `None` when it does not fit
fn relocation_tier(
    board: &RoutingBoard,
    via: &BoardItem,
    attached: &[ItemId],
    p: PointInt,
    reserved: &Reserved<'_>,
) -> Result<Option<u8>, BoardError> {
    let shape = Tile::regular_octagon(p, via.half_width());
    if !board.outline().contains_shape(&shape) {
        return Ok(None);
    }
    let mut tier = 0;
    for layer in via.layers() {
        if reserved.conflict(board, &shape, layer, &via.nets, via.clearance_class).is_some() {
            return Ok(None);
        }
        for id in board.find_overlap_items_with_clearance(&shape, layer, &via.nets, via.clearance_class) {
            if id == via.id || attached.contains(&id) || reserved.is_ignored(id) {
                continue;
            }
            let other = board.get_item(id)?;
            if other.fixed || !(other.is_via() || other.is_trace()) {
                return Ok(None);
            }
            tier = 1;
        }
    }
    Ok(Some(tier))
}

/// A trace following its via to the new center
#[derive(Debug, Clone)]
struct TraceDrag {
    trace: ItemId,
    layer: usize,
    half_width: i64,
    nets: Vec<NetNo>,
    clearance_class: usize,
    polyline: Polyline,
    /// Corner range that left the old center line
    changed: (usize, usize),
}

impl TraceDrag {
    fn changed_segments(&self) -> impl Iterator<Item = ShapeAndFromSide> + '_ {
        (self.changed.0..self.changed.1)
            .filter_map(move |i| ShapeAndFromSide::for_trace_segment(&self.polyline, i, self.half_width, false))
    }
}

fn segment_candidate<'c>(drag: &'c TraceDrag, segment: &'c ShapeAndFromSide) -> Candidate<'c> {
    Candidate {
        shape: &segment.shape,
        layer: drag.layer,
        nets: &drag.nets,
        clearance_class: drag.clearance_class,
        from_side: segment.from_side,
        direction: segment.direction,
        copper_sharing_allowed: false,
        check_only_front: false,
    }
}

/// A planned via move with the traces it drags along
#[derive(Debug, Clone)]
struct ViaMove {
    via: BoardItem,
    old_center: PointInt,
    new_center: PointInt,
    attached: Vec<ItemId>,
    drags: Vec<TraceDrag>,
}

impl ViaMove {
    /// Every attached trace must be unfixed and end on the via center. Traces
    /// on `skip_layer` are left to the caller, which cuts them anyway.
    fn plan(board: &RoutingBoard, via: ItemId, new_center: PointInt, skip_layer: Option<usize>) -> Result<ViaMove, ShoveError> {
        let item = board.get_item(via)?;
        let old_center = match item.kind {
            ItemKind::Via { center, .. } if !item.fixed => center,
            _ => return blocked(FailingObstacle::Item(via)),
        };
        let attached = attached_traces(board, via)?;
        let mut drags = Vec::new();
        for id in &attached {
            let trace = board.get_item(*id)?;
            let Some(polyline) = trace.polyline() else {
                continue;
            };
            let on_center = polyline.first_corner() == Some(old_center) || polyline.last_corner() == Some(old_center);
            if trace.fixed || !on_center {
                return blocked(FailingObstacle::Item(via));
            }
            if skip_layer == Some(trace.first_layer()) {
                continue;
            }
            let mut corners = polyline.corners().to_vec();
            let Some(changed) = drag_ends(&mut corners, |end| (end == old_center).then_some(new_center)) else {
                continue;
            };
            drags.push(TraceDrag {
                trace: trace.id,
                layer: trace.first_layer(),
                half_width: trace.half_width(),
                nets: trace.nets.clone(),
                clearance_class: trace.clearance_class,
                polyline: Polyline::new(corners),
                changed,
            });
        }
        Ok(ViaMove {
            via: item.clone(),
            old_center,
            new_center,
            attached,
            drags,
        })
    }

    fn delta(&self) -> VectorInt {
        self.new_center.difference_by(self.old_center)
    }

    fn shape(&self) -> Tile {
        Tile::regular_octagon(self.new_center, self.via.half_width())
    }

    fn via_candidate<'c>(&'c self, shape: &'c Tile, layer: usize) -> Candidate<'c> {
        Candidate {
            shape,
            layer,
            nets: &self.via.nets,
            clearance_class: self.via.clearance_class,
            from_side: FromSide::NOT_CALCULATED,
            direction: Direction45::from_vector(self.delta()),
            copper_sharing_allowed: false,
            check_only_front: false,
        }
    }

    /// The via and its traces are about to move; nothing below shoves them
    fn ignore_moving(&self, level: &mut Reserved<'_>) {
        level.ignore(self.via.id);
        for id in &self.attached {
            level.ignore(*id);
        }
    }

    fn reserve_new_shape(&self, level: &mut Reserved<'_>, shape: &Tile) {
        for layer in self.via.layers() {
            level.reserve(shape.clone(), layer, &self.via.nets, self.via.clearance_class);
        }
    }

    fn relocation(&self) -> ViaRelocation {
        ViaRelocation {
            via: self.via.id,
            old_center: self.old_center,
            new_center: self.new_center,
            first_layer: self.via.first_layer(),
            last_layer: self.via.last_layer(),
            nets: self.via.nets.clone(),
        }
    }
}

impl<'b> ShoveCheck<'b> {
    /// Checks moving `via` by `delta` together with the traces ending on it
    pub fn check_via_move(&self, via: ItemId, delta: VectorInt, budget: RecursionBudget, reserved: &Reserved<'_>) -> Result<(), ShoveError> {
        let Some(center) = self.board.get_item(via)?.center() else {
            return blocked(FailingObstacle::Item(via));
        };
        let plan = ViaMove::plan(self.board, via, center.translate_by(delta), None)?;
        self.check_via_relocation(&plan, budget, reserved)
    }

    /// Finds a new place for a via in the way of `candidate` and checks the
    /// move there
    pub(super) fn check_via_shove(
        &self,
        via: ItemId,
        candidate: &Candidate<'_>,
        budget: RecursionBudget,
        reserved: &Reserved<'_>,
    ) -> Result<ViaRelocation, ShoveError> {
        if budget.via <= 0 {
            return blocked(FailingObstacle::Item(via));
        }
        let points = try_shove_via_points(
            self.board,
            candidate.shape,
            candidate.layer,
            candidate.clearance_class,
            via,
            candidate.direction,
            reserved,
        )?;
        let Some(new_center) = points.first().copied() else {
            return blocked(FailingObstacle::Item(via));
        };
        let plan = ViaMove::plan(self.board, via, new_center, Some(candidate.layer))?;
        self.check_via_relocation(&plan, budget.descend_via(), reserved)?;
        Ok(plan.relocation())
    }

    fn check_via_relocation(&self, plan: &ViaMove, budget: RecursionBudget, reserved: &Reserved<'_>) -> Result<(), ShoveError> {
        let shape = plan.shape();
        let mut moving = reserved.child();
        plan.ignore_moving(&mut moving);
        for layer in plan.via.layers() {
            self.check_candidate(&plan.via_candidate(&shape, layer), budget, &moving)?;
        }
        let mut dragging = moving.child();
        plan.reserve_new_shape(&mut dragging, &shape);
        for drag in &plan.drags {
            for segment in drag.changed_segments() {
                self.check_candidate(&segment_candidate(drag, &segment), budget.descend(), &dragging)?;
            }
        }
        Ok(())
    }

    /// Reserves the relocated via on all its layers so deeper levels treat
    /// it as fixed
    pub(super) fn reserve_relocated_via(&self, level: &mut Reserved<'_>, relocation: &ViaRelocation) -> Result<(), ShoveError> {
        let via = self.board.get_item(relocation.via)?;
        let shape = Tile::regular_octagon(relocation.new_center, via.half_width());
        for layer in via.layers() {
            level.reserve(shape.clone(), layer, &via.nets, via.clearance_class);
        }
        level.ignore(relocation.via);
        Ok(())
    }
}

impl<'b> ShoveCommit<'b> {
    /// Moves `via` by `delta`, drags the traces ending on it and shoves
    /// whatever is in the way. Check with [`ShoveCheck::check_via_move`] first.
    pub fn insert_via_move(&mut self, via: ItemId, delta: VectorInt, budget: RecursionBudget, reserved: &Reserved<'_>) -> Result<(), ShoveError> {
        let Some(center) = self.board.get_item(via)?.center() else {
            return blocked(FailingObstacle::Item(via));
        };
        let plan = ViaMove::plan(self.board, via, center.translate_by(delta), None)?;
        self.board.clear_changed_area();
        self.commit_via_relocation(&plan, budget, reserved)
    }

    pub(super) fn commit_via_shove(
        &mut self,
        via: ItemId,
        candidate: &Candidate<'_>,
        budget: RecursionBudget,
        reserved: &Reserved<'_>,
    ) -> Result<ViaRelocation, ShoveError> {
        if budget.via <= 0 {
            return blocked(FailingObstacle::Item(via));
        }
        let points = try_shove_via_points(
            self.board,
            candidate.shape,
            candidate.layer,
            candidate.clearance_class,
            via,
            candidate.direction,
            reserved,
        )?;
        let Some(new_center) = points.first().copied() else {
            return blocked(FailingObstacle::Item(via));
        };
        let plan = ViaMove::plan(self.board, via, new_center, Some(candidate.layer))?;
        self.commit_via_relocation(&plan, budget.descend_via(), reserved)?;
        Ok(plan.relocation())
    }

    fn commit_via_relocation(&mut self, plan: &ViaMove, budget: RecursionBudget, reserved: &Reserved<'_>) -> Result<(), ShoveError> {
        let shape = plan.shape();
        let mut moving = reserved.child();
        plan.ignore_moving(&mut moving);
        for layer in plan.via.layers() {
            self.commit_candidate(&plan.via_candidate(&shape, layer), budget, &moving)?;
        }
        self.board.move_item(plan.via.id, plan.delta())?;
        tracing::debug!(via = %plan.via.id, to = %plan.new_center, "via relocated");

        let mut dragging = moving.child();
        plan.reserve_new_shape(&mut dragging, &shape);
        for drag in &plan.drags {
            for segment in drag.changed_segments() {
                self.commit_candidate(&segment_candidate(drag, &segment), budget.descend(), &dragging)?;
            }
            for corner in drag.polyline.corners() {
                self.board.join_changed_area(*corner, drag.layer);
            }
            let area = self.board.changed_area(drag.layer);
            let mut item = self.board.get_item(drag.trace)?.clone();
            item.kind = ItemKind::Trace {
                polyline: drag.polyline.normalize(area.as_ref()),
                half_width: drag.half_width,
                layer: drag.layer,
            };
            self.board.replace_item(item)?;
        }
        Ok(())
    }
}
