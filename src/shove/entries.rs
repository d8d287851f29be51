//! Obstacle classification around a candidate shape
//!
//! Obstacles found for a candidate are split into blocking items, vias to
//! relocate and traces to cut. A cut trace keeps its pieces outside the
//! detour region (the candidate's bounding octagon, or bounding box in
//! orthogonal mode, enlarged by clearance + half width + 2) and gets one
//! substitute piece that walks around the region border.

use super::result::{FailingObstacle, ShoveError};
use crate::board::{BoardItem, ItemId, ItemKind, NetNo, RoutingBoard};
use crate::planar::{Octagon, PointFloat, PointInt, Polyline, Tile, VectorInt};
use std::collections::BTreeSet;
use std::f64::consts::TAU;

const ANGLE_EPSILON: f64 = 1e-9;

/// A via that is moved out of the way, with the data needed to find and
/// drag the traces ending on it
#[derive(Debug, Clone, PartialEq)]
pub struct ViaRelocation {
    pub via: ItemId,
    pub old_center: PointInt,
    pub new_center: PointInt,
    pub first_layer: usize,
    pub last_layer: usize,
    pub nets: Vec<NetNo>,
}

impl ViaRelocation {
    pub fn delta(&self) -> VectorInt {
        self.new_center.difference_by(self.old_center)
    }

    fn drags(&self, trace: &BoardItem, end: PointInt, layer: usize) -> bool {
        end == self.old_center && (self.first_layer..=self.last_layer).contains(&layer) && trace.shares_net(&self.nets)
    }
}

/// A trace split around the candidate
#[derive(Debug, Clone, PartialEq)]
pub struct TraceCut {
    pub trace: ItemId,
    pub layer: usize,
    pub half_width: i64,
    pub nets: Vec<NetNo>,
    pub clearance_class: usize,
    /// Pieces left in place before and after the substitute
    pub kept: Vec<Polyline>,
    /// The rerouted part; `None` when it shrank to a point
    pub substitute: Option<Polyline>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct InsideInterval {
    seg_in: usize,
    entry: PointInt,
    side_in: usize,
    seg_out: usize,
    exit: PointInt,
    side_out: usize,
}

enum Crossing {
    Intervals(Vec<InsideInterval>),
    EndInside,
}

/// Angular interval around the candidate center, counterclockwise
#[derive(Debug, Clone, Copy)]
struct Arc {
    start: f64,
    sweep: f64,
}

impl Arc {
    fn overlaps(&self, other: &Arc) -> bool {
        (other.start - self.start).rem_euclid(TAU) <= self.sweep + ANGLE_EPSILON
            || (self.start - other.start).rem_euclid(TAU) <= other.sweep + ANGLE_EPSILON
    }
}

/// Classification of the obstacles of one candidate shape on one layer
pub struct ShapeTraceEntries<'b> {
    board: &'b RoutingBoard,
    shape: Tile,
    layer: usize,
    nets: Vec<NetNo>,
    clearance_class: usize,
    shove_vias: Vec<ItemId>,
    traces: Vec<ItemId>,
    attach_smd: bool,
    cuts: Vec<TraceCut>,
    arcs: Vec<Arc>,
    stack_depth: usize,
    found_obstacle: Option<FailingObstacle>,
}

impl<'b> ShapeTraceEntries<'b> {
    pub fn new(board: &'b RoutingBoard, shape: &Tile, layer: usize, nets: &[NetNo], clearance_class: usize) -> Self {
        Self {
            board,
            shape: shape.clone(),
            layer,
            nets: nets.to_vec(),
            clearance_class,
            shove_vias: Vec::new(),
            traces: Vec::new(),
            attach_smd: false,
            cuts: Vec::new(),
            arcs: Vec::new(),
            stack_depth: 1,
            found_obstacle: None,
        }
    }

    /// Sorts the obstacles into vias to shove and traces to cut. Fixed items,
    /// foreign pins and obstacle planes block; foreign pins are tolerated
    /// when copper sharing is allowed.
    pub fn store_items(&mut self, obstacles: &BTreeSet<ItemId>, copper_sharing_allowed: bool) -> Result<(), ShoveError> {
        let board = self.board;
        for id in obstacles {
            let item = board.get_item(*id)?;
            if !self.nets.is_empty() && item.shares_net(&self.nets) {
                continue;
            }
            if item.is_conduction_area() {
                if matches!(item.kind, ItemKind::ConductionArea { is_obstacle: false, .. }) {
                    continue;
                }
                return Err(self.block(*id));
            }
            if item.fixed {
                return Err(self.block(*id));
            }
            if item.is_pin() {
                if copper_sharing_allowed {
                    self.attach_smd = true;
                    continue;
                }
                return Err(self.block(*id));
            }
            if item.is_via() {
                self.shove_vias.push(*id);
            } else if item.is_trace() {
                self.traces.push(*id);
            }
        }
        Ok(())
    }

    fn block(&mut self, id: ItemId) -> ShoveError {
        self.found_obstacle = Some(FailingObstacle::Item(id));
        ShoveError::blocked(FailingObstacle::Item(id))
    }

    /// Cuts the obstacle traces, plus the traces ending on relocated vias,
    /// around the candidate. Traces on relocated vias are dragged to the new
    /// via center first.
    pub fn cut_traces(&mut self, relocations: &[ViaRelocation]) -> Result<(), ShoveError> {
        let mut to_cut: BTreeSet<ItemId> = self.traces.iter().copied().collect();
        for relocation in relocations {
            if !(relocation.first_layer..=relocation.last_layer).contains(&self.layer) {
                continue;
            }
            for id in self.board.contacts_at(relocation.old_center, self.layer, &relocation.nets, relocation.via) {
                if self.board.get_item(id)?.is_trace() {
                    to_cut.insert(id);
                }
            }
        }
        for id in to_cut {
            let item = self.board.get_item(id)?.clone();
            if item.fixed {
                return Err(self.block(id));
            }
            self.cut_trace(&item, relocations)?;
        }
        Ok(())
    }

    fn cut_trace(&mut self, item: &BoardItem, relocations: &[ViaRelocation]) -> Result<(), ShoveError> {
        let Some(polyline) = item.polyline() else {
            return Ok(());
        };
        let mut corners: Vec<PointInt> = polyline.corners().to_vec();
        if corners.len() < 2 {
            return Ok(());
        }
        let layer = self.layer;
        let changed = drag_ends(&mut corners, |end| {
            relocations
                .iter()
                .find(|r| r.drags(item, end, layer))
                .map(|r| r.new_center)
        });

        let half_width = item.half_width();
        let offset = self.board.clearance_value(self.clearance_class, item.clearance_class, self.layer) + half_width + 2;
        let region = self.detour_region(offset);
        let dragged = Polyline::new(corners);

        let intervals = match inside_intervals(&dragged, &region) {
            Crossing::Intervals(intervals) => intervals,
            Crossing::EndInside => return Err(self.block(item.id)),
        };
        if intervals.len() > 1 {
            self.mark_stack_overflow(item.id);
        }

        let (full, sub_start, sub_end) = match intervals.first() {
            None => match changed {
                Some((c0, c1)) => (dragged.corners().to_vec(), c0, c1),
                // only touches the region border
                None => return Ok(()),
            },
            Some(interval) => {
                let (detour, arc) = self.detour(&region, interval);
                if self.arcs.iter().any(|other| other.overlaps(&arc)) {
                    self.mark_stack_overflow(item.id);
                }
                self.arcs.push(arc);
                splice_detour(dragged.corners(), interval, &detour, changed)
            }
        };

        let mut kept = Vec::new();
        if sub_start > 0 {
            push_piece(&mut kept, &full[..=sub_start]);
        }
        if sub_end + 1 < full.len() {
            push_piece(&mut kept, &full[sub_end..]);
        }
        let substitute = Polyline::new(full[sub_start..=sub_end].to_vec()).normalize(None);
        self.cuts.push(TraceCut {
            trace: item.id,
            layer: self.layer,
            half_width,
            nets: item.nets.clone(),
            clearance_class: item.clearance_class,
            kept,
            substitute: (!substitute.is_degenerate()).then_some(substitute),
        });
        Ok(())
    }

    fn mark_stack_overflow(&mut self, id: ItemId) {
        if self.stack_depth < 2 {
            self.stack_depth = 2;
            self.found_obstacle = Some(FailingObstacle::Item(id));
        }
    }

    fn detour_region(&self, offset: i64) -> Octagon {
        match &self.shape {
            Tile::Box(b) => Octagon::from_box(&b.enlarge(offset)),
            other => other.bounding_octagon().enlarge(offset),
        }
    }

    /// Border corners between entry and exit along the shorter way round,
    /// counterclockwise on ties, and the angular arc they cover
    fn detour(&self, region: &Octagon, interval: &InsideInterval) -> (Vec<PointInt>, Arc) {
        let perimeter = region.perimeter();
        let pos_in = region.boundary_position(interval.entry, interval.side_in);
        let pos_out = region.boundary_position(interval.exit, interval.side_out);
        let ccw_len = (pos_out - pos_in).rem_euclid(perimeter);
        let counterclockwise = ccw_len <= perimeter - ccw_len;
        let raw = region.corners_raw();
        let same_side = interval.side_in == interval.side_out;
        let mut corners = Vec::new();
        if counterclockwise {
            if !(same_side && pos_out >= pos_in) {
                let mut count = (interval.side_out + 8 - interval.side_in) % 8;
                if count == 0 {
                    count = 8;
                }
                for j in 1..=count {
                    corners.push(raw[(interval.side_in + j) % 8]);
                }
            }
        } else if !(same_side && pos_out <= pos_in) {
            let mut count = (interval.side_in + 8 - interval.side_out) % 8;
            if count == 0 {
                count = 8;
            }
            for j in 1..=count {
                corners.push(raw[(interval.side_in + 8 - (j - 1)) % 8]);
            }
        }

        let center = self.shape.center();
        let a_in = angle_around(center, interval.entry);
        let a_out = angle_around(center, interval.exit);
        let arc = if counterclockwise {
            Arc {
                start: a_in,
                sweep: (a_out - a_in).rem_euclid(TAU),
            }
        } else {
            Arc {
                start: a_out,
                sweep: (a_in - a_out).rem_euclid(TAU),
            }
        };
        (corners, arc)
    }

    pub fn shove_vias(&self) -> &[ItemId] {
        &self.shove_vias
    }

    /// A tolerated obstacle was a foreign pin
    pub fn attach_smd(&self) -> bool {
        self.attach_smd
    }

    pub fn cuts(&self) -> &[TraceCut] {
        &self.cuts
    }

    /// Non degenerate substitute pieces with the cut they belong to
    pub fn substitutes(&self) -> impl Iterator<Item = (&TraceCut, &Polyline)> {
        self.cuts
            .iter()
            .filter_map(|cut| cut.substitute.as_ref().map(|piece| (cut, piece)))
    }

    pub fn stack_depth(&self) -> usize {
        self.stack_depth
    }

    pub fn found_obstacle(&self) -> Option<&FailingObstacle> {
        self.found_obstacle.as_ref()
    }

    pub fn is_orthogonal(&self) -> bool {
        self.shape.is_box()
    }
}

fn angle_around(center: PointFloat, p: PointInt) -> f64 {
    (p.y as f64 - center.y).atan2(p.x as f64 - center.x).rem_euclid(TAU)
}

fn push_piece(pieces: &mut Vec<Polyline>, corners: &[PointInt]) {
    let piece = Polyline::new(corners.to_vec()).normalize(None);
    if !piece.is_degenerate() {
        pieces.push(piece);
    }
}

/// Moves the ends of a center line for which `new_end` gives a new position.
/// Returns the corner range that changed, if any end moved.
pub(super) fn drag_ends(corners: &mut Vec<PointInt>, new_end: impl Fn(PointInt) -> Option<PointInt>) -> Option<(usize, usize)> {
    if corners.len() < 2 {
        return None;
    }
    let mut changed: Option<(usize, usize)> = None;
    if let Some(target) = new_end(corners[0]) {
        changed = Some(drag_start(corners, target));
    }
    if let Some(target) = corners.last().copied().and_then(&new_end) {
        corners.reverse();
        let (c0, c1) = drag_start(corners, target);
        corners.reverse();
        let n = corners.len() - 1;
        let range = (n - c1, n - c0);
        changed = Some(match changed {
            Some((a, b)) => (a.min(range.0), b.max(range.1)),
            None => range,
        });
    }
    changed
}

/// Moves the first corner to `new_center` and reconnects it to the next
/// corner with an orthogonal leg followed by a diagonal one. Returns the
/// corner index range that no longer follows the old center line.
fn drag_start(corners: &mut Vec<PointInt>, new_center: PointInt) -> (usize, usize) {
    let old = corners[0];
    let next = corners[1];
    let dx = new_center.x - next.x;
    let dy = new_center.y - next.y;
    let knee = if dx.abs() > dy.abs() {
        PointInt::new(next.x + dx.signum() * (dx.abs() - dy.abs()), next.y)
    } else {
        PointInt::new(next.x, next.y + dy.signum() * (dy.abs() - dx.abs()))
    };
    let mut dragged = vec![new_center];
    let changed_end = if knee != next && knee != new_center {
        dragged.push(knee);
        if on_segment(knee, next, old) {
            1
        } else {
            2
        }
    } else {
        1
    };
    dragged.extend_from_slice(&corners[1..]);
    *corners = dragged;
    (0, changed_end)
}

fn on_segment(p: PointInt, a: PointInt, b: PointInt) -> bool {
    let ab = b.difference_by(a);
    let ap = p.difference_by(a);
    ab.cross(ap) == 0 && ap.dot(ab) >= 0 && ap.dot(ab) <= ab.dot(ab)
}

/// Side of `region` on whose border line `p` lies, with `toward` pointing
/// inward (`inward`) or not
fn border_side_at(region: &Octagon, p: PointInt, toward: VectorInt, inward: bool) -> Option<usize> {
    let tight: Vec<(usize, i64)> = (0..8)
        .filter_map(|side| {
            let (a, b, c) = region.side_constraint(side);
            (a * p.x + b * p.y == c).then_some((side, a * toward.x + b * toward.y))
        })
        .collect();
    let preferred = tight
        .iter()
        .find(|(_, dot)| if inward { *dot < 0 } else { *dot > 0 })
        .map(|(side, _)| *side);
    if inward {
        preferred
    } else {
        preferred.or_else(|| tight.first().map(|(side, _)| *side))
    }
}

/// Runs of the center line through the interior of `region`
fn inside_intervals(polyline: &Polyline, region: &Octagon) -> Crossing {
    let corners = polyline.corners();
    let mut result = Vec::new();
    let mut open: Option<(usize, PointInt, usize)> = None;
    for i in 0..polyline.segment_count() {
        let (a, b) = (corners[i], corners[i + 1]);
        if a == b {
            continue;
        }
        let (af, bf) = (a.to_float(), b.to_float());
        let clip = match region.clip_segment(af, bf) {
            Some(clip) if clip.t_out - clip.t_in > ANGLE_EPSILON => clip,
            _ => continue,
        };
        let mid = af.lerp(bf, (clip.t_in + clip.t_out) / 2.0);
        if !region.contains_inner(mid) {
            continue;
        }
        if open.is_none() {
            let entry = match clip.side_in {
                Some(side) => Some((region.snap_to_side(af.lerp(bf, clip.t_in), side), side)),
                None => border_side_at(region, a, b.difference_by(a), true).map(|side| (a, side)),
            };
            match entry {
                Some((point, side)) => open = Some((i, point, side)),
                None => return Crossing::EndInside,
            }
        }
        let exit = match clip.side_out {
            Some(side) => Some((region.snap_to_side(af.lerp(bf, clip.t_out), side), side)),
            None if !region.contains_inner(bf) => {
                border_side_at(region, b, b.difference_by(a), false).map(|side| (b, side))
            }
            None => None,
        };
        if let Some((point, side)) = exit {
            if let Some((seg_in, entry, side_in)) = open.take() {
                result.push(InsideInterval {
                    seg_in,
                    entry,
                    side_in,
                    seg_out: i,
                    exit: point,
                    side_out: side,
                });
            }
        }
    }
    if open.is_some() {
        return Crossing::EndInside;
    }
    Crossing::Intervals(result)
}

/// Replaces the inside run by the detour. Returns the new corner list and
/// the index range of the substitute piece within it.
fn splice_detour(
    corners: &[PointInt],
    interval: &InsideInterval,
    detour: &[PointInt],
    changed: Option<(usize, usize)>,
) -> (Vec<PointInt>, usize, usize) {
    let mut full: Vec<PointInt> = corners[..=interval.seg_in].to_vec();
    let entry_idx = full.len();
    full.push(interval.entry);
    full.extend_from_slice(detour);
    let exit_idx = full.len();
    full.push(interval.exit);
    full.extend_from_slice(&corners[interval.seg_out + 1..]);

    let map_after = |k: usize| k - (interval.seg_out + 1) + exit_idx + 1;
    let (mut sub_start, mut sub_end) = (entry_idx, exit_idx);
    if let Some((c0, c1)) = changed {
        let start = if c0 <= interval.seg_in {
            c0
        } else if c0 > interval.seg_out {
            map_after(c0)
        } else {
            entry_idx
        };
        let end = if c1 > interval.seg_out {
            map_after(c1)
        } else if c1 <= interval.seg_in {
            c1
        } else {
            exit_idx
        };
        sub_start = sub_start.min(start);
        sub_end = sub_end.max(end);
    }
    (full, sub_start, sub_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{ClearanceMatrix, ClearanceRule};
    use crate::planar::{BoardOutline, TileBox};

    fn pt(x: i64, y: i64) -> PointInt {
        PointInt::new(x, y)
    }

    fn board() -> RoutingBoard {
        let clearance = ClearanceMatrix::from_rules(
            2,
            2,
            &[ClearanceRule {
                class_a: 1,
                class_b: 1,
                layer: None,
                value: 3,
            }],
        );
        RoutingBoard::new(BoardOutline::from_box(TileBox::new(0, 0, 1000, 1000)), 2, clearance)
    }

    fn pad() -> Tile {
        Tile::Box(TileBox::new(480, 480, 520, 520))
    }

    fn classify<'b>(board: &'b RoutingBoard, relocations: &[ViaRelocation]) -> Result<ShapeTraceEntries<'b>, ShoveError> {
        let obstacles = board.find_overlap_items_with_clearance(&pad(), 0, &[1], 1);
        let mut entries = ShapeTraceEntries::new(board, &pad(), 0, &[1], 1);
        entries.store_items(&obstacles, false)?;
        entries.cut_traces(relocations)?;
        Ok(entries)
    }

    #[test]
    fn test_crossing_trace_is_cut_counterclockwise() {
        let mut b = board();
        let t = b.add_trace(vec![pt(300, 500), pt(700, 500)], 5, 0, &[2], 1).unwrap();
        let entries = classify(&b, &[]).unwrap();
        assert_eq!(entries.stack_depth(), 1);
        let cut = &entries.cuts()[0];
        assert_eq!(cut.trace, t);
        assert_eq!(
            cut.substitute.as_ref().unwrap().corners(),
            &[pt(470, 500), pt(470, 470), pt(530, 470), pt(530, 500)]
        );
        assert_eq!(cut.kept.len(), 2);
        assert_eq!(cut.kept[0].corners(), &[pt(300, 500), pt(470, 500)]);
        assert_eq!(cut.kept[1].corners(), &[pt(530, 500), pt(700, 500)]);
    }

    #[test]
    fn test_shorter_way_round_wins() {
        let mut b = board();
        b.add_trace(vec![pt(300, 515), pt(700, 515)], 5, 0, &[2], 1).unwrap();
        let entries = classify(&b, &[]).unwrap();
        let piece = entries.cuts()[0].substitute.clone().unwrap();
        assert_eq!(piece.corners(), &[pt(470, 515), pt(470, 530), pt(530, 530), pt(530, 515)]);
    }

    #[test]
    fn test_overlapping_detours_exceed_stack_depth() {
        let mut b = board();
        b.add_trace(vec![pt(300, 476), pt(700, 476)], 5, 0, &[2], 1).unwrap();
        let t2 = b.add_trace(vec![pt(300, 494), pt(700, 494)], 5, 0, &[4], 1).unwrap();
        let entries = classify(&b, &[]).unwrap();
        assert_eq!(entries.stack_depth(), 2);
        assert_eq!(entries.found_obstacle(), Some(&FailingObstacle::Item(t2)));
    }

    #[test]
    fn test_trace_ending_inside_blocks() {
        let mut b = board();
        let t = b.add_trace(vec![pt(300, 500), pt(500, 500)], 5, 0, &[2], 1).unwrap();
        let result = classify(&b, &[]);
        assert_eq!(
            result.err().and_then(|e| e.failing_obstacle().cloned()),
            Some(FailingObstacle::Item(t))
        );
    }

    #[test]
    fn test_fixed_and_pins_block_unless_shared() {
        let mut b = board();
        let p = b
            .add_pin(Tile::Box(TileBox::new(515, 490, 530, 510)), (0, 0), &[5], 1, None)
            .unwrap();
        let obstacles = b.find_overlap_items_with_clearance(&pad(), 0, &[1], 1);
        let mut strict = ShapeTraceEntries::new(&b, &pad(), 0, &[1], 1);
        assert!(strict.store_items(&obstacles, false).is_err());
        assert_eq!(strict.found_obstacle(), Some(&FailingObstacle::Item(p)));
        let mut shared = ShapeTraceEntries::new(&b, &pad(), 0, &[1], 1);
        shared.store_items(&obstacles, true).unwrap();
        assert!(shared.attach_smd());
    }

    #[test]
    fn test_trace_on_relocated_via_is_dragged() {
        let mut b = board();
        let v = b.add_via(pt(515, 515), 6, (0, 1), &[3], 1).unwrap();
        b.add_trace(vec![pt(515, 515), pt(515, 800)], 5, 0, &[3], 1).unwrap();
        let entries = {
            let obstacles = b.find_overlap_items_with_clearance(&pad(), 0, &[1], 1);
            let mut entries = ShapeTraceEntries::new(&b, &pad(), 0, &[1], 1);
            entries.store_items(&obstacles, false).unwrap();
            assert_eq!(entries.shove_vias(), &[v]);
            let relocation = ViaRelocation {
                via: v,
                old_center: pt(515, 515),
                new_center: pt(531, 515),
                first_layer: 0,
                last_layer: 1,
                nets: vec![3],
            };
            entries.cut_traces(&[relocation]).unwrap();
            entries
        };
        let cut = &entries.cuts()[0];
        assert_eq!(
            cut.substitute.as_ref().unwrap().corners(),
            &[pt(531, 515), pt(530, 516), pt(530, 530), pt(516, 530), pt(515, 531)]
        );
        assert_eq!(cut.kept[0].corners(), &[pt(515, 531), pt(515, 800)]);
    }

    #[test]
    fn test_drag_start_knee() {
        let mut corners = vec![pt(515, 515), pt(515, 800)];
        assert_eq!(drag_start(&mut corners, pt(531, 515)), (0, 1));
        assert_eq!(corners, vec![pt(531, 515), pt(515, 531), pt(515, 800)]);

        let mut corners = vec![pt(0, 0), pt(100, 0)];
        assert_eq!(drag_start(&mut corners, pt(0, 10)), (0, 1));
        assert_eq!(corners, vec![pt(0, 10), pt(10, 0), pt(100, 0)]);

        // the knee leaves the old diagonal, so the leg to the next corner changes too
        let mut corners = vec![pt(0, 0), pt(100, 100)];
        assert_eq!(drag_start(&mut corners, pt(0, 10)), (0, 2));
        assert_eq!(corners, vec![pt(0, 10), pt(90, 100), pt(100, 100)]);
    }
}
