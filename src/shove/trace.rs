//! Shoving a single trace segment
//!
//! A trace segment runs through the same core as a pad, entered from the
//! side opposite to its direction. Segments of the traces it reroutes are
//! shoved again one level deeper, which gives the cascade through chains of
//! traces and vias.

use super::budget::RecursionBudget;
use super::from_side::{FromSide, ShapeAndFromSide};
use super::reserved::Reserved;
use super::result::ShoveError;
use super::{Candidate, ShoveCheck, ShoveCommit};
use crate::board::NetNo;
use crate::planar::{Direction45, Polyline, Tile};

/// A trace segment to make room for
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRequest {
    pub shape: Tile,
    pub from_side: FromSide,
    pub direction: Option<Direction45>,
    pub layer: usize,
    pub nets: Vec<NetNo>,
    pub clearance_class: usize,
}

impl TraceRequest {
    /// Request for segment `index` of a planned trace
    pub fn from_segment(
        polyline: &Polyline,
        index: usize,
        half_width: i64,
        layer: usize,
        nets: &[NetNo],
        clearance_class: usize,
    ) -> Option<Self> {
        let segment = ShapeAndFromSide::for_trace_segment(polyline, index, half_width, false)?;
        Some(Self {
            shape: segment.shape,
            from_side: segment.from_side,
            direction: segment.direction,
            layer,
            nets: nets.to_vec(),
            clearance_class,
        })
    }

    fn candidate(&self) -> Candidate<'_> {
        Candidate {
            shape: &self.shape,
            layer: self.layer,
            nets: &self.nets,
            clearance_class: self.clearance_class,
            from_side: self.from_side,
            direction: self.direction,
            copper_sharing_allowed: false,
            check_only_front: false,
        }
    }
}

impl<'b> ShoveCheck<'b> {
    /// Checks whether the segment can be inserted after shoving what is in
    /// its way
    pub fn check_trace(&self, request: &TraceRequest, budget: RecursionBudget, reserved: &Reserved<'_>) -> Result<(), ShoveError> {
        self.check_candidate(&request.candidate(), budget, reserved)?;
        Ok(())
    }
}

impl<'b> ShoveCommit<'b> {
    /// Shoves everything out of the way of the segment. The segment itself is
    /// inserted by the caller.
    pub fn insert_trace(&mut self, request: &TraceRequest, budget: RecursionBudget, reserved: &Reserved<'_>) -> Result<(), ShoveError> {
        self.board.clear_changed_area();
        self.commit_candidate(&request.candidate(), budget, reserved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{ClearanceMatrix, ClearanceRule, RoutingBoard};
    use crate::planar::{BoardOutline, PointInt, TileBox};
    use crate::shove::{Deadline, FailingObstacle};

    fn pt(x: i64, y: i64) -> PointInt {
        PointInt::new(x, y)
    }

    fn board() -> RoutingBoard {
        let clearance = ClearanceMatrix::from_rules(
            2,
            1,
            &[ClearanceRule {
                class_a: 1,
                class_b: 1,
                layer: None,
                value: 3,
            }],
        );
        RoutingBoard::new(BoardOutline::from_box(TileBox::new(0, 0, 1000, 1000)), 1, clearance)
    }

    fn budget(general: i32) -> RecursionBudget {
        RecursionBudget::new(general, 0, Deadline::NONE)
    }

    #[test]
    fn test_request_from_segment() {
        let line = Polyline::new(vec![pt(0, 0), pt(0, 100)]);
        let request = TraceRequest::from_segment(&line, 0, 5, 0, &[1], 1).unwrap();
        assert_eq!(request.direction, Some(Direction45::UP));
        assert_eq!(request.from_side.side_no, Some(0));
        assert!(TraceRequest::from_segment(&line, 1, 5, 0, &[1], 1).is_none());
    }

    #[test]
    fn test_detour_leaving_outline_fails() {
        let mut b = board();
        b.add_trace(vec![pt(300, 500), pt(700, 500)], 5, 0, &[2], 1).unwrap();
        // the planned segment spans the whole board, the crossing trace
        // would have to leave the outline to get around it
        let planned = Polyline::new(vec![pt(500, 5), pt(500, 995)]);
        let request = TraceRequest::from_segment(&planned, 0, 5, 0, &[1], 1).unwrap();
        let result = ShoveCheck::new(&b).check_trace(&request, budget(1), &Reserved::root());
        assert_eq!(result.unwrap_err().failing_obstacle(), Some(&FailingObstacle::Outline));
    }

    #[test]
    fn test_short_segment_pushes_trace() {
        let mut b = board();
        b.add_trace(vec![pt(300, 500), pt(700, 500)], 5, 0, &[2], 1).unwrap();
        let planned = Polyline::new(vec![pt(480, 500), pt(520, 500)]);
        let request = TraceRequest::from_segment(&planned, 0, 5, 0, &[1], 1).unwrap();
        ShoveCheck::new(&b)
            .check_trace(&request, budget(1), &Reserved::root())
            .unwrap();
        ShoveCommit::new(&mut b)
            .insert_trace(&request, budget(1), &Reserved::root())
            .unwrap();
        assert!(b.check_trace_shape(&request.shape, 0, &[1], 1));
    }

    #[test]
    fn test_depth_exhausted_reports_cut_trace() {
        let mut b = board();
        let t = b.add_trace(vec![pt(300, 500), pt(700, 500)], 5, 0, &[2], 1).unwrap();
        let planned = Polyline::new(vec![pt(480, 500), pt(520, 500)]);
        let request = TraceRequest::from_segment(&planned, 0, 5, 0, &[1], 1).unwrap();
        let result = ShoveCheck::new(&b).check_trace(&request, budget(0), &Reserved::root());
        assert_eq!(result.unwrap_err().failing_obstacle(), Some(&FailingObstacle::Item(t)));
    }
}
