// Forced pad insertion scenarios on small generated boards
use copper_shove::board::clearance_violations;
use copper_shove::shove::{Deadline, RecursionBudget};
use copper_shove::{
    insert_forced_pad, BoardOutline, BoardItem, ClearanceMatrix, ClearanceRule, DrillTier, FailingObstacle, ItemId,
    PadRequest, PointInt, Reserved, RoutingBoard, ShoveCheck, ShoveCommit, ShoveDrillResult, ShoveSettings, Tile,
    TileBox,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: i64, y: i64) -> PointInt {
        PointInt::new(x, y)
    }

    fn clearance_rules() -> Vec<ClearanceRule> {
        vec![ClearanceRule {
            class_a: 1,
            class_b: 1,
            layer: None,
            value: 3,
        }]
    }

    fn settings(general: i32, via: i32) -> ShoveSettings {
        ShoveSettings {
            max_recursion_depth: general,
            max_via_recursion_depth: via,
            check_only_front: false,
            clearance_rules: clearance_rules(),
            ..ShoveSettings::default()
        }
    }

    struct Scenario {
        board: RoutingBoard,
        crossing: ItemId,
        via: ItemId,
        via_trace: ItemId,
    }

    /// A trace of width 10 crossing the pad area, a via of another net 5
    /// units inside the pad footprint and a trace leaving that via upwards
    fn scenario() -> Scenario {
        let outline = BoardOutline::from_box(TileBox::new(0, 0, 1000, 1000));
        let mut board = RoutingBoard::new(outline, 2, ClearanceMatrix::from_rules(2, 2, &clearance_rules()));
        let crossing = board.add_trace(vec![pt(300, 500), pt(700, 500)], 5, 0, &[2], 1).unwrap();
        let via = board.add_via(pt(515, 515), 6, (0, 1), &[3], 1).unwrap();
        let via_trace = board.add_trace(vec![pt(515, 515), pt(515, 800)], 5, 0, &[3], 1).unwrap();
        Scenario {
            board,
            crossing,
            via,
            via_trace,
        }
    }

    fn pad_request() -> PadRequest {
        PadRequest::new(Tile::Box(TileBox::centered(pt(500, 500), 40, 40)), 0, &[1], 1)
    }

    fn budget(general: i32, via: i32) -> RecursionBudget {
        RecursionBudget::new(general, via, Deadline::NONE)
    }

    fn snapshot_of(board: &RoutingBoard) -> Vec<BoardItem> {
        let mut items: Vec<BoardItem> = board.items().cloned().collect();
        items.sort_by_key(|item| item.id);
        items
    }

    /// Corners of the only trace of `net`, oriented to start at `start`
    fn trace_corners(board: &RoutingBoard, net: u32, start: PointInt) -> Vec<PointInt> {
        let traces: Vec<&BoardItem> = board
            .items()
            .filter(|item| item.is_trace() && item.nets.contains(&net))
            .collect();
        assert_eq!(traces.len(), 1, "net {} should end up as one trace", net);
        let mut corners = traces[0].polyline().unwrap().corners().to_vec();
        if corners[0] != start {
            corners.reverse();
        }
        corners
    }

    #[test]
    fn test_scenario_check_then_commit() {
        let mut s = scenario();
        let before = snapshot_of(&s.board);
        let tier = ShoveCheck::new(&s.board).check_forced_pad(&pad_request(), budget(2, 1), &Reserved::root());
        assert_eq!(tier, Ok(DrillTier::Drillable));
        assert_eq!(snapshot_of(&s.board), before, "check must not touch the board");

        let pad = insert_forced_pad(&mut s.board, &pad_request(), &settings(2, 1)).unwrap();
        assert!(s.board.get_item(pad).unwrap().is_pin());
        assert_eq!(s.board.get_item(s.via).unwrap().center(), Some(pt(531, 515)));
        assert_eq!(
            trace_corners(&s.board, 2, pt(300, 500)),
            vec![pt(300, 500), pt(470, 500), pt(470, 470), pt(530, 470), pt(530, 500), pt(700, 500)]
        );
        assert_eq!(
            trace_corners(&s.board, 3, pt(531, 515)),
            vec![pt(531, 515), pt(530, 516), pt(530, 530), pt(516, 530), pt(515, 531), pt(515, 800)]
        );
        assert!(clearance_violations(&s.board).is_empty());

        println!("✓ Pad inserted, via moved to (531, 515), crossing trace rerouted");
        println!("  Items after insertion: {}", s.board.item_count());
    }

    #[test]
    fn test_via_depth_zero_is_not_drillable() {
        let s = scenario();
        let result = ShoveCheck::new(&s.board).check_forced_pad(&pad_request(), budget(2, 0), &Reserved::root());
        assert_eq!(ShoveDrillResult::from_check(result.clone()), Ok(ShoveDrillResult::NotDrillable));
        assert_eq!(result.unwrap_err().failing_obstacle(), Some(&FailingObstacle::Item(s.via)));
        println!("✓ Via shove refused without via depth");
    }

    #[test]
    fn test_general_depth_zero_blocks_rerouting() {
        let s = scenario();
        let result = ShoveCheck::new(&s.board).check_forced_pad(&pad_request(), budget(0, 1), &Reserved::root());
        let obstacle = result.unwrap_err().failing_obstacle().cloned();
        assert!(
            obstacle == Some(FailingObstacle::Item(s.crossing)) || obstacle == Some(FailingObstacle::Item(s.via_trace)),
            "unexpected obstacle {:?}",
            obstacle
        );
        println!("✓ Rerouting refused without general depth");
    }

    #[test]
    fn test_pad_outside_outline_on_any_layer() {
        let s = scenario();
        let check = ShoveCheck::new(&s.board);
        for layer in 0..2 {
            for shape in [
                Tile::Box(TileBox::new(-10, 480, 30, 520)),
                Tile::Box(TileBox::new(980, 980, 1020, 1020)),
                Tile::regular_octagon(pt(995, 500), 20),
            ] {
                let request = PadRequest::new(shape, layer, &[1], 1);
                let result = check.check_forced_pad(&request, budget(2, 1), &Reserved::root());
                assert_eq!(result.unwrap_err().failing_obstacle(), Some(&FailingObstacle::Outline));
            }
        }
        println!("✓ Pads leaving the outline are never drillable");
    }

    #[test]
    fn test_empty_pad_commit_keeps_board() {
        let mut s = scenario();
        let before = snapshot_of(&s.board);
        let empty = PadRequest::new(Tile::Box(TileBox::EMPTY), 0, &[1], 1);
        ShoveCommit::new(&mut s.board)
            .forced_pad(&empty, budget(2, 1), &Reserved::root())
            .unwrap();
        assert_eq!(snapshot_of(&s.board), before);
        println!("✓ Empty pad is a no-op");
    }

    #[test]
    fn test_overlapping_detours_fail_in_check_and_commit() {
        let outline = BoardOutline::from_box(TileBox::new(0, 0, 1000, 1000));
        let mut board = RoutingBoard::new(outline, 1, ClearanceMatrix::from_rules(2, 1, &clearance_rules()));
        board.add_trace(vec![pt(300, 476), pt(700, 476)], 5, 0, &[2], 1).unwrap();
        let second = board.add_trace(vec![pt(300, 494), pt(700, 494)], 5, 0, &[4], 1).unwrap();
        let before = snapshot_of(&board);

        let checked = ShoveCheck::new(&board).check_forced_pad(&pad_request(), budget(5, 1), &Reserved::root());
        assert_eq!(checked.unwrap_err().failing_obstacle(), Some(&FailingObstacle::Item(second)));
        let committed = ShoveCommit::new(&mut board).forced_pad(&pad_request(), budget(5, 1), &Reserved::root());
        assert_eq!(committed.unwrap_err().failing_obstacle(), Some(&FailingObstacle::Item(second)));
        assert_eq!(snapshot_of(&board), before);
        println!("✓ Second detour on the same border is refused");
    }

    #[test]
    fn test_caller_restores_after_commit() {
        let mut s = scenario();
        let before = snapshot_of(&s.board);
        let snapshot = s.board.generate_snapshot();
        ShoveCommit::new(&mut s.board)
            .forced_pad(&pad_request(), budget(2, 1), &Reserved::root())
            .unwrap();
        assert_ne!(snapshot_of(&s.board), before);
        s.board.restore(snapshot).unwrap();
        assert_eq!(snapshot_of(&s.board), before);
        println!("✓ Snapshot restore brings back the original board");
    }

    #[test]
    fn test_fixed_via_blocks_pad() {
        let mut s = scenario();
        s.board.set_fixed(s.via, true).unwrap();
        let result = ShoveCheck::new(&s.board).check_forced_pad(&pad_request(), budget(2, 1), &Reserved::root());
        assert_eq!(result.unwrap_err().failing_obstacle(), Some(&FailingObstacle::Item(s.via)));
        println!("✓ Fixed via is a hard obstacle");
    }
}
