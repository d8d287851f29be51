// Via moves, group moves and outline handling through the public API
use copper_shove::board::{clearance_violations, move_items, MoveError, MoveSelection};
use copper_shove::shove::{calc_from_side, Deadline, RecursionBudget};
use copper_shove::{
    BoardOutline, ClearanceMatrix, ClearanceRule, FailingObstacle, PadRequest, PointInt, Reserved, RoutingBoard,
    ShoveCheck, ShoveCommit, Tile, TileBox, VectorInt,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: i64, y: i64) -> PointInt {
        PointInt::new(x, y)
    }

    fn clearance(layers: usize) -> ClearanceMatrix {
        ClearanceMatrix::from_rules(
            2,
            layers,
            &[ClearanceRule {
                class_a: 1,
                class_b: 1,
                layer: None,
                value: 3,
            }],
        )
    }

    fn square_board(layers: usize) -> RoutingBoard {
        RoutingBoard::new(BoardOutline::from_box(TileBox::new(0, 0, 1000, 1000)), layers, clearance(layers))
    }

    fn budget() -> RecursionBudget {
        RecursionBudget::new(3, 1, Deadline::NONE)
    }

    #[test]
    fn test_via_move_pushes_foreign_trace() {
        let mut board = square_board(2);
        let via = board.add_via(pt(200, 200), 6, (0, 1), &[3], 1).unwrap();
        let dragged = board.add_trace(vec![pt(200, 200), pt(200, 100)], 5, 1, &[3], 1).unwrap();
        // a foreign trace right where the via is going
        let other = board.add_trace(vec![pt(100, 260), pt(300, 260)], 5, 0, &[4], 1).unwrap();
        let delta = VectorInt::new(0, 60);

        ShoveCheck::new(&board)
            .check_via_move(via, delta, budget(), &Reserved::root())
            .unwrap();
        ShoveCommit::new(&mut board)
            .insert_via_move(via, delta, budget(), &Reserved::root())
            .unwrap();

        assert_eq!(board.get_item(via).unwrap().center(), Some(pt(200, 260)));
        let dragged_corners = board.get_item(dragged).unwrap().polyline().unwrap().corners().to_vec();
        assert_eq!(dragged_corners.first(), Some(&pt(200, 260)));
        assert!(board.item(other).is_none() || board.get_item(other).unwrap().polyline().unwrap().corner_count() > 2);
        assert!(clearance_violations(&board).is_empty());
        println!("✓ Via moved by {:?}, foreign trace rerouted", delta);
    }

    #[test]
    fn test_concave_outline_rejects_pad_in_notch() {
        let outline = BoardOutline::from_polygon(
            vec![pt(0, 0), pt(1000, 0), pt(1000, 500), pt(500, 500), pt(500, 1000), pt(0, 1000)],
            &[],
        );
        let board = RoutingBoard::new(outline, 1, clearance(1));
        let check = ShoveCheck::new(&board);
        let inside = PadRequest::new(Tile::Box(TileBox::new(100, 100, 140, 140)), 0, &[1], 1);
        assert!(check.check_forced_pad(&inside, budget(), &Reserved::root()).is_ok());
        let notch = PadRequest::new(Tile::Box(TileBox::new(700, 700, 740, 740)), 0, &[1], 1);
        let result = check.check_forced_pad(&notch, budget(), &Reserved::root());
        assert_eq!(result.unwrap_err().failing_obstacle(), Some(&FailingObstacle::Outline));
        // ends on the board, middle across the notch
        let across = Tile::segment(pt(880, 400), pt(400, 880), 20, false);
        let diagonal = PadRequest::new(across, 0, &[1], 1);
        let result = check.check_forced_pad(&diagonal, budget(), &Reserved::root());
        assert_eq!(result.unwrap_err().failing_obstacle(), Some(&FailingObstacle::Outline));
        println!("✓ Pads in or across the outline notch are refused");
    }

    #[test]
    fn test_from_side_avoids_blocked_side() {
        let mut board = square_board(1);
        let center = pt(500, 500);
        let pad = Tile::Box(TileBox::centered(center, 40, 40));
        board.add_trace(vec![pt(400, 475), pt(600, 475)], 5, 0, &[7], 1).unwrap();
        let side = calc_from_side(&board, &pad, center, 0, 10, 1);
        assert_eq!(side.side_no, Some(2));
        println!("✓ From side {:?}", side.side_no);
    }

    #[test]
    fn test_group_move_with_component() {
        let mut board = square_board(1);
        let component = board.add_component("U1", pt(100, 100));
        let pin = board
            .add_pin(Tile::Box(TileBox::centered(pt(100, 100), 10, 10)), (0, 0), &[1], 1, Some(component))
            .unwrap();
        let trace = board.add_trace(vec![pt(100, 100), pt(100, 200)], 2, 0, &[1], 1).unwrap();
        let selection = MoveSelection::prepare(&board, &[pin]).unwrap();
        assert!(selection.items.contains(&trace));
        move_items(&mut board, &selection, VectorInt::new(30, 0)).unwrap();
        assert_eq!(board.component(component).unwrap().location, pt(130, 100));

        board.add_via(pt(200, 100), 6, (0, 0), &[2], 1).unwrap();
        let selection = MoveSelection::prepare(&board, &[pin]).unwrap();
        let refused = move_items(&mut board, &selection, VectorInt::new(60, 0));
        assert!(matches!(refused, Err(MoveError::Violations(_))));
        assert_eq!(board.component(component).unwrap().location, pt(130, 100));
        println!("✓ Group move applied, then refused on violation");
    }
}
