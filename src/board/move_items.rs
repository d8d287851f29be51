//! Moving a group of items together with their components

use super::drc::item_clearance_violations;
use super::error::MoveError;
use super::item::{ComponentId, ItemId};
use super::store::RoutingBoard;
use crate::planar::VectorInt;
use std::collections::{BTreeSet, VecDeque};

/// Items and components that move as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSelection {
    pub items: BTreeSet<ItemId>,
    pub components: BTreeSet<ComponentId>,
}

impl MoveSelection {
    /// Extends `items` to whole components and to the unfixed items connected
    /// to them. Conduction areas are ignored, so pins contacting a plane can
    /// still be moved.
    pub fn prepare(board: &RoutingBoard, items: &[ItemId]) -> Result<MoveSelection, MoveError> {
        if items.is_empty() {
            return Err(MoveError::EmptySelection);
        }
        let mut selected: BTreeSet<ItemId> = BTreeSet::new();
        let mut components: BTreeSet<ComponentId> = BTreeSet::new();
        for id in items {
            let item = board.get_item(*id)?;
            match item.component {
                Some(component) => {
                    board.component(component)?;
                    if components.insert(component) {
                        selected.extend(board.items().filter(|i| i.component == Some(component)).map(|i| i.id));
                    }
                }
                None => {
                    selected.insert(*id);
                }
            }
        }

        let mut added: BTreeSet<ItemId> = BTreeSet::new();
        for id in selected.iter() {
            let item = board.get_item(*id)?;
            if item.fixed {
                return Err(MoveError::FixedItem(*id));
            }
            for contact in connected_set(board, *id)? {
                let other = board.get_item(contact)?;
                if other.is_conduction_area() || selected.contains(&contact) {
                    continue;
                }
                if other.fixed {
                    return Err(MoveError::FixedItem(contact));
                }
                if let Some(component) = other.component {
                    if !components.contains(&component) {
                        return Err(MoveError::ConnectedOutside(*id, contact));
                    }
                }
                added.insert(contact);
            }
        }
        selected.extend(added);
        Ok(MoveSelection {
            items: selected,
            components,
        })
    }
}

/// Transitive contacts of an item, not passing through conduction areas
fn connected_set(board: &RoutingBoard, start: ItemId) -> Result<BTreeSet<ItemId>, MoveError> {
    let mut visited: BTreeSet<ItemId> = BTreeSet::new();
    let mut queue: VecDeque<ItemId> = VecDeque::from([start]);
    while let Some(id) = queue.pop_front() {
        for contact in board.connected_items(id)? {
            if contact == start || !visited.insert(contact) {
                continue;
            }
            if !board.get_item(contact)?.is_conduction_area() {
                queue.push_back(contact);
            }
        }
    }
    Ok(visited)
}

/// Translates the selection by `delta`. When the moved items end up with
/// clearance violations the board is restored and the move refused.
pub fn move_items(board: &mut RoutingBoard, selection: &MoveSelection, delta: VectorInt) -> Result<(), MoveError> {
    let snapshot = board.generate_snapshot();
    let moved = apply_move(board, selection, delta);
    let violation_count = match moved {
        Ok(()) => selection
            .items
            .iter()
            .map(|id| item_clearance_violations(board, *id).len())
            .sum(),
        Err(err) => {
            board.restore(snapshot)?;
            return Err(err.into());
        }
    };
    if violation_count > 0 {
        tracing::debug!(violation_count, "move refused");
        board.restore(snapshot)?;
        return Err(MoveError::Violations(violation_count));
    }
    board.release(snapshot)?;
    tracing::info!(items = selection.items.len(), components = selection.components.len(), "moved items");
    Ok(())
}

fn apply_move(board: &mut RoutingBoard, selection: &MoveSelection, delta: VectorInt) -> Result<(), super::error::BoardError> {
    for id in selection.items.iter() {
        board.move_item(*id, delta)?;
    }
    for component in selection.components.iter() {
        board.move_component(*component, delta)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::clearance::{ClearanceMatrix, ClearanceRule};
    use crate::planar::{BoardOutline, PointInt, Tile, TileBox};

    fn board() -> RoutingBoard {
        let clearance = ClearanceMatrix::from_rules(
            2,
            1,
            &[ClearanceRule {
                class_a: 1,
                class_b: 1,
                layer: None,
                value: 5,
            }],
        );
        RoutingBoard::new(BoardOutline::from_box(TileBox::new(0, 0, 1000, 1000)), 1, clearance)
    }

    #[test]
    fn test_selection_expands_to_component_and_traces() {
        let mut b = board();
        let c = b.add_component("U1", PointInt::new(100, 100));
        let p1 = b
            .add_pin(Tile::Box(TileBox::centered(PointInt::new(100, 100), 10, 10)), (0, 0), &[1], 1, Some(c))
            .unwrap();
        let p2 = b
            .add_pin(Tile::Box(TileBox::centered(PointInt::new(140, 100), 10, 10)), (0, 0), &[2], 1, Some(c))
            .unwrap();
        let t = b.add_trace(vec![PointInt::new(100, 100), PointInt::new(100, 200)], 2, 0, &[1], 1).unwrap();

        let selection = MoveSelection::prepare(&b, &[p1]).unwrap();
        assert_eq!(selection.items, BTreeSet::from([p1, p2, t]));

        move_items(&mut b, &selection, VectorInt::new(50, 0)).unwrap();
        assert_eq!(b.component(c).unwrap().location, PointInt::new(150, 100));
        assert_eq!(b.get_item(p2).unwrap().center(), Some(PointInt::new(190, 100)));
    }

    #[test]
    fn test_fixed_contact_rejects() {
        let mut b = board();
        let v = b.add_via(PointInt::new(300, 300), 6, (0, 0), &[1], 1).unwrap();
        let t = b.add_trace(vec![PointInt::new(300, 300), PointInt::new(400, 300)], 2, 0, &[1], 1).unwrap();
        b.set_fixed(t, true).unwrap();
        assert_eq!(MoveSelection::prepare(&b, &[v]), Err(MoveError::FixedItem(t)));
    }

    #[test]
    fn test_violating_move_is_restored() {
        let mut b = board();
        let v = b.add_via(PointInt::new(300, 300), 6, (0, 0), &[1], 1).unwrap();
        b.add_via(PointInt::new(400, 300), 6, (0, 0), &[2], 1).unwrap();
        let selection = MoveSelection::prepare(&b, &[v]).unwrap();
        let result = move_items(&mut b, &selection, VectorInt::new(95, 0));
        assert_eq!(result, Err(MoveError::Violations(1)));
        assert_eq!(b.get_item(v).unwrap().center(), Some(PointInt::new(300, 300)));
    }
}
