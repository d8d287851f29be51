//! Board wide clearance violation scan
//!
//! Uses the R-tree for candidate pair filtering and Rayon to check the
//! tiles in parallel. The scan only reads the board.

use super::item::{BoardItem, ItemId};
use super::search::TreeEntry;
use super::store::RoutingBoard;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearanceViolation {
    pub first: ItemId,
    pub second: ItemId,
    pub layer: usize,
    pub distance: f64,
    pub required: i64,
}

/// Check if two items should be checked against each other
pub fn should_check_pair(a: &BoardItem, b: &BoardItem) -> bool {
    // Each pair once
    if a.id >= b.id {
        return false;
    }
    // Same net - skip
    !a.shares_net_with(b)
}

fn violations_of_entry(board: &RoutingBoard, entry: &TreeEntry, only_pair_owner: bool) -> Vec<ClearanceViolation> {
    let mut violations = Vec::new();
    let item_a = match board.item(entry.item) {
        Some(item) => item,
        None => return violations,
    };
    let expand = board.clearance_matrix().max_for_class(item_a.clearance_class, entry.layer);
    for neighbor in board.search_tree().entries_near(&entry.tile.bounding_box(), entry.layer, expand) {
        let item_b = match board.item(neighbor.item) {
            Some(item) => item,
            None => continue,
        };
        let check = if only_pair_owner {
            should_check_pair(item_a, item_b)
        } else {
            item_a.id != item_b.id && !item_a.shares_net_with(item_b)
        };
        if !check {
            continue;
        }
        let required = board.clearance_value(item_a.clearance_class, item_b.clearance_class, entry.layer);
        if entry.tile.violates_clearance(&neighbor.tile, required as f64) {
            let (first, second) = if item_a.id < item_b.id {
                (item_a.id, item_b.id)
            } else {
                (item_b.id, item_a.id)
            };
            violations.push(ClearanceViolation {
                first,
                second,
                layer: entry.layer,
                distance: entry.tile.distance(&neighbor.tile),
                required,
            });
        }
    }
    violations
}

/// Keeps the closest violation per (item pair, layer), sorted
fn merge_violations(violations: Vec<ClearanceViolation>) -> Vec<ClearanceViolation> {
    let mut merged: BTreeMap<(ItemId, ItemId, usize), ClearanceViolation> = BTreeMap::new();
    for v in violations {
        let key = (v.first, v.second, v.layer);
        match merged.get(&key) {
            Some(existing) if existing.distance <= v.distance => {}
            _ => {
                merged.insert(key, v);
            }
        }
    }
    merged.into_values().collect()
}

/// Every pair of net disjoint items closer than their clearance
pub fn clearance_violations(board: &RoutingBoard) -> Vec<ClearanceViolation> {
    let entries: Vec<&TreeEntry> = board.search_tree().iter().collect();
    let violations: Vec<ClearanceViolation> = entries
        .par_iter()
        .flat_map(|entry| violations_of_entry(board, entry, true))
        .collect();
    let merged = merge_violations(violations);
    if !merged.is_empty() {
        tracing::debug!(count = merged.len(), "clearance violations found");
    }
    merged
}

/// Violations involving the given item only
pub fn item_clearance_violations(board: &RoutingBoard, id: ItemId) -> Vec<ClearanceViolation> {
    let entries: Vec<&TreeEntry> = board.search_tree().iter().filter(|e| e.item == id).collect();
    let violations: Vec<ClearanceViolation> = entries
        .iter()
        .flat_map(|entry| violations_of_entry(board, entry, false))
        .collect();
    merge_violations(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::clearance::{ClearanceMatrix, ClearanceRule};
    use crate::planar::{BoardOutline, PointInt, TileBox};

    #[test]
    fn test_violation_scan() {
        let clearance = ClearanceMatrix::from_rules(
            2,
            1,
            &[ClearanceRule {
                class_a: 1,
                class_b: 1,
                layer: None,
                value: 10,
            }],
        );
        let mut board = RoutingBoard::new(BoardOutline::from_box(TileBox::new(0, 0, 1000, 1000)), 1, clearance);
        let a = board.add_trace(vec![PointInt::new(0, 100), PointInt::new(500, 100)], 5, 0, &[1], 1).unwrap();
        let b = board.add_trace(vec![PointInt::new(0, 115), PointInt::new(500, 115)], 5, 0, &[2], 1).unwrap();
        board.add_trace(vec![PointInt::new(0, 115), PointInt::new(0, 300)], 5, 0, &[2], 1).unwrap();
        board.add_trace(vec![PointInt::new(0, 500), PointInt::new(500, 500)], 5, 0, &[3], 1).unwrap();

        let violations = clearance_violations(&board);
        assert_eq!(violations.len(), 2);
        assert_eq!((violations[0].first, violations[0].second), (a, b));
        assert!((violations[0].distance - 5.0).abs() < 1e-9);
        assert_eq!(item_clearance_violations(&board, b).len(), 1);
    }
}
