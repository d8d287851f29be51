//! The routing board: item store, spatial index and transactions

use super::clearance::ClearanceMatrix;
use super::error::BoardError;
use super::item::{BoardItem, Component, ComponentId, ItemId, ItemKind, NetNo};
use super::search::ShapeSearchTree;
use super::undo::{Change, Snapshot, UndoLog};
use crate::planar::{BoardOutline, Octagon, PointInt, Polyline, Tile, TileBox, VectorInt};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Per layer octagon around the corners touched by the current operation.
/// Trace normalization is restricted to it.
#[derive(Debug, Clone)]
pub struct ChangedArea {
    areas: Vec<Octagon>,
}

impl ChangedArea {
    pub fn new(layer_count: usize) -> Self {
        Self {
            areas: vec![Octagon::EMPTY; layer_count],
        }
    }

    pub fn join(&mut self, corner: PointInt, layer: usize) {
        if let Some(area) = self.areas.get_mut(layer) {
            *area = area.union(&Octagon::point(corner));
        }
    }

    pub fn get_area(&self, layer: usize) -> Option<Octagon> {
        self.areas.get(layer).copied().filter(|a| !a.is_empty())
    }

    pub fn clear(&mut self) {
        for area in self.areas.iter_mut() {
            *area = Octagon::EMPTY;
        }
    }
}

pub struct RoutingBoard {
    items: IndexMap<ItemId, BoardItem>,
    components: IndexMap<ComponentId, Component>,
    search_tree: ShapeSearchTree,
    outline: BoardOutline,
    layer_count: usize,
    clearance: ClearanceMatrix,
    changed_area: ChangedArea,
    undo: UndoLog,
    next_item_no: u64,
    next_component_no: u32,
}

impl RoutingBoard {
    pub fn new(outline: BoardOutline, layer_count: usize, clearance: ClearanceMatrix) -> Self {
        Self {
            items: IndexMap::new(),
            components: IndexMap::new(),
            search_tree: ShapeSearchTree::new(),
            outline,
            layer_count,
            clearance,
            changed_area: ChangedArea::new(layer_count),
            undo: UndoLog::new(),
            next_item_no: 1,
            next_component_no: 1,
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    pub fn outline(&self) -> &BoardOutline {
        &self.outline
    }

    pub fn bounding_box(&self) -> TileBox {
        self.outline.bounding_box()
    }

    pub fn clearance_matrix(&self) -> &ClearanceMatrix {
        &self.clearance
    }

    pub fn clearance_value(&self, class_a: usize, class_b: usize, layer: usize) -> i64 {
        self.clearance.value(class_a, class_b, layer)
    }

    pub fn search_tree(&self) -> &ShapeSearchTree {
        &self.search_tree
    }

    // ---- item access ----

    pub fn item(&self, id: ItemId) -> Option<&BoardItem> {
        self.items.get(&id)
    }

    pub fn get_item(&self, id: ItemId) -> Result<&BoardItem, BoardError> {
        self.items.get(&id).ok_or(BoardError::UnknownItem(id))
    }

    pub fn items(&self) -> impl Iterator<Item = &BoardItem> {
        self.items.values()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn next_item_id(&mut self) -> ItemId {
        let id = ItemId(self.next_item_no);
        self.next_item_no += 1;
        id
    }

    // ---- mutation ----

    fn insert_raw(&mut self, item: BoardItem) {
        self.search_tree.insert_item(&item);
        self.next_item_no = self.next_item_no.max(item.id.0 + 1);
        self.items.insert(item.id, item);
    }

    /// Puts a removed item back at its old place in the iteration order
    fn reinsert_raw(&mut self, index: usize, item: BoardItem) {
        self.search_tree.insert_item(&item);
        self.next_item_no = self.next_item_no.max(item.id.0 + 1);
        self.items.shift_insert(index.min(self.items.len()), item.id, item);
    }

    fn remove_raw(&mut self, id: ItemId) -> Result<(usize, BoardItem), BoardError> {
        let (index, _, item) = self.items.shift_remove_full(&id).ok_or(BoardError::UnknownItem(id))?;
        self.search_tree.remove_item(&item);
        Ok((index, item))
    }

    pub fn insert_item(&mut self, item: BoardItem) -> Result<ItemId, BoardError> {
        if self.items.contains_key(&item.id) {
            return Err(BoardError::DuplicateItem(item.id));
        }
        if item.last_layer() >= self.layer_count || item.first_layer() > item.last_layer() {
            return Err(BoardError::LayerOutOfRange {
                layer: item.last_layer(),
                layer_count: self.layer_count,
            });
        }
        if let Some(component) = item.component {
            if !self.components.contains_key(&component) {
                return Err(BoardError::UnknownComponent(component));
            }
        }
        let id = item.id;
        self.insert_raw(item);
        self.undo.record(Change::Inserted(id));
        Ok(id)
    }

    pub fn remove_item(&mut self, id: ItemId) -> Result<BoardItem, BoardError> {
        let (index, item) = self.remove_raw(id)?;
        self.undo.record(Change::Removed {
            item: item.clone(),
            index,
        });
        Ok(item)
    }

    /// Swaps an item for a new version with the same id
    pub fn replace_item(&mut self, item: BoardItem) -> Result<(), BoardError> {
        self.remove_item(item.id)?;
        self.insert_item(item)?;
        Ok(())
    }

    pub fn move_item(&mut self, id: ItemId, delta: VectorInt) -> Result<(), BoardError> {
        let moved = self.get_item(id)?.translate_by(delta);
        self.replace_item(moved)
    }

    pub fn add_pin(
        &mut self,
        shape: Tile,
        layers: (usize, usize),
        nets: &[NetNo],
        clearance_class: usize,
        component: Option<ComponentId>,
    ) -> Result<ItemId, BoardError> {
        let id = self.next_item_id();
        let center = shape.center().round();
        let mut item = BoardItem::new(
            id,
            nets,
            clearance_class,
            ItemKind::Pin {
                center,
                shape,
                first_layer: layers.0,
                last_layer: layers.1,
            },
        );
        item.component = component;
        self.insert_item(item)
    }

    pub fn add_via(
        &mut self,
        center: PointInt,
        radius: i64,
        layers: (usize, usize),
        nets: &[NetNo],
        clearance_class: usize,
    ) -> Result<ItemId, BoardError> {
        let id = self.next_item_id();
        self.insert_item(BoardItem::new(
            id,
            nets,
            clearance_class,
            ItemKind::Via {
                center,
                radius,
                first_layer: layers.0,
                last_layer: layers.1,
            },
        ))
    }

    pub fn add_trace(
        &mut self,
        corners: Vec<PointInt>,
        half_width: i64,
        layer: usize,
        nets: &[NetNo],
        clearance_class: usize,
    ) -> Result<ItemId, BoardError> {
        let id = self.next_item_id();
        self.insert_item(BoardItem::new(
            id,
            nets,
            clearance_class,
            ItemKind::Trace {
                polyline: Polyline::new(corners),
                half_width,
                layer,
            },
        ))
    }

    pub fn add_conduction_area(
        &mut self,
        shape: Tile,
        layer: usize,
        nets: &[NetNo],
        clearance_class: usize,
        is_obstacle: bool,
    ) -> Result<ItemId, BoardError> {
        let id = self.next_item_id();
        self.insert_item(BoardItem::new(
            id,
            nets,
            clearance_class,
            ItemKind::ConductionArea {
                shape,
                layer,
                is_obstacle,
            },
        ))
    }

    pub fn set_fixed(&mut self, id: ItemId, fixed: bool) -> Result<(), BoardError> {
        let mut item = self.get_item(id)?.clone();
        if item.fixed == fixed {
            return Ok(());
        }
        item.fixed = fixed;
        self.replace_item(item)
    }

    // ---- components ----

    pub fn add_component(&mut self, name: &str, location: PointInt) -> ComponentId {
        let id = ComponentId(self.next_component_no);
        self.next_component_no += 1;
        self.components.insert(
            id,
            Component {
                id,
                name: name.to_string(),
                location,
            },
        );
        id
    }

    pub fn component(&self, id: ComponentId) -> Result<&Component, BoardError> {
        self.components.get(&id).ok_or(BoardError::UnknownComponent(id))
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Updates the component location; its pins are moved separately
    pub fn move_component(&mut self, id: ComponentId, delta: VectorInt) -> Result<(), BoardError> {
        let component = self.components.get_mut(&id).ok_or(BoardError::UnknownComponent(id))?;
        component.location = component.location.translate_by(delta);
        self.undo.record(Change::ComponentMoved { id, delta });
        Ok(())
    }

    // ---- transactions ----

    pub fn generate_snapshot(&mut self) -> Snapshot {
        self.undo.begin()
    }

    /// Undoes every change since `snapshot` was taken
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), BoardError> {
        let changes = self.undo.take_back_to(snapshot)?;
        tracing::debug!(snapshot = snapshot.id(), changes = changes.len(), "restoring board snapshot");
        for change in changes {
            match change {
                Change::Inserted(id) => {
                    self.remove_raw(id)?;
                }
                Change::Removed { item, index } => self.reinsert_raw(index, item),
                Change::ComponentMoved { id, delta } => {
                    let component = self.components.get_mut(&id).ok_or(BoardError::UnknownComponent(id))?;
                    component.location = component.location.translate_by(delta.negate());
                }
            }
        }
        self.changed_area.clear();
        Ok(())
    }

    pub fn release(&mut self, snapshot: Snapshot) -> Result<(), BoardError> {
        self.undo.release(snapshot)
    }

    // ---- changed area ----

    pub fn join_changed_area(&mut self, corner: PointInt, layer: usize) {
        self.changed_area.join(corner, layer);
    }

    pub fn changed_area(&self, layer: usize) -> Option<Octagon> {
        self.changed_area.get_area(layer)
    }

    /// Starts tracking a new operation
    pub fn clear_changed_area(&mut self) {
        self.changed_area.clear();
    }

    // ---- overlap queries ----

    /// Items with a tile on `layer` closer to `shape` than their clearance.
    /// Items sharing one of `excluded_nets` are left out.
    pub fn find_overlap_items_with_clearance(
        &self,
        shape: &Tile,
        layer: usize,
        excluded_nets: &[NetNo],
        clearance_class: usize,
    ) -> BTreeSet<ItemId> {
        let mut result = BTreeSet::new();
        if shape.is_empty() {
            return result;
        }
        let expand = self.clearance.max_for_class(clearance_class, layer);
        for entry in self.search_tree.entries_near(&shape.bounding_box(), layer, expand) {
            if result.contains(&entry.item) {
                continue;
            }
            let item = match self.items.get(&entry.item) {
                Some(item) => item,
                None => continue,
            };
            if !excluded_nets.is_empty() && item.shares_net(excluded_nets) {
                continue;
            }
            let cl = self.clearance.value(clearance_class, item.clearance_class, layer) as f64;
            if entry.tile.violates_clearance(shape, cl) {
                result.insert(entry.item);
            }
        }
        result
    }

    /// True when no item of a foreign net violates clearance with `shape`
    pub fn check_trace_shape(&self, shape: &Tile, layer: usize, nets: &[NetNo], clearance_class: usize) -> bool {
        self.find_overlap_items_with_clearance(shape, layer, &[], clearance_class)
            .iter()
            .filter_map(|id| self.items.get(id))
            .all(|item| !nets.is_empty() && item.shares_net(nets))
    }

    // ---- connectivity ----

    /// Same net items touching `point` on `layer`, other than `except`
    pub fn contacts_at(&self, point: PointInt, layer: usize, nets: &[NetNo], except: ItemId) -> Vec<ItemId> {
        let probe = TileBox::new(point.x, point.y, point.x, point.y);
        let mut result: Vec<ItemId> = Vec::new();
        for entry in self.search_tree.entries_near(&probe, layer, 0) {
            if entry.item == except || result.contains(&entry.item) {
                continue;
            }
            if let Some(item) = self.items.get(&entry.item) {
                if item.shares_net(nets) && item.contacts_point(point, layer) {
                    result.push(item.id);
                }
            }
        }
        result.sort();
        result
    }

    /// All items in contact with `id`
    pub fn connected_items(&self, id: ItemId) -> Result<Vec<ItemId>, BoardError> {
        let item = self.get_item(id)?;
        let mut result: BTreeSet<ItemId> = BTreeSet::new();
        match &item.kind {
            ItemKind::Trace { polyline, layer, .. } => {
                for end in [polyline.first_corner(), polyline.last_corner()].into_iter().flatten() {
                    result.extend(self.contacts_at(end, *layer, &item.nets, id));
                }
            }
            _ => {
                for layer in item.layers() {
                    for tile in item.tiles_on_layer(layer) {
                        for entry in self.search_tree.entries_near(&tile.bounding_box(), layer, 0) {
                            if entry.item == id {
                                continue;
                            }
                            let other = match self.items.get(&entry.item) {
                                Some(other) if other.shares_net_with(item) => other,
                                _ => continue,
                            };
                            let touches = match other.polyline() {
                                Some(polyline) => [polyline.first_corner(), polyline.last_corner()]
                                    .into_iter()
                                    .flatten()
                                    .any(|end| item.contacts_point(end, layer)),
                                None => entry.tile.interiors_overlap(&tile),
                            };
                            if touches {
                                result.insert(other.id);
                            }
                        }
                    }
                }
            }
        }
        Ok(result.into_iter().collect())
    }

    /// An end of trace `id` without any contact
    pub fn is_trace_tail(&self, id: ItemId) -> bool {
        let item = match self.items.get(&id) {
            Some(item) => item,
            None => return false,
        };
        let (polyline, layer) = match &item.kind {
            ItemKind::Trace { polyline, layer, .. } => (polyline, *layer),
            _ => return false,
        };
        [polyline.first_corner(), polyline.last_corner()]
            .into_iter()
            .flatten()
            .any(|end| self.contacts_at(end, layer, &item.nets, id).is_empty())
    }

    /// A trace of `nets` ending at `corner` with nothing attached there
    pub fn get_trace_tail(&self, corner: PointInt, layer: usize, nets: &[NetNo]) -> Option<ItemId> {
        let probe = TileBox::new(corner.x, corner.y, corner.x, corner.y);
        let mut candidates: Vec<ItemId> = self
            .search_tree
            .entries_near(&probe, layer, 0)
            .filter_map(|entry| self.items.get(&entry.item))
            .filter(|item| item.is_trace() && item.shares_net(nets) && item.contacts_point(corner, layer))
            .map(|item| item.id)
            .collect();
        candidates.sort();
        candidates.dedup();
        candidates
            .into_iter()
            .find(|id| self.contacts_at(corner, layer, nets, *id).is_empty())
    }

    pub fn contains_trace_tails(&self, ids: &BTreeSet<ItemId>, nets: &[NetNo]) -> bool {
        ids.iter()
            .filter_map(|id| self.items.get(id))
            .filter(|item| item.is_trace() && (nets.is_empty() || item.shares_net(nets)))
            .any(|item| self.is_trace_tail(item.id))
    }

    /// Removes the unfixed trace chain starting at `tail` up to the next via,
    /// pin or branch. Returns the removed traces.
    pub fn remove_tail(&mut self, tail: ItemId) -> Result<Vec<ItemId>, BoardError> {
        let mut removed = Vec::new();
        let mut current = Some(tail);
        while let Some(id) = current.take() {
            let item = self.get_item(id)?.clone();
            let (polyline, layer) = match &item.kind {
                ItemKind::Trace { polyline, layer, .. } if !item.fixed => (polyline.clone(), *layer),
                _ => break,
            };
            let ends: Vec<PointInt> = [polyline.first_corner(), polyline.last_corner()]
                .into_iter()
                .flatten()
                .collect();
            let contacted: Vec<(PointInt, Vec<ItemId>)> = ends
                .iter()
                .map(|end| (*end, self.contacts_at(*end, layer, &item.nets, id)))
                .filter(|(_, contacts)| !contacts.is_empty())
                .collect();
            self.remove_item(id)?;
            removed.push(id);
            if contacted.len() != 1 || contacted[0].1.len() != 1 {
                break;
            }
            let next = contacted[0].1[0];
            if self.get_item(next)?.is_trace() {
                current = Some(next);
            }
        }
        if !removed.is_empty() {
            tracing::debug!(removed = removed.len(), "removed trace tail");
        }
        Ok(removed)
    }

    /// Merges same net traces whose ends meet with nothing else at the
    /// junction. Returns true if something was combined.
    pub fn combine_traces(&mut self, net: NetNo) -> Result<bool, BoardError> {
        let mut combined = false;
        while let Some((first, second, junction)) = self.find_combinable_pair(net) {
            let (line_a, line_b) = match (self.get_item(first)?.polyline(), self.get_item(second)?.polyline()) {
                (Some(la), Some(lb)) => (la.clone(), lb.clone()),
                _ => break,
            };
            let a = self.remove_item(first)?;
            self.remove_item(second)?;
            let line_a = if line_a.last_corner() == Some(junction) {
                line_a
            } else {
                line_a.reverse()
            };
            let line_b = if line_b.first_corner() == Some(junction) {
                line_b
            } else {
                line_b.reverse()
            };
            let layer = a.first_layer();
            let area = self.changed_area(layer);
            let merged = line_a.combine(&line_b).normalize(area.as_ref());
            let half_width = a.half_width();
            let mut item = a;
            item.kind = ItemKind::Trace {
                polyline: merged,
                half_width,
                layer,
            };
            self.insert_item(item)?;
            combined = true;
        }
        Ok(combined)
    }

    fn find_combinable_pair(&self, net: NetNo) -> Option<(ItemId, ItemId, PointInt)> {
        for item in self.items.values() {
            if !item.is_trace() || item.fixed || !item.nets.contains(&net) {
                continue;
            }
            let Some(polyline) = item.polyline() else {
                continue;
            };
            let layer = item.first_layer();
            for end in [polyline.first_corner(), polyline.last_corner()].into_iter().flatten() {
                let contacts = self.contacts_at(end, layer, &item.nets, item.id);
                if contacts.len() != 1 {
                    continue;
                }
                let other = match self.items.get(&contacts[0]) {
                    Some(other) => other,
                    None => continue,
                };
                let compatible = other.is_trace()
                    && !other.fixed
                    && other.nets == item.nets
                    && other.clearance_class == item.clearance_class
                    && other.half_width() == item.half_width()
                    && other.first_layer() == layer;
                if compatible && self.contacts_at(end, layer, &other.nets, other.id) == vec![item.id] {
                    return Some((item.id, other.id, end));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::clearance::ClearanceRule;

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

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut b = board();
        let t = b.add_trace(vec![PointInt::new(10, 10), PointInt::new(100, 10)], 5, 0, &[1], 1).unwrap();
        let before: Vec<BoardItem> = b.items().cloned().collect();

        let snapshot = b.generate_snapshot();
        b.move_item(t, VectorInt::new(0, 50)).unwrap();
        b.add_via(PointInt::new(500, 500), 6, (0, 1), &[2], 1).unwrap();
        assert_eq!(b.item_count(), 2);
        b.restore(snapshot).unwrap();

        let mut after: Vec<BoardItem> = b.items().cloned().collect();
        after.sort_by_key(|i| i.id);
        assert_eq!(after, before);
        assert_eq!(b.search_tree().size(), 1);
    }

    #[test]
    fn test_overlap_query_uses_clearance() {
        let mut b = board();
        let t = b.add_trace(vec![PointInt::new(100, 100), PointInt::new(200, 100)], 5, 0, &[1], 1).unwrap();
        // 4 units below the trace edge, clearance is 3
        let near = Tile::Box(TileBox::new(120, 109, 130, 120));
        assert!(b.find_overlap_items_with_clearance(&near, 0, &[], 1).is_empty());
        let close = Tile::Box(TileBox::new(120, 107, 130, 120));
        assert_eq!(b.find_overlap_items_with_clearance(&close, 0, &[], 1).into_iter().collect::<Vec<_>>(), vec![t]);
        assert!(b.find_overlap_items_with_clearance(&close, 0, &[1], 1).is_empty());
        assert!(b.find_overlap_items_with_clearance(&close, 1, &[], 1).is_empty());
        assert!(b.check_trace_shape(&close, 0, &[1], 1));
        assert!(!b.check_trace_shape(&close, 0, &[2], 1));
    }

    #[test]
    fn test_tails_and_combine() {
        let mut b = board();
        b.add_via(PointInt::new(100, 100), 6, (0, 1), &[1], 1).unwrap();
        let first = b.add_trace(vec![PointInt::new(100, 100), PointInt::new(200, 100)], 5, 0, &[1], 1).unwrap();
        let second = b.add_trace(vec![PointInt::new(200, 100), PointInt::new(300, 100)], 5, 0, &[1], 1).unwrap();
        assert_eq!(b.get_trace_tail(PointInt::new(300, 100), 0, &[1]), Some(second));
        assert_eq!(b.get_trace_tail(PointInt::new(200, 100), 0, &[1]), None);

        assert!(b.combine_traces(1).unwrap());
        let merged = b.get_item(first).unwrap();
        assert_eq!(
            merged.polyline().unwrap().corners(),
            &[PointInt::new(100, 100), PointInt::new(300, 100)]
        );
        assert!(b.item(second).is_none());

        let removed = b.remove_tail(first).unwrap();
        assert_eq!(removed, vec![first]);
        assert_eq!(b.item_count(), 1);
    }

    #[test]
    fn test_restore_keeps_iteration_order() {
        let mut b = board();
        let first = b.add_trace(vec![PointInt::new(10, 10), PointInt::new(100, 10)], 5, 0, &[1], 1).unwrap();
        let via = b.add_via(PointInt::new(500, 500), 6, (0, 1), &[2], 1).unwrap();
        let last = b.add_trace(vec![PointInt::new(10, 300), PointInt::new(100, 300)], 5, 1, &[3], 1).unwrap();
        let order = |b: &RoutingBoard| b.items().map(|item| item.id).collect::<Vec<_>>();
        assert_eq!(order(&b), vec![first, via, last]);

        let snapshot = b.generate_snapshot();
        b.remove_item(first).unwrap();
        b.move_item(via, VectorInt::new(20, 0)).unwrap();
        b.restore(snapshot).unwrap();
        assert_eq!(order(&b), vec![first, via, last]);
        assert_eq!(b.get_item(via).unwrap().center(), Some(PointInt::new(500, 500)));
    }
}
