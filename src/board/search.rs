//! R-tree spatial index over the tiles of all board items
//!
//! Every item contributes one entry per (layer, tile). Queries expand the
//! search envelope by the clearance, so the index never misses an item that
//! could violate clearance; exact tests happen on the returned tiles.

use super::item::{BoardItem, ItemId};
use crate::planar::{Tile, TileBox};
use rstar::{RTree, RTreeObject, AABB};

/// One tile of one item on one layer
#[derive(Clone, Debug)]
pub struct TreeEntry {
    pub item: ItemId,
    pub layer: usize,
    pub index: usize,
    pub tile: Tile,
    envelope: AABB<[i64; 2]>,
}

impl TreeEntry {
    pub fn new(item: ItemId, layer: usize, index: usize, tile: Tile) -> Self {
        let b = tile.bounding_box();
        Self {
            item,
            layer,
            index,
            tile,
            envelope: AABB::from_corners([b.ll.x, b.ll.y], [b.ur.x, b.ur.y]),
        }
    }
}

impl PartialEq for TreeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item && self.layer == other.layer && self.index == other.index
    }
}

impl RTreeObject for TreeEntry {
    type Envelope = AABB<[i64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

#[derive(Default)]
pub struct ShapeSearchTree {
    tree: RTree<TreeEntry>,
}

impl ShapeSearchTree {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    pub fn entries_of(item: &BoardItem) -> Vec<TreeEntry> {
        item.layers()
            .flat_map(|layer| {
                item.tiles_on_layer(layer)
                    .into_iter()
                    .enumerate()
                    .map(move |(index, tile)| TreeEntry::new(item.id, layer, index, tile))
            })
            .collect()
    }

    pub fn insert_item(&mut self, item: &BoardItem) {
        for entry in Self::entries_of(item) {
            self.tree.insert(entry);
        }
    }

    pub fn remove_item(&mut self, item: &BoardItem) {
        for entry in Self::entries_of(item) {
            if self.tree.remove(&entry).is_none() {
                tracing::warn!(item = %item.id, layer = entry.layer, "tree entry missing on remove");
            }
        }
    }

    pub fn size(&self) -> usize {
        self.tree.size()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.tree.iter()
    }

    /// Entries on `layer` whose bounding box comes within `expand` of `area`
    pub fn entries_near<'a>(&'a self, area: &TileBox, layer: usize, expand: i64) -> impl Iterator<Item = &'a TreeEntry> + 'a {
        let search_bounds = AABB::from_corners(
            [area.ll.x - expand, area.ll.y - expand],
            [area.ur.x + expand, area.ur.y + expand],
        );
        self.tree
            .locate_in_envelope_intersecting(&search_bounds)
            .filter(move |entry| entry.layer == layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::item::ItemKind;
    use crate::planar::{PointInt, Polyline};

    #[test]
    fn test_insert_query_remove() {
        let trace = BoardItem::new(
            ItemId(1),
            &[1],
            1,
            ItemKind::Trace {
                polyline: Polyline::new(vec![PointInt::new(0, 0), PointInt::new(100, 0), PointInt::new(100, 100)]),
                half_width: 5,
                layer: 0,
            },
        );
        let mut tree = ShapeSearchTree::new();
        tree.insert_item(&trace);
        assert_eq!(tree.size(), 2);
        let near = TileBox::new(50, 12, 60, 20);
        assert_eq!(tree.entries_near(&near, 0, 0).count(), 0);
        assert_eq!(tree.entries_near(&near, 0, 7).count(), 1);
        assert_eq!(tree.entries_near(&near, 1, 7).count(), 0);
        tree.remove_item(&trace);
        assert_eq!(tree.size(), 0);
    }
}
