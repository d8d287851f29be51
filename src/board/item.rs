//! Board items: pins, vias, traces and conduction areas

use crate::planar::{PointInt, Polyline, Tile, VectorInt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

pub type NetNo = u32;

/// Stable identity of a board item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

/// A placed component; its pins move together with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub name: String,
    pub location: PointInt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Component pin, the same pad shape on every layer of its range
    Pin {
        center: PointInt,
        shape: Tile,
        first_layer: usize,
        last_layer: usize,
    },
    /// Through or blind via with a regular octagon pad
    Via {
        center: PointInt,
        radius: i64,
        first_layer: usize,
        last_layer: usize,
    },
    Trace {
        polyline: Polyline,
        half_width: i64,
        layer: usize,
    },
    /// Copper plane; only an obstacle for foreign nets when `is_obstacle`
    ConductionArea {
        shape: Tile,
        layer: usize,
        is_obstacle: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardItem {
    pub id: ItemId,
    /// Sorted net numbers; empty for unconnected copper
    pub nets: Vec<NetNo>,
    pub clearance_class: usize,
    pub fixed: bool,
    pub component: Option<ComponentId>,
    pub kind: ItemKind,
}

impl BoardItem {
    pub fn new(id: ItemId, nets: &[NetNo], clearance_class: usize, kind: ItemKind) -> Self {
        let mut nets = nets.to_vec();
        nets.sort_unstable();
        nets.dedup();
        Self {
            id,
            nets,
            clearance_class,
            fixed: false,
            component: None,
            kind,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ItemKind::Pin { .. } => "pin",
            ItemKind::Via { .. } => "via",
            ItemKind::Trace { .. } => "trace",
            ItemKind::ConductionArea { .. } => "conduction area",
        }
    }

    pub fn is_pin(&self) -> bool {
        matches!(self.kind, ItemKind::Pin { .. })
    }

    pub fn is_via(&self) -> bool {
        matches!(self.kind, ItemKind::Via { .. })
    }

    pub fn is_trace(&self) -> bool {
        matches!(self.kind, ItemKind::Trace { .. })
    }

    pub fn is_conduction_area(&self) -> bool {
        matches!(self.kind, ItemKind::ConductionArea { .. })
    }

    /// Pins and vias
    pub fn is_drill_item(&self) -> bool {
        self.is_pin() || self.is_via()
    }

    pub fn first_layer(&self) -> usize {
        match &self.kind {
            ItemKind::Pin { first_layer, .. } | ItemKind::Via { first_layer, .. } => *first_layer,
            ItemKind::Trace { layer, .. } | ItemKind::ConductionArea { layer, .. } => *layer,
        }
    }

    pub fn last_layer(&self) -> usize {
        match &self.kind {
            ItemKind::Pin { last_layer, .. } | ItemKind::Via { last_layer, .. } => *last_layer,
            ItemKind::Trace { layer, .. } | ItemKind::ConductionArea { layer, .. } => *layer,
        }
    }

    pub fn layers(&self) -> RangeInclusive<usize> {
        self.first_layer()..=self.last_layer()
    }

    pub fn is_on_layer(&self, layer: usize) -> bool {
        self.layers().contains(&layer)
    }

    pub fn shares_net(&self, nets: &[NetNo]) -> bool {
        self.nets.iter().any(|n| nets.contains(n))
    }

    pub fn shares_net_with(&self, other: &BoardItem) -> bool {
        self.shares_net(&other.nets)
    }

    /// Center of a pin or via
    pub fn center(&self) -> Option<PointInt> {
        match &self.kind {
            ItemKind::Pin { center, .. } | ItemKind::Via { center, .. } => Some(*center),
            _ => None,
        }
    }

    pub fn polyline(&self) -> Option<&Polyline> {
        match &self.kind {
            ItemKind::Trace { polyline, .. } => Some(polyline),
            _ => None,
        }
    }

    pub fn half_width(&self) -> i64 {
        match &self.kind {
            ItemKind::Trace { half_width, .. } => *half_width,
            ItemKind::Via { radius, .. } => *radius,
            _ => 0,
        }
    }

    /// Pad shape of a drill item, identical on all its layers
    pub fn drill_shape(&self) -> Option<Tile> {
        match &self.kind {
            ItemKind::Pin { shape, .. } => Some(shape.clone()),
            ItemKind::Via { center, radius, .. } => Some(Tile::regular_octagon(*center, *radius)),
            _ => None,
        }
    }

    /// Convex tiles covering the item on `layer`
    pub fn tiles_on_layer(&self, layer: usize) -> Vec<Tile> {
        if !self.is_on_layer(layer) {
            return Vec::new();
        }
        match &self.kind {
            ItemKind::Pin { shape, .. } => vec![shape.clone()],
            ItemKind::Via { center, radius, .. } => vec![Tile::regular_octagon(*center, *radius)],
            ItemKind::Trace {
                polyline,
                half_width,
                ..
            } => polyline.segment_tiles(*half_width),
            ItemKind::ConductionArea { shape, .. } => vec![shape.clone()],
        }
    }

    /// The point where a trace end makes contact with this item
    pub fn contacts_point(&self, p: PointInt, layer: usize) -> bool {
        if !self.is_on_layer(layer) {
            return false;
        }
        match &self.kind {
            ItemKind::Trace { polyline, .. } => {
                polyline.first_corner() == Some(p) || polyline.last_corner() == Some(p)
            }
            ItemKind::Pin { shape, .. } | ItemKind::ConductionArea { shape, .. } => shape.contains(p.to_float()),
            ItemKind::Via { center, radius, .. } => Tile::regular_octagon(*center, *radius).contains(p.to_float()),
        }
    }

    pub fn translate_by(&self, v: VectorInt) -> BoardItem {
        let kind = match &self.kind {
            ItemKind::Pin {
                center,
                shape,
                first_layer,
                last_layer,
            } => ItemKind::Pin {
                center: center.translate_by(v),
                shape: shape.translate_by(v),
                first_layer: *first_layer,
                last_layer: *last_layer,
            },
            ItemKind::Via {
                center,
                radius,
                first_layer,
                last_layer,
            } => ItemKind::Via {
                center: center.translate_by(v),
                radius: *radius,
                first_layer: *first_layer,
                last_layer: *last_layer,
            },
            ItemKind::Trace {
                polyline,
                half_width,
                layer,
            } => ItemKind::Trace {
                polyline: polyline.translate_by(v),
                half_width: *half_width,
                layer: *layer,
            },
            ItemKind::ConductionArea {
                shape,
                layer,
                is_obstacle,
            } => ItemKind::ConductionArea {
                shape: shape.translate_by(v),
                layer: *layer,
                is_obstacle: *is_obstacle,
            },
        };
        BoardItem {
            id: self.id,
            nets: self.nets.clone(),
            clearance_class: self.clearance_class,
            fixed: self.fixed,
            component: self.component,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planar::TileBox;

    #[test]
    fn test_trace_tiles_and_contacts() {
        let trace = BoardItem::new(
            ItemId(1),
            &[2],
            1,
            ItemKind::Trace {
                polyline: Polyline::new(vec![PointInt::new(0, 0), PointInt::new(10, 0), PointInt::new(10, 10)]),
                half_width: 2,
                layer: 0,
            },
        );
        assert_eq!(trace.tiles_on_layer(0).len(), 2);
        assert!(trace.tiles_on_layer(1).is_empty());
        assert!(trace.contacts_point(PointInt::new(10, 10), 0));
        assert!(!trace.contacts_point(PointInt::new(10, 0), 0));
    }

    #[test]
    fn test_translate_pin() {
        let mut pin = BoardItem::new(
            ItemId(7),
            &[3, 1, 3],
            1,
            ItemKind::Pin {
                center: PointInt::new(5, 5),
                shape: Tile::Box(TileBox::centered(PointInt::new(5, 5), 4, 4)),
                first_layer: 0,
                last_layer: 1,
            },
        );
        pin.fixed = true;
        assert_eq!(pin.nets, vec![1, 3]);
        let moved = pin.translate_by(VectorInt::new(10, 0));
        assert_eq!(moved.center(), Some(PointInt::new(15, 5)));
        assert!(moved.fixed);
        assert_eq!(moved.tiles_on_layer(1), vec![Tile::Box(TileBox::new(13, 3, 17, 7))]);
    }
}
