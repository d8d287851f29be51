//! Shapes pending insertion while a shove cascades
//!
//! Every nesting level of a shove pushes a link onto this chain: the shape
//! it is making room for, the replacement pieces it intends to insert and
//! the items it is about to remove or move. Deeper levels see reserved
//! shapes of foreign nets as fixed obstacles and skip the ignored items.

use crate::board::{ItemId, NetNo, RoutingBoard};
use crate::planar::Tile;

#[derive(Debug, Clone)]
pub struct ReservedShape {
    pub shape: Tile,
    pub layer: usize,
    pub nets: Vec<NetNo>,
    pub clearance_class: usize,
}

#[derive(Debug, Default)]
pub struct Reserved<'a> {
    shapes: Vec<ReservedShape>,
    ignored: Vec<ItemId>,
    parent: Option<&'a Reserved<'a>>,
}

impl<'a> Reserved<'a> {
    pub fn root() -> Reserved<'static> {
        Reserved {
            shapes: Vec::new(),
            ignored: Vec::new(),
            parent: None,
        }
    }

    pub fn child<'s>(&'s self) -> Reserved<'s> {
        Reserved {
            shapes: Vec::new(),
            ignored: Vec::new(),
            parent: Some(self),
        }
    }

    pub fn reserve(&mut self, shape: Tile, layer: usize, nets: &[NetNo], clearance_class: usize) {
        if shape.is_empty() {
            return;
        }
        self.shapes.push(ReservedShape {
            shape,
            layer,
            nets: nets.to_vec(),
            clearance_class,
        });
    }

    pub fn ignore(&mut self, id: ItemId) {
        if !self.ignored.contains(&id) {
            self.ignored.push(id);
        }
    }

    fn links(&self) -> impl Iterator<Item = &Reserved<'a>> {
        std::iter::successors(Some(self), |link| link.parent)
    }

    pub fn is_ignored(&self, id: ItemId) -> bool {
        self.links().any(|link| link.ignored.contains(&id))
    }

    /// First reserved shape of a foreign net on `layer` closer to `shape`
    /// than the clearance between both classes
    pub fn conflict(&self, board: &RoutingBoard, shape: &Tile, layer: usize, nets: &[NetNo], clearance_class: usize) -> Option<&ReservedShape> {
        self.links()
            .flat_map(|link| link.shapes.iter())
            .filter(|reserved| reserved.layer == layer)
            .filter(|reserved| nets.is_empty() || !reserved.nets.iter().any(|n| nets.contains(n)))
            .find(|reserved| {
                let cl = board.clearance_value(clearance_class, reserved.clearance_class, layer) as f64;
                reserved.shape.violates_clearance(shape, cl)
            })
    }

    pub fn depth(&self) -> usize {
        self.links().count()
    }
}
