//! Approach side of a trace towards a pad and the front-of-pad test

use crate::board::{RoutingBoard, NO_CLEARANCE};
use crate::planar::{Direction45, Octagon, PointFloat, PointInt, Polyline, Tile, VectorInt};
use serde::Serialize;

/// Border side (octagon numbering, 0 = lower, counterclockwise) from which a
/// trace approaches a shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FromSide {
    pub side_no: Option<usize>,
    pub border_intersection: Option<PointFloat>,
}

impl FromSide {
    pub const NOT_CALCULATED: FromSide = FromSide {
        side_no: None,
        border_intersection: None,
    };

    pub fn new(side_no: usize, border_intersection: Option<PointFloat>) -> Self {
        Self {
            side_no: Some(side_no % 8),
            border_intersection,
        }
    }

    pub fn is_calculated(&self) -> bool {
        self.side_no.is_some()
    }
}

/// Finds a side of `shape` so that a thin probe from `center` to that side of
/// the shape enlarged by `offset` is clear. Falls back to a probe without
/// clearance before giving up.
pub fn calc_from_side(
    board: &RoutingBoard,
    shape: &Tile,
    center: PointInt,
    layer: usize,
    offset: i64,
    clearance_class: usize,
) -> FromSide {
    let offset_shape = shape.enlarge(offset);
    let border = offset_shape.bounding_octagon();
    let sides = offset_shape.border_sides();
    for class in [clearance_class, NO_CLEARANCE] {
        for side_no in sides.iter() {
            let probe = probe_for_side(&border, center, *side_no);
            if board.check_trace_shape(&probe, layer, &[], class) {
                return FromSide::new(*side_no, None);
            }
        }
    }
    tracing::debug!(%center, layer, "from side not calculable");
    FromSide::NOT_CALCULATED
}

/// Segment of half width 1 from `center` along the side normal up to the
/// border, stepping on the 45 degree grid so the probe keeps its direction
fn probe_for_side(border: &Octagon, center: PointInt, side_no: usize) -> Tile {
    let (a, b, c) = border.side_constraint(side_no);
    let normal = VectorInt::new(a, b);
    let denominator = (a * a + b * b) as f64;
    let steps = ((c - (a * center.x + b * center.y)) as f64 / denominator).ceil().max(0.0) as i64;
    let target = center.translate_by(VectorInt::new(normal.x * steps, normal.y * steps));
    Tile::segment(center, target, 1, false)
}

/// True if the line `a`-`b` lies in front of `pad` seen from `from_side`,
/// keeping `half_width` distance. Only box and octagon pads are classified;
/// any other shape or an unknown side counts as in front.
pub fn in_front_of_pad(line: (PointInt, PointInt), pad: &Tile, from_side: Option<usize>, half_width: i64, with_sides: bool) -> bool {
    let oct = match pad {
        Tile::Box(b) => Octagon::from_box(b),
        Tile::Octagon(o) => *o,
        Tile::Simplex(_) => return true,
    };
    let Some(side_no) = from_side else {
        return true;
    };
    let (a, b) = line;
    let w = half_width as f64;
    let diag = w * std::f64::consts::SQRT_2;

    let min_x = a.x.min(b.x) as f64;
    let max_x = a.x.max(b.x) as f64;
    let min_y = a.y.min(b.y) as f64;
    let max_y = a.y.max(b.y) as f64;
    let min_diff = (a.x - a.y).min(b.x - b.y) as f64;
    let max_diff = (a.x - a.y).max(b.x - b.y) as f64;
    let min_sum = (a.x + a.y).min(b.x + b.y) as f64;
    let max_sum = (a.x + a.y).max(b.x + b.y) as f64;

    let lx = oct.lx as f64;
    let ly = oct.ly as f64;
    let rx = oct.rx as f64;
    let uy = oct.uy as f64;
    let ulx = oct.ulx as f64;
    let lrx = oct.lrx as f64;
    let llx = oct.llx as f64;
    let urx = oct.urx as f64;

    let (front, sides) = match side_no {
        0 => (
            min_y >= uy + w || max_diff <= ulx - diag || min_sum >= urx + diag,
            max_x <= lx - w && min_diff <= ulx - diag || min_x >= rx + w && min_sum >= urx + diag,
        ),
        1 => (
            min_y >= uy + w || max_diff <= ulx - diag || max_x <= lx - w,
            min_x <= lx - w && max_sum <= llx - diag || max_y >= uy + w && min_sum >= urx + diag,
        ),
        2 => (
            max_x <= lx - w || max_diff <= ulx - diag || max_sum <= llx - diag,
            max_y <= ly - w && min_sum <= llx - diag || min_y >= uy + w && min_diff <= ulx - diag,
        ),
        3 => (
            max_x <= lx - w || max_y <= ly - w || max_sum <= llx - diag,
            min_y <= ly - w && min_diff >= lrx + diag || min_x <= lx - w && max_diff <= ulx - diag,
        ),
        4 => (
            max_y <= ly - w || max_sum <= llx - diag || min_diff >= lrx + diag,
            min_x >= rx + w && max_diff >= lrx + diag || max_x <= lx - w && min_sum <= llx - diag,
        ),
        5 => (
            max_y <= ly - w || min_x >= rx + w || min_diff >= lrx + diag,
            max_x >= rx + w && min_sum >= urx + diag || min_y <= ly - w && max_sum <= llx - diag,
        ),
        6 => (
            min_x >= rx + w || min_sum >= urx + diag || min_diff >= lrx + diag,
            max_y <= ly - w && max_diff >= lrx + diag || min_y >= uy + w && max_sum >= urx + diag,
        ),
        7 => (
            min_y >= uy + w || min_sum >= urx + diag || min_x >= rx + w,
            max_y >= uy + w && max_diff <= ulx - diag || max_x >= rx + w && min_diff >= lrx + diag,
        ),
        _ => {
            tracing::warn!(side_no, "from side out of range");
            return true;
        }
    };
    front || (with_sides && sides)
}

/// Tile of one trace segment together with the side it enters from
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeAndFromSide {
    pub shape: Tile,
    pub from_side: FromSide,
    pub direction: Option<Direction45>,
}

impl ShapeAndFromSide {
    pub fn for_trace_segment(polyline: &Polyline, index: usize, half_width: i64, orthogonal: bool) -> Option<Self> {
        let (a, b) = polyline.segment(index)?;
        let shape = Tile::segment(a, b, half_width, orthogonal);
        let direction = Direction45::from_vector(b.difference_by(a));
        let from_side = match direction {
            Some(dir) => FromSide::new(dir.opposite().as_side_no(), Some(a.to_float())),
            None => FromSide::NOT_CALCULATED,
        };
        Some(Self {
            shape,
            from_side,
            direction,
        })
    }
}
