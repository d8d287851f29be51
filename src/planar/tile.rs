//! Convex tiles, the shapes every board item is decomposed into
//!
//! A tile is a box, an octagon or a general convex polygon (simplex).
//! Clearance tests between tiles use separating axes for interior overlap
//! and edge-to-edge distances otherwise.

use super::octagon::Octagon;
use super::point::{PointFloat, PointInt, VectorInt};
use super::tile_box::TileBox;
use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-9;

/// A convex polygon with counterclockwise integer corners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simplex {
    corners: Vec<PointInt>,
}

impl Simplex {
    /// Convex hull of the points (Andrew's monotone chain)
    pub fn convex_hull(points: &[PointInt]) -> Simplex {
        let mut sorted: Vec<PointInt> = points.to_vec();
        sorted.sort();
        sorted.dedup();
        if sorted.len() < 3 {
            return Simplex { corners: sorted };
        }
        let turn = |o: PointInt, a: PointInt, b: PointInt| a.difference_by(o).cross(b.difference_by(o));
        let mut hull: Vec<PointInt> = Vec::with_capacity(sorted.len() * 2);
        for p in sorted.iter() {
            while hull.len() >= 2 && turn(hull[hull.len() - 2], hull[hull.len() - 1], *p) <= 0 {
                hull.pop();
            }
            hull.push(*p);
        }
        let lower_len = hull.len() + 1;
        for p in sorted.iter().rev().skip(1) {
            while hull.len() >= lower_len && turn(hull[hull.len() - 2], hull[hull.len() - 1], *p) <= 0 {
                hull.pop();
            }
            hull.push(*p);
        }
        hull.pop();
        Simplex { corners: hull }
    }

    pub fn corners(&self) -> &[PointInt] {
        &self.corners
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Box(TileBox),
    Octagon(Octagon),
    Simplex(Simplex),
}

impl Tile {
    /// Regular octagon around a point, the usual via and round pad shape
    pub fn regular_octagon(center: PointInt, radius: i64) -> Tile {
        Tile::Octagon(Octagon::regular(center, radius))
    }

    /// Area covered by a trace segment from `a` to `b` with the given half width.
    /// In orthogonal mode the result is the enlarged bounding box of the segment.
    pub fn segment(a: PointInt, b: PointInt, half_width: i64, orthogonal: bool) -> Tile {
        if orthogonal {
            return Tile::Box(TileBox::bounding(&[a, b]).enlarge(half_width));
        }
        let delta = b.difference_by(a);
        if delta.is_zero() || delta.is_multiple_of_45_degree() {
            return Tile::Octagon(Octagon::bounding(&[a, b]).enlarge(half_width));
        }
        let mut points = Octagon::regular(a, half_width).corners();
        points.extend(Octagon::regular(b, half_width).corners());
        Tile::Simplex(Simplex::convex_hull(&points))
    }

    pub fn corners(&self) -> Vec<PointInt> {
        match self {
            Tile::Box(b) => b.corners(),
            Tile::Octagon(o) => o.corners(),
            Tile::Simplex(s) => s.corners.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Tile::Box(b) => b.is_empty(),
            Tile::Octagon(o) => o.is_empty(),
            Tile::Simplex(s) => s.corners.is_empty(),
        }
    }

    pub fn is_box(&self) -> bool {
        matches!(self, Tile::Box(_))
    }

    pub fn bounding_box(&self) -> TileBox {
        match self {
            Tile::Box(b) => *b,
            Tile::Octagon(o) => o.bounding_box(),
            Tile::Simplex(s) => TileBox::bounding(&s.corners),
        }
    }

    pub fn bounding_octagon(&self) -> Octagon {
        match self {
            Tile::Box(b) => Octagon::from_box(b),
            Tile::Octagon(o) => *o,
            Tile::Simplex(s) => Octagon::bounding(&s.corners),
        }
    }

    pub fn center(&self) -> PointFloat {
        self.bounding_box().center()
    }

    pub fn translate_by(&self, v: VectorInt) -> Tile {
        match self {
            Tile::Box(b) => Tile::Box(b.translate_by(v)),
            Tile::Octagon(o) => Tile::Octagon(o.translate_by(v)),
            Tile::Simplex(s) => Tile::Simplex(Simplex {
                corners: s.corners.iter().map(|c| c.translate_by(v)).collect(),
            }),
        }
    }

    /// Outward offset; the result always contains the exact offset shape
    pub fn enlarge(&self, offset: i64) -> Tile {
        if offset <= 0 {
            return self.clone();
        }
        match self {
            Tile::Box(b) => Tile::Box(b.enlarge(offset)),
            Tile::Octagon(o) => Tile::Octagon(o.enlarge(offset)),
            Tile::Simplex(s) => {
                let points: Vec<PointInt> = s
                    .corners
                    .iter()
                    .flat_map(|c| Octagon::regular(*c, offset).corners())
                    .collect();
                Tile::Simplex(Simplex::convex_hull(&points))
            }
        }
    }

    /// Octagon-numbered border sides the tile actually has
    pub fn border_sides(&self) -> Vec<usize> {
        match self {
            Tile::Box(_) => vec![0, 2, 4, 6],
            _ => {
                let oct = self.bounding_octagon();
                let corners = oct.corners_raw();
                (0..8).filter(|i| corners[*i] != corners[(*i + 1) % 8]).collect()
            }
        }
    }

    pub fn contains(&self, p: PointFloat) -> bool {
        match self {
            Tile::Box(b) => b.contains(p),
            Tile::Octagon(o) => o.contains(p),
            Tile::Simplex(_) => polygon_contains(&self.corners(), p, -EPSILON),
        }
    }

    /// Strictly inside the tile
    pub fn contains_inner(&self, p: PointFloat) -> bool {
        match self {
            Tile::Octagon(o) => o.contains_inner(p),
            _ => polygon_contains(&self.corners(), p, EPSILON),
        }
    }

    pub fn is_contained_in(&self, b: &TileBox) -> bool {
        !self.is_empty() && b.contains_box(&self.bounding_box())
    }

    /// True when the open interiors of both tiles intersect
    pub fn interiors_overlap(&self, other: &Tile) -> bool {
        let a = self.corners();
        let b = other.corners();
        if a.len() < 3 || b.len() < 3 {
            return false;
        }
        if !self.bounding_box().intersects(&other.bounding_box()) {
            return false;
        }
        !has_separating_axis(&a, &b) && !has_separating_axis(&b, &a)
    }

    /// Euclidean distance between the tiles, 0 when they touch or overlap
    pub fn distance(&self, other: &Tile) -> f64 {
        if self.interiors_overlap(other) {
            return 0.0;
        }
        let a = self.corners();
        let b = other.corners();
        if a.is_empty() || b.is_empty() {
            return f64::MAX;
        }
        if a.iter().any(|c| other.contains(c.to_float())) || b.iter().any(|c| self.contains(c.to_float())) {
            return 0.0;
        }
        let mut min_dist = f64::MAX;
        for (a1, a2) in edges(&a) {
            for (b1, b2) in edges(&b) {
                min_dist = min_dist.min(segment_distance(a1, a2, b1, b2));
            }
        }
        min_dist
    }

    /// Closer than `clearance` or overlapping
    pub fn violates_clearance(&self, other: &Tile, clearance: f64) -> bool {
        if clearance <= 0.0 {
            return self.interiors_overlap(other);
        }
        let ba = self.bounding_box();
        let bb = other.bounding_box();
        let gap_x = (ba.ll.x.max(bb.ll.x) - ba.ur.x.min(bb.ur.x)).max(0) as f64;
        let gap_y = (ba.ll.y.max(bb.ll.y) - ba.ur.y.min(bb.ur.y)).max(0) as f64;
        if gap_x.hypot(gap_y) >= clearance {
            return false;
        }
        self.distance(other) < clearance - EPSILON
    }
}

fn edges(corners: &[PointInt]) -> Vec<(PointFloat, PointFloat)> {
    if corners.len() == 1 {
        let p = corners[0].to_float();
        return vec![(p, p)];
    }
    if corners.len() == 2 {
        return vec![(corners[0].to_float(), corners[1].to_float())];
    }
    (0..corners.len())
        .map(|i| (corners[i].to_float(), corners[(i + 1) % corners.len()].to_float()))
        .collect()
}

/// Convex containment with a signed tolerance on every edge
fn polygon_contains(corners: &[PointInt], p: PointFloat, min_cross: f64) -> bool {
    match corners.len() {
        0 => false,
        1 | 2 => {
            let a = corners[0].to_float();
            let b = corners[corners.len() - 1].to_float();
            min_cross < 0.0 && point_segment_distance(p, a, b) <= EPSILON
        }
        _ => edges(corners).iter().all(|(a, b)| {
            let len = a.distance(*b);
            let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
            cross / len > min_cross
        }),
    }
}

/// Some edge normal of `a` separates the interiors (touching counts as separated)
fn has_separating_axis(a: &[PointInt], b: &[PointInt]) -> bool {
    for i in 0..a.len() {
        let start = a[i];
        let end = a[(i + 1) % a.len()];
        let edge = end.difference_by(start);
        // outward normal of a counterclockwise edge
        let normal = VectorInt::new(edge.y, -edge.x);
        let project = |p: &PointInt| p.difference_by(start).dot(normal);
        let max_a = a.iter().map(project).max().unwrap_or(0);
        let min_b = b.iter().map(project).min().unwrap_or(0);
        // max_a is 0 for a convex counterclockwise polygon
        if min_b >= max_a {
            return true;
        }
    }
    false
}

/// Minimum distance between two segments, 0 if they cross
pub fn segment_distance(a1: PointFloat, a2: PointFloat, b1: PointFloat, b2: PointFloat) -> f64 {
    if segments_cross(a1, a2, b1, b2) {
        return 0.0;
    }
    point_segment_distance(a1, b1, b2)
        .min(point_segment_distance(a2, b1, b2))
        .min(point_segment_distance(b1, a1, a2))
        .min(point_segment_distance(b2, a1, a2))
}

pub fn point_segment_distance(p: PointFloat, a: PointFloat, b: PointFloat) -> f64 {
    let ab_len2 = a.distance_square(b);
    if ab_len2 < 1e-12 {
        // Degenerate segment
        return p.distance(a);
    }
    let t = (((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / ab_len2).clamp(0.0, 1.0);
    p.distance(a.lerp(b, t))
}

fn segments_cross(a1: PointFloat, a2: PointFloat, b1: PointFloat, b2: PointFloat) -> bool {
    let orient = |o: PointFloat, p: PointFloat, q: PointFloat| (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x);
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)) && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convex_hull_is_counterclockwise() {
        let hull = Simplex::convex_hull(&[
            PointInt::new(0, 0),
            PointInt::new(10, 0),
            PointInt::new(5, 5),
            PointInt::new(10, 10),
            PointInt::new(0, 10),
        ]);
        assert_eq!(
            hull.corners(),
            &[
                PointInt::new(0, 0),
                PointInt::new(10, 0),
                PointInt::new(10, 10),
                PointInt::new(0, 10)
            ]
        );
    }

    #[test]
    fn test_touching_tiles_do_not_overlap() {
        let a = Tile::Box(TileBox::new(0, 0, 10, 10));
        let b = Tile::Box(TileBox::new(10, 0, 20, 10));
        assert!(!a.interiors_overlap(&b));
        assert_eq!(a.distance(&b), 0.0);
        assert!(!a.violates_clearance(&b, 0.0));
        assert!(a.violates_clearance(&b, 1.0));
    }

    #[test]
    fn test_distance_between_separated_tiles() {
        let a = Tile::Box(TileBox::new(0, 0, 10, 10));
        let b = Tile::regular_octagon(PointInt::new(30, 5), 5);
        assert!((a.distance(&b) - 15.0).abs() < 1e-9);
        assert!(!a.violates_clearance(&b, 15.0));
        assert!(a.violates_clearance(&b, 15.5));
    }

    #[test]
    fn test_segment_tiles() {
        let straight = Tile::segment(PointInt::new(0, 0), PointInt::new(100, 0), 5, false);
        assert_eq!(straight.bounding_box(), TileBox::new(-5, -5, 105, 5));
        assert!(matches!(straight, Tile::Octagon(_)));
        let skew = Tile::segment(PointInt::new(0, 0), PointInt::new(100, 30), 5, false);
        assert!(matches!(skew, Tile::Simplex(_)));
        assert!(skew.contains(PointFloat::new(50.0, 15.0)));
        let ortho = Tile::segment(PointInt::new(0, 0), PointInt::new(100, 30), 5, true);
        assert_eq!(ortho, Tile::Box(TileBox::new(-5, -5, 105, 35)));
    }

    #[test]
    fn test_crossing_segment_tiles_overlap() {
        let a = Tile::segment(PointInt::new(0, 0), PointInt::new(100, 0), 5, false);
        let b = Tile::segment(PointInt::new(50, -50), PointInt::new(50, 50), 5, false);
        assert!(a.interiors_overlap(&b));
        assert_eq!(a.distance(&b), 0.0);
    }
}
