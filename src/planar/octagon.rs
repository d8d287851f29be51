//! Octagons with horizontal, vertical and 45 degree borders
//!
//! An octagon is the intersection of the slabs lx <= x <= rx,
//! ly <= y <= uy, ulx <= x - y <= lrx and llx <= x + y <= urx. Every corner
//! of a normalized octagon lies on the integer grid, which is what makes the
//! shape the workhorse of the shove geometry.

use super::direction::Direction45;
use super::line::LineInt;
use super::point::{PointFloat, PointInt, VectorInt};
use super::tile_box::TileBox;
use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Octagon {
    pub lx: i64,
    pub ly: i64,
    pub rx: i64,
    pub uy: i64,
    /// lower bound of x - y (the upper left diagonal border)
    pub ulx: i64,
    /// upper bound of x - y (the lower right diagonal border)
    pub lrx: i64,
    /// lower bound of x + y (the lower left diagonal border)
    pub llx: i64,
    /// upper bound of x + y (the upper right diagonal border)
    pub urx: i64,
}

/// Parameter interval of a segment inside an octagon together with the
/// border sides through which the segment enters and leaves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentClip {
    pub t_in: f64,
    pub side_in: Option<usize>,
    pub t_out: f64,
    pub side_out: Option<usize>,
}

/// Diagonal bound offset that keeps an enlarged octagon a superset of the exact offset
pub fn diagonal_offset(offset: i64) -> i64 {
    (offset as f64 * std::f64::consts::SQRT_2).ceil() as i64
}

impl Octagon {
    pub const EMPTY: Octagon = Octagon {
        lx: 1,
        ly: 1,
        rx: 0,
        uy: 0,
        ulx: 1,
        lrx: 0,
        llx: 1,
        urx: 0,
    };

    #[allow(clippy::too_many_arguments)]
    pub fn new(lx: i64, ly: i64, rx: i64, uy: i64, ulx: i64, lrx: i64, llx: i64, urx: i64) -> Self {
        Octagon { lx, ly, rx, uy, ulx, lrx, llx, urx }.normalize()
    }

    pub fn point(p: PointInt) -> Self {
        Octagon {
            lx: p.x,
            ly: p.y,
            rx: p.x,
            uy: p.y,
            ulx: p.x - p.y,
            lrx: p.x - p.y,
            llx: p.x + p.y,
            urx: p.x + p.y,
        }
    }

    /// Regular octagon around `center` circumscribing the circle of `radius`
    pub fn regular(center: PointInt, radius: i64) -> Self {
        Self::point(center).enlarge(radius)
    }

    /// Smallest octagon containing all points
    pub fn bounding(points: &[PointInt]) -> Self {
        let mut iter = points.iter();
        let first = match iter.next() {
            Some(p) => Self::point(*p),
            None => return Self::EMPTY,
        };
        iter.fold(first, |acc, p| acc.union(&Self::point(*p)))
    }

    pub fn from_box(b: &TileBox) -> Self {
        if b.is_empty() {
            return Self::EMPTY;
        }
        Octagon {
            lx: b.ll.x,
            ly: b.ll.y,
            rx: b.ur.x,
            uy: b.ur.y,
            ulx: b.ll.x - b.ur.y,
            lrx: b.ur.x - b.ll.y,
            llx: b.ll.x + b.ll.y,
            urx: b.ur.x + b.ur.y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lx > self.rx || self.ly > self.uy || self.ulx > self.lrx || self.llx > self.urx
    }

    /// Tightens redundant bounds so that every border touches the shape
    pub fn normalize(&self) -> Octagon {
        if self.is_empty() {
            return Self::EMPTY;
        }
        let lx = self.lx.max(self.ulx + self.ly).max(self.llx - self.uy);
        let rx = self.rx.min(self.lrx + self.uy).min(self.urx - self.ly);
        let ly = self.ly.max(self.lx - self.lrx).max(self.llx - self.rx);
        let uy = self.uy.min(self.rx - self.ulx).min(self.urx - self.lx);
        let result = Octagon {
            lx,
            ly,
            rx,
            uy,
            ulx: self.ulx.max(lx - uy),
            lrx: self.lrx.min(rx - ly),
            llx: self.llx.max(lx + ly),
            urx: self.urx.min(rx + uy),
        };
        if result.is_empty() {
            Self::EMPTY
        } else {
            result
        }
    }

    /// True when the diagonal borders do not cut any corner
    pub fn is_box(&self) -> bool {
        *self == Self::from_box(&self.bounding_box())
    }

    pub fn bounding_box(&self) -> TileBox {
        if self.is_empty() {
            return TileBox::EMPTY;
        }
        TileBox::new(self.lx, self.ly, self.rx, self.uy)
    }

    pub fn enlarge(&self, offset: i64) -> Octagon {
        if self.is_empty() || offset == 0 {
            return *self;
        }
        let diag = diagonal_offset(offset);
        Octagon {
            lx: self.lx - offset,
            ly: self.ly - offset,
            rx: self.rx + offset,
            uy: self.uy + offset,
            ulx: self.ulx - diag,
            lrx: self.lrx + diag,
            llx: self.llx - diag,
            urx: self.urx + diag,
        }
        .normalize()
    }

    pub fn translate_by(&self, v: VectorInt) -> Octagon {
        if self.is_empty() {
            return *self;
        }
        Octagon {
            lx: self.lx + v.x,
            ly: self.ly + v.y,
            rx: self.rx + v.x,
            uy: self.uy + v.y,
            ulx: self.ulx + v.x - v.y,
            lrx: self.lrx + v.x - v.y,
            llx: self.llx + v.x + v.y,
            urx: self.urx + v.x + v.y,
        }
    }

    pub fn union(&self, other: &Octagon) -> Octagon {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Octagon {
            lx: self.lx.min(other.lx),
            ly: self.ly.min(other.ly),
            rx: self.rx.max(other.rx),
            uy: self.uy.max(other.uy),
            ulx: self.ulx.min(other.ulx),
            lrx: self.lrx.max(other.lrx),
            llx: self.llx.min(other.llx),
            urx: self.urx.max(other.urx),
        }
    }

    pub fn intersection(&self, other: &Octagon) -> Octagon {
        Octagon {
            lx: self.lx.max(other.lx),
            ly: self.ly.max(other.ly),
            rx: self.rx.min(other.rx),
            uy: self.uy.min(other.uy),
            ulx: self.ulx.max(other.ulx),
            lrx: self.lrx.min(other.lrx),
            llx: self.llx.max(other.llx),
            urx: self.urx.min(other.urx),
        }
        .normalize()
    }

    /// The eight corners in side order; corner `i` starts border side `i`.
    /// Neighbouring corners coincide where a border has zero length.
    pub fn corners_raw(&self) -> [PointInt; 8] {
        [
            PointInt::new(self.llx - self.ly, self.ly),
            PointInt::new(self.lrx + self.ly, self.ly),
            PointInt::new(self.rx, self.rx - self.lrx),
            PointInt::new(self.rx, self.urx - self.rx),
            PointInt::new(self.urx - self.uy, self.uy),
            PointInt::new(self.ulx + self.uy, self.uy),
            PointInt::new(self.lx, self.lx - self.ulx),
            PointInt::new(self.lx, self.llx - self.lx),
        ]
    }

    /// Distinct corners, counterclockwise
    pub fn corners(&self) -> Vec<PointInt> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut result: Vec<PointInt> = self.corners_raw().to_vec();
        result.dedup();
        while result.len() > 1 && result.first() == result.last() {
            result.pop();
        }
        result
    }

    pub fn center(&self) -> PointFloat {
        self.bounding_box().center()
    }

    /// Constraint `a*x + b*y <= c` of border side `side_no`
    pub fn side_constraint(&self, side_no: usize) -> (i64, i64, i64) {
        match side_no % 8 {
            0 => (0, -1, -self.ly),
            1 => (1, -1, self.lrx),
            2 => (1, 0, self.rx),
            3 => (1, 1, self.urx),
            4 => (0, 1, self.uy),
            5 => (-1, 1, -self.ulx),
            6 => (-1, 0, -self.lx),
            _ => (-1, -1, -self.llx),
        }
    }

    /// Border line of a side, directed counterclockwise
    pub fn border_line(&self, side_no: usize) -> LineInt {
        let start = self.corners_raw()[side_no % 8];
        let along = Direction45::side_normal(side_no).turn_45_degree(2).vector();
        LineInt::new(start, start.translate_by(along))
    }

    pub fn contains(&self, p: PointFloat) -> bool {
        !self.is_empty() && (0..8).all(|side| self.slack(side, p) >= -EPSILON)
    }

    /// Strictly inside, not on the border
    pub fn contains_inner(&self, p: PointFloat) -> bool {
        !self.is_empty() && (0..8).all(|side| self.slack(side, p) > EPSILON)
    }

    fn slack(&self, side_no: usize, p: PointFloat) -> f64 {
        let (a, b, c) = self.side_constraint(side_no);
        c as f64 - (a as f64 * p.x + b as f64 * p.y)
    }

    /// Liang-Barsky clipping of the segment `a`-`b` against the closed octagon
    pub fn clip_segment(&self, a: PointFloat, b: PointFloat) -> Option<SegmentClip> {
        if self.is_empty() {
            return None;
        }
        let mut clip = SegmentClip {
            t_in: 0.0,
            side_in: None,
            t_out: 1.0,
            side_out: None,
        };
        for side in 0..8 {
            let (na, nb, c) = self.side_constraint(side);
            let q = c as f64 - (na as f64 * a.x + nb as f64 * a.y);
            let p = na as f64 * (b.x - a.x) + nb as f64 * (b.y - a.y);
            if p.abs() < EPSILON {
                if q < -EPSILON {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                if t > clip.t_in {
                    clip.t_in = t;
                    clip.side_in = Some(side);
                }
            } else if t < clip.t_out {
                clip.t_out = t;
                clip.side_out = Some(side);
            }
        }
        if clip.t_in > clip.t_out + EPSILON {
            return None;
        }
        Some(clip)
    }

    fn edge_lengths(&self) -> [f64; 8] {
        let corners = self.corners_raw();
        let mut lengths = [0.0; 8];
        for (i, length) in lengths.iter_mut().enumerate() {
            *length = corners[i].distance(corners[(i + 1) % 8]);
        }
        lengths
    }

    pub fn perimeter(&self) -> f64 {
        self.edge_lengths().iter().sum()
    }

    /// Arc length from corner 0 counterclockwise to `p`, which lies on border `side_no`
    pub fn boundary_position(&self, p: PointInt, side_no: usize) -> f64 {
        let side_no = side_no % 8;
        let lengths = self.edge_lengths();
        let before: f64 = lengths[..side_no].iter().sum();
        before + self.corners_raw()[side_no].distance(p)
    }

    /// Snaps a float point lying on border `side_no` to a grid point on that
    /// border, clamped between the border's end corners.
    pub fn snap_to_side(&self, p: PointFloat, side_no: usize) -> PointInt {
        let side_no = side_no % 8;
        let corners = self.corners_raw();
        let start = corners[side_no];
        let end = corners[(side_no + 1) % 8];
        let clamp_x = |x: i64| x.clamp(start.x.min(end.x), start.x.max(end.x));
        let clamp_y = |y: i64| y.clamp(start.y.min(end.y), start.y.max(end.y));
        match side_no {
            0 => PointInt::new(clamp_x(p.x.round() as i64), self.ly),
            4 => PointInt::new(clamp_x(p.x.round() as i64), self.uy),
            2 => PointInt::new(self.rx, clamp_y(p.y.round() as i64)),
            6 => PointInt::new(self.lx, clamp_y(p.y.round() as i64)),
            1 => {
                let x = clamp_x(p.x.round() as i64);
                PointInt::new(x, x - self.lrx)
            }
            5 => {
                let x = clamp_x(p.x.round() as i64);
                PointInt::new(x, x - self.ulx)
            }
            3 => {
                let x = clamp_x(p.x.round() as i64);
                PointInt::new(x, self.urx - x)
            }
            _ => {
                let x = clamp_x(p.x.round() as i64);
                PointInt::new(x, self.llx - x)
            }
        }
    }
}
