//! Trace center lines

use super::octagon::Octagon;
use super::point::{PointInt, VectorInt};
use super::tile::Tile;
use serde::{Deserialize, Serialize};

/// Ordered corners of a trace center line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polyline {
    corners: Vec<PointInt>,
}

impl Polyline {
    pub fn new(corners: Vec<PointInt>) -> Self {
        Self { corners }
    }

    pub fn corners(&self) -> &[PointInt] {
        &self.corners
    }

    pub fn corner_count(&self) -> usize {
        self.corners.len()
    }

    pub fn segment_count(&self) -> usize {
        self.corners.len().saturating_sub(1)
    }

    pub fn first_corner(&self) -> Option<PointInt> {
        self.corners.first().copied()
    }

    pub fn last_corner(&self) -> Option<PointInt> {
        self.corners.last().copied()
    }

    /// A polyline whose ends coincide covers no length
    pub fn is_degenerate(&self) -> bool {
        self.corners.len() < 2 || self.corners.iter().all(|c| *c == self.corners[0])
    }

    pub fn segment(&self, index: usize) -> Option<(PointInt, PointInt)> {
        if index + 1 >= self.corners.len() {
            return None;
        }
        Some((self.corners[index], self.corners[index + 1]))
    }

    pub fn segment_tile(&self, index: usize, half_width: i64, orthogonal: bool) -> Option<Tile> {
        self.segment(index)
            .map(|(a, b)| Tile::segment(a, b, half_width, orthogonal))
    }

    pub fn segment_tiles(&self, half_width: i64) -> Vec<Tile> {
        (0..self.segment_count())
            .filter_map(|i| self.segment_tile(i, half_width, false))
            .collect()
    }

    pub fn length(&self) -> f64 {
        self.corners.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    pub fn translate_by(&self, v: VectorInt) -> Polyline {
        Polyline::new(self.corners.iter().map(|c| c.translate_by(v)).collect())
    }

    pub fn reverse(&self) -> Polyline {
        let mut corners = self.corners.clone();
        corners.reverse();
        Polyline::new(corners)
    }

    /// Joins `other` to the end of this polyline; `other` must start at our last corner
    pub fn combine(&self, other: &Polyline) -> Polyline {
        let mut corners = self.corners.clone();
        corners.extend(other.corners.iter().skip(1));
        Polyline::new(corners)
    }

    /// Removes repeated corners and collinear middle corners. With `area`
    /// given, only middle corners inside the area are removed.
    pub fn normalize(&self, area: Option<&Octagon>) -> Polyline {
        let mut corners: Vec<PointInt> = self.corners.clone();
        corners.dedup();
        let mut result: Vec<PointInt> = Vec::with_capacity(corners.len());
        for corner in corners {
            while result.len() >= 2 {
                let prev = result[result.len() - 2];
                let middle = result[result.len() - 1];
                let in_area = area.map_or(true, |a| a.contains(middle.to_float()));
                let d1 = middle.difference_by(prev);
                let d2 = corner.difference_by(middle);
                if in_area && d1.cross(d2) == 0 && d1.dot(d2) > 0 {
                    result.pop();
                } else {
                    break;
                }
            }
            result.push(corner);
        }
        Polyline::new(result)
    }
}
