//! Axis aligned boxes

use super::point::{PointFloat, PointInt, VectorInt};
use serde::{Deserialize, Serialize};

/// Axis aligned box given by its lower left and upper right corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileBox {
    pub ll: PointInt,
    pub ur: PointInt,
}

impl TileBox {
    pub const EMPTY: TileBox = TileBox {
        ll: PointInt::new(i64::MAX / 4, i64::MAX / 4),
        ur: PointInt::new(i64::MIN / 4, i64::MIN / 4),
    };

    pub fn new(ll_x: i64, ll_y: i64, ur_x: i64, ur_y: i64) -> Self {
        Self {
            ll: PointInt::new(ll_x, ll_y),
            ur: PointInt::new(ur_x, ur_y),
        }
    }

    /// Box of the given extent centered at `center`
    pub fn centered(center: PointInt, width: i64, height: i64) -> Self {
        Self::new(
            center.x - width / 2,
            center.y - height / 2,
            center.x + width - width / 2,
            center.y + height - height / 2,
        )
    }

    pub fn bounding(points: &[PointInt]) -> Self {
        points.iter().fold(Self::EMPTY, |acc, p| acc.union_point(*p))
    }

    pub fn is_empty(&self) -> bool {
        self.ll.x > self.ur.x || self.ll.y > self.ur.y
    }

    pub fn width(&self) -> i64 {
        self.ur.x - self.ll.x
    }

    pub fn height(&self) -> i64 {
        self.ur.y - self.ll.y
    }

    pub fn union_point(&self, p: PointInt) -> TileBox {
        TileBox::new(
            self.ll.x.min(p.x),
            self.ll.y.min(p.y),
            self.ur.x.max(p.x),
            self.ur.y.max(p.y),
        )
    }

    pub fn union(&self, other: &TileBox) -> TileBox {
        if other.is_empty() {
            return *self;
        }
        self.union_point(other.ll).union_point(other.ur)
    }

    pub fn enlarge(&self, offset: i64) -> TileBox {
        if self.is_empty() {
            return *self;
        }
        TileBox::new(
            self.ll.x - offset,
            self.ll.y - offset,
            self.ur.x + offset,
            self.ur.y + offset,
        )
    }

    pub fn translate_by(&self, v: VectorInt) -> TileBox {
        TileBox {
            ll: self.ll.translate_by(v),
            ur: self.ur.translate_by(v),
        }
    }

    pub fn contains(&self, p: PointFloat) -> bool {
        p.x >= self.ll.x as f64 && p.x <= self.ur.x as f64 && p.y >= self.ll.y as f64 && p.y <= self.ur.y as f64
    }

    pub fn contains_box(&self, other: &TileBox) -> bool {
        other.ll.x >= self.ll.x && other.ll.y >= self.ll.y && other.ur.x <= self.ur.x && other.ur.y <= self.ur.y
    }

    pub fn intersects(&self, other: &TileBox) -> bool {
        self.ll.x <= other.ur.x && other.ll.x <= self.ur.x && self.ll.y <= other.ur.y && other.ll.y <= self.ur.y
    }

    /// Counterclockwise starting at the lower left corner
    pub fn corners(&self) -> Vec<PointInt> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut result = vec![
            self.ll,
            PointInt::new(self.ur.x, self.ll.y),
            self.ur,
            PointInt::new(self.ll.x, self.ur.y),
        ];
        result.dedup();
        if result.len() > 1 && result.first() == result.last() {
            result.pop();
        }
        result
    }

    pub fn center(&self) -> PointFloat {
        PointFloat::new(
            (self.ll.x as f64 + self.ur.x as f64) / 2.0,
            (self.ll.y as f64 + self.ur.y as f64) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_and_contains() {
        let b = TileBox::bounding(&[PointInt::new(3, 9), PointInt::new(-2, 4), PointInt::new(7, 5)]);
        assert_eq!(b, TileBox::new(-2, 4, 7, 9));
        assert!(b.contains_box(&TileBox::new(0, 5, 7, 9)));
        assert!(!b.contains_box(&TileBox::new(0, 5, 8, 9)));
        assert!(TileBox::EMPTY.is_empty());
    }

    #[test]
    fn test_centered_square() {
        let b = TileBox::centered(PointInt::new(500, 500), 40, 40);
        assert_eq!(b, TileBox::new(480, 480, 520, 520));
        assert_eq!(b.corners().len(), 4);
    }
}
