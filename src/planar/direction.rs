//! The eight octagon directions
//!
//! Directions are numbered counterclockwise starting at +x. Octagon border
//! sides use their own numbering (0 = lower side, counterclockwise); a side's
//! outward normal is the direction `(side + 6) % 8`.

use super::point::{PointFloat, VectorInt};
use serde::{Deserialize, Serialize};

/// A direction snapped to a multiple of 45 degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Direction45(u8);

impl Direction45 {
    pub const RIGHT: Direction45 = Direction45(0);
    pub const UP: Direction45 = Direction45(2);
    pub const LEFT: Direction45 = Direction45(4);
    pub const DOWN: Direction45 = Direction45(6);

    pub fn from_index(index: usize) -> Self {
        Direction45((index % 8) as u8)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Snap an arbitrary vector to the nearest of the eight directions.
    /// Returns `None` for the zero vector.
    pub fn from_vector(v: VectorInt) -> Option<Self> {
        Self::from_float(v.x as f64, v.y as f64)
    }

    pub fn from_float(dx: f64, dy: f64) -> Option<Self> {
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        let angle = dy.atan2(dx).to_degrees();
        let index = (angle / 45.0).round().rem_euclid(8.0) as usize;
        Some(Self::from_index(index))
    }

    /// Unit grid step in this direction (diagonals have length sqrt 2)
    pub fn vector(&self) -> VectorInt {
        match self.0 {
            0 => VectorInt::new(1, 0),
            1 => VectorInt::new(1, 1),
            2 => VectorInt::new(0, 1),
            3 => VectorInt::new(-1, 1),
            4 => VectorInt::new(-1, 0),
            5 => VectorInt::new(-1, -1),
            6 => VectorInt::new(0, -1),
            _ => VectorInt::new(1, -1),
        }
    }

    /// Normalized float vector
    pub fn unit(&self) -> PointFloat {
        let v = self.vector();
        let len = v.length();
        PointFloat::new(v.x as f64 / len, v.y as f64 / len)
    }

    pub fn is_diagonal(&self) -> bool {
        self.0 % 2 == 1
    }

    pub fn turn_45_degree(&self, factor: i32) -> Direction45 {
        Self::from_index((self.0 as i32 + factor).rem_euclid(8) as usize)
    }

    pub fn opposite(&self) -> Direction45 {
        self.turn_45_degree(4)
    }

    /// Outward normal of an octagon border side
    pub fn side_normal(side_no: usize) -> Direction45 {
        Self::from_index(side_no % 8 + 6)
    }

    /// Octagon border side whose outward normal is this direction
    pub fn as_side_no(&self) -> usize {
        (self.0 as usize + 2) % 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapping() {
        assert_eq!(Direction45::from_vector(VectorInt::new(10, 1)), Some(Direction45::RIGHT));
        assert_eq!(Direction45::from_vector(VectorInt::new(7, 8)).map(|d| d.index()), Some(1));
        assert_eq!(Direction45::from_vector(VectorInt::new(0, -3)), Some(Direction45::DOWN));
        assert_eq!(Direction45::from_vector(VectorInt::ZERO), None);
    }

    #[test]
    fn test_side_normals_round_trip() {
        for side in 0..8 {
            assert_eq!(Direction45::side_normal(side).as_side_no(), side);
        }
        assert_eq!(Direction45::side_normal(0), Direction45::DOWN);
        assert_eq!(Direction45::side_normal(2), Direction45::RIGHT);
        assert_eq!(Direction45::side_normal(4), Direction45::UP);
    }
}
