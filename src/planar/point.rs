//! Integer and float points and vectors
//!
//! Board coordinates are integers; float points only appear as
//! intermediate results (projections, line intersections) and are
//! rounded back onto the grid before they become corners.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point on the integer board grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PointInt {
    pub x: i64,
    pub y: i64,
}

/// A difference of two grid points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VectorInt {
    pub x: i64,
    pub y: i64,
}

/// A point with float coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointFloat {
    pub x: f64,
    pub y: f64,
}

impl PointInt {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Vector pointing from `other` to `self`
    pub fn difference_by(&self, other: PointInt) -> VectorInt {
        VectorInt::new(self.x - other.x, self.y - other.y)
    }

    pub fn translate_by(&self, v: VectorInt) -> PointInt {
        PointInt::new(self.x + v.x, self.y + v.y)
    }

    pub fn to_float(&self) -> PointFloat {
        PointFloat::new(self.x as f64, self.y as f64)
    }

    pub fn distance(&self, other: PointInt) -> f64 {
        self.to_float().distance(other.to_float())
    }
}

impl fmt::Display for PointInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl VectorInt {
    pub const ZERO: VectorInt = VectorInt { x: 0, y: 0 };

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Horizontal or vertical
    pub fn is_orthogonal(&self) -> bool {
        (self.x == 0) != (self.y == 0)
    }

    /// Exactly on a 45 degree diagonal
    pub fn is_diagonal(&self) -> bool {
        self.x != 0 && self.x.abs() == self.y.abs()
    }

    /// Orthogonal or diagonal, the directions the octagon geometry is built on
    pub fn is_multiple_of_45_degree(&self) -> bool {
        self.is_orthogonal() || self.is_diagonal()
    }

    pub fn negate(&self) -> VectorInt {
        VectorInt::new(-self.x, -self.y)
    }

    pub fn add(&self, other: VectorInt) -> VectorInt {
        VectorInt::new(self.x + other.x, self.y + other.y)
    }

    pub fn dot(&self, other: VectorInt) -> i128 {
        self.x as i128 * other.x as i128 + self.y as i128 * other.y as i128
    }

    pub fn cross(&self, other: VectorInt) -> i128 {
        self.x as i128 * other.y as i128 - self.y as i128 * other.x as i128
    }

    pub fn length(&self) -> f64 {
        (self.x as f64).hypot(self.y as f64)
    }
}

impl PointFloat {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn round(&self) -> PointInt {
        PointInt::new(self.x.round() as i64, self.y.round() as i64)
    }

    pub fn distance(&self, other: PointFloat) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn distance_square(&self, other: PointFloat) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Point at parameter `t` on the segment from `self` to `other`
    pub fn lerp(&self, other: PointFloat, t: f64) -> PointFloat {
        PointFloat::new(self.x + t * (other.x - self.x), self.y + t * (other.y - self.y))
    }

    pub fn midpoint(&self, other: PointFloat) -> PointFloat {
        self.lerp(other, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_classification() {
        assert!(VectorInt::new(5, 0).is_orthogonal());
        assert!(VectorInt::new(0, -3).is_orthogonal());
        assert!(VectorInt::new(-4, 4).is_diagonal());
        assert!(!VectorInt::new(3, 4).is_multiple_of_45_degree());
        assert!(!VectorInt::ZERO.is_multiple_of_45_degree());
    }

    #[test]
    fn test_difference_and_translate() {
        let a = PointInt::new(10, 20);
        let b = PointInt::new(4, 25);
        let v = a.difference_by(b);
        assert_eq!(v, VectorInt::new(6, -5));
        assert_eq!(b.translate_by(v), a);
    }
}
