//! Directed infinite lines through two grid points

use super::point::{PointFloat, PointInt, VectorInt};
use serde::{Deserialize, Serialize};

/// Position of a point relative to a directed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    OnTheLeft,
    OnTheRight,
    Collinear,
}

/// An infinite line through `a` and `b`, directed from `a` to `b`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInt {
    pub a: PointInt,
    pub b: PointInt,
}

impl LineInt {
    pub fn new(a: PointInt, b: PointInt) -> Self {
        Self { a, b }
    }

    pub fn direction(&self) -> VectorInt {
        self.b.difference_by(self.a)
    }

    pub fn is_degenerate(&self) -> bool {
        self.a == self.b
    }

    /// Signed area of (a, b, p); positive when `p` is on the left
    pub fn cross(&self, p: PointFloat) -> f64 {
        let d = self.direction();
        d.x as f64 * (p.y - self.a.y as f64) - d.y as f64 * (p.x - self.a.x as f64)
    }

    pub fn side_of(&self, p: PointFloat) -> Side {
        let c = self.cross(p);
        if c > 0.0 {
            Side::OnTheLeft
        } else if c < 0.0 {
            Side::OnTheRight
        } else {
            Side::Collinear
        }
    }

    /// Perpendicular distance from `p` to the line
    pub fn distance(&self, p: PointFloat) -> f64 {
        let len = self.direction().length();
        if len == 0.0 {
            return p.distance(self.a.to_float());
        }
        self.cross(p).abs() / len
    }

    /// Orthogonal projection of `p` onto the line
    pub fn projection_approx(&self, p: PointFloat) -> PointFloat {
        let d = self.direction();
        let len2 = (d.x as f64).powi(2) + (d.y as f64).powi(2);
        if len2 == 0.0 {
            return self.a.to_float();
        }
        let a = self.a.to_float();
        let t = ((p.x - a.x) * d.x as f64 + (p.y - a.y) * d.y as f64) / len2;
        PointFloat::new(a.x + t * d.x as f64, a.y + t * d.y as f64)
    }

    /// Intersection with the ray starting at `origin` heading along `(dx, dy)`.
    /// `None` when the ray is parallel to the line or points away from it.
    pub fn ray_intersection(&self, origin: PointFloat, dx: f64, dy: f64) -> Option<PointFloat> {
        let d = self.direction();
        // a + s*d == origin + t*ray, crossed with d
        let denom = dx * d.y as f64 - dy * d.x as f64;
        if denom.abs() < 1e-12 {
            return None;
        }
        let t = ((self.a.x as f64 - origin.x) * d.y as f64 - (self.a.y as f64 - origin.y) * d.x as f64) / denom;
        if t < 0.0 {
            return None;
        }
        Some(PointFloat::new(origin.x + t * dx, origin.y + t * dy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_and_projection() {
        let line = LineInt::new(PointInt::new(0, 0), PointInt::new(10, 0));
        assert_eq!(line.side_of(PointFloat::new(3.0, 2.0)), Side::OnTheLeft);
        assert_eq!(line.side_of(PointFloat::new(3.0, -2.0)), Side::OnTheRight);
        let p = line.projection_approx(PointFloat::new(4.0, 7.0));
        assert!((p.x - 4.0).abs() < 1e-9 && p.y.abs() < 1e-9);
        assert!((line.distance(PointFloat::new(4.0, 7.0)) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_ray_intersection() {
        let line = LineInt::new(PointInt::new(0, 10), PointInt::new(10, 10));
        let hit = line.ray_intersection(PointFloat::new(5.0, 0.0), 0.0, 1.0).unwrap();
        assert!((hit.x - 5.0).abs() < 1e-9 && (hit.y - 10.0).abs() < 1e-9);
        assert!(line.ray_intersection(PointFloat::new(5.0, 0.0), 0.0, -1.0).is_none());
        assert!(line.ray_intersection(PointFloat::new(5.0, 0.0), 1.0, 0.0).is_none());
    }
}
