//! Board outline split into convex pieces
//!
//! The outline polygon may be concave. A shape is on the board when its
//! corners lie in the earcut triangles of the polygon and no outline or
//! hole edge passes through its interior.

use super::line::LineInt;
use super::point::{PointFloat, PointInt};
use super::tile::{Simplex, Tile};
use super::tile_box::TileBox;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardOutline {
    corners: Vec<PointInt>,
    holes: Vec<Vec<PointInt>>,
    bounding_box: TileBox,
    /// Convex pieces; empty when triangulation failed
    convex_pieces: Vec<Tile>,
}

impl BoardOutline {
    pub fn from_box(b: TileBox) -> Self {
        Self {
            corners: b.corners(),
            holes: Vec::new(),
            bounding_box: b,
            convex_pieces: vec![Tile::Box(b)],
        }
    }

    /// Outline from a simple polygon with optional holes
    pub fn from_polygon(corners: Vec<PointInt>, holes: &[Vec<PointInt>]) -> Self {
        let bounding_box = TileBox::bounding(&corners);

        // Build flat coordinate array for earcut
        let mut vertices: Vec<PointInt> = corners.clone();
        let mut hole_indices: Vec<usize> = Vec::new();
        let mut kept_holes: Vec<Vec<PointInt>> = Vec::new();
        for hole in holes {
            if hole.len() < 3 {
                continue; // Skip degenerate holes
            }
            hole_indices.push(vertices.len());
            vertices.extend(hole.iter().copied());
            kept_holes.push(hole.clone());
        }
        let flat_coords: Vec<f64> = vertices
            .iter()
            .flat_map(|p| [p.x as f64, p.y as f64])
            .collect();

        let indices = earcutr::earcut(&flat_coords, &hole_indices, 2).unwrap_or_default();
        let convex_pieces: Vec<Tile> = indices
            .chunks_exact(3)
            .filter_map(|tri| {
                let points: Vec<PointInt> = tri.iter().filter_map(|i| vertices.get(*i).copied()).collect();
                let simplex = Simplex::convex_hull(&points);
                (simplex.corners().len() == 3).then_some(Tile::Simplex(simplex))
            })
            .collect();
        if convex_pieces.is_empty() {
            tracing::warn!(corners = corners.len(), "board outline could not be split into convex pieces");
        }

        Self {
            corners,
            holes: kept_holes,
            bounding_box,
            convex_pieces,
        }
    }

    pub fn corners(&self) -> &[PointInt] {
        &self.corners
    }

    pub fn bounding_box(&self) -> TileBox {
        self.bounding_box
    }

    pub fn convex_pieces(&self) -> &[Tile] {
        &self.convex_pieces
    }

    pub fn contains_point(&self, p: PointFloat) -> bool {
        self.convex_pieces.iter().any(|piece| piece.contains(p))
    }

    pub fn holes(&self) -> &[Vec<PointInt>] {
        &self.holes
    }

    /// Tile lies inside the bounding box, each of its corners inside some
    /// convex piece and no border edge enters its interior. Touching the
    /// border is allowed.
    pub fn contains_shape(&self, tile: &Tile) -> bool {
        if !tile.is_contained_in(&self.bounding_box) {
            return false;
        }
        let tile_corners = tile.corners();
        if !tile_corners.iter().all(|c| self.contains_point(c.to_float())) {
            return false;
        }
        !std::iter::once(&self.corners)
            .chain(self.holes.iter())
            .flat_map(|ring| ring_edges(ring))
            .any(|(a, b)| segment_enters(&tile_corners, a, b))
    }
}

fn ring_edges(ring: &[PointInt]) -> impl Iterator<Item = (PointInt, PointInt)> + '_ {
    ring.iter()
        .enumerate()
        .map(move |(i, a)| (*a, ring[(i + 1) % ring.len()]))
        .filter(|(a, b)| a != b)
}

/// True when the segment `a`-`b` has a piece of positive length strictly
/// inside the convex polygon with counterclockwise `corners`
fn segment_enters(corners: &[PointInt], a: PointInt, b: PointInt) -> bool {
    if corners.len() < 3 {
        return false;
    }
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for (i, c) in corners.iter().enumerate() {
        let edge = LineInt::new(*c, corners[(i + 1) % corners.len()]);
        if edge.is_degenerate() {
            continue;
        }
        let fa = edge.cross(a.to_float());
        let fb = edge.cross(b.to_float());
        if fa <= 0.0 && fb <= 0.0 {
            return false;
        }
        // inside for t where fa + t * (fb - fa) > 0
        if fa < 0.0 {
            lo = lo.max(fa / (fa - fb));
        } else if fb < 0.0 {
            hi = hi.min(fa / (fa - fb));
        }
    }
    hi - lo > 1e-9
}
