// Defines an Axis-Aligned Bounding Box

use crate::math::vec2::Vec2;

/// An Axis-Aligned Bounding Box defined by its minimum and maximum corner points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Creates a new AABB, normalizing so min coordinates are <= max.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Aabb {
            min: Vec2::new(min.x.min(max.x), min.y.min(max.y)),
            max: Vec2::new(min.x.max(max.x), min.y.max(max.y)),
        }
    }

    /// A point-sized box, used for bodies without a shape.
    pub fn point(p: Vec2) -> Self {
        Aabb { min: p, max: p }
    }

    /// Creates an AABB that encompasses a set of points.
    /// Returns None for an empty slice.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let first = *points.first()?;
        let mut min_pt = first;
        let mut max_pt = first;
        for point in points.iter().skip(1) {
            min_pt.x = min_pt.x.min(point.x);
            min_pt.y = min_pt.y.min(point.y);
            max_pt.x = max_pt.x.max(point.x);
            max_pt.y = max_pt.y.max(point.y);
        }
        Some(Aabb {
            min: min_pt,
            max: max_pt,
        })
    }

    /// Checks if this AABB overlaps with another. Boxes that merely touch
    /// along an edge do not count as overlapping.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x <= other.min.x
            || other.max.x <= self.min.x
            || self.max.y <= other.min.y
            || other.max.y <= self.min.y)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}
