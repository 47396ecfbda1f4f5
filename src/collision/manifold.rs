//! Contact manifold extraction: the one or two world-space points shared
//! by a colliding pair, found after position correction.

use crate::math::vec2::{closest_point_on_segment, Vec2};
use crate::objects::body::Body;
use crate::shapes::Shape;

/// Squared-distance tolerance for treating two candidate projections as
/// equally close, and for treating two contact points as the same point.
const CONTACT_TOLERANCE: f64 = 1e-6;

/// One or two contact points in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactManifold {
    pub points: [Vec2; 2],
    pub count: usize,
}

impl ContactManifold {
    pub fn one(point: Vec2) -> Self {
        ContactManifold {
            points: [point, Vec2::ZERO],
            count: 1,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.points.iter().copied().take(self.count)
    }
}

/// Builds the contact manifold for an intersecting pair. Transform caches
/// of both bodies must be fresh.
pub fn find_contact_points(body_a: &Body, body_b: &Body) -> ContactManifold {
    match (body_a.shape(), body_b.shape()) {
        (Shape::Circle(ca), Shape::Circle(_)) => {
            circle_circle_contact(body_a.position(), ca.radius, body_b.position())
        }
        (sa, sb) if sa.is_polygonal() && sb.is_polygonal() => {
            polygon_polygon_contacts(body_a.transformed_vertices(), body_b.transformed_vertices())
        }
        (sa, Shape::Circle(_)) if sa.is_polygonal() => {
            polygon_circle_contact(body_a.transformed_vertices(), body_b.position())
        }
        (Shape::Circle(_), sb) if sb.is_polygonal() => {
            polygon_circle_contact(body_b.transformed_vertices(), body_a.position())
        }
        _ => ContactManifold::default(),
    }
}

/// Single contact on the first circle's surface along the center line.
fn circle_circle_contact(c1: Vec2, r1: f64, c2: Vec2) -> ContactManifold {
    ContactManifold::one(c1 + (c2 - c1).normalize() * r1)
}

/// Single contact at the closest point on any polygon edge to the circle
/// center.
fn polygon_circle_contact(verts: &[Vec2], circle_center: Vec2) -> ContactManifold {
    let mut best = circle_center;
    let mut best_dist_sq = f64::INFINITY;

    for i in 0..verts.len() {
        let va = verts[i];
        let vb = verts[(i + 1) % verts.len()];
        let (point, dist_sq) = closest_point_on_segment(circle_center, va, vb);
        if dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            best = point;
        }
    }

    ContactManifold::one(best)
}

/// Sweeps every vertex of each polygon against every edge of the other,
/// keeping the closest projection as contact #1. A projection equally
/// close (within tolerance) that lands on a distinct point becomes
/// contact #2, which captures edge-on-edge resting contact.
fn polygon_polygon_contacts(verts_a: &[Vec2], verts_b: &[Vec2]) -> ContactManifold {
    let mut manifold = ContactManifold::default();
    let mut min_dist_sq = f64::INFINITY;

    let mut sweep = |points: &[Vec2], edges: &[Vec2]| {
        for &p in points {
            for i in 0..edges.len() {
                let va = edges[i];
                let vb = edges[(i + 1) % edges.len()];
                let (candidate, dist_sq) = closest_point_on_segment(p, va, vb);

                if (dist_sq - min_dist_sq).abs() < CONTACT_TOLERANCE {
                    if candidate.distance_squared(manifold.points[0]) > CONTACT_TOLERANCE {
                        manifold.points[1] = candidate;
                        manifold.count = 2;
                    }
                } else if dist_sq < min_dist_sq {
                    min_dist_sq = dist_sq;
                    manifold.points[0] = candidate;
                    manifold.count = 1;
                }
            }
        }
    };

    sweep(verts_a, verts_b);
    sweep(verts_b, verts_a);
    manifold
}
