//! Narrowphase intersection tests: circle-circle, and SAT for convex
//! polygons (rectangles included) against polygons and circles.

use crate::math::vec2::Vec2;
use crate::objects::body::Body;
use crate::shapes::Shape;

/// Result of a narrowphase test. The normal always points from the first
/// body toward the second; `depth` is the penetration along it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub normal: Vec2,
    pub depth: f64,
}

/// Dispatches the narrowphase test for a body pair by shape tag.
/// Transform caches of both bodies must be fresh.
pub fn intersect(body_a: &Body, body_b: &Body) -> Option<Intersection> {
    match (body_a.shape(), body_b.shape()) {
        (Shape::Circle(ca), Shape::Circle(cb)) => {
            circle_circle(body_a.position(), ca.radius, body_b.position(), cb.radius)
        }
        (sa, sb) if sa.is_polygonal() && sb.is_polygonal() => polygon_polygon(
            body_a.transformed_vertices(),
            body_a.position(),
            body_b.transformed_vertices(),
            body_b.position(),
        ),
        (sa, Shape::Circle(cb)) if sa.is_polygonal() => polygon_circle(
            body_a.transformed_vertices(),
            body_a.position(),
            body_b.position(),
            cb.radius,
        ),
        (Shape::Circle(ca), sb) if sb.is_polygonal() => {
            // Run with the polygon as the reference shape, then flip the
            // normal back into first-to-second orientation.
            polygon_circle(
                body_b.transformed_vertices(),
                body_b.position(),
                body_a.position(),
                ca.radius,
            )
            .map(|hit| Intersection {
                normal: -hit.normal,
                depth: hit.depth,
            })
        }
        _ => None,
    }
}

/// Circle-circle test. Touching circles do not intersect.
pub fn circle_circle(c1: Vec2, r1: f64, c2: Vec2, r2: f64) -> Option<Intersection> {
    let distance = c1.distance(c2);
    let radii_sum = r1 + r2;
    if distance >= radii_sum {
        return None;
    }

    Some(Intersection {
        normal: (c2 - c1).normalize(),
        depth: radii_sum - distance,
    })
}

/// Projects a vertex list onto an axis, returning the (min, max) interval.
fn project_vertices(vertices: &[Vec2], axis: Vec2) -> (f64, f64) {
    let mut min_proj = f64::INFINITY;
    let mut max_proj = f64::NEG_INFINITY;
    for vertex in vertices {
        let projection = vertex.dot(axis);
        min_proj = min_proj.min(projection);
        max_proj = max_proj.max(projection);
    }
    (min_proj, max_proj)
}

/// Projects a circle onto an axis.
fn project_circle(center: Vec2, radius: f64, axis: Vec2) -> (f64, f64) {
    let center_proj = center.dot(axis);
    (center_proj - radius, center_proj + radius)
}

/// Separating Axis Theorem over both polygons' edge normals. Vertices are
/// world-space; `center_a`/`center_b` are the body positions used to
/// orient the final normal from the first body toward the second.
pub fn polygon_polygon(
    verts_a: &[Vec2],
    center_a: Vec2,
    verts_b: &[Vec2],
    center_b: Vec2,
) -> Option<Intersection> {
    if verts_a.len() < 3 || verts_b.len() < 3 {
        return None;
    }

    let mut depth = f64::INFINITY;
    let mut normal = Vec2::ZERO;

    for vertices in [verts_a, verts_b] {
        for i in 0..vertices.len() {
            let edge = vertices[(i + 1) % vertices.len()] - vertices[i];
            let axis = edge.perpendicular().normalize();

            let (min_a, max_a) = project_vertices(verts_a, axis);
            let (min_b, max_b) = project_vertices(verts_b, axis);
            if max_a <= min_b || max_b <= min_a {
                return None;
            }

            let overlap = max_a.min(max_b) - min_a.max(min_b);
            if overlap < depth {
                depth = overlap;
                normal = axis;
            }
        }
    }

    if (center_b - center_a).dot(normal) < 0.0 {
        normal = -normal;
    }

    Some(Intersection { normal, depth })
}

/// SAT between a polygon and a circle: polygon edge normals plus the axis
/// from the circle center to the closest polygon vertex, which covers the
/// corner region. The returned normal points from the polygon toward the
/// circle.
pub fn polygon_circle(
    verts: &[Vec2],
    polygon_center: Vec2,
    circle_center: Vec2,
    radius: f64,
) -> Option<Intersection> {
    if verts.len() < 3 {
        return None;
    }

    let mut depth = f64::INFINITY;
    let mut normal = Vec2::ZERO;

    for i in 0..verts.len() {
        let edge = verts[(i + 1) % verts.len()] - verts[i];
        let axis = edge.perpendicular().normalize();

        let (min_p, max_p) = project_vertices(verts, axis);
        let (min_c, max_c) = project_circle(circle_center, radius, axis);
        if max_p <= min_c || max_c <= min_p {
            return None;
        }

        let overlap = max_p.min(max_c) - min_p.max(min_c);
        if overlap < depth {
            depth = overlap;
            normal = axis;
        }
    }

    let closest = closest_vertex(verts, circle_center);
    let axis = (closest - circle_center).normalize();

    let (min_p, max_p) = project_vertices(verts, axis);
    let (min_c, max_c) = project_circle(circle_center, radius, axis);
    if max_p <= min_c || max_c <= min_p {
        return None;
    }

    let overlap = max_p.min(max_c) - min_p.max(min_c);
    if overlap < depth {
        depth = overlap;
        normal = axis;
    }

    if (circle_center - polygon_center).dot(normal) < 0.0 {
        normal = -normal;
    }

    Some(Intersection { normal, depth })
}

fn closest_vertex(verts: &[Vec2], point: Vec2) -> Vec2 {
    let mut best = verts[0];
    let mut best_dist_sq = f64::INFINITY;
    for &vertex in verts {
        let dist_sq = vertex.distance_squared(point);
        if dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            best = vertex;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-9;

    fn square(center: Vec2, side: f64) -> Vec<Vec2> {
        let h = side / 2.0;
        vec![
            center + Vec2::new(-h, -h),
            center + Vec2::new(h, -h),
            center + Vec2::new(h, h),
            center + Vec2::new(-h, h),
        ]
    }

    #[test]
    fn test_circle_circle_hit() {
        let hit = circle_circle(Vec2::new(0.0, 0.0), 1.0, Vec2::new(1.5, 0.0), 1.0).unwrap();
        assert!((hit.depth - 0.5).abs() < EPSILON);
        assert!((hit.normal.x - 1.0).abs() < EPSILON);
        assert!(hit.normal.y.abs() < EPSILON);
    }

    #[test]
    fn test_circle_circle_separated_and_touching() {
        assert!(circle_circle(Vec2::new(0.0, 0.0), 1.0, Vec2::new(3.0, 0.0), 1.0).is_none());
        // Exactly touching counts as no intersection.
        assert!(circle_circle(Vec2::new(0.0, 0.0), 1.0, Vec2::new(2.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_circle_circle_concentric_fallback_normal() {
        let hit = circle_circle(Vec2::new(1.0, 1.0), 2.0, Vec2::new(1.0, 1.0), 1.0).unwrap();
        assert!((hit.depth - 3.0).abs() < EPSILON);
        assert_eq!(hit.normal, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_polygon_polygon_overlapping_squares() {
        // Unit square at the origin vs unit square at (0.5, 0.5):
        // depth 0.5, axis-aligned normal pointing toward the second square.
        let a = square(Vec2::ZERO, 1.0);
        let b = square(Vec2::new(0.5, 0.5), 1.0);
        let hit = polygon_polygon(&a, Vec2::ZERO, &b, Vec2::new(0.5, 0.5)).unwrap();

        assert!((hit.depth - 0.5).abs() < EPSILON);
        let axis_aligned = (hit.normal.x.abs() - 1.0).abs() < EPSILON && hit.normal.y.abs() < EPSILON
            || (hit.normal.y.abs() - 1.0).abs() < EPSILON && hit.normal.x.abs() < EPSILON;
        assert!(axis_aligned, "normal: {:?}", hit.normal);
        assert!(hit.normal.dot(Vec2::new(0.5, 0.5)) > 0.0, "normal points 1 -> 2");
    }

    #[test]
    fn test_polygon_polygon_separated() {
        let a = square(Vec2::ZERO, 1.0);
        let b = square(Vec2::new(3.0, 0.0), 1.0);
        assert!(polygon_polygon(&a, Vec2::ZERO, &b, Vec2::new(3.0, 0.0)).is_none());
    }

    #[test]
    fn test_polygon_polygon_touching_edges() {
        let a = square(Vec2::ZERO, 1.0);
        let b = square(Vec2::new(1.0, 0.0), 1.0);
        assert!(polygon_polygon(&a, Vec2::ZERO, &b, Vec2::new(1.0, 0.0)).is_none());
    }

    #[test]
    fn test_polygon_polygon_rotated() {
        let a = square(Vec2::ZERO, 1.0);
        // Diamond (square rotated 45 degrees) overlapping from the right.
        let b = vec![
            Vec2::new(0.6, -0.5),
            Vec2::new(1.1, 0.0),
            Vec2::new(0.6, 0.5),
            Vec2::new(0.1, 0.0),
        ];
        let hit = polygon_polygon(&a, Vec2::ZERO, &b, Vec2::new(0.6, 0.0)).unwrap();
        assert!(hit.depth > 0.0);
        assert!(hit.normal.x > 0.0);
    }

    #[test]
    fn test_polygon_circle_edge_region() {
        let poly = square(Vec2::ZERO, 1.0);
        // Circle overlapping the right edge (x = 0.5).
        let hit = polygon_circle(&poly, Vec2::ZERO, Vec2::new(0.8, 0.0), 0.5).unwrap();
        assert!((hit.depth - 0.2).abs() < EPSILON);
        // Normal points from polygon toward circle.
        assert!((hit.normal.x - 1.0).abs() < EPSILON);
        assert!(hit.normal.y.abs() < EPSILON);
    }

    #[test]
    fn test_polygon_circle_corner_region() {
        let poly = square(Vec2::ZERO, 1.0);
        // Circle overlapping only the top-right corner (0.5, 0.5), sitting
        // on the diagonal so the vertex axis is the separating candidate.
        let direction = Vec2::new(1.0, 1.0).normalize();
        let center = Vec2::new(0.5, 0.5) + direction * 0.4;
        let hit = polygon_circle(&poly, Vec2::ZERO, center, 0.5).unwrap();
        assert!((hit.depth - 0.1).abs() < 1e-6);
        assert!((hit.normal.x - direction.x).abs() < 1e-6);
        assert!((hit.normal.y - direction.y).abs() < 1e-6);
    }

    #[test]
    fn test_polygon_circle_separated() {
        let poly = square(Vec2::ZERO, 1.0);
        assert!(polygon_circle(&poly, Vec2::ZERO, Vec2::new(3.0, 0.0), 0.5).is_none());
        // Corner-region separation: close on edge axes, separated on the
        // vertex axis.
        let direction = Vec2::new(1.0, 1.0).normalize();
        let center = Vec2::new(0.5, 0.5) + direction * 0.6;
        assert!(polygon_circle(&poly, Vec2::ZERO, center, 0.5).is_none());
    }
}
