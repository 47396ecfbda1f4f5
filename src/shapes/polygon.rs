use crate::math::vec2::Vec2;

/// A convex polygon defined by its vertices in body-local space,
/// ordered counter-clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Polygon { vertices }
    }

    /// Signed area via the shoelace formula. Positive for counter-clockwise
    /// winding. Fewer than 3 vertices yield 0.
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let mut area = 0.0;
        for i in 0..n {
            let v1 = self.vertices[i];
            let v2 = self.vertices[(i + 1) % n];
            area += v1.cross(v2);
        }
        area / 2.0
    }

    /// Absolute area of the polygon.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Area centroid. Degenerate (zero-area) polygons fall back to the
    /// vertex average.
    pub fn centroid(&self) -> Vec2 {
        let n = self.vertices.len();
        if n < 3 {
            return Vec2::ZERO;
        }

        let signed_area = self.signed_area();
        if signed_area.abs() < 1e-10 {
            let mut avg = Vec2::ZERO;
            for v in &self.vertices {
                avg += *v;
            }
            return avg / (n as f64);
        }

        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let v1 = self.vertices[i];
            let v2 = self.vertices[(i + 1) % n];
            let cross = v1.cross(v2);
            cx += (v1.x + v2.x) * cross;
            cy += (v1.y + v2.y) * cross;
        }
        Vec2::new(cx / (6.0 * signed_area), cy / (6.0 * signed_area))
    }

    /// Second moment of area about the local origin (density 1).
    pub fn inertia_about_origin(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }

        let mut inertia_sum = 0.0;
        for i in 0..n {
            let v1 = self.vertices[i];
            let v2 = self.vertices[(i + 1) % n];
            let cross = v1.cross(v2);
            inertia_sum += cross
                * (v1.x * v1.x
                    + v1.x * v2.x
                    + v2.x * v2.x
                    + v1.y * v1.y
                    + v1.y * v2.y
                    + v2.y * v2.y);
        }
        inertia_sum / 12.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const EPSILON: f64 = 1e-9;

    fn unit_square() -> Polygon {
        Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ])
    }

    #[test]
    fn test_polygon_area_unit_square() {
        assert!((unit_square().area() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_polygon_signed_area_winding() {
        let ccw = unit_square();
        assert!((ccw.signed_area() - 1.0).abs() < EPSILON);

        let cw = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ]);
        assert!((cw.signed_area() - -1.0).abs() < EPSILON);
        assert!((cw.area() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_polygon_area_triangle() {
        let triangle = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
        ]);
        assert!((triangle.area() - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_polygon_area_degenerate() {
        let line = Polygon::new(vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)]);
        assert_eq!(line.area(), 0.0);
    }

    #[test]
    fn test_polygon_centroid_square() {
        let centroid = unit_square().centroid();
        assert!((centroid.x - 0.5).abs() < EPSILON);
        assert!((centroid.y - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_polygon_centroid_offset_triangle() {
        let triangle = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(0.0, 3.0),
        ]);
        let centroid = triangle.centroid();
        assert!((centroid.x - 1.0).abs() < EPSILON);
        assert!((centroid.y - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_polygon_inertia_centered_square() {
        // Unit square centered at the origin: I about the centroid equals
        // I about the origin, m*(w^2+h^2)/12 with density 1 -> 1/6.
        let square = Polygon::new(vec![
            Vec2::new(-0.5, -0.5),
            Vec2::new(0.5, -0.5),
            Vec2::new(0.5, 0.5),
            Vec2::new(-0.5, 0.5),
        ]);
        assert!((square.inertia_about_origin() - 1.0 / 6.0).abs() < EPSILON);
    }

    #[test]
    fn test_polygon_inertia_parallel_axis_consistency() {
        // Offsetting the square changes the origin inertia by m*d^2.
        let offset = Vec2::new(10.0, -5.0);
        let square = Polygon::new(vec![
            offset + Vec2::new(-0.5, -0.5),
            offset + Vec2::new(0.5, -0.5),
            offset + Vec2::new(0.5, 0.5),
            offset + Vec2::new(-0.5, 0.5),
        ]);
        let mass = square.area();
        let about_centroid = square.inertia_about_origin() - mass * square.centroid().magnitude_squared();
        assert!((about_centroid - 1.0 / 6.0).abs() < EPSILON);
    }
}
