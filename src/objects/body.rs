use crate::collision::aabb::Aabb;
use crate::math::vec2::Vec2;
use crate::shapes::Shape;
use serde::{Deserialize, Serialize};

/// Degrees of freedom a body exposes to the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Infinite mass, never integrated.
    Static,
    /// Finite mass, translational response only.
    Kinematic,
    /// Full translational and rotational response.
    Dynamic,
}

/// A rigid body: pose and motion state plus lazily recomputed derived
/// quantities. Three independent dirty bits guard the derived values;
/// writers invalidate exactly the bits their change affects and readers
/// recompute on demand.
#[derive(Debug, Clone)]
pub struct Body {
    id: u64,
    body_type: BodyType,
    position: Vec2,
    linear_velocity: Vec2,
    rotation: f64,
    angular_velocity: f64,
    material: u32,
    shape: Shape,

    transform_dirty: bool,
    transformed_vertices: Vec<Vec2>,
    transformed_aabb: Aabb,

    mass_dirty: bool,
    mass: f64,
    inv_mass: f64,

    angular_mass_dirty: bool,
    angular_mass: f64,
    inv_angular_mass: f64,
}

const INERTIA_EPSILON: f64 = 1e-10;

impl Body {
    /// Creates a body with no shape, the given material and zero motion.
    pub fn new(id: u64, body_type: BodyType, material: u32) -> Self {
        Body {
            id,
            body_type,
            position: Vec2::ZERO,
            linear_velocity: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            material,
            shape: Shape::None,
            transform_dirty: true,
            transformed_vertices: Vec::new(),
            transformed_aabb: Aabb::point(Vec2::ZERO),
            mass_dirty: true,
            mass: 0.0,
            inv_mass: 0.0,
            angular_mass_dirty: true,
            angular_mass: 0.0,
            inv_angular_mass: 0.0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn is_static(&self) -> bool {
        self.body_type == BodyType::Static
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    pub fn material(&self) -> u32 {
        self.material
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    // --- Writers. Each invalidates only the caches its change affects. ---

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.mark_transform_dirty();
    }

    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
        self.mark_transform_dirty();
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        self.linear_velocity = velocity;
    }

    pub fn set_angular_velocity(&mut self, omega: f64) {
        self.angular_velocity = omega;
    }

    pub fn set_material(&mut self, material: u32) {
        self.material = material;
        self.mark_mass_dirty();
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
        self.mark_transform_dirty();
        self.mark_mass_dirty();
    }

    pub fn mark_transform_dirty(&mut self) {
        self.transform_dirty = true;
    }

    /// Mass depends on shape and density; angular mass depends on mass,
    /// so invalidating mass invalidates angular mass too.
    pub fn mark_mass_dirty(&mut self) {
        self.mass_dirty = true;
        self.angular_mass_dirty = true;
    }

    // --- Derived-value refresh ---

    /// Recomputes world-space vertices and the bounding box if stale.
    pub fn refresh_transform(&mut self) {
        if !self.transform_dirty {
            return;
        }

        match &self.shape {
            Shape::None => {
                self.transformed_vertices.clear();
                self.transformed_aabb = Aabb::point(self.position);
            }
            Shape::Circle(circle) => {
                self.transformed_vertices.clear();
                let r = Vec2::new(circle.radius, circle.radius);
                self.transformed_aabb = Aabb {
                    min: self.position - r,
                    max: self.position + r,
                };
            }
            Shape::Rectangle(rect) => {
                let hw = rect.width / 2.0;
                let hh = rect.height / 2.0;
                // Corner order: top-right, top-left, bottom-left, bottom-right.
                let corners = [
                    Vec2::new(hw, hh),
                    Vec2::new(-hw, hh),
                    Vec2::new(-hw, -hh),
                    Vec2::new(hw, -hh),
                ];
                self.transformed_vertices.clear();
                for corner in corners {
                    self.transformed_vertices
                        .push(self.position + corner.rotate(self.rotation));
                }
                self.transformed_aabb = Aabb::from_points(&self.transformed_vertices)
                    .unwrap_or_else(|| Aabb::point(self.position));
            }
            Shape::Polygon(polygon) => {
                self.transformed_vertices.clear();
                for vertex in &polygon.vertices {
                    self.transformed_vertices
                        .push(self.position + vertex.rotate(self.rotation));
                }
                self.transformed_aabb = Aabb::from_points(&self.transformed_vertices)
                    .unwrap_or_else(|| Aabb::point(self.position));
            }
        }

        self.transform_dirty = false;
    }

    /// Recomputes mass from the shape and the material density if stale.
    pub fn refresh_mass(&mut self, density: f64) {
        if !self.mass_dirty {
            return;
        }

        let mass = if self.is_static() {
            0.0
        } else {
            match &self.shape {
                Shape::None => 0.0,
                Shape::Circle(circle) => circle.area() * density,
                Shape::Rectangle(rect) => rect.area() * density,
                // Degenerate polygons (zero area) quietly yield zero mass.
                Shape::Polygon(polygon) => polygon.area() * density,
            }
        };

        self.mass = mass;
        self.inv_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        self.mass_dirty = false;
    }

    /// Recomputes rotational inertia if stale. Mass must be refreshed
    /// first; this method does so itself.
    pub fn refresh_angular_mass(&mut self, density: f64) {
        self.refresh_mass(density);
        if !self.angular_mass_dirty {
            return;
        }

        let inertia = if self.is_static() {
            0.0
        } else {
            match &self.shape {
                Shape::None => 0.0,
                Shape::Circle(circle) => 0.5 * self.mass * circle.radius * circle.radius,
                Shape::Rectangle(rect) => {
                    self.mass * (rect.width * rect.width + rect.height * rect.height) / 12.0
                }
                Shape::Polygon(polygon) => {
                    if polygon.signed_area().abs() < INERTIA_EPSILON {
                        0.0
                    } else {
                        let origin_inertia = polygon.inertia_about_origin() * density;
                        let centroid = polygon.centroid();
                        let about_centroid =
                            origin_inertia - self.mass * centroid.magnitude_squared();
                        if about_centroid.abs() < INERTIA_EPSILON {
                            0.0
                        } else {
                            // FP noise can push a thin shape slightly negative.
                            about_centroid.abs()
                        }
                    }
                }
            }
        };

        self.angular_mass = inertia;
        self.inv_angular_mass = if inertia > 0.0 { 1.0 / inertia } else { 0.0 };
        self.angular_mass_dirty = false;
    }

    /// Refreshes all derived values in one go.
    pub fn refresh_derived(&mut self, density: f64) {
        self.refresh_angular_mass(density);
        self.refresh_transform();
    }

    // --- Derived-value readers. Valid after the matching refresh. ---

    pub fn transformed_vertices(&self) -> &[Vec2] {
        debug_assert!(!self.transform_dirty, "transform cache is stale");
        &self.transformed_vertices
    }

    pub fn aabb(&self) -> Aabb {
        debug_assert!(!self.transform_dirty, "transform cache is stale");
        self.transformed_aabb
    }

    pub fn mass(&self) -> f64 {
        debug_assert!(!self.mass_dirty, "mass cache is stale");
        self.mass
    }

    pub fn inv_mass(&self) -> f64 {
        debug_assert!(!self.mass_dirty, "mass cache is stale");
        self.inv_mass
    }

    pub fn angular_mass(&self) -> f64 {
        debug_assert!(!self.angular_mass_dirty, "angular mass cache is stale");
        self.angular_mass
    }

    pub fn inv_angular_mass(&self) -> f64 {
        debug_assert!(!self.angular_mass_dirty, "angular mass cache is stale");
        self.inv_angular_mass
    }

    // --- Motion ---

    /// Advances the body by one substep: exponential drag, then explicit
    /// Euler on position and rotation. Static bodies do not move.
    pub fn integrate(&mut self, dt: f64, linear_drag: f64, angular_drag: f64) {
        if self.is_static() {
            return;
        }

        if self.linear_velocity.magnitude_squared() > 0.0 {
            let damping = (-linear_drag * dt).exp();
            self.linear_velocity = self.linear_velocity * damping;
            self.position += self.linear_velocity * dt;
            self.mark_transform_dirty();
        }

        if self.angular_velocity != 0.0 {
            let damping = (-angular_drag * dt).exp();
            self.angular_velocity *= damping;
            self.rotation += self.angular_velocity * dt;
            self.mark_transform_dirty();
        }
    }

    /// Translation-only impulse, used for kinematic participants.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.linear_velocity += impulse * self.inv_mass;
    }

    /// Impulse applied at contact offset `r`, affecting both linear and
    /// angular velocity. Used for dynamic participants.
    pub fn apply_impulse_at(&mut self, r: Vec2, impulse: Vec2) {
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += r.cross(impulse) * self.inv_angular_mass;
    }
}
