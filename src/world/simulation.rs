//! Handle-based public surface: worlds and bodies are addressed by
//! numeric ids, with the material registry and predefined-polygon catalog
//! shared across every world of the simulation.

use crate::collision::aabb::Aabb;
use crate::common::material::MaterialRegistry;
use crate::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;
use crate::objects::body::{Body, BodyType};
use crate::shapes::{catalog::PolygonCatalog, Circle, Polygon, Rectangle, Shape};
use crate::world::physics_world::PhysicsWorld;
use crate::world::snapshot::{self, BodyRecord, ShapeData, WorldSnapshot};
use log::debug;
use std::collections::HashMap;

pub struct Simulation {
    worlds: HashMap<u32, PhysicsWorld>,
    next_world_id: u32,
    materials: MaterialRegistry,
    polygons: PolygonCatalog,
}

impl Simulation {
    /// Creates a simulation with the builtin materials seeded and no
    /// worlds.
    pub fn new() -> Self {
        Simulation {
            worlds: HashMap::new(),
            next_world_id: 1,
            materials: MaterialRegistry::new(),
            polygons: PolygonCatalog::new(),
        }
    }

    pub fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialRegistry {
        &mut self.materials
    }

    pub fn polygons(&self) -> &PolygonCatalog {
        &self.polygons
    }

    pub fn polygons_mut(&mut self) -> &mut PolygonCatalog {
        &mut self.polygons
    }

    // --- World lifecycle ---

    pub fn create_world(&mut self) -> u32 {
        let id = self.next_world_id;
        self.next_world_id += 1;
        self.worlds.insert(id, PhysicsWorld::new(id));
        debug!("created world {id}");
        id
    }

    pub fn world_exists(&self, world_id: u32) -> bool {
        self.worlds.contains_key(&world_id)
    }

    pub fn destroy_world(&mut self, world_id: u32) -> Result<()> {
        if world_id == 0 {
            return Err(PhysicsError::AlreadyDestroyed(0));
        }
        if self.worlds.remove(&world_id).is_none() {
            return Err(PhysicsError::WorldNotFound(world_id));
        }
        debug!("destroyed world {world_id}");
        Ok(())
    }

    pub fn world(&self, world_id: u32) -> Result<&PhysicsWorld> {
        self.worlds
            .get(&world_id)
            .ok_or(PhysicsError::WorldNotFound(world_id))
    }

    pub fn world_mut(&mut self, world_id: u32) -> Result<&mut PhysicsWorld> {
        self.worlds
            .get_mut(&world_id)
            .ok_or(PhysicsError::WorldNotFound(world_id))
    }

    // --- Body lifecycle ---

    pub fn create_static_body(&mut self, world_id: u32) -> Result<u64> {
        self.create_body(world_id, BodyType::Static)
    }

    pub fn create_kinematic_body(&mut self, world_id: u32) -> Result<u64> {
        self.create_body(world_id, BodyType::Kinematic)
    }

    pub fn create_dynamic_body(&mut self, world_id: u32) -> Result<u64> {
        self.create_body(world_id, BodyType::Dynamic)
    }

    fn create_body(&mut self, world_id: u32, body_type: BodyType) -> Result<u64> {
        let material = self.materials.default_material();
        let world = self.world_mut(world_id)?;
        Ok(world.create_body(body_type, material))
    }

    pub fn destroy_body(&mut self, world_id: u32, body_id: u64) -> Result<()> {
        self.world_mut(world_id)?.destroy_body(body_id)
    }

    pub fn has_body(&self, world_id: u32, body_id: u64) -> Result<bool> {
        Ok(self.world(world_id)?.has_body(body_id))
    }

    pub fn clear_bodies(&mut self, world_id: u32) -> Result<()> {
        self.world_mut(world_id)?.clear_bodies();
        Ok(())
    }

    /// Body ids of a world, in insertion order.
    pub fn body_ids(&self, world_id: u32) -> Result<Vec<u64>> {
        Ok(self.world(world_id)?.body_ids().to_vec())
    }

    // --- Body state accessors ---

    pub fn get_position(&self, world_id: u32, body_id: u64) -> Result<Vec2> {
        Ok(self.world(world_id)?.body(body_id)?.position())
    }

    pub fn set_position(&mut self, world_id: u32, body_id: u64, position: Vec2) -> Result<()> {
        self.world_mut(world_id)?
            .body_mut(body_id)?
            .set_position(position);
        Ok(())
    }

    pub fn change_position(&mut self, world_id: u32, body_id: u64, delta: Vec2) -> Result<()> {
        let body = self.world_mut(world_id)?.body_mut(body_id)?;
        let position = body.position() + delta;
        body.set_position(position);
        Ok(())
    }

    pub fn get_rotation(&self, world_id: u32, body_id: u64) -> Result<f64> {
        Ok(self.world(world_id)?.body(body_id)?.rotation())
    }

    pub fn set_rotation(&mut self, world_id: u32, body_id: u64, rotation: f64) -> Result<()> {
        self.world_mut(world_id)?
            .body_mut(body_id)?
            .set_rotation(rotation);
        Ok(())
    }

    pub fn change_rotation(&mut self, world_id: u32, body_id: u64, delta: f64) -> Result<()> {
        let body = self.world_mut(world_id)?.body_mut(body_id)?;
        let rotation = body.rotation() + delta;
        body.set_rotation(rotation);
        Ok(())
    }

    pub fn get_linear_velocity(&self, world_id: u32, body_id: u64) -> Result<Vec2> {
        Ok(self.world(world_id)?.body(body_id)?.linear_velocity())
    }

    pub fn set_linear_velocity(&mut self, world_id: u32, body_id: u64, velocity: Vec2) -> Result<()> {
        self.world_mut(world_id)?
            .body_mut(body_id)?
            .set_linear_velocity(velocity);
        Ok(())
    }

    pub fn change_linear_velocity(&mut self, world_id: u32, body_id: u64, delta: Vec2) -> Result<()> {
        let body = self.world_mut(world_id)?.body_mut(body_id)?;
        let velocity = body.linear_velocity() + delta;
        body.set_linear_velocity(velocity);
        Ok(())
    }

    pub fn get_angular_velocity(&self, world_id: u32, body_id: u64) -> Result<f64> {
        Ok(self.world(world_id)?.body(body_id)?.angular_velocity())
    }

    pub fn set_angular_velocity(&mut self, world_id: u32, body_id: u64, omega: f64) -> Result<()> {
        self.world_mut(world_id)?
            .body_mut(body_id)?
            .set_angular_velocity(omega);
        Ok(())
    }

    pub fn change_angular_velocity(&mut self, world_id: u32, body_id: u64, delta: f64) -> Result<()> {
        let body = self.world_mut(world_id)?.body_mut(body_id)?;
        let omega = body.angular_velocity() + delta;
        body.set_angular_velocity(omega);
        Ok(())
    }

    pub fn get_material(&self, world_id: u32, body_id: u64) -> Result<u32> {
        Ok(self.world(world_id)?.body(body_id)?.material())
    }

    pub fn set_material(&mut self, world_id: u32, body_id: u64, material_id: u32) -> Result<()> {
        if !self.materials.contains(material_id) {
            return Err(PhysicsError::MaterialNotFound(material_id.to_string()));
        }
        self.world_mut(world_id)?
            .body_mut(body_id)?
            .set_material(material_id);
        Ok(())
    }

    pub fn set_material_by_name(&mut self, world_id: u32, body_id: u64, name: &str) -> Result<()> {
        let material_id = self.materials.get_by_name(name)?.id;
        self.world_mut(world_id)?
            .body_mut(body_id)?
            .set_material(material_id);
        Ok(())
    }

    // --- Shape setters ---

    pub fn set_circle_shape(&mut self, world_id: u32, body_id: u64, radius: f64) -> Result<()> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(PhysicsError::bad_argument(3, "radius", "must be positive"));
        }
        self.world_mut(world_id)?
            .body_mut(body_id)?
            .set_shape(Shape::Circle(Circle::new(radius)));
        Ok(())
    }

    pub fn set_rectangle_shape(
        &mut self,
        world_id: u32,
        body_id: u64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        if !(width.is_finite() && width > 0.0) {
            return Err(PhysicsError::bad_argument(3, "width", "must be positive"));
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(PhysicsError::bad_argument(4, "height", "must be positive"));
        }
        self.world_mut(world_id)?
            .body_mut(body_id)?
            .set_shape(Shape::Rectangle(Rectangle::new(width, height)));
        Ok(())
    }

    pub fn set_polygon_shape(
        &mut self,
        world_id: u32,
        body_id: u64,
        vertices: &[Vec2],
    ) -> Result<()> {
        if vertices.len() < 3 {
            return Err(PhysicsError::bad_argument(
                3,
                "vertices",
                "polygon needs at least 3 vertices",
            ));
        }
        if vertices.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return Err(PhysicsError::bad_argument(
                3,
                "vertices",
                "coordinates must be finite numbers",
            ));
        }
        self.world_mut(world_id)?
            .body_mut(body_id)?
            .set_shape(Shape::Polygon(Polygon::new(vertices.to_vec())));
        Ok(())
    }

    /// Assigns a polygon from the predefined catalog by name.
    pub fn set_predefined_polygon_shape(
        &mut self,
        world_id: u32,
        body_id: u64,
        name: &str,
    ) -> Result<()> {
        let vertices = self.polygons.get_by_name(name)?.to_vec();
        self.world_mut(world_id)?
            .body_mut(body_id)?
            .set_shape(Shape::Polygon(Polygon::new(vertices)));
        Ok(())
    }

    // --- World settings and stepping ---

    pub fn get_iterations(&self, world_id: u32) -> Result<u32> {
        Ok(self.world(world_id)?.iterations())
    }

    pub fn set_iterations(&mut self, world_id: u32, iterations: i32) -> Result<()> {
        self.world_mut(world_id)?.set_iterations(iterations);
        Ok(())
    }

    pub fn get_boundary(&self, world_id: u32) -> Result<Option<Aabb>> {
        Ok(self.world(world_id)?.boundary())
    }

    pub fn set_boundary(&mut self, world_id: u32, boundary: Option<Aabb>) -> Result<()> {
        self.world_mut(world_id)?.set_boundary(boundary);
        Ok(())
    }

    /// Adds `delta` to the velocity of every non-static body in the
    /// world. The value is used as-is (a velocity delta, not an
    /// acceleration), so per-frame gravity is `g * dt` on the caller's
    /// side.
    pub fn apply_gravity(&mut self, world_id: u32, delta: Vec2) -> Result<()> {
        self.world_mut(world_id)?.apply_gravity(delta);
        Ok(())
    }

    pub fn tick(&mut self, world_id: u32, dt: f64) -> Result<()> {
        let world = self
            .worlds
            .get_mut(&world_id)
            .ok_or(PhysicsError::WorldNotFound(world_id))?;
        world.tick(dt, &self.materials)
    }

    // --- Persistence ---

    pub fn snapshot(&self, world_id: u32) -> Result<WorldSnapshot> {
        let world = self.world(world_id)?;
        let mut bodies = Vec::with_capacity(world.body_count());
        for &body_id in world.body_ids() {
            let body = world.body(body_id)?;
            bodies.push(BodyRecord {
                id: body.id(),
                body_type: body.body_type(),
                px: body.position().x,
                py: body.position().y,
                vx: body.linear_velocity().x,
                vy: body.linear_velocity().y,
                rotation: body.rotation(),
                angular_velocity: body.angular_velocity(),
                material: body.material(),
                shape: ShapeData::from_shape(body.shape()),
            });
        }
        Ok(WorldSnapshot {
            latest_body_id: world.latest_body_id(),
            bodies,
        })
    }

    /// Replaces a world's population with the snapshot's records.
    pub fn restore(&mut self, world_id: u32, snapshot: &WorldSnapshot) -> Result<()> {
        for record in &snapshot.bodies {
            if !self.materials.contains(record.material) {
                return Err(PhysicsError::MaterialNotFound(record.material.to_string()));
            }
        }

        let world = self.world_mut(world_id)?;
        world.clear_bodies();
        for record in &snapshot.bodies {
            let mut body = Body::new(record.id, record.body_type, record.material);
            body.set_position(Vec2::new(record.px, record.py));
            body.set_linear_velocity(Vec2::new(record.vx, record.vy));
            body.set_rotation(record.rotation);
            body.set_angular_velocity(record.angular_velocity);
            body.set_shape(record.shape.to_shape());
            world.insert_restored(body);
        }
        world.set_latest_body_id(snapshot.latest_body_id);
        Ok(())
    }

    /// Canonical textual encoding of a world's state.
    pub fn serialize(&self, world_id: u32) -> Result<String> {
        Ok(snapshot::encode(&self.snapshot(world_id)?))
    }

    /// Rebuilds a world's population from the canonical text form.
    pub fn deserialize(&mut self, world_id: u32, data: &str) -> Result<()> {
        let snapshot = snapshot::decode(data)?;
        self.restore(world_id, &snapshot)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}
