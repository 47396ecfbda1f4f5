//! Thin owning wrappers over the handle API. Each scope holds a handle
//! and releases it when dropped; release is idempotent, so an explicit
//! `release()` followed by drop does nothing twice.

use crate::error::Result;
use crate::objects::body::BodyType;
use crate::world::simulation::Simulation;
use std::cell::RefCell;
use std::rc::Rc;

/// Simulation shared between scopes on one thread.
pub type SharedSimulation = Rc<RefCell<Simulation>>;

pub fn shared_simulation() -> SharedSimulation {
    Rc::new(RefCell::new(Simulation::new()))
}

/// Owns a world id for the duration of the scope.
pub struct WorldScope {
    sim: SharedSimulation,
    id: u32,
    released: bool,
}

impl WorldScope {
    pub fn create(sim: &SharedSimulation) -> Self {
        let id = sim.borrow_mut().create_world();
        WorldScope {
            sim: Rc::clone(sim),
            id,
            released: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Destroys the world. Returns false if it was already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.sim.borrow_mut().destroy_world(self.id).is_ok()
    }
}

impl Drop for WorldScope {
    fn drop(&mut self) {
        self.release();
    }
}

/// Owns a body id within a world for the duration of the scope.
pub struct BodyScope {
    sim: SharedSimulation,
    world_id: u32,
    id: u64,
    released: bool,
}

impl BodyScope {
    pub fn new_static(sim: &SharedSimulation, world: &WorldScope) -> Result<Self> {
        Self::create(sim, world, BodyType::Static)
    }

    pub fn new_kinematic(sim: &SharedSimulation, world: &WorldScope) -> Result<Self> {
        Self::create(sim, world, BodyType::Kinematic)
    }

    pub fn new_dynamic(sim: &SharedSimulation, world: &WorldScope) -> Result<Self> {
        Self::create(sim, world, BodyType::Dynamic)
    }

    fn create(sim: &SharedSimulation, world: &WorldScope, body_type: BodyType) -> Result<Self> {
        let id = {
            let mut sim = sim.borrow_mut();
            match body_type {
                BodyType::Static => sim.create_static_body(world.id())?,
                BodyType::Kinematic => sim.create_kinematic_body(world.id())?,
                BodyType::Dynamic => sim.create_dynamic_body(world.id())?,
            }
        };
        Ok(BodyScope {
            sim: Rc::clone(sim),
            world_id: world.id(),
            id,
            released: false,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn world_id(&self) -> u32 {
        self.world_id
    }

    /// Destroys the body. Returns false if it was already released (or
    /// its world is gone).
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.sim
            .borrow_mut()
            .destroy_body(self.world_id, self.id)
            .is_ok()
    }
}

impl Drop for BodyScope {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_scope_releases_on_drop() {
        let sim = shared_simulation();
        let id = {
            let world = WorldScope::create(&sim);
            assert!(sim.borrow().world_exists(world.id()));
            world.id()
        };
        assert!(!sim.borrow().world_exists(id));
    }

    #[test]
    fn test_release_is_idempotent() {
        let sim = shared_simulation();
        let mut world = WorldScope::create(&sim);
        assert!(world.release());
        assert!(!world.release());
        drop(world); // a third release via Drop is a no-op
    }

    #[test]
    fn test_body_scope_lifecycle() {
        let sim = shared_simulation();
        let world = WorldScope::create(&sim);
        let body_id = {
            let body = BodyScope::new_dynamic(&sim, &world).unwrap();
            assert!(sim.borrow().has_body(world.id(), body.id()).unwrap());
            body.id()
        };
        assert!(!sim.borrow().has_body(world.id(), body_id).unwrap());
    }

    #[test]
    fn test_body_release_after_world_destroyed() {
        let sim = shared_simulation();
        let mut world = WorldScope::create(&sim);
        let mut body = BodyScope::new_static(&sim, &world).unwrap();
        world.release();
        // The world took the body with it; releasing reports failure
        // instead of panicking.
        assert!(!body.release());
    }
}
