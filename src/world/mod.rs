pub mod physics_world;
pub mod simulation;
pub mod snapshot;

pub use physics_world::{PhysicsWorld, DEFAULT_ITERATIONS};
pub use simulation::Simulation;
pub use snapshot::{BodyRecord, ShapeData, WorldSnapshot};
