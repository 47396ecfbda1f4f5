pub mod collision;
pub mod common;
pub mod error;
pub mod facade;
pub mod math;
pub mod objects;
pub mod shapes;
pub mod solver;
pub mod world;

// Re-export key types for easier use
pub use collision::{Aabb, BroadphaseIndex, UniformGrid};
pub use common::{FrictionCombine, Material, MaterialRegistry};
pub use error::{PhysicsError, Result};
pub use facade::{shared_simulation, BodyScope, SharedSimulation, WorldScope};
pub use math::Vec2;
pub use objects::{Body, BodyType};
pub use shapes::{Circle, Polygon, PolygonCatalog, Rectangle, Shape};
pub use solver::CorrectionWeighting;
pub use world::{PhysicsWorld, Simulation, WorldSnapshot};
