pub mod aabb;
pub mod broadphase;
pub mod detection;
pub mod manifold;

pub use aabb::Aabb;
pub use broadphase::{BroadphaseIndex, UniformGrid};
pub use detection::{intersect, Intersection};
pub use manifold::{find_contact_points, ContactManifold};
