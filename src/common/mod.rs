pub mod material;

pub use material::{
    combine_friction, combine_restitution, FrictionCombine, Material, MaterialRegistry,
};
