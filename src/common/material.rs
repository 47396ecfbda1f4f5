//! Named physical materials and the rules for combining them at a contact.

use crate::error::{PhysicsError, Result};
use std::collections::HashMap;

/// Rule used to merge the friction coefficients of two touching materials.
/// The first body's material decides which rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrictionCombine {
    Average,
    Minimum,
    Maximum,
    Multiply,
}

/// Physical properties shared by every body referencing this material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub id: u32,
    pub name: String,
    /// Mass per unit area, must be positive.
    pub density: f64,
    /// Bounciness in [0, 1].
    pub restitution: f64,
    /// Static friction coefficient in [0, 1].
    pub static_friction: f64,
    /// Dynamic (kinetic) friction coefficient in [0, 1].
    pub dynamic_friction: f64,
    pub friction_combine: FrictionCombine,
    /// Exponential damping applied to linear velocity, per second.
    pub linear_drag: f64,
    /// Exponential damping applied to angular velocity, per second.
    pub angular_drag: f64,
}

/// Registry of materials, keyed by id and by name. Append-only between
/// resets; ids are issued in registration order starting at 1.
#[derive(Debug)]
pub struct MaterialRegistry {
    materials: Vec<Material>,
    by_name: HashMap<String, u32>,
    default_id: u32,
}

/// The materials seeded by `reset`, in registration order.
/// (name, density, restitution, static friction, dynamic friction,
/// linear drag, angular drag) — all builtins use the Average combine rule.
const BUILTIN_MATERIALS: [(&str, f64, f64, f64, f64, f64, f64); 8] = [
    ("Glass", 2.5, 0.1, 0.3, 0.25, 0.06, 0.02),
    ("Ice", 0.9, 0.05, 0.05, 0.01, 0.03, 0.01),
    ("Lead", 11.3, 0.05, 0.3, 0.28, 0.03, 0.05),
    ("Plastic", 1.2, 0.4, 0.4, 0.35, 0.12, 0.06),
    ("Rubber", 1.1, 0.8, 0.9, 0.75, 0.3, 0.2),
    ("Steel", 7.8, 0.03, 0.35, 0.30, 0.06, 0.03),
    ("Stone", 2.4, 0.1, 0.45, 0.40, 0.15, 0.04),
    ("Wood", 0.6, 0.3, 0.5, 0.45, 0.25, 0.08),
];

const DEFAULT_MATERIAL_NAME: &str = "Wood";

impl MaterialRegistry {
    /// Creates a registry seeded with the builtin materials,
    /// with "Wood" as the default.
    pub fn new() -> Self {
        let mut registry = MaterialRegistry {
            materials: Vec::new(),
            by_name: HashMap::new(),
            default_id: 0,
        };
        registry.reset();
        registry
    }

    /// Clears every registered material and re-seeds the builtins.
    /// The default material goes back to "Wood".
    pub fn reset(&mut self) {
        self.materials.clear();
        self.by_name.clear();
        for (name, density, restitution, mu_s, mu_d, lin_drag, ang_drag) in BUILTIN_MATERIALS {
            self.register(
                name,
                density,
                restitution,
                mu_s,
                mu_d,
                FrictionCombine::Average,
                lin_drag,
                ang_drag,
            )
            .expect("builtin material parameters are valid");
        }
        self.default_id = self.by_name[DEFAULT_MATERIAL_NAME];
    }

    /// Registers a new material and returns its id. Parameters are
    /// validated up front; the registry is unchanged on error.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        name: &str,
        density: f64,
        restitution: f64,
        static_friction: f64,
        dynamic_friction: f64,
        friction_combine: FrictionCombine,
        linear_drag: f64,
        angular_drag: f64,
    ) -> Result<u32> {
        if name.is_empty() {
            return Err(PhysicsError::bad_argument(1, "name", "must not be empty"));
        }
        if self.by_name.contains_key(name) {
            return Err(PhysicsError::bad_argument(
                1,
                "name",
                format!("material {name} is already registered"),
            ));
        }
        if !(density > 0.0) {
            return Err(PhysicsError::bad_argument(2, "density", "must be positive"));
        }
        if !(0.0..=1.0).contains(&restitution) {
            return Err(PhysicsError::bad_argument(
                3,
                "restitution",
                "must be in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&static_friction) {
            return Err(PhysicsError::bad_argument(
                4,
                "staticFriction",
                "must be in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&dynamic_friction) {
            return Err(PhysicsError::bad_argument(
                5,
                "dynamicFriction",
                "must be in [0, 1]",
            ));
        }
        if !(linear_drag >= 0.0) {
            return Err(PhysicsError::bad_argument(
                7,
                "linearDrag",
                "must be non-negative",
            ));
        }
        if !(angular_drag >= 0.0) {
            return Err(PhysicsError::bad_argument(
                8,
                "angularDrag",
                "must be non-negative",
            ));
        }

        let id = self.materials.len() as u32 + 1;
        self.materials.push(Material {
            id,
            name: name.to_string(),
            density,
            restitution,
            static_friction,
            dynamic_friction,
            friction_combine,
            linear_drag,
            angular_drag,
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn contains(&self, id: u32) -> bool {
        id >= 1 && (id as usize) <= self.materials.len()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, id: u32) -> Result<&Material> {
        if self.contains(id) {
            Ok(&self.materials[id as usize - 1])
        } else {
            Err(PhysicsError::MaterialNotFound(id.to_string()))
        }
    }

    pub fn get_by_name(&self, name: &str) -> Result<&Material> {
        match self.by_name.get(name) {
            Some(&id) => Ok(&self.materials[id as usize - 1]),
            None => Err(PhysicsError::MaterialNotFound(name.to_string())),
        }
    }

    /// Iterates materials in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn default_material(&self) -> u32 {
        self.default_id
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        let id = self.get_by_name(name)?.id;
        self.default_id = id;
        Ok(())
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Merges the friction coefficients of two materials using the first
/// material's combine rule. Returns (static, dynamic).
pub fn combine_friction(a: &Material, b: &Material) -> (f64, f64) {
    match a.friction_combine {
        FrictionCombine::Average => (
            (a.static_friction + b.static_friction) * 0.5,
            (a.dynamic_friction + b.dynamic_friction) * 0.5,
        ),
        FrictionCombine::Minimum => (
            a.static_friction.min(b.static_friction),
            a.dynamic_friction.min(b.dynamic_friction),
        ),
        FrictionCombine::Maximum => (
            a.static_friction.max(b.static_friction),
            a.dynamic_friction.max(b.dynamic_friction),
        ),
        FrictionCombine::Multiply => (
            a.static_friction * b.static_friction,
            a.dynamic_friction * b.dynamic_friction,
        ),
    }
}

/// Combined restitution of a contact: the less bouncy material wins,
/// regardless of either combine rule.
pub fn combine_restitution(a: &Material, b: &Material) -> f64 {
    a.restitution.min(b.restitution)
}
