//! Named catalog of reusable polygon vertex lists.

use crate::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;
use std::collections::HashMap;

/// Registry of predefined polygons, stored under both a monotonically
/// increasing id and a unique name. Vertex lists are copied on
/// registration so later mutation by the caller cannot alias the catalog.
#[derive(Debug, Default)]
pub struct PolygonCatalog {
    entries: Vec<(String, Vec<Vec2>)>,
    by_name: HashMap<String, u32>,
}

impl PolygonCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a vertex list under `name` and returns the assigned id.
    pub fn register(&mut self, name: &str, vertices: &[Vec2]) -> Result<u32> {
        if name.is_empty() {
            return Err(PhysicsError::bad_argument(1, "name", "must not be empty"));
        }
        if self.by_name.contains_key(name) {
            return Err(PhysicsError::bad_argument(
                1,
                "name",
                format!("polygon {name} is already registered"),
            ));
        }
        if vertices.len() < 3 {
            return Err(PhysicsError::bad_argument(
                2,
                "vertices",
                "polygon needs at least 3 vertices",
            ));
        }

        let id = self.entries.len() as u32 + 1;
        self.entries.push((name.to_string(), vertices.to_vec()));
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn get(&self, id: u32) -> Result<&[Vec2]> {
        if id >= 1 && (id as usize) <= self.entries.len() {
            Ok(&self.entries[id as usize - 1].1)
        } else {
            Err(PhysicsError::PolygonNotFound(id.to_string()))
        }
    }

    pub fn get_by_name(&self, name: &str) -> Result<&[Vec2]> {
        match self.by_name.get(name) {
            Some(&id) => Ok(&self.entries[id as usize - 1].1),
            None => Err(PhysicsError::PolygonNotFound(name.to_string())),
        }
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clears every registered polygon.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.by_name.clear();
    }
}
