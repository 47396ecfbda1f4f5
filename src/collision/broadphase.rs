//! Pluggable broadphase seam. The world falls back to an O(n^2) AABB
//! sweep when no index is installed; an index only has to enumerate
//! candidate handles deterministically.

use crate::collision::aabb::Aabb;
use crate::math::vec2::Vec2;
use std::collections::HashMap;

/// Contract for a broadphase acceleration index. Handles are body ids.
pub trait BroadphaseIndex {
    /// Inserts the handle or moves it to a new bounding box.
    fn update(&mut self, handle: u64, aabb: Aabb);

    fn remove(&mut self, handle: u64);

    /// Fills `out` (clearing it first) with every handle whose stored
    /// AABB overlaps `aabb`, in ascending handle order. The query region
    /// itself is not a stored handle, so the caller filters out
    /// self-matches.
    fn query_overlaps(&self, aabb: Aabb, out: &mut Vec<u64>);
}

/// A uniform spatial hash grid. Cells are keyed by integer coordinates;
/// a handle is registered in every cell its AABB touches.
#[derive(Debug)]
pub struct UniformGrid {
    inv_cell_size: f64,
    cells: HashMap<(i64, i64), Vec<u64>>,
    extents: HashMap<u64, Aabb>,
}

impl UniformGrid {
    pub fn new(cell_size: f64) -> Self {
        assert!(cell_size > 0.0, "cell size must be positive");
        UniformGrid {
            inv_cell_size: 1.0 / cell_size,
            cells: HashMap::new(),
            extents: HashMap::new(),
        }
    }

    fn cell_of(&self, point: Vec2) -> (i64, i64) {
        (
            (point.x * self.inv_cell_size).floor() as i64,
            (point.y * self.inv_cell_size).floor() as i64,
        )
    }

    fn cell_range(&self, aabb: &Aabb) -> ((i64, i64), (i64, i64)) {
        (self.cell_of(aabb.min), self.cell_of(aabb.max))
    }

    fn insert_into_cells(&mut self, handle: u64, aabb: &Aabb) {
        let ((min_col, min_row), (max_col, max_row)) = self.cell_range(aabb);
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                self.cells.entry((col, row)).or_default().push(handle);
            }
        }
    }

    fn remove_from_cells(&mut self, handle: u64, aabb: &Aabb) {
        let ((min_col, min_row), (max_col, max_row)) = self.cell_range(aabb);
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                if let Some(cell) = self.cells.get_mut(&(col, row)) {
                    cell.retain(|&h| h != handle);
                    if cell.is_empty() {
                        self.cells.remove(&(col, row));
                    }
                }
            }
        }
    }
}

impl BroadphaseIndex for UniformGrid {
    fn update(&mut self, handle: u64, aabb: Aabb) {
        if let Some(old) = self.extents.insert(handle, aabb) {
            self.remove_from_cells(handle, &old);
        }
        self.insert_into_cells(handle, &aabb);
    }

    fn remove(&mut self, handle: u64) {
        if let Some(old) = self.extents.remove(&handle) {
            self.remove_from_cells(handle, &old);
        }
    }

    fn query_overlaps(&self, aabb: Aabb, out: &mut Vec<u64>) {
        out.clear();
        let ((min_col, min_row), (max_col, max_row)) = self.cell_range(&aabb);
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                let Some(cell) = self.cells.get(&(col, row)) else {
                    continue;
                };
                for &handle in cell {
                    if self.extents[&handle].overlaps(&aabb) {
                        out.push(handle);
                    }
                }
            }
        }

        // A handle spanning several queried cells shows up once per cell;
        // sort and dedup for the deterministic enumeration the contract asks for.
        out.sort_unstable();
        out.dedup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Aabb {
        Aabb::new(Vec2::new(min_x, min_y), Vec2::new(max_x, max_y))
    }

    #[test]
    fn test_query_finds_overlapping_handles() {
        let mut grid = UniformGrid::new(2.0);
        grid.update(1, boxed(0.0, 0.0, 1.0, 1.0));
        grid.update(2, boxed(0.5, 0.5, 1.5, 1.5));
        grid.update(3, boxed(10.0, 10.0, 11.0, 11.0));

        let mut out = Vec::new();
        grid.query_overlaps(boxed(0.8, 0.8, 0.9, 0.9), &mut out);
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn test_query_is_sorted_and_deduped() {
        let mut grid = UniformGrid::new(1.0);
        // Spans many cells, so it is registered in each of them.
        grid.update(5, boxed(-3.0, -3.0, 3.0, 3.0));
        grid.update(2, boxed(-1.0, -1.0, 1.0, 1.0));

        let mut out = Vec::new();
        grid.query_overlaps(boxed(-2.5, -2.5, 2.5, 2.5), &mut out);
        assert_eq!(out, vec![2, 5]);
    }

    #[test]
    fn test_update_moves_handle() {
        let mut grid = UniformGrid::new(1.0);
        grid.update(1, boxed(0.0, 0.0, 0.5, 0.5));
        grid.update(1, boxed(20.0, 20.0, 20.5, 20.5));

        let mut out = Vec::new();
        grid.query_overlaps(boxed(0.0, 0.0, 1.0, 1.0), &mut out);
        assert!(out.is_empty());

        grid.query_overlaps(boxed(19.0, 19.0, 21.0, 21.0), &mut out);
        assert_eq!(out, vec![1]);
    }

    #[test]
    fn test_remove() {
        let mut grid = UniformGrid::new(1.0);
        grid.update(1, boxed(0.0, 0.0, 0.5, 0.5));
        grid.remove(1);

        let mut out = Vec::new();
        grid.query_overlaps(boxed(-1.0, -1.0, 1.0, 1.0), &mut out);
        assert!(out.is_empty());
        // Removing twice is harmless.
        grid.remove(1);
    }

    #[test]
    fn test_touching_boxes_do_not_match() {
        let mut grid = UniformGrid::new(4.0);
        grid.update(1, boxed(0.0, 0.0, 1.0, 1.0));

        let mut out = Vec::new();
        grid.query_overlaps(boxed(1.0, 0.0, 2.0, 1.0), &mut out);
        assert!(out.is_empty());
    }
}
