use csgworld_common::Aabb;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A cell coordinate in the solid's fixed-size partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Fixed-size cubic partition of the solid.
///
/// The geometry engine regenerates mesh and collision data per cell; the
/// partition tracks which cells an operation touched.
#[derive(Debug, Clone)]
pub struct CellGrid {
    cell_size: f32,
}

impl CellGrid {
    /// `cell_size` must be positive and finite; callers validate first.
    pub fn new(cell_size: f32) -> Self {
        debug_assert!(cell_size > 0.0 && cell_size.is_finite());
        Self { cell_size }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Convert a world position to the cell containing it.
    pub fn position_to_cell(&self, pos: glam::Vec3) -> CellCoord {
        CellCoord {
            x: (pos.x / self.cell_size).floor() as i32,
            y: (pos.y / self.cell_size).floor() as i32,
            z: (pos.z / self.cell_size).floor() as i32,
        }
    }

    /// All cells whose interior overlaps `bounds`.
    ///
    /// Faces lying exactly on a cell boundary do not pull in the neighbour.
    /// A degenerate (zero-extent) box still touches the cell it sits in.
    pub fn cells_overlapping(&self, bounds: &Aabb) -> BTreeSet<CellCoord> {
        let lo = bounds.min.min(bounds.max) / self.cell_size;
        let hi = bounds.min.max(bounds.max) / self.cell_size;
        let range = |lo: f32, hi: f32| {
            let start = lo.floor() as i32;
            let end = ((hi.ceil() as i32) - 1).max(start);
            start..=end
        };

        let mut cells = BTreeSet::new();
        for x in range(lo.x, hi.x) {
            for y in range(lo.y, hi.y) {
                for z in range(lo.z, hi.z) {
                    cells.insert(CellCoord::new(x, y, z));
                }
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn position_to_cell_floors_negative_coordinates() {
        let grid = CellGrid::new(1024.0);
        assert_eq!(
            grid.position_to_cell(Vec3::new(-1.0, 1023.0, 1024.0)),
            CellCoord::new(-1, 0, 1)
        );
    }

    #[test]
    fn box_on_cell_boundaries_stays_inside() {
        let grid = CellGrid::new(1024.0);
        let cells = grid.cells_overlapping(&Aabb::new(Vec3::ZERO, Vec3::splat(1024.0)));
        assert_eq!(cells.len(), 1);
        assert!(cells.contains(&CellCoord::new(0, 0, 0)));
    }

    #[test]
    fn ground_slab_spans_expected_cells() {
        let grid = CellGrid::new(1024.0);
        let slab = Aabb::from_center_scale(Vec3::ZERO, Vec3::new(8192.0, 8192.0, 1024.0));
        // 8 x 8 horizontally, and z from -512 to 512 straddles two layers.
        assert_eq!(grid.cells_overlapping(&slab).len(), 8 * 8 * 2);
    }

    #[test]
    fn zero_height_box_touches_its_cell() {
        let grid = CellGrid::new(1024.0);
        let flat = Aabb::new(Vec3::new(-192.0, 384.0, 512.0), Vec3::new(192.0, 640.0, 512.0));
        let cells = grid.cells_overlapping(&flat);
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|c| c.z == 0 && c.y == 0));
    }
}
