//! Multi-story house generator.
//!
//! A house is one solid shell followed, per floor, by a hollowing cut and
//! four window cuts. The output is a flat list of operations; nothing here
//! touches a solid until [`emit_house`] streams the list into one.

use crate::palette::HousePalette;
use csgworld_solid::{CsgSolid, GeometryOp, SolidError};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Fixed shape parameters of a house, in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseDimensions {
    /// Extent along X, the long axis.
    pub width: f32,
    /// Extent along Y.
    pub depth: f32,
    pub floor_height: f32,
    pub window_height: f32,
    pub window_width: f32,
    /// Height of a window's sill above its floor.
    pub window_floor_offset: f32,
    pub wall_thickness: f32,
}

impl Default for HouseDimensions {
    fn default() -> Self {
        Self {
            width: 384.0,
            depth: 256.0,
            floor_height: 128.0,
            window_height: 64.0,
            window_width: 128.0,
            window_floor_offset: 32.0,
            wall_thickness: 16.0,
        }
    }
}

/// Number of operations a house with `floor_count` floors produces.
pub fn house_op_count(floor_count: i32) -> usize {
    1 + 5 * floor_count.max(0) as usize
}

impl HouseDimensions {
    /// Operations for a house whose ground floor is centered on `base`.
    ///
    /// `base` is the horizontal center of the footprint and the z of the
    /// lowest floor. Floor counts below one give just the shell, which has
    /// zero height.
    pub fn ops(&self, base: Vec3, floor_count: i32, palette: &HousePalette) -> Vec<GeometryOp> {
        let floors = floor_count.max(0);
        let mut ops = Vec::with_capacity(house_op_count(floors));

        let half_w = self.width * 0.5;
        let half_d = self.depth * 0.5;
        let t = self.wall_thickness;

        ops.push(GeometryOp::add_cube(
            palette.brush,
            palette.material,
            base - Vec3::new(half_w, half_d, 0.0),
            base + Vec3::new(half_w, half_d, self.floor_height * floors as f32),
        ));

        let window_half = Vec3::new(self.window_width * 0.5, t * 0.5, 0.0);
        let window_top = Vec3::new(self.window_width * 0.5, t * 0.5, self.window_height);
        let window_x = self.width * 0.25;
        let window_y = (self.depth - t) * 0.5;

        let mut floor_pos = base;
        for _ in 0..floors {
            ops.push(GeometryOp::subtract_cube(
                palette.brush,
                floor_pos - Vec3::new(half_w - t, half_d - t, 0.0),
                floor_pos + Vec3::new(half_w - t, half_d - t, self.floor_height - t),
            ));

            for (sx, sy) in [(-1.0, 1.0), (1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)] {
                let window = floor_pos
                    + Vec3::new(sx * window_x, sy * window_y, self.window_floor_offset);
                ops.push(GeometryOp::subtract_cube(
                    palette.brush,
                    window - window_half,
                    window + window_top,
                ));
            }

            floor_pos += Vec3::Z * self.floor_height;
        }

        ops
    }
}

/// House operations with the stock dimensions.
pub fn build_house(base: Vec3, floor_count: i32, palette: &HousePalette) -> Vec<GeometryOp> {
    HouseDimensions::default().ops(base, floor_count, palette)
}

/// Build a stock house straight into `solid`. Stops at the first engine error.
pub fn emit_house<S: CsgSolid + ?Sized>(
    solid: &mut S,
    base: Vec3,
    floor_count: i32,
    palette: &HousePalette,
) -> Result<usize, SolidError> {
    let ops = build_house(base, floor_count, palette);
    for op in &ops {
        solid.apply(op)?;
    }
    tracing::debug!(%base, floor_count, ops = ops.len(), "emitted house");
    Ok(ops.len())
}
