//! One-time world layout: a ground slab and two rows of houses.

use crate::ProcgenError;
use crate::house::build_house;
use crate::palette::WorldPalette;
use csgworld_assets::AssetStore;
use csgworld_common::Authority;
use csgworld_solid::{CsgSolid, GeometryOp, WorldSolid};
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;

pub const CELL_SIZE: f32 = 1024.0;
pub const GROUND_SCALE: Vec3 = Vec3::new(8192.0, 8192.0, 1024.0);
pub const HOUSE_SPACING: f32 = 512.0;
pub const ROW_OFFSET: f32 = 512.0;
pub const HOUSE_BASE_Z: f32 = 512.0;
pub const MIN_FLOORS: i32 = 2;
pub const MAX_FLOORS: i32 = 10;

/// Parameters of the generated world. [`Default`] is the shipped layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldLayout {
    pub cell_size: f32,
    /// Ground slab extents; the slab is centered on the origin.
    pub ground_scale: Vec3,
    /// Column indices; house x is `offset * spacing`.
    pub offsets: RangeInclusive<i32>,
    pub spacing: f32,
    /// Y of each row of houses, in emission order.
    pub rows: Vec<f32>,
    pub base_z: f32,
    /// Inclusive floor-count range each house draws from independently.
    pub floors: RangeInclusive<i32>,
}

impl Default for WorldLayout {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            ground_scale: GROUND_SCALE,
            offsets: -3..=3,
            spacing: HOUSE_SPACING,
            rows: vec![ROW_OFFSET, -ROW_OFFSET],
            base_z: HOUSE_BASE_Z,
            floors: MIN_FLOORS..=MAX_FLOORS,
        }
    }
}

impl WorldLayout {
    pub fn house_count(&self) -> usize {
        self.offsets.clone().count() * self.rows.len()
    }

    /// Reject layouts the generator cannot draw from or place.
    ///
    /// Cell size is left to [`WorldSolid::new`], which owns that check.
    pub fn validate(&self) -> Result<(), ProcgenError> {
        if self.floors.is_empty() {
            return Err(ProcgenError::InvalidLayout(format!(
                "empty floor range {:?}",
                self.floors
            )));
        }
        if !self.spacing.is_finite() || !self.base_z.is_finite() {
            return Err(ProcgenError::InvalidLayout(format!(
                "non-finite placement: spacing={}, base_z={}",
                self.spacing, self.base_z
            )));
        }
        if let Some(row) = self.rows.iter().find(|y| !y.is_finite()) {
            return Err(ProcgenError::InvalidLayout(format!("non-finite row {row}")));
        }
        if !self.ground_scale.is_finite() {
            return Err(ProcgenError::InvalidLayout(format!(
                "non-finite ground scale {}",
                self.ground_scale
            )));
        }
        Ok(())
    }
}

/// Where a house was placed and how tall it came out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HouseSite {
    pub base: Vec3,
    pub floors: i32,
}

/// Everything the initializer will apply, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldPlan {
    pub sites: Vec<HouseSite>,
    pub ops: Vec<GeometryOp>,
}

/// Lay out the world without touching a solid.
///
/// The ground slab comes first, then for each offset the house on each row
/// in turn. Every house draws its own floor count.
///
/// # Panics
/// If `layout.floors` is empty. [`initialize_world`] validates first.
pub fn plan_world(layout: &WorldLayout, palette: &WorldPalette, rng: &mut impl Rng) -> WorldPlan {
    let house = palette.house();
    let mut sites = Vec::with_capacity(layout.house_count());
    let mut ops = vec![GeometryOp::Add {
        brush: palette.cube,
        material: palette.default_material,
        center: Vec3::ZERO,
        scale: layout.ground_scale,
    }];

    for offset in layout.offsets.clone() {
        for &row in &layout.rows {
            let base = Vec3::new(offset as f32 * layout.spacing, row, layout.base_z);
            let floors = rng.gen_range(layout.floors.clone());
            ops.extend(build_house(base, floors, &house));
            sites.push(HouseSite { base, floors });
        }
    }

    WorldPlan { sites, ops }
}

/// A freshly built world solid and the houses in it.
#[derive(Debug)]
pub struct BuiltWorld {
    pub solid: WorldSolid,
    pub sites: Vec<HouseSite>,
}

/// Create the world solid and apply the full layout to it.
///
/// # Panics
/// If `authority` is not the authoritative side. Only the server may build
/// canonical geometry. A bad layout is an error, not a panic.
pub fn initialize_world(
    authority: Authority,
    assets: Arc<AssetStore>,
    layout: &WorldLayout,
    rng: &mut impl Rng,
) -> Result<BuiltWorld, ProcgenError> {
    assert!(
        authority.is_authoritative(),
        "world initialization attempted on a non-authoritative side"
    );

    layout.validate()?;
    let palette = WorldPalette::resolve(&assets)?;
    let mut solid = WorldSolid::new(layout.cell_size, assets)?;
    let plan = plan_world(layout, &palette, rng);
    for op in &plan.ops {
        solid.apply(op)?;
    }

    tracing::info!(
        houses = plan.sites.len(),
        ops = solid.op_count(),
        dirty_cells = solid.dirty_cells().len(),
        "world built"
    );
    Ok(BuiltWorld {
        solid,
        sites: plan.sites,
    })
}
