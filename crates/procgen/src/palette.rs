use csgworld_assets::{
    AssetError, AssetStore, CUBE_BRUSH, DEFAULT_MATERIAL, DODECAHEDRON_BRUSH, RED_MATERIAL,
    SCORCHED_MATERIAL,
};
use csgworld_common::{BrushHandle, MaterialHandle};

/// Brush and material a house is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HousePalette {
    pub brush: BrushHandle,
    pub material: MaterialHandle,
}

/// Every stock handle the world generator uses, resolved once at start-up.
///
/// The layout only builds from `cube` and `default_material`; the rest are
/// resolved so a missing stock asset fails the build up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldPalette {
    pub cube: BrushHandle,
    pub dodecahedron: BrushHandle,
    pub default_material: MaterialHandle,
    pub red_material: MaterialHandle,
    pub scorched_material: MaterialHandle,
}

impl WorldPalette {
    pub fn resolve(assets: &AssetStore) -> Result<Self, AssetError> {
        Ok(Self {
            cube: assets.load_brush(CUBE_BRUSH)?,
            dodecahedron: assets.load_brush(DODECAHEDRON_BRUSH)?,
            default_material: assets.load_material(DEFAULT_MATERIAL)?,
            red_material: assets.load_material(RED_MATERIAL)?,
            scorched_material: assets.load_material(SCORCHED_MATERIAL)?,
        })
    }

    /// Houses are plain cubes in the default material.
    pub fn house(&self) -> HousePalette {
        HousePalette {
            brush: self.cube,
            material: self.default_material,
        }
    }
}
