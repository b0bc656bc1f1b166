//! Procedural structure generator: houses built from boolean cuboid operations,
//! and the world layout that places them.
//!
//! # Invariants
//! - House generation is pure and deterministic in its inputs.
//! - Randomness only enters through the caller's RNG, one draw per house.
//! - World initialization runs on the authoritative side only.

pub mod house;
pub mod layout;
pub mod palette;

pub use house::{HouseDimensions, build_house, emit_house, house_op_count};
pub use layout::{BuiltWorld, HouseSite, WorldLayout, WorldPlan, initialize_world, plan_world};
pub use palette::{HousePalette, WorldPalette};

use csgworld_assets::AssetError;
use csgworld_solid::SolidError;

/// Errors from building the world.
#[derive(Debug, thiserror::Error)]
pub enum ProcgenError {
    #[error("invalid world layout: {0}")]
    InvalidLayout(String),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Solid(#[from] SolidError),
}
