//! World solid: the single mutable constructive-solid-geometry object.
//!
//! # Invariants
//! - All mutations are sequential add/subtract operations on one instance.
//! - Operation order is preserved; subtracts carve earlier adds.
//! - A rejected operation leaves the solid unchanged.
//! - Observers receive [`SolidSnapshot`]s, never the mutable solid.

pub mod grid;
pub mod op;
pub mod solid;

pub use grid::{CellCoord, CellGrid};
pub use op::GeometryOp;
pub use solid::{CsgSolid, SolidError, SolidSnapshot, WorldSolid};
