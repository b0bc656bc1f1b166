use crate::grid::{CellCoord, CellGrid};
use crate::op::GeometryOp;
use csgworld_assets::AssetStore;
use csgworld_common::{BrushHandle, MaterialHandle};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Errors reported by the geometry engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolidError {
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),
    #[error("unknown brush handle {0:?}")]
    UnknownBrush(BrushHandle),
    #[error("unknown material handle {0:?}")]
    UnknownMaterial(MaterialHandle),
    #[error("non-finite operand: center={center}, scale={scale}")]
    NonFiniteOperand { center: Vec3, scale: Vec3 },
}

/// The boolean-operation contract of a mutable solid.
///
/// Implementors decide how volume is represented; callers only stream
/// operations in order and propagate failures unchanged.
pub trait CsgSolid {
    fn add(
        &mut self,
        brush: BrushHandle,
        material: MaterialHandle,
        center: Vec3,
        scale: Vec3,
    ) -> Result<(), SolidError>;

    fn subtract(&mut self, brush: BrushHandle, center: Vec3, scale: Vec3)
    -> Result<(), SolidError>;

    /// Apply a prepared operation value.
    fn apply(&mut self, op: &GeometryOp) -> Result<(), SolidError> {
        match *op {
            GeometryOp::Add {
                brush,
                material,
                center,
                scale,
            } => self.add(brush, material, center, scale),
            GeometryOp::Subtract {
                brush,
                center,
                scale,
            } => self.subtract(brush, center, scale),
        }
    }
}

/// The authoritative world solid.
///
/// Records every accepted operation in an append-only log and marks the
/// partition cells each one touched. Owned by the server side; observers
/// only ever receive a [`SolidSnapshot`].
#[derive(Debug)]
pub struct WorldSolid {
    grid: CellGrid,
    assets: Arc<AssetStore>,
    ops: Vec<GeometryOp>,
    dirty: BTreeSet<CellCoord>,
}

impl WorldSolid {
    /// Create an empty solid partitioned into cubic cells of `cell_size`.
    pub fn new(cell_size: f32, assets: Arc<AssetStore>) -> Result<Self, SolidError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(SolidError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            grid: CellGrid::new(cell_size),
            assets,
            ops: Vec::new(),
            dirty: BTreeSet::new(),
        })
    }

    pub fn cell_size(&self) -> f32 {
        self.grid.cell_size()
    }

    /// Accepted operations, in application order.
    pub fn ops(&self) -> &[GeometryOp] {
        &self.ops
    }

    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    /// Cells touched since the last [`take_dirty_cells`](Self::take_dirty_cells).
    pub fn dirty_cells(&self) -> &BTreeSet<CellCoord> {
        &self.dirty
    }

    /// Drain the dirty set, e.g. after regenerating meshes for those cells.
    pub fn take_dirty_cells(&mut self) -> BTreeSet<CellCoord> {
        std::mem::take(&mut self.dirty)
    }

    /// Owned, read-only copy suitable for handing to observers.
    pub fn snapshot(&self) -> SolidSnapshot {
        SolidSnapshot {
            cell_size: self.cell_size(),
            ops: self.ops.clone(),
            hash: self.state_hash(),
        }
    }

    /// Deterministic hash of the cell size and op log.
    pub fn state_hash(&self) -> u64 {
        hash_ops(self.cell_size(), &self.ops)
    }

    fn check_brush(&self, brush: BrushHandle) -> Result<(), SolidError> {
        match self.assets.brush(brush) {
            Some(_) => Ok(()),
            None => Err(SolidError::UnknownBrush(brush)),
        }
    }

    fn record(&mut self, op: GeometryOp) -> Result<(), SolidError> {
        let (center, scale) = (op.center(), op.scale());
        if !(center.is_finite() && scale.is_finite()) {
            return Err(SolidError::NonFiniteOperand { center, scale });
        }
        let cells = self.grid.cells_overlapping(&op.bounds());
        tracing::trace!(
            additive = op.is_additive(),
            %center,
            %scale,
            cells = cells.len(),
            "applied solid op"
        );
        self.dirty.extend(cells);
        self.ops.push(op);
        Ok(())
    }
}

impl CsgSolid for WorldSolid {
    fn add(
        &mut self,
        brush: BrushHandle,
        material: MaterialHandle,
        center: Vec3,
        scale: Vec3,
    ) -> Result<(), SolidError> {
        self.check_brush(brush)?;
        if self.assets.material(material).is_none() {
            return Err(SolidError::UnknownMaterial(material));
        }
        self.record(GeometryOp::Add {
            brush,
            material,
            center,
            scale,
        })
    }

    fn subtract(
        &mut self,
        brush: BrushHandle,
        center: Vec3,
        scale: Vec3,
    ) -> Result<(), SolidError> {
        self.check_brush(brush)?;
        self.record(GeometryOp::Subtract {
            brush,
            center,
            scale,
        })
    }
}

/// Read-only replica of a [`WorldSolid`].
///
/// This is what crosses the authority boundary; it carries no handle back to
/// the mutable solid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidSnapshot {
    pub cell_size: f32,
    pub ops: Vec<GeometryOp>,
    pub hash: u64,
}

impl SolidSnapshot {
    /// Recompute the hash and compare against the stored one.
    pub fn verify(&self) -> bool {
        hash_ops(self.cell_size, &self.ops) == self.hash
    }

    pub fn additive_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_additive()).count()
    }
}

fn hash_ops(cell_size: f32, ops: &[GeometryOp]) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
    let mix = |h: &mut u64, bytes: &[u8]| {
        for &b in bytes {
            *h ^= b as u64;
            *h = h.wrapping_mul(0x0100_0000_01b3);
        }
    };
    let mix_vec = |h: &mut u64, v: Vec3| {
        for c in v.to_array() {
            mix(h, &c.to_le_bytes());
        }
    };
    mix(&mut h, &cell_size.to_le_bytes());
    for op in ops {
        match *op {
            GeometryOp::Add {
                brush, material, ..
            } => {
                mix(&mut h, &[1]);
                mix(&mut h, &brush.0.to_le_bytes());
                mix(&mut h, &material.0.to_le_bytes());
            }
            GeometryOp::Subtract { brush, .. } => {
                mix(&mut h, &[2]);
                mix(&mut h, &brush.0.to_le_bytes());
            }
        }
        mix_vec(&mut h, op.center());
        mix_vec(&mut h, op.scale());
    }
    h
}
