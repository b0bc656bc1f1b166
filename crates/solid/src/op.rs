use csgworld_common::{Aabb, BrushHandle, MaterialHandle};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One boolean step against the world solid.
///
/// Operations are plain values. They are applied in emission order, and a
/// subtract only carves volume that an earlier add put there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GeometryOp {
    /// Union a scaled brush into the solid, painted with `material`.
    Add {
        brush: BrushHandle,
        material: MaterialHandle,
        center: Vec3,
        scale: Vec3,
    },
    /// Remove the volume of a scaled brush from the solid.
    Subtract {
        brush: BrushHandle,
        center: Vec3,
        scale: Vec3,
    },
}

impl GeometryOp {
    /// Additive cuboid spanning the box `min..max`.
    pub fn add_cube(brush: BrushHandle, material: MaterialHandle, min: Vec3, max: Vec3) -> Self {
        Self::Add {
            brush,
            material,
            center: (min + max) * 0.5,
            scale: max - min,
        }
    }

    /// Subtractive cuboid spanning the box `min..max`.
    pub fn subtract_cube(brush: BrushHandle, min: Vec3, max: Vec3) -> Self {
        Self::Subtract {
            brush,
            center: (min + max) * 0.5,
            scale: max - min,
        }
    }

    pub fn is_additive(&self) -> bool {
        matches!(self, Self::Add { .. })
    }

    pub fn brush(&self) -> BrushHandle {
        match *self {
            Self::Add { brush, .. } | Self::Subtract { brush, .. } => brush,
        }
    }

    /// `None` for subtracts.
    pub fn material(&self) -> Option<MaterialHandle> {
        match *self {
            Self::Add { material, .. } => Some(material),
            Self::Subtract { .. } => None,
        }
    }

    pub fn center(&self) -> Vec3 {
        match *self {
            Self::Add { center, .. } | Self::Subtract { center, .. } => center,
        }
    }

    pub fn scale(&self) -> Vec3 {
        match *self {
            Self::Add { scale, .. } | Self::Subtract { scale, .. } => scale,
        }
    }

    /// Box covered by the brush, assuming a unit brush centered on its origin.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_scale(self.center(), self.scale())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE: BrushHandle = BrushHandle(1);
    const MAT: MaterialHandle = MaterialHandle(2);

    #[test]
    fn cube_from_corners_keeps_corners() {
        let min = Vec3::new(-192.0, 384.0, 512.0);
        let max = Vec3::new(192.0, 640.0, 896.0);
        let op = GeometryOp::add_cube(CUBE, MAT, min, max);
        assert_eq!(op.bounds(), Aabb::new(min, max));
        assert_eq!(op.scale(), Vec3::new(384.0, 256.0, 384.0));
        assert!(op.is_additive());
        assert_eq!(op.material(), Some(MAT));
    }

    #[test]
    fn subtract_has_no_material() {
        let op = GeometryOp::subtract_cube(CUBE, Vec3::ZERO, Vec3::ONE);
        assert!(!op.is_additive());
        assert_eq!(op.material(), None);
        assert_eq!(op.brush(), CUBE);
        assert_eq!(op.center(), Vec3::splat(0.5));
    }
}
