//! Brush and material catalog: assets loaded by logical name, consumed by handle.
//!
//! Handles are content-addressed from the logical name, so the same name
//! always resolves to the same handle across processes. Geometry operations
//! carry handles only; nothing outside this crate reads a brush definition.
//!
//! # Invariants
//! - Registering the same name twice yields the same handle.
//! - Brush and material handles live in separate namespaces.

use csgworld_common::{BrushHandle, MaterialHandle};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

pub const CUBE_BRUSH: &str = "brushes/cube.csg";
pub const DODECAHEDRON_BRUSH: &str = "brushes/dodecahedron.csg";
pub const DEFAULT_MATERIAL: &str = "materials/csgdemo/default.csgmat";
pub const RED_MATERIAL: &str = "materials/csgdemo/red.csgmat";
pub const SCORCHED_MATERIAL: &str = "materials/csgdemo/scorched.csgmat";

/// Primitive solid a brush stamps into the world, in unit size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrushShape {
    Cube,
    Dodecahedron,
}

/// A reusable primitive shape template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub name: String,
    pub shape: BrushShape,
}

/// Surface appearance applied by additive operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: DEFAULT_MATERIAL.into(),
            base_color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("brush not found: {0}")]
    BrushNotFound(String),
    #[error("material not found: {0}")]
    MaterialNotFound(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Name-addressed catalog of brushes and materials.
///
/// Loaded once at process start and shared read-only (typically behind an
/// `Arc`). The catalog can be written to disk as JSON for inspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetStore {
    brushes: BTreeMap<BrushHandle, Brush>,
    materials: BTreeMap<MaterialHandle, Material>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the stock brushes and materials of the demo world.
    pub fn builtin() -> Self {
        let mut store = Self::new();
        store.register_brush(Brush {
            name: CUBE_BRUSH.into(),
            shape: BrushShape::Cube,
        });
        store.register_brush(Brush {
            name: DODECAHEDRON_BRUSH.into(),
            shape: BrushShape::Dodecahedron,
        });
        store.register_material(Material::default());
        store.register_material(Material {
            name: RED_MATERIAL.into(),
            base_color: [0.8, 0.1, 0.1, 1.0],
        });
        store.register_material(Material {
            name: SCORCHED_MATERIAL.into(),
            base_color: [0.15, 0.12, 0.1, 1.0],
        });
        store
    }

    /// Register a brush and return its handle.
    pub fn register_brush(&mut self, brush: Brush) -> BrushHandle {
        let handle = BrushHandle(name_hash("brush", &brush.name));
        self.brushes.insert(handle, brush);
        handle
    }

    /// Register a material and return its handle.
    pub fn register_material(&mut self, material: Material) -> MaterialHandle {
        let handle = MaterialHandle(name_hash("material", &material.name));
        self.materials.insert(handle, material);
        handle
    }

    /// Resolve a brush by logical name.
    pub fn load_brush(&self, name: &str) -> Result<BrushHandle, AssetError> {
        let handle = BrushHandle(name_hash("brush", name));
        if self.brushes.contains_key(&handle) {
            Ok(handle)
        } else {
            Err(AssetError::BrushNotFound(name.to_string()))
        }
    }

    /// Resolve a material by logical name.
    pub fn load_material(&self, name: &str) -> Result<MaterialHandle, AssetError> {
        let handle = MaterialHandle(name_hash("material", name));
        if self.materials.contains_key(&handle) {
            Ok(handle)
        } else {
            Err(AssetError::MaterialNotFound(name.to_string()))
        }
    }

    pub fn brush(&self, handle: BrushHandle) -> Option<&Brush> {
        self.brushes.get(&handle)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(&handle)
    }

    pub fn brush_names(&self) -> impl Iterator<Item = &str> {
        self.brushes.values().map(|b| b.name.as_str())
    }

    pub fn material_names(&self) -> impl Iterator<Item = &str> {
        self.materials.values().map(|m| m.name.as_str())
    }

    /// Number of registered assets of both kinds.
    pub fn len(&self) -> usize {
        self.brushes.len() + self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brushes.is_empty() && self.materials.is_empty()
    }

    /// Save the catalog to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path)?;
        let store: Self = serde_json::from_reader(file)?;
        tracing::debug!(assets = store.len(), "loaded asset catalog");
        Ok(store)
    }
}

fn name_hash(namespace: &str, name: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update([0u8]);
    hasher.update(name.as_bytes());
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    u64::from_le_bytes(bytes)
}

pub fn crate_info() -> &'static str {
    concat!("csgworld-assets v", env!("CARGO_PKG_VERSION"))
}
