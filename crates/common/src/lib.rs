//! Shared value types for the csgworld generator.
//!
//! Z is the up axis throughout the workspace.

mod types;

pub use types::{Aabb, Authority, BrushHandle, ClientId, EntityId, MaterialHandle, Transform};
