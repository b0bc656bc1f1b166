//! Session layer: spawn points, player avatars, and the join handler that
//! builds the world on first contact.
//!
//! # Invariants
//! - The world moves from uninitialized to built at most once per session.
//! - The build check and the build run under one lock.
//! - An empty spawn-point set is not an error.

pub mod registry;
pub mod session;
pub mod spawn;

pub use registry::{Avatar, EntityData, EntityEvent, EntityKind, EntityRegistry};
pub use session::{GameSession, JoinOutcome, WorldState};
pub use spawn::{SPAWN_CLEARANCE, select_spawn};

use csgworld_procgen::ProcgenError;

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
    #[error("world build failed: {0}")]
    World(#[from] ProcgenError),
}
