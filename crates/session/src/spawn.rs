use csgworld_common::Transform;
use glam::Vec3;
use rand::Rng;

/// How far above a spawn point a new avatar is placed, so it drops in
/// clear of any geometry built over the point.
pub const SPAWN_CLEARANCE: f32 = 2048.0;

/// Pick one spawn point uniformly and lift it by `clearance` along +Z.
///
/// Returns `None` for an empty set; the caller keeps its default transform.
pub fn select_spawn(points: &[Transform], clearance: f32, rng: &mut impl Rng) -> Option<Transform> {
    if points.is_empty() {
        return None;
    }
    let mut tx = points[rng.gen_range(0..points.len())];
    tx.position += Vec3::Z * clearance;
    Some(tx)
}
