use crate::SessionError;
use crate::registry::{Avatar, EntityEvent, EntityKind, EntityRegistry};
use crate::spawn::{SPAWN_CLEARANCE, select_spawn};
use csgworld_assets::AssetStore;
use csgworld_common::{Authority, ClientId, EntityId, Transform};
use csgworld_procgen::{BuiltWorld, HouseSite, WorldLayout, initialize_world};
use csgworld_solid::SolidSnapshot;
use rand::Rng;
use std::sync::{Arc, Mutex, MutexGuard};

/// Lifecycle of the world solid. Moves to `Built` at most once.
#[derive(Debug, Default)]
pub enum WorldState {
    #[default]
    Uninitialized,
    Built(BuiltWorld),
}

impl WorldState {
    pub fn is_built(&self) -> bool {
        matches!(self, Self::Built(_))
    }
}

/// Result of handling one client join.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinOutcome {
    pub avatar: EntityId,
    /// Final avatar transform.
    pub transform: Transform,
    /// False when no spawn point existed and the default transform was kept.
    pub placed_at_spawn: bool,
    /// True only for the join that built the world.
    pub built_world: bool,
}

/// Server-side game session.
///
/// Owns the world solid and the entity registry. The solid is only ever
/// handed out as a [`SolidSnapshot`].
#[derive(Debug)]
pub struct GameSession {
    authority: Authority,
    assets: Arc<AssetStore>,
    layout: WorldLayout,
    clearance: f32,
    world: Mutex<WorldState>,
    entities: Mutex<EntityRegistry>,
}

impl GameSession {
    /// Session with the stock world layout and spawn clearance.
    pub fn new(authority: Authority, assets: Arc<AssetStore>) -> Self {
        Self::with_layout(authority, assets, WorldLayout::default())
    }

    pub fn with_layout(authority: Authority, assets: Arc<AssetStore>, layout: WorldLayout) -> Self {
        Self {
            authority,
            assets,
            layout,
            clearance: SPAWN_CLEARANCE,
            world: Mutex::new(WorldState::Uninitialized),
            entities: Mutex::new(EntityRegistry::new()),
        }
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    pub fn layout(&self) -> &WorldLayout {
        &self.layout
    }

    /// Place a spawn point. Spawn points are part of the loaded level.
    pub fn add_spawn_point(&self, transform: Transform) -> Result<EntityId, SessionError> {
        Ok(self.entities()?.spawn(EntityKind::SpawnPoint, transform))
    }

    /// Build the world if it does not exist yet.
    ///
    /// The check and the build happen under one lock, so concurrent callers
    /// cannot both build. Returns whether this call did the build.
    pub fn ensure_world(&self, rng: &mut impl Rng) -> Result<bool, SessionError> {
        let mut world = self.world()?;
        if world.is_built() {
            return Ok(false);
        }
        let built = initialize_world(self.authority, self.assets.clone(), &self.layout, rng)?;
        *world = WorldState::Built(built);
        Ok(true)
    }

    /// Handle a client connecting: make sure the world exists, give the
    /// client an avatar, and drop it above a random spawn point.
    pub fn client_joined(
        &self,
        client: ClientId,
        rng: &mut impl Rng,
    ) -> Result<JoinOutcome, SessionError> {
        let built_world = self.ensure_world(rng)?;

        let mut entities = self.entities()?;
        if let Some(stale) = entities.avatar_of(client) {
            tracing::warn!(?client, "client joined twice; replacing its avatar");
            entities.despawn(stale);
        }

        let avatar = entities.spawn(
            EntityKind::Avatar(Avatar::new(client)),
            Transform::default(),
        );
        entities.respawn(avatar);

        let spawn = select_spawn(&entities.spawn_points(), self.clearance, rng);
        let placed_at_spawn = spawn.is_some();
        match spawn {
            Some(tx) => {
                entities.set_transform(avatar, tx);
            }
            None => tracing::debug!(?client, "no spawn points; keeping default transform"),
        }

        let transform = entities
            .get(avatar)
            .map(|d| d.transform)
            .unwrap_or_default();
        tracing::info!(?client, position = %transform.position, "client joined");

        Ok(JoinOutcome {
            avatar,
            transform,
            placed_at_spawn,
            built_world,
        })
    }

    /// Handle a client disconnecting. Returns the avatar that was removed.
    pub fn client_left(&self, client: ClientId) -> Result<Option<EntityId>, SessionError> {
        let mut entities = self.entities()?;
        let avatar = entities.avatar_of(client);
        if let Some(id) = avatar {
            entities.despawn(id);
            tracing::info!(?client, "client left");
        }
        Ok(avatar)
    }

    pub fn is_world_built(&self) -> Result<bool, SessionError> {
        Ok(self.world()?.is_built())
    }

    /// Read-only copy of the world solid for observers.
    pub fn world_snapshot(&self) -> Result<Option<SolidSnapshot>, SessionError> {
        Ok(match &*self.world()? {
            WorldState::Built(built) => Some(built.solid.snapshot()),
            WorldState::Uninitialized => None,
        })
    }

    pub fn house_sites(&self) -> Result<Vec<HouseSite>, SessionError> {
        Ok(match &*self.world()? {
            WorldState::Built(built) => built.sites.clone(),
            WorldState::Uninitialized => Vec::new(),
        })
    }

    pub fn avatar_transform(&self, client: ClientId) -> Result<Option<Transform>, SessionError> {
        let entities = self.entities()?;
        Ok(entities
            .avatar_of(client)
            .and_then(|id| entities.get(id))
            .map(|d| d.transform))
    }

    pub fn avatar_count(&self) -> Result<usize, SessionError> {
        Ok(self.entities()?.avatar_count())
    }

    /// Entity changes since the last drain, for replication to observers.
    pub fn drain_entity_events(&self) -> Result<Vec<EntityEvent>, SessionError> {
        Ok(self.entities()?.drain_events())
    }

    fn world(&self) -> Result<MutexGuard<'_, WorldState>, SessionError> {
        self.world
            .lock()
            .map_err(|_| SessionError::LockPoisoned("world"))
    }

    fn entities(&self) -> Result<MutexGuard<'_, EntityRegistry>, SessionError> {
        self.entities
            .lock()
            .map_err(|_| SessionError::LockPoisoned("entities"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn server() -> GameSession {
        GameSession::new(Authority::Server, Arc::new(AssetStore::builtin()))
    }

    #[test]
    fn first_join_builds_world_once() {
        let session = server();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(!session.is_world_built().unwrap());
        assert!(session.world_snapshot().unwrap().is_none());

        let first = session.client_joined(ClientId(1), &mut rng).unwrap();
        let snap = session.world_snapshot().unwrap().unwrap();
        let second = session.client_joined(ClientId(2), &mut rng).unwrap();

        assert!(first.built_world);
        assert!(!second.built_world);
        assert_eq!(session.world_snapshot().unwrap().unwrap(), snap);
        assert_eq!(snap.additive_count(), 15);
        assert_eq!(session.house_sites().unwrap().len(), 14);
    }

    #[test]
    fn ensure_world_is_idempotent() {
        let session = server();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert!(session.ensure_world(&mut rng).unwrap());
        let ops = session.world_snapshot().unwrap().unwrap().ops.len();
        assert!(!session.ensure_world(&mut rng).unwrap());
        assert_eq!(session.world_snapshot().unwrap().unwrap().ops.len(), ops);
    }

    #[test]
    fn join_without_spawn_points_keeps_default_transform() {
        let session = server();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let outcome = session.client_joined(ClientId(9), &mut rng).unwrap();
        assert!(!outcome.placed_at_spawn);
        assert_eq!(outcome.transform, Transform::default());
        assert_eq!(
            session.avatar_transform(ClientId(9)).unwrap(),
            Some(Transform::default())
        );
    }

    #[test]
    fn join_places_avatar_above_a_spawn_point() {
        let session = server();
        let points = [Vec3::new(0.0, 0.0, 512.0), Vec3::new(1024.0, 0.0, 512.0)];
        for p in points {
            session
                .add_spawn_point(Transform::from_position(p))
                .unwrap();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for client in 0..10 {
            let outcome = session.client_joined(ClientId(client), &mut rng).unwrap();
            assert!(outcome.placed_at_spawn);
            let lowered = outcome.transform.position - Vec3::Z * SPAWN_CLEARANCE;
            assert!(points.contains(&lowered));
        }
        assert_eq!(session.avatar_count().unwrap(), 10);
    }

    #[test]
    fn rejoin_replaces_avatar() {
        let session = server();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let a = session.client_joined(ClientId(1), &mut rng).unwrap();
        let b = session.client_joined(ClientId(1), &mut rng).unwrap();
        assert_ne!(a.avatar, b.avatar);
        assert_eq!(session.avatar_count().unwrap(), 1);
    }

    #[test]
    fn leave_despawns_avatar() {
        let session = server();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let joined = session.client_joined(ClientId(1), &mut rng).unwrap();
        assert_eq!(session.client_left(ClientId(1)).unwrap(), Some(joined.avatar));
        assert_eq!(session.client_left(ClientId(1)).unwrap(), None);
        assert_eq!(session.avatar_count().unwrap(), 0);
        // The world outlives every client.
        assert!(session.is_world_built().unwrap());
    }

    #[test]
    fn join_events_are_recorded() {
        let session = server();
        session.add_spawn_point(Transform::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        session.client_joined(ClientId(1), &mut rng).unwrap();
        let events = session.drain_entity_events().unwrap();
        // spawn point, avatar spawn, respawn reset, placement
        assert_eq!(events.len(), 4);
        assert!(session.drain_entity_events().unwrap().is_empty());
    }

    #[test]
    fn concurrent_joins_build_exactly_once() {
        let session = server();
        session.add_spawn_point(Transform::default()).unwrap();

        let outcomes: Vec<JoinOutcome> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8u64)
                .map(|client| {
                    let session = &session;
                    s.spawn(move || {
                        let mut rng = ChaCha8Rng::seed_from_u64(client);
                        session.client_joined(ClientId(client), &mut rng).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(outcomes.iter().filter(|o| o.built_world).count(), 1);
        assert_eq!(session.avatar_count().unwrap(), 8);
        assert_eq!(session.world_snapshot().unwrap().unwrap().additive_count(), 15);
    }

    #[test]
    #[should_panic(expected = "non-authoritative")]
    fn client_side_build_panics() {
        let session = GameSession::new(Authority::Client, Arc::new(AssetStore::builtin()));
        let _ = session.ensure_world(&mut ChaCha8Rng::seed_from_u64(0));
    }

    #[test]
    fn empty_floor_range_fails_join_without_poisoning() {
        #[allow(clippy::reversed_empty_ranges)]
        let layout = WorldLayout {
            floors: 5..=2,
            ..WorldLayout::default()
        };
        let session =
            GameSession::with_layout(Authority::Server, Arc::new(AssetStore::builtin()), layout);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        for client in 0..2 {
            let err = session.client_joined(ClientId(client), &mut rng).unwrap_err();
            assert!(matches!(
                err,
                SessionError::World(csgworld_procgen::ProcgenError::InvalidLayout(_))
            ));
        }
        assert!(!session.is_world_built().unwrap());
        assert!(session.world_snapshot().unwrap().is_none());
    }

    #[test]
    fn build_failure_leaves_world_uninitialized() {
        let session = GameSession::new(Authority::Server, Arc::new(AssetStore::new()));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = session.client_joined(ClientId(1), &mut rng).unwrap_err();
        assert!(matches!(err, SessionError::World(_)));
        assert!(!session.is_world_built().unwrap());
        assert_eq!(session.avatar_count().unwrap(), 0);
    }
}
