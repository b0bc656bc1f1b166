use csgworld_common::{ClientId, EntityId, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A player's avatar, bound to one client for the life of its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub client: ClientId,
    /// How many times the avatar has been reset.
    pub respawns: u32,
}

impl Avatar {
    pub fn new(client: ClientId) -> Self {
        Self {
            client,
            respawns: 0,
        }
    }

    /// Reset avatar state. Returns the transform it resets to.
    pub fn respawn(&mut self) -> Transform {
        self.respawns += 1;
        Transform::default()
    }
}

/// What an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Pre-placed location new avatars are put at.
    SpawnPoint,
    Avatar(Avatar),
}

/// Per-entity data stored in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    pub kind: EntityKind,
    pub transform: Transform,
}

/// An event record produced by every mutation to the registry.
///
/// Observers replay these to mirror the entity set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityEvent {
    Spawned {
        id: EntityId,
        kind: EntityKind,
        transform: Transform,
    },
    Despawned {
        id: EntityId,
        kind: EntityKind,
    },
    TransformUpdated {
        id: EntityId,
        old: Transform,
        new: Transform,
    },
}

/// Session entities: spawn points and avatars.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<EntityId, EntityData>,
    event_log: Vec<EntityEvent>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities of any kind.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[EntityEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<EntityEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Spawn a new entity. Returns its id.
    pub fn spawn(&mut self, kind: EntityKind, transform: Transform) -> EntityId {
        let id = EntityId::new();
        self.entities.insert(id, EntityData { kind, transform });
        self.event_log.push(EntityEvent::Spawned {
            id,
            kind,
            transform,
        });
        id
    }

    /// Remove an entity. Returns the data if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityData> {
        let data = self.entities.remove(&id);
        if let Some(ref d) = data {
            self.event_log
                .push(EntityEvent::Despawned { id, kind: d.kind });
        }
        data
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    /// Update an entity's transform and log the change.
    pub fn set_transform(&mut self, id: EntityId, new: Transform) -> bool {
        if let Some(data) = self.entities.get_mut(&id) {
            let old = data.transform;
            data.transform = new;
            self.event_log
                .push(EntityEvent::TransformUpdated { id, old, new });
            true
        } else {
            false
        }
    }

    /// Run an avatar's reset. Returns false if `id` is not an avatar.
    pub fn respawn(&mut self, id: EntityId) -> bool {
        let reset = match self.entities.get_mut(&id) {
            Some(EntityData {
                kind: EntityKind::Avatar(avatar),
                ..
            }) => avatar.respawn(),
            _ => return false,
        };
        self.set_transform(id, reset)
    }

    /// Transforms of every spawn point, in id order.
    pub fn spawn_points(&self) -> Vec<Transform> {
        self.entities
            .values()
            .filter(|d| d.kind == EntityKind::SpawnPoint)
            .map(|d| d.transform)
            .collect()
    }

    /// The avatar currently bound to `client`, if any.
    pub fn avatar_of(&self, client: ClientId) -> Option<EntityId> {
        self.entities.iter().find_map(|(id, d)| match d.kind {
            EntityKind::Avatar(a) if a.client == client => Some(*id),
            _ => None,
        })
    }

    pub fn avatar_count(&self) -> usize {
        self.entities
            .values()
            .filter(|d| matches!(d.kind, EntityKind::Avatar(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn registry_starts_empty() {
        let r = EntityRegistry::new();
        assert_eq!(r.entity_count(), 0);
        assert!(r.spawn_points().is_empty());
    }

    #[test]
    fn spawn_and_despawn_log_events() {
        let mut r = EntityRegistry::new();
        let id = r.spawn(EntityKind::SpawnPoint, Transform::default());
        assert!(r.get(id).is_some());
        assert!(r.despawn(id).is_some());
        assert!(r.despawn(id).is_none());
        assert_eq!(r.entity_count(), 0);
        assert_eq!(r.events().len(), 2);
    }

    #[test]
    fn spawn_points_exclude_avatars() {
        let mut r = EntityRegistry::new();
        r.spawn(
            EntityKind::SpawnPoint,
            Transform::from_position(Vec3::new(1.0, 0.0, 0.0)),
        );
        r.spawn(
            EntityKind::Avatar(Avatar::new(ClientId(1))),
            Transform::default(),
        );
        assert_eq!(r.spawn_points().len(), 1);
        assert_eq!(r.avatar_count(), 1);
    }

    #[test]
    fn respawn_resets_avatar_transform() {
        let mut r = EntityRegistry::new();
        let id = r.spawn(
            EntityKind::Avatar(Avatar::new(ClientId(3))),
            Transform::from_position(Vec3::splat(9.0)),
        );
        assert!(r.respawn(id));
        let data = r.get(id).unwrap();
        assert_eq!(data.transform, Transform::default());
        assert!(matches!(data.kind, EntityKind::Avatar(a) if a.respawns == 1));
    }

    #[test]
    fn respawn_ignores_spawn_points() {
        let mut r = EntityRegistry::new();
        let id = r.spawn(EntityKind::SpawnPoint, Transform::default());
        assert!(!r.respawn(id));
        assert_eq!(r.events().len(), 1);
    }

    #[test]
    fn avatar_lookup_by_client() {
        let mut r = EntityRegistry::new();
        let a = r.spawn(
            EntityKind::Avatar(Avatar::new(ClientId(1))),
            Transform::default(),
        );
        let b = r.spawn(
            EntityKind::Avatar(Avatar::new(ClientId(2))),
            Transform::default(),
        );
        assert_eq!(r.avatar_of(ClientId(1)), Some(a));
        assert_eq!(r.avatar_of(ClientId(2)), Some(b));
        assert_eq!(r.avatar_of(ClientId(3)), None);
    }

    #[test]
    fn drain_events_clears_log() {
        let mut r = EntityRegistry::new();
        let id = r.spawn(EntityKind::SpawnPoint, Transform::default());
        r.set_transform(id, Transform::from_position(Vec3::X));
        let events = r.drain_events();
        assert_eq!(events.len(), 2);
        assert!(r.events().is_empty());
    }
}
