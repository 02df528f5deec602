//! Game entity system with typed integer IDs
//!
//! Permanents, cards, players and stack items all get stable integer IDs
//! from a single per-game counter. References between game objects (a
//! blocker's attacker, a permanent's owner) are stored as IDs and looked
//! up through the owning store, never as aliased pointers, so removing an
//! object from a collection cannot invalidate other live references.

use crate::Result;
use crate::SimError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed integer ID for game entities
///
/// The phantom parameter prevents mixing up IDs of different entity kinds
/// (a `PermanentId` is not a `PlayerId`). IDs are stable for the duration
/// of a game.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound(serialize = "", deserialize = ""))]
pub struct EntityId<T> {
    value: u32,
    #[serde(skip)]
    _marker: PhantomData<fn() -> T>,
}

impl<T> EntityId<T> {
    pub fn new(value: u32) -> Self {
        EntityId {
            value,
            _marker: PhantomData,
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.value
    }
}

// Manual impls: derive would add unwanted `T: Trait` bounds.
impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> PartialOrd for EntityId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for EntityId<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> Hash for EntityId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.value)
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Marker types for the ID namespaces
#[derive(Debug, Clone, Copy)]
pub struct PlayerMarker;
#[derive(Debug, Clone, Copy)]
pub struct CardMarker;
#[derive(Debug, Clone, Copy)]
pub struct PermanentMarker;
#[derive(Debug, Clone, Copy)]
pub struct StackMarker;

pub type PlayerId = EntityId<PlayerMarker>;
pub type CardId = EntityId<CardMarker>;
pub type PermanentId = EntityId<PermanentMarker>;
pub type StackId = EntityId<StackMarker>;

/// Arena of entities with stable IDs, indexed by ID
///
/// Uses FxHashMap for fast hashing of integer keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct EntityStore<T> {
    entities: FxHashMap<u32, T>,
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        EntityStore {
            entities: FxHashMap::default(),
        }
    }

    pub fn insert<M>(&mut self, id: EntityId<M>, entity: T) {
        self.entities.insert(id.as_u32(), entity);
    }

    pub fn get<M>(&self, id: EntityId<M>) -> Result<&T> {
        self.entities
            .get(&id.as_u32())
            .ok_or(SimError::EntityNotFound(id.as_u32()))
    }

    pub fn get_mut<M>(&mut self, id: EntityId<M>) -> Result<&mut T> {
        self.entities
            .get_mut(&id.as_u32())
            .ok_or(SimError::EntityNotFound(id.as_u32()))
    }

    pub fn contains<M>(&self, id: EntityId<M>) -> bool {
        self.entities.contains_key(&id.as_u32())
    }

    pub fn remove<M>(&mut self, id: EntityId<M>) -> Option<T> {
        self.entities.remove(&id.as_u32())
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.entities.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_ids_distinct() {
        let pid: PlayerId = EntityId::new(1);
        let cid: CardId = EntityId::new(1);
        assert_eq!(pid.as_u32(), cid.as_u32());
        // pid == cid would not compile: the types differ.
    }

    #[test]
    fn test_entity_store() {
        let mut store: EntityStore<String> = EntityStore::new();
        let id1: CardId = EntityId::new(0);
        let id2: CardId = EntityId::new(1);

        store.insert(id1, "Test1".to_string());
        store.insert(id2, "Test2".to_string());

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(id1).unwrap(), "Test1");
        assert_eq!(store.get(id2).unwrap(), "Test2");
        assert!(store.get(CardId::new(999)).is_err());

        assert!(store.remove(id1).is_some());
        assert!(!store.contains(id1));
    }
}
