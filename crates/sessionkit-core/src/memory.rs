//! In-memory backend.
//!
//! Implements both [`EntityLookup`] and [`SessionStore`] over `RwLock`-guarded
//! maps. Intended for embedding and tests; share one instance between the
//! lookup and session slots of a [`Context`](crate::context::Context).
//!
//! Given a [`Registry`], uids are unique across each type hierarchy, so
//! `Customer#42` and `FrontendUser#42` cannot both exist. Without one every
//! type is its own hierarchy.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{Arc, RwLock},
};

use thiserror::Error;

use crate::{
  entity::{Entity, EntityType, Uid},
  identity::UserId,
  lookup::{EntityLookup, LookupQuery, Matches},
  registry::Registry,
  session::SessionStore,
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("poisoned lock: {0}")]
  Poisoned(&'static str),

  #[error("no uid left for {0}")]
  UidExhausted(EntityType),

  #[error("{entity_type} {uid} already exists")]
  DuplicateEntity { entity_type: EntityType, uid: Uid },
}

#[derive(Debug)]
pub struct MemoryBackend {
  partitions: Vec<u64>,
  registry:   Option<Arc<Registry>>,
  entities:   RwLock<BTreeMap<(EntityType, Uid), Entity>>,
  sessions:   RwLock<HashMap<(UserId, String), String>>,
}

impl Default for MemoryBackend {
  fn default() -> Self { Self::with_partitions(vec![0]) }
}

impl MemoryBackend {
  /// A backend whose default lookups search partition 0 only.
  pub fn new() -> Self { Self::default() }

  pub fn with_partitions(partitions: Vec<u64>) -> Self {
    Self {
      partitions,
      registry: None,
      entities: RwLock::new(BTreeMap::new()),
      sessions: RwLock::new(HashMap::new()),
    }
  }

  /// Assign and check uids per type hierarchy as declared in `registry`.
  pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
    self.registry = Some(registry);
    self
  }

  fn root_of<'a>(&'a self, entity_type: &'a EntityType) -> &'a EntityType {
    match &self.registry {
      Some(registry) => registry.root_of(entity_type),
      None => entity_type,
    }
  }

  /// Store `entity`, assigning the next free uid in its type hierarchy if it
  /// has none. Returns the stored entity.
  pub fn insert(&self, mut entity: Entity) -> Result<Entity, MemoryError> {
    let mut entities = self
      .entities
      .write()
      .map_err(|_| MemoryError::Poisoned("entities"))?;

    let root = self.root_of(&entity.entity_type);
    let mut taken = entities
      .keys()
      .filter(|(ty, _)| self.root_of(ty) == root)
      .map(|(_, uid)| *uid);

    let uid = match entity.uid {
      Some(uid) => {
        if taken.any(|other| other == uid) {
          return Err(MemoryError::DuplicateEntity {
            entity_type: entity.entity_type.clone(),
            uid,
          });
        }
        uid
      }
      None => taken
        .map(Uid::get)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .and_then(Uid::new)
        .ok_or_else(|| MemoryError::UidExhausted(entity.entity_type.clone()))?,
    };

    entity.uid = Some(uid);
    entities.insert((entity.entity_type.clone(), uid), entity.clone());
    Ok(entity)
  }
}

impl EntityLookup for MemoryBackend {
  type Error = MemoryError;

  async fn execute(&self, query: &LookupQuery) -> Result<Matches, MemoryError> {
    let entities = self
      .entities
      .read()
      .map_err(|_| MemoryError::Poisoned("entities"))?;

    let mut found: Vec<Entity> = entities
      .values()
      .filter(|entity| query.matches(entity, &self.partitions))
      .cloned()
      .collect();
    found.sort_by_key(|entity| entity.uid);
    found.truncate(query.limit.unwrap_or(usize::MAX));
    Ok(Matches::new(found))
  }
}

impl SessionStore for MemoryBackend {
  type Error = MemoryError;

  async fn get(&self, user: UserId, scope: &str) -> Result<Option<String>, MemoryError> {
    let sessions = self
      .sessions
      .read()
      .map_err(|_| MemoryError::Poisoned("sessions"))?;
    Ok(sessions.get(&(user, scope.to_owned())).cloned())
  }

  async fn set(
    &self,
    user: UserId,
    scope: &str,
    payload: String,
  ) -> Result<(), MemoryError> {
    let mut sessions = self
      .sessions
      .write()
      .map_err(|_| MemoryError::Poisoned("sessions"))?;
    sessions.insert((user, scope.to_owned()), payload);
    Ok(())
  }
}
