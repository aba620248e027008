//! The `EntityLookup` trait and supporting query types.
//!
//! The trait is implemented by storage backends ([`crate::memory`],
//! `sessionkit-store-sqlite`). The resolvers only ever talk to this
//! abstraction.

use std::future::Future;

use serde_json::Value;

use crate::{
  entity::{Entity, EntityType, Uid},
  registry::Registry,
};

// ─── Query type ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
  /// Match the entity with this uid.
  Uid(Uid),
  /// Match entities whose property equals `value`.
  Equals { property: String, value: Value },
}

/// Parameters for [`EntityLookup::execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct LookupQuery {
  pub entity_type:        EntityType,
  /// Stored types that count as `entity_type`. Starts out as just
  /// `entity_type`; see [`with_subtypes`](Self::with_subtypes).
  pub entity_types:       Vec<EntityType>,
  pub criterion:          Criterion,
  /// When `true` (the default) only the backend's configured partitions are
  /// searched.
  pub respect_partitions: bool,
  pub limit:              Option<usize>,
}

impl LookupQuery {
  pub fn by_uid(entity_type: impl Into<EntityType>, uid: Uid) -> Self {
    let entity_type = entity_type.into();
    Self {
      entity_types:       vec![entity_type.clone()],
      entity_type,
      criterion:          Criterion::Uid(uid),
      respect_partitions: true,
      limit:              None,
    }
  }

  pub fn by_property(
    entity_type: impl Into<EntityType>,
    property: impl Into<String>,
    value: impl Into<Value>,
  ) -> Self {
    let entity_type = entity_type.into();
    Self {
      entity_types:       vec![entity_type.clone()],
      entity_type,
      criterion:          Criterion::Equals {
        property: property.into(),
        value:    value.into(),
      },
      respect_partitions: true,
      limit:              None,
    }
  }

  /// Also match entities stored as a registered subtype of `entity_type`.
  pub fn with_subtypes(mut self, registry: &Registry) -> Self {
    self.entity_types = registry.descendants(&self.entity_type);
    self
  }

  /// Search every partition.
  pub fn ignore_partitions(mut self) -> Self {
    self.respect_partitions = false;
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  /// Whether `entity` satisfies this query, given the backend's partitions.
  /// Backends that filter in memory share this instead of re-deriving it.
  pub fn matches(&self, entity: &Entity, partitions: &[u64]) -> bool {
    if !self.entity_types.contains(&entity.entity_type) {
      return false;
    }
    if self.respect_partitions && !partitions.contains(&entity.partition) {
      return false;
    }
    match &self.criterion {
      Criterion::Uid(uid) => entity.uid == Some(*uid),
      Criterion::Equals { property, value } => {
        entity.property(property) == Some(value)
      }
    }
  }
}

// ─── Result type ─────────────────────────────────────────────────────────────

/// The entities a query matched, in backend order (ascending uid).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Matches(Vec<Entity>);

impl Matches {
  pub fn new(entities: Vec<Entity>) -> Self { Self(entities) }

  pub fn count(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn first(&self) -> Option<&Entity> { self.0.first() }

  pub fn into_first(self) -> Option<Entity> { self.0.into_iter().next() }

  pub fn into_vec(self) -> Vec<Entity> { self.0 }
}

impl FromIterator<Entity> for Matches {
  fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Query access to persisted entities.
pub trait EntityLookup: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Run `query` and return every match, honouring its limit.
  fn execute<'a>(
    &'a self,
    query: &'a LookupQuery,
  ) -> impl Future<Output = Result<Matches, Self::Error>> + Send + 'a;
}
