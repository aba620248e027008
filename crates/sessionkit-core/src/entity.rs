//! Entities and the references used to persist them.
//!
//! An [`Entity`] is a loosely-typed record: a type tag, an optional uid (absent
//! until the backend saves it), the partition it is stored in, and a JSON
//! object of properties. Reference properties hold the referenced entity's
//! uid as a plain integer.

use std::{fmt, num::NonZeroU64};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON object holding an entity's properties.
pub type Properties = serde_json::Map<String, Value>;

// ─── Uid ─────────────────────────────────────────────────────────────────────

/// The identifier a backend assigns to a saved entity. Always positive.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Uid(NonZeroU64);

impl Uid {
  /// Returns `None` for zero.
  pub fn new(value: u64) -> Option<Self> { NonZeroU64::new(value).map(Self) }

  pub fn get(self) -> u64 { self.0.get() }
}

impl From<NonZeroU64> for Uid {
  fn from(value: NonZeroU64) -> Self { Self(value) }
}

impl fmt::Display for Uid {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── EntityType ──────────────────────────────────────────────────────────────

/// A type tag, e.g. `"Product"`. Only tags known to the
/// [`Registry`](crate::registry::Registry) are accepted by the resolvers.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
  pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for EntityType {
  fn from(name: &str) -> Self { Self(name.to_owned()) }
}

impl From<String> for EntityType {
  fn from(name: String) -> Self { Self(name) }
}

impl fmt::Display for EntityType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "\"{}\"", self.0)
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
  pub entity_type: EntityType,
  /// `None` until the entity has been saved by a backend.
  pub uid:         Option<Uid>,
  /// Storage partition; default lookups only search the backend's
  /// configured partitions.
  pub partition:   u64,
  pub properties:  Properties,
}

impl Entity {
  /// An unsaved entity in partition 0 with no properties.
  pub fn new(entity_type: impl Into<EntityType>) -> Self {
    Self {
      entity_type: entity_type.into(),
      uid:         None,
      partition:   0,
      properties:  Properties::new(),
    }
  }

  pub fn with_uid(mut self, uid: Uid) -> Self {
    self.uid = Some(uid);
    self
  }

  pub fn in_partition(mut self, partition: u64) -> Self {
    self.partition = partition;
    self
  }

  pub fn with_property(
    mut self,
    name: impl Into<String>,
    value: impl Into<Value>,
  ) -> Self {
    self.properties.insert(name.into(), value.into());
    self
  }

  pub fn property(&self, name: &str) -> Option<&Value> {
    self.properties.get(name)
  }

  /// The wire reference for this entity, or `None` if it was never saved.
  pub fn to_ref(&self) -> Option<EntityRef> {
    self.uid.map(|uid| EntityRef {
      entity_type: self.entity_type.clone(),
      uid,
    })
  }
}

// ─── EntityRef ───────────────────────────────────────────────────────────────

/// One element of the session wire format: `{"class": "...", "uid": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
  #[serde(rename = "class")]
  pub entity_type: EntityType,
  pub uid:         Uid,
}
