//! [`SubjectCollection`] — an ordered list of entities kept in the user's
//! session.
//!
//! ```rust,ignore
//! let mut cart = SubjectCollection::open(&ctx, "shop/cart").await?;
//! cart.push_entity(product);
//! cart.persist().await?;
//! ```
//!
//! The session payload is a JSON array of `{"class": <type>, "uid": <n>}`
//! objects in collection order.

use std::{
  fmt,
  ops::{Deref, DerefMut},
};

use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
  Error, Result,
  context::Context,
  entity::{Entity, EntityRef, EntityType, Uid},
  lookup::{EntityLookup, LookupQuery},
  session::SessionStore,
};

/// A session-backed, ordered list of entity slots.
///
/// A slot is `None` when a stored reference no longer resolves; such slots
/// are kept so positions stay stable, but cannot be persisted.
///
/// Dereferences to the underlying `Vec`, so the usual push/index/remove/iter
/// operations apply. Nothing is saved implicitly: call
/// [`persist`](Self::persist).
pub struct SubjectCollection<L, S> {
  ctx:   Context<L, S>,
  scope: String,
  slots: Vec<Option<Entity>>,
}

impl<L, S> SubjectCollection<L, S>
where
  L: EntityLookup,
  S: SessionStore,
{
  /// Create a collection for `scope`. When `initial` is empty the stored
  /// contents are loaded straight away.
  pub async fn new(
    ctx: &Context<L, S>,
    scope: impl Into<String>,
    initial: Vec<Entity>,
  ) -> Result<Self> {
    let scope = scope.into();
    if scope.is_empty() {
      return Err(Error::EmptyScope);
    }
    let load = initial.is_empty();
    let mut collection = Self {
      ctx: ctx.clone(),
      scope,
      slots: initial.into_iter().map(Some).collect(),
    };
    if load {
      collection.retrieve().await?;
    }
    Ok(collection)
  }

  /// Shorthand for [`new`](Self::new) with no initial entities.
  pub async fn open(
    ctx: &Context<L, S>,
    scope: impl Into<String>,
  ) -> Result<Self> {
    Self::new(ctx, scope, Vec::new()).await
  }

  /// Replace the contents with what the session holds for this scope.
  ///
  /// A missing payload, or one that is not a JSON array, leaves the
  /// collection untouched. Entries must name a registered type and a positive
  /// uid. References that no longer resolve become `None` slots.
  pub async fn retrieve(&mut self) -> Result<()> {
    let user = self.ctx.require_identity()?;
    let Some(payload) = self.ctx.load_session(user, &self.scope).await? else {
      debug!(%user, scope = %self.scope, "no stored collection");
      return Ok(());
    };
    let Some(items) = decode_payload(&payload) else {
      debug!(%user, scope = %self.scope, "ignoring unreadable session payload");
      return Ok(());
    };

    let mut slots = Vec::with_capacity(items.len());
    for item in items {
      let reference = self.decode_entry(item)?;
      let query = LookupQuery::by_uid(reference.entity_type.clone(), reference.uid)
        .with_subtypes(self.ctx.registry())
        .ignore_partitions()
        .limit(1);
      let entity = self.ctx.lookup(&query).await?.into_first();
      if entity.is_none() {
        warn!(
          scope = %self.scope,
          entity_type = %reference.entity_type,
          uid = %reference.uid,
          "stored reference did not resolve"
        );
      }
      slots.push(entity);
    }

    debug!(%user, scope = %self.scope, len = slots.len(), "retrieved collection");
    self.slots = slots;
    Ok(())
  }

  /// Write the current contents to the session, replacing what was there.
  ///
  /// Fails without writing if any slot is empty or holds an unsaved entity.
  pub async fn persist(&self) -> Result<()> {
    let payload = self.to_json()?;
    let user = self.ctx.require_identity()?;
    self.ctx.store_session(user, &self.scope, payload).await?;
    debug!(%user, scope = %self.scope, len = self.slots.len(), "persisted collection");
    Ok(())
  }

  /// Empty the collection, then persist the empty list. The two steps are
  /// not atomic with respect to other requests.
  pub async fn purge(&mut self) -> Result<()> {
    self.slots.clear();
    self.persist().await
  }

  fn decode_entry(&self, item: Value) -> Result<EntityRef> {
    let entry = match item {
      Value::Object(entry) => entry,
      other => {
        return Err(Error::MalformedEntry(format!(
          "expected an object, got {other}"
        )));
      }
    };

    let entity_type = match entry.get("class") {
      Some(Value::String(class)) => EntityType::from(class.as_str()),
      Some(other) => {
        return Err(Error::MalformedEntry(format!(
          "\"class\" must be a string, got {other}"
        )));
      }
      None => return Err(Error::MalformedEntry("missing \"class\"".to_owned())),
    };
    self.ctx.registry().ensure_entity_type(&entity_type)?;

    let raw_uid = entry
      .get("uid")
      .ok_or_else(|| Error::MalformedEntry("missing \"uid\"".to_owned()))?;
    let uid = raw_uid
      .as_u64()
      .and_then(Uid::new)
      .ok_or_else(|| Error::InvalidUid(raw_uid.to_string()))?;

    Ok(EntityRef { entity_type, uid })
  }
}

impl<L, S> SubjectCollection<L, S> {
  pub fn scope(&self) -> &str { &self.scope }

  pub fn push_entity(&mut self, entity: Entity) { self.slots.push(Some(entity)); }

  /// The resolved entities, skipping empty slots.
  pub fn entities(&self) -> impl Iterator<Item = &Entity> {
    self.slots.iter().flatten()
  }

  /// The wire form of the collection.
  pub fn to_refs(&self) -> Result<Vec<EntityRef>> {
    self
      .slots
      .iter()
      .enumerate()
      .map(|(index, slot)| match slot {
        Some(entity) => entity.to_ref().ok_or_else(|| Error::UnsavedEntity {
          entity_type: entity.entity_type.clone(),
          index,
        }),
        None => Err(Error::EmptySlot(index)),
      })
      .collect()
  }

  /// [`to_refs`](Self::to_refs) encoded as the JSON session payload.
  pub fn to_json(&self) -> Result<String> {
    Ok(serde_json::to_string(&self.to_refs()?)?)
  }
}

/// `Some` only for a JSON array.
fn decode_payload(payload: &str) -> Option<Vec<Value>> {
  match serde_json::from_str(payload) {
    Ok(Value::Array(items)) => Some(items),
    _ => None,
  }
}

impl<L, S> Deref for SubjectCollection<L, S> {
  type Target = Vec<Option<Entity>>;

  fn deref(&self) -> &Self::Target { &self.slots }
}

impl<L, S> DerefMut for SubjectCollection<L, S> {
  fn deref_mut(&mut self) -> &mut Self::Target { &mut self.slots }
}

impl<L, S> Extend<Entity> for SubjectCollection<L, S> {
  fn extend<I: IntoIterator<Item = Entity>>(&mut self, iter: I) {
    self.slots.extend(iter.into_iter().map(Some));
  }
}

impl<L, S> Serialize for SubjectCollection<L, S> {
  fn serialize<Ser: Serializer>(
    &self,
    serializer: Ser,
  ) -> std::result::Result<Ser::Ok, Ser::Error> {
    let refs = self.to_refs().map_err(serde::ser::Error::custom)?;
    refs.serialize(serializer)
  }
}

impl<L, S> fmt::Debug for SubjectCollection<L, S> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SubjectCollection")
      .field("scope", &self.scope)
      .field("slots", &self.slots)
      .finish()
  }
}
