//! [`SqliteBackend`] — the SQLite implementation of [`EntityLookup`] and
//! [`SessionStore`].

use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};
use serde_json::Value;
use sessionkit_core::{
  entity::{Entity, EntityType},
  identity::UserId,
  lookup::{Criterion, EntityLookup, LookupQuery, Matches},
  registry::Registry,
  session::SessionStore,
};
use tracing::debug;

use crate::{
  Error, Result, Settings,
  encode::{
    RawEntity, decode_dt, decode_uid, encode_dt, encode_json_value,
    encode_partition, encode_properties, encode_uid, encode_user,
    json_type_name, property_path,
  },
  schema::SCHEMA,
};

// ─── Backend ─────────────────────────────────────────────────────────────────

/// Entities and session payloads in a single SQLite file.
///
/// Given a [`Registry`], uids are unique across each type hierarchy; without
/// one every type is its own hierarchy.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteBackend {
  conn:       tokio_rusqlite::Connection,
  /// Partitions searched by lookups that respect partitions.
  partitions: Arc<[u64]>,
  registry:   Option<Arc<Registry>>,
}

impl SqliteBackend {
  /// Open (or create) a store at `path` and run schema initialisation.
  /// Lookups search partition 0 until [`with_partitions`](Self::with_partitions)
  /// says otherwise.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  /// Open the store described by `settings`.
  pub async fn from_settings(settings: &Settings) -> Result<Self> {
    let backend = Self::open(settings.resolved_store_path()).await?;
    Ok(backend.with_partitions(settings.storage_partitions.clone()))
  }

  pub fn with_partitions(mut self, partitions: Vec<u64>) -> Self {
    self.partitions = partitions.into();
    self
  }

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

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self {
      conn,
      partitions: Arc::from([0]),
      registry: None,
    })
  }

  /// Save a new entity. Without a uid the next free uid in its type
  /// hierarchy is assigned; with one, the uid must not be taken yet.
  pub async fn add_entity(&self, mut entity: Entity) -> Result<Entity> {
    let root_type = self.root_of(&entity.entity_type).as_str().to_owned();
    let entity_type = entity.entity_type.as_str().to_owned();
    let requested = entity.uid.map(encode_uid).transpose()?;
    let partition = encode_partition(entity.partition)?;
    let properties = encode_properties(&entity.properties)?;

    let inserted: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let uid: i64 = match requested {
          Some(uid) => {
            let taken = tx
              .query_row(
                "SELECT 1 FROM entities WHERE root_type = ?1 AND uid = ?2",
                rusqlite::params![root_type, uid],
                |_| Ok(true),
              )
              .optional()?
              .unwrap_or(false);
            if taken {
              return Ok(None);
            }
            uid
          }
          None => tx.query_row(
            "SELECT COALESCE(MAX(uid), 0) + 1 FROM entities WHERE root_type = ?1",
            rusqlite::params![root_type],
            |r| r.get(0),
          )?,
        };
        tx.execute(
          "INSERT INTO entities
             (root_type, entity_type, uid, partition_id, properties)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![root_type, entity_type, uid, partition, properties],
        )?;
        tx.commit()?;
        Ok(Some(uid))
      })
      .await?;

    match inserted {
      Some(uid) => {
        entity.uid = Some(decode_uid(uid)?);
        Ok(entity)
      }
      None => Err(Error::DuplicateEntity {
        uid:         entity.uid.ok_or_else(|| {
          Error::CorruptRow("duplicate reported for an entity without uid".into())
        })?,
        entity_type: entity.entity_type,
      }),
    }
  }

  /// When the payload for `(user, scope)` was last written.
  pub async fn updated_at(
    &self,
    user: UserId,
    scope: &str,
  ) -> Result<Option<DateTime<Utc>>> {
    let user_id = encode_user(user)?;
    let scope = scope.to_owned();

    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT updated_at FROM session_data WHERE user_id = ?1 AND scope = ?2",
              rusqlite::params![user_id, scope],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.as_deref().map(decode_dt).transpose()
  }
}

// ─── EntityLookup impl ───────────────────────────────────────────────────────

impl EntityLookup for SqliteBackend {
  type Error = Error;

  async fn execute(&self, query: &LookupQuery) -> Result<Matches> {
    let types = vec!["?"; query.entity_types.len()].join(", ");
    let mut sql = format!(
      "SELECT entity_type, uid, partition_id, properties
       FROM entities
       WHERE entity_type IN ({types})"
    );
    let mut params: Vec<SqlValue> = query
      .entity_types
      .iter()
      .map(|ty| SqlValue::Text(ty.as_str().to_owned()))
      .collect();

    match &query.criterion {
      Criterion::Uid(uid) => {
        sql.push_str(" AND uid = ?");
        params.push(SqlValue::Integer(encode_uid(*uid)?));
      }
      Criterion::Equals { property, value } => {
        let path = property_path(property)?;
        // The type check keeps equality as strict as comparing JSON values.
        sql.push_str(" AND json_type(properties, ?) = ?");
        params.push(SqlValue::Text(path.clone()));
        params.push(SqlValue::Text(json_type_name(value).to_owned()));
        if !matches!(value, Value::Null | Value::Bool(_)) {
          sql.push_str(" AND json_extract(properties, ?) = ?");
          params.push(SqlValue::Text(path));
          params.push(encode_json_value(value));
        }
      }
    }

    if query.respect_partitions {
      let placeholders = vec!["?"; self.partitions.len()].join(", ");
      sql.push_str(&format!(" AND partition_id IN ({placeholders})"));
      for partition in self.partitions.iter() {
        params.push(SqlValue::Integer(encode_partition(*partition)?));
      }
    }

    // LIMIT -1 is unbounded in SQLite.
    sql.push_str(" ORDER BY uid LIMIT ?");
    let limit = query
      .limit
      .map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
    params.push(SqlValue::Integer(limit));

    let raws: Vec<RawEntity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawEntity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    debug!(entity_type = %query.entity_type, matches = raws.len(), "executed lookup");
    raws.into_iter().map(RawEntity::into_entity).collect()
  }
}

// ─── SessionStore impl ───────────────────────────────────────────────────────

impl SessionStore for SqliteBackend {
  type Error = Error;

  async fn get(&self, user: UserId, scope: &str) -> Result<Option<String>> {
    let user_id = encode_user(user)?;
    let scope = scope.to_owned();

    let payload = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT payload FROM session_data WHERE user_id = ?1 AND scope = ?2",
              rusqlite::params![user_id, scope],
              |r| r.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(payload)
  }

  async fn set(&self, user: UserId, scope: &str, payload: String) -> Result<()> {
    let user_id = encode_user(user)?;
    let scope = scope.to_owned();
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO session_data (user_id, scope, payload, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (user_id, scope)
           DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
          rusqlite::params![user_id, scope, payload, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
