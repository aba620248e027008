//! Encoding and decoding helpers between sessionkit types and the plain
//! representations stored in SQLite columns.
//!
//! Uids, partitions and user ids are stored as signed integers, properties as
//! a compact JSON object, timestamps as RFC 3339 strings.

use chrono::{DateTime, Utc};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use sessionkit_core::{
  entity::{Entity, EntityType, Properties, Uid},
  identity::UserId,
};

use crate::{Error, Result};

// ─── Integers ────────────────────────────────────────────────────────────────

fn to_sql_int(value: u64) -> Result<i64> {
  i64::try_from(value).map_err(|_| Error::OutOfRange(value))
}

pub fn encode_uid(uid: Uid) -> Result<i64> { to_sql_int(uid.get()) }

pub fn decode_uid(raw: i64) -> Result<Uid> {
  u64::try_from(raw)
    .ok()
    .and_then(Uid::new)
    .ok_or_else(|| Error::CorruptRow(format!("invalid uid {raw}")))
}

pub fn encode_partition(partition: u64) -> Result<i64> { to_sql_int(partition) }

pub fn decode_partition(raw: i64) -> Result<u64> {
  u64::try_from(raw)
    .map_err(|_| Error::CorruptRow(format!("invalid partition {raw}")))
}

pub fn encode_user(user: UserId) -> Result<i64> { to_sql_int(user.get()) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Properties ──────────────────────────────────────────────────────────────

pub fn encode_properties(properties: &Properties) -> Result<String> {
  Ok(serde_json::to_string(properties)?)
}

pub fn decode_properties(s: &str) -> Result<Properties> {
  Ok(serde_json::from_str(s)?)
}

/// `json_extract` path for a top-level property. The name is quoted, which
/// covers every key except those containing `"`.
pub fn property_path(property: &str) -> Result<String> {
  if property.contains('"') {
    return Err(Error::UnqueryableProperty(property.to_owned()));
  }
  Ok(format!("$.\"{property}\""))
}

/// What `json_type` reports for `value`. Matching on it keeps `true` and
/// `1.0` from comparing equal to `1`.
pub fn json_type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(true) => "true",
    Value::Bool(false) => "false",
    Value::Number(n) if n.is_f64() => "real",
    Value::Number(_) => "integer",
    Value::String(_) => "text",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

/// Bind a JSON value so it compares equal to what `json_extract` returns
/// for the same value.
pub fn encode_json_value(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
    Value::Number(n) => match (n.as_i64(), n.as_f64()) {
      (Some(i), _) => SqlValue::Integer(i),
      (None, Some(f)) => SqlValue::Real(f),
      (None, None) => SqlValue::Text(n.to_string()),
    },
    Value::String(s) => SqlValue::Text(s.clone()),
    other => SqlValue::Text(other.to_string()),
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// An `entities` row as read from SQLite, before validation.
pub struct RawEntity {
  pub entity_type:  String,
  pub uid:          i64,
  pub partition_id: i64,
  pub properties:   String,
}

impl RawEntity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entity_type:  row.get(0)?,
      uid:          row.get(1)?,
      partition_id: row.get(2)?,
      properties:   row.get(3)?,
    })
  }

  pub fn into_entity(self) -> Result<Entity> {
    Ok(Entity {
      entity_type: EntityType::from(self.entity_type),
      uid:         Some(decode_uid(self.uid)?),
      partition:   decode_partition(self.partition_id)?,
      properties:  decode_properties(&self.properties)?,
    })
  }
}
