//! Error type for `sessionkit-store-sqlite`.

use sessionkit_core::entity::{EntityType, Uid};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("{entity_type} {uid} already exists")]
  DuplicateEntity { entity_type: EntityType, uid: Uid },

  /// SQLite integers are signed 64-bit.
  #[error("{0} does not fit in an SQLite integer")]
  OutOfRange(u64),

  /// JSON paths cannot address keys containing a double quote.
  #[error("property name {0:?} cannot be queried")]
  UnqueryableProperty(String),

  #[error("corrupt row: {0}")]
  CorruptRow(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
