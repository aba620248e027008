//! Error types for `sessionkit-core`.

use thiserror::Error;

use crate::entity::EntityType;

/// Coarse classification of an [`Error`].
///
/// Callers map these to user-facing behaviour: `Configuration` and
/// `Ambiguity` are internal errors, `NoActiveSession` usually means "send the
/// visitor to the login page", `NotFound` is an ordinary miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Configuration,
  NoActiveSession,
  NotFound,
  Ambiguity,
  Validation,
  Backend,
}

#[derive(Debug, Error)]
pub enum Error {
  // ── Configuration ───────────────────────────────────────────────────────
  #[error("unknown entity type {0}")]
  UnknownType(EntityType),

  #[error("type {entity_type} must be {expected} or one of its subtypes")]
  NotASubtype {
    entity_type: EntityType,
    expected:    EntityType,
  },

  #[error("property {property:?} could not be found on {entity_type}")]
  UnknownProperty {
    entity_type: EntityType,
    property:    String,
  },

  #[error("type of property {property:?} on {entity_type} must be a reference to {expected}, got {actual}")]
  PropertyTypeMismatch {
    entity_type: EntityType,
    property:    String,
    expected:    EntityType,
    actual:      String,
  },

  #[error("scope cannot be empty")]
  EmptyScope,

  #[error("entity type {0} is already registered")]
  DuplicateType(EntityType),

  #[error("parent type {parent} of {entity_type} is not registered")]
  UnknownParent {
    entity_type: EntityType,
    parent:      EntityType,
  },

  #[error("property {property:?} on {entity_type} references unregistered type {target}")]
  UnknownReferenceTarget {
    entity_type: EntityType,
    property:    String,
    target:      EntityType,
  },

  // ── Run-time conditions ─────────────────────────────────────────────────
  #[error("no user logged in")]
  NoActiveSession,

  #[error("could not resolve {0} for the current user")]
  NotFound(EntityType),

  #[error("user assignment to {entity_type} is ambiguous, having {count} candidates, expected just one")]
  Ambiguous {
    entity_type: EntityType,
    count:       usize,
  },

  // ── Validation ──────────────────────────────────────────────────────────
  #[error("entity {entity_type} at position {index} has no uid; save it before persisting")]
  UnsavedEntity {
    entity_type: EntityType,
    index:       usize,
  },

  #[error("position {0} holds no entity")]
  EmptySlot(usize),

  #[error("uid must be a positive integer, got {0}")]
  InvalidUid(String),

  #[error("malformed session entry: {0}")]
  MalformedEntry(String),

  // ── Backends ────────────────────────────────────────────────────────────
  #[error("lookup error: {0}")]
  Lookup(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("session store error: {0}")]
  Session(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::UnknownType(_)
      | Self::NotASubtype { .. }
      | Self::UnknownProperty { .. }
      | Self::PropertyTypeMismatch { .. }
      | Self::EmptyScope
      | Self::DuplicateType(_)
      | Self::UnknownParent { .. }
      | Self::UnknownReferenceTarget { .. } => ErrorKind::Configuration,
      Self::NoActiveSession => ErrorKind::NoActiveSession,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Ambiguous { .. } => ErrorKind::Ambiguity,
      Self::UnsavedEntity { .. }
      | Self::EmptySlot(_)
      | Self::InvalidUid(_)
      | Self::MalformedEntry(_) => ErrorKind::Validation,
      Self::Lookup(_) | Self::Session(_) | Self::Serialization(_) => {
        ErrorKind::Backend
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
