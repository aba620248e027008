//! The `SessionStore` trait.

use std::future::Future;

use crate::identity::UserId;

/// Per-user string storage, namespaced by scope.
///
/// Nothing here locks: two requests for the same user writing the same scope
/// race, and the last write wins.
pub trait SessionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The payload last written for `(user, scope)`, or `None` if never set.
  fn get<'a>(
    &'a self,
    user: UserId,
    scope: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Overwrite the payload for `(user, scope)`.
  fn set<'a>(
    &'a self,
    user: UserId,
    scope: &'a str,
    payload: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
