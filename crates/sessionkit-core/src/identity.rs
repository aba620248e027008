//! The authenticated user of the current request.

use std::{fmt, num::NonZeroU64};

use serde::{Deserialize, Serialize};

use crate::entity::Uid;

/// Identifier of the logged-in user. Zero is never a valid identity.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(NonZeroU64);

impl UserId {
  pub fn new(value: u64) -> Option<Self> { NonZeroU64::new(value).map(Self) }

  pub fn get(self) -> u64 { self.0.get() }
}

impl From<UserId> for Uid {
  fn from(user: UserId) -> Self { Uid::from(user.0) }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Supplies the identity of the current request, if anyone is logged in.
///
/// Implemented by whatever owns the request lifecycle (an auth extractor, a
/// session cookie decoder). `Option<UserId>` and `UserId` implement it
/// directly for callers that already know the answer.
pub trait IdentityProvider {
  fn current_user(&self) -> Option<UserId>;
}

impl IdentityProvider for Option<UserId> {
  fn current_user(&self) -> Option<UserId> { *self }
}

impl IdentityProvider for UserId {
  fn current_user(&self) -> Option<UserId> { Some(*self) }
}
