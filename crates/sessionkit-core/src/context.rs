//! [`Context`] — everything a resolver needs for one request.

use std::sync::Arc;

use crate::{
  Error, Result,
  identity::{IdentityProvider, UserId},
  lookup::{EntityLookup, LookupQuery, Matches},
  registry::Registry,
  session::SessionStore,
};

/// Backends, registry and identity for the current request.
///
/// Cloning is cheap — the backends and registry are reference-counted.
pub struct Context<L, S> {
  lookup:   Arc<L>,
  sessions: Arc<S>,
  registry: Arc<Registry>,
  identity: Option<UserId>,
}

impl<L, S> Clone for Context<L, S> {
  fn clone(&self) -> Self {
    Self {
      lookup:   Arc::clone(&self.lookup),
      sessions: Arc::clone(&self.sessions),
      registry: Arc::clone(&self.registry),
      identity: self.identity,
    }
  }
}

impl<L, S> Context<L, S>
where
  L: EntityLookup,
  S: SessionStore,
{
  /// Capture the identity reported by `identity` for the rest of the request.
  pub fn new(
    lookup: Arc<L>,
    sessions: Arc<S>,
    registry: Arc<Registry>,
    identity: &impl IdentityProvider,
  ) -> Self {
    Self {
      lookup,
      sessions,
      registry,
      identity: identity.current_user(),
    }
  }

  pub fn identity(&self) -> Option<UserId> { self.identity }

  pub fn registry(&self) -> &Registry { &self.registry }

  pub(crate) fn require_identity(&self) -> Result<UserId> {
    self.identity.ok_or(Error::NoActiveSession)
  }

  pub(crate) async fn lookup(&self, query: &LookupQuery) -> Result<Matches> {
    self
      .lookup
      .execute(query)
      .await
      .map_err(|e| Error::Lookup(Box::new(e)))
  }

  pub(crate) async fn load_session(
    &self,
    user: UserId,
    scope: &str,
  ) -> Result<Option<String>> {
    self
      .sessions
      .get(user, scope)
      .await
      .map_err(|e| Error::Session(Box::new(e)))
  }

  pub(crate) async fn store_session(
    &self,
    user: UserId,
    scope: &str,
    payload: String,
  ) -> Result<()> {
    self
      .sessions
      .set(user, scope, payload)
      .await
      .map_err(|e| Error::Session(Box::new(e)))
  }
}
