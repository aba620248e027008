//! [`UserResolver`] — load the entity of the logged-in user.
//!
//! ```rust,ignore
//! let customer = UserResolver::for_type(&ctx, "Customer")?.resolve().await?;
//! ```

use tracing::debug;

use crate::{
  Error, Result,
  context::Context,
  entity::{Entity, EntityType},
  lookup::{EntityLookup, LookupQuery},
  session::SessionStore,
};

pub struct UserResolver<L, S> {
  ctx:         Context<L, S>,
  entity_type: EntityType,
}

impl<L, S> UserResolver<L, S>
where
  L: EntityLookup,
  S: SessionStore,
{
  /// Resolve as the registry's user type.
  pub fn new(ctx: &Context<L, S>) -> Self {
    Self {
      entity_type: ctx.registry().user_type().clone(),
      ctx:         ctx.clone(),
    }
  }

  /// Resolve as `entity_type`, which must be the user type or a subtype.
  pub fn for_type(
    ctx: &Context<L, S>,
    entity_type: impl Into<EntityType>,
  ) -> Result<Self> {
    let entity_type = entity_type.into();
    ctx.registry().ensure_user_type(&entity_type)?;
    Ok(Self { ctx: ctx.clone(), entity_type })
  }

  pub fn entity_type(&self) -> &EntityType { &self.entity_type }

  /// The current user as an entity of the configured type.
  ///
  /// The user record may live outside the partitions the backend normally
  /// searches, so the lookup ignores them. A record stored as a subtype of
  /// the configured type counts.
  pub async fn resolve(&self) -> Result<Entity> {
    let user = self.ctx.require_identity()?;
    let query = LookupQuery::by_uid(self.entity_type.clone(), user.into())
      .with_subtypes(self.ctx.registry())
      .ignore_partitions()
      .limit(1);

    let matches = self.ctx.lookup(&query).await?;
    if matches.count() == 1
      && let Some(entity) = matches.into_first()
    {
      debug!(%user, entity_type = %self.entity_type, "resolved user");
      return Ok(entity);
    }

    Err(Error::NotFound(self.entity_type.clone()))
  }
}
