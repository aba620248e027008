//! [`SubjectResolver`] — load the one entity that points at the current user.
//!
//! ```rust,ignore
//! let account = SubjectResolver::for_property(&ctx, "Account", "owner")?
//!   .resolve()
//!   .await?;
//! ```

use serde_json::Value;
use tracing::debug;

use crate::{
  Error, Result,
  context::Context,
  entity::Entity,
  lookup::{EntityLookup, LookupQuery},
  registry::Relation,
  session::SessionStore,
};

pub struct SubjectResolver<L, S> {
  ctx:      Context<L, S>,
  relation: Relation,
}

impl<L, S> SubjectResolver<L, S>
where
  L: EntityLookup,
  S: SessionStore,
{
  pub fn new(ctx: &Context<L, S>, relation: Relation) -> Self {
    Self { ctx: ctx.clone(), relation }
  }

  /// Build the [`Relation`] against the context's registry and wrap it.
  pub fn for_property(
    ctx: &Context<L, S>,
    subject_type: &str,
    property: &str,
  ) -> Result<Self> {
    let relation = Relation::new(ctx.registry(), subject_type, property)?;
    Ok(Self::new(ctx, relation))
  }

  pub fn relation(&self) -> &Relation { &self.relation }

  /// The unique subject whose relation property holds the current user's id.
  ///
  /// More than one match means the one-to-one assignment is broken and is
  /// reported as [`Error::Ambiguous`] rather than picking one.
  pub async fn resolve(&self) -> Result<Entity> {
    let user = self.ctx.require_identity()?;
    let subject_type = self.relation.subject_type();
    let query = LookupQuery::by_property(
      subject_type.clone(),
      self.relation.property(),
      Value::from(user.get()),
    )
    .with_subtypes(self.ctx.registry())
    .ignore_partitions();

    let matches = self.ctx.lookup(&query).await?;
    match matches.count() {
      0 => Err(Error::NotFound(subject_type.clone())),
      1 => {
        debug!(%user, entity_type = %subject_type, "resolved subject");
        matches
          .into_first()
          .ok_or_else(|| Error::NotFound(subject_type.clone()))
      }
      count => Err(Error::Ambiguous {
        entity_type: subject_type.clone(),
        count,
      }),
    }
  }
}
