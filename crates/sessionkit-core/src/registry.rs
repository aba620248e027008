//! The registry of known entity types and the relations between them.
//!
//! Types are declared up front with their parent (for subtyping) and their
//! properties. Everything a resolver needs to know about a type is checked
//! once, when the type is registered or a [`Relation`] is built, rather than
//! on every call.

use std::{
  collections::{BTreeMap, HashMap},
  fmt,
};

use crate::{Error, Result, entity::EntityType};

// ─── Property types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyType {
  /// Any non-reference value.
  Scalar,
  /// Holds the uid of an entity of the given type.
  Reference(EntityType),
}

impl fmt::Display for PropertyType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Scalar => f.write_str("scalar"),
      Self::Reference(target) => write!(f, "reference to {target}"),
    }
  }
}

// ─── Type descriptors ────────────────────────────────────────────────────────

/// Declaration of one entity type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
  pub name:       EntityType,
  pub parent:     Option<EntityType>,
  pub properties: BTreeMap<String, PropertyType>,
}

impl TypeDescriptor {
  pub fn new(name: impl Into<EntityType>) -> Self {
    Self {
      name:       name.into(),
      parent:     None,
      properties: BTreeMap::new(),
    }
  }

  pub fn extends(mut self, parent: impl Into<EntityType>) -> Self {
    self.parent = Some(parent.into());
    self
  }

  pub fn scalar(mut self, property: impl Into<String>) -> Self {
    self.properties.insert(property.into(), PropertyType::Scalar);
    self
  }

  pub fn reference(
    mut self,
    property: impl Into<String>,
    target: impl Into<EntityType>,
  ) -> Self {
    self
      .properties
      .insert(property.into(), PropertyType::Reference(target.into()));
    self
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// The closed set of entity types a deployment knows about, rooted at the
/// user type.
#[derive(Debug, Clone)]
pub struct Registry {
  user_type: EntityType,
  types:     HashMap<EntityType, TypeDescriptor>,
}

impl Registry {
  /// Create a registry whose user type is `user`.
  pub fn new(user: TypeDescriptor) -> Result<Self> {
    let mut registry = Self {
      user_type: user.name.clone(),
      types:     HashMap::new(),
    };
    registry.register(user)?;
    Ok(registry)
  }

  /// Builder-style [`Registry::register`].
  pub fn with(mut self, descriptor: TypeDescriptor) -> Result<Self> {
    self.register(descriptor)?;
    Ok(self)
  }

  /// Add a type. Its parent and every reference target must already be
  /// registered; a type may reference itself.
  pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<()> {
    if self.types.contains_key(&descriptor.name) {
      return Err(Error::DuplicateType(descriptor.name));
    }
    if let Some(parent) = &descriptor.parent
      && !self.types.contains_key(parent)
    {
      return Err(Error::UnknownParent {
        entity_type: descriptor.name.clone(),
        parent:      parent.clone(),
      });
    }
    for (property, ty) in &descriptor.properties {
      if let PropertyType::Reference(target) = ty
        && *target != descriptor.name
        && !self.types.contains_key(target)
      {
        return Err(Error::UnknownReferenceTarget {
          entity_type: descriptor.name.clone(),
          property:    property.clone(),
          target:      target.clone(),
        });
      }
    }
    self.types.insert(descriptor.name.clone(), descriptor);
    Ok(())
  }

  pub fn user_type(&self) -> &EntityType { &self.user_type }

  pub fn contains(&self, entity_type: &EntityType) -> bool {
    self.types.contains_key(entity_type)
  }

  pub fn get(&self, entity_type: &EntityType) -> Option<&TypeDescriptor> {
    self.types.get(entity_type)
  }

  /// Whether `entity_type` is `ancestor` or inherits from it. Unregistered
  /// types are never subtypes of anything.
  pub fn is_subtype_of(
    &self,
    entity_type: &EntityType,
    ancestor: &EntityType,
  ) -> bool {
    let mut current = self.types.get(entity_type);
    while let Some(descriptor) = current {
      if descriptor.name == *ancestor {
        return true;
      }
      current = descriptor
        .parent
        .as_ref()
        .and_then(|parent| self.types.get(parent));
    }
    false
  }

  /// `entity_type` followed by every registered type inheriting from it, in
  /// name order. An unregistered type yields only itself.
  pub fn descendants(&self, entity_type: &EntityType) -> Vec<EntityType> {
    let mut below: Vec<EntityType> = self
      .types
      .keys()
      .filter(|ty| *ty != entity_type && self.is_subtype_of(ty, entity_type))
      .cloned()
      .collect();
    below.sort();
    let mut all = Vec::with_capacity(below.len() + 1);
    all.push(entity_type.clone());
    all.extend(below);
    all
  }

  /// The topmost ancestor of `entity_type`. Uids are unique within the
  /// hierarchy below a root. Unregistered types are their own root.
  pub fn root_of<'a>(&'a self, entity_type: &'a EntityType) -> &'a EntityType {
    let mut root = entity_type;
    while let Some(parent) = self
      .types
      .get(root)
      .and_then(|descriptor| descriptor.parent.as_ref())
    {
      root = parent;
    }
    root
  }

  /// Look up a property on a type, including inherited ones.
  pub fn property(
    &self,
    entity_type: &EntityType,
    property: &str,
  ) -> Option<&PropertyType> {
    let mut current = self.types.get(entity_type);
    while let Some(descriptor) = current {
      if let Some(ty) = descriptor.properties.get(property) {
        return Some(ty);
      }
      current = descriptor
        .parent
        .as_ref()
        .and_then(|parent| self.types.get(parent));
    }
    None
  }

  pub fn ensure_entity_type(&self, entity_type: &EntityType) -> Result<()> {
    if self.contains(entity_type) {
      Ok(())
    } else {
      Err(Error::UnknownType(entity_type.clone()))
    }
  }

  /// Fails unless `entity_type` is the user type or a subtype of it.
  pub fn ensure_user_type(&self, entity_type: &EntityType) -> Result<()> {
    if self.is_subtype_of(entity_type, &self.user_type) {
      Ok(())
    } else {
      Err(Error::NotASubtype {
        entity_type: entity_type.clone(),
        expected:    self.user_type.clone(),
      })
    }
  }
}

// ─── Relation ────────────────────────────────────────────────────────────────

/// "Entities of `subject_type` point at their user through `property`."
///
/// Only constructible through [`Relation::new`], so a `Relation` in hand is
/// known to be valid for the registry it was built against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
  subject_type: EntityType,
  property:     String,
}

impl Relation {
  pub fn new(
    registry: &Registry,
    subject_type: impl Into<EntityType>,
    property: impl Into<String>,
  ) -> Result<Self> {
    let subject_type = subject_type.into();
    let property = property.into();
    registry.ensure_entity_type(&subject_type)?;

    match registry.property(&subject_type, &property) {
      None => Err(Error::UnknownProperty {
        entity_type: subject_type,
        property,
      }),
      Some(PropertyType::Reference(target))
        if registry.is_subtype_of(target, registry.user_type()) =>
      {
        Ok(Self { subject_type, property })
      }
      Some(other) => Err(Error::PropertyTypeMismatch {
        actual: other.to_string(),
        entity_type: subject_type,
        property,
        expected: registry.user_type().clone(),
      }),
    }
  }

  pub fn subject_type(&self) -> &EntityType { &self.subject_type }

  pub fn property(&self) -> &str { &self.property }
}
