//! Behavioural tests for the resolvers and the session collection, run
//! against [`MemoryBackend`].

use std::sync::Arc;

use crate::{
  Error, ErrorKind,
  collection::SubjectCollection,
  context::Context,
  entity::{Entity, EntityRef, EntityType, Uid},
  identity::UserId,
  lookup::{EntityLookup, LookupQuery},
  memory::{MemoryBackend, MemoryError},
  registry::{PropertyType, Registry, Relation, TypeDescriptor},
  session::SessionStore,
  subject::SubjectResolver,
  user::UserResolver,
};

type Ctx = Context<MemoryBackend, MemoryBackend>;

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn registry() -> Registry {
  Registry::new(TypeDescriptor::new("FrontendUser").scalar("username"))
    .and_then(|r| r.with(TypeDescriptor::new("Customer").extends("FrontendUser")))
    .and_then(|r| r.with(TypeDescriptor::new("Product").scalar("title")))
    .and_then(|r| {
      r.with(
        TypeDescriptor::new("Account")
          .reference("owner", "FrontendUser")
          .scalar("label"),
      )
    })
    .and_then(|r| r.with(TypeDescriptor::new("PremiumAccount").extends("Account")))
    .and_then(|r| r.with(TypeDescriptor::new("Profile").reference("customer", "Customer")))
    .and_then(|r| r.with(TypeDescriptor::new("Review").reference("product", "Product")))
    .expect("registry")
}

fn uid(value: u64) -> Uid { Uid::new(value).unwrap() }

fn backend() -> Arc<MemoryBackend> {
  Arc::new(MemoryBackend::new().with_registry(Arc::new(registry())))
}

fn context(backend: &Arc<MemoryBackend>, user: Option<u64>) -> Ctx {
  Context::new(
    Arc::clone(backend),
    Arc::clone(backend),
    Arc::new(registry()),
    &user.and_then(UserId::new),
  )
}

fn product(id: u64) -> Entity {
  Entity::new("Product")
    .with_uid(uid(id))
    .with_property("title", format!("Product {id}"))
}

fn user(id: u64) -> UserId { UserId::new(id).unwrap() }

// ─── Registry ────────────────────────────────────────────────────────────────

#[test]
fn registry_rejects_duplicate_type() {
  let err = registry()
    .with(TypeDescriptor::new("Product"))
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateType(_)));
  assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn registry_rejects_unknown_parent() {
  let err = registry()
    .with(TypeDescriptor::new("Admin").extends("Staff"))
    .unwrap_err();
  assert!(matches!(err, Error::UnknownParent { .. }));
}

#[test]
fn registry_rejects_unknown_reference_target() {
  let err = registry()
    .with(TypeDescriptor::new("Order").reference("warehouse", "Warehouse"))
    .unwrap_err();
  assert!(matches!(err, Error::UnknownReferenceTarget { ref property, .. } if property == "warehouse"));
}

#[test]
fn registry_allows_self_reference() {
  let registry = registry()
    .with(TypeDescriptor::new("Category").reference("parent", "Category"))
    .unwrap();
  assert!(registry.contains(&"Category".into()));
}

#[test]
fn subtype_checks_follow_parent_chain() {
  let r = registry();
  let user_type = r.user_type().clone();
  assert!(r.is_subtype_of(&"FrontendUser".into(), &user_type));
  assert!(r.is_subtype_of(&"Customer".into(), &user_type));
  assert!(!r.is_subtype_of(&"Product".into(), &user_type));
  assert!(!r.is_subtype_of(&"Ghost".into(), &"Ghost".into()));
}

#[test]
fn descendants_list_the_type_then_its_subtypes() {
  let r = registry();
  assert_eq!(
    r.descendants(&"FrontendUser".into()),
    vec![EntityType::from("FrontendUser"), EntityType::from("Customer")]
  );
  assert_eq!(
    r.descendants(&"Account".into()),
    vec![EntityType::from("Account"), EntityType::from("PremiumAccount")]
  );
  assert_eq!(r.descendants(&"Product".into()), vec![EntityType::from("Product")]);
  assert_eq!(r.descendants(&"Ghost".into()), vec![EntityType::from("Ghost")]);
}

#[test]
fn root_of_walks_to_the_top_ancestor() {
  let r = registry();
  let customer = EntityType::from("Customer");
  let ghost = EntityType::from("Ghost");
  assert_eq!(r.root_of(&customer), &EntityType::from("FrontendUser"));
  assert_eq!(r.root_of(r.user_type()), r.user_type());
  assert_eq!(r.root_of(&ghost), &ghost);
}

#[test]
fn inherited_properties_are_visible() {
  let r = registry();
  assert_eq!(
    r.property(&"PremiumAccount".into(), "owner"),
    Some(&PropertyType::Reference("FrontendUser".into()))
  );
  assert_eq!(r.property(&"Customer".into(), "username"), Some(&PropertyType::Scalar));
  assert_eq!(r.property(&"Product".into(), "owner"), None);
}

#[test]
fn relation_requires_registered_type() {
  let err = Relation::new(&registry(), "Basket", "owner").unwrap_err();
  assert!(matches!(err, Error::UnknownType(_)));
  assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn relation_requires_existing_property() {
  let err = Relation::new(&registry(), "Account", "holder").unwrap_err();
  assert!(matches!(err, Error::UnknownProperty { .. }));
  assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn relation_rejects_scalar_property() {
  let err = Relation::new(&registry(), "Account", "label").unwrap_err();
  assert!(matches!(err, Error::PropertyTypeMismatch { ref actual, .. } if actual == "scalar"));
}

#[test]
fn relation_rejects_reference_to_other_type() {
  let err = Relation::new(&registry(), "Review", "product").unwrap_err();
  assert!(matches!(err, Error::PropertyTypeMismatch { .. }));
  assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn relation_accepts_reference_to_user_subtype() {
  let relation = Relation::new(&registry(), "Profile", "customer").unwrap();
  assert_eq!(relation.subject_type(), &EntityType::from("Profile"));
  assert_eq!(relation.property(), "customer");
}

// ─── Memory backend ──────────────────────────────────────────────────────────

#[tokio::test]
async fn memory_insert_assigns_sequential_uids_per_type() {
  let b = MemoryBackend::new();
  let first = b.insert(Entity::new("Product")).unwrap();
  let second = b.insert(Entity::new("Product")).unwrap();
  let other = b.insert(Entity::new("Account")).unwrap();
  assert_eq!(first.uid, Some(uid(1)));
  assert_eq!(second.uid, Some(uid(2)));
  assert_eq!(other.uid, Some(uid(1)));
}

#[tokio::test]
async fn memory_insert_rejects_duplicate_uid() {
  let b = MemoryBackend::new();
  b.insert(product(7)).unwrap();
  assert!(b.insert(product(7)).is_err());
}

#[tokio::test]
async fn memory_uids_are_unique_per_hierarchy() {
  let b = backend();
  b.insert(Entity::new("FrontendUser").with_uid(uid(42))).unwrap();

  let err = b
    .insert(Entity::new("Customer").with_uid(uid(42)))
    .unwrap_err();
  assert!(matches!(err, MemoryError::DuplicateEntity { uid: u, .. } if u == uid(42)));

  let next = b.insert(Entity::new("Customer")).unwrap();
  assert_eq!(next.uid, Some(uid(43)));
  let product = b.insert(Entity::new("Product")).unwrap();
  assert_eq!(product.uid, Some(uid(1)));
}

#[tokio::test]
async fn memory_lookup_matches_subtypes_only_when_asked() {
  let b = backend();
  b.insert(account(42).with_uid(uid(2))).unwrap();
  b.insert(
    Entity::new("PremiumAccount")
      .with_uid(uid(1))
      .with_property("owner", 42u64),
  )
  .unwrap();

  let exact = LookupQuery::by_property("Account", "owner", 42u64);
  assert_eq!(b.execute(&exact).await.unwrap().count(), 1);

  let widened = exact.with_subtypes(&registry());
  let found = b.execute(&widened).await.unwrap().into_vec();
  let types: Vec<_> = found.iter().map(|e| e.entity_type.as_str()).collect();
  assert_eq!(types, vec!["PremiumAccount", "Account"]);
}

#[tokio::test]
async fn memory_property_equality_is_type_exact() {
  let b = backend();
  b.insert(Entity::new("Account").with_property("owner", true)).unwrap();
  b.insert(Entity::new("Account").with_property("owner", 1.0)).unwrap();
  b.insert(Entity::new("Account").with_property("owner", "1")).unwrap();

  let query = LookupQuery::by_property("Account", "owner", 1u64);
  assert!(b.execute(&query).await.unwrap().is_empty());

  let query = LookupQuery::by_property("Account", "owner", true);
  assert_eq!(b.execute(&query).await.unwrap().count(), 1);
}

#[tokio::test]
async fn memory_lookup_respects_partitions_unless_told_not_to() {
  let b = MemoryBackend::new();
  b.insert(product(3).in_partition(12)).unwrap();

  let scoped = LookupQuery::by_uid("Product", uid(3));
  assert!(b.execute(&scoped).await.unwrap().is_empty());

  let everywhere = LookupQuery::by_uid("Product", uid(3)).ignore_partitions();
  assert_eq!(b.execute(&everywhere).await.unwrap().count(), 1);
}

#[tokio::test]
async fn memory_lookup_honours_limit() {
  let b = MemoryBackend::new();
  for _ in 0..3 {
    b.insert(Entity::new("Account").with_property("owner", 5u64)).unwrap();
  }
  let query = LookupQuery::by_property("Account", "owner", 5u64).limit(2);
  assert_eq!(b.execute(&query).await.unwrap().count(), 2);
}

// ─── UserResolver ────────────────────────────────────────────────────────────

#[tokio::test]
async fn user_without_identity_is_no_active_session() {
  let b = backend();
  b.insert(Entity::new("FrontendUser").with_uid(uid(42))).unwrap();
  let ctx = context(&b, None);

  let err = UserResolver::new(&ctx).resolve().await.unwrap_err();
  assert!(matches!(err, Error::NoActiveSession));
  assert_eq!(err.kind(), ErrorKind::NoActiveSession);
}

#[tokio::test]
async fn user_resolver_rejects_non_user_type_regardless_of_identity() {
  let b = backend();
  for identity in [None, Some(42)] {
    let ctx = context(&b, identity);
    let err = UserResolver::for_type(&ctx, "Product").err().unwrap();
    assert!(matches!(err, Error::NotASubtype { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
  }
}

#[tokio::test]
async fn user_resolver_rejects_unregistered_type() {
  let b = backend();
  let ctx = context(&b, Some(42));
  let err = UserResolver::for_type(&ctx, "Nobody").err().unwrap();
  assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn user_resolves_outside_default_partitions() {
  let b = backend();
  b.insert(
    Entity::new("FrontendUser")
      .with_uid(uid(42))
      .in_partition(99)
      .with_property("username", "alice"),
  )
  .unwrap();
  let ctx = context(&b, Some(42));

  let resolved = UserResolver::new(&ctx).resolve().await.unwrap();
  assert_eq!(resolved.uid, Some(uid(42)));
  assert_eq!(resolved.property("username"), Some(&"alice".into()));
}

#[tokio::test]
async fn user_resolves_as_subtype() {
  let b = backend();
  b.insert(Entity::new("Customer").with_uid(uid(42))).unwrap();
  let ctx = context(&b, Some(42));

  let resolver = UserResolver::for_type(&ctx, "Customer").unwrap();
  assert_eq!(resolver.entity_type(), &EntityType::from("Customer"));
  let resolved = resolver.resolve().await.unwrap();
  assert_eq!(resolved.entity_type, EntityType::from("Customer"));
}

#[tokio::test]
async fn default_user_type_resolves_a_subtype_record() {
  let b = backend();
  b.insert(Entity::new("Customer").with_uid(uid(42))).unwrap();
  let ctx = context(&b, Some(42));

  let resolved = UserResolver::new(&ctx).resolve().await.unwrap();
  assert_eq!(resolved.entity_type, EntityType::from("Customer"));
  assert_eq!(resolved.uid, Some(uid(42)));
}

#[tokio::test]
async fn user_missing_is_not_found() {
  let b = backend();
  b.insert(Entity::new("FrontendUser").with_uid(uid(7))).unwrap();
  let ctx = context(&b, Some(42));

  let err = UserResolver::new(&ctx).resolve().await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ─── SubjectResolver ─────────────────────────────────────────────────────────

fn account(owner: u64) -> Entity {
  Entity::new("Account").with_property("owner", owner)
}

#[tokio::test]
async fn subject_without_identity_is_no_active_session() {
  let b = backend();
  b.insert(account(42)).unwrap();
  let ctx = context(&b, None);

  let resolver = SubjectResolver::for_property(&ctx, "Account", "owner").unwrap();
  let err = resolver.resolve().await.unwrap_err();
  assert!(matches!(err, Error::NoActiveSession));
}

#[tokio::test]
async fn subject_configuration_errors_surface_at_construction() {
  let b = backend();
  let ctx = context(&b, Some(42));
  for (ty, property) in [("Basket", "owner"), ("Account", "holder"), ("Account", "label")] {
    let err = SubjectResolver::for_property(&ctx, ty, property).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration, "{ty}.{property}");
  }
}

#[tokio::test]
async fn subject_cardinality_zero_one_many() {
  let b = backend();
  b.insert(account(1)).unwrap();
  b.insert(account(2)).unwrap();
  b.insert(account(2)).unwrap();

  let resolve = |identity: u64| {
    let ctx = context(&b, Some(identity));
    async move {
      SubjectResolver::for_property(&ctx, "Account", "owner")
        .unwrap()
        .resolve()
        .await
    }
  };

  let err = resolve(3).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));

  let one = resolve(1).await.unwrap();
  assert_eq!(one.property("owner"), Some(&serde_json::Value::from(1u64)));

  let err = resolve(2).await.unwrap_err();
  assert!(matches!(err, Error::Ambiguous { count: 2, .. }));
  assert_eq!(err.kind(), ErrorKind::Ambiguity);
}

#[tokio::test]
async fn subject_candidates_include_subtypes() {
  let b = backend();
  b.insert(account(42)).unwrap();
  b.insert(Entity::new("PremiumAccount").with_property("owner", 42u64))
    .unwrap();
  let ctx = context(&b, Some(42));

  let err = SubjectResolver::for_property(&ctx, "Account", "owner")
    .unwrap()
    .resolve()
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Ambiguous { count: 2, .. }));

  let premium = SubjectResolver::for_property(&ctx, "PremiumAccount", "owner")
    .unwrap()
    .resolve()
    .await
    .unwrap();
  assert_eq!(premium.entity_type, EntityType::from("PremiumAccount"));
}

#[tokio::test]
async fn subject_lookup_ignores_partitions() {
  let b = backend();
  b.insert(account(42).in_partition(8)).unwrap();
  let ctx = context(&b, Some(42));

  let relation = Relation::new(ctx.registry(), "Account", "owner").unwrap();
  let found = SubjectResolver::new(&ctx, relation).resolve().await.unwrap();
  assert_eq!(found.partition, 8);
}

// ─── SubjectCollection ───────────────────────────────────────────────────────

#[tokio::test]
async fn collection_rejects_empty_scope() {
  let b = backend();
  let ctx = context(&b, Some(42));

  let err = SubjectCollection::open(&ctx, "").await.unwrap_err();
  assert!(matches!(err, Error::EmptyScope));

  let err = SubjectCollection::new(&ctx, "", vec![product(1)])
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn cart_round_trip_preserves_order() {
  let b = backend();
  b.insert(product(7)).unwrap();
  b.insert(product(9)).unwrap();
  let ctx = context(&b, Some(42));

  let mut cart = SubjectCollection::open(&ctx, "cart").await.unwrap();
  assert!(cart.is_empty());
  cart.push_entity(product(7));
  cart.push_entity(product(9));
  cart.persist().await.unwrap();

  let reloaded = SubjectCollection::open(&ctx, "cart").await.unwrap();
  let uids: Vec<_> = reloaded.entities().map(|e| e.uid).collect();
  assert_eq!(uids, vec![Some(uid(7)), Some(uid(9))]);
  assert_eq!(reloaded[0].as_ref(), Some(&product(7)));
}

#[tokio::test]
async fn persist_writes_wire_format() {
  let b = backend();
  let ctx = context(&b, Some(42));

  let cart = SubjectCollection::new(&ctx, "cart", vec![product(7), product(9)])
    .await
    .unwrap();
  cart.persist().await.unwrap();

  let stored = b.get(user(42), "cart").await.unwrap().unwrap();
  assert_eq!(
    stored,
    r#"[{"class":"Product","uid":7},{"class":"Product","uid":9}]"#
  );
  assert_eq!(serde_json::to_string(&cart).unwrap(), stored);
}

#[tokio::test]
async fn persist_unsaved_entity_fails_without_writing() {
  let b = backend();
  let ctx = context(&b, Some(42));

  let mut cart = SubjectCollection::new(&ctx, "cart", vec![product(7)])
    .await
    .unwrap();
  cart.push_entity(Entity::new("Product"));

  let err = cart.persist().await.unwrap_err();
  assert!(matches!(err, Error::UnsavedEntity { index: 1, .. }));
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert!(b.get(user(42), "cart").await.unwrap().is_none());
  assert!(serde_json::to_string(&cart).is_err());
}

#[tokio::test]
async fn persist_overwrites_previous_payload() {
  let b = backend();
  let ctx = context(&b, Some(42));

  SubjectCollection::new(&ctx, "cart", vec![product(1), product(2)])
    .await
    .unwrap()
    .persist()
    .await
    .unwrap();
  SubjectCollection::new(&ctx, "cart", vec![product(3)])
    .await
    .unwrap()
    .persist()
    .await
    .unwrap();

  let stored = b.get(user(42), "cart").await.unwrap().unwrap();
  assert_eq!(stored, r#"[{"class":"Product","uid":3}]"#);
}

#[tokio::test]
async fn purge_then_retrieve_is_empty() {
  let b = backend();
  b.insert(product(7)).unwrap();
  let ctx = context(&b, Some(42));

  let mut cart = SubjectCollection::new(&ctx, "cart", vec![product(7)])
    .await
    .unwrap();
  cart.persist().await.unwrap();
  cart.purge().await.unwrap();
  assert!(cart.is_empty());

  let reloaded = SubjectCollection::open(&ctx, "cart").await.unwrap();
  assert!(reloaded.is_empty());
  assert_eq!(b.get(user(42), "cart").await.unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn initial_entities_skip_retrieve() {
  let b = backend();
  b.insert(product(7)).unwrap();
  b.set(user(42), "cart", r#"[{"class":"Product","uid":7}]"#.to_owned())
    .await
    .unwrap();
  let ctx = context(&b, Some(42));

  let cart = SubjectCollection::new(&ctx, "cart", vec![product(9)])
    .await
    .unwrap();
  assert_eq!(cart.len(), 1);
  assert_eq!(cart[0].as_ref().and_then(|e| e.uid), Some(uid(9)));
}

#[tokio::test]
async fn unreadable_payload_leaves_collection_untouched() {
  let b = backend();
  let ctx = context(&b, Some(42));

  for payload in ["not json", r#"{"class":"Product","uid":7}"#, "42", "null"] {
    b.set(user(42), "cart", payload.to_owned()).await.unwrap();
    let mut cart = SubjectCollection::new(&ctx, "cart", vec![product(9)])
      .await
      .unwrap();
    cart.retrieve().await.unwrap();
    assert_eq!(cart.len(), 1, "payload {payload:?}");
  }

  b.set(user(42), "fresh", "garbage".to_owned()).await.unwrap();
  let fresh = SubjectCollection::open(&ctx, "fresh").await.unwrap();
  assert!(fresh.is_empty());
}

#[tokio::test]
async fn retrieve_rejects_unknown_class() {
  let b = backend();
  b.set(user(42), "cart", r#"[{"class":"Spaceship","uid":1}]"#.to_owned())
    .await
    .unwrap();
  let ctx = context(&b, Some(42));

  let err = SubjectCollection::open(&ctx, "cart").await.unwrap_err();
  assert!(matches!(err, Error::UnknownType(_)));
  assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn retrieve_rejects_non_positive_uid() {
  let b = backend();
  let ctx = context(&b, Some(42));

  for payload in [
    r#"[{"class":"Product","uid":0}]"#,
    r#"[{"class":"Product","uid":-3}]"#,
    r#"[{"class":"Product","uid":"7"}]"#,
  ] {
    b.set(user(42), "cart", payload.to_owned()).await.unwrap();
    let err = SubjectCollection::open(&ctx, "cart").await.unwrap_err();
    assert!(matches!(err, Error::InvalidUid(_)), "payload {payload}");
    assert_eq!(err.kind(), ErrorKind::Validation);
  }
}

#[tokio::test]
async fn retrieve_rejects_malformed_entries() {
  let b = backend();
  let ctx = context(&b, Some(42));

  for payload in [r#"[7]"#, r#"[{"uid":7}]"#, r#"[{"class":"Product"}]"#] {
    b.set(user(42), "cart", payload.to_owned()).await.unwrap();
    let err = SubjectCollection::open(&ctx, "cart").await.unwrap_err();
    assert!(matches!(err, Error::MalformedEntry(_)), "payload {payload}");
  }
}

#[tokio::test]
async fn retrieve_reports_non_string_class() {
  let b = backend();
  b.set(user(42), "cart", r#"[{"class":17,"uid":7}]"#.to_owned())
    .await
    .unwrap();
  let ctx = context(&b, Some(42));

  let err = SubjectCollection::open(&ctx, "cart").await.unwrap_err();
  assert!(
    matches!(err, Error::MalformedEntry(ref message) if message.contains("got 17")),
    "{err}"
  );
}

#[tokio::test]
async fn unresolvable_reference_is_kept_as_empty_slot() {
  let b = backend();
  b.insert(product(7)).unwrap();
  b.set(
    user(42),
    "cart",
    r#"[{"class":"Product","uid":7},{"class":"Product","uid":8}]"#.to_owned(),
  )
  .await
  .unwrap();
  let ctx = context(&b, Some(42));

  let cart = SubjectCollection::open(&ctx, "cart").await.unwrap();
  assert_eq!(cart.len(), 2);
  assert!(cart[0].is_some());
  assert!(cart[1].is_none());
  assert_eq!(cart.entities().count(), 1);

  let err = cart.persist().await.unwrap_err();
  assert!(matches!(err, Error::EmptySlot(1)));
}

#[tokio::test]
async fn retrieve_finds_entities_in_any_partition() {
  let b = backend();
  b.insert(product(7).in_partition(31)).unwrap();
  b.set(user(42), "cart", r#"[{"class":"Product","uid":7}]"#.to_owned())
    .await
    .unwrap();
  let ctx = context(&b, Some(42));

  let cart = SubjectCollection::open(&ctx, "cart").await.unwrap();
  assert_eq!(cart.entities().next().map(|e| e.partition), Some(31));
}

#[tokio::test]
async fn collections_are_isolated_per_identity_and_scope() {
  let b = backend();
  b.insert(product(7)).unwrap();
  let alice = context(&b, Some(42));
  let bob = context(&b, Some(43));

  SubjectCollection::new(&alice, "cart", vec![product(7)])
    .await
    .unwrap()
    .persist()
    .await
    .unwrap();

  assert!(SubjectCollection::open(&bob, "cart").await.unwrap().is_empty());
  assert!(SubjectCollection::open(&alice, "wishlist").await.unwrap().is_empty());
  assert_eq!(SubjectCollection::open(&alice, "cart").await.unwrap().len(), 1);
}

#[tokio::test]
async fn collection_without_identity_is_no_active_session() {
  let b = backend();
  let ctx = context(&b, None);

  let err = SubjectCollection::open(&ctx, "cart").await.unwrap_err();
  assert!(matches!(err, Error::NoActiveSession));

  let cart = SubjectCollection::new(&ctx, "cart", vec![product(7)])
    .await
    .unwrap();
  let err = cart.persist().await.unwrap_err();
  assert!(matches!(err, Error::NoActiveSession));
}

#[tokio::test]
async fn equal_contents_serialize_identically() {
  let b = backend();
  let ctx = context(&b, Some(42));

  let a = SubjectCollection::new(&ctx, "a", vec![product(2), product(1)])
    .await
    .unwrap();
  let mut c = SubjectCollection::new(&ctx, "b", vec![product(2)])
    .await
    .unwrap();
  c.extend([product(1)]);

  assert_eq!(a.to_json().unwrap(), c.to_json().unwrap());
  assert_eq!(
    a.to_refs().unwrap(),
    vec![
      EntityRef { entity_type: "Product".into(), uid: uid(2) },
      EntityRef { entity_type: "Product".into(), uid: uid(1) },
    ]
  );
}

#[tokio::test]
async fn collection_supports_vec_mutation() {
  let b = backend();
  let ctx = context(&b, Some(42));

  let mut cart = SubjectCollection::new(&ctx, "cart", vec![product(1), product(2), product(3)])
    .await
    .unwrap();
  let removed = cart.remove(1);
  assert_eq!(removed.and_then(|e| e.uid), Some(uid(2)));
  cart.insert(0, Some(product(4)));
  assert_eq!(cart.scope(), "cart");
  assert_eq!(
    cart.to_json().unwrap(),
    r#"[{"class":"Product","uid":4},{"class":"Product","uid":1},{"class":"Product","uid":3}]"#
  );
}
