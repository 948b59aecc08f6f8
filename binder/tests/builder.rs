use fibre_binder::{
  configure_new, provides, Component, Constructor, ContextBuilder, Key, Scope,
};
use pretty_assertions::assert_eq;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// --- Test Fixtures ---

trait Cache: Send + Sync {
  fn capacity(&self) -> usize;
}

struct LruCache {
  capacity: usize,
  warmed: bool,
}

impl Cache for LruCache {
  fn capacity(&self) -> usize {
    self.capacity
  }
}

impl Component for LruCache {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|args| {
      Ok(LruCache {
        capacity: args.value(0)?,
        warmed: false,
      })
    })
    .requires::<usize>("capacity")]
  }
}

provides!(LruCache => dyn Cache);

// Only ever reached by key, never bound with to::<FifoCache>().
#[derive(Default)]
struct FifoCache;

impl Cache for FifoCache {
  fn capacity(&self) -> usize {
    0
  }
}

impl Component for FifoCache {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::from_default()]
  }
}

provides!(FifoCache => dyn Cache);

struct Service {
  cache: Arc<dyn Cache>,
}

impl Component for Service {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|args| {
      Ok(Service {
        cache: args.get::<dyn Cache>(0)?,
      })
    })
    .param::<dyn Cache>()]
  }
}

// --- Builder Tests ---

#[test]
fn test_every_declared_key_is_queryable() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.bind_property("capacity", 64usize);
  builder.bind::<dyn Cache>().to::<LruCache>();
  builder.register::<Service>();
  builder.bind_named::<dyn Cache>("fallback").to_null();
  builder.bind_named::<dyn Cache>("primary").reference(Key::of::<dyn Cache>());
  let declared = builder.keys().to_vec();

  // Act
  let context = builder.build().unwrap();

  // Assert
  assert_eq!(context.len(), declared.len());
  for key in &declared {
    assert!(context.instance(key).is_ok(), "{} is not queryable", key);
  }
  assert!(context.instance(&Key::named("fallback")).unwrap().is_none());
}

#[test]
fn test_aliases_may_refer_to_later_bindings() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.bind_named::<dyn Cache>("early").reference(Key::of::<dyn Cache>());
  builder
    .bind::<dyn Cache>()
    .to::<LruCache>()
    .with_scope(Scope::ContextGlobal);
  builder.bind_property("capacity", 8usize);
  let context = builder.build().unwrap();

  // Act
  let early = context.require_named::<dyn Cache>("early").unwrap();

  // Assert
  assert_eq!(early.capacity(), 8);
  assert!(Arc::ptr_eq(&early, &context.require::<dyn Cache>().unwrap()));
}

#[test]
fn test_alias_to_undeclared_key_fails_the_build() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.bind_named::<dyn Cache>("dangling").reference("nowhere");

  // Act
  let error = builder.build().unwrap_err();

  // Assert
  assert!(error.to_string().contains("property `nowhere` is not bound"));
}

#[test]
fn test_circular_aliases_fail_the_build() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.bind_named::<dyn Cache>("ping").reference("pong");
  builder.bind_named::<dyn Cache>("pong").reference("ping");

  // Act
  let error = builder.build().unwrap_err();

  // Assert
  assert_eq!(error.failures().len(), 2);
  assert!(error.to_string().contains("circular alias"));
}

#[test]
fn test_alias_needs_a_known_view() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.register::<FifoCache>();
  builder.bind_named::<dyn Cache>("by_key").reference(Key::of::<FifoCache>());

  // Act
  let error = builder.build().unwrap_err();

  // Assert
  assert!(error.to_string().contains("ContextBuilder::expose"));
}

#[test]
fn test_exposed_view_allows_alias() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.expose::<LruCache, dyn Cache>();
  builder.bind_property("capacity", 8usize);
  builder
    .register::<LruCache>()
    .with_scope(Scope::ContextGlobal);
  builder.bind_named::<dyn Cache>("by_key").reference(Key::of::<LruCache>());
  let context = builder.build().unwrap();

  // Act
  let cache = context.require_named::<dyn Cache>("by_key").unwrap();

  // Assert
  assert_eq!(cache.capacity(), 8);
}

#[test]
fn test_build_reports_every_failure() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.register::<Service>();
  builder.bind::<usize>();
  builder.bind_named::<usize>("orphan").reference("missing");

  // Act
  let error = builder.build().unwrap_err();

  // Assert
  let keys: Vec<Key> = error.failures().iter().map(|(key, _)| key.clone()).collect();
  assert_eq!(
    keys,
    vec![Key::of::<Service>(), Key::of::<usize>(), Key::named("orphan")]
  );
  assert!(error.to_string().starts_with("3 binding(s) could not be built"));
}

#[test]
fn test_redeclaring_a_key_replaces_it_in_place() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.bind_property("capacity", 1usize);
  builder.bind_property("name", String::from("cache"));
  builder.bind_property("capacity", 2usize);

  // Act
  let keys = builder.keys().to_vec();
  let context = builder.build().unwrap();

  // Assert
  assert_eq!(keys, vec![Key::named("capacity"), Key::named("name")]);
  assert_eq!(*context.require_named::<usize>("capacity").unwrap(), 2);
}

#[test]
fn test_setup_instance_runs_after_construction() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.bind_property("capacity", 16usize);
  builder
    .register::<LruCache>()
    .setup_instance::<LruCache>(|cache| cache.warmed = true);
  let context = builder.build().unwrap();

  // Act
  let cache = context.require::<LruCache>().unwrap();

  // Assert
  assert!(cache.warmed);
}

#[test]
fn test_setup_instance_requires_matching_type() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.bind_property("capacity", 16usize);
  builder
    .bind::<dyn Cache>()
    .to::<LruCache>()
    .setup_instance::<Service>(|_| {});

  // Act
  let error = builder.build().unwrap_err();

  // Assert
  assert!(error.to_string().contains("setup_instance()"));
}

#[test]
fn test_fallible_value_factories_surface_creation_errors() {
  // Arrange
  let attempts = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&attempts);
  let mut builder = ContextBuilder::new();
  builder
    .bind_named::<usize>("port")
    .try_to_value(move || {
      counter.fetch_add(1, Ordering::SeqCst);
      "not-a-port".parse::<usize>().map_err(Into::into)
    })
    .with_scope(Scope::ContextGlobal);
  let context = builder.build().unwrap();

  // Act
  let first = context.get_named::<usize>("port");
  let second = context.get_named::<usize>("port");

  // Assert
  assert!(first.unwrap_err().is_creation());
  assert!(second.unwrap_err().is_creation());
  assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_configure_new_applies_a_closure() {
  // Arrange
  let config = |builder: &mut ContextBuilder| {
    builder.bind_property("capacity", 4usize);
    builder.bind::<dyn Cache>().to::<LruCache>();
  };

  // Act
  let context = configure_new(&config).unwrap();

  // Assert
  assert_eq!(context.require::<dyn Cache>().unwrap().capacity(), 4);
  assert!(context.contains_binding(&Key::named("capacity")));
}
