//! The runtime registry of finalized bindings.

use crate::binding::Binding;
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::key::Key;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// The shared map behind a `Context`. Alias bindings hold it weakly.
#[derive(Default)]
pub(crate) struct Registry {
  bindings: DashMap<Key, Binding>,
}

impl Registry {
  pub(crate) fn get(&self, key: &Key) -> Option<Binding> {
    self.bindings.get(key).map(|entry| entry.value().clone())
  }

  pub(crate) fn insert(&self, binding: Binding) -> Option<Binding> {
    self.bindings.insert(binding.bound_key().clone(), binding)
  }
}

/// An immutable, thread-safe registry from keys to bindings.
///
/// `Context` is a cheap handle: clones share the same bindings and therefore
/// the same cached instances.
///
/// # Examples
///
/// ```
/// use fibre_binder::{ContextBuilder, Scope};
///
/// let mut builder = ContextBuilder::new();
/// builder.bind_property("greeting", String::from("hello"));
/// builder.bind::<u64>().to_value(|| 30u64).with_scope(Scope::ContextGlobal);
///
/// let context = builder.build().unwrap();
/// assert_eq!(*context.get_named::<String>("greeting").unwrap().unwrap(), "hello");
/// assert_eq!(*context.get_instance::<u64>().unwrap().unwrap(), 30);
/// ```
#[derive(Clone, Default)]
pub struct Context {
  registry: Arc<Registry>,
}

impl Context {
  /// A context with no bindings.
  pub fn empty() -> Self {
    Self::default()
  }

  pub(crate) fn from_registry(registry: Arc<Registry>) -> Self {
    Self { registry }
  }

  /// The binding registered under `key`, if any.
  pub fn binding(&self, key: &Key) -> Option<Binding> {
    self.registry.get(key)
  }

  pub fn contains_binding(&self, key: &Key) -> bool {
    self.registry.bindings.contains_key(key)
  }

  /// The instance for `key`, honouring the binding's scope.
  ///
  /// Fails for unbound keys; `Ok(None)` means the key is explicitly bound to
  /// null.
  pub fn instance(&self, key: &Key) -> Result<Option<Instance>> {
    self.bound(key)?.instance()
  }

  /// The instance bound to the type `T`.
  pub fn get_instance<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>> {
    self.bound(&Key::of::<T>())?.get::<T>()
  }

  /// The instance bound to the property `name`, viewed as a `T`.
  pub fn get_named<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Option<Arc<T>>> {
    self.bound(&Key::named(name))?.get::<T>()
  }

  /// Like [`get_instance`](Self::get_instance), but an explicit null is an error.
  pub fn require<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
    let key = Key::of::<T>();
    Self::present(&key, self.bound(&key)?.get::<T>()?)
  }

  /// Like [`get_named`](Self::get_named), but an explicit null is an error.
  pub fn require_named<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
    let key = Key::named(name);
    Self::present(&key, self.bound(&key)?.get::<T>()?)
  }

  /// Registers a finalized binding, replacing any binding under the same key.
  ///
  /// Contexts are normally produced whole by `ContextBuilder::build`; this is
  /// meant for test fixtures.
  pub fn insert_binding(&self, binding: Binding) -> Option<Binding> {
    self.registry.insert(binding)
  }

  pub fn keys(&self) -> Vec<Key> {
    self.registry.bindings.iter().map(|entry| entry.key().clone()).collect()
  }

  pub fn len(&self) -> usize {
    self.registry.bindings.len()
  }

  pub fn is_empty(&self) -> bool {
    self.registry.bindings.is_empty()
  }

  fn bound(&self, key: &Key) -> Result<Binding> {
    self
      .registry
      .get(key)
      .ok_or_else(|| Error::config(format!("no binding for {}", key)))
  }

  fn present<T: ?Sized>(key: &Key, value: Option<Arc<T>>) -> Result<Arc<T>> {
    value.ok_or_else(|| Error::config(format!("{} is bound to null", key)))
  }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context").field("bindings", &self.len()).finish()
  }
}
