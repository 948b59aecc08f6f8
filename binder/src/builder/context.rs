use super::{BindingBuilder, BuildEnv, Catalog, PendingBinding};
use crate::component::Component;
use crate::config::{ConfigRegistry, ContextConfig};
use crate::context::{Context, Registry};
use crate::error::{Error, Result};
use crate::key::{Key, TypeKey};
use crate::scope::Scope;
use crate::view::{self, Provides};
use std::any::Any;
use std::collections::hash_map::{self, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Collects binding declarations and turns them into a [`Context`].
///
/// Bindings keep their declaration order; declaring a key again replaces the
/// earlier binding in place.
///
/// # Examples
///
/// ```
/// use fibre_binder::{provides, Component, Constructor, ContextBuilder, Scope};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///   fn greet(&self) -> String;
/// }
///
/// struct English {
///   name: String,
/// }
///
/// impl Greeter for English {
///   fn greet(&self) -> String {
///     format!("Hello, {}!", self.name)
///   }
/// }
///
/// impl Component for English {
///   fn constructors() -> Vec<Constructor<Self>> {
///     vec![Constructor::new(|args| Ok(English { name: args.value(0)? })).requires::<String>("name")]
///   }
/// }
///
/// provides!(English => dyn Greeter);
///
/// let mut builder = ContextBuilder::new();
/// builder.set_default_scope(Scope::ContextGlobal);
/// builder.bind_property("name", String::from("World"));
/// builder.bind::<dyn Greeter>().to::<English>();
///
/// let context = builder.build().unwrap();
/// let greeter = context.require::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "Hello, World!");
/// ```
pub struct ContextBuilder {
  order: Vec<Key>,
  bindings: HashMap<Key, PendingBinding>,
  default_scope: Scope,
  default_scope_changed: bool,
}

impl Default for ContextBuilder {
  fn default() -> Self {
    Self {
      order: Vec::new(),
      bindings: HashMap::new(),
      default_scope: Scope::AlwaysCreateNew,
      default_scope_changed: false,
    }
  }
}

impl ContextBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declares the binding for the type `I`.
  pub fn bind<I: ?Sized + Send + Sync + 'static>(&mut self) -> BindingBuilder<'_, I> {
    self.new_binding::<I>(Key::of::<I>())
  }

  /// Declares the named property `name`, requested as an `I`.
  pub fn bind_named<I: ?Sized + Send + Sync + 'static>(&mut self, name: impl Into<String>) -> BindingBuilder<'_, I> {
    self.new_binding::<I>(Key::named(name))
  }

  /// Declares a fresh binding under `key`, replacing any earlier declaration.
  pub fn new_binding<I: ?Sized + Send + Sync + 'static>(&mut self, key: Key) -> BindingBuilder<'_, I> {
    let fresh = PendingBinding::new(key.clone(), TypeKey::of::<I>());
    let pending = match self.bindings.entry(key) {
      hash_map::Entry::Occupied(mut slot) => {
        debug!(key = %slot.key(), "replacing binding");
        slot.insert(fresh);
        slot.into_mut()
      }
      hash_map::Entry::Vacant(slot) => {
        self.order.push(slot.key().clone());
        slot.insert(fresh)
      }
    };
    BindingBuilder::new(pending)
  }

  /// Binds the component `C` to itself.
  pub fn register<C: Component>(&mut self) -> BindingBuilder<'_, C> {
    self.bind::<C>().to::<C>()
  }

  /// Binds the named property `name` to `value`, shared for the lifetime of
  /// the context.
  pub fn bind_property<C: Any + Send + Sync>(&mut self, name: impl Into<String>, value: C) -> BindingBuilder<'_, C> {
    self.bind_named::<C>(name).to_object(value)
  }

  /// Binds the named property `name` to values produced by `factory`.
  pub fn bind_property_value<C, F>(&mut self, name: impl Into<String>, factory: F) -> BindingBuilder<'_, C>
  where
    C: Any + Send + Sync,
    F: Fn() -> C + Send + Sync + 'static,
  {
    self.bind_named::<C>(name).to_value(factory)
  }

  /// Declares that values of `C` may be served wherever an `I` is requested,
  /// for aliases whose target is only known by key.
  pub fn expose<C, I>(&mut self) -> &mut Self
  where
    C: Provides<I>,
    I: ?Sized + Send + Sync + 'static,
  {
    view::register_view::<C, I>();
    self
  }

  /// Sets the scope of bindings that do not choose one.
  pub fn set_default_scope(&mut self, scope: Scope) -> &mut Self {
    self.default_scope = scope;
    self.default_scope_changed = true;
    self
  }

  pub fn default_scope(&self) -> Scope {
    self.default_scope
  }

  pub fn contains_binding_for(&self, key: &Key) -> bool {
    self.bindings.contains_key(key)
  }

  /// The declared keys, in declaration order.
  pub fn keys(&self) -> &[Key] {
    &self.order
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  /// Adopts the bindings declared by `parent`.
  ///
  /// Keys this builder already declares keep their current binding. Parent
  /// bindings come first, in the parent's order, followed by keys only this
  /// builder declares. The parent's default scope is adopted only if this
  /// builder never set its own.
  pub fn inherit_from(&mut self, parent: &dyn ContextConfig) -> &mut Self {
    let mut inherited = ContextBuilder::new();
    parent.configure(&mut inherited);

    let mut order = Vec::with_capacity(inherited.order.len() + self.order.len());
    let mut bindings = HashMap::new();
    let mut adopted = 0;
    let mut overridden = 0;

    for key in inherited.order {
      let pending = match self.bindings.remove(&key) {
        Some(own) => {
          overridden += 1;
          own
        }
        None => match inherited.bindings.remove(&key) {
          Some(pending) => {
            adopted += 1;
            pending
          }
          None => continue,
        },
      };
      order.push(key.clone());
      bindings.insert(key, pending);
    }
    for key in std::mem::take(&mut self.order) {
      if let Some(pending) = self.bindings.remove(&key) {
        order.push(key.clone());
        bindings.insert(key, pending);
      }
    }

    debug!(adopted, overridden, "inherited configuration");
    self.order = order;
    self.bindings = bindings;

    if !self.default_scope_changed && inherited.default_scope_changed {
      self.set_default_scope(inherited.default_scope);
    }
    self
  }

  /// Adopts the bindings of the configuration registered under `name`.
  pub fn inherit_from_named(&mut self, registry: &ConfigRegistry, name: &str) -> Result<&mut Self> {
    let parent = registry.lookup(name)?;
    Ok(self.inherit_from(parent.as_ref()))
  }

  /// Finalizes every declared binding and returns the resulting context.
  ///
  /// Bindings are built in declaration order. Aliases are resolved lazily, so
  /// a binding may refer to a key declared after it. If any binding fails,
  /// no context is returned and the error lists every failure.
  pub fn build(self) -> Result<Context> {
    let ContextBuilder {
      order,
      mut bindings,
      default_scope,
      ..
    } = self;

    let registry = Arc::new(Registry::default());
    let mut catalog = Catalog::default();
    for key in &order {
      if let Some(pending) = bindings.get(key) {
        catalog.insert(key.clone(), pending.entry());
      }
    }
    let env = BuildEnv {
      default_scope,
      catalog,
      registry: Arc::downgrade(&registry),
    };

    let mut built = Vec::with_capacity(order.len());
    let mut failures = Vec::new();
    for key in order {
      let Some(pending) = bindings.remove(&key) else {
        continue;
      };
      match pending.build(&env, env.default_scope) {
        Ok(binding) => {
          trace!(%key, "binding built");
          built.push(binding);
        }
        Err(error) => {
          debug!(%key, %error, "binding failed to build");
          failures.push((key, error));
        }
      }
    }

    if !failures.is_empty() {
      return Err(Error::Build { failures });
    }

    let count = built.len();
    for binding in built {
      registry.insert(binding);
    }
    debug!(bindings = count, %default_scope, "context built");
    Ok(Context::from_registry(registry))
  }
}

impl fmt::Debug for ContextBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContextBuilder")
      .field("keys", &self.order)
      .field("default_scope", &self.default_scope)
      .field("default_scope_changed", &self.default_scope_changed)
      .finish()
  }
}
