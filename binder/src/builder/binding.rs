use super::{BuildEnv, Entry};
use crate::binding::Binding;
use crate::component::{Component, ComponentImpl, Implementation, SetupFn};
use crate::error::{BoxError, Error, Result};
use crate::generator::{InstanceGenerator, SharedGenerator, ValueGenerator};
use crate::instance::Instance;
use crate::key::{Key, TypeKey};
use crate::resolver;
use crate::scope::Scope;
use crate::view::{self, Provides};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::trace;

/// The type-erased state of a binding under configuration.
///
/// Fluent calls never fail on the spot. Misuse is recorded in `errors` and
/// reported when the binding is built, so configuration code stays chainable.
pub(crate) struct PendingBinding {
  key: Key,
  declared: TypeKey,
  finalized: bool,
  scope: Option<Scope>,
  implementation: Option<Box<dyn Implementation>>,
  value: Option<Arc<dyn InstanceGenerator>>,
  reference: Option<Key>,
  null: bool,
  overrides: Vec<PendingBinding>,
  setup: Option<(TypeKey, SetupFn)>,
  errors: Vec<String>,
}

enum Selector {
  Type,
  Name(String),
}

impl PendingBinding {
  pub(crate) fn new(key: Key, declared: TypeKey) -> Self {
    Self {
      key,
      declared,
      finalized: false,
      scope: None,
      implementation: None,
      value: None,
      reference: None,
      null: false,
      overrides: Vec::new(),
      setup: None,
      errors: Vec::new(),
    }
  }

  pub(crate) fn key(&self) -> &Key {
    &self.key
  }

  pub(crate) fn is_finalized(&self) -> bool {
    self.finalized
  }

  fn check_open(&mut self, operation: &str) -> bool {
    if self.finalized {
      self.errors.push(format!(
        "{}() called after the binding for {} was finalized",
        operation, self.key
      ));
    }
    !self.finalized
  }

  fn set_implementation(&mut self, implementation: Box<dyn Implementation>) {
    if self.check_open("to") {
      self.value = None;
      self.implementation = Some(implementation);
    }
  }

  fn set_value(&mut self, operation: &str, generator: Arc<dyn InstanceGenerator>) {
    if self.check_open(operation) {
      self.implementation = None;
      self.value = Some(generator);
    }
  }

  fn set_scope(&mut self, scope: Scope) {
    if self.check_open("with_scope") {
      self.scope = Some(scope);
    }
  }

  fn set_reference(&mut self, target: Key) {
    if !self.check_open("reference") {
      return;
    }
    if self.implementation.is_some() || self.value.is_some() {
      self.errors.push(format!(
        "{} is bound to an implementation and cannot also reference {}",
        self.key, target
      ));
    }
    self.reference = Some(target);
    self.finalized = true;
  }

  fn set_null(&mut self) {
    if self.check_open("to_null") {
      self.null = true;
      self.scope = Some(Scope::ContextGlobal);
      self.finalized = true;
    }
  }

  fn set_setup(&mut self, concrete: TypeKey, setup: SetupFn) {
    if self.check_open("setup_instance") {
      self.setup = Some((concrete, setup));
    }
  }

  /// The override slot for one constructor parameter, after checking that the
  /// selector matches exactly one parameter of the selected constructor.
  fn override_slot(&mut self, selector: Selector, ty: TypeKey) -> Option<&mut PendingBinding> {
    let operation = match selector {
      Selector::Type => "param",
      Selector::Name(_) => "param_named",
    };
    if !self.check_open(operation) {
      return None;
    }
    if let Err(message) = self.check_selector(&selector, ty) {
      self.errors.push(message);
      return None;
    }

    let key = match selector {
      Selector::Type => Key::Type(ty),
      Selector::Name(name) => Key::Name(name),
    };
    self.overrides.retain(|pending| pending.key != key);
    self.overrides.push(PendingBinding::new(key, ty));
    self.overrides.last_mut()
  }

  fn check_selector(&self, selector: &Selector, ty: TypeKey) -> Result<(), String> {
    let Some(implementation) = &self.implementation else {
      return Err(format!(
        "parameter overrides for {} need an implementation; call to() first",
        self.key
      ));
    };
    let concrete = implementation.concrete();
    let signatures = implementation.signatures();
    // Selection problems are reported by the build itself.
    let Ok(index) = resolver::select_constructor(concrete, &signatures) else {
      return Ok(());
    };
    let params = signatures[index].params;

    match selector {
      Selector::Type => match params.iter().filter(|param| param.param_type() == ty).count() {
        1 => Ok(()),
        0 => Err(format!("the constructor of {} has no parameter of type {}", concrete, ty)),
        _ => Err(format!(
          "the constructor of {} has several parameters of type {}; override them with param_named()",
          concrete, ty
        )),
      },
      Selector::Name(name) => {
        match params.iter().find(|param| param.required_name() == Some(name.as_str())) {
          None => Err(format!(
            "the constructor of {} has no parameter requiring `{}`",
            concrete, name
          )),
          Some(param) if param.param_type() != ty => Err(format!(
            "parameter `{}` of {} is a {}, not a {}",
            name,
            concrete,
            param.param_type(),
            ty
          )),
          Some(_) => Ok(()),
        }
      }
    }
  }

  /// What the rest of the context may assume about this binding while it is
  /// being built.
  pub(crate) fn entry(&self) -> Entry {
    let concrete = if self.reference.is_some() || self.null {
      None
    } else if let Some(generator) = &self.value {
      generator.produced_type()
    } else {
      self.implementation.as_ref().map(|implementation| implementation.concrete())
    };
    Entry {
      concrete,
      null: self.reference.is_none() && self.null,
      reference: self.reference.clone(),
    }
  }

  /// Finalizes this binding into a [`Binding`].
  ///
  /// `inherited` is the scope used when none was set explicitly.
  pub(crate) fn build(mut self, env: &BuildEnv, inherited: Scope) -> Result<Binding> {
    self.finalized = true;
    if !self.errors.is_empty() {
      return Err(Error::config(self.errors.join("; ")));
    }
    let scope = self.scope.unwrap_or(inherited);

    if let Some(target) = self.reference.take() {
      let produced = env.catalog.follow(&target)?;
      if let Some(concrete) = produced.concrete {
        if !view::is_assignable(concrete.id(), self.declared.id()) {
          return Err(Error::config(format!(
            "{} refers to {}, a {} which is not known to provide {}; declare it with ContextBuilder::expose::<{}, {}>()",
            self.key, target, concrete, self.declared, concrete, self.declared
          )));
        }
      }
      trace!(key = %self.key, %target, "built reference binding");
      return Ok(Binding::reference(self.key, self.declared, target, env.registry.clone()));
    }

    if self.null {
      trace!(key = %self.key, "built null binding");
      return Ok(Binding::null(self.key, self.declared));
    }

    let generator = if let Some(generator) = self.value.take() {
      if self.setup.is_some() {
        return Err(Error::config(format!(
          "setup_instance() on {} needs a constructor-built implementation, not a value",
          self.key
        )));
      }
      self.reject_unused_overrides()?;
      generator
    } else if let Some(implementation) = self.implementation.take() {
      let concrete = implementation.concrete();
      let signatures = implementation.signatures();
      let index = resolver::select_constructor(concrete, &signatures)?;
      let params = resolver::resolve_params(
        concrete,
        signatures[index].params,
        &mut self.overrides,
        env,
        scope,
      )?;
      self.reject_unused_overrides()?;

      let setup = match self.setup.take() {
        Some((target, _)) if target != concrete => {
          return Err(Error::config(format!(
            "setup_instance() on {} expects a {}, but the implementation is a {}",
            self.key, target, concrete
          )));
        }
        Some((_, setup)) => Some(setup),
        None => None,
      };
      implementation.generator(index, params, setup)
    } else {
      return Err(Error::config(format!("no implementation specified for {}", self.key)));
    };

    if let Some(concrete) = generator.produced_type() {
      if !view::is_assignable(concrete.id(), self.declared.id()) {
        return Err(Error::config(format!(
          "{} cannot be bound to a {}",
          self.key, concrete
        )));
      }
    }

    trace!(key = %self.key, %scope, "built binding");
    if scope.is_caching() {
      Binding::caching(self.key, self.declared, scope, generator)
    } else {
      Ok(Binding::direct(self.key, self.declared, generator))
    }
  }

  fn reject_unused_overrides(&self) -> Result<()> {
    if self.overrides.is_empty() {
      return Ok(());
    }
    let unused = self
      .overrides
      .iter()
      .map(|pending| pending.key.to_string())
      .collect::<Vec<_>>()
      .join(", ");
    Err(Error::config(format!(
      "unused constructor parameter override(s) on {}: {}",
      self.key, unused
    )))
  }
}

/// Fluent configuration of the binding for one key.
///
/// `I` is the type requesters of the key ask for. Every method consumes and
/// returns the builder so calls can be chained; mistakes are reported by
/// `ContextBuilder::build`.
///
/// # Examples
///
/// ```
/// use fibre_binder::{provides, Component, Constructor, ContextBuilder, Scope};
/// use std::sync::Arc;
///
/// trait Store: Send + Sync {
///   fn name(&self) -> String;
/// }
///
/// struct FileStore {
///   root: String,
/// }
///
/// impl Store for FileStore {
///   fn name(&self) -> String {
///     format!("file:{}", self.root)
///   }
/// }
///
/// impl Component for FileStore {
///   fn constructors() -> Vec<Constructor<Self>> {
///     vec![Constructor::new(|args| Ok(FileStore { root: args.value(0)? })).requires::<String>("root")]
///   }
/// }
///
/// provides!(FileStore => dyn Store);
///
/// let mut builder = ContextBuilder::new();
/// builder
///   .bind::<dyn Store>()
///   .to::<FileStore>()
///   .param_named::<String>("root", |root| {
///     root.to_object(String::from("/tmp"));
///   })
///   .with_scope(Scope::ContextGlobal);
///
/// let context = builder.build().unwrap();
/// let store = context.require::<dyn Store>().unwrap();
/// assert_eq!(store.name(), "file:/tmp");
/// ```
pub struct BindingBuilder<'a, I: ?Sized + Send + Sync + 'static> {
  pending: &'a mut PendingBinding,
  _declared: PhantomData<fn() -> Arc<I>>,
}

impl<'a, I: ?Sized + Send + Sync + 'static> BindingBuilder<'a, I> {
  pub(crate) fn new(pending: &'a mut PendingBinding) -> Self {
    Self {
      pending,
      _declared: PhantomData,
    }
  }

  /// Builds instances with the constructors of `C`.
  pub fn to<C>(mut self) -> Self
  where
    C: Component + Provides<I>,
  {
    view::register_view::<C, I>();
    self.pending.set_implementation(Box::new(ComponentImpl::<C>::new()));
    self
  }

  /// Builds instances by calling `factory`.
  pub fn to_value<C, F>(self, factory: F) -> Self
  where
    C: Provides<I>,
    F: Fn() -> C + Send + Sync + 'static,
  {
    self.try_to_value(move || Ok(factory()))
  }

  /// Like [`to_value`](Self::to_value), for factories that can fail. Errors
  /// surface as creation errors.
  pub fn try_to_value<C, F>(mut self, factory: F) -> Self
  where
    C: Provides<I>,
    F: Fn() -> Result<C, BoxError> + Send + Sync + 'static,
  {
    view::register_view::<C, I>();
    self
      .pending
      .set_value("to_value", Arc::new(ValueGenerator::new(factory)));
    self
  }

  /// Binds a single pre-built object. The scope becomes `ContextGlobal`.
  pub fn to_object<C: Provides<I>>(self, value: C) -> Self {
    self.to_shared(Arc::new(value))
  }

  /// Binds an object that is already shared elsewhere.
  pub fn to_shared<C: Provides<I>>(mut self, value: Arc<C>) -> Self {
    view::register_view::<C, I>();
    self
      .pending
      .set_value("to_object", Arc::new(SharedGenerator::new(Instance::new(value))));
    self.pending.set_scope(Scope::ContextGlobal);
    self
  }

  /// Binds the key to an explicit null. Finalizes the binding.
  pub fn to_null(mut self) -> Self {
    self.pending.set_null();
    self
  }

  /// Makes this key an alias of `target`. Finalizes the binding.
  pub fn reference(mut self, target: impl Into<Key>) -> Self {
    self.pending.set_reference(target.into());
    self
  }

  pub fn with_scope(mut self, scope: Scope) -> Self {
    self.pending.set_scope(scope);
    self
  }

  /// Overrides the constructor parameter of type `P`, which must occur exactly
  /// once in the selected constructor.
  pub fn param<P>(self, configure: impl FnOnce(BindingBuilder<'_, P>)) -> Self
  where
    P: ?Sized + Send + Sync + 'static,
  {
    self.configure_override(Selector::Type, configure)
  }

  /// Overrides the constructor parameter that requires the property `name`.
  pub fn param_named<P>(self, name: impl Into<String>, configure: impl FnOnce(BindingBuilder<'_, P>)) -> Self
  where
    P: ?Sized + Send + Sync + 'static,
  {
    self.configure_override(Selector::Name(name.into()), configure)
  }

  /// Runs `setup` on every freshly constructed `C` before it is handed out.
  pub fn setup_instance<C>(mut self, setup: impl Fn(&mut C) + Send + Sync + 'static) -> Self
  where
    C: Any + Send + Sync,
  {
    let erased: SetupFn = Arc::new(move |value: &mut dyn Any| {
      if let Some(value) = value.downcast_mut::<C>() {
        setup(value);
      }
    });
    self.pending.set_setup(TypeKey::of::<C>(), erased);
    self
  }

  pub fn key(&self) -> &Key {
    self.pending.key()
  }

  pub fn is_finalized(&self) -> bool {
    self.pending.is_finalized()
  }

  fn configure_override<P>(mut self, selector: Selector, configure: impl FnOnce(BindingBuilder<'_, P>)) -> Self
  where
    P: ?Sized + Send + Sync + 'static,
  {
    let ty = TypeKey::of::<P>();
    match self.pending.override_slot(selector, ty) {
      Some(slot) => configure(BindingBuilder::new(slot)),
      None => {
        // The selector was rejected; let the closure run against a detached slot.
        let mut detached = PendingBinding::new(Key::Type(ty), ty);
        configure(BindingBuilder::new(&mut detached));
      }
    }
    self
  }
}
