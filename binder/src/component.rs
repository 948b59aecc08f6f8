//! Constructor metadata for concrete types.
//!
//! A concrete type takes part in constructor resolution by implementing
//! [`Component`]. Each [`Constructor`] lists its parameters in order, with the
//! per-parameter requirement metadata the resolver consumes: the parameter
//! type, an optional required property name and an optional flag.

use crate::binding::Binding;
use crate::error::{BoxError, Error, Result};
use crate::generator::{ConstructorGenerator, InstanceGenerator};
use crate::instance::Instance;
use crate::key::{Key, TypeKey};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A concrete type the container knows how to construct.
///
/// # Examples
///
/// ```
/// use fibre_binder::{Component, Constructor};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
///
/// struct Scheduler {
///   clock: Arc<dyn Clock>,
///   tick_ms: u64,
/// }
///
/// impl Component for Scheduler {
///   fn constructors() -> Vec<Constructor<Self>> {
///     vec![Constructor::new(|args| {
///       Ok(Scheduler {
///         clock: args.get::<dyn Clock>(0)?,
///         tick_ms: args.value::<u64>(1)?,
///       })
///     })
///     .param::<dyn Clock>()
///     .requires::<u64>("tick_ms")]
///   }
/// }
/// ```
pub trait Component: Any + Send + Sync + Sized {
  /// The public constructors of this type. When there is more than one, exactly
  /// one of them must be marked with [`Constructor::inject`].
  fn constructors() -> Vec<Constructor<Self>>;
}

/// Describes one constructor parameter.
#[derive(Debug, Clone)]
pub struct Param {
  ty: TypeKey,
  name: Option<String>,
  optional: bool,
}

impl Param {
  pub fn param_type(&self) -> TypeKey {
    self.ty
  }

  /// The property name this parameter requires, if any.
  pub fn required_name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn is_optional(&self) -> bool {
    self.optional
  }

  /// The key this parameter is resolved by: its required name, else its type.
  pub fn key(&self) -> Key {
    match &self.name {
      Some(name) => Key::Name(name.clone()),
      None => Key::Type(self.ty),
    }
  }
}

type Invoke<T> = Arc<dyn Fn(&Arguments<'_>) -> Result<T, BoxError> + Send + Sync>;

/// A constructor: ordered parameter metadata plus a function that builds the
/// value from positional [`Arguments`].
pub struct Constructor<T> {
  params: Vec<Param>,
  designated: bool,
  invoke: Invoke<T>,
}

impl<T> Clone for Constructor<T> {
  fn clone(&self) -> Self {
    Self {
      params: self.params.clone(),
      designated: self.designated,
      invoke: Arc::clone(&self.invoke),
    }
  }
}

impl<T: 'static> Constructor<T> {
  pub fn new<F>(invoke: F) -> Self
  where
    F: Fn(&Arguments<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
  {
    Self {
      params: Vec::new(),
      designated: false,
      invoke: Arc::new(invoke),
    }
  }

  /// A zero-argument constructor backed by `Default`.
  pub fn from_default() -> Self
  where
    T: Default,
  {
    Self::new(|_| Ok(T::default()))
  }

  /// Appends a parameter resolved by its type.
  pub fn param<P: ?Sized + Any>(self) -> Self {
    self.push(TypeKey::of::<P>(), None, false)
  }

  /// Appends a parameter resolved by the property `name`, whatever its type.
  pub fn requires<P: ?Sized + Any>(self, name: impl Into<String>) -> Self {
    self.push(TypeKey::of::<P>(), Some(name.into()), false)
  }

  /// Appends a parameter that may stay unbound.
  pub fn optional<P: ?Sized + Any>(self) -> Self {
    self.push(TypeKey::of::<P>(), None, true)
  }

  /// Appends an optional parameter resolved by the property `name`.
  pub fn optional_named<P: ?Sized + Any>(self, name: impl Into<String>) -> Self {
    self.push(TypeKey::of::<P>(), Some(name.into()), true)
  }

  /// Marks this constructor as the one to use when a type has several.
  pub fn inject(mut self) -> Self {
    self.designated = true;
    self
  }

  pub fn params(&self) -> &[Param] {
    &self.params
  }

  pub fn is_designated(&self) -> bool {
    self.designated
  }

  pub(crate) fn invoke(&self, args: &Arguments<'_>) -> Result<T, BoxError> {
    (self.invoke)(args)
  }

  fn push(mut self, ty: TypeKey, name: Option<String>, optional: bool) -> Self {
    self.params.push(Param { ty, name, optional });
    self
  }
}

impl<T> fmt::Debug for Constructor<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Constructor")
      .field("params", &self.params)
      .field("designated", &self.designated)
      .finish()
  }
}

/// The resolved values for a constructor call, in parameter order.
pub struct Arguments<'a> {
  target: &'static str,
  params: &'a [Param],
  values: Vec<Option<Instance>>,
}

impl<'a> Arguments<'a> {
  pub(crate) fn new(target: &'static str, params: &'a [Param], values: Vec<Option<Instance>>) -> Self {
    Self {
      target,
      params,
      values,
    }
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// The raw instance at `index`, `None` if the parameter resolved to null.
  pub fn instance(&self, index: usize) -> Option<&Instance> {
    self.values.get(index).and_then(Option::as_ref)
  }

  /// The argument at `index`, which must be present.
  pub fn get<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>> {
    self.optional::<T>(index)?.ok_or_else(|| {
      Error::config(format!(
        "parameter {} of {} ({}) resolved to null but is required",
        index,
        self.target,
        self.describe(index)
      ))
    })
  }

  /// The argument at `index`, `None` if it resolved to null.
  pub fn optional<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Option<Arc<T>>> {
    let slot = self.values.get(index).ok_or_else(|| {
      Error::config(format!(
        "{} has no parameter {}; its constructor declares {}",
        self.target,
        index,
        self.values.len()
      ))
    })?;
    match slot {
      None => Ok(None),
      Some(instance) => instance.downcast::<T>().map(Some).ok_or_else(|| {
        Error::config(format!(
          "parameter {} of {} is a {}, which does not provide {}",
          index,
          self.target,
          instance.concrete_type(),
          std::any::type_name::<T>()
        ))
      }),
    }
  }

  /// A clone of the value at `index`, for plain property values.
  pub fn value<T: Clone + Send + Sync + 'static>(&self, index: usize) -> Result<T> {
    self.get::<T>(index).map(|value| (*value).clone())
  }

  fn describe(&self, index: usize) -> String {
    self
      .params
      .get(index)
      .map(|param| param.key().to_string())
      .unwrap_or_else(|| String::from("undeclared"))
  }
}

pub(crate) type SetupFn = Arc<dyn Fn(&mut dyn Any) + Send + Sync>;

/// The parameter shape of one constructor, as seen by the resolver.
#[derive(Clone, Copy)]
pub(crate) struct Signature<'a> {
  pub(crate) params: &'a [Param],
  pub(crate) designated: bool,
}

/// A concrete type with its constructors, with the type parameter erased.
pub(crate) trait Implementation: Send + Sync {
  fn concrete(&self) -> TypeKey;

  fn signatures(&self) -> Vec<Signature<'_>>;

  fn generator(
    &self,
    index: usize,
    params: Vec<Binding>,
    setup: Option<SetupFn>,
  ) -> Arc<dyn InstanceGenerator>;
}

pub(crate) struct ComponentImpl<C: Component> {
  constructors: Vec<Constructor<C>>,
}

impl<C: Component> ComponentImpl<C> {
  pub(crate) fn new() -> Self {
    Self {
      constructors: C::constructors(),
    }
  }
}

impl<C: Component> Implementation for ComponentImpl<C> {
  fn concrete(&self) -> TypeKey {
    TypeKey::of::<C>()
  }

  fn signatures(&self) -> Vec<Signature<'_>> {
    self
      .constructors
      .iter()
      .map(|constructor| Signature {
        params: constructor.params(),
        designated: constructor.is_designated(),
      })
      .collect()
  }

  fn generator(
    &self,
    index: usize,
    params: Vec<Binding>,
    setup: Option<SetupFn>,
  ) -> Arc<dyn InstanceGenerator> {
    Arc::new(ConstructorGenerator::new(
      self.constructors[index].clone(),
      params,
      setup,
    ))
  }
}
