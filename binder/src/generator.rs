//! Instance generators: the zero-argument factories behind every binding.

use crate::binding::Binding;
use crate::component::{Arguments, Component, Constructor, SetupFn};
use crate::error::{BoxError, Error, Result};
use crate::instance::Instance;
use crate::key::TypeKey;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, trace};

/// Produces an instance on demand.
///
/// `Ok(None)` is the explicit absence produced by null bindings.
pub trait InstanceGenerator: Send + Sync {
  fn produce(&self) -> Result<Option<Instance>>;

  /// The concrete type of the produced values, `None` for the null generator.
  fn produced_type(&self) -> Option<TypeKey>;
}

type Factory<C> = Arc<dyn Fn() -> Result<C, BoxError> + Send + Sync>;

/// Calls a user factory for every new value.
pub(crate) struct ValueGenerator<C> {
  factory: Factory<C>,
}

impl<C: Any + Send + Sync> ValueGenerator<C> {
  pub(crate) fn new(factory: impl Fn() -> Result<C, BoxError> + Send + Sync + 'static) -> Self {
    Self {
      factory: Arc::new(factory),
    }
  }
}

impl<C: Any + Send + Sync> InstanceGenerator for ValueGenerator<C> {
  fn produce(&self) -> Result<Option<Instance>> {
    let value = (self.factory)().map_err(|source| Error::creation(std::any::type_name::<C>(), source))?;
    Ok(Some(Instance::new(Arc::new(value))))
  }

  fn produced_type(&self) -> Option<TypeKey> {
    Some(TypeKey::of::<C>())
  }
}

/// Hands out the same pre-built object every time.
pub(crate) struct SharedGenerator {
  instance: Instance,
}

impl SharedGenerator {
  pub(crate) fn new(instance: Instance) -> Self {
    Self { instance }
  }
}

impl InstanceGenerator for SharedGenerator {
  fn produce(&self) -> Result<Option<Instance>> {
    Ok(Some(self.instance.clone()))
  }

  fn produced_type(&self) -> Option<TypeKey> {
    Some(self.instance.concrete_type())
  }
}

pub(crate) struct NullGenerator;

impl InstanceGenerator for NullGenerator {
  fn produce(&self) -> Result<Option<Instance>> {
    Ok(None)
  }

  fn produced_type(&self) -> Option<TypeKey> {
    None
  }
}

/// Builds values of `C` through a resolved constructor.
///
/// Each parameter binding is asked for its current instance (honouring its own
/// scope), the constructor runs with those values positionally, then the
/// optional setup callback sees the fresh value before it is shared.
pub(crate) struct ConstructorGenerator<C: Component> {
  constructor: Constructor<C>,
  params: Vec<Binding>,
  setup: Option<SetupFn>,
}

impl<C: Component> ConstructorGenerator<C> {
  pub(crate) fn new(constructor: Constructor<C>, params: Vec<Binding>, setup: Option<SetupFn>) -> Self {
    Self {
      constructor,
      params,
      setup,
    }
  }
}

impl<C: Component> InstanceGenerator for ConstructorGenerator<C> {
  fn produce(&self) -> Result<Option<Instance>> {
    let target = std::any::type_name::<C>();
    trace!(target_type = target, params = self.params.len(), "invoking constructor");

    let values = self
      .params
      .iter()
      .map(Binding::instance)
      .collect::<Result<Vec<_>>>()
      .map_err(|error| {
        debug!(target_type = target, %error, "failed to resolve constructor arguments");
        Error::creation(target, error)
      })?;

    let args = Arguments::new(target, self.constructor.params(), values);
    let mut value = self.constructor.invoke(&args).map_err(|source| {
      debug!(target_type = target, error = %source, "constructor failed");
      Error::creation(target, source)
    })?;

    if let Some(setup) = &self.setup {
      setup(&mut value);
    }

    Ok(Some(Instance::new(Arc::new(value))))
  }

  fn produced_type(&self) -> Option<TypeKey> {
    Some(TypeKey::of::<C>())
  }
}
