//! Configuration sources and the name-based registry used to bootstrap them.

use crate::builder::ContextBuilder;
use crate::context::Context;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The environment variable naming the configuration to bootstrap.
pub const CONFIG_ENV_VAR: &str = "FIBRE_BINDER_CONTEXT";

/// A set of binding declarations that can be applied to a [`ContextBuilder`].
///
/// Closures taking `&mut ContextBuilder` are configurations too.
pub trait ContextConfig {
  fn configure(&self, builder: &mut ContextBuilder);
}

impl<F> ContextConfig for F
where
  F: Fn(&mut ContextBuilder),
{
  fn configure(&self, builder: &mut ContextBuilder) {
    self(builder)
  }
}

type ConfigFactory = Arc<dyn Fn() -> Box<dyn ContextConfig> + Send + Sync>;

/// Maps configuration names to factories producing them.
#[derive(Default, Clone)]
pub struct ConfigRegistry {
  factories: HashMap<String, ConfigFactory>,
}

impl ConfigRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `factory` under `name`, replacing any earlier registration.
  pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
  where
    F: Fn() -> Box<dyn ContextConfig> + Send + Sync + 'static,
  {
    self.factories.insert(name.into(), Arc::new(factory));
    self
  }

  /// Registers `C` under its type name, built with `C::default()`.
  pub fn register_default<C>(&mut self) -> &mut Self
  where
    C: ContextConfig + Default + 'static,
  {
    self.register(std::any::type_name::<C>(), || {
      Box::new(C::default()) as Box<dyn ContextConfig>
    })
  }

  pub fn contains(&self, name: &str) -> bool {
    self.factories.contains_key(name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.factories.keys().map(String::as_str)
  }

  /// A fresh instance of the configuration registered under `name`.
  pub fn lookup(&self, name: &str) -> Result<Box<dyn ContextConfig>> {
    self
      .factories
      .get(name)
      .map(|factory| factory())
      .ok_or_else(|| Error::config(format!("no configuration registered as `{}`", name)))
  }
}

impl fmt::Debug for ConfigRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut names: Vec<&str> = self.names().collect();
    names.sort_unstable();
    f.debug_struct("ConfigRegistry").field("names", &names).finish()
  }
}

/// Builds a new context from a single configuration.
pub fn configure_new(config: &dyn ContextConfig) -> Result<Context> {
  let mut builder = ContextBuilder::new();
  config.configure(&mut builder);
  builder.build()
}

/// Builds a new context from the configuration registered under `name`.
pub fn configure_named(registry: &ConfigRegistry, name: &str) -> Result<Context> {
  let config = registry.lookup(name)?;
  debug!(config = name, "building context");
  configure_new(config.as_ref())
}

/// Builds a new context from the configuration named by [`CONFIG_ENV_VAR`].
pub fn configure_from_env(registry: &ConfigRegistry) -> Result<Context> {
  let name = env::var(CONFIG_ENV_VAR)
    .map_err(|_| Error::config(format!("{} is not set to a configuration name", CONFIG_ENV_VAR)))?;
  configure_named(registry, name.trim())
}
