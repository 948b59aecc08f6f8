//! The process-wide context used by `resolve!`.
//!
//! Passing a [`Context`] explicitly is preferred. The global slot exists for
//! bootstrapping and is only ever changed through the functions below.

use crate::config::{self, ConfigRegistry, CONFIG_ENV_VAR};
use crate::context::Context;
use crate::error::Result;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::env;
use tracing::{debug, error, warn};

// Empty until a context is installed.
static GLOBAL_CONTEXT: Lazy<RwLock<Option<Context>>> = Lazy::new(|| RwLock::new(None));

/// Installs `context` as the global context and returns the previous one.
pub fn set_global(context: Context) -> Option<Context> {
  let previous = GLOBAL_CONTEXT.write().replace(context);
  if previous.is_some() {
    warn!("replacing the global context");
  }
  previous
}

/// The global context. An empty context is installed on first access if none
/// was set.
///
/// # Examples
///
/// ```
/// use fibre_binder::{global, reset_global, set_global, ContextBuilder};
///
/// let mut builder = ContextBuilder::new();
/// builder.bind_property("greeting", String::from("Hello from global!"));
/// set_global(builder.build().unwrap());
///
/// let greeting = global().require_named::<String>("greeting").unwrap();
/// assert_eq!(*greeting, "Hello from global!");
/// reset_global();
/// ```
pub fn global() -> Context {
  if let Some(context) = GLOBAL_CONTEXT.read().as_ref() {
    return context.clone();
  }
  GLOBAL_CONTEXT.write().get_or_insert_with(Context::empty).clone()
}

/// The global context, if one was installed.
pub fn try_global() -> Option<Context> {
  GLOBAL_CONTEXT.read().clone()
}

/// Removes the global context and returns it.
pub fn reset_global() -> Option<Context> {
  GLOBAL_CONTEXT.write().take()
}

/// Builds the configuration named by [`CONFIG_ENV_VAR`] and installs it as the
/// global context.
///
/// If the variable is unset or empty an empty context is installed instead. Build
/// failures are logged and returned; the global context is left untouched.
pub fn init_from_env(registry: &ConfigRegistry) -> Result<Context> {
  let named = env::var_os(CONFIG_ENV_VAR).is_some_and(|name| !name.to_string_lossy().trim().is_empty());
  let context = if !named {
    debug!(var = CONFIG_ENV_VAR, "no configuration named, installing an empty context");
    Context::empty()
  } else {
    config::configure_from_env(registry).map_err(|err| {
      error!(var = CONFIG_ENV_VAR, error = %err, "failed to build the global context");
      err
    })?
  };
  set_global(context.clone());
  Ok(context)
}
