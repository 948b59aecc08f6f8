use crate::error::{Error, Result};
use std::fmt;

/// How many instances a binding may produce over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
  /// Every request runs the generator. Nothing is cached.
  AlwaysCreateNew,
  /// Each binding object caches its own instance, so every reference to the
  /// binding gets an independent cache.
  OnePerBinding,
  /// One instance is shared by every reference to the key for the lifetime of
  /// the `Context`.
  ContextGlobal,
}

impl Scope {
  /// `true` if bindings with this scope memoize their instance.
  pub fn is_caching(self) -> bool {
    !matches!(self, Scope::AlwaysCreateNew)
  }

  /// Checks that `scope` can back a caching binding.
  ///
  /// Fails if no scope was given or if it is `AlwaysCreateNew`, which is
  /// definitionally uncached.
  pub fn validate_compatible_with(scope: Option<Scope>) -> Result<Scope> {
    match scope {
      None => Err(Error::config("the scope of a caching binding cannot be empty")),
      Some(Scope::AlwaysCreateNew) => Err(Error::config(
        "the scope AlwaysCreateNew is not compatible with a caching binding",
      )),
      Some(scope) => Ok(scope),
    }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Scope::AlwaysCreateNew => write!(f, "AlwaysCreateNew"),
      Scope::OnePerBinding => write!(f, "OnePerBinding"),
      Scope::ContextGlobal => write!(f, "ContextGlobal"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn caching_scopes_are_accepted() {
    assert_eq!(
      Scope::validate_compatible_with(Some(Scope::OnePerBinding)).unwrap(),
      Scope::OnePerBinding
    );
    assert_eq!(
      Scope::validate_compatible_with(Some(Scope::ContextGlobal)).unwrap(),
      Scope::ContextGlobal
    );
  }

  #[test]
  fn uncached_or_missing_scopes_are_rejected() {
    assert!(Scope::validate_compatible_with(None).is_err());
    let error = Scope::validate_compatible_with(Some(Scope::AlwaysCreateNew)).unwrap_err();
    assert!(error.is_configuration());
    assert!(!Scope::AlwaysCreateNew.is_caching());
  }
}
