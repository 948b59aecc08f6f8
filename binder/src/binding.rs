//! Finalized bindings: how the instance for one key is obtained.

use crate::context::Registry;
use crate::error::{Error, Result};
use crate::generator::{InstanceGenerator, NullGenerator};
use crate::guard::ResolutionGuard;
use crate::instance::Instance;
use crate::key::{Key, TypeKey};
use crate::scope::Scope;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// An immutable binding from a key to a source of instances.
///
/// Bindings are cheap to clone; clones share the generator and, for caching
/// bindings, the cached instance.
#[derive(Clone)]
pub struct Binding {
  inner: Arc<Inner>,
}

struct Inner {
  key: Key,
  declared: TypeKey,
  kind: Kind,
}

enum Kind {
  /// Runs the generator on every request.
  Direct {
    concrete: Option<TypeKey>,
    generator: Arc<dyn InstanceGenerator>,
  },
  /// Runs the generator once and keeps the result.
  Caching {
    concrete: Option<TypeKey>,
    scope: Scope,
    generator: Arc<dyn InstanceGenerator>,
    cell: OnceCell<Option<Instance>>,
  },
  /// Forwards to the binding of another key, resolved on first use.
  Reference {
    target: Key,
    registry: Weak<Registry>,
    resolved: OnceCell<Binding>,
  },
  Null,
}

impl Binding {
  /// A binding that produces a new instance on every request.
  pub fn direct(key: Key, declared: TypeKey, generator: Arc<dyn InstanceGenerator>) -> Self {
    let concrete = generator.produced_type();
    Self::from_kind(key, declared, Kind::Direct { concrete, generator })
  }

  /// A binding that keeps the first instance it produces.
  ///
  /// Fails if `scope` is `AlwaysCreateNew`.
  pub fn caching(
    key: Key,
    declared: TypeKey,
    scope: Scope,
    generator: Arc<dyn InstanceGenerator>,
  ) -> Result<Self> {
    let scope = Scope::validate_compatible_with(Some(scope))?;
    let concrete = generator.produced_type();
    Ok(Self::from_kind(
      key,
      declared,
      Kind::Caching {
        concrete,
        scope,
        generator,
        cell: OnceCell::new(),
      },
    ))
  }

  /// An alias for the binding of `target` in the registry.
  pub(crate) fn reference(key: Key, declared: TypeKey, target: Key, registry: Weak<Registry>) -> Self {
    Self::from_kind(
      key,
      declared,
      Kind::Reference {
        target,
        registry,
        resolved: OnceCell::new(),
      },
    )
  }

  /// A binding whose instance is always absent.
  pub fn null(key: Key, declared: TypeKey) -> Self {
    Self::from_kind(key, declared, Kind::Null)
  }

  fn from_kind(key: Key, declared: TypeKey, kind: Kind) -> Self {
    Self {
      inner: Arc::new(Inner { key, declared, kind }),
    }
  }

  /// The key this binding is registered under.
  pub fn bound_key(&self) -> &Key {
    &self.inner.key
  }

  /// The type requesters ask for.
  pub fn declared_type(&self) -> TypeKey {
    self.inner.declared
  }

  /// The concrete type of produced instances, `None` for null bindings.
  pub fn resolved_type(&self) -> Result<Option<TypeKey>> {
    match &self.inner.kind {
      Kind::Direct { concrete, .. } | Kind::Caching { concrete, .. } => Ok(*concrete),
      Kind::Reference { .. } => self.target()?.resolved_type(),
      Kind::Null => Ok(None),
    }
  }

  pub fn scope(&self) -> Result<Scope> {
    match &self.inner.kind {
      Kind::Direct { .. } => Ok(Scope::AlwaysCreateNew),
      Kind::Caching { scope, .. } => Ok(*scope),
      Kind::Reference { .. } => self.target()?.scope(),
      Kind::Null => Ok(Scope::ContextGlobal),
    }
  }

  pub fn generator(&self) -> Result<Arc<dyn InstanceGenerator>> {
    match &self.inner.kind {
      Kind::Direct { generator, .. } | Kind::Caching { generator, .. } => Ok(Arc::clone(generator)),
      Kind::Reference { .. } => self.target()?.generator(),
      Kind::Null => Ok(Arc::new(NullGenerator)),
    }
  }

  /// `true` for bindings that forward to another key.
  pub fn is_reference(&self) -> bool {
    matches!(self.inner.kind, Kind::Reference { .. })
  }

  pub fn is_null(&self) -> bool {
    matches!(self.inner.kind, Kind::Null)
  }

  /// Checks the binding's invariants, resolving alias targets on the way.
  pub fn validate(&self) -> Result<()> {
    match &self.inner.kind {
      Kind::Caching { scope, .. } => Scope::validate_compatible_with(Some(*scope)).map(|_| ()),
      Kind::Reference { .. } => self.target()?.validate(),
      Kind::Direct { .. } | Kind::Null => Ok(()),
    }
  }

  /// The current instance, honouring the binding's scope.
  ///
  /// `Ok(None)` is an explicit null.
  pub fn instance(&self) -> Result<Option<Instance>> {
    match &self.inner.kind {
      Kind::Direct { generator, .. } => {
        let _guard = ResolutionGuard::enter(self.id(), &self.inner.key)?;
        generator.produce()
      }
      Kind::Caching { generator, cell, .. } => {
        if let Some(cached) = cell.get() {
          return Ok(cached.clone());
        }
        let _guard = ResolutionGuard::enter(self.id(), &self.inner.key)?;
        cell
          .get_or_try_init(|| {
            trace!(key = %self.inner.key, "creating cached instance");
            generator.produce()
          })
          .cloned()
      }
      Kind::Reference { .. } => self.target()?.instance(),
      Kind::Null => Ok(None),
    }
  }

  /// The current instance viewed as an `Arc<T>`.
  pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>> {
    match self.instance()? {
      None => Ok(None),
      Some(instance) => instance.downcast::<T>().map(Some).ok_or_else(|| {
        Error::config(format!(
          "the instance bound to {} is a {}, which does not provide {}",
          self.inner.key,
          instance.concrete_type(),
          std::any::type_name::<T>()
        ))
      }),
    }
  }

  /// `true` if both handles are the same binding object.
  pub fn ptr_eq(&self, other: &Binding) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }

  fn id(&self) -> usize {
    Arc::as_ptr(&self.inner) as usize
  }

  /// Resolves an alias to the binding it forwards to.
  fn target(&self) -> Result<&Binding> {
    let Kind::Reference {
      target,
      registry,
      resolved,
    } = &self.inner.kind
    else {
      return Ok(self);
    };

    if let Some(bound) = resolved.get() {
      return Ok(bound);
    }
    // Entered before the cell so a cyclic alias errors instead of reentering it.
    let _guard = ResolutionGuard::enter(self.id(), &self.inner.key)?;
    resolved.get_or_try_init(|| {
      let registry = registry.upgrade().ok_or_else(|| {
        Error::config(format!(
          "{} refers to {}, but its context has been dropped",
          self.inner.key, target
        ))
      })?;
      let bound = registry.get(target).ok_or_else(|| {
        Error::config(format!(
          "{} refers to {}, which is not bound",
          self.inner.key, target
        ))
      })?;

      if bound.scope()? == Scope::OnePerBinding {
        // Each alias of a OnePerBinding target keeps its own instance.
        debug!(alias = %self.inner.key, %target, "aliasing with a private cache");
        Binding::caching(
          self.inner.key.clone(),
          self.inner.declared,
          Scope::OnePerBinding,
          bound.generator()?,
        )
      } else {
        debug!(alias = %self.inner.key, %target, "aliasing shared binding");
        Ok(bound)
      }
    })
  }
}

impl fmt::Debug for Binding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut debug = f.debug_struct("Binding");
    debug
      .field("key", &self.inner.key)
      .field("declared", &self.inner.declared);
    match &self.inner.kind {
      Kind::Direct { concrete, .. } => debug.field("kind", &"direct").field("concrete", concrete),
      Kind::Caching { concrete, scope, .. } => debug
        .field("kind", &"caching")
        .field("scope", scope)
        .field("concrete", concrete),
      Kind::Reference { target, .. } => debug.field("kind", &"reference").field("target", target),
      Kind::Null => debug.field("kind", &"null"),
    };
    debug.finish()
  }
}
