use crate::key::TypeKey;
use crate::view;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value produced by a binding.
///
/// The concrete `Arc<C>` is kept type-erased; cloning an `Instance` clones the
/// `Arc`, so clones share object identity.
#[derive(Clone)]
pub struct Instance {
  value: Arc<dyn Any + Send + Sync>,
  concrete: TypeKey,
}

impl Instance {
  pub fn new<C: Any + Send + Sync>(value: Arc<C>) -> Self {
    view::register_view::<C, C>();
    Self {
      value,
      concrete: TypeKey::of::<C>(),
    }
  }

  /// The concrete type of the value.
  pub fn concrete_type(&self) -> TypeKey {
    self.concrete
  }

  /// Views the value as an `Arc<I>`, if its concrete type provides `I`.
  pub fn downcast<I: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<I>> {
    view::view::<I>(&self.value, self.concrete.id())
  }

  /// `true` if both instances are the same object.
  pub fn ptr_eq(&self, other: &Instance) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(&other.value))
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Instance({} @ {:p})", self.concrete.name(), Arc::as_ptr(&self.value))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clones_share_identity() {
    let first = Instance::new(Arc::new(String::from("shared")));
    let second = first.clone();
    let other = Instance::new(Arc::new(String::from("shared")));

    assert!(first.ptr_eq(&second));
    assert!(!first.ptr_eq(&other));
    assert_eq!(*first.downcast::<String>().unwrap(), "shared");
    assert!(first.downcast::<u32>().is_none());
  }
}
