//! Assignability between concrete types and the types they provide.
//!
//! Instances are stored as their concrete `Arc<C>`. A *view* turns that value
//! into an `Arc<I>` for some type `I` that `C` provides (usually a trait
//! object). Views are facts about types, so they live in one process-wide
//! registry and are recorded whenever a binding names a concrete type.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Declares that `Self` can stand in wherever an `I` is required.
///
/// Every type provides itself. Trait-object upcasts are declared with the
/// [`provides!`](crate::provides) macro:
///
/// ```
/// use fibre_binder::provides;
///
/// trait Greeter: Send + Sync {}
/// struct English;
/// impl Greeter for English {}
///
/// provides!(English => dyn Greeter);
/// ```
pub trait Provides<I: ?Sized + Send + Sync + 'static>: Any + Send + Sync {
  fn provide(self: Arc<Self>) -> Arc<I>;
}

impl<T: Any + Send + Sync> Provides<T> for T {
  fn provide(self: Arc<Self>) -> Arc<T> {
    self
  }
}

type ViewFn = fn(Arc<dyn Any + Send + Sync>) -> Option<Box<dyn Any + Send + Sync>>;

static VIEWS: Lazy<DashMap<(TypeId, TypeId), ViewFn>> = Lazy::new(DashMap::new);

fn cast<C, I>(value: Arc<dyn Any + Send + Sync>) -> Option<Box<dyn Any + Send + Sync>>
where
  C: Provides<I>,
  I: ?Sized + Send + Sync + 'static,
{
  let concrete = value.downcast::<C>().ok()?;
  let provided: Box<dyn Any + Send + Sync> = Box::new(Provides::<I>::provide(concrete));
  Some(provided)
}

/// Records that `C` can be viewed as an `I`.
pub fn register_view<C, I>()
where
  C: Provides<I>,
  I: ?Sized + Send + Sync + 'static,
{
  let key = (TypeId::of::<C>(), TypeId::of::<I>());
  if !VIEWS.contains_key(&key) {
    VIEWS.entry(key).or_insert(cast::<C, I>);
  }
}

/// `true` if a value of the concrete type `concrete` can be served as `target`.
pub(crate) fn is_assignable(concrete: TypeId, target: TypeId) -> bool {
  concrete == target || VIEWS.contains_key(&(concrete, target))
}

/// Views `value`, whose concrete type is `concrete`, as an `Arc<I>`.
pub(crate) fn view<I>(value: &Arc<dyn Any + Send + Sync>, concrete: TypeId) -> Option<Arc<I>>
where
  I: ?Sized + Send + Sync + 'static,
{
  // Copy the fn pointer out so the shard lock is released before the call.
  let view = *VIEWS.get(&(concrete, TypeId::of::<I>()))?;
  let boxed = view(Arc::clone(value))?;
  boxed.downcast::<Arc<I>>().ok().map(|arc| *arc)
}
