use fibre_binder::{ContextBuilder, Key, Scope};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn tracker() -> RequestTracker {
  let id = ID_COUNTER.fetch_add(1, Ordering::SeqCst);
  println!("Creating RequestTracker #{}...", id);
  RequestTracker { id }
}

fn main() {
  let mut builder = ContextBuilder::new();

  // Created once and shared by every alias.
  builder
    .bind_named::<RequestTracker>("shared")
    .to_value(tracker)
    .with_scope(Scope::ContextGlobal);
  builder
    .bind_named::<RequestTracker>("shared_alias")
    .reference("shared");

  // Created on every request.
  builder
    .bind_named::<RequestTracker>("transient")
    .to_value(tracker)
    .with_scope(Scope::AlwaysCreateNew);

  // Cached separately by each alias.
  builder
    .bind_named::<RequestTracker>("per_binding")
    .to_value(tracker)
    .with_scope(Scope::OnePerBinding);
  builder
    .bind_named::<RequestTracker>("worker_a")
    .reference(Key::named("per_binding"));
  builder
    .bind_named::<RequestTracker>("worker_b")
    .reference(Key::named("per_binding"));

  let context = builder.build().expect("configuration is valid");
  let get = |name: &str| -> Arc<RequestTracker> {
    context
      .require_named::<RequestTracker>(name)
      .expect("tracker is bound")
  };

  println!("--- ContextGlobal ---");
  let s1 = get("shared");
  let s2 = get("shared_alias");
  println!("shared: {}, shared_alias: {}", s1.id, s2.id);
  assert!(Arc::ptr_eq(&s1, &s2));

  println!("\n--- AlwaysCreateNew ---");
  let t1 = get("transient");
  let t2 = get("transient");
  println!("transient: {} then {}", t1.id, t2.id);
  assert!(!Arc::ptr_eq(&t1, &t2));

  println!("\n--- OnePerBinding ---");
  let a1 = get("worker_a");
  let a2 = get("worker_a");
  let b = get("worker_b");
  println!("worker_a: {} and {}, worker_b: {}", a1.id, a2.id, b.id);
  assert!(Arc::ptr_eq(&a1, &a2));
  assert!(!Arc::ptr_eq(&a1, &b));
}
