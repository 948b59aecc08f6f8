use fibre_binder::config::{configure_from_env, CONFIG_ENV_VAR};
use fibre_binder::{init_from_env, reset_global, try_global, ConfigRegistry, ContextBuilder};

fn registry() -> ConfigRegistry {
  let mut registry = ConfigRegistry::new();
  registry.register("production", || {
    Box::new(|builder: &mut ContextBuilder| {
      builder.bind_property("workers", 8usize);
    }) as Box<dyn fibre_binder::ContextConfig>
  });
  registry.register("broken", || {
    Box::new(|builder: &mut ContextBuilder| {
      builder.bind::<usize>();
    }) as Box<dyn fibre_binder::ContextConfig>
  });
  registry
}

// Environment variables are process state, so the whole bootstrap sequence
// runs in a single test.
#[test]
fn test_bootstrap_from_environment() {
  let registry = registry();

  // Unset: the global context falls back to an empty one.
  std::env::remove_var(CONFIG_ENV_VAR);
  assert!(configure_from_env(&registry).is_err());
  let context = init_from_env(&registry).unwrap();
  assert!(context.is_empty());
  assert!(try_global().is_some());
  reset_global();

  // An empty value counts as unset.
  std::env::set_var(CONFIG_ENV_VAR, "");
  let context = init_from_env(&registry).unwrap();
  assert!(context.is_empty());
  assert!(try_global().unwrap().is_empty());
  reset_global();

  // A registered name builds and installs that configuration.
  std::env::set_var(CONFIG_ENV_VAR, "production");
  let context = init_from_env(&registry).unwrap();
  assert_eq!(*context.require_named::<usize>("workers").unwrap(), 8);
  assert_eq!(
    *try_global().unwrap().require_named::<usize>("workers").unwrap(),
    8
  );
  reset_global();

  // A configuration that fails to build is reported and nothing is installed.
  std::env::set_var(CONFIG_ENV_VAR, "broken");
  let error = init_from_env(&registry).unwrap_err();
  assert!(error.is_configuration());
  assert!(try_global().is_none());

  // An unknown name is a configuration error.
  std::env::set_var(CONFIG_ENV_VAR, "staging");
  assert!(configure_from_env(&registry)
    .unwrap_err()
    .to_string()
    .contains("`staging`"));

  std::env::remove_var(CONFIG_ENV_VAR);
}
