use fibre_binder::config::configure_named;
use fibre_binder::{ConfigRegistry, ContextBuilder, ContextConfig, Scope};

// Settings shared by every deployment.
#[derive(Default)]
struct Defaults;

impl ContextConfig for Defaults {
  fn configure(&self, builder: &mut ContextBuilder) {
    builder.set_default_scope(Scope::ContextGlobal);
    builder.bind_property("db_host", String::from("localhost"));
    builder.bind_property("db_port", 5432u16);
    builder.bind_property("workers", 2usize);
  }
}

// Production only changes what differs from the defaults.
#[derive(Default)]
struct Production;

impl ContextConfig for Production {
  fn configure(&self, builder: &mut ContextBuilder) {
    builder.bind_property("db_host", String::from("db.internal"));
    builder.bind_property("workers", 16usize);
    builder.inherit_from(&Defaults);
  }
}

fn main() {
  let mut registry = ConfigRegistry::new();
  registry
    .register("defaults", || Box::new(Defaults) as Box<dyn ContextConfig>)
    .register("production", || Box::new(Production) as Box<dyn ContextConfig>);

  for name in ["defaults", "production"] {
    let context = configure_named(&registry, name).expect("configuration is valid");
    let host = context.require_named::<String>("db_host").expect("db_host is bound");
    let port = context.require_named::<u16>("db_port").expect("db_port is bound");
    let workers = context.require_named::<usize>("workers").expect("workers is bound");
    println!("{:<10} -> {}:{} with {} workers", name, host, port, workers);
  }
}
