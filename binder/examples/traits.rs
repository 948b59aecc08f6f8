use fibre_binder::{provides, resolve, set_global, Component, Constructor, ContextBuilder, Scope};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define a concrete implementation and declare that it provides `dyn Logger`
struct ConsoleLogger {
  prefix: String,
}

impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[{}]: {}", self.prefix, message);
  }
}

impl Component for ConsoleLogger {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|args| Ok(ConsoleLogger { prefix: args.value(0)? }))
      .requires::<String>("log_prefix")]
  }
}

provides!(ConsoleLogger => dyn Logger);

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

impl Component for ReportService {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|args| {
      Ok(ReportService {
        logger: args.get::<dyn Logger>(0)?,
      })
    })
    .param::<dyn Logger>()]
  }
}

fn main() {
  // --- Configuration ---
  let mut builder = ContextBuilder::new();
  builder.bind_property("log_prefix", String::from("CONSOLE LOG"));
  builder
    .bind::<dyn Logger>()
    .to::<ConsoleLogger>()
    .with_scope(Scope::ContextGlobal);
  // The container works out ReportService's constructor arguments itself.
  builder.register::<ReportService>();

  let context = match builder.build() {
    Ok(context) => context,
    Err(err) => {
      eprintln!("{}", err);
      std::process::exit(1);
    }
  };
  set_global(context);

  // --- Resolution and Usage ---
  println!("Resolving the high-level service...");
  let report_service = resolve!(ReportService);

  println!("Using the service...");
  report_service.generate_report();
}
