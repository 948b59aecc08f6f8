use fibre_binder::{provides, Component, Constructor, ContextBuilder, Error, Key, Scope};
use pretty_assertions::assert_eq;
use std::sync::Arc;

// --- Test Fixtures ---

trait Transport: Send + Sync {
  fn name(&self) -> &'static str;
}

#[derive(Default)]
struct Tcp;
impl Transport for Tcp {
  fn name(&self) -> &'static str {
    "tcp"
  }
}
impl Component for Tcp {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::from_default()]
  }
}

#[derive(Default)]
struct Udp;
impl Transport for Udp {
  fn name(&self) -> &'static str {
    "udp"
  }
}
impl Component for Udp {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::from_default()]
  }
}

provides!(Tcp => dyn Transport);
provides!(Udp => dyn Transport);

// A client whose timeout is a named property.
struct Client {
  transport: Arc<dyn Transport>,
  timeout: u64,
  label: Option<Arc<String>>,
}

impl Component for Client {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|args| {
      Ok(Client {
        transport: args.get::<dyn Transport>(0)?,
        timeout: args.value(1)?,
        label: args.optional::<String>(2)?,
      })
    })
    .param::<dyn Transport>()
    .requires::<u64>("timeout")
    .optional_named::<String>("label")]
  }
}

// Two parameters of the same type with no names to tell them apart.
struct Bridge;

impl Component for Bridge {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![Constructor::new(|_| Ok(Bridge))
      .param::<dyn Transport>()
      .param::<dyn Transport>()]
  }
}

// Several constructors, one of them designated.
struct Mailer {
  source: &'static str,
}

impl Component for Mailer {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![
      Constructor::new(|_| Ok(Mailer { source: "default" })),
      Constructor::new(|args| {
        Ok(Mailer {
          source: args.get::<dyn Transport>(0)?.name(),
        })
      })
      .param::<dyn Transport>()
      .inject(),
    ]
  }
}

// Several constructors and none designated.
struct Undecided;

impl Component for Undecided {
  fn constructors() -> Vec<Constructor<Self>> {
    vec![
      Constructor::new(|_| Ok(Undecided)),
      Constructor::new(|_| Ok(Undecided)).param::<u64>(),
    ]
  }
}

struct Abstract;

impl Component for Abstract {
  fn constructors() -> Vec<Constructor<Self>> {
    Vec::new()
  }
}

fn base_builder() -> ContextBuilder {
  let mut builder = ContextBuilder::new();
  builder.bind::<dyn Transport>().to::<Tcp>();
  builder.bind_property("timeout", 30u64);
  builder
}

fn build_error(builder: ContextBuilder) -> Error {
  builder.build().unwrap_err()
}

// --- Resolution Tests ---

#[test]
fn test_named_parameter_resolves_to_property() {
  // Arrange
  let mut builder = base_builder();
  builder.register::<Client>();
  // A type binding for u64 must not be picked for a named parameter.
  builder.bind::<u64>().to_value(|| 1u64);
  let context = builder.build().unwrap();

  // Act
  let client = context.require::<Client>().unwrap();

  // Assert
  assert_eq!(client.timeout, 30);
  assert_eq!(client.transport.name(), "tcp");
}

#[test]
fn test_optional_unbound_parameter_is_absent() {
  // Arrange
  let mut builder = base_builder();
  builder.register::<Client>();
  let context = builder.build().unwrap();

  // Act
  let client = context.require::<Client>().unwrap();

  // Assert
  assert!(client.label.is_none());
}

#[test]
fn test_optional_bound_parameter_is_present() {
  // Arrange
  let mut builder = base_builder();
  builder.register::<Client>();
  builder.bind_property("label", String::from("primary"));
  let context = builder.build().unwrap();

  // Act
  let client = context.require::<Client>().unwrap();

  // Assert
  assert_eq!(client.label.as_deref().map(String::as_str), Some("primary"));
}

#[test]
fn test_required_parameter_without_binding_fails() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.bind::<dyn Transport>().to::<Tcp>();
  builder.register::<Client>();

  // Act
  let error = build_error(builder);

  // Assert
  assert!(error.is_configuration());
  assert_eq!(error.failures().len(), 1);
  let (key, cause) = &error.failures()[0];
  assert_eq!(*key, Key::of::<Client>());
  assert!(cause.to_string().contains("no binding for property `timeout`"));
  assert!(cause.to_string().contains("Client"));
}

#[test]
fn test_required_parameter_bound_to_null_fails() {
  // Arrange
  let mut builder = base_builder();
  builder.register::<Client>();
  builder.bind::<dyn Transport>().to_null();

  // Act
  let error = build_error(builder);

  // Assert
  let message = error.to_string();
  assert!(message.contains("which is bound to null"), "{}", message);
}

#[test]
fn test_parameter_with_incompatible_binding_fails() {
  // Arrange
  let mut builder = base_builder();
  builder.register::<Client>();
  builder.bind_property("timeout", String::from("thirty"));

  // Act
  let error = build_error(builder);

  // Assert
  let message = error.to_string();
  assert!(message.contains("requires property `timeout` as u64"), "{}", message);
  assert!(message.contains("ContextBuilder::expose::<"), "{}", message);
}

#[test]
fn test_two_unnamed_parameters_of_same_type_are_ambiguous() {
  // Arrange
  let mut builder = base_builder();
  builder.register::<Bridge>();

  // Act
  let error = build_error(builder);

  // Assert
  let message = error.to_string();
  assert!(message.contains("several unnamed parameters of type"), "{}", message);
  assert!(message.contains("requires(name)"), "{}", message);
}

#[test]
fn test_designated_constructor_is_selected() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.bind::<dyn Transport>().to::<Udp>();
  builder.register::<Mailer>();
  let context = builder.build().unwrap();

  // Act
  let mailer = context.require::<Mailer>().unwrap();

  // Assert
  assert_eq!(mailer.source, "udp");
}

#[test]
fn test_undesignated_constructors_are_ambiguous() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.register::<Undecided>();

  // Act
  let error = build_error(builder);

  // Assert
  assert!(error.to_string().contains("ambiguous constructor selection"));
}

#[test]
fn test_type_without_constructor_fails() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder.register::<Abstract>();

  // Act
  let error = build_error(builder);

  // Assert
  assert!(error.to_string().contains("has no public constructor"));
}

#[test]
fn test_resolution_is_deterministic() {
  // Arrange
  let configure = |builder: &mut ContextBuilder| {
    builder.bind::<dyn Transport>().to::<Udp>();
    builder.bind_property("timeout", 5u64);
    builder.bind_property("label", String::from("edge"));
    builder
      .register::<Client>()
      .with_scope(Scope::AlwaysCreateNew);
  };

  // Act
  let observed: Vec<(&'static str, u64, Option<String>)> = (0..5)
    .map(|_| {
      let mut builder = ContextBuilder::new();
      configure(&mut builder);
      let client = builder.build().unwrap().require::<Client>().unwrap();
      (
        client.transport.name(),
        client.timeout,
        client.label.as_deref().cloned(),
      )
    })
    .collect();

  // Assert
  let expected = (0..5)
    .map(|_| ("udp", 5, Some(String::from("edge"))))
    .collect::<Vec<_>>();
  assert_eq!(observed, expected);
}

#[test]
fn test_type_override_replaces_context_binding() {
  // Arrange
  let mut builder = base_builder();
  builder
    .register::<Client>()
    .param::<dyn Transport>(|transport| {
      transport.to::<Udp>();
    });
  let context = builder.build().unwrap();

  // Act
  let client = context.require::<Client>().unwrap();

  // Assert
  assert_eq!(client.transport.name(), "udp");
  // The context-level binding is untouched.
  assert_eq!(context.require::<dyn Transport>().unwrap().name(), "tcp");
}

#[test]
fn test_named_override_replaces_property() {
  // Arrange
  let mut builder = base_builder();
  builder
    .register::<Client>()
    .param_named::<u64>("timeout", |timeout| {
      timeout.to_object(90u64);
    });
  let context = builder.build().unwrap();

  // Act
  let client = context.require::<Client>().unwrap();

  // Assert
  assert_eq!(client.timeout, 90);
  assert_eq!(*context.require_named::<u64>("timeout").unwrap(), 30);
}

#[test]
fn test_override_for_missing_parameter_fails() {
  // Arrange
  let mut builder = base_builder();
  builder
    .register::<Client>()
    .param_named::<u64>("retries", |retries| {
      retries.to_object(3u64);
    });

  // Act
  let error = build_error(builder);

  // Assert
  assert!(error
    .to_string()
    .contains("has no parameter requiring `retries`"));
}

#[test]
fn test_override_left_unused_by_a_value_binding_fails() {
  // Arrange
  let mut builder = base_builder();
  builder
    .register::<Client>()
    .param::<dyn Transport>(|transport| {
      transport.to::<Udp>();
    })
    .to_value(|| Client {
      transport: Arc::new(Tcp),
      timeout: 1,
      label: None,
    });

  // Act
  let error = build_error(builder);

  // Assert
  let message = error.to_string();
  assert!(message.contains("unused constructor parameter override(s)"), "{}", message);
  assert_eq!(error.failures().len(), 1);
}

#[test]
fn test_type_override_for_absent_parameter_fails() {
  // Arrange
  let mut builder = ContextBuilder::new();
  builder
    .bind::<dyn Transport>()
    .to::<Tcp>()
    .param::<u64>(|value| {
      value.to_object(1u64);
    });

  // Act
  let error = build_error(builder);

  // Assert
  assert!(error.to_string().contains("has no parameter of type u64"));
}

#[test]
fn test_constructor_failure_is_a_creation_error() {
  struct Fragile;

  impl Component for Fragile {
    fn constructors() -> Vec<Constructor<Self>> {
      vec![Constructor::new(|_| Err("socket refused".into()))]
    }
  }

  // Arrange
  let mut builder = ContextBuilder::new();
  builder.register::<Fragile>();
  let context = builder.build().unwrap();

  // Act
  let error = context.get_instance::<Fragile>().err().unwrap();

  // Assert
  assert!(error.is_creation());
  assert!(error.to_string().contains("Fragile"));
  assert!(error.to_string().contains("socket refused"));
}

#[test]
fn test_parameter_creation_failure_names_the_dependent_type() {
  struct Flaky;

  impl Component for Flaky {
    fn constructors() -> Vec<Constructor<Self>> {
      vec![Constructor::new(|_| Err("not today".into()))]
    }
  }

  struct Dependent;

  impl Component for Dependent {
    fn constructors() -> Vec<Constructor<Self>> {
      vec![Constructor::new(|_| Ok(Dependent)).param::<Flaky>()]
    }
  }

  // Arrange
  let mut builder = ContextBuilder::new();
  builder.register::<Flaky>();
  builder.register::<Dependent>();
  let context = builder.build().unwrap();

  // Act
  let error = context.get_instance::<Dependent>().err().unwrap();

  // Assert
  assert!(error.is_creation());
  let message = error.to_string();
  assert!(message.contains("Dependent"), "{}", message);
  assert!(message.contains("not today"), "{}", message);
}

#[test]
fn test_runtime_cycle_is_reported() {
  struct Chicken;
  struct Egg;

  impl Component for Chicken {
    fn constructors() -> Vec<Constructor<Self>> {
      vec![Constructor::new(|_| Ok(Chicken)).param::<Egg>()]
    }
  }

  impl Component for Egg {
    fn constructors() -> Vec<Constructor<Self>> {
      vec![Constructor::new(|_| Ok(Egg)).param::<Chicken>()]
    }
  }

  // Arrange
  let mut builder = ContextBuilder::new();
  builder.register::<Chicken>().with_scope(Scope::ContextGlobal);
  builder.register::<Egg>();
  let context = builder.build().unwrap();

  // Act
  let error = context.get_instance::<Chicken>().err().unwrap();

  // Assert
  assert!(error.is_creation());
  assert!(error.to_string().contains("circular dependency detected"));
}
