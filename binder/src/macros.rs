//! Public macros for resolution from the global context and for declaring
//! assignability.

/// Resolves an instance from the global context.
///
/// # Panics
///
/// Panics if the key is unbound, bound to null, or its instance cannot be
/// created. For a non-panicking version, use `global().get_instance::<T>()`.
///
/// # Examples
///
/// ```
/// use fibre_binder::{resolve, reset_global, set_global, ContextBuilder};
///
/// let mut builder = ContextBuilder::new();
/// builder.bind::<String>().to_value(|| String::from("hello"));
/// builder.bind_property("port", 8080u16);
/// set_global(builder.build().unwrap());
///
/// assert_eq!(*resolve!(String), "hello");
/// assert_eq!(*resolve!(u16, "port"), 8080);
/// reset_global();
/// ```
///
/// ```
/// use fibre_binder::{provides, resolve, reset_global, set_global, ContextBuilder};
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
/// provides!(EnglishGreeter => dyn Greeter);
///
/// let mut builder = ContextBuilder::new();
/// builder.bind::<dyn Greeter>().to_value(|| EnglishGreeter);
/// set_global(builder.build().unwrap());
///
/// let greeter = resolve!(trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
/// reset_global();
/// ```
#[macro_export]
macro_rules! resolve {
  (trait $trait_ident:ident) => {
    $crate::global()
      .require::<dyn $trait_ident>()
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required trait service {}: {}",
          std::any::type_name::<dyn $trait_ident>(),
          err
        )
      })
  };

  (trait $trait_ident:ident, $name:expr) => {
    $crate::global()
      .require_named::<dyn $trait_ident>($name)
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required trait service with name '{}': {}",
          $name, err
        )
      })
  };

  ($type:ty) => {
    $crate::global()
      .require::<$type>()
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required service {}: {}",
          std::any::type_name::<$type>(),
          err
        )
      })
  };

  ($type:ty, $name:expr) => {
    $crate::global()
      .require_named::<$type>($name)
      .unwrap_or_else(|err| {
        panic!(
          "Failed to resolve required service with name '{}': {}",
          $name, err
        )
      })
  };
}

/// Declares that a concrete type can be served as one or more other types,
/// usually trait objects.
///
/// ```
/// use fibre_binder::provides;
///
/// trait Reader: Send + Sync {}
/// trait Writer: Send + Sync {}
/// struct Buffer;
/// impl Reader for Buffer {}
/// impl Writer for Buffer {}
///
/// provides!(Buffer => dyn Reader, dyn Writer);
/// ```
#[macro_export]
macro_rules! provides {
  ($concrete:ty => $($target:ty),+ $(,)?) => {
    $(
      impl $crate::Provides<$target> for $concrete {
        fn provide(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$target> {
          self
        }
      }
    )+
  };
}
