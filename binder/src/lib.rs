//! # Fibre Binder
//!
//! A declarative, thread-safe object-graph container for Rust.
//!
//! Bindings are declared up front on a [`ContextBuilder`]: each key (a type or
//! a property name) is bound to a concrete component, a value factory, a
//! pre-built object, an alias of another key or an explicit null, together
//! with a [`Scope`] that decides how often instances are created. Building the
//! configuration produces an immutable [`Context`] that hands out fully wired
//! instances, resolving constructor parameters transitively.
//!
//! ## Core Concepts
//!
//! - **Component**: a concrete type that lists its constructors and the
//!   parameters each of them needs.
//! - **Scope**: `AlwaysCreateNew`, `OnePerBinding` or `ContextGlobal`.
//! - **Aliases**: a key may refer to another key, possibly declared later.
//! - **Inheritance**: a configuration can adopt the bindings of another one
//!   and override some of them.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_binder::{provides, Component, Constructor, ContextBuilder, Scope};
//! use std::sync::Arc;
//!
//! trait Repository: Send + Sync {
//!   fn url(&self) -> String;
//! }
//!
//! struct PgRepository {
//!   url: String,
//! }
//!
//! impl Repository for PgRepository {
//!   fn url(&self) -> String {
//!     self.url.clone()
//!   }
//! }
//!
//! impl Component for PgRepository {
//!   fn constructors() -> Vec<Constructor<Self>> {
//!     vec![Constructor::new(|args| Ok(PgRepository { url: args.value(0)? })).requires::<String>("db_url")]
//!   }
//! }
//!
//! provides!(PgRepository => dyn Repository);
//!
//! struct UserService {
//!   repository: Arc<dyn Repository>,
//! }
//!
//! impl Component for UserService {
//!   fn constructors() -> Vec<Constructor<Self>> {
//!     vec![Constructor::new(|args| Ok(UserService { repository: args.get::<dyn Repository>(0)? })).param::<dyn Repository>()]
//!   }
//! }
//!
//! let mut builder = ContextBuilder::new();
//! builder.bind_property("db_url", String::from("postgres://localhost/app"));
//! builder
//!   .bind::<dyn Repository>()
//!   .to::<PgRepository>()
//!   .with_scope(Scope::ContextGlobal);
//! builder.register::<UserService>();
//!
//! let context = builder.build().unwrap();
//! let service = context.require::<UserService>().unwrap();
//! assert_eq!(service.repository.url(), "postgres://localhost/app");
//! ```

mod binding;
mod builder;
mod component;
pub mod config;
mod context;
mod error;
mod generator;
mod global;
mod guard;
mod instance;
mod key;
mod macros;
mod resolver;
mod scope;
mod view;

pub use binding::Binding;
pub use builder::{BindingBuilder, ContextBuilder};
pub use component::{Arguments, Component, Constructor, Param};
pub use config::{configure_new, ConfigRegistry, ContextConfig};
pub use context::Context;
pub use error::{BoxError, Error, Result};
pub use generator::InstanceGenerator;
pub use global::{global, init_from_env, reset_global, set_global, try_global};
pub use instance::Instance;
pub use key::{Key, TypeKey};
pub use scope::Scope;
pub use view::{register_view, Provides};
