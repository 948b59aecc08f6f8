//! Keys used to address bindings in a `ContextBuilder` and a `Context`.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The identity of a type, carrying its name for diagnostics.
///
/// Equality and hashing only consider the `TypeId`.
#[derive(Clone, Copy)]
pub struct TypeKey {
  id: TypeId,
  name: &'static str,
}

impl TypeKey {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
    }
  }

  pub fn id(&self) -> TypeId {
    self.id
  }

  pub fn name(&self) -> &'static str {
    self.name
  }
}

impl PartialEq for TypeKey {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "TypeKey({})", self.name)
  }
}

impl fmt::Display for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// Addresses a binding either by the type it provides or by a property name.
///
/// Name keys model "named properties": constructor parameters that declare the
/// name of the binding they require instead of relying on their type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
  Type(TypeKey),
  Name(String),
}

impl Key {
  /// The key of the binding for `T`.
  pub fn of<T: ?Sized + Any>() -> Self {
    Key::Type(TypeKey::of::<T>())
  }

  /// The key of the named property `name`.
  pub fn named(name: impl Into<String>) -> Self {
    Key::Name(name.into())
  }

  pub fn as_type(&self) -> Option<TypeKey> {
    match self {
      Key::Type(ty) => Some(*ty),
      Key::Name(_) => None,
    }
  }

  pub fn as_name(&self) -> Option<&str> {
    match self {
      Key::Type(_) => None,
      Key::Name(name) => Some(name),
    }
  }
}

impl From<TypeKey> for Key {
  fn from(ty: TypeKey) -> Self {
    Key::Type(ty)
  }
}

impl From<&str> for Key {
  fn from(name: &str) -> Self {
    Key::Name(name.to_owned())
  }
}

impl From<String> for Key {
  fn from(name: String) -> Self {
    Key::Name(name)
  }
}

impl fmt::Debug for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Key::Type(ty) => write!(f, "Key(Type({}))", ty.name()),
      Key::Name(name) => write!(f, "Key(Name({}))", name),
    }
  }
}

impl fmt::Display for Key {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Key::Type(ty) => write!(f, "type `{}`", ty.name()),
      Key::Name(name) => write!(f, "property `{}`", name),
    }
  }
}
