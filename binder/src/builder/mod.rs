//! Build-time configuration: binding builders and the context builder that
//! owns them.

mod binding;
mod context;

pub use binding::BindingBuilder;
pub use context::ContextBuilder;

pub(crate) use binding::PendingBinding;

use crate::context::Registry;
use crate::error::{Error, Result};
use crate::key::{Key, TypeKey};
use crate::scope::Scope;
use std::collections::HashMap;
use std::sync::Weak;

/// What `ContextBuilder::build` knows about every declared binding before any
/// of them is finalized.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
  /// The concrete type produced, when the binding names one directly.
  pub(crate) concrete: Option<TypeKey>,
  pub(crate) null: bool,
  pub(crate) reference: Option<Key>,
}

#[derive(Debug, Default)]
pub(crate) struct Catalog {
  entries: HashMap<Key, Entry>,
}

impl Catalog {
  pub(crate) fn insert(&mut self, key: Key, entry: Entry) {
    self.entries.insert(key, entry);
  }

  pub(crate) fn contains(&self, key: &Key) -> bool {
    self.entries.contains_key(key)
  }

  /// Follows alias chains from `key` to the binding that actually produces
  /// instances.
  pub(crate) fn follow(&self, key: &Key) -> Result<&Entry> {
    let mut path = vec![key.clone()];
    let mut current = key;
    loop {
      let entry = self.entries.get(current).ok_or_else(|| {
        if path.len() == 1 {
          Error::config(format!("{} is not bound", current))
        } else {
          Error::config(format!("alias target {} is not bound", current))
        }
      })?;
      let Some(next) = &entry.reference else {
        return Ok(entry);
      };
      if path.contains(next) {
        path.push(next.clone());
        let chain = path.iter().map(Key::to_string).collect::<Vec<_>>().join(" -> ");
        return Err(Error::config(format!("circular alias: {}", chain)));
      }
      path.push(next.clone());
      current = next;
    }
  }
}

/// Shared state handed to every binding builder while a context is built.
pub(crate) struct BuildEnv {
  pub(crate) default_scope: Scope,
  pub(crate) catalog: Catalog,
  pub(crate) registry: Weak<Registry>,
}
