use crate::error::{Error, Result};
use crate::key::Key;
use std::cell::RefCell;

thread_local! {
  /// The bindings currently producing an instance on this thread, outermost first.
  static RESOLVING_STACK: RefCell<Vec<(usize, Key)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a binding as "being resolved" on the current thread for as long as the
/// guard lives. Entering a binding that is already on the stack means the
/// object graph has a cycle.
pub(crate) struct ResolutionGuard {
  id: usize,
}

impl ResolutionGuard {
  pub(crate) fn enter(id: usize, key: &Key) -> Result<Self> {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(start) = stack.iter().position(|(entered, _)| *entered == id) {
        let path = stack[start..]
          .iter()
          .map(|(_, key)| key.to_string())
          .chain(std::iter::once(key.to_string()))
          .collect::<Vec<_>>()
          .join(" -> ");
        return Err(Error::config(format!("circular dependency detected: {}", path)));
      }
      stack.push((id, key.clone()));
      Ok(Self { id })
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(index) = stack.iter().rposition(|(entered, _)| *entered == self.id) {
        stack.remove(index);
      }
    });
  }
}
