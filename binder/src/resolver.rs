//! Constructor selection and parameter resolution.

use crate::binding::Binding;
use crate::builder::{BuildEnv, PendingBinding};
use crate::component::{Param, Signature};
use crate::error::{Error, Result};
use crate::key::{Key, TypeKey};
use crate::scope::Scope;
use crate::view;
use std::collections::HashMap;
use tracing::trace;

/// Picks the constructor of `concrete` to use.
///
/// A single constructor is always selected. With several, exactly one must be
/// marked with `inject()`.
pub(crate) fn select_constructor(concrete: TypeKey, signatures: &[Signature<'_>]) -> Result<usize> {
  match signatures.len() {
    0 => Err(Error::config(format!("{} has no public constructor", concrete))),
    1 => Ok(0),
    count => {
      let designated: Vec<usize> = signatures
        .iter()
        .enumerate()
        .filter(|(_, signature)| signature.designated)
        .map(|(index, _)| index)
        .collect();
      match designated.as_slice() {
        [index] => Ok(*index),
        _ => Err(Error::config(format!(
          "ambiguous constructor selection for {}: {} constructors and {} marked with inject()",
          concrete,
          count,
          designated.len()
        ))),
      }
    }
  }
}

/// Counts how often each unnamed parameter type occurs in `params`.
pub(crate) fn unnamed_type_counts(params: &[Param]) -> HashMap<TypeKey, usize> {
  let mut counts = HashMap::new();
  for param in params.iter().filter(|param| param.required_name().is_none()) {
    *counts.entry(param.param_type()).or_insert(0) += 1;
  }
  counts
}

/// Resolves every parameter of the selected constructor of `concrete` to a
/// binding, in declaration order.
///
/// Overrides are consumed as they are used. Whatever is left in `overrides`
/// afterwards did not match any parameter.
pub(crate) fn resolve_params(
  concrete: TypeKey,
  params: &[Param],
  overrides: &mut Vec<PendingBinding>,
  env: &BuildEnv,
  scope: Scope,
) -> Result<Vec<Binding>> {
  let counts = unnamed_type_counts(params);
  let repeated = params
    .iter()
    .filter(|param| param.required_name().is_none())
    .find(|param| counts[&param.param_type()] > 1);
  if let Some(param) = repeated {
    return Err(Error::config(format!(
      "constructor of {} takes several unnamed parameters of type {}; use requires(name) to tell them apart",
      concrete,
      param.param_type()
    )));
  }

  params
    .iter()
    .enumerate()
    .map(|(position, param)| resolve_param(concrete, position, param, overrides, env, scope))
    .collect()
}

fn resolve_param(
  concrete: TypeKey,
  position: usize,
  param: &Param,
  overrides: &mut Vec<PendingBinding>,
  env: &BuildEnv,
  scope: Scope,
) -> Result<Binding> {
  let key = param.key();

  if let Some(pending) = take_override(param, overrides) {
    trace!(%concrete, position, key = %pending.key(), "parameter resolved by override");
    return pending.build(env, scope);
  }

  if env.catalog.contains(&key) {
    let target = env.catalog.follow(&key)?;
    if target.null && !param.is_optional() {
      return Err(Error::config(format!(
        "parameter {} of {} requires {}, which is bound to null",
        position, concrete, key
      )));
    }
    if let Some(produced) = target.concrete {
      if !view::is_assignable(produced.id(), param.param_type().id()) {
        return Err(Error::config(format!(
          "parameter {} of {} requires {} as {}, but it is bound to a {}; if a {} does provide {}, declare it with ContextBuilder::expose::<{}, {}>()",
          position,
          concrete,
          key,
          param.param_type(),
          produced,
          produced,
          param.param_type(),
          produced,
          param.param_type()
        )));
      }
    }
    trace!(%concrete, position, %key, "parameter resolved from the context");
    return Ok(Binding::reference(
      key.clone(),
      param.param_type(),
      key,
      env.registry.clone(),
    ));
  }

  if param.is_optional() {
    trace!(%concrete, position, %key, "optional parameter left unbound");
    return Ok(Binding::null(key, param.param_type()));
  }

  Err(Error::config(format!(
    "no binding for {} required by parameter {} of {}",
    key, position, concrete
  )))
}

/// Removes and returns the override for `param`: by its required name first,
/// then by its type.
fn take_override(param: &Param, overrides: &mut Vec<PendingBinding>) -> Option<PendingBinding> {
  let by_name = param.required_name().map(Key::named);
  let by_type = Key::Type(param.param_type());
  let index = by_name
    .and_then(|name| overrides.iter().position(|pending| *pending.key() == name))
    .or_else(|| overrides.iter().position(|pending| *pending.key() == by_type))?;
  Some(overrides.remove(index))
}
