use crate::key::Key;
use thiserror::Error;

/// A boxed error raised by user code: constructors, value factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type for `fibre_binder` operations.
///
/// There are two kinds of failure. Configuration errors are discovered while
/// building a `Context` (or when a key is looked up that was never bound).
/// Creation errors happen at runtime when a generator or a constructor fails.
#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid configuration: {0}")]
  Configuration(String),

  #[error(
    "{count} binding(s) could not be built:{summary}",
    count = .failures.len(),
    summary = summarize(.failures)
  )]
  Build { failures: Vec<(Key, Error)> },

  #[error("error creating a new instance of {type_name}: {source}")]
  Creation {
    type_name: &'static str,
    #[source]
    source: BoxError,
  },
}

/// A specialized `Result` type for `fibre_binder` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub(crate) fn config(message: impl Into<String>) -> Self {
    Error::Configuration(message.into())
  }

  pub(crate) fn creation(type_name: &'static str, source: impl Into<BoxError>) -> Self {
    Error::Creation {
      type_name,
      source: source.into(),
    }
  }

  /// `true` for failures discovered at build time.
  pub fn is_configuration(&self) -> bool {
    matches!(self, Error::Configuration(_) | Error::Build { .. })
  }

  /// `true` for failures raised while producing an instance.
  pub fn is_creation(&self) -> bool {
    matches!(self, Error::Creation { .. })
  }

  /// Every binding that failed, when this error came out of `ContextBuilder::build`.
  pub fn failures(&self) -> &[(Key, Error)] {
    match self {
      Error::Build { failures } => failures,
      _ => &[],
    }
  }
}

fn summarize(failures: &[(Key, Error)]) -> String {
  failures
    .iter()
    .map(|(key, error)| format!("\n  {}: {}", key, error))
    .collect()
}
