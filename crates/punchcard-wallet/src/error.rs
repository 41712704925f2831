//! Error type for `punchcard-wallet`.

use punchcard_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The provider could not be reached or answered with a transport-level
  /// failure.
  #[error("upstream service error: {0}")]
  Upstream(String),

  /// Writing the reward ledger failed.
  #[error("{source}")]
  Store {
    kind:   ErrorKind,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl Error {
  pub(crate) fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    Self::Store { kind: err.kind(), source: Box::new(err) }
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Upstream(_) => ErrorKind::Internal,
      Error::Store { kind, .. } => *kind,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
