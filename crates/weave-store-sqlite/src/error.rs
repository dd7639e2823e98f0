//! Error type for `weave-store-sqlite`.

use thiserror::Error;
use weave_core::store::DomainError;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rule was violated (not found, duplicate, not allowed, ...).
  #[error(transparent)]
  Core(#[from] weave_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("corrupt row: {0}")]
  Corrupt(String),
}

impl DomainError for Error {
  fn domain(&self) -> Option<&weave_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
