//! Client error taxonomy.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  /// The request never produced a response (connect, timeout, TLS, ...).
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  /// The server answered with a non-2xx status.
  #[error("server returned {status}: {message}")]
  Api { status: StatusCode, message: String },

  /// A 2xx response whose body did not match the expected schema.
  #[error("unexpected response from {endpoint}: {source}")]
  Decode {
    endpoint: String,
    #[source]
    source:   serde_json::Error,
  },

  /// A mutation was attempted without a usable identifier.
  #[error("missing precondition: {0}")]
  MissingPrecondition(String),

  /// The configured base URL cannot be extended into a request URL.
  #[error("invalid url: {0}")]
  InvalidUrl(String),

  #[error("operation cancelled")]
  Cancelled,

  /// The token provider could not supply a bearer token.
  #[error("no bearer token: {0}")]
  Token(String),
}

impl ClientError {
  /// HTTP status of a server-reported failure.
  pub fn status(&self) -> Option<StatusCode> {
    match self {
      Self::Api { status, .. } => Some(*status),
      _ => None,
    }
  }

  pub fn is_client_error(&self) -> bool {
    self.status().is_some_and(|s| s.is_client_error())
  }

  pub fn is_server_error(&self) -> bool {
    self.status().is_some_and(|s| s.is_server_error())
  }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
