//! Bearer-token sources.
//!
//! Tokens come from an external identity provider. The client asks for one
//! before every operation and never caches or refreshes it.

use std::future::Future;

use crate::error::{ClientError, Result};

pub trait TokenProvider: Send + Sync {
  fn token(&self) -> impl Future<Output = Result<String>> + Send + '_;
}

/// A token fixed at construction, e.g. from a flag or config file.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
  pub fn new(token: impl Into<String>) -> Self { Self(token.into()) }
}

impl TokenProvider for StaticToken {
  async fn token(&self) -> Result<String> {
    if self.0.trim().is_empty() {
      return Err(ClientError::Token("no token configured".into()));
    }
    Ok(self.0.clone())
  }
}
