//! Caller identity extractors.
//!
//! Token verification happens outside this crate. Whatever layer verifies
//! the bearer token inserts a [`Caller`] into the request extensions; the
//! extractors here only read it.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use weave_core::{store::SocialStore, user::User};

use crate::error::ApiError;

/// The verified subject of the request's bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
  pub sub: String,
}

impl Caller {
  pub fn new(sub: impl Into<String>) -> Self { Self { sub: sub.into() } }
}

impl<S> FromRequestParts<Arc<S>> for Caller
where
  S: SocialStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Caller>()
      .cloned()
      .ok_or(ApiError::Unauthorized)
  }
}

/// The caller's own profile. Rejects with 403 until the caller has upserted
/// a profile.
pub struct Viewer(pub User);

impl<S> FromRequestParts<Arc<S>> for Viewer
where
  S: SocialStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let caller = Caller::from_request_parts(parts, store).await?;
    let user = store
      .get_user_by_sub(&caller.sub)
      .await
      .map_err(ApiError::from_store)?
      .ok_or_else(|| {
        ApiError::Forbidden(format!("no profile for subject {:?}; upsert first", caller.sub))
      })?;
    Ok(Viewer(user))
  }
}
