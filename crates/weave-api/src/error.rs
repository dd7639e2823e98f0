//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use weave_core::{Error as CoreError, store::DomainError};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing caller identity")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a store failure onto a response class, keeping the domain message.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    let mapped = e.domain().and_then(|domain| {
      let message = domain.to_string();
      match domain {
        CoreError::UserNotFound(_)
        | CoreError::ConnectionNotFound(_)
        | CoreError::PostNotFound(_) => Some(ApiError::NotFound(message)),
        CoreError::SelfConnection
        | CoreError::InvalidTransition { .. }
        | CoreError::UnknownStatus(_)
        | CoreError::InvalidInput(_) => Some(ApiError::BadRequest(message)),
        CoreError::DuplicateConnection(..) => Some(ApiError::Conflict(message)),
        CoreError::NotParticipant { .. } => Some(ApiError::Forbidden(message)),
      }
    });
    mapped.unwrap_or_else(|| ApiError::Store(Box::new(e)))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match &self {
      ApiError::Unauthorized => "unauthorized".to_owned(),
      ApiError::Forbidden(m)
      | ApiError::NotFound(m)
      | ApiError::BadRequest(m)
      | ApiError::Conflict(m) => m.clone(),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        e.to_string()
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
