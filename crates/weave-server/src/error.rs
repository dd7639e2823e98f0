//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("invalid token digest for subject {sub:?}: {reason}")]
  InvalidDigest { sub: String, reason: String },
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "missing or unknown bearer token" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Bearer realm=\"weave\""),
        );
        res
      }
      Error::InvalidDigest { .. } => (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": self.to_string() })),
      )
        .into_response(),
    }
  }
}
