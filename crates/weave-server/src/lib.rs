//! HTTP server for Weave.
//!
//! Mounts [`weave_api::api_router`] under `/api` behind bearer-token
//! verification and exposes an unauthenticated `/health` check.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Json, Router, middleware, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use weave_core::store::SocialStore;

use auth::{TokenEntry, TokenVerifier, require_bearer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `WEAVE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub tokens:     Vec<TokenEntry>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       8080,
      store_path: PathBuf::from("~/.local/share/weave/weave.db"),
      tokens:     Vec::new(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~` expanded to the user's home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application state ────────────────────────────────────────────────────────

/// Everything the router needs.
pub struct AppState<S: SocialStore> {
  pub store:    Arc<S>,
  pub verifier: Arc<dyn TokenVerifier>,
}

impl<S: SocialStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), verifier: self.verifier.clone() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full server router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SocialStore + 'static,
{
  let api = weave_api::api_router(state.store.clone())
    .layer(middleware::from_fn_with_state(state.verifier.clone(), require_bearer));

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Integration tests ────────────────────────────────────────────────────────
