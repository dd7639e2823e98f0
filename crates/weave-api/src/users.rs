//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users` | Body: [`UserUpsert`]; `sub` must match the caller |
//! | `GET`  | `/users/me` | The caller's profile |
//! | `GET`  | `/users/search` | `?query=...[&limit=...]` |
//! | `GET`  | `/users/username/{username}` | 404 if not found |
//! | `GET`  | `/users/{id}` | 404 if not found |
//! | `GET`  | `/users/{id}/connections` | `?page&limit`, default limit 50 |
//! | `GET`  | `/users/{id}/posts` | `?page&limit`, default limit 50 |
//! | `GET`  | `/users/{id}/comments` | `?page&limit`, default limit 50 |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
};
use serde::Deserialize;
use uuid::Uuid;
use weave_core::{
  page::{CONNECTIONS_LIMIT, POSTS_LIMIT, PageParams},
  post::{Comment, Post},
  store::SocialStore,
  user::{User, UserSummary, UserUpsert},
};

use crate::{
  caller::{Caller, Viewer},
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
};

const SEARCH_LIMIT: u32 = 20;

// ─── Upsert ──────────────────────────────────────────────────────────────────

/// `POST /users`: create or update the caller's own profile.
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  caller: Caller,
  ApiJson(body): ApiJson<UserUpsert>,
) -> Result<Json<User>, ApiError>
where
  S: SocialStore + 'static,
{
  if body.sub != caller.sub {
    return Err(ApiError::Forbidden(
      "profile subject does not match the bearer token".into(),
    ));
  }
  let user = store.upsert_user(body).await.map_err(ApiError::from_store)?;
  Ok(Json(user))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /users/me`
pub async fn me<S>(Viewer(user): Viewer) -> Result<Json<User>, ApiError>
where
  S: SocialStore + 'static,
{
  Ok(Json(user))
}

/// `GET /users/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  _viewer: Viewer,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<User>, ApiError>
where
  S: SocialStore + 'static,
{
  let user = store
    .get_user(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user))
}

/// `GET /users/username/{username}`
pub async fn by_username<S>(
  State(store): State<Arc<S>>,
  _viewer: Viewer,
  ApiPath(username): ApiPath<String>,
) -> Result<Json<User>, ApiError>
where
  S: SocialStore + 'static,
{
  let user = store
    .get_user_by_username(&username)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {username:?} not found")))?;
  Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub query: String,
  pub limit: Option<u32>,
}

/// `GET /users/search?query=...`
pub async fn search<S>(
  State(store): State<Arc<S>>,
  _viewer: Viewer,
  ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Vec<UserSummary>>, ApiError>
where
  S: SocialStore + 'static,
{
  let users = store
    .search_users(&params.query, params.limit.unwrap_or(SEARCH_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(users))
}

// ─── Per-user collections ────────────────────────────────────────────────────

async fn require_user<S>(store: &S, id: Uuid) -> Result<(), ApiError>
where
  S: SocialStore,
{
  store
    .get_user(id)
    .await
    .map_err(ApiError::from_store)?
    .map(|_| ())
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
}

/// `GET /users/{id}/connections`
pub async fn connections<S>(
  State(store): State<Arc<S>>,
  _viewer: Viewer,
  ApiPath(id): ApiPath<Uuid>,
  ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Vec<UserSummary>>, ApiError>
where
  S: SocialStore + 'static,
{
  require_user(store.as_ref(), id).await?;
  let users = store
    .list_connections(id, page.or_default(CONNECTIONS_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(users))
}

/// `GET /users/{id}/posts`
pub async fn posts<S>(
  State(store): State<Arc<S>>,
  Viewer(viewer): Viewer,
  ApiPath(id): ApiPath<Uuid>,
  ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: SocialStore + 'static,
{
  require_user(store.as_ref(), id).await?;
  let posts = store
    .user_posts(viewer.id, id, page.or_default(POSTS_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(posts))
}

/// `GET /users/{id}/comments`
pub async fn comments<S>(
  State(store): State<Arc<S>>,
  _viewer: Viewer,
  ApiPath(id): ApiPath<Uuid>,
  ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: SocialStore + 'static,
{
  require_user(store.as_ref(), id).await?;
  let comments = store
    .user_comments(id, page.or_default(POSTS_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(comments))
}
