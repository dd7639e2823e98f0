//! Handlers for `/posts` endpoints, including comments and likes.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/posts` | Every post, newest first |
//! | `GET`    | `/posts/feed` | The caller's and their connections' posts |
//! | `POST`   | `/posts` | Body: `{"content":"...","imageUrl":"..."}` |
//! | `GET`    | `/posts/:id/comments` | Oldest first, default limit 20 |
//! | `POST`   | `/posts/:id/comments` | Body: `{"content":"..."}` |
//! | `POST`   | `/posts/:id/like` | Returns `{"likes":n}` |
//! | `DELETE` | `/posts/:id/like` | Returns `{"likes":n}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use uuid::Uuid;
use weave_core::{
  page::{COMMENTS_LIMIT, POSTS_LIMIT, PageParams},
  post::{Comment, LikeCount, NewComment, NewPost, Post},
  store::SocialStore,
};

use crate::{
  caller::Viewer,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
};

// ─── Posts ───────────────────────────────────────────────────────────────────

/// `GET /posts`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Viewer(me): Viewer,
  ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: SocialStore + 'static,
{
  let posts = store
    .list_posts(me.id, page.or_default(POSTS_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(posts))
}

/// `GET /posts/feed`
pub async fn feed<S>(
  State(store): State<Arc<S>>,
  Viewer(me): Viewer,
  ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: SocialStore + 'static,
{
  let posts = store
    .feed(me.id, page.or_default(POSTS_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(posts))
}

/// `POST /posts`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Viewer(me): Viewer,
  ApiJson(body): ApiJson<NewPost>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SocialStore + 'static,
{
  let post = store
    .create_post(me.id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(post)))
}

// ─── Comments ────────────────────────────────────────────────────────────────

/// `GET /posts/:id/comments`
pub async fn comments<S>(
  State(store): State<Arc<S>>,
  _viewer: Viewer,
  ApiPath(id): ApiPath<Uuid>,
  ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: SocialStore + 'static,
{
  let comments = store
    .list_comments(id, page.or_default(COMMENTS_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(comments))
}

/// `POST /posts/:id/comments`
pub async fn add_comment<S>(
  State(store): State<Arc<S>>,
  Viewer(me): Viewer,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<NewComment>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SocialStore + 'static,
{
  let comment = store
    .add_comment(id, me.id, body.content)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}

// ─── Likes ───────────────────────────────────────────────────────────────────

/// `POST /posts/:id/like`
pub async fn like<S>(
  State(store): State<Arc<S>>,
  Viewer(me): Viewer,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<LikeCount>, ApiError>
where
  S: SocialStore + 'static,
{
  let count = store
    .like_post(id, me.id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(count))
}

/// `DELETE /posts/:id/like`
pub async fn unlike<S>(
  State(store): State<Arc<S>>,
  Viewer(me): Viewer,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<LikeCount>, ApiError>
where
  S: SocialStore + 'static,
{
  let count = store
    .unlike_post(id, me.id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(count))
}
