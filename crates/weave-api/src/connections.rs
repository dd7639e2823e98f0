//! Handlers for `/connections` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/connections` | Users connected to the caller |
//! | `GET`    | `/connections/pending` | Invitations addressed to the caller |
//! | `GET`    | `/connections/suggestions` | Users with no relation to the caller |
//! | `POST`   | `/connections` | Body: `{"to":"<uuid>"}`; 201, or 200 when repeated |
//! | `PATCH`  | `/connections/:id` | Body: `{"status":"connected"}` |
//! | `DELETE` | `/connections/:id` | Reject, cancel or disconnect |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use uuid::Uuid;
use weave_core::{
  connection::{Connection, Deleted, Invitation, NewConnection, Requested, StatusUpdate},
  page::{CONNECTIONS_LIMIT, PENDING_LIMIT, PageParams, SUGGESTIONS_LIMIT},
  store::SocialStore,
  user::UserSummary,
};

use crate::{
  caller::Viewer,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
};

// ─── Lists ───────────────────────────────────────────────────────────────────

/// `GET /connections`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Viewer(me): Viewer,
  ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Vec<UserSummary>>, ApiError>
where
  S: SocialStore + 'static,
{
  let users = store
    .list_connections(me.id, page.or_default(CONNECTIONS_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(users))
}

/// `GET /connections/pending`
pub async fn pending<S>(
  State(store): State<Arc<S>>,
  Viewer(me): Viewer,
  ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Vec<Invitation>>, ApiError>
where
  S: SocialStore + 'static,
{
  let invitations = store
    .list_pending(me.id, page.or_default(PENDING_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(invitations))
}

/// `GET /connections/suggestions`
pub async fn suggestions<S>(
  State(store): State<Arc<S>>,
  Viewer(me): Viewer,
  ApiQuery(page): ApiQuery<PageParams>,
) -> Result<Json<Vec<UserSummary>>, ApiError>
where
  S: SocialStore + 'static,
{
  let users = store
    .list_suggestions(me.id, page.or_default(SUGGESTIONS_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(users))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /connections`, body: `{"to":"<uuid>"}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Viewer(me): Viewer,
  ApiJson(body): ApiJson<NewConnection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SocialStore + 'static,
{
  let requested = store
    .create_connection(me.id, body.to)
    .await
    .map_err(ApiError::from_store)?;
  let status = match requested {
    Requested::Created(_) => StatusCode::CREATED,
    Requested::Existing(_) => StatusCode::OK,
  };
  Ok((status, Json(requested.into_connection())))
}

// ─── Update / delete ─────────────────────────────────────────────────────────

/// `PATCH /connections/:id`, body: `{"status":"connected"}`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Viewer(me): Viewer,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<Connection>, ApiError>
where
  S: SocialStore + 'static,
{
  let connection = store
    .update_connection(id, me.id, body.status)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(connection))
}

/// `DELETE /connections/:id`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  Viewer(me): Viewer,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Deleted>, ApiError>
where
  S: SocialStore + 'static,
{
  store
    .delete_connection(id, me.id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(Deleted { deleted: id }))
}
