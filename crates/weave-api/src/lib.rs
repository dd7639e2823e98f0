//! JSON REST API for Weave.
//!
//! Exposes an axum [`Router`] backed by any [`weave_core::store::SocialStore`].
//! Bearer-token verification, TLS and transport concerns belong to the
//! caller, which must insert a [`Caller`] into each request's extensions.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", weave_api::api_router(store.clone()))
//! ```

pub mod caller;
pub mod connections;
pub mod error;
pub mod extract;
pub mod posts;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use weave_core::store::SocialStore;

pub use caller::{Caller, Viewer};
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: SocialStore + 'static,
{
  Router::new()
    // Connections
    .route(
      "/connections",
      get(connections::list::<S>).post(connections::create::<S>),
    )
    .route("/connections/pending", get(connections::pending::<S>))
    .route("/connections/suggestions", get(connections::suggestions::<S>))
    .route(
      "/connections/{id}",
      patch(connections::update::<S>).delete(connections::delete::<S>),
    )
    // Users
    .route("/users", post(users::upsert::<S>))
    .route("/users/me", get(users::me::<S>))
    .route("/users/search", get(users::search::<S>))
    .route("/users/username/{username}", get(users::by_username::<S>))
    .route("/users/{id}", get(users::get_one::<S>))
    .route("/users/{id}/connections", get(users::connections::<S>))
    .route("/users/{id}/posts", get(users::posts::<S>))
    .route("/users/{id}/comments", get(users::comments::<S>))
    // Posts
    .route("/posts", get(posts::list::<S>).post(posts::create::<S>))
    .route("/posts/feed", get(posts::feed::<S>))
    .route(
      "/posts/{id}/comments",
      get(posts::comments::<S>).post(posts::add_comment::<S>),
    )
    .route(
      "/posts/{id}/like",
      post(posts::like::<S>).delete(posts::unlike::<S>),
    )
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use weave_store_sqlite::SqliteStore;

  async fn make_router() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(store))
  }

  async fn call(
    router: &Router,
    sub:    Option<&str>,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let payload = body.map(|b| b.to_string()).unwrap_or_default();
    let mut req = builder.body(Body::from(payload)).unwrap();
    if let Some(sub) = sub {
      req.extensions_mut().insert(Caller::new(sub));
    }

    let resp   = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes  = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value  = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn signup(router: &Router, sub: &str, name: &str) -> String {
    let (status, body) = call(
      router,
      Some(sub),
      "POST",
      "/users",
      Some(json!({ "sub": sub, "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["_id"].as_str().unwrap().to_owned()
  }

  // ── Identity ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_caller_is_unauthorized() {
    let router = make_router().await;
    let (status, body) = call(&router, None, "GET", "/connections", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
  }

  #[tokio::test]
  async fn profile_is_required_before_other_calls() {
    let router = make_router().await;
    let (status, _) = call(&router, Some("a"), "GET", "/users/me", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    signup(&router, "a", "Ada").await;
    let (status, me) = call(&router, Some("a"), "GET", "/users/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "Ada");
    assert_eq!(me["sub"], "a");
  }

  #[tokio::test]
  async fn upsert_for_another_subject_is_forbidden() {
    let router = make_router().await;
    let (status, _) = call(
      &router,
      Some("a"),
      "POST",
      "/users",
      Some(json!({ "sub": "b", "name": "Mallory" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn user_lookups() {
    let router = make_router().await;
    let id = signup(&router, "a", "Ada Lovelace").await;

    let (status, user) = call(&router, Some("a"), "GET", &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["username"], "ada-lovelace");

    let (status, user) =
      call(&router, Some("a"), "GET", "/users/username/ada-lovelace", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["_id"], id.as_str());

    let (status, hits) = call(&router, Some("a"), "GET", "/users/search?query=love", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let ghost = uuid::Uuid::new_v4();
    let (status, _) = call(&router, Some("a"), "GET", &format!("/users/{ghost}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Connections ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn connection_lifecycle() {
    let router = make_router().await;
    let a = signup(&router, "a", "Ada").await;
    let b = signup(&router, "b", "Bob").await;

    let (status, conn) =
      call(&router, Some("a"), "POST", "/connections", Some(json!({ "to": b }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(conn["status"], "pending");
    let id = conn["_id"].as_str().unwrap().to_owned();

    // Repeating the same request returns the same record.
    let (status, again) =
      call(&router, Some("a"), "POST", "/connections", Some(json!({ "to": b }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["_id"], id.as_str());

    // The reverse direction is a duplicate.
    let (status, _) =
      call(&router, Some("b"), "POST", "/connections", Some(json!({ "to": a }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, pending) = call(&router, Some("b"), "GET", "/connections/pending", None).await;
    assert_eq!(pending[0]["_id"], id.as_str());
    assert_eq!(pending[0]["from"]["_id"], a.as_str());

    // Only the recipient may accept.
    let uri = format!("/connections/{id}");
    let accept = json!({ "status": "connected" });
    let (status, _) = call(&router, Some("a"), "PATCH", &uri, Some(accept.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, conn) = call(&router, Some("b"), "PATCH", &uri, Some(accept)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conn["status"], "connected");

    let (status, _) =
      call(&router, Some("b"), "PATCH", &uri, Some(json!({ "status": "pending" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, conns) = call(&router, Some("a"), "GET", "/connections", None).await;
    assert_eq!(conns[0]["_id"], b.as_str());
    let (_, theirs) =
      call(&router, Some("a"), "GET", &format!("/users/{b}/connections"), None).await;
    assert_eq!(theirs[0]["_id"], a.as_str());

    let (status, deleted) = call(&router, Some("a"), "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted"], id.as_str());
    let (status, _) = call(&router, Some("a"), "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn self_connection_is_a_bad_request() {
    let router = make_router().await;
    let a = signup(&router, "a", "Ada").await;
    let (status, body) =
      call(&router, Some("a"), "POST", "/connections", Some(json!({ "to": a }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn malformed_input_is_a_json_bad_request() {
    let router = make_router().await;
    signup(&router, "a", "Ada").await;
    let b = signup(&router, "b", "Bob").await;
    let (_, conn) =
      call(&router, Some("a"), "POST", "/connections", Some(json!({ "to": b }))).await;
    let uri = format!("/connections/{}", conn["_id"].as_str().unwrap());

    let cases = [
      ("PATCH", uri.as_str(), Some(json!({ "status": "rejected" }))),
      ("POST", "/connections", Some(json!({ "to": "not-a-uuid" }))),
      ("GET", "/connections?page=abc", None),
      ("DELETE", "/connections/not-a-uuid", None),
      ("GET", "/users/search?limit=-1", None),
    ];
    for (method, uri, body) in cases {
      let (status, body) = call(&router, Some("a"), method, uri, body).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
      assert!(body["error"].is_string(), "{method} {uri}: {body}");
    }
  }

  #[tokio::test]
  async fn lists_honour_limit() {
    let router = make_router().await;
    signup(&router, "me", "Me").await;
    for i in 0..4 {
      signup(&router, &format!("u{i}"), &format!("User {i}")).await;
    }

    let (_, page) =
      call(&router, Some("me"), "GET", "/connections/suggestions?limit=3", None).await;
    assert_eq!(page.as_array().unwrap().len(), 3);
    let (_, page) =
      call(&router, Some("me"), "GET", "/connections/suggestions?page=2&limit=3", None).await;
    assert_eq!(page.as_array().unwrap().len(), 1);
  }

  // ── Posts ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn posts_comments_and_likes() {
    let router = make_router().await;
    let a = signup(&router, "a", "Ada").await;
    signup(&router, "b", "Bob").await;

    let (status, post) =
      call(&router, Some("a"), "POST", "/posts", Some(json!({ "content": "hello" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["likes"], 0);
    let id = post["_id"].as_str().unwrap().to_owned();

    let (status, _) =
      call(&router, Some("a"), "POST", "/posts", Some(json!({ "content": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let like = format!("/posts/{id}/like");
    let (_, count) = call(&router, Some("b"), "POST", &like, None).await;
    assert_eq!(count, json!({ "likes": 1 }));
    let (_, count) = call(&router, Some("b"), "POST", &like, None).await;
    assert_eq!(count, json!({ "likes": 1 }));
    let (_, count) = call(&router, Some("b"), "DELETE", &like, None).await;
    assert_eq!(count, json!({ "likes": 0 }));

    let comments = format!("/posts/{id}/comments");
    let (status, _) =
      call(&router, Some("b"), "POST", &comments, Some(json!({ "content": "nice" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, listed) = call(&router, Some("a"), "GET", &comments, None).await;
    assert_eq!(listed[0]["content"], "nice");

    let (_, feed) = call(&router, Some("a"), "GET", "/posts/feed", None).await;
    assert_eq!(feed[0]["comments"], 1);
    let (_, mine) = call(&router, Some("b"), "GET", &format!("/users/{a}/posts"), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let ghost = uuid::Uuid::new_v4();
    let (status, _) =
      call(&router, Some("a"), "POST", &format!("/posts/{ghost}/like"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
