//! Async HTTP client wrapping the Weave JSON API.
//!
//! Each method issues exactly one request. The bearer token is passed in
//! per call; nothing is retried.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;
use weave_core::{
  connection::{Connection, ConnectionStatus, Deleted, Invitation, NewConnection, StatusUpdate},
  page::PageRequest,
  post::{Comment, LikeCount, NewComment, NewPost, Post},
  user::{User, UserSummary, UserUpsert},
};

use crate::error::{ClientError, Result};

/// Async HTTP client for the Weave JSON REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, base_url: base_url.into() })
  }

  pub fn base_url(&self) -> &str { &self.base_url }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  /// [`ApiClient::url`] with `segment` appended as one percent-encoded
  /// path segment.
  fn segment_url(&self, path: &str, segment: &str) -> Result<Url> {
    let mut url = Url::parse(&self.url(path)).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
    url
      .path_segments_mut()
      .map_err(|()| ClientError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
      .push(segment);
    Ok(url)
  }

  fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
    self.client.request(method, self.url(path)).bearer_auth(token)
  }

  /// Send `req` and decode a 2xx body as `T`.
  async fn execute<T: DeserializeOwned>(&self, endpoint: String, req: RequestBuilder) -> Result<T> {
    let resp   = req.send().await?;
    let status = resp.status();
    let body   = resp.bytes().await?;

    if !status.is_success() {
      let err = api_error(status, &body);
      tracing::debug!(%endpoint, %status, "request failed");
      return Err(err);
    }
    serde_json::from_slice(&body).map_err(|source| ClientError::Decode { endpoint, source })
  }

  async fn get<T: DeserializeOwned>(
    &self,
    token: &str,
    path:  &str,
    page:  Option<PageRequest>,
  ) -> Result<T> {
    let mut req = self.request(Method::GET, path, token);
    if let Some(page) = page {
      req = req.query(&[("page", page.page), ("limit", page.limit)]);
    }
    self.execute(format!("GET {path}"), req).await
  }

  async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
    &self,
    method: Method,
    token:  &str,
    path:   &str,
    body:   Option<&B>,
  ) -> Result<T> {
    let endpoint = format!("{method} {path}");
    let mut req  = self.request(method, path, token);
    if let Some(body) = body {
      req = req.json(body);
    }
    self.execute(endpoint, req).await
  }

  // ── Connections ───────────────────────────────────────────────────────────

  /// `GET /api/connections`
  pub async fn list_connections(&self, token: &str, page: PageRequest) -> Result<Vec<UserSummary>> {
    self.get(token, "/connections", Some(page)).await
  }

  /// `GET /api/connections/pending`
  pub async fn list_pending(&self, token: &str, page: PageRequest) -> Result<Vec<Invitation>> {
    self.get(token, "/connections/pending", Some(page)).await
  }

  /// `GET /api/connections/suggestions`
  pub async fn list_suggestions(
    &self,
    token: &str,
    page:  PageRequest,
  ) -> Result<Vec<UserSummary>> {
    self.get(token, "/connections/suggestions", Some(page)).await
  }

  /// `POST /api/connections`
  pub async fn create_connection(&self, token: &str, to: Uuid) -> Result<Connection> {
    self
      .send(Method::POST, token, "/connections", Some(&NewConnection { to }))
      .await
  }

  /// `PATCH /api/connections/:id`
  pub async fn update_connection(
    &self,
    token:  &str,
    id:     Uuid,
    status: ConnectionStatus,
  ) -> Result<Connection> {
    let path = format!("/connections/{id}");
    self
      .send(Method::PATCH, token, &path, Some(&StatusUpdate { status }))
      .await
  }

  /// `DELETE /api/connections/:id`
  pub async fn delete_connection(&self, token: &str, id: Uuid) -> Result<Uuid> {
    let path = format!("/connections/{id}");
    let deleted: Deleted = self.send::<(), _>(Method::DELETE, token, &path, None).await?;
    Ok(deleted.deleted)
  }

  /// `GET /api/users/:id/connections`
  pub async fn user_connections(
    &self,
    token: &str,
    user:  Uuid,
    page:  PageRequest,
  ) -> Result<Vec<UserSummary>> {
    self.get(token, &format!("/users/{user}/connections"), Some(page)).await
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  /// `GET /api/users/me`
  pub async fn current_user(&self, token: &str) -> Result<User> {
    self.get(token, "/users/me", None).await
  }

  /// `GET /api/users/:id`
  pub async fn get_user(&self, token: &str, id: Uuid) -> Result<User> {
    self.get(token, &format!("/users/{id}"), None).await
  }

  /// `GET /api/users/username/:username`
  pub async fn get_user_by_username(&self, token: &str, username: &str) -> Result<User> {
    let url = self.segment_url("/users/username", username)?;
    let req = self.client.get(url).bearer_auth(token);
    self.execute("GET /users/username".into(), req).await
  }

  /// `GET /api/users/search?query=...`
  pub async fn search_users(&self, token: &str, query: &str) -> Result<Vec<UserSummary>> {
    let req = self
      .request(Method::GET, "/users/search", token)
      .query(&[("query", query)]);
    self.execute("GET /users/search".into(), req).await
  }

  /// `POST /api/users`
  pub async fn upsert_user(&self, token: &str, profile: &UserUpsert) -> Result<User> {
    self.send(Method::POST, token, "/users", Some(profile)).await
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  /// `GET /api/posts`
  pub async fn list_posts(&self, token: &str, page: PageRequest) -> Result<Vec<Post>> {
    self.get(token, "/posts", Some(page)).await
  }

  /// `GET /api/posts/feed`
  pub async fn feed(&self, token: &str, page: PageRequest) -> Result<Vec<Post>> {
    self.get(token, "/posts/feed", Some(page)).await
  }

  /// `POST /api/posts`
  pub async fn create_post(&self, token: &str, post: &NewPost) -> Result<Post> {
    self.send(Method::POST, token, "/posts", Some(post)).await
  }

  /// `GET /api/users/:id/posts`
  pub async fn user_posts(&self, token: &str, user: Uuid, page: PageRequest) -> Result<Vec<Post>> {
    self.get(token, &format!("/users/{user}/posts"), Some(page)).await
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  /// `GET /api/posts/:id/comments`
  pub async fn list_comments(
    &self,
    token: &str,
    post:  Uuid,
    page:  PageRequest,
  ) -> Result<Vec<Comment>> {
    self.get(token, &format!("/posts/{post}/comments"), Some(page)).await
  }

  /// `POST /api/posts/:id/comments`
  pub async fn add_comment(&self, token: &str, post: Uuid, content: &str) -> Result<Comment> {
    let path = format!("/posts/{post}/comments");
    let body = NewComment { content: content.to_string() };
    self.send(Method::POST, token, &path, Some(&body)).await
  }

  /// `GET /api/users/:id/comments`
  pub async fn user_comments(
    &self,
    token: &str,
    user:  Uuid,
    page:  PageRequest,
  ) -> Result<Vec<Comment>> {
    self.get(token, &format!("/users/{user}/comments"), Some(page)).await
  }

  // ── Likes ─────────────────────────────────────────────────────────────────

  /// `POST /api/posts/:id/like`
  pub async fn like_post(&self, token: &str, post: Uuid) -> Result<LikeCount> {
    let path = format!("/posts/{post}/like");
    self.send::<(), _>(Method::POST, token, &path, None).await
  }

  /// `DELETE /api/posts/:id/like`
  pub async fn unlike_post(&self, token: &str, post: Uuid) -> Result<LikeCount> {
    let path = format!("/posts/{post}/like");
    self.send::<(), _>(Method::DELETE, token, &path, None).await
  }
}

/// Build [`ClientError::Api`] from a failed response: the server's
/// `{"error": ...}` message, else the raw body, else the status reason.
fn api_error(status: StatusCode, body: &[u8]) -> ClientError {
  #[derive(serde::Deserialize)]
  struct ErrorBody {
    error: String,
  }

  let message = serde_json::from_slice::<ErrorBody>(body)
    .map(|b| b.error)
    .ok()
    .or_else(|| {
      let text = String::from_utf8_lossy(body).trim().to_string();
      (!text.is_empty()).then_some(text)
    })
    .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown status").to_string());
  ClientError::Api { status, message }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn api_error_prefers_server_message() {
    let err = api_error(StatusCode::CONFLICT, br#"{"error":"already connected"}"#);
    assert!(matches!(&err, ClientError::Api { message, .. } if message == "already connected"));
    assert!(err.is_client_error());
    assert!(!err.is_server_error());
  }

  #[test]
  fn api_error_falls_back_to_body_then_reason() {
    let err = api_error(StatusCode::BAD_GATEWAY, b"upstream down\n");
    assert!(matches!(&err, ClientError::Api { message, .. } if message == "upstream down"));
    assert!(err.is_server_error());

    let err = api_error(StatusCode::SERVICE_UNAVAILABLE, b"");
    assert!(matches!(&err, ClientError::Api { message, .. } if message == "Service Unavailable"));
  }

  #[test]
  fn urls_are_rooted_under_api() {
    let client = ApiClient::new("http://localhost:8080/").unwrap();
    assert_eq!(client.url("/users/me"), "http://localhost:8080/api/users/me");
  }

  #[test]
  fn usernames_are_a_single_encoded_segment() {
    let client = ApiClient::new("http://localhost:8080").unwrap();
    let url    = client.segment_url("/users/username", "a/b?c#d").unwrap();
    assert_eq!(url.as_str(), "http://localhost:8080/api/users/username/a%2Fb%3Fc%23d");
    assert_eq!(url.path_segments().unwrap().count(), 4);
  }
}
