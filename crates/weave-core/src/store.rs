//! The `SocialStore` trait: the contract of the authoritative store.
//!
//! The trait is implemented by storage backends (e.g. `weave-store-sqlite`).
//! The API layer depends on this abstraction, not on any concrete backend.
//! Relation invariants (one connection per unordered pair, only the
//! recipient accepts, only participants delete) are the store's job; clients
//! never check them.

use std::future::Future;

use uuid::Uuid;

use crate::{
  connection::{Connection, ConnectionStatus, Invitation, Requested},
  page::PageRequest,
  post::{Comment, LikeCount, NewPost, Post},
  user::{User, UserSummary, UserUpsert},
};

/// Lets callers that only see a backend's error type recover the domain
/// failure (not found, conflict, ...) behind it.
pub trait DomainError {
  /// The domain error, if this is one. `None` means an infrastructure
  /// failure (database, encoding, ...).
  fn domain(&self) -> Option<&crate::Error>;
}

impl DomainError for crate::Error {
  fn domain(&self) -> Option<&crate::Error> { Some(self) }
}

/// Abstraction over a Weave store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SocialStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create the user for `input.sub`, or overwrite its profile fields if it
  /// already exists. The username is assigned on creation and kept after.
  fn upsert_user(
    &self,
    input: UserUpsert,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_sub<'a>(
    &'a self,
    sub: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Case-insensitive substring match over name, username and title.
  fn search_users<'a>(
    &'a self,
    query: &'a str,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<UserSummary>, Self::Error>> + Send + 'a;

  // ── Connections ───────────────────────────────────────────────────────

  /// Record a pending request from `from` to `to`.
  ///
  /// Repeating a pending request returns [`Requested::Existing`]. Any other
  /// existing row for the pair fails with
  /// [`Error::DuplicateConnection`](crate::Error::DuplicateConnection).
  fn create_connection(
    &self,
    from: Uuid,
    to: Uuid,
  ) -> impl Future<Output = Result<Requested, Self::Error>> + Send + '_;

  fn get_connection(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Connection>, Self::Error>> + Send + '_;

  /// Change the status of a connection on behalf of `actor`. Only the
  /// recipient may accept.
  fn update_connection(
    &self,
    id: Uuid,
    actor: Uuid,
    status: ConnectionStatus,
  ) -> impl Future<Output = Result<Connection, Self::Error>> + Send + '_;

  /// Delete a connection (reject, cancel or disconnect) on behalf of either
  /// participant.
  fn delete_connection(
    &self,
    id: Uuid,
    actor: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Users connected to `user`.
  fn list_connections(
    &self,
    user: Uuid,
    page: PageRequest,
  ) -> impl Future<Output = Result<Vec<UserSummary>, Self::Error>> + Send + '_;

  /// Pending connections addressed to `user`.
  fn list_pending(
    &self,
    user: Uuid,
    page: PageRequest,
  ) -> impl Future<Output = Result<Vec<Invitation>, Self::Error>> + Send + '_;

  /// Users with no connection row of any status with `user`.
  fn list_suggestions(
    &self,
    user: Uuid,
    page: PageRequest,
  ) -> impl Future<Output = Result<Vec<UserSummary>, Self::Error>> + Send + '_;

  // ── Posts ─────────────────────────────────────────────────────────────

  fn create_post(
    &self,
    author: Uuid,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// All posts, newest first, as seen by `viewer`.
  fn list_posts(
    &self,
    viewer: Uuid,
    page: PageRequest,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  /// Posts by `viewer` and the users connected to them, newest first.
  fn feed(
    &self,
    viewer: Uuid,
    page: PageRequest,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  fn user_posts(
    &self,
    viewer: Uuid,
    author: Uuid,
    page: PageRequest,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn add_comment(
    &self,
    post: Uuid,
    author: Uuid,
    content: String,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Comments on a post, oldest first.
  fn list_comments(
    &self,
    post: Uuid,
    page: PageRequest,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Comments written by `author`, newest first.
  fn user_comments(
    &self,
    author: Uuid,
    page: PageRequest,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  // ── Likes ─────────────────────────────────────────────────────────────

  /// Idempotent: liking twice counts once.
  fn like_post(
    &self,
    post: Uuid,
    user: Uuid,
  ) -> impl Future<Output = Result<LikeCount, Self::Error>> + Send + '_;

  /// Idempotent: unliking a post the user does not like is a no-op.
  fn unlike_post(
    &self,
    post: Uuid,
    user: Uuid,
  ) -> impl Future<Output = Result<LikeCount, Self::Error>> + Send + '_;
}
