//! Connection/invitation controller.
//!
//! Loads the viewer's connections, suggestions and pending invitations
//! concurrently, issues mutations, and keeps the [`QueryCache`] coherent by
//! invalidate-and-refetch. Mutation results are returned to the caller but
//! never written into the cache.
//!
//! Every operation takes a [`CancellationToken`]. A cancelled load returns
//! [`ClientError::Cancelled`] and writes nothing to the cache.

use std::{future::Future, sync::Arc};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use weave_core::{
  connection::{Connection, ConnectionStatus},
  page::{COMMENTS_LIMIT, CONNECTIONS_LIMIT, PENDING_LIMIT, POSTS_LIMIT, PageRequest, SUGGESTIONS_LIMIT},
  post::{Comment, LikeCount, Post},
  user::{User, UserSummary, UserUpsert},
};

use crate::{
  cache::{QueryCache, QueryKey, Resource, Ticket},
  client::ApiClient,
  error::{ClientError, Result},
  mutation::Mutation,
  token::TokenProvider,
  view::{NetworkView, ProfileView, ViewState},
};

/// Default pages for the post and comment loads.
pub const FEED_PAGE: PageRequest = PageRequest::first(POSTS_LIMIT);
pub const COMMENTS_PAGE: PageRequest = PageRequest::first(COMMENTS_LIMIT);

/// Pages requested for the three network views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkPages {
  pub connections: PageRequest,
  pub suggestions: PageRequest,
  pub pending:     PageRequest,
}

impl Default for NetworkPages {
  fn default() -> Self {
    Self {
      connections: PageRequest::first(CONNECTIONS_LIMIT),
      suggestions: PageRequest::first(SUGGESTIONS_LIMIT),
      pending:     PageRequest::first(PENDING_LIMIT),
    }
  }
}

impl NetworkPages {
  pub fn connections_key(&self) -> QueryKey { QueryKey::new(Resource::Connections, self.connections) }

  pub fn suggestions_key(&self) -> QueryKey { QueryKey::new(Resource::Suggestions, self.suggestions) }

  pub fn pending_key(&self) -> QueryKey { QueryKey::new(Resource::Pending, self.pending) }
}

/// Whose profile to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
  /// The caller.
  Me,
  Id(Uuid),
  Username(String),
}

impl UserRef {
  /// No input means the caller; a UUID is an id; anything else a username.
  pub fn parse(raw: Option<&str>) -> Self {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
      None => Self::Me,
      Some(raw) => raw
        .parse::<Uuid>()
        .map_or_else(|_| Self::Username(raw.trim_start_matches('@').to_string()), Self::Id),
    }
  }
}

/// What the server returned for a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
  Connection(Connection),
  Deleted(Uuid),
  Likes(LikeCount),
  Comment(Comment),
  Post(Post),
}

/// Race `fut` against `cancel`.
async fn until_cancelled<T>(
  cancel: &CancellationToken,
  fut: impl Future<Output = Result<T>>,
) -> Result<T> {
  tokio::select! {
    biased;
    _ = cancel.cancelled() => Err(ClientError::Cancelled),
    r = fut => r,
  }
}

pub struct Controller<P> {
  client: ApiClient,
  tokens: P,
  cache:  Arc<QueryCache>,
  pages:  NetworkPages,
}

impl<P: TokenProvider> Controller<P> {
  pub fn new(client: ApiClient, tokens: P) -> Self {
    Self::with_cache(client, tokens, Arc::new(QueryCache::new()))
  }

  pub fn with_cache(client: ApiClient, tokens: P, cache: Arc<QueryCache>) -> Self {
    Self { client, tokens, cache, pages: NetworkPages::default() }
  }

  pub fn with_pages(mut self, pages: NetworkPages) -> Self {
    self.pages = pages;
    self
  }

  pub fn cache(&self) -> &Arc<QueryCache> { &self.cache }

  pub fn client(&self) -> &ApiClient { &self.client }

  pub fn pages(&self) -> NetworkPages { self.pages }

  /// A bearer token for one operation.
  pub async fn token(&self, cancel: &CancellationToken) -> Result<String> {
    if cancel.is_cancelled() {
      return Err(ClientError::Cancelled);
    }
    until_cancelled(cancel, self.tokens.token()).await
  }

  // ── Loads ─────────────────────────────────────────────────────────────────

  /// Fetch the three network views concurrently. Each view succeeds or
  /// fails on its own; only cancellation fails the whole load.
  pub async fn load_network(&self, cancel: &CancellationToken) -> Result<NetworkView> {
    let token = self.token(cancel).await?;
    let pages = self.pages;

    let tickets = (
      self.cache.begin(pages.connections_key()).await,
      self.cache.begin(pages.suggestions_key()).await,
      self.cache.begin(pages.pending_key()).await,
    );
    let (connections, suggestions, pending) = tokio::join!(
      until_cancelled(cancel, self.client.list_connections(&token, pages.connections)),
      until_cancelled(cancel, self.client.list_suggestions(&token, pages.suggestions)),
      until_cancelled(cancel, self.client.list_pending(&token, pages.pending)),
    );

    if cancel.is_cancelled() {
      tracing::debug!("network load cancelled");
      return Err(ClientError::Cancelled);
    }

    self.store(tickets.0, &connections).await;
    self.store(tickets.1, &suggestions).await;
    self.store(tickets.2, &pending).await;

    Ok(NetworkView {
      connections: connections.into(),
      suggestions: suggestions.into(),
      pending:     pending.into(),
    })
  }

  /// The network views as currently cached, without fetching. Keys never
  /// fetched read as [`ViewState::Loading`].
  pub async fn cached_network(&self) -> NetworkView {
    NetworkView {
      connections: self.cached(&self.pages.connections_key()).await,
      suggestions: self.cached(&self.pages.suggestions_key()).await,
      pending:     self.cached(&self.pages.pending_key()).await,
    }
  }

  async fn cached<T: Clone + Send + Sync + 'static>(&self, key: &QueryKey) -> ViewState<T> {
    match self.cache.get::<T>(key).await {
      Some(snap) => ViewState::Ready((*snap.value).clone()),
      None => ViewState::Loading,
    }
  }

  async fn store<T: Clone + Send + Sync + 'static>(&self, ticket: Ticket, result: &Result<T>) {
    if let Ok(value) = result {
      self.cache.complete(ticket, value.clone()).await;
    }
  }

  /// Fetch one resource through the cache.
  async fn load<T, F>(&self, key: QueryKey, cancel: &CancellationToken, fetch: F) -> Result<T>
  where
    T: Clone + Send + Sync + 'static,
    F: Future<Output = Result<T>>,
  {
    let ticket = self.cache.begin(key).await;
    let result = until_cancelled(cancel, fetch).await;
    if cancel.is_cancelled() {
      tracing::debug!(resource = %key.resource, "load cancelled");
      return Err(ClientError::Cancelled);
    }
    self.store(ticket, &result).await;
    result
  }

  /// The viewer's feed: their own and their connections' posts.
  pub async fn load_feed(&self, page: PageRequest, cancel: &CancellationToken) -> Result<Vec<Post>> {
    let token = self.token(cancel).await?;
    let key   = QueryKey::new(Resource::Feed, page);
    self.load(key, cancel, self.client.feed(&token, page)).await
  }

  pub async fn load_posts(&self, page: PageRequest, cancel: &CancellationToken) -> Result<Vec<Post>> {
    let token = self.token(cancel).await?;
    let key   = QueryKey::new(Resource::Posts, page);
    self.load(key, cancel, self.client.list_posts(&token, page)).await
  }

  pub async fn load_comments(
    &self,
    post:   Uuid,
    page:   PageRequest,
    cancel: &CancellationToken,
  ) -> Result<Vec<Comment>> {
    let token = self.token(cancel).await?;
    let key   = QueryKey::new(Resource::Comments(post), page);
    self.load(key, cancel, self.client.list_comments(&token, post, page)).await
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  pub async fn current_user(&self, cancel: &CancellationToken) -> Result<User> {
    let token = self.token(cancel).await?;
    until_cancelled(cancel, self.client.current_user(&token)).await
  }

  /// Create or update the caller's profile.
  pub async fn upsert_profile(
    &self,
    profile: &UserUpsert,
    cancel:  &CancellationToken,
  ) -> Result<User> {
    let token = self.token(cancel).await?;
    until_cancelled(cancel, self.client.upsert_user(&token, profile)).await
  }

  pub async fn search_users(
    &self,
    query:  &str,
    cancel: &CancellationToken,
  ) -> Result<Vec<UserSummary>> {
    let token = self.token(cancel).await?;
    until_cancelled(cancel, self.client.search_users(&token, query)).await
  }

  /// Resolve `target`, then fetch its connections, posts and comments
  /// concurrently. Profile reads bypass the cache.
  pub async fn load_profile(
    &self,
    target: &UserRef,
    cancel: &CancellationToken,
  ) -> Result<ProfileView> {
    let token  = self.token(cancel).await?;
    let client = &self.client;
    let user   = until_cancelled(cancel, async {
      match target {
        UserRef::Me => client.current_user(&token).await,
        UserRef::Id(id) => client.get_user(&token, *id).await,
        UserRef::Username(name) => client.get_user_by_username(&token, name).await,
      }
    })
    .await?;

    let (connections, posts, comments) = tokio::join!(
      until_cancelled(
        cancel,
        client.user_connections(&token, user.id, PageRequest::first(CONNECTIONS_LIMIT)),
      ),
      until_cancelled(cancel, client.user_posts(&token, user.id, FEED_PAGE)),
      until_cancelled(cancel, client.user_comments(&token, user.id, COMMENTS_PAGE)),
    );
    if cancel.is_cancelled() {
      tracing::debug!(user = %user.id, "profile load cancelled");
      return Err(ClientError::Cancelled);
    }

    Ok(ProfileView {
      user,
      connections: connections.into(),
      posts:       posts.into(),
      comments:    comments.into(),
    })
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Issue `mutation` and invalidate the resources it affects. Nothing is
  /// refetched.
  ///
  /// If `cancel` fires while the request is in flight the server may still
  /// have applied it, so the resources are invalidated before returning
  /// [`ClientError::Cancelled`].
  pub async fn apply(&self, mutation: &Mutation, cancel: &CancellationToken) -> Result<Applied> {
    let token = self.token(cancel).await?;
    let result = until_cancelled(cancel, self.send(&token, mutation)).await;
    match result {
      Ok(_) | Err(ClientError::Cancelled) => self.invalidate(mutation).await,
      Err(ref e) => tracing::debug!(mutation = mutation.name(), error = %e, "mutation failed"),
    }
    result
  }

  /// [`Controller::apply`], then reload the network views.
  pub async fn apply_and_refresh(
    &self,
    mutation: &Mutation,
    cancel:   &CancellationToken,
  ) -> Result<(Applied, NetworkView)> {
    let applied = self.apply(mutation, cancel).await?;
    let view    = self.load_network(cancel).await?;
    Ok((applied, view))
  }

  async fn invalidate(&self, mutation: &Mutation) {
    for resource in mutation.invalidates() {
      self.cache.invalidate(resource).await;
    }
  }

  async fn send(&self, token: &str, mutation: &Mutation) -> Result<Applied> {
    let client = &self.client;
    Ok(match mutation {
      Mutation::Connect { user } => Applied::Connection(client.create_connection(token, *user).await?),
      Mutation::Accept { invitation } => Applied::Connection(
        client
          .update_connection(token, *invitation, ConnectionStatus::Connected)
          .await?,
      ),
      Mutation::Reject { invitation } => {
        Applied::Deleted(client.delete_connection(token, *invitation).await?)
      }
      Mutation::Like { post } => Applied::Likes(client.like_post(token, *post).await?),
      Mutation::Unlike { post } => Applied::Likes(client.unlike_post(token, *post).await?),
      Mutation::Comment { post, content } => {
        Applied::Comment(client.add_comment(token, *post, content).await?)
      }
      Mutation::Publish(post) => Applied::Post(client.create_post(token, post).await?),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn user_refs() {
    let id = Uuid::new_v4();
    assert_eq!(UserRef::parse(None), UserRef::Me);
    assert_eq!(UserRef::parse(Some("  ")), UserRef::Me);
    assert_eq!(UserRef::parse(Some(&id.to_string())), UserRef::Id(id));
    assert_eq!(UserRef::parse(Some("@ada-lovelace")), UserRef::Username("ada-lovelace".into()));
  }
}
