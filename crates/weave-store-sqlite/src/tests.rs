//! Integration tests for `SqliteStore` against an in-memory database.

use uuid::Uuid;
use weave_core::{
  Error as CoreError,
  connection::{ConnectionStatus, Requested},
  page::PageRequest,
  post::NewPost,
  store::{DomainError, SocialStore},
  user::{User, UserUpsert},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, sub: &str, name: &str) -> User {
  s.upsert_user(UserUpsert::new(sub, name)).await.unwrap()
}

fn page(limit: u32) -> PageRequest { PageRequest::first(limit) }

fn post(content: &str) -> NewPost {
  NewPost { content: content.into(), image_url: None }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_creates_then_updates() {
  let s = store().await;

  let created = user(&s, "auth0|ada", "Ada Lovelace").await;
  assert_eq!(created.username, "ada-lovelace");
  assert_eq!(created.title, None);

  let mut edit = UserUpsert::new("auth0|ada", "Ada King");
  edit.title = Some("Analyst".into());
  let updated = s.upsert_user(edit).await.unwrap();

  assert_eq!(updated.id, created.id);
  assert_eq!(updated.name, "Ada King");
  assert_eq!(updated.title.as_deref(), Some("Analyst"));
  // The handle is assigned once.
  assert_eq!(updated.username, "ada-lovelace");
}

#[tokio::test]
async fn usernames_are_deduplicated() {
  let s = store().await;
  let a = user(&s, "a", "Sam").await;
  let b = user(&s, "b", "Sam").await;
  let c = user(&s, "c", "sam").await;
  assert_eq!(a.username, "sam");
  assert_eq!(b.username, "sam-2");
  assert_eq!(c.username, "sam-3");

  let found = s.get_user_by_username("sam-2").await.unwrap().unwrap();
  assert_eq!(found.id, b.id);
}

#[tokio::test]
async fn upsert_rejects_blank_name() {
  let s = store().await;
  let err = s.upsert_user(UserUpsert::new("x", "  ")).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::InvalidInput(_))));
}

#[tokio::test]
async fn lookups_by_id_and_sub() {
  let s = store().await;
  let a = user(&s, "auth0|1", "Ada").await;
  assert_eq!(s.get_user(a.id).await.unwrap().unwrap().sub, "auth0|1");
  assert_eq!(s.get_user_by_sub("auth0|1").await.unwrap().unwrap().id, a.id);
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.get_user_by_sub("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn search_matches_name_username_and_title() {
  let s = store().await;
  let mut grace = UserUpsert::new("g", "Grace Hopper");
  grace.title = Some("Rear Admiral".into());
  s.upsert_user(grace).await.unwrap();
  user(&s, "a", "Ada Lovelace").await;

  let hits = s.search_users("hopp", 10).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].name, "Grace Hopper");

  let hits = s.search_users("ADMIRAL", 10).await.unwrap();
  assert_eq!(hits.len(), 1);

  assert!(s.search_users("   ", 10).await.unwrap().is_empty());
}

// ─── Connections ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn request_then_accept() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;
  let b = user(&s, "b", "Bob").await;

  let requested = s.create_connection(a.id, b.id).await.unwrap();
  assert!(matches!(requested, Requested::Created(_)));
  let conn = requested.into_connection();
  assert_eq!(conn.status, ConnectionStatus::Pending);
  assert_eq!((conn.from, conn.to), (a.id, b.id));

  // Incoming for b, not for a.
  let pending_b = s.list_pending(b.id, page(50)).await.unwrap();
  assert_eq!(pending_b.len(), 1);
  assert_eq!(pending_b[0].id, conn.id);
  assert_eq!(pending_b[0].from.id, a.id);
  assert!(s.list_pending(a.id, page(50)).await.unwrap().is_empty());

  let accepted = s
    .update_connection(conn.id, b.id, ConnectionStatus::Connected)
    .await
    .unwrap();
  assert_eq!(accepted.status, ConnectionStatus::Connected);

  assert!(s.list_pending(b.id, page(50)).await.unwrap().is_empty());
  let a_conns = s.list_connections(a.id, page(50)).await.unwrap();
  let b_conns = s.list_connections(b.id, page(50)).await.unwrap();
  assert_eq!(a_conns.iter().map(|u| u.id).collect::<Vec<_>>(), vec![b.id]);
  assert_eq!(b_conns.iter().map(|u| u.id).collect::<Vec<_>>(), vec![a.id]);
}

#[tokio::test]
async fn repeated_request_is_a_no_op() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;
  let b = user(&s, "b", "Bob").await;

  let first  = s.create_connection(a.id, b.id).await.unwrap();
  let second = s.create_connection(a.id, b.id).await.unwrap();
  assert!(matches!(second, Requested::Existing(_)));
  assert_eq!(first.connection().id, second.connection().id);
  assert_eq!(s.list_pending(b.id, page(50)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reverse_request_conflicts() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;
  let b = user(&s, "b", "Bob").await;

  s.create_connection(a.id, b.id).await.unwrap();
  let err = s.create_connection(b.id, a.id).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::DuplicateConnection(..))));
}

#[tokio::test]
async fn request_to_connected_user_conflicts() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;
  let b = user(&s, "b", "Bob").await;

  let id = s.create_connection(a.id, b.id).await.unwrap().connection().id;
  s.update_connection(id, b.id, ConnectionStatus::Connected).await.unwrap();

  let err = s.create_connection(a.id, b.id).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::DuplicateConnection(..))));
}

#[tokio::test]
async fn self_and_unknown_targets_are_rejected() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;

  let err = s.create_connection(a.id, a.id).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::SelfConnection)));

  let ghost = Uuid::new_v4();
  let err = s.create_connection(a.id, ghost).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UserNotFound(id)) if id == ghost));
}

#[tokio::test]
async fn only_the_recipient_accepts() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;
  let b = user(&s, "b", "Bob").await;
  let c = user(&s, "c", "Cy").await;

  let id = s.create_connection(a.id, b.id).await.unwrap().connection().id;

  let err = s.update_connection(id, a.id, ConnectionStatus::Connected).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::NotParticipant { .. })));

  let err = s.update_connection(id, c.id, ConnectionStatus::Connected).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::NotParticipant { .. })));

  let still = s.get_connection(id).await.unwrap().unwrap();
  assert_eq!(still.status, ConnectionStatus::Pending);
}

#[tokio::test]
async fn accepting_twice_is_idempotent_and_cannot_revert() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;
  let b = user(&s, "b", "Bob").await;

  let id = s.create_connection(a.id, b.id).await.unwrap().connection().id;
  let first  = s.update_connection(id, b.id, ConnectionStatus::Connected).await.unwrap();
  let second = s.update_connection(id, b.id, ConnectionStatus::Connected).await.unwrap();
  assert_eq!(first, second);

  let err = s.update_connection(id, b.id, ConnectionStatus::Pending).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn reject_deletes_and_never_connects() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;
  let b = user(&s, "b", "Bob").await;

  let id = s.create_connection(a.id, b.id).await.unwrap().connection().id;
  s.delete_connection(id, b.id).await.unwrap();

  assert!(s.get_connection(id).await.unwrap().is_none());
  assert!(s.list_pending(b.id, page(50)).await.unwrap().is_empty());
  assert!(s.list_connections(b.id, page(50)).await.unwrap().is_empty());

  // The pair is free again, so each shows up in the other's suggestions.
  let sugg = s.list_suggestions(b.id, page(10)).await.unwrap();
  assert!(sugg.iter().any(|u| u.id == a.id));

  let err = s.delete_connection(id, b.id).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::ConnectionNotFound(_))));
}

#[tokio::test]
async fn outsiders_cannot_delete() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;
  let b = user(&s, "b", "Bob").await;
  let c = user(&s, "c", "Cy").await;

  let id = s.create_connection(a.id, b.id).await.unwrap().connection().id;
  let err = s.delete_connection(id, c.id).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::NotParticipant { .. })));
  assert!(s.get_connection(id).await.unwrap().is_some());
}

#[tokio::test]
async fn suggestions_exclude_self_and_any_relation() {
  let s = store().await;
  let me = user(&s, "me", "Me").await;
  let pending_in  = user(&s, "in", "Inviter").await;
  let pending_out = user(&s, "out", "Invitee").await;
  let friend      = user(&s, "f", "Friend").await;
  let stranger1   = user(&s, "s1", "Stranger One").await;
  let stranger2   = user(&s, "s2", "Stranger Two").await;

  s.create_connection(pending_in.id, me.id).await.unwrap();
  s.create_connection(me.id, pending_out.id).await.unwrap();
  let id = s.create_connection(friend.id, me.id).await.unwrap().connection().id;
  s.update_connection(id, me.id, ConnectionStatus::Connected).await.unwrap();

  let mut ids: Vec<Uuid> = s
    .list_suggestions(me.id, page(10))
    .await
    .unwrap()
    .into_iter()
    .map(|u| u.id)
    .collect();
  ids.sort();
  let mut expected = vec![stranger1.id, stranger2.id];
  expected.sort();
  assert_eq!(ids, expected);
}

#[tokio::test]
async fn lists_respect_limit_and_page() {
  let s = store().await;
  let me = user(&s, "me", "Me").await;
  for i in 0..7 {
    let other = user(&s, &format!("u{i}"), &format!("User {i}")).await;
    s.create_connection(other.id, me.id).await.unwrap();
  }

  assert_eq!(s.list_pending(me.id, PageRequest::new(1, 3)).await.unwrap().len(), 3);
  assert_eq!(s.list_pending(me.id, PageRequest::new(3, 3)).await.unwrap().len(), 1);
  assert!(s.list_pending(me.id, PageRequest::new(4, 3)).await.unwrap().is_empty());

  let p1 = s.list_pending(me.id, PageRequest::new(1, 3)).await.unwrap();
  let p2 = s.list_pending(me.id, PageRequest::new(2, 3)).await.unwrap();
  assert!(p1.iter().all(|a| p2.iter().all(|b| a.id != b.id)));

  // A limit of zero is clamped to one.
  assert_eq!(s.list_pending(me.id, PageRequest::new(1, 0)).await.unwrap().len(), 1);
}

// ─── Posts, comments, likes ──────────────────────────────────────────────────

#[tokio::test]
async fn feed_contains_own_and_connected_posts_only() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;
  let b = user(&s, "b", "Bob").await;
  let c = user(&s, "c", "Cy").await;

  s.create_post(a.id, post("from a")).await.unwrap();
  s.create_post(b.id, post("from b")).await.unwrap();
  s.create_post(c.id, post("from c")).await.unwrap();

  let feed: Vec<String> = s
    .feed(a.id, page(50))
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.content)
    .collect();
  assert_eq!(feed, vec!["from a"]);

  let id = s.create_connection(a.id, b.id).await.unwrap().connection().id;
  s.update_connection(id, b.id, ConnectionStatus::Connected).await.unwrap();

  let feed: Vec<String> = s
    .feed(a.id, page(50))
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.content)
    .collect();
  assert_eq!(feed, vec!["from b", "from a"]);

  assert_eq!(s.list_posts(a.id, page(50)).await.unwrap().len(), 3);
  assert_eq!(s.user_posts(a.id, c.id, page(50)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn like_then_unlike_restores_count() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;
  let b = user(&s, "b", "Bob").await;
  let p = s.create_post(a.id, post("hello")).await.unwrap();
  assert_eq!(p.likes, 0);

  assert_eq!(s.like_post(p.id, b.id).await.unwrap().likes, 1);
  // Liking twice counts once.
  assert_eq!(s.like_post(p.id, b.id).await.unwrap().likes, 1);
  assert_eq!(s.like_post(p.id, a.id).await.unwrap().likes, 2);

  let seen_by_b = s.list_posts(b.id, page(10)).await.unwrap();
  assert!(seen_by_b[0].is_liked);

  assert_eq!(s.unlike_post(p.id, b.id).await.unwrap().likes, 1);
  assert_eq!(s.unlike_post(p.id, b.id).await.unwrap().likes, 1);
  assert_eq!(s.unlike_post(p.id, a.id).await.unwrap().likes, 0);

  let err = s.like_post(Uuid::new_v4(), a.id).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::PostNotFound(_))));
}

#[tokio::test]
async fn comments_are_counted_and_listed() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;
  let b = user(&s, "b", "Bob").await;
  let p = s.create_post(a.id, post("hello")).await.unwrap();

  let first = s.add_comment(p.id, b.id, "first".into()).await.unwrap();
  assert_eq!(first.author.id, b.id);
  s.add_comment(p.id, a.id, "second".into()).await.unwrap();

  let listed: Vec<String> = s
    .list_comments(p.id, page(20))
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.content)
    .collect();
  assert_eq!(listed, vec!["first", "second"]);

  let by_b = s.user_comments(b.id, page(20)).await.unwrap();
  assert_eq!(by_b.len(), 1);

  let refreshed = s.list_posts(a.id, page(10)).await.unwrap();
  assert_eq!(refreshed[0].comments, 2);

  let err = s.add_comment(p.id, a.id, "   ".into()).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::InvalidInput(_))));
  let err = s.list_comments(Uuid::new_v4(), page(20)).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::PostNotFound(_))));
}

#[tokio::test]
async fn empty_posts_are_rejected() {
  let s = store().await;
  let a = user(&s, "a", "Ada").await;
  let err = s.create_post(a.id, post("")).await.unwrap_err();
  assert!(matches!(err.domain(), Some(CoreError::InvalidInput(_))));
}
