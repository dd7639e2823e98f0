//! [`SqliteStore`], the SQLite implementation of [`SocialStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, params, params_from_iter, types::Value};
use uuid::Uuid;

use weave_core::{
  Error as CoreError,
  connection::{Connection, ConnectionStatus, Invitation, PairKey, Requested},
  page::PageRequest,
  post::{Comment, LikeCount, NewPost, Post},
  store::SocialStore,
  user::{User, UserSummary, UserUpsert, base_username, username_candidate},
};

use crate::{
  Error, Result,
  encode::{
    CONNECTION_COLUMNS, RawComment, RawConnection, RawInvitation, RawPost,
    RawUser, count, encode_dt, encode_uuid, user_columns,
  },
  schema::SCHEMA,
};

// ─── Query builders ──────────────────────────────────────────────────────────

/// Posts joined with their author and counters. `?1` is the viewer, `?2` the
/// limit and `?3` the offset; `filter` may use `?4` onwards.
fn post_select(filter: &str) -> String {
  format!(
    "SELECT p.post_id, p.content, p.image_url, p.created_at,
            (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.post_id),
            (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.post_id),
            EXISTS (SELECT 1 FROM likes l
                    WHERE l.post_id = p.post_id AND l.user_id = ?1),
            {author}
     FROM posts p
     JOIN users u ON u.user_id = p.author_id
     WHERE {filter}
     ORDER BY p.created_at DESC, p.rowid DESC
     LIMIT ?2 OFFSET ?3",
    author = user_columns("u"),
  )
}

/// Comments joined with their author. `?1` is the filter argument, `?2` the
/// limit and `?3` the offset.
fn comment_select(filter: &str, order: &str) -> String {
  format!(
    "SELECT c.comment_id, c.post_id, c.content, c.created_at, {author}
     FROM comments c
     JOIN users u ON u.user_id = c.author_id
     WHERE {filter}
     ORDER BY c.created_at {order}, c.rowid {order}
     LIMIT ?2 OFFSET ?3",
    author = user_columns("u"),
  )
}

fn page_values(page: PageRequest) -> (i64, i64) {
  let page = page.clamped();
  (i64::from(page.limit), page.offset() as i64)
}

fn not_blank(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(CoreError::InvalidInput(format!("{field} must not be empty")).into());
  }
  Ok(())
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Weave store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_users(&self, sql: String, args: Vec<Value>) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args.iter()), |row| RawUser::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn query_summaries(&self, sql: String, args: Vec<Value>) -> Result<Vec<UserSummary>> {
    Ok(self.query_users(sql, args).await?.iter().map(User::summary).collect())
  }

  async fn query_posts(&self, filter: &str, args: Vec<Value>) -> Result<Vec<Post>> {
    let sql = post_select(filter);
    let raws: Vec<RawPost> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args.iter()), RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }

  async fn query_comments(&self, sql: String, args: Vec<Value>) -> Result<Vec<Comment>> {
    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args.iter()), RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn post_exists(&self, post: Uuid) -> Result<bool> {
    let id_str = encode_uuid(post);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS (SELECT 1 FROM posts WHERE post_id = ?1)",
          params![id_str],
          |r| r.get::<_, bool>(0),
        )?)
      })
      .await?;
    Ok(exists)
  }

  async fn like_count(&self, post: Uuid) -> Result<LikeCount> {
    let id_str = encode_uuid(post);
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
          params![id_str],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(LikeCount { likes: count(n)? })
  }
}

// ─── SocialStore impl ────────────────────────────────────────────────────────

impl SocialStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn upsert_user(&self, input: UserUpsert) -> Result<User> {
    not_blank("sub", &input.sub)?;
    not_blank("name", &input.name)?;

    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(Utc::now());
    let base   = base_username(&input.name);
    let sub    = input.sub.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = tx.execute(
          "UPDATE users
           SET name = ?2, title = ?3, avatar_url = ?4, bio = ?5, location = ?6
           WHERE sub = ?1",
          params![
            input.sub,
            input.name,
            input.title,
            input.avatar_url,
            input.bio,
            input.location,
          ],
        )?;

        if updated == 0 {
          let mut n = 1;
          let username = loop {
            let candidate = username_candidate(&base, n);
            let taken: bool = tx.query_row(
              "SELECT EXISTS (SELECT 1 FROM users WHERE username = ?1)",
              params![candidate],
              |r| r.get(0),
            )?;
            if !taken {
              break candidate;
            }
            n += 1;
          };

          tx.execute(
            "INSERT INTO users (
               user_id, sub, username, name, title, avatar_url, bio, location,
               created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
              id_str,
              input.sub,
              username,
              input.name,
              input.title,
              input.avatar_url,
              input.bio,
              input.location,
              at_str,
            ],
          )?;
          tracing::info!(sub = %input.sub, %username, "created user");
        }

        tx.commit()?;
        Ok(())
      })
      .await?;

    self
      .get_user_by_sub(&sub)
      .await?
      .ok_or_else(|| Error::Corrupt(format!("user {sub:?} vanished after upsert")))
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users u WHERE u.user_id = ?1", user_columns("u"));
    let users = self.query_users(sql, vec![Value::Text(encode_uuid(id))]).await?;
    Ok(users.into_iter().next())
  }

  async fn get_user_by_sub(&self, sub: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users u WHERE u.sub = ?1", user_columns("u"));
    let users = self.query_users(sql, vec![Value::Text(sub.to_owned())]).await?;
    Ok(users.into_iter().next())
  }

  async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users u WHERE u.username = ?1", user_columns("u"));
    let users = self.query_users(sql, vec![Value::Text(username.to_owned())]).await?;
    Ok(users.into_iter().next())
  }

  async fn search_users(&self, query: &str, limit: u32) -> Result<Vec<UserSummary>> {
    let query = query.trim();
    if query.is_empty() {
      return Ok(Vec::new());
    }
    let pattern = format!("%{}%", query.to_lowercase());
    let limit   = PageRequest::first(limit).clamped().limit;
    let sql = format!(
      "SELECT {} FROM users u
       WHERE lower(u.name) LIKE ?1
          OR lower(u.username) LIKE ?1
          OR lower(coalesce(u.title, '')) LIKE ?1
       ORDER BY u.name, u.rowid
       LIMIT ?2",
      user_columns("u"),
    );
    self
      .query_summaries(sql, vec![Value::Text(pattern), Value::Integer(i64::from(limit))])
      .await
  }

  // ── Connections ───────────────────────────────────────────────────────────

  async fn create_connection(&self, from: Uuid, to: Uuid) -> Result<Requested> {
    if from == to {
      return Err(CoreError::SelfConnection.into());
    }

    let pair     = PairKey::new(from, to);
    let id_str   = encode_uuid(Uuid::new_v4());
    let from_str = encode_uuid(from);
    let to_str   = encode_uuid(to);
    let low_str  = encode_uuid(pair.low);
    let high_str = encode_uuid(pair.high);
    let at_str   = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let target_exists: bool = tx.query_row(
          "SELECT EXISTS (SELECT 1 FROM users WHERE user_id = ?1)",
          params![to_str],
          |r| r.get(0),
        )?;
        if !target_exists {
          return Ok(Err(CoreError::UserNotFound(to)));
        }

        let existing = tx
          .query_row(
            &format!(
              "SELECT {CONNECTION_COLUMNS} FROM connections
               WHERE pair_low = ?1 AND pair_high = ?2"
            ),
            params![low_str, high_str],
            RawConnection::from_row,
          )
          .optional()?;

        if let Some(raw) = existing {
          // Repeating one's own pending request is a no-op.
          if raw.from_id == from_str && raw.status == ConnectionStatus::Pending.as_str() {
            return Ok(Ok((raw, false)));
          }
          return Ok(Err(CoreError::DuplicateConnection(from, to)));
        }

        tx.execute(
          "INSERT INTO connections (
             connection_id, from_id, to_id, pair_low, pair_high, status,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          params![
            id_str,
            from_str,
            to_str,
            low_str,
            high_str,
            ConnectionStatus::Pending.as_str(),
            at_str,
          ],
        )?;
        tx.commit()?;

        Ok(Ok((
          RawConnection {
            connection_id: id_str,
            from_id:       from_str,
            to_id:         to_str,
            status:        ConnectionStatus::Pending.as_str().to_owned(),
            created_at:    at_str.clone(),
            updated_at:    at_str,
          },
          true,
        )))
      })
      .await??;

    let (raw, created) = outcome;
    let connection = raw.into_connection()?;
    if created {
      tracing::debug!(id = %connection.id, %from, %to, "connection requested");
      Ok(Requested::Created(connection))
    } else {
      Ok(Requested::Existing(connection))
    }
  }

  async fn get_connection(&self, id: Uuid) -> Result<Option<Connection>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CONNECTION_COLUMNS} FROM connections WHERE connection_id = ?1"),
              params![id_str],
              RawConnection::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawConnection::into_connection).transpose()
  }

  async fn update_connection(
    &self,
    id:     Uuid,
    actor:  Uuid,
    status: ConnectionStatus,
  ) -> Result<Connection> {
    let current = self
      .get_connection(id)
      .await?
      .ok_or(CoreError::ConnectionNotFound(id))?;

    if !current.involves(actor) {
      return Err(CoreError::NotParticipant { actor, connection: id }.into());
    }
    if !current.status.transition_to(status)? {
      return Ok(current);
    }
    // The only writable transition is pending -> connected, which belongs
    // to the recipient.
    if actor != current.to {
      return Err(CoreError::NotParticipant { actor, connection: id }.into());
    }

    let id_str     = encode_uuid(id);
    let at_str     = encode_dt(Utc::now());
    let status_str = status.as_str();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE connections SET status = ?2, updated_at = ?3
           WHERE connection_id = ?1 AND status = 'pending'",
          params![id_str, status_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(%id, %actor, %status, "connection updated");
    self
      .get_connection(id)
      .await?
      .ok_or_else(|| CoreError::ConnectionNotFound(id).into())
  }

  async fn delete_connection(&self, id: Uuid, actor: Uuid) -> Result<()> {
    let current = self
      .get_connection(id)
      .await?
      .ok_or(CoreError::ConnectionNotFound(id))?;

    if !current.involves(actor) {
      return Err(CoreError::NotParticipant { actor, connection: id }.into());
    }

    let id_str = encode_uuid(id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM connections WHERE connection_id = ?1", params![id_str])?)
      })
      .await?;

    if removed == 0 {
      return Err(CoreError::ConnectionNotFound(id).into());
    }
    tracing::debug!(%id, %actor, "connection deleted");
    Ok(())
  }

  async fn list_connections(&self, user: Uuid, page: PageRequest) -> Result<Vec<UserSummary>> {
    let (limit, offset) = page_values(page);
    let sql = format!(
      "SELECT {} FROM connections c
       JOIN users u
         ON u.user_id = CASE WHEN c.from_id = ?1 THEN c.to_id ELSE c.from_id END
       WHERE c.status = 'connected' AND (c.from_id = ?1 OR c.to_id = ?1)
       ORDER BY c.updated_at DESC, c.rowid DESC
       LIMIT ?2 OFFSET ?3",
      user_columns("u"),
    );
    self
      .query_summaries(sql, vec![
        Value::Text(encode_uuid(user)),
        Value::Integer(limit),
        Value::Integer(offset),
      ])
      .await
  }

  async fn list_pending(&self, user: Uuid, page: PageRequest) -> Result<Vec<Invitation>> {
    let (limit, offset) = page_values(page);
    let sql = format!(
      "SELECT c.connection_id, c.status, c.created_at, {}
       FROM connections c
       JOIN users u ON u.user_id = c.from_id
       WHERE c.to_id = ?1 AND c.status = 'pending'
       ORDER BY c.created_at DESC, c.rowid DESC
       LIMIT ?2 OFFSET ?3",
      user_columns("u"),
    );
    let user_str = encode_uuid(user);

    let raws: Vec<RawInvitation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![user_str, limit, offset], RawInvitation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInvitation::into_invitation).collect()
  }

  async fn list_suggestions(&self, user: Uuid, page: PageRequest) -> Result<Vec<UserSummary>> {
    let (limit, offset) = page_values(page);
    let sql = format!(
      "SELECT {} FROM users u
       WHERE u.user_id != ?1
         AND NOT EXISTS (
           SELECT 1 FROM connections c
           WHERE (c.from_id = u.user_id AND c.to_id = ?1)
              OR (c.from_id = ?1 AND c.to_id = u.user_id)
         )
       ORDER BY u.created_at DESC, u.rowid DESC
       LIMIT ?2 OFFSET ?3",
      user_columns("u"),
    );
    self
      .query_summaries(sql, vec![
        Value::Text(encode_uuid(user)),
        Value::Integer(limit),
        Value::Integer(offset),
      ])
      .await
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn create_post(&self, author: Uuid, input: NewPost) -> Result<Post> {
    not_blank("content", &input.content)?;

    let post_id    = Uuid::new_v4();
    let id_str     = encode_uuid(post_id);
    let author_str = encode_uuid(author);
    let at_str     = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (post_id, author_id, content, image_url, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![id_str, author_str, input.content, input.image_url, at_str],
        )?;
        Ok(())
      })
      .await?;

    self
      .query_posts("p.post_id = ?4", vec![
        Value::Text(encode_uuid(author)),
        Value::Integer(1),
        Value::Integer(0),
        Value::Text(encode_uuid(post_id)),
      ])
      .await?
      .pop()
      .ok_or_else(|| CoreError::PostNotFound(post_id).into())
  }

  async fn list_posts(&self, viewer: Uuid, page: PageRequest) -> Result<Vec<Post>> {
    let (limit, offset) = page_values(page);
    self
      .query_posts("1 = 1", vec![
        Value::Text(encode_uuid(viewer)),
        Value::Integer(limit),
        Value::Integer(offset),
      ])
      .await
  }

  async fn feed(&self, viewer: Uuid, page: PageRequest) -> Result<Vec<Post>> {
    let (limit, offset) = page_values(page);
    self
      .query_posts(
        "p.author_id = ?1
         OR p.author_id IN (
           SELECT CASE WHEN c.from_id = ?1 THEN c.to_id ELSE c.from_id END
           FROM connections c
           WHERE c.status = 'connected' AND (c.from_id = ?1 OR c.to_id = ?1)
         )",
        vec![
          Value::Text(encode_uuid(viewer)),
          Value::Integer(limit),
          Value::Integer(offset),
        ],
      )
      .await
  }

  async fn user_posts(&self, viewer: Uuid, author: Uuid, page: PageRequest) -> Result<Vec<Post>> {
    let (limit, offset) = page_values(page);
    self
      .query_posts("p.author_id = ?4", vec![
        Value::Text(encode_uuid(viewer)),
        Value::Integer(limit),
        Value::Integer(offset),
        Value::Text(encode_uuid(author)),
      ])
      .await
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, post: Uuid, author: Uuid, content: String) -> Result<Comment> {
    not_blank("content", &content)?;
    if !self.post_exists(post).await? {
      return Err(CoreError::PostNotFound(post).into());
    }

    let comment_id = Uuid::new_v4();
    let id_str     = encode_uuid(comment_id);
    let post_str   = encode_uuid(post);
    let author_str = encode_uuid(author);
    let at_str     = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (comment_id, post_id, author_id, content, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![id_str, post_str, author_str, content, at_str],
        )?;
        Ok(())
      })
      .await?;

    self
      .query_comments(comment_select("c.comment_id = ?1", "ASC"), vec![
        Value::Text(encode_uuid(comment_id)),
        Value::Integer(1),
        Value::Integer(0),
      ])
      .await?
      .pop()
      .ok_or_else(|| Error::Corrupt(format!("comment {comment_id} vanished after insert")))
  }

  async fn list_comments(&self, post: Uuid, page: PageRequest) -> Result<Vec<Comment>> {
    if !self.post_exists(post).await? {
      return Err(CoreError::PostNotFound(post).into());
    }
    let (limit, offset) = page_values(page);
    self
      .query_comments(comment_select("c.post_id = ?1", "ASC"), vec![
        Value::Text(encode_uuid(post)),
        Value::Integer(limit),
        Value::Integer(offset),
      ])
      .await
  }

  async fn user_comments(&self, author: Uuid, page: PageRequest) -> Result<Vec<Comment>> {
    let (limit, offset) = page_values(page);
    self
      .query_comments(comment_select("c.author_id = ?1", "DESC"), vec![
        Value::Text(encode_uuid(author)),
        Value::Integer(limit),
        Value::Integer(offset),
      ])
      .await
  }

  // ── Likes ─────────────────────────────────────────────────────────────────

  async fn like_post(&self, post: Uuid, user: Uuid) -> Result<LikeCount> {
    if !self.post_exists(post).await? {
      return Err(CoreError::PostNotFound(post).into());
    }
    let post_str = encode_uuid(post);
    let user_str = encode_uuid(user);
    let at_str   = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO likes (post_id, user_id, created_at) VALUES (?1, ?2, ?3)",
          params![post_str, user_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    self.like_count(post).await
  }

  async fn unlike_post(&self, post: Uuid, user: Uuid) -> Result<LikeCount> {
    if !self.post_exists(post).await? {
      return Err(CoreError::PostNotFound(post).into());
    }
    let post_str = encode_uuid(post);
    let user_str = encode_uuid(user);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
          params![post_str, user_str],
        )?;
        Ok(())
      })
      .await?;
    self.like_count(post).await
  }
}
