//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so lexical order is chronological. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;
use weave_core::{
  connection::{Connection, Invitation},
  post::{Comment, Post},
  user::{User, UserSummary},
};

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Users ────────────────────────────────────────────────────────────────────

/// Columns selected for a user, in order. Prefix with a table alias via
/// [`user_columns`].
const USER_COLUMNS: [&str; 9] = [
  "user_id", "sub", "username", "name", "title", "avatar_url", "bio",
  "location", "created_at",
];

/// `u.user_id, u.sub, ...` for the given alias.
pub fn user_columns(alias: &str) -> String {
  USER_COLUMNS
    .iter()
    .map(|c| format!("{alias}.{c}"))
    .collect::<Vec<_>>()
    .join(", ")
}

pub struct RawUser {
  pub user_id:    String,
  pub sub:        String,
  pub username:   String,
  pub name:       String,
  pub title:      Option<String>,
  pub avatar_url: Option<String>,
  pub bio:        Option<String>,
  pub location:   Option<String>,
  pub created_at: String,
}

impl RawUser {
  /// Read the user columns starting at column `at`.
  pub fn from_row(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(at)?,
      sub:        row.get(at + 1)?,
      username:   row.get(at + 2)?,
      name:       row.get(at + 3)?,
      title:      row.get(at + 4)?,
      avatar_url: row.get(at + 5)?,
      bio:        row.get(at + 6)?,
      location:   row.get(at + 7)?,
      created_at: row.get(at + 8)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         decode_uuid(&self.user_id)?,
      sub:        self.sub,
      username:   self.username,
      name:       self.name,
      title:      self.title,
      avatar_url: self.avatar_url,
      bio:        self.bio,
      location:   self.location,
      created_at: decode_dt(&self.created_at)?,
    })
  }

  pub fn into_summary(self) -> Result<UserSummary> {
    Ok(self.into_user()?.summary())
  }
}

// ─── Connections ──────────────────────────────────────────────────────────────

pub const CONNECTION_COLUMNS: &str =
  "connection_id, from_id, to_id, status, created_at, updated_at";

pub struct RawConnection {
  pub connection_id: String,
  pub from_id:       String,
  pub to_id:         String,
  pub status:        String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawConnection {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      connection_id: row.get(0)?,
      from_id:       row.get(1)?,
      to_id:         row.get(2)?,
      status:        row.get(3)?,
      created_at:    row.get(4)?,
      updated_at:    row.get(5)?,
    })
  }

  pub fn into_connection(self) -> Result<Connection> {
    Ok(Connection {
      id:         decode_uuid(&self.connection_id)?,
      from:       decode_uuid(&self.from_id)?,
      to:         decode_uuid(&self.to_id)?,
      status:     self.status.parse()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// A pending connection joined with its requester.
pub struct RawInvitation {
  pub connection_id: String,
  pub status:        String,
  pub created_at:    String,
  pub from:          RawUser,
}

impl RawInvitation {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      connection_id: row.get(0)?,
      status:        row.get(1)?,
      created_at:    row.get(2)?,
      from:          RawUser::from_row(row, 3)?,
    })
  }

  pub fn into_invitation(self) -> Result<Invitation> {
    Ok(Invitation {
      id:         decode_uuid(&self.connection_id)?,
      from:       self.from.into_summary()?,
      status:     self.status.parse()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Posts ────────────────────────────────────────────────────────────────────

pub struct RawPost {
  pub post_id:    String,
  pub content:    String,
  pub image_url:  Option<String>,
  pub created_at: String,
  pub likes:      i64,
  pub comments:   i64,
  pub is_liked:   bool,
  pub author:     RawUser,
}

impl RawPost {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:    row.get(0)?,
      content:    row.get(1)?,
      image_url:  row.get(2)?,
      created_at: row.get(3)?,
      likes:      row.get(4)?,
      comments:   row.get(5)?,
      is_liked:   row.get(6)?,
      author:     RawUser::from_row(row, 7)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      id:         decode_uuid(&self.post_id)?,
      author:     self.author.into_summary()?,
      content:    self.content,
      image_url:  self.image_url,
      likes:      count(self.likes)?,
      comments:   count(self.comments)?,
      is_liked:   self.is_liked,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawComment {
  pub comment_id: String,
  pub post_id:    String,
  pub content:    String,
  pub created_at: String,
  pub author:     RawUser,
}

impl RawComment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      post_id:    row.get(1)?,
      content:    row.get(2)?,
      created_at: row.get(3)?,
      author:     RawUser::from_row(row, 4)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:         decode_uuid(&self.comment_id)?,
      post_id:    decode_uuid(&self.post_id)?,
      author:     self.author.into_summary()?,
      content:    self.content,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub fn count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Corrupt(format!("negative count {n}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let early = DateTime::parse_from_rfc3339("2024-01-01T00:00:05Z").unwrap().with_timezone(&Utc);
    let late  = DateTime::parse_from_rfc3339("2024-01-01T00:00:05.5Z").unwrap().with_timezone(&Utc);
    assert!(encode_dt(early) < encode_dt(late));
    assert_eq!(decode_dt(&encode_dt(late)).unwrap(), late);
  }

  #[test]
  fn user_columns_are_prefixed() {
    assert!(user_columns("u").starts_with("u.user_id, u.sub"));
    assert_eq!(user_columns("u").matches(", ").count(), USER_COLUMNS.len() - 1);
  }
}
