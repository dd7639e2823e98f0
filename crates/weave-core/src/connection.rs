//! Connections between users and the relation state derived from them.
//!
//! A connection is created `pending` by its requester (`from`) and either
//! moved to `connected` by its recipient (`to`) or deleted by either party.
//! Rejection is a deletion, never a status. At most one connection exists
//! per unordered pair of users.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, user::UserSummary};

// ─── Status ──────────────────────────────────────────────────────────────────

/// The persisted status of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
  Pending,
  Connected,
}

impl ConnectionStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Connected => "connected",
    }
  }

  /// Check a requested status change. Returns `Ok(false)` when the change is
  /// a no-op, `Ok(true)` when it must be written.
  pub fn transition_to(self, next: ConnectionStatus) -> Result<bool> {
    match (self, next) {
      (Self::Pending, Self::Connected) => Ok(true),
      (Self::Pending, Self::Pending) | (Self::Connected, Self::Connected) => {
        Ok(false)
      }
      (Self::Connected, Self::Pending) => {
        Err(Error::InvalidTransition { current: self, requested: next })
      }
    }
  }
}

impl fmt::Display for ConnectionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for ConnectionStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "pending" => Ok(Self::Pending),
      "connected" => Ok(Self::Connected),
      other => Err(Error::UnknownStatus(other.to_owned())),
    }
  }
}

// ─── Pair key ────────────────────────────────────────────────────────────────

/// An unordered pair of users, normalised so `(a, b)` and `(b, a)` compare
/// equal. Stores use it to enforce one connection per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairKey {
  pub low:  Uuid,
  pub high: Uuid,
}

impl PairKey {
  pub fn new(a: Uuid, b: Uuid) -> Self {
    if a <= b { Self { low: a, high: b } } else { Self { low: b, high: a } }
  }
}

// ─── Connection ──────────────────────────────────────────────────────────────

/// A relation record between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
  #[serde(rename = "_id")]
  pub id:         Uuid,
  /// The requester.
  pub from:       Uuid,
  /// The recipient.
  pub to:         Uuid,
  pub status:     ConnectionStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Connection {
  pub fn involves(&self, user: Uuid) -> bool {
    self.from == user || self.to == user
  }
}

/// Input to [`crate::store::SocialStore::create_connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConnection {
  pub to: Uuid,
}

/// Body of `PATCH /connections/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
  pub status: ConnectionStatus,
}

/// Response of `DELETE /connections/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
  pub deleted: Uuid,
}

/// Result of a connection request: either a freshly created record or the
/// caller's existing pending request to the same user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requested {
  Created(Connection),
  Existing(Connection),
}

impl Requested {
  pub fn connection(&self) -> &Connection {
    match self {
      Self::Created(c) | Self::Existing(c) => c,
    }
  }

  pub fn into_connection(self) -> Connection {
    match self {
      Self::Created(c) | Self::Existing(c) => c,
    }
  }
}

/// A pending connection seen by its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
  #[serde(rename = "_id")]
  pub id:         Uuid,
  pub from:       UserSummary,
  pub status:     ConnectionStatus,
  pub created_at: DateTime<Utc>,
}

// ─── Relation state ──────────────────────────────────────────────────────────

/// How a viewer relates to another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationState {
  /// No connection row exists; the other user may be suggested.
  Unconnected,
  /// The viewer asked; the other user has not answered.
  PendingOutgoing,
  /// The other user asked; the viewer has not answered.
  PendingIncoming,
  Connected,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pair_key_is_order_independent() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
  }

  #[test]
  fn transitions() {
    use ConnectionStatus::*;
    assert!(Pending.transition_to(Connected).unwrap());
    assert!(!Connected.transition_to(Connected).unwrap());
    assert!(!Pending.transition_to(Pending).unwrap());
    assert!(matches!(
      Connected.transition_to(Pending),
      Err(Error::InvalidTransition { .. })
    ));
  }

  #[test]
  fn status_parses_from_wire_names() {
    assert_eq!("connected".parse::<ConnectionStatus>().unwrap(), ConnectionStatus::Connected);
    assert!("rejected".parse::<ConnectionStatus>().is_err());
    assert_eq!(
      serde_json::to_string(&StatusUpdate { status: ConnectionStatus::Pending }).unwrap(),
      r#"{"status":"pending"}"#
    );
  }
}
