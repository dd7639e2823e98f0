//! Error types for `weave-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("connection not found: {0}")]
  ConnectionNotFound(Uuid),

  #[error("post not found: {0}")]
  PostNotFound(Uuid),

  #[error("cannot connect a user to themselves")]
  SelfConnection,

  #[error("a connection between {0} and {1} already exists")]
  DuplicateConnection(Uuid, Uuid),

  #[error("user {actor} may not change connection {connection}")]
  NotParticipant { actor: Uuid, connection: Uuid },

  #[error("cannot move connection from {current} to {requested}")]
  InvalidTransition {
    current:   crate::connection::ConnectionStatus,
    requested: crate::connection::ConnectionStatus,
  },

  #[error("unknown connection status: {0:?}")]
  UnknownStatus(String),

  #[error("invalid input: {0}")]
  InvalidInput(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
