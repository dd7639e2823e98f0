//! User actions and the cached resources each one makes stale.

use std::fmt;

use uuid::Uuid;
use weave_core::post::NewPost;

use crate::{
  cache::Resource,
  error::{ClientError, Result},
};

/// A state-changing request issued on behalf of the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
  /// Ask `user` to connect.
  Connect { user: Uuid },
  /// Accept the pending connection `invitation`.
  Accept { invitation: Uuid },
  /// Reject (delete) the pending connection `invitation`.
  Reject { invitation: Uuid },
  Like { post: Uuid },
  Unlike { post: Uuid },
  Comment { post: Uuid, content: String },
  Publish(NewPost),
}

/// The mutations that only need an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
  Connect,
  Accept,
  Reject,
  Like,
  Unlike,
}

impl fmt::Display for MutationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Connect => "connect",
      Self::Accept => "accept",
      Self::Reject => "reject",
      Self::Like => "like",
      Self::Unlike => "unlike",
    })
  }
}

impl Mutation {
  /// Build a mutation from raw UI input. A missing or malformed identifier
  /// is logged and rejected before any request is made.
  pub fn from_input(kind: MutationKind, raw_id: Option<&str>) -> Result<Self> {
    let id = parse_id(kind, raw_id)?;
    Ok(match kind {
      MutationKind::Connect => Self::Connect { user: id },
      MutationKind::Accept => Self::Accept { invitation: id },
      MutationKind::Reject => Self::Reject { invitation: id },
      MutationKind::Like => Self::Like { post: id },
      MutationKind::Unlike => Self::Unlike { post: id },
    })
  }

  /// Like [`Mutation::from_input`] for a comment on `raw_post`.
  pub fn comment_input(raw_post: Option<&str>, content: impl Into<String>) -> Result<Self> {
    let post = parse_id("comment", raw_post)?;
    Ok(Self::Comment { post, content: content.into() })
  }

  /// Cached resources whose snapshots this mutation makes stale.
  pub fn invalidates(&self) -> Vec<Resource> {
    match self {
      Self::Connect { .. } => vec![Resource::Connections, Resource::Suggestions],
      Self::Accept { .. } => vec![Resource::Connections, Resource::Pending, Resource::Feed],
      Self::Reject { .. } => vec![Resource::Pending, Resource::Feed],
      Self::Like { .. } | Self::Unlike { .. } => vec![Resource::Feed, Resource::Posts],
      Self::Comment { post, .. } => {
        vec![Resource::Comments(*post), Resource::Feed, Resource::Posts]
      }
      Self::Publish(_) => vec![Resource::Feed, Resource::Posts],
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      Self::Connect { .. } => "connect",
      Self::Accept { .. } => "accept",
      Self::Reject { .. } => "reject",
      Self::Like { .. } => "like",
      Self::Unlike { .. } => "unlike",
      Self::Comment { .. } => "comment",
      Self::Publish(_) => "publish",
    }
  }
}

fn parse_id(action: impl fmt::Display, raw: Option<&str>) -> Result<Uuid> {
  let raw = raw.map(str::trim).filter(|s| !s.is_empty());
  let Some(raw) = raw else {
    tracing::warn!(%action, "ignoring action without an identifier");
    return Err(ClientError::MissingPrecondition(format!("{action}: no identifier given")));
  };
  raw.parse().map_err(|_| {
    tracing::warn!(%action, id = raw, "ignoring action with a malformed identifier");
    ClientError::MissingPrecondition(format!("{action}: {raw:?} is not a valid identifier"))
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn invalidation_table() {
    let id = Uuid::new_v4();
    let post = NewPost { content: "hi".into(), image_url: None };
    let cases = [
      (Mutation::Connect { user: id }, vec![Resource::Connections, Resource::Suggestions]),
      (
        Mutation::Accept { invitation: id },
        vec![Resource::Connections, Resource::Pending, Resource::Feed],
      ),
      (Mutation::Reject { invitation: id }, vec![Resource::Pending, Resource::Feed]),
      (Mutation::Like { post: id }, vec![Resource::Feed, Resource::Posts]),
      (Mutation::Unlike { post: id }, vec![Resource::Feed, Resource::Posts]),
      (
        Mutation::Comment { post: id, content: "x".into() },
        vec![Resource::Comments(id), Resource::Feed, Resource::Posts],
      ),
      (Mutation::Publish(post), vec![Resource::Feed, Resource::Posts]),
    ];
    for (mutation, expected) in cases {
      assert_eq!(mutation.invalidates(), expected, "{}", mutation.name());
    }
  }

  #[test]
  fn input_with_an_id_builds_the_mutation() {
    let id = Uuid::new_v4();
    let raw = format!(" {id} ");
    assert_eq!(
      Mutation::from_input(MutationKind::Accept, Some(raw.as_str())).unwrap(),
      Mutation::Accept { invitation: id }
    );
    assert_eq!(
      Mutation::comment_input(Some(id.to_string().as_str()), "nice").unwrap(),
      Mutation::Comment { post: id, content: "nice".into() }
    );
  }

  #[test]
  fn missing_or_malformed_ids_are_preconditions() {
    for raw in [None, Some(""), Some("   "), Some("undefined")] {
      let err = Mutation::from_input(MutationKind::Reject, raw).unwrap_err();
      assert!(matches!(err, ClientError::MissingPrecondition(_)), "{raw:?}");
    }
    assert!(matches!(
      Mutation::comment_input(None, "text"),
      Err(ClientError::MissingPrecondition(_))
    ));
  }
}
