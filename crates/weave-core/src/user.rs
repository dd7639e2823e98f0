//! Users and their profile fields.
//!
//! A user is keyed by the identity provider's subject (`sub`). Profiles are
//! created on first login via upsert and never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A full user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  #[serde(rename = "_id")]
  pub id:         Uuid,
  /// Subject claim from the external identity provider.
  pub sub:        String,
  /// Unique handle, derived from the name on first upsert.
  pub username:   String,
  pub name:       String,
  pub title:      Option<String>,
  pub avatar_url: Option<String>,
  pub bio:        Option<String>,
  pub location:   Option<String>,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn summary(&self) -> UserSummary {
    UserSummary {
      id:         self.id,
      sub:        self.sub.clone(),
      username:   self.username.clone(),
      name:       self.name.clone(),
      title:      self.title.clone(),
      avatar_url: self.avatar_url.clone(),
    }
  }
}

/// The projection of a user shown in connection, suggestion and author
/// lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
  #[serde(rename = "_id")]
  pub id:         Uuid,
  pub sub:        String,
  pub username:   String,
  pub name:       String,
  pub title:      Option<String>,
  pub avatar_url: Option<String>,
}

/// Input to [`crate::store::SocialStore::upsert_user`].
///
/// Fields left as `None` are cleared on update; the caller sends the whole
/// profile each time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpsert {
  pub sub:        String,
  pub name:       String,
  #[serde(default)]
  pub title:      Option<String>,
  #[serde(default)]
  pub avatar_url: Option<String>,
  #[serde(default)]
  pub bio:        Option<String>,
  #[serde(default)]
  pub location:   Option<String>,
}

impl UserUpsert {
  pub fn new(sub: impl Into<String>, name: impl Into<String>) -> Self {
    Self { sub: sub.into(), name: name.into(), ..Self::default() }
  }
}

/// Turn a display name into a username candidate: lowercase ASCII
/// alphanumerics joined by `-`.
///
/// ```
/// assert_eq!(weave_core::user::base_username("Ada  Lovelace!"), "ada-lovelace");
/// assert_eq!(weave_core::user::base_username("  "), "user");
/// ```
pub fn base_username(name: &str) -> String {
  let slug = name
    .split(|c: char| !c.is_ascii_alphanumeric())
    .filter(|part| !part.is_empty())
    .map(str::to_ascii_lowercase)
    .collect::<Vec<_>>()
    .join("-");
  if slug.is_empty() { "user".to_owned() } else { slug }
}

/// The `n`th candidate for a username whose base form is taken:
/// `ada`, `ada-2`, `ada-3`, ...
pub fn username_candidate(base: &str, n: usize) -> String {
  if n <= 1 { base.to_owned() } else { format!("{base}-{n}") }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn base_username_collapses_punctuation() {
    assert_eq!(base_username("Grace B. Hopper"), "grace-b-hopper");
    assert_eq!(base_username("émile"), "mile");
    assert_eq!(base_username("!!!"), "user");
  }

  #[test]
  fn username_candidates_are_numbered_from_two() {
    assert_eq!(username_candidate("ada", 1), "ada");
    assert_eq!(username_candidate("ada", 2), "ada-2");
  }

  #[test]
  fn summary_serializes_with_wire_names() {
    let user = User {
      id:         Uuid::nil(),
      sub:        "auth0|1".into(),
      username:   "ada".into(),
      name:       "Ada".into(),
      title:      None,
      avatar_url: Some("https://img/1.png".into()),
      bio:        None,
      location:   None,
      created_at: Utc::now(),
    };
    let json = serde_json::to_value(user.summary()).unwrap();
    assert_eq!(json["_id"], Uuid::nil().to_string());
    assert_eq!(json["avatarUrl"], "https://img/1.png");
  }
}
