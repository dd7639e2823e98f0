//! Posts, comments and likes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::UserSummary;

/// A post as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
  #[serde(rename = "_id")]
  pub id:         Uuid,
  pub author:     UserSummary,
  pub content:    String,
  pub image_url:  Option<String>,
  /// Number of users who like the post.
  pub likes:      u64,
  /// Number of comments on the post.
  pub comments:   u64,
  /// Whether the viewer likes the post.
  pub is_liked:   bool,
  pub created_at: DateTime<Utc>,
}

/// Body of `POST /posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
  pub content:   String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  #[serde(rename = "_id")]
  pub id:         Uuid,
  pub post_id:    Uuid,
  pub author:     UserSummary,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}

/// Body of `POST /posts/:id/comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
  pub content: String,
}

/// Response of the like and unlike endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeCount {
  pub likes: u64,
}
