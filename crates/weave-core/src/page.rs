//! Page-based list requests.
//!
//! Pages are 1-based. Every list resource has its own default `limit`; the
//! server clamps whatever the client sends into `1..=MAX_LIMIT`.

use serde::{Deserialize, Serialize};

/// Largest page the server will return.
pub const MAX_LIMIT: u32 = 100;

pub const CONNECTIONS_LIMIT: u32 = 50;
pub const PENDING_LIMIT: u32 = 50;
pub const SUGGESTIONS_LIMIT: u32 = 10;
pub const POSTS_LIMIT: u32 = 50;
pub const COMMENTS_LIMIT: u32 = 20;

/// A `page` / `limit` pair as sent in a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
  pub page:  u32,
  pub limit: u32,
}

impl PageRequest {
  pub const fn new(page: u32, limit: u32) -> Self { Self { page, limit } }

  /// The first page with the given limit.
  pub const fn first(limit: u32) -> Self { Self { page: 1, limit } }

  /// Clamp into the range the server honours.
  pub fn clamped(self) -> Self {
    Self { page: self.page.max(1), limit: self.limit.clamp(1, MAX_LIMIT) }
  }

  /// Row offset of the first item on this page.
  pub fn offset(&self) -> u64 {
    let p = self.clamped();
    u64::from(p.page - 1) * u64::from(p.limit)
  }
}

/// Query-string form with optional fields, so each handler can fill in its
/// own resource default.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
  pub page:  Option<u32>,
  pub limit: Option<u32>,
}

impl PageParams {
  pub fn or_default(self, default_limit: u32) -> PageRequest {
    PageRequest {
      page:  self.page.unwrap_or(1),
      limit: self.limit.unwrap_or(default_limit),
    }
    .clamped()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clamps_out_of_range_values() {
    assert_eq!(PageRequest::new(0, 0).clamped(), PageRequest::new(1, 1));
    assert_eq!(PageRequest::new(3, 500).clamped(), PageRequest::new(3, MAX_LIMIT));
  }

  #[test]
  fn offsets() {
    assert_eq!(PageRequest::first(10).offset(), 0);
    assert_eq!(PageRequest::new(3, 10).offset(), 20);
  }

  #[test]
  fn params_fill_resource_default() {
    let p = PageParams { page: None, limit: None }.or_default(SUGGESTIONS_LIMIT);
    assert_eq!(p, PageRequest::new(1, 10));
    let p = PageParams { page: Some(2), limit: Some(5) }.or_default(SUGGESTIONS_LIMIT);
    assert_eq!(p, PageRequest::new(2, 5));
  }
}
