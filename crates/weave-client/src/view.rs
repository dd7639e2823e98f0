//! Read-only view models and their text rendering.

use std::fmt::Write as _;

use clap::ValueEnum;
use serde::Deserialize;
use uuid::Uuid;
use weave_core::{
  connection::{Invitation, RelationState},
  post::{Comment, Post},
  user::{User, UserSummary},
};

use crate::error::ClientError;

// ─── View state ───────────────────────────────────────────────────────────────

/// One independently loaded view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
  Loading,
  Ready(T),
  Failed(String),
}

impl<T> ViewState<T> {
  pub fn ready(&self) -> Option<&T> {
    match self {
      Self::Ready(v) => Some(v),
      _ => None,
    }
  }

  pub fn is_failed(&self) -> bool { matches!(self, Self::Failed(_)) }
}

impl<T> From<Result<T, ClientError>> for ViewState<T> {
  fn from(r: Result<T, ClientError>) -> Self {
    match r {
      Ok(v) => Self::Ready(v),
      Err(e) => Self::Failed(e.to_string()),
    }
  }
}

// ─── Network view ─────────────────────────────────────────────────────────────

/// The viewer's three relationship views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkView {
  pub connections: ViewState<Vec<UserSummary>>,
  pub suggestions: ViewState<Vec<UserSummary>>,
  pub pending:     ViewState<Vec<Invitation>>,
}

impl Default for NetworkView {
  fn default() -> Self {
    Self {
      connections: ViewState::Loading,
      suggestions: ViewState::Loading,
      pending:     ViewState::Loading,
    }
  }
}

/// Item counts shown on the three tabs. Views that are not ready count as
/// zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabCounts {
  pub connections: usize,
  pub suggestions: usize,
  pub pending:     usize,
  /// Badge text on the pending tab, present when something is pending.
  pub badge:       Option<String>,
}

impl NetworkView {
  pub fn counts(&self) -> TabCounts {
    let pending = self.pending.ready().map_or(0, Vec::len);
    TabCounts {
      connections: self.connections.ready().map_or(0, Vec::len),
      suggestions: self.suggestions.ready().map_or(0, Vec::len),
      pending,
      badge: (pending > 0).then(|| pending.to_string()),
    }
  }

  /// How the viewer relates to `other`, as far as the fetched pages show.
  /// Outgoing requests are not exposed, and `other` may be outside the
  /// fetched pages, so `None` means unknown.
  pub fn relation(&self, other: Uuid) -> Option<RelationState> {
    let in_users = |v: &ViewState<Vec<UserSummary>>| {
      v.ready().is_some_and(|users| users.iter().any(|u| u.id == other))
    };
    if in_users(&self.connections) {
      Some(RelationState::Connected)
    } else if self
      .pending
      .ready()
      .is_some_and(|inv| inv.iter().any(|i| i.from.id == other))
    {
      Some(RelationState::PendingIncoming)
    } else if in_users(&self.suggestions) {
      Some(RelationState::Unconnected)
    } else {
      None
    }
  }
}

// ─── Profile view ─────────────────────────────────────────────────────────────

/// One user's profile with their connections, posts and comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
  pub user:        User,
  pub connections: ViewState<Vec<UserSummary>>,
  pub posts:       ViewState<Vec<Post>>,
  pub comments:    ViewState<Vec<Comment>>,
}

// ─── Rendering ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Tab {
  #[default]
  Connections,
  Suggestions,
  Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
  #[default]
  Grid,
  List,
}

const CARD_WIDTH: usize = 26;
const GRID_COLUMNS: usize = 3;

/// A user rendered as card lines: name, handle, optional title, id.
fn card(user: &UserSummary, extra: Option<String>) -> Vec<String> {
  let mut lines = vec![user.name.clone(), format!("@{}", user.username)];
  if let Some(title) = &user.title {
    lines.push(title.clone());
  }
  if let Some(extra) = extra {
    lines.push(extra);
  }
  lines
}

fn fit(s: &str, width: usize) -> String {
  let count = s.chars().count();
  if count <= width {
    format!("{s:<width$}")
  } else {
    let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
  }
}

fn render_cards(out: &mut String, cards: &[Vec<String>], layout: Layout) {
  match layout {
    Layout::List => {
      for lines in cards {
        let _ = writeln!(out, "  {}", lines.join("  ·  "));
      }
    }
    Layout::Grid => {
      for row in cards.chunks(GRID_COLUMNS) {
        let height = row.iter().map(Vec::len).max().unwrap_or(0);
        for i in 0..height {
          let cells: Vec<String> = row
            .iter()
            .map(|lines| fit(lines.get(i).map_or("", String::as_str), CARD_WIDTH))
            .collect();
          let _ = writeln!(out, "  {}", cells.join("  ").trim_end());
        }
        out.push('\n');
      }
    }
  }
}

/// Tab bar, e.g. `Connections (0) | Suggestions (2) | [Pending (1) •1]`.
pub fn render_tabs(view: &NetworkView, selected: Tab) -> String {
  let counts = view.counts();
  let badge  = counts.badge.map(|b| format!(" •{b}")).unwrap_or_default();
  let tabs   = [
    (Tab::Connections, format!("Connections ({})", counts.connections)),
    (Tab::Suggestions, format!("Suggestions ({})", counts.suggestions)),
    (Tab::Pending, format!("Pending ({}){badge}", counts.pending)),
  ];
  tabs
    .into_iter()
    .map(|(tab, label)| if tab == selected { format!("[{label}]") } else { label })
    .collect::<Vec<_>>()
    .join(" | ")
}

/// Render the selected tab of `view`. Failed views render an error line.
pub fn render_network(view: &NetworkView, tab: Tab, layout: Layout) -> String {
  let mut out = render_tabs(view, tab);
  out.push_str("\n\n");

  fn body<T>(
    out: &mut String,
    state: &ViewState<Vec<T>>,
    what: &str,
    empty: &str,
    layout: Layout,
    to_card: impl Fn(&T) -> Vec<String>,
  ) {
    match state {
      ViewState::Loading => {
        let _ = writeln!(out, "  loading {what}…");
      }
      ViewState::Failed(message) => {
        let _ = writeln!(out, "  error: could not load {what}: {message}");
      }
      ViewState::Ready(items) if items.is_empty() => {
        let _ = writeln!(out, "  {empty}");
      }
      ViewState::Ready(items) => {
        let cards: Vec<Vec<String>> = items.iter().map(to_card).collect();
        render_cards(out, &cards, layout);
      }
    }
  }

  match tab {
    Tab::Connections => body(
      &mut out,
      &view.connections,
      "connections",
      "No connections yet.",
      layout,
      |u| card(u, Some(u.id.to_string())),
    ),
    Tab::Suggestions => body(
      &mut out,
      &view.suggestions,
      "suggestions",
      "No suggestions right now.",
      layout,
      |u| card(u, Some(format!("connect: {}", u.id))),
    ),
    Tab::Pending => body(
      &mut out,
      &view.pending,
      "invitations",
      "No pending invitations.",
      layout,
      |i| card(&i.from, Some(format!("invitation: {}", i.id))),
    ),
  }
  out
}

/// Render posts newest first, one block per post.
pub fn render_posts(posts: &[Post]) -> String {
  if posts.is_empty() {
    return "  Nothing to show.\n".to_string();
  }
  let mut out = String::new();
  for post in posts {
    let liked = if post.is_liked { " (liked)" } else { "" };
    let _ = writeln!(
      out,
      "{} @{} · {}",
      post.author.name,
      post.author.username,
      post.created_at.format("%Y-%m-%d %H:%M"),
    );
    let _ = writeln!(out, "  {}", post.content);
    if let Some(url) = &post.image_url {
      let _ = writeln!(out, "  [image] {url}");
    }
    let _ = writeln!(
      out,
      "  ♥ {}{liked}  💬 {}  id: {}\n",
      post.likes, post.comments, post.id
    );
  }
  out
}

/// Profile header, then connections, posts and comments.
pub fn render_profile(view: &ProfileView, layout: Layout) -> String {
  let user    = &view.user;
  let mut out = format!("{} @{}\n", user.name, user.username);
  for line in [&user.title, &user.location, &user.bio].into_iter().flatten() {
    let _ = writeln!(out, "{line}");
  }
  let _ = writeln!(out, "joined {}", user.created_at.format("%Y-%m-%d"));

  let _ = writeln!(out, "\nConnections");
  match &view.connections {
    ViewState::Ready(users) if users.is_empty() => out.push_str("  No connections yet.\n"),
    ViewState::Ready(users) => {
      let cards: Vec<Vec<String>> = users.iter().map(|u| card(u, None)).collect();
      render_cards(&mut out, &cards, layout);
    }
    other => section_placeholder(&mut out, other, "connections"),
  }

  let _ = writeln!(out, "\nPosts");
  match &view.posts {
    ViewState::Ready(posts) => out.push_str(&render_posts(posts)),
    other => section_placeholder(&mut out, other, "posts"),
  }

  let _ = writeln!(out, "\nComments");
  match &view.comments {
    ViewState::Ready(comments) => out.push_str(&render_comments(comments)),
    other => section_placeholder(&mut out, other, "comments"),
  }
  out
}

fn section_placeholder<T>(out: &mut String, state: &ViewState<T>, what: &str) {
  match state {
    ViewState::Failed(message) => {
      let _ = writeln!(out, "  error: could not load {what}: {message}");
    }
    _ => {
      let _ = writeln!(out, "  loading {what}…");
    }
  }
}

pub fn render_comments(comments: &[Comment]) -> String {
  if comments.is_empty() {
    return "  No comments yet.\n".to_string();
  }
  let mut out = String::new();
  for c in comments {
    let _ = writeln!(out, "  {} @{}: {}", c.author.name, c.author.username, c.content);
  }
  out
}
