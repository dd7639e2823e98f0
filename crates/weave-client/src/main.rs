//! `weave`: command-line client for the Weave social network.
//!
//! # Usage
//!
//! ```text
//! weave --url http://localhost:8080 --token <token> network --tab pending
//! weave --config ~/.config/weave/config.toml accept <invitation-id>
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use weave_client::{
  Applied, ApiClient, Controller, Layout, Mutation, MutationKind, StaticToken, Tab, UserRef,
  controller::{COMMENTS_PAGE, FEED_PAGE},
  view::{render_comments, render_network, render_posts, render_profile},
};
use weave_core::{
  page::PageRequest,
  post::NewPost,
  user::UserUpsert,
};

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "weave", about = "Command-line client for the Weave social network")]
struct Args {
  /// Path to a TOML config file (url, token, layout).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the weave server (default: http://localhost:8080).
  #[arg(long, env = "WEAVE_URL")]
  url: Option<String>,

  /// Bearer token issued by the identity provider.
  #[arg(long, env = "WEAVE_TOKEN", hide_env_values = true)]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the caller's profile.
  Whoami,
  /// Create or update the caller's profile.
  Profile {
    /// Subject of the bearer token.
    #[arg(long)]
    sub:        String,
    #[arg(long)]
    name:       String,
    #[arg(long)]
    title:      Option<String>,
    #[arg(long)]
    avatar_url: Option<String>,
    #[arg(long)]
    bio:        Option<String>,
    #[arg(long)]
    location:   Option<String>,
  },
  /// Show connections, suggestions and pending invitations.
  Network {
    #[arg(long, value_enum, default_value_t = Tab::Connections)]
    tab:    Tab,
    #[arg(long, value_enum)]
    layout: Option<Layout>,
  },
  /// Ask a user to connect.
  Connect { user: String },
  /// Accept a pending invitation.
  Accept { invitation: String },
  /// Reject a pending invitation.
  Reject { invitation: String },
  /// Find users by name, username or title.
  Search { query: String },
  /// Show a profile with its connections, posts and comments.
  User {
    /// Username or id; the caller when omitted.
    target: Option<String>,
    #[arg(long, value_enum)]
    layout: Option<Layout>,
  },
  /// Show the feed.
  Feed {
    #[arg(long, default_value_t = FEED_PAGE.page)]
    page:  u32,
    #[arg(long, default_value_t = FEED_PAGE.limit)]
    limit: u32,
  },
  /// Publish a post.
  Post {
    content:   String,
    #[arg(long)]
    image_url: Option<String>,
  },
  Like { post: String },
  Unlike { post: String },
  /// Comment on a post.
  Comment { post: String, content: String },
  /// Show the comments on a post.
  Comments { post: String },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:    String,
  #[serde(default)]
  token:  String,
  #[serde(default)]
  layout: Option<Layout>,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_string()) }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let url = args
    .url
    .or_else(|| non_empty(&file_cfg.url))
    .unwrap_or_else(|| DEFAULT_URL.to_string());
  let token = args.token.or_else(|| non_empty(&file_cfg.token)).unwrap_or_default();

  let client     = ApiClient::new(url).context("building HTTP client")?;
  let controller = Controller::new(client, StaticToken::new(token));

  // Ctrl-C cancels whatever is in flight.
  let cancel = CancellationToken::new();
  {
    let cancel = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        cancel.cancel();
      }
    });
  }

  run(&controller, args.command, file_cfg.layout, &cancel).await
}

async fn run(
  controller: &Controller<StaticToken>,
  command:    Command,
  layout:     Option<Layout>,
  cancel:     &CancellationToken,
) -> Result<()> {
  match command {
    Command::Whoami => {
      let me = controller.current_user(cancel).await?;
      println!("{} @{}", me.name, me.username);
      if let Some(title) = &me.title {
        println!("{title}");
      }
      println!("id:  {}", me.id);
      println!("sub: {}", me.sub);
    }

    Command::Profile { sub, name, title, avatar_url, bio, location } => {
      let profile = UserUpsert { sub, name, title, avatar_url, bio, location };
      let me      = controller.upsert_profile(&profile, cancel).await?;
      println!("saved profile @{} ({})", me.username, me.id);
    }

    Command::Network { tab, layout: flag } => {
      let view = controller.load_network(cancel).await?;
      print!("{}", render_network(&view, tab, flag.or(layout).unwrap_or_default()));
    }

    Command::Connect { user } => {
      let mutation = Mutation::from_input(MutationKind::Connect, Some(user.as_str()))?;
      let (_, view) = controller.apply_and_refresh(&mutation, cancel).await?;
      println!("request sent");
      print!("{}", render_network(&view, Tab::Suggestions, layout.unwrap_or_default()));
    }

    Command::Accept { invitation } => {
      let mutation = Mutation::from_input(MutationKind::Accept, Some(invitation.as_str()))?;
      let (_, view) = controller.apply_and_refresh(&mutation, cancel).await?;
      println!("invitation accepted");
      print!("{}", render_network(&view, Tab::Connections, layout.unwrap_or_default()));
    }

    Command::Reject { invitation } => {
      let mutation = Mutation::from_input(MutationKind::Reject, Some(invitation.as_str()))?;
      let (_, view) = controller.apply_and_refresh(&mutation, cancel).await?;
      println!("invitation rejected");
      print!("{}", render_network(&view, Tab::Pending, layout.unwrap_or_default()));
    }

    Command::Search { query } => {
      for user in controller.search_users(&query, cancel).await? {
        println!("{} @{}  {}", user.name, user.username, user.id);
      }
    }

    Command::User { target, layout: flag } => {
      let view = controller.load_profile(&UserRef::parse(target.as_deref()), cancel).await?;
      print!("{}", render_profile(&view, flag.or(layout).unwrap_or_default()));
    }

    Command::Feed { page, limit } => {
      let posts = controller.load_feed(PageRequest::new(page, limit), cancel).await?;
      print!("{}", render_posts(&posts));
    }

    Command::Post { content, image_url } => {
      let mutation = Mutation::Publish(NewPost { content, image_url });
      if let Applied::Post(post) = controller.apply(&mutation, cancel).await? {
        println!("published {}", post.id);
      }
    }

    Command::Like { post } => {
      let mutation = Mutation::from_input(MutationKind::Like, Some(post.as_str()))?;
      if let Applied::Likes(count) = controller.apply(&mutation, cancel).await? {
        println!("♥ {}", count.likes);
      }
    }

    Command::Unlike { post } => {
      let mutation = Mutation::from_input(MutationKind::Unlike, Some(post.as_str()))?;
      if let Applied::Likes(count) = controller.apply(&mutation, cancel).await? {
        println!("♥ {}", count.likes);
      }
    }

    Command::Comment { post, content } => {
      let mutation = Mutation::comment_input(Some(post.as_str()), content)?;
      controller.apply(&mutation, cancel).await?;
      if let Mutation::Comment { post, .. } = mutation {
        let comments = controller.load_comments(post, COMMENTS_PAGE, cancel).await?;
        print!("{}", render_comments(&comments));
      }
    }

    Command::Comments { post } => {
      let post: uuid::Uuid = post.parse().context("post id must be a UUID")?;
      let comments = controller.load_comments(post, COMMENTS_PAGE, cancel).await?;
      print!("{}", render_comments(&comments));
    }
  }

  Ok(())
}
