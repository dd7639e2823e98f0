//! weave-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) overlaid by
//! `WEAVE_*` environment variables, opens an in-process SQLite store, and
//! serves the JSON API over HTTP.
//!
//! # Issuing tokens
//!
//! ```
//! cargo run -p weave-server -- --issue-token 'auth0|ada'
//! ```
//!
//! prints a bearer token for the client and the `[[tokens]]` entry to add
//! to `config.toml`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use weave_server::{
  AppState, ServerConfig,
  auth::{DigestTokens, issue_token},
};
use weave_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Weave API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Mint a bearer token for the given subject, print it and exit.
  #[arg(long, value_name = "SUB")]
  issue_token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: mint a token and exit.
  if let Some(sub) = cli.issue_token {
    let issued = issue_token(&sub);
    println!("token: {}", issued.token);
    println!();
    println!("[[tokens]]");
    println!("sub    = {:?}", issued.entry.sub);
    println!("sha256 = {:?}", issued.entry.sha256);
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("WEAVE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let tokens = DigestTokens::from_entries(&server_cfg.tokens)
    .context("invalid [[tokens]] entry")?;
  if tokens.is_empty() {
    tracing::warn!("no tokens configured; every /api request will be rejected");
  }

  let store_path = server_cfg.resolved_store_path();
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = AppState {
    store:    Arc::new(store),
    verifier: Arc::new(tokens),
  };

  let app     = weave_server::router(state);
  let address = server_cfg.address();

  tracing::info!(tokens = server_cfg.tokens.len(), "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
