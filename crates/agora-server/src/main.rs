//! Agora server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `AGORA_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP.
//!
//! # Bootstrapping the first admin
//!
//! Sign up through the API, then:
//!
//! ```sh
//! cargo run -p agora-server -- --grant-admin you@example.com
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use agora_api::AppState;
use agora_core::{account::normalize_email, store::AccountStore};
use agora_server::ServerConfig;
use agora_store_sqlite::SqliteStore;
use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Agora community voting server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Make an existing account an admin and voter, then exit.
  #[arg(long, value_name = "EMAIL")]
  grant_admin: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("AGORA"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.validate().context("invalid configuration")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: promote an account and exit.
  if let Some(email) = cli.grant_admin {
    return grant_admin(&store, &email).await;
  }

  let state = AppState::new(
    Arc::new(store),
    server_cfg.voting_rules(),
    server_cfg.auth_config(),
  );

  let app = agora_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(
    votes_per_period = server_cfg.votes_per_period,
    voting_duration_hours = server_cfg.voting_duration_hours,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn grant_admin(store: &SqliteStore, email: &str) -> anyhow::Result<()> {
  let email = normalize_email(email)?;
  store
    .set_whitelisted(email.clone(), true)
    .await
    .context("failed to update whitelist")?
    .with_context(|| format!("no account registered for {email}"))?;
  store
    .set_admin(email.clone(), true)
    .await
    .context("failed to update admin flag")?;
  tracing::info!(%email, "granted admin");
  println!("{email} is now an admin");
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
