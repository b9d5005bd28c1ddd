//! HTTP server assembly for Agora.
//!
//! Mounts the JSON API from `agora-api` under `/api`, adds a health check and
//! request tracing, and defines the runtime configuration read by the binary.

use std::path::PathBuf;

use agora_api::{AppState, AppStore, AuthConfig, api_router};
use agora_core::VotingRules;
use axum::{Router, routing::get};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `AGORA_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub store_path:            PathBuf,
  pub votes_per_period:      u32,
  pub voting_duration_hours: i64,
  pub session_ttl_days:      i64,
  pub secure_cookies:        bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  "127.0.0.1".to_string(),
      port:                  8080,
      store_path:            PathBuf::from("agora.db"),
      votes_per_period:      2,
      voting_duration_hours: 48,
      session_ttl_days:      30,
      secure_cookies:        false,
    }
  }
}

/// Longest voting period the server will open.
pub const MAX_VOTING_DURATION_HOURS: i64 = 24 * 366;
/// Longest login session the server will issue.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

impl ServerConfig {
  /// Reject values that would open a period nobody can vote in, or overflow
  /// when turned into durations.
  pub fn validate(&self) -> anyhow::Result<()> {
    anyhow::ensure!(self.votes_per_period >= 1, "votes_per_period must be at least 1");
    anyhow::ensure!(
      (1..=MAX_VOTING_DURATION_HOURS).contains(&self.voting_duration_hours),
      "voting_duration_hours must be between 1 and {MAX_VOTING_DURATION_HOURS}"
    );
    anyhow::ensure!(
      (1..=MAX_SESSION_TTL_DAYS).contains(&self.session_ttl_days),
      "session_ttl_days must be between 1 and {MAX_SESSION_TTL_DAYS}"
    );
    Ok(())
  }

  pub fn voting_rules(&self) -> VotingRules {
    VotingRules {
      votes_per_period: self.votes_per_period,
      duration:         chrono::Duration::hours(self.voting_duration_hours),
    }
  }

  pub fn auth_config(&self) -> AuthConfig {
    AuthConfig {
      session_ttl:    chrono::Duration::days(self.session_ttl_days),
      secure_cookies: self.secure_cookies,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S: AppStore>(state: AppState<S>) -> Router {
  Router::new()
    .route("/health", get(health))
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

// ─── Integration tests ───────────────────────────────────────────────────────
