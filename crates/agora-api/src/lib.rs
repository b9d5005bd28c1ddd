//! JSON REST API for Agora.
//!
//! Exposes an axum [`Router`] backed by any store implementing the three
//! Agora store traits. TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", agora_api::api_router(state))
//! ```

pub mod accounts;
pub mod auth;
pub mod error;
pub mod library;
pub mod posts;
pub mod results;
pub mod voting;

use std::sync::Arc;

use agora_core::{
  VotingRules, VotingService,
  store::{AccountStore, BallotStore, LibraryStore},
};
use axum::{
  Router,
  body::Bytes,
  routing::{get, post, put},
};
use serde::de::DeserializeOwned;

pub use auth::AuthConfig;
pub use error::ApiError;

/// Everything the API needs from a storage backend.
pub trait AppStore: BallotStore + AccountStore + LibraryStore + 'static {}

impl<T> AppStore for T where T: BallotStore + AccountStore + LibraryStore + 'static {}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub voting: VotingService<S>,
  pub auth:   Arc<AuthConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      voting: self.voting.clone(),
      auth:   Arc::clone(&self.auth),
    }
  }
}

impl<S: AppStore> AppState<S> {
  pub fn new(store: Arc<S>, rules: VotingRules, auth: AuthConfig) -> Self {
    Self {
      voting: VotingService::new(Arc::clone(&store), rules),
      store,
      auth: Arc::new(auth),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S: AppStore>(state: AppState<S>) -> Router<()> {
  Router::new()
    // Voting period
    .route("/voting/status", get(voting::status::<S>))
    .route("/voting/start", post(voting::start::<S>))
    .route("/voting/stop", post(voting::stop::<S>))
    .route("/voting/cancel", post(voting::cancel::<S>))
    .route("/voting/history", get(voting::history::<S>))
    // Votes
    .route("/votes", post(voting::cast::<S>))
    .route("/votes/me", get(voting::ballot::<S>))
    // Posts
    .route("/posts", get(posts::list::<S>).post(posts::create::<S>))
    .route(
      "/posts/{id}",
      get(posts::get_one::<S>)
        .put(posts::update::<S>)
        .delete(posts::delete_one::<S>),
    )
    .route("/posts/{id}/votes", get(posts::vote_count::<S>))
    .route("/posts/sync-votes", post(posts::sync_votes::<S>))
    .route("/posts/close-period", post(posts::close_period::<S>))
    // Results
    .route("/results", get(results::for_period::<S>))
    .route("/results/periods", get(results::periods::<S>))
    // Accounts
    .route("/auth/signup", post(accounts::signup::<S>))
    .route("/auth/login", post(accounts::login::<S>))
    .route("/auth/logout", post(accounts::logout::<S>))
    .route("/users", get(accounts::list_users::<S>))
    .route("/users/me", get(accounts::me::<S>).put(accounts::update_me::<S>))
    .route("/users/me/password", put(accounts::change_password::<S>))
    .route("/users/whitelist", post(accounts::set_whitelisted::<S>))
    .route("/users/admin", post(accounts::set_admin::<S>))
    .route("/users/{id}", get(accounts::get_user::<S>))
    // Library
    .route(
      "/announcements",
      get(library::list_announcements::<S>).post(library::create_announcement::<S>),
    )
    .route("/announcements/all", get(library::list_all_announcements::<S>))
    .route(
      "/announcements/{id}",
      put(library::update_announcement::<S>).delete(library::delete_announcement::<S>),
    )
    .route("/assets", get(library::list_assets::<S>).post(library::create_asset::<S>))
    .route(
      "/assets/{id}",
      put(library::update_asset::<S>).delete(library::delete_asset::<S>),
    )
    .route(
      "/recordings",
      get(library::list_recordings::<S>).post(library::create_recording::<S>),
    )
    .route(
      "/recordings/{id}",
      put(library::update_recording::<S>).delete(library::delete_recording::<S>),
    )
    .route(
      "/submissions",
      get(library::list_submissions::<S>).post(library::create_submission::<S>),
    )
    .route("/submissions/{id}", axum::routing::delete(library::delete_submission::<S>))
    .route("/submissions/{id}/review", post(library::review_submission::<S>))
    .with_state(state)
}

/// Parse an optional JSON body; an empty body yields `T::default()`.
pub(crate) fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(T::default());
  }
  serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}
