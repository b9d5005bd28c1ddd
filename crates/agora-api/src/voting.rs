//! Handlers for the voting period and for casting votes.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/voting/status` | Public |
//! | `POST` | `/voting/start` | Admin; optional body `{"period":"June 2025"}` |
//! | `POST` | `/voting/stop` | Admin; returns the ranked results |
//! | `POST` | `/voting/cancel` | Admin; no results are recorded |
//! | `GET`  | `/voting/history` | Admin |
//! | `POST` | `/votes` | Whitelisted; body `{"post_id":"…"}` |
//! | `GET`  | `/votes/me` | The caller's ballot for the active period |
//!
//! The [`Admin`] and [`Voter`] extractors reject a caller before the body is
//! read; [`agora_core::VotingService`] checks the same capabilities again.

use agora_core::{
  VotingPeriod,
  ballot::{Ballot, VoteReceipt, VotingPeriodStatus, VotingResult, VotingStatus},
};
use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState, AppStore,
  auth::{Admin, Authenticated, Voter},
  error::ApiError,
  optional_json,
};

// ─── Period lifecycle ────────────────────────────────────────────────────────

/// `GET /voting/status`
pub async fn status<S: AppStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<VotingStatus>, ApiError> {
  Ok(Json(state.voting.status().await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct StartBody {
  pub period: Option<VotingPeriod>,
}

/// `POST /voting/start`
pub async fn start<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
  let StartBody { period } = optional_json(&body)?;
  let status = state.voting.start(&caller, period).await?;
  Ok((StatusCode::CREATED, Json(status)))
}

/// `POST /voting/stop`
pub async fn stop<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
) -> Result<Json<Vec<VotingResult>>, ApiError> {
  Ok(Json(state.voting.stop(&caller).await?))
}

/// `POST /voting/cancel`
pub async fn cancel<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
) -> Result<Json<VotingPeriodStatus>, ApiError> {
  Ok(Json(state.voting.cancel(&caller).await?))
}

/// `GET /voting/history`
pub async fn history<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
) -> Result<Json<Vec<VotingPeriodStatus>>, ApiError> {
  Ok(Json(state.voting.history(&caller).await?))
}

// ─── Votes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CastBody {
  pub post_id: Uuid,
}

/// `POST /votes`
pub async fn cast<S: AppStore>(
  State(state): State<AppState<S>>,
  Voter(caller): Voter,
  Json(body): Json<CastBody>,
) -> Result<(StatusCode, Json<VoteReceipt>), ApiError> {
  let receipt = state.voting.cast_vote(&caller, body.post_id).await?;
  Ok((StatusCode::CREATED, Json(receipt)))
}

/// `GET /votes/me`
pub async fn ballot<S: AppStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Ballot>, ApiError> {
  Ok(Json(state.voting.ballot(&caller).await?))
}
