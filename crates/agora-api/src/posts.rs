//! Handlers for `/posts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/posts` | `?period=June%202025&include_closed=true` |
//! | `POST`   | `/posts` | Admin |
//! | `GET`    | `/posts/:id` | 404 if not found |
//! | `PUT`    | `/posts/:id` | Admin; partial update |
//! | `DELETE` | `/posts/:id` | Admin; votes are kept |
//! | `GET`    | `/posts/:id/votes` | Authoritative count |
//! | `POST`   | `/posts/sync-votes` | Admin |
//! | `POST`   | `/posts/close-period` | Admin; body `{"period":"June 2025"}` |

use agora_core::{
  VotingPeriod,
  ballot::{Post, PostFilter, PostPatch, SyncEntry},
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, AppStore, auth::Admin, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub period:         Option<VotingPeriod>,
  #[serde(default)]
  pub include_closed: bool,
}

/// `GET /posts[?period=<label>][&include_closed=true]`
pub async fn list<S: AppStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Post>>, ApiError> {
  let filter = PostFilter {
    period:         params.period,
    include_closed: params.include_closed,
  };
  Ok(Json(state.voting.list_posts(filter).await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:       String,
  pub description: String,
  pub link:        Option<String>,
  /// Defaults to the month before now.
  pub period:      Option<VotingPeriod>,
}

/// `POST /posts`
pub async fn create<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let post = state
    .voting
    .create_post(&caller, body.title, body.description, body.link, body.period)
    .await?;
  Ok((StatusCode::CREATED, Json(post)))
}

// ─── Single post ─────────────────────────────────────────────────────────────

/// `GET /posts/:id`
pub async fn get_one<S: AppStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
  Ok(Json(state.voting.get_post(id).await?))
}

/// `PUT /posts/:id`
pub async fn update<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
  Path(id): Path<Uuid>,
  Json(patch): Json<PostPatch>,
) -> Result<Json<Post>, ApiError> {
  Ok(Json(state.voting.update_post(&caller, id, patch).await?))
}

/// `DELETE /posts/:id`
pub async fn delete_one<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.voting.delete_post(&caller, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct VoteCount {
  pub post_id: Uuid,
  pub votes:   u32,
}

/// `GET /posts/:id/votes`
pub async fn vote_count<S: AppStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<VoteCount>, ApiError> {
  let votes = state.voting.count_for_post(id).await?;
  Ok(Json(VoteCount { post_id: id, votes }))
}

// ─── Maintenance ─────────────────────────────────────────────────────────────

/// `POST /posts/sync-votes`
pub async fn sync_votes<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
) -> Result<Json<Vec<SyncEntry>>, ApiError> {
  Ok(Json(state.voting.sync_vote_counts(&caller).await?))
}

#[derive(Debug, Deserialize)]
pub struct ClosePeriodBody {
  pub period: VotingPeriod,
}

#[derive(Debug, Serialize)]
pub struct Closed {
  pub period: VotingPeriod,
  pub closed: usize,
}

/// `POST /posts/close-period`
pub async fn close_period<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
  Json(body): Json<ClosePeriodBody>,
) -> Result<Json<Closed>, ApiError> {
  let closed = state.voting.close_all_for_period(&caller, body.period).await?;
  Ok(Json(Closed { period: body.period, closed }))
}
