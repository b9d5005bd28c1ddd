//! Handlers for announcements, assets, townhall recordings and content
//! submissions.
//!
//! Reads are public except submissions; writes are admin-only except
//! submitting content, which any signed-in user may do.

use agora_core::{
  Error,
  library::{
    Announcement, Asset, AssetKind, NewAnnouncement, NewAsset, NewRecording,
    NewSubmission, Recording, Submission, SubmissionReview,
  },
  store::LibraryStore,
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
  AppState, AppStore,
  auth::{Admin, Authenticated},
  error::{ApiError, store_err},
};

fn deleted(found: bool, what: &str, id: Uuid) -> Result<StatusCode, ApiError> {
  if found {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(Error::NotFound(format!("{what} {id}")).into())
  }
}

// ─── Announcements ───────────────────────────────────────────────────────────

/// `GET /announcements` — active only.
pub async fn list_announcements<S: AppStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Announcement>>, ApiError> {
  Ok(Json(state.store.list_announcements(true).await.map_err(store_err)?))
}

/// `GET /announcements/all`
pub async fn list_all_announcements<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
) -> Result<Json<Vec<Announcement>>, ApiError> {
  Ok(Json(state.store.list_announcements(false).await.map_err(store_err)?))
}

/// `POST /announcements`
pub async fn create_announcement<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
  Json(body): Json<NewAnnouncement>,
) -> Result<impl IntoResponse, ApiError> {
  body.validate()?;
  let announcement = state
    .store
    .create_announcement(body, caller.email)
    .await
    .map_err(store_err)?;
  info!(id = %announcement.announcement_id, "announcement posted");
  Ok((StatusCode::CREATED, Json(announcement)))
}

/// `PUT /announcements/:id`
pub async fn update_announcement<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(id): Path<Uuid>,
  Json(body): Json<NewAnnouncement>,
) -> Result<Json<Announcement>, ApiError> {
  body.validate()?;
  let announcement = state
    .store
    .update_announcement(id, body)
    .await
    .map_err(store_err)?
    .ok_or_else(|| Error::NotFound(format!("announcement {id}")))?;
  Ok(Json(announcement))
}

/// `DELETE /announcements/:id`
pub async fn delete_announcement<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let found = state.store.delete_announcement(id).await.map_err(store_err)?;
  deleted(found, "announcement", id)
}

// ─── Assets ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssetParams {
  pub kind: Option<AssetKind>,
}

/// `GET /assets[?kind=image|video|banner]`
pub async fn list_assets<S: AppStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<AssetParams>,
) -> Result<Json<Vec<Asset>>, ApiError> {
  Ok(Json(state.store.list_assets(params.kind).await.map_err(store_err)?))
}

/// `POST /assets`
pub async fn create_asset<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Json(body): Json<NewAsset>,
) -> Result<impl IntoResponse, ApiError> {
  body.validate()?;
  let asset = state.store.create_asset(body).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(asset)))
}

/// `PUT /assets/:id`
pub async fn update_asset<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(id): Path<Uuid>,
  Json(body): Json<NewAsset>,
) -> Result<Json<Asset>, ApiError> {
  body.validate()?;
  let asset = state
    .store
    .update_asset(id, body)
    .await
    .map_err(store_err)?
    .ok_or_else(|| Error::NotFound(format!("asset {id}")))?;
  Ok(Json(asset))
}

/// `DELETE /assets/:id`
pub async fn delete_asset<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let found = state.store.delete_asset(id).await.map_err(store_err)?;
  deleted(found, "asset", id)
}

// ─── Recordings ──────────────────────────────────────────────────────────────

/// `GET /recordings`
pub async fn list_recordings<S: AppStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Recording>>, ApiError> {
  Ok(Json(state.store.list_recordings().await.map_err(store_err)?))
}

/// `POST /recordings`
pub async fn create_recording<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Json(body): Json<NewRecording>,
) -> Result<impl IntoResponse, ApiError> {
  body.validate()?;
  let recording = state.store.create_recording(body).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(recording)))
}

/// `PUT /recordings/:id`
pub async fn update_recording<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(id): Path<Uuid>,
  Json(body): Json<NewRecording>,
) -> Result<Json<Recording>, ApiError> {
  body.validate()?;
  let recording = state
    .store
    .update_recording(id, body)
    .await
    .map_err(store_err)?
    .ok_or_else(|| Error::NotFound(format!("recording {id}")))?;
  Ok(Json(recording))
}

/// `DELETE /recordings/:id`
pub async fn delete_recording<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let found = state.store.delete_recording(id).await.map_err(store_err)?;
  deleted(found, "recording", id)
}

// ─── Submissions ─────────────────────────────────────────────────────────────

/// `GET /submissions` — admins see every submission, others their own.
pub async fn list_submissions<S: AppStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<Vec<Submission>>, ApiError> {
  let submitter = (!caller.may_administer).then_some(caller.email);
  Ok(Json(state.store.list_submissions(submitter).await.map_err(store_err)?))
}

/// `POST /submissions`
pub async fn create_submission<S: AppStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(body): Json<NewSubmission>,
) -> Result<impl IntoResponse, ApiError> {
  body.validate()?;
  let submission = state
    .store
    .create_submission(body, caller.email)
    .await
    .map_err(store_err)?;
  info!(id = %submission.submission_id, by = %submission.submitted_by, "content submitted");
  Ok((StatusCode::CREATED, Json(submission)))
}

/// `POST /submissions/:id/review`
pub async fn review_submission<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
  Path(id): Path<Uuid>,
  Json(body): Json<SubmissionReview>,
) -> Result<Json<Submission>, ApiError> {
  let status = body.status;
  let submission = state
    .store
    .review_submission(id, body)
    .await
    .map_err(store_err)?
    .ok_or_else(|| Error::NotFound(format!("submission {id}")))?;
  info!(%id, %status, by = %caller.email, "submission reviewed");
  Ok(Json(submission))
}

/// `DELETE /submissions/:id`
pub async fn delete_submission<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let found = state.store.delete_submission(id).await.map_err(store_err)?;
  deleted(found, "submission", id)
}
