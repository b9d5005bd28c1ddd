//! API error type and [`axum::response::IntoResponse`] implementation.

use agora_core::Error as CoreError;
use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A server-side failure outside the store, e.g. password hashing.
  #[error("internal error: {0}")]
  Internal(String),
}

/// Convert any store error into an [`ApiError`], keeping business-rule
/// failures detected by the store.
pub(crate) fn store_err<E: Into<CoreError>>(e: E) -> ApiError { ApiError::Core(e.into()) }

fn status_of(e: &CoreError) -> StatusCode {
  match e {
    CoreError::Unauthenticated | CoreError::InvalidCredentials => StatusCode::UNAUTHORIZED,
    CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
    CoreError::PostNotFound(_) | CoreError::NotFound(_) => StatusCode::NOT_FOUND,
    CoreError::InvalidPeriod(_) | CoreError::Validation(_) => StatusCode::BAD_REQUEST,
    CoreError::DuplicateVote { .. }
    | CoreError::QuotaExceeded { .. }
    | CoreError::VotingInactive
    | CoreError::PostClosed(_)
    | CoreError::PostNotInPeriod { .. }
    | CoreError::AlreadyActive(_)
    | CoreError::NoActiveVoting
    | CoreError::NoPostsForPeriod(_)
    | CoreError::UserExists(_) => StatusCode::CONFLICT,
    CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code, message) = match &self {
      ApiError::Core(e) => (status_of(e), e.code(), e.to_string()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.clone()),
      ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", String::new()),
    };

    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
      let body = json!({ "error": "internal server error", "code": "internal" });
      return (status, Json(body)).into_response();
    }

    (status, Json(json!({ "error": message, "code": code }))).into_response()
  }
}
