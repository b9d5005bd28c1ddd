//! Handlers for `/results` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/results` | `?period=<label>`; defaults to the latest period with results |
//! | `GET`  | `/results/periods` | Most recent first |

use agora_core::{VotingPeriod, ballot::VotingResult};
use axum::{
  Json,
  extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, AppStore, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ResultsParams {
  pub period: Option<VotingPeriod>,
}

#[derive(Debug, Serialize)]
pub struct ResultsView {
  /// `None` when no period has results yet.
  pub period:  Option<VotingPeriod>,
  pub results: Vec<VotingResult>,
}

/// `GET /results[?period=<label>]`
pub async fn for_period<S: AppStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ResultsParams>,
) -> Result<Json<ResultsView>, ApiError> {
  let period = match params.period {
    Some(p) => Some(p),
    None => state.voting.result_periods().await?.into_iter().next(),
  };
  let results = match period {
    Some(p) => state.voting.results(p).await?,
    None => Vec::new(),
  };
  Ok(Json(ResultsView { period, results }))
}

/// `GET /results/periods`
pub async fn periods<S: AppStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<VotingPeriod>>, ApiError> {
  Ok(Json(state.voting.result_periods().await?))
}
