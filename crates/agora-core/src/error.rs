//! Error types for `agora-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::period::VotingPeriod;

#[derive(Debug, Error)]
pub enum Error {
  // ── Authorization ──────────────────────────────────────────────────────
  #[error("authentication required")]
  Unauthenticated,

  #[error("{0}")]
  Forbidden(&'static str),

  #[error("invalid email or password")]
  InvalidCredentials,

  // ── Voting rules ───────────────────────────────────────────────────────
  #[error("you have already voted for this post in {period}")]
  DuplicateVote { post_id: Uuid, period: VotingPeriod },

  #[error("you have used all {cap} of your votes for {period}")]
  QuotaExceeded { cap: u32, period: VotingPeriod },

  #[error("voting is not currently open")]
  VotingInactive,

  #[error("voting is closed for post {0}")]
  PostClosed(Uuid),

  #[error("post {post_id} belongs to {post_period}, not the active period {active_period}")]
  PostNotInPeriod {
    post_id:       Uuid,
    post_period:   VotingPeriod,
    active_period: VotingPeriod,
  },

  // ── Voting period lifecycle ────────────────────────────────────────────
  #[error("voting is already active for {0}")]
  AlreadyActive(VotingPeriod),

  #[error("no active voting period")]
  NoActiveVoting,

  #[error("no open posts found for {0}")]
  NoPostsForPeriod(VotingPeriod),

  // ── Accounts ───────────────────────────────────────────────────────────
  #[error("a user with this {0} already exists")]
  UserExists(&'static str),

  // ── Lookups and input ──────────────────────────────────────────────────
  #[error("post not found: {0}")]
  PostNotFound(Uuid),

  #[error("{0} not found")]
  NotFound(String),

  #[error("invalid voting period label: {0:?}")]
  InvalidPeriod(String),

  #[error("{0}")]
  Validation(String),

  // ── System ─────────────────────────────────────────────────────────────
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Stable machine-readable identifier, sent to clients next to the message.
  pub fn code(&self) -> &'static str {
    match self {
      Self::Unauthenticated => "unauthenticated",
      Self::Forbidden(_) => "forbidden",
      Self::InvalidCredentials => "invalid_credentials",
      Self::DuplicateVote { .. } => "duplicate_vote",
      Self::QuotaExceeded { .. } => "quota_exceeded",
      Self::VotingInactive => "voting_inactive",
      Self::PostClosed(_) => "post_closed",
      Self::PostNotInPeriod { .. } => "post_not_in_period",
      Self::AlreadyActive(_) => "already_active",
      Self::NoActiveVoting => "no_active_voting",
      Self::NoPostsForPeriod(_) => "no_posts_for_period",
      Self::UserExists(_) => "user_exists",
      Self::PostNotFound(_) => "post_not_found",
      Self::NotFound(_) => "not_found",
      Self::InvalidPeriod(_) => "invalid_period",
      Self::Validation(_) => "validation",
      Self::Store(_) => "internal",
    }
  }

  /// Wrap an arbitrary backend failure.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
