//! Storage traits.
//!
//! Implemented by storage backends (e.g. `agora-store-sqlite`). Higher layers
//! (`agora-api`, [`crate::voting::VotingService`]) depend on these
//! abstractions, not on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  account::{Credentials, NewUser, ProfileUpdate, User},
  ballot::{
    CastOutcome, NewPost, Post, PostFilter, PostPatch, VoterVotes,
    VotingPeriodStatus, VotingResult,
  },
  library::{
    Announcement, Asset, AssetKind, NewAnnouncement, NewAsset, NewRecording,
    NewSubmission, Recording, Submission, SubmissionReview,
  },
  period::VotingPeriod,
};

/// Shared backend error type. Backends convert into [`crate::Error`] so that
/// business-rule failures detected at the storage layer (unique-constraint
/// rejections) keep their meaning.
pub trait Store: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;
}

// ─── Ballot ──────────────────────────────────────────────────────────────────

/// Votes, posts, voting-period status rows and result snapshots.
pub trait BallotStore: Store {
  // ── Votes ─────────────────────────────────────────────────────────────

  /// Record a vote unless the voter already voted for `post_id` in `period`
  /// (`Duplicate`) or already holds `cap` votes in `period`
  /// (`QuotaExceeded`). The duplicate check takes precedence.
  fn cast_vote(
    &self,
    voter: String,
    post_id: Uuid,
    period: VotingPeriod,
    cap: u32,
  ) -> impl Future<Output = Result<CastOutcome, Self::Error>> + Send + '_;

  /// Authoritative number of votes for `post_id` within `period`.
  fn count_for_post(
    &self,
    post_id: Uuid,
    period: VotingPeriod,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// The posts `voter` has voted for within `period`, and how many.
  fn vote_status_for_voter(
    &self,
    voter: String,
    period: VotingPeriod,
  ) -> impl Future<Output = Result<VoterVotes, Self::Error>> + Send + '_;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Persist a new, open post with a zero vote cache.
  fn create_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  fn get_post(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Posts matching `filter`, newest first.
  fn list_posts(
    &self,
    filter: PostFilter,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  /// Apply `patch`; `None` if the post does not exist.
  fn update_post(
    &self,
    post_id: Uuid,
    patch: PostPatch,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Delete a post. Its votes are kept. Returns `false` if it did not exist.
  fn delete_post(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Mark every open post in `period` closed. Idempotent; returns the number
  /// of posts newly closed.
  fn close_all_for_period(
    &self,
    period: VotingPeriod,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Recompute a post's cached vote count from the vote table, persist it and
  /// return it.
  fn refresh_vote_count(
    &self,
    post_id: Uuid,
    period: VotingPeriod,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  // ── Voting period status ──────────────────────────────────────────────

  /// Insert a status row. Fails with [`crate::Error::AlreadyActive`] if the
  /// row is active and another active row exists.
  fn insert_voting_period(
    &self,
    status: VotingPeriodStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn active_voting_period(
    &self,
  ) -> impl Future<Output = Result<Option<VotingPeriodStatus>, Self::Error>> + Send + '_;

  /// Every status row, newest first.
  fn voting_history(
    &self,
  ) -> impl Future<Output = Result<Vec<VotingPeriodStatus>, Self::Error>> + Send + '_;

  /// Deactivate a status row, stamping its actual end time. Returns `false`
  /// if the row was no longer active.
  fn deactivate_voting_period(
    &self,
    status_id: Uuid,
    ended_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Results ───────────────────────────────────────────────────────────

  /// Close `period` in one write transaction and return its ranked results.
  ///
  /// The transaction deactivates `status_id` at `ended_at`, counts the votes
  /// of every open post of `period`, ranks them with [`crate::tally::rank`],
  /// replaces the period's results with the snapshot, writes the counts back
  /// to the posts and closes them.
  ///
  /// Fails with [`crate::Error::NoActiveVoting`] if `status_id` is no longer
  /// active and with [`crate::Error::NoPostsForPeriod`] if the period has no
  /// open posts. Either failure leaves every row untouched.
  fn finalize_period(
    &self,
    status_id: Uuid,
    period: VotingPeriod,
    ended_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<VotingResult>, Self::Error>> + Send + '_;

  /// Results of `period`, rank ascending.
  fn results_for_period(
    &self,
    period: VotingPeriod,
  ) -> impl Future<Output = Result<Vec<VotingResult>, Self::Error>> + Send + '_;

  /// Distinct periods that have results, in no particular order.
  fn result_periods(
    &self,
  ) -> impl Future<Output = Result<Vec<VotingPeriod>, Self::Error>> + Send + '_;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// Users and login sessions.
pub trait AccountStore: Store {
  /// Fails with [`crate::Error::UserExists`] on a taken email or username.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_credentials(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + '_;

  fn list_users(&self)
  -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  fn set_whitelisted(
    &self,
    email: String,
    whitelisted: bool,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn set_admin(
    &self,
    email: String,
    admin: bool,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Apply an already-validated profile update.
  fn update_profile(
    &self,
    user_id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn set_password_hash(
    &self,
    user_id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn record_login(
    &self,
    user_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Store a session keyed by the digest of its token.
  fn create_session(
    &self,
    token_hash: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove sessions that expired at or before `now`. Returns how many went.
  fn purge_expired_sessions(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Remove every session of `user_id` except the one keyed by `keep`.
  fn delete_other_sessions(
    &self,
    user_id: Uuid,
    keep: String,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// The user owning an unexpired session.
  fn session_user(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn delete_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Library ─────────────────────────────────────────────────────────────────

/// Announcements, assets, townhall recordings and content submissions.
pub trait LibraryStore: Store {
  fn create_announcement(
    &self,
    input: NewAnnouncement,
    created_by: String,
  ) -> impl Future<Output = Result<Announcement, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_announcements(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<Announcement>, Self::Error>> + Send + '_;

  fn update_announcement(
    &self,
    id: Uuid,
    input: NewAnnouncement,
  ) -> impl Future<Output = Result<Option<Announcement>, Self::Error>> + Send + '_;

  fn delete_announcement(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn create_asset(
    &self,
    input: NewAsset,
  ) -> impl Future<Output = Result<Asset, Self::Error>> + Send + '_;

  /// Newest first, optionally restricted to one kind.
  fn list_assets(
    &self,
    kind: Option<AssetKind>,
  ) -> impl Future<Output = Result<Vec<Asset>, Self::Error>> + Send + '_;

  fn update_asset(
    &self,
    id: Uuid,
    input: NewAsset,
  ) -> impl Future<Output = Result<Option<Asset>, Self::Error>> + Send + '_;

  fn delete_asset(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn create_recording(
    &self,
    input: NewRecording,
  ) -> impl Future<Output = Result<Recording, Self::Error>> + Send + '_;

  /// Most recently recorded first.
  fn list_recordings(
    &self,
  ) -> impl Future<Output = Result<Vec<Recording>, Self::Error>> + Send + '_;

  fn update_recording(
    &self,
    id: Uuid,
    input: NewRecording,
  ) -> impl Future<Output = Result<Option<Recording>, Self::Error>> + Send + '_;

  fn delete_recording(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn create_submission(
    &self,
    input: NewSubmission,
    submitted_by: String,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  /// Newest first; `submitted_by` restricts to one submitter.
  fn list_submissions(
    &self,
    submitted_by: Option<String>,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  fn review_submission(
    &self,
    id: Uuid,
    review: SubmissionReview,
  ) -> impl Future<Output = Result<Option<Submission>, Self::Error>> + Send + '_;

  fn delete_submission(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
