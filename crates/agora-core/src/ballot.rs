//! Posts, votes, voting-period status rows and result snapshots.
//!
//! Votes are append-only. A post's `cached_votes` is a denormalized copy of
//! its vote count; the vote table is the authority and the cache is refreshed
//! from it after every cast and at period close.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::period::VotingPeriod;

// ─── Votes ───────────────────────────────────────────────────────────────────

/// One vote by one voter for one post within one period. Never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
  pub vote_id:    Uuid,
  /// The voter's identity; the account email.
  pub voter:      String,
  pub post_id:    Uuid,
  pub period:     VotingPeriod,
  pub created_at: DateTime<Utc>,
}

/// Outcome of an attempted insert into the vote store.
#[derive(Debug, Clone)]
pub enum CastOutcome {
  Recorded(VoteRecord),
  /// The voter already has a vote for this post in this period.
  Duplicate,
  /// The voter has no votes left in this period.
  QuotaExceeded,
}

/// The posts a voter has voted for within one period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterVotes {
  pub post_ids: Vec<Uuid>,
  pub total:    u32,
}

// ─── Posts ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
  pub post_id:      Uuid,
  pub title:        String,
  pub description:  String,
  pub link:         Option<String>,
  /// Denormalized vote count; may lag the vote table until refreshed.
  pub cached_votes: u32,
  pub period:       VotingPeriod,
  pub closed:       bool,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::BallotStore::create_post`].
#[derive(Debug, Clone)]
pub struct NewPost {
  pub title:       String,
  pub description: String,
  pub link:        Option<String>,
  pub period:      VotingPeriod,
}

/// Editable post fields. `None` leaves the field untouched; an empty `link`
/// clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub link:        Option<String>,
}

impl PostPatch {
  pub fn apply(self, post: &mut Post) {
    if let Some(title) = self.title {
      post.title = title;
    }
    if let Some(description) = self.description {
      post.description = description;
    }
    if let Some(link) = self.link {
      post.link = Some(link).filter(|l| !l.trim().is_empty());
    }
  }
}

/// Parameters for [`crate::store::BallotStore::list_posts`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
  pub period:         Option<VotingPeriod>,
  /// Also return posts whose voting has been closed.
  pub include_closed: bool,
}

/// A post paired with its authoritative vote count.
#[derive(Debug, Clone)]
pub struct PostTally {
  pub post:  Post,
  pub votes: u32,
}

/// One line of a cache-refresh report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEntry {
  pub post_id:   Uuid,
  pub title:     String,
  pub old_votes: u32,
  pub new_votes: u32,
}

// ─── Voting period status ────────────────────────────────────────────────────

/// A voting window. At most one row is active at a time; deactivated rows are
/// kept as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingPeriodStatus {
  pub status_id:     Uuid,
  pub active:        bool,
  pub period:        VotingPeriod,
  pub started_at:    DateTime<Utc>,
  /// When voting was planned to end at start time.
  pub scheduled_end: DateTime<Utc>,
  /// When voting actually ended; `None` while active.
  pub ended_at:      Option<DateTime<Utc>>,
}

impl VotingPeriodStatus {
  /// Milliseconds until the scheduled end, clamped at zero.
  pub fn remaining_ms(&self, now: DateTime<Utc>) -> i64 {
    (self.scheduled_end - now).num_milliseconds().max(0)
  }

  pub fn has_elapsed(&self, now: DateTime<Utc>) -> bool { now >= self.scheduled_end }
}

/// Snapshot returned by the status query. Clients derive their countdown from
/// `remaining_ms` and re-poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VotingStatus {
  pub active:        bool,
  pub period:        Option<VotingPeriod>,
  pub started_at:    Option<DateTime<Utc>>,
  pub scheduled_end: Option<DateTime<Utc>>,
  pub remaining_ms:  Option<i64>,
}

impl VotingStatus {
  pub fn inactive() -> Self { Self::default() }

  pub fn from_row(row: &VotingPeriodStatus, now: DateTime<Utc>) -> Self {
    Self {
      active:        row.active,
      period:        Some(row.period),
      started_at:    Some(row.started_at),
      scheduled_end: Some(row.scheduled_end),
      remaining_ms:  Some(row.remaining_ms(now)),
    }
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

pub const UNKNOWN_AUTHOR_EMAIL: &str = "unknown@example.com";
pub const UNKNOWN_AUTHOR_NAME: &str = "Unknown Author";

/// A frozen, ranked line of a closed period's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingResult {
  pub result_id:    Uuid,
  pub post_id:      Uuid,
  pub title:        String,
  pub description:  String,
  pub link:         Option<String>,
  pub author_email: String,
  pub author_name:  String,
  pub total_votes:  u32,
  /// 1-based; contiguous within a period.
  pub rank:         u32,
  pub period:       VotingPeriod,
  pub created_at:   DateTime<Utc>,
}

// ─── Voter-facing views ──────────────────────────────────────────────────────

/// Returned after a successful vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteReceipt {
  pub vote:            VoteRecord,
  /// The post's refreshed vote count.
  pub post_votes:      u32,
  pub votes_used:      u32,
  pub votes_remaining: u32,
}

/// A voter's state for the active period, rendered in one round trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ballot {
  pub period:          Option<VotingPeriod>,
  pub voted_post_ids:  Vec<Uuid>,
  pub votes_used:      u32,
  pub votes_remaining: u32,
}
