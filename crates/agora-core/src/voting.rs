//! The voting-period state machine and vote-casting rules.
//!
//! Voting is globally either inactive or active for exactly one period:
//!
//! ```text
//! INACTIVE --start--> ACTIVE --stop|cancel--> INACTIVE
//! ```
//!
//! The "at most one active period" invariant is owned by the store (a partial
//! unique index in the SQLite backend), not by this type, so it survives
//! restarts and multiple server processes. [`VotingService`] checks
//! capabilities and preconditions before any mutation; a failed `stop` leaves
//! every row untouched.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  account::Caller,
  ballot::{
    Ballot, CastOutcome, NewPost, Post, PostFilter, PostPatch, SyncEntry,
    VoteReceipt, VotingPeriodStatus, VotingResult, VotingStatus,
  },
  period::VotingPeriod,
  store::BallotStore,
};

fn backend<E: Into<Error>>(e: E) -> Error { e.into() }

// ─── Rules ───────────────────────────────────────────────────────────────────

/// Tunables for a deployment.
#[derive(Debug, Clone, Copy)]
pub struct VotingRules {
  /// Maximum votes one voter may cast within one period.
  pub votes_per_period: u32,
  /// How long a period stays open after `start`.
  pub duration:         Duration,
}

impl Default for VotingRules {
  fn default() -> Self {
    Self {
      votes_per_period: 2,
      duration:         Duration::hours(48),
    }
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

/// Voting operations over any [`BallotStore`].
///
/// Cloning is cheap; the store is shared.
pub struct VotingService<S> {
  store: Arc<S>,
  rules: VotingRules,
}

impl<S> Clone for VotingService<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), rules: self.rules }
  }
}

impl<S: BallotStore> VotingService<S> {
  pub fn new(store: Arc<S>, rules: VotingRules) -> Self { Self { store, rules } }

  pub fn rules(&self) -> VotingRules { self.rules }

  // ── Period lifecycle ──────────────────────────────────────────────────

  /// Current status snapshot; all fields empty while inactive.
  pub async fn status(&self) -> Result<VotingStatus> {
    let now = Utc::now();
    Ok(
      self
        .active()
        .await?
        .map(|row| VotingStatus::from_row(&row, now))
        .unwrap_or_else(VotingStatus::inactive),
    )
  }

  /// Open voting. `period` defaults to the current calendar month.
  pub async fn start(
    &self,
    caller: &Caller,
    period: Option<VotingPeriod>,
  ) -> Result<VotingPeriodStatus> {
    caller.require_admin()?;

    if let Some(active) = self.active().await? {
      return Err(Error::AlreadyActive(active.period));
    }

    let now = Utc::now();
    let scheduled_end = now
      .checked_add_signed(self.rules.duration)
      .filter(|end| *end > now)
      .ok_or_else(|| Error::Validation("voting duration is out of range".into()))?;
    let status = VotingPeriodStatus {
      status_id: Uuid::new_v4(),
      active: true,
      period: period.unwrap_or_else(|| VotingPeriod::containing(now)),
      started_at: now,
      scheduled_end,
      ended_at: None,
    };

    self
      .store
      .insert_voting_period(status.clone())
      .await
      .map_err(backend)?;

    info!(
      period = %status.period,
      scheduled_end = %status.scheduled_end,
      by = %caller.email,
      "voting started"
    );
    Ok(status)
  }

  /// Close the active period: tabulate, snapshot results, close its posts and
  /// deactivate it. Returns the ranked results.
  ///
  /// Counting and ranking happen inside the store's closing transaction, so a
  /// concurrent `stop` or `cancel` of the same row fails with
  /// [`Error::NoActiveVoting`] and every committed vote is counted.
  ///
  /// Already-closed posts are not re-tabulated, so a period whose posts were
  /// all closed earlier fails with [`Error::NoPostsForPeriod`]; use
  /// [`Self::cancel`] to end such a period.
  pub async fn stop(&self, caller: &Caller) -> Result<Vec<VotingResult>> {
    caller.require_admin()?;

    let active = self.active().await?.ok_or(Error::NoActiveVoting)?;
    let period = active.period;

    let results = self
      .store
      .finalize_period(active.status_id, period, Utc::now())
      .await
      .map_err(backend)?;

    info!(
      period = %period,
      posts = results.len(),
      by = %caller.email,
      "voting stopped; results recorded"
    );
    Ok(results)
  }

  /// Deactivate the active period without producing results.
  pub async fn cancel(&self, caller: &Caller) -> Result<VotingPeriodStatus> {
    caller.require_admin()?;

    let mut active = self.active().await?.ok_or(Error::NoActiveVoting)?;
    let now = Utc::now();

    let deactivated = self
      .store
      .deactivate_voting_period(active.status_id, now)
      .await
      .map_err(backend)?;
    if !deactivated {
      return Err(Error::NoActiveVoting);
    }

    active.active = false;
    active.ended_at = Some(now);
    info!(period = %active.period, by = %caller.email, "voting cancelled");
    Ok(active)
  }

  /// All status rows, newest first.
  pub async fn history(&self, caller: &Caller) -> Result<Vec<VotingPeriodStatus>> {
    caller.require_admin()?;
    self.store.voting_history().await.map_err(backend)
  }

  async fn active(&self) -> Result<Option<VotingPeriodStatus>> {
    self.store.active_voting_period().await.map_err(backend)
  }

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Cast `caller`'s vote for `post_id` in the active period.
  pub async fn cast_vote(&self, caller: &Caller, post_id: Uuid) -> Result<VoteReceipt> {
    caller.require_voter()?;

    let now = Utc::now();
    let active = match self.active().await? {
      Some(a) if accepts_votes(&a, now) => a,
      _ => return Err(Error::VotingInactive),
    };
    let period = active.period;

    let post = self
      .store
      .get_post(post_id)
      .await
      .map_err(backend)?
      .ok_or(Error::PostNotFound(post_id))?;
    if post.closed {
      return Err(Error::PostClosed(post_id));
    }
    if post.period != period {
      return Err(Error::PostNotInPeriod {
        post_id,
        post_period: post.period,
        active_period: period,
      });
    }

    let cap = self.rules.votes_per_period;
    let vote = match self
      .store
      .cast_vote(caller.email.clone(), post_id, period, cap)
      .await
      .map_err(backend)?
    {
      CastOutcome::Recorded(vote) => vote,
      CastOutcome::Duplicate => return Err(Error::DuplicateVote { post_id, period }),
      CastOutcome::QuotaExceeded => return Err(Error::QuotaExceeded { cap, period }),
    };

    let post_votes = self
      .store
      .refresh_vote_count(post_id, period)
      .await
      .map_err(backend)?;
    let used = self
      .store
      .vote_status_for_voter(caller.email.clone(), period)
      .await
      .map_err(backend)?
      .total;

    debug!(voter = %caller.email, %post_id, %period, post_votes, "vote cast");
    Ok(VoteReceipt {
      vote,
      post_votes,
      votes_used: used,
      votes_remaining: cap.saturating_sub(used),
    })
  }

  /// The caller's votes in the active period. Empty while voting is inactive.
  pub async fn ballot(&self, caller: &Caller) -> Result<Ballot> {
    let cap = self.rules.votes_per_period;
    let Some(active) = self.active().await? else {
      return Ok(Ballot { votes_remaining: cap, ..Ballot::default() });
    };

    let votes = self
      .store
      .vote_status_for_voter(caller.email.clone(), active.period)
      .await
      .map_err(backend)?;

    Ok(Ballot {
      period:          Some(active.period),
      votes_remaining: cap.saturating_sub(votes.total),
      votes_used:      votes.total,
      voted_post_ids:  votes.post_ids,
    })
  }

  /// Authoritative vote count of a post within its own period.
  pub async fn count_for_post(&self, post_id: Uuid) -> Result<u32> {
    let post = self.get_post(post_id).await?;
    self
      .store
      .count_for_post(post_id, post.period)
      .await
      .map_err(backend)
  }

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Create an open post. Without an explicit `period` it is filed under the
  /// month before `now`.
  pub async fn create_post(
    &self,
    caller: &Caller,
    title: String,
    description: String,
    link: Option<String>,
    period: Option<VotingPeriod>,
  ) -> Result<Post> {
    caller.require_admin()?;
    if title.trim().is_empty() || description.trim().is_empty() {
      return Err(Error::Validation("title and description are required".into()));
    }

    let input = NewPost {
      title,
      description,
      link: link.filter(|l| !l.trim().is_empty()),
      period: period.unwrap_or_else(|| VotingPeriod::preceding(Utc::now())),
    };
    let post = self.store.create_post(input).await.map_err(backend)?;
    info!(post_id = %post.post_id, period = %post.period, "post created");
    Ok(post)
  }

  pub async fn get_post(&self, post_id: Uuid) -> Result<Post> {
    self
      .store
      .get_post(post_id)
      .await
      .map_err(backend)?
      .ok_or(Error::PostNotFound(post_id))
  }

  /// Open posts, optionally restricted to one period.
  pub async fn list_open_posts(&self, period: Option<VotingPeriod>) -> Result<Vec<Post>> {
    self.list_posts(PostFilter { period, include_closed: false }).await
  }

  pub async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>> {
    self.store.list_posts(filter).await.map_err(backend)
  }

  pub async fn update_post(
    &self,
    caller: &Caller,
    post_id: Uuid,
    patch: PostPatch,
  ) -> Result<Post> {
    caller.require_admin()?;
    let blank = |f: &Option<String>| f.as_ref().is_some_and(|s| s.trim().is_empty());
    if blank(&patch.title) || blank(&patch.description) {
      return Err(Error::Validation("title and description must not be empty".into()));
    }
    self
      .store
      .update_post(post_id, patch)
      .await
      .map_err(backend)?
      .ok_or(Error::PostNotFound(post_id))
  }

  /// Delete a post. Votes already cast for it are retained.
  pub async fn delete_post(&self, caller: &Caller, post_id: Uuid) -> Result<()> {
    caller.require_admin()?;
    if !self.store.delete_post(post_id).await.map_err(backend)? {
      return Err(Error::PostNotFound(post_id));
    }
    info!(%post_id, by = %caller.email, "post deleted");
    Ok(())
  }

  /// Close every open post of `period`. Idempotent.
  pub async fn close_all_for_period(
    &self,
    caller: &Caller,
    period: VotingPeriod,
  ) -> Result<usize> {
    caller.require_admin()?;
    self
      .store
      .close_all_for_period(period)
      .await
      .map_err(backend)
  }

  /// Recompute every post's cached vote count from the vote table.
  pub async fn sync_vote_counts(&self, caller: &Caller) -> Result<Vec<SyncEntry>> {
    caller.require_admin()?;

    let posts = self
      .list_posts(PostFilter { period: None, include_closed: true })
      .await?;

    let mut report = Vec::with_capacity(posts.len());
    for post in posts {
      let new_votes = self
        .store
        .refresh_vote_count(post.post_id, post.period)
        .await
        .map_err(backend)?;
      report.push(SyncEntry {
        post_id: post.post_id,
        title: post.title,
        old_votes: post.cached_votes,
        new_votes,
      });
    }

    let drifted = report.iter().filter(|e| e.old_votes != e.new_votes).count();
    info!(posts = report.len(), drifted, "vote counts synced");
    Ok(report)
  }

  // ── Results ───────────────────────────────────────────────────────────

  /// The ranked snapshot of a closed period.
  pub async fn results(&self, period: VotingPeriod) -> Result<Vec<VotingResult>> {
    self
      .store
      .results_for_period(period)
      .await
      .map_err(backend)
  }

  /// Periods with results, most recent first.
  pub async fn result_periods(&self) -> Result<Vec<VotingPeriod>> {
    let mut periods = self.store.result_periods().await.map_err(backend)?;
    periods.sort_unstable_by(|a, b| b.cmp(a));
    Ok(periods)
  }
}

/// Whether `status` still accepts votes at `now`.
pub fn accepts_votes(status: &VotingPeriodStatus, now: DateTime<Utc>) -> bool {
  status.active && !status.has_elapsed(now)
}
