//! [`SqliteStore`] — the SQLite implementation of the Agora store traits.
//!
//! This module holds the connection and the [`BallotStore`] impl; accounts
//! and library content live in sibling modules.

use std::path::Path;

use agora_core::{
  VotingPeriod,
  tally,
  ballot::{
    CastOutcome, NewPost, Post, PostFilter, PostPatch, PostTally, VoteRecord,
    VoterVotes, VotingPeriodStatus, VotingResult,
  },
  store::{BallotStore, Store},
};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior, types::Type};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    POST_COLUMNS, RESULT_COLUMNS, RawPost, RawResult, RawStatus, ResultRow,
    STATUS_COLUMNS, VoteRow, decode_period, decode_uuid, encode_dt, encode_period,
    encode_uuid, is_constraint_violation,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Agora store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl Store for SqliteStore {
  type Error = Error;
}

/// What the vote transaction decided, before the record is handed back.
enum CastDecision {
  Inserted,
  Duplicate,
  QuotaExceeded,
}

/// What the period-closing transaction did.
enum CloseOutcome {
  Closed(Vec<VotingResult>),
  Inactive,
  NoPosts,
}

/// Open posts of a period, newest first, each with its count from the vote
/// table.
fn open_tallies(conn: &rusqlite::Connection, period: &str) -> rusqlite::Result<Vec<PostTally>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {POST_COLUMNS},
       (SELECT COUNT(*) FROM votes v
         WHERE v.post_id = posts.post_id AND v.period = posts.period)
     FROM posts
     WHERE period = ?1 AND closed = 0
     ORDER BY created_at DESC, rowid DESC"
  ))?;
  let tallies = stmt
    .query_map(rusqlite::params![period], |row| {
      let post = RawPost::from_row(row)?.into_post().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, Type::Text, e.to_string().into())
      })?;
      Ok(PostTally { post, votes: row.get(8)? })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(tallies)
}

// ─── BallotStore impl ────────────────────────────────────────────────────────

impl BallotStore for SqliteStore {
  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn cast_vote(
    &self,
    voter:   String,
    post_id: Uuid,
    period:  VotingPeriod,
    cap:     u32,
  ) -> Result<CastOutcome> {
    let vote = VoteRecord {
      vote_id: Uuid::new_v4(),
      voter,
      post_id,
      period,
      created_at: Utc::now(),
    };
    let row = VoteRow::from(&vote);

    // The duplicate check, the quota count and the insert share one IMMEDIATE
    // transaction: the write lock is taken up front, so two requests from the
    // same voter cannot both pass the quota check.
    let decision = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let duplicate = tx
          .query_row(
            "SELECT 1 FROM votes WHERE voter = ?1 AND post_id = ?2 AND period = ?3",
            rusqlite::params![row.voter, row.post_id, row.period],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if duplicate {
          return Ok(CastDecision::Duplicate);
        }

        let used: u32 = tx.query_row(
          "SELECT COUNT(*) FROM votes WHERE voter = ?1 AND period = ?2",
          rusqlite::params![row.voter, row.period],
          |r| r.get(0),
        )?;
        if used >= cap {
          return Ok(CastDecision::QuotaExceeded);
        }

        match tx.execute(
          "INSERT INTO votes (vote_id, voter, post_id, period, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![row.vote_id, row.voter, row.post_id, row.period, row.created_at],
        ) {
          Ok(_) => {}
          Err(e) if is_constraint_violation(&e) => return Ok(CastDecision::Duplicate),
          Err(e) => return Err(e.into()),
        }

        tx.commit()?;
        Ok(CastDecision::Inserted)
      })
      .await?;

    Ok(match decision {
      CastDecision::Inserted => CastOutcome::Recorded(vote),
      CastDecision::Duplicate => CastOutcome::Duplicate,
      CastDecision::QuotaExceeded => CastOutcome::QuotaExceeded,
    })
  }

  async fn count_for_post(&self, post_id: Uuid, period: VotingPeriod) -> Result<u32> {
    let post_id_str = encode_uuid(post_id);
    let period_str  = encode_period(period);

    let count = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM votes WHERE post_id = ?1 AND period = ?2",
          rusqlite::params![post_id_str, period_str],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count)
  }

  async fn vote_status_for_voter(
    &self,
    voter:  String,
    period: VotingPeriod,
  ) -> Result<VoterVotes> {
    let period_str = encode_period(period);

    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT post_id FROM votes
           WHERE voter = ?1 AND period = ?2
           ORDER BY created_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![voter, period_str], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let post_ids = ids
      .iter()
      .map(|s| decode_uuid(s))
      .collect::<Result<Vec<_>>>()?;
    Ok(VoterVotes { total: post_ids.len() as u32, post_ids })
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn create_post(&self, input: NewPost) -> Result<Post> {
    let post = Post {
      post_id:      Uuid::new_v4(),
      title:        input.title,
      description:  input.description,
      link:         input.link,
      cached_votes: 0,
      period:       input.period,
      closed:       false,
      created_at:   Utc::now(),
    };

    let id_str      = encode_uuid(post.post_id);
    let title       = post.title.clone();
    let description = post.description.clone();
    let link        = post.link.clone();
    let period_str  = encode_period(post.period);
    let at_str      = encode_dt(post.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (post_id, title, description, link, cached_votes,
                              period, closed, created_at)
           VALUES (?1, ?2, ?3, ?4, 0, ?5, 0, ?6)",
          rusqlite::params![id_str, title, description, link, period_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(post)
  }

  async fn get_post(&self, post_id: Uuid) -> Result<Option<Post>> {
    let id_str = encode_uuid(post_id);

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE post_id = ?1"),
            rusqlite::params![id_str],
            RawPost::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>> {
    let period_str     = filter.period.map(encode_period);
    let include_closed = filter.include_closed;

    let raws: Vec<RawPost> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {POST_COLUMNS} FROM posts
           WHERE (?1 IS NULL OR period = ?1)
             AND (?2 OR closed = 0)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![period_str, include_closed], RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }

  async fn update_post(&self, post_id: Uuid, patch: PostPatch) -> Result<Option<Post>> {
    let Some(mut post) = self.get_post(post_id).await? else {
      return Ok(None);
    };
    patch.apply(&mut post);

    let id_str      = encode_uuid(post_id);
    let title       = post.title.clone();
    let description = post.description.clone();
    let link        = post.link.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE posts SET title = ?2, description = ?3, link = ?4 WHERE post_id = ?1",
          rusqlite::params![id_str, title, description, link],
        )?;
        Ok(())
      })
      .await?;

    Ok(Some(post))
  }

  async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(post_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM posts WHERE post_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn close_all_for_period(&self, period: VotingPeriod) -> Result<usize> {
    let period_str = encode_period(period);

    let closed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE posts SET closed = 1 WHERE period = ?1 AND closed = 0",
          rusqlite::params![period_str],
        )?)
      })
      .await?;
    Ok(closed)
  }

  async fn refresh_vote_count(&self, post_id: Uuid, period: VotingPeriod) -> Result<u32> {
    let id_str     = encode_uuid(post_id);
    let period_str = encode_period(period);

    let count = self
      .conn
      .call(move |conn| {
        let count: u32 = conn.query_row(
          "SELECT COUNT(*) FROM votes WHERE post_id = ?1 AND period = ?2",
          rusqlite::params![id_str, period_str],
          |r| r.get(0),
        )?;
        conn.execute(
          "UPDATE posts SET cached_votes = ?2 WHERE post_id = ?1",
          rusqlite::params![id_str, count],
        )?;
        Ok(count)
      })
      .await?;
    Ok(count)
  }

  // ── Voting period status ──────────────────────────────────────────────────

  async fn insert_voting_period(&self, status: VotingPeriodStatus) -> Result<()> {
    let id_str        = encode_uuid(status.status_id);
    let period_str    = encode_period(status.period);
    let started_str   = encode_dt(status.started_at);
    let scheduled_str = encode_dt(status.scheduled_end);
    let ended_str     = status.ended_at.map(encode_dt);
    let active        = status.active;

    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO voting_periods
             (status_id, active, period, started_at, scheduled_end, ended_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, active, period_str, started_str, scheduled_str, ended_str],
        ) {
          Ok(_) => Ok(true),
          Err(e) if is_constraint_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      // Lost a race against a concurrent start; report the period that won.
      let winner = self
        .active_voting_period()
        .await?
        .map_or(status.period, |s| s.period);
      return Err(Error::Core(agora_core::Error::AlreadyActive(winner)));
    }
    Ok(())
  }

  async fn active_voting_period(&self) -> Result<Option<VotingPeriodStatus>> {
    let raw: Option<RawStatus> = self
      .conn
      .call(|conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {STATUS_COLUMNS} FROM voting_periods WHERE active = 1"),
            [],
            RawStatus::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStatus::into_status).transpose()
  }

  async fn voting_history(&self) -> Result<Vec<VotingPeriodStatus>> {
    let raws: Vec<RawStatus> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STATUS_COLUMNS} FROM voting_periods ORDER BY started_at DESC"
        ))?;
        let rows = stmt
          .query_map([], RawStatus::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStatus::into_status).collect()
  }

  async fn deactivate_voting_period(
    &self,
    status_id: Uuid,
    ended_at:  DateTime<Utc>,
  ) -> Result<bool> {
    let id_str    = encode_uuid(status_id);
    let ended_str = encode_dt(ended_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE voting_periods SET active = 0, ended_at = ?2
           WHERE status_id = ?1 AND active = 1",
          rusqlite::params![id_str, ended_str],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  // ── Results ───────────────────────────────────────────────────────────────

  async fn finalize_period(
    &self,
    status_id: Uuid,
    period:    VotingPeriod,
    ended_at:  DateTime<Utc>,
  ) -> Result<Vec<VotingResult>> {
    let id_str     = encode_uuid(status_id);
    let period_str = encode_period(period);
    let ended_str  = encode_dt(ended_at);

    let outcome = self
      .conn
      .call(move |conn| {
        // Returning before commit drops `tx`, which rolls everything back.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let deactivated = tx.execute(
          "UPDATE voting_periods SET active = 0, ended_at = ?2
           WHERE status_id = ?1 AND active = 1",
          rusqlite::params![id_str, ended_str],
        )?;
        if deactivated == 0 {
          return Ok(CloseOutcome::Inactive);
        }

        let tallies = open_tallies(&tx, &period_str)?;
        if tallies.is_empty() {
          return Ok(CloseOutcome::NoPosts);
        }
        let results = tally::rank(period, tallies, ended_at);

        tx.execute(
          "DELETE FROM voting_results WHERE period = ?1",
          rusqlite::params![period_str],
        )?;

        {
          let mut insert = tx.prepare(
            "INSERT INTO voting_results
               (result_id, post_id, title, description, link, author_email,
                author_name, total_votes, rank, period, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          )?;
          // Cached counts are brought in line with the frozen totals.
          let mut sync = tx.prepare("UPDATE posts SET cached_votes = ?2 WHERE post_id = ?1")?;

          for r in results.iter().cloned().map(ResultRow::from) {
            insert.execute(rusqlite::params![
              r.result_id,
              r.post_id,
              r.title,
              r.description,
              r.link,
              r.author_email,
              r.author_name,
              r.total_votes,
              r.rank,
              period_str,
              r.created_at,
            ])?;
            sync.execute(rusqlite::params![r.post_id, r.total_votes])?;
          }
        }

        tx.execute(
          "UPDATE posts SET closed = 1 WHERE period = ?1 AND closed = 0",
          rusqlite::params![period_str],
        )?;

        tx.commit()?;
        Ok(CloseOutcome::Closed(results))
      })
      .await?;

    match outcome {
      CloseOutcome::Closed(results) => Ok(results),
      CloseOutcome::Inactive => Err(Error::Core(agora_core::Error::NoActiveVoting)),
      CloseOutcome::NoPosts => Err(Error::Core(agora_core::Error::NoPostsForPeriod(period))),
    }
  }

  async fn results_for_period(&self, period: VotingPeriod) -> Result<Vec<VotingResult>> {
    let period_str = encode_period(period);

    let raws: Vec<RawResult> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RESULT_COLUMNS} FROM voting_results WHERE period = ?1 ORDER BY rank"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![period_str], RawResult::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawResult::into_result).collect()
  }

  async fn result_periods(&self) -> Result<Vec<VotingPeriod>> {
    let labels: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT DISTINCT period FROM voting_results")?;
        let rows = stmt
          .query_map([], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    labels.iter().map(|l| decode_period(l)).collect()
  }
}
