//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that lexical order in SQL matches chronological order. UUIDs are
//! stored as hyphenated lowercase strings, voting periods as their label.

use std::str::FromStr;

use agora_core::{
  VotingPeriod,
  account::User,
  ballot::{Post, VoteRecord, VotingPeriodStatus, VotingResult},
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

pub fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn encode_period(p: VotingPeriod) -> String { p.to_string() }

pub fn decode_period(s: &str) -> Result<VotingPeriod> {
  s.parse()
    .map_err(|_| Error::Decode(format!("voting period {s:?}")))
}

/// Decode a string-backed enum column.
pub fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

/// Whether `e` is a UNIQUE / CHECK / NOT NULL constraint rejection.
pub fn is_constraint_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

// ─── Posts ───────────────────────────────────────────────────────────────────

pub const POST_COLUMNS: &str =
  "post_id, title, description, link, cached_votes, period, closed, created_at";

/// Raw strings read directly from a `posts` row.
pub struct RawPost {
  pub post_id:      String,
  pub title:        String,
  pub description:  String,
  pub link:         Option<String>,
  pub cached_votes: u32,
  pub period:       String,
  pub closed:       bool,
  pub created_at:   String,
}

impl RawPost {
  /// Read [`POST_COLUMNS`] starting at column `0`.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:      row.get(0)?,
      title:        row.get(1)?,
      description:  row.get(2)?,
      link:         row.get(3)?,
      cached_votes: row.get(4)?,
      period:       row.get(5)?,
      closed:       row.get(6)?,
      created_at:   row.get(7)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:      decode_uuid(&self.post_id)?,
      title:        self.title,
      description:  self.description,
      link:         self.link,
      cached_votes: self.cached_votes,
      period:       decode_period(&self.period)?,
      closed:       self.closed,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

// ─── Voting period status ────────────────────────────────────────────────────

pub const STATUS_COLUMNS: &str =
  "status_id, active, period, started_at, scheduled_end, ended_at";

pub struct RawStatus {
  pub status_id:     String,
  pub active:        bool,
  pub period:        String,
  pub started_at:    String,
  pub scheduled_end: String,
  pub ended_at:      Option<String>,
}

impl RawStatus {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      status_id:     row.get(0)?,
      active:        row.get(1)?,
      period:        row.get(2)?,
      started_at:    row.get(3)?,
      scheduled_end: row.get(4)?,
      ended_at:      row.get(5)?,
    })
  }

  pub fn into_status(self) -> Result<VotingPeriodStatus> {
    Ok(VotingPeriodStatus {
      status_id:     decode_uuid(&self.status_id)?,
      active:        self.active,
      period:        decode_period(&self.period)?,
      started_at:    decode_dt(&self.started_at)?,
      scheduled_end: decode_dt(&self.scheduled_end)?,
      ended_at:      decode_opt_dt(self.ended_at)?,
    })
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

pub const RESULT_COLUMNS: &str = "result_id, post_id, title, description, link, \
                                  author_email, author_name, total_votes, rank, \
                                  period, created_at";

pub struct RawResult {
  pub result_id:    String,
  pub post_id:      String,
  pub title:        String,
  pub description:  String,
  pub link:         Option<String>,
  pub author_email: String,
  pub author_name:  String,
  pub total_votes:  u32,
  pub rank:         u32,
  pub period:       String,
  pub created_at:   String,
}

impl RawResult {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      result_id:    row.get(0)?,
      post_id:      row.get(1)?,
      title:        row.get(2)?,
      description:  row.get(3)?,
      link:         row.get(4)?,
      author_email: row.get(5)?,
      author_name:  row.get(6)?,
      total_votes:  row.get(7)?,
      rank:         row.get(8)?,
      period:       row.get(9)?,
      created_at:   row.get(10)?,
    })
  }

  pub fn into_result(self) -> Result<VotingResult> {
    Ok(VotingResult {
      result_id:    decode_uuid(&self.result_id)?,
      post_id:      decode_uuid(&self.post_id)?,
      title:        self.title,
      description:  self.description,
      link:         self.link,
      author_email: self.author_email,
      author_name:  self.author_name,
      total_votes:  self.total_votes,
      rank:         self.rank,
      period:       decode_period(&self.period)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Owned column values for one `voting_results` insert.
pub struct ResultRow {
  pub result_id:    String,
  pub post_id:      String,
  pub title:        String,
  pub description:  String,
  pub link:         Option<String>,
  pub author_email: String,
  pub author_name:  String,
  pub total_votes:  u32,
  pub rank:         u32,
  pub created_at:   String,
}

impl From<VotingResult> for ResultRow {
  fn from(r: VotingResult) -> Self {
    Self {
      result_id:    encode_uuid(r.result_id),
      post_id:      encode_uuid(r.post_id),
      title:        r.title,
      description:  r.description,
      link:         r.link,
      author_email: r.author_email,
      author_name:  r.author_name,
      total_votes:  r.total_votes,
      rank:         r.rank,
      created_at:   encode_dt(r.created_at),
    }
  }
}

// ─── Votes ───────────────────────────────────────────────────────────────────

/// Owned column values for one `votes` insert.
pub struct VoteRow {
  pub vote_id:    String,
  pub voter:      String,
  pub post_id:    String,
  pub period:     String,
  pub created_at: String,
}

impl From<&VoteRecord> for VoteRow {
  fn from(v: &VoteRecord) -> Self {
    Self {
      vote_id:    encode_uuid(v.vote_id),
      voter:      v.voter.clone(),
      post_id:    encode_uuid(v.post_id),
      period:     encode_period(v.period),
      created_at: encode_dt(v.created_at),
    }
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, name, email, username, bio, wallet_address, \
                                website, location, is_whitelisted, is_admin, \
                                created_at, last_login";

pub struct RawUser {
  pub user_id:        String,
  pub name:           String,
  pub email:          String,
  pub username:       Option<String>,
  pub bio:            Option<String>,
  pub wallet_address: Option<String>,
  pub website:        Option<String>,
  pub location:       Option<String>,
  pub is_whitelisted: bool,
  pub is_admin:       bool,
  pub created_at:     String,
  pub last_login:     Option<String>,
}

impl RawUser {
  /// Read [`USER_COLUMNS`] starting at column `0`.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:        row.get(0)?,
      name:           row.get(1)?,
      email:          row.get(2)?,
      username:       row.get(3)?,
      bio:            row.get(4)?,
      wallet_address: row.get(5)?,
      website:        row.get(6)?,
      location:       row.get(7)?,
      is_whitelisted: row.get(8)?,
      is_admin:       row.get(9)?,
      created_at:     row.get(10)?,
      last_login:     row.get(11)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:        decode_uuid(&self.user_id)?,
      name:           self.name,
      email:          self.email,
      username:       self.username,
      bio:            self.bio,
      wallet_address: self.wallet_address,
      website:        self.website,
      location:       self.location,
      is_whitelisted: self.is_whitelisted,
      is_admin:       self.is_admin,
      created_at:     decode_dt(&self.created_at)?,
      last_login:     decode_opt_dt(self.last_login)?,
    })
  }
}
