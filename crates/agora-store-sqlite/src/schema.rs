//! SQL schema for the Agora SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Accounts ────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS users (
    user_id        TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    email          TEXT NOT NULL UNIQUE,   -- lowercased
    username       TEXT UNIQUE,            -- lowercased
    password_hash  TEXT NOT NULL,          -- argon2 PHC string
    bio            TEXT,
    wallet_address TEXT,
    website        TEXT,
    location       TEXT,
    is_whitelisted INTEGER NOT NULL DEFAULT 0,
    is_admin       INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,
    last_login     TEXT
);

-- Only a SHA-256 digest of each session token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

-- ── Ballot ──────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS posts (
    post_id      TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    link         TEXT,
    cached_votes INTEGER NOT NULL DEFAULT 0,   -- refreshed from votes
    period       TEXT NOT NULL,                -- e.g. 'June 2025'
    closed       INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL
);

-- Votes are append-only and outlive the posts they reference, so post_id
-- carries no foreign key.
CREATE TABLE IF NOT EXISTS votes (
    vote_id    TEXT PRIMARY KEY,
    voter      TEXT NOT NULL,
    post_id    TEXT NOT NULL,
    period     TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (voter, post_id, period)
);

CREATE TABLE IF NOT EXISTS voting_periods (
    status_id     TEXT PRIMARY KEY,
    active        INTEGER NOT NULL,
    period        TEXT NOT NULL,
    started_at    TEXT NOT NULL,
    scheduled_end TEXT NOT NULL,
    ended_at      TEXT
);

-- At most one active voting period.
CREATE UNIQUE INDEX IF NOT EXISTS voting_periods_single_active
    ON voting_periods(active) WHERE active = 1;

CREATE TABLE IF NOT EXISTS voting_results (
    result_id    TEXT PRIMARY KEY,
    post_id      TEXT NOT NULL,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    link         TEXT,
    author_email TEXT NOT NULL,
    author_name  TEXT NOT NULL,
    total_votes  INTEGER NOT NULL,
    rank         INTEGER NOT NULL,
    period       TEXT NOT NULL,
    created_at   TEXT NOT NULL,
    UNIQUE (period, rank)
);

CREATE INDEX IF NOT EXISTS votes_voter_period_idx ON votes(voter, period);
CREATE INDEX IF NOT EXISTS votes_post_period_idx  ON votes(post_id, period);
CREATE INDEX IF NOT EXISTS posts_period_idx       ON posts(period, closed);

-- ── Library ─────────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS announcements (
    announcement_id TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    content         TEXT NOT NULL,
    priority        TEXT NOT NULL DEFAULT 'medium',
    active          INTEGER NOT NULL DEFAULT 1,
    created_by      TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assets (
    asset_id    TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    drive_link  TEXT NOT NULL,
    kind        TEXT NOT NULL,   -- 'image' | 'video' | 'banner'
    category    TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS recordings (
    recording_id  TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    description   TEXT,
    drive_link    TEXT NOT NULL,
    recorded_on   TEXT NOT NULL,
    thumbnail_url TEXT,
    duration      TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS submissions (
    submission_id    TEXT PRIMARY KEY,
    twitter_handle   TEXT NOT NULL,
    discord_username TEXT NOT NULL,
    content_link     TEXT NOT NULL,
    content_type     TEXT NOT NULL,
    title            TEXT,
    description      TEXT,
    submitted_by     TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT 'pending',
    admin_notes      TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS submissions_submitter_idx ON submissions(submitted_by);

PRAGMA user_version = 1;
";
