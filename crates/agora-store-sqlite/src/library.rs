//! [`LibraryStore`] impl: announcements, assets, recordings and submissions.
//!
//! Every table follows the same shape: a `Raw*` row of plain column values,
//! decoded into the domain type after the blocking call returns.

use agora_core::{
  library::{
    Announcement, Asset, AssetKind, NewAnnouncement, NewAsset, NewRecording,
    NewSubmission, Recording, Submission, SubmissionReview, SubmissionStatus,
  },
  store::LibraryStore,
};
use chrono::Utc;
use rusqlite::{OptionalExtension as _, Row};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{decode_dt, decode_enum, decode_uuid, encode_dt, encode_uuid},
};

impl SqliteStore {
  /// Delete one row of `table` by primary key.
  async fn delete_by_id(&self, table: &'static str, key: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("DELETE FROM {table} WHERE {key} = ?1"),
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }
}

// ─── Announcements ───────────────────────────────────────────────────────────

const ANNOUNCEMENT_COLUMNS: &str =
  "announcement_id, title, content, priority, active, created_by, created_at, updated_at";

struct RawAnnouncement {
  announcement_id: String,
  title:           String,
  content:         String,
  priority:        String,
  active:          bool,
  created_by:      String,
  created_at:      String,
  updated_at:      String,
}

impl RawAnnouncement {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      announcement_id: row.get(0)?,
      title:           row.get(1)?,
      content:         row.get(2)?,
      priority:        row.get(3)?,
      active:          row.get(4)?,
      created_by:      row.get(5)?,
      created_at:      row.get(6)?,
      updated_at:      row.get(7)?,
    })
  }

  fn into_announcement(self) -> Result<Announcement> {
    Ok(Announcement {
      announcement_id: decode_uuid(&self.announcement_id)?,
      title:           self.title,
      content:         self.content,
      priority:        decode_enum("priority", &self.priority)?,
      active:          self.active,
      created_by:      self.created_by,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Assets ──────────────────────────────────────────────────────────────────

const ASSET_COLUMNS: &str =
  "asset_id, title, description, drive_link, kind, category, created_at, updated_at";

struct RawAsset {
  asset_id:    String,
  title:       String,
  description: Option<String>,
  drive_link:  String,
  kind:        String,
  category:    Option<String>,
  created_at:  String,
  updated_at:  String,
}

impl RawAsset {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      asset_id:    row.get(0)?,
      title:       row.get(1)?,
      description: row.get(2)?,
      drive_link:  row.get(3)?,
      kind:        row.get(4)?,
      category:    row.get(5)?,
      created_at:  row.get(6)?,
      updated_at:  row.get(7)?,
    })
  }

  fn into_asset(self) -> Result<Asset> {
    Ok(Asset {
      asset_id:    decode_uuid(&self.asset_id)?,
      title:       self.title,
      description: self.description,
      drive_link:  self.drive_link,
      kind:        decode_enum("asset kind", &self.kind)?,
      category:    self.category,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Recordings ──────────────────────────────────────────────────────────────

const RECORDING_COLUMNS: &str = "recording_id, title, description, drive_link, \
                                 recorded_on, thumbnail_url, duration, created_at, \
                                 updated_at";

struct RawRecording {
  recording_id:  String,
  title:         String,
  description:   Option<String>,
  drive_link:    String,
  recorded_on:   String,
  thumbnail_url: Option<String>,
  duration:      Option<String>,
  created_at:    String,
  updated_at:    String,
}

impl RawRecording {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      recording_id:  row.get(0)?,
      title:         row.get(1)?,
      description:   row.get(2)?,
      drive_link:    row.get(3)?,
      recorded_on:   row.get(4)?,
      thumbnail_url: row.get(5)?,
      duration:      row.get(6)?,
      created_at:    row.get(7)?,
      updated_at:    row.get(8)?,
    })
  }

  fn into_recording(self) -> Result<Recording> {
    Ok(Recording {
      recording_id:  decode_uuid(&self.recording_id)?,
      title:         self.title,
      description:   self.description,
      drive_link:    self.drive_link,
      recorded_on:   decode_dt(&self.recorded_on)?,
      thumbnail_url: self.thumbnail_url,
      duration:      self.duration,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Submissions ─────────────────────────────────────────────────────────────

const SUBMISSION_COLUMNS: &str = "submission_id, twitter_handle, discord_username, \
                                  content_link, content_type, title, description, \
                                  submitted_by, status, admin_notes, created_at, \
                                  updated_at";

struct RawSubmission {
  submission_id:    String,
  twitter_handle:   String,
  discord_username: String,
  content_link:     String,
  content_type:     String,
  title:            Option<String>,
  description:      Option<String>,
  submitted_by:     String,
  status:           String,
  admin_notes:      Option<String>,
  created_at:       String,
  updated_at:       String,
}

impl RawSubmission {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      submission_id:    row.get(0)?,
      twitter_handle:   row.get(1)?,
      discord_username: row.get(2)?,
      content_link:     row.get(3)?,
      content_type:     row.get(4)?,
      title:            row.get(5)?,
      description:      row.get(6)?,
      submitted_by:     row.get(7)?,
      status:           row.get(8)?,
      admin_notes:      row.get(9)?,
      created_at:       row.get(10)?,
      updated_at:       row.get(11)?,
    })
  }

  fn into_submission(self) -> Result<Submission> {
    Ok(Submission {
      submission_id:    decode_uuid(&self.submission_id)?,
      twitter_handle:   self.twitter_handle,
      discord_username: self.discord_username,
      content_link:     self.content_link,
      content_type:     decode_enum("content type", &self.content_type)?,
      title:            self.title,
      description:      self.description,
      submitted_by:     self.submitted_by,
      status:           decode_enum("submission status", &self.status)?,
      admin_notes:      self.admin_notes,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

// ─── LibraryStore impl ───────────────────────────────────────────────────────

impl LibraryStore for SqliteStore {
  // ── Announcements ─────────────────────────────────────────────────────────

  async fn create_announcement(
    &self,
    input:      NewAnnouncement,
    created_by: String,
  ) -> Result<Announcement> {
    let now = Utc::now();
    let announcement = Announcement {
      announcement_id: Uuid::new_v4(),
      title:           input.title,
      content:         input.content,
      priority:        input.priority,
      active:          input.active,
      created_by,
      created_at:      now,
      updated_at:      now,
    };

    let id_str     = encode_uuid(announcement.announcement_id);
    let title      = announcement.title.clone();
    let content    = announcement.content.clone();
    let priority: &'static str = announcement.priority.into();
    let active     = announcement.active;
    let created_by = announcement.created_by.clone();
    let at_str     = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO announcements
             (announcement_id, title, content, priority, active, created_by,
              created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          rusqlite::params![id_str, title, content, priority, active, created_by, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(announcement)
  }

  async fn list_announcements(&self, active_only: bool) -> Result<Vec<Announcement>> {
    let raws: Vec<RawAnnouncement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements
           WHERE (NOT ?1 OR active = 1)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![active_only], RawAnnouncement::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAnnouncement::into_announcement).collect()
  }

  async fn update_announcement(
    &self,
    id:    Uuid,
    input: NewAnnouncement,
  ) -> Result<Option<Announcement>> {
    let id_str  = encode_uuid(id);
    let now_str = encode_dt(Utc::now());
    let priority: &'static str = input.priority.into();

    let raw: Option<RawAnnouncement> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE announcements
           SET title = ?2, content = ?3, priority = ?4, active = ?5, updated_at = ?6
           WHERE announcement_id = ?1",
          rusqlite::params![id_str, input.title, input.content, priority, input.active, now_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(conn
          .query_row(
            &format!("SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE announcement_id = ?1"),
            rusqlite::params![id_str],
            RawAnnouncement::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAnnouncement::into_announcement).transpose()
  }

  async fn delete_announcement(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("announcements", "announcement_id", id).await
  }

  // ── Assets ────────────────────────────────────────────────────────────────

  async fn create_asset(&self, input: NewAsset) -> Result<Asset> {
    let now = Utc::now();
    let asset = Asset {
      asset_id:    Uuid::new_v4(),
      title:       input.title,
      description: input.description,
      drive_link:  input.drive_link,
      kind:        input.kind,
      category:    input.category,
      created_at:  now,
      updated_at:  now,
    };

    let id_str      = encode_uuid(asset.asset_id);
    let title       = asset.title.clone();
    let description = asset.description.clone();
    let drive_link  = asset.drive_link.clone();
    let kind: &'static str = asset.kind.into();
    let category    = asset.category.clone();
    let at_str      = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO assets
             (asset_id, title, description, drive_link, kind, category,
              created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          rusqlite::params![id_str, title, description, drive_link, kind, category, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(asset)
  }

  async fn list_assets(&self, kind: Option<AssetKind>) -> Result<Vec<Asset>> {
    let kind: Option<&'static str> = kind.map(Into::into);

    let raws: Vec<RawAsset> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ASSET_COLUMNS} FROM assets
           WHERE (?1 IS NULL OR kind = ?1)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![kind], RawAsset::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAsset::into_asset).collect()
  }

  async fn update_asset(&self, id: Uuid, input: NewAsset) -> Result<Option<Asset>> {
    let id_str  = encode_uuid(id);
    let now_str = encode_dt(Utc::now());
    let kind: &'static str = input.kind.into();

    let raw: Option<RawAsset> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE assets
           SET title = ?2, description = ?3, drive_link = ?4, kind = ?5,
               category = ?6, updated_at = ?7
           WHERE asset_id = ?1",
          rusqlite::params![
            id_str,
            input.title,
            input.description,
            input.drive_link,
            kind,
            input.category,
            now_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(conn
          .query_row(
            &format!("SELECT {ASSET_COLUMNS} FROM assets WHERE asset_id = ?1"),
            rusqlite::params![id_str],
            RawAsset::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAsset::into_asset).transpose()
  }

  async fn delete_asset(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("assets", "asset_id", id).await
  }

  // ── Recordings ────────────────────────────────────────────────────────────

  async fn create_recording(&self, input: NewRecording) -> Result<Recording> {
    let now = Utc::now();
    let recording = Recording {
      recording_id:  Uuid::new_v4(),
      title:         input.title,
      description:   input.description,
      drive_link:    input.drive_link,
      recorded_on:   input.recorded_on,
      thumbnail_url: input.thumbnail_url,
      duration:      input.duration,
      created_at:    now,
      updated_at:    now,
    };

    let id_str       = encode_uuid(recording.recording_id);
    let title        = recording.title.clone();
    let description  = recording.description.clone();
    let drive_link   = recording.drive_link.clone();
    let recorded_str = encode_dt(recording.recorded_on);
    let thumbnail    = recording.thumbnail_url.clone();
    let duration     = recording.duration.clone();
    let at_str       = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO recordings
             (recording_id, title, description, drive_link, recorded_on,
              thumbnail_url, duration, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![
            id_str,
            title,
            description,
            drive_link,
            recorded_str,
            thumbnail,
            duration,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(recording)
  }

  async fn list_recordings(&self) -> Result<Vec<Recording>> {
    let raws: Vec<RawRecording> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORDING_COLUMNS} FROM recordings
           ORDER BY recorded_on DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawRecording::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecording::into_recording).collect()
  }

  async fn update_recording(&self, id: Uuid, input: NewRecording) -> Result<Option<Recording>> {
    let id_str       = encode_uuid(id);
    let now_str      = encode_dt(Utc::now());
    let recorded_str = encode_dt(input.recorded_on);

    let raw: Option<RawRecording> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE recordings
           SET title = ?2, description = ?3, drive_link = ?4, recorded_on = ?5,
               thumbnail_url = ?6, duration = ?7, updated_at = ?8
           WHERE recording_id = ?1",
          rusqlite::params![
            id_str,
            input.title,
            input.description,
            input.drive_link,
            recorded_str,
            input.thumbnail_url,
            input.duration,
            now_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(conn
          .query_row(
            &format!("SELECT {RECORDING_COLUMNS} FROM recordings WHERE recording_id = ?1"),
            rusqlite::params![id_str],
            RawRecording::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRecording::into_recording).transpose()
  }

  async fn delete_recording(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("recordings", "recording_id", id).await
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn create_submission(
    &self,
    input:        NewSubmission,
    submitted_by: String,
  ) -> Result<Submission> {
    let now = Utc::now();
    let submission = Submission {
      submission_id:    Uuid::new_v4(),
      twitter_handle:   input.twitter_handle,
      discord_username: input.discord_username,
      content_link:     input.content_link,
      content_type:     input.content_type,
      title:            input.title,
      description:      input.description,
      submitted_by,
      status:           SubmissionStatus::Pending,
      admin_notes:      None,
      created_at:       now,
      updated_at:       now,
    };

    let id_str       = encode_uuid(submission.submission_id);
    let twitter      = submission.twitter_handle.clone();
    let discord      = submission.discord_username.clone();
    let link         = submission.content_link.clone();
    let content_type: &'static str = submission.content_type.into();
    let title        = submission.title.clone();
    let description  = submission.description.clone();
    let submitter    = submission.submitted_by.clone();
    let status: &'static str = submission.status.into();
    let at_str       = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO submissions
             (submission_id, twitter_handle, discord_username, content_link,
              content_type, title, description, submitted_by, status,
              created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            id_str,
            twitter,
            discord,
            link,
            content_type,
            title,
            description,
            submitter,
            status,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(submission)
  }

  async fn list_submissions(&self, submitted_by: Option<String>) -> Result<Vec<Submission>> {
    let raws: Vec<RawSubmission> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBMISSION_COLUMNS} FROM submissions
           WHERE (?1 IS NULL OR submitted_by = ?1)
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![submitted_by], RawSubmission::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubmission::into_submission).collect()
  }

  async fn review_submission(
    &self,
    id:     Uuid,
    review: SubmissionReview,
  ) -> Result<Option<Submission>> {
    let id_str  = encode_uuid(id);
    let now_str = encode_dt(Utc::now());
    let status: &'static str = review.status.into();

    let raw: Option<RawSubmission> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE submissions SET status = ?2, admin_notes = ?3, updated_at = ?4
           WHERE submission_id = ?1",
          rusqlite::params![id_str, status, review.admin_notes, now_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(conn
          .query_row(
            &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE submission_id = ?1"),
            rusqlite::params![id_str],
            RawSubmission::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubmission::into_submission).transpose()
  }

  async fn delete_submission(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("submissions", "submission_id", id).await
  }
}
