//! Supporting content: announcements, the assets library, townhall
//! recordings and community content submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

fn require(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::Validation(format!("{field} is required")));
  }
  Ok(())
}

// ─── Announcements ───────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
  pub announcement_id: Uuid,
  pub title:           String,
  pub content:         String,
  pub priority:        Priority,
  pub active:          bool,
  /// Email of the admin who posted it.
  pub created_by:      String,
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAnnouncement {
  pub title:    String,
  pub content:  String,
  #[serde(default)]
  pub priority: Priority,
  #[serde(default = "default_true")]
  pub active:   bool,
}

impl NewAnnouncement {
  pub fn validate(&self) -> Result<()> {
    require("title", &self.title)?;
    require("content", &self.content)
  }
}

fn default_true() -> bool { true }

// ─── Assets ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
  Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssetKind {
  Image,
  Video,
  Banner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
  pub asset_id:    Uuid,
  pub title:       String,
  pub description: Option<String>,
  pub drive_link:  String,
  pub kind:        AssetKind,
  pub category:    Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAsset {
  pub title:       String,
  pub description: Option<String>,
  pub drive_link:  String,
  pub kind:        AssetKind,
  pub category:    Option<String>,
}

impl NewAsset {
  pub fn validate(&self) -> Result<()> {
    require("title", &self.title)?;
    require("drive_link", &self.drive_link)
  }
}

// ─── Townhall recordings ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
  pub recording_id:   Uuid,
  pub title:          String,
  pub description:    Option<String>,
  pub drive_link:     String,
  pub recorded_on:    DateTime<Utc>,
  pub thumbnail_url:  Option<String>,
  /// Free text, e.g. `"1h 12m"`.
  pub duration:       Option<String>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecording {
  pub title:         String,
  pub description:   Option<String>,
  pub drive_link:    String,
  pub recorded_on:   DateTime<Utc>,
  pub thumbnail_url: Option<String>,
  pub duration:      Option<String>,
}

impl NewRecording {
  pub fn validate(&self) -> Result<()> {
    require("title", &self.title)?;
    require("drive_link", &self.drive_link)
  }
}

// ─── Content submissions ─────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
  Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ContentType {
  ShortForm,
  Thread,
  Video,
  Infographics,
  Artwork,
  StreamClip,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubmissionStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
  pub submission_id:    Uuid,
  pub twitter_handle:   String,
  pub discord_username: String,
  pub content_link:     String,
  pub content_type:     ContentType,
  pub title:            Option<String>,
  pub description:      Option<String>,
  /// Email of the submitting user.
  pub submitted_by:     String,
  pub status:           SubmissionStatus,
  pub admin_notes:      Option<String>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubmission {
  pub twitter_handle:   String,
  pub discord_username: String,
  pub content_link:     String,
  pub content_type:     ContentType,
  pub title:            Option<String>,
  pub description:      Option<String>,
}

impl NewSubmission {
  pub fn validate(&self) -> Result<()> {
    require("twitter_handle", &self.twitter_handle)?;
    require("discord_username", &self.discord_username)?;
    require("content_link", &self.content_link)
  }
}

/// An admin decision on a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionReview {
  pub status:      SubmissionStatus,
  pub admin_notes: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn string_forms_match_wire_forms() {
    assert_eq!(ContentType::StreamClip.to_string(), "stream-clip");
    assert_eq!("short-form".parse::<ContentType>().unwrap(), ContentType::ShortForm);
    assert_eq!(
      serde_json::to_string(&ContentType::ShortForm).unwrap(),
      "\"short-form\""
    );
    let p: &'static str = Priority::High.into();
    assert_eq!(p, "high");
    assert_eq!("banner".parse::<AssetKind>().unwrap(), AssetKind::Banner);
  }

  #[test]
  fn announcement_defaults() {
    let a: NewAnnouncement =
      serde_json::from_str(r#"{"title":"Hi","content":"Body"}"#).unwrap();
    assert_eq!(a.priority, Priority::Medium);
    assert!(a.active);
    assert!(a.validate().is_ok());
  }

  #[test]
  fn blank_required_fields_are_rejected() {
    let s = NewSubmission {
      twitter_handle:   "  ".into(),
      discord_username: "d".into(),
      content_link:     "https://x".into(),
      content_type:     ContentType::Thread,
      title:            None,
      description:      None,
    };
    assert!(matches!(s.validate(), Err(Error::Validation(_))));
  }
}
