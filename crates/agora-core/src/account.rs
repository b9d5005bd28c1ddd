//! Accounts, callers and profile validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MIN_PASSWORD_LEN: usize = 6;

// ─── Users ───────────────────────────────────────────────────────────────────

/// A registered account. The password hash is held separately in
/// [`Credentials`] so it never reaches a serializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:        Uuid,
  pub name:           String,
  pub email:          String,
  pub username:       Option<String>,
  pub bio:            Option<String>,
  pub wallet_address: Option<String>,
  pub website:        Option<String>,
  pub location:       Option<String>,
  /// May cast votes.
  pub is_whitelisted: bool,
  /// May run admin operations.
  pub is_admin:       bool,
  pub created_at:     DateTime<Utc>,
  pub last_login:     Option<DateTime<Utc>>,
}

/// A user together with their stored argon2 PHC string.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  pub password_hash: String,
}

/// Input to [`crate::store::AccountStore::create_user`]. Fields are expected
/// to be normalized already (see [`normalize_email`]).
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  pub username:      Option<String>,
  pub password_hash: String,
}

/// Profile fields a user may change on their own account. `None` keeps the
/// current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub name:           Option<String>,
  pub username:       Option<String>,
  pub bio:            Option<String>,
  pub wallet_address: Option<String>,
  pub website:        Option<String>,
  pub location:       Option<String>,
}

impl ProfileUpdate {
  /// Check and normalize in place. A blank optional field is left blank so
  /// the store clears it.
  pub fn validate(&mut self) -> Result<()> {
    if let Some(name) = &self.name
      && name.trim().is_empty()
    {
      return Err(Error::Validation("name must not be empty".into()));
    }
    if let Some(username) = self.username.as_mut() {
      let trimmed = username.trim();
      if !trimmed.is_empty() {
        validate_username(trimmed)?;
      }
      *username = trimmed.to_lowercase();
    }
    if let Some(addr) = self.wallet_address.as_mut() {
      let trimmed = addr.trim();
      if !trimmed.is_empty() {
        validate_wallet_address(trimmed)?;
      }
      *addr = trimmed.to_string();
    }
    Ok(())
  }
}

// ─── Caller ──────────────────────────────────────────────────────────────────

/// The verified identity behind a request, with its capability flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
  pub user_id:        Uuid,
  /// Voter identity recorded on votes.
  pub email:          String,
  pub may_vote:       bool,
  pub may_administer: bool,
}

impl Caller {
  pub fn require_voter(&self) -> Result<()> {
    if self.may_vote {
      Ok(())
    } else {
      Err(Error::Forbidden("you are not whitelisted to vote"))
    }
  }

  pub fn require_admin(&self) -> Result<()> {
    if self.may_administer {
      Ok(())
    } else {
      Err(Error::Forbidden("admin access required"))
    }
  }
}

impl From<&User> for Caller {
  fn from(u: &User) -> Self {
    Self {
      user_id:        u.user_id,
      email:          u.email.clone(),
      may_vote:       u.is_whitelisted,
      may_administer: u.is_admin,
    }
  }
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Trim and lowercase an email; reject anything without a local part and
/// domain.
pub fn normalize_email(email: &str) -> Result<String> {
  let email = email.trim().to_lowercase();
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
    _ => Err(Error::Validation(format!("invalid email address: {email:?}"))),
  }
}

/// 3–20 ASCII letters, digits or underscores.
pub fn validate_username(username: &str) -> Result<()> {
  let ok = (3..=20).contains(&username.len())
    && username
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '_');
  if ok {
    Ok(())
  } else {
    Err(Error::Validation(
      "username must be 3-20 characters of letters, numbers and underscores"
        .into(),
    ))
  }
}

/// `0x` followed by 40 hex digits.
pub fn validate_wallet_address(addr: &str) -> Result<()> {
  let ok = addr
    .strip_prefix("0x")
    .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()));
  if ok {
    Ok(())
  } else {
    Err(Error::Validation("invalid wallet address".into()))
  }
}

pub fn validate_password(password: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::Validation(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_is_lowercased_and_trimmed() {
    assert_eq!(normalize_email("  Alice@Example.COM ").unwrap(), "alice@example.com");
    assert!(normalize_email("no-at-sign").is_err());
    assert!(normalize_email("@example.com").is_err());
  }

  #[test]
  fn usernames() {
    assert!(validate_username("alice_01").is_ok());
    assert!(validate_username("al").is_err());
    assert!(validate_username("has space").is_err());
    assert!(validate_username(&"x".repeat(21)).is_err());
  }

  #[test]
  fn wallet_addresses() {
    let good = format!("0x{}", "aB3".repeat(13) + "f");
    assert!(validate_wallet_address(&good).is_ok());
    assert!(validate_wallet_address("0x1234").is_err());
    assert!(validate_wallet_address(&"a".repeat(42)).is_err());
  }

  #[test]
  fn profile_update_lowercases_username() {
    let mut update = ProfileUpdate {
      username: Some("Alice_W".into()),
      ..Default::default()
    };
    update.validate().unwrap();
    assert_eq!(update.username.as_deref(), Some("alice_w"));
  }

  #[test]
  fn profile_update_allows_clearing_checked_fields() {
    let mut update = ProfileUpdate {
      username: Some("".into()),
      wallet_address: Some("  ".into()),
      ..Default::default()
    };
    update.validate().unwrap();
    assert_eq!(update.username.as_deref(), Some(""));
    assert_eq!(update.wallet_address.as_deref(), Some(""));

    let mut bad = ProfileUpdate { wallet_address: Some("0x12".into()), ..Default::default() };
    assert!(bad.validate().is_err());
  }

  #[test]
  fn caller_capabilities() {
    let caller = Caller {
      user_id:        Uuid::new_v4(),
      email:          "x@example.com".into(),
      may_vote:       true,
      may_administer: false,
    };
    assert!(caller.require_voter().is_ok());
    assert!(matches!(caller.require_admin(), Err(Error::Forbidden(_))));
  }
}
