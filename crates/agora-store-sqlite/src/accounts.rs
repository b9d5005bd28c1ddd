//! [`AccountStore`] impl: users and login sessions.

use agora_core::{
  account::{Credentials, NewUser, ProfileUpdate, User},
  store::AccountStore,
};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{RawUser, USER_COLUMNS, encode_dt, encode_uuid, is_constraint_violation},
};

/// Empty optional profile strings clear the column.
fn non_empty(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl SqliteStore {
  async fn user_where(&self, column: &'static str, value: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
            rusqlite::params![value],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn set_flag(
    &self,
    column: &'static str,
    email: String,
    value: bool,
  ) -> Result<Option<User>> {
    let key = email.clone();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("UPDATE users SET {column} = ?2 WHERE email = ?1"),
          rusqlite::params![key, value],
        )?)
      })
      .await?;
    if changed == 0 {
      return Ok(None);
    }
    self.user_where("email", email).await
  }
}

impl AccountStore for SqliteStore {
  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:        Uuid::new_v4(),
      name:           input.name,
      email:          input.email,
      username:       input.username,
      bio:            None,
      wallet_address: None,
      website:        None,
      location:       None,
      is_whitelisted: false,
      is_admin:       false,
      created_at:     Utc::now(),
      last_login:     None,
    };

    let id_str   = encode_uuid(user.user_id);
    let name     = user.name.clone();
    let email    = user.email.clone();
    let username = user.username.clone();
    let hash     = input.password_hash;
    let at_str   = encode_dt(user.created_at);

    // Some(field) names the unique column that was already taken.
    let taken: Option<&'static str> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let email_taken = tx
          .query_row("SELECT 1 FROM users WHERE email = ?1", rusqlite::params![email], |_| Ok(()))
          .optional()?
          .is_some();
        if email_taken {
          return Ok(Some("email"));
        }
        if let Some(username) = &username {
          let username_taken = tx
            .query_row(
              "SELECT 1 FROM users WHERE username = ?1",
              rusqlite::params![username],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if username_taken {
            return Ok(Some("username"));
          }
        }

        match tx.execute(
          "INSERT INTO users (user_id, name, email, username, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, name, email, username, hash, at_str],
        ) {
          Ok(_) => {}
          Err(e) if is_constraint_violation(&e) => return Ok(Some("email")),
          Err(e) => return Err(e.into()),
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    match taken {
      Some(field) => Err(Error::Core(agora_core::Error::UserExists(field))),
      None => Ok(user),
    }
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    self.user_where("user_id", encode_uuid(user_id)).await
  }

  async fn get_credentials(&self, email: String) -> Result<Option<Credentials>> {
    let raw: Option<(RawUser, String)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"),
            rusqlite::params![email],
            |row| Ok((RawUser::from_row(row)?, row.get::<_, String>(12)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(raw, password_hash)| Ok(Credentials { user: raw.into_user()?, password_hash }))
      .transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn set_whitelisted(&self, email: String, whitelisted: bool) -> Result<Option<User>> {
    self.set_flag("is_whitelisted", email, whitelisted).await
  }

  async fn set_admin(&self, email: String, admin: bool) -> Result<Option<User>> {
    self.set_flag("is_admin", email, admin).await
  }

  async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<Option<User>> {
    let Some(mut user) = self.get_user(user_id).await? else {
      return Ok(None);
    };

    if let Some(name) = update.name {
      user.name = name.trim().to_string();
    }
    if update.username.is_some() {
      user.username = non_empty(update.username);
    }
    if update.bio.is_some() {
      user.bio = non_empty(update.bio);
    }
    if update.wallet_address.is_some() {
      user.wallet_address = non_empty(update.wallet_address);
    }
    if update.website.is_some() {
      user.website = non_empty(update.website);
    }
    if update.location.is_some() {
      user.location = non_empty(update.location);
    }

    let id_str   = encode_uuid(user_id);
    let name     = user.name.clone();
    let username = user.username.clone();
    let bio      = user.bio.clone();
    let wallet   = user.wallet_address.clone();
    let website  = user.website.clone();
    let location = user.location.clone();

    let conflict = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(username) = &username {
          let taken = tx
            .query_row(
              "SELECT 1 FROM users WHERE username = ?1 AND user_id != ?2",
              rusqlite::params![username, id_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if taken {
            return Ok(true);
          }
        }
        tx.execute(
          "UPDATE users
           SET name = ?2, username = ?3, bio = ?4, wallet_address = ?5,
               website = ?6, location = ?7
           WHERE user_id = ?1",
          rusqlite::params![id_str, name, username, bio, wallet, website, location],
        )?;
        tx.commit()?;
        Ok(false)
      })
      .await?;

    if conflict {
      return Err(Error::Core(agora_core::Error::UserExists("username")));
    }
    Ok(Some(user))
  }

  async fn set_password_hash(&self, user_id: Uuid, password_hash: String) -> Result<()> {
    let id_str = encode_uuid(user_id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET password_hash = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, password_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let id_str = encode_uuid(user_id);
    let at_str = encode_dt(at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET last_login = ?2 WHERE user_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(
    &self,
    token_hash: String,
    user_id:    Uuid,
    expires_at: DateTime<Utc>,
  ) -> Result<()> {
    let id_str      = encode_uuid(user_id);
    let created_str = encode_dt(Utc::now());
    let expires_str = encode_dt(expires_at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![token_hash, id_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
    let now_str = encode_dt(now);
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            rusqlite::params![now_str],
          )?)
        })
        .await?,
    )
  }

  async fn delete_other_sessions(&self, user_id: Uuid, keep: String) -> Result<usize> {
    let id_str = encode_uuid(user_id);
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(conn.execute(
            "DELETE FROM sessions WHERE user_id = ?1 AND token_hash != ?2",
            rusqlite::params![id_str, keep],
          )?)
        })
        .await?,
    )
  }

  async fn session_user(&self, token_hash: String, now: DateTime<Utc>) -> Result<Option<User>> {
    let now_str = encode_dt(now);
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {USER_COLUMNS} FROM users
               WHERE user_id = (SELECT user_id FROM sessions
                                WHERE token_hash = ?1 AND expires_at > ?2)"
            ),
            rusqlite::params![token_hash, now_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn delete_session(&self, token_hash: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM sessions WHERE token_hash = ?1", rusqlite::params![token_hash])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
