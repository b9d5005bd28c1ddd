//! Handlers for sign-up, login and user management.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/signup` | `{"name","email","password","username"?}` |
//! | `POST` | `/auth/login` | Sets the session cookie and returns the token |
//! | `POST` | `/auth/logout` | Always succeeds |
//! | `GET`  | `/users/me` | |
//! | `PUT`  | `/users/me` | Profile fields; `""` clears an optional field |
//! | `PUT`  | `/users/me/password` | Requires the current password; ends other sessions |
//! | `GET`  | `/users` | Admin |
//! | `GET`  | `/users/:id` | Admin |
//! | `POST` | `/users/whitelist` | Admin; `{"email","whitelisted"}` |
//! | `POST` | `/users/admin` | Admin; `{"email","admin"}` |

use agora_core::{
  Error,
  account::{
    NewUser, ProfileUpdate, User, normalize_email, validate_password, validate_username,
  },
  store::AccountStore,
};
use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  AppState, AppStore,
  auth::{
    Admin, Authenticated, expired_cookie, hash_password, hash_token, new_session_token,
    session_cookie, session_token, verify_password,
  },
  error::{ApiError, store_err},
};

// ─── Sign-up & login ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupBody {
  pub name:     String,
  pub email:    String,
  pub password: String,
  pub username: Option<String>,
}

/// `POST /auth/signup`
pub async fn signup<S: AppStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse, ApiError> {
  let name = body.name.trim().to_string();
  if name.is_empty() {
    return Err(Error::Validation("name is required".into()).into());
  }
  let email = normalize_email(&body.email)?;
  validate_password(&body.password)?;
  let username = match body.username.as_deref().map(str::trim) {
    Some("") | None => None,
    Some(u) => {
      validate_username(u)?;
      Some(u.to_lowercase())
    }
  };

  let user = state
    .store
    .create_user(NewUser {
      name,
      email,
      username,
      password_hash: hash_password(&body.password)?,
    })
    .await
    .map_err(store_err)?;

  info!(user_id = %user.user_id, email = %user.email, "user signed up");
  Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  pub user:       User,
}

/// `POST /auth/login`
pub async fn login<S: AppStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
  let email = normalize_email(&body.email).map_err(|_| Error::InvalidCredentials)?;
  let creds = state
    .store
    .get_credentials(email)
    .await
    .map_err(store_err)?
    .ok_or(Error::InvalidCredentials)?;
  if !verify_password(&body.password, &creds.password_hash) {
    return Err(Error::InvalidCredentials.into());
  }

  let now = Utc::now();
  let expires_at = now + state.auth.session_ttl;
  let token = new_session_token();
  let mut user = creds.user;

  let purged = state
    .store
    .purge_expired_sessions(now)
    .await
    .map_err(store_err)?;
  if purged > 0 {
    debug!(purged, "expired sessions removed");
  }
  state
    .store
    .create_session(hash_token(&token), user.user_id, expires_at)
    .await
    .map_err(store_err)?;
  state
    .store
    .record_login(user.user_id, now)
    .await
    .map_err(store_err)?;
  user.last_login = Some(now);

  info!(user_id = %user.user_id, "user logged in");
  let cookie = session_cookie(&token, &state.auth);
  Ok((
    [(header::SET_COOKIE, cookie)],
    Json(LoginResponse { token, expires_at, user }),
  ))
}

/// `POST /auth/logout`
pub async fn logout<S: AppStore>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
  if let Some(token) = session_token(&headers) {
    state
      .store
      .delete_session(hash_token(token))
      .await
      .map_err(store_err)?;
  }
  Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, expired_cookie())]))
}

// ─── Own profile ─────────────────────────────────────────────────────────────

/// `GET /users/me`
pub async fn me<S: AppStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
) -> Result<Json<User>, ApiError> {
  let user = state
    .store
    .get_user(caller.user_id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| Error::NotFound("user".into()))?;
  Ok(Json(user))
}

/// `PUT /users/me`
pub async fn update_me<S: AppStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  Json(mut update): Json<ProfileUpdate>,
) -> Result<Json<User>, ApiError> {
  update.validate()?;
  let user = state
    .store
    .update_profile(caller.user_id, update)
    .await
    .map_err(store_err)?
    .ok_or_else(|| Error::NotFound("user".into()))?;
  Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct PasswordBody {
  pub current_password: String,
  pub new_password:     String,
}

/// `PUT /users/me/password` — also signs out every other session.
pub async fn change_password<S: AppStore>(
  State(state): State<AppState<S>>,
  Authenticated(caller): Authenticated,
  headers: HeaderMap,
  Json(body): Json<PasswordBody>,
) -> Result<StatusCode, ApiError> {
  let creds = state
    .store
    .get_credentials(caller.email.clone())
    .await
    .map_err(store_err)?
    .ok_or(Error::Unauthenticated)?;
  if !verify_password(&body.current_password, &creds.password_hash) {
    return Err(Error::InvalidCredentials.into());
  }
  validate_password(&body.new_password)?;

  state
    .store
    .set_password_hash(caller.user_id, hash_password(&body.new_password)?)
    .await
    .map_err(store_err)?;
  let current = session_token(&headers).map(hash_token).unwrap_or_default();
  let revoked = state
    .store
    .delete_other_sessions(caller.user_id, current)
    .await
    .map_err(store_err)?;
  info!(user_id = %caller.user_id, revoked, "password changed");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Administration ──────────────────────────────────────────────────────────

/// `GET /users`
pub async fn list_users<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
) -> Result<Json<Vec<User>>, ApiError> {
  Ok(Json(state.store.list_users().await.map_err(store_err)?))
}

/// `GET /users/:id`
pub async fn get_user<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(_): Admin,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
  let user = state
    .store
    .get_user(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| Error::NotFound(format!("user {id}")))?;
  Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct WhitelistBody {
  pub email:       String,
  pub whitelisted: bool,
}

/// `POST /users/whitelist`
pub async fn set_whitelisted<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
  Json(body): Json<WhitelistBody>,
) -> Result<Json<User>, ApiError> {
  let email = normalize_email(&body.email)?;
  let user = state
    .store
    .set_whitelisted(email.clone(), body.whitelisted)
    .await
    .map_err(store_err)?
    .ok_or_else(|| Error::NotFound(format!("user {email}")))?;
  info!(%email, whitelisted = body.whitelisted, by = %caller.email, "whitelist updated");
  Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct AdminBody {
  pub email: String,
  pub admin: bool,
}

/// `POST /users/admin`
pub async fn set_admin<S: AppStore>(
  State(state): State<AppState<S>>,
  Admin(caller): Admin,
  Json(body): Json<AdminBody>,
) -> Result<Json<User>, ApiError> {
  let email = normalize_email(&body.email)?;
  let user = state
    .store
    .set_admin(email.clone(), body.admin)
    .await
    .map_err(store_err)?
    .ok_or_else(|| Error::NotFound(format!("user {email}")))?;
  info!(%email, admin = body.admin, by = %caller.email, "admin flag updated");
  Ok(Json(user))
}
