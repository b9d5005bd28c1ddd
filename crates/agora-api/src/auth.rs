//! Session authentication: password hashing, session tokens and the
//! [`Authenticated`] / [`Admin`] extractors.
//!
//! A session token is 32 random bytes, base64url-encoded, handed to the client
//! once. Only its SHA-256 digest is stored, so a leaked database does not leak
//! live sessions. Clients present the token as `Authorization: Bearer <token>`
//! or in the `agora_session` cookie.

use agora_core::{Error, account::Caller, store::AccountStore};
use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};

use crate::{AppState, AppStore, error::{ApiError, store_err}};

pub const SESSION_COOKIE: &str = "agora_session";

/// Session settings for this server instance.
#[derive(Debug, Clone)]
pub struct AuthConfig {
  /// How long a login stays valid.
  pub session_ttl:    Duration,
  /// Mark the session cookie `Secure` (HTTPS deployments).
  pub secure_cookies: bool,
}

impl Default for AuthConfig {
  fn default() -> Self {
    Self {
      session_ttl:    Duration::days(30),
      secure_cookies: false,
    }
  }
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// Whether `password` matches the stored PHC string. A malformed hash never
/// matches.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

pub fn new_session_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// The digest under which a token is stored.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// The session token carried by a request, bearer header first.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty());
  if bearer.is_some() {
    return bearer;
  }

  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, _)| *name == SESSION_COOKIE)
    .map(|(_, value)| value)
    .filter(|t| !t.is_empty())
}

/// `Set-Cookie` value carrying a fresh session.
pub fn session_cookie(token: &str, config: &AuthConfig) -> String {
  let mut cookie = format!(
    "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
    config.session_ttl.num_seconds()
  );
  if config.secure_cookies {
    cookie.push_str("; Secure");
  }
  cookie
}

/// `Set-Cookie` value that removes the session cookie.
pub fn expired_cookie() -> String {
  format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Present in a handler means the request carried a live session.
pub struct Authenticated(pub Caller);

/// An authenticated caller holding the admin capability.
pub struct Admin(pub Caller);

/// An authenticated caller on the voting whitelist.
pub struct Voter(pub Caller);

impl<S: AppStore> FromRequestParts<AppState<S>> for Authenticated {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = session_token(&parts.headers).ok_or(Error::Unauthenticated)?;
    let user = state
      .store
      .session_user(hash_token(token), Utc::now())
      .await
      .map_err(store_err)?
      .ok_or(Error::Unauthenticated)?;
    Ok(Authenticated(Caller::from(&user)))
  }
}

impl<S: AppStore> FromRequestParts<AppState<S>> for Admin {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Authenticated(caller) = Authenticated::from_request_parts(parts, state).await?;
    caller.require_admin()?;
    Ok(Admin(caller))
  }
}

impl<S: AppStore> FromRequestParts<AppState<S>> for Voter {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Authenticated(caller) = Authenticated::from_request_parts(parts, state).await?;
    caller.require_voter()?;
    Ok(Voter(caller))
  }
}
