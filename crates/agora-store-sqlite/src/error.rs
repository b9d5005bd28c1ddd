//! Error type for `agora-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A business rule enforced by a schema constraint.
  #[error("core error: {0}")]
  Core(#[from] agora_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),
}

impl From<Error> for agora_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => agora_core::Error::store(other),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
