//! Error type for `slate-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] slate_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("password hash error: {0}")]
  PasswordHash(String),

  #[error("an account already exists for {0}")]
  AccountExists(String),

  #[error("request not found: {0}")]
  RequestNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
