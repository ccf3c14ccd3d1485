//! Error types for `slate-core`.
//!
//! Three failure classes cross the core's boundary. Only [`IdentityError`] is
//! ever returned to a user-facing caller; the other two are absorbed by the
//! runtime and routed to the log.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown request status: {0:?}")]
  UnknownRequestStatus(String),

  #[error("unknown request kind: {0:?}")]
  UnknownRequestKind(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A failure reported by the identity provider.
///
/// Always propagated to whoever initiated sign-in or sign-up.
#[derive(Debug, Error)]
pub enum IdentityError {
  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("an account already exists for {0}")]
  EmailTaken(String),

  #[error("invalid email address: {0:?}")]
  InvalidEmail(String),

  #[error("password must be at least {min} characters")]
  WeakPassword { min: usize },

  #[error("identity backend error: {0}")]
  Backend(#[source] BoxError),
}

impl IdentityError {
  pub fn backend(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Backend(Box::new(e))
  }
}

/// A profile read that failed or timed out.
///
/// Never fatal: the session store logs it and falls back to a profile with no
/// role.
#[derive(Debug, Error)]
pub enum ProfileFetchError {
  #[error("profile fetch for {uid} failed: {source}")]
  Store {
    uid:    String,
    #[source]
    source: BoxError,
  },

  #[error("profile fetch for {uid} timed out after {after_ms}ms")]
  TimedOut { uid: String, after_ms: u128 },
}

/// A failure of the live request query backing the notification stream.
#[derive(Debug, Error)]
pub enum SubscriptionError {
  #[error("could not open request feed for {uid}: {source}")]
  Open {
    uid:    String,
    #[source]
    source: BoxError,
  },

  #[error("request feed for {uid} reported an error: {source}")]
  Snapshot {
    uid:    String,
    #[source]
    source: BoxError,
  },

  #[error("request feed for {uid} closed")]
  Closed { uid: String },
}
