//! Error type for `slate-session`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A refresh was requested with no signed-in, non-anonymous identity.
  #[error("no signed-in identity to refresh")]
  NotSignedIn,

  /// The identity changed before the refreshed profile was applied.
  #[error("session refresh superseded by an identity change")]
  Superseded,

  /// The driver task has stopped.
  #[error("session store is closed")]
  Closed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
