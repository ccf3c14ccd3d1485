//! Route handlers, grouped by concern.

pub mod auth;
pub mod requests;
pub mod session;

use std::time::Duration;

use slate_core::session::Session;

use crate::{ApiError, AppState};

/// How long a command waits for the session store to catch up.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Wait until the published session belongs to `uid` and has left `Loading`.
pub(crate) async fn settled_session<I, S>(
  state: &AppState<I, S>,
  uid: Option<&str>,
) -> Result<Session, ApiError> {
  let mut sessions = state.session.subscribe();
  let outcome = tokio::time::timeout(
    SETTLE_TIMEOUT,
    sessions.wait_for(|s| !s.is_loading() && s.uid() == uid),
  )
  .await;

  match outcome {
    Ok(Ok(session)) => Ok(session.clone()),
    Ok(Err(_)) => Err(slate_session::Error::Closed.into()),
    Err(_) => Err(ApiError::Loading),
  }
}
