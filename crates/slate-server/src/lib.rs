//! Local HTTP agent for the Slate session core.
//!
//! Exposes an axum [`Router`] through which UI collaborators read the
//! reconciled session, role-gate decisions, and the live notification view,
//! and issue the commands they own (sign-in, sign-out, role selection,
//! request writes).

pub mod error;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{delete, get, post},
};
use serde::Deserialize;
use slate_core::provider::{IdentityProvider, ProfileStore, RequestFeed, RequestStore};
use slate_session::{NotificationStream, SessionOptions, SessionStore};
use tower_http::trace::TraceLayer;

use handlers::{auth, requests, session};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_feed_buffer() -> usize { 16 }

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                     String,
  pub port:                     u16,
  pub store_path:               PathBuf,
  /// Give up on a profile read after this many milliseconds.
  #[serde(default)]
  pub profile_fetch_timeout_ms: Option<u64>,
  #[serde(default = "default_feed_buffer")]
  pub feed_buffer:              usize,
}

impl ServerConfig {
  pub fn session_options(&self) -> SessionOptions {
    SessionOptions {
      profile_fetch_timeout: self.profile_fetch_timeout_ms.map(Duration::from_millis),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Identity providers the agent can serve.
pub trait Identities: IdentityProvider + 'static {}
impl<T: IdentityProvider + 'static> Identities for T {}

/// Storage backends the agent can serve.
pub trait Backend: ProfileStore + RequestStore + RequestFeed + 'static {}
impl<T> Backend for T where T: ProfileStore + RequestStore + RequestFeed + 'static {}

/// Shared state threaded through all axum handlers.
pub struct AppState<I, S> {
  pub identity:      Arc<I>,
  pub store:         Arc<S>,
  pub session:       Arc<SessionStore>,
  pub notifications: Arc<NotificationStream>,
}

impl<I, S> Clone for AppState<I, S> {
  fn clone(&self) -> Self {
    Self {
      identity:      Arc::clone(&self.identity),
      store:         Arc::clone(&self.store),
      session:       Arc::clone(&self.session),
      notifications: Arc::clone(&self.notifications),
    }
  }
}

impl<I: Identities, S: Backend> AppState<I, S> {
  /// Start the session store and notification stream over `identity` and
  /// `store`.
  pub fn start(identity: Arc<I>, store: Arc<S>, options: SessionOptions) -> Self {
    let session = SessionStore::spawn(identity.as_ref(), Arc::clone(&store), options);
    let notifications = NotificationStream::spawn(session.subscribe(), Arc::clone(&store));
    Self {
      identity,
      store,
      session: Arc::new(session),
      notifications: Arc::new(notifications),
    }
  }

  /// Tear down the notification stream, then the session store. Stores still
  /// shared elsewhere stop when their last handle drops.
  pub async fn shutdown(self) {
    if let Ok(notifications) = Arc::try_unwrap(self.notifications) {
      notifications.shutdown().await;
    }
    if let Ok(session) = Arc::try_unwrap(self.session) {
      session.shutdown().await;
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the agent's axum [`Router`].
pub fn router<I, S>(state: AppState<I, S>) -> Router
where
  I: Identities,
  S: Backend,
{
  Router::new()
    // Identity
    .route("/auth/sign-up", post(auth::sign_up::<I, S>))
    .route("/auth/sign-in", post(auth::sign_in::<I, S>))
    .route("/auth/anonymous", post(auth::anonymous::<I, S>))
    .route("/auth/sign-out", post(auth::sign_out::<I, S>))
    // Session & gate
    .route("/session", get(session::current::<I, S>))
    .route("/gate", get(session::gate::<I, S>))
    .route("/profile/role", post(session::select_role::<I, S>))
    // Notifications & requests
    .route("/notifications", get(requests::notifications::<I, S>))
    .route("/requests", post(requests::create::<I, S>))
    .route("/requests/{id}", delete(requests::withdraw::<I, S>))
    .route("/requests/{id}/read", post(requests::mark_read::<I, S>))
    .route("/requests/{id}/status", post(requests::respond::<I, S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
