//! Handlers for `/auth/*`, the commands owned by the identity provider.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/sign-up`   | Body: `{"email","password","display_name"?}` |
//! | `POST` | `/auth/sign-in`   | Body: `{"email","password"}`; 401 on bad credentials |
//! | `POST` | `/auth/anonymous` | Guest session |
//! | `POST` | `/auth/sign-out`  | |
//!
//! Every command answers once the session store has reconciled the new
//! identity, together with where the UI should navigate next.

use axum::{Json, extract::State};
use serde::Serialize;
use slate_core::{
  gate::landing_path,
  identity::{Credentials, Registration},
  session::Session,
};

use crate::{ApiError, AppState, Backend, Identities, handlers::settled_session};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub session:  Session,
  pub redirect: Option<&'static str>,
}

impl From<Session> for AuthResponse {
  fn from(session: Session) -> Self {
    let redirect = landing_path(&session);
    Self { session, redirect }
  }
}

/// `POST /auth/sign-up`
pub async fn sign_up<I: Identities, S: Backend>(
  State(state): State<AppState<I, S>>,
  Json(body): Json<Registration>,
) -> Result<Json<AuthResponse>, ApiError> {
  let identity = state.identity.sign_up(body).await?;
  let session = settled_session(&state, Some(&identity.uid)).await?;
  Ok(Json(session.into()))
}

/// `POST /auth/sign-in`
pub async fn sign_in<I: Identities, S: Backend>(
  State(state): State<AppState<I, S>>,
  Json(body): Json<Credentials>,
) -> Result<Json<AuthResponse>, ApiError> {
  let identity = state.identity.sign_in(body).await?;
  let session = settled_session(&state, Some(&identity.uid)).await?;
  Ok(Json(session.into()))
}

/// `POST /auth/anonymous`
pub async fn anonymous<I: Identities, S: Backend>(
  State(state): State<AppState<I, S>>,
) -> Result<Json<AuthResponse>, ApiError> {
  let identity = state.identity.sign_in_anonymously().await?;
  let session = settled_session(&state, Some(&identity.uid)).await?;
  Ok(Json(session.into()))
}

/// `POST /auth/sign-out`
pub async fn sign_out<I: Identities, S: Backend>(
  State(state): State<AppState<I, S>>,
) -> Result<Json<AuthResponse>, ApiError> {
  state.identity.sign_out().await?;
  let session = settled_session(&state, None).await?;
  Ok(Json(session.into()))
}
