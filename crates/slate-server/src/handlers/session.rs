//! Handlers for the session, the role gate, and role selection.

use axum::{
  Json,
  extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use slate_core::{
  gate::{GateDecision, evaluate_path, evaluate_role_select, role_home_path},
  profile::{ProfileMetadata, Role},
  provider::ProfileStore,
  session::Session,
};

use crate::{ApiError, AppState, Backend, Identities};

/// `GET /session`
pub async fn current<I: Identities, S: Backend>(
  State(state): State<AppState<I, S>>,
) -> Json<Session> {
  Json(state.session.current())
}

#[derive(Debug, Deserialize)]
pub struct GateParams {
  pub path: String,
}

/// `GET /gate?path=/actors/me/view`
pub async fn gate<I: Identities, S: Backend>(
  State(state): State<AppState<I, S>>,
  Query(params): Query<GateParams>,
) -> Json<GateDecision> {
  Json(evaluate_path(&state.session.current(), &params.path))
}

#[derive(Debug, Deserialize)]
pub struct SelectRoleBody {
  pub role:         Role,
  #[serde(default)]
  pub display_name: Option<String>,
  #[serde(default)]
  pub photo_url:    Option<String>,
  #[serde(default)]
  pub bio:          Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SelectRoleResponse {
  pub session:  Session,
  pub redirect: &'static str,
}

/// `POST /profile/role`: complete role selection.
///
/// Writes the profile, then waits for the session store to re-read it, so
/// the returned session (and every later gate decision) already carries the
/// new role.
pub async fn select_role<I: Identities, S: Backend>(
  State(state): State<AppState<I, S>>,
  Json(body): Json<SelectRoleBody>,
) -> Result<Json<SelectRoleResponse>, ApiError> {
  let session = state.session.current();
  match evaluate_role_select(&session) {
    GateDecision::Allow => {}
    GateDecision::Wait => return Err(ApiError::Loading),
    GateDecision::Redirect { to } if session.role().is_some() => {
      return Err(ApiError::Conflict(format!("role already selected; home is {to}")));
    }
    GateDecision::Redirect { to } => return Err(ApiError::Redirect(to)),
  }
  let Some(uid) = session.uid() else {
    return Err(slate_session::Error::NotSignedIn.into());
  };

  let metadata = ProfileMetadata {
    display_name: body.display_name,
    photo_url:    body.photo_url,
    bio:          body.bio,
  };
  state
    .store
    .set_profile(uid, body.role, metadata)
    .await
    .map_err(ApiError::store)?;

  let session = state.session.refresh().await?;
  tracing::info!(uid = ?session.uid(), role = %body.role, "role selected");
  Ok(Json(SelectRoleResponse { session, redirect: role_home_path(body.role) }))
}
