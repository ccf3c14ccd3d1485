//! Handlers for notifications and request documents.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/notifications` | `{events, unread_count}` for the signed-in user |
//! | `POST`   | `/requests` | Body: `{"kind","to_user","message"?,"project"?}` |
//! | `POST`   | `/requests/{id}/read` | Recipient only |
//! | `POST`   | `/requests/{id}/status` | Recipient only; body `{"status":"accepted"\|"declined"}` |
//! | `DELETE` | `/requests/{id}` | Sender only; withdraws the request |
//!
//! Requests the caller is not party to are reported as not found.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use slate_core::{
  gate::evaluate,
  notification::NotificationView,
  provider::RequestStore,
  request::{NewRequest, RequestDocument, RequestKind, RequestStatus},
  session::Session,
};

use crate::{ApiError, AppState, Backend, Identities};

/// The current session, provided the signed-in surface gate allows it.
fn signed_in<I, S>(state: &AppState<I, S>) -> Result<Session, ApiError> {
  let session = state.session.current();
  ApiError::require(evaluate(&session, None))?;
  Ok(session)
}

async fn load_request<S: Backend>(store: &S, id: &str) -> Result<RequestDocument, ApiError> {
  store
    .get_request(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("request {id}")))
}

// ─── Notifications ────────────────────────────────────────────────────────────

/// `GET /notifications`
pub async fn notifications<I: Identities, S: Backend>(
  State(state): State<AppState<I, S>>,
) -> Result<Json<NotificationView>, ApiError> {
  let session = signed_in(&state)?;
  let view = state.notifications.current();
  // The stream may still be switching to this identity.
  if !view.belongs_to(session.uid()) {
    return Ok(Json(NotificationView::empty_for(session.uid())));
  }
  Ok(Json(view))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub kind:    RequestKind,
  pub to_user: String,
  #[serde(default)]
  pub message: String,
  #[serde(default)]
  pub project: Option<String>,
}

/// `POST /requests`
pub async fn create<I: Identities, S: Backend>(
  State(state): State<AppState<I, S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let session = signed_in(&state)?;
  let (Some(identity), Some(profile)) = (&session.identity, &session.profile) else {
    return Err(ApiError::Loading);
  };
  if body.to_user == identity.uid {
    return Err(ApiError::BadRequest("cannot send a request to yourself".into()));
  }

  let from_name = profile
    .display_name
    .clone()
    .or_else(|| profile.email.clone())
    .unwrap_or_else(|| identity.uid.clone());

  let created = state
    .store
    .create_request(NewRequest {
      kind: body.kind,
      from_user: identity.uid.clone(),
      from_name,
      to_user: body.to_user,
      message: body.message,
      project: body.project,
    })
    .await
    .map_err(ApiError::store)?;

  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Recipient actions ────────────────────────────────────────────────────────

/// `POST /requests/{id}/read`
pub async fn mark_read<I: Identities, S: Backend>(
  State(state): State<AppState<I, S>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let session = signed_in(&state)?;
  let request = load_request(state.store.as_ref(), &id).await?;
  if Some(request.to_user.as_str()) != session.uid() {
    return Err(ApiError::NotFound(format!("request {id}")));
  }

  state.store.mark_read(&id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RespondBody {
  pub status: RequestStatus,
}

/// `POST /requests/{id}/status`
pub async fn respond<I: Identities, S: Backend>(
  State(state): State<AppState<I, S>>,
  Path(id): Path<String>,
  Json(body): Json<RespondBody>,
) -> Result<StatusCode, ApiError> {
  let session = signed_in(&state)?;
  if body.status == RequestStatus::Pending {
    return Err(ApiError::BadRequest("status must be accepted or declined".into()));
  }

  let request = load_request(state.store.as_ref(), &id).await?;
  if Some(request.to_user.as_str()) != session.uid() {
    return Err(ApiError::NotFound(format!("request {id}")));
  }
  if request.status != RequestStatus::Pending {
    return Err(ApiError::Conflict(format!("request {id} is already {}", request.status)));
  }

  state
    .store
    .set_status(&id, body.status)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Sender actions ───────────────────────────────────────────────────────────

/// `DELETE /requests/{id}`
pub async fn withdraw<I: Identities, S: Backend>(
  State(state): State<AppState<I, S>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let session = signed_in(&state)?;
  let request = load_request(state.store.as_ref(), &id).await?;
  if Some(request.from_user.as_str()) != session.uid() {
    return Err(ApiError::NotFound(format!("request {id}")));
  }

  state
    .store
    .delete_request(&id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
