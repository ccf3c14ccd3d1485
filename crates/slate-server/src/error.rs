//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use slate_core::{
  error::IdentityError,
  gate::GateDecision,
};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Identity(#[from] IdentityError),

  #[error(transparent)]
  Session(#[from] slate_session::Error),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The session has not resolved yet; the caller should retry.
  #[error("session is still loading")]
  Loading,

  /// The role gate sent the caller elsewhere.
  #[error("redirect to {0}")]
  Redirect(&'static str),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  /// Turn a gate decision into `Ok` only when the surface may proceed.
  pub fn require(decision: GateDecision) -> Result<(), Self> {
    match decision {
      GateDecision::Allow => Ok(()),
      GateDecision::Wait => Err(Self::Loading),
      GateDecision::Redirect { to } => Err(Self::Redirect(to)),
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      ApiError::Identity(IdentityError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
      ApiError::Identity(IdentityError::EmailTaken(_)) => StatusCode::CONFLICT,
      ApiError::Identity(
        IdentityError::InvalidEmail(_) | IdentityError::WeakPassword { .. },
      ) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Identity(IdentityError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::Session(slate_session::Error::NotSignedIn) => StatusCode::UNAUTHORIZED,
      ApiError::Session(slate_session::Error::Superseded) => StatusCode::CONFLICT,
      ApiError::Session(slate_session::Error::Closed) | ApiError::Loading => {
        StatusCode::SERVICE_UNAVAILABLE
      }
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Redirect(_) => StatusCode::FORBIDDEN,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::warn!(error = %self, "request failed");
    }
    let body = match &self {
      ApiError::Redirect(to) => json!({ "error": self.to_string(), "redirect": to }),
      _ => json!({ "error": self.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}
