//! Collaborator contracts consumed by the session core.
//!
//! The traits are implemented by backends (e.g. `slate-store-sqlite`). The
//! session runtime depends on these abstractions, never on a concrete
//! backend.

use std::future::Future;

use tokio::sync::{mpsc, watch};

use crate::{
  error::IdentityError,
  identity::{Credentials, Identity, Registration},
  profile::{ProfileDocument, ProfileMetadata, Role},
  request::{NewRequest, RequestDocument, RequestStatus},
};

/// A stream of full-set snapshots from a live query.
///
/// Dropping the receiver unsubscribes; the backend must stop producing once
/// it observes the channel closed.
pub type LiveQuery<E> = mpsc::Receiver<Result<Vec<RequestDocument>, E>>;

// ─── Identity ────────────────────────────────────────────────────────────────

/// The external authentication provider.
pub trait IdentityProvider: Send + Sync {
  /// Observe the signed-in identity. The receiver holds the current state
  /// immediately, so a new subscriber never misses the initial value.
  fn subscribe(&self) -> watch::Receiver<Option<Identity>>;

  fn sign_in(
    &self,
    credentials: Credentials,
  ) -> impl Future<Output = Result<Identity, IdentityError>> + Send + '_;

  /// Create an account and sign it in.
  fn sign_up(
    &self,
    registration: Registration,
  ) -> impl Future<Output = Result<Identity, IdentityError>> + Send + '_;

  /// Start a guest session: an identity with no account and no profile.
  fn sign_in_anonymously(
    &self,
  ) -> impl Future<Output = Result<Identity, IdentityError>> + Send + '_;

  fn sign_out(&self) -> impl Future<Output = Result<(), IdentityError>> + Send + '_;
}

// ─── Profiles ────────────────────────────────────────────────────────────────

/// Profile document storage.
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Returns `None` if no document exists for `uid`.
  fn get_profile<'a>(
    &'a self,
    uid: &'a str,
  ) -> impl Future<Output = Result<Option<ProfileDocument>, Self::Error>> + Send + 'a;

  /// Write the role and metadata for `uid`, creating the document if needed.
  /// Owned by the role-selection flow.
  fn set_profile<'a>(
    &'a self,
    uid: &'a str,
    role: Role,
    metadata: ProfileMetadata,
  ) -> impl Future<Output = Result<ProfileDocument, Self::Error>> + Send + 'a;
}

// ─── Requests ────────────────────────────────────────────────────────────────

/// The live query over request documents.
pub trait RequestFeed: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Subscribe to pending requests addressed to `to_user`. The first snapshot
  /// is delivered as soon as it is read; later ones follow every change.
  fn subscribe_pending(
    &self,
    to_user: &str,
  ) -> Result<LiveQuery<Self::Error>, Self::Error>;
}

/// Request document writes. Owned by collaborators, never by the core.
pub trait RequestStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn create_request(
    &self,
    input: NewRequest,
  ) -> impl Future<Output = Result<RequestDocument, Self::Error>> + Send + '_;

  /// Returns `None` if the request does not exist.
  fn get_request<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<RequestDocument>, Self::Error>> + Send + 'a;

  fn mark_read<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn set_status<'a>(
    &'a self,
    id: &'a str,
    status: RequestStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn delete_request<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
