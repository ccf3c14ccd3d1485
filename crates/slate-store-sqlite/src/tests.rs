//! Integration tests for `SqliteStore` and `LocalIdentity` against an
//! in-memory database.

use std::time::Duration;

use slate_core::{
  error::IdentityError,
  identity::{Credentials, Registration},
  profile::{ProfileMetadata, Role},
  provider::{IdentityProvider, ProfileStore, RequestFeed, RequestStore},
  request::{NewRequest, RequestKind, RequestStatus},
};

use crate::{Error, LocalIdentity, SqliteStore, encode::RawAccount};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn casting(to: &str) -> NewRequest {
  NewRequest {
    kind:      RequestKind::Casting,
    from_user: "filmmaker-1".into(),
    from_name: "Ines Duarte".into(),
    to_user:   to.into(),
    message:   "Would you read for the lead?".into(),
    project:   Some("Night Ferry".into()),
  }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_profile_returns_none() {
  let s = store().await;
  assert!(s.get_profile("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn set_and_get_profile() {
  let s = store().await;
  let written = s
    .set_profile("u1", Role::Actor, ProfileMetadata {
      display_name: Some("Mara Quinn".into()),
      photo_url:    None,
      bio:          Some("Stage and screen.".into()),
    })
    .await
    .unwrap();
  assert_eq!(written.role, Some(Role::Actor));
  assert!(written.created_at.is_some());

  let fetched = s.get_profile("u1").await.unwrap().unwrap();
  assert_eq!(fetched, written);
}

#[tokio::test]
async fn rewriting_profile_keeps_unspecified_metadata() {
  let s = store().await;
  s.set_profile("u1", Role::Viewer, ProfileMetadata {
    display_name: Some("Mara".into()),
    ..Default::default()
  })
  .await
  .unwrap();

  let updated = s
    .set_profile("u1", Role::Filmmaker, ProfileMetadata::default())
    .await
    .unwrap();
  assert_eq!(updated.role, Some(Role::Filmmaker));
  assert_eq!(updated.display_name.as_deref(), Some("Mara"));
  assert!(updated.updated_at >= updated.created_at);
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_request() {
  let s = store().await;
  let created = s.create_request(casting("actor-1")).await.unwrap();
  assert_eq!(created.status, RequestStatus::Pending);
  assert!(!created.read);

  let fetched = s.get_request(&created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn pending_for_filters_recipient_and_status() {
  let s = store().await;
  let keep = s.create_request(casting("actor-1")).await.unwrap();
  let answered = s.create_request(casting("actor-1")).await.unwrap();
  s.create_request(casting("actor-2")).await.unwrap();
  s.set_status(&answered.id, RequestStatus::Declined).await.unwrap();

  let pending = s.pending_for("actor-1").await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].id, keep.id);
}

#[tokio::test]
async fn writes_to_missing_request_fail() {
  let s = store().await;
  assert!(matches!(s.mark_read("ghost").await, Err(Error::RequestNotFound(id)) if id == "ghost"));
  assert!(matches!(s.delete_request("ghost").await, Err(Error::RequestNotFound(_))));
  assert!(matches!(
    s.set_status("ghost", RequestStatus::Accepted).await,
    Err(Error::RequestNotFound(_))
  ));
}

#[tokio::test]
async fn mark_read_and_delete() {
  let s = store().await;
  let r = s.create_request(casting("actor-1")).await.unwrap();
  s.mark_read(&r.id).await.unwrap();
  assert!(s.get_request(&r.id).await.unwrap().unwrap().read);

  s.delete_request(&r.id).await.unwrap();
  assert!(s.get_request(&r.id).await.unwrap().is_none());
}

// ─── Live query ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn live_query_delivers_initial_and_changed_snapshots() {
  let s = store().await;
  let first = s.create_request(casting("actor-1")).await.unwrap();

  let mut feed = s.subscribe_pending("actor-1").unwrap();
  let initial = feed.recv().await.unwrap().unwrap();
  assert_eq!(initial.len(), 1);

  s.mark_read(&first.id).await.unwrap();
  let after_read = feed.recv().await.unwrap().unwrap();
  assert!(after_read[0].read);

  s.set_status(&first.id, RequestStatus::Accepted).await.unwrap();
  let after_accept = feed.recv().await.unwrap().unwrap();
  assert!(after_accept.is_empty());
}

#[tokio::test]
async fn live_query_reader_stops_when_dropped() {
  let s = store().await;
  let feed = s.subscribe_pending("actor-1").unwrap();
  drop(feed);

  // Writes after the subscriber is gone must not block or fail.
  tokio::time::timeout(Duration::from_secs(1), s.create_request(casting("actor-1")))
    .await
    .expect("write not blocked")
    .unwrap();
}

// ─── LocalIdentity ───────────────────────────────────────────────────────────

fn registration(email: &str) -> Registration {
  Registration {
    email:        email.into(),
    password:     "hunter2hunter2".into(),
    display_name: Some("Mara Quinn".into()),
  }
}

#[tokio::test]
async fn sign_up_signs_in_and_publishes() {
  let identity = LocalIdentity::new(store().await);
  let mut changes = identity.subscribe();
  assert!(changes.borrow_and_update().is_none());

  let created = identity.sign_up(registration("Mara@Example.com")).await.unwrap();
  assert_eq!(created.email.as_deref(), Some("mara@example.com"));
  assert!(!created.is_anonymous);

  changes.changed().await.unwrap();
  assert_eq!(changes.borrow().as_ref().map(|i| i.uid.clone()), Some(created.uid));
}

#[tokio::test]
async fn duplicate_and_weak_sign_ups_are_rejected() {
  let identity = LocalIdentity::new(store().await);
  identity.sign_up(registration("mara@example.com")).await.unwrap();

  assert!(matches!(
    identity.sign_up(registration("MARA@example.com")).await,
    Err(IdentityError::EmailTaken(e)) if e == "mara@example.com"
  ));

  let mut weak = registration("other@example.com");
  weak.password = "short".into();
  assert!(matches!(
    identity.sign_up(weak).await,
    Err(IdentityError::WeakPassword { min: 8 })
  ));
}

#[tokio::test]
async fn duplicate_account_insert_is_reported() {
  let s = store().await;
  let account = |uid: &str| RawAccount {
    uid:           uid.into(),
    email:         "mara@example.com".into(),
    display_name:  None,
    photo_url:     None,
    password_hash: "x".into(),
  };
  s.insert_account(account("u1")).await.unwrap();

  assert!(matches!(
    s.insert_account(account("u2")).await,
    Err(Error::AccountExists(e)) if e == "mara@example.com"
  ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_sign_ups_for_one_email() {
  let identity = LocalIdentity::new(store().await);
  let (a, b) = tokio::join!(
    identity.sign_up(registration("dup@example.com")),
    identity.sign_up(registration("dup@example.com")),
  );

  let (won, lost) = match (a, b) {
    (Ok(won), lost) | (lost, Ok(won)) => (won, lost),
    (Err(a), Err(b)) => panic!("both sign-ups failed: {a}; {b}"),
  };
  assert_eq!(won.email.as_deref(), Some("dup@example.com"));
  assert!(matches!(lost, Err(IdentityError::EmailTaken(e)) if e == "dup@example.com"));
}

#[tokio::test]
async fn sign_in_checks_password() {
  let identity = LocalIdentity::new(store().await);
  let created = identity.sign_up(registration("mara@example.com")).await.unwrap();
  identity.sign_out().await.unwrap();
  assert!(identity.current().is_none());

  let wrong = Credentials { email: "mara@example.com".into(), password: "nope-nope".into() };
  assert!(matches!(identity.sign_in(wrong).await, Err(IdentityError::InvalidCredentials)));

  let unknown = Credentials { email: "who@example.com".into(), password: "hunter2hunter2".into() };
  assert!(matches!(identity.sign_in(unknown).await, Err(IdentityError::InvalidCredentials)));

  let right = Credentials { email: "mara@example.com".into(), password: "hunter2hunter2".into() };
  let signed_in = identity.sign_in(right).await.unwrap();
  assert_eq!(signed_in.uid, created.uid);
  assert_eq!(identity.current(), Some(signed_in));
}

#[tokio::test]
async fn anonymous_sign_in() {
  let identity = LocalIdentity::new(store().await);
  let guest = identity.sign_in_anonymously().await.unwrap();
  assert!(guest.is_anonymous);
  assert!(guest.email.is_none());
  assert_eq!(identity.current(), Some(guest));
}
