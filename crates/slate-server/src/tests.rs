//! End-to-end tests for the agent API over an in-memory store.

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use slate_session::SessionOptions;
use slate_store_sqlite::{LocalIdentity, SqliteStore};
use tower::ServiceExt as _;

use crate::{AppState, router};

async fn app() -> Router {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let identity = Arc::new(LocalIdentity::new(store.clone()));
  let state = AppState::start(identity, Arc::new(store), SessionOptions::default());
  state.session.resolved().await.expect("initial session");
  router(state)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut req = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(json) => {
      req = req.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };

  let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, value)
}

async fn sign_up(app: &Router, email: &str) -> Value {
  let (status, body) = call(app, Method::POST, "/auth/sign-up", Some(json!({
    "email": email,
    "password": "correct-horse",
    "display_name": email.split('@').next().unwrap(),
  })))
  .await;
  assert_eq!(status, StatusCode::OK, "{body}");
  body
}

async fn select_role(app: &Router, role: &str) -> Value {
  let (status, body) =
    call(app, Method::POST, "/profile/role", Some(json!({ "role": role }))).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  body
}

/// Poll `/notifications` until `pred` holds; the live query is asynchronous.
async fn notifications_until(app: &Router, pred: impl Fn(&Value) -> bool) -> Value {
  for _ in 0..100 {
    let (status, body) = call(app, Method::GET, "/notifications", None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    if pred(&body) {
      return body;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
  }
  panic!("notifications never matched");
}

// ─── Session & gate ──────────────────────────────────────────────────────────

#[tokio::test]
async fn signed_out_gate_redirects_to_login() {
  let app = app().await;
  let (_, session) = call(&app, Method::GET, "/session", None).await;
  assert_eq!(session["status"], "unauthenticated");

  let (status, decision) = call(&app, Method::GET, "/gate?path=/actors/me/view", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(decision, json!({ "decision": "redirect", "to": "/login" }));

  let (_, decision) = call(&app, Method::GET, "/gate?path=/films/42", None).await;
  assert_eq!(decision, json!({ "decision": "allow" }));
}

#[tokio::test]
async fn new_account_lands_on_role_select() {
  let app = app().await;
  let body = sign_up(&app, "mara@example.com").await;
  assert_eq!(body["redirect"], "/role-select");
  assert_eq!(body["session"]["status"], "authenticated");
  assert_eq!(body["session"]["profile"]["role"], Value::Null);

  let (_, decision) = call(&app, Method::GET, "/gate?path=/actors/me/view", None).await;
  assert_eq!(decision, json!({ "decision": "redirect", "to": "/role-select" }));
}

#[tokio::test]
async fn role_selection_is_visible_immediately() {
  let app = app().await;
  sign_up(&app, "mara@example.com").await;

  let body = select_role(&app, "actor").await;
  assert_eq!(body["redirect"], "/actors/me/view");
  assert_eq!(body["session"]["profile"]["role"], "actor");

  let (_, decision) = call(&app, Method::GET, "/gate?path=/filmmakers/me/view", None).await;
  assert_eq!(decision, json!({ "decision": "redirect", "to": "/actors/me/view" }));
  let (_, decision) = call(&app, Method::GET, "/gate?path=/actors/me/view", None).await;
  assert_eq!(decision, json!({ "decision": "allow" }));
  let (_, decision) = call(&app, Method::GET, "/gate?path=/role-select", None).await;
  assert_eq!(decision, json!({ "decision": "redirect", "to": "/actors/me/view" }));

  let (status, _) =
    call(&app, Method::POST, "/profile/role", Some(json!({ "role": "venue" }))).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn role_selection_requires_sign_in() {
  let app = app().await;
  let (status, body) =
    call(&app, Method::POST, "/profile/role", Some(json!({ "role": "viewer" }))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["redirect"], "/login");
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sign_in_after_sign_out_restores_role() {
  let app = app().await;
  sign_up(&app, "ines@example.com").await;
  select_role(&app, "filmmaker").await;

  let (status, body) = call(&app, Method::POST, "/auth/sign-out", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["session"]["status"], "unauthenticated");
  assert_eq!(body["redirect"], "/login");

  let (status, _) = call(&app, Method::POST, "/auth/sign-in", Some(json!({
    "email": "ines@example.com",
    "password": "wrong-password",
  })))
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, body) = call(&app, Method::POST, "/auth/sign-in", Some(json!({
    "email": "INES@example.com",
    "password": "correct-horse",
  })))
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["session"]["profile"]["role"], "filmmaker");
  assert_eq!(body["redirect"], "/filmmakers/me/view");
}

#[tokio::test]
async fn duplicate_and_invalid_sign_ups() {
  let app = app().await;
  sign_up(&app, "mara@example.com").await;

  let (status, _) = call(&app, Method::POST, "/auth/sign-up", Some(json!({
    "email": "mara@example.com",
    "password": "correct-horse",
  })))
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = call(&app, Method::POST, "/auth/sign-up", Some(json!({
    "email": "not-an-email",
    "password": "correct-horse",
  })))
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn anonymous_session_is_sent_to_login() {
  let app = app().await;
  let (status, body) = call(&app, Method::POST, "/auth/anonymous", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["session"]["status"], "anonymous");
  assert_eq!(body["redirect"], "/login");

  let (status, body) = call(&app, Method::GET, "/notifications", None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["redirect"], "/login");
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_follow_request_lifecycle() {
  let app = app().await;

  let actor = sign_up(&app, "mara@example.com").await;
  let actor_uid = actor["session"]["identity"]["uid"].as_str().unwrap().to_owned();
  select_role(&app, "actor").await;
  call(&app, Method::POST, "/auth/sign-out", None).await;

  sign_up(&app, "ines@example.com").await;
  select_role(&app, "filmmaker").await;
  let (status, request) = call(&app, Method::POST, "/requests", Some(json!({
    "kind": "casting",
    "to_user": actor_uid,
    "message": "Would you read for the lead?",
    "project": "Night Ferry",
  })))
  .await;
  assert_eq!(status, StatusCode::CREATED, "{request}");
  let request_id = request["id"].as_str().unwrap().to_owned();
  assert_eq!(request["from_name"], "ines");

  // The sender never sees their own outgoing request, nor the recipient's view.
  let body = notifications_until(&app, |_| true).await;
  assert_eq!(body["unread_count"], 0);
  assert_ne!(body["uid"], actor_uid.as_str());
  call(&app, Method::POST, "/auth/sign-out", None).await;

  call(&app, Method::POST, "/auth/sign-in", Some(json!({
    "email": "mara@example.com",
    "password": "correct-horse",
  })))
  .await;
  let body = notifications_until(&app, |b| b["unread_count"] == 1).await;
  assert_eq!(body["uid"], actor_uid.as_str());
  let event = &body["events"][0];
  assert_eq!(event["id"], request_id.as_str());
  assert_eq!(event["title"], "Casting request");
  assert_eq!(event["message"], "ines: Would you read for the lead?");
  assert_eq!(event["link"], format!("/requests/{request_id}"));

  let (status, _) =
    call(&app, Method::POST, &format!("/requests/{request_id}/read"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let body = notifications_until(&app, |b| b["unread_count"] == 0).await;
  assert_eq!(body["events"].as_array().unwrap().len(), 1);
  assert_eq!(body["events"][0]["read"], true);

  let (status, _) = call(
    &app,
    Method::POST,
    &format!("/requests/{request_id}/status"),
    Some(json!({ "status": "accepted" })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  notifications_until(&app, |b| b["events"].as_array().is_some_and(|e| e.is_empty())).await;

  let (status, _) = call(
    &app,
    Method::POST,
    &format!("/requests/{request_id}/status"),
    Some(json!({ "status": "declined" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn only_parties_can_touch_a_request() {
  let app = app().await;

  let actor = sign_up(&app, "mara@example.com").await;
  let actor_uid = actor["session"]["identity"]["uid"].as_str().unwrap().to_owned();
  select_role(&app, "actor").await;
  call(&app, Method::POST, "/auth/sign-out", None).await;

  sign_up(&app, "ines@example.com").await;
  select_role(&app, "filmmaker").await;
  let (_, request) = call(&app, Method::POST, "/requests", Some(json!({
    "kind": "collaboration",
    "to_user": actor_uid,
  })))
  .await;
  let request_id = request["id"].as_str().unwrap().to_owned();

  // The sender cannot answer on the recipient's behalf.
  let (status, _) =
    call(&app, Method::POST, &format!("/requests/{request_id}/read"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  // But may withdraw it.
  let (status, _) =
    call(&app, Method::DELETE, &format!("/requests/{request_id}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) =
    call(&app, Method::DELETE, &format!("/requests/{request_id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn requests_need_a_completed_role() {
  let app = app().await;
  sign_up(&app, "mara@example.com").await;

  let (status, body) = call(&app, Method::POST, "/requests", Some(json!({
    "kind": "booking",
    "to_user": "venue-1",
  })))
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["redirect"], "/role-select");
}
