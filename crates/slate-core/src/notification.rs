//! Notifications: a read-oriented projection of pending inbound requests.
//!
//! The view is rebuilt from every snapshot of the live query; it is never
//! patched in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::request::{RequestDocument, RequestKind, RequestStatus};

/// One pending request addressed to the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
  pub id:         String,
  pub kind:       RequestKind,
  pub title:      String,
  pub message:    String,
  pub link:       String,
  pub read:       bool,
  pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
  pub fn from_request(doc: &RequestDocument) -> Self {
    let title = match doc.kind {
      RequestKind::Casting => "Casting request",
      RequestKind::Collaboration => "Collaboration request",
      RequestKind::Booking => "Booking request",
      RequestKind::Other => "New request",
    };
    let message = if doc.message.trim().is_empty() {
      format!("{} sent you a request", doc.from_name)
    } else {
      format!("{}: {}", doc.from_name, doc.message)
    };

    Self {
      id: doc.id.clone(),
      kind: doc.kind,
      title: title.to_owned(),
      message,
      link: format!("/requests/{}", doc.id),
      read: doc.read,
      created_at: doc.created_at,
    }
  }
}

/// The ordered notification set and its unread aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationView {
  /// The user this view was built for; `None` when nobody is signed in.
  #[serde(default)]
  pub uid:          Option<String>,
  /// Newest first; ties broken by id ascending.
  pub events:       Vec<NotificationEvent>,
  pub unread_count: usize,
}

impl NotificationView {
  pub fn empty() -> Self { Self::default() }

  /// An empty view owned by `uid`, published before its first snapshot.
  pub fn empty_for(uid: Option<&str>) -> Self {
    Self { uid: uid.map(str::to_owned), ..Self::default() }
  }

  /// `true` if this view was built for `uid`.
  pub fn belongs_to(&self, uid: Option<&str>) -> bool { self.uid.as_deref() == uid }

  /// Rebuild the view from a full snapshot.
  ///
  /// Documents not addressed to `uid`, or no longer pending, are dropped even
  /// if the feed delivered them.
  pub fn from_snapshot(uid: &str, snapshot: &[RequestDocument]) -> Self {
    let mut events: Vec<NotificationEvent> = snapshot
      .iter()
      .filter(|d| d.to_user == uid && d.status == RequestStatus::Pending)
      .map(NotificationEvent::from_request)
      .collect();

    events.sort_by(|a, b| {
      b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
    });

    let unread_count = events.iter().filter(|e| !e.read).count();
    Self { uid: Some(uid.to_owned()), events, unread_count }
  }
}
