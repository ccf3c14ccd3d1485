//! Request documents: inbound asks (casting, collaboration, booking) between
//! community members.
//!
//! The notification stream only ever reads these. Every write is owned by a
//! collaborator (the sender, or the recipient responding).

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
  /// A filmmaker inviting an actor to a role.
  Casting,
  Collaboration,
  /// A screening request sent to a venue.
  Booking,
  Other,
}

impl RequestKind {
  pub fn as_str(self) -> &'static str {
    match self {
      RequestKind::Casting => "casting",
      RequestKind::Collaboration => "collaboration",
      RequestKind::Booking => "booking",
      RequestKind::Other => "other",
    }
  }
}

impl FromStr for RequestKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "casting" => Ok(RequestKind::Casting),
      "collaboration" => Ok(RequestKind::Collaboration),
      "booking" => Ok(RequestKind::Booking),
      "other" => Ok(RequestKind::Other),
      other => Err(Error::UnknownRequestKind(other.to_owned())),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
  Pending,
  Accepted,
  Declined,
}

impl RequestStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      RequestStatus::Pending => "pending",
      RequestStatus::Accepted => "accepted",
      RequestStatus::Declined => "declined",
    }
  }
}

impl fmt::Display for RequestStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for RequestStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(RequestStatus::Pending),
      "accepted" => Ok(RequestStatus::Accepted),
      "declined" => Ok(RequestStatus::Declined),
      other => Err(Error::UnknownRequestStatus(other.to_owned())),
    }
  }
}

/// A request document as returned by the live query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDocument {
  pub id:         String,
  pub kind:       RequestKind,
  pub from_user:  String,
  pub from_name:  String,
  pub to_user:    String,
  pub status:     RequestStatus,
  pub message:    String,
  pub project:    Option<String>,
  pub read:       bool,
  pub created_at: DateTime<Utc>,
}

/// Input for [`RequestStore::create_request`](crate::provider::RequestStore::create_request).
#[derive(Debug, Clone, Deserialize)]
pub struct NewRequest {
  pub kind:      RequestKind,
  pub from_user: String,
  pub from_name: String,
  pub to_user:   String,
  #[serde(default)]
  pub message:   String,
  #[serde(default)]
  pub project:   Option<String>,
}
