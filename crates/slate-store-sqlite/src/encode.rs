//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Enums are stored as their
//! lowercase wire names.

use chrono::{DateTime, Utc};
use slate_core::{
  identity::Identity,
  profile::{ProfileDocument, Role},
  request::{RequestDocument, RequestKind, RequestStatus},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_role(s: &str) -> Result<Role> { Ok(s.parse()?) }

pub fn decode_kind(s: &str) -> Result<RequestKind> { Ok(s.parse()?) }

pub fn decode_status(s: &str) -> Result<RequestStatus> { Ok(s.parse()?) }

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub role:         Option<String>,
  pub display_name: Option<String>,
  pub photo_url:    Option<String>,
  pub bio:          Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

pub const PROFILE_COLUMNS: &str =
  "role, display_name, photo_url, bio, created_at, updated_at";

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      role:         row.get(0)?,
      display_name: row.get(1)?,
      photo_url:    row.get(2)?,
      bio:          row.get(3)?,
      created_at:   row.get(4)?,
      updated_at:   row.get(5)?,
    })
  }

  pub fn into_document(self) -> Result<ProfileDocument> {
    Ok(ProfileDocument {
      role:         self.role.as_deref().map(decode_role).transpose()?,
      display_name: self.display_name,
      photo_url:    self.photo_url,
      bio:          self.bio,
      created_at:   Some(decode_dt(&self.created_at)?),
      updated_at:   Some(decode_dt(&self.updated_at)?),
    })
  }
}

/// Raw strings read directly from a `requests` row.
pub struct RawRequest {
  pub request_id: String,
  pub kind:       String,
  pub from_user:  String,
  pub from_name:  String,
  pub to_user:    String,
  pub status:     String,
  pub message:    String,
  pub project:    Option<String>,
  pub is_read:    bool,
  pub created_at: String,
}

pub const REQUEST_COLUMNS: &str = "request_id, kind, from_user, from_name, to_user, \
                                   status, message, project, is_read, created_at";

impl RawRequest {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id: row.get(0)?,
      kind:       row.get(1)?,
      from_user:  row.get(2)?,
      from_name:  row.get(3)?,
      to_user:    row.get(4)?,
      status:     row.get(5)?,
      message:    row.get(6)?,
      project:    row.get(7)?,
      is_read:    row.get(8)?,
      created_at: row.get(9)?,
    })
  }

  pub fn into_document(self) -> Result<RequestDocument> {
    Ok(RequestDocument {
      id:         self.request_id,
      kind:       decode_kind(&self.kind)?,
      from_user:  self.from_user,
      from_name:  self.from_name,
      to_user:    self.to_user,
      status:     decode_status(&self.status)?,
      message:    self.message,
      project:    self.project,
      read:       self.is_read,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub uid:           String,
  pub email:         String,
  pub display_name:  Option<String>,
  pub photo_url:     Option<String>,
  pub password_hash: String,
}

pub const ACCOUNT_COLUMNS: &str = "uid, email, display_name, photo_url, password_hash";

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      uid:           row.get(0)?,
      email:         row.get(1)?,
      display_name:  row.get(2)?,
      photo_url:     row.get(3)?,
      password_hash: row.get(4)?,
    })
  }

  pub fn identity(&self) -> Identity {
    Identity {
      uid:          self.uid.clone(),
      email:        Some(self.email.clone()),
      display_name: self.display_name.clone(),
      photo_url:    self.photo_url.clone(),
      is_anonymous: false,
    }
  }
}
