//! Profile: the application record that extends an identity with a role.
//!
//! A profile whose role is absent is *incomplete*: the role gate sends its
//! owner to role selection before any role-scoped surface is reachable.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, identity::Identity};

// ─── Role ────────────────────────────────────────────────────────────────────

/// The community role a user picks during role selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Filmmaker,
  Actor,
  Viewer,
  Venue,
}

impl Role {
  pub const ALL: [Role; 4] =
    [Role::Filmmaker, Role::Actor, Role::Viewer, Role::Venue];

  pub fn as_str(self) -> &'static str {
    match self {
      Role::Filmmaker => "filmmaker",
      Role::Actor => "actor",
      Role::Viewer => "viewer",
      Role::Venue => "venue",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Role::ALL
      .into_iter()
      .find(|r| r.as_str() == s)
      .ok_or_else(|| Error::UnknownRole(s.to_owned()))
  }
}

// ─── Stored document ─────────────────────────────────────────────────────────

/// The profile document as persisted by the profile store.
///
/// Every field is optional: documents written by older clients may lack any
/// of them, and the merge with identity defaults fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDocument {
  pub role:         Option<Role>,
  pub display_name: Option<String>,
  pub photo_url:    Option<String>,
  pub bio:          Option<String>,
  pub created_at:   Option<DateTime<Utc>>,
  pub updated_at:   Option<DateTime<Utc>>,
}

/// Display metadata written alongside a role by the role-selection flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMetadata {
  pub display_name: Option<String>,
  pub photo_url:    Option<String>,
  pub bio:          Option<String>,
}

// ─── Merged view ─────────────────────────────────────────────────────────────

/// The consumer-facing profile: identity defaults overlaid with stored fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub uid:          String,
  pub email:        Option<String>,
  pub display_name: Option<String>,
  pub photo_url:    Option<String>,
  pub role:         Option<Role>,
  pub bio:          Option<String>,
  pub created_at:   Option<DateTime<Utc>>,
  pub updated_at:   Option<DateTime<Utc>>,
}

impl Profile {
  /// The profile used when no document exists or the read failed.
  pub fn fallback(identity: &Identity) -> Self {
    Self {
      uid:          identity.uid.clone(),
      email:        identity.email.clone(),
      display_name: identity.display_name.clone(),
      photo_url:    identity.photo_url.clone(),
      role:         None,
      bio:          None,
      created_at:   None,
      updated_at:   None,
    }
  }

  /// Overlay a stored document on the identity defaults. Stored fields win
  /// when present.
  pub fn merge(identity: &Identity, stored: Option<ProfileDocument>) -> Self {
    let base = Self::fallback(identity);
    let Some(doc) = stored else { return base };

    Self {
      display_name: doc.display_name.or(base.display_name),
      photo_url: doc.photo_url.or(base.photo_url),
      role: doc.role,
      bio: doc.bio,
      created_at: doc.created_at,
      updated_at: doc.updated_at,
      ..base
    }
  }

  /// `true` until the user has completed role selection.
  pub fn is_incomplete(&self) -> bool { self.role.is_none() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn identity() -> Identity {
    Identity {
      uid:          "u1".into(),
      email:        Some("mara@example.com".into()),
      display_name: Some("Mara".into()),
      photo_url:    Some("https://cdn.example.com/mara.png".into()),
      is_anonymous: false,
    }
  }

  #[test]
  fn merge_without_document_is_incomplete() {
    let p = Profile::merge(&identity(), None);
    assert!(p.is_incomplete());
    assert_eq!(p.display_name.as_deref(), Some("Mara"));
    assert!(p.created_at.is_none());
  }

  #[test]
  fn stored_fields_override_identity_defaults() {
    let doc = ProfileDocument {
      role: Some(Role::Venue),
      display_name: Some("The Roxie".into()),
      ..Default::default()
    };
    let p = Profile::merge(&identity(), Some(doc));
    assert_eq!(p.role, Some(Role::Venue));
    assert_eq!(p.display_name.as_deref(), Some("The Roxie"));
    // Absent stored photo keeps the identity's.
    assert_eq!(
      p.photo_url.as_deref(),
      Some("https://cdn.example.com/mara.png")
    );
    assert_eq!(p.email.as_deref(), Some("mara@example.com"));
  }

  #[test]
  fn role_parses_from_wire_names() {
    for role in Role::ALL {
      assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
    }
    assert!(matches!(
      "director".parse::<Role>(),
      Err(Error::UnknownRole(s)) if s == "director"
    ));
  }
}
