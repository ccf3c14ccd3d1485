//! Session: the reconciled view of identity, profile, and loading status.
//!
//! Never stored. The session store derives one from identity events and
//! profile reads and republishes it to every consumer.

use serde::{Deserialize, Serialize};

use crate::{
  identity::Identity,
  profile::{Profile, Role},
};

/// Where the reconciliation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
  /// No identity event yet, or a profile read is outstanding.
  Loading,
  Unauthenticated,
  Authenticated,
  /// A guest identity with no profile.
  Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub identity: Option<Identity>,
  pub profile:  Option<Profile>,
  pub status:   SessionStatus,
}

impl Session {
  /// The state before the identity provider has reported anything.
  pub fn initial() -> Self { Self::loading(None) }

  pub fn loading(identity: Option<Identity>) -> Self {
    Self { identity, profile: None, status: SessionStatus::Loading }
  }

  pub fn unauthenticated() -> Self {
    Self {
      identity: None,
      profile:  None,
      status:   SessionStatus::Unauthenticated,
    }
  }

  pub fn anonymous(identity: Identity) -> Self {
    Self {
      identity: Some(identity),
      profile:  None,
      status:   SessionStatus::Anonymous,
    }
  }

  pub fn authenticated(identity: Identity, profile: Profile) -> Self {
    Self {
      identity: Some(identity),
      profile:  Some(profile),
      status:   SessionStatus::Authenticated,
    }
  }

  pub fn is_loading(&self) -> bool { self.status == SessionStatus::Loading }

  pub fn uid(&self) -> Option<&str> {
    self.identity.as_ref().map(|i| i.uid.as_str())
  }

  /// The profile role, if the session is authenticated and role selection is
  /// complete.
  pub fn role(&self) -> Option<Role> {
    self.profile.as_ref().and_then(|p| p.role)
  }
}

impl Default for Session {
  fn default() -> Self { Self::initial() }
}
