//! The identity record owned by the external identity provider.
//!
//! The core never creates or destroys identities; it only observes the
//! signed-out → signed-in → signed-out transitions.

use serde::{Deserialize, Serialize};

/// A signed-in principal as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub uid:          String,
  pub email:        Option<String>,
  pub display_name: Option<String>,
  pub photo_url:    Option<String>,
  /// Guest sessions carry an identity but never a profile.
  #[serde(default)]
  pub is_anonymous: bool,
}

/// Email/password pair for [`IdentityProvider::sign_in`](crate::provider::IdentityProvider::sign_in).
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

/// Input for [`IdentityProvider::sign_up`](crate::provider::IdentityProvider::sign_up).
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
  pub email:        String,
  pub password:     String,
  pub display_name: Option<String>,
}
