//! The role gate and its redirect policy table.
//!
//! Every protected surface calls into [`evaluate`] (directly, or through
//! [`evaluate_path`]) instead of carrying its own redirect logic. Both are
//! pure: the same session and requirement always give the same decision.

use serde::Serialize;

use crate::{
  profile::Role,
  session::{Session, SessionStatus},
};

pub const LOGIN_PATH: &str = "/login";
pub const ROLE_SELECT_PATH: &str = "/role-select";

/// What a protected surface should do for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
  /// Render a loading state. Never treat as allow.
  Wait,
  Redirect { to: &'static str },
  Allow,
}

// ─── Redirect policy ─────────────────────────────────────────────────────────

/// Where a user with `role` lands after sign-in, role selection, or a
/// rejected visit to another role's surface.
pub fn role_home_path(role: Role) -> &'static str {
  match role {
    Role::Actor => "/actors/me/view",
    Role::Filmmaker => "/filmmakers/me/view",
    Role::Venue => "/venues/me",
    Role::Viewer => "/",
  }
}

// ─── Gate ────────────────────────────────────────────────────────────────────

/// Decide whether a surface requiring `required` (or any completed role, when
/// `None`) may render for `session`.
pub fn evaluate(session: &Session, required: Option<Role>) -> GateDecision {
  match session.status {
    SessionStatus::Loading => GateDecision::Wait,
    SessionStatus::Unauthenticated | SessionStatus::Anonymous => {
      GateDecision::Redirect { to: LOGIN_PATH }
    }
    SessionStatus::Authenticated => match (session.role(), required) {
      (None, _) => GateDecision::Redirect { to: ROLE_SELECT_PATH },
      (Some(have), Some(want)) if have != want => {
        GateDecision::Redirect { to: role_home_path(have) }
      }
      _ => GateDecision::Allow,
    },
  }
}

/// The role-selection surface: reachable only by signed-in users who have not
/// picked a role yet.
pub fn evaluate_role_select(session: &Session) -> GateDecision {
  match session.status {
    SessionStatus::Loading => GateDecision::Wait,
    SessionStatus::Unauthenticated | SessionStatus::Anonymous => {
      GateDecision::Redirect { to: LOGIN_PATH }
    }
    SessionStatus::Authenticated => match session.role() {
      Some(role) => GateDecision::Redirect { to: role_home_path(role) },
      None => GateDecision::Allow,
    },
  }
}

/// Where to send a user right after sign-in, sign-up, or role selection.
/// `None` while the session is still loading.
pub fn landing_path(session: &Session) -> Option<&'static str> {
  match evaluate(session, None) {
    GateDecision::Wait => None,
    GateDecision::Redirect { to } => Some(to),
    GateDecision::Allow => session.role().map(role_home_path),
  }
}

// ─── Surfaces ────────────────────────────────────────────────────────────────

/// The access class of a navigable path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
  Public,
  RoleSelect,
  /// Any signed-in user with a completed role.
  SignedIn,
  Role(Role),
}

const ROLE_PREFIXES: [(&str, Role); 3] = [
  ("/actors/me", Role::Actor),
  ("/filmmakers/me", Role::Filmmaker),
  ("/venues/me", Role::Venue),
];

const SIGNED_IN_PREFIXES: [&str; 2] = ["/notifications", "/requests"];

fn under(path: &str, prefix: &str) -> bool {
  path
    .strip_prefix(prefix)
    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

impl Surface {
  /// Classify `path`. Query strings and trailing slashes are ignored.
  pub fn resolve(path: &str) -> Self {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = match path.trim_end_matches('/') {
      "" => "/",
      p => p,
    };

    if path == ROLE_SELECT_PATH {
      return Surface::RoleSelect;
    }
    if let Some((_, role)) =
      ROLE_PREFIXES.iter().find(|(prefix, _)| under(path, prefix))
    {
      return Surface::Role(*role);
    }
    if SIGNED_IN_PREFIXES.iter().any(|prefix| under(path, prefix)) {
      return Surface::SignedIn;
    }
    Surface::Public
  }
}

/// Gate decision for navigating to `path`.
pub fn evaluate_path(session: &Session, path: &str) -> GateDecision {
  match Surface::resolve(path) {
    Surface::Public => GateDecision::Allow,
    Surface::RoleSelect => evaluate_role_select(session),
    Surface::SignedIn => evaluate(session, None),
    Surface::Role(role) => evaluate(session, Some(role)),
  }
}
