//! The pure reconciliation state machine behind [`SessionStore`](crate::SessionStore).
//!
//! Every identity event and every refresh bumps a generation counter. A
//! profile read is tagged with the generation that started it and is applied
//! only if that generation is still the pending one; anything older is
//! discarded.

use slate_core::{
  error::ProfileFetchError,
  identity::Identity,
  profile::{Profile, ProfileDocument},
  session::{Session, SessionStatus},
};

/// A profile read the caller must perform, tagged with its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
  pub generation: u64,
  pub identity:   Identity,
}

#[derive(Debug)]
pub struct Reconciler {
  session:    Session,
  generation: u64,
  /// Generation of the outstanding profile read, if any.
  pending:    Option<u64>,
}

impl Reconciler {
  pub fn new() -> Self {
    Self { session: Session::initial(), generation: 0, pending: None }
  }

  pub fn session(&self) -> &Session { &self.session }

  pub fn generation(&self) -> u64 { self.generation }

  pub fn is_fetching(&self) -> bool { self.pending.is_some() }

  /// Apply an identity-provider event. Any outstanding read becomes stale.
  pub fn on_identity(&mut self, identity: Option<Identity>) -> Option<FetchTicket> {
    self.generation += 1;
    self.pending = None;

    match identity {
      None => {
        self.session = Session::unauthenticated();
        None
      }
      Some(identity) if identity.is_anonymous => {
        self.session = Session::anonymous(identity);
        None
      }
      Some(identity) => {
        self.session = Session::loading(Some(identity.clone()));
        self.pending = Some(self.generation);
        Some(FetchTicket { generation: self.generation, identity })
      }
    }
  }

  /// Re-read the profile of the current identity.
  ///
  /// An authenticated session keeps its status while the read is outstanding
  /// so consumers do not flash a loading state. Returns `None` when there is
  /// no signed-in, non-anonymous identity.
  pub fn refresh(&mut self) -> Option<FetchTicket> {
    let identity = self
      .session
      .identity
      .clone()
      .filter(|identity| !identity.is_anonymous)?;

    self.generation += 1;
    self.pending = Some(self.generation);
    if self.session.status != SessionStatus::Authenticated {
      self.session = Session::loading(Some(identity.clone()));
    }
    Some(FetchTicket { generation: self.generation, identity })
  }

  /// Apply the outcome of a profile read. Returns `false` if the ticket is
  /// stale and the outcome was discarded.
  ///
  /// A failed read resolves to the fallback profile with no role; the
  /// session always leaves `Loading`.
  pub fn on_profile(
    &mut self,
    ticket: &FetchTicket,
    outcome: Result<Option<ProfileDocument>, ProfileFetchError>,
  ) -> bool {
    if self.pending != Some(ticket.generation) {
      tracing::debug!(
        uid = %ticket.identity.uid,
        generation = ticket.generation,
        current = self.generation,
        "discarding stale profile read"
      );
      return false;
    }
    self.pending = None;

    let profile = match outcome {
      Ok(stored) => Profile::merge(&ticket.identity, stored),
      Err(error) => {
        tracing::warn!(%error, "profile read failed; continuing without a role");
        Profile::fallback(&ticket.identity)
      }
    };
    self.session = Session::authenticated(ticket.identity.clone(), profile);
    true
  }
}

impl Default for Reconciler {
  fn default() -> Self { Self::new() }
}
