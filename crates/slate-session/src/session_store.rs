//! [`SessionStore`], the single writer of the reconciled [`Session`].

use std::{sync::Arc, time::Duration};

use slate_core::{
  error::ProfileFetchError,
  identity::Identity,
  profile::ProfileDocument,
  provider::{IdentityProvider, ProfileStore},
  session::Session,
};
use tokio::{
  sync::{mpsc, oneshot, watch},
  task::JoinHandle,
};

use crate::{
  Error, Result,
  reconcile::{FetchTicket, Reconciler},
};

/// Tuning for [`SessionStore`].
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
  /// Give up on a profile read after this long and continue with the
  /// fallback profile. `None` waits indefinitely.
  pub profile_fetch_timeout: Option<Duration>,
}

type FetchOutcome = (FetchTicket, Result<Option<ProfileDocument>, ProfileFetchError>);

enum Command {
  Refresh(oneshot::Sender<Result<Session>>),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Owns the reconciled session and republishes it to every subscriber.
///
/// A driver task follows the identity provider and performs profile reads.
/// Dropping the store (or calling [`shutdown`](Self::shutdown)) stops the
/// task and any outstanding read.
pub struct SessionStore {
  state:    watch::Receiver<Session>,
  commands: mpsc::Sender<Command>,
  task:     JoinHandle<()>,
}

impl SessionStore {
  /// Start reconciling `identity` events against `profiles`.
  ///
  /// The store starts in `Loading` and takes the provider's current identity
  /// as its first event.
  pub fn spawn<I, P>(identity: &I, profiles: Arc<P>, options: SessionOptions) -> Self
  where
    I: IdentityProvider + ?Sized,
    P: ProfileStore + 'static,
  {
    let (publish, state) = watch::channel(Session::initial());
    let (commands, command_rx) = mpsc::channel(16);
    let (outcomes, outcome_rx) = mpsc::unbounded_channel();

    let driver = Driver {
      profiles,
      options,
      reconciler: Reconciler::new(),
      identities: identity.subscribe(),
      commands: command_rx,
      publish,
      outcomes,
      outcome_rx,
      in_flight: None,
      waiters: Vec::new(),
    };

    Self { state, commands, task: tokio::spawn(driver.run()) }
  }

  /// A snapshot of the current session.
  pub fn current(&self) -> Session { self.state.borrow().clone() }

  /// Observe every published session.
  pub fn subscribe(&self) -> watch::Receiver<Session> { self.state.clone() }

  /// Wait until the session has left `Loading`.
  pub async fn resolved(&self) -> Result<Session> {
    let mut state = self.state.clone();
    let session = state
      .wait_for(|s| !s.is_loading())
      .await
      .map_err(|_| Error::Closed)?;
    Ok(session.clone())
  }

  /// Re-read the current identity's profile and return the session once the
  /// result has been applied.
  ///
  /// Used by the role-selection flow right after it writes a profile, so the
  /// next navigation already sees the new role.
  pub async fn refresh(&self) -> Result<Session> {
    let (reply, response) = oneshot::channel();
    self
      .commands
      .send(Command::Refresh(reply))
      .await
      .map_err(|_| Error::Closed)?;
    response.await.map_err(|_| Error::Closed)?
  }

  /// Stop the driver task and wait for it to finish.
  pub async fn shutdown(mut self) {
    self.task.abort();
    let _ = (&mut self.task).await;
  }
}

impl Drop for SessionStore {
  fn drop(&mut self) { self.task.abort(); }
}

// ─── Driver ──────────────────────────────────────────────────────────────────

struct Driver<P> {
  profiles:   Arc<P>,
  options:    SessionOptions,
  reconciler: Reconciler,
  identities: watch::Receiver<Option<Identity>>,
  commands:   mpsc::Receiver<Command>,
  publish:    watch::Sender<Session>,
  outcomes:   mpsc::UnboundedSender<FetchOutcome>,
  outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
  in_flight:  Option<JoinHandle<()>>,
  /// Pending refresh callers, keyed by the generation they wait on.
  waiters:    Vec<(u64, oneshot::Sender<Result<Session>>)>,
}

impl<P: ProfileStore + 'static> Driver<P> {
  async fn run(mut self) {
    let first = self.identities.borrow_and_update().clone();
    self.on_identity(first);

    loop {
      tokio::select! {
        changed = self.identities.changed() => {
          if changed.is_err() {
            tracing::debug!("identity provider closed; session store stopping");
            break;
          }
          let next = self.identities.borrow_and_update().clone();
          self.on_identity(next);
        }
        Some((ticket, outcome)) = self.outcome_rx.recv() => {
          self.on_profile(ticket, outcome);
        }
        command = self.commands.recv() => match command {
          Some(Command::Refresh(reply)) => self.on_refresh(reply),
          None => break,
        },
      }
    }

    self.cancel_fetch();
  }

  fn on_identity(&mut self, identity: Option<Identity>) {
    self.cancel_fetch();
    for (_, waiter) in self.waiters.drain(..) {
      let _ = waiter.send(Err(Error::Superseded));
    }

    match &identity {
      Some(i) => tracing::info!(uid = %i.uid, anonymous = i.is_anonymous, "identity signed in"),
      None => tracing::info!("identity signed out"),
    }

    let ticket = self.reconciler.on_identity(identity);
    self.publish();
    if let Some(ticket) = ticket {
      self.start_fetch(ticket);
    }
  }

  fn on_refresh(&mut self, reply: oneshot::Sender<Result<Session>>) {
    let Some(ticket) = self.reconciler.refresh() else {
      let _ = reply.send(Err(Error::NotSignedIn));
      return;
    };
    tracing::debug!(uid = %ticket.identity.uid, generation = ticket.generation, "refreshing profile");

    self.cancel_fetch();
    self.waiters.push((ticket.generation, reply));
    self.publish();
    self.start_fetch(ticket);
  }

  fn on_profile(
    &mut self,
    ticket: FetchTicket,
    outcome: Result<Option<ProfileDocument>, ProfileFetchError>,
  ) {
    if !self.reconciler.on_profile(&ticket, outcome) {
      return;
    }
    self.in_flight = None;
    self.publish();

    let session = self.reconciler.session().clone();
    let (ready, waiting): (Vec<_>, Vec<_>) = self
      .waiters
      .drain(..)
      .partition(|(generation, _)| *generation <= ticket.generation);
    self.waiters = waiting;
    for (_, waiter) in ready {
      let _ = waiter.send(Ok(session.clone()));
    }
  }

  fn start_fetch(&mut self, ticket: FetchTicket) {
    let profiles = Arc::clone(&self.profiles);
    let outcomes = self.outcomes.clone();
    let timeout = self.options.profile_fetch_timeout;

    self.in_flight = Some(tokio::spawn(async move {
      let outcome = fetch_profile(&*profiles, &ticket.identity.uid, timeout).await;
      let _ = outcomes.send((ticket, outcome));
    }));
  }

  fn cancel_fetch(&mut self) {
    if let Some(task) = self.in_flight.take() {
      task.abort();
    }
  }

  fn publish(&self) {
    let next = self.reconciler.session();
    self.publish.send_if_modified(|current| {
      if current == next {
        return false;
      }
      *current = next.clone();
      true
    });
  }
}

/// Read `uid`'s profile, converting store failures and timeouts into
/// [`ProfileFetchError`].
async fn fetch_profile<P: ProfileStore>(
  profiles: &P,
  uid: &str,
  timeout: Option<Duration>,
) -> Result<Option<ProfileDocument>, ProfileFetchError> {
  let read = async {
    profiles
      .get_profile(uid)
      .await
      .map_err(|e| ProfileFetchError::Store { uid: uid.to_owned(), source: Box::new(e) })
  };

  match timeout {
    None => read.await,
    Some(limit) => tokio::time::timeout(limit, read).await.unwrap_or_else(|_| {
      Err(ProfileFetchError::TimedOut {
        uid:      uid.to_owned(),
        after_ms: limit.as_millis(),
      })
    }),
  }
}
