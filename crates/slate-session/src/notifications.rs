//! [`NotificationStream`]: a live view of pending requests for the signed-in
//! user.

use std::sync::Arc;

use slate_core::{
  error::SubscriptionError,
  notification::NotificationView,
  provider::{LiveQuery, RequestFeed},
  request::RequestDocument,
  session::Session,
};
use tokio::{sync::watch, task::JoinHandle};

/// Follows the session's identity and keeps one live query open for it.
///
/// Switching identity drops the previous query before opening the next one,
/// and the view is cleared so nothing from the previous user remains.
/// Feed errors are logged and the last good view is kept.
pub struct NotificationStream {
  state: watch::Receiver<NotificationView>,
  task:  JoinHandle<()>,
}

impl NotificationStream {
  pub fn spawn<F>(sessions: watch::Receiver<Session>, feed: Arc<F>) -> Self
  where
    F: RequestFeed + 'static,
  {
    let (publish, state) = watch::channel(NotificationView::empty());
    let driver = Driver { feed, sessions, publish, owner: None, active: None };
    Self { state, task: tokio::spawn(driver.run()) }
  }

  pub fn current(&self) -> NotificationView { self.state.borrow().clone() }

  pub fn subscribe(&self) -> watch::Receiver<NotificationView> {
    self.state.clone()
  }

  /// Stop following the session and close the live query.
  pub async fn shutdown(mut self) {
    self.task.abort();
    let _ = (&mut self.task).await;
  }
}

impl Drop for NotificationStream {
  fn drop(&mut self) { self.task.abort(); }
}

// ─── Driver ──────────────────────────────────────────────────────────────────

struct Subscription<E> {
  uid:   String,
  query: LiveQuery<E>,
}

struct Driver<F: RequestFeed> {
  feed:     Arc<F>,
  sessions: watch::Receiver<Session>,
  publish:  watch::Sender<NotificationView>,
  /// The user the published view belongs to. Outlives `active` when a feed
  /// closes, so the last good view survives until the identity changes.
  owner:    Option<String>,
  active:   Option<Subscription<F::Error>>,
}

impl<F: RequestFeed + 'static> Driver<F> {
  async fn run(mut self) {
    let uid = subscriber_uid(&self.sessions.borrow_and_update());
    self.follow(uid);

    loop {
      tokio::select! {
        changed = self.sessions.changed() => {
          if changed.is_err() {
            tracing::debug!("session store closed; notification stream stopping");
            break;
          }
          let uid = subscriber_uid(&self.sessions.borrow_and_update());
          self.follow(uid);
        }
        snapshot = next_snapshot(&mut self.active) => self.on_snapshot(snapshot),
      }
    }
  }

  /// Make sure exactly the query for `uid` is open.
  ///
  /// The view is cleared only when the identity changes. A closed feed for
  /// the same identity is reopened behind the view it last delivered.
  fn follow(&mut self, uid: Option<String>) {
    let same_owner = self.owner == uid;
    if same_owner && self.active.is_some() {
      return;
    }

    if let Some(previous) = self.active.take() {
      tracing::info!(uid = %previous.uid, "closing request feed");
    }
    if !same_owner {
      self.replace(NotificationView::empty_for(uid.as_deref()));
      self.owner = uid.clone();
    }

    let Some(uid) = uid else { return };
    match self.feed.subscribe_pending(&uid) {
      Ok(query) => {
        tracing::info!(%uid, "opened request feed");
        self.active = Some(Subscription { uid, query });
      }
      Err(source) => {
        let error = SubscriptionError::Open { uid, source: Box::new(source) };
        tracing::warn!(%error, "notifications unavailable");
      }
    }
  }

  fn on_snapshot(&mut self, snapshot: Option<Result<Vec<RequestDocument>, F::Error>>) {
    let Some(active) = &self.active else { return };
    let uid = active.uid.clone();

    match snapshot {
      Some(Ok(documents)) => {
        let view = NotificationView::from_snapshot(&uid, &documents);
        tracing::debug!(%uid, events = view.events.len(), unread = view.unread_count, "notification snapshot");
        self.replace(view);
      }
      Some(Err(source)) => {
        let error = SubscriptionError::Snapshot { uid, source: Box::new(source) };
        tracing::warn!(%error, "keeping last notification view");
      }
      None => {
        let error = SubscriptionError::Closed { uid };
        tracing::warn!(%error, "keeping last notification view");
        self.active = None;
      }
    }
  }

  fn replace(&self, view: NotificationView) {
    self.publish.send_if_modified(|current| {
      if *current == view {
        return false;
      }
      *current = view;
      true
    });
  }
}

/// The user whose requests should be followed: any signed-in, non-anonymous
/// identity, including one whose profile is still loading.
fn subscriber_uid(session: &Session) -> Option<String> {
  session
    .identity
    .as_ref()
    .filter(|identity| !identity.is_anonymous)
    .map(|identity| identity.uid.clone())
}

async fn next_snapshot<E>(
  active: &mut Option<Subscription<E>>,
) -> Option<Result<Vec<RequestDocument>, E>> {
  match active {
    Some(subscription) => subscription.query.recv().await,
    None => std::future::pending().await,
  }
}
