//! [`SqliteStore`], the SQLite implementation of the profile and request
//! collaborator traits.

use std::{path::Path, sync::Arc};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use slate_core::{
  profile::{ProfileDocument, ProfileMetadata, Role},
  provider::{LiveQuery, ProfileStore, RequestFeed, RequestStore},
  request::{NewRequest, RequestDocument, RequestStatus},
};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ACCOUNT_COLUMNS, PROFILE_COLUMNS, REQUEST_COLUMNS, RawAccount, RawProfile,
    RawRequest, encode_dt,
  },
  schema::SCHEMA,
};

const DEFAULT_FEED_BUFFER: usize = 16;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Slate store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection and change signal are
/// reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:        tokio_rusqlite::Connection,
  /// Bumped after every request write; live queries re-read on change.
  changes:     Arc<watch::Sender<u64>>,
  feed_buffer: usize,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let store = Self {
      conn,
      changes: Arc::new(watch::channel(0).0),
      feed_buffer: DEFAULT_FEED_BUFFER,
    };
    store
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(store)
  }

  /// Capacity of each live query's snapshot channel.
  pub fn with_feed_buffer(mut self, feed_buffer: usize) -> Self {
    self.feed_buffer = feed_buffer.max(1);
    self
  }

  fn notify_request_change(&self) { self.changes.send_modify(|v| *v += 1); }

  /// All pending requests addressed to `to_user`.
  pub async fn pending_for(&self, to_user: &str) -> Result<Vec<RequestDocument>> {
    let to_user = to_user.to_owned();
    let sql = format!(
      "SELECT {REQUEST_COLUMNS} FROM requests WHERE to_user = ?1 AND status = 'pending'"
    );

    let raws: Vec<RawRequest> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![to_user], RawRequest::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRequest::into_document).collect()
  }

  /// Run a write against one request and wake live queries. `write` returns
  /// the number of affected rows.
  async fn write_request<F>(&self, id: &str, write: F) -> Result<()>
  where
    F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<usize> + Send + 'static,
  {
    let changed = self.conn.call(move |conn| Ok(write(conn)?)).await?;
    if changed == 0 {
      return Err(Error::RequestNotFound(id.to_owned()));
    }
    self.notify_request_change();
    Ok(())
  }

  // ── Accounts (used by LocalIdentity) ──────────────────────────────────────

  pub(crate) async fn find_account(&self, email: &str) -> Result<Option<RawAccount>> {
    let email = email.to_owned();
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1");

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(&sql, rusqlite::params![email], RawAccount::from_row)
              .optional()?,
          )
        })
        .await?,
    )
  }

  /// Fails with [`Error::AccountExists`] if the email is already registered,
  /// including when a concurrent sign-up got there first.
  pub(crate) async fn insert_account(&self, account: RawAccount) -> Result<()> {
    let email = account.email.clone();
    let at_str = encode_dt(Utc::now());
    let inserted = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO accounts (uid, email, display_name, photo_url, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            account.uid,
            account.email,
            account.display_name,
            account.photo_url,
            account.password_hash,
            at_str,
          ],
        );
        match result {
          Ok(_) => Ok(true),
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::AccountExists(email));
    }
    Ok(())
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  async fn get_profile(&self, uid: &str) -> Result<Option<ProfileDocument>> {
    let uid = uid.to_owned();
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE uid = ?1");

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![uid], RawProfile::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_document).transpose()
  }

  async fn set_profile(
    &self,
    uid: &str,
    role: Role,
    metadata: ProfileMetadata,
  ) -> Result<ProfileDocument> {
    let uid = uid.to_owned();
    let role_str = role.as_str();
    let at_str = encode_dt(Utc::now());
    let select = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE uid = ?1");

    let raw: RawProfile = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (uid, role, display_name, photo_url, bio, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
           ON CONFLICT (uid) DO UPDATE SET
             role         = excluded.role,
             display_name = COALESCE(excluded.display_name, profiles.display_name),
             photo_url    = COALESCE(excluded.photo_url, profiles.photo_url),
             bio          = COALESCE(excluded.bio, profiles.bio),
             updated_at   = excluded.updated_at",
          rusqlite::params![
            uid,
            role_str,
            metadata.display_name,
            metadata.photo_url,
            metadata.bio,
            at_str,
          ],
        )?;
        Ok(conn.query_row(&select, rusqlite::params![uid], RawProfile::from_row)?)
      })
      .await?;

    raw.into_document()
  }
}

// ─── RequestStore impl ───────────────────────────────────────────────────────

impl RequestStore for SqliteStore {
  type Error = Error;

  async fn create_request(&self, input: NewRequest) -> Result<RequestDocument> {
    let doc = RequestDocument {
      id:         Uuid::new_v4().hyphenated().to_string(),
      kind:       input.kind,
      from_user:  input.from_user,
      from_name:  input.from_name,
      to_user:    input.to_user,
      status:     RequestStatus::Pending,
      message:    input.message,
      project:    input.project,
      read:       false,
      created_at: Utc::now(),
    };

    let row = doc.clone();
    let at_str = encode_dt(row.created_at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO requests (
             request_id, kind, from_user, from_name, to_user,
             status, message, project, is_read, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?9)",
          rusqlite::params![
            row.id,
            row.kind.as_str(),
            row.from_user,
            row.from_name,
            row.to_user,
            row.status.as_str(),
            row.message,
            row.project,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.notify_request_change();
    Ok(doc)
  }

  async fn get_request(&self, id: &str) -> Result<Option<RequestDocument>> {
    let id = id.to_owned();
    let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE request_id = ?1");

    let raw: Option<RawRequest> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id], RawRequest::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRequest::into_document).transpose()
  }

  async fn mark_read(&self, id: &str) -> Result<()> {
    let id_str = id.to_owned();
    let at_str = encode_dt(Utc::now());
    self
      .write_request(id, move |conn| {
        conn.execute(
          "UPDATE requests SET is_read = 1, updated_at = ?2 WHERE request_id = ?1",
          rusqlite::params![id_str, at_str],
        )
      })
      .await
  }

  async fn set_status(&self, id: &str, status: RequestStatus) -> Result<()> {
    let id_str = id.to_owned();
    let at_str = encode_dt(Utc::now());
    self
      .write_request(id, move |conn| {
        conn.execute(
          "UPDATE requests SET status = ?2, updated_at = ?3 WHERE request_id = ?1",
          rusqlite::params![id_str, status.as_str(), at_str],
        )
      })
      .await
  }

  async fn delete_request(&self, id: &str) -> Result<()> {
    let id_str = id.to_owned();
    self
      .write_request(id, move |conn| {
        conn.execute(
          "DELETE FROM requests WHERE request_id = ?1",
          rusqlite::params![id_str],
        )
      })
      .await
  }
}

// ─── RequestFeed impl ────────────────────────────────────────────────────────

impl RequestFeed for SqliteStore {
  type Error = Error;

  /// Spawns a reader task that re-queries after every request write. The task
  /// ends as soon as the returned receiver is dropped.
  fn subscribe_pending(&self, to_user: &str) -> Result<LiveQuery<Error>> {
    let (tx, rx) = mpsc::channel(self.feed_buffer);
    let mut changes = self.changes.subscribe();
    let store = self.clone();
    let uid = to_user.to_owned();

    tokio::spawn(async move {
      loop {
        let _ = changes.borrow_and_update();
        let snapshot = store.pending_for(&uid).await;
        if tx.send(snapshot).await.is_err() {
          break;
        }
        tokio::select! {
          changed = changes.changed() => {
            if changed.is_err() {
              break;
            }
          }
          _ = tx.closed() => break,
        }
      }
      tracing::debug!(%uid, "request feed reader stopped");
    });

    Ok(rx)
  }
}
