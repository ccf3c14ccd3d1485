//! [`LocalIdentity`]: an email/password identity provider over the
//! `accounts` table.
//!
//! Passwords are stored as argon2 PHC strings. The signed-in identity lives
//! in memory only; a restart starts signed out.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;
use slate_core::{
  error::IdentityError,
  identity::{Credentials, Identity, Registration},
  provider::IdentityProvider,
};
use tokio::sync::watch;
use uuid::Uuid;

use crate::{Error, SqliteStore, encode::RawAccount};

pub const MIN_PASSWORD_LEN: usize = 8;

pub struct LocalIdentity {
  store:   SqliteStore,
  current: watch::Sender<Option<Identity>>,
}

impl LocalIdentity {
  /// A provider over `store`'s accounts, initially signed out.
  pub fn new(store: SqliteStore) -> Self {
    Self { store, current: watch::channel(None).0 }
  }

  /// The identity currently signed in, if any.
  pub fn current(&self) -> Option<Identity> { self.current.borrow().clone() }
}

fn normalize_email(email: &str) -> Result<String, IdentityError> {
  let email = email.trim().to_lowercase();
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
    _ => Err(IdentityError::InvalidEmail(email)),
  }
}

fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

impl IdentityProvider for LocalIdentity {
  fn subscribe(&self) -> watch::Receiver<Option<Identity>> { self.current.subscribe() }

  async fn sign_in(&self, credentials: Credentials) -> Result<Identity, IdentityError> {
    let email = normalize_email(&credentials.email)?;
    let account = self
      .store
      .find_account(&email)
      .await
      .map_err(IdentityError::backend)?
      .ok_or(IdentityError::InvalidCredentials)?;

    if !verify_password(&credentials.password, &account.password_hash) {
      tracing::info!(%email, "rejected sign-in");
      return Err(IdentityError::InvalidCredentials);
    }

    let identity = account.identity();
    tracing::info!(uid = %identity.uid, "signed in");
    self.current.send_replace(Some(identity.clone()));
    Ok(identity)
  }

  async fn sign_up(&self, registration: Registration) -> Result<Identity, IdentityError> {
    let email = normalize_email(&registration.email)?;
    if registration.password.chars().count() < MIN_PASSWORD_LEN {
      return Err(IdentityError::WeakPassword { min: MIN_PASSWORD_LEN });
    }
    if self
      .store
      .find_account(&email)
      .await
      .map_err(IdentityError::backend)?
      .is_some()
    {
      return Err(IdentityError::EmailTaken(email));
    }

    let account = RawAccount {
      uid: Uuid::new_v4().hyphenated().to_string(),
      email,
      display_name: registration
        .display_name
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty()),
      photo_url: None,
      password_hash: hash_password(&registration.password)
        .map_err(IdentityError::backend)?,
    };
    let identity = account.identity();
    self.store.insert_account(account).await.map_err(|e| match e {
      Error::AccountExists(email) => IdentityError::EmailTaken(email),
      e => IdentityError::backend(e),
    })?;

    tracing::info!(uid = %identity.uid, "account created");
    self.current.send_replace(Some(identity.clone()));
    Ok(identity)
  }

  async fn sign_in_anonymously(&self) -> Result<Identity, IdentityError> {
    let identity = Identity {
      uid:          Uuid::new_v4().hyphenated().to_string(),
      email:        None,
      display_name: None,
      photo_url:    None,
      is_anonymous: true,
    };
    tracing::info!(uid = %identity.uid, "anonymous sign-in");
    self.current.send_replace(Some(identity.clone()));
    Ok(identity)
  }

  async fn sign_out(&self) -> Result<(), IdentityError> {
    if let Some(previous) = self.current.send_replace(None) {
      tracing::info!(uid = %previous.uid, "signed out");
    }
    Ok(())
  }
}
