//! Session & notification synchronisation runtime for Slate.
//!
//! Two explicitly owned stores live here:
//!
//! - [`SessionStore`] reconciles identity-provider events with profile reads
//!   into one [`Session`](slate_core::session::Session) and republishes it.
//! - [`NotificationStream`] follows the session's identity and keeps a live,
//!   ordered view of pending inbound requests.
//!
//! Each store runs a single driver task, so all mutation of its state happens
//! on one logical thread. Consumers only ever see cloned snapshots through
//! `tokio::sync::watch`.

mod notifications;
mod reconcile;
mod session_store;

pub mod error;

pub use error::{Error, Result};
pub use notifications::NotificationStream;
pub use reconcile::{FetchTicket, Reconciler};
pub use session_store::{SessionOptions, SessionStore};
