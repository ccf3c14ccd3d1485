//! SQLite backend for the Slate session core.
//!
//! Implements every collaborator contract from `slate-core` on one local
//! database file: profiles, request documents with a live query, and a
//! password-based identity provider. Wraps [`tokio_rusqlite`] so all database
//! access runs on a dedicated thread without blocking the async runtime.

mod encode;
mod identity;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use identity::LocalIdentity;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
