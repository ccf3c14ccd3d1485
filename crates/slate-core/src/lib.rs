//! Core types and trait definitions for the Slate session core.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! defines the reconciled session model, the notification view, the role gate
//! and its redirect policy, and the collaborator contracts the runtime crates
//! drive.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod gate;
pub mod identity;
pub mod notification;
pub mod profile;
pub mod provider;
pub mod request;
pub mod session;

pub use error::{Error, Result};
