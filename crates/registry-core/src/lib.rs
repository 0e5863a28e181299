//! Core types and trait definitions for the client registry.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store backend and the server both depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod error;
pub mod hit;
pub mod store;
pub mod version;

pub use error::{Error, Result};
