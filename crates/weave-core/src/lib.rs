//! Core types and trait definitions for Weave.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The store backend, the API handlers and the client all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod connection;
pub mod error;
pub mod page;
pub mod post;
pub mod store;
pub mod user;

pub use error::{Error, Result};
