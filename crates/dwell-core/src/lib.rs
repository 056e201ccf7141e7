//! Core types and trait definitions for the dwell-time violation engine.
//!
//! This crate is deliberately free of runtime, logging and database
//! dependencies. Storage backends implement the traits in [`store`]; the
//! engine composes them.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod detector;
pub mod error;
pub mod event;
pub mod store;
pub mod tracking;
pub mod violation;

pub use error::{Error, Result};
