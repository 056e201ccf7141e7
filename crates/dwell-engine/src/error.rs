//! Error type for `dwell-engine`.
//!
//! Only administrative operations and construction can fail;
//! [`Engine::process`](crate::Engine::process) reports problems through
//! `be_status` instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] dwell_core::Error),

  #[error("invalid engine configuration: {0}")]
  Config(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
