//! Error types for `dwell-core`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("invalid threshold {0}s: thresholds must not be negative")]
  InvalidThreshold(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
