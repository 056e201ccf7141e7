//! Engine tuning knobs, deserialised from the `[engine]` config section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Runtime configuration for one [`Engine`](crate::Engine).
///
/// Every field has a default, so an empty `[engine]` table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Threshold for zones without a durable override.
  pub default_threshold_secs: i64,
  /// Idle window after which a tracking record expires. Must exceed the
  /// expected gap between two sightings of the same subject.
  pub idle_ttl_secs:          u64,
  /// Violations buffered for the background writers before new ones are
  /// dropped.
  pub persist_queue_capacity: usize,
  pub persist_workers:        usize,
  /// How long shutdown waits for queued violations to be written.
  pub shutdown_grace_ms:      u64,
  /// Alerts kept for manual review; the oldest is dropped when full.
  pub alert_queue_capacity:   usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      default_threshold_secs: 300,
      idle_ttl_secs:          30,
      persist_queue_capacity: 1024,
      persist_workers:        2,
      shutdown_grace_ms:      5000,
      alert_queue_capacity:   100,
    }
  }
}

impl EngineConfig {
  pub fn idle_ttl(&self) -> Duration { Duration::from_secs(self.idle_ttl_secs) }

  pub fn shutdown_grace(&self) -> Duration { Duration::from_millis(self.shutdown_grace_ms) }

  pub fn validate(&self) -> Result<()> {
    if self.default_threshold_secs < 0 {
      return Err(Error::Config(format!(
        "default_threshold_secs must not be negative (got {})",
        self.default_threshold_secs
      )));
    }
    if self.idle_ttl_secs == 0 {
      return Err(Error::Config("idle_ttl_secs must be at least 1".into()));
    }
    if self.persist_queue_capacity == 0 {
      return Err(Error::Config("persist_queue_capacity must be at least 1".into()));
    }
    if self.persist_workers == 0 {
      return Err(Error::Config("persist_workers must be at least 1".into()));
    }
    Ok(())
  }
}
