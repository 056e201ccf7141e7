//! Store traits: the hot presence layer, the durable zone configuration and
//! the durable violation log.
//!
//! Backends live in their own crates (`dwell-store-memory`,
//! `dwell-store-sqlite`). The engine depends on these abstractions only.
//!
//! All methods return `Send` futures so implementations can be driven from a
//! multi-threaded tokio runtime and from spawned background tasks.

use std::future::Future;

use crate::{
  tracking::{Touch, TouchResult, TrackingKey, TrackingRecord},
  violation::{NewViolation, ViolationLogEntry, ViolationQuery},
};

// ─── Hot layer ───────────────────────────────────────────────────────────────

/// Ephemeral, TTL-bearing storage of one [`TrackingRecord`] per key.
pub trait PresenceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read, conditionally update and TTL-refresh the record for `touch.key`
  /// as one atomic unit, following [`Touch::apply`].
  ///
  /// Two concurrent touches of the same key must never both report
  /// `just_alerted`.
  fn touch(
    &self,
    touch: Touch,
  ) -> impl Future<Output = Result<TouchResult, Self::Error>> + Send + '_;

  /// The live record for `key`, or `None` if absent or expired.
  fn get(
    &self,
    key: TrackingKey,
  ) -> impl Future<Output = Result<Option<TrackingRecord>, Self::Error>> + Send + '_;

  /// Remove the record for `key` regardless of its TTL. Returns whether a
  /// live record was removed.
  fn clear(
    &self,
    key: TrackingKey,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Cold layer ──────────────────────────────────────────────────────────────

/// Durable per-zone threshold overrides.
pub trait ZoneConfigSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The override for `zone_id` in seconds. `None` means "use the default"
  /// and is not an error.
  fn zone_threshold(
    &self,
    zone_id: String,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;
}

/// Durable, append-only log of confirmed violations.
pub trait ViolationLog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a violation and return the stored entry.
  fn append(
    &self,
    violation: NewViolation,
  ) -> impl Future<Output = Result<ViolationLogEntry, Self::Error>> + Send + '_;

  /// Entries matching `query`, newest `start_time` first.
  fn query<'a>(
    &'a self,
    query: &'a ViolationQuery,
  ) -> impl Future<Output = Result<Vec<ViolationLogEntry>, Self::Error>> + Send + 'a;
}
