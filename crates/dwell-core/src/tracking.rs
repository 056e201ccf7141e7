//! Tracking records: the hot-layer state kept per (subject, zone).
//!
//! A record lives for as long as touches keep arriving within its idle TTL.
//! Once it expires, the next touch for the same key starts a fresh episode.
//! Backends own expiry; the engine never sweeps records itself.

use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Key ─────────────────────────────────────────────────────────────────────

/// Identifies one tracking record. At most one live record exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackingKey {
  pub subject_id: String,
  pub zone_id:    String,
}

impl TrackingKey {
  pub fn new(subject_id: impl Into<String>, zone_id: impl Into<String>) -> Self {
    Self { subject_id: subject_id.into(), zone_id: zone_id.into() }
  }
}

impl fmt::Display for TrackingKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.subject_id, self.zone_id)
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// The ephemeral state of one episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingRecord {
  /// When the episode began; never moves while the record is live.
  pub start_time:        DateTime<Utc>,
  pub subject_name:      String,
  pub zone_name:         String,
  /// The threshold applied on the most recent touch.
  pub threshold_seconds: i64,
  /// Set exactly once per episode, on the touch that first exceeds the
  /// threshold.
  pub alerted:           bool,
}

// ─── Touch ───────────────────────────────────────────────────────────────────

/// Everything a store needs to perform one atomic touch of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Touch {
  pub key:               TrackingKey,
  pub threshold_seconds: i64,
  pub subject_name:      String,
  pub zone_name:         String,
  pub now:               DateTime<Utc>,
  /// How long the record survives without another touch.
  pub idle_ttl:          Duration,
}

/// What a touch observed and changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchResult {
  pub is_new:              bool,
  pub start_time:          DateTime<Utc>,
  pub duration_seconds:    i64,
  /// The record had already raised its violation before this touch.
  pub was_already_alerted: bool,
  /// This touch flipped the record's `alerted` flag.
  pub just_alerted:        bool,
}

impl Touch {
  /// The read-modify-write rule shared by every backend.
  ///
  /// `existing` must be the live (unexpired) record for `self.key`, read
  /// inside the same atomic section in which the returned record is written
  /// back with a refreshed TTL.
  pub fn apply(&self, existing: Option<TrackingRecord>) -> (TrackingRecord, TouchResult) {
    let Some(mut record) = existing else {
      let record = TrackingRecord {
        start_time:        self.now,
        subject_name:      self.subject_name.clone(),
        zone_name:         self.zone_name.clone(),
        threshold_seconds: self.threshold_seconds,
        alerted:           false,
      };
      let result = TouchResult {
        is_new:              true,
        start_time:          self.now,
        duration_seconds:    0,
        was_already_alerted: false,
        just_alerted:        false,
      };
      return (record, result);
    };

    // Late (out-of-order) events never report negative dwell.
    let duration_seconds    = (self.now - record.start_time).num_seconds().max(0);
    let was_already_alerted = record.alerted;
    let just_alerted        = !was_already_alerted && duration_seconds > self.threshold_seconds;

    // An alerted record is frozen until it expires; only its TTL moves.
    if !was_already_alerted {
      record.alerted           = just_alerted;
      record.threshold_seconds = self.threshold_seconds;
      record.subject_name.clone_from(&self.subject_name);
      record.zone_name.clone_from(&self.zone_name);
    }

    let result = TouchResult {
      is_new: false,
      start_time: record.start_time,
      duration_seconds,
      was_already_alerted,
      just_alerted,
    };
    (record, result)
  }
}
