//! Presence events at the ingress boundary, and the enriched events handed
//! back to the caller.
//!
//! The ingress transport delivers loosely-populated messages. They are parsed
//! into a [`PresenceEvent`] with explicit optional fields and checked exactly
//! once by [`PresenceEvent::validate`]; everything downstream works on the
//! resulting [`Observation`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, detector::Verdict, tracking::TrackingKey};

// ─── Input ───────────────────────────────────────────────────────────────────

/// A "subject observed in zone" message as delivered by the ingress layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEvent {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subject_id:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub zone_id:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subject_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub zone_name:    Option<String>,
  /// When the subject was seen. Defaults to the processing clock.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub observed_at:  Option<DateTime<Utc>>,
}

impl PresenceEvent {
  pub fn new(subject_id: impl Into<String>, zone_id: impl Into<String>) -> Self {
    Self {
      subject_id: Some(subject_id.into()),
      zone_id: Some(zone_id.into()),
      ..Self::default()
    }
  }

  pub fn at(mut self, observed_at: DateTime<Utc>) -> Self {
    self.observed_at = Some(observed_at);
    self
  }

  pub fn with_names(
    mut self,
    subject_name: impl Into<String>,
    zone_name: impl Into<String>,
  ) -> Self {
    self.subject_name = Some(subject_name.into());
    self.zone_name = Some(zone_name.into());
    self
  }

  /// Check mandatory fields and apply display defaults.
  ///
  /// Blank identifiers count as missing. Names default to their identifiers
  /// and `observed_at` defaults to `now`.
  pub fn validate(&self, now: DateTime<Utc>) -> Result<Observation> {
    let subject_id = required(self.subject_id.as_deref(), "subject_id")?;
    let zone_id    = required(self.zone_id.as_deref(), "zone_id")?;

    let subject_name = optional(self.subject_name.as_deref())
      .unwrap_or(&subject_id)
      .to_owned();
    let zone_name = optional(self.zone_name.as_deref())
      .unwrap_or(&zone_id)
      .to_owned();

    Ok(Observation {
      key: TrackingKey::new(subject_id, zone_id),
      subject_name,
      zone_name,
      observed_at: self.observed_at.unwrap_or(now),
    })
  }
}

fn required(value: Option<&str>, field: &'static str) -> Result<String> {
  optional(value)
    .map(str::to_owned)
    .ok_or(Error::MissingField(field))
}

fn optional(value: Option<&str>) -> Option<&str> {
  value.map(str::trim).filter(|v| !v.is_empty())
}

/// A validated presence event with all defaults resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
  pub key:          TrackingKey,
  pub subject_name: String,
  pub zone_name:    String,
  pub observed_at:  DateTime<Utc>,
}

impl Observation {
  /// The event as it is echoed back to the caller, with defaults filled in.
  pub fn to_event(&self) -> PresenceEvent {
    PresenceEvent {
      subject_id:   Some(self.key.subject_id.clone()),
      zone_id:      Some(self.key.zone_id.clone()),
      subject_name: Some(self.subject_name.clone()),
      zone_name:    Some(self.zone_name.clone()),
      observed_at:  Some(self.observed_at),
    }
  }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// The outcome attached to every processed event as `be_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BeStatus {
  /// First touch of a (subject, zone) episode.
  Entered,
  /// Still within the zone's allowed dwell time.
  Warning,
  /// The dwell time was exceeded on this touch. Fires once per episode.
  Violation,
  /// The episode already raised its violation.
  ViolationOngoing,
  /// The hot store could not be reached.
  Error,
  /// A mandatory field was missing; nothing was tracked.
  Invalid,
}

impl BeStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Entered => "ENTERED",
      Self::Warning => "WARNING",
      Self::Violation => "VIOLATION",
      Self::ViolationOngoing => "VIOLATION_ONGOING",
      Self::Error => "ERROR",
      Self::Invalid => "INVALID",
    }
  }
}

impl fmt::Display for BeStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// How far past its threshold an overstay has gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
  Low,
  Medium,
  High,
}

impl Severity {
  /// `HIGH` beyond 1.5x the threshold, `MEDIUM` beyond 1.2x, `LOW` otherwise.
  pub fn grade(duration_seconds: i64, threshold_seconds: i64) -> Self {
    // Integer comparison avoids float rounding at the boundaries.
    let scaled = i128::from(duration_seconds) * 10;
    let limit  = i128::from(threshold_seconds);
    if scaled > limit * 15 {
      Self::High
    } else if scaled > limit * 12 {
      Self::Medium
    } else {
      Self::Low
    }
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// The input event plus the engine's verdict.
///
/// Fields that do not apply to a status are omitted when serialised:
/// `time_remaining` only accompanies `WARNING`; `threshold_seconds` and
/// `severity` only accompany the two violation statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedEvent {
  #[serde(flatten)]
  pub event:             PresenceEvent,
  pub be_status:         BeStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration_seconds:  Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub time_remaining:    Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub threshold_seconds: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub severity:          Option<Severity>,
  pub processed_at:      DateTime<Utc>,
}

impl EnrichedEvent {
  /// An event that never reached the tracker (`INVALID`) or failed there
  /// (`ERROR`).
  pub fn rejected(event: PresenceEvent, status: BeStatus, processed_at: DateTime<Utc>) -> Self {
    Self {
      event,
      be_status: status,
      duration_seconds: None,
      time_remaining: None,
      threshold_seconds: None,
      severity: None,
      processed_at,
    }
  }

  pub fn classified(
    event: PresenceEvent,
    verdict: &Verdict,
    processed_at: DateTime<Utc>,
  ) -> Self {
    let over = matches!(verdict.status, BeStatus::Violation | BeStatus::ViolationOngoing);
    Self {
      event,
      be_status: verdict.status,
      duration_seconds: Some(verdict.duration_seconds),
      time_remaining: verdict.time_remaining,
      threshold_seconds: over.then_some(verdict.threshold_seconds),
      severity: verdict.severity,
      processed_at,
    }
  }
}
