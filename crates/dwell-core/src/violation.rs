//! Violation log entries: the durable, append-only record of overstays.
//!
//! One entry is written per episode, on the touch classified `VIOLATION`.
//! Entries are never updated or deleted by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{event::Observation, tracking::TouchResult};

/// Input to [`ViolationLog::append`](crate::store::ViolationLog::append).
/// The id and `created_at` are assigned by the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewViolation {
  pub subject_id:        String,
  pub zone_id:           String,
  pub subject_name:      String,
  pub zone_name:         String,
  pub start_time:        DateTime<Utc>,
  pub duration_seconds:  i64,
  pub threshold_seconds: i64,
}

impl NewViolation {
  pub fn from_touch(obs: &Observation, touch: &TouchResult, threshold_seconds: i64) -> Self {
    Self {
      subject_id: obs.key.subject_id.clone(),
      zone_id: obs.key.zone_id.clone(),
      subject_name: obs.subject_name.clone(),
      zone_name: obs.zone_name.clone(),
      start_time: touch.start_time,
      duration_seconds: touch.duration_seconds,
      threshold_seconds,
    }
  }
}

/// A persisted violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationLogEntry {
  pub id:                Uuid,
  pub subject_id:        String,
  pub zone_id:           String,
  pub subject_name:      String,
  pub zone_name:         String,
  pub start_time:        DateTime<Utc>,
  pub duration_seconds:  i64,
  pub threshold_seconds: i64,
  pub created_at:        DateTime<Utc>,
}

impl ViolationLogEntry {
  pub fn record(input: NewViolation, created_at: DateTime<Utc>) -> Self {
    Self {
      id: Uuid::new_v4(),
      subject_id: input.subject_id,
      zone_id: input.zone_id,
      subject_name: input.subject_name,
      zone_name: input.zone_name,
      start_time: input.start_time,
      duration_seconds: input.duration_seconds,
      threshold_seconds: input.threshold_seconds,
      created_at,
    }
  }
}

/// Parameters for [`ViolationLog::query`](crate::store::ViolationLog::query).
/// Time bounds apply to `start_time` and are inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationQuery {
  pub subject_id: Option<String>,
  pub zone_id:    Option<String>,
  pub since:      Option<DateTime<Utc>>,
  pub until:      Option<DateTime<Utc>>,
  pub limit:      Option<usize>,
}
