//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps in the violation log are stored as fixed-width RFC 3339 UTC
//! strings (microsecond precision, `Z` suffix) so that lexical order matches
//! chronological order for range queries. The hot tracking table stores unix
//! microseconds instead. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use dwell_core::{
  tracking::TrackingRecord,
  violation::ViolationLogEntry,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Decode unix microseconds inside a row mapper.
pub fn decode_micros(column: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
  DateTime::from_timestamp_micros(micros)
    .ok_or(rusqlite::Error::IntegralValueOutOfRange(column, micros))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `violation_logs` row exactly as read from SQLite.
pub struct RawViolation {
  pub id:                String,
  pub subject_id:        String,
  pub zone_id:           String,
  pub subject_name:      String,
  pub zone_name:         String,
  pub start_time:        String,
  pub duration_seconds:  i64,
  pub threshold_seconds: i64,
  pub created_at:        String,
}

impl RawViolation {
  pub const COLUMNS: &'static str = "id, subject_id, zone_id, subject_name, zone_name, \
                                     start_time, duration_seconds, threshold_seconds, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      subject_id:        row.get(1)?,
      zone_id:           row.get(2)?,
      subject_name:      row.get(3)?,
      zone_name:         row.get(4)?,
      start_time:        row.get(5)?,
      duration_seconds:  row.get(6)?,
      threshold_seconds: row.get(7)?,
      created_at:        row.get(8)?,
    })
  }

  pub fn into_entry(self) -> Result<ViolationLogEntry> {
    Ok(ViolationLogEntry {
      id:                decode_uuid(&self.id)?,
      subject_id:        self.subject_id,
      zone_id:           self.zone_id,
      subject_name:      self.subject_name,
      zone_name:         self.zone_name,
      start_time:        decode_dt(&self.start_time)?,
      duration_seconds:  self.duration_seconds,
      threshold_seconds: self.threshold_seconds,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

/// Map a `tracking` row (`start_time_us, subject_name, zone_name,
/// threshold_seconds, alerted`) to a record.
pub fn tracking_record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrackingRecord> {
  Ok(TrackingRecord {
    start_time:        decode_micros(0, row.get(0)?)?,
    subject_name:      row.get(1)?,
    zone_name:         row.get(2)?,
    threshold_seconds: row.get(3)?,
    alerted:           row.get(4)?,
  })
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let a = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    let b = a + chrono::Duration::milliseconds(500);
    let c = a + chrono::Duration::seconds(1);
    assert!(encode_dt(a) < encode_dt(b));
    assert!(encode_dt(b) < encode_dt(c));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn micros_out_of_range_is_an_error() {
    assert!(decode_micros(0, i64::MAX).is_err());
  }
}
