//! [`SqliteStore`], the SQLite implementation of the cold layer.

use std::path::Path;

use chrono::Utc;
use dwell_core::{
  store::{ViolationLog, ZoneConfigSource},
  violation::{NewViolation, ViolationLogEntry, ViolationQuery},
};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{RawViolation, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Zone thresholds and the violation log, backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn  = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn  = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Zone configuration ────────────────────────────────────────────────────

  /// Create or replace the threshold override for `zone_id`.
  ///
  /// This writes durable configuration only; running engines keep serving
  /// their cached value until told to update or invalidate it.
  pub async fn upsert_zone(&self, zone_id: &str, threshold_seconds: i64) -> Result<()> {
    if threshold_seconds < 0 {
      return Err(dwell_core::Error::InvalidThreshold(threshold_seconds).into());
    }

    let zone_id = zone_id.to_owned();
    let at_str  = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO zone_thresholds (zone_id, threshold_seconds, updated_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (zone_id) DO UPDATE SET
             threshold_seconds = excluded.threshold_seconds,
             updated_at        = excluded.updated_at",
          rusqlite::params![zone_id, threshold_seconds, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Remove the override for `zone_id`. Returns whether one existed.
  pub async fn remove_zone(&self, zone_id: &str) -> Result<bool> {
    let zone_id = zone_id.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM zone_thresholds WHERE zone_id = ?1",
          rusqlite::params![zone_id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }
}

// ─── ZoneConfigSource impl ───────────────────────────────────────────────────

impl ZoneConfigSource for SqliteStore {
  type Error = crate::Error;

  async fn zone_threshold(&self, zone_id: String) -> Result<Option<i64>> {
    let threshold = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT threshold_seconds FROM zone_thresholds WHERE zone_id = ?1",
              rusqlite::params![zone_id],
              |row| row.get::<_, i64>(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(threshold)
  }
}

// ─── ViolationLog impl ───────────────────────────────────────────────────────

impl ViolationLog for SqliteStore {
  type Error = crate::Error;

  async fn append(&self, violation: NewViolation) -> Result<ViolationLogEntry> {
    let entry = ViolationLogEntry::record(violation, Utc::now());

    let id_str         = encode_uuid(entry.id);
    let subject_id     = entry.subject_id.clone();
    let zone_id        = entry.zone_id.clone();
    let subject_name   = entry.subject_name.clone();
    let zone_name      = entry.zone_name.clone();
    let start_time_str = encode_dt(entry.start_time);
    let duration       = entry.duration_seconds;
    let threshold      = entry.threshold_seconds;
    let created_at_str = encode_dt(entry.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO violation_logs (
             id, subject_id, zone_id, subject_name, zone_name,
             start_time, duration_seconds, threshold_seconds, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            subject_id,
            zone_id,
            subject_name,
            zone_name,
            start_time_str,
            duration,
            threshold,
            created_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(entry)
  }

  async fn query(&self, query: &ViolationQuery) -> Result<Vec<ViolationLogEntry>> {
    let subject_id = query.subject_id.clone();
    let zone_id    = query.zone_id.clone();
    let since_str  = query.since.map(encode_dt);
    let until_str  = query.until.map(encode_dt);
    // A negative LIMIT means "no limit" in SQLite.
    let limit_val  = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

    let raws: Vec<RawViolation> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {}
           FROM violation_logs
           WHERE (?1 IS NULL OR subject_id = ?1)
             AND (?2 IS NULL OR zone_id    = ?2)
             AND (?3 IS NULL OR start_time >= ?3)
             AND (?4 IS NULL OR start_time <= ?4)
           ORDER BY start_time DESC, created_at DESC
           LIMIT ?5",
          RawViolation::COLUMNS,
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![subject_id, zone_id, since_str, until_str, limit_val],
            RawViolation::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawViolation::into_entry).collect()
  }
}
