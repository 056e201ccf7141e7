//! [`SqlitePresenceStore`]: a hot layer shared through one SQLite file.

use std::{
  path::Path,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
  time::Duration,
};

use chrono::Utc;
use dwell_core::{
  store::PresenceStore,
  tracking::{Touch, TouchResult, TrackingKey, TrackingRecord},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::warn;

use crate::{Result, encode::tracking_record_from_row, schema::PRESENCE_SCHEMA};

/// How long a writer waits for another process's transaction to finish.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Touches between opportunistic deletes of expired rows.
pub(crate) const PURGE_EVERY: u64 = 1024;

/// Tracking records in a `tracking` table with a per-row expiry.
///
/// Each touch is a single `BEGIN IMMEDIATE` transaction: the write lock is
/// taken before the row is read, so concurrent touches of one key, from this
/// process or any other sharing the file, serialise. Expiry uses the wall
/// clock; expired rows are invisible to every read and are deleted in bulk
/// from time to time.
#[derive(Clone)]
pub struct SqlitePresenceStore {
  conn:    tokio_rusqlite::Connection,
  touches: Arc<AtomicU64>,
}

impl SqlitePresenceStore {
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(PRESENCE_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, touches: Arc::new(AtomicU64::new(0)) })
  }

  /// Delete every expired row. Returns how many were removed.
  pub async fn purge_expired(&self) -> Result<usize> {
    let removed = self
      .conn
      .call(|conn| {
        let now_us = Utc::now().timestamp_micros();
        Ok(conn.execute(
          "DELETE FROM tracking WHERE expires_at_us <= ?1",
          rusqlite::params![now_us],
        )?)
      })
      .await?;
    Ok(removed)
  }
}

fn ttl_micros(ttl: Duration) -> i64 { i64::try_from(ttl.as_micros()).unwrap_or(i64::MAX) }

// ─── PresenceStore impl ──────────────────────────────────────────────────────

impl PresenceStore for SqlitePresenceStore {
  type Error = crate::Error;

  async fn touch(&self, touch: Touch) -> Result<TouchResult> {
    let result = self
      .conn
      .call(move |conn| {
        let tx     = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now_us = Utc::now().timestamp_micros();

        let existing: Option<TrackingRecord> = tx
          .query_row(
            "SELECT start_time_us, subject_name, zone_name, threshold_seconds, alerted
             FROM tracking
             WHERE subject_id = ?1 AND zone_id = ?2 AND expires_at_us > ?3",
            rusqlite::params![touch.key.subject_id, touch.key.zone_id, now_us],
            tracking_record_from_row,
          )
          .optional()?;

        let (record, result) = touch.apply(existing);
        let expires_at_us    = now_us.saturating_add(ttl_micros(touch.idle_ttl));

        tx.execute(
          "INSERT OR REPLACE INTO tracking (
             subject_id, zone_id, start_time_us, subject_name, zone_name,
             threshold_seconds, alerted, expires_at_us
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            touch.key.subject_id,
            touch.key.zone_id,
            record.start_time.timestamp_micros(),
            record.subject_name,
            record.zone_name,
            record.threshold_seconds,
            record.alerted,
            expires_at_us,
          ],
        )?;

        tx.commit()?;
        Ok(result)
      })
      .await?;

    // The touch is committed; a failed sweep must not turn it into an error,
    // or a flipped `alerted` flag would never be reported.
    if self.touches.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1
      && let Err(e) = self.purge_expired().await
    {
      warn!(error = %e, "failed to purge expired tracking rows");
    }

    Ok(result)
  }

  async fn get(&self, key: TrackingKey) -> Result<Option<TrackingRecord>> {
    let record = self
      .conn
      .call(move |conn| {
        let now_us = Utc::now().timestamp_micros();
        Ok(
          conn
            .query_row(
              "SELECT start_time_us, subject_name, zone_name, threshold_seconds, alerted
               FROM tracking
               WHERE subject_id = ?1 AND zone_id = ?2 AND expires_at_us > ?3",
              rusqlite::params![key.subject_id, key.zone_id, now_us],
              tracking_record_from_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(record)
  }

  async fn clear(&self, key: TrackingKey) -> Result<bool> {
    let removed_live = self
      .conn
      .call(move |conn| {
        let tx     = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let now_us = Utc::now().timestamp_micros();
        let live   = tx.execute(
          "DELETE FROM tracking WHERE subject_id = ?1 AND zone_id = ?2 AND expires_at_us > ?3",
          rusqlite::params![key.subject_id, key.zone_id, now_us],
        )?;
        tx.execute(
          "DELETE FROM tracking WHERE subject_id = ?1 AND zone_id = ?2",
          rusqlite::params![key.subject_id, key.zone_id],
        )?;
        tx.commit()?;
        Ok(live > 0)
      })
      .await?;
    Ok(removed_live)
  }
}
