//! SQL schemas for the dwell SQLite stores.
//!
//! Executed once at connection startup. Both are idempotent thanks to
//! `CREATE ... IF NOT EXISTS`; future migrations will be gated on
//! `PRAGMA user_version`.

/// Cold layer: zone configuration and the violation log.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS zone_thresholds (
    zone_id           TEXT PRIMARY KEY,
    threshold_seconds INTEGER NOT NULL CHECK (threshold_seconds >= 0),
    updated_at        TEXT NOT NULL
);

-- Strictly append-only: one row per overstay episode.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS violation_logs (
    id                TEXT PRIMARY KEY,
    subject_id        TEXT NOT NULL,
    zone_id           TEXT NOT NULL,
    subject_name      TEXT NOT NULL,
    zone_name         TEXT NOT NULL,
    start_time        TEXT NOT NULL,   -- fixed-width RFC 3339 UTC
    duration_seconds  INTEGER NOT NULL,
    threshold_seconds INTEGER NOT NULL,
    created_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS violation_logs_subject_idx ON violation_logs(subject_id);
CREATE INDEX IF NOT EXISTS violation_logs_zone_idx    ON violation_logs(zone_id);
CREATE INDEX IF NOT EXISTS violation_logs_start_idx   ON violation_logs(start_time);

PRAGMA user_version = 1;
";

/// Hot layer: one row per live (subject, zone) episode.
pub const PRESENCE_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS tracking (
    subject_id        TEXT NOT NULL,
    zone_id           TEXT NOT NULL,
    start_time_us     INTEGER NOT NULL,   -- unix microseconds
    subject_name      TEXT NOT NULL,
    zone_name         TEXT NOT NULL,
    threshold_seconds INTEGER NOT NULL,
    alerted           INTEGER NOT NULL,
    expires_at_us     INTEGER NOT NULL,   -- wall clock, unix microseconds
    PRIMARY KEY (subject_id, zone_id)
);

CREATE INDEX IF NOT EXISTS tracking_expiry_idx ON tracking(expires_at_us);
";
