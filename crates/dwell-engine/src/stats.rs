//! Process-wide counters for one engine instance.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Monotonic counters, bumped synchronously on the processing path.
#[derive(Debug, Default)]
pub struct Statistics {
  messages_processed:   AtomicU64,
  violations_detected:  AtomicU64,
  warnings_issued:      AtomicU64,
  errors:               AtomicU64,
  violations_persisted: AtomicU64,
  persistence_failures: AtomicU64,
}

impl Statistics {
  pub fn record_message(&self) { self.messages_processed.fetch_add(1, Ordering::Relaxed); }

  pub fn record_violation(&self) { self.violations_detected.fetch_add(1, Ordering::Relaxed); }

  pub fn record_warning(&self) { self.warnings_issued.fetch_add(1, Ordering::Relaxed); }

  pub fn record_error(&self) { self.errors.fetch_add(1, Ordering::Relaxed); }

  pub fn record_persisted(&self) { self.violations_persisted.fetch_add(1, Ordering::Relaxed); }

  pub fn record_persistence_failures(&self, count: u64) {
    self.persistence_failures.fetch_add(count, Ordering::Relaxed);
  }

  /// Read every counter. Gauges owned by other components are passed in.
  pub fn snapshot(&self, gauges: Gauges) -> StatsSnapshot {
    StatsSnapshot {
      messages_processed:   self.messages_processed.load(Ordering::Relaxed),
      violations_detected:  self.violations_detected.load(Ordering::Relaxed),
      warnings_issued:      self.warnings_issued.load(Ordering::Relaxed),
      errors:               self.errors.load(Ordering::Relaxed),
      violations_persisted: self.violations_persisted.load(Ordering::Relaxed),
      persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
      zone_cache_size:      gauges.zone_cache_size,
      pending_alerts:       gauges.pending_alerts,
      alert_capacity:       gauges.alert_capacity,
    }
  }
}

/// Point-in-time values sampled from the resolver and the alert queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gauges {
  pub zone_cache_size: usize,
  pub pending_alerts:  usize,
  pub alert_capacity:  usize,
}

/// A read-only copy of the engine's statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
  pub messages_processed:   u64,
  pub violations_detected:  u64,
  pub warnings_issued:      u64,
  pub errors:               u64,
  pub violations_persisted: u64,
  /// Violations that never reached the durable log: queue full, write
  /// failed, or abandoned at shutdown.
  pub persistence_failures: u64,
  pub zone_cache_size:      usize,
  pub pending_alerts:       usize,
  pub alert_capacity:       usize,
}
