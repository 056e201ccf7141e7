//! Zone threshold resolution with a process-local cache.
//!
//! The durable [`ZoneConfigSource`] is the source of truth. Every answer,
//! including the fallback default after a miss or a failed lookup, is cached
//! until an explicit update or invalidation, so the durable store sees at
//! most one query per zone per invalidation.
//!
//! The cache is not shared between engine processes; each replica's view is
//! only as fresh as the last invalidation it received.

use std::sync::Arc;

use dashmap::DashMap;
use dwell_core::store::ZoneConfigSource;
use tracing::{debug, warn};

pub struct ThresholdResolver<Z> {
  source:          Arc<Z>,
  default_seconds: i64,
  cache:           DashMap<String, i64>,
}

impl<Z: ZoneConfigSource> ThresholdResolver<Z> {
  pub fn new(source: Arc<Z>, default_seconds: i64) -> Self {
    Self { source, default_seconds, cache: DashMap::new() }
  }

  /// The allowed dwell time for `zone_id`, in seconds.
  pub async fn resolve(&self, zone_id: &str) -> i64 {
    if let Some(hit) = self.cache.get(zone_id) {
      return *hit;
    }

    let threshold = match self.source.zone_threshold(zone_id.to_owned()).await {
      Ok(Some(seconds)) if seconds >= 0 => seconds,
      Ok(Some(seconds)) => {
        warn!(zone_id, seconds, "ignoring negative zone threshold; using default");
        self.default_seconds
      }
      Ok(None) => {
        debug!(zone_id, default = self.default_seconds, "no zone override; using default");
        self.default_seconds
      }
      Err(e) => {
        warn!(zone_id, error = %e, "zone config lookup failed; using default");
        self.default_seconds
      }
    };

    // Concurrent misses may both query; whichever lands first wins and an
    // explicit update made meanwhile is never overwritten.
    *self.cache.entry(zone_id.to_owned()).or_insert(threshold)
  }

  /// Write-through from an external configuration change.
  pub fn update(&self, zone_id: &str, threshold_seconds: i64) -> dwell_core::Result<()> {
    if threshold_seconds < 0 {
      return Err(dwell_core::Error::InvalidThreshold(threshold_seconds));
    }
    self.cache.insert(zone_id.to_owned(), threshold_seconds);
    Ok(())
  }

  /// Drop one zone, or every zone when `zone_id` is `None`. Returns how many
  /// entries were removed.
  pub fn invalidate(&self, zone_id: Option<&str>) -> usize {
    match zone_id {
      Some(zone_id) => usize::from(self.cache.remove(zone_id).is_some()),
      None => {
        let removed = self.cache.len();
        self.cache.clear();
        removed
      }
    }
  }

  pub fn len(&self) -> usize { self.cache.len() }

  pub fn is_empty(&self) -> bool { self.cache.is_empty() }
}
