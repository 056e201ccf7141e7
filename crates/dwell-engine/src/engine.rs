//! The [`Engine`]: one instance owns the threshold cache, the counters, the alert
//! queue and the background persister, and drives every event through them.

use std::sync::Arc;

use chrono::Utc;
use dwell_core::{
  detector::classify,
  event::{BeStatus, EnrichedEvent, PresenceEvent},
  store::{PresenceStore, ViolationLog, ZoneConfigSource},
  tracking::{Touch, TrackingKey, TrackingRecord},
  violation::NewViolation,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  EngineConfig, Error, Result,
  alerts::{Alert, AlertQueue, Decision},
  persister::{DrainSummary, ViolationPersister},
  resolver::ThresholdResolver,
  stats::{Gauges, Statistics, StatsSnapshot},
};

/// The dwell-time violation engine.
///
/// `P` is the hot presence layer. `D` is the durable store, which serves both
/// zone threshold overrides and the violation log.
///
/// [`process`](Self::process) may be called concurrently from any number of
/// tasks; the presence store's atomic touch is the only synchronisation point.
pub struct Engine<P, D> {
  presence:  Arc<P>,
  resolver:  ThresholdResolver<D>,
  persister: ViolationPersister,
  alerts:    AlertQueue,
  stats:     Arc<Statistics>,
  config:    EngineConfig,
}

impl<P, D> Engine<P, D>
where
  P: PresenceStore,
  D: ZoneConfigSource + ViolationLog + 'static,
{
  /// Build an engine and start its background writers.
  ///
  /// Must be called from within a tokio runtime.
  pub fn new(presence: Arc<P>, durable: Arc<D>, config: EngineConfig) -> Result<Self> {
    config.validate()?;

    let stats     = Arc::new(Statistics::default());
    let persister = ViolationPersister::start(
      Arc::clone(&durable),
      config.persist_queue_capacity,
      config.persist_workers,
      Arc::clone(&stats),
    )?;

    info!(
      default_threshold_secs = config.default_threshold_secs,
      idle_ttl_secs = config.idle_ttl_secs,
      "engine started"
    );

    Ok(Self {
      resolver: ThresholdResolver::new(durable, config.default_threshold_secs),
      alerts: AlertQueue::new(config.alert_queue_capacity),
      presence,
      persister,
      stats,
      config,
    })
  }

  // ─── Processing ────────────────────────────────────────────────────────────

  /// Classify one presence event. Never fails: problems are reported as
  /// `INVALID` or `ERROR` in the returned event's `be_status`.
  pub async fn process(&self, event: PresenceEvent) -> EnrichedEvent {
    self.stats.record_message();
    let processed_at = Utc::now();

    let obs = match event.validate(processed_at) {
      Ok(obs) => obs,
      Err(e) => {
        self.stats.record_error();
        warn!(error = %e, "rejecting invalid presence event");
        return EnrichedEvent::rejected(event, BeStatus::Invalid, processed_at);
      }
    };

    let threshold = self.resolver.resolve(&obs.key.zone_id).await;
    let touch = Touch {
      key:               obs.key.clone(),
      threshold_seconds: threshold,
      subject_name:      obs.subject_name.clone(),
      zone_name:         obs.zone_name.clone(),
      now:               obs.observed_at,
      idle_ttl:          self.config.idle_ttl(),
    };

    let result = match self.presence.touch(touch).await {
      Ok(result) => result,
      Err(e) => {
        self.stats.record_error();
        error!(key = %obs.key, error = %e, "presence store touch failed");
        return EnrichedEvent::rejected(obs.to_event(), BeStatus::Error, processed_at);
      }
    };

    let verdict = classify(&result, threshold);
    match verdict.status {
      BeStatus::Entered => debug!(key = %obs.key, "entered zone"),
      BeStatus::Warning => {
        self.stats.record_warning();
        debug!(
          key = %obs.key,
          duration_seconds = verdict.duration_seconds,
          time_remaining = verdict.time_remaining,
          "dwelling within threshold"
        );
      }
      _ => {}
    }

    if verdict.starts_violation() {
      self.stats.record_violation();
      warn!(
        key = %obs.key,
        duration_seconds = verdict.duration_seconds,
        threshold_seconds = threshold,
        severity = ?verdict.severity,
        "dwell-time violation"
      );
      let violation = NewViolation::from_touch(&obs, &result, threshold);
      if let Some(severity) = verdict.severity {
        self.alerts.push(Alert::raise(&violation, severity, processed_at));
      }
      self.persister.persist(violation);
    }

    EnrichedEvent::classified(obs.to_event(), &verdict, processed_at)
  }

  // ─── Administration ────────────────────────────────────────────────────────

  /// Write a new threshold into the cache after an external config change.
  pub fn update_zone_cache(&self, zone_id: &str, threshold_seconds: i64) -> Result<()> {
    self.resolver.update(zone_id, threshold_seconds)?;
    info!(zone_id, threshold_seconds, "zone threshold cache updated");
    Ok(())
  }

  /// Drop one cached threshold, or all of them. Returns how many were removed.
  pub fn invalidate_zone_cache(&self, zone_id: Option<&str>) -> usize {
    let removed = self.resolver.invalidate(zone_id);
    info!(zone_id, removed, "zone threshold cache invalidated");
    removed
  }

  pub fn statistics(&self) -> StatsSnapshot {
    self.stats.snapshot(Gauges {
      zone_cache_size: self.resolver.len(),
      pending_alerts:  self.alerts.len(),
      alert_capacity:  self.alerts.capacity(),
    })
  }

  /// Forget the tracking record for one key, bypassing its TTL.
  pub async fn clear_tracking(&self, subject_id: &str, zone_id: &str) -> Result<bool> {
    let key     = TrackingKey::new(subject_id, zone_id);
    let removed = self
      .presence
      .clear(key.clone())
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    info!(%key, removed, "tracking cleared");
    Ok(removed)
  }

  pub async fn tracking(&self, subject_id: &str, zone_id: &str) -> Result<Option<TrackingRecord>> {
    self
      .presence
      .get(TrackingKey::new(subject_id, zone_id))
      .await
      .map_err(|e| Error::Store(Box::new(e)))
  }

  pub fn alerts(&self) -> Vec<Alert> { self.alerts.list() }

  pub fn review_alert(&self, alert_id: Uuid, decision: Decision) -> Option<Alert> {
    self.alerts.review(alert_id, decision)
  }

  /// Stop accepting violations and drain the background writers within the
  /// configured grace period.
  pub async fn shutdown(&self) -> DrainSummary {
    info!(pending = self.persister.pending(), "engine shutting down");
    self.persister.shutdown(self.config.shutdown_grace()).await
  }
}
