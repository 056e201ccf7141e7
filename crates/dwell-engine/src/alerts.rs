//! Bounded queue of violation alerts awaiting manual review.

use std::{
  collections::VecDeque,
  sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Utc};
use dwell_core::{event::Severity, violation::NewViolation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// One externally visible alert, raised on a `VIOLATION` transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
  pub alert_id:          Uuid,
  pub subject_id:        String,
  pub zone_id:           String,
  pub subject_name:      String,
  pub zone_name:         String,
  pub start_time:        DateTime<Utc>,
  pub duration_seconds:  i64,
  pub threshold_seconds: i64,
  pub severity:          Severity,
  pub raised_at:         DateTime<Utc>,
}

impl Alert {
  pub fn raise(violation: &NewViolation, severity: Severity, raised_at: DateTime<Utc>) -> Self {
    Self {
      alert_id: Uuid::new_v4(),
      subject_id: violation.subject_id.clone(),
      zone_id: violation.zone_id.clone(),
      subject_name: violation.subject_name.clone(),
      zone_name: violation.zone_name.clone(),
      start_time: violation.start_time,
      duration_seconds: violation.duration_seconds,
      threshold_seconds: violation.threshold_seconds,
      severity,
      raised_at,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
  Approve,
  Reject,
}

impl Decision {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Approve => "approve",
      Self::Reject => "reject",
    }
  }
}

/// FIFO of pending alerts. When full, the oldest alert is dropped.
pub struct AlertQueue {
  pending:  Mutex<VecDeque<Alert>>,
  capacity: usize,
}

impl AlertQueue {
  pub fn new(capacity: usize) -> Self {
    Self { pending: Mutex::new(VecDeque::with_capacity(capacity)), capacity }
  }

  pub fn capacity(&self) -> usize { self.capacity }

  pub fn len(&self) -> usize { self.lock().len() }

  pub fn is_empty(&self) -> bool { self.lock().is_empty() }

  pub fn push(&self, alert: Alert) {
    if self.capacity == 0 {
      return;
    }
    let mut pending = self.lock();
    if pending.len() == self.capacity {
      if let Some(dropped) = pending.pop_front() {
        warn!(alert_id = %dropped.alert_id, "alert queue full; dropping oldest alert");
      }
    }
    pending.push_back(alert);
  }

  /// Pending alerts, oldest first.
  pub fn list(&self) -> Vec<Alert> { self.lock().iter().cloned().collect() }

  /// Remove `alert_id` from the queue. `None` if it is not pending.
  pub fn review(&self, alert_id: Uuid, decision: Decision) -> Option<Alert> {
    let alert = {
      let mut pending = self.lock();
      let index = pending.iter().position(|a| a.alert_id == alert_id)?;
      pending.remove(index)?
    };
    info!(
      %alert_id,
      decision = decision.as_str(),
      subject_id = %alert.subject_id,
      zone_id = %alert.zone_id,
      "alert reviewed"
    );
    Some(alert)
  }

  fn lock(&self) -> MutexGuard<'_, VecDeque<Alert>> {
    self.pending.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
