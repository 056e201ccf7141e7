//! Violation detector: maps a [`TouchResult`] to a [`BeStatus`].
//!
//! | touch                                     | status              |
//! |-------------------------------------------|---------------------|
//! | new record                                | `ENTERED`           |
//! | duration <= threshold                     | `WARNING`           |
//! | duration > threshold, flag flipped now    | `VIOLATION`         |
//! | duration > threshold, flag already set    | `VIOLATION_ONGOING` |
//!
//! `INVALID` and `ERROR` never reach this module: they are decided before or
//! instead of a touch. Only `VIOLATION` schedules a log write, so a sustained
//! overstay yields one durable row per episode.

use crate::{
  event::{BeStatus, Severity},
  tracking::TouchResult,
};

/// The classification of one successful touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
  pub status:            BeStatus,
  pub duration_seconds:  i64,
  /// Seconds left before the threshold is crossed; `WARNING` only.
  pub time_remaining:    Option<i64>,
  pub threshold_seconds: i64,
  /// Present for `VIOLATION` and `VIOLATION_ONGOING`.
  pub severity:          Option<Severity>,
}

impl Verdict {
  /// Whether this touch must produce a violation log entry.
  pub fn starts_violation(&self) -> bool { self.status == BeStatus::Violation }
}

pub fn classify(touch: &TouchResult, threshold_seconds: i64) -> Verdict {
  let duration = touch.duration_seconds;

  let (status, time_remaining) = if touch.is_new {
    (BeStatus::Entered, None)
  } else if duration <= threshold_seconds {
    (BeStatus::Warning, Some(threshold_seconds - duration))
  } else if touch.just_alerted {
    (BeStatus::Violation, None)
  } else {
    // Either the flag was already set, or a backend declined to flip it.
    // Neither case may schedule another write.
    (BeStatus::ViolationOngoing, None)
  };

  let severity = matches!(status, BeStatus::Violation | BeStatus::ViolationOngoing)
    .then(|| Severity::grade(duration, threshold_seconds));

  Verdict {
    status,
    duration_seconds: if touch.is_new { 0 } else { duration },
    time_remaining,
    threshold_seconds,
    severity,
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn result(is_new: bool, duration: i64, was: bool, just: bool) -> TouchResult {
    TouchResult {
      is_new,
      start_time: Utc::now(),
      duration_seconds: duration,
      was_already_alerted: was,
      just_alerted: just,
    }
  }

  #[test]
  fn new_record_is_entered_with_zero_duration() {
    let v = classify(&result(true, 0, false, false), 10);
    assert_eq!(v.status, BeStatus::Entered);
    assert_eq!(v.duration_seconds, 0);
    assert_eq!(v.time_remaining, None);
    assert!(!v.starts_violation());
  }

  #[test]
  fn within_threshold_is_warning_with_time_remaining() {
    let v = classify(&result(false, 5, false, false), 10);
    assert_eq!(v.status, BeStatus::Warning);
    assert_eq!(v.time_remaining, Some(5));

    let edge = classify(&result(false, 10, false, false), 10);
    assert_eq!(edge.status, BeStatus::Warning);
    assert_eq!(edge.time_remaining, Some(0));
  }

  #[test]
  fn flip_is_the_only_violation() {
    let v = classify(&result(false, 11, false, true), 10);
    assert_eq!(v.status, BeStatus::Violation);
    assert!(v.starts_violation());
    assert_eq!(v.severity, Some(Severity::Low));
  }

  #[test]
  fn already_alerted_is_ongoing() {
    let v = classify(&result(false, 15, true, false), 10);
    assert_eq!(v.status, BeStatus::ViolationOngoing);
    assert!(!v.starts_violation());
    assert_eq!(v.severity, Some(Severity::Medium));
  }

  #[test]
  fn over_threshold_without_flip_never_starts_a_violation() {
    let v = classify(&result(false, 30, false, false), 10);
    assert_eq!(v.status, BeStatus::ViolationOngoing);
    assert!(!v.starts_violation());
  }

  #[test]
  fn raised_threshold_mid_episode_reports_warning() {
    let v = classify(&result(false, 20, true, false), 60);
    assert_eq!(v.status, BeStatus::Warning);
    assert_eq!(v.time_remaining, Some(40));
  }
}
