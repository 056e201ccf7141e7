//! Behavioural tests for `MemoryPresenceStore`.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, TimeZone, Utc};
use dwell_core::{
  store::PresenceStore,
  tracking::{Touch, TrackingKey},
};

use crate::MemoryPresenceStore;

const TTL: Duration = Duration::from_secs(30);

fn t(secs: i64) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

fn touch(subject: &str, at: i64) -> Touch {
  Touch {
    key:               TrackingKey::new(subject, "Z1"),
    threshold_seconds: 10,
    subject_name:      subject.into(),
    zone_name:         "Z1".into(),
    now:               t(at),
    idle_ttl:          TTL,
  }
}

// ─── Touch ───────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn episode_progresses_through_alert() {
  let s = MemoryPresenceStore::new();

  let first = s.touch(touch("U1", 0)).await.unwrap();
  assert!(first.is_new);

  let warn = s.touch(touch("U1", 5)).await.unwrap();
  assert!(!warn.is_new);
  assert_eq!(warn.duration_seconds, 5);

  let flip = s.touch(touch("U1", 11)).await.unwrap();
  assert!(flip.just_alerted);

  let again = s.touch(touch("U1", 15)).await.unwrap();
  assert!(again.was_already_alerted);
  assert!(!again.just_alerted);
  assert_eq!(again.duration_seconds, 15);
}

#[tokio::test(start_paused = true)]
async fn keys_are_independent() {
  let s = MemoryPresenceStore::new();
  s.touch(touch("U1", 0)).await.unwrap();
  let other = s.touch(touch("U2", 20)).await.unwrap();
  assert!(other.is_new);
  assert_eq!(s.len(), 2);
}

// ─── TTL ─────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn idle_record_expires_and_restarts() {
  let s = MemoryPresenceStore::new();
  s.touch(touch("U1", 0)).await.unwrap();
  assert!(s.touch(touch("U1", 11)).await.unwrap().just_alerted);

  tokio::time::advance(TTL + Duration::from_secs(1)).await;

  let fresh = s.touch(touch("U1", 50)).await.unwrap();
  assert!(fresh.is_new);
  assert_eq!(fresh.duration_seconds, 0);
  assert!(!s.get(TrackingKey::new("U1", "Z1")).await.unwrap().unwrap().alerted);
}

#[tokio::test(start_paused = true)]
async fn touch_refreshes_ttl() {
  let s = MemoryPresenceStore::new();
  s.touch(touch("U1", 0)).await.unwrap();

  for step in 1..=5 {
    tokio::time::advance(Duration::from_secs(20)).await;
    let res = s.touch(touch("U1", step * 20)).await.unwrap();
    assert!(!res.is_new, "record expired at step {step}");
  }
}

#[tokio::test(start_paused = true)]
async fn get_hides_and_evicts_expired_records() {
  let s   = MemoryPresenceStore::new();
  let key = TrackingKey::new("U1", "Z1");
  s.touch(touch("U1", 0)).await.unwrap();
  assert!(s.get(key.clone()).await.unwrap().is_some());

  tokio::time::advance(TTL).await;
  assert!(s.get(key).await.unwrap().is_none());
  assert!(s.is_empty());
}

#[tokio::test(start_paused = true)]
async fn purge_drops_only_expired() {
  let s = MemoryPresenceStore::new();
  s.touch(touch("U1", 0)).await.unwrap();
  tokio::time::advance(Duration::from_secs(20)).await;
  s.touch(touch("U2", 20)).await.unwrap();
  tokio::time::advance(Duration::from_secs(15)).await;

  assert_eq!(s.purge_expired(), 1);
  assert_eq!(s.len(), 1);
}

// ─── Clear ───────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn clear_forces_new_episode() {
  let s   = MemoryPresenceStore::new();
  let key = TrackingKey::new("U1", "Z1");
  s.touch(touch("U1", 0)).await.unwrap();
  s.touch(touch("U1", 11)).await.unwrap();

  assert!(s.clear(key.clone()).await.unwrap());
  assert!(!s.clear(key).await.unwrap());

  let res = s.touch(touch("U1", 12)).await.unwrap();
  assert!(res.is_new);
  assert_eq!(res.duration_seconds, 0);
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_touches_flip_alerted_once() {
  let s = Arc::new(MemoryPresenceStore::new());
  s.touch(touch("U1", 0)).await.unwrap();

  let mut handles = Vec::new();
  for i in 0..64 {
    let s = Arc::clone(&s);
    handles.push(tokio::spawn(async move { s.touch(touch("U1", 20 + i % 3)).await.unwrap() }));
  }

  let mut flips = 0;
  for handle in handles {
    if handle.await.unwrap().just_alerted {
      flips += 1;
    }
  }
  assert_eq!(flips, 1);
}
