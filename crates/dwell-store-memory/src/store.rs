//! [`MemoryPresenceStore`], the in-memory implementation of [`PresenceStore`].

use std::{
  convert::Infallible,
  sync::atomic::{AtomicU64, Ordering},
};

use dashmap::{DashMap, mapref::entry::Entry};
use dwell_core::{
  store::PresenceStore,
  tracking::{Touch, TouchResult, TrackingKey, TrackingRecord},
};
use tokio::time::Instant;

/// Touches between opportunistic sweeps of expired records.
const PURGE_EVERY: u64 = 1024;

struct Slot {
  record:     TrackingRecord,
  /// `None` when the TTL is too large to represent.
  expires_at: Option<Instant>,
}

impl Slot {
  fn is_live(&self, now: Instant) -> bool { self.expires_at.is_none_or(|at| at > now) }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Tracking records held in a [`DashMap`].
///
/// A touch runs entirely under the shard lock of its key's entry, so the
/// read, the conditional write and the TTL refresh are one atomic unit.
/// Expiry is measured on the tokio clock and enforced lazily on access, with
/// a periodic sweep to bound memory for subjects that never come back.
#[derive(Default)]
pub struct MemoryPresenceStore {
  slots:   DashMap<TrackingKey, Slot>,
  touches: AtomicU64,
}

impl MemoryPresenceStore {
  pub fn new() -> Self { Self::default() }

  /// Number of live records.
  pub fn len(&self) -> usize {
    let now = Instant::now();
    self.slots.iter().filter(|slot| slot.is_live(now)).count()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Drop every expired record. Returns how many were removed.
  pub fn purge_expired(&self) -> usize {
    let now    = Instant::now();
    let before = self.slots.len();
    self.slots.retain(|_, slot| slot.is_live(now));
    before.saturating_sub(self.slots.len())
  }
}

impl PresenceStore for MemoryPresenceStore {
  type Error = Infallible;

  async fn touch(&self, touch: Touch) -> Result<TouchResult, Infallible> {
    let now        = Instant::now();
    let expires_at = now.checked_add(touch.idle_ttl);

    let result = match self.slots.entry(touch.key.clone()) {
      Entry::Occupied(mut entry) => {
        let live = entry.get().is_live(now).then(|| entry.get().record.clone());
        let (record, result) = touch.apply(live);
        entry.insert(Slot { record, expires_at });
        result
      }
      Entry::Vacant(entry) => {
        let (record, result) = touch.apply(None);
        entry.insert(Slot { record, expires_at });
        result
      }
    };

    // The entry guard is released above; sweeping takes every shard lock.
    if self.touches.fetch_add(1, Ordering::Relaxed) % PURGE_EVERY == PURGE_EVERY - 1 {
      self.purge_expired();
    }

    Ok(result)
  }

  async fn get(&self, key: TrackingKey) -> Result<Option<TrackingRecord>, Infallible> {
    let now = Instant::now();
    {
      let Some(slot) = self.slots.get(&key) else { return Ok(None) };
      if slot.is_live(now) {
        return Ok(Some(slot.record.clone()));
      }
    }
    self.slots.remove_if(&key, |_, slot| !slot.is_live(now));
    Ok(None)
  }

  async fn clear(&self, key: TrackingKey) -> Result<bool, Infallible> {
    let now = Instant::now();
    Ok(
      self
        .slots
        .remove(&key)
        .is_some_and(|(_, slot)| slot.is_live(now)),
    )
  }
}
