//! Background writer for confirmed violations.
//!
//! [`ViolationPersister::persist`] never waits on the durable log: it puts the
//! violation on a bounded channel and returns. A small pool of workers drains
//! the channel into the [`ViolationLog`]. A full queue or a failed write is
//! logged and counted, and the row is lost.

use std::{
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use dwell_core::{store::ViolationLog, violation::NewViolation};
use serde::Serialize;
use tokio::{
  runtime::Handle,
  sync::mpsc::{self, error::TrySendError},
  task::JoinSet,
  time::timeout,
};
use tracing::{debug, error, info, warn};

use crate::{Error, Result, stats::Statistics};

type Receiver = Arc<tokio::sync::Mutex<mpsc::Receiver<NewViolation>>>;

/// Outcome of [`ViolationPersister::shutdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainSummary {
  /// Whether every worker finished inside the grace period.
  pub clean:     bool,
  /// Violations still queued or mid-write when the workers were aborted.
  pub abandoned: u64,
}

pub struct ViolationPersister {
  sender:  Mutex<Option<mpsc::Sender<NewViolation>>>,
  workers: Mutex<JoinSet<()>>,
  /// Accepted onto the queue but not yet finished by a worker.
  pending: Arc<AtomicUsize>,
  stats:   Arc<Statistics>,
}

impl ViolationPersister {
  /// Spawn `workers` writers on the current tokio runtime.
  pub fn start<L>(
    log: Arc<L>,
    capacity: usize,
    workers: usize,
    stats: Arc<Statistics>,
  ) -> Result<Self>
  where
    L: ViolationLog + 'static,
  {
    let handle = Handle::try_current()
      .map_err(|_| Error::Config("the engine must be created inside a tokio runtime".into()))?;

    let (tx, rx) = mpsc::channel(capacity);
    let rx: Receiver = Arc::new(tokio::sync::Mutex::new(rx));
    let pending = Arc::new(AtomicUsize::new(0));

    let mut set = JoinSet::new();
    for worker in 0..workers {
      set.spawn_on(
        run_worker(
          worker,
          Arc::clone(&log),
          Arc::clone(&rx),
          Arc::clone(&pending),
          Arc::clone(&stats),
        ),
        &handle,
      );
    }
    debug!(workers, capacity, "violation persister started");

    Ok(Self {
      sender: Mutex::new(Some(tx)),
      workers: Mutex::new(set),
      pending,
      stats,
    })
  }

  /// Queue `violation` for the background writers without waiting.
  pub fn persist(&self, violation: NewViolation) {
    let sender = lock(&self.sender);
    let Some(tx) = sender.as_ref() else {
      error!(
        subject_id = %violation.subject_id,
        zone_id = %violation.zone_id,
        "violation persister is shut down; dropping violation"
      );
      self.stats.record_persistence_failures(1);
      return;
    };

    // Count before sending so a fast worker can never decrement first.
    self.pending.fetch_add(1, Ordering::SeqCst);
    if let Err(e) = tx.try_send(violation) {
      self.pending.fetch_sub(1, Ordering::SeqCst);
      self.stats.record_persistence_failures(1);
      let (reason, violation) = match e {
        TrySendError::Full(v) => ("queue full", v),
        TrySendError::Closed(v) => ("queue closed", v),
      };
      error!(
        subject_id = %violation.subject_id,
        zone_id = %violation.zone_id,
        reason,
        "dropping violation"
      );
    }
  }

  /// Violations accepted but not yet written.
  pub fn pending(&self) -> usize { self.pending.load(Ordering::SeqCst) }

  /// Close the queue and give the workers `grace` to drain it. Workers still
  /// running afterwards are aborted and their rows counted as failures.
  ///
  /// Calling this twice is harmless; the second call finds nothing to do.
  pub async fn shutdown(&self, grace: Duration) -> DrainSummary {
    drop(lock(&self.sender).take());
    let mut workers = std::mem::take(&mut *lock(&self.workers));

    let drained = timeout(grace, async {
      while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
          error!(error = %e, "violation writer terminated abnormally");
        }
      }
    })
    .await
    .is_ok();

    if !drained {
      workers.abort_all();
      while workers.join_next().await.is_some() {}
    }

    let abandoned = self.pending.swap(0, Ordering::SeqCst) as u64;
    if abandoned > 0 {
      self.stats.record_persistence_failures(abandoned);
      warn!(abandoned, grace_ms = grace.as_millis() as u64, "abandoned unwritten violations");
    }
    info!(clean = drained, abandoned, "violation persister stopped");

    DrainSummary { clean: drained, abandoned }
  }
}

async fn run_worker<L: ViolationLog>(
  worker: usize,
  log: Arc<L>,
  rx: Receiver,
  pending: Arc<AtomicUsize>,
  stats: Arc<Statistics>,
) {
  loop {
    // Only one idle worker waits on the channel at a time.
    let next = rx.lock().await.recv().await;
    let Some(violation) = next else { break };

    let subject_id = violation.subject_id.clone();
    let zone_id    = violation.zone_id.clone();
    match log.append(violation).await {
      Ok(entry) => {
        stats.record_persisted();
        debug!(worker, id = %entry.id, %subject_id, %zone_id, "violation persisted");
      }
      Err(e) => {
        stats.record_persistence_failures(1);
        error!(worker, %subject_id, %zone_id, error = %e, "failed to persist violation");
      }
    }
    pending.fetch_sub(1, Ordering::SeqCst);
  }
  debug!(worker, "violation writer finished");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
