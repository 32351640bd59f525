//! Per-session write coalescing.
//!
//! Every progress intent for a session replaces the pending write for that
//! session and restarts its timer. Only when the window passes without a new
//! intent is the latest value written. Writes for one session are sent one
//! at a time, in the order their timers fired, across every coordinator
//! sharing the same [`WriteLanes`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::StoreEvent;
use crate::hardcover::types::SessionId;
use crate::hardcover::GatewayResult;

/// A coalesced write waiting for its quiet period to end
struct PendingWrite {
  pages: u32,
  generation: u64,
  timer: JoinHandle<()>,
}

type Lane = Arc<tokio::sync::Mutex<()>>;

/// Per-session locks that serialize fired writes.
#[derive(Clone, Default)]
pub struct WriteLanes {
  lanes: Arc<Mutex<HashMap<SessionId, Lane>>>,
}

impl WriteLanes {
  fn lanes(&self) -> MutexGuard<'_, HashMap<SessionId, Lane>> {
    self.lanes.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn acquire(&self, session_id: SessionId) -> Lane {
    Arc::clone(self.lanes().entry(session_id).or_default())
  }

  fn release(&self, session_id: SessionId, lane: Lane) {
    let mut lanes = self.lanes();
    // Only the map and this caller still hold the lane: nobody is queued
    if Arc::strong_count(&lane) <= 2 {
      lanes.remove(&session_id);
    }
  }
}

struct Inner {
  window: Duration,
  pending: Mutex<HashMap<SessionId, PendingWrite>>,
  lanes: WriteLanes,
  next_generation: AtomicU64,
  events: mpsc::UnboundedSender<StoreEvent>,
}

/// Registry of pending progress writes keyed by session id.
#[derive(Clone)]
pub struct DebounceCoordinator {
  inner: Arc<Inner>,
}

impl DebounceCoordinator {
  /// Failures of fired writes are reported on `events`.
  pub fn new(window: Duration, lanes: WriteLanes, events: mpsc::UnboundedSender<StoreEvent>) -> Self {
    Self {
      inner: Arc::new(Inner {
        window,
        pending: Mutex::new(HashMap::new()),
        lanes,
        next_generation: AtomicU64::new(1),
        events,
      }),
    }
  }

  fn pending(&self) -> MutexGuard<'_, HashMap<SessionId, PendingWrite>> {
    self
      .inner
      .pending
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  /// Register `pages` as the value to write for `session_id`.
  ///
  /// A write already pending for the session is cancelled and replaced, so
  /// only the last value inside the window reaches `apply`.
  pub fn schedule<F, Fut>(&self, session_id: SessionId, pages: u32, apply: F)
  where
    F: FnOnce(u32) -> Fut + Send + 'static,
    Fut: Future<Output = GatewayResult<()>> + Send + 'static,
  {
    let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
    let fire_at = Instant::now() + self.inner.window;

    let mut pending = self.pending();
    if let Some(previous) = pending.remove(&session_id) {
      previous.timer.abort();
      debug!(session_id, replaced = previous.pages, pages, "Replacing pending write");
    } else {
      debug!(session_id, pages, "Scheduling write");
    }

    let coordinator = self.clone();
    let timer = tokio::spawn(async move {
      tokio::time::sleep_until(fire_at).await;
      coordinator.fire(session_id, generation, apply).await;
    });

    pending.insert(
      session_id,
      PendingWrite {
        pages,
        generation,
        timer,
      },
    );
  }

  async fn fire<F, Fut>(&self, session_id: SessionId, generation: u64, apply: F)
  where
    F: FnOnce(u32) -> Fut,
    Fut: Future<Output = GatewayResult<()>>,
  {
    let pages = {
      let mut pending = self.pending();
      // A replaced timer can wake before its abort lands
      let current = pending
        .get(&session_id)
        .is_some_and(|p| p.generation == generation);
      if !current {
        return;
      }
      let Some(write) = pending.remove(&session_id) else {
        return;
      };
      write.pages
    };
    let lane = self.inner.lanes.acquire(session_id);

    {
      let _turn = lane.lock().await;
      info!(session_id, pages, "Writing coalesced progress");
      if let Err(error) = apply(pages).await {
        warn!(session_id, pages, error = %error, "Progress write failed");
        let _ = self.inner.events.send(StoreEvent::WriteFailed {
          session_id,
          pages,
          error,
        });
      }
    }

    self.inner.lanes.release(session_id, lane);
  }

  /// Drop every pending write without sending it. Writes already on the
  /// wire are left to finish. Returns how many were dropped.
  pub fn cancel_all(&self) -> usize {
    let mut pending = self.pending();
    let count = pending.len();
    for (_, pending) in pending.drain() {
      pending.timer.abort();
    }
    if count > 0 {
      debug!(count, "Cancelled all pending writes");
    }
    count
  }

  pub fn is_pending(&self, session_id: SessionId) -> bool {
    self.pending().contains_key(&session_id)
  }

  /// Value waiting to be written for a session, if any
  pub fn pending_pages(&self, session_id: SessionId) -> Option<u32> {
    self.pending().get(&session_id).map(|p| p.pages)
  }

  pub fn pending_count(&self) -> usize {
    self.pending().len()
  }
}
