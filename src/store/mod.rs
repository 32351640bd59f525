//! Reactive book store.
//!
//! [`QueryStore`] is the process-wide half: the list cache plus the client
//! context used to reach Hardcover. Each UI surface gets its own
//! [`Surface`], which owns the debounced writes it schedules so that tearing
//! the surface down cancels them.
//!
//! Progress intents flow as: optimistic cache update, then a debounced write,
//! then (on success) invalidation and background refetch of every list that
//! shows the session.
//!
//! Coalescing is per surface: two surfaces changing the same session keep
//! separate windows. Fired writes for a session still go out one at a time
//! through lanes shared by every surface of the store.

mod cache;
mod context;
mod debounce;

pub use cache::ListState;
pub use context::ClientContext;

use cache::{BookList, EntityCache};
use debounce::{DebounceCoordinator, WriteLanes};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::config::Config;
use crate::hardcover::{
  ConfirmedSession, GatewayError, GatewayResult, ListKey, ProgressUpdate, RemoteGateway, SessionId,
};

/// Notifications for transient UI messages
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
  WriteConfirmed {
    session_id: SessionId,
    pages: u32,
  },
  WriteFailed {
    session_id: SessionId,
    pages: u32,
    error: GatewayError,
  },
}

/// Shared cache and client, cheap to clone.
#[derive(Clone)]
pub struct QueryStore {
  cache: EntityCache,
  context: ClientContext,
  lanes: WriteLanes,
  debounce_window: Duration,
  events: mpsc::UnboundedSender<StoreEvent>,
}

impl QueryStore {
  pub fn new(context: ClientContext, config: &Config) -> (Self, mpsc::UnboundedReceiver<StoreEvent>) {
    let (events, rx) = mpsc::unbounded_channel();
    let store = Self {
      cache: EntityCache::new(config.stale_time()),
      context,
      lanes: WriteLanes::default(),
      debounce_window: config.debounce(),
      events,
    };
    (store, rx)
  }

  pub fn context(&self) -> &ClientContext {
    &self.context
  }

  fn fetcher(
    &self,
    key: ListKey,
  ) -> impl FnOnce() -> BoxFuture<'static, GatewayResult<BookList>> + Send + 'static {
    let context = self.context.clone();
    move || {
      async move {
        let gateway = context.gateway()?;
        gateway.fetch_list(&key).await
      }
      .boxed()
    }
  }

  /// Load `key` if it is empty or stale and wait for the result.
  pub async fn load(&self, key: &ListKey) -> ListState {
    self.cache.load(key, self.fetcher(*key)).await
  }

  /// Refetch `key`, keeping the current data visible, and wait for the result.
  pub async fn refetch(&self, key: &ListKey) -> ListState {
    self.cache.refetch(key, self.fetcher(*key)).await
  }

  /// Current state of `key`, starting a background load when it is stale.
  pub fn get(&self, key: &ListKey) -> ListState {
    let state = self.cache.get(key);
    if !state.is_fetching() && self.cache.is_stale(key) {
      self.load_in_background(*key);
    }
    state
  }

  fn load_in_background(&self, key: ListKey) {
    let store = self.clone();
    tokio::spawn(async move {
      store.load(&key).await;
    });
  }

  fn refetch_in_background(&self, key: ListKey) {
    let store = self.clone();
    tokio::spawn(async move {
      store.refetch(&key).await;
    });
  }

  /// Refetch after a write. A refetch that was already on the wire is
  /// joined; its result predates the write and is dropped, leaving the list
  /// stale, so one more round trip is made.
  fn reconcile_in_background(&self, key: ListKey) {
    let store = self.clone();
    tokio::spawn(async move {
      let state = store.refetch(&key).await;
      if !state.is_error && store.cache.is_stale(&key) {
        debug!(list = %key.description(), "Refetching list again after write");
        store.refetch(&key).await;
      }
    });
  }

  /// Swap the active client after a credential change.
  ///
  /// Cached lists belonged to the previous credential and are cleared;
  /// subscribers stay attached and see the lists reload.
  pub fn replace_client(&self, gateway: Option<Arc<dyn RemoteGateway>>) {
    match gateway {
      Some(gateway) => self.context.connect(gateway),
      None => self.context.disconnect(),
    }
    self.cache.clear_all();
    for key in self.cache.subscribed_keys() {
      debug!(list = %key.description(), "Reloading list for new client");
      self.load_in_background(key);
    }
  }

  /// Create a surface bound to this store.
  pub fn surface(&self) -> Surface {
    Surface {
      inner: Arc::new(SurfaceInner {
        store: self.clone(),
        debounce: DebounceCoordinator::new(self.debounce_window, self.lanes.clone(), self.events.clone()),
      }),
    }
  }

  /// Reconcile the cache after the server accepted a write.
  ///
  /// When a newer write for the session is already pending, the optimistic
  /// value is kept and no refetch is started; that write will reconcile.
  fn confirm_write(&self, confirmed: &ConfirmedSession, pages: u32, newer_pending: bool) {
    let session_id = confirmed.id;
    let keys = self.cache.keys_with_session(session_id);
    self.cache.invalidate(|k| keys.contains(k));

    if !newer_pending {
      self.cache.apply_confirmed(confirmed);
      for key in keys {
        if self.cache.subscriber_count(&key) > 0 {
          debug!(list = %key.description(), "Refreshing list after write");
          self.reconcile_in_background(key);
        }
      }
    }

    let _ = self
      .events
      .send(StoreEvent::WriteConfirmed { session_id, pages });
  }
}

/// Live view of one list for a UI component.
///
/// Dropping the handle releases the subscription; a fetch it started keeps
/// running for other subscribers.
pub struct ListHandle {
  key: ListKey,
  rx: watch::Receiver<ListState>,
  store: QueryStore,
}

impl ListHandle {
  pub fn key(&self) -> &ListKey {
    &self.key
  }

  /// Current state, marking it as seen.
  pub fn state(&mut self) -> ListState {
    self.rx.borrow_and_update().clone()
  }

  /// Whether the state changed since the last [`state`](Self::state) call
  pub fn has_changed(&self) -> bool {
    self.rx.has_changed().unwrap_or(false)
  }

  /// Wait for the next change.
  pub async fn changed(&mut self) -> bool {
    self.rx.changed().await.is_ok()
  }

  /// Re-run the load after a failure, with the same parameters.
  pub fn retry(&self) {
    self.store.load_in_background(self.key);
  }

  /// Refresh in the background, keeping the current data on screen.
  pub fn refresh(&self) {
    self.store.refetch_in_background(self.key);
  }
}

struct SurfaceInner {
  store: QueryStore,
  debounce: DebounceCoordinator,
}

impl Drop for SurfaceInner {
  fn drop(&mut self) {
    self.debounce.cancel_all();
  }
}

/// One UI surface: list subscriptions plus the writes it has scheduled.
///
/// Clones share the same pending writes, which are cancelled when the last
/// clone is dropped.
#[derive(Clone)]
pub struct Surface {
  inner: Arc<SurfaceInner>,
}

impl Surface {
  /// Subscribe to `key`, loading it in the background when empty or stale.
  pub fn use_list(&self, key: ListKey) -> ListHandle {
    let store = &self.inner.store;
    let rx = store.cache.subscribe(&key);
    store.get(&key);
    ListHandle {
      key,
      rx,
      store: store.clone(),
    }
  }

  /// Move a session's page count by `delta`.
  ///
  /// Returns the new page count, or `None` when the change would go below
  /// zero (nothing is applied or scheduled). There is no upper bound here;
  /// the server clamps against the book's length.
  pub fn request_progress_change(&self, session_id: SessionId, delta: i64) -> GatewayResult<Option<u32>> {
    let current = match self.inner.debounce.pending_pages(session_id) {
      Some(pages) => pages,
      None => self
        .inner
        .store
        .cache
        .entry_for_session(session_id)
        .and_then(|entry| entry.session)
        .map(|session| session.progress_pages)
        .ok_or_else(|| {
          GatewayError::Validation(format!("reading session {} is not loaded", session_id))
        })?,
    };

    let target = i64::from(current) + delta;
    if target < 0 {
      debug!(session_id, current, delta, "Ignoring change below page zero");
      return Ok(None);
    }
    let pages = u32::try_from(target)
      .map_err(|_| GatewayError::Validation(format!("page {} is out of range", target)))?;

    self.set_progress(session_id, pages);
    Ok(Some(pages))
  }

  /// Set a session's page count, showing it at once and writing it after
  /// the debounce window.
  ///
  /// Until the write settles the value is held in the cache, so a refetch
  /// landing in between does not bring back the older count.
  pub fn set_progress(&self, session_id: SessionId, pages: u32) {
    let store = self.inner.store.clone();
    let hold = store.cache.hold(session_id, pages);
    store.cache.apply_optimistic(session_id, pages);

    let debounce = self.inner.debounce.clone();
    self.inner.debounce.schedule(session_id, pages, move |pages| async move {
      let _hold = hold;
      let gateway = store.context.gateway()?;
      let confirmed = gateway
        .write_progress(session_id, ProgressUpdate::pages(pages))
        .await?;
      info!(session_id, pages, "Progress saved");
      store.confirm_write(&confirmed, pages, debounce.is_pending(session_id));
      Ok::<(), GatewayError>(())
    });
  }

  /// Set progress as a percentage of the book's page count.
  ///
  /// The page basis is the cached edition or book page count, falling back
  /// to asking the server for the edition's page count.
  pub async fn set_progress_percentage(&self, session_id: SessionId, percentage: f64) -> GatewayResult<u32> {
    if !(0.0..=100.0).contains(&percentage) {
      return Err(GatewayError::Validation(
        "Percentage must be between 0 and 100".to_string(),
      ));
    }

    let store = &self.inner.store;
    let entry = store.cache.entry_for_session(session_id);
    let total = match entry.as_ref().and_then(|e| e.total_pages()) {
      Some(total) => Some(total),
      None => match entry.as_ref().and_then(|e| e.edition_id()) {
        Some(edition_id) => {
          let gateway = store.context.gateway()?;
          gateway.edition_page_count(edition_id).await?
        }
        None => None,
      },
    };
    let total = total
      .filter(|t| *t > 0)
      .ok_or_else(|| GatewayError::Validation("Could not determine book page count".to_string()))?;

    let pages = (percentage / 100.0 * f64::from(total)).round() as u32;
    self.set_progress(session_id, pages);
    Ok(pages)
  }

  pub fn has_pending_writes(&self) -> bool {
    self.inner.debounce.pending_count() > 0
  }

  /// Cancel every write this surface still has pending.
  pub fn teardown(&self) -> usize {
    self.inner.debounce.cancel_all()
  }
}
