//! In-memory cache of tracked book lists.
//!
//! Each list key owns a `watch` channel carrying its [`QueryState`]. Readers
//! get the current value without blocking and subscribers are notified on
//! every change. Fetches run on spawned tasks so a caller going away never
//! cancels a read other subscribers are waiting on.
//!
//! Progress that the server has not confirmed yet is held separately and
//! laid over every fetched list, so a refresh never shows a page count older
//! than the user's last change.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::hardcover::types::{ConfirmedSession, ReadingSession, SessionId, UserBookEntry};
use crate::hardcover::{GatewayResult, ListKey};
use crate::query::QueryState;

pub type BookList = Vec<UserBookEntry>;
pub type ListState = QueryState<BookList>;

/// The fetch allowed to write its result
#[derive(Clone, Copy)]
struct InFlight {
  id: u64,
  /// Value of the entry's invalidation epoch when the fetch started
  epoch: u64,
}

struct CacheEntry {
  state: watch::Sender<ListState>,
  in_flight: Option<InFlight>,
  fetched_at: Option<Instant>,
  invalidated: bool,
  /// Bumped on every invalidation
  epoch: u64,
}

impl CacheEntry {
  fn new() -> Self {
    let (state, _) = watch::channel(ListState::default());
    Self {
      state,
      in_flight: None,
      fetched_at: None,
      invalidated: false,
      epoch: 0,
    }
  }

  fn is_stale(&self, stale_time: Duration) -> bool {
    if self.invalidated || self.state.borrow().data.is_none() {
      return true;
    }
    self
      .fetched_at
      .map(|t| t.elapsed() > stale_time)
      .unwrap_or(true)
  }
}

/// Unconfirmed page count for a session
#[derive(Clone, Copy)]
struct Held {
  token: u64,
  pages: u32,
}

struct Inner {
  entries: Mutex<HashMap<ListKey, CacheEntry>>,
  // Lock order: `entries` before `held`
  held: Mutex<HashMap<SessionId, Held>>,
  next_fetch_id: AtomicU64,
  next_hold_token: AtomicU64,
  stale_time: Duration,
}

/// Shared cache of book lists keyed by [`ListKey`].
#[derive(Clone)]
pub struct EntityCache {
  inner: Arc<Inner>,
}

#[derive(Clone, Copy)]
enum FetchMode {
  /// Fetch only when empty or stale
  Load,
  /// Always fetch, keeping current data visible
  Refetch,
}

impl EntityCache {
  pub fn new(stale_time: Duration) -> Self {
    Self {
      inner: Arc::new(Inner {
        entries: Mutex::new(HashMap::new()),
        held: Mutex::new(HashMap::new()),
        next_fetch_id: AtomicU64::new(1),
        next_hold_token: AtomicU64::new(1),
        stale_time,
      }),
    }
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<ListKey, CacheEntry>> {
    // Critical sections never panic mid-update, the map is still consistent
    self
      .inner
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  fn held(&self) -> MutexGuard<'_, HashMap<SessionId, Held>> {
    self
      .inner
      .held
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  /// Keep `pages` as the session's page count across refetches until the
  /// returned guard is dropped or a newer hold replaces it.
  pub fn hold(&self, session_id: SessionId, pages: u32) -> HeldProgress {
    let token = self.inner.next_hold_token.fetch_add(1, Ordering::Relaxed);
    self.held().insert(session_id, Held { token, pages });
    HeldProgress {
      cache: self.clone(),
      session_id,
      token,
    }
  }

  #[cfg(test)]
  pub fn held_pages(&self, session_id: SessionId) -> Option<u32> {
    self.held().get(&session_id).map(|h| h.pages)
  }

  fn release(&self, session_id: SessionId, token: u64) {
    let mut held = self.held();
    if held.get(&session_id).is_some_and(|h| h.token == token) {
      held.remove(&session_id);
    }
  }

  /// Current state for `key`. Never blocks on the network.
  pub fn get(&self, key: &ListKey) -> ListState {
    self
      .entries()
      .get(key)
      .map(|e| e.state.borrow().clone())
      .unwrap_or_default()
  }

  /// Subscribe to changes for `key`, creating an empty entry if needed.
  pub fn subscribe(&self, key: &ListKey) -> watch::Receiver<ListState> {
    self
      .entries()
      .entry(*key)
      .or_insert_with(CacheEntry::new)
      .state
      .subscribe()
  }

  /// Whether the next read of `key` should go to the server
  pub fn is_stale(&self, key: &ListKey) -> bool {
    self
      .entries()
      .get(key)
      .map(|e| e.is_stale(self.inner.stale_time))
      .unwrap_or(true)
  }

  /// Number of live subscribers for `key`
  pub fn subscriber_count(&self, key: &ListKey) -> usize {
    self
      .entries()
      .get(key)
      .map(|e| e.state.receiver_count())
      .unwrap_or(0)
  }

  /// Keys with at least one live subscriber
  pub fn subscribed_keys(&self) -> Vec<ListKey> {
    self
      .entries()
      .iter()
      .filter(|(_, entry)| entry.state.receiver_count() > 0)
      .map(|(key, _)| *key)
      .collect()
  }

  /// Make sure `key` holds data, fetching when it is empty or stale.
  ///
  /// An empty entry enters `is_loading`; stale data is refreshed in place
  /// with `is_refetching`. If a fetch for `key` is already running, this
  /// waits for it instead of starting another.
  pub async fn load<F, Fut>(&self, key: &ListKey, fetch: F) -> ListState
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = GatewayResult<BookList>> + Send + 'static,
  {
    self.run(key, FetchMode::Load, fetch).await
  }

  /// Fetch `key` again while keeping the current data visible.
  pub async fn refetch<F, Fut>(&self, key: &ListKey, fetch: F) -> ListState
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = GatewayResult<BookList>> + Send + 'static,
  {
    self.run(key, FetchMode::Refetch, fetch).await
  }

  async fn run<F, Fut>(&self, key: &ListKey, mode: FetchMode, fetch: F) -> ListState
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = GatewayResult<BookList>> + Send + 'static,
  {
    let rx = {
      let mut entries = self.entries();
      let entry = entries.entry(*key).or_insert_with(CacheEntry::new);
      let rx = entry.state.subscribe();

      let (fetching, has_data) = {
        let state = entry.state.borrow();
        (state.is_fetching(), state.data.is_some())
      };

      if fetching {
        debug!(list = %key.description(), "Joining in-flight fetch");
      } else {
        let refetch = match mode {
          FetchMode::Load if has_data && !entry.is_stale(self.inner.stale_time) => {
            return entry.state.borrow().clone();
          }
          FetchMode::Load => has_data,
          FetchMode::Refetch => true,
        };

        let fetch_id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        entry.in_flight = Some(InFlight {
          id: fetch_id,
          epoch: entry.epoch,
        });
        entry.state.send_modify(|s| s.begin(refetch));
        debug!(list = %key.description(), refetch, "Starting fetch");

        let cache = self.clone();
        let key = *key;
        tokio::spawn(async move {
          let result = fetch().await;
          cache.finish(&key, fetch_id, result);
        });
      }
      rx
    };

    settle(rx).await
  }

  fn finish(&self, key: &ListKey, fetch_id: u64, result: GatewayResult<BookList>) {
    let mut entries = self.entries();
    let Some(entry) = entries
      .get_mut(key)
      .filter(|e| e.in_flight.is_some_and(|f| f.id == fetch_id))
    else {
      debug!(list = %key.description(), "Discarding result of superseded fetch");
      return;
    };
    let started_epoch = entry.in_flight.take().map_or(entry.epoch, |f| f.epoch);
    // Invalidated after this fetch read the server: the result may predate
    // a confirmed write
    let predates_invalidation = started_epoch != entry.epoch;
    let has_data = entry.state.borrow().data.is_some();

    match result {
      Ok(_) if predates_invalidation && has_data => {
        debug!(list = %key.description(), "Dropping result read before invalidation");
        entry.state.send_modify(|s| s.abandon());
      }
      Ok(mut books) => {
        debug!(list = %key.description(), count = books.len(), "Fetch succeeded");
        overlay_held(&mut books, &self.held());
        entry.fetched_at = Some(Instant::now());
        entry.invalidated = predates_invalidation;
        entry.state.send_modify(|s| s.succeed(books));
      }
      Err(e) => {
        warn!(list = %key.description(), error = %e, "Fetch failed");
        entry.state.send_modify(|s| s.fail(e));
      }
    }
  }

  /// Set the page count of a session everywhere it appears.
  ///
  /// Percentages are recomputed from each entry's page basis. Subscribers
  /// are only notified when something actually changed; returns whether it
  /// did.
  pub fn apply_optimistic(&self, session_id: SessionId, pages: u32) -> bool {
    self.update_sessions(session_id, |entry_total, session| {
      session.apply_pages(pages, entry_total)
    })
  }

  /// Reconcile a session with the values the server confirmed.
  pub fn apply_confirmed(&self, confirmed: &ConfirmedSession) -> bool {
    self.update_sessions(confirmed.id, |entry_total, session| {
      session.apply_confirmed(confirmed, entry_total)
    })
  }

  fn update_sessions<F>(&self, session_id: SessionId, mut apply: F) -> bool
  where
    F: FnMut(Option<u32>, &mut ReadingSession) -> bool,
  {
    let entries = self.entries();
    let mut changed = false;

    for entry in entries.values() {
      changed |= entry.state.send_if_modified(|state| {
        let Some(books) = state.data.as_mut() else {
          return false;
        };
        let mut modified = false;
        for book in books.iter_mut() {
          let total = book.total_pages();
          if let Some(session) = book.session.as_mut().filter(|s| s.id == session_id) {
            modified |= apply(total, session);
          }
        }
        modified
      });
    }

    changed
  }

  /// Cached entry holding `session_id`, from any list
  pub fn entry_for_session(&self, session_id: SessionId) -> Option<UserBookEntry> {
    self.entries().values().find_map(|entry| {
      entry.state.borrow().data.as_ref().and_then(|books| {
        books
          .iter()
          .find(|b| b.session.as_ref().is_some_and(|s| s.id == session_id))
          .cloned()
      })
    })
  }

  /// Keys of every list that currently contains `session_id`
  pub fn keys_with_session(&self, session_id: SessionId) -> Vec<ListKey> {
    self
      .entries()
      .iter()
      .filter(|(_, entry)| {
        entry.state.borrow().data.as_ref().is_some_and(|books| {
          books
            .iter()
            .any(|b| b.session.as_ref().is_some_and(|s| s.id == session_id))
        })
      })
      .map(|(key, _)| *key)
      .collect()
  }

  /// Mark matching keys stale. Returns the keys that were marked.
  pub fn invalidate<P>(&self, predicate: P) -> Vec<ListKey>
  where
    P: Fn(&ListKey) -> bool,
  {
    let mut entries = self.entries();
    let mut marked = Vec::new();
    for (key, entry) in entries.iter_mut().filter(|(key, _)| predicate(key)) {
      entry.invalidated = true;
      entry.epoch += 1;
      marked.push(*key);
    }
    debug!(count = marked.len(), "Invalidated lists");
    marked
  }

  /// Reset every list, dropping in-flight results and keeping
  /// subscriptions alive.
  pub fn clear_all(&self) {
    let mut entries = self.entries();
    for entry in entries.values_mut() {
      entry.in_flight = None;
      entry.fetched_at = None;
      entry.invalidated = false;
      entry.state.send_replace(ListState::default());
    }
  }
}

/// Guard for a held page count; dropping it releases the hold unless a
/// newer one replaced it.
pub struct HeldProgress {
  cache: EntityCache,
  session_id: SessionId,
  token: u64,
}

impl Drop for HeldProgress {
  fn drop(&mut self) {
    self.cache.release(self.session_id, self.token);
  }
}

fn overlay_held(books: &mut BookList, held: &HashMap<SessionId, Held>) {
  if held.is_empty() {
    return;
  }
  for book in books.iter_mut() {
    let total = book.total_pages();
    if let Some(session) = book.session.as_mut() {
      if let Some(h) = held.get(&session.id) {
        session.apply_pages(h.pages, total);
      }
    }
  }
}

/// Wait until no fetch is running and return the resulting state.
async fn settle(mut rx: watch::Receiver<ListState>) -> ListState {
  if let Ok(state) = rx.wait_for(|s| !s.is_fetching()).await {
    return (*state).clone();
  }
  let state = rx.borrow().clone();
  state
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::hardcover::GatewayError;
  use crate::testing::{book_entry, reading_key};
  use futures::future::BoxFuture;
  use futures::FutureExt;
  use std::sync::atomic::AtomicUsize;

  fn counted_fetch(
    calls: &Arc<AtomicUsize>,
    delay: Duration,
    result: GatewayResult<BookList>,
  ) -> impl FnOnce() -> BoxFuture<'static, GatewayResult<BookList>> + Send + 'static {
    let calls = Arc::clone(calls);
    move || {
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        result
      }
      .boxed()
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_concurrent_loads_share_one_fetch() {
    let cache = EntityCache::new(Duration::from_secs(300));
    let key = reading_key();
    let calls = Arc::new(AtomicUsize::new(0));
    let books = vec![book_entry(1, 100, 10, Some(200))];

    let (a, b, c) = tokio::join!(
      cache.load(&key, counted_fetch(&calls, Duration::from_millis(50), Ok(books.clone()))),
      cache.load(&key, counted_fetch(&calls, Duration::from_millis(50), Ok(Vec::new()))),
      cache.load(&key, counted_fetch(&calls, Duration::from_millis(50), Ok(Vec::new()))),
    );

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.data(), Some(&books));
    assert_eq!(a, b);
    assert_eq!(b, c);
  }

  #[tokio::test(start_paused = true)]
  async fn test_fresh_load_does_not_refetch() {
    let cache = EntityCache::new(Duration::from_secs(300));
    let key = reading_key();
    let calls = Arc::new(AtomicUsize::new(0));

    cache
      .load(&key, counted_fetch(&calls, Duration::ZERO, Ok(Vec::new())))
      .await;
    let state = cache
      .load(&key, counted_fetch(&calls, Duration::ZERO, Ok(Vec::new())))
      .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(state.is_success());
  }

  #[tokio::test(start_paused = true)]
  async fn test_first_load_failure() {
    let cache = EntityCache::new(Duration::from_secs(300));
    let key = reading_key();
    let calls = Arc::new(AtomicUsize::new(0));
    let error = GatewayError::Network("connection refused".to_string());

    let state = cache
      .load(&key, counted_fetch(&calls, Duration::ZERO, Err(error.clone())))
      .await;

    assert_eq!(state.data(), None);
    assert!(state.is_error);
    assert!(!state.is_loading);
    assert_eq!(state.error(), Some(&error));

    // A retry goes back to the server
    let state = cache
      .load(&key, counted_fetch(&calls, Duration::ZERO, Ok(Vec::new())))
      .await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(state.is_success());
  }

  #[tokio::test(start_paused = true)]
  async fn test_refetch_keeps_data_while_in_flight() {
    let cache = EntityCache::new(Duration::from_secs(300));
    let key = reading_key();
    let calls = Arc::new(AtomicUsize::new(0));
    let old = vec![book_entry(1, 100, 10, Some(200))];
    let new = vec![book_entry(1, 100, 42, Some(200))];

    cache
      .load(&key, counted_fetch(&calls, Duration::ZERO, Ok(old.clone())))
      .await;

    let refetch = {
      let cache = cache.clone();
      let fetch = counted_fetch(&calls, Duration::from_millis(100), Ok(new.clone()));
      tokio::spawn(async move { cache.refetch(&key, fetch).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let during = cache.get(&key);
    assert!(during.is_refetching);
    assert!(!during.is_loading);
    assert_eq!(during.data(), Some(&old));

    let after = refetch.await.unwrap();
    assert!(!after.is_refetching);
    assert_eq!(after.data(), Some(&new));
  }

  #[tokio::test(start_paused = true)]
  async fn test_refetch_failure_keeps_data() {
    let cache = EntityCache::new(Duration::from_secs(300));
    let key = reading_key();
    let calls = Arc::new(AtomicUsize::new(0));
    let books = vec![book_entry(1, 100, 10, Some(200))];

    cache
      .load(&key, counted_fetch(&calls, Duration::ZERO, Ok(books.clone())))
      .await;
    let state = cache
      .refetch(
        &key,
        counted_fetch(
          &calls,
          Duration::ZERO,
          Err(GatewayError::GraphQl("boom".to_string())),
        ),
      )
      .await;

    assert!(state.is_error);
    assert_eq!(state.data(), Some(&books));
  }

  #[tokio::test(start_paused = true)]
  async fn test_invalidate_forces_next_load() {
    let cache = EntityCache::new(Duration::from_secs(300));
    let key = reading_key();
    let calls = Arc::new(AtomicUsize::new(0));

    cache
      .load(&key, counted_fetch(&calls, Duration::ZERO, Ok(Vec::new())))
      .await;
    assert!(!cache.is_stale(&key));

    assert_eq!(cache.invalidate(|k| *k == key), vec![key]);
    assert!(cache.is_stale(&key));

    cache
      .load(&key, counted_fetch(&calls, Duration::ZERO, Ok(Vec::new())))
      .await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!cache.is_stale(&key));
  }

  #[tokio::test(start_paused = true)]
  async fn test_data_goes_stale_after_stale_time() {
    let cache = EntityCache::new(Duration::from_secs(60));
    let key = reading_key();
    let calls = Arc::new(AtomicUsize::new(0));

    cache
      .load(&key, counted_fetch(&calls, Duration::ZERO, Ok(Vec::new())))
      .await;
    assert!(!cache.is_stale(&key));

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(cache.is_stale(&key));
  }

  #[tokio::test(start_paused = true)]
  async fn test_apply_optimistic_updates_every_list() {
    let cache = EntityCache::new(Duration::from_secs(300));
    let reading = reading_key();
    let other = ListKey::new(crate::hardcover::BookStatus::Reading, 50, None).unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    for key in [&reading, &other] {
      cache
        .load(
          key,
          counted_fetch(
            &calls,
            Duration::ZERO,
            Ok(vec![book_entry(1, 100, 10, Some(200)), book_entry(2, 200, 5, None)]),
          ),
        )
        .await;
    }

    assert!(cache.apply_optimistic(100, 50));
    for key in [&reading, &other] {
      let state = cache.get(key);
      let session = state.data().unwrap()[0].session.clone().unwrap();
      assert_eq!(session.progress_pages, 50);
      assert_eq!(session.progress, 25.0);
      // Untouched neighbour
      assert_eq!(state.data().unwrap()[1].session.as_ref().unwrap().progress_pages, 5);
    }

    let mut keys = cache.keys_with_session(100);
    keys.sort_by_key(|k| k.limit);
    assert_eq!(keys, vec![reading, other]);
  }

  #[tokio::test(start_paused = true)]
  async fn test_apply_optimistic_is_idempotent() {
    let cache = EntityCache::new(Duration::from_secs(300));
    let key = reading_key();
    let calls = Arc::new(AtomicUsize::new(0));
    cache
      .load(
        &key,
        counted_fetch(&calls, Duration::ZERO, Ok(vec![book_entry(1, 100, 10, Some(200))])),
      )
      .await;

    let mut rx = cache.subscribe(&key);
    rx.borrow_and_update();

    assert!(cache.apply_optimistic(100, 13));
    let once = cache.get(&key);
    assert!(rx.has_changed().unwrap());
    rx.borrow_and_update();

    assert!(!cache.apply_optimistic(100, 13));
    assert_eq!(cache.get(&key), once);
    assert!(!rx.has_changed().unwrap());
  }

  #[tokio::test(start_paused = true)]
  async fn test_apply_optimistic_unknown_session() {
    let cache = EntityCache::new(Duration::from_secs(300));
    assert!(!cache.apply_optimistic(999, 1));
    assert!(cache.entry_for_session(999).is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn test_clear_all_discards_in_flight_result() {
    let cache = EntityCache::new(Duration::from_secs(300));
    let key = reading_key();
    let calls = Arc::new(AtomicUsize::new(0));

    let load = {
      let cache = cache.clone();
      let fetch = counted_fetch(
        &calls,
        Duration::from_millis(100),
        Ok(vec![book_entry(1, 100, 10, None)]),
      );
      tokio::spawn(async move { cache.load(&key, fetch).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    cache.clear_all();
    let state = load.await.unwrap();
    assert_eq!(state, ListState::default());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(cache.get(&key), ListState::default());
  }

  #[tokio::test(start_paused = true)]
  async fn test_held_pages_survive_refetch() {
    let cache = EntityCache::new(Duration::from_secs(300));
    let key = reading_key();
    let calls = Arc::new(AtomicUsize::new(0));
    cache
      .load(&key, counted_fetch(&calls, Duration::ZERO, Ok(vec![book_entry(1, 100, 10, Some(200))])))
      .await;

    let hold = cache.hold(100, 30);
    cache.apply_optimistic(100, 30);
    let state = cache
      .refetch(&key, counted_fetch(&calls, Duration::ZERO, Ok(vec![book_entry(1, 100, 10, Some(200))])))
      .await;
    let session = state.data().unwrap()[0].session.clone().unwrap();
    assert_eq!(session.progress_pages, 30);
    assert_eq!(session.progress, 15.0);

    drop(hold);
    assert_eq!(cache.held_pages(100), None);
    let state = cache
      .refetch(&key, counted_fetch(&calls, Duration::ZERO, Ok(vec![book_entry(1, 100, 10, Some(200))])))
      .await;
    assert_eq!(state.data().unwrap()[0].session.as_ref().unwrap().progress_pages, 10);
  }

  #[tokio::test(start_paused = true)]
  async fn test_replaced_hold_is_not_released_by_older_guard() {
    let cache = EntityCache::new(Duration::from_secs(300));
    let first = cache.hold(100, 11);
    let _second = cache.hold(100, 12);
    drop(first);
    assert_eq!(cache.held_pages(100), Some(12));
  }

  #[tokio::test(start_paused = true)]
  async fn test_result_read_before_invalidation_is_dropped() {
    let cache = EntityCache::new(Duration::from_secs(300));
    let key = reading_key();
    let calls = Arc::new(AtomicUsize::new(0));
    cache
      .load(&key, counted_fetch(&calls, Duration::ZERO, Ok(vec![book_entry(1, 100, 10, Some(200))])))
      .await;

    let refetch = {
      let cache = cache.clone();
      let fetch = counted_fetch(
        &calls,
        Duration::from_millis(100),
        Ok(vec![book_entry(1, 100, 10, Some(200))]),
      );
      tokio::spawn(async move { cache.refetch(&key, fetch).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // A write confirmed while the refetch is on the wire
    cache.apply_optimistic(100, 15);
    cache.invalidate(|k| *k == key);

    let state = refetch.await.unwrap();
    assert!(!state.is_fetching());
    assert_eq!(state.data().unwrap()[0].session.as_ref().unwrap().progress_pages, 15);
    assert!(cache.is_stale(&key));

    cache
      .refetch(&key, counted_fetch(&calls, Duration::ZERO, Ok(vec![book_entry(1, 100, 15, Some(200))])))
      .await;
    assert!(!cache.is_stale(&key));
  }
}
