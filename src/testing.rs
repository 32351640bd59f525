//! Fixtures and an in-memory gateway for tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::hardcover::params::{BookStatus, ListKey};
use crate::hardcover::types::{percentage_of, Book, Edition, EditionId, ReadingSession};
use crate::hardcover::{
  ConfirmedSession, GatewayError, GatewayResult, ProgressUpdate, RemoteGateway, SessionId,
  UserBookEntry,
};

pub fn reading_key() -> ListKey {
  ListKey::new(BookStatus::Reading, 10, None).unwrap()
}

/// A reading entry whose session edition has `total` pages
pub fn book_entry(book_id: i64, session_id: SessionId, pages: u32, total: Option<u32>) -> UserBookEntry {
  UserBookEntry {
    book: Book {
      id: book_id,
      title: format!("Book {}", book_id),
      cover_url: None,
      pages: None,
    },
    edition: None,
    session: Some(ReadingSession {
      id: session_id,
      progress_pages: pages,
      progress: total.map(|t| percentage_of(pages, t)).unwrap_or(0.0),
      edition: total.map(|pages| Edition {
        id: book_id * 10,
        pages: Some(pages),
        cover_url: None,
      }),
      started_at: None,
      is_reading: true,
    }),
  }
}

/// Gateway double that records calls and behaves like a tiny server.
///
/// Fetches read the stored list when they start; successful writes update
/// it when they arrive, before their latency elapses.
pub struct FakeGateway {
  books: Mutex<Vec<UserBookEntry>>,
  fetch_failures: Mutex<VecDeque<GatewayError>>,
  write_failures: Mutex<VecDeque<GatewayError>>,
  page_counts: Mutex<HashMap<EditionId, u32>>,
  fetches: Mutex<Vec<ListKey>>,
  writes: Mutex<Vec<(SessionId, ProgressUpdate)>>,
  latency: Duration,
  write_latency: Duration,
}

impl FakeGateway {
  pub fn new(books: Vec<UserBookEntry>) -> Self {
    Self {
      books: Mutex::new(books),
      fetch_failures: Mutex::new(VecDeque::new()),
      write_failures: Mutex::new(VecDeque::new()),
      page_counts: Mutex::new(HashMap::new()),
      fetches: Mutex::new(Vec::new()),
      writes: Mutex::new(Vec::new()),
      latency: Duration::from_millis(20),
      write_latency: Duration::from_millis(20),
    }
  }

  /// Latency of every call
  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = latency;
    self.write_latency = latency;
    self
  }

  pub fn with_write_latency(mut self, latency: Duration) -> Self {
    self.write_latency = latency;
    self
  }

  pub fn with_page_count(self, edition_id: EditionId, pages: u32) -> Self {
    self.page_counts.lock().unwrap().insert(edition_id, pages);
    self
  }

  pub fn fail_next_fetch(&self, error: GatewayError) {
    self.fetch_failures.lock().unwrap().push_back(error);
  }

  pub fn fail_next_write(&self, error: GatewayError) {
    self.write_failures.lock().unwrap().push_back(error);
  }

  /// Change server-side progress behind the client's back
  pub fn set_server_pages(&self, session_id: SessionId, pages: u32) {
    let mut books = self.books.lock().unwrap();
    for book in books.iter_mut() {
      let total = book.total_pages();
      if let Some(session) = book.session.as_mut().filter(|s| s.id == session_id) {
        session.apply_pages(pages, total);
      }
    }
  }

  pub fn fetches(&self) -> Vec<ListKey> {
    self.fetches.lock().unwrap().clone()
  }

  pub fn writes(&self) -> Vec<(SessionId, ProgressUpdate)> {
    self.writes.lock().unwrap().clone()
  }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
  async fn fetch_list(&self, key: &ListKey) -> GatewayResult<Vec<UserBookEntry>> {
    self.fetches.lock().unwrap().push(*key);
    let result = match self.fetch_failures.lock().unwrap().pop_front() {
      Some(error) => Err(error),
      None => {
        let books = self.books.lock().unwrap();
        Ok(books.iter().take(key.limit as usize).cloned().collect())
      }
    };
    tokio::time::sleep(self.latency).await;
    result
  }

  async fn write_progress(
    &self,
    session_id: SessionId,
    update: ProgressUpdate,
  ) -> GatewayResult<ConfirmedSession> {
    self.writes.lock().unwrap().push((session_id, update));

    let failure = self.write_failures.lock().unwrap().pop_front();
    if let Some(error) = failure {
      tokio::time::sleep(self.write_latency).await;
      return Err(error);
    }

    let pages = update.pages.unwrap_or(0);
    self.set_server_pages(session_id, pages);

    let confirmed = {
      let books = self.books.lock().unwrap();
      let session = books
        .iter()
        .filter_map(|b| b.session.as_ref())
        .find(|s| s.id == session_id);
      ConfirmedSession {
        id: session_id,
        progress_pages: Some(pages),
        progress: session.map(|s| s.progress),
        edition_id: session.and_then(|s| s.edition.as_ref()).map(|e| e.id),
      }
    };
    tokio::time::sleep(self.write_latency).await;
    Ok(confirmed)
  }

  async fn edition_page_count(&self, edition_id: EditionId) -> GatewayResult<Option<u32>> {
    tokio::time::sleep(self.latency).await;
    Ok(self.page_counts.lock().unwrap().get(&edition_id).copied())
  }
}
