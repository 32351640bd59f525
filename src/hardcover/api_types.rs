//! Serde-deserializable types matching Hardcover GraphQL responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use chrono::NaiveDate;
use serde::Deserialize;

use super::params::BookStatus;
use super::types::{Book, ConfirmedSession, Edition, ReadingSession, UserBookEntry};

// ============================================================================
// GraphQL envelope
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
  pub data: Option<T>,
  #[serde(default)]
  pub errors: Vec<ApiGraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiGraphQlError {
  pub message: String,
  #[serde(default)]
  pub extensions: Option<ApiErrorExtensions>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorExtensions {
  pub code: Option<String>,
}

impl ApiGraphQlError {
  pub fn code(&self) -> Option<&str> {
    self.extensions.as_ref().and_then(|e| e.code.as_deref())
  }
}

// ============================================================================
// Common nested field types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiImage {
  pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiEdition {
  pub id: i64,
  pub pages: Option<u32>,
  pub image: Option<ApiImage>,
}

impl From<ApiEdition> for Edition {
  fn from(e: ApiEdition) -> Self {
    Edition {
      id: e.id,
      pages: e.pages,
      cover_url: e.image.and_then(|i| i.url),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiBook {
  pub id: i64,
  pub title: Option<String>,
  pub pages: Option<u32>,
  pub image: Option<ApiImage>,
}

// ============================================================================
// GetUserBooks
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiUserBooksData {
  #[serde(default)]
  pub me: Vec<ApiMe>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMe {
  #[serde(default)]
  pub user_books: Vec<ApiUserBook>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUserBook {
  pub book: ApiBook,
  pub status_id: Option<i64>,
  pub edition: Option<ApiEdition>,
  #[serde(default)]
  pub user_book_reads: Vec<ApiUserBookRead>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUserBookRead {
  pub id: i64,
  pub progress_pages: Option<u32>,
  pub progress: Option<f64>,
  pub started_at: Option<NaiveDate>,
  pub edition: Option<ApiEdition>,
}

impl ApiUserBooksData {
  /// Flatten `me[0].user_books` into domain entries
  pub fn into_entries(self) -> Vec<UserBookEntry> {
    self
      .me
      .into_iter()
      .next()
      .map(|me| me.user_books.into_iter().map(ApiUserBook::into_entry).collect())
      .unwrap_or_default()
  }
}

impl ApiUserBook {
  pub fn into_entry(self) -> UserBookEntry {
    let is_reading = self.status_id.and_then(BookStatus::from_id) == Some(BookStatus::Reading);

    // Reads come back newest first; the first one is the active session
    let session = self
      .user_book_reads
      .into_iter()
      .next()
      .map(|read| ReadingSession {
        id: read.id,
        progress_pages: read.progress_pages.unwrap_or(0),
        progress: read.progress.unwrap_or(0.0),
        edition: read.edition.map(Edition::from),
        started_at: read.started_at,
        is_reading,
      });

    UserBookEntry {
      book: Book {
        id: self.book.id,
        title: self.book.title.unwrap_or_else(|| "Untitled".to_string()),
        cover_url: self.book.image.and_then(|i| i.url),
        pages: self.book.pages,
      },
      edition: self.edition.map(Edition::from),
      session,
    }
  }
}

// ============================================================================
// UpdateUserBookRead
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiUpdateReadData {
  pub update_user_book_read: Option<ApiUpdateReadPayload>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUpdateReadPayload {
  pub error: Option<String>,
  pub user_book_read: Option<ApiConfirmedRead>,
}

#[derive(Debug, Deserialize)]
pub struct ApiConfirmedRead {
  pub id: Option<i64>,
  pub progress_pages: Option<u32>,
  pub progress: Option<f64>,
  pub edition_id: Option<i64>,
}

impl ApiConfirmedRead {
  pub fn into_confirmed(self, session_id: i64) -> ConfirmedSession {
    ConfirmedSession {
      id: self.id.unwrap_or(session_id),
      progress_pages: self.progress_pages,
      progress: self.progress,
      edition_id: self.edition_id,
    }
  }
}

// ============================================================================
// GetEditionPageCount
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiEditionPagesData {
  pub editions_by_pk: Option<ApiEditionPages>,
}

#[derive(Debug, Deserialize)]
pub struct ApiEditionPages {
  pub pages: Option<u32>,
  pub book: Option<ApiBookPages>,
}

#[derive(Debug, Deserialize)]
pub struct ApiBookPages {
  pub pages: Option<u32>,
}

impl ApiEditionPagesData {
  pub fn page_count(self) -> Option<u32> {
    let edition = self.editions_by_pk?;
    edition
      .pages
      .filter(|p| *p > 0)
      .or_else(|| edition.book.and_then(|b| b.pages))
      .filter(|p| *p > 0)
  }
}
