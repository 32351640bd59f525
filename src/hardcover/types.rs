use chrono::NaiveDate;

pub type BookId = i64;
pub type EditionId = i64;
pub type SessionId = i64;

/// Book metadata shown in list views
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
  pub id: BookId,
  pub title: String,
  pub cover_url: Option<String>,
  pub pages: Option<u32>,
}

/// Edition the user is reading
#[derive(Debug, Clone, PartialEq)]
pub struct Edition {
  pub id: EditionId,
  pub pages: Option<u32>,
  pub cover_url: Option<String>,
}

/// Progress record for one read-through of a book
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSession {
  pub id: SessionId,
  pub progress_pages: u32,
  /// Percentage 0-100, server-reported or derived locally
  pub progress: f64,
  pub edition: Option<Edition>,
  pub started_at: Option<NaiveDate>,
  /// Whether the owning user book is in the "reading" status
  pub is_reading: bool,
}

impl ReadingSession {
  /// Set the page count and derive the percentage from `total_pages`.
  ///
  /// Without a page basis the previous percentage is kept. Returns whether
  /// anything changed.
  pub fn apply_pages(&mut self, pages: u32, total_pages: Option<u32>) -> bool {
    let progress = match total_pages {
      Some(total) if total > 0 => percentage_of(pages, total),
      _ => self.progress,
    };

    if self.progress_pages == pages && self.progress == progress {
      return false;
    }
    self.progress_pages = pages;
    self.progress = progress;
    true
  }

  /// Overwrite local progress with server-confirmed values.
  pub fn apply_confirmed(&mut self, confirmed: &ConfirmedSession, total_pages: Option<u32>) -> bool {
    let pages = confirmed.progress_pages.unwrap_or(self.progress_pages);
    match confirmed.progress {
      Some(progress) => {
        if self.progress_pages == pages && self.progress == progress {
          return false;
        }
        self.progress_pages = pages;
        self.progress = progress;
        true
      }
      None => self.apply_pages(pages, total_pages),
    }
  }
}

/// One book on the user's shelf, with its most recent reading session
#[derive(Debug, Clone, PartialEq)]
pub struct UserBookEntry {
  pub book: Book,
  pub edition: Option<Edition>,
  pub session: Option<ReadingSession>,
}

impl UserBookEntry {
  /// Page basis for progress: session edition, then shelf edition, then book.
  pub fn total_pages(&self) -> Option<u32> {
    self
      .session
      .as_ref()
      .and_then(|s| s.edition.as_ref())
      .and_then(|e| e.pages)
      .or_else(|| self.edition.as_ref().and_then(|e| e.pages))
      .or(self.book.pages)
  }

  /// Edition to ask the server about when no page count is cached
  pub fn edition_id(&self) -> Option<EditionId> {
    self
      .session
      .as_ref()
      .and_then(|s| s.edition.as_ref())
      .map(|e| e.id)
      .or_else(|| self.edition.as_ref().map(|e| e.id))
  }

  pub fn cover_url(&self) -> Option<&str> {
    self
      .edition
      .as_ref()
      .and_then(|e| e.cover_url.as_deref())
      .or(self.book.cover_url.as_deref())
  }
}

/// Server-confirmed state of a session after a progress write
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedSession {
  pub id: SessionId,
  pub progress_pages: Option<u32>,
  pub progress: Option<f64>,
  pub edition_id: Option<EditionId>,
}

/// Fields accepted by a progress write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressUpdate {
  pub pages: Option<u32>,
  pub seconds: Option<u32>,
}

impl ProgressUpdate {
  pub fn pages(pages: u32) -> Self {
    Self {
      pages: Some(pages),
      seconds: None,
    }
  }
}

/// Whole-number percentage of `pages` over `total`
pub fn percentage_of(pages: u32, total: u32) -> f64 {
  (f64::from(pages) / f64::from(total) * 100.0).round()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn session(pages: u32, progress: f64) -> ReadingSession {
    ReadingSession {
      id: 1,
      progress_pages: pages,
      progress,
      edition: None,
      started_at: None,
      is_reading: true,
    }
  }

  #[test]
  fn test_apply_pages_derives_percentage() {
    let mut s = session(10, 5.0);
    assert!(s.apply_pages(13, Some(200)));
    assert_eq!(s.progress_pages, 13);
    assert_eq!(s.progress, 7.0);
  }

  #[test]
  fn test_apply_pages_is_idempotent() {
    let mut s = session(10, 5.0);
    assert!(s.apply_pages(50, Some(200)));
    let first = s.clone();
    assert!(!s.apply_pages(50, Some(200)));
    assert_eq!(s, first);
  }

  #[test]
  fn test_apply_pages_without_total_keeps_percentage() {
    let mut s = session(10, 12.0);
    assert!(s.apply_pages(11, None));
    assert_eq!(s.progress, 12.0);
  }

  #[test]
  fn test_total_pages_prefers_session_edition() {
    let entry = UserBookEntry {
      book: Book {
        id: 1,
        title: "Dune".to_string(),
        cover_url: None,
        pages: Some(600),
      },
      edition: Some(Edition {
        id: 7,
        pages: Some(500),
        cover_url: None,
      }),
      session: Some(ReadingSession {
        edition: Some(Edition {
          id: 8,
          pages: Some(412),
          cover_url: None,
        }),
        ..session(0, 0.0)
      }),
    };
    assert_eq!(entry.total_pages(), Some(412));
    assert_eq!(entry.edition_id(), Some(8));
  }
}
