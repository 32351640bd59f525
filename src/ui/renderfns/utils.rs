use ratatui::prelude::Color;

use crate::hardcover::UserBookEntry;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Progress cell text: `n/total`, `n pages`, or a percentage
pub fn format_progress(entry: &UserBookEntry, show_percentage: bool) -> String {
  let Some(session) = entry.session.as_ref() else {
    return "not started".to_string();
  };

  if show_percentage {
    return format!("{:.0}%", session.progress);
  }
  match entry.total_pages() {
    Some(total) => format!("{}/{}", session.progress_pages, total),
    None => format!("{} pages", session.progress_pages),
  }
}

/// Get the display color for a progress percentage
pub fn progress_color(progress: f64) -> Color {
  if progress >= 100.0 {
    Color::Green
  } else if progress > 0.0 {
    Color::Yellow
  } else {
    Color::DarkGray
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::book_entry;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Les Misérables", 8), "Les M...");
    assert_eq!(truncate("Éééééééé", 6), "Ééé...");
  }

  #[test]
  fn test_format_progress_with_total() {
    let entry = book_entry(1, 10, 42, Some(300));
    assert_eq!(format_progress(&entry, false), "42/300");
    assert_eq!(format_progress(&entry, true), "14%");
  }

  #[test]
  fn test_format_progress_without_total() {
    let entry = book_entry(1, 10, 42, None);
    assert_eq!(format_progress(&entry, false), "42 pages");
  }

  #[test]
  fn test_format_progress_without_session() {
    let mut entry = book_entry(1, 10, 0, None);
    entry.session = None;
    assert_eq!(format_progress(&entry, false), "not started");
  }

  #[test]
  fn test_progress_color() {
    assert_eq!(progress_color(0.0), Color::DarkGray);
    assert_eq!(progress_color(37.0), Color::Yellow);
    assert_eq!(progress_color(100.0), Color::Green);
  }
}
