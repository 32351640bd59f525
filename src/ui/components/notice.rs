use ratatui::prelude::Color;
use std::time::{Duration, Instant};

/// How long a notice stays in the status bar
const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Info,
  Error,
}

/// Transient status bar message
#[derive(Debug, Clone)]
pub struct Notice {
  pub message: String,
  pub level: NoticeLevel,
  expires_at: Instant,
}

impl Notice {
  pub fn info(message: impl Into<String>) -> Self {
    Self::new(message.into(), NoticeLevel::Info, Instant::now())
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self::new(message.into(), NoticeLevel::Error, Instant::now())
  }

  fn new(message: String, level: NoticeLevel, shown_at: Instant) -> Self {
    Self {
      message,
      level,
      expires_at: shown_at + NOTICE_TTL,
    }
  }

  pub fn is_expired(&self, now: Instant) -> bool {
    now >= self.expires_at
  }

  pub fn color(&self) -> Color {
    match self.level {
      NoticeLevel::Info => Color::Green,
      NoticeLevel::Error => Color::Red,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_notice_expires_after_ttl() {
    let shown = Instant::now();
    let notice = Notice::new("saved".to_string(), NoticeLevel::Info, shown);
    assert!(!notice.is_expired(shown + Duration::from_secs(4)));
    assert!(notice.is_expired(shown + NOTICE_TTL));
  }

  #[test]
  fn test_notice_color_by_level() {
    assert_eq!(Notice::info("ok").color(), Color::Green);
    assert_eq!(Notice::error("failed").color(), Color::Red);
  }
}
