use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::debug;

use crate::hardcover::{ListKey, SessionId, UserBookEntry};
use crate::store::{self, ListHandle, StoreEvent, Surface};
use crate::ui::components::Notice;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_progress, progress_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};

/// Longest percentage accepted by the prompt, e.g. `100.00`
const MAX_PERCENT_INPUT: usize = 6;

/// Percentage being typed for one session
struct PercentPrompt {
  session_id: SessionId,
  title: String,
  input: String,
}

/// View over one shelf of books with per-entry progress controls
pub struct BookListView {
  surface: Surface,
  list: ListHandle,
  snapshot: store::ListState,
  list_state: ListState,
  show_percentage: bool,
  notice: Option<Notice>,
  prompt: Option<PercentPrompt>,
  /// Notices from background percentage updates
  notice_tx: mpsc::UnboundedSender<Notice>,
  notice_rx: mpsc::UnboundedReceiver<Notice>,
}

impl BookListView {
  /// Subscribe to `key` on `surface`; loading starts right away.
  pub fn new(surface: Surface, key: ListKey) -> Self {
    let mut list = surface.use_list(key);
    let snapshot = list.state();
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    Self {
      surface,
      list,
      snapshot,
      list_state: ListState::default(),
      show_percentage: false,
      notice: None,
      prompt: None,
      notice_tx,
      notice_rx,
    }
  }

  pub fn show_info(&mut self, message: impl Into<String>) {
    self.notice = Some(Notice::info(message));
  }

  pub fn show_error(&mut self, message: impl Into<String>) {
    self.notice = Some(Notice::error(message));
  }

  fn sync(&mut self) {
    if self.list.has_changed() {
      self.snapshot = self.list.state();
    }
  }

  /// Resolve once the subscribed list changes.
  pub async fn changed(&mut self) {
    if self.list.changed().await {
      self.snapshot = self.list.state();
    } else {
      // The cache never drops a key, but don't spin if it ever does
      std::future::pending::<()>().await;
    }
  }

  fn books(&self) -> &[UserBookEntry] {
    self.snapshot.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn selected_book(&self) -> Option<&UserBookEntry> {
    self.list_state.selected().and_then(|idx| self.books().get(idx))
  }

  fn title_for_session(&self, session_id: SessionId) -> String {
    self
      .books()
      .iter()
      .find(|b| b.session.as_ref().is_some_and(|s| s.id == session_id))
      .map(|b| b.book.title.clone())
      .unwrap_or_else(|| format!("session {}", session_id))
  }

  /// Session of the selected book, or a notice saying why there is none
  fn selected_session(&mut self) -> Option<(SessionId, String)> {
    let book = self.selected_book()?;
    let title = book.book.title.clone();
    match book.session.as_ref().map(|s| s.id) {
      Some(session_id) => Some((session_id, title)),
      None => {
        self.show_info(format!("{} has no reading session", title));
        None
      }
    }
  }

  fn step_progress(&mut self, delta: i64) {
    let Some((session_id, title)) = self.selected_session() else {
      return;
    };

    match self.surface.request_progress_change(session_id, delta) {
      Ok(Some(pages)) => debug!(session_id, pages, "Progress changed"),
      Ok(None) => {}
      Err(e) => self.notice = Some(Notice::error(format!("{}: {}", title, e))),
    }
    self.sync();
  }

  fn open_prompt(&mut self) {
    if let Some((session_id, title)) = self.selected_session() {
      self.prompt = Some(PercentPrompt {
        session_id,
        title,
        input: String::new(),
      });
    }
  }

  fn handle_prompt_key(&mut self, key: KeyEvent) {
    let Some(prompt) = self.prompt.as_mut() else {
      return;
    };
    match key.code {
      KeyCode::Char(c) if (c.is_ascii_digit() || c == '.') && prompt.input.len() < MAX_PERCENT_INPUT => {
        prompt.input.push(c);
      }
      KeyCode::Backspace => {
        prompt.input.pop();
      }
      KeyCode::Enter => self.submit_prompt(),
      KeyCode::Esc => self.prompt = None,
      _ => {}
    }
  }

  /// Set the typed percentage in the background; the page basis may need
  /// a server lookup.
  fn submit_prompt(&mut self) {
    let Some(prompt) = self.prompt.take() else {
      return;
    };
    let percentage = match prompt.input.parse::<f64>() {
      Ok(p) => p,
      Err(_) => {
        self.show_error(format!("'{}' is not a percentage", prompt.input));
        return;
      }
    };

    let surface = self.surface.clone();
    let notices = self.notice_tx.clone();
    tokio::spawn(async move {
      match surface.set_progress_percentage(prompt.session_id, percentage).await {
        Ok(pages) => debug!(session_id = prompt.session_id, pages, "Progress set from percentage"),
        Err(e) => {
          let _ = notices.send(Notice::error(format!("{}: {}", prompt.title, e)));
        }
      }
    });
  }

  /// Started date and cover of the selected book
  fn detail_line(&self) -> Option<String> {
    let book = self.selected_book()?;
    let mut parts = Vec::new();
    if let Some(started) = book.session.as_ref().and_then(|s| s.started_at) {
      parts.push(format!("started {}", started.format("%Y-%m-%d")));
    }
    if let Some(cover) = book.cover_url() {
      parts.push(format!("cover {}", cover));
    }
    if parts.is_empty() {
      None
    } else {
      Some(format!(" {} ", parts.join(" | ")))
    }
  }

  /// Turn a write outcome into a status bar notice
  pub fn handle_store_event(&mut self, event: &StoreEvent) {
    self.notice = Some(match event {
      StoreEvent::WriteConfirmed { session_id, pages } => Notice::info(format!(
        "Saved {} at page {}",
        self.title_for_session(*session_id),
        pages
      )),
      StoreEvent::WriteFailed {
        session_id,
        pages,
        error,
      } => Notice::error(format!(
        "Could not save {} at page {}: {}",
        self.title_for_session(*session_id),
        pages,
        error
      )),
    });
  }

  /// Cancel writes that have not been sent yet
  pub fn teardown(&mut self) -> usize {
    self.surface.teardown()
  }

  /// Message shown instead of the list, if any
  fn placeholder(&self) -> Option<String> {
    if !self.books().is_empty() {
      return None;
    }
    if self.snapshot.is_loading {
      return Some("Loading...".to_string());
    }
    if let Some(error) = self.snapshot.error() {
      return Some(format!("{}. Press 'r' to retry.", error));
    }
    if self.snapshot.is_success() {
      return Some(format!("No books you {}.", self.list.key().status.label()));
    }
    None
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    self.sync();
    let len = self.books().len();
    ensure_valid_selection(&mut self.list_state, len);

    let key = self.list.key();
    let title = if self.snapshot.is_loading {
      format!(" {} (loading...) ", key.status)
    } else if self.snapshot.is_error {
      format!(" {} ({}, error) ", key.status, len)
    } else {
      format!(" {} ({}) ", key.status, len)
    };

    let mut block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    if let Some(detail) = self.detail_line() {
      block = block.title_bottom(Line::from(detail).style(Style::default().fg(Color::DarkGray)));
    }

    if let Some(content) = self.placeholder() {
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .books()
      .iter()
      .map(|book| {
        let progress = book.session.as_ref().map(|s| s.progress).unwrap_or(0.0);
        let line = Line::from(vec![
          Span::styled(
            format!("{:<50}", truncate(&book.book.title, 50)),
            Style::default().fg(Color::White),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:>12}", format_progress(book, self.show_percentage)),
            Style::default().fg(progress_color(progress)),
          ),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for BookListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.prompt.is_some() {
      self.handle_prompt_key(key);
      return ViewAction::None;
    }
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
      }
      KeyCode::Char('+') | KeyCode::Char('=') => self.step_progress(1),
      KeyCode::Char('-') => self.step_progress(-1),
      KeyCode::Char('p') => {
        self.show_percentage = !self.show_percentage;
      }
      KeyCode::Char('r') => {
        if self.snapshot.is_error {
          self.list.retry();
        }
      }
      KeyCode::Char('%') => self.open_prompt(),
      KeyCode::Char('R') => self.list.refresh(),
      KeyCode::Char('C') => return ViewAction::Reconnect,
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Quit,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
  }

  fn title(&self) -> String {
    self.list.key().description()
  }

  fn tick(&mut self) {
    self.sync();
    while let Ok(notice) = self.notice_rx.try_recv() {
      self.notice = Some(notice);
    }
    if self.notice.as_ref().is_some_and(|n| n.is_expired(Instant::now())) {
      self.notice = None;
    }
  }

  fn notice(&self) -> Option<&Notice> {
    self.notice.as_ref()
  }

  fn activity(&self) -> String {
    if let Some(prompt) = &self.prompt {
      format!("{} progress: {}% (enter to set, esc to cancel)", prompt.title, prompt.input)
    } else if self.snapshot.is_loading {
      "loading...".to_string()
    } else if self.snapshot.is_refetching {
      "refreshing...".to_string()
    } else if self.surface.has_pending_writes() {
      "saving...".to_string()
    } else if let Some(error) = self.snapshot.error() {
      format!("refresh failed: {}", error)
    } else if let Some(at) = self.snapshot.updated_at {
      format!("updated {}", at.with_timezone(&Local).format("%H:%M:%S"))
    } else {
      String::new()
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("+/-", "page").with_priority(10),
      ShortcutInfo::new("%", "set %").with_priority(15),
      ShortcutInfo::new("p", "percent").with_priority(20),
      ShortcutInfo::new("r", "retry").with_priority(30),
      ShortcutInfo::new("R", "refresh").with_priority(40),
      ShortcutInfo::new("C", "reconnect").with_priority(50),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
