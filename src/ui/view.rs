use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use crate::ui::components::Notice;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// Actions that a view can request in response to user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
  /// No action needed
  None,
  /// Leave the application
  Quit,
  /// Reload credentials and swap the Hardcover client
  Reconnect,
}

/// Trait for view behavior
///
/// Views own their store subscriptions and return actions for the App to
/// execute.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Short label for the header
  fn title(&self) -> String;

  /// Called on each tick
  fn tick(&mut self) {}

  /// Transient message for the status bar
  fn notice(&self) -> Option<&Notice> {
    None
  }

  /// Background activity shown in the status bar when there is no notice
  fn activity(&self) -> String {
    String::new()
  }

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![ShortcutInfo::new("q", "quit").with_priority(90)]
  }
}
