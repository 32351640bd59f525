use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::hardcover::HardcoverClient;
use crate::store::{QueryStore, StoreEvent};
use crate::ui;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::BookListView;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Install a Hardcover client built from `config` and `token`.
///
/// Without a usable token the store is disconnected, so reads report the
/// auth error instead of using a stale credential.
pub fn connect(store: &QueryStore, config: &Config, token: Result<String>) -> Result<()> {
  match token.and_then(|token| HardcoverClient::new(config, token)) {
    Ok(client) => {
      store.replace_client(Some(Arc::new(client)));
      Ok(())
    }
    Err(e) => {
      store.replace_client(None);
      Err(e)
    }
  }
}

/// Main application state
pub struct App {
  /// Application configuration
  config: Config,

  /// Config file given on the command line, reread on reconnect
  config_path: Option<PathBuf>,

  store: QueryStore,

  /// The shelf being shown
  view: BookListView,

  /// Write outcomes, handed to the event loop on start
  store_events: Option<mpsc::UnboundedReceiver<StoreEvent>>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(
    config: Config,
    config_path: Option<PathBuf>,
    store: QueryStore,
    store_events: mpsc::UnboundedReceiver<StoreEvent>,
  ) -> Result<Self> {
    let key = config.list_key()?;
    info!(list = %key.description(), "Opening shelf");
    let view = BookListView::new(store.surface(), key);

    Ok(Self {
      config,
      config_path,
      store,
      view,
      store_events: Some(store_events),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));
    if let Some(rx) = self.store_events.take() {
      events.forward_store_events(rx);
    }

    let result = self.event_loop(&mut terminal, &mut events).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Redraw on input, ticks, and any change to the shown list
      tokio::select! {
        event = events.next() => match event {
          Some(event) => self.handle_event(event),
          None => self.should_quit = true,
        },
        () = self.view.changed() => {}
      }
    }

    let dropped = self.view.teardown();
    if dropped > 0 {
      info!(dropped, "Discarded unsent progress changes on exit");
    }
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.view.tick(),
      Event::Store(event) => self.view.handle_store_event(&event),
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }
    match self.view.handle_key(key) {
      ViewAction::None => {}
      ViewAction::Quit => self.should_quit = true,
      ViewAction::Reconnect => self.reconnect(),
    }
  }

  /// Reread the config and token, then swap the client.
  fn reconnect(&mut self) {
    let config = match Config::load(self.config_path.as_deref()) {
      Ok(config) => config,
      Err(e) => {
        warn!("Could not reload config: {}", e);
        self.view.show_error(format!("Could not reload config: {}", e));
        return;
      }
    };

    match connect(&self.store, &config, Config::get_api_token()) {
      Ok(()) => {
        info!(api = %config.api_url, "Reconnected");
        self.view.show_info("Reconnected to Hardcover");
      }
      Err(e) => {
        warn!("Disconnected: {}", e);
        self.view.show_error(format!("Disconnected: {}", e));
      }
    }
    self.config.api_url = config.api_url;
  }

  // Accessors for UI rendering
  pub fn view(&self) -> &BookListView {
    &self.view
  }

  pub fn view_mut(&mut self) -> &mut BookListView {
    &mut self.view
  }

  pub fn api_url(&self) -> &str {
    &self.config.api_url
  }

  pub fn is_connected(&self) -> bool {
    self.store.context().is_connected()
  }
}
