mod app;
mod config;
mod event;
mod hardcover;
mod logging;
mod query;
mod store;
#[cfg(test)]
mod testing;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::hardcover::{BookStatus, SortSpec};
use crate::store::{ClientContext, QueryStore};

#[derive(Parser, Debug)]
#[command(name = "hardshelf")]
#[command(about = "A terminal reading tracker for Hardcover")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/hardshelf/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Shelf to show: tbr, reading, read, paused or dnf
  #[arg(short, long)]
  status: Option<BookStatus>,

  /// Number of books to load
  #[arg(short, long)]
  limit: Option<u32>,

  /// Sort order as type[.direction], e.g. progress.desc
  #[arg(long)]
  sort: Option<SortSpec>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = logging::init()?;

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Command line list parameters win over the config file
  if let Some(status) = args.status {
    config.list.status = status;
  }
  if let Some(limit) = args.limit {
    config.list.limit = limit;
  }
  if let Some(sort) = args.sort {
    config.list.sort = Some(sort);
  }

  let (store, store_events) = QueryStore::new(ClientContext::new(), &config);
  // Without a usable token the app still starts and shows the auth error
  if let Err(e) = app::connect(&store, &config, config::Config::get_api_token()) {
    warn!("Starting without a Hardcover client: {}", e);
  }
  info!(api = %config.api_url, "Starting hardshelf");

  let mut app = app::App::new(config, args.config, store, store_events)?;
  app.run().await?;

  Ok(())
}
