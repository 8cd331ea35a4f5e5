mod api;
mod app;
mod cache;
mod config;
mod constants;
mod debounce;
mod input;
mod loader;
mod query;
mod sentinel;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use app::App;
use constants::constants;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Backend search endpoint URL (default: the ONETV_BACKEND_URL environment variable)
  #[arg(short, long)]
  backend: Option<String>,
}

/// Log to a file in the platform data dir; the terminal is owned by the TUI.
/// Returns the guard keeping the non-blocking writer alive.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
  let proj_dirs = ProjectDirs::from("", "", "onetv")?;
  let log_dir = proj_dirs.data_local_dir();
  std::fs::create_dir_all(log_dir).ok()?;

  let appender = tracing_appender::rolling::never(log_dir, "onetv.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("onetv=info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();
  Some(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let backend_url = args
    .backend
    .or_else(|| std::env::var("ONETV_BACKEND_URL").ok())
    .context("no backend configured: pass --backend or set ONETV_BACKEND_URL")?;

  let _log_guard = init_tracing();

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, backend_url).await;
  ratatui::restore();
  result
}

async fn run(terminal: &mut DefaultTerminal, backend_url: String) -> Result<()> {
  let mut app = App::new(backend_url);

  loop {
    app.check_pending();
    app.tick(Instant::now());

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(constants().tick_ms))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.teardown();
  Ok(())
}
