//! `kanban`: terminal kanban board with optimistic sync.
//!
//! Launches the TUI against a `kanban-server` task store, or against an
//! in-memory demo board with `--offline`. Configuration via CLI flags,
//! environment variables, or config file (`~/.config/kanban/config.toml`).
//!
//! ```bash
//! # Offline demo board
//! cargo run --bin kanban -- --offline
//!
//! # Against a local server
//! cargo run --bin kanban-server &
//! cargo run --bin kanban -- --server-url http://127.0.0.1:8080
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use kanban::app::{App, NoticeLevel};
use kanban::config::{CliArgs, ClientConfig};
use kanban::store::{HttpTaskStore, InMemoryTaskStore, TaskStore};
use kanban::sync::{SyncCommand, SyncEvent, request_shutdown, spawn_worker};
use kanban::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load configuration: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(offline = config.offline, "kanban starting");

    // Build the store before taking over the terminal so errors stay readable.
    let http_store = if config.offline {
        None
    } else {
        let store = HttpTaskStore::new(config.server_url.clone(), config.request_timeout)
            .map_err(|e| io::Error::other(e.to_string()))?;
        Some(store)
    };

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app.
    let result = match http_store {
        Some(store) => {
            let label = store.base_url().to_string();
            run_app(&mut terminal, Arc::new(store), label, &config).await
        }
        None => {
            let store = Arc::new(InMemoryTaskStore::demo());
            run_app(&mut terminal, store, "offline demo".to_string(), &config).await
        }
    };

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("kanban exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the terminal).
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("kanban.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop.
async fn run_app<S>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    store: Arc<S>,
    store_label: String,
    config: &ClientConfig,
) -> io::Result<()>
where
    S: TaskStore + 'static,
{
    let mut app = App::new(store_label).with_notice_ttl(config.notice_ttl);
    let (cmd_tx, mut evt_rx) = spawn_worker(store, config.channel_capacity);

    // Initial load; the board stays empty until it answers.
    if let Some(cmd) = app.start_load() {
        dispatch(&mut app, &cmd_tx, cmd);
    }

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain all pending SyncEvents (non-blocking).
        drain_sync_events(&mut app, &mut evt_rx);

        // Step 3: Expire old notices.
        app.tick();

        // Step 4: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            // handle_key_event returns Some(SyncCommand) when the key
            // started a store request (drop, create, save, delete, reload).
            if let Some(cmd) = app.handle_key_event(key) {
                dispatch(&mut app, &cmd_tx, cmd);
            }
        }

        if app.should_quit {
            // Let the worker stop accepting commands.
            request_shutdown(&cmd_tx);
            return Ok(());
        }
    }
}

/// Hand a command to the sync worker, settling it locally if it can't be queued.
fn dispatch(app: &mut App, tx: &mpsc::Sender<SyncCommand>, cmd: SyncCommand) {
    match tx.try_send(cmd) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(cmd)) => {
            app.command_not_sent(cmd, "sync worker busy");
        }
        Err(mpsc::error::TrySendError::Closed(cmd)) => {
            app.command_not_sent(cmd, "sync worker stopped");
            app.push_notice(NoticeLevel::Error, "Sync worker stopped, restart to reconnect");
        }
    }
}

/// Drain all pending `SyncEvent`s from the receiver and apply them to the app.
fn drain_sync_events(app: &mut App, rx: &mut mpsc::Receiver<SyncEvent>) {
    while let Ok(event) = rx.try_recv() {
        app.apply_sync_event(event);
    }
}
