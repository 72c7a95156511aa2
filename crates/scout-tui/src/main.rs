use anyhow::{Context, Result};
use scout_core::{Config, SessionController, SessionHandle};
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

/// Log to a file: the terminal belongs to the UI.
fn init_logging() -> Result<WorkerGuard> {
    let log_dir = dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("scout");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let (non_blocking, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, "scout.log"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_logging()?;

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(
        search = %config.search_url,
        completion = %config.completion_url,
        "Starting scout v{}",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = CancellationToken::new();
    let controller = SessionController::new(&config).context("Failed to build HTTP client")?;
    let (session, session_task) = controller.spawn(shutdown.clone());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut app = App::new(&config);
    let mut events = EventHandler::new(session.subscribe());

    let result = run(&mut terminal, &mut app, &mut events, &session).await;

    tui::restore()?;
    shutdown.cancel();
    if let Err(e) = session_task.await {
        tracing::warn!("session task ended abnormally: {e}");
    }

    result
}

async fn run(
    terminal: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
    session: &SessionHandle,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, session, event),
            None => break,
        }
    }
    Ok(())
}
