mod app;
mod handler;
mod tui;
mod ui;

use std::fs::OpenOptions;
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;

use anyhow::{Context, Result};
use aichat_core::{Config, DataPaths};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::tui::{EventHandler, Tui};

/// Route tracing output to a file so it never paints over the terminal UI.
fn init_tracing(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open trace file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("AICHAT_LOG")
                .unwrap_or_else(|_| "aichat=info,aichat_core=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let paths = DataPaths::locate()?;
    init_tracing(&paths.trace_file())?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting aichat");

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load config, using defaults");
        Config::new()
    });

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut app = App::new(config, paths);
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    events.stop();
    tui::restore()?;
    tracing::info!("aichat exited");
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event).await?;
        }

        app.poll_query().await;

        if app.edit_config_requested {
            app.edit_config_requested = false;
            *terminal = edit_config(app, events)?;
        }
    }
    Ok(())
}

/// Hand the terminal to the configured editor, then reload the config file.
fn edit_config(app: &mut App, events: &mut EventHandler) -> Result<Tui> {
    let path = Config::ensure_exists()?;

    events.stop();
    tui::restore()?;

    tracing::info!(editor = %app.config.editor, path = %path.display(), "editing config");
    let status = Command::new(&app.config.editor).arg(&path).status();

    let terminal = tui::init()?;
    *events = EventHandler::new();

    match status {
        Ok(status) if !status.success() => {
            app.notify("Options", format!("Editor exited with {}", status));
        }
        Ok(_) => match Config::load() {
            Ok(config) => app.reload(config),
            Err(e) => app.notify("Options", format!("Could not load {}:\n\n{:#}", path.display(), e)),
        },
        Err(e) => {
            app.notify("Options", format!("Could not start editor '{}': {}", app.config.editor, e));
        }
    }

    Ok(terminal)
}
