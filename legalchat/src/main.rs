//! legalchat - Legal multi-agent assistant
//!
//! Terminal client for chatting with the legal assistant backend and
//! managing its knowledge base.

mod app;
mod message_format;
mod ui;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use legalchat_core::{AgentType, ChatController, Config};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::App;

#[derive(Parser)]
#[command(name = "legalchat")]
#[command(about = "Chat with the legal multi-agent assistant")]
#[command(version)]
struct Args {
    /// Backend base URL (overrides backend.api_url)
    #[arg(long)]
    api_url: Option<String>,

    /// Agent selected at startup (team, researcher, contract_analyzer, ...)
    #[arg(long)]
    agent: Option<AgentType>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args)?;

    // Log to file, the TUI owns stdout
    let _log_guard =
        legalchat_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!(api_url = %config.backend.api_url, "legalchat TUI starting up");

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let mut controller = ChatController::new(&config, runtime.handle().clone())
        .context("failed to create chat controller")?;
    controller.start_session();
    controller.refresh_status();

    let mut app = App::new(controller);

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    tracing::info!("legalchat TUI shutting down");

    // Closes the channel and cancels outstanding requests
    drop(app);
    runtime.shutdown_timeout(std::time::Duration::from_millis(500));

    result
}

/// Load the config file and apply command-line overrides.
fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };

    if let Some(api_url) = &args.api_url {
        config.backend.api_url = api_url.clone();
    }
    if let Some(agent) = args.agent {
        config.chat.default_agent = agent;
    }
    config.validate().context("invalid configuration")?;

    Ok(config)
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Apply whatever the network tasks delivered since the last frame
        app.controller.pump();
        app.tick();

        // Render
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
