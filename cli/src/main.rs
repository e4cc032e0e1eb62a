//! Triad CLI - Binary entry point and terminal session management.
//!
//! # Architecture
//!
//! The CLI wires [`triad_config`] (settings), [`triad_providers`] (the chat
//! client), [`triad_core`] (session state) and [`triad_tui`] (rendering), and
//! owns the terminal through an RAII guard with guaranteed cleanup.
//!
//! ```text
//! main() -> resolve config -> SessionController + App -> TerminalSession -> run_app()
//! ```
//!
//! # Event Loop
//!
//! A fixed 8ms render cadence:
//!
//! 1. Wait for frame tick
//! 2. Drain input queue until the first command (non-blocking via [`triad_tui::InputPump`])
//! 3. Render frame
//! 4. For a command: show the busy status, await the controller, then drop
//!    any keystrokes typed while the call was in flight

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::{Backend, CrosstermBackend, Terminal};
use std::{
    fs::{self, OpenOptions},
    io::{Stdout, Write, stdout},
    path::PathBuf,
    process::ExitCode,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use triad_config::{ResolvedConfig, TriadConfig, load_dotenv, resolve_from_env};
use triad_core::{PromptTemplates, SessionController};
use triad_providers::{ChatClient, ChatCompletionsClient, ClientOptions, retry::RetryConfig};
use triad_tui::{App, InputPump, View, draw, handle_events, run_command};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Writing logs to stdout/stderr would corrupt the TUI.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: next to the config file, ~/.triad/logs/triad.log
    if let Some(config_path) = TriadConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("triad.log"));
    }

    candidates.push(PathBuf::from(".triad").join("logs").join("triad.log"));

    candidates
}

/// RAII wrapper for terminal state with guaranteed cleanup on drop.
///
/// Enables raw mode, bracketed paste and the alternate screen. On drop the
/// terminal is restored, even after panics or early returns.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnableBracketedPaste, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            let _ = execute!(out, LeaveAlternateScreen, DisableBracketedPaste);
            return Err(err.into());
        }
        // Alternate scroll mode (CSI ? 1007 h): wheel becomes Up/Down without mouse capture.
        let _ = out.write_all(b"\x1b[?1007h");
        let _ = out.flush();

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(t) => t,
            Err(err) => {
                let _ = disable_raw_mode();
                let mut out = stdout();
                let _ = out.write_all(b"\x1b[?1007l");
                let _ = out.flush();
                let _ = execute!(out, LeaveAlternateScreen, DisableBracketedPaste);
                return Err(err.into());
            }
        };

        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = self.terminal.backend_mut().write_all(b"\x1b[?1007l");
        let _ = Write::flush(self.terminal.backend_mut());
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        );
        let _ = self.terminal.show_cursor();
    }
}

fn load_config() -> Result<ResolvedConfig> {
    let file = TriadConfig::load()?;
    let resolved = resolve_from_env(file.as_ref())?;
    tracing::info!(
        provider = resolved.endpoint.provider().as_str(),
        model = resolved.endpoint.model_label(),
        "Configuration resolved"
    );
    Ok(resolved)
}

fn build_controller(config: &ResolvedConfig) -> Result<SessionController<ChatCompletionsClient>> {
    let options = ClientOptions {
        request_timeout: Duration::from_secs(config.http.timeout_secs),
        retry: RetryConfig::default().with_max_retries(config.http.max_retries),
    };
    let client = ChatCompletionsClient::new(config.endpoint.clone(), options)
        .context("failed to build the HTTP client")?;
    Ok(
        SessionController::new(client, config.generation)
            .with_provider(config.endpoint.provider()),
    )
}

#[tokio::main]
async fn main() -> ExitCode {
    // `.env` may set RUST_LOG and TRIAD_CONFIG, so it loads before logging starts.
    let dotenv = load_dotenv();
    init_tracing();
    match dotenv {
        Ok(Some(path)) => tracing::info!(path = %path.display(), "Loaded .env"),
        Ok(None) => {}
        Err(err) => tracing::warn!("Failed to load .env: {err}"),
    }

    // Configuration errors are fatal and reported before the terminal is taken over.
    let (config, mut controller) = match load_config()
        .and_then(|config| build_controller(&config).map(|controller| (config, controller)))
    {
        Ok(ready) => ready,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let mut app = App::new(config.endpoint.model_label(), config.high_contrast);

    let result = match TerminalSession::new() {
        Ok(mut session) => run_app(&mut session.terminal, &mut app, &mut controller).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

const FRAME_DURATION: Duration = Duration::from_millis(8);

async fn run_app<B, C, P>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    controller: &mut SessionController<C, P>,
) -> Result<()>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
    C: ChatClient,
    P: PromptTemplates,
{
    let mut input = InputPump::new();
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result: Result<()> = loop {
        frames.tick().await;

        let command = match handle_events(app, &mut input) {
            Ok(command) => command,
            Err(e) => break Err(e),
        };
        if app.should_quit() {
            break Ok(());
        }

        let Some(command) = command else {
            if let Err(e) = terminal.draw(|frame| draw(frame, app, &View::of(controller))) {
                break Err(e.into());
            }
            continue;
        };

        if let Some(label) = command.busy_label() {
            app.set_busy(label);
            if let Err(e) = terminal.draw(|frame| draw(frame, app, &View::of(controller))) {
                break Err(e.into());
            }
        }

        // Failures are already recorded on the controller and shown in the status bar.
        let _ = run_command(controller, app, command).await;
        app.clear_busy();

        // A reader error found here surfaces on the next handle_events.
        input.discard_pending();

        if let Err(e) = terminal.draw(|frame| draw(frame, app, &View::of(controller))) {
            break Err(e.into());
        }
    };

    input.shutdown().await;
    result
}
