//! Full-screen brainwave dashboard.
//!
//! Usage:
//!   cargo run --bin tui                              # built-in simulator
//!   cargo run --bin tui -- --replay session.ndjson   # replay a recording
//!   cargo run --bin tui -- --replay session.ndjson --loop
//!
//! Keys
//! ----
//!   c        connect
//!   s        start streaming
//!   x        stop streaming
//!   d        disconnect (clears the raw history)
//!   u        request one update now
//!   w        wipe the raw history
//!   q / Esc  quit

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, info};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, error::TryRecvError};

use brainwave_dash::backend::{self, Backend};
use brainwave_dash::cli::DashArgs;
use brainwave_dash::dispatch::Dispatcher;
use brainwave_dash::keymap::{map_key, KeyAction};
use brainwave_dash::session::{ControlOutcome, Session};
use brainwave_dash::types::ServerEvent;
use brainwave_dash::ui;

/// Frame period of the render loop (~30 FPS).
const TICK: Duration = Duration::from_millis(33);

#[tokio::main]
async fn main() -> Result<()> {
    use std::io::IsTerminal as _;
    if !io::stdout().is_terminal() {
        eprintln!("Error: brainwave-dash tui requires a real terminal (TTY).");
        eprintln!("Run it directly in a terminal emulator, not piped or redirected.");
        std::process::exit(1);
    }

    let args = DashArgs::parse();

    // ── Logging ─────────────────────────────────────────────────────────────
    // Logs go to brainwave-tui.log in the current directory so they never
    // interfere with the display.  RUST_LOG=debug for more detail.
    {
        use std::fs::File;
        if let Ok(file) = File::create("brainwave-tui.log") {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init();
        }
    }

    // ── Session state (owned by the main task only) ───────────────────────────
    let config = args.config();
    let (server, mut events) = args.open_backend(&config);
    let source = server.name().to_owned();
    info!("dashboard starting with the {source} backend");

    let dispatcher = Dispatcher::standard();
    let mut session = Session::new(&config);
    let (outcome_tx, mut outcomes) = mpsc::unbounded_channel::<ControlOutcome>();
    let mut events_open = true;
    let mut next_poll = Instant::now();

    // ── Terminal setup ────────────────────────────────────────────────────────
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    // ── Main loop ─────────────────────────────────────────────────────────────
    'main: loop {
        // ── 1. Drain pushed events ────────────────────────────────────────────
        while events_open {
            match events.try_recv() {
                Ok(event) => {
                    dispatcher.dispatch(&mut session, event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    events_open = false;
                    dispatcher.dispatch(&mut session, ServerEvent::LinkDown);
                }
            }
        }

        // ── 2. Collect finished control requests and polls ────────────────────
        while let Ok(outcome) = outcomes.try_recv() {
            session.handle_outcome(outcome);
        }

        // ── 3. Periodic status poll ───────────────────────────────────────────
        let now = Instant::now();
        if now >= next_poll {
            backend::spawn_status_poll(Arc::clone(&server), outcome_tx.clone());
            next_poll = now + config.status_poll;
        }
        session.expire_notifications(now);

        // ── 4. Render ─────────────────────────────────────────────────────────
        terminal.draw(|f| ui::draw(f, &session, &source))?;

        // ── 5. Handle keyboard ────────────────────────────────────────────────
        if !event::poll(TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match map_key(key) {
            KeyAction::Quit => break 'main,
            KeyAction::Control(action) => {
                if session.controls().allows(action) {
                    debug!("{} requested", action.label());
                    backend::spawn_control(Arc::clone(&server), action, outcome_tx.clone());
                } else {
                    debug!("{} ignored: not available now", action.label());
                }
            }
            KeyAction::Snapshot => {
                backend::spawn_snapshot(Arc::clone(&server), outcome_tx.clone());
            }
            KeyAction::WipeHistory => session.wipe_history(),
            KeyAction::None => {}
        }
    }

    // ── Teardown ──────────────────────────────────────────────────────────────
    if session.is_connected() {
        let _ = server.disconnect().await;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    info!("dashboard closed");
    Ok(())
}
