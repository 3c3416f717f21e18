use std::io::{self, BufRead};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use tokio::sync::mpsc;

use brainwave_dash::backend::{self, Backend};
use brainwave_dash::cli::DashArgs;
use brainwave_dash::dispatch::Dispatcher;
use brainwave_dash::session::{ControlOutcome, NoticeLevel, Session};
use brainwave_dash::types::{ControlAction, EegUpdate, ServerEvent};

enum Command {
    Quit,
    Control(ControlAction),
    Snapshot,
    Status,
}

fn parse_command(line: &str) -> Option<Command> {
    match line {
        "q" => Some(Command::Quit),
        "s" => Some(Command::Control(ControlAction::StartStreaming)),
        "x" => Some(Command::Control(ControlAction::StopStreaming)),
        "u" => Some(Command::Snapshot),
        "i" => Some(Command::Status),
        _ => None,
    }
}

/// Print and forget everything the session queued for the user.
fn flush_notices(session: &mut Session) {
    for n in session.take_notifications() {
        let tag = match n.level {
            NoticeLevel::Success => "OK",
            NoticeLevel::Error => "ERROR",
            NoticeLevel::Info => "INFO",
        };
        println!("[{tag}] {}", n.message);
    }
}

fn print_update(n: u64, update: &EegUpdate, frames: usize) {
    let top = update
        .wave_rankings
        .first()
        .map(|(name, _)| name.as_str())
        .unwrap_or("-");
    let raw: Vec<String> = update
        .raw_data
        .iter()
        .map(|(ch, v)| format!("{ch}={v:+.3}"))
        .collect();
    println!(
        "[EEG] #{n:<6} top={top:6} state={:24} history={frames:4}  {}",
        update.state_label(),
        raw.join(" ")
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging ───────────────────────────────────────────────────────────────
    // Set RUST_LOG=debug for verbose output, e.g.:
    //   RUST_LOG=brainwave_dash=debug cargo run
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // ── Configuration ─────────────────────────────────────────────────────────
    let args = DashArgs::parse();
    let config = args.config();

    let dispatcher = Dispatcher::standard();
    let mut session = Session::new(&config);

    // ── Connect ───────────────────────────────────────────────────────────────
    let (server, mut rx) = args.open_backend(&config);
    info!("Using the {} backend …", server.name());

    let reply = server.connect().await?;
    if !reply.success {
        anyhow::bail!("connect failed: {}", reply.message);
    }
    info!("{}", reply.message);
    session.apply_reply(ControlAction::Connect, Ok(reply));

    // ── Start streaming ───────────────────────────────────────────────────────
    let reply = server.start_streaming().await?;
    if !reply.success {
        anyhow::bail!("start failed: {}", reply.message);
    }
    session.apply_reply(ControlAction::StartStreaming, Ok(reply));
    flush_notices(&mut session);
    info!("Streaming started. Press Ctrl-C or type 'q' + Enter to quit.\n");
    info!("Commands (type + Enter):");
    info!("  q  – quit");
    info!("  s  – start streaming");
    info!("  x  – stop streaming");
    info!("  u  – request one update now");
    info!("  i  – print connection status\n");

    // ── Stdin command loop ────────────────────────────────────────────────────
    // Lines are read on a dedicated OS thread (a StdinLock is not Send) and
    // relayed to the main loop.
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    if line_tx.send(l.trim().to_owned()).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    // ── Main event loop ───────────────────────────────────────────────────────
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<ControlOutcome>();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    dispatcher.dispatch(&mut session, ServerEvent::LinkDown);
                    info!("Event channel closed.");
                    break;
                };
                let is_data = matches!(event, ServerEvent::EegData(_));
                dispatcher.dispatch(&mut session, event);
                if is_data {
                    if let Some(update) = session.latest() {
                        print_update(session.updates_received(), update, session.history().len());
                    }
                }
                flush_notices(&mut session);
            }

            Some(outcome) = outcome_rx.recv() => {
                if let ControlOutcome::Status(Ok(status)) = &outcome {
                    let c = &status.connection;
                    println!(
                        "[STATUS] connected={} streaming={} broadcasting={}",
                        c.connected, c.streaming, status.broadcasting
                    );
                }
                session.handle_outcome(outcome);
                flush_notices(&mut session);
            }

            line = line_rx.recv(), if stdin_open => {
                let Some(line) = line else {
                    stdin_open = false;
                    continue;
                };
                if line.is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Some(Command::Quit) => {
                        info!("Quit requested.");
                        break;
                    }
                    Some(Command::Control(action)) => {
                        info!("{} …", action.label());
                        backend::spawn_control(Arc::clone(&server), action, outcome_tx.clone());
                    }
                    Some(Command::Snapshot) => {
                        backend::spawn_snapshot(Arc::clone(&server), outcome_tx.clone());
                    }
                    Some(Command::Status) => {
                        backend::spawn_status_poll(Arc::clone(&server), outcome_tx.clone());
                    }
                    None => warn!("Unknown command '{line}'"),
                }
            }
        }
    }

    if let Err(e) = server.disconnect().await {
        error!("Disconnect error: {e}");
    }
    info!("Event loop finished – exiting.");
    Ok(())
}
