//! Replays recorded `eeg_data` payloads from a newline-delimited JSON file.
//!
//! Each non-blank line is one [`EegUpdate`] as the server would push it.
//! Lines that do not parse are skipped with a warning, so a recording with a
//! truncated tail still plays.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{event_channel, push, Backend};
use crate::config::DashConfig;
use crate::error::{BackendError, BackendResult};
use crate::types::{ConnectionStatus, ControlReply, EegUpdate, ServerEvent, StatusReply};

/// Parse a recording.  Returns the good records and one error per bad line.
pub fn parse_records(text: &str) -> (Vec<EegUpdate>, Vec<BackendError>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<EegUpdate>(line) {
            Ok(update) => records.push(update),
            Err(source) => errors.push(BackendError::Decode { line: i + 1, source }),
        }
    }
    (records, errors)
}

#[derive(Default)]
struct ReplayState {
    records: Option<Arc<Vec<EegUpdate>>>,
    player: Option<JoinHandle<()>>,
}

pub struct ReplayServer {
    path: PathBuf,
    looped: bool,
    config: DashConfig,
    tx: mpsc::Sender<ServerEvent>,
    /// Index of the next record to push; survives stop/start.
    cursor: Arc<AtomicUsize>,
    /// Cleared by the player itself when a non-looping replay runs out.
    streaming: Arc<AtomicBool>,
    state: Mutex<ReplayState>,
}

impl ReplayServer {
    /// Prepare a replay of `path`.  The file is not read until `connect`.
    pub fn new(
        path: impl AsRef<Path>,
        looped: bool,
        config: DashConfig,
    ) -> (Arc<Self>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = event_channel();
        let server = Arc::new(Self {
            path: path.as_ref().to_path_buf(),
            looped,
            config,
            tx,
            cursor: Arc::new(AtomicUsize::new(0)),
            streaming: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(ReplayState::default()),
        });
        (server, rx)
    }

    fn spawn_player(&self, records: Arc<Vec<EegUpdate>>) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let cursor = Arc::clone(&self.cursor);
        let streaming = Arc::clone(&self.streaming);
        let looped = self.looped;
        let period = self.config.broadcast_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let mut idx = cursor.fetch_add(1, Ordering::SeqCst);
                if idx >= records.len() {
                    if !looped {
                        streaming.store(false, Ordering::SeqCst);
                        cursor.store(records.len(), Ordering::SeqCst);
                        let _ = tx.send(ServerEvent::Status("Replay finished".to_owned())).await;
                        info!("replay: end of recording");
                        break;
                    }
                    idx = 0;
                    cursor.store(1, Ordering::SeqCst);
                }
                if tx.send(ServerEvent::EegData(records[idx].clone())).await.is_err() {
                    debug!("replay: receiver gone, player exits");
                    break;
                }
            }
        })
    }

    fn halt(&self, state: &mut ReplayState) {
        self.streaming.store(false, Ordering::SeqCst);
        if let Some(task) = state.player.take() {
            task.abort();
        }
    }
}

impl Drop for ReplayServer {
    fn drop(&mut self) {
        if let Some(task) = self.state.get_mut().player.take() {
            task.abort();
        }
    }
}

#[async_trait]
impl Backend for ReplayServer {
    fn name(&self) -> &str {
        "replay"
    }

    async fn connect(&self) -> BackendResult<ControlReply> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| BackendError::Io {
                path: self.path.clone(),
                source,
            })?;
        let (records, errors) = parse_records(&text);
        for e in &errors {
            warn!("replay: skipping {e}");
        }
        if records.is_empty() {
            return Ok(ControlReply::failed(format!(
                "No records in {}",
                self.path.display()
            )));
        }

        info!(
            "replay: loaded {} record(s) from {} ({} skipped)",
            records.len(),
            self.path.display(),
            errors.len()
        );
        let count = records.len();
        let mut state = self.state.lock();
        self.halt(&mut state);
        state.records = Some(Arc::new(records));
        self.cursor.store(0, Ordering::SeqCst);
        Ok(ControlReply::ok(format!("Loaded {count} records")))
    }

    async fn start_streaming(&self) -> BackendResult<ControlReply> {
        let mut state = self.state.lock();
        let Some(records) = state.records.clone() else {
            return Ok(ControlReply::failed("Not connected. Please connect first."));
        };
        if self.streaming.load(Ordering::SeqCst) {
            return Ok(ControlReply::ok("Already streaming"));
        }
        if let Some(stale) = state.player.take() {
            stale.abort();
        }
        if !self.looped && self.cursor.load(Ordering::SeqCst) >= records.len() {
            // Finished earlier; play again from the top.
            self.cursor.store(0, Ordering::SeqCst);
        }
        self.streaming.store(true, Ordering::SeqCst);
        state.player = Some(self.spawn_player(records));
        Ok(ControlReply::ok("Started streaming"))
    }

    async fn stop_streaming(&self) -> BackendResult<ControlReply> {
        self.halt(&mut self.state.lock());
        Ok(ControlReply::ok("Stopped streaming"))
    }

    async fn disconnect(&self) -> BackendResult<ControlReply> {
        let mut state = self.state.lock();
        self.halt(&mut state);
        state.records = None;
        self.cursor.store(0, Ordering::SeqCst);
        Ok(ControlReply::ok("Disconnected from replay"))
    }

    async fn status(&self) -> BackendResult<StatusReply> {
        let connected = self.state.lock().records.is_some();
        let streaming = self.streaming.load(Ordering::SeqCst);
        Ok(StatusReply {
            success: true,
            connection: ConnectionStatus {
                connected,
                streaming,
                has_source: connected,
            },
            broadcasting: streaming,
        })
    }

    async fn request_snapshot(&self) -> BackendResult<()> {
        let current = {
            let state = self.state.lock();
            state.records.as_ref().and_then(|records| {
                let next = self.cursor.load(Ordering::SeqCst);
                next.checked_sub(1)
                    .and_then(|i| records.get(i.min(records.len().saturating_sub(1))))
                    .cloned()
            })
        };
        let event = match current {
            Some(update) => ServerEvent::EegData(update),
            None => ServerEvent::Error("No replay data yet".to_owned()),
        };
        push(&self.tx, event).await
    }
}
