//! Command-line flags shared by both binaries.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;

use crate::backend::{Backend, ReplayServer, SimulatedServer};
use crate::config::DashConfig;
use crate::history::DEFAULT_CAPACITY;
use crate::types::ServerEvent;

/// Live brainwave dashboard.  Without `--replay` a built-in simulator
/// stands in for the headset server.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct DashArgs {
    /// Replay newline-delimited `eeg_data` JSON from FILE instead of simulating.
    #[arg(long, value_name = "FILE", env = "BRAINWAVE_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Start the replay over when it reaches the end.
    #[arg(long = "loop", requires = "replay")]
    pub looped: bool,

    /// Frames kept for the raw-signal plot.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_CAPACITY, env = "BRAINWAVE_CAPACITY")]
    pub capacity: usize,

    /// Milliseconds between pushed updates while streaming.
    #[arg(
        long,
        value_name = "MS",
        default_value_t = 100,
        env = "BRAINWAVE_INTERVAL_MS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub interval_ms: u64,
}

impl DashArgs {
    pub fn config(&self) -> DashConfig {
        DashConfig {
            history_capacity: self.capacity,
            broadcast_interval: Duration::from_millis(self.interval_ms),
            ..DashConfig::default()
        }
    }

    /// Bring up the selected backend together with its push channel.
    pub fn open_backend(
        &self,
        config: &DashConfig,
    ) -> (Arc<dyn Backend>, mpsc::Receiver<ServerEvent>) {
        match &self.replay {
            Some(path) => {
                let (server, rx) = ReplayServer::new(path, self.looped, config.clone());
                let backend: Arc<dyn Backend> = server;
                (backend, rx)
            }
            None => {
                let (server, rx) = SimulatedServer::new(config.clone());
                let backend: Arc<dyn Backend> = server;
                (backend, rx)
            }
        }
    }
}
