//! In-process stand-in for the headset server.
//!
//! Follows the server's connection rules (start needs a prior connect,
//! disconnect stops streaming first) and broadcasts synthetic updates while
//! streaming, so the dashboard can be exercised without hardware.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{event_channel, push, Backend};
use crate::bands::Band;
use crate::config::DashConfig;
use crate::error::BackendResult;
use crate::history::ChannelValues;
use crate::sketch::FULL_SCALE_POWER;
use crate::types::{now_ms, ConnectionStatus, ControlReply, EegUpdate, ServerEvent, StatusReply};

/// Electrode names in headset order.
pub const SIM_CHANNELS: [&str; 4] = ["TP9", "AF7", "AF8", "TP10"];

/// Typical peak of [`sim_sample`] in µV; raw values are divided by this so
/// they sit around `±1` on the wire.
const SIM_PEAK_UV: f64 = 50.0;

/// Mean relative power per band, in [`Band::ALL`] order.
const BASE_POWER: [f64; 5] = [0.40, 0.30, 0.60, 0.35, 0.15];

/// Slow modulation rate per band in Hz, so the dominant band drifts.
const DRIFT_HZ: [f64; 5] = [0.031, 0.047, 0.023, 0.059, 0.071];

/// One synthetic EEG sample at time `t` (seconds) for channel `ch`, in µV.
///
/// | Component | Frequency | Amplitude |
/// |-----------|-----------|-----------|
/// | Alpha     | 10 Hz     | ±20 µV    |
/// | Beta      | 22 Hz     | ±6 µV     |
/// | Theta     | 6 Hz      | ±10 µV    |
/// | Noise     | —         | ±4 µV     |
pub fn sim_sample(t: f64, ch: usize) -> f64 {
    let phi = ch as f64 * PI / 2.5;
    let alpha = 20.0 * (2.0 * PI * 10.0 * t + phi).sin();
    let beta = 6.0 * (2.0 * PI * 22.0 * t + phi * 1.7).sin();
    let theta = 10.0 * (2.0 * PI * 6.0 * t + phi * 0.9).sin();
    let nx = t * 1000.7 + ch as f64 * 137.508;
    let noise = ((nx.sin() * 9973.1).fract() - 0.5) * 8.0;
    alpha + beta + theta + noise
}

/// Band powers at time `t`, in wire units (full scale = [`FULL_SCALE_POWER`]).
pub fn sim_powers(t: f64) -> BTreeMap<String, f64> {
    Band::ALL
        .into_iter()
        .enumerate()
        .map(|(i, band)| {
            let phase = i as f64 * 1.3;
            let rel = BASE_POWER[i] * (1.0 + 0.6 * (2.0 * PI * DRIFT_HZ[i] * t + phase).sin());
            (band.name().to_owned(), rel.clamp(0.0, 1.0) * FULL_SCALE_POWER)
        })
        .collect()
}

/// A complete `eeg_data` payload for time `t` since the simulator started.
pub fn sim_update(t: f64, activity_threshold: f64) -> EegUpdate {
    let raw: ChannelValues = SIM_CHANNELS
        .iter()
        .enumerate()
        .map(|(ch, &name)| (name, sim_sample(t, ch) / SIM_PEAK_UV))
        .collect();
    EegUpdate::from_powers(
        Some(now_ms() as f64 / 1000.0),
        sim_powers(t),
        // Powers are in display units, so the threshold is scaled the same way.
        activity_threshold * FULL_SCALE_POWER,
        raw,
    )
}

#[derive(Default)]
struct SimState {
    connected: bool,
    streaming: bool,
    broadcaster: Option<JoinHandle<()>>,
}

pub struct SimulatedServer {
    config: DashConfig,
    started: Instant,
    tx: mpsc::Sender<ServerEvent>,
    state: Mutex<SimState>,
}

impl SimulatedServer {
    /// Bring the simulator up and return it with its push channel.
    ///
    /// The channel already holds the link-up greeting.
    pub fn new(config: DashConfig) -> (Arc<Self>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = event_channel();
        let server = Arc::new(Self {
            config,
            started: Instant::now(),
            tx,
            state: Mutex::new(SimState::default()),
        });
        (server, rx)
    }

    fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn spawn_broadcaster(&self) -> JoinHandle<()> {
        let tx = self.tx.clone();
        let started = self.started;
        let period = self.config.broadcast_interval;
        let threshold = self.config.activity_threshold;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let update = sim_update(started.elapsed().as_secs_f64(), threshold);
                if tx.send(ServerEvent::EegData(update)).await.is_err() {
                    debug!("simulator: receiver gone, broadcaster exits");
                    break;
                }
            }
        })
    }

    fn halt(state: &mut SimState) {
        state.streaming = false;
        if let Some(task) = state.broadcaster.take() {
            task.abort();
        }
    }
}

impl Drop for SimulatedServer {
    fn drop(&mut self) {
        Self::halt(self.state.get_mut());
    }
}

#[async_trait]
impl Backend for SimulatedServer {
    fn name(&self) -> &str {
        "simulator"
    }

    async fn connect(&self) -> BackendResult<ControlReply> {
        self.state.lock().connected = true;
        info!("simulator: headset connected");
        Ok(ControlReply::ok("Connected to simulated headset"))
    }

    async fn start_streaming(&self) -> BackendResult<ControlReply> {
        let mut state = self.state.lock();
        if !state.connected {
            return Ok(ControlReply::failed("Not connected. Please connect first."));
        }
        if state.streaming {
            return Ok(ControlReply::ok("Already streaming"));
        }
        state.streaming = true;
        state.broadcaster = Some(self.spawn_broadcaster());
        info!("simulator: streaming started");
        Ok(ControlReply::ok("Started streaming"))
    }

    async fn stop_streaming(&self) -> BackendResult<ControlReply> {
        Self::halt(&mut self.state.lock());
        info!("simulator: streaming stopped");
        Ok(ControlReply::ok("Stopped streaming"))
    }

    async fn disconnect(&self) -> BackendResult<ControlReply> {
        let mut state = self.state.lock();
        Self::halt(&mut state);
        state.connected = false;
        info!("simulator: headset disconnected");
        Ok(ControlReply::ok("Disconnected from headset"))
    }

    async fn status(&self) -> BackendResult<StatusReply> {
        let state = self.state.lock();
        Ok(StatusReply {
            success: true,
            connection: ConnectionStatus {
                connected: state.connected,
                streaming: state.streaming,
                has_source: state.connected,
            },
            broadcasting: state.streaming,
        })
    }

    async fn request_snapshot(&self) -> BackendResult<()> {
        let connected = self.state.lock().connected;
        let event = if connected {
            ServerEvent::EegData(sim_update(self.elapsed(), self.config.activity_threshold))
        } else {
            ServerEvent::Error("No data: headset not connected".to_owned())
        };
        push(&self.tx, event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> DashConfig {
        DashConfig {
            broadcast_interval: Duration::from_millis(100),
            ..DashConfig::default()
        }
    }

    async fn drain_greeting(rx: &mut mpsc::Receiver<ServerEvent>) {
        assert_eq!(rx.recv().await, Some(ServerEvent::LinkUp));
        assert!(matches!(rx.recv().await, Some(ServerEvent::Status(_))));
    }

    #[test]
    fn sim_sample_stays_in_range() {
        for i in 0..2560 {
            let t = i as f64 / 256.0;
            for ch in 0..4 {
                assert!(sim_sample(t, ch).abs() < SIM_PEAK_UV);
            }
        }
    }

    #[test]
    fn sim_update_is_complete() {
        let u = sim_update(3.0, 0.1);
        assert_eq!(u.wave_powers.len(), 5);
        assert_eq!(u.wave_rankings.len(), 5);
        assert_eq!(u.raw_data.names().collect::<Vec<_>>(), SIM_CHANNELS.to_vec());
        let total: f64 = u.wave_percentages.values().sum();
        assert!((total - 100.0).abs() < 1e-6);
        assert_ne!(u.state_label(), "Unknown");
    }

    #[tokio::test]
    async fn start_requires_connect() {
        let (server, mut rx) = SimulatedServer::new(config());
        drain_greeting(&mut rx).await;

        let reply = server.start_streaming().await.unwrap();
        assert!(!reply.success);

        assert!(server.connect().await.unwrap().success);
        assert!(server.start_streaming().await.unwrap().success);
        let status = server.status().await.unwrap();
        assert!(status.connection.streaming);
        assert!(status.broadcasting);
    }

    #[tokio::test(start_paused = true)]
    async fn streaming_broadcasts_updates() {
        let (server, mut rx) = SimulatedServer::new(config());
        drain_greeting(&mut rx).await;
        server.connect().await.unwrap();
        server.start_streaming().await.unwrap();

        for _ in 0..3 {
            match rx.recv().await {
                Some(ServerEvent::EegData(u)) => assert_eq!(u.raw_data.len(), 4),
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_keeps_single_broadcaster() {
        let (server, mut rx) = SimulatedServer::new(config());
        drain_greeting(&mut rx).await;
        server.connect().await.unwrap();
        server.start_streaming().await.unwrap();
        let reply = server.start_streaming().await.unwrap();
        assert!(reply.success);

        tokio::time::sleep(Duration::from_millis(450)).await;
        let mut n = 0;
        while let Ok(ServerEvent::EegData(_)) = rx.try_recv() {
            n += 1;
        }
        // One immediate tick plus one per 100 ms.
        assert_eq!(n, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_stops_broadcast() {
        let (server, mut rx) = SimulatedServer::new(config());
        drain_greeting(&mut rx).await;
        server.connect().await.unwrap();
        server.start_streaming().await.unwrap();
        rx.recv().await;

        server.disconnect().await.unwrap();
        let status = server.status().await.unwrap();
        assert!(!status.connection.connected);
        assert!(!status.connection.streaming);

        while rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn snapshot_when_disconnected_is_an_error_event() {
        let (server, mut rx) = SimulatedServer::new(config());
        drain_greeting(&mut rx).await;
        server.request_snapshot().await.unwrap();
        assert!(matches!(rx.recv().await, Some(ServerEvent::Error(_))));

        server.connect().await.unwrap();
        server.request_snapshot().await.unwrap();
        assert!(matches!(rx.recv().await, Some(ServerEvent::EegData(_))));
    }
}
