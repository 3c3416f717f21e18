//! Data sources behind the dashboard.
//!
//! A backend plays the part of the device server: it answers control
//! requests and pushes [`ServerEvent`]s on the channel handed out when it was
//! created.  Two are provided:
//!
//! | Backend | Source |
//! |---|---|
//! | [`SimulatedServer`] | synthetic band powers and raw EEG, no hardware needed |
//! | [`ReplayServer`] | newline-delimited JSON `eeg_data` records from a file |

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use tokio::sync::mpsc;

use crate::error::{BackendError, BackendResult};
use crate::session::ControlOutcome;
use crate::types::{ControlAction, ControlReply, ServerEvent, StatusReply};

pub mod replay;
pub mod simulated;

pub use replay::ReplayServer;
pub use simulated::SimulatedServer;

/// Buffer depth of the push channel.
pub const EVENT_CHANNEL_DEPTH: usize = 256;

/// Message pushed right after a backend comes up.
pub const GREETING: &str = "Connected to EEG server";

/// Control surface of a data source.
///
/// Every request returns a [`ControlReply`]; `Err` is reserved for transport
/// failures.  Push events are delivered on the receiver returned by the
/// backend's constructor.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs and the header, e.g. `"simulator"`.
    fn name(&self) -> &str;

    async fn connect(&self) -> BackendResult<ControlReply>;

    async fn start_streaming(&self) -> BackendResult<ControlReply>;

    async fn stop_streaming(&self) -> BackendResult<ControlReply>;

    async fn disconnect(&self) -> BackendResult<ControlReply>;

    async fn status(&self) -> BackendResult<StatusReply>;

    /// Ask for one `eeg_data` push with the current state, outside the
    /// regular broadcast.  Problems are pushed as [`ServerEvent::Error`].
    async fn request_snapshot(&self) -> BackendResult<()>;

    async fn control(&self, action: ControlAction) -> BackendResult<ControlReply> {
        match action {
            ControlAction::Connect => self.connect().await,
            ControlAction::StartStreaming => self.start_streaming().await,
            ControlAction::StopStreaming => self.stop_streaming().await,
            ControlAction::Disconnect => self.disconnect().await,
        }
    }
}

/// Create the push channel and queue the link-up greeting on it.
pub(crate) fn event_channel() -> (mpsc::Sender<ServerEvent>, mpsc::Receiver<ServerEvent>) {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_DEPTH);
    // The channel is fresh, so neither send can fail for lack of room.
    let _ = tx.try_send(ServerEvent::LinkUp);
    let _ = tx.try_send(ServerEvent::Status(GREETING.to_owned()));
    (tx, rx)
}

/// Push `event`, mapping a closed channel to [`BackendError::ChannelClosed`].
pub(crate) async fn push(tx: &mpsc::Sender<ServerEvent>, event: ServerEvent) -> BackendResult<()> {
    tx.send(event).await.map_err(|_| BackendError::ChannelClosed)
}

/// Run `action` in the background and report the outcome on `outcomes`.
///
/// The caller's loop never waits on the backend.
pub fn spawn_control(
    backend: Arc<dyn Backend>,
    action: ControlAction,
    outcomes: mpsc::UnboundedSender<ControlOutcome>,
) {
    tokio::spawn(async move {
        let result = backend.control(action).await;
        if outcomes.send(ControlOutcome::Reply(action, result)).is_err() {
            debug!("{} finished after the dashboard closed", action.label());
        }
    });
}

/// Query the status endpoint in the background and report on `outcomes`.
pub fn spawn_status_poll(backend: Arc<dyn Backend>, outcomes: mpsc::UnboundedSender<ControlOutcome>) {
    tokio::spawn(async move {
        let result = backend.status().await;
        let _ = outcomes.send(ControlOutcome::Status(result));
    });
}

/// Request a snapshot in the background; transport failures come back as a
/// failed status so they are logged by the session.
pub fn spawn_snapshot(backend: Arc<dyn Backend>, outcomes: mpsc::UnboundedSender<ControlOutcome>) {
    tokio::spawn(async move {
        if let Err(e) = backend.request_snapshot().await {
            let _ = outcomes.send(ControlOutcome::Status(Err(e)));
        }
    });
}
