//! Per-run dashboard state.
//!
//! A [`Session`] is created when the dashboard starts and owned by the main
//! loop.  Push events reach it through [`crate::dispatch::Dispatcher`];
//! results of control requests and status polls arrive as
//! [`ControlOutcome`]s.  Nothing in here touches a terminal, so the whole
//! model can be driven from tests.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::DashConfig;
use crate::error::BackendResult;
use crate::history::RollingSampleBuffer;
use crate::types::{now_ms, ControlAction, ControlReply, EegUpdate, ServerEvent, StatusReply};

// ── Status indicator ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Disconnected,
    Connected,
    Streaming,
}

impl Indicator {
    pub fn label(self) -> &'static str {
        match self {
            Indicator::Disconnected => "Disconnected",
            Indicator::Connected => "Connected",
            Indicator::Streaming => "Streaming",
        }
    }
}

// ── Notifications ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,
    pub created: Instant,
}

// ── Control enablement ────────────────────────────────────────────────────────

/// Which control requests are currently offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub connect: bool,
    pub start: bool,
    pub stop: bool,
    pub disconnect: bool,
}

impl Controls {
    /// Only "connect" is available before anything has happened.
    pub const INITIAL: Controls = Controls {
        connect: true,
        start: false,
        stop: false,
        disconnect: false,
    };

    fn from_flags(connected: bool, streaming: bool, can_start: bool, can_disconnect: bool) -> Self {
        Self {
            connect: !connected,
            start: can_start,
            stop: streaming,
            disconnect: can_disconnect,
        }
    }

    pub fn allows(&self, action: ControlAction) -> bool {
        match action {
            ControlAction::Connect => self.connect,
            ControlAction::StartStreaming => self.start,
            ControlAction::StopStreaming => self.stop,
            ControlAction::Disconnect => self.disconnect,
        }
    }
}

// ── Control outcomes ──────────────────────────────────────────────────────────

/// Result of a control request or status poll, fed back into the main loop.
#[derive(Debug)]
pub enum ControlOutcome {
    Reply(ControlAction, BackendResult<ControlReply>),
    Status(BackendResult<StatusReply>),
}

// ── Session ───────────────────────────────────────────────────────────────────

pub struct Session {
    history: RollingSampleBuffer,
    latest: Option<EegUpdate>,
    updates_received: u64,

    link_up: bool,
    connected: bool,
    streaming: bool,
    broadcasting: bool,
    indicator: Indicator,
    controls: Controls,

    notifications: VecDeque<Notification>,
    notification_ttl: Duration,
}

impl Session {
    pub fn new(config: &DashConfig) -> Self {
        Self {
            history: RollingSampleBuffer::new(config.history_capacity),
            latest: None,
            updates_received: 0,
            link_up: false,
            connected: false,
            streaming: false,
            broadcasting: false,
            indicator: Indicator::Disconnected,
            controls: Controls::INITIAL,
            notifications: VecDeque::new(),
            notification_ttl: config.notification_ttl,
        }
    }

    pub fn history(&self) -> &RollingSampleBuffer {
        &self.history
    }

    pub fn latest(&self) -> Option<&EegUpdate> {
        self.latest.as_ref()
    }

    pub fn updates_received(&self) -> u64 {
        self.updates_received
    }

    pub fn link_up(&self) -> bool {
        self.link_up
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn is_broadcasting(&self) -> bool {
        self.broadcasting
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    // ── Ingest ───────────────────────────────────────────────────────────────

    /// Keep `update` as the latest snapshot and append its raw sample to the
    /// history.  A snapshot without raw data still refreshes the band panels.
    pub fn ingest(&mut self, update: EegUpdate) {
        let frame = update.raw_frame(now_ms());
        if !self.history.append(frame) {
            debug!("eeg_data without raw channels; history unchanged");
        }
        self.latest = Some(update);
        self.updates_received += 1;
    }

    /// Drop the raw history.  Band panels keep showing the latest snapshot.
    pub fn wipe_history(&mut self) {
        self.history.clear();
    }

    // ── Notifications ────────────────────────────────────────────────────────

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notifications.push_back(Notification {
            level,
            message: message.into(),
            created: Instant::now(),
        });
    }

    /// Remove and return every pending notification, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Remove notifications older than the configured lifetime.
    pub fn expire_notifications(&mut self, now: Instant) {
        let ttl = self.notification_ttl;
        self.notifications
            .retain(|n| now.saturating_duration_since(n.created) < ttl);
    }

    // ── Control results ──────────────────────────────────────────────────────

    pub fn handle_outcome(&mut self, outcome: ControlOutcome) {
        match outcome {
            ControlOutcome::Reply(action, result) => self.apply_reply(action, result),
            ControlOutcome::Status(result) => self.apply_status(result),
        }
    }

    /// Update flags, control enablement and notifications after a control
    /// request completes.
    pub fn apply_reply(&mut self, action: ControlAction, result: BackendResult<ControlReply>) {
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{} request failed: {e}", action.label());
                let prefix = match action {
                    ControlAction::Connect => "Connection error",
                    ControlAction::StartStreaming => "Streaming error",
                    ControlAction::StopStreaming => "Stop streaming error",
                    ControlAction::Disconnect => "Disconnect error",
                };
                self.notify(NoticeLevel::Error, format!("{prefix}: {e}"));
                return;
            }
        };

        if !reply.success {
            info!("{} declined: {}", action.label(), reply.message);
            let prefix = match action {
                ControlAction::Connect => "Failed to connect",
                ControlAction::StartStreaming => "Failed to start streaming",
                ControlAction::StopStreaming => "Failed to stop streaming",
                ControlAction::Disconnect => "Failed to disconnect",
            };
            self.notify(NoticeLevel::Error, format!("{prefix}: {}", reply.message));
            return;
        }

        info!("{} succeeded: {}", action.label(), reply.message);
        match action {
            ControlAction::Connect => {
                self.connected = true;
                self.controls = Controls::from_flags(true, false, true, true);
                self.notify(NoticeLevel::Success, "Successfully connected to headset!");
            }
            ControlAction::StartStreaming => {
                self.streaming = true;
                self.controls = Controls::from_flags(true, true, false, true);
                self.notify(NoticeLevel::Success, "Started streaming EEG data!");
            }
            ControlAction::StopStreaming => {
                self.streaming = false;
                self.controls = Controls::from_flags(true, false, true, true);
                self.notify(NoticeLevel::Info, "Stopped streaming EEG data!");
            }
            ControlAction::Disconnect => {
                self.connected = false;
                self.streaming = false;
                self.controls = Controls::from_flags(false, false, false, false);
                self.history.clear();
                self.notify(NoticeLevel::Info, "Disconnected from headset!");
            }
        }
    }

    /// Refresh the indicator from a status poll.  Poll failures are logged only.
    pub fn apply_status(&mut self, result: BackendResult<StatusReply>) {
        match result {
            Ok(status) if status.success => {
                let c = status.connection;
                self.connected = c.connected;
                self.streaming = c.connected && c.streaming;
                self.broadcasting = status.broadcasting;
                self.indicator = match (c.connected, c.streaming) {
                    (false, _) => Indicator::Disconnected,
                    (true, false) => Indicator::Connected,
                    (true, true) => Indicator::Streaming,
                };
            }
            Ok(_) => debug!("status poll returned success=false"),
            Err(e) => warn!("Status update error: {e}"),
        }
    }
}

// ── Push-event handlers (installed by `Dispatcher::standard`) ─────────────────

pub(crate) fn on_eeg_data(session: &mut Session, event: ServerEvent) {
    if let ServerEvent::EegData(update) = event {
        session.ingest(update);
    }
}

pub(crate) fn on_status(session: &mut Session, event: ServerEvent) {
    if let ServerEvent::Status(message) = event {
        info!("Server status: {message}");
        session.notify(NoticeLevel::Info, message);
    }
}

pub(crate) fn on_error(session: &mut Session, event: ServerEvent) {
    if let ServerEvent::Error(message) = event {
        warn!("Server error: {message}");
        session.notify(NoticeLevel::Error, format!("Server error: {message}"));
    }
}

pub(crate) fn on_link_up(session: &mut Session, _event: ServerEvent) {
    info!("Connected to EEG server");
    session.link_up = true;
}

pub(crate) fn on_link_down(session: &mut Session, _event: ServerEvent) {
    info!("Disconnected from EEG server");
    session.link_up = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::history::ChannelValues;
    use crate::types::ConnectionStatus;

    fn session() -> Session {
        Session::new(&DashConfig {
            history_capacity: 3,
            ..DashConfig::default()
        })
    }

    fn update(v: f64) -> EegUpdate {
        EegUpdate {
            timestamp: Some(v),
            raw_data: [("TP9", v)].into_iter().collect(),
            ..EegUpdate::default()
        }
    }

    fn last_message(s: &Session) -> Option<(NoticeLevel, String)> {
        s.notifications().last().map(|n| (n.level, n.message.clone()))
    }

    #[test]
    fn ingest_appends_and_keeps_latest() {
        let mut s = session();
        for i in 0..5 {
            s.ingest(update(i as f64));
        }
        assert_eq!(s.history().len(), 3);
        assert_eq!(s.updates_received(), 5);
        assert_eq!(s.latest().and_then(|u| u.timestamp), Some(4.0));
    }

    #[test]
    fn ingest_without_raw_data_keeps_history() {
        let mut s = session();
        s.ingest(update(1.0));
        s.ingest(EegUpdate {
            raw_data: ChannelValues::new(),
            ..EegUpdate::default()
        });
        assert_eq!(s.history().len(), 1);
        assert!(s.latest().is_some());
    }

    #[test]
    fn control_lifecycle_toggles_controls() {
        let mut s = session();
        assert_eq!(s.controls(), Controls::INITIAL);

        s.apply_reply(ControlAction::Connect, Ok(ControlReply::ok("Connected")));
        assert!(s.is_connected());
        assert!(s.controls().allows(ControlAction::StartStreaming));
        assert!(!s.controls().allows(ControlAction::Connect));

        s.apply_reply(ControlAction::StartStreaming, Ok(ControlReply::ok("Started")));
        assert!(s.is_streaming());
        assert!(s.controls().allows(ControlAction::StopStreaming));
        assert!(!s.controls().allows(ControlAction::StartStreaming));

        s.apply_reply(ControlAction::StopStreaming, Ok(ControlReply::ok("Stopped")));
        assert!(!s.is_streaming());
        assert!(s.controls().allows(ControlAction::StartStreaming));
    }

    #[test]
    fn disconnect_clears_history() {
        let mut s = session();
        s.apply_reply(ControlAction::Connect, Ok(ControlReply::ok("ok")));
        s.ingest(update(1.0));
        s.ingest(update(2.0));

        s.apply_reply(ControlAction::Disconnect, Ok(ControlReply::ok("bye")));
        assert!(s.history().is_empty());
        assert_eq!(s.controls(), Controls::from_flags(false, false, false, false));
        assert_eq!(
            last_message(&s),
            Some((NoticeLevel::Info, "Disconnected from headset!".into()))
        );
    }

    #[test]
    fn declined_reply_reports_message() {
        let mut s = session();
        s.apply_reply(ControlAction::Connect, Ok(ControlReply::failed("no device")));
        assert!(!s.is_connected());
        assert_eq!(s.controls(), Controls::INITIAL);
        assert_eq!(
            last_message(&s),
            Some((NoticeLevel::Error, "Failed to connect: no device".into()))
        );
    }

    #[test]
    fn transport_error_reports_prefix() {
        let mut s = session();
        s.apply_reply(ControlAction::StartStreaming, Err(BackendError::ChannelClosed));
        assert_eq!(
            last_message(&s),
            Some((NoticeLevel::Error, "Streaming error: event channel closed".into()))
        );
    }

    #[test]
    fn status_drives_indicator() {
        let mut s = session();
        let reply = |connected, streaming| {
            Ok(StatusReply {
                success: true,
                connection: ConnectionStatus {
                    connected,
                    streaming,
                    has_source: connected,
                },
                broadcasting: streaming,
            })
        };
        s.apply_status(reply(true, false));
        assert_eq!(s.indicator(), Indicator::Connected);
        s.apply_status(reply(true, true));
        assert_eq!(s.indicator(), Indicator::Streaming);
        assert!(s.is_broadcasting());
        s.apply_status(reply(false, false));
        assert_eq!(s.indicator(), Indicator::Disconnected);

        // A failed poll leaves things as they were.
        s.apply_status(Err(BackendError::ChannelClosed));
        assert_eq!(s.indicator(), Indicator::Disconnected);
    }

    #[test]
    fn take_notifications_drains() {
        let mut s = session();
        s.notify(NoticeLevel::Success, "one");
        s.notify(NoticeLevel::Error, "two");
        let taken: Vec<String> = s.take_notifications().into_iter().map(|n| n.message).collect();
        assert_eq!(taken, vec!["one", "two"]);
        assert_eq!(s.notifications().count(), 0);
    }

    #[test]
    fn notifications_expire() {
        let mut s = session();
        s.notify(NoticeLevel::Info, "hello");
        s.expire_notifications(Instant::now());
        assert_eq!(s.notifications().count(), 1);

        s.expire_notifications(Instant::now() + Duration::from_secs(6));
        assert_eq!(s.notifications().count(), 0);
    }
}
