use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::bands::{MentalState, WaveSummary};
use crate::history::{ChannelValues, SampleFrame};

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// One `eeg_data` push: precomputed band powers plus the latest raw sample
/// per electrode.
///
/// Every field is optional on the wire; missing fields take their defaults
/// so a partial update still renders.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EegUpdate {
    /// Seconds since the Unix epoch, as sent by the server.
    pub timestamp: Option<f64>,
    /// Power per band name (`"delta"` … `"gamma"`).
    pub wave_powers: BTreeMap<String, f64>,
    /// `(band, power)` pairs, most active first.
    pub wave_rankings: Vec<(String, f64)>,
    /// Share of total power per band, in percent.
    pub wave_percentages: BTreeMap<String, f64>,
    /// Label such as `"Relaxed Wakefulness"`; `None` renders as `"Unknown"`.
    pub dominant_state: Option<String>,
    /// Latest value per electrode.  Arrays on the wire collapse to their last
    /// element; see [`ChannelValues`].
    pub raw_data: ChannelValues,
}

impl EegUpdate {
    /// Build an update from band powers, deriving ranking, percentages and
    /// state the same way the server does.
    pub fn from_powers(
        timestamp: Option<f64>,
        wave_powers: BTreeMap<String, f64>,
        threshold: f64,
        raw_data: ChannelValues,
    ) -> Self {
        let summary = WaveSummary::from_powers(&wave_powers, threshold);
        Self {
            timestamp,
            wave_powers,
            wave_rankings: summary.rankings,
            wave_percentages: summary.percentages,
            dominant_state: Some(summary.dominant.label().to_owned()),
            raw_data,
        }
    }

    pub fn power(&self, band: &str) -> f64 {
        self.wave_powers.get(band).copied().unwrap_or(0.0)
    }

    pub fn percentage(&self, band: &str) -> f64 {
        self.wave_percentages.get(band).copied().unwrap_or(0.0)
    }

    pub fn state_label(&self) -> &str {
        self.dominant_state
            .as_deref()
            .unwrap_or(MentalState::Unknown.label())
    }

    /// The raw sample as a history frame, stamped in milliseconds.
    ///
    /// Falls back to `fallback_ms` when the server sent no timestamp.
    pub fn raw_frame(&self, fallback_ms: i64) -> SampleFrame {
        let timestamp = self
            .timestamp
            .map(|s| (s * 1000.0) as i64)
            .unwrap_or(fallback_ms);
        SampleFrame::new(timestamp, self.raw_data.clone())
    }
}

impl Serialize for ChannelValues {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

impl Serialize for EegUpdate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("EegUpdate", 6)?;
        s.serialize_field("timestamp", &self.timestamp)?;
        s.serialize_field("wave_powers", &self.wave_powers)?;
        s.serialize_field("wave_rankings", &self.wave_rankings)?;
        s.serialize_field("wave_percentages", &self.wave_percentages)?;
        s.serialize_field("dominant_state", &self.dominant_state)?;
        s.serialize_field("raw_data", &self.raw_data)?;
        s.end()
    }
}

/// All events delivered over the push channel of a [`crate::backend::Backend`].
///
/// After `LinkDown` the channel closes; nothing further arrives.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A new batch of band powers and raw samples.
    EegData(EegUpdate),
    /// Informational message from the server.
    Status(String),
    /// The server failed to produce data.
    Error(String),
    /// The push link is up.
    LinkUp,
    /// The push link went away.
    LinkDown,
}

/// Discriminant of [`ServerEvent`], used as the dispatch-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    EegData,
    Status,
    Error,
    LinkUp,
    LinkDown,
}

impl ServerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::EegData(_) => EventKind::EegData,
            ServerEvent::Status(_) => EventKind::Status,
            ServerEvent::Error(_) => EventKind::Error,
            ServerEvent::LinkUp => EventKind::LinkUp,
            ServerEvent::LinkDown => EventKind::LinkDown,
        }
    }
}

/// Reply to a control request: a success flag and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlReply {
    pub success: bool,
    pub message: String,
}

impl ControlReply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Device-side connection state as reported by the status endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub streaming: bool,
    /// Whether a data source (device inlet, replay file) is attached.
    pub has_source: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReply {
    pub success: bool,
    pub connection: ConnectionStatus,
    pub broadcasting: bool,
}

/// The four user-triggered control requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Connect,
    StartStreaming,
    StopStreaming,
    Disconnect,
}

impl ControlAction {
    pub fn label(self) -> &'static str {
        match self {
            ControlAction::Connect => "connect",
            ControlAction::StartStreaming => "start streaming",
            ControlAction::StopStreaming => "stop streaming",
            ControlAction::Disconnect => "disconnect",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_payload_uses_defaults() {
        let u: EegUpdate = serde_json::from_str(r#"{"wave_powers": {"alpha": 0.4}}"#).unwrap();
        assert_eq!(u.power("alpha"), 0.4);
        assert_eq!(u.power("beta"), 0.0);
        assert_eq!(u.state_label(), "Unknown");
        assert!(u.raw_data.is_empty());
    }

    #[test]
    fn server_shaped_payload_parses() {
        let json = r#"{
            "timestamp": 1700000000.25,
            "wave_powers": {"delta": 0.1, "alpha": 0.3},
            "wave_rankings": [["alpha", 0.3], ["delta", 0.1]],
            "wave_percentages": {"delta": 25.0, "alpha": 75.0},
            "dominant_state": "Relaxed Wakefulness",
            "raw_data": {"TP9": [1.0, 2.0], "AF7": [0.5]}
        }"#;
        let u: EegUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(u.wave_rankings[0], ("alpha".to_string(), 0.3));
        assert_eq!(u.percentage("alpha"), 75.0);

        let frame = u.raw_frame(0);
        assert_eq!(frame.timestamp, 1_700_000_000_250);
        assert_eq!(frame.channels.get("TP9"), Some(2.0));
    }

    #[test]
    fn missing_timestamp_uses_fallback() {
        let u = EegUpdate::default();
        assert_eq!(u.raw_frame(42).timestamp, 42);
    }

    #[test]
    fn from_powers_fills_summary() {
        let powers = [("beta".to_string(), 0.6), ("theta".to_string(), 0.2)]
            .into_iter()
            .collect();
        let u = EegUpdate::from_powers(None, powers, 0.1, ChannelValues::new());
        assert_eq!(u.state_label(), "Active Thinking");
        assert_eq!(u.wave_rankings[0].0, "beta");
    }

    #[test]
    fn serialized_update_parses_back() {
        let raw: ChannelValues = [("TP9", 0.1), ("AF7", -0.2)].into_iter().collect();
        let u = EegUpdate::from_powers(Some(1.5), [("alpha".to_string(), 0.5)].into(), 0.1, raw);
        let line = serde_json::to_string(&u).unwrap();
        let back: EegUpdate = serde_json::from_str(&line).unwrap();
        assert_eq!(back, u);
    }

    #[test]
    fn event_kinds() {
        assert_eq!(ServerEvent::LinkUp.kind(), EventKind::LinkUp);
        assert_eq!(ServerEvent::Status("x".into()).kind(), EventKind::Status);
    }
}
