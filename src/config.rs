use std::time::Duration;

use crate::bands::ACTIVITY_THRESHOLD;
use crate::history::DEFAULT_CAPACITY;

/// Runtime settings shared by the session, the backends and both binaries.
#[derive(Debug, Clone)]
pub struct DashConfig {
    /// Frames retained for the raw-signal plot. Default: `500`.
    pub history_capacity: usize,
    /// How often the status endpoint is polled. Default: 2 s.
    pub status_poll: Duration,
    /// How long a notification stays on screen. Default: 5 s.
    pub notification_ttl: Duration,
    /// Interval between `eeg_data` pushes while streaming. Default: 100 ms.
    pub broadcast_interval: Duration,
    /// Minimum power of the dominant band before a mental state is named.
    ///
    /// Only used by sources that derive the state themselves (the simulator).
    /// Default: `0.1`.
    pub activity_threshold: f64,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            status_poll: Duration::from_secs(2),
            notification_ttl: Duration::from_secs(5),
            broadcast_interval: Duration::from_millis(100),
            activity_threshold: ACTIVITY_THRESHOLD,
        }
    }
}
