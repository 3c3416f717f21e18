//! Rolling multi-channel sample history behind the raw-signal plot.
//!
//! [`RollingSampleBuffer`] keeps the most recent `capacity` [`SampleFrame`]s in
//! arrival order and turns them into per-channel polylines for a renderer.
//!
//! Horizontal placement is ordinal: the `i`-th of `n` retained frames lands at
//! `x = i / (n - 1) * width` regardless of the timestamps it carries.
//!
//! ```
//! use brainwave_dash::history::{ChannelValues, RollingSampleBuffer, SampleFrame};
//!
//! let mut buf = RollingSampleBuffer::new(3);
//! for (ts, v) in [(0, 0.1), (1, 0.2), (2, 0.3), (3, 0.4)] {
//!     buf.append(SampleFrame::new(ts, ChannelValues::from_iter([("TP9", v)])));
//! }
//! assert_eq!(buf.len(), 3);
//! assert_eq!(buf.project_channel("TP9", 100.0, 10.0).len(), 3);
//! ```

use std::collections::VecDeque;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};

/// Number of frames retained when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 500;

/// Fraction of the lane height that a value of `1.0` spans vertically.
pub const VALUE_SCALE: f64 = 0.3;

// ── ChannelValues ─────────────────────────────────────────────────────────────

/// Channel-name → value mapping that remembers insertion order.
///
/// The order matters: the raw plot stacks lanes in the key order of the
/// oldest retained frame, so `{"TP9", "AF7", "AF8", "TP10"}` must not come
/// back alphabetised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelValues(Vec<(String, f64)>);

impl ChannelValues {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Set `name` to `value`, replacing an existing entry in place.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|&(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ChannelValues {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut values = ChannelValues::new();
        for (name, value) in iter {
            values.insert(name, value);
        }
        values
    }
}

/// One wire value: either a bare sample or a whole per-channel series, of
/// which only the newest sample is kept.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawValue {
    Sample(f64),
    Series(Vec<f64>),
    Other(serde::de::IgnoredAny),
}

impl RawValue {
    fn latest(self) -> Option<f64> {
        match self {
            RawValue::Sample(v) => Some(v),
            RawValue::Series(s) => s.last().copied(),
            RawValue::Other(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for ChannelValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChannelVisitor;

        impl<'de> Visitor<'de> for ChannelVisitor {
            type Value = ChannelValues;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of channel name to number or number array")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut values = ChannelValues::new();
                while let Some((name, raw)) = map.next_entry::<String, RawValue>()? {
                    // Non-numeric and empty series carry nothing to draw.
                    if let Some(v) = raw.latest() {
                        values.insert(name, v);
                    }
                }
                Ok(values)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ChannelValues::new())
            }
        }

        deserializer.deserialize_any(ChannelVisitor)
    }
}

// ── SampleFrame ───────────────────────────────────────────────────────────────

/// One multi-channel snapshot as delivered by the push channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFrame {
    /// Milliseconds; wall-clock or monotonic depending on the source.
    /// Never used for placement.
    pub timestamp: i64,
    pub channels: ChannelValues,
}

impl SampleFrame {
    pub fn new(timestamp: i64, channels: ChannelValues) -> Self {
        Self { timestamp, channels }
    }
}

// ── RollingSampleBuffer ───────────────────────────────────────────────────────

/// Bounded, insertion-ordered frame history with FIFO eviction.
///
/// `len() <= capacity()` holds after every call.  Frames are never reordered,
/// even when their timestamps arrive out of order.
#[derive(Debug, Clone)]
pub struct RollingSampleBuffer {
    capacity: usize,
    frames: VecDeque<SampleFrame>,
}

impl Default for RollingSampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RollingSampleBuffer {
    /// Create an empty buffer.  A capacity of `0` is raised to `1`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Append `frame`, evicting from the front until the capacity holds again.
    ///
    /// A frame without any channel is dropped and `false` is returned.
    pub fn append(&mut self, frame: SampleFrame) -> bool {
        if frame.channels.is_empty() {
            return false;
        }
        self.frames.push_back(frame);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
        true
    }

    /// Channel names of the oldest retained frame, in that frame's key order.
    ///
    /// Channels that only appear in later frames are not listed.
    pub fn channel_names(&self) -> Vec<&str> {
        self.frames
            .front()
            .map(|f| f.channels.names().collect())
            .unwrap_or_default()
    }

    /// Polyline for `channel` with no vertical lane offset.
    pub fn project_channel(&self, channel: &str, width: f64, height: f64) -> Vec<(f64, f64)> {
        self.project_channel_at(channel, width, height, 0.0)
    }

    /// Polyline for `channel` inside a lane of `height` starting at `offset`.
    ///
    /// Returns one point per retained frame, or nothing when fewer than two
    /// frames are held or no retained frame carries `channel`.  Frames that
    /// lack the channel contribute a value of `0.0`.
    pub fn project_channel_at(
        &self,
        channel: &str,
        width: f64,
        height: f64,
        offset: f64,
    ) -> Vec<(f64, f64)> {
        let n = self.frames.len();
        if n < 2 || !self.frames.iter().any(|f| f.channels.contains(channel)) {
            return Vec::new();
        }
        let last = (n - 1) as f64;
        self.frames
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let value = frame.channels.get(channel).unwrap_or(0.0);
                let x = i as f64 / last * width;
                let y = height / 2.0 + offset + value * height * VALUE_SCALE;
                (x, y)
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    /// Oldest-first iterator over the retained frames.
    pub fn frames(&self) -> impl Iterator<Item = &SampleFrame> {
        self.frames.iter()
    }

    pub fn latest(&self) -> Option<&SampleFrame> {
        self.frames.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ts: i64, channels: &[(&str, f64)]) -> SampleFrame {
        SampleFrame::new(ts, channels.iter().map(|&(n, v)| (n, v)).collect())
    }

    #[test]
    fn capacity_three_keeps_last_three_in_order() {
        let mut buf = RollingSampleBuffer::new(3);
        buf.append(frame(1, &[("a", 1.0)]));
        buf.append(frame(2, &[("b", 2.0), ("c", 2.5)]));
        buf.append(frame(3, &[("c", 3.0)]));
        buf.append(frame(4, &[("d", 4.0)]));

        let ts: Vec<i64> = buf.frames().map(|f| f.timestamp).collect();
        assert_eq!(ts, vec![2, 3, 4]);
        // Channel set comes from the oldest retained frame (B), not the newest.
        assert_eq!(buf.channel_names(), vec!["b", "c"]);
    }

    #[test]
    fn empty_frame_is_ignored() {
        let mut buf = RollingSampleBuffer::new(4);
        buf.append(frame(1, &[("TP9", 0.5)]));
        let before: Vec<SampleFrame> = buf.frames().cloned().collect();

        assert!(!buf.append(SampleFrame::new(2, ChannelValues::new())));
        let after: Vec<SampleFrame> = buf.frames().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn empty_buffer_projects_nothing() {
        let buf = RollingSampleBuffer::default();
        assert!(buf.project_channel("delta", 800.0, 200.0).is_empty());
        assert!(buf.channel_names().is_empty());
        assert_eq!(buf.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn single_frame_projects_nothing() {
        let mut buf = RollingSampleBuffer::new(10);
        buf.append(frame(0, &[("TP9", 1.0)]));
        assert!(buf.project_channel("TP9", 100.0, 100.0).is_empty());
    }

    #[test]
    fn x_spacing_is_ordinal() {
        let mut buf = RollingSampleBuffer::new(10);
        // Irregular and out-of-order timestamps must not matter.
        for ts in [50, 10, 900, 11, 12] {
            buf.append(frame(ts, &[("TP9", 0.0)]));
        }
        let pts = buf.project_channel("TP9", 400.0, 100.0);
        let xs: Vec<f64> = pts.iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![0.0, 100.0, 200.0, 300.0, 400.0]);
        let ts: Vec<i64> = buf.frames().map(|f| f.timestamp).collect();
        assert_eq!(ts, vec![50, 10, 900, 11, 12]);
    }

    #[test]
    fn y_uses_lane_offset_and_scale() {
        let mut buf = RollingSampleBuffer::new(10);
        buf.append(frame(0, &[("AF7", 1.0)]));
        buf.append(frame(1, &[("AF7", -0.5)]));

        let pts = buf.project_channel_at("AF7", 10.0, 100.0, 200.0);
        assert_eq!(pts[0], (0.0, 50.0 + 200.0 + 30.0));
        assert_eq!(pts[1], (10.0, 50.0 + 200.0 - 15.0));
    }

    #[test]
    fn missing_value_defaults_to_zero() {
        let mut buf = RollingSampleBuffer::new(10);
        buf.append(frame(0, &[("TP9", 1.0)]));
        buf.append(frame(1, &[("AF7", 1.0)]));
        buf.append(frame(2, &[("TP9", 1.0)]));

        let pts = buf.project_channel("TP9", 2.0, 10.0);
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[1].1, 5.0);
        assert_eq!(pts[0].1, 8.0);
    }

    #[test]
    fn unknown_channel_projects_nothing() {
        let mut buf = RollingSampleBuffer::new(10);
        buf.append(frame(0, &[("TP9", 1.0)]));
        buf.append(frame(1, &[("TP9", 1.0)]));
        assert!(buf.project_channel("gamma", 100.0, 100.0).is_empty());
    }

    #[test]
    fn clear_empties() {
        let mut buf = RollingSampleBuffer::new(2);
        buf.append(frame(0, &[("TP9", 1.0)]));
        buf.append(frame(1, &[("TP9", 1.0)]));
        assert!(buf.is_full());
        buf.clear();
        assert!(buf.is_empty());
        assert!(buf.latest().is_none());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut buf = RollingSampleBuffer::new(0);
        buf.append(frame(0, &[("TP9", 1.0)]));
        buf.append(frame(1, &[("TP9", 2.0)]));
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.latest().map(|f| f.timestamp), Some(1));
    }

    #[test]
    fn channel_values_keep_insertion_order() {
        let mut v = ChannelValues::new();
        v.insert("TP9", 1.0);
        v.insert("AF7", 2.0);
        v.insert("TP9", 3.0);
        assert_eq!(v.names().collect::<Vec<_>>(), vec!["TP9", "AF7"]);
        assert_eq!(v.get("TP9"), Some(3.0));
    }

    #[test]
    fn deserialize_scalars_and_series() {
        let v: ChannelValues =
            serde_json::from_str(r#"{"TP9": 0.25, "AF7": [1.0, 2.0, 3.0], "AF8": [], "TP10": "x"}"#)
                .unwrap();
        assert_eq!(v.names().collect::<Vec<_>>(), vec!["TP9", "AF7"]);
        assert_eq!(v.get("AF7"), Some(3.0));
    }
}
