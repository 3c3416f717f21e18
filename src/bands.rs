//! Brainwave bands, mental-state labels, and the display lookup tables.
//!
//! Everything here is static presentation data plus the small ranking rule
//! that turns a set of band powers into a dominant state.

use std::collections::BTreeMap;
use std::fmt;

// ── Bands ─────────────────────────────────────────────────────────────────────

/// The five classical EEG frequency bands, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::Delta, Band::Theta, Band::Alpha, Band::Beta, Band::Gamma];

    /// Lower-case wire name, as used for keys in `wave_powers` and friends.
    pub fn name(self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
        }
    }

    pub fn from_name(name: &str) -> Option<Band> {
        Band::ALL.into_iter().find(|b| b.name() == name)
    }

    /// Capitalised name for headings, e.g. `"Alpha"`.
    pub fn title(self) -> &'static str {
        match self {
            Band::Delta => "Delta",
            Band::Theta => "Theta",
            Band::Alpha => "Alpha",
            Band::Beta => "Beta",
            Band::Gamma => "Gamma",
        }
    }

    /// Cycles per sketch period used when drawing the band's waveform.
    ///
    /// These are visual rates, not the physiological frequencies.
    pub fn sketch_frequency(self) -> f64 {
        match self {
            Band::Delta => 0.5,
            Band::Theta => 1.0,
            Band::Alpha => 1.5,
            Band::Beta => 2.5,
            Band::Gamma => 3.5,
        }
    }

    /// Physiological frequency range in Hz (inclusive bounds).
    pub fn range_hz(self) -> (f64, f64) {
        match self {
            Band::Delta => (0.5, 4.0),
            Band::Theta => (4.0, 8.0),
            Band::Alpha => (8.0, 13.0),
            Band::Beta => (13.0, 30.0),
            Band::Gamma => (30.0, 100.0),
        }
    }

    /// Line colour as `(r, g, b)`.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Band::Delta => (0xff, 0x6b, 0x6b),
            Band::Theta => (0xfe, 0xca, 0x57),
            Band::Alpha => (0x48, 0xdb, 0xfb),
            Band::Beta => (0x1d, 0xd1, 0xa1),
            Band::Gamma => (0xff, 0x9f, 0xf3),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Band::Delta => "Deep sleep, unconscious",
            Band::Theta => "Meditation, creativity",
            Band::Alpha => "Relaxed wakefulness",
            Band::Beta => "Active thinking",
            Band::Gamma => "High-level processing",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sketch frequency for an arbitrary wire name; unknown names draw at `1.0`.
pub fn sketch_frequency(name: &str) -> f64 {
    Band::from_name(name).map_or(1.0, Band::sketch_frequency)
}

/// Colour for an arbitrary wire name; unknown names are white.
pub fn band_rgb(name: &str) -> (u8, u8, u8) {
    Band::from_name(name).map_or((0xff, 0xff, 0xff), Band::rgb)
}

pub fn band_description(name: &str) -> &'static str {
    Band::from_name(name).map_or("Unknown", Band::description)
}

/// Raw-plot lane colours, cycled by lane index.
pub const CHANNEL_RGB: [(u8, u8, u8); 4] = [
    (0xff, 0x6b, 0x6b),
    (0xfe, 0xca, 0x57),
    (0x48, 0xdb, 0xfb),
    (0x1d, 0xd1, 0xa1),
];

pub fn channel_rgb(index: usize) -> (u8, u8, u8) {
    CHANNEL_RGB[index % CHANNEL_RGB.len()]
}

/// Capitalise the first character of a wire name (`"alpha"` → `"Alpha"`).
pub fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Mental state ──────────────────────────────────────────────────────────────

/// Coarse interpretation of which band currently dominates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentalState {
    DeepRelaxation,
    CreativeMeditative,
    RelaxedWakefulness,
    ActiveThinking,
    HighLevelProcessing,
    LowActivity,
    Unknown,
}

impl MentalState {
    pub fn label(self) -> &'static str {
        match self {
            MentalState::DeepRelaxation => "Deep Relaxation/Sleep",
            MentalState::CreativeMeditative => "Creative/Meditative",
            MentalState::RelaxedWakefulness => "Relaxed Wakefulness",
            MentalState::ActiveThinking => "Active Thinking",
            MentalState::HighLevelProcessing => "High-Level Processing",
            MentalState::LowActivity => "Low Activity",
            MentalState::Unknown => "Unknown",
        }
    }

    pub fn from_label(label: &str) -> Option<MentalState> {
        use MentalState::*;
        [
            DeepRelaxation,
            CreativeMeditative,
            RelaxedWakefulness,
            ActiveThinking,
            HighLevelProcessing,
            LowActivity,
            Unknown,
        ]
        .into_iter()
        .find(|s| s.label() == label)
    }

    pub fn description(self) -> &'static str {
        match self {
            MentalState::DeepRelaxation => {
                "You are in a deeply relaxed state, possibly approaching sleep."
            }
            MentalState::CreativeMeditative => {
                "Your mind is in a creative, meditative state with increased theta activity."
            }
            MentalState::RelaxedWakefulness => {
                "You are awake but relaxed, with your eyes likely closed."
            }
            MentalState::ActiveThinking => {
                "You are actively thinking, concentrating, or problem-solving."
            }
            MentalState::HighLevelProcessing => {
                "Your brain is engaged in high-level cognitive processing."
            }
            MentalState::LowActivity => "Brain activity is currently low or unclear.",
            MentalState::Unknown => "Unable to determine current mental state.",
        }
    }

    /// State associated with a dominant band.
    pub fn for_band(band: Band) -> MentalState {
        match band {
            Band::Delta => MentalState::DeepRelaxation,
            Band::Theta => MentalState::CreativeMeditative,
            Band::Alpha => MentalState::RelaxedWakefulness,
            Band::Beta => MentalState::ActiveThinking,
            Band::Gamma => MentalState::HighLevelProcessing,
        }
    }
}

/// Long description for any state label, including ones this build does not know.
pub fn state_description(label: &str) -> &'static str {
    MentalState::from_label(label).map_or("Current mental state is unclear.", |s| s.description())
}

// ── Ranking ───────────────────────────────────────────────────────────────────

/// Default minimum power the dominant band needs before a state is named.
pub const ACTIVITY_THRESHOLD: f64 = 0.1;

/// Ranking, share of total, and dominant state derived from band powers.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveSummary {
    /// `(band, power)` sorted from most to least powerful.
    pub rankings: Vec<(String, f64)>,
    /// Percentage of the total power per band; all zero when the total is zero.
    pub percentages: BTreeMap<String, f64>,
    pub dominant: MentalState,
}

impl WaveSummary {
    /// Rank `powers`, compute percentages, and pick the dominant state.
    ///
    /// Ties keep band display order.  With no powers the state is
    /// [`MentalState::Unknown`]; when the top power is not above `threshold`
    /// it is [`MentalState::LowActivity`].
    pub fn from_powers(powers: &BTreeMap<String, f64>, threshold: f64) -> Self {
        let mut rankings: Vec<(String, f64)> =
            powers.iter().map(|(k, &v)| (k.clone(), v)).collect();
        rankings.sort_by_key(|(name, _)| Band::from_name(name));
        rankings.sort_by(|a, b| b.1.total_cmp(&a.1));

        let total: f64 = powers.values().sum();
        let percentages = powers
            .iter()
            .map(|(k, &v)| {
                let pct = if total > 0.0 { v / total * 100.0 } else { 0.0 };
                (k.clone(), pct)
            })
            .collect();

        let dominant = match rankings.first() {
            None => MentalState::Unknown,
            Some((_, power)) if *power <= threshold => MentalState::LowActivity,
            Some((name, _)) => Band::from_name(name).map_or(MentalState::Unknown, MentalState::for_band),
        };

        Self {
            rankings,
            percentages,
            dominant,
        }
    }
}
