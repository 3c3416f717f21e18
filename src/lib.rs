//! # brainwave-dash
//!
//! Live brainwave-power dashboard for a four-electrode EEG headband.
//!
//! A data source (the [`backend`]) pushes `eeg_data` updates carrying band
//! powers, a ranking, a dominant mental state and the latest raw sample per
//! electrode.  The dashboard keeps a bounded history of raw samples, draws a
//! sketch per band, and plots the raw signal as one lane per electrode.
//!
//! ## Quick start
//!
//! ```no_run
//! use brainwave_dash::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = DashConfig::default();
//!     let (server, mut rx) = SimulatedServer::new(config.clone());
//!     server.connect().await?;
//!     server.start_streaming().await?;
//!
//!     let dispatcher = Dispatcher::standard();
//!     let mut session = Session::new(&config);
//!     while let Some(event) = rx.recv().await {
//!         dispatcher.dispatch(&mut session, event);
//!         if let Some(update) = session.latest() {
//!             println!("{} ({} frames)", update.state_label(), session.history().len());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Using as a library dependency
//!
//! ```toml
//! [dependencies]
//! # Full build (includes the ratatui dashboard):
//! brainwave-dash = "0.1"
//!
//! # Model and backends only, skips ratatui / crossterm:
//! brainwave-dash = { version = "0.1", default-features = false }
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`prelude`] | One-line glob import of the most commonly needed types |
//! | [`history`] | [`history::RollingSampleBuffer`]: bounded raw-sample history and lane projection |
//! | [`types`] | Wire payload, push events and control replies |
//! | [`bands`] | Band and mental-state tables, ranking rule |
//! | [`sketch`] | Synthetic per-band and combined waveform sketches |
//! | [`session`] | Per-run dashboard state driven by events and control outcomes |
//! | [`dispatch`] | Event-kind → handler table |
//! | [`backend`] | The [`backend::Backend`] trait, simulator and file replay |
//! | [`config`] | [`config::DashConfig`] runtime settings |
//! | [`cli`] | Flags shared by the binaries |
//! | [`error`] | [`error::BackendError`] |
//! | `keymap`, `ui` | Terminal dashboard (feature `tui`) |

pub mod backend;
pub mod bands;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod session;
pub mod sketch;
pub mod types;

#[cfg(feature = "tui")]
pub mod keymap;
#[cfg(feature = "tui")]
pub mod ui;

// ── Prelude ───────────────────────────────────────────────────────────────────

/// Convenience re-exports for downstream crates.
pub mod prelude {
    // ── Sources ───────────────────────────────────────────────────────────────
    pub use crate::backend::{Backend, ReplayServer, SimulatedServer};

    // ── Model ─────────────────────────────────────────────────────────────────
    pub use crate::config::DashConfig;
    pub use crate::dispatch::Dispatcher;
    pub use crate::history::{ChannelValues, RollingSampleBuffer, SampleFrame};
    pub use crate::session::{ControlOutcome, Session};

    // ── Events and data types ─────────────────────────────────────────────────
    pub use crate::bands::{Band, MentalState};
    pub use crate::error::{BackendError, BackendResult};
    pub use crate::types::{ControlAction, ControlReply, EegUpdate, ServerEvent, StatusReply};
}
