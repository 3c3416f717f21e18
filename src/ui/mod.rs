//! Terminal rendering of a [`Session`].
//!
//! ```text
//! ┌ header: title │ status │ source │ history │ updates ┐
//! │ delta │ theta │ alpha │ beta │ gamma   (band sketches)
//! │ combined overview │ activity ranking │ mental state + shares
//! │ raw signal, one lane per channel
//! └ footer: key hints ┘
//! ```
//!
//! Charts are drawn in a virtual canvas whose y axis points down, like the
//! projection math in [`crate::history`] and [`crate::sketch`]; [`flip`]
//! converts to ratatui's upward axis.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::session::{Indicator, Session};
use crate::types::ControlAction;

mod notices;
mod ranking;
mod raw;
mod waves;

pub use raw::{RAW_HEIGHT, RAW_WIDTH};
pub use waves::{SKETCH_HEIGHT, SKETCH_POINTS};

/// Top-level render callback handed to [`ratatui::Terminal::draw`].
///
/// `source` names the backend in the header.
pub fn draw(frame: &mut Frame, session: &Session, source: &str) {
    let area = frame.area();
    let [header, bands, middle, raw_area, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(7),
        Constraint::Length(11),
        Constraint::Min(6),
        Constraint::Length(3),
    ])
    .areas(area);

    draw_header(frame, header, session, source);
    waves::draw_band_row(frame, bands, session.latest());

    let [combined, rank, state] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(35),
        Constraint::Percentage(25),
    ])
    .areas(middle);
    waves::draw_combined(frame, combined, session.latest());
    ranking::draw_ranking(frame, rank, session.latest());
    ranking::draw_state(frame, state, session.latest());

    raw::draw_raw(frame, raw_area, session.history());
    draw_footer(frame, footer, session);

    notices::draw_notices(frame, area, session);
}

// ── Helpers ───────────────────────────────────────────────────────────────────

pub(crate) fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

/// Convert points from the downward canvas y axis to ratatui's upward one,
/// clamping into `[0, height]` so ratatui does not drop them.
pub(crate) fn flip(points: &[(f64, f64)], height: f64) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|&(x, y)| (x, (height - y).clamp(0.0, height)))
        .collect()
}

/// Dimmed vertical separator used between header fields.
#[inline]
fn sep<'a>() -> Span<'a> {
    Span::styled(" │ ", Style::default().fg(Color::DarkGray))
}

/// Key label: bold yellow when the action is available, grey otherwise.
fn key(label: &str, enabled: bool) -> Span<'_> {
    let style = if enabled {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(label, style)
}

fn hint(text: &str, enabled: bool) -> Span<'_> {
    if enabled {
        Span::raw(text)
    } else {
        Span::styled(text, Style::default().fg(Color::DarkGray))
    }
}

// ── Header ────────────────────────────────────────────────────────────────────

fn draw_header(frame: &mut Frame, area: Rect, session: &Session, source: &str) {
    let indicator = session.indicator();
    let color = match indicator {
        Indicator::Disconnected => Color::Red,
        Indicator::Connected => Color::Yellow,
        Indicator::Streaming => Color::Green,
    };
    let link = if session.link_up() { "link up" } else { "link down" };
    let history = session.history();

    let line = Line::from(vec![
        Span::styled(
            " BRAINWAVE Dashboard ",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        sep(),
        Span::styled(
            format!("● {}", indicator.label()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        sep(),
        Span::styled(format!("{source} ({link})"), Style::default().fg(Color::White)),
        sep(),
        Span::styled(
            format!("history {}/{}", history.len(), history.capacity()),
            Style::default().fg(Color::LightBlue),
        ),
        sep(),
        Span::styled(
            format!("{} updates", session.updates_received()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

// ── Footer ────────────────────────────────────────────────────────────────────

fn draw_footer(frame: &mut Frame, area: Rect, session: &Session) {
    let c = session.controls();
    let on = |a: ControlAction| c.allows(a);

    let keys = Line::from(vec![
        Span::raw(" "),
        key("[c]", on(ControlAction::Connect)),
        hint("Connect  ", on(ControlAction::Connect)),
        key("[s]", on(ControlAction::StartStreaming)),
        hint("Start  ", on(ControlAction::StartStreaming)),
        key("[x]", on(ControlAction::StopStreaming)),
        hint("Stop  ", on(ControlAction::StopStreaming)),
        key("[d]", on(ControlAction::Disconnect)),
        hint("Disconnect  ", on(ControlAction::Disconnect)),
        key("[u]", true),
        Span::raw("Snapshot  "),
        key("[w]", true),
        Span::raw("Wipe  "),
        key("[q]", true),
        Span::raw("Quit"),
    ]);

    frame.render_widget(
        Paragraph::new(keys).block(Block::default().borders(Borders::ALL)),
        area,
    );
}
