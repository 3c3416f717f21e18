//! Rolling raw-signal plot: one horizontal lane per electrode.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use super::{flip, rgb};
use crate::bands::channel_rgb;
use crate::history::RollingSampleBuffer;

/// Virtual canvas width of the raw plot.
pub const RAW_WIDTH: f64 = 1000.0;

/// Virtual canvas height of the raw plot, shared by all lanes.
pub const RAW_HEIGHT: f64 = 400.0;

/// Project every channel of `history` into its own lane, converted to the
/// chart's upward y axis.
pub(super) fn lanes(history: &RollingSampleBuffer) -> Vec<(String, Vec<(f64, f64)>)> {
    let names = history.channel_names();
    if names.is_empty() {
        return Vec::new();
    }
    let lane_height = RAW_HEIGHT / names.len() as f64;
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let pts = history.project_channel_at(name, RAW_WIDTH, lane_height, i as f64 * lane_height);
            (name.to_string(), flip(&pts, RAW_HEIGHT))
        })
        .collect()
}

pub(super) fn draw_raw(frame: &mut Frame, area: Rect, history: &RollingSampleBuffer) {
    let lanes = lanes(history);

    let datasets: Vec<Dataset> = lanes
        .iter()
        .enumerate()
        .map(|(i, (name, pts))| {
            Dataset::default()
                .name(name.as_str())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(rgb(channel_rgb(i))))
                .data(pts)
        })
        .collect();

    let title = if lanes.is_empty() {
        " Raw signal (waiting for data) ".to_owned()
    } else {
        format!(" Raw signal  {} samples ", history.len())
    };

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(Span::styled(
                    title,
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL),
        )
        .x_axis(Axis::default().bounds([0.0, RAW_WIDTH]))
        .y_axis(Axis::default().bounds([0.0, RAW_HEIGHT]));

    frame.render_widget(chart, area);
}
