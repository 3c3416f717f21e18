//! Per-band sketch panels and the combined overview.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use super::{flip, rgb};
use crate::bands::Band;
use crate::sketch::{band_sketch, combined_sketch};
use crate::types::EegUpdate;

/// Horizontal resolution of every sketch.
pub const SKETCH_POINTS: usize = 200;

/// Virtual canvas height of every sketch.
pub const SKETCH_HEIGHT: f64 = 100.0;

pub(super) fn draw_band_row(frame: &mut Frame, area: Rect, latest: Option<&EegUpdate>) {
    let cols = Layout::horizontal([Constraint::Ratio(1, 5); 5]).split(area);
    for (band, col) in Band::ALL.into_iter().zip(cols.iter()) {
        let power = latest.map_or(0.0, |u| u.power(band.name()));
        draw_band(frame, *col, band, power);
    }
}

fn draw_band(frame: &mut Frame, area: Rect, band: Band, power: f64) {
    let color = rgb(band.rgb());
    let points = flip(
        &band_sketch(band.name(), power, SKETCH_POINTS, SKETCH_HEIGHT),
        SKETCH_HEIGHT,
    );

    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", band.title()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{power:.4} "), Style::default().fg(Color::White)),
    ]);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
        .x_axis(Axis::default().bounds([0.0, SKETCH_POINTS as f64]))
        .y_axis(Axis::default().bounds([0.0, SKETCH_HEIGHT]));

    frame.render_widget(chart, area);
}

pub(super) fn draw_combined(frame: &mut Frame, area: Rect, latest: Option<&EegUpdate>) {
    let fallback = EegUpdate::default();
    let update = latest.unwrap_or(&fallback);

    // Offsets start at the top edge, so the canvas extends 10 % above it.
    let lines: Vec<(Band, Vec<(f64, f64)>)> = combined_sketch(update, SKETCH_POINTS, SKETCH_HEIGHT)
        .into_iter()
        .map(|(band, pts)| {
            let up = pts.into_iter().map(|(x, y)| (x, SKETCH_HEIGHT - y)).collect();
            (band, up)
        })
        .collect();

    let datasets: Vec<Dataset> = lines
        .iter()
        .map(|(band, pts)| {
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(rgb(band.rgb())))
                .data(pts)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(Span::styled(
                    " All bands ",
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL),
        )
        .x_axis(Axis::default().bounds([0.0, SKETCH_POINTS as f64]))
        .y_axis(Axis::default().bounds([SKETCH_HEIGHT * 0.1, SKETCH_HEIGHT * 1.1]));

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::tests::buffer_text;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::collections::BTreeMap;

    #[test]
    fn band_titles_show_power() {
        let powers: BTreeMap<String, f64> = Band::ALL
            .into_iter()
            .map(|b| (b.name().to_owned(), 0.0005))
            .collect();
        let update = EegUpdate::from_powers(None, powers, 0.0, Default::default());

        let mut terminal = Terminal::new(TestBackend::new(150, 7)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                draw_band_row(f, area, Some(&update));
            })
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Gamma"));
        assert!(text.contains("0.0005"));
    }

    #[test]
    fn band_row_without_data_shows_zero() {
        let mut terminal = Terminal::new(TestBackend::new(150, 7)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                draw_band_row(f, area, None);
            })
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Delta"));
        assert!(text.contains("0.0000"));
    }
}
