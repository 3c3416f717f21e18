//! Activity ranking, band shares and the mental-state panel.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use super::rgb;
use crate::bands::{band_description, band_rgb, state_description, title_case, Band};
use crate::types::EegUpdate;

pub(super) fn draw_ranking(frame: &mut Frame, area: Rect, latest: Option<&EegUpdate>) {
    let block = Block::default()
        .title(Span::styled(
            " Activity ranking ",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);

    let lines: Vec<Line> = match latest.filter(|u| !u.wave_rankings.is_empty()) {
        None => vec![Line::from(Span::styled(
            "No data available",
            Style::default().fg(Color::DarkGray),
        ))],
        Some(update) => update
            .wave_rankings
            .iter()
            .enumerate()
            .map(|(i, (name, power))| ranking_line(i + 1, name, *power, update.percentage(name)))
            .collect(),
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn ranking_line(rank: usize, name: &str, power: f64, pct: f64) -> Line<'static> {
    let color = rgb(band_rgb(name));
    Line::from(vec![
        Span::styled(format!("#{rank} "), Style::default().fg(Color::DarkGray)),
        Span::styled(
            title_case(name),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" ({})", band_description(name)),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(format!("  {pct:.1}%"), Style::default().fg(Color::White)),
        Span::styled(format!("  {power:.4}"), Style::default().fg(Color::DarkGray)),
    ])
}

pub(super) fn draw_state(frame: &mut Frame, area: Rect, latest: Option<&EegUpdate>) {
    let block = Block::default()
        .title(Span::styled(
            " Mental state ",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label = latest.map_or("Unknown", EegUpdate::state_label);
    let [text_area, gauges_area] =
        Layout::vertical([Constraint::Min(2), Constraint::Length(Band::ALL.len() as u16)])
            .areas(inner);

    let text = vec![
        Line::from(Span::styled(
            label.to_owned(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            state_description(label),
            Style::default().fg(Color::Gray),
        )),
    ];
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), text_area);

    let rows = Layout::vertical([Constraint::Length(1); 5]).split(gauges_area);
    for (band, row) in Band::ALL.into_iter().zip(rows.iter()) {
        let pct = latest.map_or(0.0, |u| u.percentage(band.name()));
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(rgb(band.rgb())).bg(Color::Black))
            .ratio((pct / 100.0).clamp(0.0, 1.0))
            .label(format!("{} {pct:.1}%", band.title()));
        frame.render_widget(gauge, *row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::tests::buffer_text;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::collections::BTreeMap;

    fn update() -> EegUpdate {
        let powers: BTreeMap<String, f64> = [("alpha", 0.6), ("beta", 0.3), ("delta", 0.1)]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect();
        EegUpdate::from_powers(None, powers, 0.1, Default::default())
    }

    fn render_ranking(latest: Option<&EegUpdate>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 8)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                draw_ranking(f, area, latest);
            })
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn ranking_lists_bands_in_order() {
        let text = render_ranking(Some(&update()));
        let alpha = text.find("#1 Alpha (Relaxed wakefulness)").unwrap();
        let beta = text.find("#2 Beta (Active thinking)").unwrap();
        assert!(alpha < beta);
        assert!(text.contains("60.0%"));
    }

    #[test]
    fn ranking_placeholder() {
        assert!(render_ranking(None).contains("No data available"));
        assert!(render_ranking(Some(&EegUpdate::default())).contains("No data available"));
    }

    #[test]
    fn state_panel_shows_label_and_description() {
        let u = update();
        let mut terminal = Terminal::new(TestBackend::new(70, 11)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                draw_state(f, area, Some(&u));
            })
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Relaxed Wakefulness"));
        assert!(text.contains("Alpha 60.0%"));
    }
}
