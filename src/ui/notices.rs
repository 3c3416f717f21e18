//! Transient notification stack in the top-right corner.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::session::{NoticeLevel, Session};

const NOTICE_WIDTH: u16 = 48;

fn level_color(level: NoticeLevel) -> Color {
    match level {
        NoticeLevel::Success => Color::Green,
        NoticeLevel::Error => Color::Red,
        NoticeLevel::Info => Color::LightBlue,
    }
}

pub(super) fn draw_notices(frame: &mut Frame, area: Rect, session: &Session) {
    let lines: Vec<Line> = session
        .notifications()
        .map(|n| {
            Line::from(Span::styled(
                n.message.as_str(),
                Style::default().fg(level_color(n.level)),
            ))
        })
        .collect();
    if lines.is_empty() {
        return;
    }

    let width = NOTICE_WIDTH.min(area.width);
    // Keep clear of the header row; newest notifications are at the bottom.
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(3));
    if height < 3 {
        return;
    }
    let visible = (height - 2) as usize;
    let skip = lines.len().saturating_sub(visible);
    let rect = Rect {
        x: area.x + area.width - width,
        y: area.y + 3,
        width,
        height,
    };

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>())
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray))),
        rect,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashConfig;
    use crate::ui::tests::buffer_text;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(session: &Session, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, height)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                draw_notices(f, area, session);
            })
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn shows_newest_when_space_is_short() {
        let mut s = Session::new(&DashConfig::default());
        for i in 0..6 {
            s.notify(NoticeLevel::Info, format!("message {i}"));
        }
        let text = render(&s, 8);
        assert!(text.contains("message 5"));
        assert!(text.contains("message 3"));
        assert!(!text.contains("message 2"));
    }

    #[test]
    fn nothing_drawn_without_notifications() {
        let s = Session::new(&DashConfig::default());
        assert!(render(&s, 10).trim().is_empty());
    }
}
