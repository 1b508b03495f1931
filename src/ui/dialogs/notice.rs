use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use listing_wizard::notice::{Notice, NoticeIcon};

use super::centered_rect;

/// Modal for the notice at the front of the queue
pub struct NoticeDialog;

impl NoticeDialog {
    fn color(icon: NoticeIcon) -> Color {
        match icon {
            NoticeIcon::Success => Color::Green,
            NoticeIcon::Error => Color::Red,
            NoticeIcon::Warning => Color::Yellow,
            NoticeIcon::Info => Color::Cyan,
        }
    }

    /// Keys that acknowledge a notice
    pub fn is_dismiss_key(key: crossterm::event::KeyCode) -> bool {
        use crossterm::event::KeyCode;
        matches!(key, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' '))
    }

    pub fn render(frame: &mut Frame, notice: &Notice) {
        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);

        let color = Self::color(notice.icon);
        let block = Block::default()
            .title(format!(" {} {} ", notice.icon.glyph(), notice.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(2), Constraint::Length(1)])
            .margin(1)
            .split(inner);

        let body = Paragraph::new(notice.body.as_str())
            .style(Style::default().fg(Color::White))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(body, chunks[0]);

        let button = Paragraph::new(Line::from(Span::styled(
            format!(" {} ", notice.confirm_label),
            Style::default()
                .fg(Color::Black)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(button, chunks[1]);
    }
}
