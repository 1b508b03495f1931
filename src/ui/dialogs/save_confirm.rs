use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use listing_wizard::gate::Decision;

use super::centered_rect;

/// Button focus in the save dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveSelection {
    Save = 0,
    Discard = 1,
    Cancel = 2,
}

impl SaveSelection {
    fn next(self) -> Self {
        match self {
            Self::Save => Self::Discard,
            Self::Discard => Self::Cancel,
            Self::Cancel => Self::Save,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Save => Self::Cancel,
            Self::Discard => Self::Save,
            Self::Cancel => Self::Discard,
        }
    }

    fn decision(self) -> Decision {
        match self {
            Self::Save => Decision::Save,
            Self::Discard => Decision::Discard,
            Self::Cancel => Decision::Cancel,
        }
    }
}

/// "Do you want to save the changes?" prompt shown by the review gate
pub struct SaveDialog {
    pub visible: bool,
    pub selection: SaveSelection,
    /// Set while the submission is in flight
    pub submitting: bool,
}

impl Default for SaveDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveDialog {
    pub fn new() -> Self {
        Self {
            visible: false,
            selection: SaveSelection::Save,
            submitting: false,
        }
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.selection = SaveSelection::Save;
        self.submitting = false;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.submitting = false;
    }

    /// Handle key input, returns the decision once the user makes one
    pub fn handle_key(&mut self, key: KeyCode) -> Option<Decision> {
        if self.submitting {
            return None;
        }

        match key {
            KeyCode::Left | KeyCode::BackTab => {
                self.selection = self.selection.prev();
                None
            }
            KeyCode::Right | KeyCode::Tab => {
                self.selection = self.selection.next();
                None
            }
            KeyCode::Enter => Some(self.selection.decision()),
            KeyCode::Char('s' | 'S' | 'y' | 'Y') => Some(Decision::Save),
            KeyCode::Char('d' | 'D' | 'n' | 'N') => Some(Decision::Discard),
            KeyCode::Esc => Some(Decision::Cancel),
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        if !self.visible {
            return;
        }

        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" ? Submit listing ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(2), Constraint::Length(1)])
            .margin(1)
            .split(inner);

        let prompt = if self.submitting {
            "Submitting listing..."
        } else {
            "Do you want to save the changes?"
        };
        frame.render_widget(
            Paragraph::new(prompt)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            chunks[0],
        );

        let button = |label: &'static str, which: SaveSelection, color: Color| {
            let style = if self.selection == which {
                Style::default()
                    .fg(Color::Black)
                    .bg(color)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            };
            Span::styled(label, style)
        };

        let footer = Line::from(vec![
            button(" [S]ave ", SaveSelection::Save, Color::Green),
            Span::raw("   "),
            button(" [D]on't save ", SaveSelection::Discard, Color::Red),
            Span::raw("   "),
            button(" Cancel ", SaveSelection::Cancel, Color::Gray),
        ]);
        frame.render_widget(
            Paragraph::new(footer).alignment(Alignment::Center),
            chunks[1],
        );
    }
}
