//! Review screen: every step's completion and stored values

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use listing_wizard::drafts::DraftStore;
use listing_wizard::form::FieldValue;
use listing_wizard::progress::WizardState;
use listing_wizard::wizard::WizardDefinition;

#[derive(Debug, Default)]
pub struct ReviewScreen {
    list_state: ListState,
}

impl ReviewScreen {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self { list_state }
    }

    pub fn selected(&self) -> usize {
        self.list_state.selected().unwrap_or(0)
    }

    pub fn select_next(&mut self, len: usize) {
        let next = (self.selected() + 1).min(len.saturating_sub(1));
        self.list_state.select(Some(next));
    }

    pub fn select_prev(&mut self) {
        self.list_state.select(Some(self.selected().saturating_sub(1)));
    }

    fn display(value: &FieldValue) -> String {
        match value {
            FieldValue::Text(text) => {
                let first_line = text.lines().next().unwrap_or_default();
                if first_line.chars().count() > 40 {
                    format!("{}…", first_line.chars().take(40).collect::<String>())
                } else {
                    first_line.to_string()
                }
            }
            FieldValue::List(items) => items.join(", "),
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        definition: &WizardDefinition,
        progress: &WizardState,
        drafts: &DraftStore,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        let items: Vec<ListItem> = definition
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let (mark, color) = if progress.is_complete(&step.key) {
                    ("✔", Color::Green)
                } else {
                    ("✖", Color::Red)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{mark} "), Style::default().fg(color)),
                    Span::raw(format!("{}. {}", i + 1, step.title)),
                ]))
            })
            .collect();

        let report = progress.all_complete();
        let title = if report.complete {
            " Review - ready to submit ".to_string()
        } else {
            format!(" Review - {} step(s) left ", report.incomplete.len())
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[0], &mut self.list_state);

        let mut lines = Vec::new();
        if let Some(step) = definition.steps.get(self.selected()) {
            let draft = drafts.get(&step.key);
            if draft.is_empty() {
                lines.push(Line::from(Span::styled(
                    "Nothing saved for this step yet",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            for (key, value) in &draft {
                lines.push(Line::from(vec![
                    Span::styled(format!("{key}: "), Style::default().fg(Color::Cyan)),
                    Span::raw(Self::display(value)),
                ]));
            }
        }

        let details = Paragraph::new(lines)
            .block(Block::default().title(" Saved values ").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(details, chunks[1]);
    }
}
