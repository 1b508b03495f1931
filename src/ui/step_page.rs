//! One wizard step rendered as a form screen

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use listing_wizard::form::RawForm;
use listing_wizard::orchestrator::ElementLookup;
use listing_wizard::validation::{CharacterCounter, ErrorIndicators, ValidationReport};
use listing_wizard::wizard::StepDefinition;

use super::form_field::FormField;

pub struct StepPage {
    step: StepDefinition,
    /// Widgets, parallel to `step.fields`
    fields: Vec<FormField>,
    focused: usize,
    /// First field drawn; keeps the focused field on screen
    scroll: usize,
    report: Option<ValidationReport>,
    status: Option<String>,
}

impl ElementLookup for StepPage {
    fn has_element(&self, name: &str) -> bool {
        self.step
            .fields
            .iter()
            .position(|f| f.name == name)
            .is_some_and(|i| i < self.fields.len())
    }
}

impl StepPage {
    pub fn new(step: &StepDefinition) -> Self {
        Self {
            fields: step.fields.iter().map(FormField::from_descriptor).collect(),
            step: step.clone(),
            focused: 0,
            scroll: 0,
            report: None,
            status: None,
        }
    }

    pub fn step(&self) -> &StepDefinition {
        &self.step
    }

    /// Prefill from restored values
    pub fn fill(&mut self, form: &RawForm) {
        for (descriptor, widget) in self.step.fields.iter().zip(self.fields.iter_mut()) {
            let values = form.get_all(&descriptor.name);
            if !values.is_empty() {
                widget.set_values(&values);
            }
        }
    }

    /// Entries as a submitted form would carry them
    pub fn collect(&self) -> RawForm {
        let mut form = RawForm::new();
        for (descriptor, widget) in self.step.fields.iter().zip(&self.fields) {
            for value in widget.values() {
                form.append(&descriptor.name, &value);
            }
        }
        form
    }

    fn value_of(&self, name: &str) -> Option<String> {
        let index = self.step.fields.iter().position(|f| f.name == name)?;
        self.fields.get(index).map(FormField::value)
    }

    /// Companion fields only show while their sentinel is selected
    pub fn is_visible(&self, index: usize) -> bool {
        let Some(descriptor) = self.step.fields.get(index) else {
            return false;
        };
        match self.step.sentinel_owner(&descriptor.name) {
            Some(owner) => self
                .value_of(&owner.name)
                .is_some_and(|v| owner.is_sentinel(&v)),
            None => true,
        }
    }

    #[cfg(test)]
    pub fn focused_name(&self) -> Option<&str> {
        self.step.fields.get(self.focused).map(|f| f.name.as_str())
    }

    pub fn next_field(&mut self) {
        if let Some(i) = (self.focused + 1..self.fields.len()).find(|i| self.is_visible(*i)) {
            self.focused = i;
        }
    }

    pub fn prev_field(&mut self) {
        if let Some(i) = (0..self.focused).rev().find(|i| self.is_visible(*i)) {
            self.focused = i;
        }
    }

    pub fn set_report(&mut self, report: Option<ValidationReport>) {
        self.report = report;
    }

    #[cfg(test)]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Route a key to field navigation or the focused widget
    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status = None;
        let focused = self.fields.get(self.focused);
        let captures = focused.is_some_and(FormField::captures_vertical);
        let multiline = matches!(focused, Some(FormField::TextArea { .. }));

        match key.code {
            KeyCode::Tab => self.next_field(),
            KeyCode::BackTab => self.prev_field(),
            KeyCode::Down if !captures => self.next_field(),
            KeyCode::Up if !captures => self.prev_field(),
            KeyCode::Enter if !multiline => self.next_field(),
            _ => {
                if let Some(widget) = self.fields.get_mut(self.focused) {
                    widget.handle_key(key);
                }
            }
        }
    }

    /// Paste into the focused field; refused where the field disallows it
    pub fn handle_paste(&mut self, text: &str) -> bool {
        let allowed = self
            .step
            .fields
            .get(self.focused)
            .is_some_and(|f| f.allows_paste());
        if !allowed {
            self.status = Some("Pasting is disabled for this field".to_string());
            return false;
        }
        if let Some(widget) = self.fields.get_mut(self.focused) {
            widget.paste(text);
        }
        true
    }

    fn counter_line(&self, index: usize) -> Option<Line<'static>> {
        let counter = CharacterCounter::for_field(self.step.fields.get(index)?)?;
        let reading = counter.read_count(self.fields.get(index)?.char_count());
        let style = if reading.within_bounds() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Yellow)
        };
        Some(Line::from(vec![
            Span::styled(reading.min_message(), style),
            Span::raw("   "),
            Span::styled(reading.max_message(), style),
        ]))
    }

    fn error_line(&self, index: usize, indicators: &ErrorIndicators) -> Option<Line<'static>> {
        let name = &self.step.fields.get(index)?.name;
        if !indicators.is_visible(name) {
            return None;
        }
        let message = self
            .report
            .as_ref()
            .and_then(|r| r.failures_for(name).next())
            .map_or_else(|| "Invalid value".to_string(), |f| f.reason.to_string());
        Some(Line::from(Span::styled(
            format!("✖ {message}"),
            Style::default().fg(Color::Red),
        )))
    }

    fn field_height(&self, index: usize, indicators: &ErrorIndicators) -> u16 {
        let mut height = 1 + self.fields[index].render_height();
        if self.counter_line(index).is_some() {
            height += 1;
        }
        if self.error_line(index, indicators).is_some() {
            height += 1;
        }
        height + 1
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        header: &str,
        indicators: &ErrorIndicators,
    ) {
        let block = Block::default()
            .title(format!(" {header} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Description
                Constraint::Min(3),    // Fields
                Constraint::Length(1), // Status
            ])
            .split(inner);

        if let Some(description) = &self.step.description {
            frame.render_widget(
                Paragraph::new(description.as_str())
                    .style(Style::default().fg(Color::Gray))
                    .wrap(Wrap { trim: true }),
                chunks[0],
            );
        }

        self.render_fields(frame, chunks[1], indicators);

        if let Some(status) = &self.status {
            frame.render_widget(
                Paragraph::new(status.as_str()).style(Style::default().fg(Color::Yellow)),
                chunks[2],
            );
        }
    }

    fn render_fields(&mut self, frame: &mut Frame, area: Rect, indicators: &ErrorIndicators) {
        let visible: Vec<usize> = (0..self.fields.len()).filter(|i| self.is_visible(*i)).collect();
        if !visible.contains(&self.focused) {
            if let Some(first) = visible.first() {
                self.focused = *first;
            }
        }

        // Scroll so the focused field fits
        self.scroll = self.scroll.min(self.focused);
        loop {
            let used: u16 = visible
                .iter()
                .filter(|i| **i >= self.scroll && **i <= self.focused)
                .map(|i| self.field_height(*i, indicators))
                .sum();
            if used <= area.height || self.scroll >= self.focused {
                break;
            }
            self.scroll += 1;
        }

        let mut y = area.y;
        for index in visible.into_iter().filter(|i| *i >= self.scroll) {
            let height = self.field_height(index, indicators);
            if y + height > area.y + area.height {
                break;
            }
            let focused = index == self.focused;
            let descriptor = &self.step.fields[index];

            let marker = if descriptor.required { " *" } else { "" };
            let label_style = if focused {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(descriptor.label.clone(), label_style),
                    Span::styled(marker, Style::default().fg(Color::Red)),
                ])),
                Rect::new(area.x, y, area.width, 1),
            );
            y += 1;

            let widget_height = self.fields[index].render_height();
            let counter = self.counter_line(index);
            let error = self.error_line(index, indicators);

            let width = area.width.saturating_sub(2);
            self.fields[index].render(
                frame,
                Rect::new(area.x + 2, y, width, widget_height),
                focused,
            );
            y += widget_height;

            for line in [counter, error].into_iter().flatten() {
                frame.render_widget(Paragraph::new(line), Rect::new(area.x + 2, y, width, 1));
                y += 1;
            }
            y += 1;
        }
    }
}
