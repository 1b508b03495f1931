//! Input widgets for step forms, one per field kind

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

use listing_wizard::wizard::{FieldDescriptor, FieldKind, FieldOption, InputFormat};

/// A form field widget that can handle different input kinds
pub enum FormField {
    /// Single-line text (also used for numbers)
    TextInput {
        value: String,
        /// Cursor position in characters
        cursor_pos: usize,
        placeholder: String,
        numeric: bool,
        format: Option<InputFormat>,
    },
    /// Multi-line text input using tui-textarea
    TextArea {
        textarea: Box<TextArea<'static>>,
        placeholder: String,
    },
    /// One option out of a list; index 0 is always the empty selection
    Select {
        options: Vec<FieldOption>,
        selected: usize,
    },
    /// Several options, any number checked
    CheckboxGroup {
        options: Vec<FieldOption>,
        checked: Vec<bool>,
        cursor: usize,
    },
}

fn byte_index(value: &str, char_pos: usize) -> usize {
    value
        .char_indices()
        .nth(char_pos)
        .map_or(value.len(), |(i, _)| i)
}

impl FormField {
    pub fn from_descriptor(field: &FieldDescriptor) -> Self {
        let placeholder = field.placeholder.clone().unwrap_or_default();
        match field.kind {
            FieldKind::Text | FieldKind::Number => FormField::TextInput {
                value: String::new(),
                cursor_pos: 0,
                placeholder,
                numeric: field.kind == FieldKind::Number,
                format: field.format,
            },
            FieldKind::Textarea => FormField::TextArea {
                textarea: Box::new(TextArea::default()),
                placeholder,
            },
            FieldKind::Select => {
                let mut options = field.options.clone();
                if !options.iter().any(|o| o.value.is_empty()) {
                    options.insert(
                        0,
                        FieldOption {
                            value: String::new(),
                            label: "Choose...".to_string(),
                        },
                    );
                }
                let selected = options.iter().position(|o| o.value.is_empty()).unwrap_or(0);
                FormField::Select { options, selected }
            }
            FieldKind::CheckboxGroup => FormField::CheckboxGroup {
                checked: vec![false; field.options.len()],
                options: field.options.clone(),
                cursor: 0,
            },
        }
    }

    /// Current value; for checkbox groups, the first checked value
    pub fn value(&self) -> String {
        self.values().into_iter().next().unwrap_or_default()
    }

    /// Every value this field submits
    pub fn values(&self) -> Vec<String> {
        match self {
            FormField::TextInput { value, .. } => vec![value.clone()],
            FormField::TextArea { textarea, .. } => vec![textarea.lines().join("\n")],
            FormField::Select { options, selected } => {
                vec![options.get(*selected).map(|o| o.value.clone()).unwrap_or_default()]
            }
            FormField::CheckboxGroup {
                options, checked, ..
            } => options
                .iter()
                .zip(checked)
                .filter(|(_, c)| **c)
                .map(|(o, _)| o.value.clone())
                .collect(),
        }
    }

    /// Replace the field's content with restored values
    pub fn set_values(&mut self, new_values: &[&str]) {
        let first = new_values.first().copied().unwrap_or_default();
        match self {
            FormField::TextInput {
                value, cursor_pos, ..
            } => {
                *value = first.to_string();
                *cursor_pos = value.chars().count();
            }
            FormField::TextArea { textarea, .. } => {
                textarea.select_all();
                textarea.cut();
                textarea.insert_str(first);
            }
            FormField::Select { options, selected } => {
                if let Some(idx) = options.iter().position(|o| o.value == first) {
                    *selected = idx;
                }
            }
            FormField::CheckboxGroup {
                options, checked, ..
            } => {
                for (option, is_checked) in options.iter().zip(checked.iter_mut()) {
                    *is_checked = new_values.contains(&option.value.as_str());
                }
            }
        }
    }

    /// Character count of the current text
    pub fn char_count(&self) -> usize {
        match self {
            FormField::TextInput { value, .. } => value.chars().count(),
            FormField::TextArea { textarea, .. } => textarea.lines().join("\n").chars().count(),
            _ => 0,
        }
    }

    /// Insert pasted text. The caller has already checked paste is allowed.
    pub fn paste(&mut self, text: &str) {
        match self {
            FormField::TextInput { .. } => {
                for c in text.chars().filter(|c| !c.is_control()) {
                    self.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
                }
            }
            FormField::TextArea { textarea, .. } => {
                textarea.insert_str(text);
            }
            _ => {}
        }
    }

    /// Handle a key event, returns true if the key was consumed
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self {
            FormField::TextInput {
                value,
                cursor_pos,
                numeric,
                format,
                ..
            } => {
                let consumed = match key.code {
                    KeyCode::Char(c) => {
                        if !*numeric || c.is_ascii_digit() || c == '.' || c == '-' {
                            value.insert(byte_index(value, *cursor_pos), c);
                            *cursor_pos += 1;
                        }
                        true
                    }
                    KeyCode::Backspace => {
                        if *cursor_pos > 0 {
                            *cursor_pos -= 1;
                            value.remove(byte_index(value, *cursor_pos));
                        }
                        true
                    }
                    KeyCode::Delete => {
                        if *cursor_pos < value.chars().count() {
                            value.remove(byte_index(value, *cursor_pos));
                        }
                        true
                    }
                    KeyCode::Left => {
                        *cursor_pos = cursor_pos.saturating_sub(1);
                        true
                    }
                    KeyCode::Right => {
                        if *cursor_pos < value.chars().count() {
                            *cursor_pos += 1;
                        }
                        true
                    }
                    KeyCode::Home => {
                        *cursor_pos = 0;
                        true
                    }
                    KeyCode::End => {
                        *cursor_pos = value.chars().count();
                        true
                    }
                    _ => false,
                };
                let edited = matches!(
                    key.code,
                    KeyCode::Char(_) | KeyCode::Backspace | KeyCode::Delete
                );
                if let Some(format) = format.filter(|_| edited) {
                    // Keep the cursor behind the same digit it followed
                    let digits_before = value
                        .chars()
                        .take(*cursor_pos)
                        .filter(char::is_ascii_digit)
                        .count();
                    *value = format.apply(value);
                    *cursor_pos = cursor_after_digits(value, digits_before);
                }
                consumed
            }
            FormField::TextArea { textarea, .. } => {
                // TextArea handles its own key events
                textarea.input(key);
                true
            }
            FormField::Select { options, selected } => match key.code {
                KeyCode::Up | KeyCode::Left => {
                    *selected = selected.saturating_sub(1);
                    true
                }
                KeyCode::Down | KeyCode::Right => {
                    if *selected < options.len().saturating_sub(1) {
                        *selected += 1;
                    }
                    true
                }
                _ => false,
            },
            FormField::CheckboxGroup {
                options,
                checked,
                cursor,
            } => match key.code {
                KeyCode::Left | KeyCode::Up => {
                    *cursor = cursor.saturating_sub(1);
                    true
                }
                KeyCode::Right | KeyCode::Down => {
                    if *cursor < options.len().saturating_sub(1) {
                        *cursor += 1;
                    }
                    true
                }
                KeyCode::Char(' ') => {
                    if let Some(c) = checked.get_mut(*cursor) {
                        *c = !*c;
                    }
                    true
                }
                _ => false,
            },
        }
    }

    /// Whether up/down belong to the widget rather than field navigation
    pub fn captures_vertical(&self) -> bool {
        matches!(self, FormField::TextArea { .. } | FormField::Select { .. })
    }

    /// Get the height needed to render this field
    pub fn render_height(&self) -> u16 {
        match self {
            FormField::TextArea { .. } => 5,
            _ => 1,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
        let text_style = Style::default().fg(if focused { Color::White } else { Color::Gray });

        match self {
            FormField::TextInput {
                value,
                cursor_pos,
                placeholder,
                ..
            } => {
                let content = if value.is_empty() && !focused {
                    Line::from(Span::styled(
                        placeholder.as_str(),
                        Style::default().fg(Color::DarkGray),
                    ))
                } else {
                    let mut text = value.clone();
                    if focused {
                        text.insert(byte_index(&text, *cursor_pos), '|');
                    }
                    Line::from(text)
                };
                frame.render_widget(Paragraph::new(content).style(text_style), area);
            }
            FormField::TextArea {
                textarea,
                placeholder,
            } => {
                textarea.set_cursor_line_style(Style::default());
                textarea.set_cursor_style(if focused {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                });
                textarea.set_block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(if focused {
                            Color::Cyan
                        } else {
                            Color::Gray
                        })),
                );
                textarea.set_placeholder_text(placeholder.clone());
                textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));

                frame.render_widget(&**textarea, area);
            }
            FormField::Select { options, selected } => {
                let label = options.get(*selected).map_or("", |o| o.label.as_str());
                let arrows = if focused { "◀ " } else { "  " };
                let line = Line::from(vec![
                    Span::styled(arrows, Style::default().fg(Color::Cyan)),
                    Span::styled(label, text_style.add_modifier(Modifier::BOLD)),
                    Span::styled(
                        if focused { " ▶" } else { "" },
                        Style::default().fg(Color::Cyan),
                    ),
                ]);
                frame.render_widget(Paragraph::new(line), area);
            }
            FormField::CheckboxGroup {
                options,
                checked,
                cursor,
            } => {
                let mut spans = Vec::new();
                for (i, (option, is_checked)) in options.iter().zip(checked.iter()).enumerate() {
                    let mark = if *is_checked { "[x] " } else { "[ ] " };
                    let style = if focused && i == *cursor {
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::REVERSED)
                    } else if *is_checked {
                        Style::default().fg(Color::Green)
                    } else {
                        text_style
                    };
                    spans.push(Span::styled(format!("{mark}{}", option.label), style));
                    spans.push(Span::raw("  "));
                }
                frame.render_widget(Paragraph::new(Line::from(spans)), area);
            }
        }
    }
}

/// Character position just past the `digits`-th digit of `value`
fn cursor_after_digits(value: &str, digits: usize) -> usize {
    if digits == 0 {
        return 0;
    }
    value
        .chars()
        .enumerate()
        .filter(|(_, c)| c.is_ascii_digit())
        .nth(digits - 1)
        .map_or_else(|| value.chars().count(), |(i, _)| i + 1)
}
