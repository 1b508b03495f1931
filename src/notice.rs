//! User-facing notices (modal alerts) and the sink they are delivered to

use std::collections::VecDeque;

/// Icon shown with a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeIcon {
    Success,
    Error,
    Warning,
    Info,
}

impl NoticeIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            NoticeIcon::Success => "✔",
            NoticeIcon::Error => "✖",
            NoticeIcon::Warning => "⚠",
            NoticeIcon::Info => "ℹ",
        }
    }
}

/// A blocking notice: the user has to acknowledge it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub icon: NoticeIcon,
    pub confirm_label: String,
}

impl Notice {
    pub fn new(title: &str, body: &str, icon: NoticeIcon) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            icon,
            confirm_label: "Ok".to_string(),
        }
    }

    /// "Missing value" warning used for checkbox-group minimums
    pub fn missing_value(body: &str) -> Self {
        Self::new("Missing value", body, NoticeIcon::Warning)
    }
}

/// Anything that can surface a notice to the user
pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// FIFO of pending notices; the TUI shows the front one as a modal
#[derive(Debug, Default)]
pub struct NoticeQueue {
    pending: VecDeque<Notice>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Notice> {
        self.pending.front()
    }

    /// Acknowledge the front notice
    pub fn dismiss(&mut self) -> Option<Notice> {
        self.pending.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.pending.iter()
    }
}

impl Notifier for NoticeQueue {
    fn notify(&mut self, notice: Notice) {
        tracing::debug!(title = %notice.title, body = %notice.body, "Notice raised");
        self.pending.push_back(notice);
    }
}

/// Prints notices to stderr; used by headless CLI commands
#[derive(Debug, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&mut self, notice: Notice) {
        eprintln!("{} {}: {}", notice.icon.glyph(), notice.title, notice.body);
    }
}
