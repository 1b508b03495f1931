use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Span,
    widgets::{Gauge, Paragraph},
    Frame, Terminal,
};
use std::io;

use listing_wizard::config::Config;
use listing_wizard::gate::{Decision, GateCheck, GateOutcome};
use listing_wizard::notice::{NoticeQueue, Notifier};
use listing_wizard::orchestrator::{StepOrchestrator, SubmitOutcome};
use listing_wizard::progress::NavigationCheck;
use listing_wizard::session::{submitter_from_config, WizardSession};
use listing_wizard::submit::Submitter;

use crate::ui::{NoticeDialog, ReviewScreen, SaveDialog, StepPage, TerminalGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Step(usize),
    Review,
}

/// The step page currently on screen and its orchestrator
struct ActiveStep {
    page: StepPage,
    orchestrator: StepOrchestrator,
}

pub struct App {
    config: Config,
    session: WizardSession,
    submitter: Box<dyn Submitter>,
    screen: Screen,
    active: Option<ActiveStep>,
    review: ReviewScreen,
    notices: NoticeQueue,
    save_dialog: SaveDialog,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let session = WizardSession::open(&config)?;
        let submitter = submitter_from_config(&config)?;
        Self::with_session(config, session, submitter)
    }

    pub fn with_session(
        config: Config,
        session: WizardSession,
        submitter: Box<dyn Submitter>,
    ) -> Result<Self> {
        let mut app = Self {
            config,
            session,
            submitter,
            screen: Screen::Step(0),
            active: None,
            review: ReviewScreen::new(),
            notices: NoticeQueue::new(),
            save_dialog: SaveDialog::new(),
            should_quit: false,
        };

        // Resume at the first step that still needs work
        let start = app
            .session
            .progress
            .first_incomplete()
            .and_then(|key| app.session.definition.index_of(key));
        match start {
            Some(index) => app.open_step(index)?,
            None => app.screen = Screen::Review,
        }
        Ok(app)
    }

    pub async fn run(&mut self) -> Result<()> {
        let _guard = TerminalGuard::new()?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = self.config.tick_rate();

        while !self.should_quit {
            terminal.draw(|f| self.render(f))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key).await?;
                    }
                    Event::Paste(text) => self.handle_paste(&text),
                    _ => {}
                }
            }
        }

        terminal.show_cursor()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[cfg(test)]
    pub fn notices(&self) -> &NoticeQueue {
        &self.notices
    }

    #[cfg(test)]
    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    /// Open a step, honoring the forward-navigation guard
    fn open_step(&mut self, index: usize) -> Result<()> {
        let Some(step) = self.session.definition.steps.get(index) else {
            return Ok(());
        };

        let target = match self.session.progress.check_navigation(&step.key)? {
            NavigationCheck::Allowed => index,
            NavigationCheck::Redirect { to, notice } => {
                self.notices.notify(notice);
                self.session.definition.index_of(&to).unwrap_or(0)
            }
        };

        let step = &self.session.definition.steps[target];
        let mut page = StepPage::new(step);
        let orchestrator = self
            .session
            .orchestrator(&step.key, &page)
            .with_context(|| format!("Failed to set up step '{}'", step.key))?;
        page.fill(&orchestrator.restore());

        tracing::debug!(step = %step.key, "Opened step");
        self.active = Some(ActiveStep { page, orchestrator });
        self.screen = Screen::Step(target);
        Ok(())
    }

    fn open_review(&mut self) {
        self.active = None;
        self.screen = Screen::Review;
    }

    fn submit_step(&mut self) -> Result<()> {
        let Screen::Step(index) = self.screen else {
            return Ok(());
        };
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };

        let form = active.page.collect();
        let outcome = active.orchestrator.submit(
            &form,
            &mut self.session.progress,
            &mut self.notices,
        );

        match outcome {
            SubmitOutcome::Invalid(report) => active.page.set_report(Some(report)),
            SubmitOutcome::NotSaved { .. } => active.page.set_report(None),
            SubmitOutcome::Advanced { .. } => {
                if index + 1 < self.session.definition.len() {
                    self.open_step(index + 1)?;
                } else {
                    self.open_review();
                }
            }
        }
        Ok(())
    }

    /// Final submit from the review screen: check, then ask
    fn request_submit(&mut self) {
        let gate = self.session.gate();
        if gate.check(&self.session.progress, &mut self.notices) == GateCheck::Ready {
            self.save_dialog.show();
        }
    }

    async fn resolve(&mut self, decision: Decision) -> Result<()> {
        self.save_dialog.submitting = decision == Decision::Save;
        let gate = self.session.gate();
        let outcome = gate
            .resolve(
                decision,
                &mut self.session.progress,
                &self.session.drafts,
                self.submitter.as_ref(),
                &mut self.notices,
            )
            .await;
        self.save_dialog.hide();

        if let GateOutcome::Submitted(receipt) = outcome {
            tracing::info!(id = %receipt.id, "Listing accepted, starting a fresh one");
            self.open_step(0)?;
        }
        Ok(())
    }

    fn handle_paste(&mut self, text: &str) {
        if !self.notices.is_empty() || self.save_dialog.visible {
            return;
        }
        if let Some(active) = self.active.as_mut() {
            active.page.handle_paste(text);
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c' | 'q')) {
            self.should_quit = true;
            return Ok(());
        }

        // Modal notices swallow everything until acknowledged
        if !self.notices.is_empty() {
            if NoticeDialog::is_dismiss_key(key.code) {
                self.notices.dismiss();
            }
            return Ok(());
        }

        if self.save_dialog.visible {
            if let Some(decision) = self.save_dialog.handle_key(key.code) {
                self.resolve(decision).await?;
            }
            return Ok(());
        }

        match self.screen {
            Screen::Step(index) => match key.code {
                KeyCode::F(2) => self.submit_step()?,
                KeyCode::Char('s') if ctrl => self.submit_step()?,
                KeyCode::PageUp => self.open_step(index.saturating_sub(1))?,
                KeyCode::PageDown => {
                    if index + 1 < self.session.definition.len() {
                        self.open_step(index + 1)?;
                    }
                }
                KeyCode::F(5) => self.open_review(),
                _ => {
                    if let Some(active) = self.active.as_mut() {
                        active.page.handle_key(key);
                    }
                }
            },
            Screen::Review => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.review.select_prev(),
                KeyCode::Down | KeyCode::Char('j') => {
                    self.review.select_next(self.session.definition.len());
                }
                KeyCode::Enter => self.open_step(self.review.selected())?,
                KeyCode::Char('s') | KeyCode::F(2) => self.request_submit(),
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Progress
                Constraint::Min(5),    // Screen
                Constraint::Length(1), // Key hints
            ])
            .split(frame.area());

        self.render_progress(frame, chunks[0]);

        match self.screen {
            Screen::Step(index) => {
                let total = self.session.definition.len();
                if let Some(active) = self.active.as_mut() {
                    let header = format!(
                        "Step {} of {}: {}",
                        index + 1,
                        total,
                        active.page.step().title
                    );
                    active
                        .page
                        .render(frame, chunks[1], &header, active.orchestrator.indicators());
                }
            }
            Screen::Review => self.review.render(
                frame,
                chunks[1],
                &self.session.definition,
                &self.session.progress,
                &self.session.drafts,
            ),
        }

        let hints = match self.screen {
            Screen::Step(_) => {
                "Tab next field  F2 save step  PgUp/PgDn prev/next step  F5 review  Ctrl+Q quit"
            }
            Screen::Review => "↑/↓ select  Enter edit step  s submit listing  q quit",
        };
        frame.render_widget(
            Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
            chunks[2],
        );

        self.save_dialog.render(frame);
        if let Some(notice) = self.notices.current() {
            NoticeDialog::render(frame, notice);
        }
    }

    fn render_progress(&self, frame: &mut Frame, area: Rect) {
        let total = self.session.definition.len().max(1);
        let done = self.session.progress.completed_count();
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(done as f64 / total as f64)
            .label(Span::raw(format!(
                "{} - {done}/{total} steps complete",
                self.session.definition.name
            )));
        frame.render_widget(gauge, area);
    }
}
