use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use intake_core::{Attachment, FieldEdit, FieldName, FormStateStore, SqliteStore};
use intake_pipeline::{
    Config, FormEvent, FormSession, FormView, PreviewCache, Renderer, SubmissionPipeline,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::commands;

pub mod form_view;
pub mod summary_view;

/// Presentation-only state: which field has focus and what is being typed
/// into the photo path.
#[derive(Debug, Default)]
pub struct UiState {
    focus: usize,
    pub meal_cursor: usize,
    pub photo_input: String,
}

impl UiState {
    #[must_use]
    pub fn focus(&self) -> FieldName {
        FieldName::ALL[self.focus]
    }

    fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FieldName::ALL.len();
    }

    fn focus_prev(&mut self) {
        self.focus = (self.focus + FieldName::ALL.len() - 1) % FieldName::ALL.len();
    }
}

/// Draws form views into the terminal.
pub struct TerminalRenderer {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    ui: UiState,
}

impl TerminalRenderer {
    /// Switch the terminal to raw mode on the alternate screen.
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            ui: UiState::default(),
        })
    }

    fn restore(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl std::fmt::Debug for TerminalRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalRenderer")
            .field("ui", &self.ui)
            .finish_non_exhaustive()
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, view: &FormView<'_>) -> io::Result<()> {
        let ui = &self.ui;
        self.terminal.draw(|frame| draw(frame, view, ui))?;
        Ok(())
    }
}

fn draw(frame: &mut Frame, view: &FormView<'_>, ui: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(9),    // Form and summary
            Constraint::Length(3), // Help or warning bar
        ])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);

    render_title(frame, rows[0]);
    form_view::render(frame, view, ui, columns[0]);
    summary_view::render(frame, view, columns[1]);
    render_status(frame, view, rows[2]);
}

fn render_title(frame: &mut Frame, area: Rect) {
    let title = Paragraph::new("Intake Form    * required")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, area);
}

fn render_status(frame: &mut Frame, view: &FormView<'_>, area: Rect) {
    let status = match view.warning {
        Some(warning) => {
            Paragraph::new(format!("  \u{26a0} {warning}")).style(Style::default().fg(Color::Red))
        }
        None => Paragraph::new(
            "  Tab/\u{2193} Next  Shift-Tab/\u{2191} Prev  Ctrl-S Submit  Ctrl-R Clear  Esc Quit",
        )
        .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(status.block(Block::default().borders(Borders::ALL)), area);
}

type TuiSession = FormSession<SqliteStore, PreviewCache, TerminalRenderer>;

/// Application state for the form TUI.
struct App {
    session: TuiSession,
    should_quit: bool,
}

impl App {
    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => self.submit()?,
                KeyCode::Char('r') => self.clear()?,
                KeyCode::Char('c') => self.should_quit = true,
                _ => {}
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => {
                self.session.renderer_mut().ui.focus_next();
                self.session.refresh()?;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.session.renderer_mut().ui.focus_prev();
                self.session.refresh()?;
            }
            code => self.edit_focused(code)?,
        }
        Ok(())
    }

    fn edit_focused(&mut self, code: KeyCode) -> Result<()> {
        let focus = self.session.renderer().ui.focus();
        let state = self.session.form().state();
        let options = self.session.form().options();

        let edit = match (focus, code) {
            (FieldName::FirstName | FieldName::LastName | FieldName::Tel, code) => {
                let Some(field) = focus.as_text() else {
                    return Ok(());
                };
                let mut value = match focus {
                    FieldName::FirstName => state.first_name.clone(),
                    FieldName::LastName => state.last_name.clone(),
                    _ => state.tel.clone(),
                };
                match code {
                    KeyCode::Char(c) => value.push(c),
                    KeyCode::Backspace => {
                        value.pop();
                    }
                    _ => return Ok(()),
                }
                FieldEdit::Text(field, value)
            }
            (FieldName::Gender, KeyCode::Left) => {
                FieldEdit::SingleChoice(options.gender.prev_before(state.gender()).to_string())
            }
            (FieldName::Gender, KeyCode::Right | KeyCode::Char(' ')) => {
                FieldEdit::SingleChoice(options.gender.next_after(state.gender()).to_string())
            }
            (FieldName::Holidays, KeyCode::Left) => FieldEdit::EnumeratedChoice(
                options.holidays.prev_before(state.holidays()).to_string(),
            ),
            (FieldName::Holidays, KeyCode::Right | KeyCode::Char(' ')) => {
                FieldEdit::EnumeratedChoice(
                    options.holidays.next_after(state.holidays()).to_string(),
                )
            }
            (FieldName::CheckedMeals, KeyCode::Char(' ') | KeyCode::Enter) => {
                FieldEdit::ToggleMultiChoice(self.session.renderer().ui.meal_cursor)
            }
            (FieldName::CheckedMeals, KeyCode::Left | KeyCode::Right) => {
                let count = options.meals.len();
                let ui = &mut self.session.renderer_mut().ui;
                ui.meal_cursor = if code == KeyCode::Left {
                    (ui.meal_cursor + count - 1) % count
                } else {
                    (ui.meal_cursor + 1) % count
                };
                self.session.refresh()?;
                return Ok(());
            }
            (FieldName::Photo, KeyCode::Enter) => return self.attach_photo(),
            (FieldName::Photo, KeyCode::Delete) => FieldEdit::Attachment(None),
            (FieldName::Photo, KeyCode::Char(c)) => {
                self.session.renderer_mut().ui.photo_input.push(c);
                self.session.refresh()?;
                return Ok(());
            }
            (FieldName::Photo, KeyCode::Backspace) => {
                self.session.renderer_mut().ui.photo_input.pop();
                self.session.refresh()?;
                return Ok(());
            }
            _ => return Ok(()),
        };

        self.session.handle(FormEvent::Edit(edit))?;
        Ok(())
    }

    fn attach_photo(&mut self) -> Result<()> {
        let input = self.session.renderer().ui.photo_input.trim().to_string();
        if input.is_empty() {
            return Ok(());
        }
        match Attachment::from_path(&input) {
            Ok(attachment) => {
                self.session.renderer_mut().ui.photo_input.clear();
                self.session
                    .handle(FormEvent::Edit(FieldEdit::Attachment(Some(Arc::new(
                        attachment,
                    )))))?;
                Ok(())
            }
            Err(e) => {
                self.session.warn(format!("Cannot attach {input}: {e}"))?;
                Ok(())
            }
        }
    }

    /// Gate the commit on the required text fields.
    fn submit(&mut self) -> Result<()> {
        let missing = self.session.form().state().missing_required();
        if missing.is_empty() {
            self.session.handle(FormEvent::Commit)?;
            return Ok(());
        }
        let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
        self.session
            .warn(format!("Please fill in: {}", names.join(", ")))?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let ui = &mut self.session.renderer_mut().ui;
        ui.photo_input.clear();
        ui.meal_cursor = 0;
        self.session.handle(FormEvent::Clear)?;
        Ok(())
    }
}

/// Run the form TUI.
///
/// Sets up the terminal, runs the main event loop, and restores the terminal
/// on exit (including on error).
pub async fn run_tui(config: &Config) -> Result<()> {
    let store = commands::open_store(config)?;
    let previews = Arc::new(PreviewCache::new(config.preview_dir.clone()));
    let pipeline = SubmissionPipeline::new(store, previews).with_key(config.storage_key.clone());
    let form = FormStateStore::new(config.options.clone());

    let renderer = TerminalRenderer::new()?;
    let mut app = App {
        session: FormSession::new(form, pipeline, renderer),
        should_quit: false,
    };

    // Run the event loop, capturing any error so we can restore the terminal
    let result = run_event_loop(&mut app);

    // Apply or release previews still being derived before leaving
    let settled = app.session.settle().await;

    // Restore terminal regardless of success or failure
    app.session.renderer_mut().restore()?;

    result?;
    settled?;
    Ok(())
}

fn run_event_loop(app: &mut App) -> Result<()> {
    app.session.refresh()?;
    loop {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key)?;
                }
            }
        }

        app.session.poll_previews()?;

        if app.should_quit {
            return Ok(());
        }
    }
}
