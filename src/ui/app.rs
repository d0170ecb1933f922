use std::mem;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{info, warn};

use crate::auth::AdminGate;
use crate::db::RecordStore;
use crate::error::KioskError;
use crate::query::search;

use super::forms::{
    label_width, CentreForm, ConfirmDelete, DeleteForm, EditField, EditForm, SearchPrompt,
    TextPrompt,
};
use super::helpers::{centered_rect, field_text, map_url, surface_error};
use super::screens::{
    admin_menu, main_menu, user_menu, AdminItem, MainItem, Menu, MenuItem, ResultsScreen,
    UserItem,
};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// Which menu or list fills the content area.
enum Screen {
    Main(Menu<MainItem>),
    User(Menu<UserItem>),
    Results(ResultsScreen),
    Admin(Menu<AdminItem>),
}

/// Modal input layered over the current screen.
enum Mode {
    Normal,
    Searching(SearchPrompt),
    LoggingIn(TextPrompt),
    AddingCentre(CentreForm),
    EditingCentre(EditForm),
    DeletingCentre(DeleteForm),
    ConfirmDelete(ConfirmDelete),
}

/// Outcome of a key press on a menu screen.
enum MenuAction<T> {
    Chosen(T),
    Back,
    Invalid,
    Handled,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central kiosk state: the store handle, the admin gate and whatever the
/// operator is looking at.
pub struct App {
    store: RecordStore,
    gate: AdminGate,
    inactivity_timeout: Duration,
    last_input: Instant,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(store: RecordStore, gate: AdminGate, inactivity_timeout: Duration) -> Self {
        Self {
            store,
            gate,
            inactivity_timeout,
            last_input: Instant::now(),
            screen: Screen::Main(main_menu()),
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Process one key press. Returns `true` when the kiosk should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        self.last_input = Instant::now();
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Searching(prompt) => self.handle_search(code, prompt)?,
            Mode::LoggingIn(prompt) => self.handle_login(code, prompt)?,
            Mode::AddingCentre(form) => self.handle_add_centre(code, form)?,
            Mode::EditingCentre(form) => self.handle_edit_centre(code, form)?,
            Mode::DeletingCentre(form) => self.handle_delete_centre(code, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
        };

        Ok(exit)
    }

    /// Drop an idle user session back to the main menu. Called between input
    /// events, so it never interrupts an in-progress read. Admin mode is not
    /// subject to the timeout.
    pub fn check_inactivity(&mut self, now: Instant) -> bool {
        if !matches!(self.screen, Screen::User(_) | Screen::Results(_)) {
            return false;
        }
        if now.saturating_duration_since(self.last_input) <= self.inactivity_timeout {
            return false;
        }

        info!(
            timeout_secs = self.inactivity_timeout.as_secs(),
            "user session timed out"
        );
        self.screen = Screen::Main(main_menu());
        self.mode = Mode::Normal;
        self.set_status(
            "Session timed out due to inactivity. Returning to the main menu.",
            StatusKind::Error,
        );
        true
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match &mut self.screen {
            Screen::Main(menu) => match menu_action(menu, code) {
                MenuAction::Chosen(MainItem::User) => {
                    self.clear_status();
                    self.screen = Screen::User(user_menu());
                    Ok(Mode::Normal)
                }
                MenuAction::Chosen(MainItem::Admin) => Ok(self.begin_login()),
                // Only 3 or q leaves the kiosk.
                MenuAction::Back if code == KeyCode::Esc => Ok(Mode::Normal),
                MenuAction::Chosen(MainItem::Exit) | MenuAction::Back => {
                    self.set_status("Goodbye!", StatusKind::Info);
                    *exit = true;
                    Ok(Mode::Normal)
                }
                MenuAction::Invalid => Ok(self.invalid_choice()),
                MenuAction::Handled => Ok(Mode::Normal),
            },
            Screen::User(menu) => match menu_action(menu, code) {
                MenuAction::Chosen(UserItem::Search(kind)) => {
                    self.clear_status();
                    Ok(Mode::Searching(SearchPrompt::new(kind)))
                }
                MenuAction::Chosen(UserItem::Back) | MenuAction::Back => {
                    self.clear_status();
                    self.screen = Screen::Main(main_menu());
                    Ok(Mode::Normal)
                }
                MenuAction::Invalid => Ok(self.invalid_choice()),
                MenuAction::Handled => Ok(Mode::Normal),
            },
            Screen::Admin(menu) => match menu_action(menu, code) {
                MenuAction::Chosen(AdminItem::Add) => {
                    self.clear_status();
                    Ok(Mode::AddingCentre(CentreForm::default()))
                }
                MenuAction::Chosen(AdminItem::Edit) => {
                    self.clear_status();
                    Ok(Mode::EditingCentre(EditForm::default()))
                }
                MenuAction::Chosen(AdminItem::Delete) => {
                    self.clear_status();
                    Ok(Mode::DeletingCentre(DeleteForm::default()))
                }
                MenuAction::Chosen(AdminItem::Exit) | MenuAction::Back => {
                    self.leave_admin();
                    Ok(Mode::Normal)
                }
                MenuAction::Invalid => Ok(self.invalid_choice()),
                MenuAction::Handled => Ok(Mode::Normal),
            },
            Screen::Results(results) => {
                match code {
                    KeyCode::Up => results.move_selection(-1),
                    KeyCode::Down => results.move_selection(1),
                    KeyCode::Char('m') | KeyCode::Char('M') => self.open_selected_map(),
                    KeyCode::Char('/') | KeyCode::Enter => {
                        let kind = results.kind;
                        return Ok(Mode::Searching(SearchPrompt::new(kind)));
                    }
                    KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => {
                        self.clear_status();
                        self.screen = Screen::User(user_menu());
                    }
                    _ => {}
                }
                Ok(Mode::Normal)
            }
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut prompt: SearchPrompt) -> Result<Mode> {
        match code {
            KeyCode::Esc => Ok(Mode::Normal),
            KeyCode::Enter => {
                let term = prompt.input.value.trim().to_string();
                match search(&self.store, prompt.kind, &term) {
                    Ok(results) => {
                        if results.is_empty() {
                            self.set_status("No results found.", StatusKind::Error);
                        } else {
                            self.set_status(
                                format!("{} result(s) found.", results.len()),
                                StatusKind::Info,
                            );
                        }
                        self.screen = Screen::Results(ResultsScreen::new(prompt.kind, term, results));
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        warn!(error = %err, "search failed");
                        let message = err.to_string();
                        prompt.input.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::Searching(prompt))
                    }
                }
            }
            KeyCode::Backspace => {
                prompt.input.backspace();
                Ok(Mode::Searching(prompt))
            }
            KeyCode::Char(ch) => {
                prompt.input.push_char(ch);
                Ok(Mode::Searching(prompt))
            }
            _ => Ok(Mode::Searching(prompt)),
        }
    }

    /// Enter the password prompt, unless no credential was configured.
    fn begin_login(&mut self) -> Mode {
        if !self.gate.is_configured() {
            self.set_status(
                "Admin mode is disabled: no admin credential configured.",
                StatusKind::Error,
            );
            return Mode::Normal;
        }
        self.clear_status();
        Mode::LoggingIn(TextPrompt::masked())
    }

    /// Wrong passwords keep the prompt open with no attempt limit.
    fn handle_login(&mut self, code: KeyCode, mut prompt: TextPrompt) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Login cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter => match self.gate.unlock(&prompt.value) {
                Ok(()) => {
                    self.screen = Screen::Admin(admin_menu());
                    self.set_status("Access granted.", StatusKind::Info);
                    Ok(Mode::Normal)
                }
                Err(err) => {
                    let message = err.to_string();
                    prompt.clear();
                    prompt.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                    Ok(Mode::LoggingIn(prompt))
                }
            },
            KeyCode::Backspace => {
                prompt.backspace();
                Ok(Mode::LoggingIn(prompt))
            }
            KeyCode::Char(ch) => {
                prompt.push_char(ch);
                Ok(Mode::LoggingIn(prompt))
            }
            _ => Ok(Mode::LoggingIn(prompt)),
        }
    }

    /// Leaving the admin menu relocks the gate.
    fn leave_admin(&mut self) {
        self.gate.lock();
        self.screen = Screen::Main(main_menu());
        self.set_status("Exiting to main menu.", StatusKind::Info);
    }

    fn handle_add_centre(&mut self, code: KeyCode, mut form: CentreForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Add cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => form.move_focus(-1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_centre(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::AddingCentre(form))
    }

    fn handle_edit_centre(&mut self, code: KeyCode, mut form: EditForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => form.move_focus(false),
            KeyCode::Left => form.cycle_column(-1),
            KeyCode::Right => form.cycle_column(1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_edit(&form) {
                Ok(()) => return Ok(Mode::Normal),
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::EditingCentre(form))
    }

    fn handle_delete_centre(&mut self, code: KeyCode, mut form: DeleteForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter => {
                let id = form.id.value.trim().to_string();
                if id.is_empty() {
                    form.id.error = Some("ID is required.".to_string());
                    return Ok(Mode::DeletingCentre(form));
                }
                match self.store.fetch(&id) {
                    Ok(Some(centre)) => Ok(Mode::ConfirmDelete(ConfirmDelete { centre })),
                    Ok(None) => {
                        let message = format!("Health centre {id} not found.");
                        form.id.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::DeletingCentre(form))
                    }
                    Err(err) => {
                        let message = err.to_string();
                        form.id.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::DeletingCentre(form))
                    }
                }
            }
            KeyCode::Backspace => {
                form.id.backspace();
                Ok(Mode::DeletingCentre(form))
            }
            KeyCode::Char(ch) => {
                form.id.push_char(ch);
                Ok(Mode::DeletingCentre(form))
            }
            _ => Ok(Mode::DeletingCentre(form)),
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Ok(Mode::ConfirmDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn save_new_centre(&mut self, form: &CentreForm) -> Result<()> {
        self.require_unlocked()?;
        let centre = form.parse_inputs()?;
        self.store.insert(&centre)?;
        self.set_status("Health centre added successfully.", StatusKind::Info);
        Ok(())
    }

    fn save_edit(&mut self, form: &EditForm) -> Result<()> {
        self.require_unlocked()?;
        let (id, column, value) = form.parse_inputs()?;
        self.store.update_column(&id, column, &value)?;
        self.set_status("Health centre updated successfully.", StatusKind::Info);
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmDelete) -> Result<()> {
        self.require_unlocked()?;
        self.store.delete(&confirm.centre.id)?;
        self.set_status("Health centre deleted successfully.", StatusKind::Info);
        Ok(())
    }

    fn require_unlocked(&self) -> Result<(), KioskError> {
        if self.gate.is_unlocked() {
            Ok(())
        } else {
            Err(KioskError::Auth("Admin login required.".to_string()))
        }
    }

    fn open_selected_map(&mut self) {
        let Screen::Results(results) = &self.screen else {
            return;
        };
        let Some(centre) = results.current() else {
            return;
        };

        match map_url(centre) {
            Some(url) => {
                let name = centre.name.clone();
                match open_link(&url) {
                    Ok(()) => self.set_status(format!("Opened map for {name}."), StatusKind::Info),
                    Err(err) => {
                        warn!(error = %err, "failed to open map link");
                        self.set_status(format!("Could not open map: {err}"), StatusKind::Error);
                    }
                }
            }
            None => self.set_status("No coordinates recorded for this centre.", StatusKind::Error),
        }
    }

    fn invalid_choice(&mut self) -> Mode {
        self.set_status("Invalid choice. Please try again.", StatusKind::Error);
        Mode::Normal
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Main(menu) => draw_menu(frame, content_area, menu),
            Screen::User(menu) => draw_menu(frame, content_area, menu),
            Screen::Admin(menu) => draw_menu(frame, content_area, menu),
            Screen::Results(results) => self.draw_results(frame, content_area, results),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Searching(prompt) => self.draw_prompt(
                frame,
                area,
                prompt.kind.menu_label(),
                prompt.kind.prompt(),
                &prompt.input,
            ),
            Mode::LoggingIn(prompt) => {
                self.draw_prompt(frame, area, "Admin Login", "Enter admin password:", prompt)
            }
            Mode::AddingCentre(form) => self.draw_centre_form(frame, area, form),
            Mode::EditingCentre(form) => self.draw_edit_form(frame, area, form),
            Mode::DeletingCentre(form) => self.draw_prompt(
                frame,
                area,
                "Delete Health Centre",
                "Enter ID of the health centre to delete:",
                &form.id,
            ),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect, results: &ResultsScreen) {
        let title = format!(
            "{} \"{}\" ({} found)",
            results.kind.menu_label(),
            results.term,
            results.results.len()
        );
        let block = Block::default().title(title).borders(Borders::ALL);

        if results.results.is_empty() {
            let paragraph = Paragraph::new("No results found.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let columns = results.kind.display_columns();
        let width = columns
            .iter()
            .map(|column| column.label().len())
            .max()
            .unwrap_or_default();
        let items: Vec<ListItem> = results
            .results
            .iter()
            .map(|centre| {
                let mut lines: Vec<Line> = columns
                    .iter()
                    .map(|&column| {
                        Line::from(vec![
                            Span::styled(
                                format!("{:<width$} : ", column.label()),
                                Style::default().fg(Color::Gray),
                            ),
                            Span::raw(field_text(centre, column)),
                        ])
                    })
                    .collect();
                lines.push(Line::from(Span::styled(
                    "-------------------------------",
                    Style::default().fg(Color::DarkGray),
                )));
                ListItem::new(lines)
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(results.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hint = |key: &'static str, label: &'static str| {
            [
                Span::styled(key, key_style),
                Span::raw(format!(" {label}   ")),
            ]
        };

        let spans: Vec<Span<'static>> = match (&self.mode, &self.screen) {
            (Mode::Normal, Screen::Results(_)) => [
                hint("[↑↓]", "Move"),
                hint("[m]", "Open map"),
                hint("[/]", "Search again"),
                hint("[Esc]", "Back"),
            ]
            .concat(),
            (Mode::Normal, Screen::Main(_)) => [
                hint("[↑↓]", "Move"),
                hint("[Enter/1-9]", "Select"),
                hint("[q]", "Quit"),
            ]
            .concat(),
            (Mode::Normal, _) => [
                hint("[↑↓]", "Move"),
                hint("[Enter/1-9]", "Select"),
                hint("[Esc]", "Back"),
            ]
            .concat(),
            (Mode::AddingCentre(_), _) => [
                hint("[Tab/↑↓]", "Switch field"),
                hint("[Enter]", "Save"),
                hint("[Esc]", "Cancel"),
            ]
            .concat(),
            (Mode::EditingCentre(_), _) => [
                hint("[Tab/↑↓]", "Switch field"),
                hint("[←→]", "Column"),
                hint("[Enter]", "Save"),
                hint("[Esc]", "Cancel"),
            ]
            .concat(),
            (Mode::ConfirmDelete(_), _) => {
                [hint("[y]", "Delete"), hint("[n/Esc]", "Cancel")].concat()
            }
            _ => [hint("[Enter]", "Submit"), hint("[Esc]", "Cancel")].concat(),
        };

        Line::from(spans)
    }

    fn draw_prompt(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        label: &str,
        prompt: &TextPrompt,
    ) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(title.to_string())
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(label.to_string()),
            Line::from(format!("> {}", prompt.display())),
            Line::from(""),
        ];
        if let Some(error) = &prompt.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to submit • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
        frame.set_cursor_position((inner.x + 2 + prompt.value_len() as u16, inner.y + 1));
    }

    fn draw_centre_form(&self, frame: &mut Frame, area: Rect, form: &CentreForm) {
        let popup_area = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Add Health Centre")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.values.len())
            .map(|idx| form.build_line(idx))
            .collect();
        lines.push(Line::from(""));
        lines.push(form_hint(form.error.as_deref()));

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let prefix = (label_width() + 2) as u16;
        let value_len = form.values[form.active].chars().count() as u16;
        frame.set_cursor_position((inner.x + prefix + value_len, inner.y + form.active as u16));
    }

    fn draw_edit_form(&self, frame: &mut Frame, area: Rect, form: &EditForm) {
        let popup_area = centered_rect(70, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Edit Health Centre")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let fields = [EditField::Id, EditField::Column, EditField::Value];
        let mut lines: Vec<Line> = fields.iter().map(|&field| form.build_line(field)).collect();
        lines.push(Line::from(""));
        lines.push(form_hint(form.error.as_deref()));

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        if form.active != EditField::Column {
            let row = fields
                .iter()
                .position(|&field| field == form.active)
                .unwrap_or_default() as u16;
            let prefix = (label_width() + 2) as u16;
            frame.set_cursor_position((
                inner.x + prefix + form.value_len(form.active) as u16,
                inner.y + row,
            ));
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Delete Health Centre")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete '{}' permanently?", confirm.centre)),
            Line::from("Reloading the dataset is the only way to bring it back."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

/// Shared menu navigation: arrows move, Enter or a digit picks, Esc/q backs
/// out. Any other character is an invalid choice.
fn menu_action<T: MenuItem>(menu: &mut Menu<T>, code: KeyCode) -> MenuAction<T> {
    match code {
        KeyCode::Up => {
            menu.move_selection(-1);
            MenuAction::Handled
        }
        KeyCode::Down => {
            menu.move_selection(1);
            MenuAction::Handled
        }
        KeyCode::Enter => menu
            .current()
            .map(MenuAction::Chosen)
            .unwrap_or(MenuAction::Invalid),
        KeyCode::Esc | KeyCode::Char('q') => MenuAction::Back,
        KeyCode::Char(ch) => menu
            .pick(ch)
            .map(MenuAction::Chosen)
            .unwrap_or(MenuAction::Invalid),
        _ => MenuAction::Handled,
    }
}

fn draw_menu<T: MenuItem>(frame: &mut Frame, area: Rect, menu: &Menu<T>) {
    let items: Vec<ListItem> = menu
        .numbered_labels()
        .into_iter()
        .map(ListItem::new)
        .collect();
    let list = List::new(items)
        .block(Block::default().title(menu.title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(menu.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn form_hint(error: Option<&str>) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            "Enter to save • Tab to switch field • Esc to cancel",
            Style::default().fg(Color::Gray),
        )),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::auth::hash_password;
    use crate::models::HealthCentre;
    use crate::query::SearchKind;

    const PASSWORD: &str = "correct horse";

    fn seeded_store(dir: &TempDir) -> RecordStore {
        let store = RecordStore::new(dir.path().join("kiosk.db"), "health_centres").unwrap();
        let mut dublin = HealthCentre::new("1", "St. James's");
        dublin.town = Some("Dublin".into());
        let mut cork = HealthCentre::new("2", "Cork Uni Hosp");
        cork.town = Some("Cork".into());
        cork.phone = Some("0214920000".into());
        store.insert(&dublin).unwrap();
        store.insert(&cork).unwrap();
        store
    }

    fn app(dir: &TempDir) -> App {
        let gate = AdminGate::new(Some(&hash_password("salt", PASSWORD)), "salt");
        App::new(seeded_store(dir), gate, Duration::from_secs(120))
    }

    fn press(app: &mut App, keys: &str) {
        for ch in keys.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    fn login(app: &mut App) {
        press(app, "2");
        press(app, PASSWORD);
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.screen, Screen::Admin(_)));
    }

    #[test]
    fn town_search_shows_matching_rows() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        press(&mut app, "11");
        assert!(matches!(app.mode, Mode::Searching(_)));
        press(&mut app, "cork");
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.screen {
            Screen::Results(results) => {
                assert_eq!(results.kind, SearchKind::Town);
                let ids: Vec<&str> = results.results.iter().map(|c| c.id.as_str()).collect();
                assert_eq!(ids, ["2"]);
            }
            _ => panic!("expected results screen"),
        }

        app.handle_key(KeyCode::Esc).unwrap();
        assert!(matches!(app.screen, Screen::User(_)));
    }

    #[test]
    fn empty_search_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        press(&mut app, "11Galway");
        app.handle_key(KeyCode::Enter).unwrap();
        match &app.screen {
            Screen::Results(results) => assert!(results.results.is_empty()),
            _ => panic!("expected results screen"),
        }
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn invalid_choice_reprompts() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        assert!(!app.handle_key(KeyCode::Char('9')).unwrap());
        assert!(matches!(app.screen, Screen::Main(_)));
        assert!(matches!(
            app.status,
            Some(StatusMessage {
                kind: StatusKind::Error,
                ..
            })
        ));
    }

    #[test]
    fn exit_choice_ends_the_loop() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        assert!(app.handle_key(KeyCode::Char('3')).unwrap());
    }

    #[test]
    fn esc_on_main_menu_keeps_running() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        assert!(!app.handle_key(KeyCode::Esc).unwrap());
        assert!(matches!(app.screen, Screen::Main(_)));
        assert!(matches!(app.mode, Mode::Normal));
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn idle_user_session_returns_to_main_menu() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        assert!(!app.check_inactivity(Instant::now() + Duration::from_secs(600)));

        press(&mut app, "1");
        assert!(!app.check_inactivity(Instant::now()));
        assert!(app.check_inactivity(Instant::now() + Duration::from_secs(121)));
        assert!(matches!(app.screen, Screen::Main(_)));
    }

    #[test]
    fn wrong_password_keeps_prompting() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        press(&mut app, "2");
        for attempt in ["admin123", "", "correct"] {
            press(&mut app, attempt);
            app.handle_key(KeyCode::Enter).unwrap();
            assert!(matches!(app.mode, Mode::LoggingIn(_)));
            assert!(!app.gate.is_unlocked());
        }

        press(&mut app, PASSWORD);
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(app.gate.is_unlocked());
        assert!(matches!(app.screen, Screen::Admin(_)));
    }

    #[test]
    fn leaving_admin_requires_login_again() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);

        login(&mut app);
        press(&mut app, "4");
        assert!(matches!(app.screen, Screen::Main(_)));
        assert!(!app.gate.is_unlocked());

        press(&mut app, "2");
        assert!(matches!(app.mode, Mode::LoggingIn(_)));
    }

    #[test]
    fn unconfigured_gate_keeps_admin_closed() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(
            seeded_store(&dir),
            AdminGate::new(None, ""),
            Duration::from_secs(120),
        );

        press(&mut app, "2");
        assert!(matches!(app.mode, Mode::Normal));
        assert!(matches!(app.screen, Screen::Main(_)));
    }

    #[test]
    fn admin_add_then_search_finds_the_row() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        login(&mut app);

        press(&mut app, "1");
        for value in ["3", "Galway Uni Hosp", "53.27", "-9.06", "Newcastle Rd", "Galway"] {
            press(&mut app, value);
            app.handle_key(KeyCode::Tab).unwrap();
        }
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.mode, Mode::Normal));

        let hits = search(&app.store, SearchKind::Town, "Galway").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "3");
        assert_eq!(hits[0].latitude, Some(53.27));
    }

    #[test]
    fn admin_add_with_duplicate_id_stays_in_form() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        login(&mut app);

        press(&mut app, "1");
        press(&mut app, "1");
        app.handle_key(KeyCode::Tab).unwrap();
        press(&mut app, "Duplicate");
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::AddingCentre(form) => assert!(form.error.is_some()),
            _ => panic!("expected the add form to stay open"),
        }
        assert_eq!(app.store.count().unwrap(), 2);
    }

    #[test]
    fn admin_edit_changes_one_column() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        login(&mut app);

        press(&mut app, "2");
        press(&mut app, "1");
        app.handle_key(KeyCode::Tab).unwrap();
        press(&mut app, "t");
        app.handle_key(KeyCode::Tab).unwrap();
        press(&mut app, "Blackrock");
        app.handle_key(KeyCode::Enter).unwrap();

        assert!(search(&app.store, SearchKind::Town, "Dublin").unwrap().is_empty());
        let hits = search(&app.store, SearchKind::Town, "Blackrock").unwrap();
        assert_eq!(hits[0].id, "1");
    }

    #[test]
    fn admin_delete_asks_for_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut app = app(&dir);
        login(&mut app);

        press(&mut app, "3");
        press(&mut app, "1");
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));

        press(&mut app, "y");
        assert!(app.store.fetch("1").unwrap().is_none());

        press(&mut app, "3");
        press(&mut app, "42");
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.mode, Mode::DeletingCentre(_)));
    }
}
