//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which manages the TUI state,
//! handles user input, renders the interface, and coordinates between
//! the screens (task table, form, dashboard, dialogs). The store stays the
//! single source of truth: the table only keeps the ids it is showing.

use std::io;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tracing::warn;

use crate::fields::{SortDirection, SortKey};
use crate::filter::{distinct_tags, sort_tasks, TaskFilter};
use crate::format::{due_relative, short_id};
use crate::search::{compile_pattern, highlight_spans};
use crate::stats::TaskStats;
use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use crate::task::Task;
use crate::validate::Field;
use crate::tui::{
    colors::{Palette, DARK_RED},
    dashboard::render_dashboard,
    enums::AppState,
    input::InputField,
    task_form::{TaskForm, FIELD_ORDER},
};

/// How often the data files are checked for writes by other processes.
const SYNC_INTERVAL: Duration = Duration::from_secs(2);

/// Main application state for the terminal user interface.
pub struct App<S: KeyValueStore> {
    state: AppState,
    store: TaskStore<S>,
    task_list_state: TableState,
    /// Ids of the rows currently shown, in display order.
    visible: Vec<String>,
    filter: TaskFilter,
    sort_key: SortKey,
    sort_dir: SortDirection,
    search: InputField,
    form: TaskForm,
    confirm_id: Option<String>,
    status_message: String,
    last_sync: Instant,
}

impl<S: KeyValueStore> App<S> {
    pub fn new(store: TaskStore<S>) -> Self {
        let mut app = App {
            state: AppState::TaskList,
            store,
            task_list_state: TableState::default(),
            visible: Vec::new(),
            filter: TaskFilter::default(),
            sort_key: SortKey::default(),
            sort_dir: SortDirection::default(),
            search: InputField::new(),
            form: TaskForm::new(today()),
            confirm_id: None,
            status_message: String::new(),
            last_sync: Instant::now(),
        };
        app.refresh_tasks();
        app
    }

    fn palette(&self) -> Palette {
        Palette::for_mode(self.store.is_dark_mode())
    }

    /// Recompute the visible rows, keeping the selected task selected when it
    /// is still shown.
    fn refresh_tasks(&mut self) {
        let selected = self.selected_id().map(str::to_string);

        let mut rows = self.filter.apply(self.store.tasks(), today());
        sort_tasks(&mut rows, self.sort_key, self.sort_dir);
        self.visible = rows.iter().map(|t| t.id.clone()).collect();

        let index = selected
            .and_then(|id| self.visible.iter().position(|v| *v == id))
            .or_else(|| (!self.visible.is_empty()).then_some(0));
        self.task_list_state.select(index);
    }

    fn selected_id(&self) -> Option<&str> {
        self.task_list_state
            .selected()
            .and_then(|i| self.visible.get(i))
            .map(String::as_str)
    }

    /// Get a reference to the currently selected task.
    fn get_selected_task(&self) -> Option<&Task> {
        self.selected_id().and_then(|id| self.store.get_task_by_id(id))
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Reload when another process changed the data files.
    fn sync_external(&mut self) {
        if self.last_sync.elapsed() < SYNC_INTERVAL {
            return;
        }
        self.last_sync = Instant::now();
        match self.store.poll_external_changes() {
            Ok(true) => {
                self.refresh_tasks();
                self.set_status_message("Data changed on disk; reloaded");
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "resync failed");
                self.set_status_message(format!("Error reloading data: {e}"));
            }
        }
    }

    /// Step the tag filter through All and every tag in use.
    fn cycle_tag(&mut self) {
        let tags = distinct_tags(self.store.tasks());
        let next = match &self.filter.tag {
            None => tags.first().cloned(),
            Some(current) => tags
                .iter()
                .position(|t| t == current)
                .and_then(|i| tags.get(i + 1))
                .cloned(),
        };
        self.filter.tag = next;
        self.refresh_tasks();
    }

    fn toggle_theme(&mut self) {
        match self.store.toggle_dark_mode() {
            Ok(dark) => self.set_status_message(if dark { "Dark theme" } else { "Light theme" }),
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    fn open_add_form(&mut self) {
        self.form = TaskForm::new(today());
        self.state = AppState::AddTask;
    }

    fn open_edit_form(&mut self) {
        if let Some(form) = self.get_selected_task().map(TaskForm::from_task) {
            self.form = form;
            self.state = AppState::EditTask;
        }
    }

    /// Validate and save the form. Stays on the form when validation fails.
    fn save_form(&mut self) {
        let Some(input) = self.form.submit(today()) else {
            self.set_status_message("Please fix the highlighted fields");
            return;
        };

        let result = match self.form.editing.clone() {
            Some(id) => self.store.update_task(&id, &input).map(|t| t.map(|t| t.id)),
            None => self.store.add_task(&input).map(|t| Some(t.id)),
        };

        match result {
            Ok(Some(id)) => {
                let msg = if self.form.is_edit() { "Task updated" } else { "Task created" };
                self.state = AppState::TaskList;
                self.refresh_tasks();
                if let Some(i) = self.visible.iter().position(|v| *v == id) {
                    self.task_list_state.select(Some(i));
                }
                self.set_status_message(msg);
            }
            Ok(None) => {
                self.state = AppState::TaskList;
                self.refresh_tasks();
                self.set_status_message("Task no longer exists");
            }
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    fn delete_confirmed(&mut self) {
        if let Some(id) = self.confirm_id.take() {
            match self.store.delete_task(&id) {
                Ok(_) => self.set_status_message("Task deleted"),
                Err(e) => self.set_status_message(format!("Error deleting task: {e}")),
            }
            self.refresh_tasks();
        }
    }

    /// Dispatch one key press. Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        self.status_message.clear();

        match self.state {
            AppState::TaskList if self.search.active => {
                self.handle_search_input(key);
                false
            }
            AppState::TaskList => self.handle_task_list_input(key),
            AppState::AddTask | AppState::EditTask => {
                self.handle_form_input(key);
                false
            }
            AppState::Dashboard => {
                self.handle_dashboard_input(key);
                false
            }
            AppState::Help => {
                self.state = AppState::TaskList;
                false
            }
            AppState::Confirm => {
                self.handle_confirm_input(key);
                false
            }
        }
    }

    /// Live search: the table is refiltered on every keystroke.
    fn handle_search_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.search.clear();
                self.search.active = false;
            }
            KeyCode::Enter => {
                self.search.active = false;
                let msg = if self.filter.query.is_empty() {
                    "Search cleared".to_string()
                } else {
                    format!("Search applied: '{}' ({} tasks)", self.filter.query, self.visible.len())
                };
                self.set_status_message(msg);
                return;
            }
            KeyCode::Backspace => self.search.handle_backspace(),
            KeyCode::Delete => self.search.handle_delete(),
            KeyCode::Left => self.search.move_cursor_left(),
            KeyCode::Right => self.search.move_cursor_right(),
            KeyCode::Char(c) => self.search.handle_char(c),
            _ => return,
        }
        self.filter.query = self.search.value.clone();
        self.refresh_tasks();
    }

    fn handle_task_list_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.filter.query.is_empty() {
                    return true;
                }
                self.search.clear();
                self.filter.query.clear();
                self.refresh_tasks();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(selected) = self.task_list_state.selected() {
                    self.task_list_state.select(Some(selected.saturating_sub(1)));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(selected) = self.task_list_state.selected() {
                    if selected + 1 < self.visible.len() {
                        self.task_list_state.select(Some(selected + 1));
                    }
                }
            }
            KeyCode::Char('/') => {
                self.search.active = true;
            }
            KeyCode::Char('a') => self.open_add_form(),
            KeyCode::Char('e') | KeyCode::Enter => self.open_edit_form(),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id().map(str::to_string) {
                    self.confirm_id = Some(id);
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('t') => self.cycle_tag(),
            KeyCode::Char('r') => {
                self.filter.date_range = self.filter.date_range.next();
                self.refresh_tasks();
            }
            KeyCode::Char('s') => {
                self.sort_key = self.sort_key.next();
                self.refresh_tasks();
            }
            KeyCode::Char('o') => {
                self.sort_dir = self.sort_dir.toggle();
                self.refresh_tasks();
            }
            KeyCode::Tab | KeyCode::Char('b') => self.state = AppState::Dashboard,
            KeyCode::Char('m') => self.toggle_theme(),
            KeyCode::Char('R') => {
                match self.store.reload() {
                    Ok(()) => self.set_status_message("Reloaded from disk"),
                    Err(e) => self.set_status_message(format!("Error: {e}")),
                }
                self.refresh_tasks();
            }
            KeyCode::Char('h') | KeyCode::F(1) => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn handle_form_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.state = AppState::TaskList,
            KeyCode::Tab | KeyCode::Down => self.form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.form.prev_field(),
            KeyCode::Left => self.form.handle_left_right(false),
            KeyCode::Right => self.form.handle_left_right(true),
            KeyCode::Backspace => self.form.handle_backspace(),
            KeyCode::Delete => self.form.handle_delete(),
            KeyCode::Enter => self.save_form(),
            KeyCode::Char(c) => self.form.handle_char(c),
            _ => {}
        }
    }

    fn handle_dashboard_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Tab | KeyCode::Char('q') | KeyCode::Char('b') => {
                self.state = AppState::TaskList
            }
            KeyCode::Char('m') => self.toggle_theme(),
            _ => {}
        }
    }

    fn handle_confirm_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.delete_confirmed();
                self.state = AppState::TaskList;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm_id = None;
                self.state = AppState::TaskList;
            }
            _ => {}
        }
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    /// Header line with the active filter and sort controls.
    fn render_header(&self, f: &mut Frame, area: Rect, palette: &Palette) {
        let label = Style::default().fg(palette.muted);
        let value = Style::default().fg(palette.fg).add_modifier(Modifier::BOLD);
        let tag = self.filter.tag.as_deref().unwrap_or("All");
        let sort = format!("{} {}", self.sort_key.label(), self.sort_dir.arrow());

        let mut spans = vec![
            Span::styled("STUDY PLANNER", Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled("Tag: ", label),
            Span::styled(tag.to_string(), value),
            Span::styled("  Range: ", label),
            Span::styled(self.filter.date_range.label(), value),
            Span::styled("  Sort: ", label),
            Span::styled(sort, value),
        ];
        if self.search.active || !self.filter.query.is_empty() {
            spans.push(Span::styled("  Search: ", label));
        }
        let prefix_width = Line::from(spans.clone()).width();
        if self.search.active || !self.filter.query.is_empty() {
            spans.push(Span::styled(self.filter.query.clone(), Style::default().fg(palette.fg).bg(palette.mark)));
        }

        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().bg(palette.bg));
        f.render_widget(header, area);

        if self.search.active {
            let col = prefix_width + self.search.cursor_column();
            let max = area.width.saturating_sub(2) as usize;
            f.set_cursor_position((area.x + 1 + col.min(max) as u16, area.y + 1));
        }
    }

    /// Render the main task table with search matches highlighted.
    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let palette = self.palette();
        let today = today();
        let unit = self.store.settings().default_unit;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);
        self.render_header(f, chunks[0], &palette);

        let header_cells = ["Due", "When", "Duration", "Title", "Tag"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(palette.accent).fg(palette.on_accent))
            .height(1);

        let query = self.filter.query.trim();
        let mark = Style::default().bg(palette.mark).add_modifier(Modifier::BOLD);
        let tasks: Vec<&Task> = self
            .visible
            .iter()
            .filter_map(|id| self.store.get_task_by_id(id))
            .collect();
        let stats = TaskStats::of(tasks.iter().copied());

        let rows: Vec<Row> = tasks
            .iter()
            .map(|task| {
                let when = due_relative(&task.due_date, today);
                let when_style = if when.ends_with("late") {
                    Style::default().fg(palette.error)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(highlighted(&task.due_date, query, mark)),
                    Cell::from(when).style(when_style),
                    Cell::from(unit.format(task.duration)),
                    Cell::from(highlighted(&task.title, query, mark)),
                    Cell::from(highlighted(task.tag.as_deref().unwrap_or(""), query, mark)),
                ])
                .style(Style::default().fg(palette.fg))
            })
            .collect();

        let widths = [
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Min(25),
            Constraint::Length(16),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(
                        "Tasks ({}/{}) - {} - Press 'h' for help",
                        self.visible.len(),
                        self.store.tasks().len(),
                        unit.format(stats.total_duration)
                    ))
                    .style(Style::default().bg(palette.bg)),
            )
            .row_highlight_style(Style::default().bg(palette.selection_bg).fg(palette.selection_fg))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.task_list_state);
    }

    /// Render the add/edit form with per-field validation messages.
    fn render_task_form(&mut self, f: &mut Frame, area: Rect) {
        let palette = self.palette();
        let area = centered_rect(60, 80, area);
        f.render_widget(Clear, area);

        let title = if self.form.is_edit() { "Edit Task" } else { "Add New Task" };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(Style::default().bg(palette.bg).fg(palette.fg));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let mut constraints: Vec<Constraint> = FIELD_ORDER.iter().map(|_| Constraint::Length(4)).collect();
        constraints.push(Constraint::Min(1));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (i, field) in FIELD_ORDER.iter().enumerate() {
            let input = self.form.field(*field);
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Length(1)])
                .split(chunks[i]);

            let border = if input.active {
                Style::default().fg(palette.accent)
            } else {
                Style::default().fg(palette.muted)
            };
            let label = match field {
                Field::Tag => field.label().to_string(),
                Field::Duration => format!("{} (minutes) *", field.label()),
                _ => format!("{} *", field.label()),
            };
            let widget = Paragraph::new(input.value.as_str())
                .block(Block::default().borders(Borders::ALL).title(label).border_style(border));
            f.render_widget(widget, rows[0]);

            if let Some(msg) = self.form.report.error(*field) {
                let error = Paragraph::new(msg).style(Style::default().fg(palette.error));
                f.render_widget(error, rows[1]);
            }

            if input.active {
                let col = input.cursor_column().min(rows[0].width.saturating_sub(3) as usize) as u16;
                f.set_cursor_position((rows[0].x + 1 + col, rows[0].y + 1));
            }
        }

        let help = Paragraph::new("Tab/↑↓ move  Enter save  Esc cancel  Due accepts today, tomorrow, in 3d")
            .style(Style::default().fg(palette.muted))
            .wrap(Wrap { trim: true });
        f.render_widget(help, chunks[FIELD_ORDER.len()]);
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("Study Planner Help", bold)),
            Line::from(""),
            Line::from(Span::styled("Task List:", bold)),
            Line::from("  ↑/↓, k/j     Navigate tasks"),
            Line::from("  /            Search (regex, plain text if the pattern is invalid)"),
            Line::from("  a            Add new task"),
            Line::from("  e/Enter      Edit selected task"),
            Line::from("  d/Delete     Delete selected task"),
            Line::from("  t            Cycle tag filter"),
            Line::from("  r            Cycle date range (All, Today, Tomorrow, Next 7 days, This month)"),
            Line::from("  s / o        Cycle sort key / toggle direction"),
            Line::from("  Tab/b        Dashboard"),
            Line::from("  m            Toggle dark theme"),
            Line::from("  R            Reload from disk"),
            Line::from("  h/F1         Show this help"),
            Line::from("  q/Esc/Ctrl+C Quit"),
            Line::from(""),
            Line::from(Span::styled("Form:", bold)),
            Line::from("  Tab/↑↓       Navigate between fields"),
            Line::from("  Enter        Save"),
            Line::from("  Esc          Cancel"),
        ];

        let paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help - Press any key to return"))
            .style(Style::default().bg(self.palette().bg).fg(self.palette().fg))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render a confirmation dialog for deleting the selected task.
    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 25, area);
        f.render_widget(Clear, area);

        let title = self
            .confirm_id
            .as_deref()
            .and_then(|id| self.store.get_task_by_id(id))
            .map(|t| format!("{} ({})", t.title, short_id(&t.id)))
            .unwrap_or_default();
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Are you sure you want to delete this task?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(title),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else if self.search.active {
            let mode = if compile_pattern(self.filter.query.trim()).is_ok() {
                "regex"
            } else {
                "plain text"
            };
            format!("Search ({mode}): {} (Esc to clear, Enter to confirm)", self.filter.query)
        } else {
            match self.state {
                AppState::TaskList => format!("Tasks: {} | Press 'h' for help", self.visible.len()),
                other => other.label().to_string(),
            }
        };

        let palette = self.palette();
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(palette.accent).fg(palette.on_accent))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to appropriate view renderers.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::TaskList => self.render_task_list(f, chunks[0]),
            AppState::AddTask | AppState::EditTask => {
                self.render_task_list(f, chunks[0]);
                self.render_task_form(f, chunks[0]);
            }
            AppState::Dashboard => {
                let dashboard = self.store.dashboard(today());
                let unit = self.store.settings().default_unit;
                render_dashboard(f, chunks[0], &dashboard, unit, &self.palette());
            }
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                self.render_task_list(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
        }

        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Handles rendering and input processing until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.sync_external();
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Split `text` into plain and highlighted spans for the literal `query`.
fn highlighted<'a>(text: &'a str, query: &str, mark: Style) -> Line<'a> {
    let mut spans = Vec::new();
    let mut last = 0;
    for range in highlight_spans(text, query) {
        if range.start > last {
            spans.push(Span::raw(&text[last..range.start]));
        }
        spans.push(Span::styled(&text[range.clone()], mark));
        last = range.end;
    }
    if last < text.len() {
        spans.push(Span::raw(&text[last..]));
    }
    Line::from(spans)
}

/// A rectangle centered in `area`, sized as a percentage of it.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::DateRange;
    use crate::storage::MemoryStore;
    use crate::task::TaskInput;
    use crate::filter::format_date;
    use chrono::Duration as Days;
    use ratatui::backend::TestBackend;

    fn app_with(tasks: &[(&str, &str, Option<&str>)]) -> App<MemoryStore> {
        let mut store = TaskStore::open(MemoryStore::new()).unwrap();
        let due = format_date(today());
        for (title, duration, tag) in tasks {
            store.add_task(&TaskInput::new(*title, *duration, due.clone(), *tag)).unwrap();
        }
        App::new(store)
    }

    fn press(app: &mut App<MemoryStore>, key: KeyCode) -> bool {
        app.handle_key(key, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App<MemoryStore>, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn visible_titles(app: &App<MemoryStore>) -> Vec<String> {
        app.visible
            .iter()
            .filter_map(|id| app.store.get_task_by_id(id))
            .map(|t| t.title.clone())
            .collect()
    }

    #[test]
    fn test_live_search_filters_and_escape_clears() {
        let mut app = app_with(&[("Team Meeting", "30", None), ("Gym", "45", Some("Health"))]);
        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "team");
        assert_eq!(visible_titles(&app), vec!["Team Meeting"]);

        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, "[");
        // "t[" is not a valid regex; plain substring search finds nothing.
        assert!(visible_titles(&app).is_empty());

        press(&mut app, KeyCode::Esc);
        assert!(!app.search.active);
        assert_eq!(app.visible.len(), 2);
    }

    #[test]
    fn test_add_through_form() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.state, AppState::AddTask);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::AddTask);
        assert!(!app.form.report.is_valid());

        type_str(&mut app, "Read notes");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "45");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.state, AppState::TaskList);
        assert_eq!(app.store.tasks().len(), 1);
        assert_eq!(app.get_selected_task().unwrap().title, "Read notes");
    }

    #[test]
    fn test_edit_keeps_id() {
        let mut app = app_with(&[("Gym", "45", None)]);
        let id = app.store.tasks()[0].id.clone();
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::EditTask);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        type_str(&mut app, "60");
        press(&mut app, KeyCode::Enter);

        let task = app.store.get_task_by_id(&id).unwrap();
        assert_eq!(task.duration, 60.0);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = app_with(&[("Gym", "45", None)]);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state, AppState::Confirm);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.store.tasks().len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.store.tasks().is_empty());
        assert!(app.task_list_state.selected().is_none());
    }

    #[test]
    fn test_tag_cycle_and_date_range() {
        let mut app = app_with(&[("A", "1", Some("Study")), ("B", "1", Some("Health")), ("C", "1", None)]);
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(visible_titles(&app), vec!["A"]);
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(visible_titles(&app), vec!["B"]);
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.visible.len(), 3);

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.filter.date_range, DateRange::Today);
        assert_eq!(app.visible.len(), 3);
        press(&mut app, KeyCode::Char('r'));
        assert!(app.visible.is_empty());
    }

    #[test]
    fn test_sort_toggles() {
        let mut app = app_with(&[("b", "10", None), ("A", "30", None)]);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.sort_key, SortKey::Title);
        assert_eq!(visible_titles(&app), vec!["A", "b"]);
        press(&mut app, KeyCode::Char('o'));
        assert_eq!(visible_titles(&app), vec!["b", "A"]);
    }

    #[test]
    fn test_theme_toggle_persists() {
        let mut app = app_with(&[]);
        press(&mut app, KeyCode::Char('m'));
        assert!(app.store.is_dark_mode());
        assert_eq!(app.palette(), Palette::DARK);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with(&[]);
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn test_highlighted_spans() {
        let mark = Style::default().add_modifier(Modifier::BOLD);
        let line = highlighted("Team Meeting", "team", mark);
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].content, "Team");
        assert_eq!(line.spans[0].style, mark);
        assert_eq!(line.spans[1].content, " Meeting");
    }

    #[test]
    fn test_renders_every_screen() {
        let mut app = app_with(&[("Team Meeting", "30", Some("Work"))]);
        {
            let store = &mut app.store;
            let yesterday = format_date(today() - Days::days(1));
            store.add_task(&TaskInput::new("Old", "15", yesterday, None)).unwrap();
        }
        app.refresh_tasks();

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        for key in [KeyCode::Char('/'), KeyCode::Esc, KeyCode::Char('a'), KeyCode::Esc, KeyCode::Tab] {
            terminal.draw(|f| app.render(f)).unwrap();
            press(&mut app, key);
        }
        terminal.draw(|f| app.render(f)).unwrap();
        assert_eq!(app.state, AppState::Dashboard);
    }
}
