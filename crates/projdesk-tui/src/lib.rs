// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use projdesk_app::{
    ApiCall, ApiReply, ApiRequest, FormField, LoadState, Project, ProjectForm, ProjectTable,
    SortDirection, SortKey, SortSpec, TableCommand, TableEvent,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const PAGE_ROWS: isize = 10;
const CURSOR_MARK: &str = "▏";

/// Backend the event loop talks to. `run_request` blocks; `spawn_request`
/// must eventually send exactly one `InternalEvent::Completed` for the
/// request's ticket.
pub trait AppRuntime {
    fn run_request(&mut self, call: &ApiCall) -> Result<ApiReply>;

    fn spawn_request(&mut self, request: ApiRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = self.run_request(&request.call);
        tx.send(InternalEvent::Completed {
            ticket: request.ticket,
            outcome,
        })
        .map_err(|_| anyhow!("request event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Completed { ticket: u64, outcome: Result<ApiReply> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    pub status_clear: Duration,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            status_clear: Duration::from_secs(4),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    search_focused: bool,
    help_visible: bool,
    selected_col: usize,
    status_token: u64,
    status_clear: Duration,
}

impl ViewData {
    fn new(options: UiOptions) -> Self {
        Self {
            status_clear: options.status_clear,
            ..Self::default()
        }
    }
}

pub fn run_app<R: AppRuntime>(
    table: &mut ProjectTable,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();

    info!("ui started");
    dispatch(
        table,
        runtime,
        &mut view_data,
        &internal_tx,
        TableCommand::Load,
    );

    let mut result = Ok(());
    loop {
        process_internal_events(table, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, table, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)) {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error).context("poll event");
                break;
            }
        };
        if has_event {
            let event = match event::read() {
                Ok(event) => event,
                Err(error) => {
                    result = Err(error).context("read event");
                    break;
                }
            };
            match event {
                Event::Key(key) => {
                    if handle_key_event(table, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    info!("ui stopped");
    result
}

fn process_internal_events<R: AppRuntime>(
    table: &mut ProjectTable,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                table.dispatch(TableCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Completed { ticket, outcome } => {
                if let Err(error) = &outcome {
                    warn!(ticket, "request failed: {error:#}");
                }
                let events = table.complete(ticket, outcome);
                follow_events(table, runtime, view_data, tx, events);
            }
        }
    }
}

fn dispatch<R: AppRuntime>(
    table: &mut ProjectTable,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: TableCommand,
) {
    let events = table.dispatch(command);
    follow_events(table, runtime, view_data, tx, events);
}

/// Starts the requests and status timers the table asked for.
fn follow_events<R: AppRuntime>(
    table: &mut ProjectTable,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: Vec<TableEvent>,
) {
    let mut queue = VecDeque::from(events);
    while let Some(event) = queue.pop_front() {
        match event {
            TableEvent::RequestStarted(request) => {
                let ticket = request.ticket;
                debug!(ticket, call = request.call.label(), "request started");
                if let Err(error) = runtime.spawn_request(request, tx.clone()) {
                    queue.extend(table.complete(ticket, Err(error)));
                }
            }
            TableEvent::StatusUpdated(_) => bump_status_token(view_data, tx),
            _ => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64, after: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(after);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn bump_status_token(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    view_data.status_token = view_data.status_token.saturating_add(1);
    if !view_data.status_clear.is_zero() {
        schedule_status_clear(internal_tx, view_data.status_token, view_data.status_clear);
    }
}

fn handle_key_event<R: AppRuntime>(
    table: &mut ProjectTable,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    if table.confirm_delete.is_some() {
        let command = match key.code {
            KeyCode::Char('y' | 'Y') | KeyCode::Enter => Some(TableCommand::ConfirmDelete),
            KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(TableCommand::CancelDelete),
            _ => None,
        };
        if let Some(command) = command {
            dispatch(table, runtime, view_data, internal_tx, command);
        }
        return false;
    }

    if table.form.is_some() {
        if let Some(command) = form_command_for_key(key) {
            dispatch(table, runtime, view_data, internal_tx, command);
        }
        return false;
    }

    if view_data.search_focused {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => view_data.search_focused = false,
            KeyCode::Backspace => dispatch(
                table,
                runtime,
                view_data,
                internal_tx,
                TableCommand::PopSearchChar,
            ),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => dispatch(
                table,
                runtime,
                view_data,
                internal_tx,
                TableCommand::PushSearchChar(ch),
            ),
            _ => {}
        }
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Char('/') => view_data.search_focused = true,
        KeyCode::Char('h') | KeyCode::Left => {
            view_data.selected_col = view_data.selected_col.saturating_sub(1);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            view_data.selected_col = (view_data.selected_col + 1).min(SortKey::ALL.len() - 1);
        }
        KeyCode::Char('s') => {
            let key = SortKey::ALL[view_data.selected_col];
            dispatch(
                table,
                runtime,
                view_data,
                internal_tx,
                TableCommand::SortBy(key),
            );
        }
        KeyCode::Char(ch @ '1'..='7') => {
            let index = (ch as usize) - ('1' as usize);
            view_data.selected_col = index;
            dispatch(
                table,
                runtime,
                view_data,
                internal_tx,
                TableCommand::SortBy(SortKey::ALL[index]),
            );
        }
        KeyCode::Esc if !table.search.is_empty() => dispatch(
            table,
            runtime,
            view_data,
            internal_tx,
            TableCommand::SetSearch(String::new()),
        ),
        code => {
            if let Some(command) = table_command_for_key(code) {
                dispatch(table, runtime, view_data, internal_tx, command);
            }
        }
    }
    false
}

fn table_command_for_key(code: KeyCode) -> Option<TableCommand> {
    match code {
        KeyCode::Char('j') | KeyCode::Down => Some(TableCommand::MoveCursor(1)),
        KeyCode::Char('k') | KeyCode::Up => Some(TableCommand::MoveCursor(-1)),
        KeyCode::PageDown => Some(TableCommand::MoveCursor(PAGE_ROWS)),
        KeyCode::PageUp => Some(TableCommand::MoveCursor(-PAGE_ROWS)),
        KeyCode::Char('g') | KeyCode::Home => Some(TableCommand::JumpFirst),
        KeyCode::Char('G') | KeyCode::End => Some(TableCommand::JumpLast),
        KeyCode::Char('e') | KeyCode::Enter => Some(TableCommand::OpenEdit),
        KeyCode::Char('a') => Some(TableCommand::OpenCreate),
        KeyCode::Char('d') => Some(TableCommand::RequestDelete),
        KeyCode::Char('r') => Some(TableCommand::Load),
        _ => None,
    }
}

fn form_command_for_key(key: KeyEvent) -> Option<TableCommand> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') => Some(TableCommand::SubmitForm),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Esc => Some(TableCommand::CloseForm),
        KeyCode::Enter => Some(TableCommand::SubmitForm),
        KeyCode::Tab | KeyCode::Down => Some(TableCommand::FormFocus(1)),
        KeyCode::BackTab | KeyCode::Up => Some(TableCommand::FormFocus(-1)),
        KeyCode::Backspace => Some(TableCommand::FormBackspace),
        KeyCode::Char(ch) => Some(TableCommand::FormChar(ch)),
        _ => None,
    }
}

fn render(frame: &mut ratatui::Frame<'_>, table: &ProjectTable, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let search_style = if view_data.search_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let search = Paragraph::new(search_bar_text(table, view_data))
        .style(search_style)
        .block(
            Block::default()
                .title(table_title(table))
                .borders(Borders::ALL),
        );
    frame.render_widget(search, layout[0]);

    render_table(frame, layout[1], table, view_data);

    let status_widget = Paragraph::new(status_text(table, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, layout[2]);

    if table.load == LoadState::Loading {
        let area = centered_rect(30, 12, frame.area());
        frame.render_widget(Clear, area);
        let loading = Paragraph::new("loading projects...").block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(loading, area);
    }

    if let Some(form) = &table.form {
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(render_form_overlay_text(form))
            .block(Block::default().title(form.title()).borders(Borders::ALL));
        frame.render_widget(overlay, area);
    }

    if table.confirm_delete.is_some() {
        let area = centered_rect(50, 20, frame.area());
        frame.render_widget(Clear, area);
        let confirm = Paragraph::new(render_confirm_text(table)).block(
            Block::default()
                .title("delete")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Red)),
        );
        frame.render_widget(confirm, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    table: &ProjectTable,
    view_data: &ViewData,
) {
    let rows = table.rows();
    if rows.is_empty() {
        let empty = Paragraph::new(empty_table_text(table))
            .block(Block::default().borders(Borders::ALL).title("projects"));
        frame.render_widget(empty, area);
        return;
    }

    let widths = [
        Constraint::Length(6),
        Constraint::Min(10),
        Constraint::Min(10),
        Constraint::Min(8),
        Constraint::Length(16),
        Constraint::Length(12),
        Constraint::Length(12),
    ];

    let header_cells = SortKey::ALL.iter().enumerate().map(|(index, key)| {
        let mut style = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        if index == view_data.selected_col {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        Cell::from(header_label(*key, table.sort)).style(style)
    });
    let header = Row::new(header_cells);

    let body = rows.iter().enumerate().map(|(row_index, project)| {
        let selected_row = row_index == table.selected;
        let cells = SortKey::ALL
            .iter()
            .enumerate()
            .map(|(column_index, key)| {
                let mut style = Style::default();
                if selected_row {
                    style = style.bg(Color::DarkGray);
                }
                if selected_row && column_index == view_data.selected_col {
                    style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
                Cell::from(cell_text(project, *key)).style(style)
            })
            .collect::<Vec<_>>();
        Row::new(cells)
    });

    let widget = Table::new(body, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title("projects").borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn cell_text(project: &Project, key: SortKey) -> String {
    let text = project.field(key);
    match key {
        SortKey::Rate => format!("{text} €"),
        _ => text,
    }
}

fn header_label(key: SortKey, sort: Option<SortSpec>) -> String {
    let mut label = key.label().to_owned();
    if let Some(spec) = sort
        && spec.key == key
    {
        label.push_str(match spec.direction {
            SortDirection::Asc => " ↑",
            SortDirection::Desc => " ↓",
        });
    }
    label
}

fn table_title(table: &ProjectTable) -> String {
    let total = table.records.len();
    let shown = table.rows().len();
    if table.search.is_empty() {
        format!("projdesk | {total} projects")
    } else {
        format!("projdesk | {shown}/{total} projects")
    }
}

fn search_bar_text(table: &ProjectTable, view_data: &ViewData) -> String {
    if view_data.search_focused {
        format!("search: {}{CURSOR_MARK}", table.search)
    } else if table.search.is_empty() {
        "search: (press / to filter)".to_owned()
    } else {
        format!("search: {}", table.search)
    }
}

fn empty_table_text(table: &ProjectTable) -> String {
    match &table.load {
        LoadState::Loading => String::new(),
        LoadState::Failed(message) => format!("{message}\npress r to retry"),
        LoadState::Loaded if table.records.is_empty() => {
            "no projects yet -- press a to add one".to_owned()
        }
        LoadState::Loaded => format!("no projects match {:?}", table.search),
    }
}

fn render_form_overlay_text(form: &ProjectForm) -> String {
    let focused = form.focused_field();
    let mut lines = FormField::ALL
        .iter()
        .map(|field| {
            let value = form.value(*field);
            if *field == focused {
                format!("> {:<13} {value}{CURSOR_MARK}", field.label())
            } else {
                format!("  {:<13} {value}", field.label())
            }
        })
        .collect::<Vec<_>>();
    lines.push(String::new());
    lines.push("tab/shift+tab field | enter or ctrl+s save | esc cancel".to_owned());
    lines.join("\n")
}

fn render_confirm_text(table: &ProjectTable) -> String {
    let Some(id) = table.confirm_delete else {
        return String::new();
    };
    let target = table
        .records
        .iter()
        .find(|project| project.id == id)
        .map(|project| format!("project {id} ({} / {})", project.client, project.project))
        .unwrap_or_else(|| format!("project {id}"));
    format!("delete {target}?\n\ny confirm | n cancel")
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | q quit | ? help\n\
nav: j/k or up/down rows | g/G first/last | pgup/pgdn page | h/l columns\n\
sort: 1-7 sort by column | s sort by selected column (again to flip)\n\
search: / focus | type to filter | backspace | enter/esc leave | esc clears\n\
edit: e or enter edit | a add | d delete | r refresh\n\
form: tab/shift+tab field | enter or ctrl+s save | esc cancel\n\
delete: y confirm | n cancel"
}

fn mode_badge(table: &ProjectTable, view_data: &ViewData) -> &'static str {
    if table.confirm_delete.is_some() {
        "CONFIRM"
    } else if table.form.is_some() {
        "FORM"
    } else if view_data.search_focused {
        "SEARCH"
    } else {
        "NAV"
    }
}

fn status_text(table: &ProjectTable, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }

    let mode = mode_badge(table, view_data);
    let hints = match mode {
        "FORM" => "tab field | enter save | esc cancel",
        "CONFIRM" => "y delete | n keep",
        "SEARCH" => "type to filter | enter/esc done",
        _ => "j/k g/G | 1-7 s sort | / search | e a d r | ? help | q",
    };
    let busy = if table.is_busy() { " | working..." } else { "" };
    match &table.status_line {
        Some(status) => format!("{mode} | {status}{busy} | {hints}"),
        None => format!("{mode}{busy} | {hints}"),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}
