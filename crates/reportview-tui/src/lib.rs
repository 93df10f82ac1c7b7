// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use reportview_app::{
    CopyToken, ReportDescriptor, ReportId, RequestId, ViewCommand, ViewEvent, ViewState,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const TITLE: &str = "The Incredible Machine";
pub const SUBTITLE: &str = "Select an encounter to view the student feedback report";
pub const HEADER_IMAGE_ALT: &str = "Uncle Jan";
pub const PLACEHOLDER_OPTION: &str = "-- Select an encounter --";
pub const LOADING_TEXT: &str = "Loading report...";
pub const EMPTY_STATE_TEXT: &str = "Select an encounter from the dropdown to view the report";
pub const DEFAULT_COPIED_RESET: Duration = Duration::from_millis(2000);

const EMPTY_STATE_ICON: &str = "📋";
const PAGE_LINES: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    IndexLoaded(Vec<ReportDescriptor>),
    IndexFailed { error: String },
    ReportLoaded { request_id: RequestId, content: String },
    ReportFailed { request_id: RequestId, error: String },
    CopySucceeded,
    CopyFailed { error: String },
    ResetCopied { token: CopyToken },
}

impl InternalEvent {
    pub fn from_index_result(result: Result<Vec<ReportDescriptor>>) -> Self {
        match result {
            Ok(reports) => Self::IndexLoaded(reports),
            Err(error) => Self::IndexFailed {
                error: format!("{error:#}"),
            },
        }
    }

    pub fn from_report_result(request_id: RequestId, result: Result<String>) -> Self {
        match result {
            Ok(content) => Self::ReportLoaded {
                request_id,
                content,
            },
            Err(error) => Self::ReportFailed {
                request_id,
                error: format!("{error:#}"),
            },
        }
    }

    pub fn from_copy_result(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::CopySucceeded,
            Err(error) => Self::CopyFailed {
                error: format!("{error:#}"),
            },
        }
    }
}

/// I/O the viewer needs from its host. The `spawn_*` hooks default to
/// running inline and posting the outcome on `tx`; runtimes backed by real
/// network or subprocess calls override them to run on worker threads.
pub trait ViewerRuntime {
    fn load_index(&mut self) -> Result<Vec<ReportDescriptor>>;
    fn load_report(&mut self, descriptor: &ReportDescriptor) -> Result<String>;
    fn copy_text(&mut self, text: &str) -> Result<()>;
    fn print_report(&mut self, title: &str, content: &str) -> Result<()>;

    fn spawn_index_load(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let event = InternalEvent::from_index_result(self.load_index());
        tx.send(event)
            .map_err(|_| anyhow!("viewer event channel closed"))
    }

    fn spawn_report_load(
        &mut self,
        request_id: RequestId,
        descriptor: &ReportDescriptor,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let event = InternalEvent::from_report_result(request_id, self.load_report(descriptor));
        tx.send(event)
            .map_err(|_| anyhow!("viewer event channel closed"))
    }

    fn spawn_copy(&mut self, text: &str, tx: Sender<InternalEvent>) -> Result<()> {
        let event = InternalEvent::from_copy_result(self.copy_text(text));
        tx.send(event)
            .map_err(|_| anyhow!("viewer event channel closed"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerOptions {
    pub copied_reset: Duration,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            copied_reset: DEFAULT_COPIED_RESET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct DropdownUiState {
    open: bool,
    cursor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    dropdown: DropdownUiState,
    scroll: u16,
    help_visible: bool,
    copied_reset: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BodyView<'a> {
    Report { title: &'a str, content: &'a str },
    Empty,
    Blank,
}

pub fn run_app<R: ViewerRuntime>(
    state: &mut ViewState,
    runtime: &mut R,
    options: ViewerOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        copied_reset: options.copied_reset,
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    dispatch_and_apply(
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        ViewCommand::Activate,
    );

    let result = event_loop(
        &mut terminal,
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        &internal_rx,
    );

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop<R: ViewerRuntime>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut ViewState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    internal_rx: &Receiver<InternalEvent>,
) -> Result<()> {
    loop {
        process_internal_events(state, runtime, view_data, internal_tx, internal_rx);

        terminal
            .draw(|frame| render(frame, state, view_data))
            .context("draw frame")?;

        if !event::poll(Duration::from_millis(120)).context("poll event")? {
            continue;
        }
        match event::read().context("read event")? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if handle_key_event(state, runtime, view_data, internal_tx, key) {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
}

fn process_internal_events<R: ViewerRuntime>(
    state: &mut ViewState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        handle_internal_event(state, runtime, view_data, tx, event);
    }
}

fn handle_internal_event<R: ViewerRuntime>(
    state: &mut ViewState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: InternalEvent,
) {
    let command = match event {
        InternalEvent::IndexLoaded(reports) => {
            info!(count = reports.len(), "report index loaded");
            ViewCommand::IndexLoaded(reports)
        }
        InternalEvent::IndexFailed { error } => {
            warn!(%error, "report index load failed");
            ViewCommand::IndexFailed
        }
        InternalEvent::ReportLoaded {
            request_id,
            content,
        } => {
            debug!(%request_id, bytes = content.len(), "report loaded");
            ViewCommand::ReportLoaded {
                request_id,
                content,
            }
        }
        InternalEvent::ReportFailed { request_id, error } => {
            warn!(%request_id, %error, "report load failed");
            ViewCommand::ReportFailed { request_id }
        }
        InternalEvent::CopySucceeded => ViewCommand::CopySucceeded,
        InternalEvent::CopyFailed { error } => {
            warn!(%error, "clipboard write failed");
            ViewCommand::CopyFailed
        }
        InternalEvent::ResetCopied { token } => ViewCommand::ResetCopied { token },
    };
    dispatch_and_apply(state, runtime, view_data, tx, command);
}

fn dispatch_and_apply<R: ViewerRuntime>(
    state: &mut ViewState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: ViewCommand,
) {
    let events = state.dispatch(command);
    debug!(
        phase = state.phase().as_str(),
        events = events.len(),
        "view state updated"
    );
    for event in events {
        apply_event(state, runtime, view_data, tx, event);
    }
}

fn apply_event<R: ViewerRuntime>(
    state: &mut ViewState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: ViewEvent,
) {
    match event {
        ViewEvent::IndexRequested => {
            if let Err(error) = runtime.spawn_index_load(tx.clone()) {
                warn!(error = %format!("{error:#}"), "report index request not started");
                dispatch_and_apply(state, runtime, view_data, tx, ViewCommand::IndexFailed);
            }
        }
        ViewEvent::ReportRequested {
            request_id,
            descriptor,
        } => {
            debug!(%request_id, id = %descriptor.id, path = %descriptor.path, "report requested");
            if let Err(error) = runtime.spawn_report_load(request_id, &descriptor, tx.clone()) {
                warn!(%request_id, error = %format!("{error:#}"), "report request not started");
                dispatch_and_apply(
                    state,
                    runtime,
                    view_data,
                    tx,
                    ViewCommand::ReportFailed { request_id },
                );
            }
        }
        ViewEvent::CopyRequested(text) => {
            if let Err(error) = runtime.spawn_copy(&text, tx.clone()) {
                warn!(error = %format!("{error:#}"), "clipboard write not started");
                dispatch_and_apply(state, runtime, view_data, tx, ViewCommand::CopyFailed);
            }
        }
        ViewEvent::CopyResetScheduled(token) => {
            schedule_copied_reset(tx, token, view_data.copied_reset);
        }
        ViewEvent::PrintRequested { title, content } => {
            if let Err(error) = runtime.print_report(&title, &content) {
                warn!(error = %format!("{error:#}"), "print failed");
            }
        }
        ViewEvent::ContentUpdated | ViewEvent::ContentCleared => {
            view_data.scroll = 0;
        }
        ViewEvent::StaleResponseDropped(request_id) => {
            debug!(%request_id, "stale report response dropped");
        }
        ViewEvent::ReportsReplaced(count) => {
            view_data.dropdown.cursor = view_data.dropdown.cursor.min(count);
        }
        ViewEvent::SelectionChanged(_)
        | ViewEvent::LoadingChanged(_)
        | ViewEvent::ErrorRaised(_)
        | ViewEvent::ErrorCleared
        | ViewEvent::CopiedChanged(_) => {}
    }
}

fn schedule_copied_reset(internal_tx: &Sender<InternalEvent>, token: CopyToken, delay: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(InternalEvent::ResetCopied { token });
    });
}

fn handle_key_event<R: ViewerRuntime>(
    state: &mut ViewState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if view_data.dropdown.open {
        handle_dropdown_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Enter | KeyCode::Char(' ') => open_dropdown(state, view_data),
        KeyCode::Char('c') => {
            dispatch_and_apply(state, runtime, view_data, internal_tx, ViewCommand::Copy);
        }
        KeyCode::Char('p') => {
            dispatch_and_apply(state, runtime, view_data, internal_tx, ViewCommand::Print);
        }
        KeyCode::Char('r') => {
            dispatch_and_apply(
                state,
                runtime,
                view_data,
                internal_tx,
                ViewCommand::ReloadIndex,
            );
        }
        KeyCode::Char('j') | KeyCode::Down => scroll_by(state, view_data, 1),
        KeyCode::Char('k') | KeyCode::Up => scroll_by(state, view_data, -1),
        KeyCode::PageDown => scroll_by(state, view_data, PAGE_LINES),
        KeyCode::PageUp => scroll_by(state, view_data, -PAGE_LINES),
        KeyCode::Char('g') | KeyCode::Home => view_data.scroll = 0,
        KeyCode::Char('G') | KeyCode::End => view_data.scroll = max_scroll(state),
        KeyCode::Char('?') => view_data.help_visible = true,
        _ => {}
    }
    false
}

fn handle_dropdown_key<R: ViewerRuntime>(
    state: &mut ViewState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let last = state.reports.len();
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => view_data.dropdown.open = false,
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.dropdown.cursor = view_data.dropdown.cursor.saturating_sub(1);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            view_data.dropdown.cursor = (view_data.dropdown.cursor + 1).min(last);
        }
        KeyCode::Home | KeyCode::Char('g') => view_data.dropdown.cursor = 0,
        KeyCode::End | KeyCode::Char('G') => view_data.dropdown.cursor = last,
        KeyCode::Enter | KeyCode::Char(' ') => {
            let new_id = option_value(state, view_data.dropdown.cursor);
            view_data.dropdown.open = false;
            dispatch_and_apply(
                state,
                runtime,
                view_data,
                internal_tx,
                ViewCommand::Select(new_id),
            );
        }
        _ => {}
    }
}

fn open_dropdown(state: &ViewState, view_data: &mut ViewData) {
    view_data.dropdown = DropdownUiState {
        open: true,
        cursor: selected_option_index(state),
    };
}

fn option_value(state: &ViewState, index: usize) -> ReportId {
    index
        .checked_sub(1)
        .and_then(|report_index| state.reports.get(report_index))
        .map(|report| report.id.clone())
        .unwrap_or_default()
}

fn selected_option_index(state: &ViewState) -> usize {
    if state.selected_id.is_empty() {
        return 0;
    }
    state
        .reports
        .iter()
        .position(|report| report.id == state.selected_id)
        .map_or(0, |index| index + 1)
}

fn dropdown_option_labels(state: &ViewState) -> Vec<&str> {
    std::iter::once(PLACEHOLDER_OPTION)
        .chain(state.reports.iter().map(|report| report.label.as_str()))
        .collect()
}

fn dropdown_label(state: &ViewState) -> &str {
    match selected_option_index(state) {
        0 => PLACEHOLDER_OPTION,
        index => dropdown_option_labels(state)
            .get(index)
            .copied()
            .unwrap_or(PLACEHOLDER_OPTION),
    }
}

fn copy_button_label(state: &ViewState) -> &'static str {
    if state.copied { "Copied!" } else { "Copy" }
}

fn controls_text(state: &ViewState) -> String {
    let mut out = format!("▾ {}", dropdown_label(state));
    if state.has_content() {
        out.push_str(&format!("   [{}]  [Print]", copy_button_label(state)));
    }
    out
}

fn status_lines(state: &ViewState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if !state.error.is_empty() {
        lines.push(Line::from(Span::styled(
            state.error.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    if state.loading {
        lines.push(Line::from(Span::styled(
            LOADING_TEXT,
            Style::default().fg(Color::Yellow),
        )));
    }
    lines
}

fn body_view(state: &ViewState) -> BodyView<'_> {
    if state.has_content() {
        BodyView::Report {
            title: state.card_label(),
            content: &state.report_content,
        }
    } else if !state.loading {
        BodyView::Empty
    } else {
        BodyView::Blank
    }
}

fn content_line_count(state: &ViewState) -> usize {
    state.report_content.lines().count()
}

fn max_scroll(state: &ViewState) -> u16 {
    let lines = content_line_count(state).saturating_sub(1);
    u16::try_from(lines).unwrap_or(u16::MAX)
}

fn scroll_by(state: &ViewState, view_data: &mut ViewData, delta: i32) {
    let next = (i32::from(view_data.scroll) + delta).clamp(0, i32::from(max_scroll(state)));
    view_data.scroll = u16::try_from(next).unwrap_or(0);
}

fn render(frame: &mut ratatui::Frame<'_>, state: &ViewState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, layout[0]);

    let controls = Paragraph::new(controls_text(state))
        .block(Block::default().borders(Borders::ALL).title("encounter"));
    frame.render_widget(controls, layout[1]);

    frame.render_widget(Paragraph::new(status_lines(state)), layout[2]);

    match body_view(state) {
        BodyView::Report { title, content } => {
            let card = Paragraph::new(content)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(title.to_owned())
                        .style(Style::default().fg(Color::White)),
                )
                .scroll((view_data.scroll, 0));
            frame.render_widget(card, layout[3]);
        }
        BodyView::Empty => {
            let empty = Paragraph::new(Text::from(vec![
                Line::from(""),
                Line::from(EMPTY_STATE_ICON),
                Line::from(EMPTY_STATE_TEXT),
            ]))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(empty, layout[3]);
        }
        BodyView::Blank => {
            frame.render_widget(Block::default().borders(Borders::ALL), layout[3]);
        }
    }

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, layout[4]);

    if view_data.dropdown.open {
        let area = dropdown_rect(state, layout[1], frame.area());
        frame.render_widget(Clear, area);
        let lines = dropdown_option_labels(state)
            .into_iter()
            .enumerate()
            .map(|(index, label)| {
                let marker = if index == view_data.dropdown.cursor {
                    "> "
                } else {
                    "  "
                };
                let style = if index == view_data.dropdown.cursor {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(format!("{marker}{label}"), style))
            })
            .collect::<Vec<Line<'_>>>();
        let list = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("select"))
            .scroll((dropdown_scroll(view_data.dropdown.cursor, area.height), 0));
        frame.render_widget(list, area);
    }

    if view_data.help_visible {
        let area = centered_rect(60, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_header(frame: &mut ratatui::Frame<'_>, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(header_image_width())])
        .split(inner);

    let text = Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            TITLE,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(SUBTITLE),
    ]));
    frame.render_widget(text, columns[0]);

    let image = Paragraph::new(format!("[{HEADER_IMAGE_ALT}]"))
        .alignment(Alignment::Right)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(image, columns[1]);
}

fn header_image_width() -> u16 {
    u16::try_from(HEADER_IMAGE_ALT.chars().count() + 3).unwrap_or(u16::MAX)
}

fn footer_text(state: &ViewState) -> String {
    let mut hints = vec!["enter select"];
    if state.has_content() {
        hints.extend(["c copy", "p print", "j/k scroll"]);
    }
    hints.extend(["r reload", "? help", "q quit"]);
    hints.join(" · ")
}

fn dropdown_rect(state: &ViewState, anchor: Rect, screen: Rect) -> Rect {
    let wanted = u16::try_from(state.reports.len() + 3).unwrap_or(u16::MAX);
    let y = anchor.y.saturating_add(2);
    let available = screen.height.saturating_sub(y);
    Rect {
        x: anchor.x.saturating_add(1),
        y,
        width: anchor.width.saturating_sub(2).min(60),
        height: wanted.min(available),
    }
}

fn dropdown_scroll(cursor: usize, height: u16) -> u16 {
    let visible = usize::from(height.saturating_sub(2)).max(1);
    let offset = cursor.saturating_sub(visible - 1);
    u16::try_from(offset).unwrap_or(u16::MAX)
}

fn help_overlay_text() -> &'static str {
    "enter/space  open encounter list\n\
     j/k ↑/↓      move in list, scroll report\n\
     enter        choose highlighted encounter\n\
     esc          close list\n\
     c            copy report to clipboard\n\
     p            print report\n\
     r            reload report list\n\
     g/G          top/bottom of report\n\
     q            quit"
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
