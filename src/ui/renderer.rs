//! Frame composition for the chat screen.
//!
//! The screen is a fixed sidebar on the left and, on the right, the
//! transcript, the input box and a one-line status bar. Overlays and the
//! preprompt editor are drawn as centered popups on top.

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::core::app::{App, Overlay, PrepromptEditor};
use crate::core::message::{Message, TranscriptRole};
use crate::core::mode::Mode;

pub const SIDEBAR_WIDTH: u16 = 28;
const MAX_INPUT_LINES: usize = 6;

pub fn ui(f: &mut Frame, app: &App) {
    let [sidebar_area, main_area] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .areas(f.area());

    let input_height = app.input.line_count().clamp(1, MAX_INPUT_LINES) as u16 + 2;
    let [transcript_area, input_area, status_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .areas(main_area);

    render_sidebar(f, app, sidebar_area);
    render_transcript(f, app, transcript_area);
    render_input(f, app, input_area);
    render_status(f, app, status_area);

    if let Some(overlay) = &app.overlay {
        render_overlay(f, overlay);
    }
    if let Some(editor) = &app.editor {
        render_editor(f, editor);
    }
}

fn mode_color(mode: Mode) -> Color {
    match mode {
        Mode::Typing => Color::Green,
        Mode::Submit => Color::Yellow,
        Mode::Sidebar => Color::Cyan,
        Mode::ModelPicker | Mode::Settings => Color::Magenta,
    }
}

fn render_sidebar(f: &mut Frame, app: &App, area: Rect) {
    let sidebar = &app.sidebar;
    let border_style = if sidebar.is_focused() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut lines = vec![
        Line::from(Span::styled(
            sidebar.mode_label().to_string(),
            Style::default()
                .fg(mode_color(app.mode))
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];
    let highlighted = sidebar.highlighted();
    for (index, item) in sidebar.items().iter().enumerate() {
        let style = if highlighted == Some(index) {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!(" {} ", item.label), style)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title("l4m");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Builds the transcript lines. The spinner stands in for the assistant entry
/// of the active stream until its first text arrives.
pub fn build_transcript_lines(app: &App) -> Vec<Line<'static>> {
    let spinner = app
        .stream
        .active()
        .map(|handle| handle.assistant_index())
        .zip(app.stream.spinner_frame());

    let mut lines = Vec::new();
    for (index, message) in app.session.messages().iter().enumerate() {
        if message.role == TranscriptRole::System {
            continue;
        }
        let body = match spinner {
            Some((spinner_index, frame)) if spinner_index == index && message.content.is_empty() => {
                frame.to_string()
            }
            _ => message.content.clone(),
        };
        push_message_lines(&mut lines, message, &body);
        lines.push(Line::default());
    }
    lines
}

fn push_message_lines(lines: &mut Vec<Line<'static>>, message: &Message, body: &str) {
    let (prefix, prefix_style, body_style) = match message.role {
        TranscriptRole::User => (
            Some("You: "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Cyan),
        ),
        TranscriptRole::Assistant => (None, Style::default(), Style::default()),
        TranscriptRole::AppInfo => (
            None,
            Style::default(),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        ),
        TranscriptRole::AppError => (None, Style::default(), Style::default().fg(Color::Red)),
        TranscriptRole::System => (None, Style::default(), Style::default().fg(Color::DarkGray)),
    };

    let body_lines: Vec<&str> = body.split('\n').collect();
    let last = body_lines.len().saturating_sub(1);
    for (i, text) in body_lines.into_iter().enumerate() {
        let mut spans = Vec::new();
        if i == 0 {
            if let Some(prefix) = prefix {
                spans.push(Span::styled(prefix, prefix_style));
            }
        }
        spans.push(Span::styled(text.to_string(), body_style));
        if i == last && message.is_incomplete() {
            spans.push(Span::styled(
                " [incomplete]",
                Style::default().add_modifier(Modifier::DIM),
            ));
        }
        lines.push(Line::from(spans));
    }
}

/// Rows a set of lines occupies once wrapped to `width` columns.
pub fn wrapped_height(lines: &[Line<'_>], width: u16) -> usize {
    let width = usize::from(width.max(1));
    lines
        .iter()
        .map(|line| {
            let line_width: usize = line
                .spans
                .iter()
                .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
                .sum();
            line_width.div_ceil(width).max(1)
        })
        .sum()
}

fn render_transcript(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        "{} • RAG {} • Logging: {}",
        app.session.model(),
        if app.rag.enabled { "on" } else { "off" },
        app.logging.status_string()
    );
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);

    let lines = build_transcript_lines(app);
    let total = wrapped_height(&lines, inner.width);
    let scroll = total.saturating_sub(usize::from(inner.height));
    let scroll = u16::try_from(scroll).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

fn input_title(mode: Mode) -> &'static str {
    match mode {
        Mode::Typing => "Message (Enter to send, Alt+Enter for newline, Esc to leave)",
        Mode::Submit => "Message (Enter to send, t to type, s for sidebar, q to quit)",
        _ => "Message",
    }
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.input.is_focused() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(input_title(app.mode));
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(app.input.textarea(), inner);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let line = match &app.status {
        Some(status) => Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        )),
        None if app.mode.is_overlay() => Line::from(Span::styled(
            format!(
                "{} • ↑/↓ to move • Enter to choose • Esc to close",
                app.mode.label()
            ),
            Style::default().fg(Color::DarkGray),
        )),
        None => Line::from(Span::styled(
            format!("{} • Ctrl+C to quit", app.mode.label()),
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

fn render_overlay(f: &mut Frame, overlay: &Overlay) {
    let area = centered_rect(f.area(), 50, 60);
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(overlay.kind.title());

    if overlay.loading {
        f.render_widget(Paragraph::new("Loading models…").block(block), area);
        return;
    }
    if overlay.list.is_empty() {
        f.render_widget(Paragraph::new("Nothing to choose from").block(block), area);
        return;
    }

    let items: Vec<ListItem> = overlay
        .list
        .items()
        .iter()
        .map(|item| ListItem::new(item.clone()))
        .collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(overlay.list.cursor()));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_editor(f: &mut Frame, editor: &PrepromptEditor) {
    let area = centered_rect(f.area(), 80, 70);
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title("Edit preprompt (Ctrl+S to save, Esc to cancel)");
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(editor.textarea(), inner);
}
