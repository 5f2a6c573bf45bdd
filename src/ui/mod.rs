mod theme;

use crate::app::{AppModel, CwdPrompt, Focus, QueryEditor};
use crate::domain::{SNIPPET_MAX_CHARS, SessionMessage, SessionSummary, format_snippet};
use crate::infra::RESUME_EXECUTABLE;
use humansize::{DECIMAL, format_size};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LIST_WIDTH: u16 = 48;
const LIST_SNIPPET_CHARS: usize = 100;
const EMPTY_VIEW_TEXT: &str = "No sessions match the current filters.";
const EMPTY_INDEX_TEXT: &str = "No session files could be read. Press r to retry.";

pub fn render(frame: &mut Frame, model: &AppModel) {
    let area = frame.area();
    if area.width == 0 || area.height == 0 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_search(frame, chunks[0], model);
    render_status(frame, chunks[1], model);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(LIST_WIDTH), Constraint::Min(0)])
        .split(chunks[2]);
    render_session_list(frame, body[0], model);
    render_session_detail(frame, body[1], model);

    frame.render_widget(footer_line(model), chunks[3]);

    if model.help_open {
        render_help_overlay(frame, area);
    }

    if let Some(prompt) = &model.cwd_prompt {
        render_cwd_prompt(frame, area, prompt);
    }
}

fn focus_border(active: bool) -> Style {
    if active {
        Style::default().fg(theme::FOCUS_BORDER)
    } else {
        Style::default().fg(theme::BORDER)
    }
}

fn render_search(frame: &mut Frame, area: Rect, model: &AppModel) {
    let focused = model.focus == Focus::Search && model.cwd_prompt.is_none() && !model.help_open;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_border(model.focus == Focus::Search))
        .padding(Padding::horizontal(1))
        .title("Search");
    let inner = block.inner(area);
    frame.render_widget(block, area);
    render_editor(frame, inner, &model.search, focused);
}

/// Draws a single-line editor, scrolled so the cursor stays visible.
fn render_editor(frame: &mut Frame, area: Rect, editor: &QueryEditor, show_cursor: bool) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    if editor.is_empty() && !show_cursor {
        let hint = Paragraph::new("type to search").style(Style::default().fg(theme::DIM));
        frame.render_widget(hint, area);
        return;
    }
    let cursor_col = editor_cursor_width(editor);
    let visible = area.width.saturating_sub(1) as usize;
    let offset = cursor_col.saturating_sub(visible);
    let paragraph = Paragraph::new(editor.text().to_string())
        .style(Style::default().fg(theme::FG))
        .scroll((0, offset as u16));
    frame.render_widget(paragraph, area);

    if show_cursor {
        let x = area.x.saturating_add((cursor_col - offset) as u16);
        frame.set_cursor_position((x, area.y));
    }
}

fn editor_cursor_width(editor: &QueryEditor) -> usize {
    editor
        .text()
        .chars()
        .take(editor.cursor_chars())
        .map(|ch| ch.width().unwrap_or(0))
        .sum()
}

fn render_status(frame: &mut Frame, area: Rect, model: &AppModel) {
    let status = truncate_end(&model.status_text(), area.width as usize);
    let style = if model.notice.is_some() {
        Style::default().fg(theme::NOTICE)
    } else {
        Style::default().fg(theme::MUTED)
    };
    frame.render_widget(Paragraph::new(status).style(style), area);
}

fn render_session_list(frame: &mut Frame, area: Rect, model: &AppModel) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_border(model.focus == Focus::List))
        .title("Sessions");

    if model.filtered_indices.is_empty() {
        let text = if model.index.is_empty() {
            EMPTY_INDEX_TEXT
        } else {
            EMPTY_VIEW_TEXT
        };
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(theme::DIM))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let max_width = (area.width as usize).saturating_sub(4);
    let items: Vec<ListItem> = model
        .visible_sessions()
        .map(|session| session_list_item(session, max_width))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(theme::ACCENT)
                .bg(theme::ACCENT_BG)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut state = ListState::default();
    state.select(Some(
        model
            .selected
            .min(model.filtered_indices.len().saturating_sub(1)),
    ));
    frame.render_stateful_widget(list, area, &mut state);
}

fn session_list_item(session: &SessionSummary, max_width: usize) -> ListItem<'static> {
    let headline = format!(
        "[{}] {} · {}",
        session.relative_time(),
        session.display_id(),
        session.short_path()
    );
    let cwd = format!("cwd: {}", session.display_cwd());
    let snippet = session
        .last_message
        .as_ref()
        .map(|message| format_snippet(&message.text, LIST_SNIPPET_CHARS))
        .unwrap_or_default();

    ListItem::new(vec![
        Line::from(truncate_end(&headline, max_width)),
        Line::styled(
            truncate_end(&cwd, max_width),
            Style::default().fg(theme::MUTED),
        ),
        Line::styled(
            truncate_end(&snippet, max_width),
            Style::default().fg(theme::DIM),
        ),
    ])
}

fn render_session_detail(frame: &mut Frame, area: Rect, model: &AppModel) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER))
        .padding(Padding::horizontal(1))
        .title("Details");

    let text = model
        .selected_session()
        .map(build_detail_text)
        .unwrap_or_default();
    let paragraph = Paragraph::new(text).wrap(Wrap { trim: false }).block(block);
    frame.render_widget(paragraph, area);
}

fn build_detail_text(session: &SessionSummary) -> Text<'static> {
    let label = Style::default().fg(theme::MUTED);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Session: ", label),
            Span::styled(
                session.session_id.clone(),
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        message_line("First", session.first_message.as_ref()),
        Line::from(""),
        message_line("Last", session.last_message.as_ref()),
        Line::from(""),
        Line::from(vec![
            Span::styled("Path: ", label),
            Span::raw(session.short_path()),
        ]),
        Line::from(vec![
            Span::styled("Modified: ", label),
            Span::raw(format!(
                "{} ({})",
                format_timestamp(session.modified_at),
                session.relative_time()
            )),
        ]),
        Line::from(vec![
            Span::styled("Size: ", label),
            Span::raw(format_size(session.file_size_bytes, DECIMAL)),
        ]),
    ];

    let cwds = session.ordered_cwds();
    if cwds.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Working directories: ", label),
            Span::styled("—", Style::default().fg(theme::DIM)),
        ]));
    } else {
        lines.push(Line::styled("Working directories:", label));
        lines.extend(cwds.into_iter().map(|cwd| Line::from(format!("  {cwd}"))));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Resume command: ", label),
        Span::raw(format!("{RESUME_EXECUTABLE} resume {}", session.resume_target())),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Log file: ", label),
        Span::styled(
            session.source_path.display().to_string(),
            Style::default().fg(theme::DIM),
        ),
    ]));

    Text::from(lines)
}

fn message_line(label: &str, message: Option<&SessionMessage>) -> Line<'static> {
    let label_style = Style::default().fg(theme::MUTED);
    match message {
        Some(message) => Line::from(vec![
            Span::styled(format!("{label} ({}): ", message.role_label()), label_style),
            Span::raw(format_snippet(&message.text, SNIPPET_MAX_CHARS)),
        ]),
        None => Line::from(vec![
            Span::styled(format!("{label}: "), label_style),
            Span::styled("—", Style::default().fg(theme::DIM)),
        ]),
    }
}

fn format_timestamp(moment: SystemTime) -> String {
    OffsetDateTime::from(moment)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

fn footer_line(model: &AppModel) -> Paragraph<'static> {
    let text = match model.focus {
        Focus::Search => {
            "Type to search  Tab/↓=list  Enter=resume  Ctrl+F=cwd  Ctrl+G=global  Ctrl+S=sort  Ctrl+O=order  Ctrl+A=match  Ctrl+R=refresh  F1=help  Ctrl+C=quit"
        }
        Focus::List => {
            "↑/↓=move  Enter=resume  /=search  f=cwd  g=global  s=sort  o=order  a=match  r=refresh  ?=help  q=quit"
        }
    };
    Paragraph::new(text).style(Style::default().fg(theme::DIM))
}

fn render_cwd_prompt(frame: &mut Frame, area: Rect, prompt: &CwdPrompt) {
    let width = area.width.saturating_sub(4).min(80);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(3) / 2,
        width,
        height: 3.min(area.height),
    };
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::FOCUS_BORDER))
        .padding(Padding::horizontal(1))
        .title("Working directory (Enter=apply, empty=any, Esc=cancel)");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);
    render_editor(frame, inner, &prompt.editor, true);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup);

    let text = vec![
        Line::from("Search"),
        Line::from("  - Type to filter; every token must match (ALL) or any may (ANY)"),
        Line::from("  - Esc: clear query · Ctrl+U: clear · Ctrl+W: delete word"),
        Line::from("  - Tab or ↓: move to the list"),
        Line::from(""),
        Line::from("List"),
        Line::from("  - ↑/↓, PgUp/PgDn, Home/End: move selection"),
        Line::from("  - / or Esc: back to search"),
        Line::from("  - Enter: resume the selected session with `codex resume`"),
        Line::from(""),
        Line::from("Filters and sorting (letter keys in the list, Ctrl+key anywhere)"),
        Line::from("  - f / c / Ctrl+F: set working-directory filter"),
        Line::from("  - g / Ctrl+G: toggle global vs last working directory"),
        Line::from("  - s / Ctrl+S: cycle sort key (time, path, id)"),
        Line::from("  - o / Ctrl+O: flip sort order"),
        Line::from("  - a / Ctrl+A: toggle ALL / ANY matching"),
        Line::from("  - r / Ctrl+R: re-read session files"),
        Line::from(""),
        Line::from("Global"),
        Line::from("  - Ctrl+C or Ctrl+Q: quit (q in the list)"),
        Line::from("  - F1 or ?: toggle this help"),
    ];

    let paragraph = Paragraph::new(text).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .padding(Padding::horizontal(1))
            .title("Help (any key to close)"),
    );
    frame.render_widget(paragraph, popup);
}

fn truncate_end(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let ellipsis = "…";
    let available = max_width.saturating_sub(UnicodeWidthStr::width(ellipsis));
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let width = ch.width().unwrap_or(0);
        if used + width > available {
            break;
        }
        used += width;
        out.push(ch);
    }
    out.push_str(ellipsis);
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
