//! AI coach panel, rendered from the controller snapshot by session state.

use proto::{Role, SessionState, Turn};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::app::TuiApp;
use super::theme::THEME;

const STREAM_CURSOR: &str = "▋";
const ASSISTANT_LABEL: &str = "🤖 Pro-Bot: ";
const USER_LABEL: &str = "You: ";
const BILLING_URL: &str = "https://ai.google.dev/gemini-api/docs/billing";

pub fn render(app: &mut TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let [panel] = Layout::horizontal([Constraint::Max(100)])
        .flex(Flex::Center)
        .areas(area);
    let block = Block::default()
        .title(Line::styled(
            " AI Probability Coach ",
            Style::default()
                .fg(THEME.assistant_label)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(THEME.border));
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    match app.coach.session_state {
        SessionState::Checking => render_centered(
            frame,
            inner,
            Text::styled(
                format!("{} Checking for API Key...", app.spinner()),
                Style::default().fg(THEME.fg_muted),
            ),
        ),
        SessionState::KeyNeeded => render_action_required(app, frame, inner),
        SessionState::Ready => render_chat(app, frame, inner),
        SessionState::Error => {
            let message = app
                .coach
                .last_error
                .as_deref()
                .unwrap_or("An unknown error occurred.");
            render_centered(
                frame,
                inner,
                Text::from(vec![
                    Line::styled(message.to_string(), Style::default().fg(THEME.error)),
                    Line::from(""),
                    Line::styled("Press r to retry.", Style::default().fg(THEME.fg_muted)),
                ]),
            );
        }
    }
}

fn render_centered(frame: &mut Frame<'_>, area: Rect, text: Text<'_>) {
    let height = text.lines.len() as u16;
    let [middle] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        middle,
    );
}

fn render_action_required(app: &TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let mut lines = vec![
        Line::styled(
            "Action Required",
            Style::default()
                .fg(THEME.action_required)
                .add_modifier(Modifier::BOLD),
        ),
        Line::styled(
            "To use the AI Coach, you need to select a Gemini API key.",
            Style::default().fg(THEME.action_required),
        ),
        Line::from(""),
    ];
    if let Some(error) = &app.coach.last_error {
        lines.push(Line::styled(error.clone(), Style::default().fg(THEME.error)));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(vec![
        Span::raw("Press "),
        Span::styled(
            "Enter",
            Style::default()
                .fg(THEME.hint_key)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" to select an API key."),
    ]));
    lines.push(Line::styled(
        format!("Billing details: {BILLING_URL}"),
        Style::default().fg(THEME.fg_muted),
    ));
    render_centered(frame, area, Text::from(lines));
}

fn render_chat(app: &mut TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let [history, input] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    let lines = transcript_lines(&app.coach.transcript, app.coach.is_streaming);

    let content_height = wrapped_height(&lines, history.width);
    let max_scroll = content_height.saturating_sub(history.height);
    let scroll = app.history_scroll.min(max_scroll);
    // Keep the clamped offset so scrolling up from the bottom moves at once.
    app.history_scroll = scroll;

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        history,
    );

    let enabled = app.coach.can_send();
    let border = if enabled {
        THEME.border_active
    } else {
        THEME.fg_muted
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let input_inner = input_block.inner(input);
    let widget = if app.input.is_empty() {
        let placeholder = if enabled {
            "Ask a probability question..."
        } else {
            "AI Coach is unavailable"
        };
        Paragraph::new(Span::styled(placeholder, Style::default().fg(THEME.fg_muted)))
    } else {
        Paragraph::new(app.input.as_str())
    };
    frame.render_widget(widget.block(input_block), input);

    if enabled {
        let cursor_col = Line::from(&app.input[..app.cursor_pos]).width() as u16;
        frame.set_cursor_position((input_inner.x + cursor_col, input_inner.y));
    }
}

/// Transcript as styled lines; a streaming reply ends with a block cursor.
fn transcript_lines(transcript: &[Turn], is_streaming: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let last = transcript.len().saturating_sub(1);
    for (index, turn) in transcript.iter().enumerate() {
        lines.push(Line::from(""));
        let (label, color) = match turn.role {
            Role::User => (USER_LABEL, THEME.user_label),
            Role::Assistant => (ASSISTANT_LABEL, THEME.assistant_label),
        };
        let indent = " ".repeat(label.chars().count() + 1);

        let mut body: Vec<Line<'static>> = Vec::new();
        for (i, text) in turn.text.split('\n').enumerate() {
            if i == 0 {
                body.push(Line::from(vec![
                    Span::styled(
                        label,
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(text.to_string()),
                ]));
            } else {
                body.push(Line::from(format!("{indent}{text}")));
            }
        }

        if is_streaming
            && index == last
            && turn.role == Role::Assistant
            && let Some(line) = body.last_mut()
        {
            line.push_span(Span::styled(
                STREAM_CURSOR,
                Style::default().fg(THEME.stream_cursor),
            ));
        }
        lines.extend(body);
    }
    lines
}

/// Rows `lines` occupy when wrapped to `width` columns.
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let rows: usize = lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}
