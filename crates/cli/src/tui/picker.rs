//! API key picker: a masked input modal that answers the coach's `KeyPicker` requests.

use async_trait::async_trait;
use coach::{KeyPicker, validate_api_key};
use proto::ProbeError;
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::theme::THEME;

const MASK: char = '•';

/// A pending `pick()` call waiting for the user.
#[derive(Debug)]
pub struct PickerRequest {
    pub reply: oneshot::Sender<Result<String, ProbeError>>,
}

/// `KeyPicker` backed by the TUI event loop.
pub struct TuiKeyPicker {
    requests: mpsc::Sender<PickerRequest>,
}

impl TuiKeyPicker {
    pub fn new(requests: mpsc::Sender<PickerRequest>) -> Self {
        Self { requests }
    }
}

#[async_trait]
impl KeyPicker for TuiKeyPicker {
    async fn pick(&self) -> Result<String, ProbeError> {
        let (reply, answer) = oneshot::channel();
        self.requests
            .send(PickerRequest { reply })
            .await
            .map_err(|_| ProbeError::Failed("key picker is not running".to_string()))?;
        debug!("Key picker opened");
        // A dropped reply means the modal went away without an answer.
        answer.await.unwrap_or(Err(ProbeError::Cancelled))
    }
}

/// Modal state: the typed key is never shown in clear text.
#[derive(Debug, Default)]
pub struct KeyPickerModal {
    pub input: String,
    /// Byte offset into `input`.
    pub cursor_pos: usize,
    /// Validation message from the last submit.
    pub error: Option<String>,
}

impl KeyPickerModal {
    pub fn insert(&mut self, c: char) {
        self.input.insert(self.cursor_pos, c);
        self.cursor_pos += c.len_utf8();
        self.error = None;
    }

    pub fn delete(&mut self) {
        if self.cursor_pos > 0 {
            let prev = super::app::prev_boundary(&self.input, self.cursor_pos);
            self.input.drain(prev..self.cursor_pos);
            self.cursor_pos = prev;
        }
        self.error = None;
    }

    pub fn move_left(&mut self) {
        self.cursor_pos = super::app::prev_boundary(&self.input, self.cursor_pos);
    }

    pub fn move_right(&mut self) {
        self.cursor_pos = super::app::next_boundary(&self.input, self.cursor_pos);
    }

    /// Validated key, or the reason it was rejected (also kept in `error`).
    pub fn submit(&mut self) -> Result<String, String> {
        validate_api_key(&self.input).inspect_err(|reason| self.error = Some(reason.clone()))
    }

    pub fn masked(&self) -> String {
        self.input.chars().map(|_| MASK).collect()
    }

    fn cursor_column(&self) -> u16 {
        self.input[..self.cursor_pos].chars().count() as u16
    }
}

/// Renders the modal centered over `area`.
pub fn render(modal: &KeyPickerModal, frame: &mut Frame<'_>, area: Rect) {
    let [popup] = Layout::vertical([Constraint::Length(9)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Length(64)])
        .flex(Flex::Center)
        .areas(popup);

    let block = Block::default()
        .title(Span::styled(
            " Select API Key ",
            Style::default()
                .fg(THEME.accent_bright)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(THEME.border_active));
    let inner = block.inner(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    let [intro, input, error] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new(Text::from(vec![
            Line::from("Paste your Gemini API key."),
            Line::styled(
                "It is kept in memory for this session only.",
                Style::default().fg(THEME.fg_muted),
            ),
        ]))
        .wrap(Wrap { trim: false }),
        intro,
    );

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(THEME.border));
    let input_inner = input_block.inner(input);
    frame.render_widget(Paragraph::new(modal.masked()).block(input_block), input);
    frame.set_cursor_position((input_inner.x + modal.cursor_column(), input_inner.y));

    if let Some(reason) = &modal.error {
        frame.render_widget(
            Paragraph::new(Span::styled(reason.as_str(), Style::default().fg(THEME.error))),
            error,
        );
    }
}
