//! Top bar: title, earned badges, mute indicator, and the points balance.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::app::TuiApp;
use super::theme::THEME;
use crate::sound;

/// Formats a balance with thousands separators, e.g. `1,000 PP`.
pub fn format_points(points: u32) -> String {
    let digits = points.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{grouped} PP")
}

pub fn render(app: &TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(THEME.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [left, right] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(48)]).areas(inner);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            " 🎲 Chance Champions",
            Style::default()
                .fg(THEME.title)
                .add_modifier(Modifier::BOLD),
        ))),
        left,
    );

    let mut spans: Vec<Span<'_>> = app
        .ledger
        .badges()
        .iter()
        .map(|badge| Span::raw(format!("{} ", badge.info().icon)))
        .collect();
    spans.push(Span::raw(if sound::is_muted() { " 🔇 " } else { " 🔊 " }));
    spans.push(Span::styled(
        format!(" {} ", format_points(app.ledger.points())),
        Style::default()
            .fg(THEME.points_fg)
            .bg(THEME.points_bg)
            .add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(
        Paragraph::new(Line::from(spans).right_aligned()),
        right,
    );
}
