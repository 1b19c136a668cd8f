//! Home menu: one card per game, the highlighted card opens on Enter.

use games::GAME_CARDS;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::app::TuiApp;
use super::theme::THEME;

const CARD_HEIGHT: u16 = 4;

/// Renders the welcome line and the game cards.
pub fn render(app: &TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let [column] = Layout::horizontal([Constraint::Max(80)])
        .flex(Flex::Center)
        .areas(area);

    let mut rows = vec![Constraint::Length(2)];
    rows.extend(GAME_CARDS.iter().map(|_| Constraint::Length(CARD_HEIGHT)));
    let chunks = Layout::vertical(rows).split(column);

    frame.render_widget(
        Paragraph::new(Line::styled(
            "Pick a game and learn probability by playing!",
            Style::default().fg(THEME.fg_dim),
        ))
        .alignment(Alignment::Center),
        chunks[0],
    );

    for (i, card) in GAME_CARDS.iter().enumerate() {
        let Some(&slot) = chunks.get(i + 1) else {
            break;
        };
        let selected = i == app.home_selected;
        let border = if selected {
            THEME.border_active
        } else {
            THEME.border
        };
        let marker = if selected { "▶ " } else { "  " };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(Line::from(vec![
                Span::styled(marker, Style::default().fg(THEME.accent_bright)),
                Span::styled(
                    format!("{} {} ", card.icon, card.title),
                    Style::default()
                        .fg(THEME.card_title)
                        .add_modifier(Modifier::BOLD),
                ),
            ]))
            .title_bottom(
                Line::styled(
                    format!(" {} ", card.concept),
                    Style::default().fg(THEME.card_concept),
                )
                .right_aligned(),
            );

        frame.render_widget(
            Paragraph::new(Text::styled(card.description, Style::default().fg(THEME.fg)))
                .block(block)
                .wrap(Wrap { trim: true }),
            slot,
        );
    }
}
