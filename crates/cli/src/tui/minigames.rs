//! Game boards for the four probability mini-games.

use games::bridge::SURVIVAL_BRIDGE;
use games::goal::GOAL_TARGETS;
use games::lucky_box::{self, LUCKY_BOXES, LuckyBox};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

use super::app::{Notice, TuiApp};
use super::theme::THEME;

fn percent(probability: f64) -> String {
    format!("{:.0}%", probability * 100.0)
}

/// Board title block shared by every game.
fn board(title: &str, concept: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(THEME.border))
        .title(Line::styled(
            format!(" {title} "),
            Style::default()
                .fg(THEME.title)
                .add_modifier(Modifier::BOLD),
        ))
        .title_bottom(
            Line::styled(format!(" {concept} "), Style::default().fg(THEME.card_concept))
                .right_aligned(),
        )
}

/// Splits a board into its playing area and a two-line notice strip.
fn split_board(frame: &mut Frame<'_>, area: Rect, block: Block<'static>) -> (Rect, Rect) {
    let [column] = Layout::horizontal([Constraint::Max(100)])
        .flex(Flex::Center)
        .areas(area);
    let inner = block.inner(column);
    frame.render_widget(block, column);
    let [body, notice] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(2)]).areas(inner);
    (body, notice)
}

fn render_notice(frame: &mut Frame<'_>, area: Rect, notice: Option<&Notice>) {
    let Some(notice) = notice else {
        return;
    };
    let (text, color) = match notice {
        Notice::Good(text) => (text, THEME.success),
        Notice::Bad(text) => (text, THEME.error),
        Notice::Info(text) => (text, THEME.info),
    };
    frame.render_widget(
        Paragraph::new(Span::styled(
            text.as_str(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true }),
        area,
    );
}

fn card_border(selected: bool) -> Style {
    Style::default().fg(if selected {
        THEME.border_active
    } else {
        THEME.border
    })
}

// ── Lucky Box Shop ───────────────────────────────────────────

pub fn render_lucky_box(app: &TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let (body, notice) = split_board(frame, area, board("Lucky Box Shop", "Expected Value"));
    let [intro, boxes] =
        Layout::vertical([Constraint::Length(2), Constraint::Min(0)]).areas(body);

    frame.render_widget(
        Paragraph::new(Line::styled(
            "Each box costs points. Is what's inside worth the price on average?",
            Style::default().fg(THEME.fg_dim),
        ))
        .alignment(Alignment::Center),
        intro,
    );

    let columns = Layout::horizontal(LUCKY_BOXES.iter().map(|_| Constraint::Ratio(1, 3)))
        .spacing(1)
        .split(boxes);
    let best = lucky_box::best_box().id;
    for (i, lucky) in LUCKY_BOXES.iter().enumerate() {
        let Some(&slot) = columns.get(i) else {
            break;
        };
        let lines = box_lines(lucky, app.lucky.show_expected_value, lucky.id == best);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(card_border(i == app.lucky.selected))
            .title(Line::styled(
                format!(" 🎁 {} ", lucky.name),
                Style::default()
                    .fg(THEME.card_title)
                    .add_modifier(Modifier::BOLD),
            ));
        frame.render_widget(
            Paragraph::new(Text::from(lines))
                .block(block)
                .wrap(Wrap { trim: true }),
            slot,
        );
    }

    render_notice(frame, notice, app.lucky.notice.as_ref());
}

fn box_lines(lucky: &LuckyBox, show_expected_value: bool, is_best: bool) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::styled(
            format!("Price: {} PP", lucky.price),
            Style::default().fg(THEME.warning),
        ),
        Line::from(""),
    ];
    for item in lucky.items {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<14}", item.name),
                Style::default().fg(THEME.rarity(item.rarity)),
            ),
            Span::raw(format!("{:>5} PP ", item.value)),
            Span::styled(percent(item.probability), Style::default().fg(THEME.fg_muted)),
        ]));
    }
    if show_expected_value {
        lines.push(Line::from(""));
        let ev = lucky_box::expected_value(lucky);
        let color = if ev >= 0.0 { THEME.success } else { THEME.error };
        lines.push(Line::styled(
            format!("EV: {ev:+.1} PP"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        if is_best {
            lines.push(Line::styled("★ best value", Style::default().fg(THEME.accent_bright)));
        }
    }
    lines
}

// ── Find the Thief ───────────────────────────────────────────

pub fn render_find_the_thief(app: &TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let (body, notice) =
        split_board(frame, area, board("Find the Thief", "Conditional Probability"));
    let investigation = &app.thief.investigation;
    let case = investigation.case();

    let [story, columns] =
        Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(body);
    frame.render_widget(
        Paragraph::new(Text::from(vec![
            Line::styled(
                case.title,
                Style::default().fg(THEME.fg).add_modifier(Modifier::BOLD),
            ),
            Line::styled(case.story, Style::default().fg(THEME.fg_dim)),
        ]))
        .wrap(Wrap { trim: true }),
        story,
    );

    let [suspects_area, clues_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
            .areas(columns);

    let remaining = investigation.remaining_suspects();
    let suspect_lines: Vec<Line<'_>> = case
        .suspects
        .iter()
        .enumerate()
        .map(|(i, suspect)| {
            let in_play = remaining.iter().any(|s| s.id == suspect.id);
            let suspicion = investigation.suspicion(suspect.id).unwrap_or(0.0);
            let marker = if i == app.thief.selected { "▶ " } else { "  " };
            let mut style = Style::default().fg(if in_play { THEME.fg } else { THEME.fg_muted });
            if !in_play {
                style = style.add_modifier(Modifier::CROSSED_OUT);
            }
            Line::from(vec![
                Span::styled(marker, Style::default().fg(THEME.accent_bright)),
                Span::styled(format!("{} {:<20}", suspect.avatar, suspect.name), style),
                Span::styled(percent(suspicion), Style::default().fg(THEME.warning)),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(Text::from(suspect_lines)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(THEME.border))
                .title(" Suspects (chance of guilt) "),
        ),
        suspects_area,
    );

    let mut clue_lines: Vec<Line<'_>> = investigation
        .revealed_clues()
        .into_iter()
        .enumerate()
        .map(|(i, text)| Line::from(format!("{}. {text}", i + 1)))
        .collect();
    clue_lines.push(Line::styled(
        format!("Clues left: {}", investigation.clues_left()),
        Style::default().fg(THEME.fg_muted),
    ));
    frame.render_widget(
        Paragraph::new(Text::from(clue_lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(THEME.border))
                    .title(" 🔎 Clues "),
            )
            .wrap(Wrap { trim: true }),
        clues_area,
    );

    render_notice(frame, notice, app.thief.notice.as_ref());
}

// ── Survival Bridge ──────────────────────────────────────────

pub fn render_survival_bridge(app: &TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let (body, notice) = split_board(frame, area, board("Survival Bridge", "Risk & Probability"));
    let [intro, table] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(body);

    frame.render_widget(
        Paragraph::new(Text::from(vec![
            Line::styled(
                "More adventurers means a bigger reward, and a shakier bridge.",
                Style::default().fg(THEME.fg_dim),
            ),
            Line::from(format!(
                "Sending: {}",
                "🧍".repeat(app.bridge.count as usize)
            )),
        ]))
        .alignment(Alignment::Center),
        intro,
    );

    let rows = SURVIVAL_BRIDGE.iter().map(|row| {
        let selected = row.count == app.bridge.count;
        let ev = row.expected_value();
        let style = if selected {
            Style::default()
                .fg(THEME.accent_bright)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(THEME.fg)
        };
        Row::new(vec![
            Cell::from(if selected { "▶" } else { " " }),
            Cell::from(row.count.to_string()),
            Cell::from(percent(row.probability)),
            Cell::from(format!("{:+}", row.reward)),
            Cell::from(format!("{:+}", row.penalty)),
            Cell::from(Span::styled(
                format!("{ev:+.1}"),
                Style::default().fg(if ev >= 0.0 { THEME.success } else { THEME.error }),
            )),
        ])
        .style(style)
    });
    let widths = [
        Constraint::Length(2),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
    ];
    frame.render_widget(
        Table::new(rows, widths)
            .header(
                Row::new(vec!["", "Adventurers", "Survive", "Reward", "Penalty", "EV"])
                    .style(Style::default().fg(THEME.fg_muted).add_modifier(Modifier::BOLD)),
            )
            .column_spacing(1),
        table,
    );

    render_notice(frame, notice, app.bridge.notice.as_ref());
}

// ── Goal or Miss ─────────────────────────────────────────────

pub fn render_goal_or_miss(app: &TuiApp, frame: &mut Frame<'_>, area: Rect) {
    let (body, notice) = split_board(frame, area, board("Goal or Miss!", "Success Probability"));
    let [intro, goal] =
        Layout::vertical([Constraint::Length(2), Constraint::Min(0)]).areas(body);

    frame.render_widget(
        Paragraph::new(Line::styled(
            "Aim for a corner: harder to hit, bigger reward.",
            Style::default().fg(THEME.fg_dim),
        ))
        .alignment(Alignment::Center),
        intro,
    );

    let [top, bottom] =
        Layout::vertical([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)]).areas(goal);
    for (row_index, row_area) in [top, bottom].into_iter().enumerate() {
        let cells = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(row_area);
        for (col, &cell) in cells.iter().enumerate() {
            let index = row_index * 3 + col;
            let Some(target) = GOAL_TARGETS.get(index) else {
                continue;
            };
            let shot = app
                .goal
                .last
                .as_ref()
                .filter(|shot| shot.target.id == target.id)
                .map(|shot| if shot.scored { " ⚽" } else { " ❌" })
                .unwrap_or("");
            let lines = vec![
                Line::styled(
                    format!("{}{shot}", target.name),
                    Style::default()
                        .fg(THEME.card_title)
                        .add_modifier(Modifier::BOLD),
                ),
                Line::from(format!("Chance: {}", percent(target.probability))),
                Line::styled(
                    format!("{:+} / {:+} PP", target.reward, target.penalty),
                    Style::default().fg(THEME.fg_muted),
                ),
            ];
            frame.render_widget(
                Paragraph::new(Text::from(lines))
                    .alignment(Alignment::Center)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(card_border(index == app.goal.selected)),
                    ),
                cell,
            );
        }
    }

    render_notice(frame, notice, app.goal.notice.as_ref());
}
