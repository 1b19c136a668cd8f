//! TUI application state, rendering, and input handling.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use games::bridge::{self, CrossingOutcome, TOTAL_ADVENTURERS};
use games::detective::{GAME_CASES, Investigation, Verdict};
use games::goal::{self, GOAL_TARGETS, ShotOutcome};
use games::lucky_box::{self, BoxOutcome, LUCKY_BOXES};
use games::{BadgeType, GAME_CARDS, Game, PointsLedger};
use proto::{CoachSnapshot, GameError, ProbeError, SessionState};
use rand::rngs::StdRng;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use tracing::debug;

use super::action::{Action, Command, Direction};
use super::picker::KeyPickerModal;
use super::theme::THEME;
use super::{coach, header, home, minigames, picker};
use crate::sound::{self, SoundKind};

/// Spinner animation frames (Braille pattern).
pub const SPINNER: &[char] = &['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];

/// Goal targets per row.
const GOAL_COLUMNS: usize = 3;

// ─── Data types ──────────────────────────────────────────────

/// Which view fills the main area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Home,
    LuckyBox,
    FindTheThief,
    SurvivalBridge,
    GoalOrMiss,
    Coach,
}

impl From<Game> for Screen {
    fn from(game: Game) -> Self {
        match game {
            Game::LuckyBox => Screen::LuckyBox,
            Game::FindTheThief => Screen::FindTheThief,
            Game::SurvivalBridge => Screen::SurvivalBridge,
            Game::GoalOrMiss => Screen::GoalOrMiss,
            Game::AiCoach => Screen::Coach,
        }
    }
}

/// Result line shown under a game board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Good(String),
    Bad(String),
    Info(String),
}

#[derive(Debug, Default)]
pub struct LuckyBoxState {
    pub selected: usize,
    pub show_expected_value: bool,
    pub last: Option<BoxOutcome>,
    pub notice: Option<Notice>,
}

#[derive(Debug)]
pub struct ThiefState {
    pub investigation: Investigation,
    pub selected: usize,
    pub verdict: Option<Verdict>,
    pub notice: Option<Notice>,
}

impl Default for ThiefState {
    fn default() -> Self {
        Self {
            investigation: Investigation::new(&GAME_CASES[0]),
            selected: 0,
            verdict: None,
            notice: None,
        }
    }
}

#[derive(Debug)]
pub struct BridgeState {
    /// Adventurers in the next crossing, 1..=TOTAL_ADVENTURERS.
    pub count: u32,
    pub last: Option<CrossingOutcome>,
    pub notice: Option<Notice>,
}

impl Default for BridgeState {
    fn default() -> Self {
        Self {
            count: 1,
            last: None,
            notice: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct GoalState {
    /// Index into `GOAL_TARGETS`.
    pub selected: usize,
    pub last: Option<ShotOutcome>,
    pub notice: Option<Notice>,
}

// ─── TuiApp ──────────────────────────────────────────────────

/// Full state for the TUI session.
pub struct TuiApp {
    pub screen: Screen,
    /// Points and badges shared by every game.
    pub ledger: PointsLedger,
    rng: StdRng,
    /// Highlighted card on the home menu.
    pub home_selected: usize,
    pub lucky: LuckyBoxState,
    pub thief: ThiefState,
    pub bridge: BridgeState,
    pub goal: GoalState,
    /// Latest coach controller state.
    pub coach: CoachSnapshot,
    /// Current text typed in the coach input (not yet submitted).
    pub input: String,
    /// Cursor position within `input` (byte offset).
    pub cursor_pos: usize,
    /// Vertical scroll offset for the coach transcript.
    pub history_scroll: u16,
    /// Open while the coach waits for an API key.
    pub key_picker: Option<KeyPickerModal>,
    /// Spinner animation tick counter.
    pub spinner_tick: u8,
    /// Whether the user requested exit.
    pub should_quit: bool,
}

impl TuiApp {
    /// Create a new TUI application state.
    pub fn new(starting_points: u32, rng: StdRng) -> Self {
        Self {
            screen: Screen::Home,
            ledger: PointsLedger::new(starting_points),
            rng,
            home_selected: 0,
            lucky: LuckyBoxState::default(),
            thief: ThiefState::default(),
            bridge: BridgeState::default(),
            goal: GoalState::default(),
            coach: CoachSnapshot::default(),
            input: String::new(),
            cursor_pos: 0,
            history_scroll: 0,
            key_picker: None,
            spinner_tick: 0,
            should_quit: false,
        }
    }

    /// Take the current input and reset it.
    pub fn take_input(&mut self) -> String {
        self.cursor_pos = 0;
        std::mem::take(&mut self.input)
    }

    /// Pin the coach transcript to its last line.
    pub fn scroll_to_bottom(&mut self) {
        self.history_scroll = u16::MAX;
    }

    pub fn spinner(&self) -> char {
        SPINNER[(self.spinner_tick as usize) % SPINNER.len()]
    }

    /// Coach input accepts text only with a live session and no reply streaming.
    pub fn coach_input_enabled(&self) -> bool {
        self.screen == Screen::Coach && self.coach.can_send()
    }

    // ── Input handling ───────────────────────────────────────

    /// Handle a keyboard event.
    pub fn handle_key(&mut self, key: KeyEvent) -> Command {
        match self.action_for_key(key) {
            Some(action) => self.update(action),
            None => Command::None,
        }
    }

    fn action_for_key(&self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Action::Quit),
                KeyCode::Char('k') if self.screen == Screen::Coach => Some(Action::ChangeKey),
                _ => None,
            };
        }

        if self.key_picker.is_some() {
            return match key.code {
                KeyCode::Esc => Some(Action::CancelKeyPicker),
                KeyCode::Enter => Some(Action::SubmitKeyPicker),
                KeyCode::Backspace => Some(Action::DeleteChar),
                KeyCode::Left => Some(Action::MoveCursorLeft),
                KeyCode::Right => Some(Action::MoveCursorRight),
                KeyCode::Char(c) => Some(Action::InsertChar(c)),
                _ => None,
            };
        }

        match self.screen {
            Screen::Home => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
                KeyCode::Char('m') => Some(Action::ToggleMute),
                KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Confirm),
                code => direction_for(code).map(Action::Move),
            },
            Screen::Coach => self.coach_action_for(key.code),
            screen => match key.code {
                KeyCode::Esc | KeyCode::Backspace => Some(Action::GoBack),
                KeyCode::Char('m') => Some(Action::ToggleMute),
                KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Confirm),
                KeyCode::Char('n') => Some(Action::NewRound),
                KeyCode::Char('e') if screen == Screen::LuckyBox => {
                    Some(Action::ToggleExpectedValue)
                }
                KeyCode::Char('c') if screen == Screen::FindTheThief => Some(Action::RevealClue),
                code => direction_for(code).map(Action::Move),
            },
        }
    }

    fn coach_action_for(&self, code: KeyCode) -> Option<Action> {
        if code == KeyCode::Esc {
            return Some(Action::GoBack);
        }
        match self.coach.session_state {
            SessionState::Checking => None,
            SessionState::KeyNeeded => match code {
                KeyCode::Enter => Some(Action::SelectKey),
                KeyCode::Char('m') => Some(Action::ToggleMute),
                _ => None,
            },
            SessionState::Error => match code {
                KeyCode::Char('r') => Some(Action::RetryCoach),
                KeyCode::Char('m') => Some(Action::ToggleMute),
                _ => None,
            },
            SessionState::Ready => match code {
                KeyCode::Enter => Some(Action::SubmitInput),
                KeyCode::Backspace => Some(Action::DeleteChar),
                KeyCode::Left => Some(Action::MoveCursorLeft),
                KeyCode::Right => Some(Action::MoveCursorRight),
                KeyCode::Up => Some(Action::ScrollUp(1)),
                KeyCode::Down => Some(Action::ScrollDown(1)),
                KeyCode::PageUp => Some(Action::ScrollUp(10)),
                KeyCode::PageDown => Some(Action::ScrollDown(10)),
                KeyCode::Char(c) => Some(Action::InsertChar(c)),
                _ => None,
            },
        }
    }

    // ── Update ───────────────────────────────────────────────

    /// Apply `action` and return the side effect the event loop must run.
    pub fn update(&mut self, action: Action) -> Command {
        match action {
            Action::InsertChar(c) => {
                if let Some(picker) = self.key_picker.as_mut() {
                    picker.insert(c);
                } else if self.coach_input_enabled() {
                    self.input.insert(self.cursor_pos, c);
                    self.cursor_pos += c.len_utf8();
                }
                Command::None
            }
            Action::DeleteChar => {
                if let Some(picker) = self.key_picker.as_mut() {
                    picker.delete();
                } else if self.coach_input_enabled() && self.cursor_pos > 0 {
                    let prev = prev_boundary(&self.input, self.cursor_pos);
                    self.input.drain(prev..self.cursor_pos);
                    self.cursor_pos = prev;
                }
                Command::None
            }
            Action::MoveCursorLeft => {
                if let Some(picker) = self.key_picker.as_mut() {
                    picker.move_left();
                } else if self.coach_input_enabled() {
                    self.cursor_pos = prev_boundary(&self.input, self.cursor_pos);
                }
                Command::None
            }
            Action::MoveCursorRight => {
                if let Some(picker) = self.key_picker.as_mut() {
                    picker.move_right();
                } else if self.coach_input_enabled() {
                    self.cursor_pos = next_boundary(&self.input, self.cursor_pos);
                }
                Command::None
            }
            Action::SubmitInput => {
                if !self.coach_input_enabled() || self.input.trim().is_empty() {
                    return Command::None;
                }
                let message = self.take_input();
                debug!(message_len = message.len(), "Coach message submitted");
                sound::play_sound(SoundKind::Click);
                self.scroll_to_bottom();
                Command::SendToCoach(message)
            }

            Action::Move(direction) => {
                self.move_selection(direction);
                Command::None
            }
            Action::Confirm => self.confirm(),
            Action::OpenScreen(screen) => self.open_screen(screen),
            Action::GoBack => self.go_back(),
            Action::ScrollUp(n) => {
                self.history_scroll = self.history_scroll.saturating_sub(n);
                Command::None
            }
            Action::ScrollDown(n) => {
                self.history_scroll = self.history_scroll.saturating_add(n);
                Command::None
            }

            Action::ToggleExpectedValue => {
                self.lucky.show_expected_value = !self.lucky.show_expected_value;
                sound::play_sound(SoundKind::Click);
                Command::None
            }
            Action::RevealClue => {
                self.reveal_clue();
                Command::None
            }
            Action::NewRound => {
                self.new_round();
                Command::None
            }

            Action::CoachChanged(snapshot) => {
                let transcript_changed = snapshot.transcript != self.coach.transcript;
                self.coach = snapshot;
                if transcript_changed {
                    self.scroll_to_bottom();
                }
                Command::None
            }
            Action::SelectKey => {
                sound::play_sound(SoundKind::Click);
                Command::SelectKey
            }
            Action::RetryCoach => {
                sound::play_sound(SoundKind::Click);
                Command::RetryCoach
            }
            Action::ChangeKey => {
                if self.coach.session_state != SessionState::Ready || self.coach.is_streaming {
                    return Command::None;
                }
                self.take_input();
                Command::ResetCoach
            }

            Action::OpenKeyPicker => {
                self.key_picker = Some(KeyPickerModal::default());
                Command::None
            }
            Action::SubmitKeyPicker => {
                let Some(picker) = self.key_picker.as_mut() else {
                    return Command::None;
                };
                match picker.submit() {
                    Ok(key) => {
                        self.key_picker = None;
                        Command::ResolveKeyPicker(Ok(key))
                    }
                    Err(_) => {
                        sound::play_sound(SoundKind::Thud);
                        Command::None
                    }
                }
            }
            Action::CancelKeyPicker => {
                if self.key_picker.take().is_none() {
                    return Command::None;
                }
                Command::ResolveKeyPicker(Err(ProbeError::Cancelled))
            }

            Action::Tick => {
                self.spinner_tick = self.spinner_tick.wrapping_add(1);
                Command::None
            }
            Action::ToggleMute => {
                let muted = sound::toggle_mute();
                debug!(muted, "Sound toggled");
                Command::None
            }
            Action::Quit => {
                self.should_quit = true;
                if self.screen == Screen::Coach {
                    Command::CloseCoach
                } else {
                    Command::None
                }
            }
        }
    }

    fn open_screen(&mut self, screen: Screen) -> Command {
        sound::play_sound(SoundKind::Click);
        self.screen = screen;
        debug!(screen = ?screen, "Screen opened");
        if screen == Screen::Coach {
            self.coach = CoachSnapshot::default();
            self.take_input();
            self.history_scroll = 0;
            return Command::OpenCoach;
        }
        Command::None
    }

    /// Back to the home menu; leaving the coach unmounts its controller.
    fn go_back(&mut self) -> Command {
        sound::play_sound(SoundKind::Click);
        let leaving = std::mem::replace(&mut self.screen, Screen::Home);
        if leaving == Screen::Coach {
            self.key_picker = None;
            self.take_input();
            return Command::CloseCoach;
        }
        Command::None
    }

    fn move_selection(&mut self, direction: Direction) {
        use Direction::*;
        match self.screen {
            Screen::Home => {
                self.home_selected = step(self.home_selected, GAME_CARDS.len(), direction);
            }
            Screen::LuckyBox => {
                self.lucky.selected = step(self.lucky.selected, LUCKY_BOXES.len(), direction);
            }
            Screen::FindTheThief => {
                let suspects = self.thief.investigation.case().suspects.len();
                self.thief.selected = step(self.thief.selected, suspects, direction);
            }
            Screen::SurvivalBridge => {
                self.bridge.count = match direction {
                    Up | Right => (self.bridge.count + 1).min(TOTAL_ADVENTURERS),
                    Down | Left => self.bridge.count.saturating_sub(1).max(1),
                };
            }
            Screen::GoalOrMiss => {
                let row = self.goal.selected / GOAL_COLUMNS;
                let col = self.goal.selected % GOAL_COLUMNS;
                let rows = GOAL_TARGETS.len() / GOAL_COLUMNS;
                let (row, col) = match direction {
                    Up => (row.saturating_sub(1), col),
                    Down => ((row + 1).min(rows - 1), col),
                    Left => (row, col.saturating_sub(1)),
                    Right => (row, (col + 1).min(GOAL_COLUMNS - 1)),
                };
                self.goal.selected = row * GOAL_COLUMNS + col;
            }
            Screen::Coach => {}
        }
    }

    fn confirm(&mut self) -> Command {
        match self.screen {
            Screen::Home => {
                let screen = Screen::from(GAME_CARDS[self.home_selected].id);
                self.open_screen(screen)
            }
            Screen::LuckyBox => {
                self.open_selected_box();
                Command::None
            }
            Screen::FindTheThief => {
                self.accuse_selected();
                Command::None
            }
            Screen::SurvivalBridge => {
                self.cross_bridge();
                Command::None
            }
            Screen::GoalOrMiss => {
                self.take_shot();
                Command::None
            }
            Screen::Coach => Command::None,
        }
    }

    // ── Games ────────────────────────────────────────────────

    fn open_selected_box(&mut self) {
        let id = LUCKY_BOXES[self.lucky.selected].id;
        sound::play_sound(SoundKind::Swoosh);
        match lucky_box::open_box(&mut self.ledger, id, &mut self.rng) {
            Ok(outcome) => {
                let won = outcome.net >= 0;
                let text = format!(
                    "You got {} worth {} PP (net {:+} PP).{}",
                    outcome.item.name,
                    outcome.item.value,
                    outcome.net,
                    badge_suffix(&outcome.new_badges)
                );
                self.lucky.notice = Some(if won {
                    Notice::Good(text)
                } else {
                    Notice::Bad(text)
                });
                celebrate(&outcome.new_badges, won);
                self.lucky.last = Some(outcome);
            }
            Err(err) => self.lucky.notice = Some(game_error_notice(&err)),
        }
    }

    fn reveal_clue(&mut self) {
        match self.thief.investigation.reveal_next_clue() {
            Ok(_) => {
                sound::play_sound(SoundKind::Click);
                let remaining = self.thief.investigation.remaining_suspects().len();
                self.thief.notice = Some(Notice::Info(format!(
                    "{remaining} suspect(s) still fit the evidence."
                )));
            }
            Err(GameError::NoCluesLeft) => {
                sound::play_sound(SoundKind::Thud);
                self.thief.notice = Some(Notice::Info(
                    "No clues left. Time to make your accusation!".to_string(),
                ));
            }
            Err(err) => self.thief.notice = Some(game_error_notice(&err)),
        }
    }

    fn accuse_selected(&mut self) {
        let case = self.thief.investigation.case();
        let Some(suspect) = case.suspects.get(self.thief.selected) else {
            return;
        };
        match self.thief.investigation.accuse(&mut self.ledger, suspect.id) {
            Ok(verdict) => {
                self.thief.notice = Some(if verdict.correct {
                    Notice::Good(format!(
                        "Case closed! {} was the thief. {:+} PP.{}",
                        verdict.guilty.name,
                        verdict.points_delta,
                        badge_suffix(&verdict.new_badges)
                    ))
                } else {
                    Notice::Bad(format!(
                        "Wrong suspect! It was {}. {:+} PP.",
                        verdict.guilty.name, verdict.points_delta
                    ))
                });
                celebrate(&verdict.new_badges, verdict.correct);
                self.thief.verdict = Some(verdict);
            }
            Err(err) => self.thief.notice = Some(game_error_notice(&err)),
        }
    }

    fn cross_bridge(&mut self) {
        match bridge::cross(&mut self.ledger, self.bridge.count, &mut self.rng) {
            Ok(outcome) => {
                self.bridge.notice = Some(if outcome.success {
                    Notice::Good(format!(
                        "All {} adventurers made it across! {:+} PP.{}",
                        outcome.row.count,
                        outcome.delta,
                        badge_suffix(&outcome.new_badges)
                    ))
                } else {
                    Notice::Bad(format!("The bridge gave way! {:+} PP.", outcome.delta))
                });
                if outcome.success {
                    celebrate(&outcome.new_badges, true);
                } else {
                    sound::play_sound(SoundKind::Thud);
                }
                self.bridge.last = Some(outcome);
            }
            Err(err) => self.bridge.notice = Some(game_error_notice(&err)),
        }
    }

    fn take_shot(&mut self) {
        let target_id = GOAL_TARGETS[self.goal.selected].id;
        sound::play_sound(SoundKind::Swoosh);
        match goal::shoot(&mut self.ledger, target_id, &mut self.rng) {
            Ok(outcome) => {
                self.goal.notice = Some(if outcome.scored {
                    Notice::Good(format!(
                        "GOAL! {:+} PP.{}",
                        outcome.delta,
                        badge_suffix(&outcome.new_badges)
                    ))
                } else {
                    Notice::Bad(format!("Saved by the keeper! {:+} PP.", outcome.delta))
                });
                celebrate(&outcome.new_badges, outcome.scored);
                self.goal.last = Some(outcome);
            }
            Err(err) => self.goal.notice = Some(game_error_notice(&err)),
        }
    }

    fn new_round(&mut self) {
        match self.screen {
            Screen::LuckyBox => {
                self.lucky.last = None;
                self.lucky.notice = None;
            }
            Screen::FindTheThief => self.thief = ThiefState::default(),
            Screen::SurvivalBridge => {
                self.bridge.last = None;
                self.bridge.notice = None;
            }
            Screen::GoalOrMiss => {
                self.goal.last = None;
                self.goal.notice = None;
            }
            Screen::Home | Screen::Coach => return,
        }
        sound::play_sound(SoundKind::Click);
    }

    // ── Rendering ────────────────────────────────────────────

    /// Render the entire TUI into the given frame.
    pub fn render(&mut self, frame: &mut Frame<'_>) {
        let area = frame.area();

        // Layout: header(3) | body(fill) | hints(1)
        let chunks = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

        header::render(self, frame, chunks[0]);
        match self.screen {
            Screen::Home => home::render(self, frame, chunks[1]),
            Screen::LuckyBox => minigames::render_lucky_box(self, frame, chunks[1]),
            Screen::FindTheThief => minigames::render_find_the_thief(self, frame, chunks[1]),
            Screen::SurvivalBridge => minigames::render_survival_bridge(self, frame, chunks[1]),
            Screen::GoalOrMiss => minigames::render_goal_or_miss(self, frame, chunks[1]),
            Screen::Coach => coach::render(self, frame, chunks[1]),
        }
        self.render_hints(frame, chunks[2]);

        if let Some(modal) = &self.key_picker {
            picker::render(modal, frame, area);
        }
    }

    /// Key bindings for the current view.
    pub fn hints(&self) -> Vec<(&'static str, &'static str)> {
        if self.key_picker.is_some() {
            return vec![("enter", "confirm"), ("esc", "cancel")];
        }
        match self.screen {
            Screen::Home => vec![("↑↓", "choose"), ("enter", "play"), ("m", "mute"), ("q", "quit")],
            Screen::LuckyBox => vec![
                ("←→", "choose box"),
                ("enter", "buy"),
                ("e", "expected value"),
                ("esc", "back"),
            ],
            Screen::FindTheThief => vec![
                ("↑↓", "suspect"),
                ("c", "clue"),
                ("enter", "accuse"),
                ("n", "new case"),
                ("esc", "back"),
            ],
            Screen::SurvivalBridge => vec![
                ("↑↓", "adventurers"),
                ("enter", "cross"),
                ("esc", "back"),
            ],
            Screen::GoalOrMiss => vec![("arrows", "aim"), ("enter", "shoot"), ("esc", "back")],
            Screen::Coach => match self.coach.session_state {
                SessionState::Checking => vec![("esc", "back")],
                SessionState::KeyNeeded => vec![("enter", "select API key"), ("esc", "back")],
                SessionState::Error => vec![("r", "retry"), ("esc", "back")],
                SessionState::Ready if self.coach.is_streaming => vec![("esc", "back")],
                SessionState::Ready => vec![
                    ("enter", "send"),
                    ("↑↓", "scroll"),
                    ("ctrl+k", "change key"),
                    ("esc", "back"),
                ],
            },
        }
    }

    fn render_hints(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut spans = Vec::new();
        if self.screen == Screen::Coach
            && (self.coach.is_streaming || self.coach.session_state == SessionState::Checking)
        {
            spans.push(Span::styled(
                format!(" {} ", self.spinner()),
                Style::default().fg(THEME.spinner),
            ));
        } else {
            spans.push(Span::raw(" "));
        }
        for (key, desc) in self.hints() {
            spans.push(Span::styled(
                format!("{key} "),
                Style::default()
                    .fg(THEME.hint_key)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!("{desc}  "),
                Style::default().fg(THEME.hint_desc),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

// ─── Helpers ─────────────────────────────────────────────────

fn direction_for(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('k') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('h') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('l') => Some(Direction::Right),
        _ => None,
    }
}

/// Moves a list cursor one step, clamped to `0..len`.
fn step(index: usize, len: usize, direction: Direction) -> usize {
    match direction {
        Direction::Up | Direction::Left => index.saturating_sub(1),
        Direction::Down | Direction::Right => (index + 1).min(len.saturating_sub(1)),
    }
}

pub(crate) fn prev_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .last()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

pub(crate) fn next_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

fn badge_suffix(badges: &[BadgeType]) -> String {
    badges
        .iter()
        .map(|badge| format!(" New badge: {} {badge}!", badge.info().icon))
        .collect()
}

fn celebrate(new_badges: &[BadgeType], success: bool) {
    let kind = if !new_badges.is_empty() {
        SoundKind::Win
    } else if success {
        SoundKind::Success
    } else {
        SoundKind::Failure
    };
    sound::play_sound(kind);
}

fn game_error_notice(err: &GameError) -> Notice {
    sound::play_sound(SoundKind::Thud);
    match err {
        GameError::InsufficientPoints { needed, available } => Notice::Bad(format!(
            "Not enough points: you need {needed} PP but have {available} PP."
        )),
        GameError::CaseClosed => {
            Notice::Info("This case is closed. Press n for a new case.".to_string())
        }
        other => Notice::Bad(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proto::Turn;
    use rand::SeedableRng;
    use ratatui::{Terminal, backend::TestBackend};

    fn make_app() -> TuiApp {
        TuiApp::new(1000, StdRng::seed_from_u64(7))
    }

    fn press(app: &mut TuiApp, code: KeyCode) -> Command {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ready_snapshot() -> CoachSnapshot {
        CoachSnapshot {
            session_state: SessionState::Ready,
            transcript: vec![Turn::assistant("Hi! I'm Pro-Bot. Ask me anything about probability!")],
            is_streaming: false,
            last_error: None,
            has_session: true,
        }
    }

    fn ready_coach_app() -> TuiApp {
        let mut app = make_app();
        assert_eq!(app.update(Action::OpenScreen(Screen::Coach)), Command::OpenCoach);
        app.update(Action::CoachChanged(ready_snapshot()));
        app
    }

    fn draw(app: &mut TuiApp) {
        let backend = TestBackend::new(100, 36);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
    }

    #[test]
    fn home_enter_opens_selected_game() {
        let mut app = make_app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.home_selected, 2);
        assert_eq!(press(&mut app, KeyCode::Enter), Command::None);
        assert_eq!(app.screen, Screen::SurvivalBridge);

        assert_eq!(press(&mut app, KeyCode::Esc), Command::None);
        assert_eq!(app.screen, Screen::Home);
    }

    #[test]
    fn home_selection_is_clamped() {
        let mut app = make_app();
        press(&mut app, KeyCode::Up);
        assert_eq!(app.home_selected, 0);
        for _ in 0..10 {
            press(&mut app, KeyCode::Down);
        }
        assert_eq!(app.home_selected, GAME_CARDS.len() - 1);
    }

    #[test]
    fn opening_coach_mounts_controller_and_back_unmounts() {
        let mut app = make_app();
        app.home_selected = GAME_CARDS.len() - 1;
        assert_eq!(press(&mut app, KeyCode::Enter), Command::OpenCoach);
        assert_eq!(app.screen, Screen::Coach);
        assert_eq!(app.coach.session_state, SessionState::Checking);

        assert_eq!(press(&mut app, KeyCode::Esc), Command::CloseCoach);
        assert_eq!(app.screen, Screen::Home);
    }

    #[test]
    fn quit_from_home_and_ctrl_c_anywhere() {
        let mut app = make_app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        let mut app = ready_coach_app();
        let cmd = app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert_eq!(cmd, Command::CloseCoach);
    }

    #[test]
    fn coach_input_accepts_multibyte_text() {
        let mut app = ready_coach_app();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('é'));
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.input, "aéb");
        assert_eq!(app.cursor_pos, 4);

        press(&mut app, KeyCode::Left);
        assert_eq!(app.cursor_pos, 3);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.input, "ab");
        assert_eq!(app.cursor_pos, 1);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.cursor_pos, 2);
    }

    #[test]
    fn coach_submit_sends_and_clears_input() {
        let mut app = ready_coach_app();
        for c in "what is a coin flip?".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(
            press(&mut app, KeyCode::Enter),
            Command::SendToCoach("what is a coin flip?".to_string())
        );
        assert_eq!(app.input, "");
        assert_eq!(app.cursor_pos, 0);
    }

    #[test]
    fn coach_submit_ignores_blank_input() {
        let mut app = ready_coach_app();
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(press(&mut app, KeyCode::Enter), Command::None);
        assert_eq!(app.input, " ");
    }

    #[test]
    fn coach_input_disabled_while_streaming_or_without_session() {
        let mut app = ready_coach_app();
        let mut streaming = ready_snapshot();
        streaming.is_streaming = true;
        app.update(Action::CoachChanged(streaming));
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.input, "");
        assert_eq!(app.update(Action::SubmitInput), Command::None);

        let mut app = make_app();
        app.update(Action::OpenScreen(Screen::Coach));
        app.update(Action::InsertChar('a'));
        assert_eq!(app.input, "");
    }

    #[test]
    fn transcript_change_autoscrolls() {
        let mut app = ready_coach_app();
        app.history_scroll = 3;
        let mut snapshot = ready_snapshot();
        app.update(Action::CoachChanged(snapshot.clone()));
        assert_eq!(app.history_scroll, 3);

        snapshot.transcript.push(Turn::user("hi"));
        app.update(Action::CoachChanged(snapshot));
        assert_eq!(app.history_scroll, u16::MAX);
    }

    #[test]
    fn key_needed_enter_requests_selection() {
        let mut app = make_app();
        app.update(Action::OpenScreen(Screen::Coach));
        app.update(Action::CoachChanged(CoachSnapshot {
            session_state: SessionState::KeyNeeded,
            ..CoachSnapshot::default()
        }));
        assert_eq!(press(&mut app, KeyCode::Enter), Command::SelectKey);
    }

    #[test]
    fn error_state_r_retries() {
        let mut app = make_app();
        app.update(Action::OpenScreen(Screen::Coach));
        app.update(Action::CoachChanged(CoachSnapshot {
            session_state: SessionState::Error,
            last_error: Some("Could not check for an API key. Please try reloading.".into()),
            ..CoachSnapshot::default()
        }));
        assert_eq!(press(&mut app, KeyCode::Char('r')), Command::RetryCoach);
    }

    #[test]
    fn ctrl_k_resets_only_when_idle_and_ready() {
        let mut app = ready_coach_app();
        let ctrl_k = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL);
        assert_eq!(app.handle_key(ctrl_k), Command::ResetCoach);

        let mut streaming = ready_snapshot();
        streaming.is_streaming = true;
        app.update(Action::CoachChanged(streaming));
        assert_eq!(app.handle_key(ctrl_k), Command::None);
    }

    #[test]
    fn key_picker_resolves_typed_key() {
        let mut app = make_app();
        app.update(Action::OpenScreen(Screen::Coach));
        app.update(Action::OpenKeyPicker);
        for c in "AIza-test".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(
            press(&mut app, KeyCode::Enter),
            Command::ResolveKeyPicker(Ok("AIza-test".to_string()))
        );
        assert!(app.key_picker.is_none());
    }

    #[test]
    fn key_picker_rejects_blank_and_cancels_on_esc() {
        let mut app = make_app();
        app.update(Action::OpenScreen(Screen::Coach));
        app.update(Action::OpenKeyPicker);
        assert_eq!(press(&mut app, KeyCode::Enter), Command::None);
        assert!(app.key_picker.as_ref().is_some_and(|p| p.error.is_some()));

        assert_eq!(
            press(&mut app, KeyCode::Esc),
            Command::ResolveKeyPicker(Err(ProbeError::Cancelled))
        );
        assert!(app.key_picker.is_none());
        assert_eq!(app.screen, Screen::Coach);
    }

    #[test]
    fn leaving_coach_drops_open_picker() {
        let mut app = make_app();
        app.update(Action::OpenScreen(Screen::Coach));
        app.update(Action::OpenKeyPicker);
        assert_eq!(app.update(Action::GoBack), Command::CloseCoach);
        assert!(app.key_picker.is_none());
    }

    #[test]
    fn opening_a_box_settles_price_and_item() {
        let mut app = make_app();
        app.update(Action::OpenScreen(Screen::LuckyBox));
        press(&mut app, KeyCode::Enter);

        let outcome = app.lucky.last.clone().expect("box opened");
        let expected = 1000 - i64::from(LUCKY_BOXES[0].price) + i64::from(outcome.item.value);
        assert_eq!(i64::from(app.ledger.points()), expected);
        assert!(app.ledger.has_badge(BadgeType::FirstWin));
        assert!(app.lucky.notice.is_some());
    }

    #[test]
    fn opening_a_box_without_points_is_refused() {
        let mut app = TuiApp::new(10, StdRng::seed_from_u64(1));
        app.update(Action::OpenScreen(Screen::LuckyBox));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.ledger.points(), 10);
        assert!(matches!(app.lucky.notice, Some(Notice::Bad(ref text)) if text.contains("Not enough points")));
    }

    #[test]
    fn expected_value_toggle() {
        let mut app = make_app();
        app.update(Action::OpenScreen(Screen::LuckyBox));
        press(&mut app, KeyCode::Char('e'));
        assert!(app.lucky.show_expected_value);
        press(&mut app, KeyCode::Char('e'));
        assert!(!app.lucky.show_expected_value);
    }

    #[test]
    fn detective_round_catches_the_butler() {
        let mut app = make_app();
        app.update(Action::OpenScreen(Screen::FindTheThief));
        for _ in 0..4 {
            press(&mut app, KeyCode::Char('c'));
        }
        assert!(matches!(app.thief.notice, Some(Notice::Info(ref text)) if text.starts_with("No clues left")));
        assert_eq!(app.thief.investigation.remaining_suspects().len(), 1);

        let butler = app
            .thief
            .investigation
            .case()
            .suspects
            .iter()
            .position(|s| s.id == "butler")
            .expect("butler");
        app.thief.selected = butler;
        press(&mut app, KeyCode::Enter);
        assert!(app.thief.verdict.as_ref().is_some_and(|v| v.correct));
        assert_eq!(app.ledger.points(), 1100);
        assert!(app.ledger.has_badge(BadgeType::MasterDetective));

        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.thief.notice, Some(Notice::Info(_))));
        assert_eq!(app.ledger.points(), 1100);

        press(&mut app, KeyCode::Char('n'));
        assert!(!app.thief.investigation.is_closed());
        assert!(app.thief.verdict.is_none());
    }

    #[test]
    fn bridge_count_stays_in_range() {
        let mut app = make_app();
        app.update(Action::OpenScreen(Screen::SurvivalBridge));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.bridge.count, 1);
        for _ in 0..15 {
            press(&mut app, KeyCode::Up);
        }
        assert_eq!(app.bridge.count, TOTAL_ADVENTURERS);

        press(&mut app, KeyCode::Enter);
        let outcome = app.bridge.last.as_ref().expect("crossed");
        assert_eq!(outcome.row.count, TOTAL_ADVENTURERS);
    }

    #[test]
    fn goal_cursor_walks_the_grid() {
        let mut app = make_app();
        app.update(Action::OpenScreen(Screen::GoalOrMiss));
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(GOAL_TARGETS[app.goal.selected].id, "top-right");
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(GOAL_TARGETS[app.goal.selected].id, "bottom-right");
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Up);
        assert_eq!(GOAL_TARGETS[app.goal.selected].id, "top-center");

        press(&mut app, KeyCode::Enter);
        assert!(app.goal.last.is_some());
        assert!(app.goal.notice.is_some());
    }

    #[test]
    fn tick_advances_spinner() {
        let mut app = make_app();
        let first = app.spinner();
        app.update(Action::Tick);
        assert_ne!(app.spinner(), first);
    }

    #[test]
    fn hints_follow_coach_state() {
        let mut app = ready_coach_app();
        assert!(app.hints().iter().any(|(_, desc)| *desc == "send"));
        app.update(Action::OpenKeyPicker);
        assert_eq!(app.hints()[0], ("enter", "confirm"));
    }

    #[test]
    fn every_screen_renders() {
        let mut app = make_app();
        draw(&mut app);
        for screen in [
            Screen::LuckyBox,
            Screen::FindTheThief,
            Screen::SurvivalBridge,
            Screen::GoalOrMiss,
        ] {
            app.update(Action::OpenScreen(screen));
            press(&mut app, KeyCode::Enter);
            draw(&mut app);
            app.update(Action::GoBack);
        }

        let mut app = ready_coach_app();
        draw(&mut app);
        app.update(Action::OpenKeyPicker);
        draw(&mut app);
    }
}
