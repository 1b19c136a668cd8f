//! Elm Architecture (TEA) action and command types for the TUI.
//!
//! All state mutations flow through [`Action`], and side effects are
//! expressed as [`Command`] values returned from `TuiApp::update()`.

use proto::{CoachSnapshot, ProbeError};

use super::app::Screen;

/// Arrow-key direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

// ─── Action ──────────────────────────────────────────────────────────────────

/// Every possible state mutation in the TUI. The `update()` method on
/// `TuiApp` is the *only* place where `Action` variants are matched
/// and applied.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Input ────────────────────────────────────────────────
    /// Insert a character at the cursor (coach input or key picker).
    InsertChar(char),
    /// Delete the character before the cursor.
    DeleteChar,
    MoveCursorLeft,
    MoveCursorRight,
    /// Enter on the coach panel.
    SubmitInput,

    // ── Navigation ───────────────────────────────────────────
    /// Arrow keys on menus and game boards.
    Move(Direction),
    /// Enter on menus and game boards.
    Confirm,
    /// Open a screen from the home menu.
    OpenScreen(Screen),
    /// Return to the home menu.
    GoBack,
    ScrollUp(u16),
    ScrollDown(u16),

    // ── Games ────────────────────────────────────────────────
    /// Show or hide expected values in the lucky box shop.
    ToggleExpectedValue,
    /// Reveal the next detective clue.
    RevealClue,
    /// Start the current game over.
    NewRound,

    // ── Coach ────────────────────────────────────────────────
    /// Controller state changed.
    CoachChanged(CoachSnapshot),
    /// Open the API key selection flow.
    SelectKey,
    /// Re-run key detection after an error.
    RetryCoach,
    /// Forget the current key and session.
    ChangeKey,

    // ── Key picker modal ─────────────────────────────────────
    OpenKeyPicker,
    SubmitKeyPicker,
    CancelKeyPicker,

    // ── System ───────────────────────────────────────────────
    /// Periodic spinner tick.
    Tick,
    ToggleMute,
    Quit,
}

// ─── Command ─────────────────────────────────────────────────────────────────

/// Side effects returned by `TuiApp::update()`. The event loop is
/// responsible for executing these asynchronously.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// No side effect.
    None,
    /// Mount a fresh coach controller and start key detection.
    OpenCoach,
    /// Unmount the coach controller.
    CloseCoach,
    /// Send a chat message to the coach.
    SendToCoach(String),
    /// Run the key selection flow.
    SelectKey,
    /// Run key detection again.
    RetryCoach,
    /// Clear the selected key and tear the session down.
    ResetCoach,
    /// Answer the pending key picker request.
    ResolveKeyPicker(Result<String, ProbeError>),
}
