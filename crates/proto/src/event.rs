use serde::{Deserialize, Serialize};

use crate::message::Turn;

/// Credential/session readiness of the coach panel. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Probing for a usable key (initial state on mount).
    #[default]
    Checking,
    /// No usable key; the panel shows the key selection prompt.
    KeyNeeded,
    /// A chat session is established.
    Ready,
    /// The key service never came up; a reload is required.
    Error,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Checking => write!(f, "checking"),
            SessionState::KeyNeeded => write!(f, "key_needed"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Error => write!(f, "error"),
        }
    }
}

/// Point-in-time copy of everything the coach view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachSnapshot {
    /// Current readiness state.
    pub session_state: SessionState,
    /// Chronological transcript.
    pub transcript: Vec<Turn>,
    /// Whether a response is currently streaming (input disabled).
    pub is_streaming: bool,
    /// User-facing explanation of the last failure.
    pub last_error: Option<String>,
    /// Whether a chat session handle is held.
    pub has_session: bool,
}

impl CoachSnapshot {
    /// Returns `true` when the view should accept a new submission.
    pub fn can_send(&self) -> bool {
        self.session_state == SessionState::Ready && self.has_session && !self.is_streaming
    }
}

/// Change notification emitted after every controller mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoachEvent {
    /// The readiness state moved to a new value.
    StateChanged(SessionState),
    /// The transcript was replaced, appended, or extended in place.
    TranscriptChanged {
        /// Transcript length after the change.
        turns: usize,
    },
    /// Streaming started or finished.
    StreamingChanged(bool),
    /// The user-facing error message changed.
    ErrorChanged(Option<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_state_defaults_to_checking() {
        assert_eq!(SessionState::default(), SessionState::Checking);
        assert_eq!(CoachSnapshot::default().session_state, SessionState::Checking);
    }

    #[test]
    fn can_send_requires_ready_session_and_idle_stream() {
        let mut snapshot = CoachSnapshot {
            session_state: SessionState::Ready,
            transcript: vec![Turn::assistant("hi")],
            is_streaming: false,
            last_error: None,
            has_session: true,
        };
        assert!(snapshot.can_send());

        snapshot.is_streaming = true;
        assert!(!snapshot.can_send());

        snapshot.is_streaming = false;
        snapshot.has_session = false;
        assert!(!snapshot.can_send());

        snapshot.has_session = true;
        snapshot.session_state = SessionState::KeyNeeded;
        assert!(!snapshot.can_send());
    }

    #[test]
    fn coach_event_serializes_with_type_tag() {
        let json = serde_json::to_value(CoachEvent::TranscriptChanged { turns: 3 })
            .expect("serialize event");
        assert_eq!(json["type"], "transcript_changed");
        assert_eq!(json["turns"], 3);
    }

    #[test]
    fn session_state_display_is_snake_case() {
        assert_eq!(SessionState::KeyNeeded.to_string(), "key_needed");
        assert_eq!(SessionState::Ready.to_string(), "ready");
    }
}
