//! Coach chat session state machine.
//!
//! Owns the readiness state, the transcript, and the chat session handle.
//! Every mutation happens under one short lock that is never held across an
//! await; each mutation broadcasts the resulting [`CoachEvent`]s.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;
use proto::{CoachEvent, CoachSnapshot, LlmError, ProbeError, Role, SessionState, Turn};
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

use crate::llm::{ChatSession, ChatTransport, SessionConfig};
use crate::persona;
use crate::probe::KeyProbe;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How long to wait for the key service to come up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    /// Probe calls made while the service reports itself unavailable.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub interval: Duration,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            interval: Duration::from_millis(100),
        }
    }
}

#[derive(Default)]
struct ControllerState {
    session_state: SessionState,
    session: Option<ChatSession>,
    transcript: Vec<Turn>,
    is_streaming: bool,
    last_error: Option<String>,
    /// Bumped whenever the session is replaced or torn down; stream results
    /// tagged with an older value are dropped.
    generation: u64,
    transcript_rev: u64,
}

impl ControllerState {
    fn set_transcript(&mut self, turns: Vec<Turn>) {
        self.transcript = turns;
        self.transcript_rev += 1;
    }

    fn push_turn(&mut self, turn: Turn) {
        self.transcript.push(turn);
        self.transcript_rev += 1;
    }

    fn append_to_last(&mut self, fragment: &str) {
        if let Some(last) = self.transcript.last_mut()
            && last.role == Role::Assistant
        {
            last.text.push_str(fragment);
            self.transcript_rev += 1;
        }
    }

    /// Fills an empty placeholder with `text`, or appends a new assistant turn.
    fn replace_placeholder_or_append(&mut self, text: &str) {
        match self.transcript.last_mut() {
            Some(last) if last.is_empty_placeholder() => {
                last.text.push_str(text);
                self.transcript_rev += 1;
            }
            _ => self.push_turn(Turn::assistant(text)),
        }
    }

    fn install(&mut self, session: ChatSession) {
        self.session = Some(session);
        self.generation += 1;
        self.is_streaming = false;
        self.set_transcript(vec![Turn::assistant(persona::GREETING)]);
        self.session_state = SessionState::Ready;
        self.last_error = None;
    }

    /// Drops the session handle; in-flight stream results become stale.
    fn drop_session(&mut self) {
        if self.session.take().is_some() {
            self.generation += 1;
        }
        self.is_streaming = false;
    }

    fn teardown(&mut self) {
        self.drop_session();
        if !self.transcript.is_empty() {
            self.set_transcript(Vec::new());
        }
        self.is_streaming = false;
    }

    fn snapshot(&self) -> CoachSnapshot {
        CoachSnapshot {
            session_state: self.session_state,
            transcript: self.transcript.clone(),
            is_streaming: self.is_streaming,
            last_error: self.last_error.clone(),
            has_session: self.session.is_some(),
        }
    }
}

/// Observable fields captured before a mutation.
struct Marker {
    session_state: SessionState,
    transcript_rev: u64,
    is_streaming: bool,
    last_error: Option<String>,
}

impl Marker {
    fn of(state: &ControllerState) -> Self {
        Self {
            session_state: state.session_state,
            transcript_rev: state.transcript_rev,
            is_streaming: state.is_streaming,
            last_error: state.last_error.clone(),
        }
    }

    fn changes(self, state: &ControllerState) -> Vec<CoachEvent> {
        let mut events = Vec::new();
        if self.session_state != state.session_state {
            events.push(CoachEvent::StateChanged(state.session_state));
        }
        if self.transcript_rev != state.transcript_rev {
            events.push(CoachEvent::TranscriptChanged {
                turns: state.transcript.len(),
            });
        }
        if self.is_streaming != state.is_streaming {
            events.push(CoachEvent::StreamingChanged(state.is_streaming));
        }
        if self.last_error != state.last_error {
            events.push(CoachEvent::ErrorChanged(state.last_error.clone()));
        }
        events
    }
}

/// Clears the in-flight initialization flag even if the caller is cancelled.
struct InitGuard<'a>(&'a AtomicBool);

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives the coach panel from key discovery to streamed replies.
pub struct ChatSessionController {
    probe: Arc<dyn KeyProbe>,
    transport: Arc<dyn ChatTransport>,
    config: SessionConfig,
    policy: ProbePolicy,
    state: Mutex<ControllerState>,
    initializing: AtomicBool,
    active: AtomicBool,
    events: broadcast::Sender<CoachEvent>,
}

impl ChatSessionController {
    /// Creates a controller in `Checking` with the Pro-Bot session configuration.
    pub fn new(probe: Arc<dyn KeyProbe>, transport: Arc<dyn ChatTransport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            probe,
            transport,
            config: persona::coach_session_config(),
            policy: ProbePolicy::default(),
            state: Mutex::new(ControllerState::default()),
            initializing: AtomicBool::new(false),
            active: AtomicBool::new(true),
            events,
        }
    }

    /// Overrides the key service polling budget.
    pub fn with_probe_policy(mut self, policy: ProbePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Copy of the observable state.
    pub fn snapshot(&self) -> CoachSnapshot {
        self.state.lock().snapshot()
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CoachEvent> {
        self.events.subscribe()
    }

    /// Returns `false` once the owning view is gone.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Detaches the controller from its view. In-flight work keeps running
    /// but its results are discarded.
    pub fn deactivate(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            debug!("Coach controller deactivated");
        }
    }

    /// Applies `f` to the state and broadcasts what changed.
    ///
    /// Returns `None` without touching anything when the controller is
    /// inactive or `generation` no longer matches the installed session.
    fn mutate<R>(
        &self,
        generation: Option<u64>,
        f: impl FnOnce(&mut ControllerState) -> R,
    ) -> Option<R> {
        if !self.is_active() {
            return None;
        }
        let (result, events) = {
            let mut state = self.state.lock();
            if generation.is_some_and(|g| g != state.generation) {
                return None;
            }
            let before = Marker::of(&state);
            let result = f(&mut state);
            (result, before.changes(&state))
        };
        for event in events {
            trace!(?event, "Coach state changed");
            let _ = self.events.send(event);
        }
        Some(result)
    }

    /// Determines key availability and, when a key is present, creates the
    /// chat session. A call made while another is in flight is dropped.
    pub async fn probe_and_initialize(&self) {
        if self
            .initializing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Initialization already in flight; request dropped");
            return;
        }
        let _guard = InitGuard(&self.initializing);

        // A session exists only while `Ready`.
        self.mutate(None, |s| {
            s.drop_session();
            s.session_state = SessionState::Checking;
            s.last_error = None;
        });

        let has_key = match self.poll_probe().await {
            Ok(has_key) => has_key,
            Err(ProbeError::Unavailable) => {
                warn!(
                    attempts = self.policy.max_attempts,
                    "Key service did not become available"
                );
                self.mutate(None, |s| {
                    s.teardown();
                    s.session_state = SessionState::Error;
                    s.last_error = Some(persona::PROBE_UNAVAILABLE.to_string());
                });
                return;
            }
            Err(e) => {
                error!(error = %e, "Key availability check failed");
                self.mutate(None, |s| {
                    s.teardown();
                    s.session_state = SessionState::Error;
                    s.last_error = Some(persona::PROBE_FAILED.to_string());
                });
                return;
            }
        };

        if !has_key {
            info!("No API key selected");
            self.mutate(None, |s| {
                s.teardown();
                s.session_state = SessionState::KeyNeeded;
            });
            return;
        }

        match self.transport.create_session(&self.config).await {
            Ok(session) => {
                info!(session = %session.id(), model = %session.model(), "Coach session ready");
                self.mutate(None, |s| s.install(session));
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize coach session");
                let message = if e.is_credential_invalidated() {
                    self.probe.forget_key();
                    persona::KEY_UNAUTHORIZED
                } else {
                    persona::INIT_UNEXPECTED
                };
                self.mutate(None, |s| {
                    s.teardown();
                    s.session_state = SessionState::KeyNeeded;
                    s.last_error = Some(message.to_string());
                });
            }
        }
    }

    /// Polls `has_key` while the key service reports itself unavailable.
    async fn poll_probe(&self) -> Result<bool, ProbeError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.probe.has_key().await {
                Err(ProbeError::Unavailable) if attempt < max_attempts => {
                    trace!(attempt, "Key service not loaded yet");
                    tokio::time::sleep(self.policy.interval).await;
                }
                other => return other,
            }
        }
    }

    /// Opens the key picker and re-initializes once a key was chosen.
    pub async fn request_key_selection(&self) {
        match self.probe.prompt_selection().await {
            Ok(()) => {
                info!("API key selected; re-initializing");
                self.probe_and_initialize().await;
            }
            Err(ProbeError::Cancelled) => {
                debug!("Key selection cancelled");
                self.mutate(None, |s| {
                    s.last_error = Some(persona::SELECTION_CANCELLED.to_string());
                });
            }
            Err(e) => {
                error!(error = %e, "Could not open API key picker");
                self.mutate(None, |s| {
                    s.last_error = Some(persona::PICKER_FAILED.to_string());
                });
            }
        }
    }

    /// Sends `text` and streams the reply into the transcript.
    ///
    /// Returns `false` without any effect when `text` is blank, no session is
    /// held, or a reply is already streaming.
    pub async fn send_message(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let accepted = self.mutate(None, |s| {
            if s.session_state != SessionState::Ready || s.is_streaming {
                return None;
            }
            let session = s.session.clone()?;
            s.push_turn(Turn::user(text));
            s.push_turn(Turn::placeholder());
            s.is_streaming = true;
            Some((session, s.generation))
        });
        let Some((session, generation)) = accepted.flatten() else {
            debug!("Send ignored");
            return false;
        };

        debug!(session = %session.id(), chars = text.len(), "Sending message to coach");
        let outcome = self.stream_reply(&session, text, generation).await;

        match outcome {
            Ok(fragments) => {
                debug!(fragments, "Coach reply complete");
                self.mutate(Some(generation), |s| s.is_streaming = false);
            }
            Err(e) if e.is_credential_invalidated() => {
                warn!(error = %e, "API key rejected while streaming; session torn down");
                self.probe.forget_key();
                self.mutate(Some(generation), |s| {
                    s.teardown();
                    s.session_state = SessionState::KeyNeeded;
                    s.last_error = Some(persona::KEY_REVOKED.to_string());
                });
            }
            Err(e) => {
                error!(error = %e, "Error sending message");
                self.mutate(Some(generation), |s| {
                    s.replace_placeholder_or_append(persona::APOLOGY);
                    s.is_streaming = false;
                });
            }
        }
        true
    }

    /// Appends fragments to the last turn in arrival order. Returns how many
    /// arrived before the sequence ended.
    async fn stream_reply(
        &self,
        session: &ChatSession,
        text: &str,
        generation: u64,
    ) -> Result<usize, LlmError> {
        let mut stream = self.transport.send(session, text).await?;
        let mut received = 0usize;
        while let Some(item) = stream.next().await {
            let fragment = item?;
            received += 1;
            if self
                .mutate(Some(generation), |s| s.append_to_last(&fragment))
                .is_none()
            {
                debug!("Session replaced or view closed; dropping remaining fragments");
                break;
            }
        }
        Ok(received)
    }

    /// Explicitly invalidates the session and returns to `KeyNeeded`.
    pub fn reset(&self) {
        info!("Coach session reset");
        self.mutate(None, |s| {
            s.teardown();
            s.session_state = SessionState::KeyNeeded;
        });
    }
}
