//! Streaming chat transport abstraction and the session handle it hands out.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use parking_lot::Mutex;
use proto::{LlmError, Role, SessionId};

/// Lazy, finite, non-restartable sequence of response fragments in arrival order.
pub type FragmentStream = BoxStream<'static, Result<String, LlmError>>;

/// Represents a message in the transport-side conversation history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Semantic role of this message.
    pub role: Role,
    /// Human-readable text content.
    pub content: String,
}

impl ChatMessage {
    /// Creates a user-role message with the given content.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant-role message with the given content.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Fixed configuration a session is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Target model id.
    pub model: String,
    /// Persona instructions sent with every request.
    pub system_instructions: String,
}

/// Opaque handle to an ongoing conversation.
///
/// Clones share the same history; the transport appends to it after every
/// completed exchange so later sends carry the prior turns.
#[derive(Clone)]
pub struct ChatSession {
    id: SessionId,
    config: SessionConfig,
    credential: String,
    history: Arc<Mutex<Vec<ChatMessage>>>,
}

impl ChatSession {
    /// Creates a session bound to `credential`.
    pub fn new(config: SessionConfig, credential: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            config,
            credential: credential.into(),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Session identifier (for logging).
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Model the session talks to.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Persona instructions bound at creation.
    pub fn system_instructions(&self) -> &str {
        &self.config.system_instructions
    }

    /// Credential the session was created with.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Snapshot of the completed exchanges so far.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().clone()
    }

    /// Records one completed user/assistant exchange.
    pub fn record_exchange(&self, user: impl Into<String>, reply: impl Into<String>) {
        let mut history = self.history.lock();
        history.push(ChatMessage::user(user));
        history.push(ChatMessage::assistant(reply));
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("model", &self.config.model)
            .field("credential", &"<redacted>")
            .field("turns", &self.history.lock().len())
            .finish()
    }
}

/// Streaming conversational endpoint
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Establishes a session with the fixed configuration.
    async fn create_session(&self, config: &SessionConfig) -> Result<ChatSession, LlmError>;

    /// Sends `text` within `session` and returns the response fragments.
    ///
    /// Failures surface either here (sequence-open) or as an `Err` item of
    /// the returned stream.
    async fn send(&self, session: &ChatSession, text: &str) -> Result<FragmentStream, LlmError>;
}
