use thiserror::Error;

/// Top-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration loading/validation error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Credential probe/picker error.
    #[error("Key probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Chat transport error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Mini-game rule violation.
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    /// Internal protocol type error.
    #[error("Proto error: {0}")]
    Proto(#[from] ProtoError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value and reason.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Filesystem read error.
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(String),
}

/// Credential availability errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The key service has not been attached yet.
    #[error("Key service unavailable")]
    Unavailable,

    /// The user dismissed the key picker.
    #[error("Key selection cancelled")]
    Cancelled,

    /// The key service failed for another reason.
    #[error("Key service failed: {0}")]
    Failed(String),
}

/// LLM transport errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// The credential was rejected (invalid key, missing permission).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The remote reported the bound entity as missing ("Requested entity was not found").
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider throttled the request.
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Remote API failure.
    #[error("{0}")]
    Api(String),

    /// Provider response schema/content was invalid.
    #[error("Invalid response from LLM: {0}")]
    InvalidResponse(String),

    /// Stream broke off mid-response.
    #[error("Stream error: {0}")]
    Stream(String),

    /// Network/connection-level failure.
    #[error("Connection error: {0}")]
    Connection(String),
}

impl LlmError {
    /// Returns `true` when the session bound to this credential can no
    /// longer be used and must be torn down.
    pub fn is_credential_invalidated(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::NotFound(_))
    }
}

/// Mini-game errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Requested lucky box id does not exist.
    #[error("Unknown lucky box: {0}")]
    UnknownBox(u32),

    /// Requested goal target id does not exist.
    #[error("Unknown goal target: {0}")]
    UnknownTarget(String),

    /// Requested suspect id does not exist in the case.
    #[error("Unknown suspect: {0}")]
    UnknownSuspect(String),

    /// Adventurer count outside the bridge table.
    #[error("Invalid adventurer count: {0}")]
    InvalidAdventurers(u32),

    /// The player cannot afford the action.
    #[error("Not enough points: need {needed}, have {available}")]
    InsufficientPoints { needed: u32, available: u32 },

    /// The case was already solved or failed.
    #[error("Case already closed")]
    CaseClosed,

    /// Every clue has already been revealed.
    #[error("No clues left")]
    NoCluesLeft,
}

/// Internal proto errors
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Invalid role string value.
    #[error("Invalid role: {0}")]
    InvalidRole(String),
}
