//! Pro-Bot persona and the fixed user-facing coach texts.

use crate::llm::SessionConfig;

/// Model every coach session talks to.
pub const COACH_MODEL: &str = "gemini-2.5-flash";

/// Persona instructions bound to every coach session.
pub const SYSTEM_INSTRUCTIONS: &str = "You are a friendly and encouraging probability coach named 'Pro-Bot'. \
Your goal is to explain probability concepts to middle school students in a simple, fun, and engaging way. \
Use analogies, simple examples, and avoid overly technical jargon. \
When asked for a problem, create a short, clear problem with a multiple-choice answer, \
and then explain the solution step-by-step after the user has had a chance to think. \
Keep your responses concise and easy to read. Use markdown for lists and bolding.";

/// First transcript turn after a successful initialization.
pub const GREETING: &str = "Hi! I'm Pro-Bot. Ask me anything about probability!";

/// Assistant turn shown when a send fails for a non-credential reason.
pub const APOLOGY: &str = "Oops! Something went wrong. Please try again.";

pub const PROBE_UNAVAILABLE: &str =
    "Could not connect to the API key service. Please reload to try again.";
pub const PROBE_FAILED: &str = "Could not check for an API key. Please try reloading.";
pub const KEY_UNAUTHORIZED: &str =
    "The selected API key is not valid or lacks permissions. Please choose a different key.";
pub const INIT_UNEXPECTED: &str =
    "An unexpected error occurred during initialization. Please try selecting your key again.";
pub const PICKER_FAILED: &str = "The API key selection dialog could not be opened.";
pub const SELECTION_CANCELLED: &str = "No API key was selected.";
pub const KEY_REVOKED: &str = "Your API key is no longer valid. Please select a key again.";

/// Session configuration used for every coach session.
pub fn coach_session_config() -> SessionConfig {
    SessionConfig {
        model: COACH_MODEL.to_string(),
        system_instructions: SYSTEM_INSTRUCTIONS.to_string(),
    }
}
