//! Pro-Bot coach: session controller, key probe, and streaming chat transport.

pub mod controller;
pub mod gemini;
pub mod llm;
pub mod persona;
pub mod probe;

/// Coach chat state machine.
pub use controller::{ChatSessionController, ProbePolicy};
/// Gemini streaming transport.
pub use gemini::GeminiTransport;
/// Transport abstraction and session handle.
pub use llm::{ChatMessage, ChatSession, ChatTransport, FragmentStream, SessionConfig};
/// Credential store, probe, and picker surface.
pub use probe::{CredentialStore, HostKeyProbe, KeyPicker, KeyProbe, validate_api_key};
