//! Shared types for the coach session, the mini-games, and the terminal UI.
//!
//! This crate defines the serializable transcript/state structures and the
//! strongly-typed error enums shared across the workspace.

pub mod error;
pub mod event;
pub mod message;

/// Re-export of all error types.
pub use error::*;
/// Re-export of observable coach state and change events.
pub use event::{CoachEvent, CoachSnapshot, SessionState};
/// Re-export of transcript/identity types.
pub use message::{Role, SessionId, Turn};
