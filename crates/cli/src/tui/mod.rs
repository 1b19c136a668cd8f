//! Full-screen ratatui terminal user interface for the games and the coach.

pub mod action;
pub mod app;
pub mod coach;
pub mod event;
pub mod header;
pub mod home;
pub mod minigames;
pub mod picker;
pub mod theme;

pub use app::Screen;
pub use event::run_tui;
