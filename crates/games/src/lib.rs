//! Chance Champions mini-games: content tables and pure game engines.

pub mod badge;
pub mod bridge;
pub mod cards;
pub mod detective;
pub mod goal;
pub mod ledger;
pub mod lucky_box;

/// Badge catalogue.
pub use badge::{BADGE_DEFINITIONS, BadgeInfo, BadgeType};
/// Home menu cards.
pub use cards::{GAME_CARDS, Game, GameCard};
/// Shared points balance.
pub use ledger::PointsLedger;
