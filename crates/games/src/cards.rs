use serde::{Deserialize, Serialize};

/// Screens reachable from the home menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Game {
    LuckyBox,
    FindTheThief,
    SurvivalBridge,
    GoalOrMiss,
    AiCoach,
}

/// Home menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameCard {
    pub id: Game,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    /// Probability concept the game teaches.
    pub concept: &'static str,
}

pub static GAME_CARDS: [GameCard; 5] = [
    GameCard {
        id: Game::LuckyBox,
        title: "Lucky Box Shop",
        description: "Learn about Expected Value by opening mystery boxes. Is it worth the risk?",
        icon: "🎁",
        concept: "Expected Value",
    },
    GameCard {
        id: Game::FindTheThief,
        title: "Find the Thief",
        description: "Use clues to update your suspicions and catch the culprit!",
        icon: "🕵️",
        concept: "Conditional Probability",
    },
    GameCard {
        id: Game::SurvivalBridge,
        title: "Survival Bridge",
        description: "How many adventurers will you send across the rickety bridge? Weigh the risks.",
        icon: "🌉",
        concept: "Risk & Probability",
    },
    GameCard {
        id: Game::GoalOrMiss,
        title: "Goal or Miss!",
        description: "Take the penalty shot! Learn about success probability in sports.",
        icon: "⚽",
        concept: "Success Probability",
    },
    GameCard {
        id: Game::AiCoach,
        title: "AI Probability Coach",
        description: "Ask \"Pro-Bot\" any question about probability and get instant, helpful answers!",
        icon: "🤖",
        concept: "AI Tutoring",
    },
];

impl Game {
    /// Home menu card for this game.
    pub fn card(self) -> &'static GameCard {
        GAME_CARDS
            .iter()
            .find(|card| card.id == self)
            .unwrap_or(&GAME_CARDS[0])
    }
}
