use serde::{Deserialize, Serialize};

/// Achievement earned while playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeType {
    FirstWin,
    HighRoller,
    SmartInvestor,
    MasterDetective,
    BridgeMaster,
    GoldenBoot,
}

/// Display data for a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeInfo {
    pub icon: &'static str,
    pub description: &'static str,
}

pub static BADGE_DEFINITIONS: [(BadgeType, BadgeInfo); 6] = [
    (
        BadgeType::FirstWin,
        BadgeInfo {
            icon: "🎉",
            description: "Win your first item from a Lucky Box!",
        },
    ),
    (
        BadgeType::HighRoller,
        BadgeInfo {
            icon: "💰",
            description: "Have over 2000 points",
        },
    ),
    (
        BadgeType::SmartInvestor,
        BadgeInfo {
            icon: "🧠",
            description: "Choose the box with the highest expected value",
        },
    ),
    (
        BadgeType::MasterDetective,
        BadgeInfo {
            icon: "🔎",
            description: "Correctly identify the thief!",
        },
    ),
    (
        BadgeType::BridgeMaster,
        BadgeInfo {
            icon: "🏆",
            description: "Successfully cross the bridge with max rewards",
        },
    ),
    (
        BadgeType::GoldenBoot,
        BadgeInfo {
            icon: "👟",
            description: "Score a top-corner goal",
        },
    ),
];

impl BadgeType {
    /// Icon and description for this badge.
    pub fn info(self) -> BadgeInfo {
        BADGE_DEFINITIONS
            .iter()
            .find(|(badge, _)| *badge == self)
            .map(|(_, info)| *info)
            .unwrap_or(BadgeInfo {
                icon: "🏅",
                description: "",
            })
    }
}

impl std::fmt::Display for BadgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BadgeType::FirstWin => "First Win",
            BadgeType::HighRoller => "High Roller",
            BadgeType::SmartInvestor => "Smart Investor",
            BadgeType::MasterDetective => "Master Detective",
            BadgeType::BridgeMaster => "Bridge Master",
            BadgeType::GoldenBoot => "Golden Boot",
        };
        write!(f, "{name}")
    }
}
