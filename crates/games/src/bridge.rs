//! Survival Bridge: risk against reward.

use proto::GameError;
use rand::Rng;
use tracing::debug;

use crate::badge::BadgeType;
use crate::ledger::PointsLedger;

pub const TOTAL_ADVENTURERS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeRow {
    /// Adventurers sent across together.
    pub count: u32,
    /// Chance the whole group makes it.
    pub probability: f64,
    pub reward: i64,
    /// Zero or negative.
    pub penalty: i64,
}

impl BridgeRow {
    /// p·reward + (1 − p)·penalty.
    pub fn expected_value(&self) -> f64 {
        self.probability * self.reward as f64 + (1.0 - self.probability) * self.penalty as f64
    }
}

pub static SURVIVAL_BRIDGE: [BridgeRow; 10] = [
    BridgeRow { count: 1, probability: 0.99, reward: 20, penalty: 0 },
    BridgeRow { count: 2, probability: 0.95, reward: 40, penalty: -10 },
    BridgeRow { count: 3, probability: 0.90, reward: 60, penalty: -20 },
    BridgeRow { count: 4, probability: 0.80, reward: 85, penalty: -35 },
    BridgeRow { count: 5, probability: 0.70, reward: 115, penalty: -50 },
    BridgeRow { count: 6, probability: 0.60, reward: 150, penalty: -70 },
    BridgeRow { count: 7, probability: 0.50, reward: 190, penalty: -90 },
    BridgeRow { count: 8, probability: 0.35, reward: 250, penalty: -125 },
    BridgeRow { count: 9, probability: 0.20, reward: 350, penalty: -175 },
    BridgeRow { count: 10, probability: 0.10, reward: 500, penalty: -250 },
];

#[derive(Debug, Clone, PartialEq)]
pub struct CrossingOutcome {
    pub row: &'static BridgeRow,
    pub success: bool,
    pub delta: i64,
    pub new_badges: Vec<BadgeType>,
}

pub fn row(count: u32) -> Result<&'static BridgeRow, GameError> {
    SURVIVAL_BRIDGE
        .iter()
        .find(|r| r.count == count)
        .ok_or(GameError::InvalidAdventurers(count))
}

/// Sends `count` adventurers across.
pub fn cross(
    ledger: &mut PointsLedger,
    count: u32,
    rng: &mut impl Rng,
) -> Result<CrossingOutcome, GameError> {
    let row = row(count)?;
    let success = rng.gen_bool(row.probability);
    let delta = if success { row.reward } else { row.penalty };

    let mut new_badges = Vec::new();
    if success && count == TOTAL_ADVENTURERS && ledger.award(BadgeType::BridgeMaster) {
        new_badges.push(BadgeType::BridgeMaster);
    }
    new_badges.extend(ledger.apply(delta));

    debug!(count, success, delta, "Bridge crossing");
    Ok(CrossingOutcome {
        row,
        success,
        delta,
        new_badges,
    })
}
