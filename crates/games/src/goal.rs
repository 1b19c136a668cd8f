//! Goal or Miss: success probability of a penalty shot.

use proto::GameError;
use rand::Rng;
use tracing::debug;

use crate::badge::BadgeType;
use crate::ledger::PointsLedger;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalTarget {
    pub id: &'static str,
    pub name: &'static str,
    pub probability: f64,
    pub reward: i64,
    pub penalty: i64,
}

impl GoalTarget {
    pub fn is_top_corner(&self) -> bool {
        matches!(self.id, "top-left" | "top-right")
    }

    pub fn expected_value(&self) -> f64 {
        self.probability * self.reward as f64 + (1.0 - self.probability) * self.penalty as f64
    }
}

/// Laid out as two rows of three, top row first.
pub static GOAL_TARGETS: [GoalTarget; 6] = [
    GoalTarget { id: "top-left", name: "Top Left", probability: 0.50, reward: 150, penalty: -15 },
    GoalTarget { id: "top-center", name: "Top Center", probability: 0.80, reward: 50, penalty: -15 },
    GoalTarget { id: "top-right", name: "Top Right", probability: 0.50, reward: 150, penalty: -15 },
    GoalTarget { id: "bottom-left", name: "Bottom Left", probability: 0.75, reward: 75, penalty: -10 },
    GoalTarget { id: "bottom-center", name: "Bottom Center", probability: 0.95, reward: 25, penalty: -10 },
    GoalTarget { id: "bottom-right", name: "Bottom Right", probability: 0.75, reward: 75, penalty: -10 },
];

#[derive(Debug, Clone, PartialEq)]
pub struct ShotOutcome {
    pub target: &'static GoalTarget,
    pub scored: bool,
    pub delta: i64,
    pub new_badges: Vec<BadgeType>,
}

pub fn find_target(id: &str) -> Result<&'static GoalTarget, GameError> {
    GOAL_TARGETS
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| GameError::UnknownTarget(id.to_string()))
}

/// Shoots at `target_id`.
pub fn shoot(
    ledger: &mut PointsLedger,
    target_id: &str,
    rng: &mut impl Rng,
) -> Result<ShotOutcome, GameError> {
    let target = find_target(target_id)?;
    let scored = rng.gen_bool(target.probability);
    let delta = if scored { target.reward } else { target.penalty };

    let mut new_badges = Vec::new();
    if scored && target.is_top_corner() && ledger.award(BadgeType::GoldenBoot) {
        new_badges.push(BadgeType::GoldenBoot);
    }
    new_badges.extend(ledger.apply(delta));

    debug!(target = target.id, scored, delta, "Penalty taken");
    Ok(ShotOutcome {
        target,
        scored,
        delta,
        new_badges,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::rngs::mock::StepRng;

    use super::*;

    #[test]
    fn top_corner_goal_awards_golden_boot() {
        let mut ledger = PointsLedger::new(1000);
        let outcome = shoot(&mut ledger, "top-right", &mut StepRng::new(0, 0)).expect("shoot");
        assert!(outcome.scored);
        assert_eq!(outcome.new_badges, vec![BadgeType::GoldenBoot]);
        assert_eq!(ledger.points(), 1150);
    }

    #[test]
    fn center_goal_scores_without_badge() {
        let mut ledger = PointsLedger::new(1000);
        let outcome = shoot(&mut ledger, "top-center", &mut StepRng::new(0, 0)).expect("shoot");
        assert!(outcome.scored);
        assert!(outcome.new_badges.is_empty());
    }

    #[test]
    fn miss_applies_penalty() {
        let mut ledger = PointsLedger::new(1000);
        let outcome =
            shoot(&mut ledger, "bottom-left", &mut StepRng::new(u64::MAX, 0)).expect("shoot");
        assert!(!outcome.scored);
        assert_eq!(ledger.points(), 990);
    }

    #[test]
    fn unknown_target_is_rejected() {
        let mut ledger = PointsLedger::new(1000);
        assert_eq!(
            shoot(&mut ledger, "crossbar", &mut StdRng::seed_from_u64(1)),
            Err(GameError::UnknownTarget("crossbar".into()))
        );
    }

    #[test]
    fn safer_targets_have_lower_upside() {
        let center = find_target("bottom-center").expect("target");
        let corner = find_target("top-left").expect("target");
        assert!(center.probability > corner.probability);
        assert!(corner.expected_value() > center.expected_value());
    }
}
