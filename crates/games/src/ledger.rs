//! Player points and earned badges.

use proto::GameError;
use tracing::info;

use crate::badge::BadgeType;

/// Points above which the high roller badge is awarded.
pub const HIGH_ROLLER_THRESHOLD: u32 = 2000;

/// Balance shared by every mini-game. Points never go below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsLedger {
    points: u32,
    badges: Vec<BadgeType>,
}

impl PointsLedger {
    /// Creates a ledger holding `starting_points` and no badges.
    pub fn new(starting_points: u32) -> Self {
        Self {
            points: starting_points,
            badges: Vec::new(),
        }
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    /// Badges in the order they were earned.
    pub fn badges(&self) -> &[BadgeType] {
        &self.badges
    }

    pub fn has_badge(&self, badge: BadgeType) -> bool {
        self.badges.contains(&badge)
    }

    /// Awards `badge`. Returns `false` if it was already earned.
    pub fn award(&mut self, badge: BadgeType) -> bool {
        if self.has_badge(badge) {
            return false;
        }
        info!(%badge, "Badge earned");
        self.badges.push(badge);
        true
    }

    /// Removes `amount` points, failing when the balance is too small.
    pub fn debit(&mut self, amount: u32) -> Result<(), GameError> {
        if amount > self.points {
            return Err(GameError::InsufficientPoints {
                needed: amount,
                available: self.points,
            });
        }
        self.points -= amount;
        Ok(())
    }

    /// Applies a signed change, clamping at zero and at `u32::MAX`.
    ///
    /// Returns any badge earned by the new balance.
    pub fn apply(&mut self, delta: i64) -> Option<BadgeType> {
        let next = (i64::from(self.points) + delta).clamp(0, i64::from(u32::MAX));
        self.points = u32::try_from(next).unwrap_or(u32::MAX);
        self.check_high_roller()
    }

    /// Adds `amount` points.
    pub fn credit(&mut self, amount: u32) -> Option<BadgeType> {
        self.points = self.points.saturating_add(amount);
        self.check_high_roller()
    }

    fn check_high_roller(&mut self) -> Option<BadgeType> {
        (self.points > HIGH_ROLLER_THRESHOLD && self.award(BadgeType::HighRoller))
            .then_some(BadgeType::HighRoller)
    }
}
