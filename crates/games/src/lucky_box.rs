//! Lucky Box Shop: expected value of mystery boxes.

use proto::GameError;
use rand::Rng;
use tracing::debug;

use crate::badge::BadgeType;
use crate::ledger::PointsLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rarity::Common => write!(f, "common"),
            Rarity::Uncommon => write!(f, "uncommon"),
            Rarity::Rare => write!(f, "rare"),
            Rarity::Legendary => write!(f, "legendary"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxItem {
    pub name: &'static str,
    pub value: u32,
    pub probability: f64,
    pub rarity: Rarity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LuckyBox {
    pub id: u32,
    pub name: &'static str,
    pub price: u32,
    /// Probabilities sum to 1.
    pub items: &'static [BoxItem],
}

pub static LUCKY_BOXES: [LuckyBox; 3] = [
    LuckyBox {
        id: 1,
        name: "Bronze Box",
        price: 50,
        items: &[
            BoxItem {
                name: "Toy Car",
                value: 20,
                probability: 0.5,
                rarity: Rarity::Common,
            },
            BoxItem {
                name: "Stickers",
                value: 60,
                probability: 0.4,
                rarity: Rarity::Uncommon,
            },
            BoxItem {
                name: "Action Figure",
                value: 150,
                probability: 0.1,
                rarity: Rarity::Rare,
            },
        ],
    },
    LuckyBox {
        id: 2,
        name: "Silver Box",
        price: 150,
        items: &[
            BoxItem {
                name: "Stickers",
                value: 60,
                probability: 0.6,
                rarity: Rarity::Common,
            },
            BoxItem {
                name: "Action Figure",
                value: 150,
                probability: 0.3,
                rarity: Rarity::Uncommon,
            },
            BoxItem {
                name: "RC Drone",
                value: 500,
                probability: 0.1,
                rarity: Rarity::Rare,
            },
        ],
    },
    LuckyBox {
        id: 3,
        name: "Gold Box",
        price: 400,
        items: &[
            BoxItem {
                name: "Action Figure",
                value: 150,
                probability: 0.75,
                rarity: Rarity::Common,
            },
            BoxItem {
                name: "RC Drone",
                value: 500,
                probability: 0.2,
                rarity: Rarity::Uncommon,
            },
            BoxItem {
                name: "Video Game Console",
                value: 2000,
                probability: 0.05,
                rarity: Rarity::Legendary,
            },
        ],
    },
];

/// Result of opening one box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxOutcome {
    pub item: &'static BoxItem,
    /// Item value minus box price.
    pub net: i64,
    pub new_badges: Vec<BadgeType>,
}

/// Σ p·v − price.
pub fn expected_value(lucky_box: &LuckyBox) -> f64 {
    let mean: f64 = lucky_box
        .items
        .iter()
        .map(|item| item.probability * f64::from(item.value))
        .sum();
    mean - f64::from(lucky_box.price)
}

/// Box with the highest expected value.
pub fn best_box() -> &'static LuckyBox {
    LUCKY_BOXES
        .iter()
        .max_by(|a, b| expected_value(a).total_cmp(&expected_value(b)))
        .unwrap_or(&LUCKY_BOXES[0])
}

pub fn find_box(id: u32) -> Result<&'static LuckyBox, GameError> {
    LUCKY_BOXES
        .iter()
        .find(|b| b.id == id)
        .ok_or(GameError::UnknownBox(id))
}

/// Draws one item by cumulative probability.
pub fn draw_item(lucky_box: &'static LuckyBox, rng: &mut impl Rng) -> &'static BoxItem {
    let roll: f64 = rng.r#gen();
    let mut cumulative = 0.0;
    for item in lucky_box.items {
        cumulative += item.probability;
        if roll < cumulative {
            return item;
        }
    }
    // Rounding can leave the roll just above the final cumulative sum.
    &lucky_box.items[lucky_box.items.len() - 1]
}

/// Buys and opens box `id`.
pub fn open_box(
    ledger: &mut PointsLedger,
    id: u32,
    rng: &mut impl Rng,
) -> Result<BoxOutcome, GameError> {
    let lucky_box = find_box(id)?;
    ledger.debit(lucky_box.price)?;
    let item = draw_item(lucky_box, rng);

    let mut new_badges = Vec::new();
    if ledger.award(BadgeType::FirstWin) {
        new_badges.push(BadgeType::FirstWin);
    }
    if lucky_box.id == best_box().id && ledger.award(BadgeType::SmartInvestor) {
        new_badges.push(BadgeType::SmartInvestor);
    }
    new_badges.extend(ledger.credit(item.value));

    debug!(box_name = lucky_box.name, item = item.name, "Lucky box opened");
    Ok(BoxOutcome {
        item,
        net: i64::from(item.value) - i64::from(lucky_box.price),
        new_badges,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::rngs::mock::StepRng;

    use super::*;

    fn fixed_roll(fraction: f64) -> StepRng {
        // `gen::<f64>()` uses the top 53 bits of a u64.
        StepRng::new((fraction * (1u64 << 53) as f64) as u64 * (1 << 11), 0)
    }

    #[test]
    fn probabilities_sum_to_one() {
        for lucky_box in &LUCKY_BOXES {
            let total: f64 = lucky_box.items.iter().map(|i| i.probability).sum();
            assert!((total - 1.0).abs() < 1e-9, "{}", lucky_box.name);
        }
    }

    #[test]
    fn expected_values_match_hand_calculation() {
        assert!((expected_value(&LUCKY_BOXES[0]) - -1.0).abs() < 1e-9);
        assert!((expected_value(&LUCKY_BOXES[1]) - -19.0).abs() < 1e-9);
        assert!((expected_value(&LUCKY_BOXES[2]) - -87.5).abs() < 1e-9);
        assert_eq!(best_box().name, "Bronze Box");
    }

    #[test]
    fn draw_item_uses_cumulative_probability() {
        let gold = &LUCKY_BOXES[2];
        assert_eq!(draw_item(gold, &mut fixed_roll(0.10)).name, "Action Figure");
        assert_eq!(draw_item(gold, &mut fixed_roll(0.80)).name, "RC Drone");
        assert_eq!(
            draw_item(gold, &mut fixed_roll(0.97)).name,
            "Video Game Console"
        );
    }

    #[test]
    fn open_box_debits_price_and_credits_item() {
        let mut ledger = PointsLedger::new(1000);
        let outcome = open_box(&mut ledger, 2, &mut fixed_roll(0.0)).expect("open");
        assert_eq!(outcome.item.name, "Stickers");
        assert_eq!(outcome.net, -90);
        assert_eq!(ledger.points(), 910);
        assert_eq!(outcome.new_badges, vec![BadgeType::FirstWin]);

        let again = open_box(&mut ledger, 2, &mut fixed_roll(0.0)).expect("open");
        assert!(again.new_badges.is_empty());
    }

    #[test]
    fn bronze_box_awards_smart_investor() {
        let mut ledger = PointsLedger::new(100);
        let outcome = open_box(&mut ledger, 1, &mut StdRng::seed_from_u64(7)).expect("open");
        assert!(outcome.new_badges.contains(&BadgeType::SmartInvestor));
        assert!(ledger.has_badge(BadgeType::SmartInvestor));
    }

    #[test]
    fn legendary_win_can_make_a_high_roller() {
        let mut ledger = PointsLedger::new(1000);
        let outcome = open_box(&mut ledger, 3, &mut fixed_roll(0.99)).expect("open");
        assert_eq!(outcome.item.rarity, Rarity::Legendary);
        assert_eq!(ledger.points(), 2600);
        assert!(outcome.new_badges.contains(&BadgeType::HighRoller));
    }

    #[test]
    fn open_box_rejects_unknown_box_and_overdraft() {
        let mut ledger = PointsLedger::new(100);
        assert_eq!(
            open_box(&mut ledger, 9, &mut fixed_roll(0.0)),
            Err(GameError::UnknownBox(9))
        );
        assert_eq!(
            open_box(&mut ledger, 3, &mut fixed_roll(0.0)),
            Err(GameError::InsufficientPoints {
                needed: 400,
                available: 100
            })
        );
        assert_eq!(ledger.points(), 100);
        assert!(ledger.badges().is_empty());
    }
}
