//! Find the Thief: conditional probability over a suspect list.

use proto::GameError;
use tracing::debug;

use crate::badge::BadgeType;
use crate::ledger::PointsLedger;

/// Points for catching the thief.
pub const CORRECT_ACCUSATION_REWARD: i64 = 100;
/// Points lost for accusing the wrong suspect.
pub const WRONG_ACCUSATION_PENALTY: i64 = -25;

/// Suspect property a clue speaks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    KitchenAccess,
    Crumbs,
    Motive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suspect {
    pub id: &'static str,
    pub name: &'static str,
    pub avatar: &'static str,
    pub has_kitchen_access: bool,
    pub has_crumbs: bool,
    pub motive: &'static str,
}

impl Suspect {
    /// Value of `attribute` as it appears in clue text keys.
    pub fn attribute_value(&self, attribute: Attribute) -> &'static str {
        fn flag(value: bool) -> &'static str {
            if value { "true" } else { "false" }
        }
        match attribute {
            Attribute::KitchenAccess => flag(self.has_kitchen_access),
            Attribute::Crumbs => flag(self.has_crumbs),
            Attribute::Motive => self.motive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clue {
    pub id: u32,
    pub attribute: Attribute,
    /// Clue text keyed by attribute value.
    pub texts: &'static [(&'static str, &'static str)],
}

impl Clue {
    pub fn text_for(&self, value: &str) -> Option<&'static str> {
        self.texts
            .iter()
            .find(|(key, _)| *key == value)
            .map(|(_, text)| *text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameCase {
    pub id: &'static str,
    pub title: &'static str,
    pub story: &'static str,
    pub guilty_suspect_id: &'static str,
    pub suspects: &'static [Suspect],
    pub clues: &'static [Clue],
}

impl GameCase {
    pub fn suspect(&self, id: &str) -> Result<&'static Suspect, GameError> {
        self.suspects
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| GameError::UnknownSuspect(id.to_string()))
    }

    pub fn guilty(&self) -> Result<&'static Suspect, GameError> {
        self.suspect(self.guilty_suspect_id)
    }
}

pub static GAME_CASES: [GameCase; 1] = [GameCase {
    id: "case-01",
    title: "The Case of the Missing Cake",
    story: "Disaster! Someone has stolen the prized Victoria Sponge from the mansion kitchen just before the annual bake-off. We have a list of suspects, but we need your help to find the culprit!",
    guilty_suspect_id: "butler",
    suspects: &[
        Suspect {
            id: "chef",
            name: "Chef Usman",
            avatar: "👨‍🍳",
            has_kitchen_access: true,
            has_crumbs: false,
            motive: "rivalry",
        },
        Suspect {
            id: "butler",
            name: "Ramzan the Butler",
            avatar: "🤵",
            has_kitchen_access: true,
            has_crumbs: true,
            motive: "hunger",
        },
        Suspect {
            id: "gardener",
            name: "Shama",
            avatar: "👩‍🌾",
            has_kitchen_access: false,
            has_crumbs: false,
            motive: "revenge",
        },
        Suspect {
            id: "maid",
            name: "Wishal the maid",
            avatar: "🧹",
            has_kitchen_access: true,
            has_crumbs: true,
            motive: "distraction",
        },
        Suspect {
            id: "countess",
            name: "Ramisha",
            avatar: "👑",
            has_kitchen_access: false,
            has_crumbs: false,
            motive: "sabotage",
        },
    ],
    clues: &[
        Clue {
            id: 1,
            attribute: Attribute::KitchenAccess,
            texts: &[
                ("true", "A witness confirms the thief had access to the kitchen."),
                ("false", "Security footage shows the thief did not enter the kitchen."),
            ],
        },
        Clue {
            id: 2,
            attribute: Attribute::Crumbs,
            texts: &[
                ("true", "Forensics found cake crumbs on the culprit's uniform."),
                ("false", "The culprit was surprisingly clean, with no crumbs found on them."),
            ],
        },
        Clue {
            id: 3,
            attribute: Attribute::Motive,
            texts: &[
                ("hunger", "The thief was heard complaining about being hungry all morning."),
                ("rivalry", "The culprit has a history of professional jealousy with the head chef."),
                ("revenge", "The suspect was recently reprimanded and was heard vowing revenge."),
                ("sabotage", "A source says the suspect wanted to sabotage the bake-off to make the host look bad."),
                ("distraction", "The thief seemed to be creating a diversion to cover up another mistake."),
            ],
        },
    ],
}];

/// Result of an accusation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    pub guilty: &'static Suspect,
    pub points_delta: i64,
    pub new_badges: Vec<BadgeType>,
}

/// One playthrough of a case.
#[derive(Debug, Clone)]
pub struct Investigation {
    case: &'static GameCase,
    revealed: usize,
    verdict: Option<bool>,
}

impl Investigation {
    pub fn new(case: &'static GameCase) -> Self {
        Self {
            case,
            revealed: 0,
            verdict: None,
        }
    }

    pub fn case(&self) -> &'static GameCase {
        self.case
    }

    pub fn is_closed(&self) -> bool {
        self.verdict.is_some()
    }

    /// `Some(true)` once the thief was caught, `Some(false)` after a wrong guess.
    pub fn verdict(&self) -> Option<bool> {
        self.verdict
    }

    pub fn clues_left(&self) -> usize {
        self.case.clues.len() - self.revealed
    }

    /// Reveals the next clue and returns its text.
    pub fn reveal_next_clue(&mut self) -> Result<&'static str, GameError> {
        if self.is_closed() {
            return Err(GameError::CaseClosed);
        }
        let clue = self
            .case
            .clues
            .get(self.revealed)
            .ok_or(GameError::NoCluesLeft)?;
        let text = self.clue_text(clue)?;
        self.revealed += 1;
        debug!(case = self.case.id, clue = clue.id, "Clue revealed");
        Ok(text)
    }

    /// Texts of the clues revealed so far.
    pub fn revealed_clues(&self) -> Vec<&'static str> {
        self.case.clues[..self.revealed]
            .iter()
            .filter_map(|clue| self.clue_text(clue).ok())
            .collect()
    }

    fn clue_text(&self, clue: &Clue) -> Result<&'static str, GameError> {
        let guilty = self.case.guilty()?;
        clue.text_for(guilty.attribute_value(clue.attribute))
            .ok_or_else(|| GameError::UnknownSuspect(guilty.id.to_string()))
    }

    /// Suspects consistent with every revealed clue.
    pub fn remaining_suspects(&self) -> Vec<&'static Suspect> {
        let Ok(guilty) = self.case.guilty() else {
            return Vec::new();
        };
        let revealed = &self.case.clues[..self.revealed];
        self.case
            .suspects
            .iter()
            .filter(|suspect| {
                revealed.iter().all(|clue| {
                    suspect.attribute_value(clue.attribute) == guilty.attribute_value(clue.attribute)
                })
            })
            .collect()
    }

    /// P(suspect is the thief | revealed clues), uniform over the remaining suspects.
    pub fn suspicion(&self, suspect_id: &str) -> Result<f64, GameError> {
        self.case.suspect(suspect_id)?;
        let remaining = self.remaining_suspects();
        if remaining.iter().any(|s| s.id == suspect_id) {
            Ok(1.0 / remaining.len() as f64)
        } else {
            Ok(0.0)
        }
    }

    /// Accuses `suspect_id`, closing the case.
    pub fn accuse(
        &mut self,
        ledger: &mut PointsLedger,
        suspect_id: &str,
    ) -> Result<Verdict, GameError> {
        if self.is_closed() {
            return Err(GameError::CaseClosed);
        }
        self.case.suspect(suspect_id)?;
        let guilty = self.case.guilty()?;
        let correct = guilty.id == suspect_id;

        let mut new_badges = Vec::new();
        let points_delta = if correct {
            if ledger.award(BadgeType::MasterDetective) {
                new_badges.push(BadgeType::MasterDetective);
            }
            CORRECT_ACCUSATION_REWARD
        } else {
            WRONG_ACCUSATION_PENALTY
        };
        new_badges.extend(ledger.apply(points_delta));
        self.verdict = Some(correct);

        debug!(case = self.case.id, suspect = suspect_id, correct, "Accusation made");
        Ok(Verdict {
            correct,
            guilty,
            points_delta,
            new_badges,
        })
    }
}
