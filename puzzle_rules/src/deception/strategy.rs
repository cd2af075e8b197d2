//! Deception strategies - interchangeable ways of picking which wrong answers look right.

use serde::{Deserialize, Serialize};

use super::AffordanceProfile;
use crate::elements::GameElement;

/// How a strategy ranks rule-incorrect elements for trap duty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrapCriterion {
    Brightest,
    Centermost,
    Symmetric,
    Largest,
    /// Previously selected by the player.
    Familiar,
    /// Moved since the previous round.
    Motion,
    HighestAffordance,
}

impl TrapCriterion {
    /// Lure strength of an element under this criterion; higher is more tempting.
    pub fn lure(&self, element: &GameElement, profile: &AffordanceProfile) -> f64 {
        match self {
            TrapCriterion::Brightest => element.brightness,
            TrapCriterion::Centermost => -element.distance_from_center,
            TrapCriterion::Symmetric => {
                f64::from(u8::from(element.is_symmetric)) + profile.score * 0.1
            }
            TrapCriterion::Largest => element.size,
            TrapCriterion::Familiar => {
                f64::from(u8::from(element.was_selected_before)) + profile.score * 0.1
            }
            TrapCriterion::Motion => f64::from(u8::from(element.has_moved)) + profile.score * 0.1,
            TrapCriterion::HighestAffordance => profile.score,
        }
    }
}

/// A named deception strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeceptionStrategy {
    pub id: &'static str,
    pub name: &'static str,
    pub difficulty: u8,
    pub criterion: TrapCriterion,
}

/// Every deception strategy the engine can select.
pub static STRATEGY_CATALOG: &[DeceptionStrategy] = &[
    DeceptionStrategy {
        id: "brightest-trap",
        name: "The glare",
        difficulty: 1,
        criterion: TrapCriterion::Brightest,
    },
    DeceptionStrategy {
        id: "centermost-trap",
        name: "The centre of gravity",
        difficulty: 2,
        criterion: TrapCriterion::Centermost,
    },
    DeceptionStrategy {
        id: "symmetric-trap",
        name: "The perfect form",
        difficulty: 2,
        criterion: TrapCriterion::Symmetric,
    },
    DeceptionStrategy {
        id: "largest-trap",
        name: "The giant",
        difficulty: 3,
        criterion: TrapCriterion::Largest,
    },
    DeceptionStrategy {
        id: "familiar-trap",
        name: "The old friend",
        difficulty: 4,
        criterion: TrapCriterion::Familiar,
    },
    DeceptionStrategy {
        id: "motion-trap",
        name: "The wanderer",
        difficulty: 4,
        criterion: TrapCriterion::Motion,
    },
    DeceptionStrategy {
        id: "affordance-trap",
        name: "The obvious choice",
        difficulty: 5,
        criterion: TrapCriterion::HighestAffordance,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_starts_easy() {
        assert!(STRATEGY_CATALOG.iter().any(|s| s.difficulty <= 1));
    }

    #[test]
    fn test_ids_unique() {
        for (i, a) in STRATEGY_CATALOG.iter().enumerate() {
            for b in &STRATEGY_CATALOG[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }
}
