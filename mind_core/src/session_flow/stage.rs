//! The one-way cognitive-stage ladder.

use puzzle_rules::RuleCategory;
use serde::{Deserialize, Serialize};

/// Long-term progression. Ordered; a player only ever climbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CognitiveStage {
    Awareness,
    Stability,
    Adaptability,
    Insight,
    Mastery,
}

impl CognitiveStage {
    pub const ALL: [CognitiveStage; 5] = [
        CognitiveStage::Awareness,
        CognitiveStage::Stability,
        CognitiveStage::Adaptability,
        CognitiveStage::Insight,
        CognitiveStage::Mastery,
    ];

    /// Lifetime rounds and lifetime accuracy needed to enter the stage.
    pub fn threshold(&self) -> (u64, f64) {
        match self {
            CognitiveStage::Awareness => (0, 0.0),
            CognitiveStage::Stability => (20, 0.55),
            CognitiveStage::Adaptability => (50, 0.60),
            CognitiveStage::Insight => (100, 0.65),
            CognitiveStage::Mastery => (200, 0.70),
        }
    }

    /// Highest stage the lifetime record qualifies for.
    pub fn qualified(lifetime_rounds: u64, lifetime_accuracy: f64) -> CognitiveStage {
        CognitiveStage::ALL
            .iter()
            .copied()
            .filter(|stage| {
                let (rounds, accuracy) = stage.threshold();
                lifetime_rounds >= rounds && lifetime_accuracy >= accuracy
            })
            .max()
            .unwrap_or(CognitiveStage::Awareness)
    }

    /// Rule categories unlocked at this stage.
    pub fn available_categories(&self) -> Vec<RuleCategory> {
        let unlocked = match self {
            CognitiveStage::Awareness => 1,
            CognitiveStage::Stability => 2,
            CognitiveStage::Adaptability => 3,
            CognitiveStage::Insight => 4,
            CognitiveStage::Mastery => RuleCategory::ALL.len(),
        };
        RuleCategory::ALL.iter().copied().take(unlocked).collect()
    }

    /// Mid-round rule inversion is reserved for players past the basics.
    pub fn allows_inversion(&self) -> bool {
        *self >= CognitiveStage::Adaptability
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CognitiveStage::Awareness => "awareness",
            CognitiveStage::Stability => "stability",
            CognitiveStage::Adaptability => "adaptability",
            CognitiveStage::Insight => "insight",
            CognitiveStage::Mastery => "mastery",
        }
    }
}

impl std::fmt::Display for CognitiveStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
