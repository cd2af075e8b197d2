use serde::{Deserialize, Serialize};

/// Six-level evolution ladder driven by cumulative archetype score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvolutionStage {
    Dormant,
    Awakening,
    Attuned,
    Perceptive,
    Lucid,
    Transcendent,
}

impl EvolutionStage {
    pub const ALL: [EvolutionStage; 6] = [
        EvolutionStage::Dormant,
        EvolutionStage::Awakening,
        EvolutionStage::Attuned,
        EvolutionStage::Perceptive,
        EvolutionStage::Lucid,
        EvolutionStage::Transcendent,
    ];

    /// Cumulative score needed to reach the stage.
    pub fn threshold(&self) -> f64 {
        match self {
            EvolutionStage::Dormant => 0.0,
            EvolutionStage::Awakening => 50.0,
            EvolutionStage::Attuned => 150.0,
            EvolutionStage::Perceptive => 350.0,
            EvolutionStage::Lucid => 700.0,
            EvolutionStage::Transcendent => 1200.0,
        }
    }

    pub fn for_score(score: f64) -> EvolutionStage {
        EvolutionStage::ALL
            .iter()
            .rev()
            .copied()
            .find(|stage| score >= stage.threshold())
            .unwrap_or(EvolutionStage::Dormant)
    }

    pub fn title(&self) -> &'static str {
        match self {
            EvolutionStage::Dormant => "Dormant",
            EvolutionStage::Awakening => "Awakening",
            EvolutionStage::Attuned => "Attuned",
            EvolutionStage::Perceptive => "Perceptive",
            EvolutionStage::Lucid => "Lucid",
            EvolutionStage::Transcendent => "Transcendent",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EvolutionStage::Dormant => "The patterns have not yet noticed you.",
            EvolutionStage::Awakening => "Something in the noise has started to make sense.",
            EvolutionStage::Attuned => "You move with the rules instead of against them.",
            EvolutionStage::Perceptive => "Shifts that once surprised you now feel expected.",
            EvolutionStage::Lucid => "You see the shape of a rule before it finishes forming.",
            EvolutionStage::Transcendent => "The hidden order has nothing left to hide from you.",
        }
    }
}

impl std::fmt::Display for EvolutionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_score() {
        assert_eq!(EvolutionStage::for_score(0.0), EvolutionStage::Dormant);
        assert_eq!(EvolutionStage::for_score(49.9), EvolutionStage::Dormant);
        assert_eq!(EvolutionStage::for_score(50.0), EvolutionStage::Awakening);
        assert_eq!(EvolutionStage::for_score(699.0), EvolutionStage::Perceptive);
        assert_eq!(EvolutionStage::for_score(5000.0), EvolutionStage::Transcendent);
    }
}
