//! Archetype Engine - play-style classification for end-of-session feedback.
//!
//! Four scores compete; each recorded action nudges them. The dominant
//! archetype only changes when the leader exceeds the runner-up by more
//! than [`DOMINANCE_MARGIN`]. Cumulative score drives the evolution ladder.

mod breakthrough;
mod evolution;

pub use breakthrough::*;
pub use evolution::*;

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::info;

/// Lead the top score must exceed over the runner-up to take dominance.
pub const DOMINANCE_MARGIN: f64 = 10.0;

pub const BREAKTHROUGH_LOG_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    Observer,
    Strategist,
    Reactor,
    Architect,
}

impl Archetype {
    pub const ALL: [Archetype; 4] = [
        Archetype::Observer,
        Archetype::Strategist,
        Archetype::Reactor,
        Archetype::Architect,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Archetype::Observer => "Observer",
            Archetype::Strategist => "Strategist",
            Archetype::Reactor => "Reactor",
            Archetype::Architect => "Architect",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Archetype::Observer => "You watch until the pattern shows itself.",
            Archetype::Strategist => "You weigh every option before committing.",
            Archetype::Reactor => "You trust your first instinct and it rarely fails you.",
            Archetype::Architect => "You build a model of the rules and adapt it as they shift.",
        }
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// The shape of one player action, as the session classifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionShape {
    DeliberateCorrect,
    ImpulsiveCorrect,
    TrapAvoided,
    RuleAdapted,
    PatternFound,
}

impl ActionShape {
    /// Score nudges in observer, strategist, reactor, architect order.
    pub fn nudges(&self) -> [f64; 4] {
        match self {
            ActionShape::DeliberateCorrect => [3.0, 2.0, 0.0, 0.0],
            ActionShape::ImpulsiveCorrect => [0.0, 0.0, 3.0, 1.0],
            ActionShape::TrapAvoided => [2.0, 2.0, 0.0, 0.0],
            ActionShape::RuleAdapted => [0.0, 1.0, 0.0, 3.0],
            ActionShape::PatternFound => [1.0, 0.0, 0.0, 2.0],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeScores {
    pub observer: f64,
    pub strategist: f64,
    pub reactor: f64,
    pub architect: f64,
}

impl ArchetypeScores {
    pub fn get(&self, archetype: Archetype) -> f64 {
        match archetype {
            Archetype::Observer => self.observer,
            Archetype::Strategist => self.strategist,
            Archetype::Reactor => self.reactor,
            Archetype::Architect => self.architect,
        }
    }

    pub fn total(&self) -> f64 {
        self.observer + self.strategist + self.reactor + self.architect
    }

    fn apply(&mut self, nudges: [f64; 4]) {
        self.observer += nudges[0];
        self.strategist += nudges[1];
        self.reactor += nudges[2];
        self.architect += nudges[3];
    }

    /// Highest and second-highest archetypes with their scores.
    fn ranked(&self) -> [(Archetype, f64); 2] {
        let mut all: Vec<(Archetype, f64)> =
            Archetype::ALL.iter().map(|a| (*a, self.get(*a))).collect();
        all.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        [all[0], all[1]]
    }
}

/// End-of-session summary of the player's style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeProfile {
    pub scores: ArchetypeScores,
    pub dominant: Option<Archetype>,
    pub stage: EvolutionStage,
    pub narrative: String,
    pub breakthroughs: Vec<Breakthrough>,
}

pub struct ArchetypeEngine {
    scores: ArchetypeScores,
    dominant: Option<Archetype>,
    stage: EvolutionStage,
    breakthroughs: VecDeque<Breakthrough>,
    actions_recorded: u64,
}

impl ArchetypeEngine {
    pub fn new() -> Self {
        Self {
            scores: ArchetypeScores::default(),
            dominant: None,
            stage: EvolutionStage::Dormant,
            breakthroughs: VecDeque::with_capacity(BREAKTHROUGH_LOG_LIMIT),
            actions_recorded: 0,
        }
    }

    pub fn scores(&self) -> &ArchetypeScores {
        &self.scores
    }

    pub fn dominant(&self) -> Option<Archetype> {
        self.dominant
    }

    pub fn stage(&self) -> EvolutionStage {
        self.stage
    }

    pub fn actions_recorded(&self) -> u64 {
        self.actions_recorded
    }

    pub fn breakthroughs(&self) -> impl Iterator<Item = &Breakthrough> {
        self.breakthroughs.iter()
    }

    /// Nudge the scores. Returns any breakthroughs the action triggered.
    pub fn record_action(&mut self, shape: ActionShape, timestamp_ms: u64) -> Vec<Breakthrough> {
        self.scores.apply(shape.nudges());
        self.actions_recorded += 1;

        let mut new = Vec::new();

        let [(leader, top), (_, second)] = self.scores.ranked();
        if self.dominant != Some(leader) && top - second > DOMINANCE_MARGIN {
            info!(from = ?self.dominant, to = %leader, "Archetype shift");
            self.dominant = Some(leader);
            new.push(Breakthrough::archetype_shift(leader, timestamp_ms));
        }

        let stage = EvolutionStage::for_score(self.scores.total());
        if stage > self.stage {
            info!(from = %self.stage, to = %stage, "Evolution stage reached");
            self.stage = stage;
            new.push(Breakthrough::evolution(stage, timestamp_ms));
        }

        for breakthrough in &new {
            self.push_breakthrough(breakthrough.clone());
        }
        new
    }

    fn push_breakthrough(&mut self, breakthrough: Breakthrough) {
        self.breakthroughs.push_back(breakthrough);
        while self.breakthroughs.len() > BREAKTHROUGH_LOG_LIMIT {
            self.breakthroughs.pop_front();
        }
    }

    fn narrative(&self) -> String {
        match self.dominant {
            Some(archetype) => format!(
                "{} {} {}",
                archetype.description(),
                self.stage.title(),
                self.stage.description().to_lowercase()
            ),
            None => format!(
                "Your style is still taking shape. {}",
                self.stage.description()
            ),
        }
    }

    pub fn profile(&self) -> ArchetypeProfile {
        ArchetypeProfile {
            scores: self.scores,
            dominant: self.dominant,
            stage: self.stage,
            narrative: self.narrative(),
            breakthroughs: self.breakthroughs.iter().cloned().collect(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ArchetypeEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominance_needs_margin() {
        let mut engine = ArchetypeEngine::new();
        for i in 0..9 {
            let found = engine.record_action(ActionShape::DeliberateCorrect, i);
            assert!(found.is_empty());
        }
        assert_eq!(engine.dominant(), None);

        // observer 30 vs strategist 20: a lead equal to the margin is not enough
        let found = engine.record_action(ActionShape::DeliberateCorrect, 9);
        assert_eq!(engine.dominant(), None);
        assert_eq!(engine.stage(), EvolutionStage::Awakening);
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].kind,
            BreakthroughKind::Evolution(EvolutionStage::Awakening)
        );
        assert_eq!(found[0].timestamp_ms, 9);

        let found = engine.record_action(ActionShape::DeliberateCorrect, 10);
        assert_eq!(engine.dominant(), Some(Archetype::Observer));
        assert_eq!(found.len(), 1);
        assert_eq!(
            found[0].kind,
            BreakthroughKind::ArchetypeShift(Archetype::Observer)
        );
    }

    #[test]
    fn test_lead_equal_to_margin_keeps_dominant() {
        let mut engine = ArchetypeEngine::new();
        for i in 0..11 {
            engine.record_action(ActionShape::DeliberateCorrect, i);
        }
        assert_eq!(engine.dominant(), Some(Archetype::Observer));

        // reactor 33 + 3k vs observer 33: k = 14 leads by 9, k = 15 by 12
        for i in 0..14 {
            engine.record_action(ActionShape::ImpulsiveCorrect, 100 + i);
        }
        assert_eq!(engine.scores().reactor, 42.0);
        assert_eq!(engine.dominant(), Some(Archetype::Observer));

        let found = engine.record_action(ActionShape::ImpulsiveCorrect, 200);
        assert_eq!(engine.dominant(), Some(Archetype::Reactor));
        assert!(found
            .iter()
            .any(|b| b.kind == BreakthroughKind::ArchetypeShift(Archetype::Reactor)));
    }

    #[test]
    fn test_exact_margin_does_not_shift() {
        let mut engine = ArchetypeEngine::new();
        for i in 0..5 {
            engine.record_action(ActionShape::TrapAvoided, i);
        }
        for i in 0..5 {
            engine.record_action(ActionShape::PatternFound, 10 + i);
        }
        // observer 15, strategist 10, architect 10
        assert_eq!(engine.dominant(), None);
        for i in 0..5 {
            engine.record_action(ActionShape::DeliberateCorrect, 20 + i);
        }
        // observer 30, strategist 20, architect 10: lead exactly 10
        assert_eq!(engine.scores().observer - engine.scores().strategist, DOMINANCE_MARGIN);
        assert_eq!(engine.dominant(), None);
    }

    #[test]
    fn test_stages_climb_once() {
        let mut engine = ArchetypeEngine::new();
        for i in 0..400 {
            engine.record_action(ActionShape::RuleAdapted, i);
        }
        assert_eq!(engine.stage(), EvolutionStage::Transcendent);
        let evolutions = engine
            .breakthroughs()
            .filter(|b| matches!(b.kind, BreakthroughKind::Evolution(_)))
            .count();
        assert_eq!(evolutions, 5);
    }

    #[test]
    fn test_log_is_capped() {
        let mut engine = ArchetypeEngine::new();
        for i in 0..60 {
            engine.push_breakthrough(Breakthrough::evolution(EvolutionStage::Awakening, i));
        }
        let kept: Vec<u64> = engine.breakthroughs().map(|b| b.timestamp_ms).collect();
        assert_eq!(kept.len(), BREAKTHROUGH_LOG_LIMIT);
        assert_eq!(kept[0], 10);
    }

    #[test]
    fn test_profile_and_reset() {
        let mut engine = ArchetypeEngine::new();
        assert!(engine.profile().narrative.starts_with("Your style is still taking shape."));
        for i in 0..20 {
            engine.record_action(ActionShape::PatternFound, i);
        }
        let profile = engine.profile();
        assert_eq!(profile.dominant, Some(Archetype::Architect));
        assert!(profile.narrative.starts_with(Archetype::Architect.description()));
        assert_eq!(profile.scores.total(), 60.0);

        engine.reset();
        assert_eq!(engine.actions_recorded(), 0);
        assert_eq!(engine.dominant(), None);
    }
}
