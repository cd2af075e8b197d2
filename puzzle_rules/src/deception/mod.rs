//! Deception Engine - plants attractive wrong answers.
//!
//! Given the element set (already resolved against the hidden rule), the engine
//! picks one strategy, scores every element's affordance, and promotes the most
//! tempting rule-incorrect elements to traps. Traps are only ever drawn from
//! incorrect elements, so the trap set and the rule-correct set are disjoint.

mod affordance;
mod strategy;

pub use affordance::*;
pub use strategy::*;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::config::PlayArea;
use crate::elements::{ElementId, GameElement, SceneFacts};

/// Hesitation after which a decaying element stops being a valid answer.
pub const HESITATION_DECAY_MS: u64 = 2000;

/// Traps per difficulty point unless overridden.
pub const DEFAULT_TRAP_FACTOR: f64 = 0.3;

/// What deception did to a round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeceptionOutcome {
    pub strategy_id: &'static str,
    pub traps: Vec<ElementId>,
    /// Every rule-correct element.
    pub correct: Vec<ElementId>,
    /// Rule-correct elements with the weakest appeal (at most two).
    pub unappealing: Vec<ElementId>,
}

impl DeceptionOutcome {
    /// Re-read the correct and trap sets from element flags after something
    /// else has rewritten them.
    pub fn sync_with(&mut self, elements: &[GameElement]) {
        self.correct = elements.iter().filter(|e| e.is_correct()).map(|e| e.id).collect();
        self.traps = elements.iter().filter(|e| e.is_trap()).map(|e| e.id).collect();
        let correct = &self.correct;
        self.unappealing.retain(|id| correct.contains(id));
    }
}

/// Selects traps and tracks per-element affordance for the current round.
pub struct DeceptionEngine {
    rng: ChaCha8Rng,
    area: PlayArea,
    trap_factor: f64,
    profiles: HashMap<ElementId, AffordanceProfile>,
    active: Option<&'static DeceptionStrategy>,
}

impl DeceptionEngine {
    pub fn new(area: PlayArea) -> Self {
        Self::from_rng(area, ChaCha8Rng::from_entropy())
    }

    pub fn with_seed(area: PlayArea, seed: u64) -> Self {
        Self::from_rng(area, ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(area: PlayArea, rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            area,
            trap_factor: DEFAULT_TRAP_FACTOR,
            profiles: HashMap::new(),
            active: None,
        }
    }

    pub fn set_trap_factor(&mut self, factor: f64) {
        self.trap_factor = factor.max(0.0);
    }

    pub fn active_strategy(&self) -> Option<&'static DeceptionStrategy> {
        self.active
    }

    /// Number of traps for a difficulty, never fewer than one.
    pub fn trap_budget(&self, difficulty: f64) -> usize {
        ((difficulty.max(0.0) * self.trap_factor).floor() as usize).max(1)
    }

    /// Strategies available at a difficulty.
    pub fn strategies_for(difficulty: f64) -> Vec<&'static DeceptionStrategy> {
        STRATEGY_CATALOG
            .iter()
            .filter(|s| f64::from(s.difficulty) <= difficulty + 1.0)
            .collect()
    }

    /// Pick a strategy for the difficulty and apply it to the element set.
    pub fn initialize_deception(
        &mut self,
        difficulty: f64,
        elements: &mut [GameElement],
    ) -> DeceptionOutcome {
        let strategy = Self::strategies_for(difficulty)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(&STRATEGY_CATALOG[0]);
        self.apply_strategy(strategy, difficulty, elements)
    }

    /// Apply a specific strategy.
    pub fn apply_strategy(
        &mut self,
        strategy: &'static DeceptionStrategy,
        difficulty: f64,
        elements: &mut [GameElement],
    ) -> DeceptionOutcome {
        self.active = Some(strategy);
        let scene = SceneFacts::from_elements(elements, &self.area);
        self.profiles = elements
            .iter()
            .map(|e| (e.id, AffordanceProfile::compute(e, &scene)))
            .collect();

        let mut lures: Vec<(usize, f64)> = elements
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_correct())
            .map(|(i, e)| (i, strategy.criterion.lure(e, &self.profiles[&e.id])))
            .collect();
        lures.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let budget = self.trap_budget(difficulty);
        let mut traps = Vec::new();
        for (rank, (index, _)) in lures.iter().enumerate() {
            let element = &mut elements[*index];
            if rank < budget {
                element.mark_trap();
                traps.push(element.id);
            } else {
                element.mark_decoy();
            }
        }

        let mut correct: Vec<(ElementId, f64)> = elements
            .iter()
            .filter(|e| e.is_correct())
            .map(|e| (e.id, self.profiles[&e.id].score))
            .collect();
        let correct_ids: Vec<ElementId> = correct.iter().map(|(id, _)| *id).collect();
        correct.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let unappealing = correct.iter().take(2).map(|(id, _)| *id).collect();

        debug!(
            strategy = strategy.id,
            traps = traps.len(),
            correct = correct_ids.len(),
            "Deception applied"
        );

        DeceptionOutcome {
            strategy_id: strategy.id,
            traps,
            correct: correct_ids,
            unappealing,
        }
    }

    pub fn profile(&self, id: ElementId) -> Option<&AffordanceProfile> {
        self.profiles.get(&id)
    }

    /// Whether hesitation has invalidated an obviously attractive element.
    pub fn check_hesitation_decay(&self, id: ElementId, hesitation_ms: u64) -> bool {
        self.profiles
            .get(&id)
            .map(|p| p.decays_on_hesitation && hesitation_ms > HESITATION_DECAY_MS)
            .unwrap_or(false)
    }

    /// Forget the current round's profiles and strategy.
    pub fn reset(&mut self) {
        self.profiles.clear();
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{update_center_distances, ElementColor, Position, Shape};

    fn scene_elements(area: &PlayArea) -> Vec<GameElement> {
        let mut elements = vec![
            // Attractive and correct.
            GameElement::new(ElementId::slot(0), Shape::Circle, ElementColor::Red, area.center())
                .with_size(56.0)
                .with_brightness(1.0),
            GameElement::new(
                ElementId::slot(1),
                Shape::Star,
                ElementColor::Yellow,
                Position::new(area.center().x + 60.0, area.center().y),
            )
            .with_size(50.0)
            .with_brightness(0.95),
            GameElement::new(
                ElementId::slot(2),
                Shape::Square,
                ElementColor::Blue,
                Position::new(area.min_x(), area.min_y()),
            )
            .with_size(30.0)
            .with_brightness(0.2),
            GameElement::new(
                ElementId::slot(3),
                Shape::Hexagon,
                ElementColor::Green,
                Position::new(area.max_x(), area.max_y()),
            )
            .with_size(28.0)
            .with_brightness(0.3),
        ];
        update_center_distances(&mut elements, area);
        elements[0].mark_correct();
        elements[2].mark_correct();
        elements
    }

    #[test]
    fn test_trap_budget() {
        let engine = DeceptionEngine::with_seed(PlayArea::default(), 1);
        assert_eq!(engine.trap_budget(1.0), 1);
        assert_eq!(engine.trap_budget(3.0), 1);
        assert_eq!(engine.trap_budget(7.0), 2);
        assert_eq!(engine.trap_budget(10.0), 3);
    }

    #[test]
    fn test_strategies_for_difficulty() {
        assert!(DeceptionEngine::strategies_for(0.0)
            .iter()
            .all(|s| s.difficulty <= 1));
        assert_eq!(
            DeceptionEngine::strategies_for(10.0).len(),
            STRATEGY_CATALOG.len()
        );
    }

    #[test]
    fn test_brightest_strategy_picks_bright_incorrect() {
        let area = PlayArea::default();
        let mut engine = DeceptionEngine::with_seed(area, 1);
        let mut elements = scene_elements(&area);

        let outcome = engine.apply_strategy(&STRATEGY_CATALOG[0], 1.0, &mut elements);
        assert_eq!(outcome.traps, vec![ElementId::slot(1)]);
        assert!(elements[1].is_trap());
        assert!(!elements[3].is_trap());
        assert_eq!(outcome.correct, vec![ElementId::slot(0), ElementId::slot(2)]);
        assert_eq!(outcome.unappealing.first(), Some(&ElementId::slot(2)));
    }

    #[test]
    fn test_outcome_follows_rewritten_flags() {
        let area = PlayArea::default();
        let mut engine = DeceptionEngine::with_seed(area, 1);
        let mut elements = scene_elements(&area);
        let mut outcome = engine.apply_strategy(&STRATEGY_CATALOG[0], 1.0, &mut elements);

        elements[1].mark_correct();
        elements[2].mark_decoy();
        outcome.sync_with(&elements);

        assert_eq!(outcome.correct, vec![ElementId::slot(0), ElementId::slot(1)]);
        assert!(outcome.traps.is_empty());
        assert!(!outcome.unappealing.contains(&ElementId::slot(2)));
    }

    #[test]
    fn test_traps_disjoint_from_correct_at_every_difficulty() {
        let area = PlayArea::default();
        let mut engine = DeceptionEngine::with_seed(area, 42);
        for difficulty in 1..=10 {
            for _ in 0..20 {
                let mut elements = scene_elements(&area);
                let outcome = engine.initialize_deception(difficulty as f64, &mut elements);
                for trap in &outcome.traps {
                    assert!(!outcome.correct.contains(trap));
                }
                assert!(elements.iter().all(|e| !(e.is_correct() && e.is_trap())));
            }
        }
    }

    #[test]
    fn test_hesitation_decay_threshold() {
        let area = PlayArea::default();
        let mut engine = DeceptionEngine::with_seed(area, 1);
        let mut elements = scene_elements(&area);
        engine.apply_strategy(&STRATEGY_CATALOG[0], 1.0, &mut elements);

        let attractive = ElementId::slot(0);
        assert!(engine.profile(attractive).unwrap().decays_on_hesitation);
        assert!(engine.check_hesitation_decay(attractive, 2001));
        assert!(!engine.check_hesitation_decay(attractive, 1999));

        let dull = ElementId::slot(2);
        assert!(!engine.check_hesitation_decay(dull, 10_000));
    }

    #[test]
    fn test_unknown_element_never_decays() {
        let engine = DeceptionEngine::with_seed(PlayArea::default(), 1);
        assert!(!engine.check_hesitation_decay(ElementId::slot(9), 5000));
    }

    #[test]
    fn test_reset_clears_profiles() {
        let area = PlayArea::default();
        let mut engine = DeceptionEngine::with_seed(area, 1);
        let mut elements = scene_elements(&area);
        engine.initialize_deception(3.0, &mut elements);
        engine.reset();
        assert!(engine.profile(ElementId::slot(0)).is_none());
        assert!(engine.active_strategy().is_none());
    }
}
