//! Rule Engine - owns the hidden win condition and mutates it silently.
//!
//! Exactly one rule is active at a time. The engine counts rounds since the
//! last change and, once a randomized threshold of 4-6 rounds is reached,
//! flags that the rule should mutate. Mutation itself is applied by the owner
//! between rounds so a predicate never changes mid-selection.

mod catalog;
mod context;

pub use catalog::*;
pub use context::*;

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domains::DomainWeights;
use crate::elements::GameElement;

/// Minimum rounds between mutations.
pub const MUTATION_BASE_ROUNDS: u32 = 4;

/// Extra rounds randomly added on top of the base (inclusive).
pub const MUTATION_JITTER_ROUNDS: u32 = 2;

/// Subtle environmental feedback for a selection. Never reveals the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentResponse {
    /// Correct selection.
    Resonate,
    /// Incorrect selection.
    Absorb,
    /// Incorrect selection while a mutation is pending.
    Tremor,
}

/// The result of evaluating one selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub is_correct: bool,
    pub should_mutate: bool,
    pub environment_response: EnvironmentResponse,
}

/// Holds and evolves the active hidden rule.
pub struct RuleEngine {
    rng: ChaCha8Rng,
    active: Option<&'static HiddenRule>,
    rounds_since_mutation: u32,
    mutation_threshold: u32,
    last_counted_round: Option<u32>,
    available: Vec<RuleCategory>,
    history_available: bool,
    inverted: bool,
    mutation_count: u32,
}

impl RuleEngine {
    /// Create an engine seeded from system entropy.
    pub fn new() -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy())
    }

    /// Create an engine with a fixed seed (for testing).
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(mut rng: ChaCha8Rng) -> Self {
        let mutation_threshold = Self::draw_threshold(&mut rng);
        Self {
            rng,
            active: None,
            rounds_since_mutation: 0,
            mutation_threshold,
            last_counted_round: None,
            available: RuleCategory::ALL.to_vec(),
            history_available: false,
            inverted: false,
            mutation_count: 0,
        }
    }

    fn draw_threshold(rng: &mut ChaCha8Rng) -> u32 {
        MUTATION_BASE_ROUNDS + rng.gen_range(0..=MUTATION_JITTER_ROUNDS)
    }

    pub fn active_rule(&self) -> Option<&'static HiddenRule> {
        self.active
    }

    pub fn rounds_since_mutation(&self) -> u32 {
        self.rounds_since_mutation
    }

    pub fn mutation_threshold(&self) -> u32 {
        self.mutation_threshold
    }

    pub fn mutation_count(&self) -> u32 {
        self.mutation_count
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Restrict selection to the given categories. An empty list keeps static rules only.
    pub fn set_available_categories(&mut self, categories: &[RuleCategory]) {
        self.available = if categories.is_empty() {
            vec![RuleCategory::Static]
        } else {
            categories.to_vec()
        };
    }

    /// Whether a previous round exists for history-dependent rules.
    pub fn set_history_available(&mut self, available: bool) {
        self.history_available = available;
    }

    /// Whether a rule passes category gating and the history requirement.
    pub fn is_eligible(&self, rule: &HiddenRule) -> bool {
        self.available.contains(&rule.category)
            && (self.history_available || !rule.requires_history())
    }

    /// Rules eligible at the requested complexity.
    pub fn candidates(&self, complexity: u8) -> Vec<&'static HiddenRule> {
        let ceiling = complexity.saturating_add(2);
        let candidates: Vec<_> = RULE_CATALOG
            .iter()
            .filter(|rule| rule.complexity <= ceiling && self.is_eligible(rule))
            .collect();

        if candidates.is_empty() {
            RULE_CATALOG
                .iter()
                .filter(|rule| rule.category == RuleCategory::Static && !rule.requires_history())
                .collect()
        } else {
            candidates
        }
    }

    /// Pick a rule uniformly among templates no more than two steps above `complexity`.
    pub fn initialize_rule(&mut self, complexity: u8) -> &'static HiddenRule {
        let candidates = self.candidates(complexity);
        let rule = candidates
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_else(fallback_rule);
        self.activate(rule);
        rule
    }

    /// Pick a rule weighted by how much the bias favours each rule's domain.
    pub fn initialize_rule_biased(
        &mut self,
        complexity: u8,
        bias: &DomainWeights,
    ) -> &'static HiddenRule {
        let candidates = self.candidates(complexity);
        let weights: Vec<f64> = candidates
            .iter()
            .map(|rule| bias.weight(rule.category.domain()))
            .collect();

        match WeightedIndex::new(&weights) {
            Ok(dist) => {
                let rule = candidates[dist.sample(&mut self.rng)];
                self.activate(rule);
                rule
            }
            Err(_) => self.initialize_rule(complexity),
        }
    }

    /// Make a specific rule active, resetting the mutation cadence.
    pub fn force_rule(&mut self, rule: &'static HiddenRule) {
        self.activate(rule);
    }

    fn activate(&mut self, rule: &'static HiddenRule) {
        debug!(rule = rule.id, complexity = rule.complexity, "Rule activated");
        self.active = Some(rule);
        self.inverted = false;
        self.reset_cadence();
    }

    fn reset_cadence(&mut self) {
        self.rounds_since_mutation = 0;
        self.mutation_threshold = Self::draw_threshold(&mut self.rng);
    }

    /// Apply the active predicate, honouring an inversion.
    pub fn evaluate(&self, element: &GameElement, ctx: &RuleContext<'_>) -> bool {
        match self.active {
            Some(rule) => rule.evaluate(element, ctx) != self.inverted,
            None => false,
        }
    }

    /// Evaluate a selection and advance the per-round mutation counter.
    ///
    /// The counter advances once per distinct round, however many selections
    /// that round sees.
    pub fn evaluate_selection(
        &mut self,
        element: &GameElement,
        ctx: &RuleContext<'_>,
    ) -> RuleEvaluation {
        if self.last_counted_round != Some(ctx.round) {
            self.last_counted_round = Some(ctx.round);
            self.rounds_since_mutation += 1;
        }

        let is_correct = self.evaluate(element, ctx);
        let should_mutate = self.rounds_since_mutation >= self.mutation_threshold;
        let environment_response = match (is_correct, should_mutate) {
            (true, _) => EnvironmentResponse::Resonate,
            (false, true) => EnvironmentResponse::Tremor,
            (false, false) => EnvironmentResponse::Absorb,
        };

        RuleEvaluation {
            is_correct,
            should_mutate,
            environment_response,
        }
    }

    /// Replace the active rule with a related one.
    ///
    /// Explicit mutation targets are preferred; otherwise any eligible rule within
    /// one complexity step is used. When nothing qualifies the rule stays as is,
    /// but the cadence still resets.
    pub fn mutate_rule(&mut self) -> Option<&'static HiddenRule> {
        let Some(current) = self.active else {
            self.reset_cadence();
            return None;
        };

        let targets: Vec<&'static HiddenRule> = current
            .mutations
            .iter()
            .filter_map(|id| find_rule(id))
            .filter(|rule| self.is_eligible(rule))
            .collect();

        let pool: Vec<&'static HiddenRule> = if targets.is_empty() {
            RULE_CATALOG
                .iter()
                .filter(|rule| {
                    rule.id != current.id
                        && rule.complexity.abs_diff(current.complexity) <= 1
                        && self.is_eligible(rule)
                })
                .collect()
        } else {
            targets
        };

        match pool.choose(&mut self.rng).copied() {
            Some(next) => {
                info!(from = current.id, to = next.id, "Rule mutated");
                self.active = Some(next);
                self.inverted = false;
                self.mutation_count += 1;
                self.reset_cadence();
                Some(next)
            }
            None => {
                debug!(rule = current.id, "No mutation target, keeping rule");
                self.reset_cadence();
                None
            }
        }
    }

    /// Flip the active predicate for the rest of the round.
    pub fn invert(&mut self) {
        self.inverted = !self.inverted;
    }

    pub fn clear_inversion(&mut self) {
        self.inverted = false;
    }

    /// Drop the active rule and all cadence state.
    pub fn reset(&mut self) {
        self.active = None;
        self.inverted = false;
        self.last_counted_round = None;
        self.reset_cadence();
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayArea;
    use crate::domains::CognitiveDomain;
    use crate::elements::{ElementColor, ElementId, Position, Shape};

    fn element() -> GameElement {
        GameElement::new(
            ElementId::slot(0),
            Shape::Circle,
            ElementColor::Blue,
            Position::new(50.0, 50.0),
        )
    }

    #[test]
    fn test_initialize_respects_complexity_ceiling() {
        let mut engine = RuleEngine::with_seed(7);
        engine.set_history_available(true);
        for _ in 0..200 {
            let rule = engine.initialize_rule(1);
            assert!(rule.complexity <= 3);
        }
    }

    #[test]
    fn test_history_rules_excluded_without_history() {
        let mut engine = RuleEngine::with_seed(11);
        for _ in 0..200 {
            let rule = engine.initialize_rule(5);
            assert!(!rule.requires_history());
        }
    }

    #[test]
    fn test_category_gating() {
        let mut engine = RuleEngine::with_seed(3);
        engine.set_available_categories(&[RuleCategory::Relational]);
        for _ in 0..50 {
            assert_eq!(engine.initialize_rule(5).category, RuleCategory::Relational);
        }
    }

    #[test]
    fn test_empty_gating_falls_back_to_static() {
        let mut engine = RuleEngine::with_seed(3);
        engine.set_available_categories(&[]);
        assert_eq!(engine.initialize_rule(5).category, RuleCategory::Static);
    }

    #[test]
    fn test_biased_selection_follows_domain() {
        let mut engine = RuleEngine::with_seed(5);
        let bias = DomainWeights::focused(CognitiveDomain::Logic);
        for _ in 0..50 {
            let rule = engine.initialize_rule_biased(5, &bias);
            assert_eq!(rule.category, RuleCategory::Inverse);
        }
    }

    #[test]
    fn test_evaluate_without_rule_is_false() {
        let engine = RuleEngine::with_seed(1);
        let elements = vec![element()];
        let ctx = RuleContext::new(&elements, &PlayArea::default(), 1);
        assert!(!engine.evaluate(&elements[0], &ctx));
    }

    #[test]
    fn test_inversion_flips_verdict() {
        let mut engine = RuleEngine::with_seed(1);
        engine.force_rule(find_rule("shape-circle").unwrap());
        let elements = vec![element()];
        let ctx = RuleContext::new(&elements, &PlayArea::default(), 1);

        assert!(engine.evaluate(&elements[0], &ctx));
        engine.invert();
        assert!(!engine.evaluate(&elements[0], &ctx));
        engine.clear_inversion();
        assert!(engine.evaluate(&elements[0], &ctx));
    }

    #[test]
    fn test_counter_advances_once_per_round() {
        let mut engine = RuleEngine::with_seed(1);
        engine.force_rule(find_rule("shape-circle").unwrap());
        let elements = vec![element()];
        let ctx = RuleContext::new(&elements, &PlayArea::default(), 1);

        engine.evaluate_selection(&elements[0], &ctx);
        engine.evaluate_selection(&elements[0], &ctx);
        assert_eq!(engine.rounds_since_mutation(), 1);
    }

    #[test]
    fn test_mutation_cadence_within_bounds() {
        let mut engine = RuleEngine::with_seed(99);
        engine.set_history_available(true);
        engine.force_rule(find_rule("shape-circle").unwrap());
        let elements = vec![element()];
        let area = PlayArea::default();

        let mut rounds_since = 0;
        let mut gaps = Vec::new();
        for round in 1..=1000 {
            let ctx = RuleContext::new(&elements, &area, round);
            let evaluation = engine.evaluate_selection(&elements[0], &ctx);
            rounds_since += 1;
            if evaluation.should_mutate {
                engine.mutate_rule();
                gaps.push(rounds_since);
                rounds_since = 0;
            }
        }

        assert!(gaps.len() > 100);
        assert!(gaps.iter().all(|gap| (4..=6).contains(gap)), "{:?}", gaps);
    }

    #[test]
    fn test_mutation_prefers_declared_targets() {
        let mut engine = RuleEngine::with_seed(21);
        engine.force_rule(find_rule("symmetric").unwrap());
        let next = engine.mutate_rule().unwrap();
        assert_eq!(next.id, "asymmetric");
        assert_eq!(engine.mutation_count(), 1);
    }

    #[test]
    fn test_mutation_falls_back_to_nearby_complexity() {
        let mut engine = RuleEngine::with_seed(21);
        engine.set_history_available(true);
        let current = find_rule("dim").unwrap();
        engine.force_rule(current);
        let next = engine.mutate_rule().unwrap();
        assert_ne!(next.id, current.id);
        assert!(next.complexity.abs_diff(current.complexity) <= 1);
    }

    #[test]
    fn test_mutation_noop_still_resets_counter() {
        let mut engine = RuleEngine::with_seed(2);
        engine.set_available_categories(&[RuleCategory::Relational]);
        engine.force_rule(find_rule("left-of-axis").unwrap());
        // Temporal rules need history, so nothing qualifies.
        engine.set_available_categories(&[RuleCategory::Temporal]);

        let elements = vec![element()];
        let ctx = RuleContext::new(&elements, &PlayArea::default(), 1);
        engine.evaluate_selection(&elements[0], &ctx);
        assert_eq!(engine.rounds_since_mutation(), 1);

        assert!(engine.mutate_rule().is_none());
        assert_eq!(engine.active_rule().unwrap().id, "left-of-axis");
        assert_eq!(engine.rounds_since_mutation(), 0);
    }

    #[test]
    fn test_environment_response() {
        let mut engine = RuleEngine::with_seed(1);
        engine.force_rule(find_rule("shape-triangle").unwrap());
        let elements = vec![element()];
        let ctx = RuleContext::new(&elements, &PlayArea::default(), 1);
        let evaluation = engine.evaluate_selection(&elements[0], &ctx);
        assert!(!evaluation.is_correct);
        assert!(!evaluation.should_mutate);
        assert_eq!(evaluation.environment_response, EnvironmentResponse::Absorb);
    }

    #[test]
    fn test_reset() {
        let mut engine = RuleEngine::with_seed(1);
        engine.initialize_rule(2);
        engine.invert();
        engine.reset();
        assert!(engine.active_rule().is_none());
        assert!(!engine.is_inverted());
        assert_eq!(engine.rounds_since_mutation(), 0);
    }
}
