//! Puzzle Generator - composes rule, deception and temporal engines into one round.
//!
//! A round is built in a fixed order: pick or keep the hidden rule, style and
//! place each slot for its role, bend it toward or away from the rule, then
//! re-derive truth by evaluating the rule on the finished set. Deception and an
//! optional temporal challenge run last, and the element order is shuffled so
//! position in the array never leaks a role.

mod placement;
mod shaping;
mod state;

pub use placement::*;
pub use shaping::*;
pub use state::*;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::config::{GeneratorConfig, PlayArea};
use crate::deception::{DeceptionEngine, DeceptionOutcome, DEFAULT_TRAP_FACTOR};
use crate::domains::DomainWeights;
use crate::elements::{
    update_center_distances, ElementColor, ElementId, ElementRole, GameElement, Position, Shape,
};
use crate::rules::{
    fallback_rule, EnvironmentResponse, HiddenRule, RuleCategory, RuleContext, RuleEngine,
};
use crate::temporal::{TemporalChallenge, TemporalChallengeKind, TemporalEngine};

/// Past selections kept for rules that ask whether a slot was ever picked.
pub const SELECTION_HISTORY_LIMIT: usize = 50;

/// Chance a carried slot keeps last round's position.
const POSITION_CARRY_CHANCE: f64 = 0.5;

/// Traps are dropped within this fraction of the half-diagonal.
const TRAP_CENTRAL_FRACTION: f64 = 0.3;

/// Everything the caller learns about one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionVerdict {
    pub element_id: ElementId,
    pub is_correct: bool,
    pub is_trap: bool,
    pub should_mutate: bool,
    pub environment_response: EnvironmentResponse,
    /// Set when the selection was resolved against a past round.
    pub insight: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct Theme {
    color: ElementColor,
    shape: Shape,
}

fn slot_hint<'a>(
    config: &'a GeneratorConfig,
    previous: Option<&'a [GameElement]>,
    last_selected: &HashSet<ElementId>,
    id: ElementId,
    theme: Theme,
) -> ShapingHint<'a> {
    ShapingHint {
        area: &config.play_area,
        previous: previous.and_then(|p| p.iter().find(|e| e.id == id)),
        selected_last_round: last_selected.contains(&id),
        theme_color: theme.color,
        theme_shape: theme.shape,
        max_size: config.max_element_size,
        min_spacing: config.min_spacing,
    }
}

/// Evaluate the active rule on every element and store the verdicts.
/// Returns the number of correct elements.
fn resolve_truth(
    rules: &RuleEngine,
    elements: &mut [GameElement],
    area: &PlayArea,
    round: u32,
    previous: Option<&[GameElement]>,
    two_back: Option<&[GameElement]>,
    history: &[ElementId],
) -> usize {
    let verdicts: Vec<bool> = {
        let mut ctx = RuleContext::new(&*elements, area, round).with_history(history);
        if let Some(previous) = previous {
            ctx = ctx.with_previous(previous);
        }
        if let Some(two_back) = two_back {
            ctx = ctx.with_two_back(two_back);
        }
        elements.iter().map(|e| rules.evaluate(e, &ctx)).collect()
    };

    for (element, verdict) in elements.iter_mut().zip(verdicts) {
        element.resolve(verdict);
    }
    elements.iter().filter(|e| e.is_correct()).count()
}

/// Replace an unusable configuration with its sanitized form.
fn usable(config: GeneratorConfig) -> GeneratorConfig {
    match config.validate() {
        Ok(()) => config,
        Err(err) => {
            warn!(error = %err, "Generator config repaired");
            config.sanitized()
        }
    }
}

/// Builds rounds and keeps the cross-round state they depend on.
pub struct PuzzleGenerator {
    rng: ChaCha8Rng,
    config: GeneratorConfig,
    rules: RuleEngine,
    deception: DeceptionEngine,
    temporal: TemporalEngine,
    current: Option<PuzzleState>,
    last_deception: Option<DeceptionOutcome>,
    previous: Option<Vec<GameElement>>,
    two_back: Option<Vec<GameElement>>,
    round_selections: Vec<ElementId>,
    last_selected: HashSet<ElementId>,
    selection_history: Vec<ElementId>,
    rounds_since_rule_change: u32,
    last_rule_id: Option<&'static str>,
    trap_factor: f64,
    temporal_pressure: f64,
    rule_complexity: Option<u8>,
}

impl PuzzleGenerator {
    /// Create a generator seeded from system entropy.
    pub fn new(config: GeneratorConfig) -> Self {
        let config = usable(config);
        let area = config.play_area;
        Self::build(
            config,
            ChaCha8Rng::from_entropy(),
            RuleEngine::new(),
            DeceptionEngine::new(area),
        )
    }

    /// Create a generator whose every engine derives from one seed.
    pub fn with_seed(config: GeneratorConfig, seed: u64) -> Self {
        let config = usable(config);
        let area = config.play_area;
        Self::build(
            config,
            ChaCha8Rng::seed_from_u64(seed),
            RuleEngine::with_seed(seed.wrapping_add(1)),
            DeceptionEngine::with_seed(area, seed.wrapping_add(2)),
        )
    }

    fn build(
        config: GeneratorConfig,
        rng: ChaCha8Rng,
        rules: RuleEngine,
        deception: DeceptionEngine,
    ) -> Self {
        let trap_factor = if config.trap_factor > 0.0 {
            config.trap_factor
        } else {
            DEFAULT_TRAP_FACTOR
        };
        Self {
            rng,
            config,
            rules,
            deception,
            temporal: TemporalEngine::new(),
            current: None,
            last_deception: None,
            previous: None,
            two_back: None,
            round_selections: Vec::new(),
            last_selected: HashSet::new(),
            selection_history: Vec::new(),
            rounds_since_rule_change: 0,
            last_rule_id: None,
            trap_factor,
            temporal_pressure: 0.5,
            rule_complexity: None,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn current_puzzle(&self) -> Option<&PuzzleState> {
        self.current.as_ref()
    }

    pub fn active_rule(&self) -> Option<&'static HiddenRule> {
        self.rules.active_rule()
    }

    pub fn rule_engine(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn deception(&self) -> &DeceptionEngine {
        &self.deception
    }

    pub fn temporal(&self) -> &TemporalEngine {
        &self.temporal
    }

    /// What deception did to the current round.
    pub fn last_deception(&self) -> Option<&DeceptionOutcome> {
        self.last_deception.as_ref()
    }

    pub fn round_selections(&self) -> &[ElementId] {
        &self.round_selections
    }

    pub fn set_trap_factor(&mut self, factor: f64) {
        self.trap_factor = factor.max(0.0);
    }

    /// Scales the chance of a temporal challenge; 0.5 leaves it unchanged.
    pub fn set_temporal_pressure(&mut self, pressure: f64) {
        self.temporal_pressure = pressure.clamp(0.0, 1.0);
    }

    /// Pin rule complexity, or `None` to derive it from difficulty.
    pub fn set_rule_complexity(&mut self, complexity: Option<u8>) {
        self.rule_complexity = complexity.map(|c| c.clamp(1, 4));
    }

    pub fn set_available_categories(&mut self, categories: &[RuleCategory]) {
        self.rules.set_available_categories(categories);
    }

    fn complexity_for(difficulty: f64) -> u8 {
        (difficulty / 2.5).round().clamp(1.0, 4.0) as u8
    }

    fn rotate_history(&mut self) {
        if let Some(state) = self.current.take() {
            self.two_back = self.previous.take();
            self.previous = Some(state.elements);
        }

        let selections = std::mem::take(&mut self.round_selections);
        self.selection_history.extend(selections.iter().copied());
        if self.selection_history.len() > SELECTION_HISTORY_LIMIT {
            let overflow = self.selection_history.len() - SELECTION_HISTORY_LIMIT;
            self.selection_history.drain(..overflow);
        }
        self.last_selected = selections.into_iter().collect();
    }

    fn select_rule(&mut self, difficulty: f64, bias: Option<&DomainWeights>) -> &'static HiddenRule {
        let complexity = self
            .rule_complexity
            .unwrap_or_else(|| Self::complexity_for(difficulty));

        // A mutation between rounds counts as a change.
        if self.rules.active_rule().map(|r| r.id) != self.last_rule_id {
            self.rounds_since_rule_change = 0;
        } else {
            self.rounds_since_rule_change += 1;
        }

        let reselect = match self.rules.active_rule() {
            None => true,
            Some(rule) => {
                self.rounds_since_rule_change >= self.config.forced_reselection_rounds
                    || !self.rules.is_eligible(rule)
            }
        };

        if reselect {
            match bias {
                Some(bias) => self.rules.initialize_rule_biased(complexity, bias),
                None => self.rules.initialize_rule(complexity),
            };
            self.rounds_since_rule_change = 0;
        }

        let rule = self.rules.active_rule().unwrap_or_else(fallback_rule);
        self.last_rule_id = Some(rule.id);
        rule
    }

    /// Generate the round `round` at the given difficulty.
    pub fn generate_puzzle(
        &mut self,
        round: u32,
        difficulty: f64,
        domain_bias: Option<&DomainWeights>,
    ) -> PuzzleState {
        self.rotate_history();
        self.rules.set_history_available(self.previous.is_some());
        self.rules.clear_inversion();
        self.temporal.clear_challenge();

        let mut rule = self.select_rule(difficulty, domain_bias);
        let composition = RoundComposition::for_difficulty(&self.config, difficulty, self.trap_factor);
        let mut roles = composition.roles();
        roles.shuffle(&mut self.rng);

        let theme = Theme {
            color: *ElementColor::ALL.choose(&mut self.rng).unwrap_or(&ElementColor::Purple),
            shape: *Shape::ALL.choose(&mut self.rng).unwrap_or(&Shape::Hexagon),
        };
        let area = self.config.play_area;
        let spacing = self.config.min_spacing;

        let mut elements = Vec::with_capacity(roles.len());
        let mut placed: Vec<Position> = Vec::with_capacity(roles.len());
        for (index, role) in roles.iter().copied().enumerate() {
            let id = ElementId::slot(index);
            let hint = slot_hint(
                &self.config,
                self.previous.as_deref(),
                &self.last_selected,
                id,
                theme,
            );

            let mut element =
                style_for_role(&mut self.rng, id, role, &self.config).appearing_in(round);
            let region = if role == ElementRole::Trap {
                PlacementRegion::Central(area.half_diagonal() * TRAP_CENTRAL_FRACTION)
            } else {
                PlacementRegion::Anywhere
            };
            element.position = match hint.previous {
                Some(prev)
                    if is_spaced(prev.position, &placed, spacing)
                        && self.rng.gen_bool(POSITION_CARRY_CHANCE) =>
                {
                    prev.position
                }
                _ => place(
                    &mut self.rng,
                    &area,
                    &placed,
                    spacing,
                    self.config.placement_attempts,
                    region,
                ),
            };

            conform(
                &rule.predicate,
                &mut element,
                role == ElementRole::Valid,
                &hint,
                &mut self.rng,
            );
            if let Some(prev) = hint.previous {
                element.carry_history_from(prev, hint.selected_last_round);
            }

            placed.push(element.position);
            elements.push(element);
        }

        update_center_distances(&mut elements, &area);
        let mut correct = resolve_truth(
            &self.rules,
            &mut elements,
            &area,
            round,
            self.previous.as_deref(),
            self.two_back.as_deref(),
            &self.selection_history,
        );

        let min_valid = self.config.min_valid;
        if correct < min_valid {
            let misses: Vec<usize> = elements
                .iter()
                .enumerate()
                .filter(|(_, e)| !e.is_correct())
                .map(|(i, _)| i)
                .collect();
            for index in misses {
                if correct >= min_valid {
                    break;
                }
                let element = &mut elements[index];
                let hint = slot_hint(
                    &self.config,
                    self.previous.as_deref(),
                    &self.last_selected,
                    element.id,
                    theme,
                );
                conform(&rule.predicate, element, true, &hint, &mut self.rng);
                if let Some(prev) = hint.previous {
                    element.carry_history_from(prev, hint.selected_last_round);
                }

                update_center_distances(&mut elements, &area);
                correct = resolve_truth(
                    &self.rules,
                    &mut elements,
                    &area,
                    round,
                    self.previous.as_deref(),
                    self.two_back.as_deref(),
                    &self.selection_history,
                );
            }
        }

        if correct < min_valid {
            let fallback = fallback_rule();
            warn!(
                rule = rule.id,
                fallback = fallback.id,
                correct,
                round,
                "Rule cannot reach the valid floor, falling back"
            );
            self.rules.force_rule(fallback);
            self.last_rule_id = Some(fallback.id);
            self.rounds_since_rule_change = 0;
            rule = fallback;

            for (element, role) in elements.iter_mut().zip(&roles) {
                let hint = slot_hint(&self.config, None, &self.last_selected, element.id, theme);
                conform(
                    &rule.predicate,
                    element,
                    *role == ElementRole::Valid,
                    &hint,
                    &mut self.rng,
                );
            }
            correct = resolve_truth(
                &self.rules,
                &mut elements,
                &area,
                round,
                self.previous.as_deref(),
                self.two_back.as_deref(),
                &self.selection_history,
            );
        }

        self.deception.set_trap_factor(self.trap_factor);
        let mut outcome = self.deception.initialize_deception(difficulty, &mut elements);

        let temporal = self.maybe_arm_temporal(round, difficulty, &mut elements);
        if temporal.is_some() {
            outcome.sync_with(&elements);
        }
        self.temporal.record_temporal_state(round, &elements);
        elements.shuffle(&mut self.rng);

        debug!(
            round,
            difficulty,
            rule = rule.id,
            elements = elements.len(),
            correct,
            traps = outcome.traps.len(),
            temporal = temporal.is_some(),
            "Puzzle generated"
        );

        let state = PuzzleState {
            id: PuzzleId::new(),
            round,
            difficulty,
            domain: rule.category.domain(),
            rule_complexity: rule.complexity,
            elements,
            composition,
            speed_multiplier: temporal.map(|c| c.speed_multiplier()).unwrap_or(1.0),
            temporal,
        };
        self.last_deception = Some(outcome);
        self.current = Some(state.clone());
        state
    }

    /// Roll for a temporal challenge and, if armed, take truth from the reference round.
    fn maybe_arm_temporal(
        &mut self,
        round: u32,
        difficulty: f64,
        elements: &mut [GameElement],
    ) -> Option<TemporalChallenge> {
        if difficulty < self.config.temporal_min_difficulty {
            return None;
        }
        let chance =
            (self.config.temporal_probability * (0.5 + self.temporal_pressure)).clamp(0.0, 1.0);
        if !self.rng.gen_bool(chance) {
            return None;
        }

        let kinds: Vec<TemporalChallengeKind> = TemporalChallengeKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.temporal.can_reference(*kind, round))
            .collect();
        let kind = kinds.choose(&mut self.rng).copied()?;

        let challenge = self
            .temporal
            .initialize_temporal_challenge(kind, elements, round);
        let truths: Vec<bool> = elements
            .iter()
            .map(|e| self.temporal.reference_truth(e.id).unwrap_or(false))
            .collect();

        if truths.iter().filter(|t| **t).count() < self.config.min_valid {
            debug!(round, ?kind, "Reference round too sparse, temporal challenge dropped");
            self.temporal.clear_challenge();
            return None;
        }

        for (element, truth) in elements.iter_mut().zip(truths) {
            if truth {
                element.mark_correct();
            } else if element.is_correct() {
                element.mark_decoy();
            }
        }
        Some(challenge)
    }

    /// Resolve a selection in the current round.
    ///
    /// Advances the rule's mutation cadence. Returns `None` when there is no
    /// current round or the element is not part of it.
    pub fn evaluate_selection(&mut self, id: ElementId) -> Option<SelectionVerdict> {
        let state = self.current.as_ref()?;
        let element = state.element(id)?;

        let mut ctx = RuleContext::new(&state.elements, &self.config.play_area, state.round)
            .with_selections(&self.round_selections)
            .with_history(&self.selection_history);
        if let Some(previous) = self.previous.as_deref() {
            ctx = ctx.with_previous(previous);
        }
        if let Some(two_back) = self.two_back.as_deref() {
            ctx = ctx.with_two_back(two_back);
        }
        let evaluation = self.rules.evaluate_selection(element, &ctx);

        let (is_correct, insight) = match self.temporal.active_challenge() {
            Some(challenge) if challenge.action_round == state.round => {
                let temporal = self.temporal.evaluate_temporal_selection(id, state.round);
                (temporal.is_correct, Some(temporal.insight))
            }
            _ => (evaluation.is_correct, None),
        };

        let environment_response = match (is_correct, evaluation.should_mutate) {
            (true, _) => EnvironmentResponse::Resonate,
            (false, true) => EnvironmentResponse::Tremor,
            (false, false) => EnvironmentResponse::Absorb,
        };

        Some(SelectionVerdict {
            element_id: id,
            is_correct,
            is_trap: element.is_trap(),
            should_mutate: evaluation.should_mutate,
            environment_response,
            insight,
        })
    }

    /// Add gaze time to an element of the current round. Returns `false` when
    /// there is no round or the element is not part of it.
    pub fn record_gaze(&mut self, id: ElementId, millis: u64) -> bool {
        match self.current.as_mut().and_then(|state| state.element_mut(id)) {
            Some(element) => {
                element.record_gaze(millis);
                true
            }
            None => false,
        }
    }

    /// Remember that the player picked an element this round.
    pub fn note_selection(&mut self, id: ElementId) {
        if !self.round_selections.contains(&id) {
            self.round_selections.push(id);
        }
    }

    /// Flip the rule for the rest of the current round and re-derive truth.
    ///
    /// Elements that become correct lose their trap flag. Returns `false`
    /// without changing anything when there is no round or a temporal
    /// challenge owns the truth this round.
    pub fn invert_rule(&mut self) -> bool {
        let Some(state) = self.current.as_mut() else {
            return false;
        };
        if self.temporal.active_challenge().is_some() {
            return false;
        }

        self.rules.invert();
        let correct = resolve_truth(
            &self.rules,
            &mut state.elements,
            &self.config.play_area,
            state.round,
            self.previous.as_deref(),
            self.two_back.as_deref(),
            &self.selection_history,
        );
        debug!(round = state.round, correct, "Rule inverted");
        true
    }

    /// Apply a pending mutation between rounds. Returns the new rule if it changed.
    pub fn apply_mutation(&mut self) -> Option<&'static HiddenRule> {
        self.rules.mutate_rule()
    }

    /// Drop the current round and all carried history.
    pub fn reset(&mut self) {
        self.rules.reset();
        self.deception.reset();
        self.temporal.reset();
        self.current = None;
        self.last_deception = None;
        self.previous = None;
        self.two_back = None;
        self.round_selections.clear();
        self.last_selected.clear();
        self.selection_history.clear();
        self.rounds_since_rule_change = 0;
        self.last_rule_id = None;
    }
}
