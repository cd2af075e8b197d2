//! The session facade - the one object the presentation layer talks to.
//!
//! `GameSession` owns every engine plus the round timer. Time only moves
//! through [`GameSession::advance`]; selections arrive through
//! [`GameSession::process_action`] with the timestamp the input layer saw.

mod timer;

pub use timer::*;

use puzzle_rules::{
    CognitiveDomain, ElementId, EnvironmentResponse, PuzzleGenerator, PuzzleState, RuleCategory,
    HESITATION_DECAY_MS,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::adaptive::{AdaptiveIntelligence, PerformanceSignal};
use crate::archetype::{ActionShape, ArchetypeEngine, ArchetypeProfile, Breakthrough};
use crate::config::{EngineConfig, SessionConfigError};
use crate::error::{ActionError, ModelError};
use crate::session_flow::{ErrorType, RoundOutcome, SessionEndReason, SessionFlowController};

/// Selections faster than this after the previous stimulus count as impulsive.
pub const IMPULSIVE_ACTION_MS: u64 = 600;

/// Score change for falling into a trap.
const TRAP_PENALTY: f64 = -0.5;

/// How a selection was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feedback {
    Valid,
    Trap,
    Wrong,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Valid => "valid",
            Feedback::Trap => "trap",
            Feedback::Wrong => "wrong",
        }
    }
}

/// The answer to one player selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub feedback: Feedback,
    pub score_modifier: Option<f64>,
    /// Narrative hint from a temporal round.
    pub insight_generated: Option<String>,
    pub environment_response: EnvironmentResponse,
    /// The presentation layer should celebrate this one.
    pub encouragement: bool,
    /// A correct element was lost to hesitation.
    pub hesitation_decayed: bool,
    pub breakthroughs: Vec<Breakthrough>,
    /// Set when this selection finished the round.
    pub round_outcome: Option<RoundOutcome>,
}

/// Fired once when a round's rule flips mid-window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InversionEvent {
    pub round: u32,
    pub at_ms: u64,
    /// Correct elements under the inverted rule.
    pub valid_count: usize,
}

/// Everything that happened during one `advance` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickOutcome {
    pub timer: Option<TimerTick>,
    pub inversion: Option<InversionEvent>,
    /// The round ran out of time on this tick.
    pub timed_out: Option<RoundOutcome>,
    pub session_end: Option<SessionEndReason>,
}

/// Book-keeping for the round in progress.
#[derive(Debug, Clone)]
struct RoundTracker {
    round: u32,
    started_at_ms: u64,
    last_action_ms: Option<u64>,
    first_reaction_ms: Option<u64>,
    selected: HashSet<ElementId>,
    found: HashSet<ElementId>,
    total_actions: u32,
    impulsive_actions: u32,
    hesitated: bool,
    fell_for_trap: bool,
    mutation_pending: bool,
    rule_changed: bool,
    temporal: bool,
    trap_count: usize,
    category: RuleCategory,
    domain: CognitiveDomain,
    inversion_armed: bool,
    inversion_fired: bool,
}

pub struct GameSession {
    config: EngineConfig,
    rng: ChaCha8Rng,
    generator: PuzzleGenerator,
    adaptive: AdaptiveIntelligence,
    flow: SessionFlowController,
    archetype: ArchetypeEngine,
    timer: RoundTimer,
    round: Option<RoundTracker>,
    round_number: u32,
    now_ms: u64,
    last_rule_id: Option<&'static str>,
    session_end: Option<SessionEndReason>,
}

impl GameSession {
    /// Build a session. Fails when the configuration cannot produce a round.
    pub fn new(config: EngineConfig) -> Result<Self, SessionConfigError> {
        config.validate()?;
        let (rng, generator) = match config.seed {
            Some(seed) => (
                ChaCha8Rng::seed_from_u64(seed.wrapping_add(3)),
                PuzzleGenerator::with_seed(config.generator.clone(), seed),
            ),
            None => (
                ChaCha8Rng::from_entropy(),
                PuzzleGenerator::new(config.generator.clone()),
            ),
        };
        let session = &config.session;
        Ok(Self {
            rng,
            generator,
            adaptive: AdaptiveIntelligence::new(
                session.initial_difficulty,
                session.base_round_window_ms,
            ),
            flow: SessionFlowController::new(session.clone()),
            archetype: ArchetypeEngine::new(),
            timer: RoundTimer::new(),
            round: None,
            round_number: 0,
            now_ms: 0,
            last_rule_id: None,
            session_end: None,
            config,
        })
    }

    /// A reproducible session.
    pub fn with_seed(mut config: EngineConfig, seed: u64) -> Result<Self, SessionConfigError> {
        config.seed = Some(seed);
        Self::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn current_puzzle(&self) -> Option<&PuzzleState> {
        self.round.as_ref().and(self.generator.current_puzzle())
    }

    pub fn generator(&self) -> &PuzzleGenerator {
        &self.generator
    }

    pub fn adaptive(&self) -> &AdaptiveIntelligence {
        &self.adaptive
    }

    pub fn flow(&self) -> &SessionFlowController {
        &self.flow
    }

    pub fn archetype(&self) -> &ArchetypeEngine {
        &self.archetype
    }

    pub fn archetype_profile(&self) -> ArchetypeProfile {
        self.archetype.profile()
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    /// Set once a round outcome or tick decided the session should end.
    pub fn session_end_reason(&self) -> Option<SessionEndReason> {
        self.session_end
    }

    fn generation_difficulty(&self) -> f64 {
        let flow = self.flow.metrics();
        let base = self.adaptive.parameters().base_difficulty;
        (0.5 * (flow.current_difficulty + base) + flow.phase.difficulty_modifier()).clamp(1.0, 10.0)
    }

    /// Build and present the next round. Any round still in progress is
    /// abandoned and its timer cancelled first.
    pub fn start_round(&mut self) -> PuzzleState {
        self.timer.cancel();
        if let Some(stale) = self.round.take() {
            debug!(round = stale.round, "Abandoned unfinished round");
        }

        let stage = self.flow.stage();
        let params = self.adaptive.parameters().clone();
        self.generator
            .set_available_categories(&stage.available_categories());
        self.generator.set_trap_factor(params.deception.trap_density);
        self.generator
            .set_rule_complexity(Some(params.rule_complexity));
        self.generator
            .set_temporal_pressure(params.temporal_pressure);

        let mut difficulty = self.generation_difficulty();
        let breathing_room = self
            .rng
            .gen_bool(params.pacing.breathing_room_probability.clamp(0.0, 1.0));
        if breathing_room {
            difficulty = (difficulty - 1.0).max(1.0);
        }

        self.round_number += 1;
        let puzzle = self.generator.generate_puzzle(
            self.round_number,
            difficulty,
            Some(&params.domain_weights),
        );

        let rule = self.generator.active_rule();
        let rule_id = rule.map(|r| r.id);
        let rule_changed = self.last_rule_id.is_some() && self.last_rule_id != rule_id;
        self.last_rule_id = rule_id;

        let window_ms =
            (params.timing.action_window_ms as f64 / puzzle.speed_multiplier.max(1.0)) as u64;
        let inversion_armed = stage.allows_inversion()
            && puzzle.temporal.is_none()
            && self
                .rng
                .gen_bool(params.deception.inversion_probability.clamp(0.0, 1.0));

        self.timer.start(window_ms);
        self.round = Some(RoundTracker {
            round: puzzle.round,
            started_at_ms: self.now_ms,
            last_action_ms: None,
            first_reaction_ms: None,
            selected: HashSet::new(),
            found: HashSet::new(),
            total_actions: 0,
            impulsive_actions: 0,
            hesitated: false,
            fell_for_trap: false,
            mutation_pending: false,
            rule_changed,
            temporal: puzzle.temporal.is_some(),
            trap_count: puzzle.trap_ids().len(),
            category: rule.map(|r| r.category).unwrap_or(RuleCategory::Static),
            domain: puzzle.domain,
            inversion_armed,
            inversion_fired: false,
        });

        info!(
            round = puzzle.round,
            difficulty = puzzle.difficulty,
            elements = puzzle.elements.len(),
            window_ms,
            breathing_room,
            "Round started"
        );
        puzzle
    }

    /// Add gaze time the presentation layer measured on an element of the
    /// current round. It carries to the same slot next round.
    pub fn record_gaze(&mut self, element_id: ElementId, millis: u64) -> Result<(), ActionError> {
        if self.round.is_none() {
            return Err(ActionError::NoActivePuzzle);
        }
        if !self.generator.record_gaze(element_id, millis) {
            return Err(ActionError::ElementNotFound(element_id));
        }
        debug!(element = %element_id, millis, "Gaze recorded");
        Ok(())
    }

    /// Score one selection.
    pub fn process_action(
        &mut self,
        element_id: ElementId,
        timestamp_ms: u64,
    ) -> Result<ActionResult, ActionError> {
        let tracker = self.round.as_ref().ok_or(ActionError::NoActivePuzzle)?;
        if tracker.selected.contains(&element_id) {
            return Err(ActionError::AlreadySelected(element_id));
        }
        let reference_ms = tracker.last_action_ms.unwrap_or(tracker.started_at_ms);
        let hesitation_ms = timestamp_ms.saturating_sub(reference_ms);

        let verdict = self
            .generator
            .evaluate_selection(element_id)
            .ok_or(ActionError::ElementNotFound(element_id))?;
        self.generator.note_selection(element_id);

        let decayed = verdict.is_correct
            && self
                .generator
                .deception()
                .check_hesitation_decay(element_id, hesitation_ms);
        let success = verdict.is_correct && !decayed;
        let feedback = if success {
            Feedback::Valid
        } else if verdict.is_trap {
            Feedback::Trap
        } else {
            Feedback::Wrong
        };
        let impulsive = hesitation_ms < IMPULSIVE_ACTION_MS;
        let speed = self
            .generator
            .current_puzzle()
            .map(|p| p.speed_multiplier)
            .unwrap_or(1.0);

        let (temporal, rule_changed) = match self.round.as_mut() {
            Some(tracker) => {
                tracker.selected.insert(element_id);
                tracker.total_actions += 1;
                if impulsive {
                    tracker.impulsive_actions += 1;
                }
                if hesitation_ms > HESITATION_DECAY_MS {
                    tracker.hesitated = true;
                }
                if feedback == Feedback::Trap {
                    tracker.fell_for_trap = true;
                }
                if verdict.should_mutate {
                    tracker.mutation_pending = true;
                }
                if success {
                    tracker.found.insert(element_id);
                }
                tracker
                    .first_reaction_ms
                    .get_or_insert(timestamp_ms.saturating_sub(tracker.started_at_ms));
                tracker.last_action_ms = Some(timestamp_ms);
                (tracker.temporal, tracker.rule_changed)
            }
            None => return Err(ActionError::NoActivePuzzle),
        };

        let mut breakthroughs = Vec::new();
        if success {
            let shape = if temporal {
                ActionShape::PatternFound
            } else if rule_changed {
                ActionShape::RuleAdapted
            } else if impulsive {
                ActionShape::ImpulsiveCorrect
            } else {
                ActionShape::DeliberateCorrect
            };
            breakthroughs.extend(self.archetype.record_action(shape, timestamp_ms));
        }

        let encouragement = success
            && self.rng.gen_bool(
                self.adaptive
                    .parameters()
                    .pacing
                    .positive_feedback_probability
                    .clamp(0.0, 1.0),
            );
        let score_modifier = match feedback {
            Feedback::Valid => Some(speed),
            Feedback::Trap => Some(TRAP_PENALTY),
            Feedback::Wrong => None,
        };

        debug!(
            element = %element_id,
            feedback = feedback.as_str(),
            hesitation_ms,
            decayed,
            "Selection scored"
        );

        let all_found = self.generator.current_puzzle().is_some_and(|p| {
            let found = self.round.as_ref().map(|t| &t.found);
            p.valid_ids()
                .iter()
                .all(|id| found.is_some_and(|f| f.contains(id)))
        });

        let round_outcome = if !success {
            let error = match feedback {
                Feedback::Trap => ErrorType::Trap,
                _ if decayed => ErrorType::Hesitation,
                _ => ErrorType::WrongChoice,
            };
            self.complete_round(false, Some(error), timestamp_ms, &mut breakthroughs)
        } else if all_found {
            self.complete_round(true, None, timestamp_ms, &mut breakthroughs)
        } else {
            None
        };

        let environment_response = if success {
            EnvironmentResponse::Resonate
        } else if verdict.should_mutate {
            EnvironmentResponse::Tremor
        } else {
            EnvironmentResponse::Absorb
        };

        Ok(ActionResult {
            success,
            feedback,
            score_modifier,
            insight_generated: verdict.insight,
            environment_response,
            encouragement,
            hesitation_decayed: decayed,
            breakthroughs,
            round_outcome,
        })
    }

    /// Close the active round and feed every model.
    fn complete_round(
        &mut self,
        success: bool,
        error: Option<ErrorType>,
        timestamp_ms: u64,
        breakthroughs: &mut Vec<Breakthrough>,
    ) -> Option<RoundOutcome> {
        let tracker = self.round.take()?;
        self.timer.cancel();

        let valid_total = self
            .generator
            .current_puzzle()
            .map(|p| p.valid_count())
            .unwrap_or(0);
        let accuracy = if success {
            1.0
        } else if valid_total == 0 {
            0.0
        } else {
            (tracker.found.len() as f64 / valid_total as f64).min(1.0)
        };
        let reaction_time_ms = tracker
            .first_reaction_ms
            .unwrap_or_else(|| timestamp_ms.saturating_sub(tracker.started_at_ms));

        if success && tracker.trap_count > 0 {
            breakthroughs.extend(
                self.archetype
                    .record_action(ActionShape::TrapAvoided, timestamp_ms),
            );
        }

        let outcome =
            self.flow
                .record_round_result(success, reaction_time_ms, tracker.hesitated, error);

        self.adaptive.record_performance(PerformanceSignal {
            round: tracker.round,
            domain: tracker.domain,
            category: tracker.category,
            accuracy,
            reaction_time_ms,
            impulsive_actions: tracker.impulsive_actions,
            total_actions: tracker.total_actions,
            fell_for_trap: tracker.fell_for_trap,
            rule_changed: tracker.rule_changed,
            timestamp_ms,
        });
        self.adaptive.adapt_parameters(self.now_ms);

        if tracker.mutation_pending {
            if let Some(rule) = self.generator.apply_mutation() {
                debug!(rule = rule.id, "Mutation applied between rounds");
            }
        }

        if let Some(reason) = outcome.session_end_reason {
            if self.session_end.is_none() {
                info!(reason = ?reason, "Session end suggested");
            }
            self.session_end = Some(reason);
        }

        info!(
            round = tracker.round,
            success,
            accuracy,
            reaction_time_ms,
            "Round complete"
        );
        Some(outcome)
    }

    /// Flip the rule once the armed round passes its midpoint. Fires at most
    /// once per round.
    pub fn check_for_rule_inversion(&mut self) -> Option<InversionEvent> {
        let tracker = self.round.as_mut()?;
        if !tracker.inversion_armed || tracker.inversion_fired || !self.timer.past_midpoint() {
            return None;
        }
        tracker.inversion_fired = true;
        let round = tracker.round;

        if !self.generator.invert_rule() {
            return None;
        }
        let valid_count = self
            .generator
            .current_puzzle()
            .map(|p| p.valid_count())
            .unwrap_or(0);
        if valid_count == 0 {
            // Nothing would be selectable; flip back.
            self.generator.invert_rule();
            return None;
        }

        info!(round, valid_count, "Rule inverted mid-round");
        Some(InversionEvent {
            round,
            at_ms: self.now_ms,
            valid_count,
        })
    }

    /// Move the session clock forward.
    pub fn advance(&mut self, delta_ms: u64) -> TickOutcome {
        self.now_ms = self.now_ms.saturating_add(delta_ms);
        self.flow.advance(delta_ms);

        let timer = self.timer.tick(delta_ms);
        let inversion = self.check_for_rule_inversion();

        let timed_out = match timer {
            Some(tick) if tick.expired_now => {
                let mut breakthroughs = Vec::new();
                let now = self.now_ms;
                self.complete_round(false, Some(ErrorType::Timeout), now, &mut breakthroughs)
            }
            _ => None,
        };

        let session_end = self.flow.check_session_end();
        if session_end.is_some() {
            self.session_end = session_end;
        }

        TickOutcome {
            timer,
            inversion,
            timed_out,
            session_end,
        }
    }

    pub fn export_mind_model(&self) -> Result<String, ModelError> {
        self.adaptive.export_mind_model()
    }

    /// Load a persisted model. A rejected model leaves the current one untouched.
    pub fn import_mind_model(&mut self, source: &str) -> Result<(), ModelError> {
        self.adaptive.import_mind_model(source)
    }

    /// Abandon the current round and forget carried round history.
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.round = None;
        self.generator.reset();
        self.last_rule_id = None;
    }

    /// Start over with fresh session metrics. The fingerprint, lifetime
    /// counters and archetype evolution carry over.
    pub fn start_new_session(&mut self) {
        self.reset();
        self.flow.start_new_session();
        self.adaptive.reset();
        self.round_number = 0;
        self.now_ms = 0;
        self.session_end = None;
    }

    /// Forget the player entirely.
    pub fn reset_profile(&mut self) {
        self.reset();
        self.adaptive.reset_profile();
        self.archetype.reset();
        self.flow = SessionFlowController::new(self.config.session.clone());
        self.round_number = 0;
        self.now_ms = 0;
        self.session_end = None;
    }
}
