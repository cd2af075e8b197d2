//! Adaptive Intelligence - reads the player and retunes generation.
//!
//! Every completed round arrives as a [`PerformanceSignal`]. Signals update the
//! [`CognitiveFingerprint`] by exponential smoothing; at most once per three
//! rounds (or two minutes) the fingerprint and the recent window are turned
//! into fresh [`AdaptiveParameters`], with the detected emotional state
//! overriding difficulty and pacing.

mod fingerprint;
mod model;
mod parameters;

pub use fingerprint::*;
pub use model::*;
pub use parameters::*;

use puzzle_rules::{CognitiveDomain, DomainWeights, RuleCategory};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, warn};

use crate::error::ModelError;

/// Signals kept for detection and consistency.
pub const PERFORMANCE_HISTORY_LIMIT: usize = 100;

/// Exponential smoothing rate for fingerprint updates.
pub const SMOOTHING_RATE: f64 = 0.1;

pub const ADAPT_EVERY_ROUNDS: u32 = 3;
pub const ADAPT_EVERY_MS: u64 = 120_000;

/// Signals that make up the "recent" window.
const RECENT_WINDOW: usize = 10;

const DIFFICULTY_STEP: f64 = 0.5;
const TRAP_DENSITY_STEP: f64 = 0.05;

/// Smoothing weights for difficulty: old, new.
const DIFFICULTY_KEEP: f64 = 0.8;
const DIFFICULTY_TAKE: f64 = 0.2;

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

fn variance(values: &[f64]) -> f64 {
    match mean(values.iter().copied()) {
        Some(avg) => {
            values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64
        }
        None => 0.0,
    }
}

/// Owns the fingerprint and derives tuning parameters from it.
pub struct AdaptiveIntelligence {
    fingerprint: CognitiveFingerprint,
    parameters: AdaptiveParameters,
    history: VecDeque<PerformanceSignal>,
    category_mastery: BTreeMap<RuleCategory, f64>,
    total_trials: u64,
    rounds_since_adapt: u32,
    last_adapt_ms: u64,
    base_difficulty: f64,
    base_window_ms: u64,
}

impl AdaptiveIntelligence {
    pub fn new(base_difficulty: f64, base_window_ms: u64) -> Self {
        Self {
            fingerprint: CognitiveFingerprint::default(),
            parameters: AdaptiveParameters::initial(base_difficulty, base_window_ms),
            history: VecDeque::with_capacity(PERFORMANCE_HISTORY_LIMIT),
            category_mastery: BTreeMap::new(),
            total_trials: 0,
            rounds_since_adapt: 0,
            last_adapt_ms: 0,
            base_difficulty,
            base_window_ms,
        }
    }

    pub fn fingerprint(&self) -> &CognitiveFingerprint {
        &self.fingerprint
    }

    pub fn parameters(&self) -> &AdaptiveParameters {
        &self.parameters
    }

    pub fn emotional_state(&self) -> EmotionalState {
        self.parameters.emotional_state
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn total_trials(&self) -> u64 {
        self.total_trials
    }

    pub fn category_mastery(&self, category: RuleCategory) -> Option<f64> {
        self.category_mastery.get(&category).copied()
    }

    /// Fold one round into the history and the fingerprint.
    pub fn record_performance(&mut self, signal: PerformanceSignal) {
        let rate = SMOOTHING_RATE;
        let impulsive_rate = signal.impulsive_rate();
        let fp = &mut self.fingerprint;

        if impulsive_rate > 0.5 {
            fp.impulsivity_bias = smooth(fp.impulsivity_bias, 1.0, rate);
        } else if impulsive_rate < 0.2 {
            fp.impulsivity_bias = smooth(fp.impulsivity_bias, -1.0, rate);
        }

        let trap_target = if signal.fell_for_trap {
            fp.trap_susceptibility + 0.1
        } else {
            fp.trap_susceptibility - 0.02
        };
        fp.trap_susceptibility = smooth(fp.trap_susceptibility, trap_target, rate);

        let risk = (impulsive_rate + f64::from(u8::from(signal.fell_for_trap))) / 2.0;
        fp.risk_tolerance = smooth(fp.risk_tolerance, risk, rate);

        if signal.rule_changed {
            fp.adaptation_rate = smooth(fp.adaptation_rate, signal.accuracy, rate);
        }

        let score = fp.domain_score_mut(signal.domain);
        *score = smooth(*score, signal.accuracy * 100.0, rate);

        let mastery = self.category_mastery.entry(signal.category).or_insert(0.5);
        *mastery = smooth(*mastery, signal.accuracy, rate).clamp(0.0, 1.0);

        self.history.push_back(signal);
        while self.history.len() > PERFORMANCE_HISTORY_LIMIT {
            self.history.pop_front();
        }

        let accuracies: Vec<f64> = self
            .history
            .iter()
            .rev()
            .take(RECENT_WINDOW)
            .map(|s| s.accuracy)
            .collect();
        let consistency = 1.0 - variance(&accuracies);
        self.fingerprint.consistency_score =
            smooth(self.fingerprint.consistency_score, consistency, rate);
        self.fingerprint.clamp_all();

        self.total_trials += 1;
        self.rounds_since_adapt += 1;
    }

    /// Whether an adaptation tick is due at `now_ms`.
    pub fn should_adapt(&self, now_ms: u64) -> bool {
        self.rounds_since_adapt >= ADAPT_EVERY_ROUNDS
            || now_ms.saturating_sub(self.last_adapt_ms) >= ADAPT_EVERY_MS
    }

    /// Recompute parameters if a tick is due. Returns whether it ran.
    pub fn adapt_parameters(&mut self, now_ms: u64) -> bool {
        if self.history.is_empty() || !self.should_adapt(now_ms) {
            return false;
        }
        self.recompute(now_ms);
        true
    }

    fn recent(&self) -> impl Iterator<Item = &PerformanceSignal> {
        self.history.iter().rev().take(RECENT_WINDOW)
    }

    /// Read the emotional state from the recent window.
    pub fn detect_emotional_state(&self) -> EmotionalState {
        let recent: Vec<&PerformanceSignal> = self.recent().collect();
        let Some(accuracy) = mean(recent.iter().map(|s| s.accuracy)) else {
            return EmotionalState::Calm;
        };

        let last_three_failing =
            recent.len() >= 3 && recent.iter().take(3).all(|s| s.accuracy < 0.5);
        if last_three_failing || (recent.len() >= 3 && accuracy < 0.35) {
            return EmotionalState::Frustrated;
        }

        if recent.len() >= 6 {
            let newer = mean(recent.iter().take(3).map(|s| s.reaction_time_ms as f64));
            let older = mean(recent.iter().skip(3).map(|s| s.reaction_time_ms as f64));
            let newer_accuracy = mean(recent.iter().take(3).map(|s| s.accuracy));
            let older_accuracy = mean(recent.iter().skip(3).map(|s| s.accuracy));
            if let (Some(newer), Some(older), Some(na), Some(oa)) =
                (newer, older, newer_accuracy, older_accuracy)
            {
                if older > 0.0 && newer > older * 1.3 && na <= oa {
                    return EmotionalState::Fatigued;
                }
            }
        }

        let times: Vec<f64> = recent.iter().map(|s| s.reaction_time_ms as f64).collect();
        let steady = mean(times.iter().copied())
            .filter(|avg| *avg > 0.0)
            .map(|avg| variance(&times).sqrt() / avg < 0.25)
            .unwrap_or(false);
        if accuracy >= 0.75 && steady && recent.len() >= 3 {
            return EmotionalState::Flow;
        }
        if accuracy >= 0.6 {
            return EmotionalState::Focused;
        }
        EmotionalState::Calm
    }

    fn domain_weights(&self) -> DomainWeights {
        let weakest = self.fingerprint.weakest_domain();
        let strongest = self.fingerprint.strongest_domain();
        if weakest == strongest {
            return DomainWeights::uniform();
        }

        let rest = 0.3 / (CognitiveDomain::ALL.len() - 2) as f64;
        let mut weights = DomainWeights::uniform();
        for domain in CognitiveDomain::ALL {
            let weight = if domain == weakest {
                0.4
            } else if domain == strongest {
                0.3
            } else {
                rest
            };
            weights.set(domain, weight);
        }
        weights
    }

    fn recompute(&mut self, now_ms: u64) {
        let accuracy = mean(self.recent().map(|s| s.accuracy)).unwrap_or(0.5);
        let step = if accuracy > 0.85 {
            DIFFICULTY_STEP
        } else if accuracy < 0.5 {
            -DIFFICULTY_STEP
        } else {
            0.0
        };

        let previous_state = self.parameters.emotional_state;
        let params = &mut self.parameters;
        let old = params.base_difficulty;
        params.base_difficulty =
            (DIFFICULTY_KEEP * old + DIFFICULTY_TAKE * (old + step)).clamp(1.0, 10.0);

        let density_step = step / DIFFICULTY_STEP * TRAP_DENSITY_STEP;
        params.deception.trap_density = (DIFFICULTY_KEEP * params.deception.trap_density
            + DIFFICULTY_TAKE * (params.deception.trap_density + density_step))
            .clamp(0.1, 0.6);

        let bias = self.fingerprint.impulsivity_bias;
        params.timing.action_window_ms = (self.base_window_ms as f64 * (1.0 + 0.25 * bias)) as u64;
        params.timing.pressure = (0.5 - 0.3 * bias).clamp(0.0, 1.0);
        params.temporal_pressure = (0.3 + 0.5 * self.fingerprint.temporal / 100.0).clamp(0.0, 1.0);
        params.pacing = EmotionalPacing::default();

        let state = self.detect_emotional_state();
        let params = &mut self.parameters;
        match state {
            EmotionalState::Frustrated => {
                params.base_difficulty = (params.base_difficulty - 1.0).max(1.0);
                params.pacing.breathing_room_probability = 0.4;
            }
            EmotionalState::Fatigued => {
                params.pacing.positive_feedback_probability = 0.9;
                params.timing.pressure *= 0.5;
                params.timing.action_window_ms =
                    (params.timing.action_window_ms as f64 * 1.2) as u64;
            }
            EmotionalState::Flow => {
                params.base_difficulty = (params.base_difficulty + 0.1).min(10.0);
            }
            EmotionalState::Focused | EmotionalState::Calm => {}
        }
        params.emotional_state = state;
        params.rule_complexity = (params.base_difficulty / 2.5).round().clamp(1.0, 4.0) as u8;
        params.deception.inversion_probability =
            ((params.base_difficulty - 4.0) * 0.05).clamp(0.0, 0.3);
        let difficulty = params.base_difficulty;

        self.parameters.domain_weights = self.domain_weights();
        self.rounds_since_adapt = 0;
        self.last_adapt_ms = now_ms;

        if state != previous_state {
            info!(from = %previous_state, to = %state, "Emotional state changed");
        }
        debug!(difficulty, accuracy, state = %state, "Parameters adapted");
    }

    /// Serialize the persisted part of the model.
    pub fn export_mind_model(&self) -> Result<String, ModelError> {
        MindModel {
            version: MIND_MODEL_VERSION,
            fingerprint: self.fingerprint.clone(),
            total_trials: self.total_trials,
            category_mastery: self
                .category_mastery
                .iter()
                .map(|(category, value)| (*category, *value))
                .collect(),
        }
        .to_json()
    }

    /// Replace the persisted model. On failure the current model is kept.
    pub fn import_mind_model(&mut self, source: &str) -> Result<(), ModelError> {
        match MindModel::from_json(source) {
            Ok(model) => {
                self.fingerprint = model.fingerprint;
                self.total_trials = model.total_trials;
                self.category_mastery = model.category_mastery.into_iter().collect();
                info!(trials = self.total_trials, "Mind model imported");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Rejected mind model import, keeping current model");
                Err(err)
            }
        }
    }

    /// Clear the recent window for a new session. The fingerprint survives.
    pub fn reset(&mut self) {
        self.history.clear();
        self.rounds_since_adapt = 0;
        self.last_adapt_ms = 0;
        let weights = self.domain_weights();
        self.parameters = AdaptiveParameters::initial(self.base_difficulty, self.base_window_ms);
        self.parameters.domain_weights = weights;
    }

    /// Forget the player entirely.
    pub fn reset_profile(&mut self) {
        self.fingerprint = CognitiveFingerprint::default();
        self.category_mastery.clear();
        self.total_trials = 0;
        self.history.clear();
        self.rounds_since_adapt = 0;
        self.last_adapt_ms = 0;
        self.parameters = AdaptiveParameters::initial(self.base_difficulty, self.base_window_ms);
    }
}

impl Default for AdaptiveIntelligence {
    fn default() -> Self {
        Self::new(3.0, 5000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(round: u32, accuracy: f64, reaction_time_ms: u64) -> PerformanceSignal {
        PerformanceSignal {
            round,
            domain: CognitiveDomain::Logic,
            category: RuleCategory::Inverse,
            accuracy,
            reaction_time_ms,
            impulsive_actions: 0,
            total_actions: 3,
            fell_for_trap: false,
            rule_changed: false,
            timestamp_ms: u64::from(round) * 5000,
        }
    }

    #[test]
    fn test_history_is_bounded() {
        let mut ai = AdaptiveIntelligence::default();
        for round in 0..150 {
            ai.record_performance(signal(round, 1.0, 900));
        }
        assert_eq!(ai.history_len(), PERFORMANCE_HISTORY_LIMIT);
        assert_eq!(ai.total_trials(), 150);
    }

    #[test]
    fn test_trap_susceptibility_steps() {
        let mut ai = AdaptiveIntelligence::default();
        let before = ai.fingerprint().trap_susceptibility;
        ai.record_performance(PerformanceSignal {
            fell_for_trap: true,
            ..signal(1, 0.0, 900)
        });
        let after_fall = ai.fingerprint().trap_susceptibility;
        assert!((after_fall - (before + 0.01)).abs() < 1e-9);

        ai.record_performance(signal(2, 1.0, 900));
        assert!((ai.fingerprint().trap_susceptibility - (after_fall - 0.002)).abs() < 1e-9);
    }

    #[test]
    fn test_impulsivity_moves_both_ways() {
        let mut ai = AdaptiveIntelligence::default();
        ai.record_performance(PerformanceSignal {
            impulsive_actions: 3,
            ..signal(1, 1.0, 300)
        });
        assert!(ai.fingerprint().impulsivity_bias > 0.0);

        let mut ai = AdaptiveIntelligence::default();
        ai.record_performance(signal(1, 1.0, 2000));
        assert!(ai.fingerprint().impulsivity_bias < 0.0);
    }

    #[test]
    fn test_domain_score_and_mastery() {
        let mut ai = AdaptiveIntelligence::default();
        ai.record_performance(signal(1, 1.0, 900));
        assert!((ai.fingerprint().logic - 55.0).abs() < 1e-9);
        assert_eq!(ai.fingerprint().spatial, 50.0);
        assert!((ai.category_mastery(RuleCategory::Inverse).unwrap() - 0.55).abs() < 1e-9);
        assert!(ai.category_mastery(RuleCategory::Static).is_none());
    }

    #[test]
    fn test_adaptation_gate() {
        let mut ai = AdaptiveIntelligence::default();
        ai.record_performance(signal(1, 1.0, 900));
        assert!(!ai.adapt_parameters(1000));
        ai.record_performance(signal(2, 1.0, 900));
        ai.record_performance(signal(3, 1.0, 900));
        assert!(ai.adapt_parameters(2000));
        assert!(!ai.adapt_parameters(3000));

        ai.record_performance(signal(4, 1.0, 900));
        assert!(ai.adapt_parameters(2000 + ADAPT_EVERY_MS));
    }

    #[test]
    fn test_difficulty_rises_on_high_accuracy() {
        let mut ai = AdaptiveIntelligence::default();
        for round in 0..3 {
            ai.record_performance(signal(round, 1.0, 900));
        }
        ai.adapt_parameters(0);
        // +0.5 smoothed 0.8/0.2, then the flow nudge.
        assert!((ai.parameters().base_difficulty - 3.2).abs() < 1e-9);
        assert_eq!(ai.emotional_state(), EmotionalState::Flow);
    }

    #[test]
    fn test_frustration_steps_difficulty_down() {
        let mut ai = AdaptiveIntelligence::default();
        for round in 0..3 {
            ai.record_performance(signal(round, 0.0, 900));
        }
        ai.adapt_parameters(0);
        assert_eq!(ai.emotional_state(), EmotionalState::Frustrated);
        assert!((ai.parameters().base_difficulty - 1.9).abs() < 1e-9);
        assert_eq!(ai.parameters().pacing.breathing_room_probability, 0.4);
    }

    #[test]
    fn test_fatigue_detection_relaxes_timing() {
        let mut ai = AdaptiveIntelligence::default();
        for round in 0..3 {
            ai.record_performance(signal(round, 0.8, 800));
        }
        for round in 3..6 {
            ai.record_performance(signal(round, 0.7, 1600));
        }
        assert_eq!(ai.detect_emotional_state(), EmotionalState::Fatigued);

        ai.adapt_parameters(0);
        let params = ai.parameters();
        assert_eq!(params.pacing.positive_feedback_probability, 0.9);
        assert!(params.timing.pressure < 0.5);
        assert!(params.timing.action_window_ms > 5000);
    }

    #[test]
    fn test_impulsive_player_gets_longer_window() {
        let mut ai = AdaptiveIntelligence::default();
        for round in 0..3 {
            ai.record_performance(PerformanceSignal {
                impulsive_actions: 3,
                ..signal(round, 0.7, 400)
            });
        }
        assert!(ai.adapt_parameters(0));
        assert_eq!(ai.emotional_state(), EmotionalState::Focused);
        // bias 0.271 after three smoothed steps toward +1
        let timing = &ai.parameters().timing;
        assert_eq!(timing.action_window_ms, 5338);
        assert!(timing.pressure < 0.5);
        assert!((timing.pressure - (0.5 - 0.3 * 0.271)).abs() < 1e-9);
    }

    #[test]
    fn test_deliberate_player_gets_shorter_window() {
        let mut ai = AdaptiveIntelligence::default();
        for round in 0..3 {
            ai.record_performance(signal(round, 0.7, 2400));
        }
        assert!(ai.adapt_parameters(0));
        assert_eq!(ai.emotional_state(), EmotionalState::Focused);
        let timing = &ai.parameters().timing;
        assert!(timing.action_window_ms < 5000);
        assert_eq!(timing.action_window_ms, 4661);
        assert!(timing.pressure > 0.5);
    }

    #[test]
    fn test_difficulty_stays_in_bounds() {
        let mut ai = AdaptiveIntelligence::default();
        for round in 0..300 {
            ai.record_performance(signal(round, 1.0, 900));
            ai.adapt_parameters(u64::from(round) * 1000);
            assert!((1.0..=10.0).contains(&ai.parameters().base_difficulty));
        }
        assert!(ai.parameters().base_difficulty > 9.0);

        for round in 300..600 {
            ai.record_performance(signal(round, 0.0, 900));
            ai.adapt_parameters(u64::from(round) * 1000);
            assert!((1.0..=10.0).contains(&ai.parameters().base_difficulty));
        }
        assert_eq!(ai.parameters().base_difficulty, 1.0);
    }

    #[test]
    fn test_domain_weights_favour_weakest() {
        let mut ai = AdaptiveIntelligence::default();
        for round in 0..3 {
            ai.record_performance(signal(round, 0.0, 900));
        }
        ai.adapt_parameters(0);
        let weights = ai.parameters().domain_weights;
        assert_eq!(weights.weight(CognitiveDomain::Logic), 0.4);
        assert_eq!(weights.weight(CognitiveDomain::Perception), 0.3);
        assert!((weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_import_keeps_model() {
        let mut ai = AdaptiveIntelligence::default();
        ai.record_performance(signal(1, 1.0, 900));
        let before = ai.export_mind_model().unwrap();

        assert!(ai.import_mind_model("{not json").is_err());
        assert_eq!(ai.export_mind_model().unwrap(), before);
    }

    #[test]
    fn test_import_replaces_model() {
        let mut source = AdaptiveIntelligence::default();
        for round in 0..5 {
            source.record_performance(signal(round, 1.0, 900));
        }
        let exported = source.export_mind_model().unwrap();

        let mut target = AdaptiveIntelligence::default();
        target.import_mind_model(&exported).unwrap();
        assert!((target.fingerprint().logic - source.fingerprint().logic).abs() < 1e-9);
        assert_eq!(target.total_trials(), 5);
        assert!(target.category_mastery(RuleCategory::Inverse).is_some());
    }

    #[test]
    fn test_reset_keeps_fingerprint() {
        let mut ai = AdaptiveIntelligence::default();
        ai.record_performance(signal(1, 1.0, 900));
        let fingerprint = ai.fingerprint().clone();
        ai.reset();
        assert_eq!(ai.fingerprint(), &fingerprint);
        assert_eq!(ai.history_len(), 0);

        ai.reset_profile();
        assert_eq!(ai.fingerprint(), &CognitiveFingerprint::default());
        assert_eq!(ai.total_trials(), 0);
    }
}
