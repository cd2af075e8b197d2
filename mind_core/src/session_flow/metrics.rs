//! Running per-session state.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use super::{CognitiveStage, WavePhase};

/// Round results kept for the recent-accuracy and decline checks.
pub const RECENT_RESULTS_LIMIT: usize = 10;

/// Why a round counted against the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    Trap,
    WrongChoice,
    Timeout,
    Hesitation,
}

/// One invisible difficulty nudge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyAdjustment {
    pub round: u32,
    pub from: f64,
    pub to: f64,
    /// Accuracy over the last five rounds that triggered the nudge.
    pub recent_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub elapsed_ms: u64,
    pub rounds_played: u32,
    pub correct_rounds: u32,
    /// Bounded reaction-time window, oldest first.
    pub reaction_times: VecDeque<u64>,
    pub hesitation_count: u32,
    pub error_counts: HashMap<ErrorType, u32>,
    /// Bounded correct/incorrect record, oldest first.
    pub recent_results: VecDeque<bool>,
    pub phase: WavePhase,
    pub rounds_in_phase: u32,
    pub cognitive_stage: CognitiveStage,
    /// 0.0 - 1.0 toward the next stage's round threshold.
    pub stage_progress: f64,
    pub current_difficulty: f64,
    pub fatigue: f64,
    pub frustration: f64,
    pub engagement: f64,
    pub adaptation_history: VecDeque<DifficultyAdjustment>,
}

impl SessionMetrics {
    pub fn new(initial_difficulty: f64, stage: CognitiveStage) -> Self {
        Self {
            elapsed_ms: 0,
            rounds_played: 0,
            correct_rounds: 0,
            reaction_times: VecDeque::new(),
            hesitation_count: 0,
            error_counts: HashMap::new(),
            recent_results: VecDeque::with_capacity(RECENT_RESULTS_LIMIT),
            phase: WavePhase::Warmup,
            rounds_in_phase: 0,
            cognitive_stage: stage,
            stage_progress: 0.0,
            current_difficulty: initial_difficulty.clamp(1.0, 10.0),
            fatigue: 0.0,
            frustration: 0.0,
            engagement: 0.5,
            adaptation_history: VecDeque::new(),
        }
    }

    pub fn accuracy(&self) -> f64 {
        if self.rounds_played == 0 {
            0.0
        } else {
            f64::from(self.correct_rounds) / f64::from(self.rounds_played)
        }
    }

    pub fn errors(&self, kind: ErrorType) -> u32 {
        self.error_counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn average_reaction_time(&self) -> Option<f64> {
        if self.reaction_times.is_empty() {
            return None;
        }
        let sum: u64 = self.reaction_times.iter().sum();
        Some(sum as f64 / self.reaction_times.len() as f64)
    }

    pub fn reaction_time_variance(&self) -> f64 {
        let Some(avg) = self.average_reaction_time() else {
            return 0.0;
        };
        self.reaction_times
            .iter()
            .map(|&rt| (rt as f64 - avg).powi(2))
            .sum::<f64>()
            / self.reaction_times.len() as f64
    }

    /// Standard deviation over mean; zero with fewer than two samples.
    pub fn reaction_time_cv(&self) -> f64 {
        match self.average_reaction_time() {
            Some(avg) if avg > 0.0 && self.reaction_times.len() >= 2 => {
                self.reaction_time_variance().sqrt() / avg
            }
            _ => 0.0,
        }
    }

    /// Accuracy over the newest `count` results, if that many exist.
    pub fn recent_accuracy(&self, count: usize) -> Option<f64> {
        if count == 0 || self.recent_results.len() < count {
            return None;
        }
        let hits = self.recent_results.iter().rev().take(count).filter(|&&r| r).count();
        Some(hits as f64 / count as f64)
    }

    /// The last five rounds trail the five before by at least 0.15.
    pub fn is_declining(&self) -> bool {
        if self.recent_results.len() < 10 {
            return false;
        }
        let rate = |results: Vec<bool>| {
            results.iter().filter(|&&r| r).count() as f64 / results.len() as f64
        };
        let newer = rate(self.recent_results.iter().rev().take(5).copied().collect());
        let older = rate(self.recent_results.iter().rev().skip(5).take(5).copied().collect());
        older - newer >= 0.15
    }

    pub(crate) fn push_reaction_time(&mut self, reaction_ms: u64, cap: usize) {
        self.reaction_times.push_back(reaction_ms);
        while self.reaction_times.len() > cap {
            self.reaction_times.pop_front();
        }
    }

    pub(crate) fn push_result(&mut self, correct: bool) {
        self.recent_results.push_back(correct);
        while self.recent_results.len() > RECENT_RESULTS_LIMIT {
            self.recent_results.pop_front();
        }
    }

    pub(crate) fn log_adjustment(&mut self, adjustment: DifficultyAdjustment, cap: usize) {
        self.adaptation_history.push_back(adjustment);
        while self.adaptation_history.len() > cap {
            self.adaptation_history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> SessionMetrics {
        SessionMetrics::new(3.0, CognitiveStage::Awareness)
    }

    #[test]
    fn test_reaction_window_is_bounded() {
        let mut m = metrics();
        for rt in 0..30 {
            m.push_reaction_time(rt, 20);
        }
        assert_eq!(m.reaction_times.len(), 20);
        assert_eq!(m.reaction_times.front(), Some(&10));
    }

    #[test]
    fn test_cv_of_constant_times_is_zero() {
        let mut m = metrics();
        for _ in 0..5 {
            m.push_reaction_time(900, 20);
        }
        assert_eq!(m.reaction_time_cv(), 0.0);
        m.push_reaction_time(1800, 20);
        assert!(m.reaction_time_cv() > 0.0);
    }

    #[test]
    fn test_decline_needs_ten_results() {
        let mut m = metrics();
        for _ in 0..5 {
            m.push_result(true);
        }
        for _ in 0..4 {
            m.push_result(false);
        }
        assert!(!m.is_declining());
        m.push_result(false);
        assert!(m.is_declining());
    }

    #[test]
    fn test_flat_results_are_not_declining() {
        let mut m = metrics();
        for _ in 0..10 {
            m.push_result(false);
        }
        assert!(!m.is_declining());
        assert_eq!(m.recent_accuracy(5), Some(0.0));
    }
}
