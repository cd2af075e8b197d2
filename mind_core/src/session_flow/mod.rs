//! Session Flow - pacing, progression and session termination.
//!
//! The controller runs two ladders at once: a short wave-phase cycle that bends
//! difficulty up and down within a session, and a one-way cognitive stage
//! earned over the player's lifetime. After every round it also decides
//! whether the session should end.

mod metrics;
mod stage;
mod wave;

pub use metrics::*;
pub use stage::*;
pub use wave::*;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SessionConfig;

const FRUSTRATION_MISS: f64 = 0.15;
const FRUSTRATION_HIT: f64 = 0.08;
const FRUSTRATION_SLOW: f64 = 0.05;
const SLOW_REACTION_FACTOR: f64 = 1.5;

/// Per-round fatigue smoothing: old, new.
const FATIGUE_KEEP: f64 = 0.95;

const ENGAGEMENT_RATE: f64 = 0.1;
const DISENGAGED_TARGET: f64 = 0.3;

const INVISIBLE_WINDOW: usize = 5;
const INVISIBLE_STEP: f64 = 0.1;

/// Why a session should stop. Messages are meant for the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionEndReason {
    MaxDuration,
    PerformanceDeclining,
    Fatigue,
    Frustration,
    OptimalWindowExceeded,
}

impl SessionEndReason {
    pub fn message(&self) -> &'static str {
        match self {
            SessionEndReason::MaxDuration => {
                "You have given this a long stretch of focus. Time to let it settle."
            }
            SessionEndReason::PerformanceDeclining => {
                "Your mind has done good work today. A pause will sharpen it again."
            }
            SessionEndReason::Fatigue => {
                "Attention is a tide. Step away and let it return."
            }
            SessionEndReason::Frustration => {
                "The patterns are tangled right now. They will be clearer after a break."
            }
            SessionEndReason::OptimalWindowExceeded => {
                "This is a natural place to stop. Come back fresh."
            }
        }
    }
}

impl std::fmt::Display for SessionEndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// What changed after one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub phase_changed: bool,
    pub new_phase: Option<WavePhase>,
    pub stage_changed: bool,
    pub new_stage: Option<CognitiveStage>,
    pub should_end_session: bool,
    pub session_end_reason: Option<SessionEndReason>,
}

impl RoundOutcome {
    pub fn session_end_message(&self) -> Option<&'static str> {
        self.session_end_reason.map(|reason| reason.message())
    }
}

/// Top-level pacing loop for one player.
///
/// Lifetime counters and the cognitive stage survive `start_new_session`;
/// everything in [`SessionMetrics`] does not.
pub struct SessionFlowController {
    config: SessionConfig,
    metrics: SessionMetrics,
    lifetime_rounds: u64,
    lifetime_correct: u64,
    sessions_started: u32,
}

impl SessionFlowController {
    pub fn new(config: SessionConfig) -> Self {
        let metrics = SessionMetrics::new(config.initial_difficulty, CognitiveStage::Awareness);
        Self {
            config,
            metrics,
            lifetime_rounds: 0,
            lifetime_correct: 0,
            sessions_started: 1,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    pub fn phase(&self) -> WavePhase {
        self.metrics.phase
    }

    pub fn stage(&self) -> CognitiveStage {
        self.metrics.cognitive_stage
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.metrics.elapsed_ms
    }

    pub fn lifetime_rounds(&self) -> u64 {
        self.lifetime_rounds
    }

    pub fn lifetime_accuracy(&self) -> f64 {
        if self.lifetime_rounds == 0 {
            0.0
        } else {
            self.lifetime_correct as f64 / self.lifetime_rounds as f64
        }
    }

    pub fn sessions_started(&self) -> u32 {
        self.sessions_started
    }

    /// Current difficulty bent by the phase modifier.
    pub fn effective_difficulty(&self) -> f64 {
        (self.metrics.current_difficulty + self.metrics.phase.difficulty_modifier())
            .clamp(1.0, 10.0)
    }

    fn fatigue_signal(&self) -> f64 {
        let elapsed = self.metrics.elapsed_ms as f64 / self.config.max_session_ms.max(1) as f64;
        (0.6 * elapsed + 0.4 * self.metrics.reaction_time_cv()).min(1.0)
    }

    /// Move the session clock forward. Fatigue drifts toward the time signal
    /// at a rate of 5% per elapsed minute.
    pub fn advance(&mut self, delta_ms: u64) {
        if delta_ms == 0 {
            return;
        }
        self.metrics.elapsed_ms = self.metrics.elapsed_ms.saturating_add(delta_ms);
        let keep = FATIGUE_KEEP.powf(delta_ms as f64 / 60_000.0);
        let signal = self.fatigue_signal();
        self.metrics.fatigue = (keep * self.metrics.fatigue + (1.0 - keep) * signal).clamp(0.0, 1.0);
    }

    /// Fold one finished round into the session and lifetime state.
    pub fn record_round_result(
        &mut self,
        is_correct: bool,
        reaction_time_ms: u64,
        hesitated: bool,
        error: Option<ErrorType>,
    ) -> RoundOutcome {
        let slow = self
            .metrics
            .average_reaction_time()
            .is_some_and(|avg| reaction_time_ms as f64 > SLOW_REACTION_FACTOR * avg);

        let m = &mut self.metrics;
        m.rounds_played += 1;
        if is_correct {
            m.correct_rounds += 1;
        }
        if hesitated {
            m.hesitation_count += 1;
        }
        if let Some(kind) = error {
            *m.error_counts.entry(kind).or_insert(0) += 1;
        }
        m.push_reaction_time(reaction_time_ms, self.config.reaction_time_window);
        m.push_result(is_correct);

        let mut frustration = m.frustration;
        frustration += if is_correct { -FRUSTRATION_HIT } else { FRUSTRATION_MISS };
        if slow {
            frustration += FRUSTRATION_SLOW;
        }
        m.frustration = frustration.clamp(0.0, 1.0);

        let engagement_target = if is_correct && !hesitated { 1.0 } else { DISENGAGED_TARGET };
        m.engagement += (engagement_target - m.engagement) * ENGAGEMENT_RATE;

        let signal = self.fatigue_signal();
        let m = &mut self.metrics;
        m.fatigue = (FATIGUE_KEEP * m.fatigue + (1.0 - FATIGUE_KEEP) * signal).clamp(0.0, 1.0);

        self.adjust_invisible_difficulty();

        self.lifetime_rounds += 1;
        if is_correct {
            self.lifetime_correct += 1;
        }

        let new_phase = self.advance_phase();
        let new_stage = self.advance_stage();
        let session_end_reason = self.check_session_end();

        debug!(
            round = self.metrics.rounds_played,
            correct = is_correct,
            reaction_ms = reaction_time_ms,
            frustration = self.metrics.frustration,
            fatigue = self.metrics.fatigue,
            "Round recorded"
        );

        RoundOutcome {
            phase_changed: new_phase.is_some(),
            new_phase,
            stage_changed: new_stage.is_some(),
            new_stage,
            should_end_session: session_end_reason.is_some(),
            session_end_reason,
        }
    }

    fn adjust_invisible_difficulty(&mut self) {
        let Some(recent) = self.metrics.recent_accuracy(INVISIBLE_WINDOW) else {
            return;
        };
        let step = if recent > 0.8 {
            INVISIBLE_STEP
        } else if recent < 0.4 {
            -INVISIBLE_STEP
        } else {
            return;
        };

        let from = self.metrics.current_difficulty;
        let to = (from + step).clamp(1.0, 10.0);
        if (to - from).abs() < f64::EPSILON {
            return;
        }
        self.metrics.current_difficulty = to;
        let adjustment = DifficultyAdjustment {
            round: self.metrics.rounds_played,
            from,
            to,
            recent_accuracy: recent,
        };
        self.metrics
            .log_adjustment(adjustment, self.config.adaptation_history_cap);
    }

    fn advance_phase(&mut self) -> Option<WavePhase> {
        let m = &mut self.metrics;
        m.rounds_in_phase += 1;
        if m.rounds_in_phase < m.phase.duration(&self.config.waves) {
            return None;
        }
        let from = m.phase;
        m.phase = from.next();
        m.rounds_in_phase = 0;
        info!(from = %from, to = %m.phase, "Wave phase advanced");
        Some(m.phase)
    }

    fn advance_stage(&mut self) -> Option<CognitiveStage> {
        let current = self.metrics.cognitive_stage;
        let qualified = CognitiveStage::qualified(self.lifetime_rounds, self.lifetime_accuracy());

        let changed = if qualified > current {
            self.metrics.cognitive_stage = qualified;
            info!(from = %current, to = %qualified, "Cognitive stage advanced");
            Some(qualified)
        } else {
            None
        };

        self.metrics.stage_progress = self.stage_progress();
        changed
    }

    fn stage_progress(&self) -> f64 {
        let stage = self.metrics.cognitive_stage;
        let Some(next) = CognitiveStage::ALL.iter().find(|s| **s > stage) else {
            return 1.0;
        };
        let (from, _) = stage.threshold();
        let (to, _) = next.threshold();
        let span = to.saturating_sub(from).max(1) as f64;
        (self.lifetime_rounds.saturating_sub(from) as f64 / span).clamp(0.0, 1.0)
    }

    /// Evaluate the end conditions in priority order.
    pub fn check_session_end(&self) -> Option<SessionEndReason> {
        let m = &self.metrics;
        let c = &self.config;

        if m.elapsed_ms >= c.max_session_ms {
            return Some(SessionEndReason::MaxDuration);
        }
        if m.elapsed_ms >= c.optimal_window_min_ms {
            if m.is_declining() {
                return Some(SessionEndReason::PerformanceDeclining);
            }
            if m.fatigue > c.fatigue_end_threshold {
                return Some(SessionEndReason::Fatigue);
            }
        }
        if m.frustration > c.frustration_end_threshold {
            return Some(SessionEndReason::Frustration);
        }
        if m.elapsed_ms > c.optimal_window_max_ms {
            return Some(SessionEndReason::OptimalWindowExceeded);
        }
        None
    }

    /// Begin a fresh session. Lifetime counters and stage carry over.
    pub fn start_new_session(&mut self) {
        self.metrics =
            SessionMetrics::new(self.config.initial_difficulty, self.metrics.cognitive_stage);
        self.metrics.stage_progress = self.stage_progress();
        self.sessions_started += 1;
        info!(
            session = self.sessions_started,
            stage = %self.metrics.cognitive_stage,
            "New session started"
        );
    }
}

impl Default for SessionFlowController {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
