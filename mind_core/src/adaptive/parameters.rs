//! Short-lived tuning vectors derived from the fingerprint.

use puzzle_rules::DomainWeights;
use serde::{Deserialize, Serialize};

/// The player's state as read from the recent performance window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmotionalState {
    Flow,
    Focused,
    Frustrated,
    Fatigued,
    Calm,
}

impl EmotionalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionalState::Flow => "flow",
            EmotionalState::Focused => "focused",
            EmotionalState::Frustrated => "frustrated",
            EmotionalState::Fatigued => "fatigued",
            EmotionalState::Calm => "calm",
        }
    }
}

impl std::fmt::Display for EmotionalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingWindows {
    pub action_window_ms: u64,
    /// 0.0 - 1.0; how hard the presentation layer leans on the clock.
    pub pressure: f64,
}

/// How aggressive deception may be.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeceptionIntensity {
    /// Traps per difficulty point.
    pub trap_density: f64,
    /// Chance a round arms a mid-round rule inversion.
    pub inversion_probability: f64,
}

/// Probabilities the presentation layer uses to pace feeling, not difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionalPacing {
    /// Chance of an easy, low-pressure round.
    pub breathing_room_probability: f64,
    /// Chance a correct selection is met with explicit encouragement.
    pub positive_feedback_probability: f64,
}

impl Default for EmotionalPacing {
    fn default() -> Self {
        Self {
            breathing_room_probability: 0.1,
            positive_feedback_probability: 0.5,
        }
    }
}

/// Tuning vector consumed by the generator and the round timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveParameters {
    /// 1.0 - 10.0.
    pub base_difficulty: f64,
    pub domain_weights: DomainWeights,
    /// 1 - 4.
    pub rule_complexity: u8,
    /// 0.0 - 1.0.
    pub temporal_pressure: f64,
    pub timing: TimingWindows,
    pub deception: DeceptionIntensity,
    pub pacing: EmotionalPacing,
    pub emotional_state: EmotionalState,
}

impl AdaptiveParameters {
    /// Starting parameters for a new player.
    pub fn initial(base_difficulty: f64, base_window_ms: u64) -> Self {
        Self {
            base_difficulty: base_difficulty.clamp(1.0, 10.0),
            domain_weights: DomainWeights::uniform(),
            rule_complexity: 1,
            temporal_pressure: 0.5,
            timing: TimingWindows {
                action_window_ms: base_window_ms,
                pressure: 0.5,
            },
            deception: DeceptionIntensity {
                trap_density: 0.3,
                inversion_probability: 0.0,
            },
            pacing: EmotionalPacing::default(),
            emotional_state: EmotionalState::Calm,
        }
    }
}

impl Default for AdaptiveParameters {
    fn default() -> Self {
        Self::initial(3.0, 5000)
    }
}
