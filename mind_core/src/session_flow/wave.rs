//! Wave phases: the short-term rhythm of a session.

use serde::{Deserialize, Serialize};

use crate::config::WaveDurations;

/// One of four recurring pacing stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    Warmup,
    Stretch,
    Peak,
    Reflection,
}

impl WavePhase {
    /// The phase that follows; reflection wraps back to warmup.
    pub fn next(&self) -> WavePhase {
        match self {
            WavePhase::Warmup => WavePhase::Stretch,
            WavePhase::Stretch => WavePhase::Peak,
            WavePhase::Peak => WavePhase::Reflection,
            WavePhase::Reflection => WavePhase::Warmup,
        }
    }

    /// Added to the current difficulty while the phase is active.
    pub fn difficulty_modifier(&self) -> f64 {
        match self {
            WavePhase::Warmup => -0.2,
            WavePhase::Stretch => 0.0,
            WavePhase::Peak => 0.15,
            WavePhase::Reflection => -0.3,
        }
    }

    /// Rounds the phase lasts.
    pub fn duration(&self, waves: &WaveDurations) -> u32 {
        match self {
            WavePhase::Warmup => waves.warmup,
            WavePhase::Stretch => waves.stretch,
            WavePhase::Peak => waves.peak,
            WavePhase::Reflection => waves.reflection,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WavePhase::Warmup => "warmup",
            WavePhase::Stretch => "stretch",
            WavePhase::Peak => "peak",
            WavePhase::Reflection => "reflection",
        }
    }
}

impl std::fmt::Display for WavePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
