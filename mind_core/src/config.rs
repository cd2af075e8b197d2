//! Session pacing configuration and the combined engine configuration.

use puzzle_rules::{ConfigError, GeneratorConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating session configuration.
#[derive(Debug, Error)]
pub enum SessionConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("optimal window {min_ms}..{max_ms} ms does not fit inside the {cap_ms} ms session cap")]
    InvalidWindow { min_ms: u64, max_ms: u64, cap_ms: u64 },

    #[error("wave phase {0} must last at least one round")]
    EmptyPhase(&'static str),

    #[error("reaction-time window must hold at least two samples, got {0}")]
    ReactionWindowTooSmall(usize),

    #[error(transparent)]
    Generator(#[from] ConfigError),
}

/// Round counts for each wave phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveDurations {
    pub warmup: u32,
    pub stretch: u32,
    pub peak: u32,
    pub reflection: u32,
}

impl Default for WaveDurations {
    fn default() -> Self {
        Self {
            warmup: 3,
            stretch: 5,
            peak: 4,
            reflection: 2,
        }
    }
}

/// Pacing and termination knobs for one play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Hard cap on session length.
    pub max_session_ms: u64,
    pub optimal_window_min_ms: u64,
    pub optimal_window_max_ms: u64,
    pub waves: WaveDurations,
    /// Reaction times kept for variance and slowness checks.
    pub reaction_time_window: usize,
    pub adaptation_history_cap: usize,
    /// Action window before adaptive scaling.
    pub base_round_window_ms: u64,
    pub initial_difficulty: f64,
    pub fatigue_end_threshold: f64,
    pub frustration_end_threshold: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_session_ms: 25 * 60 * 1000,
            optimal_window_min_ms: 10 * 60 * 1000,
            optimal_window_max_ms: 15 * 60 * 1000,
            waves: WaveDurations::default(),
            reaction_time_window: 20,
            adaptation_history_cap: 50,
            base_round_window_ms: 5000,
            initial_difficulty: 3.0,
            fatigue_end_threshold: 0.6,
            frustration_end_threshold: 0.85,
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, SessionConfigError> {
        let config: SessionConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SessionConfigError> {
        if self.optimal_window_min_ms > self.optimal_window_max_ms
            || self.optimal_window_max_ms > self.max_session_ms
        {
            return Err(SessionConfigError::InvalidWindow {
                min_ms: self.optimal_window_min_ms,
                max_ms: self.optimal_window_max_ms,
                cap_ms: self.max_session_ms,
            });
        }

        let phases = [
            ("warmup", self.waves.warmup),
            ("stretch", self.waves.stretch),
            ("peak", self.waves.peak),
            ("reflection", self.waves.reflection),
        ];
        if let Some((name, _)) = phases.iter().find(|(_, rounds)| *rounds == 0) {
            return Err(SessionConfigError::EmptyPhase(*name));
        }

        if self.reaction_time_window < 2 {
            return Err(SessionConfigError::ReactionWindowTooSmall(
                self.reaction_time_window,
            ));
        }
        Ok(())
    }
}

/// Everything a session needs, loadable from one TOML document with
/// `[generator]` and `[session]` tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub generator: GeneratorConfig,
    pub session: SessionConfig,
    /// Fixed seed for reproducible sessions; entropy when absent.
    pub seed: Option<u64>,
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, SessionConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the generator and session parts.
    pub fn validate(&self) -> Result<(), SessionConfigError> {
        self.generator.validate()?;
        self.session.validate()
    }
}
