//! Per-round performance signals and the persisted mind model.

use puzzle_rules::{CognitiveDomain, RuleCategory};
use serde::{Deserialize, Serialize};

use super::CognitiveFingerprint;
use crate::error::ModelError;

/// Current mind-model schema version.
pub const MIND_MODEL_VERSION: u32 = 1;

/// What one completed round says about the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSignal {
    pub round: u32,
    pub domain: CognitiveDomain,
    pub category: RuleCategory,
    /// Share of the round's valid elements found, 0.0 - 1.0.
    pub accuracy: f64,
    pub reaction_time_ms: u64,
    pub impulsive_actions: u32,
    pub total_actions: u32,
    pub fell_for_trap: bool,
    /// The hidden rule changed going into this round.
    pub rule_changed: bool,
    pub timestamp_ms: u64,
}

impl PerformanceSignal {
    /// Fraction of actions taken impulsively; zero when nothing was done.
    pub fn impulsive_rate(&self) -> f64 {
        if self.total_actions == 0 {
            0.0
        } else {
            f64::from(self.impulsive_actions) / f64::from(self.total_actions)
        }
    }
}

/// The persisted player model.
///
/// `category_mastery` is an ordered list of pairs so the JSON form stays a
/// plain array of `[category, value]` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindModel {
    pub version: u32,
    pub fingerprint: CognitiveFingerprint,
    pub total_trials: u64,
    pub category_mastery: Vec<(RuleCategory, f64)>,
}

impl MindModel {
    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string(self).map_err(ModelError::Encode)
    }

    /// Parse and check the schema version. Values are clamped into range.
    pub fn from_json(source: &str) -> Result<Self, ModelError> {
        let mut model: MindModel = serde_json::from_str(source).map_err(ModelError::Malformed)?;
        if model.version != MIND_MODEL_VERSION {
            return Err(ModelError::UnsupportedVersion(model.version));
        }

        model.fingerprint.clamp_all();
        for (_, mastery) in &mut model.category_mastery {
            *mastery = mastery.clamp(0.0, 1.0);
        }
        Ok(model)
    }
}
