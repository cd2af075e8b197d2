//! Temporal Engine - answers that live in the past.
//!
//! Every round's element set is snapshotted into a bounded history. A temporal
//! challenge points the upcoming round at one of those snapshots: an element is
//! correct when the same slot was correct back then, whatever it looks like now.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use crate::elements::{ElementId, GameElement};

/// Rounds of history kept for temporal challenges.
pub const TEMPORAL_HISTORY_LIMIT: usize = 10;

pub const MAX_COMPRESSION: u8 = 5;

/// Kinds of temporal challenge, by how far back the truth lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemporalChallengeKind {
    /// The previous round.
    Echo,
    /// Two rounds back.
    DeepEcho,
    /// Three rounds back.
    Afterimage,
}

impl TemporalChallengeKind {
    pub const ALL: [TemporalChallengeKind; 3] = [
        TemporalChallengeKind::Echo,
        TemporalChallengeKind::DeepEcho,
        TemporalChallengeKind::Afterimage,
    ];

    /// How many rounds back the reference snapshot is.
    pub fn lookback(&self) -> u32 {
        match self {
            TemporalChallengeKind::Echo => 1,
            TemporalChallengeKind::DeepEcho => 2,
            TemporalChallengeKind::Afterimage => 3,
        }
    }

    fn base_compression(&self) -> u8 {
        match self {
            TemporalChallengeKind::Echo => 1,
            TemporalChallengeKind::DeepEcho => 2,
            TemporalChallengeKind::Afterimage => 3,
        }
    }
}

/// A recorded round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalSnapshot {
    pub round: u32,
    pub elements: Vec<GameElement>,
}

/// An active temporal challenge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalChallenge {
    pub kind: TemporalChallengeKind,
    /// Round whose snapshot holds the ground truth.
    pub reference_round: u32,
    /// Round in which the player acts.
    pub action_round: u32,
    /// 1 - 5; scales generation speed.
    pub compression_level: u8,
}

impl TemporalChallenge {
    /// Multiplier applied to animation and timer speed.
    pub fn speed_multiplier(&self) -> f64 {
        1.0 + 0.15 * f64::from(self.compression_level.saturating_sub(1))
    }
}

/// Outcome of a temporal selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalEvaluation {
    pub is_correct: bool,
    pub insight: String,
}

/// Keeps round history and resolves temporal selections.
#[derive(Debug, Clone, Default)]
pub struct TemporalEngine {
    history: VecDeque<TemporalSnapshot>,
    challenge: Option<TemporalChallenge>,
}

impl TemporalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a deep copy of a round's elements, evicting the oldest beyond the limit.
    pub fn record_temporal_state(&mut self, round: u32, elements: &[GameElement]) {
        self.history.retain(|s| s.round != round);
        self.history.push_back(TemporalSnapshot {
            round,
            elements: elements.to_vec(),
        });
        while self.history.len() > TEMPORAL_HISTORY_LIMIT {
            self.history.pop_front();
        }
    }

    pub fn snapshot(&self, round: u32) -> Option<&TemporalSnapshot> {
        self.history.iter().find(|s| s.round == round)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn active_challenge(&self) -> Option<&TemporalChallenge> {
        self.challenge.as_ref()
    }

    /// Configure a challenge for `action_round` over the given element set.
    pub fn initialize_temporal_challenge(
        &mut self,
        kind: TemporalChallengeKind,
        elements: &[GameElement],
        action_round: u32,
    ) -> TemporalChallenge {
        let reference_round = action_round.saturating_sub(kind.lookback());
        let density = (elements.len() / 6) as u8;
        let compression_level = kind
            .base_compression()
            .saturating_add(density)
            .clamp(1, MAX_COMPRESSION);

        let challenge = TemporalChallenge {
            kind,
            reference_round,
            action_round,
            compression_level,
        };
        debug!(
            ?kind,
            reference_round, action_round, compression_level, "Temporal challenge armed"
        );
        self.challenge = Some(challenge);
        challenge
    }

    /// Whether the past truth for a challenge kind is still on record.
    pub fn can_reference(&self, kind: TemporalChallengeKind, action_round: u32) -> bool {
        action_round > kind.lookback()
            && self
                .snapshot(action_round - kind.lookback())
                .is_some()
    }

    /// Correctness of an element per the reference snapshot, if both exist.
    pub fn reference_truth(&self, id: ElementId) -> Option<bool> {
        let challenge = self.challenge?;
        self.snapshot(challenge.reference_round)?
            .elements
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.is_correct())
    }

    /// Resolve a selection against the reference round.
    pub fn evaluate_temporal_selection(
        &self,
        id: ElementId,
        current_round: u32,
    ) -> TemporalEvaluation {
        let Some(challenge) = self.challenge else {
            return TemporalEvaluation {
                is_correct: false,
                insight: "Nothing from the past is being asked of you.".to_string(),
            };
        };

        let Some(snapshot) = self.snapshot(challenge.reference_round) else {
            return TemporalEvaluation {
                is_correct: false,
                insight: "The past held a different truth, but it has already faded.".to_string(),
            };
        };

        let rounds_back = current_round.saturating_sub(snapshot.round);
        match snapshot.elements.iter().find(|e| e.id == id) {
            Some(past) if past.is_correct() => TemporalEvaluation {
                is_correct: true,
                insight: match rounds_back {
                    1 => "You remembered what mattered 1 round ago.".to_string(),
                    n => format!("You remembered what mattered {} rounds ago.", n),
                },
            },
            Some(_) => TemporalEvaluation {
                is_correct: false,
                insight: "The past held a different truth.".to_string(),
            },
            None => TemporalEvaluation {
                is_correct: false,
                insight: "That form did not exist back then.".to_string(),
            },
        }
    }

    pub fn clear_challenge(&mut self) {
        self.challenge = None;
    }

    /// Drop history and any active challenge.
    pub fn reset(&mut self) {
        self.history.clear();
        self.challenge = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementColor, Position, Shape};

    fn round_elements(correct_slot: usize) -> Vec<GameElement> {
        (0..6)
            .map(|i| {
                let mut el = GameElement::new(
                    ElementId::slot(i),
                    Shape::Circle,
                    ElementColor::Blue,
                    Position::new(i as f64 * 10.0, 0.0),
                );
                if i == correct_slot {
                    el.mark_correct();
                }
                el
            })
            .collect()
    }

    #[test]
    fn test_history_is_bounded() {
        let mut engine = TemporalEngine::new();
        for round in 1..=15 {
            engine.record_temporal_state(round, &round_elements(0));
        }
        assert_eq!(engine.history_len(), TEMPORAL_HISTORY_LIMIT);
        assert!(engine.snapshot(5).is_none());
        assert!(engine.snapshot(6).is_some());
    }

    #[test]
    fn test_snapshot_is_deep_copy() {
        let mut engine = TemporalEngine::new();
        let mut elements = round_elements(1);
        engine.record_temporal_state(1, &elements);
        elements[1].mark_decoy();
        assert!(engine.snapshot(1).unwrap().elements[1].is_correct());
    }

    #[test]
    fn test_selection_resolves_against_past() {
        let mut engine = TemporalEngine::new();
        engine.record_temporal_state(1, &round_elements(2));
        engine.record_temporal_state(2, &round_elements(4));

        let current = round_elements(0);
        let challenge =
            engine.initialize_temporal_challenge(TemporalChallengeKind::DeepEcho, &current, 3);
        assert_eq!(challenge.reference_round, 1);

        assert!(engine.evaluate_temporal_selection(ElementId::slot(2), 3).is_correct);
        assert!(!engine.evaluate_temporal_selection(ElementId::slot(0), 3).is_correct);
        assert_eq!(engine.reference_truth(ElementId::slot(2)), Some(true));
    }

    #[test]
    fn test_insight_counts_rounds() {
        let mut engine = TemporalEngine::new();
        engine.record_temporal_state(1, &round_elements(3));
        engine.initialize_temporal_challenge(TemporalChallengeKind::Echo, &[], 2);
        let evaluation = engine.evaluate_temporal_selection(ElementId::slot(3), 2);
        assert!(evaluation.is_correct);
        assert_eq!(evaluation.insight, "You remembered what mattered 1 round ago.");

        engine.initialize_temporal_challenge(TemporalChallengeKind::DeepEcho, &[], 3);
        let evaluation = engine.evaluate_temporal_selection(ElementId::slot(3), 3);
        assert_eq!(evaluation.insight, "You remembered what mattered 2 rounds ago.");
    }

    #[test]
    fn test_missing_snapshot_is_incorrect_not_a_crash() {
        let mut engine = TemporalEngine::new();
        engine.initialize_temporal_challenge(TemporalChallengeKind::Afterimage, &[], 2);
        let evaluation = engine.evaluate_temporal_selection(ElementId::slot(0), 2);
        assert!(!evaluation.is_correct);
        assert!(evaluation.insight.contains("past held a different truth"));
    }

    #[test]
    fn test_unknown_element_in_snapshot() {
        let mut engine = TemporalEngine::new();
        engine.record_temporal_state(1, &round_elements(0));
        engine.initialize_temporal_challenge(TemporalChallengeKind::Echo, &[], 2);
        let evaluation = engine.evaluate_temporal_selection(ElementId::slot(40), 2);
        assert!(!evaluation.is_correct);
    }

    #[test]
    fn test_no_challenge() {
        let engine = TemporalEngine::new();
        assert!(!engine.evaluate_temporal_selection(ElementId::slot(0), 1).is_correct);
    }

    #[test]
    fn test_compression_level_and_speed() {
        let mut engine = TemporalEngine::new();
        let elements: Vec<_> = (0..12).flat_map(|_| round_elements(0)).take(12).collect();
        let challenge =
            engine.initialize_temporal_challenge(TemporalChallengeKind::Afterimage, &elements, 9);
        assert_eq!(challenge.compression_level, 5);
        assert!((challenge.speed_multiplier() - 1.6).abs() < 1e-9);

        let easy = engine.initialize_temporal_challenge(TemporalChallengeKind::Echo, &[], 9);
        assert_eq!(easy.compression_level, 1);
        assert_eq!(easy.speed_multiplier(), 1.0);
    }

    #[test]
    fn test_can_reference() {
        let mut engine = TemporalEngine::new();
        engine.record_temporal_state(1, &round_elements(0));
        assert!(engine.can_reference(TemporalChallengeKind::Echo, 2));
        assert!(!engine.can_reference(TemporalChallengeKind::DeepEcho, 2));
        assert!(!engine.can_reference(TemporalChallengeKind::Echo, 1));
    }

    #[test]
    fn test_reset() {
        let mut engine = TemporalEngine::new();
        engine.record_temporal_state(1, &round_elements(0));
        engine.initialize_temporal_challenge(TemporalChallengeKind::Echo, &[], 2);
        engine.reset();
        assert_eq!(engine.history_len(), 0);
        assert!(engine.active_challenge().is_none());
    }
}
