//! The playable round handed to the presentation layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::GeneratorConfig;
use crate::domains::CognitiveDomain;
use crate::elements::{ElementId, ElementRole, GameElement};
use crate::temporal::TemporalChallenge;

/// Unique identifier for a generated puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PuzzleId(pub Uuid);

impl PuzzleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PuzzleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PuzzleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How many elements of each role a round is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundComposition {
    pub valid: usize,
    pub traps: usize,
    pub decoys: usize,
}

impl RoundComposition {
    /// Split the round's element count between valid, trap and decoy slots.
    pub fn for_difficulty(config: &GeneratorConfig, difficulty: f64, trap_factor: f64) -> Self {
        let total = config.element_count(difficulty);
        let valid = ((config.valid_share * total as f64).ceil() as usize)
            .max(config.min_valid)
            .min(total);
        let traps = ((difficulty.max(0.0) * trap_factor).floor() as usize)
            .max(1)
            .min(total - valid);
        Self {
            valid,
            traps,
            decoys: total - valid - traps,
        }
    }

    pub fn total(&self) -> usize {
        self.valid + self.traps + self.decoys
    }

    /// One role per slot, valid first.
    pub fn roles(&self) -> Vec<ElementRole> {
        std::iter::repeat(ElementRole::Valid)
            .take(self.valid)
            .chain(std::iter::repeat(ElementRole::Trap).take(self.traps))
            .chain(std::iter::repeat(ElementRole::Decoy).take(self.decoys))
            .collect()
    }
}

/// One generated round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleState {
    pub id: PuzzleId,
    pub round: u32,
    pub difficulty: f64,
    /// Domain the active rule trains.
    pub domain: CognitiveDomain,
    pub rule_complexity: u8,
    /// Elements in presentation order.
    pub elements: Vec<GameElement>,
    pub composition: RoundComposition,
    pub temporal: Option<TemporalChallenge>,
    /// Animation and timer speed; above 1.0 under temporal compression.
    pub speed_multiplier: f64,
}

impl PuzzleState {
    pub fn element(&self, id: ElementId) -> Option<&GameElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut GameElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    pub fn valid_ids(&self) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|e| e.is_correct())
            .map(|e| e.id)
            .collect()
    }

    pub fn trap_ids(&self) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|e| e.is_trap())
            .map(|e| e.id)
            .collect()
    }

    pub fn valid_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_correct()).count()
    }
}
