use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Archetype, EvolutionStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakthroughKind {
    Evolution(EvolutionStage),
    ArchetypeShift(Archetype),
}

/// A moment worth telling the player about at the end of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakthrough {
    pub id: Uuid,
    pub timestamp_ms: u64,
    pub kind: BreakthroughKind,
    pub title: String,
    pub description: String,
}

impl Breakthrough {
    pub fn evolution(stage: EvolutionStage, timestamp_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp_ms,
            kind: BreakthroughKind::Evolution(stage),
            title: format!("Evolution: {}", stage.title()),
            description: stage.description().to_string(),
        }
    }

    pub fn archetype_shift(archetype: Archetype, timestamp_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp_ms,
            kind: BreakthroughKind::ArchetypeShift(archetype),
            title: format!("The {} emerges", archetype.title()),
            description: archetype.description().to_string(),
        }
    }
}
