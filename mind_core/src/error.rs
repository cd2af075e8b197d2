//! Error types surfaced by the session facade and the mind-model boundary.

use puzzle_rules::ElementId;
use thiserror::Error;

/// Why a player action could not be scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no puzzle is active")]
    NoActivePuzzle,

    #[error("element {0} is not part of the current puzzle")]
    ElementNotFound(ElementId),

    #[error("element {0} was already selected this round")]
    AlreadySelected(ElementId),
}

/// Why a mind model could not be exported or imported.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("mind model is malformed: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("unsupported mind model version {0}")]
    UnsupportedVersion(u32),

    #[error("failed to encode mind model: {0}")]
    Encode(#[source] serde_json::Error),
}
