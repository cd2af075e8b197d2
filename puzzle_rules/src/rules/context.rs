//! Read-only context passed to rule evaluation.

use crate::config::PlayArea;
use crate::elements::{ElementId, GameElement, SceneFacts};

/// Snapshot of everything a rule may look at. Rules never mutate it.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub elements: &'a [GameElement],
    pub previous: Option<&'a [GameElement]>,
    pub two_back: Option<&'a [GameElement]>,
    pub round: u32,
    /// Selections made so far this round.
    pub selections: &'a [ElementId],
    /// Selections from earlier rounds, oldest first.
    pub selection_history: &'a [ElementId],
    pub scene: SceneFacts,
}

impl<'a> RuleContext<'a> {
    /// Build a context for the current element set with no history.
    pub fn new(elements: &'a [GameElement], area: &PlayArea, round: u32) -> Self {
        Self {
            elements,
            previous: None,
            two_back: None,
            round,
            selections: &[],
            selection_history: &[],
            scene: SceneFacts::from_elements(elements, area),
        }
    }

    pub fn with_previous(mut self, previous: &'a [GameElement]) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn with_two_back(mut self, two_back: &'a [GameElement]) -> Self {
        self.two_back = Some(two_back);
        self
    }

    pub fn with_selections(mut self, selections: &'a [ElementId]) -> Self {
        self.selections = selections;
        self
    }

    pub fn with_history(mut self, history: &'a [ElementId]) -> Self {
        self.selection_history = history;
        self
    }

    /// The same slot in the previous round, if it existed.
    pub fn previous_of(&self, id: ElementId) -> Option<&'a GameElement> {
        self.previous?.iter().find(|e| e.id == id)
    }

    pub fn has_history(&self) -> bool {
        self.previous.is_some()
    }
}
