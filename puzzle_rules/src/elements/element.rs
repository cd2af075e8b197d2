//! The per-round element record.

use serde::{Deserialize, Serialize};

use super::{ElementColor, ElementId, ElementRole, Position, Shape};

/// One interactive object in a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameElement {
    pub id: ElementId,

    // Visuals
    pub shape: Shape,
    pub color: ElementColor,
    pub position: Position,
    /// Radius in play-area units.
    pub size: f64,
    /// 0.0 - 1.0.
    pub opacity: f64,
    /// 0.0 - 1.0.
    pub brightness: f64,
    pub is_symmetric: bool,

    // Behavioural history
    pub has_moved: bool,
    pub move_count: u32,
    pub appeared_round: u32,
    pub was_selected_before: bool,
    pub was_relevant_last_round: bool,
    pub distance_from_center: f64,
    /// Accumulated gaze time reported by the presentation layer.
    pub gaze_time_ms: u64,

    // Resolved state, never both true
    is_correct: bool,
    is_trap: bool,
}

impl GameElement {
    /// Create a fresh element with neutral visuals and no history.
    pub fn new(id: ElementId, shape: Shape, color: ElementColor, position: Position) -> Self {
        Self {
            id,
            shape,
            color,
            position,
            size: 40.0,
            opacity: 1.0,
            brightness: 0.5,
            is_symmetric: shape.is_symmetric_by_default(),
            has_moved: false,
            move_count: 0,
            appeared_round: 0,
            was_selected_before: false,
            was_relevant_last_round: false,
            distance_from_center: 0.0,
            gaze_time_ms: 0,
            is_correct: false,
            is_trap: false,
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size.max(0.0);
        self
    }

    pub fn with_brightness(mut self, brightness: f64) -> Self {
        self.brightness = brightness.clamp(0.0, 1.0);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_symmetry(mut self, symmetric: bool) -> Self {
        self.is_symmetric = symmetric;
        self
    }

    pub fn appearing_in(mut self, round: u32) -> Self {
        self.appeared_round = round;
        self
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn is_trap(&self) -> bool {
        self.is_trap
    }

    /// Mark the element as satisfying the rule. Clears any trap flag.
    pub fn mark_correct(&mut self) {
        self.is_correct = true;
        self.is_trap = false;
    }

    /// Mark the element as a trap. Clears any correct flag.
    pub fn mark_trap(&mut self) {
        self.is_trap = true;
        self.is_correct = false;
    }

    /// Mark the element as neither correct nor a trap.
    pub fn mark_decoy(&mut self) {
        self.is_correct = false;
        self.is_trap = false;
    }

    /// Set correctness from a rule verdict, keeping the trap flag only on incorrect elements.
    pub fn resolve(&mut self, correct: bool) {
        if correct {
            self.mark_correct();
        } else {
            self.is_correct = false;
        }
    }

    pub fn role(&self) -> ElementRole {
        if self.is_correct {
            ElementRole::Valid
        } else if self.is_trap {
            ElementRole::Trap
        } else {
            ElementRole::Decoy
        }
    }

    /// Copy behavioural history from the same slot in the previous round.
    ///
    /// `selected_last_round` reports whether the player picked this slot last round.
    pub fn carry_history_from(&mut self, previous: &GameElement, selected_last_round: bool) {
        let moved = previous.position.distance_to(self.position) > 1.0;
        self.has_moved = moved;
        self.move_count = previous.move_count + u32::from(moved);
        self.appeared_round = previous.appeared_round;
        self.was_selected_before = previous.was_selected_before || selected_last_round;
        self.was_relevant_last_round = previous.is_correct;
        self.gaze_time_ms = previous.gaze_time_ms;
    }

    /// Add gaze time reported by the presentation layer.
    pub fn record_gaze(&mut self, millis: u64) {
        self.gaze_time_ms = self.gaze_time_ms.saturating_add(millis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element() -> GameElement {
        GameElement::new(
            ElementId::slot(0),
            Shape::Circle,
            ElementColor::Blue,
            Position::new(10.0, 10.0),
        )
    }

    #[test]
    fn test_new_element() {
        let el = element();
        assert!(!el.is_correct());
        assert!(!el.is_trap());
        assert!(el.is_symmetric);
        assert_eq!(el.role(), ElementRole::Decoy);
    }

    #[test]
    fn test_correct_and_trap_are_exclusive() {
        let mut el = element();
        el.mark_trap();
        assert_eq!(el.role(), ElementRole::Trap);

        el.mark_correct();
        assert!(el.is_correct());
        assert!(!el.is_trap());

        el.mark_trap();
        assert!(!el.is_correct());
        assert!(el.is_trap());
    }

    #[test]
    fn test_resolve_keeps_trap_on_incorrect() {
        let mut el = element();
        el.mark_trap();
        el.resolve(false);
        assert!(el.is_trap());

        el.resolve(true);
        assert!(!el.is_trap());
        assert!(el.is_correct());
    }

    #[test]
    fn test_carry_history() {
        let mut previous = element().appearing_in(2);
        previous.move_count = 1;
        previous.mark_correct();
        previous.record_gaze(300);

        let mut current = GameElement::new(
            ElementId::slot(0),
            Shape::Square,
            ElementColor::Red,
            Position::new(80.0, 10.0),
        )
        .appearing_in(4);
        current.carry_history_from(&previous, true);

        assert!(current.has_moved);
        assert_eq!(current.move_count, 2);
        assert_eq!(current.appeared_round, 2);
        assert!(current.was_selected_before);
        assert!(current.was_relevant_last_round);
        assert_eq!(current.gaze_time_ms, 300);
    }

    #[test]
    fn test_carry_history_without_move() {
        let previous = element();
        let mut current = element();
        current.carry_history_from(&previous, false);

        assert!(!current.has_moved);
        assert_eq!(current.move_count, 0);
        assert!(!current.was_selected_before);
        assert!(!current.was_relevant_last_round);
    }
}
