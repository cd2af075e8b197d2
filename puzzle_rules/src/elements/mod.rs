//! Element definitions for a round.

mod element;
mod scene;

pub use element::*;
pub use scene::*;

use serde::{Deserialize, Serialize};

/// Stable identifier for an element slot.
///
/// The same slot keeps its id from round to round, which is how behavioural
/// history is carried forward and how temporal challenges find an element in
/// a past snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u32);

impl ElementId {
    /// Id for the slot at the given index.
    pub fn slot(index: usize) -> Self {
        Self(index as u32)
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// Shapes an element can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Shape {
    Circle,
    Square,
    Triangle,
    Hexagon,
    Diamond,
    Star,
}

impl Shape {
    pub const ALL: [Shape; 6] = [
        Shape::Circle,
        Shape::Square,
        Shape::Triangle,
        Shape::Hexagon,
        Shape::Diamond,
        Shape::Star,
    ];

    /// Whether the shape reads as symmetric when drawn without distortion.
    pub fn is_symmetric_by_default(&self) -> bool {
        !matches!(self, Shape::Triangle | Shape::Star)
    }
}

/// Colours an element can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl ElementColor {
    pub const ALL: [ElementColor; 6] = [
        ElementColor::Red,
        ElementColor::Orange,
        ElementColor::Yellow,
        ElementColor::Green,
        ElementColor::Blue,
        ElementColor::Purple,
    ];

    /// How strongly the colour pulls the eye, from 0.0 to 1.0.
    pub fn salience(&self) -> f64 {
        match self {
            ElementColor::Red => 1.0,
            ElementColor::Orange => 0.9,
            ElementColor::Yellow => 0.8,
            ElementColor::Purple => 0.6,
            ElementColor::Green => 0.5,
            ElementColor::Blue => 0.4,
        }
    }

    /// The warm, high-salience colours traps prefer.
    pub fn is_salient(&self) -> bool {
        self.salience() >= 0.8
    }
}

/// A point in play-area coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// What an element was generated to be this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementRole {
    /// Satisfies the active rule.
    Valid,
    /// Attractive, fails the rule.
    Trap,
    /// Unrelated filler.
    Decoy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!((a.distance_to(b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_color_salience_ordering() {
        assert!(ElementColor::Red.salience() > ElementColor::Blue.salience());
        assert!(ElementColor::Orange.is_salient());
        assert!(!ElementColor::Green.is_salient());
    }

    #[test]
    fn test_slot_display() {
        assert_eq!(ElementId::slot(3).to_string(), "slot-3");
    }
}
