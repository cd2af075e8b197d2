//! Scene-level facts derived from an element set.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{ElementColor, GameElement, Position, Shape};
use crate::config::PlayArea;

/// Derived facts about the whole scene, shared by rule evaluation and deception.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneFacts {
    /// X coordinate of the vertical symmetry axis.
    pub symmetry_axis: f64,
    pub center: Position,
    pub dominant_color: Option<ElementColor>,
    pub dominant_shape: Option<Shape>,
    pub max_size: f64,
    pub max_brightness: f64,
    pub half_diagonal: f64,
}

impl SceneFacts {
    /// Derive facts for a set of elements placed in the given area.
    pub fn from_elements(elements: &[GameElement], area: &PlayArea) -> Self {
        let center = area.center();
        Self {
            symmetry_axis: center.x,
            center,
            dominant_color: dominant(elements.iter().map(|e| e.color)),
            dominant_shape: dominant(elements.iter().map(|e| e.shape)),
            max_size: elements.iter().map(|e| e.size).fold(0.0, f64::max),
            max_brightness: elements.iter().map(|e| e.brightness).fold(0.0, f64::max),
            half_diagonal: area.half_diagonal(),
        }
    }
}

/// Most frequent value; ties go to the value that sorts first.
fn dominant<T: Copy + Ord + std::hash::Hash>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(value, _)| value)
}

/// Refresh `distance_from_center` on every element.
pub fn update_center_distances(elements: &mut [GameElement], area: &PlayArea) {
    let center = area.center();
    for element in elements {
        element.distance_from_center = element.position.distance_to(center);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementId;

    fn el(index: usize, shape: Shape, color: ElementColor) -> GameElement {
        GameElement::new(ElementId::slot(index), shape, color, Position::new(0.0, 0.0))
    }

    #[test]
    fn test_dominant_color_and_shape() {
        let elements = vec![
            el(0, Shape::Star, ElementColor::Green),
            el(1, Shape::Star, ElementColor::Green),
            el(2, Shape::Circle, ElementColor::Red),
        ];
        let facts = SceneFacts::from_elements(&elements, &PlayArea::default());
        assert_eq!(facts.dominant_color, Some(ElementColor::Green));
        assert_eq!(facts.dominant_shape, Some(Shape::Star));
    }

    #[test]
    fn test_dominant_tie_breaks_by_order() {
        let elements = vec![
            el(0, Shape::Star, ElementColor::Blue),
            el(1, Shape::Circle, ElementColor::Red),
        ];
        let facts = SceneFacts::from_elements(&elements, &PlayArea::default());
        assert_eq!(facts.dominant_color, Some(ElementColor::Red));
        assert_eq!(facts.dominant_shape, Some(Shape::Circle));
    }

    #[test]
    fn test_empty_scene() {
        let facts = SceneFacts::from_elements(&[], &PlayArea::default());
        assert_eq!(facts.dominant_color, None);
        assert_eq!(facts.max_size, 0.0);
    }

    #[test]
    fn test_center_distances() {
        let area = PlayArea::default();
        let mut elements = vec![el(0, Shape::Circle, ElementColor::Red)];
        elements[0].position = area.center();
        update_center_distances(&mut elements, &area);
        assert_eq!(elements[0].distance_from_center, 0.0);
    }
}
