//! Affordance profiles - how strongly an element invites selection.

use serde::{Deserialize, Serialize};

use crate::elements::{GameElement, SceneFacts};

pub const VISUAL_ATTRACTION_WEIGHT: f64 = 0.25;
pub const POSITION_BIAS_WEIGHT: f64 = 0.25;
pub const SIZE_DOMINANCE_WEIGHT: f64 = 0.20;
pub const COLOR_SALIENCE_WEIGHT: f64 = 0.15;
pub const SYMMETRY_APPEAL_WEIGHT: f64 = 0.15;

/// Score above which an element loses validity when the player hesitates.
pub const DECAY_THRESHOLD: f64 = 0.7;
pub const GAZE_THRESHOLD: f64 = 0.6;
pub const PULSE_THRESHOLD: f64 = 0.8;

/// Composite appeal of one element for the current round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffordanceProfile {
    pub visual_attraction: f64,
    pub position_bias: f64,
    pub size_dominance: f64,
    pub color_salience: f64,
    pub symmetry_appeal: f64,
    /// Weighted sum of the five sub-scores, 0.0 - 1.0.
    pub score: f64,
    pub decays_on_hesitation: bool,
    pub reacts_to_gaze: bool,
    pub pulses_for_attention: bool,
}

impl AffordanceProfile {
    /// Compute the profile of an element within its scene.
    pub fn compute(element: &GameElement, scene: &SceneFacts) -> Self {
        let visual_attraction = (element.brightness * 0.6 + element.opacity * 0.4).clamp(0.0, 1.0);
        let position_bias = if scene.half_diagonal > 0.0 {
            (1.0 - element.distance_from_center / scene.half_diagonal).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let size_dominance = if scene.max_size > 0.0 {
            (element.size / scene.max_size).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let color_salience = element.color.salience();
        let symmetry_appeal = if element.is_symmetric { 1.0 } else { 0.3 };

        let score = (visual_attraction * VISUAL_ATTRACTION_WEIGHT
            + position_bias * POSITION_BIAS_WEIGHT
            + size_dominance * SIZE_DOMINANCE_WEIGHT
            + color_salience * COLOR_SALIENCE_WEIGHT
            + symmetry_appeal * SYMMETRY_APPEAL_WEIGHT)
            .clamp(0.0, 1.0);

        Self {
            visual_attraction,
            position_bias,
            size_dominance,
            color_salience,
            symmetry_appeal,
            score,
            decays_on_hesitation: score > DECAY_THRESHOLD,
            reacts_to_gaze: score > GAZE_THRESHOLD,
            pulses_for_attention: score > PULSE_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayArea;
    use crate::elements::{update_center_distances, ElementColor, ElementId, Position, Shape};

    #[test]
    fn test_weights_sum_to_one() {
        let total = VISUAL_ATTRACTION_WEIGHT
            + POSITION_BIAS_WEIGHT
            + SIZE_DOMINANCE_WEIGHT
            + COLOR_SALIENCE_WEIGHT
            + SYMMETRY_APPEAL_WEIGHT;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_maximal_element_scores_high() {
        let area = PlayArea::default();
        let mut elements = vec![GameElement::new(
            ElementId::slot(0),
            Shape::Circle,
            ElementColor::Red,
            area.center(),
        )
        .with_brightness(1.0)];
        update_center_distances(&mut elements, &area);
        let scene = SceneFacts::from_elements(&elements, &area);

        let profile = AffordanceProfile::compute(&elements[0], &scene);
        assert!((profile.score - 1.0).abs() < 1e-9);
        assert!(profile.decays_on_hesitation);
        assert!(profile.reacts_to_gaze);
        assert!(profile.pulses_for_attention);
    }

    #[test]
    fn test_dull_element_scores_low() {
        let area = PlayArea::default();
        let mut elements = vec![
            GameElement::new(ElementId::slot(0), Shape::Circle, ElementColor::Red, area.center())
                .with_size(60.0),
            GameElement::new(
                ElementId::slot(1),
                Shape::Star,
                ElementColor::Blue,
                Position::new(area.min_x(), area.min_y()),
            )
            .with_size(20.0)
            .with_brightness(0.1)
            .with_opacity(0.5)
            .with_symmetry(false),
        ];
        update_center_distances(&mut elements, &area);
        let scene = SceneFacts::from_elements(&elements, &area);

        let profile = AffordanceProfile::compute(&elements[1], &scene);
        assert!(profile.score < 0.5);
        assert!(!profile.decays_on_hesitation);
        assert!(!profile.pulses_for_attention);
    }
}
