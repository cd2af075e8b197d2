//! Styling elements by role and bending them toward (or away from) the active rule.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{GeneratorConfig, PlayArea};
use crate::elements::{ElementColor, ElementId, ElementRole, GameElement, Position, Shape};
use crate::rules::{RulePredicate, DIM_THRESHOLD, NEAR_CENTER_FRACTION};

/// Per-slot facts the shaper may lean on.
#[derive(Debug, Clone, Copy)]
pub struct ShapingHint<'a> {
    pub area: &'a PlayArea,
    pub previous: Option<&'a GameElement>,
    pub selected_last_round: bool,
    pub theme_color: ElementColor,
    pub theme_shape: Shape,
    pub max_size: f64,
    pub min_spacing: f64,
}

fn other_shape<R: Rng + ?Sized>(rng: &mut R, not: Shape) -> Shape {
    let options: Vec<Shape> = Shape::ALL.iter().copied().filter(|s| *s != not).collect();
    options.choose(rng).copied().unwrap_or(Shape::Square)
}

fn other_color<R: Rng + ?Sized>(rng: &mut R, not: ElementColor) -> ElementColor {
    let options: Vec<ElementColor> = ElementColor::ALL
        .iter()
        .copied()
        .filter(|c| *c != not)
        .collect();
    options.choose(rng).copied().unwrap_or(ElementColor::Purple)
}

fn set_shape(element: &mut GameElement, shape: Shape) {
    element.shape = shape;
    element.is_symmetric = shape.is_symmetric_by_default();
}

/// Build an element with the look its role calls for. Position is set separately.
pub fn style_for_role<R: Rng + ?Sized>(
    rng: &mut R,
    id: ElementId,
    role: ElementRole,
    config: &GeneratorConfig,
) -> GameElement {
    let min = config.min_element_size;
    let max = config.max_element_size;
    let shape = *Shape::ALL.choose(rng).unwrap_or(&Shape::Circle);

    match role {
        ElementRole::Trap => {
            let salient: Vec<ElementColor> = ElementColor::ALL
                .iter()
                .copied()
                .filter(|c| c.is_salient())
                .collect();
            let color = salient.choose(rng).copied().unwrap_or(ElementColor::Red);
            GameElement::new(id, shape, color, Position::default())
                .with_size(rng.gen_range((min.max(max * 0.75))..=max))
                .with_brightness(rng.gen_range(0.85..=1.0))
                .with_opacity(1.0)
                .with_symmetry(true)
        }
        ElementRole::Valid => {
            let color = *ElementColor::ALL.choose(rng).unwrap_or(&ElementColor::Blue);
            let symmetric = shape.is_symmetric_by_default() != rng.gen_bool(0.2);
            GameElement::new(id, shape, color, Position::default())
                .with_size(rng.gen_range(min..=((min + max) / 2.0)))
                .with_brightness(rng.gen_range(0.35..=0.7))
                .with_opacity(rng.gen_range(0.75..=1.0))
                .with_symmetry(symmetric)
        }
        ElementRole::Decoy => {
            let color = *ElementColor::ALL.choose(rng).unwrap_or(&ElementColor::Green);
            let symmetric = shape.is_symmetric_by_default() != rng.gen_bool(0.2);
            GameElement::new(id, shape, color, Position::default())
                .with_size(rng.gen_range(min..=(min.max(max * 0.7))))
                .with_brightness(rng.gen_range(0.2..=0.55))
                .with_opacity(rng.gen_range(0.6..=0.95))
                .with_symmetry(symmetric)
        }
    }
}

/// Nudge a position off its previous spot so the slot reads as moved.
fn displace(position: Position, area: &PlayArea, step: f64) -> Position {
    let right = Position::new(position.x + step, position.y);
    if right.x <= area.max_x() {
        right
    } else {
        Position::new((position.x - step).max(area.min_x()), position.y)
    }
}

/// Adjust an element so the predicate yields `want`, as far as the element alone allows.
///
/// Returns whether the element now matches, judged on the element itself.
/// Scene-wide predicates (dominance, size ratio) are best effort and are
/// confirmed later by evaluating the finished round.
pub fn conform<R: Rng + ?Sized>(
    predicate: &RulePredicate,
    element: &mut GameElement,
    want: bool,
    hint: &ShapingHint<'_>,
    rng: &mut R,
) -> bool {
    match predicate {
        RulePredicate::ShapeIs(shape) => {
            if want {
                set_shape(element, *shape);
            } else if element.shape == *shape {
                set_shape(element, other_shape(rng, *shape));
            }
            true
        }
        RulePredicate::ColorIs(color) => {
            if want {
                element.color = *color;
            } else if element.color == *color {
                element.color = other_color(rng, *color);
            }
            true
        }
        RulePredicate::NotColor(color) => {
            if !want {
                element.color = *color;
            } else if element.color == *color {
                element.color = other_color(rng, *color);
            }
            true
        }
        RulePredicate::Symmetric => {
            element.is_symmetric = want;
            true
        }
        RulePredicate::Asymmetric => {
            element.is_symmetric = !want;
            true
        }
        RulePredicate::SizeDominant => {
            if want {
                element.size = hint.max_size;
            } else {
                element.size = element.size.min(hint.max_size * 0.6);
            }
            true
        }
        RulePredicate::LeftOfAxis => {
            let axis = hint.area.center().x;
            let is_left = element.position.x < axis;
            if is_left != want {
                let mirrored = 2.0 * axis - element.position.x;
                element.position.x = if (mirrored - axis).abs() < f64::EPSILON {
                    if want {
                        axis - hint.min_spacing / 2.0
                    } else {
                        axis + hint.min_spacing / 2.0
                    }
                } else {
                    mirrored
                };
            }
            (element.position.x < axis) == want
        }
        RulePredicate::NearCenter => {
            let center = hint.area.center();
            let radius = hint.area.half_diagonal() * NEAR_CENTER_FRACTION;
            let offset_x = element.position.x - center.x;
            let offset_y = element.position.y - center.y;
            let distance = (offset_x * offset_x + offset_y * offset_y).sqrt();
            let (dir_x, dir_y) = if distance > f64::EPSILON {
                (offset_x / distance, offset_y / distance)
            } else {
                let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                (angle.cos(), angle.sin())
            };

            if want && distance >= radius {
                element.position = Position::new(
                    center.x + dir_x * radius * 0.8,
                    center.y + dir_y * radius * 0.8,
                );
            } else if !want && distance < radius {
                element.position = hint.area.clamp(Position::new(
                    center.x + dir_x * radius * 1.25,
                    center.y + dir_y * radius * 1.25,
                ));
            }
            (element.position.distance_to(center) < radius) == want
        }
        RulePredicate::Dim => {
            if want && element.brightness >= DIM_THRESHOLD {
                element.brightness = rng.gen_range(0.2..=0.45);
            } else if !want && element.brightness < DIM_THRESHOLD {
                element.brightness = rng.gen_range(0.6..=0.9);
            }
            true
        }
        RulePredicate::Moved => match hint.previous {
            Some(prev) => {
                if want {
                    if prev.position.distance_to(element.position) <= 1.0 {
                        element.position = displace(prev.position, hint.area, hint.min_spacing);
                    }
                } else {
                    element.position = prev.position;
                }
                true
            }
            None => !want,
        },
        RulePredicate::StayedStill => match hint.previous {
            Some(prev) => {
                if want {
                    element.position = prev.position;
                } else if prev.position.distance_to(element.position) <= 1.0 {
                    element.position = displace(prev.position, hint.area, hint.min_spacing);
                }
                true
            }
            None => !want,
        },
        RulePredicate::WasRelevant => {
            hint.previous.map(|p| p.is_correct()).unwrap_or(false) == want
        }
        RulePredicate::NeverSelected => {
            let selected = hint.selected_last_round
                || hint.previous.map(|p| p.was_selected_before).unwrap_or(false);
            selected != want
        }
        RulePredicate::DominantColor => {
            if want {
                element.color = hint.theme_color;
            } else if element.color == hint.theme_color {
                element.color = other_color(rng, hint.theme_color);
            }
            true
        }
        RulePredicate::OddShapeOut => {
            if want {
                if element.shape == hint.theme_shape {
                    set_shape(element, other_shape(rng, hint.theme_shape));
                }
            } else {
                set_shape(element, hint.theme_shape);
            }
            true
        }
        RulePredicate::EchoColor => match hint.previous {
            Some(prev) => {
                if want {
                    element.color = prev.color;
                } else if element.color == prev.color {
                    element.color = other_color(rng, prev.color);
                }
                true
            }
            None => !want,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleContext;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn hint<'a>(area: &'a PlayArea, previous: Option<&'a GameElement>) -> ShapingHint<'a> {
        ShapingHint {
            area,
            previous,
            selected_last_round: false,
            theme_color: ElementColor::Purple,
            theme_shape: Shape::Hexagon,
            max_size: 56.0,
            min_spacing: 72.0,
        }
    }

    fn element_at(position: Position) -> GameElement {
        GameElement::new(ElementId::slot(0), Shape::Circle, ElementColor::Red, position)
    }

    #[test]
    fn test_trap_style_is_attractive() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = GeneratorConfig::default();
        for _ in 0..50 {
            let trap = style_for_role(&mut rng, ElementId::slot(0), ElementRole::Trap, &config);
            assert!(trap.brightness >= 0.85);
            assert!(trap.color.is_salient());
            assert!(trap.is_symmetric);
        }
    }

    #[test]
    fn test_decoy_style_is_dull() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = GeneratorConfig::default();
        for _ in 0..50 {
            let decoy = style_for_role(&mut rng, ElementId::slot(0), ElementRole::Decoy, &config);
            assert!(decoy.brightness <= 0.55);
        }
    }

    #[test]
    fn test_static_predicates_conform_both_ways() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let area = PlayArea::default();
        let predicates = [
            RulePredicate::ShapeIs(Shape::Triangle),
            RulePredicate::ColorIs(ElementColor::Green),
            RulePredicate::NotColor(ElementColor::Red),
            RulePredicate::Symmetric,
            RulePredicate::Asymmetric,
            RulePredicate::Dim,
            RulePredicate::LeftOfAxis,
            RulePredicate::NearCenter,
        ];

        for predicate in predicates {
            for want in [true, false] {
                let mut el = element_at(Position::new(300.0, 100.0)).with_brightness(0.8);
                assert!(conform(&predicate, &mut el, want, &hint(&area, None), &mut rng));
                let elements = vec![el];
                let ctx = RuleContext::new(&elements, &area, 1);
                assert_eq!(predicate.evaluate(&elements[0], &ctx), want, "{:?}", predicate);
            }
        }
    }

    #[test]
    fn test_history_predicates_without_previous() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let area = PlayArea::default();
        let mut el = element_at(area.center());
        assert!(!conform(&RulePredicate::Moved, &mut el, true, &hint(&area, None), &mut rng));
        assert!(conform(&RulePredicate::Moved, &mut el, false, &hint(&area, None), &mut rng));
        assert!(!conform(&RulePredicate::EchoColor, &mut el, true, &hint(&area, None), &mut rng));
    }

    #[test]
    fn test_moved_and_stayed_use_previous_position() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let area = PlayArea::default();
        let prev = element_at(Position::new(100.0, 100.0));

        let mut still = element_at(Position::new(250.0, 400.0));
        conform(&RulePredicate::StayedStill, &mut still, true, &hint(&area, Some(&prev)), &mut rng);
        assert_eq!(still.position, prev.position);

        let mut moved = element_at(prev.position);
        conform(&RulePredicate::Moved, &mut moved, true, &hint(&area, Some(&prev)), &mut rng);
        assert!(moved.position.distance_to(prev.position) > 1.0);
    }

    #[test]
    fn test_size_dominant() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let area = PlayArea::default();
        let mut big = element_at(area.center()).with_size(30.0);
        let mut small = element_at(area.center()).with_size(50.0);
        conform(&RulePredicate::SizeDominant, &mut big, true, &hint(&area, None), &mut rng);
        conform(&RulePredicate::SizeDominant, &mut small, false, &hint(&area, None), &mut rng);
        assert_eq!(big.size, 56.0);
        assert!(small.size <= 56.0 * 0.6);
    }
}
