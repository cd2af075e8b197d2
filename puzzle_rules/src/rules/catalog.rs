//! The hidden-rule catalog and its single evaluation dispatcher.

use serde::{Deserialize, Serialize};

use super::RuleContext;
use crate::domains::CognitiveDomain;
use crate::elements::{ElementColor, GameElement, Shape};

/// Fraction of the half-diagonal that counts as "near the centre".
pub const NEAR_CENTER_FRACTION: f64 = 0.35;

/// Size relative to the largest element that counts as dominant.
pub const SIZE_DOMINANCE_RATIO: f64 = 0.8;

/// Brightness below which an element counts as dim.
pub const DIM_THRESHOLD: f64 = 0.5;

/// Families of hidden rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleCategory {
    Static,
    Relational,
    Inverse,
    Temporal,
    Contextual,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 5] = [
        RuleCategory::Static,
        RuleCategory::Relational,
        RuleCategory::Inverse,
        RuleCategory::Temporal,
        RuleCategory::Contextual,
    ];

    /// The cognitive domain a rule of this category exercises.
    pub fn domain(&self) -> CognitiveDomain {
        match self {
            RuleCategory::Static => CognitiveDomain::Perception,
            RuleCategory::Relational => CognitiveDomain::Spatial,
            RuleCategory::Inverse => CognitiveDomain::Logic,
            RuleCategory::Temporal => CognitiveDomain::Temporal,
            RuleCategory::Contextual => CognitiveDomain::Meta,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Static => "static",
            RuleCategory::Relational => "relational",
            RuleCategory::Inverse => "inverse",
            RuleCategory::Temporal => "temporal",
            RuleCategory::Contextual => "contextual",
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The predicate behind a hidden rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RulePredicate {
    ShapeIs(Shape),
    ColorIs(ElementColor),
    Symmetric,
    /// Size within [`SIZE_DOMINANCE_RATIO`] of the largest element.
    SizeDominant,
    LeftOfAxis,
    NearCenter,
    NotColor(ElementColor),
    Asymmetric,
    Dim,
    Moved,
    StayedStill,
    /// Was correct in the previous round.
    WasRelevant,
    NeverSelected,
    DominantColor,
    /// Any shape other than the dominant one.
    OddShapeOut,
    /// Same colour as this slot had last round.
    EchoColor,
}

impl RulePredicate {
    /// Evaluate the predicate for one element.
    pub fn evaluate(&self, element: &GameElement, ctx: &RuleContext<'_>) -> bool {
        match self {
            RulePredicate::ShapeIs(shape) => element.shape == *shape,
            RulePredicate::ColorIs(color) => element.color == *color,
            RulePredicate::Symmetric => element.is_symmetric,
            RulePredicate::SizeDominant => {
                ctx.scene.max_size > 0.0
                    && element.size >= ctx.scene.max_size * SIZE_DOMINANCE_RATIO
            }
            RulePredicate::LeftOfAxis => element.position.x < ctx.scene.symmetry_axis,
            RulePredicate::NearCenter => {
                element.position.distance_to(ctx.scene.center)
                    < ctx.scene.half_diagonal * NEAR_CENTER_FRACTION
            }
            RulePredicate::NotColor(color) => element.color != *color,
            RulePredicate::Asymmetric => !element.is_symmetric,
            RulePredicate::Dim => element.brightness < DIM_THRESHOLD,
            RulePredicate::Moved => ctx.has_history() && element.has_moved,
            RulePredicate::StayedStill => {
                ctx.previous_of(element.id).is_some() && !element.has_moved
            }
            RulePredicate::WasRelevant => ctx
                .previous_of(element.id)
                .map(|prev| prev.is_correct())
                .unwrap_or(false),
            RulePredicate::NeverSelected => {
                !element.was_selected_before && !ctx.selection_history.contains(&element.id)
            }
            RulePredicate::DominantColor => ctx.scene.dominant_color == Some(element.color),
            RulePredicate::OddShapeOut => ctx
                .scene
                .dominant_shape
                .map(|shape| element.shape != shape)
                .unwrap_or(false),
            RulePredicate::EchoColor => ctx
                .previous_of(element.id)
                .map(|prev| prev.color == element.color)
                .unwrap_or(false),
        }
    }

    /// Whether the predicate can only be satisfied with a previous round on record.
    pub fn requires_history(&self) -> bool {
        matches!(
            self,
            RulePredicate::Moved
                | RulePredicate::StayedStill
                | RulePredicate::WasRelevant
                | RulePredicate::NeverSelected
                | RulePredicate::EchoColor
        )
    }
}

/// A named hidden rule with its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HiddenRule {
    pub id: &'static str,
    pub name: &'static str,
    pub predicate: RulePredicate,
    pub complexity: u8,
    pub category: RuleCategory,
    /// Ids of rules this one may mutate into. Empty means "any nearby complexity".
    pub mutations: &'static [&'static str],
}

impl HiddenRule {
    pub fn evaluate(&self, element: &GameElement, ctx: &RuleContext<'_>) -> bool {
        self.predicate.evaluate(element, ctx)
    }

    pub fn requires_history(&self) -> bool {
        self.predicate.requires_history()
    }
}

/// Every hidden rule the engine can select.
pub static RULE_CATALOG: &[HiddenRule] = &[
    HiddenRule {
        id: "shape-circle",
        name: "Circles",
        predicate: RulePredicate::ShapeIs(Shape::Circle),
        complexity: 1,
        category: RuleCategory::Static,
        mutations: &["shape-triangle", "symmetric"],
    },
    HiddenRule {
        id: "shape-triangle",
        name: "Triangles",
        predicate: RulePredicate::ShapeIs(Shape::Triangle),
        complexity: 1,
        category: RuleCategory::Static,
        mutations: &["shape-circle", "asymmetric"],
    },
    HiddenRule {
        id: "color-blue",
        name: "Blue",
        predicate: RulePredicate::ColorIs(ElementColor::Blue),
        complexity: 1,
        category: RuleCategory::Static,
        mutations: &["color-green", "not-red"],
    },
    HiddenRule {
        id: "color-green",
        name: "Green",
        predicate: RulePredicate::ColorIs(ElementColor::Green),
        complexity: 1,
        category: RuleCategory::Static,
        mutations: &["color-blue", "dominant-color"],
    },
    HiddenRule {
        id: "symmetric",
        name: "Balanced forms",
        predicate: RulePredicate::Symmetric,
        complexity: 2,
        category: RuleCategory::Static,
        mutations: &["asymmetric"],
    },
    HiddenRule {
        id: "size-dominant",
        name: "The largest",
        predicate: RulePredicate::SizeDominant,
        complexity: 2,
        category: RuleCategory::Relational,
        mutations: &["near-center", "dim"],
    },
    HiddenRule {
        id: "left-of-axis",
        name: "West of the axis",
        predicate: RulePredicate::LeftOfAxis,
        complexity: 2,
        category: RuleCategory::Relational,
        mutations: &[],
    },
    HiddenRule {
        id: "near-center",
        name: "Close to the heart",
        predicate: RulePredicate::NearCenter,
        complexity: 3,
        category: RuleCategory::Relational,
        mutations: &["left-of-axis", "size-dominant"],
    },
    HiddenRule {
        id: "not-red",
        name: "Anything but red",
        predicate: RulePredicate::NotColor(ElementColor::Red),
        complexity: 2,
        category: RuleCategory::Inverse,
        mutations: &["color-blue"],
    },
    HiddenRule {
        id: "asymmetric",
        name: "Broken forms",
        predicate: RulePredicate::Asymmetric,
        complexity: 2,
        category: RuleCategory::Inverse,
        mutations: &["symmetric"],
    },
    HiddenRule {
        id: "dim",
        name: "The quiet ones",
        predicate: RulePredicate::Dim,
        complexity: 3,
        category: RuleCategory::Inverse,
        mutations: &[],
    },
    HiddenRule {
        id: "moved",
        name: "What shifted",
        predicate: RulePredicate::Moved,
        complexity: 3,
        category: RuleCategory::Temporal,
        mutations: &["stayed-still"],
    },
    HiddenRule {
        id: "stayed-still",
        name: "What held its ground",
        predicate: RulePredicate::StayedStill,
        complexity: 3,
        category: RuleCategory::Temporal,
        mutations: &["moved", "echo-color"],
    },
    HiddenRule {
        id: "was-relevant",
        name: "Yesterday's answer",
        predicate: RulePredicate::WasRelevant,
        complexity: 4,
        category: RuleCategory::Temporal,
        mutations: &[],
    },
    HiddenRule {
        id: "never-selected",
        name: "Untouched",
        predicate: RulePredicate::NeverSelected,
        complexity: 3,
        category: RuleCategory::Temporal,
        mutations: &["was-relevant"],
    },
    HiddenRule {
        id: "dominant-color",
        name: "The majority hue",
        predicate: RulePredicate::DominantColor,
        complexity: 3,
        category: RuleCategory::Contextual,
        mutations: &["odd-shape-out"],
    },
    HiddenRule {
        id: "odd-shape-out",
        name: "The outsiders",
        predicate: RulePredicate::OddShapeOut,
        complexity: 4,
        category: RuleCategory::Contextual,
        mutations: &["dominant-color"],
    },
    HiddenRule {
        id: "echo-color",
        name: "Unchanged hue",
        predicate: RulePredicate::EchoColor,
        complexity: 4,
        category: RuleCategory::Contextual,
        mutations: &[],
    },
];

/// Look up a rule by id.
pub fn find_rule(id: &str) -> Option<&'static HiddenRule> {
    RULE_CATALOG.iter().find(|rule| rule.id == id)
}

/// The rule used when nothing else can be satisfied.
pub fn fallback_rule() -> &'static HiddenRule {
    &RULE_CATALOG[0]
}
