//! Generator configuration, injected by the host (screen size, spacing, budgets).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::elements::Position;

/// Errors raised while loading or validating generator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("play area {width}x{height} is too small for margin {margin}")]
    InvalidPlayArea { width: f64, height: f64, margin: f64 },

    #[error("element size range {min}..{max} is invalid")]
    InvalidSizeRange { min: f64, max: f64 },
}

/// The rectangle elements are placed in, in presentation-layer units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayArea {
    pub width: f64,
    pub height: f64,
    /// Keep-out border along every edge.
    pub margin: f64,
}

impl Default for PlayArea {
    fn default() -> Self {
        Self {
            width: 390.0,
            height: 640.0,
            margin: 40.0,
        }
    }
}

impl PlayArea {
    /// Centre of the play area.
    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }

    /// Distance from the centre to a corner; the largest possible centre distance.
    pub fn half_diagonal(&self) -> f64 {
        (self.width * self.width + self.height * self.height).sqrt() / 2.0
    }

    pub fn min_x(&self) -> f64 {
        self.margin
    }

    pub fn max_x(&self) -> f64 {
        self.width - self.margin
    }

    pub fn min_y(&self) -> f64 {
        self.margin
    }

    pub fn max_y(&self) -> f64 {
        self.height - self.margin
    }

    /// Clamp a position into the usable region. An inverted region collapses to
    /// its lower bound.
    pub fn clamp(&self, position: Position) -> Position {
        Position::new(
            position.x.min(self.max_x()).max(self.min_x()),
            position.y.min(self.max_y()).max(self.min_y()),
        )
    }
}

/// Tuning knobs for round generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub play_area: PlayArea,
    pub min_element_size: f64,
    pub max_element_size: f64,
    /// Preferred minimum distance between element centres.
    pub min_spacing: f64,
    /// Rejection-sampling attempts per element before accepting the last draw.
    pub placement_attempts: u32,
    pub max_elements: usize,
    pub base_elements: f64,
    pub elements_per_difficulty: f64,
    /// Share of the round's elements that satisfy the rule.
    pub valid_share: f64,
    /// Traps per difficulty point (rounded down, at least one).
    pub trap_factor: f64,
    pub min_valid: usize,
    /// Chance of a temporal challenge once difficulty allows it.
    pub temporal_probability: f64,
    pub temporal_min_difficulty: f64,
    /// Rounds after which the active rule is reselected regardless of cadence.
    pub forced_reselection_rounds: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            play_area: PlayArea::default(),
            min_element_size: 28.0,
            max_element_size: 56.0,
            min_spacing: 72.0,
            placement_attempts: 50,
            max_elements: 12,
            base_elements: 6.0,
            elements_per_difficulty: 0.8,
            valid_share: 0.25,
            trap_factor: 0.3,
            min_valid: 2,
            temporal_probability: 0.35,
            temporal_min_difficulty: 4.0,
            forced_reselection_rounds: 5,
        }
    }
}

impl GeneratorConfig {
    /// Parse a configuration from a TOML document and validate it.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the play area and size range are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let area = &self.play_area;
        if area.width <= 2.0 * area.margin || area.height <= 2.0 * area.margin {
            return Err(ConfigError::InvalidPlayArea {
                width: area.width,
                height: area.height,
                margin: area.margin,
            });
        }
        if self.min_element_size <= 0.0 || self.min_element_size > self.max_element_size {
            return Err(ConfigError::InvalidSizeRange {
                min: self.min_element_size,
                max: self.max_element_size,
            });
        }
        Ok(())
    }

    /// A copy with the play area and size range forced into a usable shape.
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();
        let area = &mut config.play_area;
        area.width = area.width.max(1.0);
        area.height = area.height.max(1.0);
        area.margin = area.margin.clamp(0.0, area.width.min(area.height) / 4.0);
        config.min_element_size = config.min_element_size.max(1.0);
        config.max_element_size = config.max_element_size.max(config.min_element_size);
        config
    }

    /// Number of elements for a round at the given difficulty.
    pub fn element_count(&self, difficulty: f64) -> usize {
        let raw = (self.base_elements + self.elements_per_difficulty * difficulty)
            .min(self.max_elements as f64)
            .ceil();
        (raw.max(0.0) as usize).max(self.min_valid + 1)
    }
}
